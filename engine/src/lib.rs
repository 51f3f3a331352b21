//! Game logic layer machinery.

/// Sides on the defense die; a roll at or above the defense threshold
/// blocks one point of damage.
pub const DEFENSE_DIE_SIDES: i32 = 6;

/// Energy cap for hero figures.
pub const HERO_MAX_ENERGY: i32 = 5;

/// Cosine of the half-angle of cone attacks and flee direction fans.
pub const CONE_COS_THRESHOLD: f32 = std::f32::consts::FRAC_1_SQRT_2;

mod ai;
pub use ai::{advance_toward, basic_action, closest_target_hero};

mod combat;

mod condition;
pub use condition::{Condition, Stacking, TickPhase};

mod data;
pub use data::FigureSpec;

pub mod ecs;

mod encounter;
pub use encounter::{DisplayItem, Encounter, EncounterVars};

mod events;
pub use events::{DamageCtx, DamageKind, EventKind, Expiry, Handle, Signal};

mod figure;
pub use figure::{EffectVal, Figure};

mod grid;
pub use grid::{Grid, OnOccupied};

mod pathing;
pub use pathing::{HazardPath, ReachMap, ReachOpts};

pub mod prelude;

mod runtime;
pub use runtime::Runtime;

mod snapshot;
pub use snapshot::{FigureRecord, HeroRecord, Snapshot};

mod turn;
pub use turn::TurnPhase;

#[cfg(test)]
pub(crate) mod testutil;

/// Grid coordinate datatype.
pub type Square = glam::IVec2;
