pub use crate::{
    ecs::Kind, Condition, DamageCtx, DamageKind, Encounter, EventKind, Expiry,
    Figure, FigureSpec, Handle, OnOccupied, Runtime, Signal, Square,
    TickPhase, TurnPhase,
};
pub use glam::{ivec2, IVec2};
pub use util::{HashMap, HashSet, IndexMap, IndexSet, VecExt, DIR_4, DIR_8};
