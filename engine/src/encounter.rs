//! The seam between the engine and content-specific boss scripting.

use std::collections::BTreeMap;

use crate::{EffectVal, Runtime, Square};

/// One line of the boss status panel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayItem {
    pub name: String,
    pub text: String,
}

/// Named scalar state an encounter wants captured in snapshots.
pub type EncounterVars = BTreeMap<String, EffectVal>;

/// Content layer driving one boss fight: board layout, the boss turn
/// script and any encounter-private counters.
///
/// The engine calls down through this trait; the implementation calls
/// back up through the public `Runtime` operations (figure placement,
/// damage, knockback, queries, event registration).
pub trait Encounter {
    fn name(&self) -> &str;

    /// Board size for this fight.
    fn map_dimensions(&self) -> (i32, i32) {
        (11, 11)
    }

    /// Squares heroes may deploy on.
    fn deployment_zone(&self) -> Vec<Square>;

    /// Place the boss, minions, obstacles and terrain markers.
    fn setup_map(&mut self, r: &mut Runtime);

    /// The content-specific boss activation script.
    fn perform_boss_turn(&mut self, r: &mut Runtime);

    /// Status lines for the presentation layer.
    fn boss_display_info(&self) -> Vec<DisplayItem> {
        Vec::new()
    }

    /// Encounter-internal fields to include in a snapshot.
    fn save_vars(&self) -> EncounterVars {
        EncounterVars::new()
    }

    /// Reapply fields captured by [`Encounter::save_vars`].
    fn load_vars(&mut self, _vars: EncounterVars) {}
}
