//! Components making up the state of a figure.

use std::collections::BTreeMap;

use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};

use crate::{Condition, EffectVal, Figure};

/// The broad role a figure plays on the board.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Boss,
    Hero,
    Minion,
    Obstacle,
    /// Non-blocking terrain or indicator piece that can share a cell with
    /// a blocking figure.
    #[default]
    Marker,
}

impl Kind {
    /// Blocking figures refuse to share a cell, markers stack freely.
    pub fn is_blocking(self) -> bool {
        !matches!(self, Kind::Marker)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Name(pub String);

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

/// Defense die thresholds, a roll at or above the threshold blocks one
/// point.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Defense {
    pub physical: i32,
    pub elemental: i32,
}

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Attack {
    pub physical: i32,
    pub elemental: i32,
    pub range: i32,
}

/// Base movement allowance before condition adjustments.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct MoveSpeed(pub i32);

/// Figure kinds this figure cannot move through.
#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockedBy(pub Vec<Kind>);

/// Active conditions on a figure and their remaining durations.
///
/// Durations are strictly positive, entries are pruned as they hit zero.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Default,
    Deref,
    DerefMut,
    Serialize,
    Deserialize,
)]
pub struct Conditions(pub BTreeMap<Condition, i32>);

/// Named transient flags and counters, scratch state for game effects.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Default,
    Deref,
    DerefMut,
    Serialize,
    Deserialize,
)]
pub struct Effects(pub BTreeMap<String, EffectVal>);

/// Who may target the figure and how it sorts in target and draw lists.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Targeting {
    pub enemy_targetable: bool,
    pub ally_targetable: bool,
    pub area_hittable: bool,
    pub priority: i32,
    pub render_priority: i32,
}

impl Default for Targeting {
    fn default() -> Self {
        Targeting {
            enemy_targetable: true,
            ally_targetable: true,
            area_hittable: true,
            priority: 0,
            render_priority: 0,
        }
    }
}

impl Targeting {
    pub fn for_kind(kind: Kind) -> Self {
        match kind {
            Kind::Marker => Targeting {
                enemy_targetable: false,
                ally_targetable: false,
                area_hittable: false,
                priority: 0,
                render_priority: -1,
            },
            Kind::Obstacle => Targeting {
                enemy_targetable: false,
                ally_targetable: false,
                ..Default::default()
            },
            _ => Default::default(),
        }
    }
}

/// Passive elemental damage charged to figures stepping into this
/// figure's cell.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Hazard(pub i32);

/// Hero resource pool spent on activation and abilities.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Energy {
    pub current: i32,
    pub max: i32,
}

/// Per-turn hero availability flags, granted by activation.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize,
)]
pub struct Readiness {
    pub activated: bool,
    pub move_available: bool,
    pub attack_available: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub name: String,
    pub energy_cost: i32,
    pub used: bool,
}

/// Hero ability slots; the effect scripts live outside the engine, the
/// engine only tracks the once-per-turn used flags.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Default,
    Deref,
    DerefMut,
    Serialize,
    Deserialize,
)]
pub struct Abilities(pub Vec<AbilitySlot>);

////////////////////////////////

/// Entity component system. Stores all the data of game figures.
#[derive(Default, Deref, DerefMut)]
pub(crate) struct Ecs(pub(crate) hecs::World);

impl Ecs {
    #[allow(dead_code)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = Figure> + '_ {
        (&self.0).into_iter().map(|e| Figure(e.entity()))
    }
}
