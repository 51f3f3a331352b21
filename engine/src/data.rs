//! Figure construction data.

use serde::{Deserialize, Serialize};

use crate::{
    ecs::{AbilitySlot, Kind},
    HERO_MAX_ENERGY,
};

/// Everything needed to stamp out a new figure.
///
/// Kind-dependent passability and targeting defaults are filled in at
/// spawn time; encounter content tweaks the rest through the builder
/// methods.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FigureSpec {
    pub name: String,
    pub kind: Kind,
    pub health: i32,
    pub physical_def: i32,
    pub elemental_def: i32,
    pub move_speed: i32,
    pub physical_dmg: i32,
    pub elemental_dmg: i32,
    pub attack_range: i32,
    pub hazard: i32,
    pub abilities: Vec<AbilitySlot>,
}

impl FigureSpec {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        FigureSpec {
            name: name.into(),
            kind,
            health: 1,
            physical_def: 0,
            elemental_def: 0,
            move_speed: 0,
            physical_dmg: 0,
            elemental_dmg: 0,
            attack_range: 1,
            hazard: 0,
            abilities: Vec::new(),
        }
    }

    pub fn health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    pub fn defense(mut self, physical: i32, elemental: i32) -> Self {
        self.physical_def = physical;
        self.elemental_def = elemental;
        self
    }

    pub fn damage(mut self, physical: i32, elemental: i32) -> Self {
        self.physical_dmg = physical;
        self.elemental_dmg = elemental;
        self
    }

    pub fn attack_range(mut self, range: i32) -> Self {
        self.attack_range = range;
        self
    }

    pub fn move_speed(mut self, speed: i32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn hazard(mut self, hazard: i32) -> Self {
        self.hazard = hazard;
        self
    }

    pub fn ability(mut self, name: impl Into<String>, energy_cost: i32) -> Self {
        self.abilities.push(AbilitySlot {
            name: name.into(),
            energy_cost,
            used: false,
        });
        self
    }

    /// Which figure kinds the spawned figure can't move through.
    ///
    /// Obstacles stop everyone; the two sides additionally stop each
    /// other.
    pub(crate) fn default_blocked_by(kind: Kind) -> Vec<Kind> {
        match kind {
            Kind::Boss | Kind::Minion => vec![Kind::Obstacle, Kind::Hero],
            Kind::Hero => vec![Kind::Obstacle, Kind::Boss, Kind::Minion],
            _ => vec![Kind::Obstacle],
        }
    }

    pub(crate) fn starting_energy(kind: Kind) -> i32 {
        match kind {
            Kind::Hero => HERO_MAX_ENERGY,
            _ => 0,
        }
    }
}
