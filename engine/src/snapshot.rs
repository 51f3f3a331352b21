//! Deep-copy state records for round restart.
//!
//! An external component captures a snapshot at a known point (the start
//! of a hero turn, typically) and can later reapply it verbatim: figure
//! fields are written back, moved figures are re-placed and figures
//! created after the capture are removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    ecs::{
        Abilities, Attack, Conditions, Defense, Effects, Energy, Health,
        MoveSpeed, Readiness, Targeting,
    },
    prelude::*,
    EffectVal, Encounter, EncounterVars,
};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Hero-only per-turn resource state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    pub energy: Energy,
    pub readiness: Readiness,
    pub abilities_used: Vec<bool>,
}

/// Everything restorable about one figure.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FigureRecord {
    pub position: Option<Square>,
    pub health: Health,
    pub defense: Defense,
    pub attack: Attack,
    pub move_speed: i32,
    pub conditions: BTreeMap<Condition, i32>,
    pub effects: BTreeMap<String, EffectVal>,
    pub targeting: Targeting,
    pub hero: Option<HeroRecord>,
}

impl FigureRecord {
    fn capture(r: &Runtime, figure: Figure) -> Self {
        let hero = (figure.kind(r) == Kind::Hero).then(|| HeroRecord {
            energy: figure.energy(r),
            readiness: figure.readiness(r),
            abilities_used: figure
                .abilities(r)
                .iter()
                .map(|a| a.used)
                .collect(),
        });

        FigureRecord {
            position: figure.position(r),
            health: figure.get::<Health>(r),
            defense: figure.defense(r),
            attack: figure.attack(r),
            move_speed: figure.base_move(r),
            conditions: figure.conditions(r),
            effects: figure.get::<Effects>(r).0,
            targeting: figure.targeting(r),
            hero,
        }
    }

    fn restore(&self, r: &mut Runtime, figure: Figure) {
        figure.set(r, self.health);
        figure.set(r, self.defense);
        figure.set(r, self.attack);
        figure.set(r, MoveSpeed(self.move_speed));
        figure.set(r, Conditions(self.conditions.clone()));
        figure.set(r, Effects(self.effects.clone()));
        figure.set(r, self.targeting);

        if let Some(hero) = &self.hero {
            figure.set(r, hero.energy);
            figure.set(r, hero.readiness);
            figure.with_mut::<Abilities, _>(r, |a| {
                for (slot, &used) in a.iter_mut().zip(&hero.abilities_used) {
                    slot.used = used;
                }
            });
        }

        match (self.position, figure.position(r)) {
            (Some(recorded), Some(current)) if recorded != current => {
                r.move_figure(figure, recorded);
            }
            (Some(recorded), None) => {
                // The figure died after the capture; it still has all its
                // state, so put it back on the board.
                r.place_figure(figure, recorded, OnOccupied::Colocate);
            }
            _ => {}
        }
    }
}

/// Full captured game state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub round: u32,
    pub heroes_activated: i32,
    pub figures: BTreeMap<Figure, FigureRecord>,
    pub encounter: EncounterVars,
}

impl Snapshot {
    pub fn capture(r: &Runtime, encounter: &dyn Encounter) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            round: r.round(),
            heroes_activated: r.heroes_activated(),
            figures: r
                .figures()
                .into_iter()
                .map(|f| (f, FigureRecord::capture(r, f)))
                .collect(),
            encounter: encounter.save_vars(),
        }
    }

    pub fn restore(&self, r: &mut Runtime, encounter: &mut dyn Encounter) {
        // Figures created after the capture go away first, so they can't
        // get in the way of re-placements.
        for figure in r.figures() {
            if !self.figures.contains_key(&figure) {
                log::debug!(
                    "snapshot restore: removing {}",
                    figure.name(r)
                );
                r.remove_figure(figure);
            }
        }

        for (&figure, record) in &self.figures {
            record.restore(r, figure);
        }

        r.set_round(self.round);
        r.set_heroes_activated(self.heroes_activated);
        encounter.load_vars(self.encounter.clone());
    }
}
