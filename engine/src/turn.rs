//! Hero/boss turn sequencing.

use serde::{Deserialize, Serialize};

use crate::{ecs::Readiness, prelude::*, Encounter};

/// Where in the hero/boss round loop the game currently is.
///
/// The three transition operations below walk the loop; nothing advances
/// it automatically, the driver decides when to call each one.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum TurnPhase {
    HeroStart,
    HeroActive,
    HeroEnd,
    BossStart,
    BossActive,
    BossEnd,
}

impl Runtime {
    pub fn turn_phase(&self) -> TurnPhase {
        self.phase
    }

    /// Open the hero turn: per-turn hero resources reset, then every hero
    /// gets its start-of-action tick.
    pub fn begin_hero_turn(&mut self) {
        assert_eq!(
            self.phase,
            TurnPhase::BossEnd,
            "begin_hero_turn: out of order"
        );
        self.phase = TurnPhase::HeroStart;
        log::debug!("hero turn starts, round {}", self.round);
        self.trigger(&mut Signal::HeroTurnStart);
        self.heroes_activated = 0;

        for hero in self.figures_of_kind(Kind::Hero) {
            hero.reset_turn(self);
            self.trigger(&mut Signal::ActionStart { figure: hero });
        }
        self.phase = TurnPhase::HeroActive;
    }

    /// Close the hero turn with every hero's end-of-action tick.
    pub fn end_hero_turn(&mut self) {
        assert_eq!(
            self.phase,
            TurnPhase::HeroActive,
            "end_hero_turn: out of order"
        );
        for hero in self.figures_of_kind(Kind::Hero) {
            self.trigger(&mut Signal::ActionEnd { figure: hero });
        }
        self.trigger(&mut Signal::HeroTurnEnd);
        self.phase = TurnPhase::HeroEnd;
    }

    /// Run the whole boss turn, delegating the content-specific part to
    /// the encounter, and advance the round counter.
    pub fn execute_boss_turn(&mut self, encounter: &mut dyn Encounter) {
        assert_eq!(
            self.phase,
            TurnPhase::HeroEnd,
            "execute_boss_turn: out of order"
        );
        self.phase = TurnPhase::BossStart;
        log::debug!("boss turn starts, round {}", self.round);
        self.trigger(&mut Signal::BossTurnStart);
        for figure in self.boss_side_figures() {
            self.trigger(&mut Signal::ActionStart { figure });
        }

        self.phase = TurnPhase::BossActive;
        encounter.perform_boss_turn(self);

        for figure in self.boss_side_figures() {
            self.trigger(&mut Signal::ActionEnd { figure });
        }
        self.trigger(&mut Signal::BossTurnEnd);
        self.phase = TurnPhase::BossEnd;
        self.round += 1;
    }

    /// Activate a hero for this turn. Activation order is taxed: each
    /// activation costs energy equal to the number of heroes that already
    /// activated this turn.
    pub fn activate_hero(&mut self, hero: Figure) {
        assert_eq!(
            self.phase,
            TurnPhase::HeroActive,
            "activate_hero: outside the hero turn"
        );
        assert_eq!(hero.kind(self), Kind::Hero, "activate_hero: not a hero");

        hero.spend_energy(self, self.heroes_activated);
        hero.set_readiness(
            self,
            Readiness {
                activated: true,
                move_available: true,
                attack_available: true,
            },
        );
        self.heroes_activated += 1;
        log::debug!(
            "{} activates ({} this turn)",
            hero.name(self),
            self.heroes_activated
        );
    }

    fn boss_side_figures(&self) -> Vec<Figure> {
        self.figures()
            .into_iter()
            .filter(|f| matches!(f.kind(self), Kind::Boss | Kind::Minion))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ecs::Energy, testutil, HERO_MAX_ENERGY};

    #[test]
    fn phases_walk_the_loop() {
        let (mut r, mut enc) = testutil::runtime_with_encounter();
        assert_eq!(r.turn_phase(), TurnPhase::BossEnd);
        assert_eq!(r.round(), 1);

        r.begin_hero_turn();
        assert_eq!(r.turn_phase(), TurnPhase::HeroActive);
        r.end_hero_turn();
        assert_eq!(r.turn_phase(), TurnPhase::HeroEnd);
        r.execute_boss_turn(&mut enc);
        assert_eq!(r.turn_phase(), TurnPhase::BossEnd);
        assert_eq!(r.round(), 2);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn skipping_a_phase_is_an_error() {
        let mut r = testutil::runtime();
        r.begin_hero_turn();
        r.begin_hero_turn();
    }

    #[test]
    fn hero_turn_reset_refreshes_resources() {
        let (mut r, mut enc) = testutil::runtime_with_encounter();
        let hero = testutil::hero(&mut r, ivec2(0, 0));
        hero.set(&mut r, Energy { current: 2, max: HERO_MAX_ENERGY });

        r.begin_hero_turn();
        assert_eq!(hero.energy(&r).current, 3);
        let ready = hero.readiness(&r);
        assert!(!ready.activated);
        assert!(!ready.move_available);

        r.activate_hero(hero);
        let ready = hero.readiness(&r);
        assert!(ready.activated && ready.move_available && ready.attack_available);
        // First activation of the turn is free.
        assert_eq!(hero.energy(&r).current, 3);

        r.end_hero_turn();
        r.execute_boss_turn(&mut enc);
        r.begin_hero_turn();
        assert!(!hero.readiness(&r).activated);
    }

    #[test]
    fn later_activations_cost_energy() {
        let mut r = testutil::runtime();
        let first = testutil::hero(&mut r, ivec2(0, 0));
        let second = testutil::hero(&mut r, ivec2(1, 0));

        r.begin_hero_turn();
        r.activate_hero(first);
        r.activate_hero(second);
        assert_eq!(second.energy(&r).current, HERO_MAX_ENERGY - 1);
    }

    #[test]
    fn condition_ticks_ride_the_turn_loop() {
        let (mut r, mut enc) = testutil::runtime_with_encounter();
        let hero = testutil::hero(&mut r, ivec2(0, 0));
        let boss = testutil::boss(&mut r, ivec2(9, 9));
        hero.add_condition(&mut r, Condition::Slowed, 1);
        boss.add_condition(&mut r, Condition::Slowed, 1);

        r.begin_hero_turn();
        // Slowed clamps the hero's movement while it lasts.
        assert_eq!(hero.move_allowance(&mut r), 1);
        r.end_hero_turn();
        assert!(!hero.has_condition(&r, Condition::Slowed));

        // The boss's copy only ticks on the boss turn.
        assert!(boss.has_condition(&r, Condition::Slowed));
        r.execute_boss_turn(&mut enc);
        assert!(!boss.has_condition(&r, Condition::Slowed));
    }
}
