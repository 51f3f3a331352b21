use anyhow::{bail, Result};
use rand::SeedableRng;
use util::GameRng;

use crate::{
    condition,
    ecs::{self, Ecs},
    events::{EventBus, Hook},
    prelude::*,
    Encounter, EventKind, Expiry, FigureSpec, Grid, Handle, TurnPhase,
};

/// Main data container for the combat engine.
///
/// Owns the board, the figure store, the event bus and the random number
/// source. Everything is single-owner and mutated in place by the
/// invoking call stack; there is no parallelism.
pub struct Runtime {
    pub(crate) grid: Grid,
    pub(crate) ecs: Ecs,
    pub(crate) bus: EventBus,
    pub(crate) rng: GameRng,
    pub(crate) phase: TurnPhase,
    pub(crate) round: u32,
    pub(crate) heroes_activated: i32,
    pub(crate) pending: Option<PendingChoice>,
}

/// A suspended interaction waiting for the driver to pick a square.
pub(crate) struct PendingChoice {
    squares: Vec<Square>,
    resume: Box<dyn FnOnce(&mut Runtime, Square)>,
}

impl AsRef<Runtime> for Runtime {
    fn as_ref(&self) -> &Runtime {
        self
    }
}

impl AsMut<Runtime> for Runtime {
    fn as_mut(&mut self) -> &mut Runtime {
        self
    }
}

impl Runtime {
    /// Build a runtime for an encounter, with all game randomness drawn
    /// from the given seed.
    pub fn new(encounter: &mut dyn Encounter, seed: u64) -> Result<Self> {
        let (width, height) = encounter.map_dimensions();
        if width <= 0 || height <= 0 {
            bail!("bad map dimensions {width}x{height}");
        }

        let mut ret = Runtime {
            grid: Grid::new(width, height),
            ecs: Default::default(),
            bus: Default::default(),
            rng: GameRng::seed_from_u64(seed),
            phase: TurnPhase::BossEnd,
            round: 1,
            heroes_activated: 0,
            pending: None,
        };
        condition::install_listeners(&mut ret);
        encounter.setup_map(&mut ret);
        Ok(ret)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub(crate) fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn heroes_activated(&self) -> i32 {
        self.heroes_activated
    }

    pub(crate) fn set_heroes_activated(&mut self, n: i32) {
        self.heroes_activated = n;
    }

    // Figure lifecycle

    /// Mint a new figure. Ids are never reused; the figure isn't on the
    /// board until placed.
    pub fn spawn(&mut self, spec: &FigureSpec) -> Figure {
        let figure = Figure(self.ecs.spawn((
            ecs::Name(spec.name.clone()),
            spec.kind,
            ecs::Health {
                current: spec.health,
                max: spec.health,
            },
            ecs::Defense {
                physical: spec.physical_def,
                elemental: spec.elemental_def,
            },
            ecs::Attack {
                physical: spec.physical_dmg,
                elemental: spec.elemental_dmg,
                range: spec.attack_range,
            },
            ecs::MoveSpeed(spec.move_speed),
            ecs::BlockedBy(FigureSpec::default_blocked_by(spec.kind)),
            ecs::Targeting::for_kind(spec.kind),
            ecs::Hazard(spec.hazard),
        )));

        if spec.kind == Kind::Hero {
            let energy = FigureSpec::starting_energy(spec.kind);
            self.ecs
                .insert(
                    figure.0,
                    (
                        ecs::Energy {
                            current: energy,
                            max: energy,
                        },
                        ecs::Readiness::default(),
                        ecs::Abilities(spec.abilities.clone()),
                    ),
                )
                .expect("spawn: insert hero components");
        }
        figure
    }

    /// Spawn and immediately place a figure.
    pub fn add_figure(
        &mut self,
        spec: &FigureSpec,
        at: Square,
        on_occupied: OnOccupied,
    ) -> Figure {
        let figure = self.spawn(spec);
        self.place_figure(figure, at, on_occupied);
        figure
    }

    /// Put a figure on the board, resolving cell conflicts per policy,
    /// and fire the figure-added notification.
    pub fn place_figure(
        &mut self,
        figure: Figure,
        at: Square,
        on_occupied: OnOccupied,
    ) {
        assert!(
            self.grid.in_bounds(at),
            "place_figure: {at} out of bounds"
        );

        let blocking: Vec<Figure> = self
            .grid
            .figures_at(at)
            .filter(|f| f.kind(self).is_blocking())
            .collect();

        let mut at = at;
        if !blocking.is_empty() {
            match on_occupied {
                OnOccupied::Fail => {
                    panic!("place_figure: {at} is occupied")
                }
                OnOccupied::Colocate => {}
                OnOccupied::Displace => {
                    // A legal cell has at most one blocking occupant;
                    // that one gets shoved aside.
                    assert_eq!(
                        blocking.len(),
                        1,
                        "place_figure: several blocking occupants at {at}"
                    );
                    let empty = self
                        .nearest_empty_square(at)
                        .expect("place_figure: no empty square to displace to");
                    self.grid.insert(empty, blocking[0]);
                }
                OnOccupied::Replace => {
                    assert_eq!(
                        blocking.len(),
                        1,
                        "place_figure: several blocking occupants at {at}"
                    );
                    self.remove_figure(blocking[0]);
                }
                OnOccupied::FindEmpty => {
                    at = self
                        .nearest_empty_square(at)
                        .expect("place_figure: no empty square found");
                }
            }
        }

        self.grid.insert(at, figure);
        self.trigger(&mut Signal::FigureAdded { figure, at });
    }

    /// Take a figure off the board and fire the figure-removed
    /// notification. Listeners scoped to the figure retire on their next
    /// dispatch.
    pub fn remove_figure(&mut self, figure: Figure) {
        let at = self
            .grid
            .remove(figure)
            .expect("remove_figure: figure not on grid");
        self.trigger(&mut Signal::FigureRemoved { figure, at });
    }

    /// Reposition a figure already on the board.
    pub fn move_figure(&mut self, figure: Figure, to: Square) {
        assert!(self.grid.in_bounds(to), "move_figure: {to} out of bounds");
        assert!(
            self.grid.position_of(figure).is_some(),
            "move_figure: figure not on grid"
        );
        self.grid.insert(to, figure);
    }

    // Queries

    /// Every figure on the board, in id order.
    pub fn figures(&self) -> Vec<Figure> {
        self.grid.all_figures().collect()
    }

    pub fn figures_of_kind(&self, kind: Kind) -> Vec<Figure> {
        self.figures()
            .into_iter()
            .filter(|f| f.kind(self) == kind)
            .collect()
    }

    pub fn figure_named(&self, name: &str) -> Option<Figure> {
        self.figures().into_iter().find(|f| f.name(self) == name)
    }

    /// The blocking occupant of a square, if any.
    pub fn blocking_at(&self, sq: Square) -> Option<Figure> {
        self.grid
            .figures_at(sq)
            .find(|f| f.kind(self).is_blocking())
    }

    // Event bus surface

    pub fn register(
        &mut self,
        kind: EventKind,
        hook: impl Fn(&mut Runtime, &mut Signal<'_>) + 'static,
    ) -> Handle {
        self.bus.register(kind, Expiry::Persistent, std::rc::Rc::new(hook))
    }

    /// Register a listener with an explicit retirement policy.
    pub fn register_expiring(
        &mut self,
        kind: EventKind,
        expiry: Expiry,
        hook: impl Fn(&mut Runtime, &mut Signal<'_>) + 'static,
    ) -> Handle {
        self.bus.register(kind, expiry, std::rc::Rc::new(hook))
    }

    pub fn deregister(&mut self, kind: EventKind, handle: Handle) {
        self.bus.deregister(kind, handle);
    }

    /// Dispatch a signal to its listeners, in registration order.
    ///
    /// The listener list is snapshotted up front: every listener in the
    /// snapshot gets exactly one delivery even if the list is edited
    /// mid-dispatch, and triggering with no listeners is a no-op.
    pub fn trigger(&mut self, signal: &mut Signal) {
        let kind = signal.kind();
        let batch: Vec<(Handle, Hook, Expiry)> = self.bus.batch(kind);
        if batch.is_empty() {
            return;
        }

        let mut retired: Vec<Handle> = Vec::new();
        for (handle, hook, expiry) in batch {
            if let Expiry::WithFigure(f) = expiry {
                if !f.is_alive(self) {
                    retired.push(handle);
                    continue;
                }
            }
            hook(self, signal);
            if expiry == Expiry::FireOnce {
                retired.push(handle);
            }
        }
        for handle in retired {
            self.bus.deregister(kind, handle);
        }
    }

    // Two-phase driver interaction

    /// Publish a set of valid squares and suspend until the driver picks
    /// one. The engine keeps no timer; if the driver never resolves the
    /// choice, state simply stays pending.
    pub fn request_choice(
        &mut self,
        squares: Vec<Square>,
        resume: impl FnOnce(&mut Runtime, Square) + 'static,
    ) {
        assert!(
            self.pending.is_none(),
            "request_choice: a choice is already pending"
        );
        assert!(!squares.is_empty(), "request_choice: no choices offered");
        self.pending = Some(PendingChoice {
            squares,
            resume: Box::new(resume),
        });
    }

    /// The squares of the pending choice, if one is waiting.
    pub fn pending_choice(&self) -> Option<&[Square]> {
        self.pending.as_ref().map(|p| p.squares.as_slice())
    }

    /// Feed the chosen square back in, synchronously resuming the
    /// suspended logic.
    pub fn resolve_choice(&mut self, square: Square) {
        let choice = self
            .pending
            .take()
            .expect("resolve_choice: no pending choice");
        assert!(
            choice.squares.contains(&square),
            "resolve_choice: {square} is not a valid choice"
        );
        (choice.resume)(self, square);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn listener_identity() {
        let mut r = testutil::runtime();
        let count = Rc::new(Cell::new(0));

        let hook = {
            let count = count.clone();
            move |_: &mut Runtime, _: &mut Signal<'_>| {
                count.set(count.get() + 1)
            }
        };
        let first = r.register(EventKind::HeroTurnStart, hook.clone());
        let second = r.register(EventKind::HeroTurnStart, hook);
        assert_ne!(first, second);

        r.trigger(&mut Signal::HeroTurnStart);
        assert_eq!(count.get(), 2);

        // Deregistering one handle removes exactly one registration.
        r.deregister(EventKind::HeroTurnStart, first);
        r.trigger(&mut Signal::HeroTurnStart);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn listeners_edit_payloads_in_sequence() {
        let mut r = testutil::runtime();
        r.register(EventKind::MoveQuery, |_, sig| {
            if let Signal::MoveQuery { allowance, .. } = sig {
                **allowance += 2;
            }
        });
        // The second listener sees the first one's edit.
        let seen = Rc::new(Cell::new(0));
        let probe = seen.clone();
        r.register(EventKind::MoveQuery, move |_, sig| {
            if let Signal::MoveQuery { allowance, .. } = sig {
                probe.set(**allowance);
            }
        });

        let hero = testutil::hero(&mut r, ivec2(0, 0));
        assert_eq!(hero.move_allowance(&mut r), 6);
        assert_eq!(seen.get(), 6);
    }

    #[test]
    fn self_deregistration_mid_dispatch_is_safe() {
        let mut r = testutil::runtime();
        let fired = Rc::new(Cell::new(0));

        let handle = Rc::new(Cell::new(None));
        let fired2 = fired.clone();
        let handle2 = handle.clone();
        let h = r.register(EventKind::BossTurnStart, move |r, _| {
            fired2.set(fired2.get() + 1);
            if let Some(h) = handle2.get() {
                r.deregister(EventKind::BossTurnStart, h);
            }
        });
        handle.set(Some(h));

        r.trigger(&mut Signal::BossTurnStart);
        r.trigger(&mut Signal::BossTurnStart);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn fire_once_listeners_retire() {
        let mut r = testutil::runtime();
        let fired = Rc::new(Cell::new(0));
        let probe = fired.clone();
        r.register_expiring(
            EventKind::HeroTurnEnd,
            Expiry::FireOnce,
            move |_, _| probe.set(probe.get() + 1),
        );

        r.trigger(&mut Signal::HeroTurnEnd);
        r.trigger(&mut Signal::HeroTurnEnd);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn figure_scoped_listeners_retire_with_the_figure() {
        let mut r = testutil::runtime();
        let hero = testutil::hero(&mut r, ivec2(0, 0));
        let fired = Rc::new(Cell::new(0));
        let probe = fired.clone();
        r.register_expiring(
            EventKind::HeroTurnStart,
            Expiry::WithFigure(hero),
            move |_, _| probe.set(probe.get() + 1),
        );

        r.trigger(&mut Signal::HeroTurnStart);
        assert_eq!(fired.get(), 1);

        r.remove_figure(hero);
        r.trigger(&mut Signal::HeroTurnStart);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn triggering_without_listeners_is_a_noop() {
        let mut r = testutil::runtime();
        r.trigger(&mut Signal::BossTurnEnd);
    }

    #[test]
    fn placement_policies() {
        let mut r = testutil::runtime();
        let first = testutil::hero(&mut r, ivec2(5, 5));

        // Colocating markers is fine.
        let marker = r.add_figure(
            &FigureSpec::new("Rune", Kind::Marker),
            ivec2(5, 5),
            OnOccupied::Colocate,
        );
        assert_eq!(marker.position(&r), Some(ivec2(5, 5)));

        // Displace shoves the old occupant to the nearest empty square.
        let second = r.add_figure(
            &FigureSpec::new("Shover", Kind::Hero).health(5),
            ivec2(5, 5),
            OnOccupied::Displace,
        );
        assert_eq!(second.position(&r), Some(ivec2(5, 5)));
        let moved = first.position(&r).unwrap();
        assert_ne!(moved, ivec2(5, 5));
        assert!((moved - ivec2(5, 5)).taxi_len() <= 2);

        // FindEmpty redirects the newcomer instead.
        let third = r.add_figure(
            &FigureSpec::new("Late", Kind::Hero).health(5),
            ivec2(5, 5),
            OnOccupied::FindEmpty,
        );
        assert_ne!(third.position(&r).unwrap(), ivec2(5, 5));

        // Replace removes the sole blocking occupant.
        let fourth = r.add_figure(
            &FigureSpec::new("Usurper", Kind::Hero).health(5),
            ivec2(5, 5),
            OnOccupied::Replace,
        );
        assert_eq!(fourth.position(&r), Some(ivec2(5, 5)));
        assert!(!second.is_alive(&r));
        // The marker stayed put through all of it.
        assert_eq!(marker.position(&r), Some(ivec2(5, 5)));
    }

    #[test]
    #[should_panic(expected = "occupied")]
    fn fail_policy_panics_on_blockers() {
        let mut r = testutil::runtime();
        testutil::hero(&mut r, ivec2(5, 5));
        testutil::hero(&mut r, ivec2(5, 5));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_bounds_placement_panics() {
        let mut r = testutil::runtime();
        testutil::hero(&mut r, ivec2(40, 2));
    }

    #[test]
    fn two_phase_choice_contract() {
        let mut r = testutil::runtime();
        let hero = testutil::hero(&mut r, ivec2(0, 0));

        let squares = vec![ivec2(1, 0), ivec2(0, 1)];
        r.request_choice(squares.clone(), move |r, sq| {
            r.move_figure(hero, sq);
        });
        assert_eq!(r.pending_choice(), Some(squares.as_slice()));

        r.resolve_choice(ivec2(0, 1));
        assert_eq!(hero.position(&r), Some(ivec2(0, 1)));
        assert!(r.pending_choice().is_none());
    }
}
