//! Publish/subscribe dispatch for cross-cutting combat effects.
//!
//! Dispatch is synchronous, in registration order, on the calling thread.
//! Listeners receive the same payload and may edit its mutable fields
//! before the next listener runs; the pipeline is strictly sequential.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// The closed set of engine notifications.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum EventKind {
    HeroTurnStart,
    HeroTurnEnd,
    BossTurnStart,
    BossTurnEnd,
    ActionStart,
    ActionEnd,
    FigureAdded,
    FigureRemoved,
    FigureDied,
    DefenseRoll,
    DamageTaken,
    Healed,
    MoveQuery,
    ConditionAdded,
    ConditionRemoved,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum DamageKind {
    Physical,
    Elemental,
}

/// Mutable damage resolution state passed through the damage-taken
/// pipeline. Listeners reduce the unblocked fields to mitigate damage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DamageCtx {
    pub physical_unblocked: i32,
    pub elemental_unblocked: i32,
}

impl DamageCtx {
    pub fn total(&self) -> i32 {
        self.physical_unblocked + self.elemental_unblocked
    }
}

/// Event payload. Variants that carry pipeline state hold exclusive
/// references so that sequential listener edits stay visible downstream.
pub enum Signal<'a> {
    HeroTurnStart,
    HeroTurnEnd,
    BossTurnStart,
    BossTurnEnd,
    ActionStart {
        figure: Figure,
    },
    ActionEnd {
        figure: Figure,
    },
    FigureAdded {
        figure: Figure,
        at: Square,
    },
    FigureRemoved {
        figure: Figure,
        at: Square,
    },
    FigureDied {
        figure: Figure,
    },
    DefenseRoll {
        figure: Figure,
        roll: i32,
        kind: DamageKind,
        source: Option<Figure>,
    },
    DamageTaken {
        figure: Figure,
        damage: &'a mut DamageCtx,
        source: Option<Figure>,
    },
    Healed {
        figure: Figure,
        amount: i32,
        source: Option<Figure>,
    },
    MoveQuery {
        figure: Figure,
        allowance: &'a mut i32,
    },
    ConditionAdded {
        figure: Figure,
        condition: Condition,
        duration: i32,
    },
    ConditionRemoved {
        figure: Figure,
        condition: Condition,
    },
}

impl Signal<'_> {
    pub fn kind(&self) -> EventKind {
        use Signal::*;
        match self {
            HeroTurnStart => EventKind::HeroTurnStart,
            HeroTurnEnd => EventKind::HeroTurnEnd,
            BossTurnStart => EventKind::BossTurnStart,
            BossTurnEnd => EventKind::BossTurnEnd,
            ActionStart { .. } => EventKind::ActionStart,
            ActionEnd { .. } => EventKind::ActionEnd,
            FigureAdded { .. } => EventKind::FigureAdded,
            FigureRemoved { .. } => EventKind::FigureRemoved,
            FigureDied { .. } => EventKind::FigureDied,
            DefenseRoll { .. } => EventKind::DefenseRoll,
            DamageTaken { .. } => EventKind::DamageTaken,
            Healed { .. } => EventKind::Healed,
            MoveQuery { .. } => EventKind::MoveQuery,
            ConditionAdded { .. } => EventKind::ConditionAdded,
            ConditionRemoved { .. } => EventKind::ConditionRemoved,
        }
    }
}

pub(crate) type Hook = Rc<dyn Fn(&mut Runtime, &mut Signal<'_>)>;

/// Opaque per-registration identifier.
///
/// Registering the same callback twice yields two distinct handles;
/// deregistering one leaves the other registration live.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Handle(u64);

/// Listener lifecycle, tracked as explicit state rather than closures
/// juggling handles to themselves.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Expiry {
    /// Stays registered until explicitly deregistered.
    Persistent,
    /// Retires after its first delivery.
    FireOnce,
    /// Retires when the figure is no longer on the grid.
    WithFigure(Figure),
}

pub(crate) struct Entry {
    pub handle: Handle,
    pub hook: Hook,
    pub expiry: Expiry,
}

#[derive(Default)]
pub struct EventBus {
    next_handle: u64,
    listeners: HashMap<EventKind, Vec<Entry>>,
}

impl EventBus {
    pub(crate) fn register(
        &mut self,
        kind: EventKind,
        expiry: Expiry,
        hook: Hook,
    ) -> Handle {
        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        self.listeners.entry(kind).or_default().push(Entry {
            handle,
            hook,
            expiry,
        });
        handle
    }

    pub(crate) fn deregister(&mut self, kind: EventKind, handle: Handle) {
        if let Some(entries) = self.listeners.get_mut(&kind) {
            entries.retain(|e| e.handle != handle);
        }
    }

    /// Snapshot of the dispatch list for one event kind.
    ///
    /// Taken at trigger start so listeners registering or deregistering
    /// mid-dispatch can't corrupt the iteration; everyone in the snapshot
    /// gets exactly one delivery.
    pub(crate) fn batch(
        &self,
        kind: EventKind,
    ) -> Vec<(Handle, Hook, Expiry)> {
        self.listeners
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (e.handle, e.hook.clone(), e.expiry))
                    .collect()
            })
            .unwrap_or_default()
    }
}
