//! Timed status conditions and the standard listeners that run them.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// The closed set of status conditions.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Condition {
    /// 1 elemental damage at the end of the carrier's action.
    Burn,
    /// 1 physical damage at the end of the carrier's action.
    Bleed,
    /// Heals 1 at the start of the carrier's action.
    Regen,
    /// Clamps movement allowance to 1.
    Slowed,
    /// Carrier takes no actions; enforcement is up to the driver.
    Stunned,
    /// Damage absorption pool; the duration value doubles as remaining
    /// absorption and is consumed by blocked damage.
    Shielded,
}

/// When in the carrier's action a condition advances.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickPhase {
    ActionStart,
    ActionEnd,
}

/// How a reapplied condition combines with a running instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stacking {
    /// Durations sum.
    Incremental,
    /// Duration becomes the max of old and new.
    Refresh,
}

impl Condition {
    pub fn tick_phase(self) -> TickPhase {
        match self {
            Condition::Regen | Condition::Shielded => TickPhase::ActionStart,
            _ => TickPhase::ActionEnd,
        }
    }

    pub fn stacking(self) -> Stacking {
        match self {
            Condition::Slowed | Condition::Stunned => Stacking::Refresh,
            _ => Stacking::Incremental,
        }
    }
}

/// Install the engine-standard condition listeners on a fresh runtime.
pub(crate) fn install_listeners(r: &mut Runtime) {
    r.register(EventKind::ActionStart, |r, sig| {
        if let Signal::ActionStart { figure } = sig {
            tick_conditions(r, *figure, TickPhase::ActionStart);
        }
    });
    r.register(EventKind::ActionEnd, |r, sig| {
        if let Signal::ActionEnd { figure } = sig {
            tick_conditions(r, *figure, TickPhase::ActionEnd);
        }
    });
    r.register(EventKind::MoveQuery, |r, sig| {
        if let Signal::MoveQuery { figure, allowance } = sig {
            if figure.has_condition(r, Condition::Slowed) {
                **allowance = (**allowance).min(1);
            }
        }
    });
    r.register(EventKind::DamageTaken, shield_absorb);
}

/// Run one tick of every condition on the figure matching the phase.
fn tick_conditions(r: &mut Runtime, figure: Figure, phase: TickPhase) {
    // Work from a snapshot, listeners fired from the damage and heal
    // calls below may edit the live condition map mid-loop.
    let active: Vec<(Condition, i32)> =
        figure.conditions(r).into_iter().collect();

    for (condition, _) in active {
        if condition.tick_phase() != phase {
            continue;
        }

        match condition {
            Condition::Regen => figure.heal(r, 1, None),
            Condition::Burn => {
                figure.take_damage(r, None, 0, 1, true);
            }
            Condition::Bleed => {
                figure.take_damage(r, None, 1, 0, true);
            }
            _ => {}
        }

        if !figure.is_alive(r) {
            // A damage tick killed the carrier, nothing left to advance.
            break;
        }

        // Shields on bosses and minions only wear down by absorbing
        // damage, not by time.
        if condition == Condition::Shielded
            && figure.kind(r) != Kind::Hero
        {
            continue;
        }

        // Re-read the duration, the effect above may have consumed or
        // removed the condition already.
        let Some(left) = figure.condition(r, condition) else {
            continue;
        };
        if left <= 1 {
            figure.remove_condition(r, condition);
        } else {
            figure.set_condition_raw(r, condition, left - 1);
        }
    }
}

/// Standard Shielded behavior on the damage-taken pipeline: the pool
/// soaks unblocked physical damage first, then elemental, and the
/// condition goes away once the pool is spent.
fn shield_absorb(r: &mut Runtime, sig: &mut Signal) {
    let Signal::DamageTaken { figure, damage, .. } = sig else {
        return;
    };
    let figure = *figure;
    let Some(pool) = figure.condition(r, Condition::Shielded) else {
        return;
    };

    let soak_physical = pool.min(damage.physical_unblocked);
    let mut left = pool - soak_physical;
    let soak_elemental = left.min(damage.elemental_unblocked);
    left -= soak_elemental;

    if soak_physical + soak_elemental == 0 {
        return;
    }

    damage.physical_unblocked -= soak_physical;
    damage.elemental_unblocked -= soak_elemental;
    log::debug!(
        "{} shield absorbs {} damage, {left} left",
        figure.name(r),
        soak_physical + soak_elemental
    );

    if left == 0 {
        figure.remove_condition(r, Condition::Shielded);
    } else {
        figure.set_condition_raw(r, Condition::Shielded, left);
    }
}
