//! Generic figure logic.
use std::{collections::BTreeMap, fmt};

use hecs::Component;
use serde::{Deserialize, Serialize};

use crate::{ecs::*, prelude::*};

/// Figure identifier datatype. All the actual contents live in the ECS,
/// operations take an explicit runtime handle.
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub struct Figure(pub(crate) hecs::Entity);

impl Figure {
    pub(crate) fn get<T>(&self, r: &impl AsRef<Runtime>) -> T
    where
        T: Component + Clone + Default,
    {
        let r = r.as_ref();
        r.ecs
            .get::<&T>(self.0)
            .map(|c| (*c).clone())
            .unwrap_or_default()
    }

    pub(crate) fn set<T>(&self, r: &mut impl AsMut<Runtime>, val: T)
    where
        T: Component + Default + PartialEq,
    {
        let r = r.as_mut();
        if val == T::default() {
            // Components are assumed to be always present but defaulted,
            // store nothing for default values.
            let _ = r.ecs.remove_one::<T>(self.0);
        } else {
            r.ecs.insert_one(self.0, val).expect("Figure::set failed");
        }
    }

    /// Access a component using a closure.
    pub(crate) fn with<T: Component + Default, U>(
        &self,
        r: &impl AsRef<Runtime>,
        f: impl Fn(&T) -> U,
    ) -> U {
        let r = r.as_ref();
        if let Ok(c) = r.ecs.get::<&T>(self.0) {
            f(&*c)
        } else {
            f(&T::default())
        }
    }

    /// Access and mutate a component using a closure.
    pub(crate) fn with_mut<T: Component + Default + Eq, U>(
        &self,
        r: &mut impl AsMut<Runtime>,
        mut f: impl FnMut(&mut T) -> U,
    ) -> U {
        let r = r.as_mut();

        if let Ok(c) = r.ecs.query_one_mut::<&mut T>(self.0) {
            let ret = f(c);
            if *c == T::default() {
                // Component decayed back to default value, drop it.
                let _ = r.ecs.remove_one::<T>(self.0);
            }
            ret
        } else {
            let mut scratch = T::default();
            let ret = f(&mut scratch);
            if scratch != T::default() {
                r.ecs
                    .insert_one(self.0, scratch)
                    .expect("Figure::with_mut failed");
            }
            ret
        }
    }

    pub fn name(&self, r: &impl AsRef<Runtime>) -> String {
        self.get::<Name>(r).0
    }

    pub fn kind(&self, r: &impl AsRef<Runtime>) -> Kind {
        self.get::<Kind>(r)
    }

    /// Current position, the grid is the single source of truth.
    pub fn position(&self, r: &impl AsRef<Runtime>) -> Option<Square> {
        r.as_ref().grid.position_of(*self)
    }

    /// A figure is alive while it is somewhere on the grid.
    pub fn is_alive(&self, r: &impl AsRef<Runtime>) -> bool {
        self.position(r).is_some()
    }

    pub fn health(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<Health>(r).current
    }

    pub fn max_health(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<Health>(r).max
    }

    /// Write current health directly, clamped to `[0, max]`. Bypasses the
    /// damage pipeline, meant for snapshot restore and scripted setup.
    pub fn set_health(&self, r: &mut impl AsMut<Runtime>, current: i32) {
        self.with_mut::<Health, _>(r, |h| {
            h.current = current.clamp(0, h.max);
        });
    }

    pub fn defense(&self, r: &impl AsRef<Runtime>) -> Defense {
        self.get::<Defense>(r)
    }

    pub fn set_defense(&self, r: &mut impl AsMut<Runtime>, d: Defense) {
        self.set(r, d);
    }

    pub fn attack(&self, r: &impl AsRef<Runtime>) -> Attack {
        self.get::<Attack>(r)
    }

    pub fn set_attack(&self, r: &mut impl AsMut<Runtime>, a: Attack) {
        self.set(r, a);
    }

    pub fn base_move(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<MoveSpeed>(r).0
    }

    pub fn blocked_by(&self, r: &impl AsRef<Runtime>) -> Vec<Kind> {
        self.get::<BlockedBy>(r).0
    }

    pub fn targeting(&self, r: &impl AsRef<Runtime>) -> Targeting {
        self.get::<Targeting>(r)
    }

    pub fn set_targeting(&self, r: &mut impl AsMut<Runtime>, t: Targeting) {
        self.set(r, t);
    }

    /// Hazard damage charged to figures stepping into this figure's cell.
    pub fn hazard(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<Hazard>(r).0
    }

    /// Effective movement allowance for this action.
    ///
    /// Computed fresh on each request: passive effects listening on the
    /// move query may adjust the value (Slowed clamps it to 1).
    pub fn move_allowance(&self, r: &mut impl AsMut<Runtime>) -> i32 {
        let r = r.as_mut();
        let mut allowance = self.base_move(r);
        let mut sig = Signal::MoveQuery {
            figure: *self,
            allowance: &mut allowance,
        };
        r.trigger(&mut sig);
        allowance
    }

    // Conditions

    pub fn conditions(
        &self,
        r: &impl AsRef<Runtime>,
    ) -> BTreeMap<Condition, i32> {
        self.get::<Conditions>(r).0
    }

    pub fn condition(
        &self,
        r: &impl AsRef<Runtime>,
        condition: Condition,
    ) -> Option<i32> {
        self.with::<Conditions, _>(r, |c| c.get(&condition).copied())
    }

    pub fn has_condition(
        &self,
        r: &impl AsRef<Runtime>,
        condition: Condition,
    ) -> bool {
        self.condition(r, condition).is_some()
    }

    /// Apply a condition, combining with an existing instance according to
    /// the condition's stacking policy.
    pub fn add_condition(
        &self,
        r: &mut impl AsMut<Runtime>,
        condition: Condition,
        duration: i32,
    ) {
        let r = r.as_mut();
        assert!(duration > 0, "add_condition: nonpositive duration");

        self.with_mut::<Conditions, _>(r, |c| {
            let total = match c.get(&condition) {
                Some(&old) => match condition.stacking() {
                    crate::Stacking::Incremental => old + duration,
                    crate::Stacking::Refresh => old.max(duration),
                },
                None => duration,
            };
            c.insert(condition, total);
        });
        r.trigger(&mut Signal::ConditionAdded {
            figure: *self,
            condition,
            duration,
        });
    }

    pub fn remove_condition(
        &self,
        r: &mut impl AsMut<Runtime>,
        condition: Condition,
    ) {
        let r = r.as_mut();
        let removed = self
            .with_mut::<Conditions, _>(r, |c| c.remove(&condition).is_some());
        if removed {
            r.trigger(&mut Signal::ConditionRemoved {
                figure: *self,
                condition,
            });
        }
    }

    /// Overwrite a condition's remaining duration without stacking rules
    /// or notifications. Internal bookkeeping and snapshot restore only.
    pub(crate) fn set_condition_raw(
        &self,
        r: &mut impl AsMut<Runtime>,
        condition: Condition,
        duration: i32,
    ) {
        self.with_mut::<Conditions, _>(r, |c| {
            if duration > 0 {
                c.insert(condition, duration);
            } else {
                c.remove(&condition);
            }
        });
    }

    // Health changes

    pub fn heal(
        &self,
        r: &mut impl AsMut<Runtime>,
        amount: i32,
        source: Option<Figure>,
    ) {
        let r = r.as_mut();
        assert!(amount >= 0, "heal: negative amount");

        self.with_mut::<Health, _>(r, |h| {
            h.current = (h.current + amount).min(h.max);
        });
        r.trigger(&mut Signal::Healed {
            figure: *self,
            amount,
            source,
        });
    }

    /// Subtract health directly, clamped at zero. Reaching zero kills the
    /// figure and takes it off the grid.
    pub fn lose_health(&self, r: &mut impl AsMut<Runtime>, amount: i32) {
        let r = r.as_mut();
        assert!(amount >= 0, "lose_health: negative amount");

        let left = self.with_mut::<Health, _>(r, |h| {
            h.current = (h.current - amount).max(0);
            h.current
        });
        if left == 0 && self.is_alive(r) {
            log::debug!("{} dies", self.name(r));
            r.trigger(&mut Signal::FigureDied { figure: *self });
            r.remove_figure(*self);
        }
    }

    // Transient effects

    /// Store a named effect flag or counter.
    ///
    /// Overwriting an existing entry must be explicitly requested so that
    /// independently authored effects don't silently clobber each other.
    pub fn set_effect(
        &self,
        r: &mut impl AsMut<Runtime>,
        key: &str,
        val: EffectVal,
        overwrite: bool,
    ) {
        self.with_mut::<Effects, _>(r, |e| {
            assert!(
                overwrite || !e.contains_key(key),
                "set_effect: effect {key:?} already present"
            );
            e.insert(key.to_string(), val);
        });
    }

    pub fn remove_effect(&self, r: &mut impl AsMut<Runtime>, key: &str) {
        self.with_mut::<Effects, _>(r, |e| {
            e.remove(key);
        });
    }

    pub fn effect(
        &self,
        r: &impl AsRef<Runtime>,
        key: &str,
    ) -> Option<EffectVal> {
        self.with::<Effects, _>(r, |e| e.get(key).copied())
    }

    /// Numeric view of an effect, 0 when absent.
    pub fn effect_num(&self, r: &impl AsRef<Runtime>, key: &str) -> i32 {
        self.effect(r, key).map_or(0, |v| v.as_num())
    }

    // Hero resources

    pub fn energy(&self, r: &impl AsRef<Runtime>) -> Energy {
        self.get::<Energy>(r)
    }

    pub fn gain_energy(&self, r: &mut impl AsMut<Runtime>, amount: i32) {
        assert!(amount >= 0, "gain_energy: negative amount");
        self.with_mut::<Energy, _>(r, |e| {
            e.current = (e.current + amount).min(e.max);
        });
    }

    pub fn spend_energy(&self, r: &mut impl AsMut<Runtime>, amount: i32) {
        self.with_mut::<Energy, _>(r, |e| {
            assert!(
                amount <= e.current,
                "spend_energy: {amount} exceeds current energy {}",
                e.current
            );
            e.current -= amount;
        });
    }

    pub fn readiness(&self, r: &impl AsRef<Runtime>) -> Readiness {
        self.get::<Readiness>(r)
    }

    pub fn set_readiness(&self, r: &mut impl AsMut<Runtime>, f: Readiness) {
        self.set(r, f);
    }

    pub fn abilities(&self, r: &impl AsRef<Runtime>) -> Vec<AbilitySlot> {
        self.get::<Abilities>(r).0
    }

    pub fn set_ability_used(
        &self,
        r: &mut impl AsMut<Runtime>,
        index: usize,
        used: bool,
    ) {
        self.with_mut::<Abilities, _>(r, |a| {
            a[index].used = used;
        });
    }

    pub fn is_stunned(&self, r: &impl AsRef<Runtime>) -> bool {
        self.has_condition(r, Condition::Stunned)
    }

    /// Hero bookkeeping at the start of a hero turn.
    pub(crate) fn reset_turn(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        self.set_readiness(r, Readiness::default());
        self.gain_energy(r, 1);
        self.with_mut::<Abilities, _>(r, |a| {
            for slot in a.iter_mut() {
                slot.used = false;
            }
        });
    }
}

/// Value of a named transient effect.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectVal {
    Flag(bool),
    Num(i32),
}

impl EffectVal {
    pub fn as_num(self) -> i32 {
        match self {
            EffectVal::Flag(b) => b as i32,
            EffectVal::Num(n) => n,
        }
    }

    pub fn as_flag(self) -> bool {
        self.as_num() != 0
    }
}

// Figure ids are stored in snapshot records, serialize them through the
// raw id bits.

impl Serialize for Figure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0.to_bits().get())
    }
}

impl<'de> Deserialize<'de> for Figure {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        hecs::Entity::from_bits(bits)
            .map(Figure)
            .ok_or_else(|| serde::de::Error::custom("bad figure id"))
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.id())
    }
}
