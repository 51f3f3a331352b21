//! Shared fixtures for the engine test modules.

use crate::{prelude::*, EffectVal, EncounterVars};

/// Bare 11x11 encounter with a snapshot-visible counter.
#[derive(Default)]
pub(crate) struct TestEncounter {
    pub counter: i32,
}

impl Encounter for TestEncounter {
    fn name(&self) -> &str {
        "Test Chamber"
    }

    fn deployment_zone(&self) -> Vec<Square> {
        (0..11).flat_map(|y| (0..2).map(move |x| ivec2(x, y))).collect()
    }

    fn setup_map(&mut self, _r: &mut Runtime) {}

    fn perform_boss_turn(&mut self, _r: &mut Runtime) {
        self.counter += 1;
    }

    fn save_vars(&self) -> EncounterVars {
        EncounterVars::from([(
            "counter".to_string(),
            EffectVal::Num(self.counter),
        )])
    }

    fn load_vars(&mut self, vars: EncounterVars) {
        if let Some(v) = vars.get("counter") {
            self.counter = v.as_num();
        }
    }
}

pub(crate) fn runtime() -> Runtime {
    Runtime::new(&mut TestEncounter::default(), 0x5eed).unwrap()
}

pub(crate) fn runtime_with_encounter() -> (Runtime, TestEncounter) {
    let mut enc = TestEncounter::default();
    let r = Runtime::new(&mut enc, 0x5eed).unwrap();
    (r, enc)
}

pub(crate) fn spawn_at(
    r: &mut Runtime,
    spec: FigureSpec,
    at: Square,
) -> Figure {
    r.add_figure(&spec, at, OnOccupied::Fail)
}

pub(crate) fn spawn_colocated(
    r: &mut Runtime,
    spec: FigureSpec,
    at: Square,
) -> Figure {
    r.add_figure(&spec, at, OnOccupied::Colocate)
}

pub(crate) fn hero(r: &mut Runtime, at: Square) -> Figure {
    spawn_at(
        r,
        FigureSpec::new("Hero", Kind::Hero)
            .health(10)
            .defense(4, 4)
            .damage(2, 0)
            .move_speed(4),
        at,
    )
}

pub(crate) fn boss(r: &mut Runtime, at: Square) -> Figure {
    spawn_at(
        r,
        FigureSpec::new("Boss", Kind::Boss)
            .health(20)
            .defense(4, 4)
            .damage(2, 1)
            .move_speed(3),
        at,
    )
}
