use anyhow::Result;
use clap::Parser;

use engine::{basic_action, prelude::*};

pub const GAME_NAME: &str = "warboard";

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, help = "Game seed")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 10, help = "Maximum rounds to simulate")]
    rounds: u32,
}

/// Small built-in fight used to drive the engine from the command line.
struct CinderCourt {
    fury: i32,
}

impl Encounter for CinderCourt {
    fn name(&self) -> &str {
        "Cinder Court"
    }

    fn deployment_zone(&self) -> Vec<Square> {
        (0..11).flat_map(|y| (0..2).map(move |x| ivec2(x, y))).collect()
    }

    fn setup_map(&mut self, r: &mut Runtime) {
        r.add_figure(
            &FigureSpec::new("Ember Tyrant", Kind::Boss)
                .health(24)
                .defense(4, 3)
                .damage(2, 1)
                .move_speed(3),
            ivec2(8, 5),
            OnOccupied::Fail,
        );
        for at in [ivec2(7, 3), ivec2(7, 7)] {
            r.add_figure(
                &FigureSpec::new("Cinder Whelp", Kind::Minion)
                    .health(4)
                    .defense(3, 3)
                    .damage(1, 0)
                    .move_speed(4),
                at,
                OnOccupied::Fail,
            );
        }
        for at in [ivec2(5, 4), ivec2(5, 6)] {
            r.add_figure(
                &FigureSpec::new("Basalt Column", Kind::Obstacle),
                at,
                OnOccupied::Fail,
            );
        }
        for at in [ivec2(4, 5), ivec2(6, 5)] {
            r.add_figure(
                &FigureSpec::new("Lava", Kind::Marker).hazard(1),
                at,
                OnOccupied::Colocate,
            );
        }
    }

    fn perform_boss_turn(&mut self, r: &mut Runtime) {
        self.fury += 1;
        let boss_side: Vec<Figure> = r
            .figures()
            .into_iter()
            .filter(|f| matches!(f.kind(r), Kind::Boss | Kind::Minion))
            .collect();
        for figure in boss_side {
            let dealt = basic_action(r, figure);
            if dealt > 0 {
                log::info!("{} hits for {dealt}", figure.name(r));
            }
        }
    }

    fn boss_display_info(&self) -> Vec<engine::DisplayItem> {
        vec![engine::DisplayItem {
            name: "Fury".into(),
            text: format!("{}", self.fury),
        }]
    }
}

/// Scripted stand-in for a human player: activate, close on the boss,
/// swing when in range.
fn scripted_hero_turn(r: &mut Runtime) {
    for hero in r.figures_of_kind(Kind::Hero) {
        if hero.is_stunned(r) {
            continue;
        }
        if hero.energy(r).current < r.heroes_activated() {
            continue;
        }
        r.activate_hero(hero);

        if let Some(boss) = r.figures_of_kind(Kind::Boss).first().copied() {
            let Some(boss_pos) = boss.position(r) else {
                continue;
            };
            // Pick the reachable square closest to the boss, dodging lava
            // where the search found a cleaner route.
            let moves = r.valid_move_destinations(hero);
            let dest = moves
                .values()
                .min_by_key(|d| {
                    let v = boss_pos - *d.path.last().unwrap();
                    (v.x.abs().max(v.y.abs()), d.hazard_damage, d.move_cost)
                })
                .cloned();
            if let Some(dest) = dest {
                let burned = r.move_along(hero, &dest);
                if burned > 0 {
                    log::info!("{} takes {burned} hazard damage", hero.name(r));
                }
            }
            let (Some(pos), Some(boss_pos)) =
                (hero.position(r), boss.position(r))
            else {
                continue;
            };
            let attack = hero.attack(r);
            let blocked_by = hero.blocked_by(r);
            if let Some(d) = r.distance_between(pos, boss_pos, &blocked_by) {
                if d <= attack.range {
                    let dealt = r.deal_damage(
                        Some(hero),
                        boss,
                        attack.physical,
                        attack.elemental,
                    );
                    log::info!("{} hits the boss for {dealt}", hero.name(r));
                }
            }
        }
    }
}

fn deploy_heroes(r: &mut Runtime, zone: &[Square]) {
    let party = [
        FigureSpec::new("Sergeant Voss", Kind::Hero)
            .health(12)
            .defense(4, 5)
            .damage(2, 0)
            .move_speed(3)
            .ability("Taunt", 0),
        FigureSpec::new("Ash Mage", Kind::Hero)
            .health(8)
            .defense(5, 4)
            .damage(0, 2)
            .attack_range(3)
            .move_speed(4)
            .ability("Fireball", 2),
    ];
    for (spec, &at) in party.iter().zip(zone.iter().step_by(4)) {
        r.add_figure(spec, at, OnOccupied::FindEmpty);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed: {seed}");

    let mut encounter = CinderCourt { fury: 0 };
    let mut r = Runtime::new(&mut encounter, seed)?;
    deploy_heroes(&mut r, &encounter.deployment_zone());

    let outcome = loop {
        if r.round() > args.rounds {
            break "the fight drags on";
        }
        if r.figures_of_kind(Kind::Boss).is_empty() {
            break "the heroes win";
        }
        if r.figures_of_kind(Kind::Hero).is_empty() {
            break "the boss wins";
        }

        r.begin_hero_turn();
        scripted_hero_turn(&mut r);
        r.end_hero_turn();
        r.execute_boss_turn(&mut encounter);

        for item in encounter.boss_display_info() {
            log::debug!("{}: {}", item.name, item.text);
        }
    };

    println!("{} ends after {} rounds: {outcome}", encounter.name(), r.round() - 1);
    for figure in r.figures() {
        if figure.kind(&r).is_blocking() {
            println!(
                "  {} {}/{} at {}",
                figure.name(&r),
                figure.health(&r),
                figure.max_health(&r),
                figure.position(&r).map_or("-".to_string(), |p| format!("({}, {})", p.x, p.y)),
            );
        }
    }
    Ok(())
}
