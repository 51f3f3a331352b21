//! Baseline activation logic for boss-side figures.
//!
//! Encounter scripts compose these; every "nothing to do" outcome is a
//! quiet no-op so a script can keep evaluating its other effects.

use rand::seq::SliceRandom;

use crate::{prelude::*, ReachOpts};

/// Hero at the shortest path distance from the figure.
///
/// Equidistant heroes are shuffled with the engine RNG, then taunt level
/// breaks the tie in favor of the loudest hero. `None` when no hero can
/// be targeted or reached.
pub fn closest_target_hero(r: &mut Runtime, figure: Figure) -> Option<Figure> {
    let pos = figure.position(r)?;
    let blocked_by = figure.blocked_by(r);

    let mut closest: Vec<Figure> = Vec::new();
    let mut closest_dist = i32::MAX;
    for hero in r.figures_of_kind(Kind::Hero) {
        if !hero.targeting(r).enemy_targetable {
            continue;
        }
        let Some(hero_pos) = hero.position(r) else {
            continue;
        };
        let Some(dist) = r.distance_between(pos, hero_pos, &blocked_by) else {
            continue;
        };
        if dist < closest_dist {
            closest_dist = dist;
            closest = vec![hero];
        } else if dist == closest_dist {
            closest.push(hero);
        }
    }

    if closest.is_empty() {
        return None;
    }

    // Randomize first so equal taunt levels get picked evenly, then let
    // the stable sort put the highest taunt up front.
    closest.shuffle(&mut r.rng);
    closest
        .sort_by_key(|h| std::cmp::Reverse(h.effect_num(r, "taunt_level")));
    closest.first().copied()
}

/// Walk the figure toward an attack position next to the target, as far
/// as its move allowance takes it this action.
pub fn advance_toward(r: &mut Runtime, figure: Figure, target: Figure) {
    let (Some(pos), Some(goal)) = (figure.position(r), target.position(r))
    else {
        return;
    };
    let allowance = figure.move_allowance(r);
    let blocked_by = figure.blocked_by(r);

    let map = r.reach(pos, &ReachOpts::new(blocked_by).tiebreak(goal));

    // Prefer orthogonally adjacent attack squares, diagonals only win by
    // being strictly closer.
    let mut best: Option<(Square, i32)> = None;
    for d in DIR_8 {
        let sq = goal + d;
        let Some(cost) = map.cost(sq) else { continue };
        let better = match best {
            None => true,
            Some((_, c)) if cost < c => true,
            Some((_, c)) => cost == c && !d.is_diagonal(),
        };
        if better {
            best = Some((sq, cost));
        }
    }
    let Some((mut dest, _)) = best else {
        return;
    };

    // Back down the predecessor chain until the stop is affordable.
    while map.cost(dest).is_some_and(|c| c > allowance) {
        match map.predecessor(dest) {
            Some(prev) => dest = prev,
            None => return,
        }
    }

    if let Some(path) = map.path_to(dest) {
        for &sq in &path[1..] {
            r.move_figure(figure, sq);
        }
    }
}

/// Default enemy activation: close on the nearest hero and attack when
/// within range. Returns the damage dealt.
pub fn basic_action(r: &mut Runtime, figure: Figure) -> i32 {
    if figure.is_stunned(r) {
        log::debug!("{} is stunned, skipping action", figure.name(r));
        return 0;
    }
    let Some(target) = closest_target_hero(r, figure) else {
        log::debug!("no targetable heroes for {}", figure.name(r));
        return 0;
    };

    advance_toward(r, figure, target);

    let (Some(pos), Some(target_pos)) =
        (figure.position(r), target.position(r))
    else {
        return 0;
    };
    let attack = figure.attack(r);
    let blocked_by = figure.blocked_by(r);
    match r.distance_between(pos, target_pos, &blocked_by) {
        Some(d) if d <= attack.range => {
            r.deal_damage(Some(figure), target, attack.physical, attack.elemental)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn targets_closest_hero() {
        let mut r = testutil::runtime();
        let near = testutil::hero(&mut r, ivec2(3, 0));
        let _far = testutil::hero(&mut r, ivec2(9, 9));
        let boss = testutil::boss(&mut r, ivec2(0, 0));

        assert_eq!(closest_target_hero(&mut r, boss), Some(near));
    }

    #[test]
    fn taunt_overrides_equal_distance() {
        let mut r = testutil::runtime();
        let quiet = testutil::hero(&mut r, ivec2(4, 0));
        let loud = testutil::hero(&mut r, ivec2(0, 4));
        let boss = testutil::boss(&mut r, ivec2(0, 0));

        loud.set_effect(
            &mut r,
            "taunt_level",
            crate::EffectVal::Num(2),
            false,
        );
        for _ in 0..8 {
            assert_eq!(closest_target_hero(&mut r, boss), Some(loud));
        }
        let _ = quiet;
    }

    #[test]
    fn untargetable_heroes_yield_none() {
        let mut r = testutil::runtime();
        let hero = testutil::hero(&mut r, ivec2(3, 3));
        let boss = testutil::boss(&mut r, ivec2(0, 0));

        let mut t = hero.targeting(&r);
        t.enemy_targetable = false;
        hero.set_targeting(&mut r, t);

        assert_eq!(closest_target_hero(&mut r, boss), None);
        assert_eq!(basic_action(&mut r, boss), 0);
    }

    #[test]
    fn advances_and_attacks_within_range() {
        let mut r = testutil::runtime();
        let hero = testutil::spawn_at(
            &mut r,
            FigureSpec::new("Mark", Kind::Hero).health(20).defense(7, 7),
            ivec2(5, 0),
        );
        let boss = testutil::spawn_at(
            &mut r,
            FigureSpec::new("Brute", Kind::Boss)
                .health(20)
                .damage(2, 0)
                .move_speed(4),
            ivec2(0, 0),
        );

        let dealt = basic_action(&mut r, boss);
        // Four squares of movement puts the boss adjacent, defense 7
        // means both attack points land.
        assert_eq!(boss.position(&r), Some(ivec2(4, 0)));
        assert_eq!(dealt, 2);
        assert_eq!(hero.health(&r), 18);
    }

    #[test]
    fn stunned_enemies_do_nothing() {
        let mut r = testutil::runtime();
        let hero = testutil::hero(&mut r, ivec2(1, 0));
        let boss = testutil::boss(&mut r, ivec2(0, 0));
        boss.add_condition(&mut r, Condition::Stunned, 1);

        assert_eq!(basic_action(&mut r, boss), 0);
        assert_eq!(hero.health(&r), hero.max_health(&r));
    }
}
