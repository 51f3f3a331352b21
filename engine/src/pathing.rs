//! Cost-weighted reachability search over the board.
//!
//! Movement uses the tabletop diagonal rule: orthogonal steps cost 1,
//! diagonal steps cost 1.5 with the total floored on report, producing
//! the alternating 1, 2, 1, 2 sequence for a diagonal line. Costs are
//! tracked in integral half-move units internally.

use std::{cmp::Reverse, collections::BinaryHeap};

use pathfinding::prelude::dijkstra;

use crate::{prelude::*, CONE_COS_THRESHOLD};

pub(crate) const ORTHO_COST: u32 = 2;
pub(crate) const DIAG_COST: u32 = 3;

fn floored(halves: u32) -> i32 {
    (halves / 2) as i32
}

/// Search parameters for [`Runtime::reach`].
#[derive(Clone, Debug, Default)]
pub struct ReachOpts {
    /// Figure kinds the mover can't pass through.
    pub blocked_by: Vec<Kind>,
    /// Cut the search off beyond this floored movement cost.
    pub budget: Option<i32>,
    /// Stop expanding once this square has been reached. The stop square
    /// itself may be entered even when occupied, so distance-to-figure
    /// queries work.
    pub stop_at: Option<Square>,
    /// On equal-cost path joins, prefer the predecessor closest to this
    /// point. Gives automated movers natural-looking straight paths.
    pub tiebreak: Option<Square>,
}

impl ReachOpts {
    pub fn new(blocked_by: Vec<Kind>) -> Self {
        ReachOpts {
            blocked_by,
            ..Default::default()
        }
    }

    pub fn budget(mut self, budget: i32) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn stop_at(mut self, sq: Square) -> Self {
        self.stop_at = Some(sq);
        self
    }

    pub fn tiebreak(mut self, sq: Square) -> Self {
        self.tiebreak = Some(sq);
        self
    }
}

/// Result of a reachability search: floored cost and predecessor links
/// for every square reached.
#[derive(Clone, Debug, Default)]
pub struct ReachMap {
    start: Square,
    costs: HashMap<Square, u32>,
    came_from: HashMap<Square, Square>,
}

impl ReachMap {
    /// Floored movement cost to the square, `None` when unreachable.
    pub fn cost(&self, sq: Square) -> Option<i32> {
        self.costs.get(&sq).copied().map(floored)
    }

    pub fn contains(&self, sq: Square) -> bool {
        self.costs.contains_key(&sq)
    }

    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.costs.keys().copied()
    }

    pub fn predecessor(&self, sq: Square) -> Option<Square> {
        self.came_from.get(&sq).copied()
    }

    /// Cell path from the search start to the square, inclusive on both
    /// ends.
    pub fn path_to(&self, sq: Square) -> Option<Vec<Square>> {
        if !self.contains(sq) {
            return None;
        }
        let mut path = vec![sq];
        let mut cur = sq;
        while cur != self.start {
            cur = self.came_from[&cur];
            path.push(cur);
        }
        path.reverse();
        Some(path)
    }
}

/// One destination of a hazard-minimizing search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HazardPath {
    pub move_cost: i32,
    pub hazard_damage: i32,
    /// Full cell path from the start square, inclusive.
    pub path: Vec<Square>,
}

impl Runtime {
    /// Whether a figure blocked by the given kinds can't enter the square.
    pub(crate) fn square_blocked(
        &self,
        sq: Square,
        blocked_by: &[Kind],
    ) -> bool {
        self.grid
            .figures_at(sq)
            .any(|f| blocked_by.contains(&f.kind(self)))
    }

    /// A diagonal step is legal when at least one of the two orthogonal
    /// cells adjoining it is open; blocking both corners forbids it.
    pub(crate) fn diagonal_open(
        &self,
        from: Square,
        to: Square,
        blocked_by: &[Kind],
    ) -> bool {
        debug_assert!((to - from).is_diagonal());
        [ivec2(to.x, from.y), ivec2(from.x, to.y)]
            .into_iter()
            .any(|c| self.grid.in_bounds(c) && !self.square_blocked(c, blocked_by))
    }

    /// Sum of hazard values of the figures in the square.
    pub fn hazard_at(&self, sq: Square) -> i32 {
        self.grid.figures_at(sq).map(|f| f.hazard(self)).sum()
    }

    fn legal_steps(
        &self,
        from: Square,
        dirs: &[IVec2],
        blocked_by: &[Kind],
        enter_exception: Option<Square>,
    ) -> Vec<(Square, u32)> {
        dirs.iter()
            .filter_map(|&d| {
                let to = from + d;
                if !self.grid.in_bounds(to) {
                    return None;
                }
                if d.is_diagonal() && !self.diagonal_open(from, to, blocked_by)
                {
                    return None;
                }
                if Some(to) != enter_exception
                    && self.square_blocked(to, blocked_by)
                {
                    return None;
                }
                let cost = if d.is_diagonal() { DIAG_COST } else { ORTHO_COST };
                Some((to, cost))
            })
            .collect()
    }

    /// Plain weighted reachability search from a square.
    pub fn reach(&self, start: Square, opts: &ReachOpts) -> ReachMap {
        assert!(self.grid.in_bounds(start), "reach: start out of bounds");

        let mut map = ReachMap {
            start,
            ..Default::default()
        };

        // Heap entries carry their predecessor; on equal cost the entry
        // whose predecessor sits closest to the tiebreak point pops first
        // and decides the path. Distances compare exactly as squared
        // integers.
        let tie = |sq: Square| -> i64 {
            opts.tiebreak.map_or(0, |t| {
                let d = t - sq;
                (d.x as i64).pow(2) + (d.y as i64).pow(2)
            })
        };

        let mut open: BinaryHeap<
            Reverse<(u32, i64, (i32, i32), (i32, i32))>,
        > = BinaryHeap::new();
        open.push(Reverse((0, 0, (start.x, start.y), (start.x, start.y))));

        while let Some(Reverse((cost, _, (x, y), (px, py)))) = open.pop() {
            let sq = ivec2(x, y);
            if map.costs.contains_key(&sq) {
                continue;
            }
            map.costs.insert(sq, cost);
            if sq != start {
                map.came_from.insert(sq, ivec2(px, py));
            }
            if opts.stop_at == Some(sq) {
                break;
            }

            for (next, step) in
                self.legal_steps(sq, &DIR_8, &opts.blocked_by, opts.stop_at)
            {
                if map.costs.contains_key(&next) {
                    continue;
                }
                let total = cost + step;
                if opts.budget.is_some_and(|b| floored(total) > b) {
                    continue;
                }
                open.push(Reverse((total, tie(sq), (next.x, next.y), (sq.x, sq.y))));
            }
        }

        map
    }

    fn hazard_search(
        &self,
        start: Square,
        budget: i32,
        blocked_by: &[Kind],
        dirs: &[IVec2],
    ) -> HashMap<Square, HazardPath> {
        assert!(
            self.grid.in_bounds(start),
            "hazard_search: start out of bounds"
        );
        assert!(budget >= 0, "hazard_search: negative budget");

        // Priority order is accumulated hazard first, movement cost
        // second; both grow monotonically along a path so the first pop
        // of a square is its minimum-hazard, then minimum-cost result.
        let mut best: HashMap<Square, (i32, u32)> = HashMap::default();
        let mut came_from: HashMap<Square, Square> = HashMap::default();
        let mut open: BinaryHeap<
            Reverse<(i32, u32, (i32, i32), (i32, i32))>,
        > = BinaryHeap::new();
        open.push(Reverse((0, 0, (start.x, start.y), (start.x, start.y))));

        while let Some(Reverse((hazard, cost, (x, y), (px, py)))) = open.pop()
        {
            let sq = ivec2(x, y);
            if best.contains_key(&sq) {
                continue;
            }
            best.insert(sq, (hazard, cost));
            if sq != start {
                came_from.insert(sq, ivec2(px, py));
            }

            for (next, step) in self.legal_steps(sq, dirs, blocked_by, None) {
                if best.contains_key(&next) {
                    continue;
                }
                let total = cost + step;
                if floored(total) > budget {
                    continue;
                }
                let next_hazard = hazard + self.hazard_at(next);
                open.push(Reverse((
                    next_hazard,
                    total,
                    (next.x, next.y),
                    (sq.x, sq.y),
                )));
            }
        }

        let mut paths: HashMap<Square, HazardPath> = HashMap::default();
        for (&sq, &(hazard, cost)) in &best {
            let mut path = vec![sq];
            let mut cur = sq;
            while cur != start {
                cur = came_from[&cur];
                path.push(cur);
            }
            path.reverse();
            paths.insert(
                sq,
                HazardPath {
                    move_cost: floored(cost),
                    hazard_damage: hazard,
                    path,
                },
            );
        }
        paths
    }

    /// Every square within the figure's move allowance, keyed with cost,
    /// accumulated hazard and the minimum-hazard path there. Squares
    /// holding a blocking figure are not valid destinations; the figure's
    /// own square always is.
    pub fn valid_move_destinations(
        &mut self,
        figure: Figure,
    ) -> HashMap<Square, HazardPath> {
        let pos = figure
            .position(self)
            .expect("valid_move_destinations: figure not on grid");
        let allowance = figure.move_allowance(self);
        let blocked_by = figure.blocked_by(self);

        let mut found = self.hazard_search(pos, allowance, &blocked_by, &DIR_8);
        found.retain(|&sq, _| {
            sq == pos
                || !self
                    .grid
                    .figures_at(sq)
                    .any(|f| f.kind(self).is_blocking())
        });
        found
    }

    /// Hazard-minimizing reachability within a move budget, for callers
    /// that manage their own allowance and destination rules.
    pub fn reach_minimizing_hazard(
        &self,
        start: Square,
        budget: i32,
        blocked_by: &[Kind],
    ) -> HashMap<Square, HazardPath> {
        self.hazard_search(start, budget, blocked_by, &DIR_8)
    }

    /// Squares a figure can flee to, moving only away from a threat.
    ///
    /// Keeps the up-to-three of the eight directions within 45 degrees of
    /// the direction away from the threat and runs the hazard-minimizing
    /// search restricted to those, bounded by the figure's move
    /// allowance. The starting square is not a flee destination.
    pub fn flee_squares(
        &mut self,
        figure: Figure,
        threat: Square,
    ) -> HashMap<Square, HazardPath> {
        let pos = figure
            .position(self)
            .expect("flee_squares: figure not on grid");
        let away = (pos - threat).norm();
        let dirs: Vec<IVec2> = DIR_8
            .into_iter()
            .filter(|d| d.within_arc(away, CONE_COS_THRESHOLD))
            .collect();
        assert!(!dirs.is_empty(), "flee_squares: no candidate directions");

        let allowance = figure.move_allowance(self);
        let blocked_by = figure.blocked_by(self);
        let mut found = self.hazard_search(pos, allowance, &blocked_by, &dirs);
        found.remove(&pos);
        found
    }

    /// Walk a figure along a chosen destination path, then charge the
    /// hazard accumulated on the way as elemental damage through the
    /// standard pipeline. Returns the hazard damage applied.
    pub fn move_along(&mut self, figure: Figure, dest: &HazardPath) -> i32 {
        for &sq in &dest.path[1..] {
            self.move_figure(figure, sq);
        }
        if dest.hazard_damage > 0 {
            figure.take_damage(self, None, 0, dest.hazard_damage, true)
        } else {
            0
        }
    }

    /// Movement distance between two squares, `None` when no route
    /// exists. The destination square may be entered even when occupied.
    pub fn distance_between(
        &self,
        from: Square,
        to: Square,
        blocked_by: &[Kind],
    ) -> Option<i32> {
        if !self.grid.in_bounds(from) || !self.grid.in_bounds(to) {
            return None;
        }
        dijkstra(
            &from,
            |&sq| self.legal_steps(sq, &DIR_8, blocked_by, Some(to)),
            |&sq| sq == to,
        )
        .map(|(_, cost)| floored(cost))
    }

    /// Cheapest route between two squares, inclusive of both endpoints.
    pub fn route_to(
        &self,
        from: Square,
        to: Square,
        blocked_by: &[Kind],
    ) -> Option<Vec<Square>> {
        if !self.grid.in_bounds(from) || !self.grid.in_bounds(to) {
            return None;
        }
        dijkstra(
            &from,
            |&sq| self.legal_steps(sq, &DIR_8, blocked_by, Some(to)),
            |&sq| sq == to,
        )
        .map(|(path, _)| path)
    }

    /// Squares within the given movement distance of the origin.
    pub fn squares_within(
        &self,
        origin: Square,
        distance: i32,
        blocked_by: &[Kind],
    ) -> Vec<Square> {
        self.reach(origin, &ReachOpts::new(blocked_by.to_vec()).budget(distance))
            .squares()
            .collect()
    }

    /// Figures within the given movement distance of the origin,
    /// measured over open terrain.
    pub fn figures_within(&self, origin: Square, distance: i32) -> Vec<Figure> {
        let near = self.reach(origin, &ReachOpts::new(Vec::new()).budget(distance));
        self.grid
            .all_figures()
            .filter(|f| {
                self.grid
                    .position_of(*f)
                    .is_some_and(|sq| near.contains(sq))
            })
            .collect()
    }

    /// Reachable squares within a bearing tolerance of the direction from
    /// the origin toward a target. Used for line and cone area attacks.
    pub fn squares_in_cone(
        &self,
        origin: Square,
        toward: Square,
        distance: i32,
        blocked_by: &[Kind],
    ) -> Vec<Square> {
        let axis = (toward - origin).norm();
        self.squares_within(origin, distance, blocked_by)
            .into_iter()
            .filter(|&sq| {
                sq != origin && (sq - origin).within_arc(axis, CONE_COS_THRESHOLD)
            })
            .collect()
    }

    /// Closest completely empty square to the given one, scanning
    /// outward in breadth-first rings.
    pub fn nearest_empty_square(&self, from: Square) -> Option<Square> {
        util::breadth_first(
            |&sq: &Square| {
                DIR_8
                    .into_iter()
                    .map(move |d| sq + d)
                    .filter(|&n| self.grid.in_bounds(n))
            },
            [from],
        )
        .map(|(sq, _)| sq)
        .find(|&sq| self.grid.figures_at(sq).next().is_none())
    }
}
