use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// What to do when a figure is placed into a cell that already holds a
/// blocking occupant.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display,
)]
pub enum OnOccupied {
    /// Treat the placement as a caller error.
    Fail,
    /// Share the cell; only legal when at most one of the figures blocks.
    Colocate,
    /// Shove the existing blocking occupant to the nearest empty square.
    Displace,
    /// Remove the existing blocking occupant from play.
    Replace,
    /// Redirect the new figure to the nearest empty square instead.
    FindEmpty,
}

/// Bounded board holding the figure position registry.
///
/// Both lookup directions are kept consistent on every mutation; cells may
/// hold several figures as long as at most one of them is blocking.
#[derive(Default)]
pub struct Grid {
    width: i32,
    height: i32,
    places: BTreeMap<Figure, Square>,
    occupants: IndexMap<Square, IndexSet<Figure>>,
}

impl Grid {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Grid {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, sq: Square) -> bool {
        (0..self.width).contains(&sq.x) && (0..self.height).contains(&sq.y)
    }

    /// All board squares in row-major order.
    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| ivec2(x, y)))
    }

    pub fn figures_at(&self, sq: Square) -> impl Iterator<Item = Figure> + '_ {
        self.occupants.get(&sq).into_iter().flatten().copied()
    }

    pub fn position_of(&self, figure: Figure) -> Option<Square> {
        self.places.get(&figure).copied()
    }

    /// Every placed figure in id order.
    pub fn all_figures(&self) -> impl Iterator<Item = Figure> + '_ {
        self.places.keys().copied()
    }

    pub(crate) fn insert(&mut self, sq: Square, figure: Figure) {
        self.remove(figure);
        self.places.insert(figure, sq);
        self.occupants.entry(sq).or_default().insert(figure);
    }

    pub(crate) fn remove(&mut self, figure: Figure) -> Option<Square> {
        let sq = self.places.remove(&figure)?;
        if let Some(set) = self.occupants.get_mut(&sq) {
            set.shift_remove(&figure);
        }
        Some(sq)
    }
}
