use glam::{IVec2, Vec2};

/// 8 directions, clock face order.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

/// 4 directions, clock face order.
pub const DIR_4: [IVec2; 4] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 0]),
];

pub trait VecExt: Sized {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Vector steps both horizontally and vertically.
    fn is_diagonal(&self) -> bool;

    /// Straight-line distance to another point.
    fn euclid_dist(&self, other: &Self) -> f32;

    /// Unit-length float vector pointing the same way.
    ///
    /// Zero vectors stay zero.
    fn norm(&self) -> Vec2;

    /// Whether the unit vector of self is within the arc around `axis`
    /// given by the cosine threshold.
    fn within_arc(&self, axis: Vec2, cos_threshold: f32) -> bool;
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self.x.abs() + self.y.abs()
    }

    fn is_diagonal(&self) -> bool {
        self.x != 0 && self.y != 0
    }

    fn euclid_dist(&self, other: &Self) -> f32 {
        (*other - *self).as_vec2().length()
    }

    fn norm(&self) -> Vec2 {
        self.as_vec2().normalize_or_zero()
    }

    fn within_arc(&self, axis: Vec2, cos_threshold: f32) -> bool {
        // Tolerance keeps exactly-45-degree directions inside a 45 degree
        // arc despite float rounding.
        self.norm().dot(axis) >= cos_threshold - 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::ivec2;
    use std::f32::consts::FRAC_1_SQRT_2;

    #[test]
    fn arcs() {
        let east = ivec2(1, 0).norm();
        assert!(ivec2(1, 0).within_arc(east, FRAC_1_SQRT_2));
        assert!(ivec2(1, 1).within_arc(east, FRAC_1_SQRT_2));
        assert!(ivec2(1, -1).within_arc(east, FRAC_1_SQRT_2));
        assert!(!ivec2(0, 1).within_arc(east, FRAC_1_SQRT_2));
        assert!(!ivec2(-1, 0).within_arc(east, FRAC_1_SQRT_2));

        let ne = ivec2(1, -1).norm();
        let dirs: Vec<IVec2> = DIR_8
            .into_iter()
            .filter(|d| d.within_arc(ne, FRAC_1_SQRT_2))
            .collect();
        assert_eq!(dirs, vec![ivec2(0, -1), ivec2(1, -1), ivec2(1, 0)]);
    }

    #[test]
    fn distances() {
        assert_eq!(ivec2(2, -3).taxi_len(), 5);
        assert!(ivec2(1, 1).is_diagonal());
        assert!(!ivec2(0, 1).is_diagonal());
        assert_eq!(ivec2(0, 0).euclid_dist(&ivec2(3, 4)), 5.0);
    }
}
