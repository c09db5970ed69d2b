//! Grid coordinate type and distance helpers.
//!
//! The city is a synthetic Manhattan grid, so positions are integer
//! `(x, y)` intersections.  The only metric is L1 (`l1_distance`), the
//! demand-weighting and dispatch heuristic.  It is never used as a path
//! cost; routing always runs over live edge weights.

/// An integer intersection on the street grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance in grid blocks.  Symmetric.
    #[inline]
    pub fn l1_distance(self, other: GridPoint) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Coordinates as `[f32; 2]`, the point type of the intersection R-tree
    /// in `StreetNetwork`.
    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x as f32, self.y as f32]
    }
}

impl std::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
