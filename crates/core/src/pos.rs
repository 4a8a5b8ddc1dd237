//! Integer block positions, facings and inclusive block cuboids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// World block coordinate.
///
/// Implements `Ord` (x, then y, then z) so block-entity maps iterate
/// deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    /// X coordinate (east is positive).
    pub x: i32,
    /// Y coordinate (up is positive).
    pub y: i32,
    /// Z coordinate (south is positive).
    pub z: i32,
}

impl BlockPos {
    /// Create a position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position one step in `facing`.
    pub fn offset(self, facing: Facing) -> Self {
        let (dx, dy, dz) = facing.normal();
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.z.saturating_add(dz),
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the six block faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// -Z
    North,
    /// +X
    East,
    /// +Z
    South,
    /// -X
    West,
    /// +Y
    Up,
    /// -Y
    Down,
}

impl Facing {
    /// All facings in code order.
    pub const ALL: [Facing; 6] = [
        Facing::North,
        Facing::East,
        Facing::South,
        Facing::West,
        Facing::Up,
        Facing::Down,
    ];

    /// Unit normal of the face.
    pub fn normal(self) -> (i32, i32, i32) {
        match self {
            Facing::North => (0, 0, -1),
            Facing::East => (1, 0, 0),
            Facing::South => (0, 0, 1),
            Facing::West => (-1, 0, 0),
            Facing::Up => (0, 1, 0),
            Facing::Down => (0, -1, 0),
        }
    }

    /// Lowercase code (`north`, `up`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
            Facing::Up => "up",
            Facing::Down => "down",
        }
    }

    /// Parse a facing code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }
}

/// Inclusive axis-aligned block box.
///
/// A cuboid can be inverted (`min > max` on some axis) after shrinking; an
/// inverted cuboid contains no positions until it is grown again or widened
/// with [`Cuboid::include`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cuboid {
    /// Minimum corner (inclusive).
    pub min: BlockPos,
    /// Maximum corner (inclusive).
    pub max: BlockPos,
}

impl Cuboid {
    /// Box spanning two corners in any order.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Grow (or shrink, for negative amounts) every side by the given amounts.
    pub fn grow_by(&mut self, dx: i32, dy: i32, dz: i32) {
        self.min.x = self.min.x.saturating_sub(dx);
        self.min.y = self.min.y.saturating_sub(dy);
        self.min.z = self.min.z.saturating_sub(dz);
        self.max.x = self.max.x.saturating_add(dx);
        self.max.y = self.max.y.saturating_add(dy);
        self.max.z = self.max.z.saturating_add(dz);
    }

    /// Widen each bound independently so that `pos` lies inside it.
    pub fn include(&mut self, pos: BlockPos) {
        if pos.x < self.min.x {
            self.min.x = pos.x;
        }
        if pos.y < self.min.y {
            self.min.y = pos.y;
        }
        if pos.z < self.min.z {
            self.min.z = pos.z;
        }
        if pos.x > self.max.x {
            self.max.x = pos.x;
        }
        if pos.y > self.max.y {
            self.max.y = pos.y;
        }
        if pos.z > self.max.z {
            self.max.z = pos.z;
        }
    }

    /// True when the box holds no positions.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Edge lengths in blocks (0 on inverted axes).
    pub fn size(&self) -> (u32, u32, u32) {
        let len = |lo: i32, hi: i32| {
            if hi < lo {
                0
            } else {
                (i64::from(hi) - i64::from(lo) + 1) as u32
            }
        };
        (
            len(self.min.x, self.max.x),
            len(self.min.y, self.max.y),
            len(self.min.z, self.max.z),
        )
    }

    /// Number of positions inside the box.
    pub fn volume(&self) -> u64 {
        let (x, y, z) = self.size();
        u64::from(x) * u64::from(y) * u64::from(z)
    }

    /// Integer centre (rounded toward the minimum corner).
    pub fn center(&self) -> BlockPos {
        let mid = |lo: i32, hi: i32| ((i64::from(lo) + i64::from(hi)).div_euclid(2)) as i32;
        BlockPos::new(
            mid(self.min.x, self.max.x),
            mid(self.min.y, self.max.y),
            mid(self.min.z, self.max.z),
        )
    }

    /// Iterate every position, x outermost then y then z.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> {
        let Cuboid { min, max } = *self;
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| BlockPos::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let cube = Cuboid::from_corners(BlockPos::new(4, 0, -2), BlockPos::new(0, 3, 2));
        assert_eq!(cube.min, BlockPos::new(0, 0, -2));
        assert_eq!(cube.max, BlockPos::new(4, 3, 2));
        assert_eq!(cube.size(), (5, 4, 5));
        assert_eq!(cube.volume(), 100);
    }

    #[test]
    fn shrinking_a_flat_box_inverts_it() {
        let mut cube = Cuboid::from_corners(BlockPos::new(0, 0, 0), BlockPos::new(4, 0, 4));
        cube.grow_by(-1, -1, -1);
        assert!(cube.is_empty());
        assert_eq!(cube.positions().count(), 0);
        assert_eq!(cube.volume(), 0);

        cube.include(BlockPos::new(2, 0, 2));
        assert!(!cube.is_empty());
        assert_eq!(cube.min.y, 0);
        assert_eq!(cube.max.y, 0);
        assert_eq!(cube.positions().count(), 9);
    }

    #[test]
    fn positions_cover_volume_in_order() {
        let cube = Cuboid::from_corners(BlockPos::new(0, 0, 0), BlockPos::new(1, 1, 1));
        let positions: Vec<_> = cube.positions().collect();
        assert_eq!(positions.len() as u64, cube.volume());
        assert_eq!(positions[0], BlockPos::new(0, 0, 0));
        assert_eq!(positions[1], BlockPos::new(0, 0, 1));
        assert_eq!(positions[7], BlockPos::new(1, 1, 1));
    }

    #[test]
    fn center_rounds_toward_min() {
        let cube = Cuboid::from_corners(BlockPos::new(-3, 0, 0), BlockPos::new(0, 5, 1));
        assert_eq!(cube.center(), BlockPos::new(-2, 2, 0));
    }

    #[test]
    fn facing_codes_roundtrip() {
        for facing in Facing::ALL {
            assert_eq!(Facing::from_code(facing.code()), Some(facing));
        }
        assert_eq!(Facing::from_code("sideways"), None);
        assert_eq!(
            BlockPos::new(0, 0, 0).offset(Facing::North),
            BlockPos::new(0, 0, -1)
        );
    }
}
