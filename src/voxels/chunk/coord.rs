//! # Chunk Coordinates
//!
//! Integer chunk-grid coordinates, the four lateral neighbor directions and the
//! conversions between world block coordinates and chunk-local coordinates.

use std::fmt;

use cgmath::{Point3, Vector2};

use super::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};

/// Position of a chunk in chunk-grid space. Chunks span the full world height, so
/// the grid is two-dimensional.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkCoord { x, z }
    }

    /// The chunk containing the world block column `(wx, wz)`.
    pub fn from_world(wx: i32, wz: i32) -> Self {
        ChunkCoord {
            x: wx.div_euclid(CHUNK_WIDTH as i32),
            z: wz.div_euclid(CHUNK_DEPTH as i32),
        }
    }

    /// The chunk containing a continuous world-space position.
    pub fn from_world_position(position: Point3<f32>) -> Self {
        Self::from_world(position.x.floor() as i32, position.z.floor() as i32)
    }

    /// World block coordinate of this chunk's `(0, 0, 0)` cell.
    pub fn origin(self) -> Point3<i32> {
        Point3::new(self.x * CHUNK_WIDTH as i32, 0, self.z * CHUNK_DEPTH as i32)
    }

    pub fn neighbor(self, direction: LateralNeighbor) -> Self {
        let offset = direction.offset();
        ChunkCoord::new(self.x + offset.x, self.z + offset.y)
    }

    pub fn distance_squared(self, other: ChunkCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// Euclidean distance in chunk units.
    pub fn distance(self, other: ChunkCoord) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A world block position split into its chunk and the in-chunk cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocalPosition {
    pub chunk: ChunkCoord,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Splits a world block position into chunk coordinate and local cell.
///
/// Returns `None` above or below the world column.
pub fn world_to_local(position: Point3<i32>) -> Option<LocalPosition> {
    if position.y < 0 || position.y >= CHUNK_HEIGHT as i32 {
        return None;
    }
    Some(LocalPosition {
        chunk: ChunkCoord::from_world(position.x, position.z),
        x: position.x.rem_euclid(CHUNK_WIDTH as i32),
        y: position.y,
        z: position.z.rem_euclid(CHUNK_DEPTH as i32),
    })
}

/// The four chunks sharing a vertical face with a chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LateralNeighbor {
    /// Negative Z
    NORTH = 0,
    /// Positive Z
    SOUTH = 1,
    /// Positive X
    EAST = 2,
    /// Negative X
    WEST = 3,
}

impl LateralNeighbor {
    pub const ALL: [LateralNeighbor; 4] = [
        LateralNeighbor::NORTH,
        LateralNeighbor::SOUTH,
        LateralNeighbor::EAST,
        LateralNeighbor::WEST,
    ];

    /// Chunk-grid offset as `(dx, dz)`.
    pub fn offset(self) -> Vector2<i32> {
        match self {
            LateralNeighbor::NORTH => Vector2::new(0, -1),
            LateralNeighbor::SOUTH => Vector2::new(0, 1),
            LateralNeighbor::EAST => Vector2::new(1, 0),
            LateralNeighbor::WEST => Vector2::new(-1, 0),
        }
    }

    pub fn opposite(self) -> LateralNeighbor {
        match self {
            LateralNeighbor::NORTH => LateralNeighbor::SOUTH,
            LateralNeighbor::SOUTH => LateralNeighbor::NORTH,
            LateralNeighbor::EAST => LateralNeighbor::WEST,
            LateralNeighbor::WEST => LateralNeighbor::EAST,
        }
    }

    /// The neighbor a local coordinate falls into when it lies one step outside
    /// the chunk on the X or Z axis.
    pub fn for_local(x: i32, z: i32) -> Option<LateralNeighbor> {
        match (x, z) {
            (x, _) if x < 0 => Some(LateralNeighbor::WEST),
            (x, _) if x >= CHUNK_WIDTH as i32 => Some(LateralNeighbor::EAST),
            (_, z) if z < 0 => Some(LateralNeighbor::NORTH),
            (_, z) if z >= CHUNK_DEPTH as i32 => Some(LateralNeighbor::SOUTH),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A small set of lateral neighbors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct NeighborMask(u8);

impl NeighborMask {
    pub const EMPTY: NeighborMask = NeighborMask(0);

    pub fn from_bits(bits: u8) -> Self {
        NeighborMask(bits & 0b1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn with(self, direction: LateralNeighbor) -> Self {
        NeighborMask(self.0 | direction.bit())
    }

    pub fn contains(self, direction: LateralNeighbor) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = LateralNeighbor> {
        LateralNeighbor::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_world_coordinates_floor_into_chunks() {
        assert_eq!(ChunkCoord::from_world(-1, -16), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_world(-17, 15), ChunkCoord::new(-2, 0));
        assert_eq!(ChunkCoord::from_world(16, 31), ChunkCoord::new(1, 1));
    }

    #[test]
    fn world_to_local_wraps_and_rejects_out_of_column() {
        let local = world_to_local(Point3::new(-1, 10, 17)).unwrap();
        assert_eq!(local.chunk, ChunkCoord::new(-1, 1));
        assert_eq!((local.x, local.y, local.z), (15, 10, 1));

        assert!(world_to_local(Point3::new(0, -1, 0)).is_none());
        assert!(world_to_local(Point3::new(0, 256, 0)).is_none());
    }

    #[test]
    fn neighbors_are_symmetric() {
        let origin = ChunkCoord::new(3, -2);
        for direction in LateralNeighbor::ALL {
            assert_eq!(origin.neighbor(direction).neighbor(direction.opposite()), origin);
        }
    }

    #[test]
    fn neighbor_mask_tracks_members() {
        let mask = NeighborMask::EMPTY
            .with(LateralNeighbor::EAST)
            .with(LateralNeighbor::NORTH);
        assert!(mask.contains(LateralNeighbor::EAST));
        assert!(!mask.contains(LateralNeighbor::WEST));
        assert_eq!(mask.iter().count(), 2);
        assert_eq!(NeighborMask::from_bits(mask.bits()), mask);
    }
}
