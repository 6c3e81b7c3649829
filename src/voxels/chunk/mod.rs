//! # Chunk Module
//!
//! This module provides the `Chunk` struct: fixed-size 16x16x256 block storage with a
//! parallel metadata array and a parallel packed light array.
//!
//! ## Storage Layout
//!
//! All three arrays are flat and share one index function:
//!
//! ```text
//! index = (y * CHUNK_DEPTH + z) * CHUNK_WIDTH + x
//! ```
//!
//! so a horizontal layer is contiguous and a column walk strides by
//! `CHUNK_LAYER_SIZE`. Each light byte packs two 4-bit channels: the high nibble is
//! sunlight and the low nibble is block light.
//!
//! ## Out-of-Range Access
//!
//! Accessors never fault. Reads outside the chunk return `AIR` and full light
//! (`MAX_LIGHT`); writes outside the chunk are ignored.
//!
//! ## Neighbors
//!
//! A chunk never owns or points at its neighbors. Cross-boundary reads go through a
//! `ChunkNeighbors` view that the caller assembles from the chunk map for the duration
//! of one operation.

use cgmath::Point3;

use super::block::{block_type::BlockType, BlockTypeSize};

pub mod coord;
pub mod state;

pub use coord::{world_to_local, ChunkCoord, LateralNeighbor, LocalPosition, NeighborMask};
pub use state::ChunkState;

/// Width of a chunk along X, in blocks.
pub const CHUNK_WIDTH: usize = 16;
/// Depth of a chunk along Z, in blocks.
pub const CHUNK_DEPTH: usize = 16;
/// Height of a chunk along Y, in blocks.
pub const CHUNK_HEIGHT: usize = 256;
/// The number of blocks in a single horizontal layer.
pub const CHUNK_LAYER_SIZE: usize = CHUNK_WIDTH * CHUNK_DEPTH;
/// The total number of blocks in a chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_LAYER_SIZE * CHUNK_HEIGHT;
/// Highest value either light channel can hold.
pub const MAX_LIGHT: u8 = 15;

/// Flat array index of the in-range cell `(x, y, z)`.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    (y * CHUNK_DEPTH + z) * CHUNK_WIDTH + x
}

/// Whether local coordinates fall inside the chunk cuboid.
#[inline]
pub fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    (0..CHUNK_WIDTH as i32).contains(&x)
        && (0..CHUNK_HEIGHT as i32).contains(&y)
        && (0..CHUNK_DEPTH as i32).contains(&z)
}

/// The outcome of a successful `Chunk::set_block`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockEdit {
    /// The block that occupied the cell before the edit.
    pub previous: BlockType,
    /// The lateral neighbors sharing the edited cell's boundary face. Their meshes
    /// must be rebuilt along with this chunk's.
    pub edge_neighbors: NeighborMask,
}

/// A 16x16x256 column of voxel blocks.
#[derive(Clone)]
pub struct Chunk {
    position: ChunkCoord,
    blocks: Box<[BlockTypeSize]>,
    metadata: Box<[u8]>,
    light: Box<[u8]>,
    solid_count: u32,
    transparent_count: u32,
    water_count: u32,
}

impl Chunk {
    /// Creates a new chunk filled with air and no stored light.
    pub fn new(position: ChunkCoord) -> Self {
        Chunk {
            position,
            blocks: vec![BlockType::AIR.code(); BLOCKS_PER_CHUNK].into_boxed_slice(),
            metadata: vec![0; BLOCKS_PER_CHUNK].into_boxed_slice(),
            light: vec![0; BLOCKS_PER_CHUNK].into_boxed_slice(),
            solid_count: 0,
            transparent_count: 0,
            water_count: 0,
        }
    }

    /// The chunk coordinate this chunk was created for.
    pub fn position(&self) -> ChunkCoord {
        self.position
    }

    /// World block coordinate of the local cell `(x, y, z)`.
    pub fn world_position(&self, x: i32, y: i32, z: i32) -> Point3<i32> {
        let origin = self.position.origin();
        Point3::new(origin.x + x, y, origin.z + z)
    }

    fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        in_bounds(x, y, z).then(|| block_index(x as usize, y as usize, z as usize))
    }

    /// Reads the block at local coordinates.
    ///
    /// # Arguments
    /// * `x`, `z` - Local column, in `[0, 16)`
    /// * `y` - Height, in `[0, 256)`
    ///
    /// # Returns
    /// The stored block, or `AIR` for coordinates outside the chunk
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        match Self::index(x, y, z) {
            Some(index) => BlockType::from_code(self.blocks[index]),
            None => BlockType::AIR,
        }
    }

    /// Reads the metadata byte stored beside a block.
    ///
    /// # Returns
    /// The stored byte, or `0` for coordinates outside the chunk
    pub fn get_metadata(&self, x: i32, y: i32, z: i32) -> u8 {
        Self::index(x, y, z).map_or(0, |index| self.metadata[index])
    }

    /// Replaces the block at `(x, y, z)` and clears its metadata.
    ///
    /// Returns `None` if the coordinate is outside the chunk.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> Option<BlockEdit> {
        self.set_block_with_metadata(x, y, z, block_type, 0)
    }

    /// Replaces the block at `(x, y, z)` and stores `metadata` beside it.
    ///
    /// The block counters are updated in place.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - Local coordinates of the cell
    /// * `block_type` - The new block
    /// * `metadata` - Byte stored with the block
    ///
    /// # Returns
    /// The replaced block and the lateral neighbors whose faces border the cell,
    /// or `None` if the coordinate is outside the chunk
    pub fn set_block_with_metadata(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        block_type: BlockType,
        metadata: u8,
    ) -> Option<BlockEdit> {
        let index = Self::index(x, y, z)?;
        let previous = BlockType::from_code(self.blocks[index]);

        self.uncount(previous);
        self.count(block_type);
        self.blocks[index] = block_type.code();
        self.metadata[index] = metadata;

        let mut edge_neighbors = NeighborMask::EMPTY;
        if x == 0 {
            edge_neighbors = edge_neighbors.with(LateralNeighbor::WEST);
        }
        if x == CHUNK_WIDTH as i32 - 1 {
            edge_neighbors = edge_neighbors.with(LateralNeighbor::EAST);
        }
        if z == 0 {
            edge_neighbors = edge_neighbors.with(LateralNeighbor::NORTH);
        }
        if z == CHUNK_DEPTH as i32 - 1 {
            edge_neighbors = edge_neighbors.with(LateralNeighbor::SOUTH);
        }

        Some(BlockEdit {
            previous,
            edge_neighbors,
        })
    }

    fn counter_for(&mut self, block_type: BlockType) -> Option<&mut u32> {
        if block_type.is_air() {
            None
        } else if block_type.is_water() {
            Some(&mut self.water_count)
        } else if block_type.is_transparent() {
            Some(&mut self.transparent_count)
        } else {
            Some(&mut self.solid_count)
        }
    }

    fn count(&mut self, block_type: BlockType) {
        if let Some(counter) = self.counter_for(block_type) {
            *counter += 1;
        }
    }

    fn uncount(&mut self, block_type: BlockType) {
        if let Some(counter) = self.counter_for(block_type) {
            *counter = counter.saturating_sub(1);
        }
    }

    /// `true` if every cell is air.
    pub fn is_empty(&self) -> bool {
        self.solid_count == 0 && self.transparent_count == 0 && self.water_count == 0
    }

    /// `true` if any cell holds water.
    pub fn has_water(&self) -> bool {
        self.water_count > 0
    }

    /// `true` if any cell holds a see-through block other than air or water.
    pub fn has_transparency(&self) -> bool {
        self.transparent_count > 0
    }

    /// Number of cells counted as solid: not air, and neither water nor transparent.
    pub fn solid_count(&self) -> u32 {
        self.solid_count
    }

    /// The brighter of the two light channels.
    pub fn get_light_level(&self, x: i32, y: i32, z: i32) -> u8 {
        self.get_sunlight(x, y, z).max(self.get_blocklight(x, y, z))
    }

    /// Sunlight stored at local coordinates.
    ///
    /// # Returns
    /// A level in `[0, 15]`, or full light for coordinates outside the chunk
    pub fn get_sunlight(&self, x: i32, y: i32, z: i32) -> u8 {
        Self::index(x, y, z).map_or(MAX_LIGHT, |index| self.light[index] >> 4)
    }

    /// Block light stored at local coordinates, full light outside the chunk.
    pub fn get_blocklight(&self, x: i32, y: i32, z: i32) -> u8 {
        Self::index(x, y, z).map_or(MAX_LIGHT, |index| self.light[index] & 0x0F)
    }

    /// Stores sunlight at local coordinates, leaving block light untouched.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - Local coordinates; writes outside the chunk are ignored
    /// * `level` - New level, clamped to `15`
    pub fn set_sunlight(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if let Some(index) = Self::index(x, y, z) {
            self.light[index] = (level.min(MAX_LIGHT) << 4) | (self.light[index] & 0x0F);
        }
    }

    /// Stores block light at local coordinates, leaving sunlight untouched.
    pub fn set_blocklight(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if let Some(index) = Self::index(x, y, z) {
            self.light[index] = (self.light[index] & 0xF0) | level.min(MAX_LIGHT);
        }
    }

    /// Resets both light channels of every cell to zero.
    pub fn clear_light(&mut self) {
        self.light.fill(0);
    }

    /// Raw packed light bytes, in block index order.
    pub fn light_data(&self) -> &[u8] {
        &self.light
    }

    /// Raw block codes, in block index order.
    pub fn block_data(&self) -> &[BlockTypeSize] {
        &self.blocks
    }

    /// Reads a block that may lie one step outside this chunk on the X or Z axis.
    ///
    /// Lateral out-of-range coordinates resolve into the matching neighbor; an absent
    /// neighbor, a diagonal coordinate or a coordinate above or below the column all
    /// read as `AIR`.
    pub fn get_neighbor_block(
        &self,
        x: i32,
        y: i32,
        z: i32,
        neighbors: &ChunkNeighbors<'_>,
    ) -> BlockType {
        match self.resolve(x, y, z, neighbors) {
            Some((chunk, lx, lz)) => chunk.get_block(lx, y, lz),
            None => BlockType::AIR,
        }
    }

    /// Light level of a cell that may lie in a lateral neighbor. Unresolvable cells
    /// read as full light.
    pub fn get_neighbor_light_level(
        &self,
        x: i32,
        y: i32,
        z: i32,
        neighbors: &ChunkNeighbors<'_>,
    ) -> u8 {
        match self.resolve(x, y, z, neighbors) {
            Some((chunk, lx, lz)) => chunk.get_light_level(lx, y, lz),
            None => MAX_LIGHT,
        }
    }

    fn resolve<'a>(
        &'a self,
        x: i32,
        y: i32,
        z: i32,
        neighbors: &ChunkNeighbors<'a>,
    ) -> Option<(&'a Chunk, i32, i32)> {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return None;
        }
        let x_inside = (0..CHUNK_WIDTH as i32).contains(&x);
        let z_inside = (0..CHUNK_DEPTH as i32).contains(&z);
        match (x_inside, z_inside) {
            (true, true) => Some((self, x, z)),
            (false, false) => None,
            _ => {
                let direction = LateralNeighbor::for_local(x, z)?;
                let chunk = neighbors.get(direction)?;
                Some((
                    chunk,
                    x.rem_euclid(CHUNK_WIDTH as i32),
                    z.rem_euclid(CHUNK_DEPTH as i32),
                ))
            }
        }
    }
}

/// Borrowed view of the lateral neighbors of one chunk.
#[derive(Copy, Clone, Default)]
pub struct ChunkNeighbors<'a> {
    chunks: [Option<&'a Chunk>; 4],
}

impl<'a> ChunkNeighbors<'a> {
    /// A view with every neighbor absent.
    pub fn none() -> Self {
        ChunkNeighbors { chunks: [None; 4] }
    }

    pub fn with(mut self, direction: LateralNeighbor, chunk: &'a Chunk) -> Self {
        self.chunks[direction as usize] = Some(chunk);
        self
    }

    pub fn get(&self, direction: LateralNeighbor) -> Option<&'a Chunk> {
        self.chunks[direction as usize]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn new_chunk_is_empty_air() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0));
        assert!(chunk.is_empty());
        assert_eq!(chunk.get_block(3, 100, 7), BlockType::AIR);
        assert_eq!(chunk.get_light_level(3, 100, 7), 0);
    }

    #[test]
    fn index_is_injective_over_the_cuboid() {
        let mut seen = HashSet::with_capacity(BLOCKS_PER_CHUNK);
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_DEPTH {
                for x in 0..CHUNK_WIDTH {
                    let index = block_index(x, y, z);
                    assert!(index < BLOCKS_PER_CHUNK);
                    assert!(seen.insert(index));
                }
            }
        }
        assert_eq!(seen.len(), BLOCKS_PER_CHUNK);
    }

    #[test]
    fn out_of_range_access_returns_defaults() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        assert_eq!(chunk.get_block(-1, 0, 0), BlockType::AIR);
        assert_eq!(chunk.get_block(0, 256, 0), BlockType::AIR);
        assert_eq!(chunk.get_sunlight(16, 0, 0), MAX_LIGHT);
        assert_eq!(chunk.get_blocklight(0, 0, -3), MAX_LIGHT);
        assert!(chunk.set_block(0, -1, 0, BlockType::STONE).is_none());
        assert!(chunk.is_empty());
    }

    #[test]
    fn counters_track_categories() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set_block(1, 1, 1, BlockType::WATER);
        chunk.set_block(2, 1, 1, BlockType::LEAVES);
        chunk.set_block(3, 1, 1, BlockType::STONE);
        assert!(chunk.has_water());
        assert!(chunk.has_transparency());
        assert_eq!(chunk.solid_count(), 1);

        chunk.set_block(1, 1, 1, BlockType::AIR);
        chunk.set_block(2, 1, 1, BlockType::AIR);
        chunk.set_block(3, 1, 1, BlockType::AIR);
        assert!(chunk.is_empty());
    }

    #[test]
    fn light_setters_clamp_and_keep_channels_apart() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set_sunlight(4, 4, 4, 200);
        chunk.set_blocklight(4, 4, 4, 9);
        assert_eq!(chunk.get_sunlight(4, 4, 4), MAX_LIGHT);
        assert_eq!(chunk.get_blocklight(4, 4, 4), 9);

        chunk.set_sunlight(4, 4, 4, 3);
        assert_eq!(chunk.get_sunlight(4, 4, 4), 3);
        assert_eq!(chunk.get_blocklight(4, 4, 4), 9);
        assert_eq!(chunk.get_light_level(4, 4, 4), 9);
    }

    #[test]
    fn edge_edits_report_adjacent_neighbors() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));

        let interior = chunk.set_block(5, 10, 5, BlockType::DIRT).unwrap();
        assert!(interior.edge_neighbors.is_empty());
        assert_eq!(interior.previous, BlockType::AIR);

        let corner = chunk.set_block(0, 10, 15, BlockType::DIRT).unwrap();
        assert!(corner.edge_neighbors.contains(LateralNeighbor::WEST));
        assert!(corner.edge_neighbors.contains(LateralNeighbor::SOUTH));
        assert_eq!(corner.edge_neighbors.iter().count(), 2);

        let east = chunk.set_block(15, 0, 7, BlockType::DIRT).unwrap();
        assert!(east.edge_neighbors.contains(LateralNeighbor::EAST));
    }

    #[test]
    fn neighbor_lookup_crosses_into_linked_chunks() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0));
        let mut east = Chunk::new(ChunkCoord::new(1, 0));
        east.set_block(0, 20, 3, BlockType::STONE);

        let none = ChunkNeighbors::none();
        assert_eq!(chunk.get_neighbor_block(16, 20, 3, &none), BlockType::AIR);

        let neighbors = ChunkNeighbors::none().with(LateralNeighbor::EAST, &east);
        assert_eq!(chunk.get_neighbor_block(16, 20, 3, &neighbors), BlockType::STONE);
        assert_eq!(chunk.get_neighbor_block(16, 21, 3, &neighbors), BlockType::AIR);
        assert_eq!(chunk.get_neighbor_block(16, 20, -1, &neighbors), BlockType::AIR);
    }

    #[test]
    fn metadata_is_stored_and_cleared() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set_block_with_metadata(1, 2, 3, BlockType::TORCH, 4);
        assert_eq!(chunk.get_metadata(1, 2, 3), 4);
        chunk.set_block(1, 2, 3, BlockType::AIR);
        assert_eq!(chunk.get_metadata(1, 2, 3), 0);
    }
}
