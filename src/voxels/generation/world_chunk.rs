//! # World Chunk
//!
//! The per-coordinate field record the world generator produces before any blocks
//! exist: terrain height, climate, ocean state, and the islands and hazards that
//! touch the chunk. World chunks are immutable once built and are shared through
//! `Arc` between the generator cache and the workers that voxelize them.

use std::sync::Arc;

use super::{biome::Biome, hazard::Hazard, island::Island};
use crate::voxels::chunk::{coord::ChunkCoord, CHUNK_DEPTH, CHUNK_LAYER_SIZE, CHUNK_WIDTH};

/// Height, biome and climate fields of one 16x16 chunk column.
#[derive(Clone, Debug)]
pub struct WorldChunk {
    pub(super) coord: ChunkCoord,
    pub(super) heights: [f32; CHUNK_LAYER_SIZE],
    pub(super) biomes: [Biome; CHUNK_LAYER_SIZE],
    pub(super) temperature: [f32; CHUNK_LAYER_SIZE],
    pub(super) humidity: [f32; CHUNK_LAYER_SIZE],
    pub(super) current_direction: f32,
    pub(super) current_strength: f32,
    pub(super) wave_height: f32,
    pub(super) islands: Vec<Arc<Island>>,
    pub(super) hazards: Vec<Hazard>,
}

#[inline]
fn column(x: usize, z: usize) -> Option<usize> {
    (x < CHUNK_WIDTH && z < CHUNK_DEPTH).then_some(z * CHUNK_WIDTH + x)
}

impl WorldChunk {
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Terrain height of local column `(x, z)`; 0.0 outside the chunk.
    pub fn height(&self, x: usize, z: usize) -> f32 {
        column(x, z).map_or(0.0, |index| self.heights[index])
    }

    /// Biome of local column `(x, z)`; `OCEAN` outside the chunk.
    pub fn biome(&self, x: usize, z: usize) -> Biome {
        column(x, z).map_or(Biome::OCEAN, |index| self.biomes[index])
    }

    pub fn temperature(&self, x: usize, z: usize) -> f32 {
        column(x, z).map_or(0.0, |index| self.temperature[index])
    }

    pub fn humidity(&self, x: usize, z: usize) -> f32 {
        column(x, z).map_or(0.0, |index| self.humidity[index])
    }

    /// Direction the ocean current flows in, in radians.
    pub fn current_direction(&self) -> f32 {
        self.current_direction
    }

    /// Current strength in `[0, 1]`.
    pub fn current_strength(&self) -> f32 {
        self.current_strength
    }

    /// Wave amplitude in blocks.
    pub fn wave_height(&self) -> f32 {
        self.wave_height
    }

    /// Islands whose footprint intersects this chunk.
    pub fn islands(&self) -> &[Arc<Island>] {
        &self.islands
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// `true` if no island touches the chunk.
    pub fn is_open_water(&self) -> bool {
        self.islands.is_empty()
    }

    /// Highest terrain height across the chunk.
    pub fn max_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::MIN, f32::max)
    }
}
