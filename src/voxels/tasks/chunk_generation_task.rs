//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which voxelizes and lights one chunk
//! on a generation worker. The task builds a complete, privately owned `Chunk`; the
//! orchestrator swaps it into the map entry when the result is handled, provided the
//! entry still belongs to the same load.

use std::sync::Arc;

use crate::{
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{Chunk, ChunkCoord},
        generation::WorldGenerator,
        lighting::light_new_chunk,
        world::World,
    },
};

/// A task that generates chunk data asynchronously.
pub struct ChunkGenerationTask {
    /// Shared terrain generator
    generator: Arc<WorldGenerator>,
    /// The chunk to generate
    coord: ChunkCoord,
    /// Epoch of the map entry the result belongs to
    epoch: u64,
    /// Sunlight level to light the chunk with
    sky_level: u8,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - The world generator
    /// * `coord` - The chunk coordinates to generate
    /// * `epoch` - Epoch of the map entry awaiting the chunk
    /// * `sky_level` - Current global sunlight level
    ///
    /// # Returns
    /// A new `ChunkGenerationTask` instance
    pub fn new(generator: Arc<WorldGenerator>, coord: ChunkCoord, epoch: u64, sky_level: u8) -> Self {
        ChunkGenerationTask {
            generator,
            coord,
            epoch,
            sky_level,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let mut chunk = self.generator.generate_chunk_blocks(self.coord);
        light_new_chunk(&mut chunk, self.sky_level);

        Box::new(ChunkGenerationTaskResult {
            coord: self.coord,
            epoch: self.epoch,
            sky_level: self.sky_level,
            chunk: Some(chunk),
        })
    }

    fn recover(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            coord: self.coord,
            epoch: self.epoch,
            sky_level: self.sky_level,
            chunk: None,
        })
    }

    fn describe(&self) -> String {
        format!("generate chunk {} (epoch {})", self.coord, self.epoch)
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    coord: ChunkCoord,
    epoch: u64,
    /// Sunlight level the chunk was lit with
    sky_level: u8,
    /// The generated chunk; `None` if generation failed
    chunk: Option<Chunk>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Installs the chunk into the world, or releases the generation claim for a retry.
    fn handle_result(self: Box<Self>, world: &mut World) {
        match self.chunk {
            Some(chunk) => world.complete_generation(self.coord, self.epoch, chunk, self.sky_level),
            None => world.fail_generation(self.coord, self.epoch),
        }
    }
}
