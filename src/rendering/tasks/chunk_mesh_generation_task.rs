//! Task for compiling chunk meshes in a background thread.
//!
//! The task reads the chunk and its generated lateral neighbors under shared read
//! locks, so edits on the orchestrating thread wait for at most one build. The
//! finished meshes are stored by the orchestrator, and only if the chunk was not
//! unloaded or reloaded in the meantime.

use crate::{
    rendering::meshing::{mesh::ChunkMeshes, ChunkMeshBuilder},
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{ChunkCoord, ChunkNeighbors, LateralNeighbor},
        chunk_map::LoadedChunk,
        world::World,
    },
};

/// A task that compiles the meshes of one chunk.
pub struct ChunkMeshGenerationTask {
    coord: ChunkCoord,
    epoch: u64,
    /// Map entry of the chunk to mesh
    target: LoadedChunk,
    /// Generated lateral neighbors, indexed by `LateralNeighbor`
    neighbors: [Option<LoadedChunk>; 4],
}

impl ChunkMeshGenerationTask {
    /// Creates a new mesh generation task.
    ///
    /// # Arguments
    /// * `coord` - Coordinate of the chunk
    /// * `target` - The chunk's map entry; its build flag must already be claimed
    /// * `neighbors` - The chunk's generated lateral neighbors
    pub fn new(coord: ChunkCoord, target: LoadedChunk, neighbors: [Option<LoadedChunk>; 4]) -> Self {
        ChunkMeshGenerationTask {
            coord,
            epoch: target.state.epoch(),
            target,
            neighbors,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let guards = self
            .neighbors
            .each_ref()
            .map(|neighbor| neighbor.as_ref().map(|entry| entry.chunk.get()));
        let mut view = ChunkNeighbors::none();
        for direction in LateralNeighbor::ALL {
            if let Some(guard) = &guards[direction as usize] {
                view = view.with(direction, guard);
            }
        }

        let chunk = self.target.chunk.get();
        let meshes = ChunkMeshBuilder::build(&chunk, &view);

        Box::new(ChunkMeshGenerationTaskResult {
            coord: self.coord,
            epoch: self.epoch,
            meshes: Some(meshes),
        })
    }

    fn recover(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkMeshGenerationTaskResult {
            coord: self.coord,
            epoch: self.epoch,
            meshes: None,
        })
    }

    fn describe(&self) -> String {
        format!("mesh chunk {} (epoch {})", self.coord, self.epoch)
    }
}

/// The result of a chunk mesh generation task.
pub struct ChunkMeshGenerationTaskResult {
    coord: ChunkCoord,
    epoch: u64,
    /// The compiled meshes; `None` if the build failed
    meshes: Option<ChunkMeshes>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    fn handle_result(self: Box<Self>, world: &mut World) {
        match self.meshes {
            Some(meshes) => world.complete_mesh(self.coord, self.epoch, meshes),
            None => world.fail_mesh(self.coord, self.epoch),
        }
    }
}
