//! # Chunk Map
//!
//! The concurrent map of loaded chunks and the single source of truth for what is
//! loaded. Entries are keyed by chunk coordinate; chunks refer to their neighbors by
//! coordinate through this map and never hold pointers to each other.
//!
//! ## Locking
//!
//! Lookups clone the entry's handles out of the map so no shard guard is held while a
//! chunk's data lock is taken. Callers on the orchestrating thread take at most one
//! chunk data lock at a time. Mesh workers may hold several read locks at once.

use std::sync::Arc;

use cgmath::Point3;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    core::MtResource,
    rendering::meshing::mesh::ChunkMeshes,
    voxels::{
        block::block_type::BlockType,
        chunk::{world_to_local, Chunk, ChunkCoord, ChunkState, LateralNeighbor, MAX_LIGHT},
    },
};

/// Everything stored for one loaded coordinate.
#[derive(Clone)]
pub struct LoadedChunk {
    /// Block, metadata and light storage.
    pub chunk: MtResource<Chunk>,
    /// Lifecycle flags and load epoch.
    pub state: Arc<ChunkState>,
    /// The most recently compiled meshes.
    pub meshes: MtResource<ChunkMeshes>,
}

impl LoadedChunk {
    /// An empty, ungenerated entry for the load of `coord` identified by `epoch`.
    pub fn new(coord: ChunkCoord, epoch: u64) -> Self {
        LoadedChunk {
            chunk: MtResource::new(Chunk::new(coord)),
            state: Arc::new(ChunkState::new(epoch)),
            meshes: MtResource::new(ChunkMeshes::default()),
        }
    }

    pub fn is_generated(&self) -> bool {
        self.state.is_generated()
    }
}

/// Concurrent coordinate-keyed storage of loaded chunks.
#[derive(Default)]
pub struct ChunkMap {
    chunks: DashMap<ChunkCoord, LoadedChunk>,
}

impl ChunkMap {
    pub fn new() -> Self {
        ChunkMap {
            chunks: DashMap::new(),
        }
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<LoadedChunk> {
        self.chunks.get(&coord).map(|entry| entry.value().clone())
    }

    /// The entry at `coord` if it holds generated terrain.
    pub fn get_generated(&self, coord: ChunkCoord) -> Option<LoadedChunk> {
        self.get(coord).filter(LoadedChunk::is_generated)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Inserts a fresh entry for `coord` unless one exists.
    ///
    /// The check and the insert happen under the same shard lock, so of any number
    /// of concurrent callers for one coordinate exactly one receives `Some`.
    ///
    /// # Arguments
    /// * `coord` - Coordinate to insert
    /// * `epoch` - Load epoch stored in the new entry's state
    ///
    /// # Returns
    /// The inserted entry, or `None` if the coordinate was already present
    pub fn insert_if_absent(&self, coord: ChunkCoord, epoch: u64) -> Option<LoadedChunk> {
        match self.chunks.entry(coord) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let entry = LoadedChunk::new(coord, epoch);
                vacant.insert(entry.clone());
                Some(entry)
            }
        }
    }

    pub fn remove(&self, coord: ChunkCoord) -> Option<LoadedChunk> {
        self.chunks.remove(&coord).map(|(_, entry)| entry)
    }

    /// All loaded coordinates, sorted.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.chunks.iter().map(|entry| *entry.key()).collect();
        coords.sort();
        coords
    }

    /// Snapshot of every entry, sorted by coordinate.
    pub fn entries(&self) -> Vec<(ChunkCoord, LoadedChunk)> {
        let mut entries: Vec<(ChunkCoord, LoadedChunk)> = self
            .chunks
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(coord, _)| *coord);
        entries
    }

    /// The generated lateral neighbors of `coord`, indexed by `LateralNeighbor`.
    pub fn generated_neighbors(&self, coord: ChunkCoord) -> [Option<LoadedChunk>; 4] {
        LateralNeighbor::ALL.map(|direction| self.get_generated(coord.neighbor(direction)))
    }

    /// Block at a world position; `AIR` if the chunk is not loaded or the height is
    /// out of range.
    pub fn block_at(&self, position: Point3<i32>) -> BlockType {
        let Some(local) = world_to_local(position) else {
            return BlockType::AIR;
        };
        match self.get(local.chunk) {
            Some(entry) => entry.chunk.get().get_block(local.x, local.y, local.z),
            None => BlockType::AIR,
        }
    }

    /// Combined light at a world position; full light if unresolvable.
    pub fn light_at(&self, position: Point3<i32>) -> u8 {
        let Some(local) = world_to_local(position) else {
            return MAX_LIGHT;
        };
        match self.get(local.chunk) {
            Some(entry) => entry.chunk.get().get_light_level(local.x, local.y, local.z),
            None => MAX_LIGHT,
        }
    }
}
