//! # World Module
//!
//! This module provides the `World` struct, the streaming orchestrator. It owns the
//! chunk map, the lighting engine and the two worker pools, and it is the only place
//! task results are applied.
//!
//! ## Tick
//!
//! One `update` call:
//! 1. Applies every finished generation and mesh result
//! 2. Recomputes the working sets if the viewpoint entered a new chunk
//! 3. Unloads every chunk that left the load disc
//! 4. Submits up to `max_chunks_per_frame` generations, retries first, closest first
//! 5. Runs queued lighting work and marks the chunks it touched dirty
//! 6. Submits up to `max_chunks_per_frame` mesh builds, closest first
//!
//! ## Loads and Epochs
//!
//! `load_chunk` inserts an empty, ungenerated entry into the map before any work is
//! submitted, so concurrent loads of one coordinate start exactly one generation.
//! Every insert carries a fresh epoch. Results are applied only if the entry they
//! were computed for is still in the map with the same epoch; anything else is
//! counted and discarded.
//!
//! ## Neighbors
//!
//! When a chunk's terrain is installed it is linked with each generated lateral
//! neighbor, in both directions, and the neighbors are marked dirty so their border
//! faces are re-culled. Unloading unlinks and dirties them the same way.

use std::{
    collections::VecDeque,
    mem,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread,
};

use cgmath::{Point3, Vector3};
use log::{debug, info, warn};
use serde::Serialize;
use web_time::{Duration, Instant};

use crate::{
    config::WorldConfig,
    rendering::{
        meshing::mesh::ChunkMeshes,
        render_list::{assemble_render_commands, RenderCommand},
        tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
    },
    task_management::{task::TaskResult, TaskManager},
    voxels::{
        block::block_type::BlockType,
        chunk::{world_to_local, Chunk, ChunkCoord, LateralNeighbor},
        chunk_map::{ChunkMap, LoadedChunk},
        generation::WorldGenerator,
        lighting::LightingEngine,
        raycast::{raycast, RaycastHit},
        streaming::{sort_by_distance, WorkingSets},
        tasks::chunk_generation_task::ChunkGenerationTask,
        viewpoint::ViewpointProvider,
    },
};

/// Snapshot of the world's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub loaded_chunks: usize,
    pub generated_chunks: usize,
    pub generations_submitted: u64,
    pub meshes_built: u64,
    pub stale_results_discarded: u64,
    pub generation_failures: u64,
    pub mesh_failures: u64,
    pub generation_tasks_in_flight: usize,
    pub mesh_tasks_in_flight: usize,
    pub pending_light_updates: usize,
    pub cached_world_chunks: usize,
}

fn lock_pool(pool: &Mutex<TaskManager>) -> MutexGuard<'_, TaskManager> {
    pool.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The streaming voxel world.
pub struct World {
    config: WorldConfig,
    generator: Arc<WorldGenerator>,
    chunks: ChunkMap,
    lighting: LightingEngine,
    generation_tasks: Mutex<TaskManager>,
    mesh_tasks: Mutex<TaskManager>,
    next_epoch: AtomicU64,
    generations_submitted: AtomicU64,
    viewpoint: Point3<f32>,
    viewpoint_chunk: Option<ChunkCoord>,
    working_sets: WorkingSets,
    /// Loaded coordinates whose generation failed, oldest first
    retry_generation: VecDeque<ChunkCoord>,
    meshes_built: u64,
    stale_results_discarded: u64,
    generation_failures: u64,
    mesh_failures: u64,
}

impl World {
    /// Creates an empty world and starts its worker pools.
    ///
    /// # Arguments
    /// * `config` - Generation and streaming settings; expected to be validated
    pub fn new(config: WorldConfig) -> Self {
        let generator = Arc::new(WorldGenerator::new(
            config.generation_settings(),
            config.world_chunk_cache_capacity,
        ));
        let generation_tasks = TaskManager::new("generation", config.generation_workers());
        let mesh_tasks = TaskManager::new("mesh", config.mesh_workers());
        info!(
            "Created world with seed {} (sea level {}, load distance {}, {} generation / {} mesh workers)",
            config.seed,
            config.sea_level,
            config.load_distance,
            generation_tasks.worker_count(),
            mesh_tasks.worker_count()
        );

        World {
            lighting: LightingEngine::new(config.time_of_day),
            generator,
            chunks: ChunkMap::new(),
            generation_tasks: Mutex::new(generation_tasks),
            mesh_tasks: Mutex::new(mesh_tasks),
            next_epoch: AtomicU64::new(1),
            generations_submitted: AtomicU64::new(0),
            viewpoint: Point3::new(0.0, 0.0, 0.0),
            viewpoint_chunk: None,
            working_sets: WorkingSets::default(),
            retry_generation: VecDeque::new(),
            meshes_built: 0,
            stale_results_discarded: 0,
            generation_failures: 0,
            mesh_failures: 0,
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn generator(&self) -> &Arc<WorldGenerator> {
        &self.generator
    }

    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    pub fn lighting(&self) -> &LightingEngine {
        &self.lighting
    }

    /// The viewpoint seen by the last `update`.
    pub fn viewpoint(&self) -> Point3<f32> {
        self.viewpoint
    }

    pub fn working_sets(&self) -> &WorkingSets {
        &self.working_sets
    }

    /// Advances streaming, lighting and meshing by one tick.
    ///
    /// # Arguments
    /// * `viewpoint` - Polled once for the position to stream around
    pub fn update(&mut self, viewpoint: &impl ViewpointProvider) {
        let started = Instant::now();
        let applied = self.apply_completed_results();

        self.viewpoint = viewpoint.viewpoint();
        let center = ChunkCoord::from_world_position(self.viewpoint);
        if self.viewpoint_chunk != Some(center) {
            self.viewpoint_chunk = Some(center);
            self.working_sets = WorkingSets::compute(center, self.config.load_distance, &self.chunks.coords());
            debug!(
                "Viewpoint entered chunk {}: {} to load, {} to unload",
                center,
                self.working_sets.to_load.len(),
                self.working_sets.to_unload.len()
            );
        }

        let to_unload = mem::take(&mut self.working_sets.to_unload);
        let unloaded = to_unload.len();
        for coord in to_unload {
            self.unload_chunk(coord);
        }

        let mut budget = self.config.max_chunks_per_frame;
        budget -= self.resubmit_failed_generations(budget);
        let mut submitted = 0;
        let mut consumed = 0;
        while submitted < budget && consumed < self.working_sets.to_load.len() {
            if self.load_chunk(self.working_sets.to_load[consumed]) {
                submitted += 1;
            }
            consumed += 1;
        }
        self.working_sets.to_load.drain(..consumed);

        let relit = self.apply_lighting();
        let meshing = self.schedule_mesh_builds(self.config.max_chunks_per_frame);
        self.process_queued_tasks();

        debug!(
            "Tick in {:?}: {} results, {} unloaded, {} loads, {} relit, {} mesh builds, {} loaded",
            started.elapsed(),
            applied,
            unloaded,
            submitted,
            relit,
            meshing,
            self.chunks.len()
        );
    }

    /// Inserts an empty chunk at `coord` and submits its generation.
    ///
    /// Safe to call from several threads at once; of concurrent calls for one
    /// coordinate only the first inserts and submits.
    ///
    /// # Returns
    /// `true` if this call inserted the chunk
    pub fn load_chunk(&self, coord: ChunkCoord) -> bool {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let Some(entry) = self.chunks.insert_if_absent(coord, epoch) else {
            return false;
        };
        self.submit_generation(coord, &entry);
        true
    }

    /// Removes the chunk at `coord`, releasing its meshes and detaching it from its
    /// neighbors. In-flight work for it is discarded when it completes.
    ///
    /// # Returns
    /// `true` if the chunk was loaded
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> bool {
        let Some(entry) = self.chunks.remove(coord) else {
            return false;
        };
        entry.meshes.get_mut().clear();
        self.lighting.discard(coord);
        self.retry_generation.retain(|pending| *pending != coord);

        for direction in LateralNeighbor::ALL {
            entry.state.unlink(direction);
            if let Some(neighbor) = self.chunks.get(coord.neighbor(direction)) {
                neighbor.state.unlink(direction.opposite());
                if neighbor.is_generated() {
                    neighbor.state.mark_for_rebuild();
                }
            }
        }
        true
    }

    /// Discards the chunk at `coord` and generates it again from scratch.
    pub fn regenerate_chunk(&mut self, coord: ChunkCoord) -> bool {
        self.unload_chunk(coord);
        self.load_chunk(coord)
    }

    /// Block at a world position; `AIR` where nothing is loaded.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        self.chunks.block_at(Point3::new(x, y, z))
    }

    /// Combined light at a world position; full light where nothing is loaded.
    pub fn get_light_level(&self, x: i32, y: i32, z: i32) -> u8 {
        self.chunks.light_at(Point3::new(x, y, z))
    }

    /// Replaces a block in a generated chunk.
    ///
    /// The chunk, and any neighbor sharing the edited cell's boundary, are marked for
    /// a mesh rebuild; the light change is queued for the next tick.
    ///
    /// # Returns
    /// `false` if the position is out of range or its chunk is not generated
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> bool {
        let position = Point3::new(x, y, z);
        let Some(local) = world_to_local(position) else {
            return false;
        };
        let Some(entry) = self.chunks.get_generated(local.chunk) else {
            return false;
        };
        let edit = entry
            .chunk
            .get_mut()
            .set_block(local.x, local.y, local.z, block_type);
        let Some(edit) = edit else {
            return false;
        };

        entry.state.mark_for_rebuild();
        for direction in edit.edge_neighbors.iter() {
            if let Some(neighbor) = self.chunks.get_generated(local.chunk.neighbor(direction)) {
                neighbor.state.mark_for_rebuild();
            }
        }
        if edit.previous != block_type {
            self.lighting
                .queue_block_change(local.chunk, position, edit.previous, block_type);
        }
        true
    }

    /// First solid block along a ray, sampled every 0.1 blocks.
    pub fn raycast(&self, origin: Point3<f32>, direction: Vector3<f32>, max_distance: f32) -> Option<RaycastHit> {
        raycast(&self.chunks, origin, direction, max_distance)
    }

    /// Moves the clock, queueing a sky relight of every loaded chunk if the sky level
    /// changed.
    pub fn set_time_of_day(&mut self, hours: f32) {
        if self.lighting.set_time_of_day(hours) {
            info!(
                "Time of day {:.1}h, sky level {}",
                self.lighting.time_of_day(),
                self.lighting.sunlight_level()
            );
            for coord in self.chunks.coords() {
                self.lighting.queue_sky_relight(coord);
            }
        }
    }

    pub fn time_of_day(&self) -> f32 {
        self.lighting.time_of_day()
    }

    /// Draw list for the last viewpoint.
    pub fn render_commands(&self) -> Vec<RenderCommand> {
        assemble_render_commands(&self.chunks, self.viewpoint, self.config.render_distance)
    }

    /// Services results, lighting and mesh builds until no work is left.
    ///
    /// # Returns
    /// `true` if the world went idle before `timeout` elapsed
    pub fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.apply_completed_results();
            self.resubmit_failed_generations(self.config.max_chunks_per_frame);
            self.apply_lighting();
            self.schedule_mesh_builds(self.config.max_chunks_per_frame);
            self.process_queued_tasks();

            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                warn!("World still busy after {:?}: {:?}", timeout, self.stats());
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// `true` if there are no tasks, retries, queued light updates or dirty chunks.
    pub fn is_idle(&self) -> bool {
        lock_pool(&self.generation_tasks).is_idle()
            && lock_pool(&self.mesh_tasks).is_idle()
            && self.retry_generation.is_empty()
            && self.lighting.pending_chunks() == 0
            && !self
                .chunks
                .entries()
                .iter()
                .any(|(_, entry)| entry.is_generated() && entry.state.needs_rebuild())
    }

    pub fn stats(&self) -> WorldStats {
        let entries = self.chunks.entries();
        WorldStats {
            loaded_chunks: entries.len(),
            generated_chunks: entries.iter().filter(|(_, entry)| entry.is_generated()).count(),
            generations_submitted: self.generations_submitted.load(Ordering::Relaxed),
            meshes_built: self.meshes_built,
            stale_results_discarded: self.stale_results_discarded,
            generation_failures: self.generation_failures,
            mesh_failures: self.mesh_failures,
            generation_tasks_in_flight: lock_pool(&self.generation_tasks).tasks_in_flight(),
            mesh_tasks_in_flight: lock_pool(&self.mesh_tasks).tasks_in_flight(),
            pending_light_updates: self.lighting.pending_chunks(),
            cached_world_chunks: self.generator.cached_chunks(),
        }
    }

    /// Installs generated terrain, provided the entry is still the same load.
    pub(crate) fn complete_generation(&mut self, coord: ChunkCoord, epoch: u64, chunk: Chunk, sky_level: u8) {
        let Some(entry) = self.current_entry(coord, epoch) else {
            warn!("Discarding stale generation of chunk {coord} (epoch {epoch})");
            self.stale_results_discarded += 1;
            return;
        };

        *entry.chunk.get_mut() = chunk;
        entry.state.finish_generation(true);

        for direction in LateralNeighbor::ALL {
            if let Some(neighbor) = self.chunks.get_generated(coord.neighbor(direction)) {
                entry.state.link(direction);
                neighbor.state.link(direction.opposite());
                neighbor.state.mark_for_rebuild();
            }
        }

        if sky_level == self.lighting.sunlight_level() {
            self.lighting.queue_border_refresh(coord);
        } else {
            self.lighting.queue_sky_relight(coord);
        }
    }

    /// Releases the generation claim of a failed task and queues a retry.
    pub(crate) fn fail_generation(&mut self, coord: ChunkCoord, epoch: u64) {
        let Some(entry) = self.current_entry(coord, epoch) else {
            self.stale_results_discarded += 1;
            return;
        };
        entry.state.finish_generation(false);
        self.generation_failures += 1;
        if !self.retry_generation.contains(&coord) {
            self.retry_generation.push_back(coord);
        }
    }

    /// Stores compiled meshes, provided the entry is still the same load.
    pub(crate) fn complete_mesh(&mut self, coord: ChunkCoord, epoch: u64, meshes: ChunkMeshes) {
        let Some(entry) = self.current_entry(coord, epoch) else {
            warn!("Discarding stale mesh of chunk {coord} (epoch {epoch})");
            self.stale_results_discarded += 1;
            return;
        };
        *entry.meshes.get_mut() = meshes;
        entry.state.finish_build(true);
        self.meshes_built += 1;
    }

    /// Releases the build claim of a failed task; the chunk stays dirty.
    pub(crate) fn fail_mesh(&mut self, coord: ChunkCoord, epoch: u64) {
        let Some(entry) = self.current_entry(coord, epoch) else {
            self.stale_results_discarded += 1;
            return;
        };
        entry.state.finish_build(false);
        self.mesh_failures += 1;
    }

    fn current_entry(&self, coord: ChunkCoord, epoch: u64) -> Option<LoadedChunk> {
        self.chunks
            .get(coord)
            .filter(|entry| entry.state.epoch() == epoch)
    }

    fn submit_generation(&self, coord: ChunkCoord, entry: &LoadedChunk) -> bool {
        if entry.is_generated() || !entry.state.try_begin_generation() {
            return false;
        }
        let task = ChunkGenerationTask::new(
            self.generator.clone(),
            coord,
            entry.state.epoch(),
            self.lighting.sunlight_level(),
        );
        lock_pool(&self.generation_tasks).publish_task(Box::new(task));
        self.generations_submitted.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Resubmits up to `budget` failed generations.
    ///
    /// # Returns
    /// The number submitted
    fn resubmit_failed_generations(&mut self, budget: usize) -> usize {
        let mut submitted = 0;
        while submitted < budget {
            let Some(coord) = self.retry_generation.pop_front() else {
                break;
            };
            if let Some(entry) = self.chunks.get(coord) {
                if self.submit_generation(coord, &entry) {
                    submitted += 1;
                }
            }
        }
        submitted
    }

    fn apply_completed_results(&mut self) -> usize {
        let mut results = lock_pool(&self.generation_tasks).drain_completed();
        results.extend(lock_pool(&self.mesh_tasks).drain_completed());
        let count = results.len();
        for result in results {
            result.handle_result(self);
        }
        count
    }

    fn apply_lighting(&mut self) -> usize {
        let touched = self.lighting.update(&self.chunks);
        for coord in &touched {
            if let Some(entry) = self.chunks.get_generated(*coord) {
                entry.state.mark_for_rebuild();
            }
        }
        touched.len()
    }

    /// Claims and submits up to `budget` dirty generated chunks, closest first.
    fn schedule_mesh_builds(&mut self, budget: usize) -> usize {
        let center = self.viewpoint_chunk.unwrap_or_default();
        let mut dirty: Vec<ChunkCoord> = self
            .chunks
            .entries()
            .into_iter()
            .filter(|(_, entry)| entry.is_generated() && entry.state.needs_rebuild() && !entry.state.is_building())
            .map(|(coord, _)| coord)
            .collect();
        sort_by_distance(&mut dirty, center);

        let mut submitted = 0;
        for coord in dirty {
            if submitted >= budget {
                break;
            }
            let Some(entry) = self.chunks.get_generated(coord) else {
                continue;
            };
            if !entry.state.try_begin_build() {
                continue;
            }
            let neighbors = self.chunks.generated_neighbors(coord);
            let task = ChunkMeshGenerationTask::new(coord, entry, neighbors);
            lock_pool(&self.mesh_tasks).publish_task(Box::new(task));
            submitted += 1;
        }
        submitted
    }

    fn process_queued_tasks(&mut self) {
        lock_pool(&self.generation_tasks).process_queued_tasks();
        lock_pool(&self.mesh_tasks).process_queued_tasks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_management::task::Task;
    use crate::voxels::chunk::CHUNK_WIDTH;

    fn inline_world() -> World {
        World::new(WorldConfig {
            seed: 11,
            load_distance: 2,
            render_distance: 2,
            generation_threads: Some(0),
            mesh_threads: Some(0),
            world_chunk_cache_capacity: 64,
            ..WorldConfig::default()
        })
    }

    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    #[test]
    fn update_streams_the_disc() {
        let mut world = inline_world();
        let viewpoint = Point3::new(8.0, 120.0, 8.0);
        for _ in 0..20 {
            world.update(&viewpoint);
        }
        assert!(world.wait_for_idle(IDLE_TIMEOUT));

        let stats = world.stats();
        assert_eq!(stats.loaded_chunks, 13);
        assert_eq!(stats.generated_chunks, 13);
        assert_eq!(stats.generations_submitted, 13);
        assert!(stats.meshes_built >= 13);
        assert!(world.working_sets().to_load.is_empty());
    }

    #[test]
    fn moving_away_unloads() {
        let mut world = inline_world();
        world.update(&Point3::new(8.0, 120.0, 8.0));
        assert!(world.wait_for_idle(IDLE_TIMEOUT));
        for _ in 0..20 {
            world.update(&Point3::new(8.0 + 16.0 * 10.0, 120.0, 8.0));
        }
        assert!(world.wait_for_idle(IDLE_TIMEOUT));
        assert!(!world.chunks().contains(ChunkCoord::new(0, 0)));
        assert!(world.chunks().contains(ChunkCoord::new(10, 0)));
    }

    #[test]
    fn neighbors_are_linked_both_ways() {
        let world_coord = ChunkCoord::new(0, 0);
        let east = world_coord.neighbor(LateralNeighbor::EAST);
        let mut world = inline_world();
        world.load_chunk(world_coord);
        world.load_chunk(east);
        assert!(world.wait_for_idle(IDLE_TIMEOUT));

        let center = world.chunks().get(world_coord).map(|entry| entry.state.links());
        let other = world.chunks().get(east).map(|entry| entry.state.links());
        assert_eq!(center.map(|mask| mask.contains(LateralNeighbor::EAST)), Some(true));
        assert_eq!(other.map(|mask| mask.contains(LateralNeighbor::WEST)), Some(true));

        world.unload_chunk(east);
        let center = world.chunks().get(world_coord).map(|entry| entry.state.links());
        assert_eq!(center.map(|mask| mask.is_empty()), Some(true));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let coord = ChunkCoord::new(3, 3);
        let mut world = inline_world();
        assert!(world.load_chunk(coord));
        assert!(world.unload_chunk(coord));
        assert!(world.load_chunk(coord));
        assert!(world.wait_for_idle(IDLE_TIMEOUT));

        let stats = world.stats();
        assert_eq!(stats.stale_results_discarded, 1);
        assert_eq!(stats.generated_chunks, 1);
    }

    #[test]
    fn failed_generation_is_retried() {
        let coord = ChunkCoord::new(-2, 1);
        let mut world = inline_world();
        let entry = world.chunks.insert_if_absent(coord, 99).expect("fresh coordinate");
        assert!(entry.state.try_begin_generation());

        let task = ChunkGenerationTask::new(world.generator.clone(), coord, 99, world.lighting.sunlight_level());
        task.recover().handle_result(&mut world);
        assert_eq!(world.stats().generation_failures, 1);
        assert!(!entry.state.is_generating());

        assert!(world.wait_for_idle(IDLE_TIMEOUT));
        assert!(entry.is_generated());
        assert_eq!(world.stats().generations_submitted, 1);
    }

    #[test]
    fn edits_dirty_the_chunk_and_its_border_neighbor() {
        let mut world = inline_world();
        let west = ChunkCoord::new(-1, 0);
        world.load_chunk(ChunkCoord::new(0, 0));
        world.load_chunk(west);
        assert!(world.wait_for_idle(IDLE_TIMEOUT));

        assert!(world.set_block(0, 200, 5, BlockType::GLOWSTONE));
        assert_eq!(world.get_block(0, 200, 5), BlockType::GLOWSTONE);
        let west_dirty = world.chunks().get(west).map(|entry| entry.state.needs_rebuild());
        assert_eq!(west_dirty, Some(true));

        assert!(world.wait_for_idle(IDLE_TIMEOUT));
        let spilled = world
            .chunks()
            .get(west)
            .map(|entry| entry.chunk.get().get_blocklight(CHUNK_WIDTH as i32 - 1, 200, 5));
        assert_eq!(spilled, Some(14));
        assert!(!world.set_block(0, 300, 5, BlockType::STONE));
        assert!(!world.set_block(500, 10, 5, BlockType::STONE));
    }
}
