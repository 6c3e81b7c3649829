//! # Lighting Module
//!
//! Sunlight and block light for loaded chunks.
//!
//! ## Channels
//!
//! Every cell stores two 4-bit channels. Sunlight comes from the sky and its strength
//! follows the time of day; block light comes from emitters such as torches and lava.
//! The level used for rendering is the brighter of the two.
//!
//! ## Where Lighting Runs
//!
//! - **Generation workers** light a freshly voxelized chunk on its own with
//!   `light_new_chunk`, before the chunk joins the map.
//! - **The orchestrating thread** owns the `LightingEngine`. Block edits, chunks
//!   joining their neighbors and sky level changes queue work per chunk, and
//!   `LightingEngine::update` drains that work once per tick against the chunk map.
//!
//! Chunks that are not loaded or not yet generated are never read or written. Work
//! queued for them is dropped.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;

use crate::voxels::{
    block::{block_side::BlockSide, block_type::BlockType},
    chunk::{
        coord::{world_to_local, ChunkCoord, LateralNeighbor},
        Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH, MAX_LIGHT,
    },
    chunk_map::{ChunkMap, LoadedChunk},
};

pub mod propagation;

use propagation::{LightChannel, LightPropagator, LightVolume};

/// Sunlight level during full daylight.
pub const DAY_LIGHT: u8 = MAX_LIGHT;
/// Sunlight level at night.
pub const NIGHT_LIGHT: u8 = 4;

/// Sunlight level at `hours` on the 24-hour clock.
///
/// Full daylight from 07:00 to 17:00, night from 19:00 to 05:00, and a linear ramp
/// between the two over dawn (05:00 to 07:00) and dusk (17:00 to 19:00).
pub fn sunlight_for_time(hours: f32) -> u8 {
    let hours = hours.rem_euclid(24.0);
    let span = (DAY_LIGHT - NIGHT_LIGHT) as f32;
    let level = if (7.0..=17.0).contains(&hours) {
        DAY_LIGHT as f32
    } else if hours > 5.0 && hours < 7.0 {
        NIGHT_LIGHT as f32 + span * (hours - 5.0) / 2.0
    } else if hours > 17.0 && hours < 19.0 {
        DAY_LIGHT as f32 - span * (hours - 17.0) / 2.0
    } else {
        NIGHT_LIGHT as f32
    };
    level.round() as u8
}

/// Fills a chunk's sunlight channel column by column and seeds block light with
/// each block's emission.
///
/// Each column starts at `sky_level` at the top and loses each non-air block's
/// opacity on the way down; every cell stores the level left after its own block.
pub fn compute_initial_sunlight(chunk: &mut Chunk, sky_level: u8) {
    for z in 0..CHUNK_DEPTH as i32 {
        for x in 0..CHUNK_WIDTH as i32 {
            let mut running = sky_level.min(MAX_LIGHT);
            for y in (0..CHUNK_HEIGHT as i32).rev() {
                let block = chunk.get_block(x, y, z);
                if !block.is_air() {
                    running = running.saturating_sub(block.opacity());
                }
                chunk.set_sunlight(x, y, z, running);
                chunk.set_blocklight(x, y, z, block.light_emission());
            }
        }
    }
}

/// Lights a chunk that has no neighbors yet: sky columns, then a flood of sunlight
/// under overhangs and of block light from every emitter, all within the chunk.
pub fn light_new_chunk(chunk: &mut Chunk, sky_level: u8) {
    compute_initial_sunlight(chunk, sky_level);

    let mut propagator = LightPropagator::new(sky_level);
    seed_chunk(chunk, &mut propagator);
    propagator.run(chunk);
}

fn seed_chunk(chunk: &Chunk, propagator: &mut LightPropagator) {
    let lateral = [
        BlockSide::FRONT,
        BlockSide::BACK,
        BlockSide::LEFT,
        BlockSide::RIGHT,
    ];
    for y in 0..CHUNK_HEIGHT as i32 {
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let position = Point3::new(x, y, z);
                if chunk.get_blocklight(x, y, z) > 1 {
                    propagator.seed(position, LightChannel::BLOCKLIGHT);
                }
                let sunlight = chunk.get_sunlight(x, y, z);
                if sunlight > 1 {
                    let darker_neighbor = lateral.iter().any(|side| {
                        let neighbor = position + side.offset();
                        crate::voxels::chunk::in_bounds(neighbor.x, neighbor.y, neighbor.z)
                            && chunk.get_sunlight(neighbor.x, neighbor.y, neighbor.z) + 1 < sunlight
                    });
                    if darker_neighbor {
                        propagator.seed(position, LightChannel::SUNLIGHT);
                    }
                }
            }
        }
    }
}

/// Lighting work waiting for the next tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightUpdate {
    /// A block at a world position was replaced.
    BlockChange {
        position: Point3<i32>,
        previous: BlockType,
        current: BlockType,
    },
    /// The chunk gained or changed neighbors; light must cross the shared borders.
    BorderRefresh,
    /// The sky level changed; the chunk's sunlight must be recomputed.
    SkyRelight,
}

/// A `LightVolume` over the generated chunks of a chunk map, in world coordinates.
///
/// Records every chunk whose light it writes, plus the lateral neighbor across the
/// border when the written cell sits on one, since that neighbor's faces sample it.
struct MapVolume<'a> {
    map: &'a ChunkMap,
    lookups: HashMap<ChunkCoord, Option<LoadedChunk>>,
    touched: HashSet<ChunkCoord>,
}

impl<'a> MapVolume<'a> {
    fn new(map: &'a ChunkMap) -> Self {
        MapVolume {
            map,
            lookups: HashMap::new(),
            touched: HashSet::new(),
        }
    }

    fn entry(&mut self, coord: ChunkCoord) -> Option<LoadedChunk> {
        let map = self.map;
        self.lookups
            .entry(coord)
            .or_insert_with(|| map.get_generated(coord))
            .clone()
    }
}

impl LightVolume for MapVolume<'_> {
    fn cell(&mut self, position: Point3<i32>, channel: LightChannel) -> Option<(BlockType, u8)> {
        let local = world_to_local(position)?;
        let entry = self.entry(local.chunk)?;
        let chunk = entry.chunk.get();
        let level = match channel {
            LightChannel::SUNLIGHT => chunk.get_sunlight(local.x, local.y, local.z),
            LightChannel::BLOCKLIGHT => chunk.get_blocklight(local.x, local.y, local.z),
        };
        Some((chunk.get_block(local.x, local.y, local.z), level))
    }

    fn set_light(&mut self, position: Point3<i32>, channel: LightChannel, level: u8) {
        let Some(local) = world_to_local(position) else {
            return;
        };
        let Some(entry) = self.entry(local.chunk) else {
            return;
        };
        entry
            .chunk
            .get_mut()
            .set_light(Point3::new(local.x, local.y, local.z), channel, level);

        self.touched.insert(local.chunk);
        for direction in border_directions(local.x, local.z) {
            self.touched.insert(local.chunk.neighbor(direction));
        }
    }
}

/// Lateral directions in which a local column touches the chunk border.
fn border_directions(x: i32, z: i32) -> Vec<LateralNeighbor> {
    let mut directions = Vec::new();
    if x == 0 {
        directions.push(LateralNeighbor::WEST);
    }
    if x == CHUNK_WIDTH as i32 - 1 {
        directions.push(LateralNeighbor::EAST);
    }
    if z == 0 {
        directions.push(LateralNeighbor::NORTH);
    }
    if z == CHUNK_DEPTH as i32 - 1 {
        directions.push(LateralNeighbor::SOUTH);
    }
    directions
}

/// Owns the time of day, the derived sky level and all queued lighting work.
pub struct LightingEngine {
    time_of_day: f32,
    sunlight_level: u8,
    pending: HashMap<ChunkCoord, Vec<LightUpdate>>,
    propagator: LightPropagator,
}

impl LightingEngine {
    /// Creates an engine at `time_of_day` hours.
    pub fn new(time_of_day: f32) -> Self {
        let time_of_day = time_of_day.rem_euclid(24.0);
        let sunlight_level = sunlight_for_time(time_of_day);
        LightingEngine {
            time_of_day,
            sunlight_level,
            pending: HashMap::new(),
            propagator: LightPropagator::new(sunlight_level),
        }
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// Current sky level, in `[NIGHT_LIGHT, DAY_LIGHT]`.
    pub fn sunlight_level(&self) -> u8 {
        self.sunlight_level
    }

    /// Moves the clock to `hours` (wrapped into `[0, 24)`).
    ///
    /// # Returns
    /// `true` if the sky level changed, in which case loaded chunks need a sky relight
    pub fn set_time_of_day(&mut self, hours: f32) -> bool {
        self.time_of_day = hours.rem_euclid(24.0);
        let level = sunlight_for_time(self.time_of_day);
        let changed = level != self.sunlight_level;
        self.sunlight_level = level;
        self.propagator.set_sky_level(level);
        changed
    }

    pub fn queue_block_change(
        &mut self,
        coord: ChunkCoord,
        position: Point3<i32>,
        previous: BlockType,
        current: BlockType,
    ) {
        self.pending.entry(coord).or_default().push(LightUpdate::BlockChange {
            position,
            previous,
            current,
        });
    }

    pub fn queue_border_refresh(&mut self, coord: ChunkCoord) {
        self.pending.entry(coord).or_default().push(LightUpdate::BorderRefresh);
    }

    pub fn queue_sky_relight(&mut self, coord: ChunkCoord) {
        self.pending.entry(coord).or_default().push(LightUpdate::SkyRelight);
    }

    /// Drops queued work for a chunk that is being unloaded.
    pub fn discard(&mut self, coord: ChunkCoord) {
        self.pending.remove(&coord);
    }

    /// Number of chunks with queued work.
    pub fn pending_chunks(&self) -> usize {
        self.pending.len()
    }

    /// Applies all queued work against the chunk map.
    ///
    /// # Returns
    /// The chunks whose light changed, including neighbors whose border cells are
    /// sampled across the changed cells
    pub fn update(&mut self, map: &ChunkMap) -> HashSet<ChunkCoord> {
        let mut pending: Vec<(ChunkCoord, Vec<LightUpdate>)> = self
            .pending
            .drain()
            .filter(|(coord, _)| map.get_generated(*coord).is_some())
            .collect();
        pending.sort_by_key(|(coord, _)| *coord);

        let mut volume = MapVolume::new(map);

        // Every relit chunk must drop its old sunlight before any border pulls
        // light from a neighbor, or a dimming sky bleeds back in across borders.
        for (coord, updates) in &pending {
            if !updates.contains(&LightUpdate::SkyRelight) {
                continue;
            }
            if let Some(entry) = volume.entry(*coord) {
                light_new_chunk(&mut entry.chunk.get_mut(), self.sunlight_level);
                volume.touched.insert(*coord);
            }
        }

        for (_, updates) in &pending {
            for update in updates {
                if let LightUpdate::BlockChange { position, current, .. } = *update {
                    self.apply_block_change(&mut volume, position, current);
                }
            }
        }

        for (coord, updates) in &pending {
            let border_refresh = updates
                .iter()
                .any(|update| matches!(update, LightUpdate::SkyRelight | LightUpdate::BorderRefresh));
            if border_refresh {
                self.refresh_borders(&mut volume, *coord);
            }
        }

        volume.touched
    }

    fn apply_block_change(&mut self, volume: &mut MapVolume<'_>, position: Point3<i32>, current: BlockType) {
        for channel in LightChannel::ALL {
            self.propagator.remove(volume, position, channel);
        }
        for side in BlockSide::all() {
            for channel in LightChannel::ALL {
                self.propagator.seed(position + side.offset(), channel);
            }
        }
        let emission = current.light_emission();
        if emission > 0 {
            self.propagator
                .add_source(volume, position, LightChannel::BLOCKLIGHT, emission);
        }
        self.propagator.run(volume);
    }

    /// Spreads light across all four borders of `coord`, in both directions.
    fn refresh_borders(&mut self, volume: &mut MapVolume<'_>, coord: ChunkCoord) {
        let origin = coord.origin();
        let width = CHUNK_WIDTH as i32;
        let depth = CHUNK_DEPTH as i32;
        for y in 0..CHUNK_HEIGHT as i32 {
            for i in 0..width.max(depth) {
                let mut columns = Vec::with_capacity(8);
                if i < depth {
                    columns.extend([(0, i), (-1, i), (width - 1, i), (width, i)]);
                }
                if i < width {
                    columns.extend([(i, 0), (i, -1), (i, depth - 1), (i, depth)]);
                }
                for (x, z) in columns {
                    for channel in LightChannel::ALL {
                        self.propagator
                            .seed(Point3::new(origin.x + x, y, origin.z + z), channel);
                    }
                }
            }
        }
        self.propagator.run(volume);
    }

    /// Re-floods block light from every emitter in `coord`. Running it on an already
    /// lit chunk changes nothing.
    pub fn propagate_block_light(&mut self, map: &ChunkMap, coord: ChunkCoord) -> HashSet<ChunkCoord> {
        let Some(entry) = map.get_generated(coord) else {
            return HashSet::new();
        };
        let emitters: Vec<(Point3<i32>, u8)> = {
            let chunk = entry.chunk.get();
            let mut emitters = Vec::new();
            for y in 0..CHUNK_HEIGHT as i32 {
                for z in 0..CHUNK_DEPTH as i32 {
                    for x in 0..CHUNK_WIDTH as i32 {
                        let emission = chunk.get_block(x, y, z).light_emission();
                        if emission > 0 {
                            emitters.push((chunk.world_position(x, y, z), emission));
                        }
                    }
                }
            }
            emitters
        };

        let mut volume = MapVolume::new(map);
        for (position, emission) in emitters {
            self.propagator
                .add_source(&mut volume, position, LightChannel::BLOCKLIGHT, emission);
        }
        self.propagator.run(&mut volume);
        volume.touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated_map(coords: &[ChunkCoord]) -> ChunkMap {
        let map = ChunkMap::new();
        for &coord in coords {
            if let Some(entry) = map.insert_if_absent(coord, 0) {
                entry.state.try_begin_generation();
                entry.state.finish_generation(true);
            }
        }
        map
    }

    #[test]
    fn sunlight_curve() {
        assert_eq!(sunlight_for_time(12.0), DAY_LIGHT);
        assert_eq!(sunlight_for_time(7.0), DAY_LIGHT);
        assert_eq!(sunlight_for_time(17.0), DAY_LIGHT);
        assert_eq!(sunlight_for_time(0.0), NIGHT_LIGHT);
        assert_eq!(sunlight_for_time(22.5), NIGHT_LIGHT);
        assert_eq!(sunlight_for_time(5.0), NIGHT_LIGHT);
        assert_eq!(sunlight_for_time(19.0), NIGHT_LIGHT);
        assert_eq!(sunlight_for_time(6.0), 10);
        assert_eq!(sunlight_for_time(18.0), 10);
        assert_eq!(sunlight_for_time(36.0), DAY_LIGHT);
        assert!(sunlight_for_time(5.5) < sunlight_for_time(6.5));
        assert!(sunlight_for_time(17.5) > sunlight_for_time(18.5));
    }

    #[test]
    fn time_changes_report_level_changes() {
        let mut engine = LightingEngine::new(12.0);
        assert!(!engine.set_time_of_day(13.0));
        assert!(engine.set_time_of_day(23.0));
        assert_eq!(engine.sunlight_level(), NIGHT_LIGHT);
        assert!((engine.time_of_day() - 23.0).abs() < f32::EPSILON);
    }

    #[test]
    fn columns_darken_below_opaque_blocks() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set_block(3, 100, 3, BlockType::STONE);
        chunk.set_block(4, 100, 4, BlockType::WATER);
        chunk.set_block(4, 99, 4, BlockType::WATER);
        compute_initial_sunlight(&mut chunk, DAY_LIGHT);

        assert_eq!(chunk.get_sunlight(3, 101, 3), DAY_LIGHT);
        assert_eq!(chunk.get_sunlight(3, 100, 3), 0);
        assert_eq!(chunk.get_sunlight(3, 50, 3), 0);
        assert_eq!(chunk.get_sunlight(4, 100, 4), 13);
        assert_eq!(chunk.get_sunlight(4, 99, 4), 11);
        assert_eq!(chunk.get_sunlight(4, 10, 4), 11);
    }

    #[test]
    fn emitters_seed_their_own_cell() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set_block(8, 40, 8, BlockType::GLOWSTONE);
        for y in 41..60 {
            chunk.set_block(8, y, 8, BlockType::STONE);
        }
        compute_initial_sunlight(&mut chunk, DAY_LIGHT);
        assert_eq!(chunk.get_sunlight(8, 40, 8), 0);
        assert_eq!(chunk.get_light_level(8, 40, 8), 15);
    }

    #[test]
    fn new_chunks_flood_under_overhangs() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..8 {
                chunk.set_block(x, 80, z, BlockType::STONE);
            }
        }
        light_new_chunk(&mut chunk, DAY_LIGHT);
        assert_eq!(chunk.get_sunlight(8, 79, 5), DAY_LIGHT);
        assert_eq!(chunk.get_sunlight(7, 79, 5), DAY_LIGHT - 1);
        assert_eq!(chunk.get_sunlight(5, 79, 5), DAY_LIGHT - 3);
    }

    #[test]
    fn block_light_flows_across_borders() {
        let west = ChunkCoord::new(0, 0);
        let east = ChunkCoord::new(1, 0);
        let map = generated_map(&[west, east]);
        if let Some(entry) = map.get(west) {
            entry.chunk.get_mut().set_block(15, 64, 8, BlockType::TORCH);
        }

        let mut engine = LightingEngine::new(0.0);
        let touched = engine.propagate_block_light(&map, west);

        assert_eq!(map.get(east).map(|e| e.chunk.get().get_blocklight(0, 64, 8)), Some(13));
        assert_eq!(map.get(east).map(|e| e.chunk.get().get_blocklight(3, 64, 8)), Some(10));
        assert!(touched.contains(&west) && touched.contains(&east));
    }

    #[test]
    fn block_light_propagation_is_idempotent() {
        let coord = ChunkCoord::new(0, 0);
        let map = generated_map(&[coord]);
        if let Some(entry) = map.get(coord) {
            let mut chunk = entry.chunk.get_mut();
            chunk.set_block(4, 30, 4, BlockType::LANTERN);
            chunk.set_block(10, 31, 12, BlockType::TORCH);
        }

        let mut engine = LightingEngine::new(12.0);
        engine.propagate_block_light(&map, coord);
        let first = map.get(coord).map(|e| e.chunk.get().light_data().to_vec());
        engine.propagate_block_light(&map, coord);
        let second = map.get(coord).map(|e| e.chunk.get().light_data().to_vec());
        assert_eq!(first, second);
    }

    #[test]
    fn ungenerated_chunks_are_skipped() {
        let map = ChunkMap::new();
        let coord = ChunkCoord::new(0, 0);
        map.insert_if_absent(coord, 0);
        let mut engine = LightingEngine::new(12.0);
        engine.queue_border_refresh(coord);
        let touched = engine.update(&map);
        assert!(touched.is_empty());
        assert_eq!(engine.pending_chunks(), 0);
    }

    #[test]
    fn queued_torch_edit_lights_and_unlights() {
        let coord = ChunkCoord::new(0, 0);
        let map = generated_map(&[coord]);
        let torch = Point3::new(8, 30, 8);
        let entry = map.get(coord);

        if let Some(entry) = &entry {
            entry.chunk.get_mut().set_block(8, 30, 8, BlockType::TORCH);
        }
        let mut engine = LightingEngine::new(0.0);
        engine.queue_block_change(coord, torch, BlockType::AIR, BlockType::TORCH);
        engine.update(&map);
        assert_eq!(map.light_at(Point3::new(8, 30, 10)), 12);

        if let Some(entry) = &entry {
            entry.chunk.get_mut().set_block(8, 30, 8, BlockType::AIR);
        }
        engine.queue_block_change(coord, torch, BlockType::TORCH, BlockType::AIR);
        engine.update(&map);
        assert_eq!(map.get(coord).map(|e| e.chunk.get().get_blocklight(8, 30, 10)), Some(0));
    }

    #[test]
    fn dimming_sky_reaches_every_border_cell() {
        let west = ChunkCoord::new(0, 0);
        let east = ChunkCoord::new(1, 0);
        let map = generated_map(&[west, east]);

        let mut engine = LightingEngine::new(12.0);
        for coord in [west, east] {
            if let Some(entry) = map.get(coord) {
                light_new_chunk(&mut entry.chunk.get_mut(), engine.sunlight_level());
            }
            engine.queue_border_refresh(coord);
        }
        engine.update(&map);

        assert!(engine.set_time_of_day(0.0));
        for coord in [west, east] {
            engine.queue_sky_relight(coord);
        }
        let touched = engine.update(&map);
        assert!(touched.contains(&west) && touched.contains(&east));

        for coord in [west, east] {
            let entry = map.get(coord).expect("chunk is loaded");
            let chunk = entry.chunk.get();
            let brightest = chunk.light_data().iter().map(|packed| packed >> 4).max();
            let darkest = chunk.light_data().iter().map(|packed| packed >> 4).min();
            assert_eq!(brightest, Some(NIGHT_LIGHT), "{coord:?} kept daylight");
            assert_eq!(darkest, Some(NIGHT_LIGHT), "{coord:?} lost open sky");
        }
    }
}
