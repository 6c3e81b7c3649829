//! # World Generation Module
//!
//! This module turns a world seed into terrain. Generation happens in two stages:
//!
//! 1. **Fields.** `WorldGenerator::get_chunk` produces a `WorldChunk` for a chunk
//!    coordinate: ocean floor height, island heights, biomes, climate, ocean currents,
//!    waves and hazards. World chunks are cached in a bounded LRU.
//! 2. **Voxels.** `WorldGenerator::generate_chunk_blocks` fills a `Chunk` from the
//!    fields: strata, water, caves, ores, trees and structures.
//!
//! ## Islands
//!
//! The world is divided into square island cells of `ISLAND_CELL_SIZE` blocks. Each
//! cell holds at most one island, decided by island noise sampled at the cell center.
//! The island's center is jittered by a hash of the seed and the cell, and its type is
//! picked by `IslandType::select`. Placement depends only on the seed and the cell
//! coordinate, so any chunk that asks for an island cell gets the same island.
//!
//! ## Determinism
//!
//! Everything here is a pure function of the seed. Two generators built with the same
//! settings return identical world chunks and identical block arrays for every
//! coordinate, in any order and on any thread.

use std::{f64::consts::PI, num::NonZeroUsize, sync::Arc};

use cgmath::Point2;
use lru::LruCache;

use crate::core::MtResource;
use crate::voxels::chunk::{coord::ChunkCoord, CHUNK_DEPTH, CHUNK_LAYER_SIZE, CHUNK_WIDTH};

use biome::{classify_biome, Biome};
use island::{Island, IslandType, MAX_ISLAND_RADIUS};
use noise_generator::{FractalParams, NoiseGenerator, NoisePurpose};
use world_chunk::WorldChunk;

pub mod biome;
pub mod hazard;
pub mod island;
pub mod noise_generator;
pub mod terrain;
pub mod world_chunk;

/// Side length of an island cell, in blocks.
pub const ISLAND_CELL_SIZE: i32 = 160;
/// Largest offset of an island center from its cell center, per axis.
pub const ISLAND_JITTER: i32 = 24;
/// Frequency at which island noise is sampled at cell centers.
const ISLAND_FREQUENCY: f64 = 0.0031;
/// Island noise value a cell center must exceed to hold an island.
const ISLAND_THRESHOLD: f64 = 0.05;
/// Island cells remembered by the generator.
const ISLAND_CACHE_CAPACITY: usize = 256;
/// Depth of the mean ocean floor below sea level.
const OCEAN_FLOOR_DEPTH: f32 = 24.0;
/// Amplitude of ocean floor relief.
const OCEAN_FLOOR_RELIEF: f32 = 8.0;

const FLOOR_NOISE: FractalParams = FractalParams::new(4, 0.5, 2.0);
const CLIMATE_NOISE: FractalParams = FractalParams::new(3, 0.5, 2.0);
const WAVE_NOISE: FractalParams = FractalParams::new(3, 0.6, 2.0);

/// Seed and vertical limits shared by every generation stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GenerationSettings {
    pub seed: u32,
    pub sea_level: i32,
    pub max_height: i32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            seed: 0,
            sea_level: 64,
            max_height: 128,
        }
    }
}

/// Mixes a seed and a 2D integer coordinate into a well-distributed 64-bit value.
pub(crate) fn hash_coords(seed: u64, x: i32, z: i32) -> u64 {
    let mut hash = seed
        ^ (x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (z as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    hash = (hash ^ (hash >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    hash = (hash ^ (hash >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    hash ^ (hash >> 31)
}

/// Produces world chunks and voxelized chunks for one seed.
///
/// The generator is shared by all generation workers. Its noise fields are immutable
/// and its caches sit behind `MtResource` locks, so `&WorldGenerator` is all a
/// worker needs.
pub struct WorldGenerator {
    settings: GenerationSettings,
    terrain_noise: NoiseGenerator,
    temperature_noise: NoiseGenerator,
    humidity_noise: NoiseGenerator,
    cave_noise: NoiseGenerator,
    ore_noise: NoiseGenerator,
    island_noise: NoiseGenerator,
    current_noise: NoiseGenerator,
    wave_noise: NoiseGenerator,
    chunk_cache: MtResource<LruCache<ChunkCoord, Arc<WorldChunk>>>,
    island_cells: MtResource<LruCache<(i32, i32), Option<Arc<Island>>>>,
}

impl WorldGenerator {
    /// Creates a generator.
    ///
    /// # Arguments
    /// * `settings` - Seed, sea level and max height of the world
    /// * `cache_capacity` - Number of world chunks kept in the LRU cache; 0 is treated as 1
    pub fn new(settings: GenerationSettings, cache_capacity: usize) -> Self {
        let seed = settings.seed;
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let island_capacity = NonZeroUsize::new(ISLAND_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        WorldGenerator {
            settings,
            terrain_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::TERRAIN),
            temperature_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::TEMPERATURE),
            humidity_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::HUMIDITY),
            cave_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::CAVES),
            ore_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::ORES),
            island_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::ISLANDS),
            current_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::CURRENTS),
            wave_noise: NoiseGenerator::for_purpose(seed, NoisePurpose::WAVES),
            chunk_cache: MtResource::new(LruCache::new(capacity)),
            island_cells: MtResource::new(LruCache::new(island_capacity)),
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn sea_level(&self) -> i32 {
        self.settings.sea_level
    }

    /// Number of world chunks currently cached.
    pub fn cached_chunks(&self) -> usize {
        self.chunk_cache.get().len()
    }

    /// Returns the world chunk at `(cx, cz)`, generating and caching it on a miss.
    ///
    /// # Arguments
    /// * `cx` - Chunk X coordinate
    /// * `cz` - Chunk Z coordinate
    ///
    /// # Returns
    /// The shared, immutable world chunk
    pub fn get_chunk(&self, cx: i32, cz: i32) -> Arc<WorldChunk> {
        let coord = ChunkCoord::new(cx, cz);
        if let Some(cached) = self.chunk_cache.get_mut().get(&coord) {
            return cached.clone();
        }

        // Generated outside the lock; a concurrent miss on the same coordinate
        // produces an identical chunk.
        let chunk = Arc::new(self.generate_world_chunk(coord));
        self.chunk_cache.get_mut().put(coord, chunk.clone());
        chunk
    }

    fn generate_world_chunk(&self, coord: ChunkCoord) -> WorldChunk {
        let origin = coord.origin();
        let min = Point2::new(origin.x, origin.z);
        let max = Point2::new(origin.x + CHUNK_WIDTH as i32 - 1, origin.z + CHUNK_DEPTH as i32 - 1);
        let islands = self.islands_in(min, max);
        let sea_level = self.settings.sea_level;

        let mut heights = [0.0; CHUNK_LAYER_SIZE];
        let mut biomes = [Biome::OCEAN; CHUNK_LAYER_SIZE];
        let mut temperature = [0.0; CHUNK_LAYER_SIZE];
        let mut humidity = [0.0; CHUNK_LAYER_SIZE];

        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                let index = z * CHUNK_WIDTH + x;
                let wx = origin.x + x as i32;
                let wz = origin.z + z as i32;

                let floor = self.ocean_floor(wx, wz);
                let owner = islands
                    .iter()
                    .map(|island| (island, island.height_at(wx, wz)))
                    .filter(|(_, height)| *height > floor)
                    .max_by(|a, b| a.1.total_cmp(&b.1));

                let (base_temperature, base_humidity) = self.climate(wx, wz);
                let (height, biome, column_temperature, column_humidity) = match owner {
                    Some((island, height)) => {
                        let climate = island.island_type().climate();
                        (
                            height,
                            island.biome_at(wx, wz),
                            (base_temperature * 0.3 + climate.temperature).clamp(-1.0, 1.0),
                            (base_humidity * 0.3 + climate.humidity).clamp(-1.0, 1.0),
                        )
                    }
                    None => (
                        floor,
                        classify_biome(floor, sea_level, base_temperature, base_humidity),
                        base_temperature,
                        base_humidity,
                    ),
                };

                heights[index] = height.min(self.settings.max_height as f32);
                biomes[index] = biome;
                temperature[index] = column_temperature as f32;
                humidity[index] = column_humidity as f32;
            }
        }

        let (current_direction, current_strength) = self.current(coord);
        let center_x = (origin.x + CHUNK_WIDTH as i32 / 2) as f64;
        let center_z = (origin.z + CHUNK_DEPTH as i32 / 2) as f64;
        let chop = self.wave_noise.turbulence(center_x * 0.02, center_z * 0.02, WAVE_NOISE);
        let wave_height = (chop * (0.5 + current_strength as f64) * 2.0) as f32;

        let hazards = if islands.is_empty() {
            hazard::roll_hazard(self.settings.seed, coord).into_iter().collect()
        } else {
            Vec::new()
        };

        WorldChunk {
            coord,
            heights,
            biomes,
            temperature,
            humidity,
            current_direction,
            current_strength,
            wave_height,
            islands,
            hazards,
        }
    }

    /// Ocean floor height of a world column, before islands.
    fn ocean_floor(&self, wx: i32, wz: i32) -> f32 {
        let relief = self.terrain_noise.fractal(wx as f64 * 0.01, wz as f64 * 0.01, FLOOR_NOISE);
        self.settings.sea_level as f32 - OCEAN_FLOOR_DEPTH + relief as f32 * OCEAN_FLOOR_RELIEF
    }

    fn climate(&self, wx: i32, wz: i32) -> (f64, f64) {
        let x = wx as f64 * 0.003;
        let z = wz as f64 * 0.003;
        (
            self.temperature_noise.fractal(x, z, CLIMATE_NOISE),
            self.humidity_noise.fractal(x, z, CLIMATE_NOISE),
        )
    }

    /// Direction (radians) and strength of the ocean current over a chunk.
    ///
    /// The base flow comes from current noise. Each nearby island adds a tangential
    /// swirl that fades out at three island radii.
    fn current(&self, coord: ChunkCoord) -> (f32, f32) {
        let angle = self.current_noise.sample_2d(coord.x as f64 * 0.05, coord.z as f64 * 0.05) * PI;
        let strength = (self.current_noise.sample_2d(coord.z as f64 * 0.05 + 50.0, coord.x as f64 * 0.05) + 1.0) / 2.0;
        let mut flow_x = angle.cos() * strength;
        let mut flow_z = angle.sin() * strength;

        let origin = coord.origin();
        let center = Point2::new(origin.x + CHUNK_WIDTH as i32 / 2, origin.z + CHUNK_DEPTH as i32 / 2);
        let reach = MAX_ISLAND_RADIUS * 3;
        let nearby = self.islands_in(
            Point2::new(center.x - reach, center.y - reach),
            Point2::new(center.x + reach, center.y + reach),
        );
        for island in nearby {
            let dx = (center.x - island.center().x) as f64;
            let dz = (center.y - island.center().y) as f64;
            let distance = (dx * dx + dz * dz).sqrt();
            let influence = island.radius() as f64 * 3.0;
            if distance < 1.0 || distance >= influence {
                continue;
            }
            let weight = (1.0 - distance / influence) * 0.5;
            flow_x += -dz / distance * weight;
            flow_z += dx / distance * weight;
        }

        let direction = flow_z.atan2(flow_x) as f32;
        let magnitude = (flow_x * flow_x + flow_z * flow_z).sqrt().clamp(0.0, 1.0) as f32;
        (direction, magnitude)
    }

    /// Islands whose footprint intersects the inclusive world rectangle `min..=max`,
    /// ordered by cell.
    pub fn islands_in(&self, min: Point2<i32>, max: Point2<i32>) -> Vec<Arc<Island>> {
        let margin = MAX_ISLAND_RADIUS + ISLAND_JITTER + ISLAND_CELL_SIZE / 2;
        let first_x = (min.x - margin).div_euclid(ISLAND_CELL_SIZE);
        let last_x = (max.x + margin).div_euclid(ISLAND_CELL_SIZE);
        let first_z = (min.y - margin).div_euclid(ISLAND_CELL_SIZE);
        let last_z = (max.y + margin).div_euclid(ISLAND_CELL_SIZE);

        let mut islands = Vec::new();
        for cell_z in first_z..=last_z {
            for cell_x in first_x..=last_x {
                if let Some(island) = self.island_for_cell(cell_x, cell_z) {
                    if island.intersects(min, max) {
                        islands.push(island);
                    }
                }
            }
        }
        islands
    }

    /// The island of one island cell, if the cell holds one.
    pub fn island_for_cell(&self, cell_x: i32, cell_z: i32) -> Option<Arc<Island>> {
        if let Some(cached) = self.island_cells.get_mut().get(&(cell_x, cell_z)) {
            return cached.clone();
        }

        let island = self.place_island(cell_x, cell_z).map(Arc::new);
        self.island_cells.get_mut().put((cell_x, cell_z), island.clone());
        island
    }

    fn place_island(&self, cell_x: i32, cell_z: i32) -> Option<Island> {
        let center_x = cell_x * ISLAND_CELL_SIZE + ISLAND_CELL_SIZE / 2;
        let center_z = cell_z * ISLAND_CELL_SIZE + ISLAND_CELL_SIZE / 2;
        let presence = self
            .island_noise
            .sample_2d(center_x as f64 * ISLAND_FREQUENCY, center_z as f64 * ISLAND_FREQUENCY);
        if presence <= ISLAND_THRESHOLD {
            return None;
        }

        let hash = hash_coords(self.settings.seed as u64 ^ 0x1_51A4_D5EE, cell_x, cell_z);
        let span = (2 * ISLAND_JITTER + 1) as u64;
        let jitter_x = (hash % span) as i32 - ISLAND_JITTER;
        let jitter_z = ((hash >> 32) % span) as i32 - ISLAND_JITTER;
        let center = Point2::new(center_x + jitter_x, center_z + jitter_z);

        let island_type = IslandType::select(self.settings.seed, cell_x, cell_z);
        Some(Island::generate(center, island_type, &self.settings))
    }

    /// Terrain height of any world column, islands included.
    pub fn height_at(&self, wx: i32, wz: i32) -> f32 {
        let chunk = self.get_chunk(wx.div_euclid(CHUNK_WIDTH as i32), wz.div_euclid(CHUNK_DEPTH as i32));
        chunk.height(
            wx.rem_euclid(CHUNK_WIDTH as i32) as usize,
            wz.rem_euclid(CHUNK_DEPTH as i32) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u32) -> WorldGenerator {
        WorldGenerator::new(
            GenerationSettings {
                seed,
                ..GenerationSettings::default()
            },
            64,
        )
    }

    #[test]
    fn same_seed_same_fields() {
        let a = generator(2024);
        let b = generator(2024);
        for cx in -3..3 {
            for cz in -3..3 {
                let left = a.get_chunk(cx, cz);
                let right = b.get_chunk(cx, cz);
                for z in 0..CHUNK_DEPTH {
                    for x in 0..CHUNK_WIDTH {
                        assert_eq!(left.height(x, z).to_bits(), right.height(x, z).to_bits());
                        assert_eq!(left.biome(x, z), right.biome(x, z));
                    }
                }
            }
        }
    }

    #[test]
    fn cache_returns_the_same_chunk() {
        let generator = generator(1);
        let first = generator.get_chunk(4, -2);
        let second = generator.get_chunk(4, -2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(generator.cached_chunks(), 1);
    }

    #[test]
    fn cache_is_bounded() {
        let generator = WorldGenerator::new(GenerationSettings::default(), 4);
        for cx in 0..10 {
            generator.get_chunk(cx, 0);
        }
        assert_eq!(generator.cached_chunks(), 4);
    }

    #[test]
    fn island_placement_ignores_query_order() {
        let forward = generator(99);
        let backward = generator(99);
        let cells: Vec<(i32, i32)> = (-4..4).flat_map(|x| (-4..4).map(move |z| (x, z))).collect();

        let a: Vec<_> = cells
            .iter()
            .map(|&(x, z)| forward.island_for_cell(x, z).map(|island| (island.center(), island.island_type())))
            .collect();
        let mut b: Vec<_> = cells
            .iter()
            .rev()
            .map(|&(x, z)| backward.island_for_cell(x, z).map(|island| (island.center(), island.island_type())))
            .collect();
        b.reverse();
        assert_eq!(a, b);
    }

    #[test]
    fn island_centers_stay_inside_their_cell() {
        let generator = generator(7);
        for cell_x in -6..6 {
            for cell_z in -6..6 {
                if let Some(island) = generator.island_for_cell(cell_x, cell_z) {
                    assert_eq!(island.center().x.div_euclid(ISLAND_CELL_SIZE), cell_x);
                    assert_eq!(island.center().y.div_euclid(ISLAND_CELL_SIZE), cell_z);
                }
            }
        }
    }

    #[test]
    fn open_ocean_is_below_sea_level() {
        let generator = generator(3);
        let chunk = (0..200)
            .map(|i| generator.get_chunk(i * 3, -i * 5))
            .find(|chunk| chunk.is_open_water());
        let chunk = chunk.expect("no open water found");
        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                assert!(chunk.height(x, z) < 64.0);
                assert_eq!(chunk.biome(x, z), Biome::OCEAN);
            }
        }
        assert!((0.0..=1.0).contains(&chunk.current_strength()));
    }

    #[test]
    fn islands_raise_land_above_the_sea() {
        let generator = generator(11);
        let island = (-8..8)
            .flat_map(|x| (-8..8).map(move |z| (x, z)))
            .find_map(|(x, z)| generator.island_for_cell(x, z))
            .expect("no island in 256 cells");
        let center = island.center();
        assert!(generator.height_at(center.x, center.y) >= island.height_at(center.x, center.y));
    }

    #[test]
    fn hash_spreads_neighbors() {
        assert_ne!(hash_coords(1, 0, 0), hash_coords(1, 1, 0));
        assert_ne!(hash_coords(1, 0, 1), hash_coords(1, 1, 0));
        assert_eq!(hash_coords(5, -3, 9), hash_coords(5, -3, 9));
    }
}
