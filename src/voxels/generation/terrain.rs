//! # Terrain Voxelization
//!
//! Fills a `Chunk` from the fields of its `WorldChunk`. Columns are filled bottom-up:
//!
//! ```text
//! y = 0                       bedrock
//! 1 ..= surface - 4           stone, with coal and iron veins
//! surface - 3 ..= surface - 1 biome sub-surface (dirt or sand)
//! surface                     biome surface block
//! surface + 1 ..= sea level   water, with ice on frozen oceans
//! ```
//!
//! Caves are carved from 3D cave noise above `CAVE_FLOOR` while keeping at least
//! `CAVE_ROOF` blocks of rock under the surface, and low cave floors collect lava.
//!
//! Trees and structures are owned by islands, not by chunks. A chunk places every
//! tree and structure block that lands inside it, including canopies of trees rooted
//! in neighboring chunks, so a tree on a chunk border is the same tree from both sides.

use cgmath::{Point2, Point3};

use super::{
    biome::Biome, hash_coords, noise_generator::FractalParams, world_chunk::WorldChunk,
    WorldGenerator,
};
use crate::voxels::{
    block::block_type::BlockType,
    chunk::{coord::ChunkCoord, in_bounds, Chunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH},
};

const CAVE_NOISE: FractalParams = FractalParams::new(3, 0.5, 2.0);
/// Cave noise above which rock is carved out.
const CAVE_THRESHOLD: f64 = 0.32;
/// Caves only exist above this height.
const CAVE_FLOOR: i32 = 4;
/// Minimum rock between a cave and the surface.
const CAVE_ROOF: i32 = 3;
const SUBSURFACE_DEPTH: i32 = 3;
/// Cave floors below this height may hold lava.
const LAVA_LEVEL: i32 = 12;
/// Horizontal extent of a canopy around its trunk.
const TREE_REACH: i32 = 2;
/// Horizontal extent of a structure around its anchor.
const STRUCTURE_REACH: i32 = 7;
/// Space kept free above the highest surface for trees and structures.
const HEADROOM: i32 = 16;

/// Height of a tree trunk seeded with `growth`.
fn trunk_height(growth: u64) -> i32 {
    4 + (growth % 3) as i32
}

/// Sets a block given in world coordinates if it lies inside `chunk`. With
/// `into_air_only`, occupied cells are left alone.
fn place(chunk: &mut Chunk, position: Point3<i32>, block: BlockType, into_air_only: bool) {
    let origin = chunk.position().origin();
    let (x, y, z) = (position.x - origin.x, position.y, position.z - origin.z);
    if !in_bounds(x, y, z) {
        return;
    }
    if into_air_only && !chunk.get_block(x, y, z).is_air() {
        return;
    }
    chunk.set_block(x, y, z, block);
}

/// World rectangle covered by `coord`, grown by `margin` on every side.
fn footprint(coord: ChunkCoord, margin: i32) -> (Point2<i32>, Point2<i32>) {
    let origin = coord.origin();
    (
        Point2::new(origin.x - margin, origin.z - margin),
        Point2::new(
            origin.x + CHUNK_WIDTH as i32 - 1 + margin,
            origin.z + CHUNK_DEPTH as i32 - 1 + margin,
        ),
    )
}

impl WorldGenerator {
    /// Voxelizes the chunk at `coord`.
    ///
    /// # Arguments
    /// * `coord` - Chunk coordinate to generate
    ///
    /// # Returns
    /// A fully populated chunk with no light stored
    pub fn generate_chunk_blocks(&self, coord: ChunkCoord) -> Chunk {
        let fields = self.get_chunk(coord.x, coord.z);
        let mut chunk = Chunk::new(coord);

        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                self.fill_column(&mut chunk, &fields, x, z);
            }
        }
        self.place_vegetation(&mut chunk);
        self.place_structures(&mut chunk);

        chunk
    }

    /// Y of the surface block of a column with terrain height `height`.
    pub fn surface_y(&self, height: f32) -> i32 {
        (height.floor() as i32).clamp(1, CHUNK_HEIGHT as i32 - HEADROOM)
    }

    fn fill_column(&self, chunk: &mut Chunk, fields: &WorldChunk, x: usize, z: usize) {
        let sea_level = self.settings.sea_level;
        let surface = self.surface_y(fields.height(x, z));
        let biome = fields.biome(x, z);
        let origin = chunk.position().origin();
        let (lx, lz) = (x as i32, z as i32);
        let wx = (origin.x + lx) as f64;
        let wz = (origin.z + lz) as f64;

        chunk.set_block(lx, 0, lz, BlockType::BEDROCK);
        for y in 1..=surface {
            let mut block = if y == surface {
                match biome {
                    Biome::OCEAN if surface >= sea_level - 3 => BlockType::SAND,
                    _ => biome.surface_block(),
                }
            } else if y >= surface - SUBSURFACE_DEPTH {
                biome.subsurface_block()
            } else {
                self.ore_at(wx, y, wz)
            };

            if y > CAVE_FLOOR && y <= surface - CAVE_ROOF {
                let density = self.cave_noise.fractal_3d(wx * 0.05, y as f64 * 0.08, wz * 0.05, CAVE_NOISE);
                if density > CAVE_THRESHOLD {
                    block = BlockType::AIR;
                }
            }
            chunk.set_block(lx, y, lz, block);
        }

        for y in (CAVE_FLOOR + 1)..LAVA_LEVEL.min(surface) {
            let floor = chunk.get_block(lx, y - 1, lz);
            if chunk.get_block(lx, y, lz).is_air()
                && floor.is_solid()
                && self.ore_noise.sample_3d(wx * 0.11, y as f64 * 0.11 + 7.0, wz * 0.11) > 0.25
            {
                chunk.set_block(lx, y, lz, BlockType::LAVA);
            }
        }

        let frozen = Biome::freezes(fields.temperature(x, z) as f64);
        for y in (surface + 1)..=sea_level {
            let block = if frozen && y == sea_level {
                BlockType::ICE
            } else {
                BlockType::WATER
            };
            chunk.set_block(lx, y, lz, block);
        }
    }

    fn ore_at(&self, wx: f64, y: i32, wz: f64) -> BlockType {
        let vein = self.ore_noise.sample_3d(wx * 0.15, y as f64 * 0.15, wz * 0.15);
        if y < 40 && vein > 0.55 {
            BlockType::IRON_ORE
        } else if vein < -0.55 {
            BlockType::COAL_ORE
        } else {
            BlockType::STONE
        }
    }

    fn place_vegetation(&self, chunk: &mut Chunk) {
        let (min, max) = footprint(chunk.position(), TREE_REACH);
        let mut trunks = Vec::new();

        for island in self.islands_in(min, max) {
            for wz in min.y..=max.y {
                for wx in min.x..=max.x {
                    if !island.has_vegetation(wx, wz) {
                        continue;
                    }
                    let biome = island.biome_at(wx, wz);
                    // Overlapping islands and the ocean floor can rise above this island.
                    let ground = self.surface_y(self.height_at(wx, wz));
                    let growth = hash_coords(island.seed(), wx, wz);

                    if biome.grows_cacti() {
                        for dy in 1..=(2 + (growth % 3) as i32) {
                            trunks.push((Point3::new(wx, ground + dy, wz), BlockType::CACTUS));
                        }
                        continue;
                    }

                    let height = trunk_height(growth);
                    for dy in (height - 2)..=(height + 1) {
                        let reach = if dy >= height { 1 } else { TREE_REACH };
                        for dz in -reach..=reach {
                            for dx in -reach..=reach {
                                let corner = dx.abs() == reach && dz.abs() == reach;
                                if corner && (reach == TREE_REACH || dy == height + 1) {
                                    continue;
                                }
                                place(chunk, Point3::new(wx + dx, ground + dy, wz + dz), BlockType::LEAVES, true);
                            }
                        }
                    }
                    for dy in 1..=height {
                        trunks.push((Point3::new(wx, ground + dy, wz), BlockType::WOOD));
                    }
                }
            }
        }

        for (position, block) in trunks {
            place(chunk, position, block, false);
        }
    }

    fn place_structures(&self, chunk: &mut Chunk) {
        let (min, max) = footprint(chunk.position(), STRUCTURE_REACH);
        for island in self.islands_in(min, max) {
            for structure in island.structures() {
                for (position, block) in structure.blocks(self.settings.sea_level) {
                    place(chunk, position, block, false);
                }
            }
        }
    }
}
