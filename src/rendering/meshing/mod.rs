//! # Chunk Meshing Module
//!
//! This module compiles a chunk's blocks into render-ready geometry.
//!
//! ## Face Culling
//!
//! Every non-air block considers its six faces independently. A face is emitted only
//! when the block it looks into lets it be seen (`should_render_face`):
//!
//! | Block       | Face emitted against                         |
//! |-------------|----------------------------------------------|
//! | any         | air                                          |
//! | water       | anything but water                           |
//! | transparent | anything that is neither the same block nor opaque |
//! | solid       | any transparent block                        |
//!
//! Lookups that fall outside the chunk go through the chunk's linked neighbors. An
//! absent neighbor, or a cell above or below the column, reads as air, so chunk
//! borders facing unloaded space are closed off.
//!
//! ## Buffers
//!
//! Faces are sorted into three buffers by the block that owns them: water, other
//! transparent blocks, and everything else. Each face contributes four vertices and
//! two triangles. Vertex colors are the block's base color scaled by the light level
//! of the cell the face looks into.

pub mod face;
pub mod mesh;

use crate::voxels::{
    block::{block_side::BlockSide, block_type::BlockType},
    chunk::{Chunk, ChunkNeighbors, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH, MAX_LIGHT},
};

use face::Face;
use mesh::{ChunkMesh, ChunkMeshes};

/// Whether the face of `block` looking into `neighbor` is visible.
pub fn should_render_face(block: BlockType, neighbor: BlockType) -> bool {
    if block.is_air() {
        return false;
    }
    if neighbor.is_air() {
        return true;
    }
    if block.is_water() {
        return !neighbor.is_water();
    }
    if block.is_transparent() {
        return neighbor != block && !neighbor.is_opaque();
    }
    neighbor.is_transparent()
}

/// Scales a base color by a light level, keeping alpha.
fn lit_color(base: [f32; 4], light: u8) -> [f32; 4] {
    let factor = light.min(MAX_LIGHT) as f32 / MAX_LIGHT as f32;
    [base[0] * factor, base[1] * factor, base[2] * factor, base[3]]
}

/// Builds per-queue meshes for chunks.
pub struct ChunkMeshBuilder;

impl ChunkMeshBuilder {
    /// Compiles `chunk` against its linked neighbors.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to mesh
    /// * `neighbors` - The chunk's loaded lateral neighbors
    ///
    /// # Returns
    /// The solid, transparent and water meshes; empty queues are `None`
    pub fn build(chunk: &Chunk, neighbors: &ChunkNeighbors<'_>) -> ChunkMeshes {
        let mut solid = ChunkMesh::new();
        let mut transparent = ChunkMesh::new();
        let mut water = ChunkMesh::new();

        if chunk.is_empty() {
            return ChunkMeshes::default();
        }

        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_DEPTH as i32 {
                for x in 0..CHUNK_WIDTH as i32 {
                    let block = chunk.get_block(x, y, z);
                    if block.is_air() {
                        continue;
                    }

                    let target = if block.is_water() {
                        &mut water
                    } else if block.is_transparent() {
                        &mut transparent
                    } else {
                        &mut solid
                    };

                    for side in BlockSide::all() {
                        let offset = side.offset();
                        let (nx, ny, nz) = (x + offset.x, y + offset.y, z + offset.z);
                        let neighbor = chunk.get_neighbor_block(nx, ny, nz, neighbors);
                        if !should_render_face(block, neighbor) {
                            continue;
                        }
                        let light = chunk.get_neighbor_light_level(nx, ny, nz, neighbors);
                        target.push_face(&Face::new(x, y, z, side), lit_color(block.base_color(), light));
                    }
                }
            }
        }

        ChunkMeshes::from_buffers(solid, transparent, water)
    }
}
