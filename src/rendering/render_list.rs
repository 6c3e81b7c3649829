//! # Render List
//!
//! Turns the compiled meshes in the chunk map into an ordered list of draw
//! commands. Assembly only reads the map; it never schedules work or touches
//! chunk data.
//!
//! ## Ordering
//!
//! Solid meshes come first, nearest chunk first, so depth testing rejects hidden
//! fragments early. Transparent meshes follow and then water, both farthest chunk
//! first so blending composites correctly.

use std::{cmp::Ordering, sync::Arc};

use cgmath::{MetricSpace, Point3, Vector3};

use super::meshing::mesh::{ChunkMesh, ChunkMeshes};
use crate::voxels::{
    chunk::{ChunkCoord, CHUNK_DEPTH, CHUNK_WIDTH},
    chunk_map::ChunkMap,
};

/// The pass a mesh is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderQueue {
    SOLID,
    TRANSPARENT,
    WATER,
}

impl RenderQueue {
    pub const ALL: [RenderQueue; 3] = [RenderQueue::SOLID, RenderQueue::TRANSPARENT, RenderQueue::WATER];
}

/// One draw of one chunk mesh.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    pub coord: ChunkCoord,
    pub mesh: Arc<ChunkMesh>,
    /// World-space translation of the chunk-local mesh
    pub offset: Vector3<f32>,
    pub queue: RenderQueue,
}

fn chunk_center(coord: ChunkCoord) -> Point3<f32> {
    let origin = coord.origin();
    Point3::new(
        origin.x as f32 + CHUNK_WIDTH as f32 / 2.0,
        0.0,
        origin.z as f32 + CHUNK_DEPTH as f32 / 2.0,
    )
}

/// Assembles the draw list for a viewpoint.
///
/// # Arguments
/// * `chunks` - The chunk map to read meshes from
/// * `viewpoint` - World-space position of the viewer
/// * `render_distance` - Radius in chunks beyond which chunks are culled
///
/// # Returns
/// Solid commands front-to-back, then transparent and water commands back-to-front
pub fn assemble_render_commands(
    chunks: &ChunkMap,
    viewpoint: Point3<f32>,
    render_distance: u32,
) -> Vec<RenderCommand> {
    let center = ChunkCoord::from_world_position(viewpoint);
    let flat_viewpoint = Point3::new(viewpoint.x, 0.0, viewpoint.z);
    let limit = render_distance as f32;

    let mut visible: Vec<(f32, ChunkCoord, ChunkMeshes)> = chunks
        .entries()
        .into_iter()
        .filter(|(coord, entry)| entry.is_generated() && coord.distance(center) <= limit)
        .map(|(coord, entry)| {
            let distance = chunk_center(coord).distance2(flat_viewpoint);
            let meshes = entry.meshes.get().clone();
            (distance, coord, meshes)
        })
        .collect();
    visible.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));

    let mut commands = Vec::new();
    for queue in RenderQueue::ALL {
        let ordered: Box<dyn Iterator<Item = &(f32, ChunkCoord, ChunkMeshes)>> = match queue {
            RenderQueue::SOLID => Box::new(visible.iter()),
            RenderQueue::TRANSPARENT | RenderQueue::WATER => Box::new(visible.iter().rev()),
        };
        for (_, coord, meshes) in ordered {
            if let Some(mesh) = meshes.get(queue) {
                let origin = coord.origin();
                commands.push(RenderCommand {
                    coord: *coord,
                    mesh: mesh.clone(),
                    offset: Vector3::new(origin.x as f32, origin.y as f32, origin.z as f32),
                    queue,
                });
            }
        }
    }
    commands
}
