//! Mesh data structures for compiled chunks.
//!
//! A chunk compiles into up to three meshes, one per render queue. Each mesh is a
//! plain vertex buffer and a `u32` index buffer.

use std::sync::Arc;

use super::face::{Face, FACE_INDICES, FACE_UVS};
use crate::rendering::{render_list::RenderQueue, Vertex};

/// Vertex and index buffers of one render queue of one chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChunkMesh {
    /// The vertex data, four vertices per face
    pub vertices: Vec<Vertex>,
    /// The index data, six indices per face
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn new() -> Self {
        ChunkMesh::default()
    }

    /// Appends one quad.
    ///
    /// # Arguments
    /// * `face` - The face geometry
    /// * `color` - Lit color shared by all four corners
    pub fn push_face(&mut self, face: &Face, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        let normal = face.block_side.normal();
        for (corner, uv) in face.corners.iter().zip(FACE_UVS) {
            self.vertices
                .push(Vertex::new([corner.x, corner.y, corner.z], normal, uv, color));
        }
        self.indices.extend(FACE_INDICES.iter().map(|index| base + index));
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// The compiled meshes of one chunk. A queue with no faces has no mesh.
#[derive(Debug, Default, Clone)]
pub struct ChunkMeshes {
    pub solid: Option<Arc<ChunkMesh>>,
    pub transparent: Option<Arc<ChunkMesh>>,
    pub water: Option<Arc<ChunkMesh>>,
}

impl ChunkMeshes {
    /// Wraps the three buffers, dropping the empty ones.
    pub fn from_buffers(solid: ChunkMesh, transparent: ChunkMesh, water: ChunkMesh) -> Self {
        let keep = |mesh: ChunkMesh| (!mesh.is_empty()).then(|| Arc::new(mesh));
        ChunkMeshes {
            solid: keep(solid),
            transparent: keep(transparent),
            water: keep(water),
        }
    }

    pub fn get(&self, queue: RenderQueue) -> Option<&Arc<ChunkMesh>> {
        match queue {
            RenderQueue::SOLID => self.solid.as_ref(),
            RenderQueue::TRANSPARENT => self.transparent.as_ref(),
            RenderQueue::WATER => self.water.as_ref(),
        }
    }

    /// `true` if no queue has a mesh.
    pub fn is_empty(&self) -> bool {
        self.solid.is_none() && self.transparent.is_none() && self.water.is_none()
    }

    /// Releases every mesh.
    pub fn clear(&mut self) {
        *self = ChunkMeshes::default();
    }
}
