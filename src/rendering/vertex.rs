//! Vertex data structures for chunk meshes.
//!
//! This module defines the vertex format chunk meshes are compiled into. The layout is
//! plain-old-data so a renderer can upload mesh buffers unchanged.

/// A vertex of a chunk mesh.
///
/// Positions are chunk-local; the render command carries the chunk's world offset.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Color: [f32; 4] (16 bytes)
///
/// Total size: 48 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in chunk-local block units
    pub position: [f32; 3],
    /// Outward normal of the face the vertex belongs to
    pub normal: [f32; 3],
    /// UV texture coordinates (normalized 0.0-1.0)
    pub tex_coords: [f32; 2],
    /// Base block color scaled by the light of the cell the face looks into
    pub color: [f32; 4],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Chunk-local position
    /// * `normal` - Face normal
    /// * `tex_coords` - UV coordinates
    /// * `color` - Lit RGBA color
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2], color: [f32; 4]) -> Self {
        Vertex {
            position,
            normal,
            tex_coords,
            color,
        }
    }

    /// Views a vertex slice as raw bytes, ready for a GPU buffer upload.
    pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        let vertices = [Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 1.0], [1.0; 4]); 2];
        assert_eq!(Vertex::as_bytes(&vertices).len(), 96);
    }
}
