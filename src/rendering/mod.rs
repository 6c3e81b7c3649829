//! # Rendering Module
//!
//! The renderer-facing half of the engine: chunk mesh compilation and draw-list
//! assembly. No GPU work happens here; meshes are plain buffers laid out for
//! direct upload.
//!
//! ## Key Components
//! - `vertex`: The `Vertex` layout of every chunk mesh
//! - `meshing`: Face culling and per-queue mesh construction
//! - `render_list`: Ordered draw commands for a viewpoint
//! - `tasks`: The background mesh build task

pub mod meshing;
pub mod render_list;
pub mod tasks;
pub mod vertex;

pub use vertex::Vertex;
