//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Compiles a chunk's meshes against its loaded neighbors

pub mod chunk_mesh_generation_task;
