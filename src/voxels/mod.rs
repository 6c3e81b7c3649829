//! # Voxel System
//!
//! This module contains the world model and everything that produces or edits it.
//!
//! ## Key Components
//! - `block`: Block types and their physical properties
//! - `chunk`: 16x16x256 block storage, coordinates and lifecycle flags
//! - `chunk_map`: The concurrent map of loaded chunks
//! - `generation`: Noise, islands, world chunks and voxelization
//! - `lighting`: Sunlight and block light propagation
//! - `world`: The streaming orchestrator tying the above together
//!
//! ## Coordinate Systems
//! - World coordinates: block positions in the infinite X/Z plane, Y in `[0, 256)`
//! - Chunk coordinates: the 2D grid of 16x16 columns
//! - Local coordinates: block positions inside one chunk

pub mod block;
pub mod chunk;
pub mod chunk_map;
pub mod generation;
pub mod lighting;
pub mod raycast;
pub mod streaming;
pub mod tasks;
pub mod viewpoint;
pub mod world;
