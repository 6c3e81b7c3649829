//! # Block Module
//!
//! This module provides the block registry consumed by lighting and meshing: block
//! type definitions with their physical properties, and block face handling.

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in chunk storage.
pub type BlockTypeSize = u16;
