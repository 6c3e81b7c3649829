//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. They run on the
//! generation pool so terrain synthesis never stalls the orchestrating thread.

pub mod chunk_generation_task;
