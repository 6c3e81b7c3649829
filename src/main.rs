//! # Voxel World Headless Driver
//!
//! Streams the world along a flyover path without a window and logs what it did.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

fn main() {
    voxel_world::run();
}
