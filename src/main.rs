//! # Voxel Mesher Demo Entry Point
//!
//! Calls into the library's `run()` function, which meshes a generated
//! terrain and reports what it produced.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [grid-config.json]
//! ```

fn main() {
    voxel_mesher::run();
}
