//! Background tasks for the rendering system.
//!
//! These tasks handle potentially expensive rendering-related work so the
//! main loop stays responsive.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Generates the mesh of one chunk in the background

pub mod chunk_mesh_generation_task;
