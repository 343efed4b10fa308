//! Terrain demo driven by [`crate::run`].

use std::{sync::Arc, thread, time::Duration};

use cgmath::{Point3, Vector3};
use log::info;
use noise::{NoiseFn, Perlin};
use web_time::Instant;

use crate::{
    config::GridConfig,
    error::GridError,
    rendering::{
        meshing::{CameraFacing, MeshBuffer},
        MeshUploader,
    },
    voxels::{
        block::{BlockTextureTable, Voxel},
        coords::{ChunkCoordinates, Int3},
        world::ChunkGrid,
    },
};

/// Threshold above which Perlin noise is considered solid for terrain generation.
const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which Perlin noise is considered empty for terrain generation.
const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
const PERLIN_SCALE_FACTOR: f64 = 0.02;

const RANDOM_EDITS: usize = 256;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

const DIRT: Voxel = Voxel::new(1, 1);
const GRASS: Voxel = Voxel::new(2, 2);
const WHITE: Voxel = Voxel::new(4, 4);

/// Stands in for a GPU upload and keeps running totals.
#[derive(Default)]
struct UploadStats {
    uploads: usize,
    bytes: usize,
}

impl MeshUploader for UploadStats {
    fn upload(&mut self, _position: ChunkCoordinates, mesh: &MeshBuffer) {
        self.uploads += 1;
        self.bytes += mesh.vertex_bytes().len() + mesh.index_bytes().len();
    }
}

fn perlin_terrain(perlin: &Perlin, world: Int3) -> Voxel {
    let sample = perlin.get([
        world.x as f64 * PERLIN_SCALE_FACTOR,
        world.y as f64 * PERLIN_SCALE_FACTOR,
        world.z as f64 * PERLIN_SCALE_FACTOR,
    ]);
    if (PERLIN_NEGATIVE_THRESHOLD..=PERLIN_POSITIVE_THRESHOLD).contains(&sample) {
        Voxel::AIR
    } else if sample > 0.0 {
        GRASS
    } else {
        DIRT
    }
}

/// Polls until every scheduled job has been published, or gives up after
/// [`DRAIN_TIMEOUT`].
fn drain(grid: &mut ChunkGrid, uploader: &mut UploadStats) -> usize {
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    let mut published = 0;
    loop {
        published += grid.poll_completed_meshes(&mut *uploader).len();
        if grid.is_idle() {
            return published;
        }
        if Instant::now() >= deadline {
            log::warn!(
                "Mesh jobs still running after {:?}, continuing with {} dirty chunks",
                DRAIN_TIMEOUT,
                grid.dirty_count()
            );
            return published;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

pub(crate) fn run_demo(config: GridConfig) -> Result<(), GridError> {
    let catalog = Arc::new(BlockTextureTable::standard());
    let mut grid = ChunkGrid::new(config, catalog)?;
    let mut uploader = UploadStats::default();

    let perlin = Perlin::new(0);
    grid.fill_with(|world| perlin_terrain(&perlin, world));

    let start_time = Instant::now();
    let scheduled = grid.regenerate_dirty();
    let published = drain(&mut grid, &mut uploader);
    info!(
        "Initial mesh: {} jobs scheduled, {} meshes published in {:?}",
        scheduled,
        published,
        start_time.elapsed()
    );

    let config = grid.config().clone();
    let dimensions = grid.chunk_dimensions();
    let extent = Vector3::new(
        (config.grid_width * dimensions.horizontal) as i32,
        (config.grid_height * dimensions.height) as i32,
        (config.grid_depth * dimensions.horizontal) as i32,
    );
    let mut rng = fastrand::Rng::with_seed(0xC0FFEE);
    for _ in 0..RANDOM_EDITS {
        let world = Point3::new(
            rng.i32(0..extent.x),
            rng.i32(0..extent.y),
            rng.i32(0..extent.z),
        );
        let voxel = if rng.bool() { Voxel::AIR } else { WHITE };
        grid.set_block(world, voxel);
    }

    let start_time = Instant::now();
    let dirty = grid.dirty_count();
    grid.regenerate_dirty();
    let published = drain(&mut grid, &mut uploader);
    info!(
        "After {} edits: {} dirty chunks remeshed, {} meshes published in {:?}",
        RANDOM_EDITS,
        dirty,
        published,
        start_time.elapsed()
    );

    let (mut quads, mut triangles) = (0, 0);
    for mesh in grid.chunks().filter_map(|chunk| chunk.active_mesh()) {
        quads += mesh.quad_count();
        triangles += mesh.triangle_count();
    }
    info!(
        "Totals: {} quads, {} triangles, {} uploads, {} bytes uploaded",
        quads, triangles, uploader.uploads, uploader.bytes
    );

    if let Some(facing) = CameraFacing::from_view_vector(Vector3::new(1.0, -0.6, 0.3)) {
        let visible: u32 = grid
            .chunks()
            .filter_map(|chunk| chunk.active_mesh())
            .flat_map(|mesh| mesh.draw_ranges(facing).iter().map(|range| range.count))
            .sum();
        info!(
            "Looking along {:?}: {} of {} vertices face the camera",
            facing.as_vector(),
            visible,
            triangles * 3
        );
    }

    Ok(())
}
