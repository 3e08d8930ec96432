//! Tiled multi-threaded render scheduler: a mutex-guarded FIFO of tile jobs,
//! one `Pcg32` stream per tile (seeded from the render seed and the tile's
//! stable index, so output is independent of thread scheduling), and a
//! throttled progress callback.

use crate::accel::Bvh;
use crate::camera::Camera;
use crate::geometry::Shape;
use crate::image::{Environment, Framebuffer};
use crate::integrator::{self, IntegratorParams};
use crate::lights::Light;
use crate::math::{Color, Pcg32, Point2, Vec2i};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A 2D integer tile `[min, max)` into the raster, tagged with its stable
/// generation-order index. The index (not which worker happens to claim the
/// tile) seeds that tile's RNG stream, so the rendered image is independent
/// of thread scheduling.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub min: Vec2i,
    pub max: Vec2i,
    pub index: u64,
}

/// A concurrency-safe FIFO of tiles, covering `bounds` in `tile_size`
/// strides, row-major.
struct TileQueue {
    tiles: Mutex<Vec<Tile>>,
}

impl TileQueue {
    fn new(bounds: (Vec2i, Vec2i), tile_size: i64) -> Self {
        let (min, max) = bounds;
        let mut tiles = Vec::new();
        let mut index = 0u64;
        let mut y = min.y;
        while y < max.y {
            let mut x = min.x;
            while x < max.x {
                tiles.push(Tile {
                    min: Vec2i::new(x, y),
                    max: Vec2i::new((x + tile_size).min(max.x), (y + tile_size).min(max.y)),
                    index,
                });
                index += 1;
                x += tile_size;
            }
            y += tile_size;
        }
        // Popped in reverse so tiles come off in the same row-major order
        // they were pushed in (a `Vec` pop takes from the end).
        tiles.reverse();
        Self {
            tiles: Mutex::new(tiles),
        }
    }

    fn pop(&self) -> Option<Tile> {
        self.tiles.lock().expect("tile queue poisoned").pop()
    }

    fn remaining(&self) -> usize {
        self.tiles.lock().expect("tile queue poisoned").len()
    }
}

/// Mixes a render seed with a tile's stable index into that tile's RNG seed
/// (splitmix64 finalizer). Render output then depends only on `(seed,
/// tile_index)`, never on which worker thread happens to claim the tile, so
/// the same `(seed, worker_count)` always produces a byte-identical image.
fn tile_seed(seed: u64, tile_index: u64) -> u64 {
    let mut x = seed ^ tile_index.wrapping_mul(0x9E3779B97F4A7C15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^= x >> 31;
    x
}

/// `(progress in [0,1], pixels_done, pixels_total)`, delivered no more than
/// once per `progress_interval`.
pub type ProgressCallback = dyn Fn(f64, usize, usize) + Send + Sync;

#[derive(Clone, Copy, Debug)]
pub struct RenderParams {
    pub resolution: Vec2i,
    pub render_min: Vec2i,
    pub render_max: Vec2i,
    pub worker_count: usize,
    pub spp: u32,
    pub stratify: u32,
    pub tile_size: i64,
    pub seed: u64,
    pub integrator: IntegratorParams,
}

impl Default for RenderParams {
    fn default() -> Self {
        let resolution = Vec2i::new(256, 256);
        Self {
            resolution,
            render_min: Vec2i::new(0, 0),
            render_max: resolution,
            worker_count: 1,
            spp: 16,
            stratify: 1,
            tile_size: 32,
            seed: 1,
            integrator: IntegratorParams::default(),
        }
    }
}

struct Progress {
    counter: AtomicUsize,
    total: usize,
    last_report: Mutex<Instant>,
    interval: Duration,
}

/// Renders `shapes`/`bvh`/`lights`/`environment` through `camera` into a
/// fresh `Framebuffer`, distributing `render_params.tile_size`-sized tiles
/// across `render_params.worker_count` OS threads.
#[allow(clippy::too_many_arguments)]
pub fn render(
    shapes: Arc<Vec<Shape>>,
    bvh: Arc<Bvh>,
    lights: Arc<Vec<Light>>,
    environment: Arc<Environment>,
    camera: Arc<Camera>,
    render_params: RenderParams,
    progress: Option<Arc<ProgressCallback>>,
) -> Framebuffer {
    let framebuffer = Arc::new(Mutex::new(Framebuffer::new(render_params.resolution)));
    let queue = Arc::new(TileQueue::new(
        (render_params.render_min, render_params.render_max),
        render_params.tile_size,
    ));
    let width = (render_params.render_max.x - render_params.render_min.x).max(0);
    let height = (render_params.render_max.y - render_params.render_min.y).max(0);
    let total_pixels = (width * height).max(0) as usize;
    let progress_state = Arc::new(Progress {
        counter: AtomicUsize::new(0),
        total: total_pixels,
        last_report: Mutex::new(Instant::now()),
        interval: Duration::from_millis(1000),
    });

    std::thread::scope(|scope| {
        for _worker_index in 0..render_params.worker_count.max(1) {
            let queue = Arc::clone(&queue);
            let framebuffer = Arc::clone(&framebuffer);
            let progress_state = Arc::clone(&progress_state);
            let progress_cb = progress.clone();
            let shapes = Arc::clone(&shapes);
            let bvh = Arc::clone(&bvh);
            let lights = Arc::clone(&lights);
            let environment = Arc::clone(&environment);
            let camera = Arc::clone(&camera);
            let seed = render_params.seed;
            let spp = render_params.spp;
            let stratify = render_params.stratify.max(1);
            let integrator_params = render_params.integrator;

            scope.spawn(move || {
                while let Some(tile) = queue.pop() {
                    let mut rng = Pcg32::new(tile_seed(seed, tile.index));
                    render_tile(
                        &tile,
                        &shapes,
                        &bvh,
                        &lights,
                        &environment,
                        &camera,
                        spp,
                        stratify,
                        &integrator_params,
                        &mut rng,
                        &framebuffer,
                    );

                    let tile_pixels = ((tile.max.x - tile.min.x) * (tile.max.y - tile.min.y)).max(0) as usize;
                    let done = progress_state.counter.fetch_add(tile_pixels, Ordering::Relaxed) + tile_pixels;
                    if let Some(cb) = &progress_cb {
                        let mut last = progress_state.last_report.lock().expect("progress mutex poisoned");
                        if last.elapsed() >= progress_state.interval || queue.remaining() == 0 {
                            *last = Instant::now();
                            let frac = if progress_state.total == 0 {
                                1.0
                            } else {
                                done as f64 / progress_state.total as f64
                            };
                            cb(frac.min(1.0), done, progress_state.total);
                        }
                    }
                }
            });
        }
    });

    Arc::try_unwrap(framebuffer)
        .unwrap_or_else(|arc| Mutex::new(arc.lock().expect("framebuffer mutex poisoned").clone()))
        .into_inner()
        .expect("framebuffer mutex poisoned")
}

#[allow(clippy::too_many_arguments)]
fn render_tile(
    tile: &Tile,
    shapes: &[Shape],
    bvh: &Bvh,
    lights: &[Light],
    environment: &Environment,
    camera: &Camera,
    spp: u32,
    stratify: u32,
    integrator_params: &IntegratorParams,
    rng: &mut Pcg32,
    framebuffer: &Mutex<Framebuffer>,
) {
    for y in tile.min.y..tile.max.y {
        for x in tile.min.x..tile.max.x {
            let mut accum = Color::zero();
            for _ in 0..spp {
                let (jx, jy) = jittered_subpixel(rng, stratify);
                let raster_point = Point2::new(x as f64 + jx, y as f64 + jy);
                let ray = camera.generate_ray(raster_point, rng);
                accum = accum + integrator::trace(ray, shapes, bvh, lights, environment, integrator_params, rng);
            }
            let color = accum / spp.max(1) as f64;
            framebuffer.lock().expect("framebuffer mutex poisoned").set(x, y, color);
        }
    }
}

fn jittered_subpixel(rng: &mut Pcg32, stratify: u32) -> (f64, f64) {
    use rand::RngCore;
    if stratify <= 1 {
        return (
            rng.next_u32() as f64 / u32::MAX as f64,
            rng.next_u32() as f64 / u32::MAX as f64,
        );
    }
    let cell = (rng.next_u32() as usize) % (stratify as usize * stratify as usize);
    let cx = (cell % stratify as usize) as f64;
    let cy = (cell / stratify as usize) as f64;
    let u1 = rng.next_u32() as f64 / u32::MAX as f64;
    let u2 = rng.next_u32() as f64 / u32::MAX as f64;
    ((cx + u1) / stratify as f64, (cy + u2) / stratify as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_queue_covers_the_full_bounds_exactly_once() {
        let queue = TileQueue::new((Vec2i::new(0, 0), Vec2i::new(10, 10)), 4);
        let mut covered = vec![vec![false; 10]; 10];
        while let Some(tile) = queue.pop() {
            for y in tile.min.y..tile.max.y {
                for x in tile.min.x..tile.max.x {
                    assert!(!covered[y as usize][x as usize], "pixel covered twice");
                    covered[y as usize][x as usize] = true;
                }
            }
        }
        assert!(covered.iter().all(|row| row.iter().all(|&c| c)));
    }

    #[test]
    fn render_produces_a_framebuffer_of_the_requested_resolution() {
        use crate::camera::CameraConfig;
        use crate::materials::lambert::Lambertian;
        use crate::geometry::shapes::{sphere::Sphere, ShapeKind};
        use crate::math::{Transform, Vec3};
        use std::sync::Arc;

        let material = Arc::new(Lambertian::new(Color::splat(0.7)));
        let shapes = Arc::new(vec![Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::IDENTITY,
            Some(material),
        )]);
        let bvh = Arc::new(Bvh::build(&shapes));
        let lights = Arc::new(vec![]);
        let environment = Arc::new(Environment::Constant(Color::zero()));
        let resolution = Vec2i::new(4, 4);
        let camera = Arc::new(Camera::perspective(
            CameraConfig {
                look_from: Vec3::new(0.0, 0.0, 5.0),
                look_at: Vec3::zero(),
                ..Default::default()
            },
            resolution,
        ));
        let params = RenderParams {
            resolution,
            render_min: Vec2i::new(0, 0),
            render_max: resolution,
            worker_count: 2,
            spp: 2,
            stratify: 1,
            tile_size: 2,
            seed: 7,
            integrator: IntegratorParams::default(),
        };
        let fb = render(shapes, bvh, lights, environment, camera, params, None);
        assert_eq!(fb.resolution, resolution);
    }

    #[test]
    fn render_is_byte_identical_across_worker_counts() {
        use crate::camera::CameraConfig;
        use crate::materials::lambert::Lambertian;
        use crate::geometry::shapes::{sphere::Sphere, ShapeKind};
        use crate::math::{Transform, Vec3};
        use std::sync::Arc;

        let material = Arc::new(Lambertian::new(Color::splat(0.7)));
        let shapes = Arc::new(vec![Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::IDENTITY,
            Some(material),
        )]);
        let bvh = Arc::new(Bvh::build(&shapes));
        let lights = Arc::new(vec![]);
        let environment = Arc::new(Environment::Constant(Color::splat(0.2)));
        let resolution = Vec2i::new(16, 16);
        let camera = Arc::new(Camera::perspective(
            CameraConfig {
                look_from: Vec3::new(0.0, 0.0, 5.0),
                look_at: Vec3::zero(),
                ..Default::default()
            },
            resolution,
        ));
        let base = RenderParams {
            resolution,
            render_min: Vec2i::new(0, 0),
            render_max: resolution,
            worker_count: 1,
            spp: 4,
            stratify: 1,
            tile_size: 4,
            seed: 42,
            integrator: IntegratorParams::default(),
        };

        let fb_one_worker = render(
            Arc::clone(&shapes),
            Arc::clone(&bvh),
            Arc::clone(&lights),
            Arc::clone(&environment),
            Arc::clone(&camera),
            base,
            None,
        );
        let fb_many_workers = render(
            shapes,
            bvh,
            lights,
            environment,
            camera,
            RenderParams { worker_count: 4, ..base },
            None,
        );

        assert_eq!(fb_one_worker.pixels(), fb_many_workers.pixels());
    }
}
