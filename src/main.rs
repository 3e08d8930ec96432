//! # embertrace 🔥
//!
//! A physically-based Monte Carlo path tracer that renders scenes to a PPM
//! image, either from a built-in preset or a YAML scene description.
//!
//! ## Rendering equation
//!
//! The path tracer solves the rendering equation via Monte Carlo integration:
//!
//! ```text
//!   L_o(p, ω_o) = L_e(p, ω_o) + ∫_Ω f_r(p, ω_i, ω_o) · L_i(p, ω_i) · |cos θ_i| dω_i
//! ```
//!
//! Each material's `sample` method importance-samples its BxDF lobe, and the
//! integrator iteratively traces the scattered ray to estimate `L_i`, with
//! multiple-importance-sampled direct lighting and Russian-roulette
//! termination.

use clap::Parser;
use embertrace::config;
use embertrace::error::RenderError;
use embertrace::math::Vec2i;
use embertrace::presets::ScenePreset;
use embertrace::scene::Scene;
use embertrace::scheduler::RenderParams;
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

/// embertrace — a physically-based Monte Carlo path tracer
#[derive(Parser, Debug)]
#[command(
    name = "embertrace",
    version,
    about = "A physically based Monte Carlo path tracer with GGX, dipole subsurface, and hair BCSDF materials",
    long_about = "Renders a built-in preset scene or a YAML scene description to a \
                  PPM image using multi-threaded, tiled Monte Carlo path tracing.",
    after_help = "EXAMPLES:\n  \
                  embertrace --scene cornell --spp 256 -o cornell.ppm\n  \
                  embertrace --config scene.yaml -j 8 -o out.ppm\n  \
                  embertrace --scene stress --resolution 800x450 --bounces 4"
)]
struct Cli {
    /// Built-in scene preset to render (ignored if --config is given)
    #[arg(long, value_enum, default_value_t = ScenePreset::Showcase)]
    scene: ScenePreset,

    /// YAML scene description to render instead of a built-in preset
    #[arg(long)]
    config: Option<String>,

    /// Output image resolution, e.g. "800x450". Overrides the scene's own
    /// resolution when given.
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<Vec2i>,

    /// Samples per pixel. Higher values reduce noise at the cost of render
    /// time.
    #[arg(long)]
    spp: Option<u32>,

    /// Maximum ray bounce depth.
    #[arg(long)]
    bounces: Option<u32>,

    /// Random seed for the render.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of worker threads. Defaults to the number of available CPUs.
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Output PPM file path.
    #[arg(short, long, default_value = "output.ppm")]
    output: String,

    /// Suppress progress and summary output on stderr.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_resolution(s: &str) -> Result<Vec2i, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: i64 = w.parse().map_err(|_| format!("invalid width in {s:?}"))?;
    let h: i64 = h.parse().map_err(|_| format!("invalid height in {s:?}"))?;
    if w <= 0 || h <= 0 {
        return Err(format!("resolution must be positive, got {s:?}"));
    }
    Ok(Vec2i::new(w, h))
}

fn print_header(scene_name: &str, params: &RenderParams) {
    eprintln!();
    eprintln!("  ╔═══════════════════════════════════════════════╗");
    eprintln!("  ║  embertrace 🔥  Monte Carlo Path Tracer        ║");
    eprintln!("  ╚═══════════════════════════════════════════════╝");
    eprintln!();
    eprintln!("  Scene:      {scene_name}");
    eprintln!("  Resolution: {}×{}", params.resolution.x, params.resolution.y);
    eprintln!("  Samples:    {} spp", params.spp);
    eprintln!("  Bounces:    {}", params.integrator.max_bounce);
    eprintln!("  Workers:    {}", params.worker_count);
    eprintln!("  Seed:       {}", params.seed);
    eprintln!();
}

fn load_scene(cli: &Cli) -> Result<(Scene, RenderParams, String), RenderError> {
    if let Some(path) = &cli.config {
        let text = std::fs::read_to_string(path)?;
        let description = config::parse(&text)?;
        let (scene, params) = config::build_scene(&description)?;
        Ok((scene, params, path.clone()))
    } else {
        let (scene, resolution, name) = cli.scene.build();
        let params = RenderParams {
            resolution,
            render_min: Vec2i::new(0, 0),
            render_max: resolution,
            worker_count: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            ..Default::default()
        };
        Ok((scene, params, name.to_string()))
    }
}

fn apply_overrides(mut params: RenderParams, cli: &Cli) -> RenderParams {
    if let Some(resolution) = cli.resolution {
        params.resolution = resolution;
        params.render_min = Vec2i::new(0, 0);
        params.render_max = resolution;
    }
    if let Some(spp) = cli.spp {
        params.spp = spp;
    }
    if let Some(bounces) = cli.bounces {
        params.integrator.max_bounce = bounces;
    }
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if let Some(jobs) = cli.jobs {
        params.worker_count = jobs.max(1);
    }
    params
}

fn run() -> Result<(), RenderError> {
    env_logger::init();
    let cli = Cli::parse();

    let (scene, params, scene_name) = load_scene(&cli)?;
    let params = apply_overrides(params, &cli);

    if !cli.quiet {
        print_header(&scene_name, &params);
    }

    let progress: Option<Arc<embertrace::scheduler::ProgressCallback>> = if cli.quiet {
        None
    } else {
        Some(Arc::new(|frac: f64, done: usize, total: usize| {
            eprint!("\r  Rendering... {:5.1}% ({done}/{total})", frac * 100.0);
        }))
    };

    let t0 = Instant::now();
    let framebuffer = scene.render(params, progress);
    let elapsed = t0.elapsed();

    if !cli.quiet {
        eprintln!();
    }

    let file = File::create(&cli.output)?;
    let mut writer = BufWriter::new(file);
    framebuffer.write_ppm(&mut writer)?;

    if !cli.quiet {
        let total_rays = params.resolution.x as u64 * params.resolution.y as u64 * params.spp as u64;
        let mrays = total_rays as f64 / elapsed.as_secs_f64() / 1e6;
        eprintln!(
            "  Time: {:.2}s | {:.2}M rays | {:.2} Mrays/s",
            elapsed.as_secs_f64(),
            total_rays as f64 / 1e6,
            mrays
        );
        eprintln!("  Wrote {}", cli.output);
        eprintln!();
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("embertrace: {err}");
            ExitCode::FAILURE
        }
    }
}
