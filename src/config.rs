//! Scene-description parsing: a `serde`-backed YAML document is decoded
//! into typed sections, then translated into a [`crate::scene::Scene`] and
//! [`RenderParams`]. The document shape follows the contract in the
//! external-interfaces section: `render` / `intersect` / `scene{camera,
//! objects[], lights[], environment}`.

use crate::camera::{Camera, CameraConfig, Projection};
use crate::error::{RenderError, RenderResult};
use crate::geometry::shapes::bezier::CubicBezier;
use crate::geometry::shapes::disk::Disk;
use crate::geometry::shapes::funnel::Funnel;
use crate::geometry::shapes::quad::Quad;
use crate::geometry::shapes::sdf::{DeBox, DeInfSpheres, DeMandelbulb, DeSphere};
use crate::geometry::shapes::sphere::Sphere;
use crate::geometry::shapes::triangle::Triangle;
use crate::geometry::shapes::{tube::Tube, ShapeKind};
use crate::geometry::Shape;
use crate::image::Environment;
use crate::integrator::IntegratorParams;
use crate::lights::{Light, PointLight, RectLight, SphereLight};
use crate::materials::dipole::Dipole;
use crate::materials::ggx::Ggx;
use crate::materials::hair::Hair;
use crate::materials::lambert::Lambertian;
use crate::materials::sss::Sss;
use crate::materials::{Bxdf, MaterialHandle};
use crate::math::{Color, Transform, TransformOp, Vec2i, Vec3};
use crate::scene::Scene;
use crate::scheduler::RenderParams;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SceneDescription {
    pub render: RenderSection,
    #[serde(default)]
    pub intersect: Option<IntersectSection>,
    pub scene: SceneSection,
}

#[derive(Debug, Deserialize)]
pub struct RenderSection {
    pub resolution: [u32; 2],
    #[serde(default = "default_spp")]
    pub spp: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_max_bounce")]
    pub max_bounce: u32,
    #[serde(default = "default_max_rr")]
    pub max_rr: f64,
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default = "default_stratify")]
    pub stratify: u32,
}

fn default_spp() -> u32 {
    16
}
fn default_seed() -> u64 {
    1
}
fn default_tile_size() -> u32 {
    32
}
fn default_max_bounce() -> u32 {
    8
}
fn default_max_rr() -> f64 {
    0.95
}
fn default_stratify() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct IntersectSection {
    #[serde(default = "default_hit_epsilon")]
    pub hit_epsilon: f64,
    #[serde(default)]
    pub normal_delta: f64,
    #[serde(default)]
    pub max_iters: u32,
}

fn default_hit_epsilon() -> f64 {
    1e-4
}

#[derive(Debug, Deserialize)]
pub struct SceneSection {
    pub camera: CameraDescription,
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
    #[serde(default)]
    pub lights: Vec<LightDescription>,
    #[serde(default)]
    pub environment: Option<EnvironmentDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionDescription {
    Perspective,
    Orthographic,
}

#[derive(Debug, Deserialize)]
pub struct CameraDescription {
    #[serde(default = "default_projection")]
    pub projection: ProjectionDescription,
    pub look_from: [f64; 3],
    pub look_at: [f64; 3],
    #[serde(default = "default_up")]
    pub vup: [f64; 3],
    #[serde(default = "default_vfov")]
    pub vfov_degrees: f64,
    #[serde(default)]
    pub aperture: f64,
    #[serde(default = "default_focus_dist")]
    pub focus_dist: f64,
}

fn default_projection() -> ProjectionDescription {
    ProjectionDescription::Perspective
}
fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}
fn default_vfov() -> f64 {
    40.0
}
fn default_focus_dist() -> f64 {
    10.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOpDescription {
    Translate([f64; 3]),
    Rotate { axis: [f64; 3], angle: f64 },
    Scale([f64; 3]),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ShapeDescription {
    Sphere { radius: f64 },
    Triangle { p0: [f64; 3], p1: [f64; 3], p2: [f64; 3] },
    Quad { p0: [f64; 3], edge1: [f64; 3], edge2: [f64; 3] },
    Disk { radius: f64, #[serde(default)] inner_radius: f64, #[serde(default)] height: f64 },
    Tube { radius: f64, y_min: f64, y_max: f64 },
    Funnel { radius_min: f64, radius_max: f64, y_min: f64, y_max: f64 },
    Bezier { p0: [f64; 3], p1: [f64; 3], p2: [f64; 3], p3: [f64; 3], width0: f64, width1: f64 },
    DeSphere { radius: f64 },
    DeBox { half_extent: [f64; 3] },
    DeInfSpheres { radius: f64, cell_size: f64 },
    DeMandelbulb { power: f64, bounding_radius: f64, #[serde(default = "default_iterations")] iterations: u32 },
}

fn default_iterations() -> u32 {
    8
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MaterialDescription {
    Lambert {
        reflectance: [f64; 3],
    },
    Ggx {
        roughness: f64,
        eta_i: f64,
        eta_t: f64,
        #[serde(default)]
        refractive: bool,
        reflectance: [f64; 3],
        #[serde(default)]
        transmittance: [f64; 3],
    },
    Dipole {
        eta: f64,
        sigma_a: [f64; 3],
        sigma_s: [f64; 3],
        #[serde(default)]
        beta_n: f64,
    },
    Sss {
        roughness: f64,
        eta_i: f64,
        eta_t: f64,
        sigma_a: [f64; 3],
        sigma_s: [f64; 3],
        #[serde(default)]
        g: f64,
    },
    Hair {
        eta_i: f64,
        eta_t: f64,
        beta_m: f64,
        beta_n: f64,
        #[serde(default)]
        alpha: f64,
        #[serde(default)]
        h: f64,
        reflectance: [f64; 3],
    },
}

impl MaterialDescription {
    fn build(&self) -> MaterialHandle {
        match self {
            MaterialDescription::Lambert { reflectance } => {
                Arc::new(Lambertian::new(vec3(*reflectance))) as MaterialHandle
            }
            MaterialDescription::Ggx {
                roughness,
                eta_i,
                eta_t,
                refractive,
                reflectance,
                transmittance,
            } => Arc::new(Ggx::new(
                *roughness,
                *eta_i,
                *eta_t,
                *refractive,
                vec3(*reflectance),
                vec3(*transmittance),
            )) as MaterialHandle,
            MaterialDescription::Dipole {
                eta,
                sigma_a,
                sigma_s,
                beta_n,
            } => Arc::new(Dipole::new(*eta, vec3(*sigma_a), vec3(*sigma_s), *beta_n)) as MaterialHandle,
            MaterialDescription::Sss {
                roughness,
                eta_i,
                eta_t,
                sigma_a,
                sigma_s,
                g,
            } => {
                let surface = Ggx::new(*roughness, *eta_i, *eta_t, true, Color::splat(0.04), Color::ones());
                Arc::new(Sss::new(surface, vec3(*sigma_a), vec3(*sigma_s), *g)) as MaterialHandle
            }
            MaterialDescription::Hair {
                eta_i,
                eta_t,
                beta_m,
                beta_n,
                alpha,
                h,
                reflectance,
            } => Arc::new(Hair::new(*eta_i, *eta_t, *beta_m, *beta_n, alpha.to_radians(), *h, vec3(*reflectance)))
                as MaterialHandle,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ObjectDescription {
    #[serde(flatten)]
    pub shape: ShapeDescription,
    #[serde(default)]
    pub transform: Vec<TransformOpDescription>,
    #[serde(default)]
    pub material: Option<MaterialDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LightDescription {
    Point {
        position: [f64; 3],
        color: [f64; 3],
    },
    Rect {
        #[serde(default)]
        transform: Vec<TransformOpDescription>,
        half_extent: [f64; 2],
        color: [f64; 3],
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
        color: [f64; 3],
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EnvironmentDescription {
    Constant { color: [f64; 3] },
}

fn vec3(a: [f64; 3]) -> Vec3 {
    Vec3::new(a[0], a[1], a[2])
}

fn build_shape(desc: &ShapeDescription) -> ShapeKind {
    match desc {
        ShapeDescription::Sphere { radius } => ShapeKind::Sphere(Sphere { radius: *radius }),
        ShapeDescription::Triangle { p0, p1, p2 } => ShapeKind::Triangle(Triangle {
            p0: vec3(*p0),
            p1: vec3(*p1),
            p2: vec3(*p2),
        }),
        ShapeDescription::Quad { p0, edge1, edge2 } => ShapeKind::Quad(Quad {
            p0: vec3(*p0),
            edge1: vec3(*edge1),
            edge2: vec3(*edge2),
        }),
        ShapeDescription::Disk { radius, inner_radius, height } => ShapeKind::Disk(Disk {
            radius: *radius,
            inner_radius: *inner_radius,
            height: *height,
        }),
        ShapeDescription::Tube { radius, y_min, y_max } => ShapeKind::Tube(Tube {
            radius: *radius,
            y_min: *y_min,
            y_max: *y_max,
        }),
        ShapeDescription::Funnel {
            radius_min,
            radius_max,
            y_min,
            y_max,
        } => ShapeKind::Funnel(Funnel {
            radius_min: *radius_min,
            radius_max: *radius_max,
            y_min: *y_min,
            y_max: *y_max,
        }),
        ShapeDescription::Bezier { p0, p1, p2, p3, width0, width1 } => ShapeKind::Bezier(CubicBezier {
            p0: vec3(*p0),
            p1: vec3(*p1),
            p2: vec3(*p2),
            p3: vec3(*p3),
            width0: *width0,
            width1: *width1,
        }),
        ShapeDescription::DeSphere { radius } => ShapeKind::DeSphere(DeSphere { radius: *radius }),
        ShapeDescription::DeBox { half_extent } => ShapeKind::DeBox(DeBox {
            half_extent: vec3(*half_extent),
        }),
        ShapeDescription::DeInfSpheres { radius, cell_size } => ShapeKind::DeInfSpheres(DeInfSpheres {
            radius: *radius,
            cell_size: *cell_size,
        }),
        ShapeDescription::DeMandelbulb { power, bounding_radius, iterations } => {
            ShapeKind::DeMandelbulb(DeMandelbulb {
                power: *power,
                bounding_radius: *bounding_radius,
                iterations: *iterations,
            })
        }
    }
}

fn build_light(desc: &LightDescription) -> Light {
    match desc {
        LightDescription::Point { position, color } => Light::Point(PointLight {
            position: vec3(*position),
            color: vec3(*color),
        }),
        LightDescription::Rect { transform, half_extent, color } => {
            let ops: Vec<TransformOp> = transform.iter().map(|op| op.clone_into_op()).collect();
            Light::Rect(RectLight {
                transform: TransformOp::compose(&ops),
                half_extent: (half_extent[0], half_extent[1]),
                color: vec3(*color),
            })
        }
        LightDescription::Sphere { center, radius, color } => {
            Light::Sphere(SphereLight::new(vec3(*center), *radius, vec3(*color)))
        }
    }
}

impl TransformOpDescription {
    fn clone_into_op(&self) -> TransformOp {
        match self {
            TransformOpDescription::Translate(t) => TransformOp::Translate(vec3(*t)),
            TransformOpDescription::Rotate { axis, angle } => TransformOp::Rotate {
                axis: vec3(*axis),
                angle_rad: angle.to_radians(),
            },
            TransformOpDescription::Scale(s) => TransformOp::Scale(vec3(*s)),
        }
    }
}

/// Parses a YAML scene description from `text`.
pub fn parse(text: &str) -> RenderResult<SceneDescription> {
    serde_yaml::from_str(text).map_err(|e| RenderError::Config(e.to_string()))
}

/// Translates a parsed description into a [`Scene`] plus the [`RenderParams`]
/// its `render` section specifies.
pub fn build_scene(desc: &SceneDescription) -> RenderResult<(Scene, RenderParams)> {
    let [cols, rows] = desc.render.resolution;
    if cols == 0 || rows == 0 {
        return Err(RenderError::Config("render.resolution must be nonzero".into()));
    }
    let resolution = Vec2i::new(cols as i64, rows as i64);

    let mut shapes = Vec::with_capacity(desc.scene.objects.len());
    for obj in &desc.scene.objects {
        let ops: Vec<TransformOp> = obj.transform.iter().map(|op| op.clone_into_op()).collect();
        let transform = TransformOp::compose(&ops);
        let material: Option<MaterialHandle> = obj.material.as_ref().map(|m| m.build());
        shapes.push(Shape::new(build_shape(&obj.shape), transform, material));
    }

    let lights: Vec<Light> = desc.scene.lights.iter().map(build_light).collect();

    let environment = match &desc.scene.environment {
        Some(EnvironmentDescription::Constant { color }) => Environment::Constant(vec3(*color)),
        None => Environment::Constant(Color::zero()),
    };

    let camera_config = CameraConfig {
        look_from: vec3(desc.scene.camera.look_from),
        look_at: vec3(desc.scene.camera.look_at),
        vup: vec3(desc.scene.camera.vup),
        vfov_degrees: desc.scene.camera.vfov_degrees,
        aspect_ratio: cols as f64 / rows as f64,
        aperture: desc.scene.camera.aperture,
        focus_dist: desc.scene.camera.focus_dist,
    };
    let camera = match desc.scene.camera.projection {
        ProjectionDescription::Perspective => Camera::perspective(camera_config, resolution),
        ProjectionDescription::Orthographic => Camera::orthographic(camera_config, resolution),
    };

    let scene = Scene::new(shapes, lights, environment, camera);

    let worker_count = desc.render.worker_count.unwrap_or_else(|| {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    });

    let params = RenderParams {
        resolution,
        render_min: Vec2i::new(0, 0),
        render_max: resolution,
        worker_count: worker_count.max(1),
        spp: desc.render.spp,
        stratify: desc.render.stratify,
        tile_size: desc.render.tile_size as i64,
        seed: desc.render.seed,
        integrator: IntegratorParams {
            max_bounce: desc.render.max_bounce,
            max_rr: desc.render.max_rr,
            bias_epsilon: desc
                .intersect
                .as_ref()
                .map(|i| i.hit_epsilon)
                .unwrap_or(1e-4),
        },
    };

    Ok((scene, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
render:
  resolution: [4, 4]
  spp: 1
scene:
  camera:
    look_from: [0, 0, 5]
    look_at: [0, 0, 0]
  objects:
    - kind: sphere
      radius: 1.0
      transform:
        - translate: [0, 0, 0]
      material:
        kind: lambert
        reflectance: [0.7, 0.7, 0.7]
  lights:
    - kind: point
      position: [0, 0, 2]
      color: [0.7, 0.7, 0.7]
"#;

    #[test]
    fn parses_minimal_scene_document() {
        let desc = parse(MINIMAL).unwrap();
        assert_eq!(desc.render.resolution, [4, 4]);
        assert_eq!(desc.scene.objects.len(), 1);
        assert_eq!(desc.scene.lights.len(), 1);
    }

    #[test]
    fn builds_scene_and_params_from_minimal_document() {
        let desc = parse(MINIMAL).unwrap();
        let (scene, params) = build_scene(&desc).unwrap();
        assert_eq!(scene.shapes.len(), 1);
        assert_eq!(params.resolution, Vec2i::new(4, 4));
    }

    #[test]
    fn zero_resolution_is_a_config_error() {
        let desc = parse(
            r#"
render:
  resolution: [0, 4]
scene:
  camera:
    look_from: [0,0,5]
    look_at: [0,0,0]
"#,
        )
        .unwrap();
        assert!(matches!(build_scene(&desc), Err(RenderError::Config(_))));
    }
}
