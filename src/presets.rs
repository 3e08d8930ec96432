//! Built-in demo scenes for the CLI: a handful of hand-authored [`Scene`]s
//! exercising the geometry, material, and light kinds this crate supports,
//! selectable with `--scene`.

use crate::camera::{Camera, CameraConfig};
use crate::geometry::shapes::{
    disk::Disk, funnel::Funnel, quad::Quad, sphere::Sphere, triangle::Triangle, tube::Tube, ShapeKind,
};
use crate::geometry::Shape;
use crate::image::Environment;
use crate::lights::{Light, PointLight, RectLight, SphereLight};
use crate::materials::dipole::Dipole;
use crate::materials::ggx::Ggx;
use crate::materials::lambert::Lambertian;
use crate::materials::MaterialHandle;
use crate::math::{Color, Transform, Vec3};
use crate::scene::Scene;
use std::sync::Arc;

/// Available built-in scene presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ScenePreset {
    /// A single Lambertian sphere lit by one point light.
    Minimal,
    /// A quad-walled box with an area light and mixed materials.
    Cornell,
    /// Lambert, mirror GGX, glass GGX, and subsurface dipole spheres side by side.
    Showcase,
    /// One instance of every supported shape kind.
    Gallery,
    /// A grid of many spheres, useful for exercising BVH build/traversal.
    Stress,
}

impl ScenePreset {
    /// Builds the preset's scene, returning it alongside the resolution its
    /// camera was constructed for and a display name.
    pub fn build(self) -> (Scene, crate::math::Vec2i, &'static str) {
        match self {
            ScenePreset::Minimal => (build_minimal(), crate::math::Vec2i::new(256, 256), "minimal"),
            ScenePreset::Cornell => (build_cornell(), crate::math::Vec2i::new(256, 256), "cornell"),
            ScenePreset::Showcase => (build_showcase(), crate::math::Vec2i::new(320, 180), "showcase"),
            ScenePreset::Gallery => (build_gallery(), crate::math::Vec2i::new(320, 180), "gallery"),
            ScenePreset::Stress => (build_stress(), crate::math::Vec2i::new(320, 180), "stress"),
        }
    }
}

fn default_camera(resolution: crate::math::Vec2i, look_from: Vec3, look_at: Vec3) -> Camera {
    Camera::perspective(
        CameraConfig {
            look_from,
            look_at,
            aspect_ratio: resolution.x as f64 / resolution.y as f64,
            ..Default::default()
        },
        resolution,
    )
}

fn lambert(reflectance: Color) -> MaterialHandle {
    Arc::new(Lambertian::new(reflectance))
}

fn mirror(roughness: f64) -> MaterialHandle {
    Arc::new(Ggx::new(roughness, 1.0, 1.5, false, Color::splat(0.95), Color::zero()))
}

fn glass(roughness: f64) -> MaterialHandle {
    Arc::new(Ggx::new(roughness, 1.0, 1.5, true, Color::splat(1.0), Color::splat(1.0)))
}

fn skin(reflectance: Color) -> MaterialHandle {
    Arc::new(Dipole::from_reflectance(1.3, reflectance, Color::splat(2.0), 0.4))
}

fn build_minimal() -> Scene {
    let resolution = crate::math::Vec2i::new(256, 256);
    let shapes = vec![Shape::new(
        ShapeKind::Sphere(Sphere { radius: 1.0 }),
        Transform::IDENTITY,
        Some(lambert(Color::splat(0.7))),
    )];
    let lights = vec![Light::Point(PointLight {
        position: Vec3::new(0.0, 0.0, 2.0),
        color: Color::splat(0.7),
    })];
    let camera = default_camera(resolution, Vec3::new(0.0, 0.0, 5.0), Vec3::zero());
    Scene::new(shapes, lights, Environment::Constant(Color::zero()), camera)
}

fn build_cornell() -> Scene {
    let resolution = crate::math::Vec2i::new(256, 256);
    let white = lambert(Color::splat(0.73));
    let red = lambert(Color::new(0.65, 0.05, 0.05));
    let green = lambert(Color::new(0.12, 0.45, 0.15));

    let wall = |p0: Vec3, edge1: Vec3, edge2: Vec3, material: MaterialHandle| {
        Shape::new(ShapeKind::Quad(Quad { p0, edge1, edge2 }), Transform::IDENTITY, Some(material))
    };

    let shapes = vec![
        // Floor
        wall(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0), white.clone()),
        // Ceiling
        wall(Vec3::new(-2.0, 2.0, -2.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0), white.clone()),
        // Back wall
        wall(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0), white.clone()),
        // Left wall (red)
        wall(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 4.0, 0.0), red),
        // Right wall (green)
        wall(Vec3::new(2.0, -2.0, -2.0), Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 4.0, 0.0), green),
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 0.6 }),
            Transform::translate(Vec3::new(-0.8, -1.4, -0.5)),
            Some(mirror(0.05)),
        ),
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 0.6 }),
            Transform::translate(Vec3::new(0.8, -1.4, 0.4)),
            Some(glass(0.0)),
        ),
    ];

    let lights = vec![Light::Rect(RectLight {
        transform: Transform::translate(Vec3::new(0.0, 1.98, -0.5)),
        half_extent: (0.5, 0.5),
        color: Color::splat(8.0),
    })];

    let camera = default_camera(resolution, Vec3::new(0.0, 0.0, 6.0), Vec3::zero());
    Scene::new(shapes, lights, Environment::Constant(Color::zero()), camera)
}

fn build_showcase() -> Scene {
    let resolution = crate::math::Vec2i::new(320, 180);
    let shapes = vec![
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1000.0 }),
            Transform::translate(Vec3::new(0.0, -1001.0, 0.0)),
            Some(lambert(Color::splat(0.5))),
        ),
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(-2.5, 0.0, 0.0)),
            Some(lambert(Color::new(0.7, 0.2, 0.2))),
        ),
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(0.0, 0.0, 0.0)),
            Some(mirror(0.05)),
        ),
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(2.5, 0.0, 0.0)),
            Some(glass(0.0)),
        ),
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(5.0, 0.0, 0.0)),
            Some(skin(Color::new(0.9, 0.6, 0.5))),
        ),
    ];
    let lights = vec![
        Light::Point(PointLight {
            position: Vec3::new(-3.0, 5.0, 3.0),
            color: Color::splat(15.0),
        }),
        Light::Sphere(SphereLight::new(Vec3::new(3.0, 4.0, 4.0), 0.5, Color::splat(10.0))),
    ];
    let camera = default_camera(resolution, Vec3::new(0.0, 2.0, 9.0), Vec3::new(1.0, 0.0, 0.0));
    Scene::new(shapes, lights, Environment::Constant(Color::new(0.05, 0.08, 0.12)), camera)
}

fn build_gallery() -> Scene {
    let resolution = crate::math::Vec2i::new(320, 180);
    let shapes = vec![
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 0.8 }),
            Transform::translate(Vec3::new(-6.0, 0.0, 0.0)),
            Some(lambert(Color::splat(0.6))),
        ),
        Shape::new(
            ShapeKind::Triangle(Triangle {
                p0: Vec3::new(-4.8, -0.8, 0.0),
                p1: Vec3::new(-3.2, -0.8, 0.0),
                p2: Vec3::new(-4.0, 0.8, 0.0),
            }),
            Transform::IDENTITY,
            Some(lambert(Color::splat(0.6))),
        ),
        Shape::new(
            ShapeKind::Quad(Quad {
                p0: Vec3::new(-2.8, -0.8, 0.0),
                edge1: Vec3::new(1.6, 0.0, 0.0),
                edge2: Vec3::new(0.0, 1.6, 0.0),
            }),
            Transform::IDENTITY,
            Some(lambert(Color::splat(0.6))),
        ),
        Shape::new(
            ShapeKind::Disk(Disk {
                radius: 0.8,
                inner_radius: 0.3,
                height: 0.0,
            }),
            Transform::translate(Vec3::new(0.0, 0.0, 0.0)),
            Some(lambert(Color::splat(0.6))),
        ),
        Shape::new(
            ShapeKind::Tube(Tube {
                radius: 0.6,
                y_min: -0.8,
                y_max: 0.8,
            }),
            Transform::translate(Vec3::new(2.4, 0.0, 0.0)),
            Some(mirror(0.2)),
        ),
        Shape::new(
            ShapeKind::Funnel(Funnel {
                radius_min: 0.2,
                radius_max: 0.8,
                y_min: -0.8,
                y_max: 0.8,
            }),
            Transform::translate(Vec3::new(4.8, 0.0, 0.0)),
            Some(glass(0.0)),
        ),
    ];
    let lights = vec![Light::Point(PointLight {
        position: Vec3::new(0.0, 5.0, 5.0),
        color: Color::splat(20.0),
    })];
    let camera = default_camera(resolution, Vec3::new(0.0, 1.0, 6.0), Vec3::new(0.0, 0.0, 0.0));
    Scene::new(shapes, lights, Environment::Constant(Color::new(0.02, 0.02, 0.03)), camera)
}

fn build_stress() -> Scene {
    let resolution = crate::math::Vec2i::new(320, 180);
    let mut shapes = vec![Shape::new(
        ShapeKind::Sphere(Sphere { radius: 1000.0 }),
        Transform::translate(Vec3::new(0.0, -1001.0, 0.0)),
        Some(lambert(Color::splat(0.5))),
    )];
    let grid = 12;
    for i in 0..grid {
        for j in 0..grid {
            let x = (i as f64 - grid as f64 / 2.0) * 1.2;
            let z = (j as f64 - grid as f64 / 2.0) * 1.2;
            let material = if (i + j) % 2 == 0 {
                lambert(Color::new(0.3, 0.5, 0.7))
            } else {
                mirror(0.3)
            };
            shapes.push(Shape::new(
                ShapeKind::Sphere(Sphere { radius: 0.4 }),
                Transform::translate(Vec3::new(x, -0.6, z)),
                Some(material),
            ));
        }
    }
    let lights = vec![Light::Point(PointLight {
        position: Vec3::new(0.0, 10.0, 0.0),
        color: Color::splat(40.0),
    })];
    let camera = default_camera(resolution, Vec3::new(0.0, 6.0, 14.0), Vec3::zero());
    Scene::new(shapes, lights, Environment::Constant(Color::new(0.05, 0.05, 0.08)), camera)
}
