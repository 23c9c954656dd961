//! Lumen - CPU Path Tracing
//!
//! A Monte Carlo path tracer for spheres with diffuse, metal, glass and
//! marble materials. Rows of the image are rendered in parallel on a
//! worker pool and streamed back to the caller as they finish.

mod camera;
mod error;
mod hittable;
mod material;
mod noise;
pub mod random;
mod renderer;
mod scene;
mod scheduler;
mod sphere;

pub use camera::{Camera, CameraSettings, Viewport};
pub use error::{RenderError, RenderResult, SceneError, SceneResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{
    reflect, reflectance, refract, Dielectric, Lambertian, Marble, Material, Metal, ScatterResult,
};
pub use noise::Perlin;
pub use renderer::{
    color_to_rgba, linear_to_gamma, ray_color, render_pixel, render_row, render_rows,
    sky_gradient, PixelBuffer, SHADOW_ACNE_EPSILON,
};
pub use scene::{MaterialDescription, MaterialRef, ObjectDescription, Scene, SceneDescription};
pub use scheduler::{
    distribute_round_robin, RenderHandle, RenderProgress, RenderScheduler, RowJob, RowResult,
};
pub use sphere::Sphere;

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Color, Interval, Point3, Ray, Vec3};
