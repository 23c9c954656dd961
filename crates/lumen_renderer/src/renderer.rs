//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with a bounded bounce count
//! - Gamma correction
//! - Anti-aliasing via multi-sampling

use crate::random::row_rng;
use crate::scheduler::RowJob;
use crate::{HittableList, Viewport};
use lumen_math::{Color, Interval, Ray};
use rand::RngCore;

/// Closest hit distance accepted; keeps scattered rays off their own surface.
pub const SHADOW_ACNE_EPSILON: f32 = 0.001;

/// Compute the color seen by a ray.
///
/// `depth` is the number of path segments still allowed; at zero the path
/// contributes no light.
pub fn ray_color(
    ray: &Ray,
    world: &HittableList,
    depth: u32,
    sky_color: Color,
    rng: &mut dyn RngCore,
) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = world.hit(ray, Interval::new(SHADOW_ACNE_EPSILON, f32::INFINITY)) else {
        return sky_gradient(ray, sky_color);
    };

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            result.attenuation * ray_color(&result.scattered, world, depth - 1, sky_color, rng)
        }
        None => Color::ZERO,
    }
}

/// Vertical blend from white (looking down) to `sky_color` (looking up).
pub fn sky_gradient(ray: &Ray, sky_color: Color) -> Color {
    let Some(unit_direction) = ray.direction().try_normalize() else {
        return Color::ZERO;
    };
    let a = 0.5 * (unit_direction.y + 1.0);
    (1.0 - a) * Color::ONE + a * sky_color
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert an averaged linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let quantize = |c: f32| (256.0 * Interval::INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}

/// Average `samples_per_pixel` jittered paths through pixel (x, y).
pub fn render_pixel(
    viewport: &Viewport,
    world: &HittableList,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    // max_depth counts bounces; the primary segment is not one of them
    let depth = viewport.max_depth.saturating_add(1);
    for _ in 0..viewport.samples_per_pixel {
        let ray = viewport.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, depth, viewport.sky_color, rng);
    }

    pixel_color / viewport.samples_per_pixel as f32
}

/// Render one row to RGBA8 bytes.
///
/// Uses the row's own random stream, so the result does not depend on which
/// thread runs it.
pub fn render_row(job: &RowJob) -> Vec<u8> {
    let viewport = &job.viewport;
    let mut rng = row_rng(job.seed, job.row);
    let mut pixels = Vec::with_capacity(viewport.image_width as usize * 4);

    for x in 0..viewport.image_width {
        let color = render_pixel(viewport, &job.world, x, job.row, &mut rng);
        pixels.extend_from_slice(&color_to_rgba(color));
    }

    pixels
}

/// Render a set of rows sequentially into one buffer, in job order.
pub fn render_rows(jobs: &[RowJob]) -> Vec<u8> {
    jobs.iter().flat_map(render_row).collect()
}

/// RGBA8 pixel buffer, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new fully transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride();
        &self.data[start..start + self.stride()]
    }

    /// Copy a finished row into its byte range.
    ///
    /// Returns `false` without writing if the row index or length is wrong.
    pub fn write_row(&mut self, y: u32, pixels: &[u8]) -> bool {
        let stride = self.stride();
        if y >= self.height || pixels.len() != stride {
            return false;
        }
        let start = y as usize * stride;
        self.data[start..start + stride].copy_from_slice(pixels);
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
