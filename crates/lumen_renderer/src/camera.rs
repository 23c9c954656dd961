//! Camera for ray generation.
//!
//! A [`Camera`] holds user-facing [`CameraSettings`]. Calling
//! [`Camera::initialize`] derives an immutable [`Viewport`], which is what
//! render jobs carry around. Changing any setting drops the viewport again,
//! so a stale viewport can never be rendered.

use crate::random::{random_in_unit_disk, sample_square};
use crate::renderer::render_rows;
use crate::scheduler::{RenderHandle, RenderScheduler, RowJob};
use crate::{HittableList, RenderError, RenderResult};
use lumen_math::{Color, Point3, Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User-facing camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraSettings {
    /// Ratio of image width over height
    pub aspect_ratio: f32,
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Random samples for each pixel
    pub samples_per_pixel: u32,
    /// Maximum number of bounces per path
    pub max_depth: u32,
    /// Vertical field of view in degrees
    #[serde(rename = "vFov")]
    pub vfov: f32,
    pub look_from: Point3,
    pub look_at: Point3,
    /// Camera-relative "up" direction
    #[serde(rename = "vUp")]
    pub vup: Vec3,
    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f32,
    /// Distance from camera to plane of perfect focus
    #[serde(alias = "focusDist")]
    pub focus_distance: f32,
    /// Top colour of the background gradient
    #[serde(rename = "skyBoxColor")]
    pub sky_color: Color,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 16.0 / 9.0,
            image_width: 400,
            samples_per_pixel: 10,
            max_depth: 10,
            vfov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_distance: 10.0,
            sky_color: Color::new(0.5, 0.7, 1.0),
        }
    }
}

/// Everything derived from [`CameraSettings`] that a row needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub image_width: u32,
    pub image_height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub sky_color: Color,
    center: Point3,
    pixel00_loc: Point3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    defocus_angle: f32,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Viewport {
    fn new(settings: &CameraSettings) -> Self {
        let image_width = settings.image_width.max(1);
        let image_height = ((image_width as f32 / settings.aspect_ratio) as u32).max(1);
        let center = settings.look_from;

        // Calculate viewport dimensions
        let theta = settings.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * settings.focus_distance;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        // Calculate camera basis vectors
        let w = (settings.look_from - settings.look_at).normalize();
        let u = settings.vup.cross(w).normalize();
        let v = w.cross(u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let viewport_upper_left =
            center - settings.focus_distance * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius =
            settings.focus_distance * (settings.defocus_angle / 2.0).to_radians().tan();

        Self {
            image_width,
            image_height,
            samples_per_pixel: settings.samples_per_pixel.max(1),
            max_depth: settings.max_depth,
            sky_color: settings.sky_color,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            defocus_angle: settings.defocus_angle,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
        }
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Location of the centre of pixel (i, j).
    pub fn pixel_center(&self, i: u32, j: u32) -> Point3 {
        self.pixel00_loc + (i as f32) * self.pixel_delta_u + (j as f32) * self.pixel_delta_v
    }

    /// Generate a jittered ray through pixel (i, j).
    ///
    /// Originates on the defocus disk when `defocus_angle > 0`.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Point3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    /// Size of the RGBA8 buffer this viewport renders into.
    pub fn buffer_len(&self) -> usize {
        self.image_width as usize * self.image_height as usize * 4
    }
}

/// Camera for generating rays into the scene.
#[derive(Debug, Clone, Default)]
pub struct Camera {
    settings: CameraSettings,
    viewport: Option<Viewport>,
}

impl Camera {
    /// Create an uninitialized camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: CameraSettings) -> Self {
        Self {
            settings,
            viewport: None,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Replace every setting at once. The camera must be re-initialized.
    pub fn apply_settings(&mut self, settings: CameraSettings) {
        self.settings = settings;
        self.viewport = None;
    }

    /// Mutable access to the settings. The camera must be re-initialized.
    pub fn settings_mut(&mut self) -> &mut CameraSettings {
        self.viewport = None;
        &mut self.settings
    }

    /// Set image width and aspect ratio.
    pub fn with_resolution(mut self, image_width: u32, aspect_ratio: f32) -> Self {
        self.settings.image_width = image_width;
        self.settings.aspect_ratio = aspect_ratio;
        self.viewport = None;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.settings.samples_per_pixel = samples_per_pixel;
        self.settings.max_depth = max_depth;
        self.viewport = None;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Point3, look_at: Point3, vup: Vec3) -> Self {
        self.settings.look_from = look_from;
        self.settings.look_at = look_at;
        self.settings.vup = vup;
        self.viewport = None;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_distance: f32) -> Self {
        self.settings.vfov = vfov;
        self.settings.defocus_angle = defocus_angle;
        self.settings.focus_distance = focus_distance;
        self.viewport = None;
        self
    }

    /// Set the top colour of the sky gradient.
    pub fn with_sky_color(mut self, sky_color: Color) -> Self {
        self.settings.sky_color = sky_color;
        self.viewport = None;
        self
    }

    /// Derive the viewport. Must be called after every settings change.
    pub fn initialize(&mut self) {
        let viewport = Viewport::new(&self.settings);
        log::debug!(
            "Camera initialized: {}x{} @ {} spp, max depth {}",
            viewport.image_width,
            viewport.image_height,
            viewport.samples_per_pixel,
            viewport.max_depth
        );
        self.viewport = Some(viewport);
    }

    pub fn is_initialized(&self) -> bool {
        self.viewport.is_some()
    }

    pub fn viewport(&self) -> RenderResult<&Viewport> {
        self.viewport.as_ref().ok_or(RenderError::CameraNotInitialized)
    }

    /// One self-contained job per image row, top to bottom.
    pub fn row_jobs(&self, world: &Arc<HittableList>, seed: u64) -> RenderResult<Vec<RowJob>> {
        let viewport = *self.viewport()?;
        Ok((0..viewport.image_height)
            .map(|row| RowJob {
                row,
                viewport,
                world: Arc::clone(world),
                seed,
            })
            .collect())
    }

    /// Start rendering `world` on `scheduler`.
    ///
    /// Rows stream back through the returned handle. Any render previously
    /// started on the same scheduler is cancelled.
    pub fn render(
        &self,
        world: &Arc<HittableList>,
        scheduler: &RenderScheduler,
        seed: u64,
    ) -> RenderResult<RenderHandle> {
        let jobs = self.row_jobs(world, seed)?;
        let viewport = *self.viewport()?;
        Ok(scheduler.submit(viewport, jobs))
    }

    /// Render every row on the calling thread.
    pub fn render_blocking(&self, world: &Arc<HittableList>, seed: u64) -> RenderResult<Vec<u8>> {
        let jobs = self.row_jobs(world, seed)?;
        Ok(render_rows(&jobs))
    }
}
