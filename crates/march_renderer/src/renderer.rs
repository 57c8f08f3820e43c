//! Full-scene rendering.
//!
//! Two passes share the same camera-ray derivation:
//! - [`render`]: the interactive pass, one ray tree and collision tree per
//!   screen pixel plus a flat color array.
//! - [`render_image`]: the offline pass, up-scaled and supersampled, color
//!   only, rendered in buckets.
//!
//! Pixel `(x, y)` lives at index `x + width * y`; row 0 is the bottom of the
//! screen.

use std::time::Instant;

use march_core::{Camera, Scene};
use march_math::{clamp_color, color_to_rgba8, to_rgba, Color, Quat, Ray, Rgba, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Deserialize;

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::error::{RenderError, RenderResult};
use crate::ray::RayKind;
use crate::trace::{CollisionTree, RayTree, Tracer};

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum reflection/refraction recursion depth
    pub max_depth: u32,
    /// Whether lights are tested for occlusion
    pub render_shadows: bool,
    /// Color of rays that leave the scene
    pub background: Color,
    /// Ray-march hit threshold
    pub epsilon_rm: f32,
    /// Distance secondary rays start off the surface; must be below `epsilon_rm`
    pub surface_offset: f32,
    pub max_iterations: u32,
    pub max_step_distance: f32,
    pub max_total_distance: f32,
    /// N for N×N samples per pixel in the offline pass
    pub supersampling: u32,
    /// Target pixel count for the offline pass before supersampling
    pub image_sample_budget: u32,
    /// Spawn a reflection ray, weighted by specular, on opaque surfaces
    pub fold_specular_reflection: bool,
    /// Jitter offline sub-samples with this seed; cell centers when `None`
    pub jitter_seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            render_shadows: true,
            background: Color::ZERO,
            epsilon_rm: 0.001,
            surface_offset: 0.0001,
            max_iterations: 250,
            max_step_distance: 99.0,
            max_total_distance: f32::INFINITY,
            supersampling: 1,
            image_sample_budget: 160_000,
            fold_specular_reflection: true,
            jitter_seed: None,
        }
    }
}

impl RenderConfig {
    /// Check that the march settings can terminate and secondary rays start
    /// below the hit threshold.
    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |message: &str| Err(RenderError::InvalidConfig(message.to_string()));

        if self.epsilon_rm.is_nan() || self.epsilon_rm <= 0.0 {
            return invalid("epsilon_rm must be positive");
        }
        if self.surface_offset.is_nan() || self.surface_offset < 0.0 {
            return invalid("surface_offset must not be negative");
        }
        if self.surface_offset >= self.epsilon_rm {
            return invalid("surface_offset must be smaller than epsilon_rm");
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if self.max_step_distance.is_nan() || self.max_step_distance <= 0.0 {
            return invalid("max_step_distance must be positive");
        }
        if self.supersampling == 0 {
            return invalid("supersampling must be at least 1");
        }
        if self.image_sample_budget == 0 {
            return invalid("image_sample_budget must be at least 1");
        }
        Ok(())
    }
}

/// Check the camera can produce primary rays.
pub fn validate_camera(camera: &Camera) -> RenderResult<()> {
    if camera.screen_width == 0 || camera.screen_height == 0 {
        return Err(RenderError::InvalidCamera(format!(
            "resolution {}x{} has no pixels",
            camera.screen_width, camera.screen_height
        )));
    }
    if camera.field_of_view.is_nan() || camera.field_of_view <= 0.0 || camera.field_of_view >= 180.0 {
        return Err(RenderError::InvalidCamera(format!(
            "field of view {} is outside (0, 180)",
            camera.field_of_view
        )));
    }
    if !camera.screen_distance.is_finite() || camera.screen_distance <= 0.0 {
        return Err(RenderError::InvalidCamera(format!(
            "screen distance {} must be positive",
            camera.screen_distance
        )));
    }
    Ok(())
}

/// The virtual screen in front of the camera at a given resolution.
#[derive(Debug, Clone, Copy)]
pub struct ScreenGeometry {
    pub origin: Vec3,
    pub rotation: Quat,
    pub half_width: f32,
    pub half_height: f32,
    pub pixel_width: f32,
    pub pixel_height: f32,
    pub screen_distance: f32,
}

impl ScreenGeometry {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        let half_height = camera.screen_distance * (0.5 * camera.field_of_view).to_radians().tan();
        let half_width = half_height * width as f32 / height as f32;

        Self {
            origin: camera.position,
            rotation: camera.rotation,
            half_width,
            half_height,
            pixel_width: 2.0 * half_width / width as f32,
            pixel_height: 2.0 * half_height / height as f32,
            screen_distance: camera.screen_distance,
        }
    }

    /// Camera-to-screen vector at fractional pixel coordinates; pixel
    /// centers are at `x + 0.5`, `y + 0.5`.
    pub fn pixel_vector(&self, fx: f32, fy: f32) -> Vec3 {
        self.rotation
            * Vec3::new(
                -self.half_width + self.pixel_width * fx,
                -self.half_height + self.pixel_height * fy,
                self.screen_distance,
            )
    }
}

/// Result of the interactive pass.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    /// `Scene::revision` this output was rendered from
    pub scene_revision: u64,
    pub ray_trees: Vec<RayTree>,
    /// Index-aligned with `ray_trees`
    pub collision_trees: Vec<CollisionTree>,
    /// Root colors, alpha 1
    pub colors: Vec<Rgba>,
}

impl RenderOutput {
    /// Trees for pixel `(x, y)`.
    pub fn ray_at(&self, x: u32, y: u32) -> Option<(&RayTree, &CollisionTree)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (x + self.width * y) as usize;
        Some((&self.ray_trees[index], &self.collision_trees[index]))
    }

    /// Whether `scene` is unchanged since this output was rendered.
    pub fn is_current(&self, scene: &Scene) -> bool {
        self.scene_revision == scene.revision
    }

    /// Number of primary rays that hit something.
    pub fn hit_count(&self) -> usize {
        self.ray_trees
            .iter()
            .filter(|tree| tree.data.kind != RayKind::NoHit)
            .count()
    }
}

/// Simple image buffer for storing render output.
///
/// Row 0 is the bottom of the image.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Convert to 8-bit RGBA rows, top row first (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                bytes.extend_from_slice(&color_to_rgba8(self.get(x, y)));
            }
        }
        bytes
    }
}

/// Offline resolution for a screen and a target pixel budget.
///
/// The screen is scaled uniformly by `round(sqrt(budget / pixels))`, never
/// below 1.
pub fn image_resolution(width: u32, height: u32, budget: u32) -> (u32, u32) {
    let pixels = width as f64 * height as f64;
    let scale = (budget as f64 / pixels).sqrt().round().max(1.0) as u32;
    (width * scale, height * scale)
}

/// Trace the primary ray through the center of pixel `(x, y)`.
///
/// The root ray starts at the camera; its length is measured from there.
pub fn trace_pixel(tracer: &Tracer<'_>, screen: &ScreenGeometry, x: u32, y: u32) -> (RayTree, CollisionTree) {
    let pixel = screen.pixel_vector(x as f32 + 0.5, y as f32 + 0.5);
    let pixel_distance = pixel.length();
    let ray = Ray::new(screen.origin, pixel);

    let depth = tracer.config().max_depth;
    let (mut rays, collisions) = tracer.trace(&ray, depth, RayKind::Normal, pixel_distance);
    // The march reported distance past the screen; measure from the camera again
    if rays.data.kind != RayKind::NoHit {
        rays.data.length += pixel_distance;
    }
    (rays, collisions)
}

/// Supersampled color of pixel `(x, y)` for the offline pass.
pub fn render_image_pixel(tracer: &Tracer<'_>, screen: &ScreenGeometry, x: u32, y: u32) -> Color {
    let config = tracer.config();
    let n = config.supersampling;
    let cell = 1.0 / n as f32;
    let mut rng = config
        .jitter_seed
        .map(|seed| StdRng::seed_from_u64(pixel_seed(seed, x, y)));

    let mut sum = Color::ZERO;
    for sy in 0..n {
        for sx in 0..n {
            // Jittered inside the sub-cell when seeded, cell center otherwise
            let (jx, jy) = match rng.as_mut() {
                Some(rng) => (rng.gen::<f32>(), rng.gen::<f32>()),
                None => (0.5, 0.5),
            };
            let pixel = screen.pixel_vector(
                x as f32 + cell * (sx as f32 + jx),
                y as f32 + cell * (sy as f32 + jy),
            );
            let ray = Ray::new(screen.origin, pixel);
            sum += tracer.trace_image(&ray, config.max_depth, RayKind::Normal, pixel.length());
        }
    }

    clamp_color(sum / (n * n) as f32)
}

fn pixel_seed(seed: u64, x: u32, y: u32) -> u64 {
    (seed ^ ((u64::from(y) << 32) | u64::from(x))).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Run the interactive pass over every screen pixel.
pub fn render(scene: &Scene, config: &RenderConfig) -> RenderResult<RenderOutput> {
    let camera = &scene.camera;
    validate_camera(camera)?;
    let tracer = Tracer::new(scene, config)?;

    let (width, height) = (camera.screen_width, camera.screen_height);
    let screen = ScreenGeometry::new(camera, width, height);
    let start = Instant::now();

    let (ray_trees, collision_trees): (Vec<RayTree>, Vec<CollisionTree>) = (0..camera.pixel_count())
        .into_par_iter()
        .map(|i| {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            trace_pixel(&tracer, &screen, x, y)
        })
        .unzip();

    let colors = ray_trees.iter().map(|tree| to_rgba(tree.data.color)).collect();

    let output = RenderOutput {
        width,
        height,
        scene_revision: scene.revision,
        ray_trees,
        collision_trees,
        colors,
    };

    log::debug!(
        "Interactive pass {}x{}: {} hits in {:.2?}",
        width,
        height,
        output.hit_count(),
        start.elapsed()
    );

    Ok(output)
}

/// Run the offline pass: up-scaled, supersampled, color only.
pub fn render_image(scene: &Scene, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    let camera = &scene.camera;
    validate_camera(camera)?;
    let tracer = Tracer::new(scene, config)?;

    let (width, height) = image_resolution(
        camera.screen_width,
        camera.screen_height,
        config.image_sample_budget,
    );
    let screen = ScreenGeometry::new(camera, width, height);
    let buckets = generate_buckets(width, height, DEFAULT_BUCKET_SIZE);
    let start = Instant::now();

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .map(|bucket| BucketResult::new(*bucket, render_bucket(bucket, &tracer, &screen)))
        .collect();

    // Buckets finish in any order; write each back by pixel index
    let mut image = ImageBuffer::new(width, height);
    for result in &results {
        result.write_into(&mut image);
    }

    log::debug!(
        "Image pass {}x{} ({} buckets, {}x{} samples): {:.2?}",
        width,
        height,
        buckets.len(),
        config.supersampling,
        config.supersampling,
        start.elapsed()
    );

    Ok(image)
}
