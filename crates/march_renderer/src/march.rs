//! Sphere tracing against a set of prepared primitives.

use march_math::{Ray, Vec3};

use crate::sdf::{DistanceSample, SdfPrimitive};

/// Stepping limits for one march.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchSettings {
    /// Hit threshold
    pub epsilon: f32,
    pub max_iterations: u32,
    /// A nearest distance beyond this ends the march as a miss
    pub max_step_distance: f32,
    /// Accumulated distance beyond which the march ends as a miss
    pub max_total_distance: f32,
    /// Subtracted from the reported distance on a hit
    pub initial_offset: f32,
    /// Ignore hits until the ray has first moved `epsilon` away from every
    /// surface. Used for rays that start on a surface.
    pub escape_surface: bool,
    /// Keep the per-iteration collision trace
    pub record_samples: bool,
}

impl Default for MarchSettings {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            max_iterations: 250,
            max_step_distance: 99.0,
            max_total_distance: f32::INFINITY,
            initial_offset: 0.0,
            escape_surface: false,
            record_samples: true,
        }
    }
}

/// One iteration of a march: distance travelled so far and the nearest
/// collision point seen from there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionSample {
    pub distance: f32,
    pub point: Vec3,
}

/// Where a march stopped on a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchHit {
    /// Ray position when the hit was detected
    pub point: Vec3,
    /// Outward surface normal of the hit object
    pub normal: Vec3,
    /// Index of the hit primitive
    pub object: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarchResult {
    pub hit: Option<MarchHit>,
    /// Distance travelled; reduced by `initial_offset` on a hit
    pub total_distance: f32,
    pub iterations: u32,
    pub samples: Vec<CollisionSample>,
}

impl MarchResult {
    fn miss(total_distance: f32, iterations: u32, samples: Vec<CollisionSample>) -> Self {
        Self {
            hit: None,
            total_distance,
            iterations,
            samples,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }
}

/// Nearest primitive to `p`. `primitives` must not be empty.
fn nearest_primitive(primitives: &[SdfPrimitive], p: Vec3) -> (usize, DistanceSample) {
    let mut best = (0, primitives[0].distance(p));
    for (index, primitive) in primitives.iter().enumerate().skip(1) {
        let sample = primitive.distance(p);
        if sample.distance < best.1.distance || best.1.distance.is_nan() {
            best = (index, sample);
        }
    }
    best
}

/// March `ray` through the union of `primitives`.
///
/// Every iteration records a [`CollisionSample`] before testing for a hit, so
/// the trace always ends with the sample that decided the outcome. An empty
/// primitive list is a miss with an empty trace.
pub fn ray_march(primitives: &[SdfPrimitive], ray: &Ray, settings: &MarchSettings) -> MarchResult {
    let mut samples = Vec::new();
    if primitives.is_empty() {
        return MarchResult::miss(0.0, 0, samples);
    }

    let mut total = 0.0_f32;
    let mut position = ray.origin;
    let mut escaping = settings.escape_surface;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        iterations += 1;

        let (object, nearest) = nearest_primitive(primitives, position);
        if settings.record_samples {
            samples.push(CollisionSample {
                distance: total,
                point: nearest.collision,
            });
        }

        let min_dist = nearest.distance;
        if !min_dist.is_finite() {
            break;
        }

        let leaving = escaping && min_dist < settings.epsilon;
        if !leaving {
            escaping = false;
            if min_dist < settings.epsilon {
                return MarchResult {
                    hit: Some(MarchHit {
                        point: position,
                        normal: nearest.normal,
                        object,
                    }),
                    total_distance: total - settings.initial_offset,
                    iterations,
                    samples,
                };
            }
        }

        if min_dist > settings.max_step_distance || total > settings.max_total_distance {
            break;
        }

        let step = if leaving { settings.epsilon } else { min_dist };
        total += step;
        position += step * ray.direction;
    }

    MarchResult::miss(total, iterations, samples)
}
