//! Rays recorded in the ray tree.
//!
//! A [`TracedRay`] is a finished segment: where it started, which way it
//! went, how far it travelled and the color it contributed.

use march_math::{Color, Vec3};

/// Role of a ray in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RayKind {
    /// Primary ray from the camera
    Normal,
    Reflect,
    Refract,
    /// Blocked light sample
    Shadow,
    /// Unblocked light sample
    Light,
    /// Ray that left the scene
    NoHit,
    /// Indicator from a march position to its nearest collision point
    MarchCollision,
    /// Indicator for one march step
    MarchArc,
}

impl RayKind {
    /// Short lowercase label.
    pub fn name(&self) -> &'static str {
        match self {
            RayKind::Normal => "normal",
            RayKind::Reflect => "reflect",
            RayKind::Refract => "refract",
            RayKind::Shadow => "shadow",
            RayKind::Light => "light",
            RayKind::NoHit => "nohit",
            RayKind::MarchCollision => "march_collision",
            RayKind::MarchArc => "march_arc",
        }
    }
}

/// A traced ray segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracedRay {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
    /// Distance travelled; infinite for [`RayKind::NoHit`]
    pub length: f32,
    /// Clamped color contribution, already scaled by `weight`
    pub color: Color,
    pub kind: RayKind,
    /// Reflectance or transmittance applied to this ray's color; 1 unless
    /// the ray is a weighted reflect or refract child
    pub weight: f32,
}

impl TracedRay {
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, length: f32, color: Color, kind: RayKind) -> Self {
        Self {
            origin,
            direction,
            length,
            color,
            kind,
            weight: 1.0,
        }
    }

    /// Scale the color by `weight` and record it.
    #[inline]
    pub fn weighted(mut self, weight: f32) -> Self {
        self.color *= weight;
        self.weight = weight;
        self
    }

    /// End point, or `None` for rays of infinite length.
    pub fn end_point(&self) -> Option<Vec3> {
        self.length
            .is_finite()
            .then(|| self.origin + self.direction * self.length)
    }
}
