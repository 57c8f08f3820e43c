// Re-export glam for convenience
pub use glam::*;

// March math types
mod color;
mod optics;
mod ray;

pub use color::{clamp_color, color_to_rgba8, to_rgba, Color, Rgba};
pub use optics::{reflect, refract, schlick_reflectance};
pub use ray::Ray;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_color_is_vec3() {
        let c: Color = Vec3::new(0.25, 0.5, 1.0);
        assert_eq!(c * 2.0, Vec3::new(0.5, 1.0, 2.0));
    }
}
