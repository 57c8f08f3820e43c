//! Reflection, refraction and Fresnel helpers.

use crate::Vec3;

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `incident` through a surface with normal `normal`.
///
/// `eta` is the ratio of refractive indices (incident side over transmitted
/// side). `normal` must face against `incident`. Under total internal
/// reflection the reflected direction is returned instead.
pub fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Vec3 {
    let cos_i = -incident.dot(normal);
    let sin_t2 = eta * eta * (1.0 - cos_i * cos_i);

    if sin_t2 > 1.0 {
        return reflect(incident, normal);
    }

    let cos_t = (1.0 - sin_t2).sqrt();
    (eta * incident + (eta * cos_i - cos_t) * normal).normalize_or_zero()
}

/// Schlick's approximation of the Fresnel reflectance.
///
/// `cosine` is the cosine between the surface normal and the view vector.
pub fn schlick_reflectance(cosine: f32, eta: f32) -> f32 {
    let r0 = ((eta - 1.0) / (eta + 1.0)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine.clamp(0.0, 1.0)).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_flips_normal_component() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        let r = reflect(v, Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        let d = refract(-Vec3::Z, Vec3::Z, 1.0 / 1.5);
        assert!((d - (-Vec3::Z)).length() < 1e-6);
    }

    #[test]
    fn test_refract_bends_towards_normal() {
        let incident = Vec3::new(1.0, 0.0, -1.0).normalize();
        let d = refract(incident, Vec3::Z, 1.0 / 1.5);

        // Entering a denser medium: the angle to -normal shrinks.
        let cos_in = incident.dot(-Vec3::Z);
        let cos_out = d.dot(-Vec3::Z);
        assert!(cos_out > cos_in);
        assert!((d.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_total_internal_reflection_reflects() {
        let incident = Vec3::new(1.0, 0.0, -0.2).normalize();
        let d = refract(incident, Vec3::Z, 1.5);
        assert!((d - reflect(incident, Vec3::Z)).length() < 1e-6);
    }

    #[test]
    fn test_schlick_bounds() {
        // Head on, only the base reflectance remains.
        let r0 = schlick_reflectance(1.0, 1.5);
        assert!((r0 - 0.04).abs() < 1e-4);

        // Grazing, everything reflects.
        assert!((schlick_reflectance(0.0, 1.5) - 1.0).abs() < 1e-6);

        // Symmetric in the index ratio.
        assert!((schlick_reflectance(0.7, 1.5) - schlick_reflectance(0.7, 1.0 / 1.5)).abs() < 1e-6);
    }
}
