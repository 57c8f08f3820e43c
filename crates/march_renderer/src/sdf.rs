//! Distance field evaluation for scene objects.
//!
//! Each [`SdfObject`] is prepared once per render into an [`SdfPrimitive`]:
//! either an exact distance function or, for configurations without one, a
//! convex hull of the object's geometry. Distances are unsigned so rays can
//! march inside transparent objects.

use std::fmt;

use march_core::{Scene, SdfObject, Shape, Transform};
use march_math::{Quat, Vec2, Vec3};

use crate::hull::{unit_cube_vertices, unit_cylinder_vertices, unit_sphere_vertices, ConvexHull};

/// Ellipsoid hull resolution.
const SPHERE_RINGS: usize = 8;
const SPHERE_SEGMENTS: usize = 16;

/// Cylinder hull resolution.
const CYLINDER_SEGMENTS: usize = 24;

/// Result of measuring one object from a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    /// Unsigned distance to the surface
    pub distance: f32,
    /// Closest point on (or near) the surface
    pub collision: Vec3,
    /// Outward unit normal at the collision point
    pub normal: Vec3,
}

/// Why an object is measured against its hull instead of exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    NonUniformSphere,
    RotatedBox,
    EllipticCylinder,
    ConvexMesh,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Fallback::NonUniformSphere => "sphere with non-uniform scale",
            Fallback::RotatedBox => "rotated box",
            Fallback::EllipticCylinder => "cylinder with unequal x/z scale",
            Fallback::ConvexMesh => "convex mesh",
        };
        f.write_str(reason)
    }
}

/// An object measured approximately, reported to the caller for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Approximation {
    /// Index into `Scene::objects`
    pub index: usize,
    pub name: String,
    pub reason: Fallback,
}

#[derive(Debug, Clone)]
enum Geometry {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Box {
        center: Vec3,
        half_extents: Vec3,
    },
    Capsule {
        a: Vec3,
        b: Vec3,
        radius: f32,
        /// Used when the query point lies on the axis.
        side: Vec3,
    },
    Cylinder {
        center: Vec3,
        rotation: Quat,
        half_height: f32,
        radius: f32,
    },
    Hull(ConvexHull),
}

/// A scene object prepared for distance queries.
#[derive(Debug, Clone)]
pub struct SdfPrimitive {
    geometry: Geometry,
    fallback: Option<Fallback>,
}

impl SdfPrimitive {
    /// Prepare an object, choosing an exact distance function when one
    /// exists for its shape and transform.
    pub fn from_object(object: &SdfObject) -> Self {
        let t = &object.transform;

        match &object.shape {
            Shape::Sphere if t.has_uniform_scale() => Self::exact(Geometry::Sphere {
                center: t.translation,
                radius: 0.5 * t.scale.x.abs(),
            }),
            Shape::Sphere => Self::hull(
                t,
                &unit_sphere_vertices(SPHERE_RINGS, SPHERE_SEGMENTS),
                Fallback::NonUniformSphere,
            ),
            Shape::Box if !t.is_rotated() => Self::exact(Geometry::Box {
                center: t.translation,
                half_extents: 0.5 * t.scale.abs(),
            }),
            Shape::Box => Self::hull(t, &unit_cube_vertices(), Fallback::RotatedBox),
            Shape::Capsule => {
                let radius = 0.5 * t.scale.x.abs().max(t.scale.z.abs());
                let half_length = (t.scale.y.abs() - radius).max(0.0);
                let axis = t.rotation * Vec3::new(0.0, half_length, 0.0);
                Self::exact(Geometry::Capsule {
                    a: t.translation - axis,
                    b: t.translation + axis,
                    radius,
                    side: t.rotation * Vec3::X,
                })
            }
            Shape::Cylinder if t.scale.x == t.scale.z => Self::exact(Geometry::Cylinder {
                center: t.translation,
                rotation: t.rotation,
                half_height: t.scale.y.abs(),
                radius: 0.5 * t.scale.x.abs(),
            }),
            Shape::Cylinder => Self::hull(
                t,
                &unit_cylinder_vertices(CYLINDER_SEGMENTS),
                Fallback::EllipticCylinder,
            ),
            Shape::ConvexMesh { vertices } => Self::hull(t, vertices, Fallback::ConvexMesh),
        }
    }

    fn exact(geometry: Geometry) -> Self {
        Self {
            geometry,
            fallback: None,
        }
    }

    fn hull(transform: &Transform, local: &[Vec3], reason: Fallback) -> Self {
        let hull = ConvexHull::from_local(local, &transform.to_matrix())
            .unwrap_or_else(|| ConvexHull::point(transform.translation));
        Self {
            geometry: Geometry::Hull(hull),
            fallback: Some(reason),
        }
    }

    /// Why this primitive is approximate, if it is.
    pub fn fallback(&self) -> Option<Fallback> {
        self.fallback
    }

    /// Measure the distance from `p` to this primitive's surface.
    pub fn distance(&self, p: Vec3) -> DistanceSample {
        match &self.geometry {
            Geometry::Sphere { center, radius } => sphere_distance(p, *center, *radius),
            Geometry::Box {
                center,
                half_extents,
            } => box_distance(p, *center, *half_extents),
            Geometry::Capsule { a, b, radius, side } => capsule_distance(p, *a, *b, *radius, *side),
            Geometry::Cylinder {
                center,
                rotation,
                half_height,
                radius,
            } => cylinder_distance(p, *center, *rotation, *half_height, *radius),
            Geometry::Hull(hull) => {
                let sample = hull.sample(p);
                DistanceSample {
                    distance: sample.distance,
                    collision: sample.point,
                    normal: sample.normal,
                }
            }
        }
    }
}

/// List the objects of a scene that will be measured approximately.
pub fn approximations(scene: &Scene) -> Vec<Approximation> {
    scene
        .objects
        .iter()
        .enumerate()
        .filter_map(|(index, object)| {
            SdfPrimitive::from_object(object)
                .fallback()
                .map(|reason| Approximation {
                    index,
                    name: object.name.clone(),
                    reason,
                })
        })
        .collect()
}

fn sphere_distance(p: Vec3, center: Vec3, radius: f32) -> DistanceSample {
    let offset = p - center;
    let len = offset.length();
    let normal = if len > 0.0 { offset / len } else { Vec3::Y };

    DistanceSample {
        distance: (len - radius).abs(),
        collision: center + normal * radius,
        normal,
    }
}

fn box_distance(p: Vec3, center: Vec3, half_extents: Vec3) -> DistanceSample {
    let d = p - center;
    let q = d.abs() - half_extents;

    if q.max_element() > 0.0 {
        let outside = q.max(Vec3::ZERO);
        return DistanceSample {
            distance: outside.length(),
            collision: p.clamp(center - half_extents, center + half_extents),
            normal: (outside * d.signum()).normalize(),
        };
    }

    // Inside: leave through the nearest face.
    let axis = if q.x >= q.y && q.x >= q.z {
        0
    } else if q.y >= q.z {
        1
    } else {
        2
    };
    let sign = d[axis].signum();

    let mut normal = Vec3::ZERO;
    normal[axis] = sign;
    let mut collision = p;
    collision[axis] = center[axis] + sign * half_extents[axis];

    DistanceSample {
        distance: -q[axis],
        collision,
        normal,
    }
}

fn capsule_distance(p: Vec3, a: Vec3, b: Vec3, radius: f32, side: Vec3) -> DistanceSample {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > 0.0 {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let spine = a + t * ab;

    let offset = p - spine;
    let len = offset.length();
    let normal = if len > 0.0 { offset / len } else { side };

    DistanceSample {
        distance: (len - radius).abs(),
        collision: spine + normal * radius,
        normal,
    }
}

fn cylinder_distance(
    p: Vec3,
    center: Vec3,
    rotation: Quat,
    half_height: f32,
    radius: f32,
) -> DistanceSample {
    let local = rotation.inverse() * (p - center);
    let radial = Vec2::new(local.x, local.z);
    let rho = radial.length();
    let radial_dir = if rho > 0.0 { radial / rho } else { Vec2::X };
    let axial_sign = local.y.signum();

    let dr = rho - radius;
    let dy = local.y.abs() - half_height;

    let (distance, local_collision, local_normal) = if dr > 0.0 || dy > 0.0 {
        let out_r = dr.max(0.0);
        let out_y = dy.max(0.0);
        let rim = radial_dir * rho.min(radius);
        (
            Vec2::new(out_r, out_y).length(),
            Vec3::new(rim.x, local.y.clamp(-half_height, half_height), rim.y),
            Vec3::new(radial_dir.x * out_r, axial_sign * out_y, radial_dir.y * out_r).normalize(),
        )
    } else if dr > dy {
        // Closer to the side wall than to a cap.
        let rim = radial_dir * radius;
        (
            -dr,
            Vec3::new(rim.x, local.y, rim.y),
            Vec3::new(radial_dir.x, 0.0, radial_dir.y),
        )
    } else {
        (
            -dy,
            Vec3::new(local.x, axial_sign * half_height, local.z),
            Vec3::new(0.0, axial_sign, 0.0),
        )
    };

    DistanceSample {
        distance,
        collision: center + rotation * local_collision,
        normal: rotation * local_normal,
    }
}
