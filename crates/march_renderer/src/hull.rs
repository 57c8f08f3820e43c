//! Closest-point queries against the convex hull of a vertex set.
//!
//! Used for shapes without an exact distance function. Exterior closest
//! points come from a GJK iteration; interior distances are only estimated
//! from the support function over a fixed direction set, so the result is
//! not a true SDF inside the hull.

use arrayvec::ArrayVec;
use march_math::{Mat4, Vec3};

/// GJK iterations per query.
const MAX_ITERATIONS: usize = 32;

/// Relative progress below which GJK stops.
const GAP_TOLERANCE: f32 = 1e-6;

/// Below this distance a point counts as inside the hull.
const INSIDE_TOLERANCE: f32 = 1e-5;

/// Up to four points, relative to the query point.
type Simplex = ArrayVec<Vec3, 4>;

/// Convex hull of a set of world-space points.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    vertices: Vec<Vec3>,
    centroid: Vec3,
    /// Directions used to estimate interior distances.
    directions: Vec<Vec3>,
}

/// Closest surface point and outward normal for a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullSample {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

impl ConvexHull {
    /// Build a hull from world-space vertices. Returns `None` if empty.
    pub fn new(vertices: Vec<Vec3>) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }

        let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
        let directions = interior_directions(&vertices, centroid);

        Some(Self {
            vertices,
            centroid,
            directions,
        })
    }

    /// A hull collapsed to a single point.
    pub fn point(p: Vec3) -> Self {
        Self {
            vertices: vec![p],
            centroid: p,
            directions: interior_directions(&[p], p),
        }
    }

    /// Build a hull from local-space vertices and an object matrix.
    pub fn from_local(local: &[Vec3], matrix: &Mat4) -> Option<Self> {
        Self::new(local.iter().map(|&v| matrix.transform_point3(v)).collect())
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Vertex maximizing `v . direction`.
    fn support(&self, direction: Vec3) -> Vec3 {
        let mut best = self.vertices[0];
        let mut best_dot = best.dot(direction);
        for &v in &self.vertices[1..] {
            let d = v.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = v;
            }
        }
        best
    }

    /// Closest point of the hull to `p`. Returns `p` itself when inside.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let mut simplex = Simplex::new();
        simplex.push(self.vertices[0] - p);
        let mut v = simplex[0];

        for _ in 0..MAX_ITERATIONS {
            let v_len_sq = v.length_squared();
            if v_len_sq <= INSIDE_TOLERANCE * INSIDE_TOLERANCE {
                return p;
            }

            let w = self.support(-v) - p;
            if v_len_sq - v.dot(w) <= GAP_TOLERANCE * v_len_sq || simplex.contains(&w) {
                break;
            }

            simplex.push(w);
            match closest_on_simplex(&mut simplex) {
                Some(closest) => v = closest,
                // The simplex encloses the query point.
                None => return p,
            }
        }

        v + p
    }

    /// Unsigned distance, closest surface point and outward normal.
    pub fn sample(&self, p: Vec3) -> HullSample {
        let closest = self.closest_point(p);
        let offset = p - closest;
        let distance = offset.length();

        if distance > INSIDE_TOLERANCE {
            return HullSample {
                distance,
                point: closest,
                normal: offset / distance,
            };
        }

        self.interior_sample(p)
    }

    /// Estimate the way out for a point inside the hull.
    fn interior_sample(&self, p: Vec3) -> HullSample {
        let mut best_distance = f32::INFINITY;
        let mut best_direction = (p - self.centroid).normalize_or_zero();

        for &d in &self.directions {
            let depth = self.support(d).dot(d) - p.dot(d);
            if depth < best_distance {
                best_distance = depth;
                best_direction = d;
            }
        }

        let distance = best_distance.max(0.0);
        if best_direction == Vec3::ZERO {
            best_direction = Vec3::Y;
        }

        HullSample {
            distance,
            point: p + best_direction * distance,
            normal: best_direction,
        }
    }
}

/// Closest point of the simplex to the origin. Shrinks the simplex to the
/// feature containing that point; `None` when the origin is enclosed.
fn closest_on_simplex(simplex: &mut Simplex) -> Option<Vec3> {
    let (point, keep) = match simplex.len() {
        1 => return Some(simplex[0]),
        2 => closest_on_segment(simplex[0], simplex[1]),
        3 => closest_on_triangle(simplex[0], simplex[1], simplex[2]),
        _ => closest_on_tetrahedron(simplex[0], simplex[1], simplex[2], simplex[3])?,
    };
    *simplex = keep;
    Some(point)
}

fn closest_on_segment(a: Vec3, b: Vec3) -> (Vec3, Simplex) {
    let ab = b - a;
    let denom = ab.length_squared();
    let t = if denom > 0.0 { -a.dot(ab) / denom } else { 0.0 };

    if t <= 0.0 {
        (a, simplex_of(&[a]))
    } else if t >= 1.0 {
        (b, simplex_of(&[b]))
    } else {
        (a + t * ab, simplex_of(&[a, b]))
    }
}

/// Voronoi-region walk over the triangle (Ericson, Real-Time Collision
/// Detection 5.1.5) with the origin as query point.
fn closest_on_triangle(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Simplex) {
    let ab = b - a;
    let ac = c - a;

    let d1 = ab.dot(-a);
    let d2 = ac.dot(-a);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, simplex_of(&[a]));
    }

    let d3 = ab.dot(-b);
    let d4 = ac.dot(-b);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, simplex_of(&[b]));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + v * ab, simplex_of(&[a, b]));
    }

    let d5 = ab.dot(-c);
    let d6 = ac.dot(-c);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, simplex_of(&[c]));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + w * ac, simplex_of(&[a, c]));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + w * (c - b), simplex_of(&[b, c]));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, simplex_of(&[a, b, c]))
}

fn closest_on_tetrahedron(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<(Vec3, Simplex)> {
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];

    let mut best: Option<(f32, Vec3, Simplex)> = None;
    for (x, y, z, opposite) in faces {
        if !origin_outside_face(x, y, z, opposite) {
            continue;
        }
        let (point, keep) = closest_on_triangle(x, y, z);
        let dist_sq = point.length_squared();
        if best.as_ref().map_or(true, |(best_sq, _, _)| dist_sq < *best_sq) {
            best = Some((dist_sq, point, keep));
        }
    }

    best.map(|(_, point, keep)| (point, keep))
}

/// Whether the origin and `opposite` lie on different sides of face xyz.
/// Degenerate (flat) tetrahedra report every face as outside.
fn origin_outside_face(x: Vec3, y: Vec3, z: Vec3, opposite: Vec3) -> bool {
    let n = (y - x).cross(z - x);
    let sign_origin = (-x).dot(n);
    let sign_opposite = (opposite - x).dot(n);
    sign_opposite == 0.0 || sign_origin * sign_opposite < 0.0
}

fn simplex_of(points: &[Vec3]) -> Simplex {
    points.iter().copied().collect()
}

/// Axis, edge and corner directions plus the centroid-to-vertex directions.
fn interior_directions(vertices: &[Vec3], centroid: Vec3) -> Vec<Vec3> {
    let mut directions = Vec::with_capacity(26 + vertices.len());

    for x in -1..=1 {
        for y in -1..=1 {
            for z in -1..=1 {
                if x == 0 && y == 0 && z == 0 {
                    continue;
                }
                directions.push(Vec3::new(x as f32, y as f32, z as f32).normalize());
            }
        }
    }

    directions.extend(
        vertices
            .iter()
            .map(|&v| (v - centroid).normalize_or_zero())
            .filter(|d| *d != Vec3::ZERO),
    );

    directions
}

/// Corners of the unit cube centered at the origin.
pub fn unit_cube_vertices() -> Vec<Vec3> {
    let mut vertices = Vec::with_capacity(8);
    for &x in &[-0.5, 0.5] {
        for &y in &[-0.5, 0.5] {
            for &z in &[-0.5, 0.5] {
                vertices.push(Vec3::new(x, y, z));
            }
        }
    }
    vertices
}

/// Latitude/longitude samples of the sphere of diameter 1.
pub fn unit_sphere_vertices(rings: usize, segments: usize) -> Vec<Vec3> {
    let mut vertices = vec![Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -0.5, 0.0)];

    for ring in 1..rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        for segment in 0..segments {
            let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
            let (sin_p, cos_p) = phi.sin_cos();
            vertices.push(0.5 * Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p));
        }
    }

    vertices
}

/// Top and bottom rings of the cylinder of height 2 and diameter 1.
pub fn unit_cylinder_vertices(segments: usize) -> Vec<Vec3> {
    let mut vertices = Vec::with_capacity(segments * 2);
    for segment in 0..segments {
        let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
        let (sin_p, cos_p) = phi.sin_cos();
        vertices.push(Vec3::new(0.5 * cos_p, 1.0, 0.5 * sin_p));
        vertices.push(Vec3::new(0.5 * cos_p, -1.0, 0.5 * sin_p));
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> ConvexHull {
        ConvexHull::new(unit_cube_vertices()).unwrap()
    }

    #[test]
    fn test_empty_hull_is_none() {
        assert!(ConvexHull::new(Vec::new()).is_none());
    }

    #[test]
    fn test_closest_point_face() {
        let hull = unit_cube();
        let sample = hull.sample(Vec3::new(0.1, 2.0, -0.2));

        assert!((sample.distance - 1.5).abs() < 1e-3);
        assert!((sample.point - Vec3::new(0.1, 0.5, -0.2)).length() < 1e-3);
        assert!((sample.normal - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn test_closest_point_corner() {
        let hull = unit_cube();
        let p = Vec3::new(1.5, 1.5, 1.5);
        let sample = hull.sample(p);

        assert!((sample.point - Vec3::splat(0.5)).length() < 1e-3);
        assert!((sample.distance - Vec3::ONE.length()).abs() < 1e-3);
    }

    #[test]
    fn test_interior_point() {
        let hull = unit_cube();
        let sample = hull.sample(Vec3::new(0.0, 0.0, 0.3));

        // Nearest face is +Z at 0.2 away.
        assert!((sample.distance - 0.2).abs() < 1e-4);
        assert!((sample.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_closest_point_edge() {
        let hull = unit_cube();
        let p = Vec3::new(1.0, 1.0, 0.1);
        assert!((hull.closest_point(p) - Vec3::new(0.5, 0.5, 0.1)).length() < 1e-4);
    }

    #[test]
    fn test_tetrahedron_hull() {
        let hull = ConvexHull::new(vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
        ])
        .unwrap();

        // Below the base triangle in the XY plane.
        let sample = hull.sample(Vec3::new(0.2, 0.2, -1.0));
        assert!((sample.point - Vec3::new(0.2, 0.2, 0.0)).length() < 1e-4);
        assert!((sample.normal + Vec3::Z).length() < 1e-4);

        // Inside.
        assert_eq!(hull.closest_point(Vec3::splat(0.1)), Vec3::splat(0.1));
    }

    #[test]
    fn test_single_vertex_hull() {
        let hull = ConvexHull::new(vec![Vec3::ONE]).unwrap();
        let sample = hull.sample(Vec3::new(1.0, 3.0, 1.0));
        assert!((sample.distance - 2.0).abs() < 1e-6);
        assert_eq!(sample.point, Vec3::ONE);
    }

    #[test]
    fn test_from_local_translates() {
        let matrix = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let hull = ConvexHull::from_local(&unit_cube_vertices(), &matrix).unwrap();
        let sample = hull.sample(Vec3::new(12.0, 0.0, 0.0));
        assert!((sample.distance - 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        for v in unit_sphere_vertices(8, 16) {
            assert!((v.length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cylinder_vertices() {
        let vertices = unit_cylinder_vertices(12);
        assert_eq!(vertices.len(), 24);
        assert!(vertices.iter().all(|v| v.y.abs() == 1.0));
    }
}
