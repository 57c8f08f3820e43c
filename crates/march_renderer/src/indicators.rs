//! Drawable records derived from march samples.
//!
//! A viewer walks a [`RayTree`] alongside its [`CollisionTree`] and draws,
//! for each march iteration, a segment from the ray to the collision point
//! that limited the step, plus one segment per step along the ray.

use march_math::Color;

use crate::march::CollisionSample;
use crate::ray::{RayKind, TracedRay};
use crate::trace::{CollisionTree, RayTree};

/// Indicators for a single ray and its own march samples.
pub fn march_indicators(ray: &TracedRay, samples: &[CollisionSample]) -> Vec<TracedRay> {
    let mut indicators = Vec::with_capacity(samples.len() * 2);

    for sample in samples {
        let on_ray = ray.origin + ray.direction * sample.distance;
        let offset = sample.point - on_ray;
        indicators.push(TracedRay::new(
            on_ray,
            offset.normalize_or_zero(),
            offset.length(),
            Color::ZERO,
            RayKind::MarchCollision,
        ));
    }

    for pair in samples.windows(2) {
        indicators.push(TracedRay::new(
            ray.origin + ray.direction * pair[0].distance,
            ray.direction,
            pair[1].distance - pair[0].distance,
            Color::ZERO,
            RayKind::MarchArc,
        ));
    }

    indicators
}

/// Indicators for every ray in a tree, in pre-order.
pub fn tree_indicators(rays: &RayTree, collisions: &CollisionTree) -> Vec<TracedRay> {
    let mut indicators = march_indicators(&rays.data, &collisions.data);
    for (ray, samples) in rays.children.iter().zip(&collisions.children) {
        indicators.extend(tree_indicators(ray, samples));
    }
    indicators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;
    use march_math::Vec3;

    fn samples() -> Vec<CollisionSample> {
        vec![
            CollisionSample {
                distance: 0.0,
                point: Vec3::new(0.0, 1.0, 0.0),
            },
            CollisionSample {
                distance: 1.0,
                point: Vec3::new(1.0, 1.0, 0.0),
            },
            CollisionSample {
                distance: 3.0,
                point: Vec3::new(3.0, 0.5, 0.0),
            },
        ]
    }

    #[test]
    fn test_march_indicators() {
        let ray = TracedRay::new(Vec3::ZERO, Vec3::X, 3.0, Color::ONE, RayKind::Normal);
        let indicators = march_indicators(&ray, &samples());

        assert_eq!(indicators.len(), 5);
        let (collisions, arcs) = indicators.split_at(3);

        assert!(collisions.iter().all(|r| r.kind == RayKind::MarchCollision));
        assert_eq!(collisions[1].origin, Vec3::new(1.0, 0.0, 0.0));
        let end = collisions[2].end_point().unwrap();
        assert!((end - Vec3::new(3.0, 0.5, 0.0)).length() < 1e-6);

        assert!(arcs.iter().all(|r| r.kind == RayKind::MarchArc));
        assert_eq!(arcs[0].length, 1.0);
        assert_eq!(arcs[1].origin, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(arcs[1].length, 2.0);
    }

    #[test]
    fn test_march_indicators_empty() {
        let ray = TracedRay::new(Vec3::ZERO, Vec3::X, 1.0, Color::ONE, RayKind::Light);
        assert!(march_indicators(&ray, &[]).is_empty());
    }

    #[test]
    fn test_tree_indicators_walks_children() {
        let root = TracedRay::new(Vec3::ZERO, Vec3::X, 3.0, Color::ONE, RayKind::Normal);
        let child = TracedRay::new(Vec3::X, Vec3::Y, 1.0, Color::ONE, RayKind::Light);
        let rays = TreeNode::with_children(root, vec![TreeNode::new(child)]);
        let collisions = TreeNode::with_children(samples(), vec![TreeNode::new(samples()[..1].to_vec())]);

        assert_eq!(tree_indicators(&rays, &collisions).len(), 6);
    }
}
