//! March renderer - CPU sphere tracing over SDF scenes.
//!
//! For every pixel a ray is marched through the scene's distance field,
//! shaded with Phong lighting and shadow rays, and recursively reflected and
//! refracted. The interactive pass keeps the full ray history of each pixel
//! as a tree, with a parallel tree of per-step march samples for
//! visualization. The offline pass computes colors only.

mod bucket;
mod error;
mod hull;
mod indicators;
mod march;
mod ray;
mod renderer;
mod sdf;
mod trace;
mod tree;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use error::{RenderError, RenderResult};
pub use hull::{ConvexHull, HullSample};
pub use indicators::{march_indicators, tree_indicators};
pub use march::{ray_march, CollisionSample, MarchHit, MarchResult, MarchSettings};
pub use ray::{RayKind, TracedRay};
pub use renderer::{
    image_resolution, render, render_image, render_image_pixel, trace_pixel, validate_camera,
    ImageBuffer, RenderConfig, RenderOutput, ScreenGeometry,
};
pub use sdf::{approximations, Approximation, DistanceSample, Fallback, SdfPrimitive};
pub use trace::{CollisionTree, RayTree, Tracer};
pub use tree::{Iter, TreeNode};

/// Re-export common math types from march_math
pub use march_math::{Color, Ray, Rgba, Vec3};
