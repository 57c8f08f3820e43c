//! March Core - Scene model for the sphere-tracing renderer.
//!
//! This crate provides:
//!
//! - **Scene model types**: `Scene`, `Camera`, `Light`, `SdfObject`,
//!   `Material`, `Shape`, `Transform`
//! - **Scene files**: JSON scene loading
//!
//! A `Scene` is a plain value snapshot. The renderer only reads it.
//!
//! # Example
//!
//! ```ignore
//! use march_core::load_scene;
//!
//! let scene = load_scene("scene.json")?;
//! println!("Loaded {} objects, {} lights",
//!     scene.object_count(),
//!     scene.light_count());
//! ```

pub mod loader;
pub mod scene;

// Re-export commonly used types
pub use loader::{load_scene, load_scene_from_str, LoadError, LoadResult};
pub use scene::{
    Camera, Light, LightKind, Material, Scene, SdfObject, Shape, SurfaceKind, Transform,
};
