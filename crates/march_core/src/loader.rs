//! JSON scene loading.
//!
//! Scene files describe a camera, lights and objects. Rotations are Euler
//! angles in degrees, scales follow the unit-shape conventions of
//! [`Shape`](crate::scene::Shape), and materials start from a preset with
//! optional per-field overrides.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "camera": { "position": [0, 0, -5], "look_at": [0, 0, 0], "width": 32, "height": 24 },
//!   "lights": [ { "position": [2, 4, -3] } ],
//!   "objects": [
//!     { "name": "ball", "shape": "sphere", "position": [0, 0, 0],
//!       "material": { "preset": "opaque", "color": [1, 0, 0] } }
//!   ]
//! }
//! ```

use std::path::Path;

use march_math::{Color, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::scene::{
    euler_degrees_to_quat, Camera, Light, LightKind, Material, Scene, SdfObject, Shape,
    SurfaceKind, Transform,
};

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Deserialize, Debug)]
#[serde(default)]
struct SceneFile {
    name: String,
    camera: CameraDesc,
    lights: Vec<LightDesc>,
    objects: Vec<ObjectDesc>,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            camera: CameraDesc::default(),
            lights: Vec::new(),
            objects: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct CameraDesc {
    position: Vec3,
    rotation: Vec3,
    look_at: Option<Vec3>,
    field_of_view: f32,
    screen_distance: f32,
    width: u32,
    height: u32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        let camera = Camera::new();
        Self {
            position: camera.position,
            rotation: Vec3::ZERO,
            look_at: None,
            field_of_view: camera.field_of_view,
            screen_distance: camera.screen_distance,
            width: camera.screen_width,
            height: camera.screen_height,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
enum LightKindDesc {
    #[default]
    Point,
    Spot,
    Area,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct LightDesc {
    kind: LightKindDesc,
    position: Vec3,
    direction: Vec3,
    spot_angle: f32,
    color: Color,
    ambient: f32,
    diffuse: f32,
    specular: f32,
    intensity: f32,
    distance_attenuation: bool,
    casts_shadows: bool,
}

impl Default for LightDesc {
    fn default() -> Self {
        let light = Light::point(Vec3::ZERO);
        Self {
            kind: LightKindDesc::Point,
            position: light.position,
            direction: light.direction,
            spot_angle: 30.0,
            color: light.color,
            ambient: light.ambient,
            diffuse: light.diffuse,
            specular: light.specular,
            intensity: light.intensity,
            distance_attenuation: light.distance_attenuation,
            casts_shadows: light.casts_shadows,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
enum ShapeDesc {
    #[default]
    Sphere,
    Box,
    Capsule,
    Cylinder,
    ConvexMesh {
        vertices: Vec<Vec3>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct MaterialDesc {
    preset: SurfaceKind,
    color: Color,
    ambient: Option<f32>,
    diffuse: Option<f32>,
    specular: Option<f32>,
    shininess: Option<f32>,
    refractive_index: Option<f32>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            preset: SurfaceKind::Opaque,
            color: Color::new(0.5, 0.5, 0.5),
            ambient: None,
            diffuse: None,
            specular: None,
            shininess: None,
            refractive_index: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct ObjectDesc {
    name: String,
    shape: ShapeDesc,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    material: MaterialDesc,
}

impl Default for ObjectDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            shape: ShapeDesc::Sphere,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            material: MaterialDesc::default(),
        }
    }
}

/// Load a JSON scene file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    load_scene_from_str(&contents)
}

/// Load a scene from a JSON string.
pub fn load_scene_from_str(json: &str) -> LoadResult<Scene> {
    let file: SceneFile = serde_json::from_str(json)?;
    let scene = convert_scene(file)?;

    log::info!(
        "Loaded scene '{}': {} objects, {} lights, {}x{} screen",
        scene.name,
        scene.object_count(),
        scene.light_count(),
        scene.camera.screen_width,
        scene.camera.screen_height
    );

    Ok(scene)
}

fn convert_scene(file: SceneFile) -> LoadResult<Scene> {
    let camera = convert_camera(&file.camera)?;
    let mut scene = Scene::new(file.name).with_camera(camera);

    for light in &file.lights {
        scene.lights.push(convert_light(light));
    }

    for (i, object) in file.objects.into_iter().enumerate() {
        scene.objects.push(convert_object(i, object)?);
    }

    Ok(scene)
}

fn convert_camera(desc: &CameraDesc) -> LoadResult<Camera> {
    if desc.width == 0 || desc.height == 0 {
        return Err(LoadError::InvalidScene(format!(
            "camera resolution {}x{} has no pixels",
            desc.width, desc.height
        )));
    }

    let camera = Camera::new()
        .with_position(desc.position)
        .with_resolution(desc.width, desc.height)
        .with_lens(desc.field_of_view, desc.screen_distance);

    Ok(match desc.look_at {
        Some(target) => camera.looking_at(target),
        None => camera.with_rotation(euler_degrees_to_quat(desc.rotation)),
    })
}

fn convert_light(desc: &LightDesc) -> Light {
    let kind = match desc.kind {
        LightKindDesc::Point => LightKind::Point,
        LightKindDesc::Spot => LightKind::Spot {
            angle: desc.spot_angle,
        },
        LightKindDesc::Area => LightKind::Area,
    };

    Light {
        kind,
        position: desc.position,
        direction: desc.direction.normalize_or_zero(),
        color: desc.color,
        ambient: desc.ambient,
        diffuse: desc.diffuse,
        specular: desc.specular,
        intensity: desc.intensity,
        distance_attenuation: desc.distance_attenuation,
        casts_shadows: desc.casts_shadows,
    }
}

fn convert_object(index: usize, desc: ObjectDesc) -> LoadResult<SdfObject> {
    let name = if desc.name.is_empty() {
        format!("object_{}", index)
    } else {
        desc.name
    };

    if desc.scale.cmple(Vec3::ZERO).any() {
        return Err(LoadError::InvalidScene(format!(
            "object '{}' has non-positive scale {:?}",
            name, desc.scale
        )));
    }

    let shape = match desc.shape {
        ShapeDesc::Sphere => Shape::Sphere,
        ShapeDesc::Box => Shape::Box,
        ShapeDesc::Capsule => Shape::Capsule,
        ShapeDesc::Cylinder => Shape::Cylinder,
        ShapeDesc::ConvexMesh { vertices } => {
            if vertices.is_empty() {
                return Err(LoadError::InvalidScene(format!(
                    "convex mesh '{}' has no vertices",
                    name
                )));
            }
            Shape::ConvexMesh { vertices }
        }
    };

    let transform = Transform::from_translation(desc.position)
        .with_scale(desc.scale)
        .with_euler_degrees(desc.rotation);

    Ok(SdfObject::new(name, shape, transform, convert_material(&desc.material)))
}

fn convert_material(desc: &MaterialDesc) -> Material {
    let mut material = Material::preset(desc.preset, desc.color);
    if let Some(ambient) = desc.ambient {
        material.ambient = ambient;
    }
    if let Some(diffuse) = desc.diffuse {
        material.diffuse = diffuse;
    }
    if let Some(specular) = desc.specular {
        material.specular = specular;
    }
    if let Some(shininess) = desc.shininess {
        material.shininess = shininess;
    }
    if let Some(refractive_index) = desc.refractive_index {
        material.refractive_index = refractive_index;
    }
    material
}
