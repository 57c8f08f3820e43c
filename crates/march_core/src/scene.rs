//! Scene model types.
//!
//! This module defines the snapshot the renderer consumes: a camera, an
//! ordered list of lights and an ordered list of SDF objects. Nothing here
//! knows how results are displayed.

use march_math::{Color, EulerRot, Mat3, Mat4, Quat, Vec3};
use serde::Deserialize;

/// How a surface treats light passing through it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    #[default]
    Opaque,
    Transparent,
    Mirror,
}

/// A Phong-style material record.
///
/// Read once per render; the renderer never mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Surface color (RGB, 0-1)
    pub color: Color,

    /// Ambient coefficient, applied once per hit
    pub ambient: f32,

    /// Diffuse coefficient
    pub diffuse: f32,

    /// Specular coefficient (also weights opaque reflections)
    pub specular: f32,

    /// Phong exponent
    pub shininess: f32,

    /// Index of refraction, used when the surface is transparent
    pub refractive_index: f32,

    /// Opaque, transparent or mirror
    pub kind: SurfaceKind,
}

impl Default for Material {
    fn default() -> Self {
        Self::opaque(Color::new(0.5, 0.5, 0.5))
    }
}

impl Material {
    /// An opaque diffuse surface.
    pub fn opaque(color: Color) -> Self {
        Self {
            color,
            ambient: 0.2,
            diffuse: 1.0,
            specular: 0.0,
            shininess: 1.0,
            refractive_index: 1.0,
            kind: SurfaceKind::Opaque,
        }
    }

    /// A transparent surface that reflects and refracts.
    pub fn transparent(color: Color) -> Self {
        Self {
            color,
            ambient: 0.0,
            diffuse: 0.0,
            specular: 0.0,
            shininess: 128.0,
            refractive_index: 1.5,
            kind: SurfaceKind::Transparent,
        }
    }

    /// A perfect mirror.
    pub fn mirror(color: Color) -> Self {
        Self {
            color,
            ambient: 0.0,
            diffuse: 0.0,
            specular: 1.0,
            shininess: 128.0,
            refractive_index: 1.0,
            kind: SurfaceKind::Mirror,
        }
    }

    /// Preset for the given surface kind.
    pub fn preset(kind: SurfaceKind, color: Color) -> Self {
        match kind {
            SurfaceKind::Opaque => Self::opaque(color),
            SurfaceKind::Transparent => Self::transparent(color),
            SurfaceKind::Mirror => Self::mirror(color),
        }
    }

    /// Set the Phong coefficients.
    pub fn with_phong(mut self, ambient: f32, diffuse: f32, specular: f32, shininess: f32) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Set the index of refraction.
    pub fn with_refractive_index(mut self, refractive_index: f32) -> Self {
        self.refractive_index = refractive_index;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.kind == SurfaceKind::Transparent
    }
}

/// The shape of an SDF object in local space.
///
/// Local shapes follow unit conventions: a sphere of diameter 1, a cube of
/// side 1, and a capsule and cylinder of height 2 and diameter 1.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere,
    Box,
    Capsule,
    Cylinder,
    /// Any other convex shape, given by its local-space vertices.
    ConvexMesh { vertices: Vec<Vec3> },
}

impl Shape {
    /// Human readable shape name.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Box => "box",
            Shape::Capsule => "capsule",
            Shape::Cylinder => "cylinder",
            Shape::ConvexMesh { .. } => "convex mesh",
        }
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the rotation from Euler angles in degrees.
    ///
    /// Angles are applied around Z, then X, then Y.
    pub fn with_euler_degrees(self, euler: Vec3) -> Self {
        self.with_rotation(euler_degrees_to_quat(euler))
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Whether the rotation differs from identity.
    pub fn is_rotated(&self) -> bool {
        self.rotation.angle_between(Quat::IDENTITY) > 1e-4
    }

    /// Whether all three scale components are equal.
    pub fn has_uniform_scale(&self) -> bool {
        self.scale.x == self.scale.y && self.scale.y == self.scale.z
    }
}

/// Convert Euler angles in degrees (applied Z, X, Y) to a quaternion.
pub fn euler_degrees_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

/// An object the renderer can measure distances to.
#[derive(Clone, Debug, PartialEq)]
pub struct SdfObject {
    /// Object name (used in diagnostics)
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub material: Material,
}

impl SdfObject {
    pub fn new(name: impl Into<String>, shape: Shape, transform: Transform, material: Material) -> Self {
        Self {
            name: name.into(),
            shape,
            transform,
            material,
        }
    }

    /// A sphere with the given center and radius.
    pub fn sphere(name: impl Into<String>, center: Vec3, radius: f32, material: Material) -> Self {
        let transform = Transform::from_translation(center).with_scale(Vec3::splat(radius * 2.0));
        Self::new(name, Shape::Sphere, transform, material)
    }

    /// An axis-aligned box with the given center and full size.
    pub fn cube(name: impl Into<String>, center: Vec3, size: Vec3, material: Material) -> Self {
        let transform = Transform::from_translation(center).with_scale(size);
        Self::new(name, Shape::Box, transform, material)
    }
}

/// Light source types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Point,
    /// A point light restricted to a cone. The angle is the full cone
    /// opening in degrees.
    Spot { angle: f32 },
    /// Shaded like a point light at its position.
    Area,
}

/// A light source.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,

    /// World-space position
    pub position: Vec3,

    /// Direction the light faces (spot lights only)
    pub direction: Vec3,

    /// Light color (RGB, 0-1)
    pub color: Color,

    /// Per-light ambient weight
    pub ambient: f32,

    /// Diffuse weight
    pub diffuse: f32,

    /// Specular weight
    pub specular: f32,

    /// Scales the whole per-light contribution
    pub intensity: f32,

    /// Divide the contribution by `1 + d²`
    pub distance_attenuation: bool,

    /// Whether this light is tested for occlusion
    pub casts_shadows: bool,
}

impl Light {
    /// A white point light.
    pub fn point(position: Vec3) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            direction: -Vec3::Y,
            color: Color::ONE,
            ambient: 0.0,
            diffuse: 1.0,
            specular: 1.0,
            intensity: 1.0,
            distance_attenuation: false,
            casts_shadows: true,
        }
    }

    /// A white spot light pointing along `direction`.
    pub fn spot(position: Vec3, direction: Vec3, angle: f32) -> Self {
        Self {
            kind: LightKind::Spot { angle },
            direction: direction.normalize_or_zero(),
            ..Self::point(position)
        }
    }

    /// Set the light color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the ambient, diffuse and specular weights.
    pub fn with_weights(mut self, ambient: f32, diffuse: f32, specular: f32) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self
    }

    /// Enable or disable distance attenuation.
    pub fn with_attenuation(mut self, enabled: bool) -> Self {
        self.distance_attenuation = enabled;
        self
    }

    /// Enable or disable shadow casting.
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.casts_shadows = enabled;
        self
    }
}

/// Camera looking along its local +Z axis through a virtual screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,

    /// Vertical field of view in degrees
    pub field_of_view: f32,

    /// Distance from the camera to the screen plane
    pub screen_distance: f32,

    /// Screen resolution in pixels
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            field_of_view: 60.0,
            screen_distance: 1.0,
            screen_width: 16,
            screen_height: 9,
        }
    }

    /// Set screen resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set camera rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, field_of_view: f32, screen_distance: f32) -> Self {
        self.field_of_view = field_of_view;
        self.screen_distance = screen_distance;
        self
    }

    /// Rotate the camera so its local +Z axis points at `target`, keeping
    /// world +Y as up where possible.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        let forward = (target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return self;
        }

        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let right = up.cross(forward).normalize();
        let true_up = forward.cross(right);

        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, true_up, forward));
        self
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.screen_width as f32 / self.screen_height as f32
    }

    /// World-space viewing direction.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Total number of screen pixels.
    pub fn pixel_count(&self) -> usize {
        self.screen_width as usize * self.screen_height as usize
    }
}

/// A renderable scene snapshot.
///
/// `revision` is maintained by whoever edits the scene; render results carry
/// the revision they were produced from so stale results can be dropped.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name
    pub name: String,

    pub camera: Camera,

    /// Lights, in shading order
    pub lights: Vec<Light>,

    /// SDF objects, in evaluation order
    pub objects: Vec<SdfObject>,

    /// Edit counter
    pub revision: u64,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the camera.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Add a light.
    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.touch();
        self.lights.len() - 1
    }

    /// Add an object.
    pub fn add_object(&mut self, object: SdfObject) -> usize {
        self.objects.push(object);
        self.touch();
        self.objects.len() - 1
    }

    /// Mark the scene as edited.
    pub fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}
