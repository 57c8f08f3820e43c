//! Shading and recursive light transport.
//!
//! [`Tracer::trace`] builds the full ray tree and its parallel collision tree
//! for one ray. [`Tracer::trace_image`] follows the same recursion but only
//! accumulates color. Both share the per-hit helpers below so their colors
//! agree exactly.

use arrayvec::ArrayVec;
use march_core::{Light, LightKind, Material, Scene};
use march_math::{clamp_color, reflect, refract, schlick_reflectance, Color, Ray, Vec3};

use crate::error::{RenderError, RenderResult};
use crate::march::{ray_march, CollisionSample, MarchHit, MarchResult, MarchSettings};
use crate::ray::{RayKind, TracedRay};
use crate::renderer::RenderConfig;
use crate::sdf::SdfPrimitive;
use crate::tree::TreeNode;

/// Ray history for one primary ray.
pub type RayTree = TreeNode<TracedRay>;

/// Per-iteration march samples, shaped like the matching [`RayTree`].
pub type CollisionTree = TreeNode<Vec<CollisionSample>>;

/// Squared light distance below which a light is treated as degenerate.
const DEGENERATE_LIGHT_DISTANCE_SQ: f32 = 1e-12;

/// Shading inputs at a hit point.
struct SurfaceHit<'a> {
    point: Vec3,
    /// Faces the viewer
    normal: Vec3,
    /// Unit vector back along the incoming ray
    view: Vec3,
    /// The incoming ray travelled inside the object
    inside: bool,
    material: &'a Material,
}

/// One light's child: the light (or shadow) ray and its march samples.
struct LightSample {
    ray: TracedRay,
    samples: Vec<CollisionSample>,
}

/// A reflect or refract ray and the weight applied to its color.
struct SecondaryRay {
    ray: Ray,
    kind: RayKind,
    weight: f32,
}

/// Traces rays through a prepared scene.
pub struct Tracer<'a> {
    scene: &'a Scene,
    config: &'a RenderConfig,
    primitives: Vec<SdfPrimitive>,
}

impl<'a> Tracer<'a> {
    /// Prepare every scene object for distance queries.
    pub fn new(scene: &'a Scene, config: &'a RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        if scene.objects.is_empty() {
            return Err(RenderError::EmptyScene);
        }

        Ok(Self {
            scene,
            config,
            primitives: scene.objects.iter().map(SdfPrimitive::from_object).collect(),
        })
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    pub fn primitives(&self) -> &[SdfPrimitive] {
        &self.primitives
    }

    /// Trace `ray`, recording every ray and march sample.
    ///
    /// `initial_offset` is subtracted from the hit distance of this ray only.
    pub fn trace(
        &self,
        ray: &Ray,
        depth: u32,
        kind: RayKind,
        initial_offset: f32,
    ) -> (RayTree, CollisionTree) {
        let march = self.march(ray, kind, initial_offset, true);
        let MarchResult {
            hit,
            total_distance,
            samples,
            ..
        } = march;

        // Missed everything - the ray takes the background color
        let Some(hit) = hit else {
            let node = TracedRay::new(
                ray.origin,
                ray.direction,
                f32::INFINITY,
                self.background(),
                RayKind::NoHit,
            );
            return (RayTree::new(node), CollisionTree::new(samples));
        };

        let surface = self.surface(ray, &hit);
        let mut rays = Vec::new();
        let mut collisions = Vec::new();

        // One child per light that reaches this side of the surface
        for light in &self.scene.lights {
            if let Some(sample) = self.light_sample(&surface, light, true) {
                rays.push(RayTree::new(sample.ray));
                collisions.push(CollisionTree::new(sample.samples));
            }
        }

        // Recurse while depth remains; the child's color carries its weight
        if depth > 0 {
            for secondary in self.secondary_rays(&surface) {
                let (mut child, child_collisions) =
                    self.trace(&secondary.ray, depth - 1, secondary.kind, 0.0);
                child.data = child.data.weighted(secondary.weight);
                rays.push(child);
                collisions.push(child_collisions);
            }
        }

        let mut color = ambient_term(surface.material);
        for child in &rays {
            color += child.data.color;
        }

        let node = TracedRay::new(
            ray.origin,
            ray.direction,
            total_distance,
            clamp_color(color),
            kind,
        );
        (
            RayTree::with_children(node, rays),
            CollisionTree::with_children(samples, collisions),
        )
    }

    /// Trace `ray` for its color only.
    pub fn trace_image(&self, ray: &Ray, depth: u32, kind: RayKind, initial_offset: f32) -> Color {
        let march = self.march(ray, kind, initial_offset, false);
        let Some(hit) = march.hit else {
            return self.background();
        };

        let surface = self.surface(ray, &hit);
        let mut color = ambient_term(surface.material);

        for light in &self.scene.lights {
            if let Some(sample) = self.light_sample(&surface, light, false) {
                color += sample.ray.color;
            }
        }

        if depth > 0 {
            for secondary in self.secondary_rays(&surface) {
                let child = self.trace_image(&secondary.ray, depth - 1, secondary.kind, 0.0);
                color += child * secondary.weight;
            }
        }

        clamp_color(color)
    }

    fn background(&self) -> Color {
        clamp_color(self.config.background)
    }

    fn march(&self, ray: &Ray, kind: RayKind, initial_offset: f32, record: bool) -> MarchResult {
        let settings = MarchSettings {
            epsilon: self.config.epsilon_rm,
            max_iterations: self.config.max_iterations,
            max_step_distance: self.config.max_step_distance,
            max_total_distance: self.config.max_total_distance,
            initial_offset,
            escape_surface: kind != RayKind::Normal,
            record_samples: record,
        };
        ray_march(&self.primitives, ray, &settings)
    }

    fn surface(&self, ray: &Ray, hit: &MarchHit) -> SurfaceHit<'a> {
        let view = -ray.direction;
        let inside = hit.normal.dot(view) < 0.0;
        let normal = if inside { -hit.normal } else { hit.normal };

        SurfaceHit {
            point: hit.point,
            normal,
            view,
            inside,
            material: &self.scene.objects[hit.object].material,
        }
    }

    /// Phong contribution of one light, or its shadow ray when occluded.
    /// `None` when the light cannot reach the surface at all.
    fn light_sample(&self, surface: &SurfaceHit<'_>, light: &Light, record: bool) -> Option<LightSample> {
        let to_light = light.position - surface.point;
        let distance_sq = to_light.length_squared();
        if !distance_sq.is_finite() || distance_sq < DEGENERATE_LIGHT_DISTANCE_SQ {
            return None;
        }
        let distance = distance_sq.sqrt();
        let light_dir = to_light / distance;

        // Light on the far side of the surface
        let n_dot_l = surface.normal.dot(light_dir);
        if n_dot_l < 0.0 {
            return None;
        }

        if let LightKind::Spot { angle } = light.kind {
            let cos_cutoff = (0.5 * angle).to_radians().cos();
            if light.direction.dot(-light_dir) < cos_cutoff {
                return None;
            }
        }

        let origin = surface.point + surface.normal * self.config.surface_offset;
        let mut samples = Vec::new();

        // Occluded before reaching the light - black shadow ray
        if self.config.render_shadows && light.casts_shadows {
            let settings = MarchSettings {
                epsilon: self.config.epsilon_rm,
                max_iterations: self.config.max_iterations,
                max_step_distance: distance,
                max_total_distance: distance,
                initial_offset: 0.0,
                escape_surface: true,
                record_samples: record,
            };
            let shadow = ray_march(&self.primitives, &Ray::new(origin, light_dir), &settings);

            if shadow.is_hit() && shadow.total_distance < distance {
                return Some(LightSample {
                    ray: TracedRay::new(
                        origin,
                        light_dir,
                        shadow.total_distance,
                        Color::ZERO,
                        RayKind::Shadow,
                    ),
                    samples: shadow.samples,
                });
            }
            samples = shadow.samples;
        }

        // Phong terms for an unblocked light
        let material = surface.material;
        let reflected = reflect(-light_dir, surface.normal);
        let highlight = reflected.dot(surface.view).max(0.0).powf(material.shininess);

        let mut color = light.ambient * light.color * material.color;
        color += n_dot_l * material.diffuse * light.diffuse * light.color * material.color;
        color += highlight * material.specular * light.specular * light.color;
        color *= light.intensity;
        if light.distance_attenuation {
            color /= 1.0 + distance_sq;
        }

        Some(LightSample {
            ray: TracedRay::new(origin, light_dir, distance, clamp_color(color), RayKind::Light),
            samples,
        })
    }

    /// Reflection and refraction rays spawned at a hit.
    fn secondary_rays(&self, surface: &SurfaceHit<'_>) -> ArrayVec<SecondaryRay, 2> {
        let mut rays = ArrayVec::new();
        let material = surface.material;
        let incident = -surface.view;
        let offset = self.config.surface_offset;

        if material.is_transparent() {
            let index = if material.refractive_index > 0.0 {
                material.refractive_index
            } else {
                1.0
            };
            let eta = if surface.inside { index } else { 1.0 / index };
            let kr = schlick_reflectance(surface.normal.dot(surface.view), eta);

            let reflected = reflect(incident, surface.normal);
            rays.push(SecondaryRay {
                ray: Ray::new(offset_origin(surface, reflected, offset), reflected),
                kind: RayKind::Reflect,
                weight: kr,
            });

            let refracted = refract(incident, surface.normal, eta);
            rays.push(SecondaryRay {
                ray: Ray::new(offset_origin(surface, refracted, offset), refracted),
                kind: RayKind::Refract,
                weight: 1.0 - kr,
            });
        } else if material.specular > 0.0 && self.config.fold_specular_reflection {
            let reflected = reflect(incident, surface.normal);
            rays.push(SecondaryRay {
                ray: Ray::new(offset_origin(surface, reflected, offset), reflected),
                kind: RayKind::Reflect,
                weight: material.specular,
            });
        }

        rays
    }
}

#[inline]
fn ambient_term(material: &Material) -> Color {
    material.ambient * material.color
}

/// Nudge a secondary ray's origin off the surface, onto the side it leaves by.
fn offset_origin(surface: &SurfaceHit<'_>, direction: Vec3, offset: f32) -> Vec3 {
    if direction.dot(surface.normal) >= 0.0 {
        surface.point + surface.normal * offset
    } else {
        surface.point - surface.normal * offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use march_core::SdfObject;

    fn single_sphere(material: Material) -> Scene {
        let mut scene = Scene::new("test");
        scene.add_object(SdfObject::sphere("ball", Vec3::ZERO, 1.0, material));
        scene
    }

    fn close(a: Color, b: Color) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_tracer_rejects_empty_scene() {
        let scene = Scene::new("empty");
        let config = RenderConfig::default();
        assert!(matches!(Tracer::new(&scene, &config), Err(RenderError::EmptyScene)));
    }

    #[test]
    fn test_trace_lit_sphere() {
        let mut scene = Scene::new("test");
        let material = Material::opaque(Color::new(1.0, 0.0, 0.0));
        scene.add_object(SdfObject::sphere("ball", Vec3::new(0.0, 0.0, 5.0), 1.0, material));
        scene.add_light(Light::point(Vec3::ZERO));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let (tree, collisions) = tracer.trace(&Ray::new(Vec3::ZERO, Vec3::Z), 3, RayKind::Normal, 0.0);

        assert_eq!(tree.data.kind, RayKind::Normal);
        assert!((tree.data.length - 4.0).abs() < 1e-3);
        // Ambient 0.2 plus full diffuse and no specular.
        assert!(close(tree.data.color, Color::new(1.0, 0.0, 0.0)));

        assert_eq!(tree.children.len(), 1);
        let light = &tree.children[0].data;
        assert_eq!(light.kind, RayKind::Light);
        assert!(close(light.color, Color::new(1.0, 0.0, 0.0)));
        assert!(tree.same_shape(&collisions));
    }

    #[test]
    fn test_trace_head_on_without_shadows() {
        let mut scene = single_sphere(Material::opaque(Color::splat(0.5)));
        scene.add_light(Light::point(Vec3::new(0.0, 0.0, 10.0)));

        let config = RenderConfig {
            render_shadows: false,
            ..RenderConfig::default()
        };
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let (tree, collisions) = tracer.trace(&ray, 0, RayKind::Normal, 0.0);

        assert!((tree.data.length - 4.0).abs() < config.epsilon_rm);
        // Ambient 0.2 * 0.5 plus diffuse 1 * 0.5.
        assert!(close(tree.data.color, Color::splat(0.6)));
        assert_eq!(tree.children.len(), 1);
        assert!(collisions.children[0].data.is_empty());

        let march = ray_march(tracer.primitives(), &ray, &MarchSettings::default());
        let hit = march.hit.unwrap();
        assert!((hit.normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_trace_miss_uses_background() {
        let scene = single_sphere(Material::default());
        let config = RenderConfig {
            background: Color::new(0.1, 0.2, 0.3),
            ..RenderConfig::default()
        };
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Z);
        let (tree, collisions) = tracer.trace(&ray, 3, RayKind::Normal, 0.0);

        assert_eq!(tree.data.kind, RayKind::NoHit);
        assert_eq!(tree.data.length, f32::INFINITY);
        assert_eq!(tree.data.color, Color::new(0.1, 0.2, 0.3));
        assert!(tree.is_leaf());
        assert!(!collisions.data.is_empty());
    }

    #[test]
    fn test_node_color_is_ambient_plus_children() {
        let mut scene = single_sphere(Material::opaque(Color::new(0.2, 0.4, 0.6)));
        scene.add_light(Light::point(Vec3::new(2.0, 3.0, 4.0)).with_color(Color::new(0.3, 0.3, 0.3)));
        scene.add_light(Light::point(Vec3::new(-2.0, 1.0, 4.0)).with_color(Color::new(0.2, 0.1, 0.0)));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let (tree, _) = tracer.trace(&Ray::new(Vec3::new(0.0, 0.0, 4.0), -Vec3::Z), 3, RayKind::Normal, 0.0);

        assert_eq!(tree.children.len(), 2);
        let mut expected = 0.2 * Color::new(0.2, 0.4, 0.6);
        for child in &tree.children {
            expected += child.data.color;
        }
        assert!(close(tree.data.color, clamp_color(expected)));
    }

    #[test]
    fn test_light_behind_surface_is_skipped() {
        let mut scene = single_sphere(Material::default());
        scene.add_light(Light::point(Vec3::new(0.0, 0.0, -5.0)));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let (tree, _) = tracer.trace(&Ray::new(Vec3::new(0.0, 0.0, 4.0), -Vec3::Z), 3, RayKind::Normal, 0.0);
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_light_at_hit_point_is_skipped() {
        let mut scene = single_sphere(Material::default());
        scene.add_light(Light::point(Vec3::new(0.0, 0.0, 1.0)));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let (tree, _) = tracer.trace(&ray, config.max_depth, RayKind::Normal, 0.0);

        assert_eq!(tree.data.kind, RayKind::Normal);
        assert!(tree.is_leaf());
        assert!(tree.data.color.is_finite());
        assert!(close(tree.data.color, 0.2 * Color::splat(0.5)));
        assert_eq!(
            tracer.trace_image(&ray, config.max_depth, RayKind::Normal, 0.0),
            tree.data.color
        );
    }

    #[test]
    fn test_shadowed_light() {
        let mut scene = single_sphere(Material::default());
        scene.add_object(SdfObject::cube(
            "blocker",
            Vec3::new(2.5, 0.0, 0.0),
            Vec3::new(0.2, 2.0, 2.0),
            Material::default(),
        ));
        scene.add_light(Light::point(Vec3::new(5.0, 0.0, 0.0)));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(3.0, 0.0, 3.0), Vec3::new(-1.0, 0.0, -1.0));
        let (tree, collisions) = tracer.trace(&ray, 0, RayKind::Normal, 0.0);

        assert_eq!(tree.data.kind, RayKind::Normal);
        assert_eq!(tree.children.len(), 1);
        let shadow = &tree.children[0].data;
        assert_eq!(shadow.kind, RayKind::Shadow);
        assert_eq!(shadow.color, Color::ZERO);
        assert!(shadow.length < 2.5);
        assert!(!collisions.children[0].data.is_empty());

        // Only the ambient term remains.
        assert!(close(tree.data.color, 0.2 * Color::splat(0.5)));
    }

    #[test]
    fn test_shadows_disabled() {
        let mut scene = single_sphere(Material::default());
        scene.add_object(SdfObject::cube(
            "blocker",
            Vec3::new(2.5, 0.0, 0.0),
            Vec3::new(0.2, 2.0, 2.0),
            Material::default(),
        ));
        scene.add_light(Light::point(Vec3::new(5.0, 0.0, 0.0)).with_shadows(false));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(3.0, 0.0, 3.0), Vec3::new(-1.0, 0.0, -1.0));
        let (tree, collisions) = tracer.trace(&ray, 0, RayKind::Normal, 0.0);

        assert_eq!(tree.children[0].data.kind, RayKind::Light);
        assert!(collisions.children[0].data.is_empty());
    }

    #[test]
    fn test_spot_light_cone() {
        let mut scene = single_sphere(Material::default());
        // Pointing away from the sphere.
        scene.add_light(Light::spot(Vec3::new(0.0, 0.0, 4.0), Vec3::Z, 30.0));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 4.0), -Vec3::Z);
        let (tree, _) = tracer.trace(&ray, 0, RayKind::Normal, 0.0);
        assert!(tree.is_leaf());

        scene.lights[0].direction = -Vec3::Z;
        let tracer = Tracer::new(&scene, &config).unwrap();
        let (tree, _) = tracer.trace(&ray, 0, RayKind::Normal, 0.0);
        assert_eq!(tree.children.len(), 1);
    }

    #[test]
    fn test_transparent_sphere_splits() {
        let scene = single_sphere(Material::transparent(Color::ONE));
        let config = RenderConfig {
            background: Color::ONE,
            max_depth: 2,
            ..RenderConfig::default()
        };
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let (tree, collisions) = tracer.trace(&ray, config.max_depth, RayKind::Normal, 0.0);

        assert_eq!(tree.children.len(), 2);
        assert!(tree.same_shape(&collisions));

        // Head-on Schlick reflectance for glass.
        let kr = 0.04;
        let kt = 1.0 - kr;
        let reflected = &tree.children[0].data;
        assert_eq!(reflected.kind, RayKind::NoHit);
        assert!((reflected.color.x - kr).abs() < 1e-3);

        // Refracted through both surfaces, then out to the background.
        let refracted = &tree.children[1];
        assert_eq!(refracted.data.kind, RayKind::Refract);
        assert_eq!(refracted.children.len(), 2);
        assert!((refracted.data.color.x - kt * kt).abs() < 1e-3);

        assert!((tree.data.color.x - (kr + kt * kt)).abs() < 1e-3);
    }

    #[test]
    fn test_every_node_is_weighted_ambient_plus_children() {
        let glass = Material::transparent(Color::new(0.9, 0.8, 1.0)).with_phong(0.1, 0.5, 0.3, 16.0);
        let mut scene = single_sphere(glass);
        scene.add_light(Light::point(Vec3::new(1.0, 2.0, 4.0)));

        let config = RenderConfig {
            background: Color::ONE,
            max_depth: 3,
            ..RenderConfig::default()
        };
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.2, 0.1, 5.0), -Vec3::Z);
        let (tree, _) = tracer.trace(&ray, config.max_depth, RayKind::Normal, 0.0);
        assert_eq!(tree.data.weight, 1.0);

        let ambient = ambient_term(&scene.objects[0].material);
        let mut stack = vec![&tree];
        let mut checked = 0;
        while let Some(node) = stack.pop() {
            stack.extend(node.children.iter());
            if node.is_leaf() {
                continue;
            }
            let mut sum = ambient;
            for child in &node.children {
                sum += child.data.color;
            }
            let expected = node.data.weight * clamp_color(sum);
            assert!(
                close(node.data.color, expected),
                "{}: {} vs {}",
                node.data.kind.name(),
                node.data.color,
                expected
            );
            checked += 1;
        }
        // Root, the refract child and its internal reflection at least.
        assert!(checked >= 3);
        assert!(tree.iter().any(|ray| ray.kind == RayKind::Refract && ray.weight < 1.0));
    }

    #[test]
    fn test_mirror_reflects_when_folded() {
        let mut scene = single_sphere(Material::mirror(Color::ONE));
        scene.add_object(SdfObject::sphere(
            "lit",
            Vec3::new(0.0, 0.0, 4.0),
            1.0,
            Material::opaque(Color::new(0.0, 1.0, 0.0)).with_phong(1.0, 0.0, 0.0, 1.0),
        ));

        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), -Vec3::Z);
        let (tree, _) = tracer.trace(&ray, 1, RayKind::Normal, 0.0);

        assert_eq!(tree.children.len(), 1);
        let reflect = &tree.children[0].data;
        assert_eq!(reflect.kind, RayKind::Reflect);
        assert!(close(reflect.color, Color::new(0.0, 1.0, 0.0)));
        assert!(close(tree.data.color, Color::new(0.0, 1.0, 0.0)));

        let unfolded = RenderConfig {
            fold_specular_reflection: false,
            ..RenderConfig::default()
        };
        let tracer = Tracer::new(&scene, &unfolded).unwrap();
        let (tree, _) = tracer.trace(&ray, 1, RayKind::Normal, 0.0);
        assert!(tree.is_leaf());
        assert_eq!(tracer.trace_image(&ray, 1, RayKind::Normal, 0.0), Color::ZERO);
    }

    #[test]
    fn test_trace_image_matches_trace() {
        let mut scene = Scene::new("mixed");
        scene.add_object(SdfObject::sphere("glass", Vec3::new(-0.8, 0.0, 5.0), 1.0, Material::transparent(Color::ONE)));
        scene.add_object(SdfObject::sphere("mirror", Vec3::new(1.2, 0.0, 6.0), 1.0, Material::mirror(Color::splat(0.9))));
        scene.add_object(SdfObject::cube(
            "floor",
            Vec3::new(0.0, -1.5, 5.0),
            Vec3::new(10.0, 0.2, 10.0),
            Material::opaque(Color::new(0.8, 0.7, 0.6)).with_phong(0.2, 0.8, 0.3, 16.0),
        ));
        scene.add_light(Light::point(Vec3::new(2.0, 4.0, 1.0)));
        scene.add_light(Light::point(Vec3::new(-3.0, 2.0, 2.0)).with_attenuation(true).with_color(Color::new(1.0, 0.8, 0.6)));

        let config = RenderConfig {
            background: Color::new(0.1, 0.1, 0.2),
            ..RenderConfig::default()
        };
        let tracer = Tracer::new(&scene, &config).unwrap();

        for i in 0..9 {
            let x = -0.4 + 0.1 * i as f32;
            let ray = Ray::new(Vec3::ZERO, Vec3::new(x, -0.1, 1.0));
            let (tree, collisions) = tracer.trace(&ray, config.max_depth, RayKind::Normal, 0.0);
            let flat = tracer.trace_image(&ray, config.max_depth, RayKind::Normal, 0.0);

            assert!(close(tree.data.color, flat), "ray {i}: {} vs {}", tree.data.color, flat);
            assert!(tree.same_shape(&collisions));
            for ray in tree.iter() {
                assert!(ray.color.min_element() >= 0.0 && ray.color.max_element() <= 1.0);
            }
        }
    }
}
