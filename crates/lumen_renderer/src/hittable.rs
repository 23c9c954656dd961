//! Ray-object intersection: hit records, the primitive sum type and the
//! scene aggregate.

use crate::{Material, Sphere};
use lumen_math::{Interval, Point3, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Lives only as long as the evaluation of a single ray.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Point3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Material at the intersection point
    pub material: &'a Material,
}

impl<'a> HitRecord<'a> {
    /// Build a record, orienting the normal against the incoming ray.
    ///
    /// `outward_normal` is assumed to have unit length.
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, material: &'a Material) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            t,
            front_face,
            material,
        }
    }
}

/// Anything a ray can be tested against.
#[derive(Debug, Clone)]
pub enum Hittable {
    Sphere(Sphere),
    List(HittableList),
}

impl Hittable {
    /// Nearest intersection with `t` strictly inside `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self {
            Hittable::Sphere(sphere) => sphere.hit(ray, ray_t),
            Hittable::List(list) => list.hit(ray, ray_t),
        }
    }
}

impl From<Sphere> for Hittable {
    fn from(sphere: Sphere) -> Self {
        Hittable::Sphere(sphere)
    }
}

impl From<HittableList> for Hittable {
    fn from(list: HittableList) -> Self {
        Hittable::List(list)
    }
}

/// An ordered collection of hittables; the root of every scene.
#[derive(Debug, Clone, Default)]
pub struct HittableList {
    objects: Vec<Hittable>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: impl Into<Hittable>) {
        self.objects.push(object.into());
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Hittable] {
        &self.objects
    }

    /// Linear nearest-hit search.
    ///
    /// The upper bound tightens after every accepted hit, so a later object
    /// can only win by being strictly closer.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some(rec) = object.hit(ray, Interval::new(ray_t.min, closest_so_far)) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }
}

impl FromIterator<Hittable> for HittableList {
    fn from_iter<I: IntoIterator<Item = Hittable>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Lambertian, Metal};
    use std::sync::Arc;

    fn sphere(center: Vec3, radius: f32, material: &Arc<Material>) -> Sphere {
        Sphere::new(center, radius, Arc::clone(material))
    }

    #[test]
    fn test_face_normal_orientation() {
        let material = Material::from(Lambertian::new(Color::ONE));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let outside = HitRecord::new(&ray, 1.0, Vec3::Z, &material);
        assert!(outside.front_face);
        assert_eq!(outside.normal, Vec3::Z);

        let inside = HitRecord::new(&ray, 1.0, Vec3::NEG_Z, &material);
        assert!(!inside.front_face);
        assert_eq!(inside.normal, Vec3::Z);
        assert_eq!(inside.p, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_empty_list_misses() {
        let world = HittableList::new();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        assert!(world.is_empty());
        assert!(world.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_list_matches_nearest_individual_hit() {
        let matte = Arc::new(Material::from(Lambertian::new(Color::splat(0.5))));
        let shiny = Arc::new(Material::from(Metal::new(Color::splat(0.9), 0.0)));

        // Non-overlapping spheres, added far-to-near to exercise the tightening bound
        let spheres = [
            sphere(Vec3::new(0.0, 0.0, -10.0), 1.0, &matte),
            sphere(Vec3::new(0.3, 0.0, -6.0), 1.5, &shiny),
            sphere(Vec3::new(-0.2, 0.1, -3.0), 0.75, &matte),
            sphere(Vec3::new(5.0, 5.0, -3.0), 0.5, &shiny),
        ];
        let world: HittableList = spheres.iter().cloned().map(Hittable::from).collect();

        let rays = [
            Ray::new(Vec3::ZERO, Vec3::NEG_Z),
            Ray::new(Vec3::ZERO, Vec3::new(0.05, 0.0, -1.0)),
            Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.02, -1.0)),
            Ray::new(Vec3::ZERO, Vec3::new(5.0, 5.0, -3.0)),
            Ray::new(Vec3::ZERO, Vec3::Y),
        ];
        let intervals = [
            Interval::new(0.001, f32::INFINITY),
            Interval::new(4.0, f32::INFINITY),
            Interval::new(0.001, 5.0),
        ];

        for ray in &rays {
            for ray_t in intervals {
                let expected = spheres
                    .iter()
                    .filter_map(|s| s.hit(ray, ray_t))
                    .min_by(|a, b| a.t.total_cmp(&b.t));
                let actual = world.hit(ray, ray_t);

                match (expected, actual) {
                    (None, None) => {}
                    (Some(e), Some(a)) => {
                        assert_eq!(e.t, a.t);
                        assert_eq!(e.p, a.p);
                        assert_eq!(e.normal, a.normal);
                        assert!(std::ptr::eq(e.material, a.material));
                    }
                    (e, a) => panic!("mismatch for {ray:?} in {ray_t:?}: {e:?} vs {a:?}"),
                }
            }
        }
    }

    #[test]
    fn test_nearest_hit_carries_its_own_material() {
        let near = Arc::new(Material::from(Metal::new(Color::ONE, 0.0)));
        let far = Arc::new(Material::from(Lambertian::new(Color::ONE)));

        let mut world = HittableList::new();
        world.add(sphere(Vec3::new(0.0, 0.0, -2.0), 0.5, &near));
        world.add(sphere(Vec3::new(0.0, 0.0, -5.0), 0.5, &far));

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let rec = world.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        assert!((rec.t - 1.5).abs() < 1e-5);
        assert!(matches!(rec.material, Material::Metal(_)));
    }

    #[test]
    fn test_nested_lists() {
        let material = Arc::new(Material::from(Lambertian::new(Color::ONE)));
        let mut inner = HittableList::new();
        inner.add(sphere(Vec3::new(0.0, 0.0, -3.0), 1.0, &material));

        let mut world = HittableList::new();
        world.add(inner);
        world.add(sphere(Vec3::new(0.0, 0.0, -8.0), 1.0, &material));
        assert_eq!(world.len(), 2);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let rec = world.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-5);

        world.clear();
        assert!(world.is_empty());
    }
}
