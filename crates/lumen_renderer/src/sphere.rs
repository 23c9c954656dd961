//! Sphere primitive for ray tracing.

use crate::{HitRecord, Material};
use lumen_math::{Interval, Point3, Ray};
use std::sync::Arc;

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Point3,
    radius: f32,
    material: Arc<Material>,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Point3, radius: f32, material: Arc<Material>) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            material,
        }
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Nearest root of the ray/sphere quadratic strictly inside `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Some(HitRecord::new(ray, root, outward_normal, &self.material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Lambertian};
    use lumen_math::Vec3;

    fn unit_sphere_at(center: Vec3) -> Sphere {
        Sphere::new(
            center,
            0.5,
            Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)).into()),
        )
    }

    fn forward() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let rec = sphere.hit(&ray, forward()).unwrap();
        assert!((rec.t - 0.5).abs() < 0.001); // Should hit at t=0.5
        assert!(rec.front_face);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, -1.0));

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere.hit(&ray, forward()).is_none());
    }

    #[test]
    fn test_hit_from_inside_uses_far_root() {
        let sphere = unit_sphere_at(Vec3::ZERO);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        let rec = sphere.hit(&ray, forward()).unwrap();
        assert!((rec.t - 0.5).abs() < 1e-5);
        assert!(!rec.front_face);
        // Normal flipped to face the ray
        assert!((rec.normal - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_interval_bounds_are_exclusive() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        // Both roots (0.5 and 1.5) lie outside (0.5, 1.0)
        assert!(sphere.hit(&ray, Interval::new(0.5, 1.0)).is_none());
        // Near root excluded, far root accepted
        let rec = sphere.hit(&ray, Interval::new(0.6, 2.0)).unwrap();
        assert!((rec.t - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_reversed_ray_reports_consistent_roots() {
        let sphere = unit_sphere_at(Vec3::new(0.2, -0.1, -3.0));
        let entry_side = Vec3::new(0.0, 0.0, 0.0);
        let exit_side = Vec3::new(0.4, -0.2, -6.0);

        let forward_ray = Ray::new(entry_side, exit_side - entry_side);
        let reverse_ray = Ray::new(exit_side, entry_side - exit_side);

        let everything = Interval::new(0.001, f32::INFINITY);
        let near_fwd = sphere.hit(&forward_ray, everything).unwrap();
        let near_rev = sphere.hit(&reverse_ray, everything).unwrap();

        // The forward ray enters where the reverse ray exits, and vice versa
        let far_fwd = sphere
            .hit(&forward_ray, Interval::new(near_fwd.t + 1e-4, f32::INFINITY))
            .unwrap();
        let far_rev = sphere
            .hit(&reverse_ray, Interval::new(near_rev.t + 1e-4, f32::INFINITY))
            .unwrap();

        assert!((near_fwd.p - far_rev.p).length() < 1e-4);
        assert!((far_fwd.p - near_rev.p).length() < 1e-4);
        assert!((near_fwd.t + far_rev.t - 1.0).abs() < 1e-4);
        assert!((far_fwd.t + near_rev.t - 1.0).abs() < 1e-4);
        assert!(near_fwd.front_face && near_rev.front_face);
        assert!(!far_fwd.front_face && !far_rev.front_face);
    }

    #[test]
    fn test_hit_attaches_sphere_material() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, -1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let rec = sphere.hit(&ray, forward()).unwrap();
        assert!(std::ptr::eq(rec.material, sphere.material().as_ref()));
    }
}
