//! Surface scattering models.
//!
//! Materials are a closed set of plain-data variants dispatched by `match`,
//! so a scene can be shared read-only across worker threads.

use crate::hittable::HitRecord;
use crate::noise::{Perlin, DEFAULT_PIXEL_SIZE};
use crate::random::{gen_f32, random_in_unit_sphere, random_unit_vector};
use lumen_math::{Color, Point3, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// Colour multiplier applied to light arriving along `scattered`.
    pub attenuation: Color,
    /// The continuation ray.
    pub scattered: Ray,
}

/// Light-interaction model attached to a primitive.
#[derive(Debug, Clone)]
pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
    Marble(Marble),
}

impl Material {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed, including when the geometry is
    /// too degenerate to produce a direction.
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        match self {
            Material::Lambertian(m) => m.scatter(rec, rng),
            Material::Metal(m) => m.scatter(ray_in, rec, rng),
            Material::Dielectric(m) => m.scatter(ray_in, rec, rng),
            Material::Marble(m) => m.scatter(rec, rng),
        }
    }
}

impl From<Lambertian> for Material {
    fn from(m: Lambertian) -> Self {
        Material::Lambertian(m)
    }
}

impl From<Metal> for Material {
    fn from(m: Metal) -> Self {
        Material::Metal(m)
    }
}

impl From<Dielectric> for Material {
    fn from(m: Dielectric) -> Self {
        Material::Dielectric(m)
    }
}

impl From<Marble> for Material {
    fn from(m: Marble) -> Self {
        Material::Marble(m)
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }

    fn scatter(&self, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let direction = diffuse_direction(rec.normal, rng)?;
        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn fuzz(&self) -> f32 {
        self.fuzz
    }

    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let unit_direction = ray_in.direction().try_normalize()?;
        let reflected = reflect(unit_direction, rec.normal);
        let direction = reflected + self.fuzz * random_in_unit_sphere(rng);

        // Fuzz pushed the ray below the surface
        if direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    refraction_index: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `refraction_index`: 1.0 = air, 1.5 = glass, 2.4 = diamond
    pub fn new(refraction_index: f32) -> Self {
        Self { refraction_index }
    }

    pub fn refraction_index(&self) -> f32 {
        self.refraction_index
    }

    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let ratio = if rec.front_face {
            1.0 / self.refraction_index
        } else {
            self.refraction_index
        };

        let unit_direction = ray_in.direction().try_normalize()?;
        let cos_theta = (-unit_direction).dot(rec.normal).clamp(-1.0, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        let cannot_refract = ratio * sin_theta > 1.0;
        let direction = if cannot_refract || reflectance(cos_theta, ratio) > gen_f32(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ratio)
        };

        Some(ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Diffuse surface tinted by a turbulent marble pattern.
#[derive(Debug, Clone)]
pub struct Marble {
    stripe: Color,
    base: Color,
    noise_seed: u64,
    noise: Perlin,
}

impl Marble {
    pub fn new(stripe: Color, base: Color, noise_seed: u64) -> Self {
        Self {
            stripe,
            base,
            noise_seed,
            noise: Perlin::new(noise_seed),
        }
    }

    pub fn noise_seed(&self) -> u64 {
        self.noise_seed
    }

    /// Pattern colour at a world-space point.
    pub fn sample(&self, p: Point3) -> Color {
        let turbulence = self.noise.turbulence(p, DEFAULT_PIXEL_SIZE);
        let mut x = ((p.y + 3.0 * turbulence) * PI).sin();
        x = (x + 1.0).max(0.0).sqrt() * 0.7071;
        let g = self.stripe.y + self.base.y * x;
        x = x.sqrt();
        Color::new(
            self.stripe.x + self.base.x * x,
            g,
            self.stripe.z + self.base.z * x,
        )
    }

    fn scatter(&self, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let direction = diffuse_direction(rec.normal, rng)?;
        Some(ScatterResult {
            attenuation: self.sample(rec.p),
            scattered: Ray::new(rec.p, direction),
        })
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Cosine-weighted direction around `normal`, or `None` for a zero normal.
fn diffuse_direction(normal: Vec3, rng: &mut dyn RngCore) -> Option<Vec3> {
    if near_zero(normal) {
        return None;
    }

    let direction = normal + random_unit_vector(rng);
    if near_zero(direction) {
        Some(normal)
    } else {
        Some(direction)
    }
}

#[inline]
fn near_zero(v: Vec3) -> bool {
    const S: f32 = 1e-8;
    v.x.abs() < S && v.y.abs() < S && v.z.abs() < S
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
pub fn reflectance(cosine: f32, refraction_ratio: f32) -> f32 {
    let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(material: &Material, normal: Vec3, front_face: bool) -> HitRecord<'_> {
        HitRecord {
            p: Vec3::ZERO,
            normal,
            t: 1.0,
            front_face,
            material,
        }
    }

    #[test]
    fn test_lambertian_never_amplifies() {
        let material: Material = Lambertian::new(Color::new(0.9, 0.1, 1.0)).into();
        let rec = record(&material, Vec3::Y, true);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..500 {
            let result = material.scatter(&ray, &rec, &mut rng).unwrap();
            assert!(result.attenuation.max_element() <= 1.0);
            assert!(result.scattered.direction().dot(Vec3::Y) >= 0.0);
            assert!(result.scattered.direction().length() > 0.0);
        }
    }

    #[test]
    fn test_metal_never_amplifies_and_stays_above_surface() {
        let material: Material = Metal::new(Color::new(0.8, 0.6, 0.2), 0.7).into();
        let rec = record(&material, Vec3::Y, true);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..500 {
            if let Some(result) = material.scatter(&ray, &rec, &mut rng) {
                assert!(result.attenuation.max_element() <= 1.0);
                assert!(result.scattered.direction().dot(rec.normal) > 0.0);
            }
        }
    }

    #[test]
    fn test_mirror_reflects_exactly() {
        let material: Material = Metal::new(Color::ONE, 0.0).into();
        let rec = record(&material, Vec3::Y, true);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);

        let result = material.scatter(&ray, &rec, &mut rng).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((result.scattered.direction() - expected).length() < 1e-5);
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        assert_eq!(Metal::new(Color::ONE, 3.0).fuzz(), 1.0);
        assert_eq!(Metal::new(Color::ONE, -1.0).fuzz(), 0.0);
    }

    #[test]
    fn test_metal_absorbs_grazing_fuzzed_rays() {
        // A grazing mirror reflection with full fuzz must sometimes dip
        // below the surface; those rays are absorbed rather than traced.
        let material: Material = Metal::new(Color::ONE, 1.0).into();
        let rec = record(&material, Vec3::Y, true);
        let ray = Ray::new(Vec3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let mut rng = StdRng::seed_from_u64(4);

        let absorbed = (0..200)
            .filter(|_| material.scatter(&ray, &rec, &mut rng).is_none())
            .count();
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_always_scatters_finite() {
        let mut rng = StdRng::seed_from_u64(5);
        let directions = [
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, -1e-4, 0.0),
            // exact grazing incidence
            Vec3::new(1.0, 0.0, 0.0),
        ];

        for ior in [0.5, 1.0, 1.5, 2.4] {
            let material: Material = Dielectric::new(ior).into();
            for front_face in [true, false] {
                let rec = record(&material, Vec3::Y, front_face);
                for direction in directions {
                    let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), direction);
                    for _ in 0..50 {
                        let result = material.scatter(&ray, &rec, &mut rng).unwrap();
                        let out = result.scattered.direction();
                        assert!(out.is_finite(), "ior={ior} dir={direction} -> {out}");
                        assert!((out.length() - 1.0).abs() < 1e-3);
                        assert_eq!(result.attenuation, Color::ONE);
                    }
                }
            }
        }
    }

    #[test]
    fn test_total_internal_reflection() {
        // Leaving glass at a shallow angle cannot refract
        let material: Material = Dielectric::new(1.5).into();
        let rec = record(&material, Vec3::Y, false);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -0.2, 0.0));
        let mut rng = StdRng::seed_from_u64(6);

        let result = material.scatter(&ray, &rec, &mut rng).unwrap();
        let expected = reflect(ray.direction().normalize(), Vec3::Y);
        assert!((result.scattered.direction() - expected).length() < 1e-5);
    }

    #[test]
    fn test_schlick_reflectance() {
        // Head-on glass reflects about 4%
        assert!((reflectance(1.0, 1.5) - 0.04).abs() < 1e-4);
        // Grazing incidence reflects everything
        assert!((reflectance(0.0, 1.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_geometry_is_absorbed() {
        let mut rng = StdRng::seed_from_u64(7);
        let zero_ray = Ray::new(Vec3::ZERO, Vec3::ZERO);

        let metal: Material = Metal::new(Color::ONE, 0.5).into();
        assert!(metal
            .scatter(&zero_ray, &record(&metal, Vec3::Y, true), &mut rng)
            .is_none());

        let glass: Material = Dielectric::new(1.5).into();
        assert!(glass
            .scatter(&zero_ray, &record(&glass, Vec3::Y, true), &mut rng)
            .is_none());

        let diffuse: Material = Lambertian::new(Color::ONE).into();
        let ray = Ray::new(Vec3::Y, Vec3::NEG_Y);
        assert!(diffuse
            .scatter(&ray, &record(&diffuse, Vec3::ZERO, true), &mut rng)
            .is_none());
    }

    #[test]
    fn test_marble_is_deterministic_and_bounded() {
        let stripe = Color::new(0.1, 0.1, 0.1);
        let base = Color::new(0.8, 0.8, 0.8);
        let a = Marble::new(stripe, base, 17);
        let b = Marble::new(stripe, base, 17);

        for n in 0..100 {
            let t = n as f32 * 0.31;
            let p = Vec3::new(t.sin(), t * 0.1, t.cos());
            let color = a.sample(p);
            assert_eq!(color, b.sample(p));
            assert!(color.is_finite());
            assert!(color.min_element() >= 0.1 - 1e-6);
            assert!(color.max_element() <= 0.9 + 1e-6);
        }
    }

    #[test]
    fn test_marble_scatters_like_diffuse() {
        let material: Material = Marble::new(Color::ZERO, Color::ONE, 3).into();
        let rec = record(&material, Vec3::Y, true);
        let ray = Ray::new(Vec3::Y, Vec3::NEG_Y);
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..100 {
            let result = material.scatter(&ray, &rec, &mut rng).unwrap();
            assert!(result.scattered.direction().dot(Vec3::Y) >= 0.0);
        }
    }
}
