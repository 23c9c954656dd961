//! Seeded gradient noise for procedural materials.

use crate::random::random_unit_vector;
use lumen_math::{Point3, Vec3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const POINT_COUNT: usize = 256;

/// Smallest octave scale summed by [`Perlin::turbulence`].
pub const DEFAULT_PIXEL_SIZE: f32 = 0.00125;

/// Perlin gradient noise over a 256-cell repeating lattice.
///
/// The lattice is fully determined by the seed, so two materials built from
/// the same seed produce the same pattern on every thread.
#[derive(Debug, Clone)]
pub struct Perlin {
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let gradients = (0..POINT_COUNT)
            .map(|_| random_unit_vector(&mut rng))
            .collect();

        let mut permutation = || {
            let mut p: Vec<usize> = (0..POINT_COUNT).collect();
            p.shuffle(&mut rng);
            p
        };
        let perm_x = permutation();
        let perm_y = permutation();
        let perm_z = permutation();

        Self {
            gradients,
            perm_x,
            perm_y,
            perm_z,
        }
    }

    /// Noise value at `p`, roughly in [-1, 1].
    pub fn noise(&self, p: Point3) -> f32 {
        let floor = p.floor();
        let frac = p - floor;

        let i = floor.x as i64;
        let j = floor.y as i64;
        let k = floor.z as i64;

        let mut corners = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in corners.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, corner) in row.iter_mut().enumerate() {
                    let index = self.perm_x[wrap(i + di as i64)]
                        ^ self.perm_y[wrap(j + dj as i64)]
                        ^ self.perm_z[wrap(k + dk as i64)];
                    *corner = self.gradients[index];
                }
            }
        }

        trilinear(&corners, frac)
    }

    /// Fractal sum of octaves at halving scales, down to `pixel_size`.
    pub fn turbulence(&self, p: Point3, pixel_size: f32) -> f32 {
        let mut accum = 0.0;
        let mut scale = 1.0;
        while scale > pixel_size {
            accum += self.noise(p / scale) * scale;
            scale *= 0.5;
        }
        accum
    }
}

#[inline]
fn wrap(n: i64) -> usize {
    (n & (POINT_COUNT as i64 - 1)) as usize
}

/// Hermite-smoothed trilinear blend of the corner gradients.
fn trilinear(corners: &[[[Vec3; 2]; 2]; 2], frac: Vec3) -> f32 {
    let smooth = frac * frac * (3.0 - 2.0 * frac);
    let mut accum = 0.0;

    for (i, plane) in corners.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight = frac - Vec3::new(fi, fj, fk);
                accum += (fi * smooth.x + (1.0 - fi) * (1.0 - smooth.x))
                    * (fj * smooth.y + (1.0 - fj) * (1.0 - smooth.y))
                    * (fk * smooth.z + (1.0 - fk) * (1.0 - smooth.z))
                    * gradient.dot(weight);
            }
        }
    }

    accum
}
