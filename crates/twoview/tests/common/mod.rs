//! Synthetic scenes shared by the integration tests.
#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use twoview::Point2d;

pub type Mat3 = [[f64; 3]; 3];

pub const K: Mat3 = [[800.0, 0.0, 320.0], [0.0, 800.0, 240.0], [0.0, 0.0, 1.0]];

/// A pinhole camera `P = K [R | t]`.
pub struct Camera {
    pub r: Mat3,
    pub t: [f64; 3],
}

impl Camera {
    pub fn identity() -> Self {
        Self {
            r: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            t: [0.0; 3],
        }
    }

    pub fn project(&self, p: &[f64; 3]) -> Point2d {
        let q: Vec<f64> = (0..3)
            .map(|i| self.r[i][0] * p[0] + self.r[i][1] * p[1] + self.r[i][2] * p[2] + self.t[i])
            .collect();
        let u: Vec<f64> = (0..3)
            .map(|i| K[i][0] * q[0] + K[i][1] * q[1] + K[i][2] * q[2])
            .collect();
        Point2d::new(u[0] / u[2], u[1] / u[2])
    }
}

pub fn rotation_x(theta: f64) -> Mat3 {
    let (s, c) = theta.sin_cos();
    [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
}

pub fn rotation_y(theta: f64) -> Mat3 {
    let (s, c) = theta.sin_cos();
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

/// Non-planar 3d points in front of the reference camera.
pub fn random_points(n: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            [
                rng.random_range(-2.0..2.0),
                rng.random_range(-1.5..1.5),
                rng.random_range(4.0..8.0),
            ]
        })
        .collect()
}

/// Points on the tilted plane `z = 6 + 0.1 x`, shifted off it by `offset`.
pub fn plane_points(n: usize, offset: impl Fn(&mut StdRng) -> f64, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x = rng.random_range(-2.0..2.0);
            let y = rng.random_range(-1.5..1.5);
            let dz = offset(&mut rng);
            [x, y, 6.0 + 0.1 * x + dz]
        })
        .collect()
}

pub fn project_all(camera: &Camera, points: &[[f64; 3]]) -> Vec<Point2d> {
    points.iter().map(|p| camera.project(p)).collect()
}

/// Apply a homography to a point.
pub fn apply(h: &Mat3, p: &Point2d) -> Point2d {
    let w = h[2][0] * p.x + h[2][1] * p.y + h[2][2];
    Point2d::new(
        (h[0][0] * p.x + h[0][1] * p.y + h[0][2]) / w,
        (h[1][0] * p.x + h[1][1] * p.y + h[1][2]) / w,
    )
}

/// Uniform random points inside a `640 x 480` image.
pub fn image_points(n: usize, seed: u64) -> Vec<Point2d> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Point2d::new(rng.random_range(0.0..640.0), rng.random_range(0.0..480.0)))
        .collect()
}

/// Move a point by `magnitude` pixels in a random direction.
pub fn perturb(p: &Point2d, magnitude: f64, rng: &mut StdRng) -> Point2d {
    let angle: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    Point2d::new(p.x + magnitude * angle.cos(), p.y + magnitude * angle.sin())
}
