//! Synthetic two-camera scenes for unit tests.

use rand::{rngs::StdRng, Rng, SeedableRng};
use twoview_linalg::{mat33, Point2d};

use crate::types::FundamentalMatrix;

pub(crate) const K: mat33::Mat33 = [[800.0, 0.0, 320.0], [0.0, 800.0, 240.0], [0.0, 0.0, 1.0]];

pub(crate) struct StereoScene {
    pub x1: Vec<Point2d>,
    pub x2: Vec<Point2d>,
    pub f_true: FundamentalMatrix,
}

fn rotation_y(theta: f64) -> mat33::Mat33 {
    let (s, c) = theta.sin_cos();
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

fn project(p: &[f64; 3]) -> Point2d {
    let mut uv = [0.0; 3];
    mat33::mat33_mul_vec3(&K, p, &mut uv);
    Point2d::new(uv[0] / uv[2], uv[1] / uv[2])
}

/// Random 3d points seen by two cameras, `P1 = K [I | 0]` and `P2 = K [R | t]`.
pub(crate) fn stereo_scene(n: usize, seed: u64) -> StereoScene {
    let mut rng = StdRng::seed_from_u64(seed);
    let r = rotation_y(0.1);
    let t = [-1.0, 0.2, 0.1];

    let mut x1 = Vec::with_capacity(n);
    let mut x2 = Vec::with_capacity(n);
    for _ in 0..n {
        let p = [
            rng.random_range(-2.0..2.0),
            rng.random_range(-1.5..1.5),
            rng.random_range(4.0..8.0),
        ];
        let mut q = [0.0; 3];
        mat33::mat33_mul_vec3(&r, &p, &mut q);
        let q = [q[0] + t[0], q[1] + t[1], q[2] + t[2]];
        x1.push(project(&p));
        x2.push(project(&q));
    }

    // F = K^-T [t]x R K^-1
    let k_inv = [
        [1.0 / K[0][0], 0.0, -K[0][2] / K[0][0]],
        [0.0, 1.0 / K[1][1], -K[1][2] / K[1][1]],
        [0.0, 0.0, 1.0],
    ];
    let t_x = [[0.0, -t[2], t[1]], [t[2], 0.0, -t[0]], [-t[1], t[0], 0.0]];
    let e = mat33::mat33_mul_mat33(&t_x, &r);
    let f = mat33::mat33_mul_mat33(
        &mat33::mat33_mul_mat33(&mat33::transpose_mat33(&k_inv), &e),
        &k_inv,
    );

    StereoScene {
        x1,
        x2,
        f_true: FundamentalMatrix::new(f).expect("ground truth is rank two"),
    }
}
