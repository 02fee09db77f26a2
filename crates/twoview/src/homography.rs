use rand::Rng;
use twoview_linalg::{
    mat33::{self, are_collinear},
    normalize::normalize_points_2d,
    svd, Point2d,
};

use crate::error::TwoViewError;
use crate::ransac::{ransac, Estimator, RansacParams, RansacResult};
use crate::types::{check_lengths, Correspondence, CorrespondenceSet, Homography};
use crate::validate::homography_transfer_error;

/// Sine of the angle below which three sample points count as collinear.
const COLLINEAR_TOL: f64 = 1e-6;

/// Relative determinant `|det Hn| / ||Hn||^3` below which a normalized homography is singular.
const SINGULAR_TOL: f64 = 1e-12;

/// Whether any three of the points are collinear.
fn has_collinear_triplet(x: &[Point2d; 4]) -> bool {
    const TRIPLETS: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLETS
        .iter()
        .any(|&[i, j, k]| are_collinear(&x[i], &x[j], &x[k], COLLINEAR_TOL))
}

/// Compute the homography matrix from four 2d point correspondences.
///
/// Three or more collinear points in either image make the sample degenerate.
///
/// * `x1` - The source 2d points.
/// * `x2` - The destination 2d points.
///
/// Returns the homography mapping `x1` onto `x2`.
pub fn homography_4pt2d(
    x1: &[Point2d; 4],
    x2: &[Point2d; 4],
) -> Result<Homography, TwoViewError> {
    if has_collinear_triplet(x1) || has_collinear_triplet(x2) {
        return Err(TwoViewError::DegenerateSample(
            "three or more sample points are collinear".to_string(),
        ));
    }
    homography_dlt(x1, x2)
}

/// Compute the homography matrix from four or more 2d point correspondences.
///
/// Both point sets are normalized, the direct linear transform system (two rows
/// per correspondence) is solved for its null vector by SVD, and the result is
/// de-normalized as `H = T2^-1 * Hn * T1`. With more than four points the
/// solution is the total least squares one.
///
/// * `x1` - The source 2d points (length >= 4).
/// * `x2` - The destination 2d points (same length).
pub fn homography_dlt(x1: &[Point2d], x2: &[Point2d]) -> Result<Homography, TwoViewError> {
    check_lengths(x1, x2)?;
    if x1.len() < 4 {
        return Err(TwoViewError::InsufficientData {
            required: 4,
            actual: x1.len(),
        });
    }

    let n1 = normalize_points_2d(x1);
    let n2 = normalize_points_2d(x2);

    // construct matrix A
    let mut mat_a = faer::Mat::<f64>::zeros(2 * x1.len(), 9);
    for (i, (p, q)) in n1.points.iter().zip(n2.points.iter()).enumerate() {
        mat_a.write(2 * i, 0, p.x);
        mat_a.write(2 * i, 1, p.y);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -q.x * p.x);
        mat_a.write(2 * i, 7, -q.x * p.y);
        mat_a.write(2 * i, 8, -q.x);

        mat_a.write(2 * i + 1, 3, p.x);
        mat_a.write(2 * i + 1, 4, p.y);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -q.y * p.x);
        mat_a.write(2 * i + 1, 7, -q.y * p.y);
        mat_a.write(2 * i + 1, 8, -q.y);
    }

    // solve -> h: 9x1 and take the smallest singular value
    let nv = svd::null_vector(&mat_a);
    if nv.is_rank_deficient(8, 1e-10) {
        return Err(TwoViewError::DegenerateSample(
            "DLT system has rank below 8".to_string(),
        ));
    }
    let h = &nv.vector;
    let h_norm = [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], h[8]]];

    // conditioning is only meaningful in the unit-free normalized frame
    if mat33::is_singular_mat33(&h_norm, SINGULAR_TOL) {
        return Err(TwoViewError::DegenerateSample(
            "normalized homography is singular".to_string(),
        ));
    }

    // denormalize
    let homo = mat33::mat33_mul_mat33(&mat33::mat33_mul_mat33(&n2.inverse, &h_norm), &n1.transform);

    Homography::new(homo)
}

/// Plugs the 4-point DLT into RANSAC.
///
/// The residual is the forward transfer error in the second image.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyEstimator;

impl Estimator for HomographyEstimator {
    type Model = Homography;

    fn min_samples(&self) -> usize {
        4
    }

    fn fit_minimal(&self, sample: &[Correspondence]) -> Result<Homography, TwoViewError> {
        let mut x1 = [Point2d::default(); 4];
        let mut x2 = [Point2d::default(); 4];
        for (i, c) in sample.iter().take(4).enumerate() {
            x1[i] = c.a;
            x2[i] = c.b;
        }
        homography_4pt2d(&x1, &x2)
    }

    fn fit_least_squares(&self, data: &[Correspondence]) -> Result<Homography, TwoViewError> {
        let x1 = data.iter().map(|c| c.a).collect::<Vec<_>>();
        let x2 = data.iter().map(|c| c.b).collect::<Vec<_>>();
        homography_dlt(&x1, &x2)
    }

    fn residual(&self, model: &Homography, c: &Correspondence) -> f64 {
        homography_transfer_error(model, c)
    }
}

/// Estimate a homography with RANSAC using the 4-point solver.
pub fn find_homography<R: Rng + ?Sized>(
    set: &CorrespondenceSet,
    params: &RansacParams,
    rng: &mut R,
) -> Result<RansacResult<Homography>, TwoViewError> {
    ransac(&HomographyEstimator, set.as_slice(), params, rng)
}
