use rand::Rng;
use twoview_linalg::{mat33, normalize::normalize_points_2d, svd, Point2d};

use crate::error::TwoViewError;
use crate::ransac::{ransac, Estimator, RansacParams, RansacResult};
use crate::types::{check_lengths, Correspondence, CorrespondenceSet, FundamentalMatrix};
use crate::validate::epipolar_distance;

/// Relative size of the 8th singular value below which the design matrix is rank deficient.
const RANK_TOL: f64 = 1e-10;

/// Ratio `s9 / s8` above which the null space is considered ambiguous.
const NULL_SPACE_GAP: f64 = 0.5;

/// Design matrix `A` (N x 9) of `x2^T F x1 = 0`, one row per correspondence.
fn design_matrix(x1: &[Point2d], x2: &[Point2d]) -> faer::Mat<f64> {
    let mut a = faer::Mat::<f64>::zeros(x1.len(), 9);
    for (i, (p, q)) in x1.iter().zip(x2.iter()).enumerate() {
        let (x, y) = (p.x, p.y);
        let (xp, yp) = (q.x, q.y);
        a.write(i, 0, xp * x);
        a.write(i, 1, xp * y);
        a.write(i, 2, xp);
        a.write(i, 3, yp * x);
        a.write(i, 4, yp * y);
        a.write(i, 5, yp);
        a.write(i, 6, x);
        a.write(i, 7, y);
        a.write(i, 8, 1.0);
    }
    a
}

/// Estimate the fundamental matrix using the normalized 8-point algorithm.
///
/// - `x1`: points in image 1 (length >= 8)
/// - `x2`: corresponding points in image 2 (same length)
/// - `strict`: reject an ambiguous null space instead of only warning about it
///
/// The solution satisfies `x2^T F x1 = 0`, has rank two and unit Frobenius norm.
pub fn fundamental_8point(
    x1: &[Point2d],
    x2: &[Point2d],
    strict: bool,
) -> Result<FundamentalMatrix, TwoViewError> {
    check_lengths(x1, x2)?;
    if x1.len() < 8 {
        return Err(TwoViewError::InsufficientData {
            required: 8,
            actual: x1.len(),
        });
    }

    // Normalize points with similarity transforms T1, T2 to have zero mean and avg sqrt(2) distance
    let n1 = normalize_points_2d(x1);
    let n2 = normalize_points_2d(x2);

    let a = design_matrix(&n1.points, &n2.points);

    // Solve Af = 0 via SVD: take last column of V
    let nv = svd::null_vector(&a);
    if nv.is_rank_deficient(8, RANK_TOL) {
        return Err(TwoViewError::DegenerateSample(
            "8-point design matrix has rank below 8 (near-planar or repeated points)".to_string(),
        ));
    }

    let gap = nv.null_space_gap();
    if gap > NULL_SPACE_GAP {
        if strict {
            return Err(TwoViewError::DegenerateSample(format!(
                "ambiguous null space (s9 / s8 = {gap:.3})"
            )));
        }
        log::warn!("fundamental matrix null space is poorly separated (s9 / s8 = {gap:.3})");
    }

    let f = &nv.vector;
    let f_norm = [[f[0], f[1], f[2]], [f[3], f[4], f[5]], [f[6], f[7], f[8]]];

    // Enforce rank-2 constraint on F by zeroing its smallest singular value
    let f_rank2 = svd::enforce_rank2(&f_norm);

    // Denormalize: F = T2^T * F * T1
    let f_denorm = mat33::mat33_mul_mat33(
        &mat33::mat33_mul_mat33(&mat33::transpose_mat33(&n2.transform), &f_rank2),
        &n1.transform,
    );

    FundamentalMatrix::new(f_denorm)
}

/// Plugs the normalized 8-point solver into RANSAC.
///
/// The residual is the distance of the second point to the epipolar line of the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundamentalEstimator {
    /// Reject samples with an ambiguous null space.
    pub strict: bool,
}

impl Estimator for FundamentalEstimator {
    type Model = FundamentalMatrix;

    fn min_samples(&self) -> usize {
        8
    }

    fn fit_minimal(&self, sample: &[Correspondence]) -> Result<FundamentalMatrix, TwoViewError> {
        self.fit_least_squares(sample)
    }

    fn fit_least_squares(&self, data: &[Correspondence]) -> Result<FundamentalMatrix, TwoViewError> {
        let x1 = data.iter().map(|c| c.a).collect::<Vec<_>>();
        let x2 = data.iter().map(|c| c.b).collect::<Vec<_>>();
        fundamental_8point(&x1, &x2, self.strict)
    }

    fn residual(&self, model: &FundamentalMatrix, c: &Correspondence) -> f64 {
        epipolar_distance(model, c)
    }
}

/// Estimate a fundamental matrix with RANSAC using the 8-point solver.
pub fn find_fundamental<R: Rng + ?Sized>(
    set: &CorrespondenceSet,
    params: &RansacParams,
    strict: bool,
    rng: &mut R,
) -> Result<RansacResult<FundamentalMatrix>, TwoViewError> {
    ransac(
        &FundamentalEstimator { strict },
        set.as_slice(),
        params,
        rng,
    )
}
