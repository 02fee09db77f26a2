//! Per-correspondence error metrics and inlier classification.
//!
//! The same residual functions drive RANSAC scoring and post-hoc reporting,
//! so the numbers a caller sees are the ones the estimator optimized.

use serde::{Deserialize, Serialize};
use twoview_linalg::mat33;

use crate::types::{Correspondence, CorrespondenceSet, FundamentalMatrix, Homography, InlierMask};

/// Forward transfer error of a homography, `|| proj(H pA) - pB ||` in pixels.
///
/// Points mapped to infinity get an infinite error.
pub fn homography_transfer_error(h: &Homography, c: &Correspondence) -> f64 {
    match h.project(&c.a) {
        Some(p) => p.distance(&c.b),
        None => f64::INFINITY,
    }
}

/// Distance in pixels from `pB` to the epipolar line `F pA`.
///
/// Returns infinity when the epipolar line is undefined.
pub fn epipolar_distance(f: &FundamentalMatrix, c: &Correspondence) -> f64 {
    let mut l = [0.0; 3];
    mat33::mat33_mul_vec3(f.matrix(), &c.a.to_homogeneous(), &mut l);
    let norm = l[0].hypot(l[1]);
    if norm <= f64::EPSILON * l[2].abs() || norm == 0.0 {
        return f64::INFINITY;
    }
    (l[0] * c.b.x + l[1] * c.b.y + l[2]).abs() / norm
}

/// First-order geometric error of the epipolar constraint (Sampson distance).
///
/// Returned as a squared pixel distance.
pub fn sampson_distance(f: &FundamentalMatrix, c: &Correspondence) -> f64 {
    let m = f.matrix();
    let (pa, pb) = (c.a.to_homogeneous(), c.b.to_homogeneous());

    let mut fx1 = [0.0; 3];
    mat33::mat33_mul_vec3(m, &pa, &mut fx1);
    let mut ftx2 = [0.0; 3];
    mat33::mat33_mul_vec3(&mat33::transpose_mat33(m), &pb, &mut ftx2);

    let num = mat33::dot_product3(&pb, &fx1);
    let den = fx1[0] * fx1[0] + fx1[1] * fx1[1] + ftx2[0] * ftx2[0] + ftx2[1] * ftx2[1];
    if den <= 0.0 {
        return f64::INFINITY;
    }
    num * num / den
}

/// Outcome of classifying residuals against a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus {
    /// Inlier flags in input order.
    pub mask: InlierMask,
    /// Number of inliers.
    pub num_inliers: usize,
    /// Mean residual over the inliers, infinity when there are none.
    pub mean_residual: f64,
}

/// Classify residuals: a correspondence is an inlier iff `residual < threshold`.
pub fn classify(residuals: impl IntoIterator<Item = f64>, threshold: f64) -> Consensus {
    let mut mask = Vec::new();
    let mut num_inliers = 0usize;
    let mut sum = 0.0f64;
    for r in residuals {
        let inlier = r < threshold;
        if inlier {
            num_inliers += 1;
            sum += r;
        }
        mask.push(inlier);
    }

    Consensus {
        mask: InlierMask::new(mask),
        num_inliers,
        mean_residual: if num_inliers > 0 {
            sum / num_inliers as f64
        } else {
            f64::INFINITY
        },
    }
}

/// Classify a correspondence set against a homography.
pub fn classify_homography(h: &Homography, set: &CorrespondenceSet, threshold: f64) -> Consensus {
    classify(
        set.iter().map(|c| homography_transfer_error(h, c)),
        threshold,
    )
}

/// Classify a correspondence set against a fundamental matrix.
pub fn classify_fundamental(
    f: &FundamentalMatrix,
    set: &CorrespondenceSet,
    threshold: f64,
) -> Consensus {
    classify(set.iter().map(|c| epipolar_distance(f, c)), threshold)
}

/// Per-correspondence errors with summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualReport {
    /// Index of each reported correspondence in the input set.
    pub indices: Vec<usize>,
    /// Error of each reported correspondence in pixels.
    pub errors: Vec<f64>,
    /// Mean error, zero for an empty report.
    pub mean: f64,
    /// Maximum error, zero for an empty report.
    pub max: f64,
}

impl ResidualReport {
    /// Build a report from indexed errors.
    pub fn from_errors(indices: Vec<usize>, errors: Vec<f64>) -> Self {
        let (mean, max) = if errors.is_empty() {
            (0.0, 0.0)
        } else {
            (
                errors.iter().sum::<f64>() / errors.len() as f64,
                errors.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };
        Self {
            indices,
            errors,
            mean,
            max,
        }
    }

    /// Number of reported correspondences.
    pub fn count(&self) -> usize {
        self.errors.len()
    }
}

fn report_with(
    set: &CorrespondenceSet,
    mask: Option<&InlierMask>,
    error: impl Fn(&Correspondence) -> f64,
) -> ResidualReport {
    let (indices, errors) = set
        .iter()
        .enumerate()
        .filter(|(i, _)| mask.map_or(true, |m| m.is_inlier(*i)))
        .map(|(i, c)| (i, error(c)))
        .unzip();
    ResidualReport::from_errors(indices, errors)
}

/// Reprojection errors of a homography, restricted to `mask` when given.
pub fn reprojection_report(
    h: &Homography,
    set: &CorrespondenceSet,
    mask: Option<&InlierMask>,
) -> ResidualReport {
    report_with(set, mask, |c| homography_transfer_error(h, c))
}

/// Point-to-epiline distances of a fundamental matrix, restricted to `mask` when given.
pub fn epipolar_report(
    f: &FundamentalMatrix,
    set: &CorrespondenceSet,
    mask: Option<&InlierMask>,
) -> ResidualReport {
    report_with(set, mask, |c| epipolar_distance(f, c))
}
