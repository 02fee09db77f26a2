//! Generic RANSAC over point correspondences.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TwoViewError;
use crate::types::{Correspondence, InlierMask};
use crate::validate::{classify, Consensus};

/// Default inlier threshold in pixels, shared by every model.
pub const DEFAULT_INLIER_THRESHOLD_PX: f64 = 3.0;

/// A model that can be fitted to correspondences and scored per correspondence.
pub trait Estimator {
    /// The fitted model.
    type Model: Clone;

    /// Size of a minimal sample.
    fn min_samples(&self) -> usize;

    /// Fit a model to exactly `min_samples()` correspondences.
    ///
    /// Returns [`TwoViewError::DegenerateSample`] when the sample does not
    /// determine a model; RANSAC skips such samples.
    fn fit_minimal(&self, sample: &[Correspondence]) -> Result<Self::Model, TwoViewError>;

    /// Least-squares fit to an arbitrary number of correspondences.
    fn fit_least_squares(&self, data: &[Correspondence]) -> Result<Self::Model, TwoViewError>;

    /// Nonnegative error of a correspondence with respect to a model.
    fn residual(&self, model: &Self::Model, c: &Correspondence) -> f64;
}

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Inlier threshold in pixels; inliers satisfy `residual < threshold`.
    pub threshold: f64,
    /// Desired probability that at least one sample is outlier-free.
    pub confidence: f64,
    /// Whether to refit the best model on all of its inliers.
    pub refine: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: DEFAULT_INLIER_THRESHOLD_PX,
            confidence: 0.99,
            refine: true,
        }
    }
}

/// Result of a RANSAC model fit.
#[derive(Clone, Debug, Serialize)]
pub struct RansacResult<M> {
    /// Estimated model.
    pub model: M,
    /// Per-correspondence inlier mask, in input order.
    pub inliers: InlierMask,
    /// Total inlier count.
    pub num_inliers: usize,
    /// Mean inlier residual in pixels.
    pub mean_residual: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of samples rejected as degenerate.
    pub degenerate_samples: usize,
}

/// Number of iterations needed to draw an outlier-free sample with the given confidence.
///
/// Implements `N = log(1 - confidence) / log(1 - w^s)`, floored at one and
/// capped at `max_iterations`.
pub fn adaptive_iterations(
    inlier_ratio: f64,
    sample_size: usize,
    confidence: f64,
    max_iterations: usize,
) -> usize {
    let max_iterations = max_iterations.max(1);
    let w = inlier_ratio.clamp(0.0, 1.0);
    let ws = w.powi(sample_size as i32);
    if ws >= 1.0 {
        return 1;
    }
    if ws <= 0.0 {
        return max_iterations;
    }

    let num = (1.0 - confidence.clamp(0.0, 1.0)).ln();
    let den = (1.0 - ws).ln();
    let n = (num / den).ceil();
    if !n.is_finite() || n >= max_iterations as f64 {
        return max_iterations;
    }
    (n as usize).max(1)
}

struct Candidate<M> {
    model: M,
    consensus: Consensus,
}

impl<M> Candidate<M> {
    fn is_better_than(&self, other: &Consensus) -> bool {
        self.consensus.num_inliers > other.num_inliers
            || (self.consensus.num_inliers == other.num_inliers
                && self.consensus.mean_residual < other.mean_residual)
    }
}

fn score<E: Estimator>(
    estimator: &E,
    model: &E::Model,
    data: &[Correspondence],
    threshold: f64,
) -> Consensus {
    classify(data.iter().map(|c| estimator.residual(model, c)), threshold)
}

/// Robustly fit a model with RANSAC.
///
/// Minimal samples are drawn without replacement from `rng`, so runs with the
/// same seed are reproducible. Degenerate samples are skipped. The iteration
/// budget shrinks adaptively with the best inlier ratio found so far. The best
/// model is finally refitted on all of its inliers when `params.refine` is set.
///
/// # Arguments
///
/// * `estimator` - The model fitting and residual functions.
/// * `data` - The correspondences.
/// * `params` - The RANSAC parameters.
/// * `rng` - The random source used for sampling.
///
/// # Errors
///
/// * [`TwoViewError::InsufficientData`] if `data` is smaller than a minimal sample.
/// * [`TwoViewError::EstimationFailed`] if no model reaches `min_samples() + 1` inliers.
pub fn ransac<E, R>(
    estimator: &E,
    data: &[Correspondence],
    params: &RansacParams,
    rng: &mut R,
) -> Result<RansacResult<E::Model>, TwoViewError>
where
    E: Estimator,
    R: Rng + ?Sized,
{
    let n = data.len();
    let m = estimator.min_samples();
    if n < m {
        return Err(TwoViewError::InsufficientData {
            required: m,
            actual: n,
        });
    }

    let mut best: Option<Candidate<E::Model>> = None;
    let mut sample = Vec::with_capacity(m);
    let mut required_iters = params.max_iterations;
    let mut iterations = 0usize;
    let mut degenerate_samples = 0usize;

    while iterations < required_iters {
        iterations += 1;

        let indices = rand::seq::index::sample(rng, n, m);
        sample.clear();
        sample.extend(indices.iter().map(|i| data[i]));

        let model = match estimator.fit_minimal(&sample) {
            Ok(model) => model,
            Err(e) if e.is_degenerate_sample() => {
                degenerate_samples += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let candidate = Candidate {
            consensus: score(estimator, &model, data, params.threshold),
            model,
        };

        let improved = match &best {
            Some(b) => candidate.is_better_than(&b.consensus),
            None => true,
        };
        if !improved {
            continue;
        }

        let w = candidate.consensus.num_inliers as f64 / n as f64;
        required_iters = required_iters.min(adaptive_iterations(
            w,
            m,
            params.confidence,
            params.max_iterations,
        ));
        log::debug!(
            "ransac iteration {}: {} / {} inliers, budget {} iterations",
            iterations,
            candidate.consensus.num_inliers,
            n,
            required_iters
        );
        best = Some(candidate);
    }

    let required = m + 1;
    let best = match best {
        Some(b) if b.consensus.num_inliers >= required => b,
        other => {
            return Err(TwoViewError::EstimationFailed {
                iterations,
                best_inliers: other.map_or(0, |b| b.consensus.num_inliers),
                required,
            })
        }
    };

    let best = if params.refine {
        refine(estimator, data, params.threshold, best)
    } else {
        best
    };

    Ok(RansacResult {
        model: best.model,
        num_inliers: best.consensus.num_inliers,
        mean_residual: best.consensus.mean_residual,
        inliers: best.consensus.mask,
        iterations,
        degenerate_samples,
    })
}

fn refine<E: Estimator>(
    estimator: &E,
    data: &[Correspondence],
    threshold: f64,
    best: Candidate<E::Model>,
) -> Candidate<E::Model> {
    let inliers = best.consensus.mask.select(data);
    match estimator.fit_least_squares(&inliers) {
        Ok(model) => {
            let consensus = score(estimator, &model, data, threshold);
            log::debug!(
                "ransac refit on {} inliers: {} inliers after refit",
                inliers.len(),
                consensus.num_inliers
            );
            Candidate { model, consensus }
        }
        Err(e) => {
            log::warn!("ransac refit failed, keeping minimal-sample model: {e}");
            best
        }
    }
}
