//! Estimation of both models for whole image pairs.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use twoview_linalg::Point2d;

use crate::epipolar::{epiline, EpipolarLine, View};
use crate::error::TwoViewError;
use crate::fundamental::find_fundamental;
use crate::homography::find_homography;
use crate::ransac::{RansacParams, RansacResult};
use crate::types::{CorrespondenceSet, FundamentalMatrix, Homography, ImagePair, InlierMask};
use crate::validate::{epipolar_report, reprojection_report, ResidualReport};

/// Parameters for estimating the geometry of an image pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairConfig {
    /// RANSAC settings of the homography.
    pub homography: RansacParams,
    /// RANSAC settings of the fundamental matrix.
    pub fundamental: RansacParams,
    /// Reject ambiguous 8-point samples instead of warning.
    pub strict_fundamental: bool,
    /// Seed of the per-pair random generators used by [`estimate_pairs`].
    pub seed: u64,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            homography: RansacParams::default(),
            fundamental: RansacParams::default(),
            strict_fundamental: false,
            seed: 42,
        }
    }
}

/// A RANSAC homography with the reprojection errors of its inliers.
#[derive(Debug, Clone, Serialize)]
pub struct HomographyFit {
    /// The RANSAC result.
    pub ransac: RansacResult<Homography>,
    /// Reprojection errors over the inliers.
    pub report: ResidualReport,
}

/// A RANSAC fundamental matrix with its inlier epipolar lines.
#[derive(Debug, Clone, Serialize)]
pub struct FundamentalFit {
    /// The RANSAC result.
    pub ransac: RansacResult<FundamentalMatrix>,
    /// Point-to-epiline distances over the inliers.
    pub report: ResidualReport,
    /// Lines in image A of the inlier points of image B.
    pub lines_a: Vec<EpipolarLine>,
    /// Lines in image B of the inlier points of image A.
    pub lines_b: Vec<EpipolarLine>,
}

/// Both models of one image pair.
///
/// The homography and the fundamental matrix are estimated independently, so
/// either may fail while the other succeeds.
#[derive(Debug, Clone)]
pub struct PairGeometry {
    /// The image pair.
    pub pair: ImagePair,
    /// Number of correspondences of the pair.
    pub num_correspondences: usize,
    /// Homography estimate.
    pub homography: Result<HomographyFit, TwoViewError>,
    /// Fundamental matrix estimate.
    pub fundamental: Result<FundamentalFit, TwoViewError>,
}

/// A serializable digest of a [`PairGeometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    /// Image pair in `imageA|imageB` form.
    pub pair: String,
    /// Number of correspondences of the pair.
    pub num_correspondences: usize,
    /// Homography matrix, if estimated.
    pub homography: Option<Homography>,
    /// Homography inlier mask.
    pub homography_inliers: Option<InlierMask>,
    /// Homography reprojection errors.
    pub homography_report: Option<ResidualReport>,
    /// Homography failure message.
    pub homography_error: Option<String>,
    /// Fundamental matrix, if estimated.
    pub fundamental: Option<FundamentalMatrix>,
    /// Fundamental matrix inlier mask.
    pub fundamental_inliers: Option<InlierMask>,
    /// Fundamental matrix epipolar distances.
    pub fundamental_report: Option<ResidualReport>,
    /// Fundamental matrix failure message.
    pub fundamental_error: Option<String>,
}

impl PairGeometry {
    /// Digest of the estimates for export.
    pub fn summary(&self) -> PairSummary {
        let h = self.homography.as_ref();
        let f = self.fundamental.as_ref();
        PairSummary {
            pair: self.pair.to_string(),
            num_correspondences: self.num_correspondences,
            homography: h.ok().map(|fit| fit.ransac.model),
            homography_inliers: h.ok().map(|fit| fit.ransac.inliers.clone()),
            homography_report: h.ok().map(|fit| fit.report.clone()),
            homography_error: h.err().map(ToString::to_string),
            fundamental: f.ok().map(|fit| fit.ransac.model),
            fundamental_inliers: f.ok().map(|fit| fit.ransac.inliers.clone()),
            fundamental_report: f.ok().map(|fit| fit.report.clone()),
            fundamental_error: f.err().map(ToString::to_string),
        }
    }
}

fn fit_homography<R: Rng + ?Sized>(
    set: &CorrespondenceSet,
    config: &PairConfig,
    rng: &mut R,
) -> Result<HomographyFit, TwoViewError> {
    let ransac = find_homography(set, &config.homography, rng)?;
    let report = reprojection_report(&ransac.model, set, Some(&ransac.inliers));
    Ok(HomographyFit { ransac, report })
}

/// Epipolar lines of inlier points, skipping points that sit on the epipole.
fn inlier_epilines(points: &[Point2d], f: &FundamentalMatrix, view: View) -> Vec<EpipolarLine> {
    points
        .iter()
        .filter_map(|p| match epiline(p, f, view) {
            Ok(line) => Some(line),
            Err(e) => {
                log::warn!("skipping epipolar line of ({}, {}): {e}", p.x, p.y);
                None
            }
        })
        .collect()
}

fn fit_fundamental<R: Rng + ?Sized>(
    set: &CorrespondenceSet,
    config: &PairConfig,
    rng: &mut R,
) -> Result<FundamentalFit, TwoViewError> {
    let ransac = find_fundamental(set, &config.fundamental, config.strict_fundamental, rng)?;
    let report = epipolar_report(&ransac.model, set, Some(&ransac.inliers));
    let points_b = ransac.inliers.select(&set.points_b());
    let points_a = ransac.inliers.select(&set.points_a());
    let lines_a = inlier_epilines(&points_b, &ransac.model, View::Right);
    let lines_b = inlier_epilines(&points_a, &ransac.model, View::Left);
    Ok(FundamentalFit {
        ransac,
        report,
        lines_a,
        lines_b,
    })
}

/// Estimate the homography and the fundamental matrix of one image pair.
pub fn estimate_pair<R: Rng + ?Sized>(
    set: &CorrespondenceSet,
    config: &PairConfig,
    rng: &mut R,
) -> PairGeometry {
    let homography = fit_homography(set, config, rng);
    let fundamental = fit_fundamental(set, config, rng);

    if let Err(e) = &homography {
        log::warn!("{}: homography failed: {e}", set.pair());
    }
    if let Err(e) = &fundamental {
        log::warn!("{}: fundamental matrix failed: {e}", set.pair());
    }

    PairGeometry {
        pair: set.pair().clone(),
        num_correspondences: set.len(),
        homography,
        fundamental,
    }
}

/// Estimate the geometry of many image pairs in parallel.
///
/// Pair `i` draws its samples from a generator seeded with `config.seed + i`,
/// so the output does not depend on the thread schedule.
pub fn estimate_pairs(sets: &[CorrespondenceSet], config: &PairConfig) -> Vec<PairGeometry> {
    sets.par_iter()
        .enumerate()
        .map(|(i, set)| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
            estimate_pair(set, config, &mut rng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::stereo_scene;

    #[test]
    fn test_estimate_pair_general_scene() {
        let scene = stereo_scene(40, 5);
        let set =
            CorrespondenceSet::from_points(ImagePair::new("a", "b"), &scene.x1, &scene.x2).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let geometry = estimate_pair(&set, &PairConfig::default(), &mut rng);

        assert_eq!(geometry.num_correspondences, 40);
        let fit = geometry.fundamental.as_ref().unwrap();
        assert_eq!(fit.ransac.num_inliers, 40);
        assert_eq!(fit.lines_a.len(), 40);
        assert_eq!(fit.lines_b.len(), 40);
        assert!(fit.report.max < 1e-6);
        for (line, q) in fit.lines_b.iter().zip(scene.x2.iter()) {
            assert!(line.distance(q) < 1e-6);
        }

        let summary = geometry.summary();
        assert_eq!(summary.pair, "a|b");
        assert!(summary.fundamental.is_some());
        assert!(summary.fundamental_error.is_none());
    }

    #[test]
    fn test_estimate_pair_partial_failure() {
        // a pure translation: the homography fits, eight points do not suffice for F
        let a: Vec<Point2d> = (0..6)
            .map(|i| Point2d::new(i as f64 * 13.0, (i * i) as f64 * 3.0))
            .collect();
        let b: Vec<Point2d> = a.iter().map(|p| Point2d::new(p.x + 5.0, p.y - 2.0)).collect();
        let set = CorrespondenceSet::from_points(ImagePair::new("a", "b"), &a, &b).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let geometry = estimate_pair(&set, &PairConfig::default(), &mut rng);

        assert!(geometry.homography.is_ok());
        assert!(matches!(
            geometry.fundamental,
            Err(TwoViewError::InsufficientData { required: 8, actual: 6 })
        ));
        let summary = geometry.summary();
        assert!(summary.homography.is_some());
        assert!(summary.fundamental_error.is_some());
    }

    #[test]
    fn test_inlier_epilines_skip_epipole() {
        // both epipoles at the origin
        let f = FundamentalMatrix::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]).unwrap();
        let points = [
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 2.0),
            Point2d::new(3.0, -1.0),
        ];
        for view in [View::Left, View::Right] {
            let lines = inlier_epilines(&points, &f, view);
            assert_eq!(lines.len(), 2);
            assert_eq!(lines[0].source(), Point2d::new(1.0, 2.0));
            assert!(lines.iter().all(|l| l.distance(&Point2d::new(0.0, 0.0)) < 1e-12));
        }
    }

    #[test]
    fn test_estimate_pairs_deterministic() {
        let sets: Vec<CorrespondenceSet> = (0..4)
            .map(|i| {
                let scene = stereo_scene(30, i);
                CorrespondenceSet::from_points(
                    ImagePair::new(format!("a{i}"), format!("b{i}")),
                    &scene.x1,
                    &scene.x2,
                )
                .unwrap()
            })
            .collect();
        let config = PairConfig::default();
        let first = estimate_pairs(&sets, &config);
        let second = estimate_pairs(&sets, &config);
        assert_eq!(first.len(), 4);
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.pair, y.pair);
            assert_eq!(x.summary(), y.summary());
        }
    }
}
