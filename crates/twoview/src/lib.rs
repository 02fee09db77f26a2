#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Twoview
//!
//! Robust estimation of the geometry between two or three images from point
//! correspondences.
//!
//! ## Key Features
//!
//! - **Homography**: normalized DLT with a 4-point minimal solver
//! - **Fundamental matrix**: normalized 8-point algorithm with rank-2 enforcement
//! - **RANSAC**: adaptive iteration budget and least-squares refit on the inliers
//! - **Epipolar lines**: computation, distances and image clipping
//! - **Cross-view check**: intersection of epipolar lines from two other views
//!
//! ## Example: Robust homography
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use twoview::{find_homography, CorrespondenceSet, ImagePair, Point2d, RansacParams};
//!
//! let a: Vec<Point2d> = (0..12)
//!     .map(|i| Point2d::new((i % 4) as f64 * 50.0, (i / 4) as f64 * 40.0 + (i * i) as f64))
//!     .collect();
//! let b: Vec<Point2d> = a.iter().map(|p| Point2d::new(2.0 * p.x + 10.0, 2.0 * p.y - 5.0)).collect();
//! let set = CorrespondenceSet::from_points(ImagePair::new("a.png", "b.png"), &a, &b)?;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let result = find_homography(&set, &RansacParams::default(), &mut rng)?;
//! assert_eq!(result.num_inliers, 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Three-view line intersection and consistency errors.
pub mod crossview;

/// Epipolar lines of points under a fundamental matrix.
pub mod epipolar;

/// Error types of the estimators.
pub mod error;

/// Normalized 8-point fundamental matrix estimation.
pub mod fundamental;

/// Normalized DLT homography estimation.
pub mod homography;

/// Sources of correspondences and manually picked points.
pub mod collaborators;

/// Correspondence tables and JSON import and export.
pub mod io;

/// Homography and fundamental matrix of whole image pairs.
pub mod pair;

/// Generic RANSAC over minimal-sample estimators.
pub mod ransac;

/// Three-view transfer and epipolar consistency check.
pub mod three_view;

/// Correspondences and the models estimated from them.
pub mod types;

/// Residuals, inlier classification and error reports.
pub mod validate;

#[cfg(test)]
mod test_utils;

pub use collaborators::{CorrespondenceProvider, PointPicker, ScriptedPicker, TableProvider};
pub use crossview::{check_consistency, intersect_lines, CrossViewCheck};
pub use epipolar::{epiline, epilines, EpipolarLine, View};
pub use error::TwoViewError;
pub use fundamental::{find_fundamental, fundamental_8point, FundamentalEstimator};
pub use homography::{find_homography, homography_4pt2d, homography_dlt, HomographyEstimator};
pub use pair::{estimate_pair, estimate_pairs, PairConfig, PairGeometry, PairSummary};
pub use ransac::{ransac, Estimator, RansacParams, RansacResult, DEFAULT_INLIER_THRESHOLD_PX};
pub use three_view::{three_view_check, Provenance, ThreeViewConfig, ThreeViewQuery, ThreeViewReport, Triplets};
pub use twoview_linalg::Point2d;
pub use types::{Correspondence, CorrespondenceSet, FundamentalMatrix, Homography, ImagePair, InlierMask};
pub use validate::{
    classify_fundamental, classify_homography, epipolar_distance, epipolar_report,
    homography_transfer_error, reprojection_report, sampson_distance, ResidualReport,
};
