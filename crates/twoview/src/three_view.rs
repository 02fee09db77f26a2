//! Three-view cross-validation of manually or automatically matched points.
//!
//! Given point triplets over images A, B and C, a query point in A is
//! transferred to B and C through homographies, and its position in B is
//! predicted a second way: as the intersection of the epipolar line of the
//! query (from `F_AB`) with the epipolar line of its C counterpart (from `F_CB`).

use rand::Rng;
use serde::{Deserialize, Serialize};
use twoview_linalg::Point2d;

use crate::crossview::{check_consistency, CrossViewCheck};
use crate::epipolar::{epiline, EpipolarLine, View};
use crate::error::TwoViewError;
use crate::fundamental::find_fundamental;
use crate::homography::find_homography;
use crate::ransac::RansacParams;
use crate::types::{check_lengths, CorrespondenceSet, FundamentalMatrix, Homography, ImagePair};

/// Matching points over three images, paired by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triplets {
    a: Vec<Point2d>,
    b: Vec<Point2d>,
    c: Vec<Point2d>,
}

impl Triplets {
    /// Create triplets from three point lists of equal length.
    pub fn new(a: Vec<Point2d>, b: Vec<Point2d>, c: Vec<Point2d>) -> Result<Self, TwoViewError> {
        check_lengths(&a, &b)?;
        check_lengths(&a, &c)?;
        Ok(Self { a, b, c })
    }

    /// Number of triplets.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Whether there are no triplets.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Points in image A.
    pub fn a(&self) -> &[Point2d] {
        &self.a
    }

    /// Points in image B.
    pub fn b(&self) -> &[Point2d] {
        &self.b
    }

    /// Points in image C.
    pub fn c(&self) -> &[Point2d] {
        &self.c
    }

    fn pair(&self, first: char, second: char) -> Result<CorrespondenceSet, TwoViewError> {
        let points = |view: char| match view {
            'A' => &self.a,
            'B' => &self.b,
            _ => &self.c,
        };
        CorrespondenceSet::from_points(
            ImagePair::new(first.to_string(), second.to_string()),
            points(first),
            points(second),
        )
    }
}

/// Parameters of the three-view check.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeViewConfig {
    /// RANSAC settings for `H_AB` and `H_AC`.
    pub homography: RansacParams,
    /// RANSAC settings for `F_AB` and `F_CB`.
    pub fundamental: RansacParams,
    /// Reject ambiguous 8-point samples instead of warning.
    pub strict_fundamental: bool,
}

/// The query point and optional observations of its matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeViewQuery {
    /// The query point in image A.
    pub point_a: Point2d,
    /// The observed match in image B, used to measure the errors.
    pub observed_b: Option<Point2d>,
    /// The observed match in image C. When absent it is predicted with `H_AC`.
    pub observed_c: Option<Point2d>,
}

/// Where the C-side point of the check comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Measured in image C.
    Observed,
    /// Transferred from A through the estimated homography `H_AC`.
    Projected,
}

/// Everything the three-view check computed.
#[derive(Debug, Clone, Serialize)]
pub struct ThreeViewReport {
    /// Homography from A to B.
    pub h_ab: Homography,
    /// Homography from A to C.
    pub h_ac: Homography,
    /// Fundamental matrix from A to B.
    pub f_ab: FundamentalMatrix,
    /// Fundamental matrix from C to B.
    pub f_cb: FundamentalMatrix,
    /// Query point transferred to B by `H_AB`.
    pub transfer_b: Point2d,
    /// C-side point used for the second epipolar line.
    pub point_c: Point2d,
    /// Origin of `point_c`.
    pub point_c_provenance: Provenance,
    /// Epipolar line in B of the query point.
    pub line_from_a: EpipolarLine,
    /// Epipolar line in B of `point_c`.
    pub line_from_c: EpipolarLine,
    /// Intersection of both lines against the observed B point.
    pub check: CrossViewCheck,
    /// Distance of the observed B point to `line_from_a`.
    pub epipolar_error_b: Option<f64>,
    /// Distance of the observed B point to `transfer_b`.
    pub transfer_error_b: Option<f64>,
}

fn transfer(h: &Homography, p: &Point2d) -> Result<Point2d, TwoViewError> {
    h.project(p)
        .ok_or(TwoViewError::PointAtInfinity { x: p.x, y: p.y })
}

/// Run the three-view consistency check for one query point.
///
/// Estimates `H_AB`, `H_AC`, `F_AB` and `F_CB` with RANSAC from the triplets,
/// then intersects the epipolar lines in B of the query point and of its C
/// counterpart.
pub fn three_view_check<R: Rng + ?Sized>(
    triplets: &Triplets,
    query: &ThreeViewQuery,
    config: &ThreeViewConfig,
    rng: &mut R,
) -> Result<ThreeViewReport, TwoViewError> {
    let ab = triplets.pair('A', 'B')?;
    let ac = triplets.pair('A', 'C')?;
    let cb = triplets.pair('C', 'B')?;

    let h_ab = find_homography(&ab, &config.homography, rng)?.model;
    let h_ac = find_homography(&ac, &config.homography, rng)?.model;
    log::debug!("H_AB: {:?}", h_ab.matrix());
    log::debug!("H_AC: {:?}", h_ac.matrix());

    let f_ab = find_fundamental(&ab, &config.fundamental, config.strict_fundamental, rng)?.model;
    let f_cb = find_fundamental(&cb, &config.fundamental, config.strict_fundamental, rng)?.model;
    log::debug!("F_AB: {:?}", f_ab.matrix());
    log::debug!("F_CB: {:?}", f_cb.matrix());

    let transfer_b = transfer(&h_ab, &query.point_a)?;
    let (point_c, point_c_provenance) = match query.observed_c {
        Some(p) => (p, Provenance::Observed),
        None => {
            let p = transfer(&h_ac, &query.point_a)?;
            log::warn!(
                "C-side point ({:.2}, {:.2}) is predicted by H_AC, not observed; \
                 the cross-view error inherits the homography error",
                p.x,
                p.y
            );
            (p, Provenance::Projected)
        }
    };

    let line_from_a = epiline(&query.point_a, &f_ab, View::Left)?;
    let line_from_c = epiline(&point_c, &f_cb, View::Left)?;
    let check = check_consistency(&line_from_a, &line_from_c, query.observed_b)?;

    Ok(ThreeViewReport {
        h_ab,
        h_ac,
        f_ab,
        f_cb,
        transfer_b,
        point_c,
        point_c_provenance,
        line_from_a,
        line_from_c,
        check,
        epipolar_error_b: query.observed_b.map(|p| line_from_a.distance(&p)),
        transfer_error_b: query.observed_b.map(|p| p.distance(&transfer_b)),
    })
}
