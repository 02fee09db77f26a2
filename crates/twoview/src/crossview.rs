use serde::{Deserialize, Serialize};
use twoview_linalg::{solve::solve_2x2, Point2d};

use crate::epipolar::EpipolarLine;
use crate::error::TwoViewError;

/// Lines whose unit normals span a parallelogram smaller than this are parallel.
const PARALLEL_EPS: f64 = 1e-9;

/// Intersect two epipolar lines of the same image.
///
/// Solves `[[a1, b1], [a2, b2]] [x, y]^T = [-c1, -c2]^T`.
///
/// # Errors
///
/// [`TwoViewError::ParallelLines`] when the lines are parallel or coincident.
pub fn intersect_lines(l1: &EpipolarLine, l2: &EpipolarLine) -> Result<Point2d, TwoViewError> {
    let [a1, b1, c1] = l1.coeffs();
    let [a2, b2, c2] = l2.coeffs();
    solve_2x2(&[[a1, b1], [a2, b2]], &[-c1, -c2], PARALLEL_EPS)
        .map(Point2d::from)
        .map_err(|det| TwoViewError::ParallelLines { det })
}

/// Outcome of a cross-view consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossViewCheck {
    /// Intersection of the two epipolar lines.
    pub intersection: Point2d,
    /// The observed point the intersection is compared with, if any.
    pub observed: Option<Point2d>,
    /// Euclidean distance in pixels between intersection and observed point.
    pub error: Option<f64>,
}

/// Intersect two epipolar lines predicted to pass through the same point and
/// compare the intersection with an observed point.
///
/// The error is a validation metric: the observed point is itself a
/// measurement and not a ground-truth oracle.
pub fn check_consistency(
    l1: &EpipolarLine,
    l2: &EpipolarLine,
    observed: Option<Point2d>,
) -> Result<CrossViewCheck, TwoViewError> {
    let intersection = intersect_lines(l1, l2)?;
    Ok(CrossViewCheck {
        intersection,
        observed,
        error: observed.map(|p| p.distance(&intersection)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epipolar::View;
    use approx::assert_relative_eq;

    fn line(a: f64, b: f64, c: f64) -> EpipolarLine {
        EpipolarLine::from_coeffs([a, b, c], Point2d::default(), View::Left).unwrap()
    }

    #[test]
    fn test_intersect_known_point() {
        // both lines pass through (120, -35)
        let p = Point2d::new(120.0, -35.0);
        let l1 = line(1.0, 2.0, -(p.x + 2.0 * p.y));
        let l2 = line(-3.0, 0.5, -(-3.0 * p.x + 0.5 * p.y));
        let x = intersect_lines(&l1, &l2).unwrap();
        assert_relative_eq!(x.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(x.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn test_intersect_parallel() {
        let l1 = line(1.0, -1.0, 0.0);
        let l2 = line(2.0, -2.0, 10.0);
        assert!(matches!(
            intersect_lines(&l1, &l2),
            Err(TwoViewError::ParallelLines { .. })
        ));
        // coincident
        assert!(matches!(
            intersect_lines(&l1, &l1),
            Err(TwoViewError::ParallelLines { .. })
        ));
    }

    #[test]
    fn test_check_consistency_error() {
        let l1 = line(1.0, 0.0, -10.0);
        let l2 = line(0.0, 1.0, -20.0);
        let check = check_consistency(&l1, &l2, Some(Point2d::new(13.0, 24.0))).unwrap();
        assert_relative_eq!(check.intersection.x, 10.0);
        assert_relative_eq!(check.intersection.y, 20.0);
        assert_relative_eq!(check.error.unwrap(), 5.0);

        let check = check_consistency(&l1, &l2, None).unwrap();
        assert!(check.error.is_none());
    }
}
