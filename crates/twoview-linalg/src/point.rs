use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2d {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2d {
    /// Create a new point from its coordinates.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Homogeneous representation `[x, y, 1]`.
    #[inline]
    pub fn to_homogeneous(&self) -> [f64; 3] {
        [self.x, self.y, 1.0]
    }

    /// Dehomogenize a 3-vector.
    ///
    /// Returns `None` for points at (or numerically close to) infinity.
    pub fn from_homogeneous(p: &[f64; 3]) -> Option<Self> {
        if p[2].abs() < 1e-12 {
            return None;
        }
        Some(Self::new(p[0] / p[2], p[1] / p[2]))
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2d) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point2d {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Point2d> for [f64; 2] {
    fn from(p: Point2d) -> Self {
        [p.x, p.y]
    }
}

/// Error returned when a point cannot be parsed from text.
#[derive(Debug, thiserror::Error)]
#[error("invalid point '{0}', expected 'x,y'")]
pub struct ParsePointError(String);

impl FromStr for Point2d {
    type Err = ParsePointError;

    /// Parse a point written as `x,y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ParsePointError(s.to_string()))?;
        let x = x
            .trim()
            .parse::<f64>()
            .map_err(|_| ParsePointError(s.to_string()))?;
        let y = y
            .trim()
            .parse::<f64>()
            .map_err(|_| ParsePointError(s.to_string()))?;
        Ok(Self::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_homogeneous_roundtrip() {
        let p = Point2d::new(3.0, -4.5);
        let h = p.to_homogeneous();
        assert_eq!(h, [3.0, -4.5, 1.0]);
        let scaled = [h[0] * 2.0, h[1] * 2.0, h[2] * 2.0];
        assert_eq!(Point2d::from_homogeneous(&scaled), Some(p));
        assert_eq!(Point2d::from_homogeneous(&[1.0, 1.0, 0.0]), None);
    }

    #[test]
    fn test_distance() {
        let a = Point2d::new(0.0, 0.0);
        let b = Point2d::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_parse() -> Result<(), ParsePointError> {
        let p: Point2d = "12.5, -3".parse()?;
        assert_eq!(p, Point2d::new(12.5, -3.0));
        assert!("12.5".parse::<Point2d>().is_err());
        assert!("a,b".parse::<Point2d>().is_err());
        Ok(())
    }
}
