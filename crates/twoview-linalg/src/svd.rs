//! SVD helpers for the linear solvers.
//!
//! faer returns singular values in nonincreasing order, so the right singular
//! vector of the last column spans the (approximate) null space.

use crate::mat33::Mat33;

/// Null vector of a linear system `A x = 0` in the total least squares sense.
#[derive(Debug, Clone)]
pub struct NullVector {
    /// Unit-norm right singular vector of the smallest singular value.
    pub vector: Vec<f64>,
    /// Singular values in nonincreasing order, padded with zeros up to the
    /// number of columns when the system is underdetermined.
    pub singular_values: Vec<f64>,
}

impl NullVector {
    /// Whether the coefficient matrix has numerical rank below `rank`.
    ///
    /// The `rank`-th singular value is compared with `tol` times the largest.
    pub fn is_rank_deficient(&self, rank: usize, tol: f64) -> bool {
        let largest = self.singular_values.first().copied().unwrap_or(0.0);
        match self.singular_values.get(rank.saturating_sub(1)) {
            Some(s) => largest == 0.0 || *s <= tol * largest,
            None => true,
        }
    }

    /// Ratio between the smallest and second smallest singular values.
    ///
    /// Values close to one mean the null space is not well separated.
    pub fn null_space_gap(&self) -> f64 {
        let n = self.singular_values.len();
        if n < 2 {
            return 1.0;
        }
        let (second, last) = (self.singular_values[n - 2], self.singular_values[n - 1]);
        if second == 0.0 {
            return 1.0;
        }
        last / second
    }
}

/// Solve `A x = 0` for the unit vector minimizing `||A x||`.
///
/// # Arguments
///
/// * `a` - The coefficient matrix with shape (N, M).
///
/// # Returns
///
/// The right singular vector associated with the smallest singular value and
/// the full list of singular values.
pub fn null_vector(a: &faer::Mat<f64>) -> NullVector {
    let ncols = a.ncols();
    let svd = a.svd();

    let v = svd.v();
    let vector = (0..ncols).map(|i| v.read(i, ncols - 1)).collect();

    let s = svd.s_diagonal();
    let mut singular_values = (0..s.nrows()).map(|i| s.read(i)).collect::<Vec<_>>();
    singular_values.resize(ncols, 0.0);

    NullVector {
        vector,
        singular_values,
    }
}

/// Singular value decomposition of a 3x3 matrix, `m = U diag(s) V^T`.
#[derive(Debug, Clone)]
pub struct Svd3 {
    /// Left singular vectors (as columns).
    pub u: Mat33,
    /// Singular values in nonincreasing order.
    pub s: [f64; 3],
    /// Right singular vectors (as columns).
    pub v: Mat33,
}

impl Svd3 {
    /// Recompose `U diag(s) V^T` with the given singular values.
    pub fn compose(&self, s: &[f64; 3]) -> Mat33 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val = (0..3).map(|k| self.u[i][k] * s[k] * self.v[j][k]).sum();
            }
        }
        out
    }
}

/// Compute the SVD of a 3x3 matrix in double precision.
pub fn svd3(m: &Mat33) -> Svd3 {
    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| m[i][j]);
    let svd = mat.svd();

    let (u, v, s) = (svd.u(), svd.v(), svd.s_diagonal());

    let mut out = Svd3 {
        u: [[0.0; 3]; 3],
        s: [0.0; 3],
        v: [[0.0; 3]; 3],
    };
    for i in 0..3 {
        out.s[i] = s.read(i);
        for j in 0..3 {
            out.u[i][j] = u.read(i, j);
            out.v[i][j] = v.read(i, j);
        }
    }
    out
}

/// Project a 3x3 matrix onto the closest rank-2 matrix in Frobenius norm.
///
/// The smallest singular value is set to zero.
pub fn enforce_rank2(m: &Mat33) -> Mat33 {
    let svd = svd3(m);
    svd.compose(&[svd.s[0], svd.s[1], 0.0])
}
