// Dense least squares via Householder QR
//
// Matrices are small (observations × a handful of regressors) and use
// aprender's row-major `Matrix` for storage; its solvers are f32-only, so
// the f64 factorization lives here. Columns are scaled to unit norm before factoring so
// that the rank test compares like with like: N² and a constant column can
// differ by twelve orders of magnitude without being collinear.

pub use aprender::primitives::Matrix;

/// Design matrix with one column per regressor
///
/// Fails with [`SolveError::ShapeMismatch`] when the columns differ in length.
pub fn design_matrix(columns: &[&[f64]]) -> Result<Matrix<f64>, SolveError> {
    let rows = columns.first().map_or(0, |c| c.len());
    if columns.iter().any(|c| c.len() != rows) {
        return Err(SolveError::ShapeMismatch);
    }
    let data = (0..rows)
        .flat_map(move |i| columns.iter().map(move |column| column[i]))
        .collect();
    Matrix::from_vec(rows, columns.len(), data).map_err(|_| SolveError::ShapeMismatch)
}

/// Matrix-vector product `a · x`
pub fn mul_vec(a: &Matrix<f64>, x: &[f64]) -> Vec<f64> {
    let (rows, cols) = a.shape();
    a.as_slice()
        .chunks(cols.max(1))
        .take(rows)
        .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
        .collect()
}

/// Column `j` of `a`, top to bottom
pub fn column(a: &Matrix<f64>, j: usize) -> impl Iterator<Item = f64> + '_ {
    (0..a.n_rows()).map(move |i| a.get(i, j))
}

/// Least-squares solution of `A x ≈ b`
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquares {
    pub coefficients: Vec<f64>,
    /// Diagonal of (AᵀA)⁻¹, the per-coefficient variance before scaling by σ²
    pub unscaled_variances: Vec<f64>,
}

/// Why a least-squares solve produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    /// Fewer rows than columns, or no columns at all
    Underdetermined,
    /// Columns are linearly dependent within tolerance
    RankDeficient,
    /// Columns or target disagree in length
    ShapeMismatch,
}

/// Solve `min ‖A x − b‖₂` by Householder QR
///
/// A column whose remaining component after orthogonalizing against the
/// previous ones is at most `rank_tolerance` (relative to its own norm) is
/// treated as dependent.
pub fn least_squares(
    a: &Matrix<f64>,
    b: &[f64],
    rank_tolerance: f64,
) -> Result<LeastSquares, SolveError> {
    let (m, n) = a.shape();
    if b.len() != m {
        return Err(SolveError::ShapeMismatch);
    }
    if n == 0 || m < n {
        return Err(SolveError::Underdetermined);
    }

    // Column-major working copy, each column normalized
    let mut scale = vec![0.0; n];
    let mut work: Vec<Vec<f64>> = Vec::with_capacity(n);
    for (j, s) in scale.iter_mut().enumerate() {
        let column: Vec<f64> = column(a, j).collect();
        let norm = column.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(SolveError::RankDeficient);
        }
        *s = norm;
        work.push(column.into_iter().map(|v| v / norm).collect());
    }
    let mut y = b.to_vec();
    let mut diag = vec![0.0; n];

    for k in 0..n {
        let norm = work[k][k..].iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm <= rank_tolerance {
            return Err(SolveError::RankDeficient);
        }
        let alpha = if work[k][k] > 0.0 { -norm } else { norm };

        // v = x - alpha·e_k, stored in place of the column's tail
        let mut v = work[k][k..].to_vec();
        v[0] -= alpha;
        let vnorm2: f64 = v.iter().map(|x| x * x).sum();
        diag[k] = alpha;

        if vnorm2 > 0.0 {
            for column in work.iter_mut().skip(k + 1) {
                reflect(&v, vnorm2, &mut column[k..]);
            }
            reflect(&v, vnorm2, &mut y[k..]);
        }
    }

    // Back substitution: R x = Qᵀb
    let r = |i: usize, j: usize| if i == j { diag[i] } else { work[j][i] };
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| r(i, j) * x[j]).sum();
        x[i] = (y[i] - tail) / r(i, i);
    }

    // R⁻¹ row by row from the bottom; (AᵀA)⁻¹ = R⁻¹R⁻ᵀ so its diagonal is
    // the squared row norms of R⁻¹
    let mut r_inv = vec![vec![0.0; n]; n];
    for j in 0..n {
        r_inv[j][j] = 1.0 / r(j, j);
        for i in (0..j).rev() {
            let acc: f64 = ((i + 1)..=j).map(|l| r(i, l) * r_inv[l][j]).sum();
            r_inv[i][j] = -acc / r(i, i);
        }
    }

    let coefficients = x.iter().zip(&scale).map(|(xi, s)| xi / s).collect();
    let unscaled_variances = r_inv
        .iter()
        .zip(&scale)
        .map(|(row, s)| row.iter().map(|v| v * v).sum::<f64>() / (s * s))
        .collect();

    Ok(LeastSquares {
        coefficients,
        unscaled_variances,
    })
}

/// Apply H = I − 2vvᵀ/‖v‖² to `target`
fn reflect(v: &[f64], vnorm2: f64, target: &mut [f64]) {
    let dot: f64 = v.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    let factor = 2.0 * dot / vnorm2;
    for (t, vi) in target.iter_mut().zip(v) {
        *t -= factor * vi;
    }
}
