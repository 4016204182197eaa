//! Dense linear algebra for small least-squares fits
//!
//! Matrices are row-major `Vec<Vec<f64>>`. Sizes here are tiny (one column
//! per feature plus an intercept), so clarity wins over blocking tricks.

/// Maximum Jacobi sweeps before giving up on further off-diagonal decay
const MAX_SWEEPS: usize = 100;

/// Eigenvalues at or below `RELATIVE_CUTOFF * max |eigenvalue|` are treated as zero
///
/// Must stay tight: minute totals and unit ratios share one Gram matrix.
const RELATIVE_CUTOFF: f64 = 1e-15;

pub type Matrix = Vec<Vec<f64>>;

pub fn identity(n: usize) -> Matrix {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// `XᵀX` for a row-major design matrix
pub fn gram(x: &[Vec<f64>]) -> Matrix {
    let cols = x.first().map_or(0, Vec::len);
    let mut out = vec![vec![0.0; cols]; cols];
    for row in x {
        for i in 0..cols {
            for j in i..cols {
                out[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..cols {
        for j in 0..i {
            out[i][j] = out[j][i];
        }
    }
    out
}

/// `Xᵀy`
pub fn transpose_mul_vec(x: &[Vec<f64>], y: &[f64]) -> Vec<f64> {
    let cols = x.first().map_or(0, Vec::len);
    let mut out = vec![0.0; cols];
    for (row, target) in x.iter().zip(y) {
        for (acc, value) in out.iter_mut().zip(row) {
            *acc += value * target;
        }
    }
    out
}

pub fn mul_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter()
        .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
        .collect()
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations
///
/// Returns `(eigenvalues, eigenvectors)` where column `k` of the second
/// matrix is the eigenvector for eigenvalue `k`.
pub fn symmetric_eigen(m: &[Vec<f64>]) -> (Vec<f64>, Matrix) {
    let n = m.len();
    let mut a: Matrix = m.to_vec();
    let mut v = identity(n);

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().sqrt();
    if scale == 0.0 {
        return (vec![0.0; n], v);
    }

    for _ in 0..MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum::<f64>()
            .sqrt();
        if off_diagonal <= f64::EPSILON * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() <= f64::MIN_POSITIVE {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

/// Moore-Penrose pseudo-inverse of a symmetric positive semi-definite matrix
///
/// Directions with (near-)zero eigenvalues, such as those produced by
/// constant or collinear feature columns, are dropped instead of inverted.
pub fn symmetric_pseudo_inverse(m: &[Vec<f64>]) -> Matrix {
    let n = m.len();
    let (eigenvalues, vectors) = symmetric_eigen(m);

    let largest = eigenvalues.iter().fold(0.0_f64, |acc, l| acc.max(l.abs()));
    let cutoff = largest * RELATIVE_CUTOFF;

    let mut out = vec![vec![0.0; n]; n];
    for (k, lambda) in eigenvalues.iter().enumerate() {
        if *lambda <= cutoff || *lambda <= 0.0 {
            continue;
        }
        let inv = 1.0 / lambda;
        for i in 0..n {
            for j in 0..n {
                out[i][j] += vectors[i][k] * inv * vectors[j][k];
            }
        }
    }
    out
}

/// Minimum-norm least-squares solution of `X w ≈ y` via `pinv(XᵀX) Xᵀy`
pub fn least_squares(x: &[Vec<f64>], y: &[f64]) -> Vec<f64> {
    let pinv = symmetric_pseudo_inverse(&gram(x));
    mul_vec(&pinv, &transpose_mul_vec(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-8, "{} != {}", a, b);
    }

    #[test]
    fn test_eigen_of_diagonal() {
        let (values, _) = symmetric_eigen(&[vec![3.0, 0.0], vec![0.0, 1.0]]);
        assert_close(values[0], 3.0);
        assert_close(values[1], 1.0);
    }

    #[test]
    fn test_eigen_reconstructs_matrix() {
        let m = vec![
            vec![4.0, 1.0, 2.0],
            vec![1.0, 3.0, 0.5],
            vec![2.0, 0.5, 5.0],
        ];
        let (values, vectors) = symmetric_eigen(&m);
        for i in 0..3 {
            for j in 0..3 {
                let rebuilt: f64 = (0..3).map(|k| vectors[i][k] * values[k] * vectors[j][k]).sum();
                assert_close(rebuilt, m[i][j]);
            }
        }
    }

    #[test]
    fn test_pseudo_inverse_of_invertible_matrix() {
        let m = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let inv = symmetric_pseudo_inverse(&m);
        // inverse is 1/3 * [[2, -1], [-1, 2]]
        assert_close(inv[0][0], 2.0 / 3.0);
        assert_close(inv[0][1], -1.0 / 3.0);
        assert_close(inv[1][1], 2.0 / 3.0);
    }

    #[test]
    fn test_pseudo_inverse_of_singular_matrix() {
        // rank one: [[1, 1], [1, 1]] has pseudo-inverse [[0.25, 0.25], [0.25, 0.25]]
        let inv = symmetric_pseudo_inverse(&[vec![1.0, 1.0], vec![1.0, 1.0]]);
        for row in &inv {
            for value in row {
                assert_close(*value, 0.25);
            }
        }
    }

    #[test]
    fn test_zero_matrix() {
        let inv = symmetric_pseudo_inverse(&[vec![0.0, 0.0], vec![0.0, 0.0]]);
        assert_eq!(inv, vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_least_squares_exact_line() {
        // y = 2 + 3x with an intercept column
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..5).map(|i| 2.0 + 3.0 * i as f64).collect();

        let w = least_squares(&x, &y);
        assert_close(w[0], 2.0);
        assert_close(w[1], 3.0);
    }

    #[test]
    fn test_least_squares_constant_column() {
        // A constant feature is collinear with the intercept; the fit must
        // still reproduce the targets.
        let x: Vec<Vec<f64>> = (0..4).map(|i| vec![1.0, 5.0, i as f64]).collect();
        let y: Vec<f64> = (0..4).map(|i| 10.0 + i as f64).collect();

        let w = least_squares(&x, &y);
        for (row, target) in x.iter().zip(&y) {
            let fitted: f64 = row.iter().zip(&w).map(|(a, b)| a * b).sum();
            assert_close(fitted, *target);
        }
    }
}
