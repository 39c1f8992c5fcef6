use nalgebra::{DMatrix, DVector};

use super::SignalError;

const PIVOT_EPS: f64 = 1e-300;

// ---------------------------------------------------------------------------
// Band matrix solver (no pivoting)
// ---------------------------------------------------------------------------

/// Square band matrix stored row by row, `kl` sub- and `ku` super-diagonals.
///
/// Solved without row exchanges, which is stable for the totally positive
/// B-spline collocation matrices and for symmetric positive definite systems.
#[derive(Debug, Clone)]
pub(crate) struct BandMatrix {
    n: usize,
    kl: usize,
    ku: usize,
    data: Vec<f64>,
}

impl BandMatrix {
    pub(crate) fn zeros(n: usize, kl: usize, ku: usize) -> Self {
        Self {
            n,
            kl,
            ku,
            data: vec![0.0; n * (kl + ku + 1)],
        }
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(j + self.kl >= i && j <= i + self.ku, "({i}, {j}) outside band");
        i * (self.kl + self.ku + 1) + (j + self.kl - i)
    }

    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.offset(i, j)]
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64) {
        let at = self.offset(i, j);
        self.data[at] = value;
    }

    pub(crate) fn add(&mut self, i: usize, j: usize, value: f64) {
        let at = self.offset(i, j);
        self.data[at] += value;
    }

    /// Solve `A x = rhs`, consuming the matrix. `rhs` is overwritten with `x`.
    pub(crate) fn solve(mut self, rhs: &mut [f64], what: &'static str) -> Result<(), SignalError> {
        let n = self.n;
        debug_assert_eq!(rhs.len(), n);

        for c in 0..n {
            let pivot = self.get(c, c);
            if pivot.abs() < PIVOT_EPS || !pivot.is_finite() {
                return Err(SignalError::Singular(what));
            }
            let last_row = (c + self.kl).min(n - 1);
            let last_col = (c + self.ku).min(n - 1);
            for r in c + 1..=last_row {
                let factor = self.get(r, c) / pivot;
                if factor == 0.0 {
                    continue;
                }
                for j in c..=last_col {
                    let v = self.get(c, j);
                    self.add(r, j, -factor * v);
                }
                rhs[r] -= factor * rhs[c];
            }
        }

        for c in (0..n).rev() {
            let last_col = (c + self.ku).min(n - 1);
            let mut acc = rhs[c];
            for j in c + 1..=last_col {
                acc -= self.get(c, j) * rhs[j];
            }
            rhs[c] = acc / self.get(c, c);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Small dense solver
// ---------------------------------------------------------------------------

/// Solve a small dense system with nalgebra's partially pivoted LU.
pub(crate) fn solve_dense(
    a: DMatrix<f64>,
    rhs: Vec<f64>,
    what: &'static str,
) -> Result<Vec<f64>, SignalError> {
    let b = DVector::from_vec(rhs);
    match a.lu().solve(&b) {
        Some(x) if x.iter().all(|v| v.is_finite()) => Ok(x.iter().copied().collect()),
        _ => Err(SignalError::Singular(what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tridiagonal_system() {
        // [2 1 0; 1 3 1; 0 1 2] x = [3 5 3] → x = [1 1 1]
        let mut m = BandMatrix::zeros(3, 1, 1);
        for i in 0..3 {
            m.set(i, i, if i == 1 { 3.0 } else { 2.0 });
        }
        for i in 0..2 {
            m.set(i, i + 1, 1.0);
            m.set(i + 1, i, 1.0);
        }
        let mut rhs = vec![3.0, 5.0, 3.0];
        m.solve(&mut rhs, "test").unwrap();
        for v in rhs {
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn dense_needs_pivoting() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 1.0]);
        let x = solve_dense(a, vec![2.0, 3.0], "test").unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn singular_dense_is_an_error() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(
            solve_dense(a, vec![1.0, 2.0], "test"),
            Err(SignalError::Singular("test"))
        );
    }
}
