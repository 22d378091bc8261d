//! # Solve Module
//!
//! Linear systems on top of LU: square nonsingular systems, general
//! (possibly inconsistent) systems, and inverses.
//!
//! Failures that come from the mathematics rather than from the caller are
//! returned as errors, and the output is zeroed first so nothing
//! half-computed is left behind.

pub mod tri;

pub use tri::{solve_tril, solve_tril_in_place, solve_triu, solve_triu_in_place};

use crate::config::MatContext;
use crate::errors::NmodMatError;
use crate::lu::lu;
use crate::matrix::{MatMut, MatRef, NmodMat};
use crate::mul::submul;

/// Zeroes `x` when `result` is an error.
fn zero_on_error<T>(mut x: MatMut<'_>, result: Result<T, NmodMatError>) -> Result<T, NmodMatError> {
    if result.is_err() {
        x.fill_zero();
    }
    result
}

/// Solves `A*X = B` for a square `A`.
///
/// # Errors
///
/// Returns `NmodMatError::Singular` if `A` is not of full rank and
/// `NmodMatError::NoInverse` if elimination over a composite modulus meets
/// a column without a unit pivot. `x` is zeroed in both cases.
///
/// # Example
///
/// ```
/// # use nmod_mat::{MatContext, ModRing, NmodMat};
/// let ring = ModRing::try_with(7).unwrap();
/// let a = NmodMat::from_rows(&[vec![2, 1], vec![1, 1]], ring).unwrap();
/// let b = NmodMat::from_rows(&[vec![3], vec![2]], ring).unwrap();
/// let mut x = NmodMat::new(2, 1, ring);
/// nmod_mat::solve::solve(&MatContext::default(), x.view_mut(), a.view(), b.view()).unwrap();
/// assert_eq!(x.entries(), &[1, 1]);
/// ```
pub fn solve(ctx: &MatContext, mut x: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) -> Result<(), NmodMatError> {
    assert!(a.is_square(), "solve needs a square matrix, got {}x{}", a.rows(), a.cols());
    assert_eq!(a.rows(), b.rows(), "right-hand side has the wrong number of rows");
    assert!(
        x.rows() == b.rows() && x.cols() == b.cols(),
        "solution shape must match the right-hand side"
    );
    assert!(a.ring() == b.ring() && b.ring() == x.ring(), "operands over different moduli");

    let n = a.rows();
    if n == 0 || b.cols() == 0 {
        return Ok(());
    }
    if a.ring().is_trivial() {
        x.fill_zero();
        return Ok(());
    }

    let mut packed = a.to_mat();
    let mut perm = vec![0; n];
    let rank = lu(ctx, &mut perm, packed.view_mut(), true);
    let result = rank.and_then(|rank| {
        if rank < n {
            return Err(NmodMatError::Singular);
        }
        for (i, &p) in perm.iter().enumerate() {
            x.row_mut(i).copy_from_slice(b.row(p));
        }
        solve_tril_in_place(ctx, packed.view(), x.rb_mut(), true)?;
        solve_triu_in_place(ctx, packed.view(), x.rb_mut(), false)
    });
    zero_on_error(x, result)
}

/// Solves `A*X = B` for any `m x k` matrix `A`, returning one solution.
///
/// # Errors
///
/// Returns `NmodMatError::Inconsistent` if no solution exists, and
/// `NmodMatError::NoInverse` as [`solve`] does. `x` is zeroed in both cases.
pub fn can_solve(ctx: &MatContext, mut x: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) -> Result<(), NmodMatError> {
    assert_eq!(a.rows(), b.rows(), "right-hand side has the wrong number of rows");
    assert!(
        x.rows() == a.cols() && x.cols() == b.cols(),
        "solution must be {}x{}",
        a.cols(),
        b.cols()
    );
    assert!(a.ring() == b.ring() && b.ring() == x.ring(), "operands over different moduli");

    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let ring = a.ring();
    x.fill_zero();
    if m == 0 || n == 0 || ring.is_trivial() {
        return Ok(());
    }
    if k == 0 {
        return if b.is_zero() { Ok(()) } else { Err(NmodMatError::Inconsistent) };
    }

    let mut packed = a.to_mat();
    let mut perm = vec![0; m];
    let result = lu(ctx, &mut perm, packed.view_mut(), false).and_then(|rank| {
        let mut pb = NmodMat::new(m, n, ring);
        for (i, &p) in perm.iter().enumerate() {
            pb.row_mut(i).copy_from_slice(b.row(p));
        }

        let mut y = pb.window(0, 0, rank, n).to_mat();
        solve_tril_in_place(ctx, packed.window(0, 0, rank, rank), y.view_mut(), true)?;

        if rank < m {
            // the rows of P*B below the pivots must follow from the ones above
            let mut residual = pb.window(rank, 0, m, n).to_mat();
            submul(ctx, residual.view_mut(), packed.window(rank, 0, m, rank), y.view());
            if !residual.is_zero() {
                return Err(NmodMatError::Inconsistent);
            }
        }

        let pivots = pivot_columns(packed.view(), rank);
        let mut u = NmodMat::new(rank, rank, ring);
        for (i, &p) in pivots.iter().enumerate() {
            for j in 0..=i {
                u.set(j, i, packed.get(j, p));
            }
        }
        solve_triu_in_place(ctx, u.view(), y.view_mut(), false)?;

        for (i, &p) in pivots.iter().enumerate() {
            x.row_mut(p).copy_from_slice(y.row(i));
        }
        Ok(())
    });
    zero_on_error(x, result)
}

/// Column of the leading entry of each of the first `rank` rows of a packed
/// LU or row echelon form.
pub(crate) fn pivot_columns(a: MatRef<'_>, rank: usize) -> Vec<usize> {
    let mut pivots = Vec::with_capacity(rank);
    let mut col = 0;
    for i in 0..rank {
        while a.get(i, col) == 0 {
            col += 1;
        }
        pivots.push(col);
        col += 1;
    }
    pivots
}

/// Sets `b` to the inverse of the square matrix `a`.
///
/// # Errors
///
/// Returns `NmodMatError::Singular` if `a` is not invertible; see [`solve`].
pub fn inv(ctx: &MatContext, mut b: MatMut<'_>, a: MatRef<'_>) -> Result<(), NmodMatError> {
    assert!(a.is_square(), "inverse of a non-square {}x{} matrix", a.rows(), a.cols());
    assert!(b.rows() == a.rows() && b.cols() == a.cols(), "output shape must match");
    assert_eq!(a.ring(), b.ring(), "operands over different moduli");

    let ring = a.ring();
    match a.rows() {
        0 => Ok(()),
        1 => match ring.inv(a.get(0, 0)) {
            Ok(v) => {
                b.set(0, 0, v);
                Ok(())
            }
            Err(_) => {
                b.fill_zero();
                Err(NmodMatError::Singular)
            }
        },
        n => solve(ctx, b, a, NmodMat::identity(n, ring).view()),
    }
}

impl NmodMat {
    /// # Errors
    ///
    /// See [`solve`].
    pub fn solve(&self, ctx: &MatContext, b: &NmodMat) -> Result<NmodMat, NmodMatError> {
        let mut x = NmodMat::new(b.rows(), b.cols(), b.ring());
        solve(ctx, x.view_mut(), self.view(), b.view())?;
        Ok(x)
    }

    /// Solves `self * x = b` for a single vector.
    ///
    /// # Errors
    ///
    /// See [`solve`].
    pub fn solve_vec(&self, ctx: &MatContext, b: &[u64]) -> Result<Vec<u64>, NmodMatError> {
        let rhs = NmodMat::from_entries(b.len(), 1, b.to_vec(), self.ring())?;
        Ok(self.solve(ctx, &rhs)?.entries().to_vec())
    }

    /// # Errors
    ///
    /// See [`can_solve`].
    pub fn can_solve(&self, ctx: &MatContext, b: &NmodMat) -> Result<NmodMat, NmodMatError> {
        let mut x = NmodMat::new(self.cols(), b.cols(), self.ring());
        can_solve(ctx, x.view_mut(), self.view(), b.view())?;
        Ok(x)
    }

    /// # Errors
    ///
    /// See [`inv`].
    pub fn inv(&self, ctx: &MatContext) -> Result<NmodMat, NmodMatError> {
        let mut b = NmodMat::new(self.rows(), self.cols(), self.ring());
        inv(ctx, b.view_mut(), self.view())?;
        Ok(b)
    }

    /// Replaces `self` by its inverse; on error `self` is zeroed.
    ///
    /// # Errors
    ///
    /// See [`inv`].
    pub fn inv_in_place(&mut self, ctx: &MatContext) -> Result<(), NmodMatError> {
        let a = self.clone();
        inv(ctx, self.view_mut(), a.view())
    }
}
