//! # LU Module
//!
//! In-place LU decomposition with row pivoting, `P*A = L*U`.
//!
//! On return the strictly lower part of the first `rank` columns holds `L`
//! (unit diagonal implied), the rest holds `U`, and row `i` of `P*A` is row
//! `perm[i]` of the input. Rows at or below `rank` are zero from the
//! `rank`-th pivot column on.
//!
//! With `rank_check` set the decomposition stops at the first column
//! without a pivot and reports rank 0; callers that need full rank use it to
//! bail out early.

mod classical;
mod delayed;
mod recursive;

use crate::config::MatContext;
use crate::errors::NmodMatError;
use crate::matrix::MatMut;

/// Decomposes `a` in place and returns its rank.
///
/// # Errors
///
/// Returns `NmodMatError::NoInverse` when a column holds nonzero entries but
/// none of them is a unit, which only happens for composite moduli.
///
/// # Panics
///
/// Panics if `perm.len() != a.rows()`.
///
/// # Example
///
/// ```
/// # use nmod_mat::{MatContext, ModRing, NmodMat};
/// let ring = ModRing::try_with(7).unwrap();
/// let mut a = NmodMat::from_rows(&[vec![0, 2], vec![3, 1]], ring).unwrap();
/// let mut perm = vec![0; 2];
/// let rank = nmod_mat::lu::lu(&MatContext::default(), &mut perm, a.view_mut(), false).unwrap();
/// assert_eq!(rank, 2);
/// assert_eq!(perm, vec![1, 0]);
/// assert_eq!(a.row(0), &[3, 1]);
/// ```
pub fn lu(
    ctx: &MatContext,
    perm: &mut [usize],
    a: MatMut<'_>,
    rank_check: bool,
) -> Result<usize, NmodMatError> {
    assert_eq!(perm.len(), a.rows(), "permutation length must match rows");
    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }

    let ring = a.ring();
    if a.is_empty() || ring.is_trivial() {
        return Ok(0);
    }

    let tuning = ctx.tuning();
    let (rows, cols) = (a.rows(), a.cols());
    if rows < 4 || cols < tuning.lu_recursive_cutoff {
        if ring.bits() <= tuning.lu_delayed_max_bits && rows > 1 {
            tracing::trace!(rows, cols, "delayed-reduction LU");
            delayed::lu(perm, a, rank_check)
        } else {
            tracing::trace!(rows, cols, "classical LU");
            classical::lu(perm, a, rank_check)
        }
    } else {
        tracing::trace!(rows, cols, "recursive LU");
        recursive::lu(ctx, perm, a, rank_check)
    }
}

/// `perm[i] <- perm[p[i]]`, composing a sub-permutation onto a suffix.
fn compose(perm: &mut [usize], p: &[usize]) {
    let old = perm.to_vec();
    for (dst, &src) in perm.iter_mut().zip(p) {
        *dst = old[src];
    }
}
