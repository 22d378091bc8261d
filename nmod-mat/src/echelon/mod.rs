//! # Echelon Module
//!
//! Rank, determinant, reduced row echelon form and nullspace, plus the
//! Howell form for composite moduli in [`howell`].

pub mod howell;

pub use howell::{howell_form, strong_echelon_form};

use crate::config::MatContext;
use crate::errors::NmodMatError;
use crate::lu::lu;
use crate::matrix::{MatMut, MatRef, NmodMat};
use crate::ring::{extended_gcd, is_prime};
use crate::solve::{pivot_columns, solve_triu_in_place};

/// Rank of `a`.
///
/// # Errors
///
/// Returns `NmodMatError::NoInverse` if elimination over a composite
/// modulus meets a column without a unit pivot.
pub fn rank(ctx: &MatContext, a: MatRef<'_>) -> Result<usize, NmodMatError> {
    let mut tmp = a.to_mat();
    let mut perm = vec![0; a.rows()];
    lu(ctx, &mut perm, tmp.view_mut(), false)
}

/// Determinant of a square matrix.
///
/// Prime moduli go through LU; other moduli use gcd row reduction, which
/// never needs an inverse.
///
/// # Example
///
/// ```
/// # use nmod_mat::{MatContext, ModRing, NmodMat};
/// let ring = ModRing::try_with(12).unwrap();
/// let a = NmodMat::from_rows(&[vec![2, 3, 0], vec![4, 1, 5], vec![0, 6, 7]], ring).unwrap();
/// // 2*(7 - 30) - 3*(28 - 0) = -130
/// assert_eq!(nmod_mat::echelon::det(&MatContext::default(), a.view()), 2);
/// ```
pub fn det(ctx: &MatContext, a: MatRef<'_>) -> u64 {
    assert!(a.is_square(), "determinant of a non-square {}x{} matrix", a.rows(), a.cols());
    let ring = a.ring();
    let n = a.rows();

    match n {
        0 => return ring.one(),
        1 => return a.get(0, 0),
        2 => {
            let (x, y) = (ring.mul(a.get(0, 0), a.get(1, 1)), ring.mul(a.get(0, 1), a.get(1, 0)));
            return ring.sub(x, y);
        }
        _ => {}
    }
    if !is_prime(ring.modulus()) {
        return det_rowreduce(a);
    }

    let mut tmp = a.to_mat();
    let mut perm = vec![0; n];
    let Ok(rank) = lu(ctx, &mut perm, tmp.view_mut(), true) else {
        return det_rowreduce(a);
    };
    if rank < n {
        return 0;
    }

    let d = (0..n).fold(ring.one(), |acc, i| ring.mul(acc, tmp.get(i, i)));
    if permutation_is_odd(&perm) { ring.neg(d) } else { d }
}

fn permutation_is_odd(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    let mut cycles = 0;
    for start in 0..perm.len() {
        if seen[start] {
            continue;
        }
        cycles += 1;
        let mut i = start;
        while !seen[i] {
            seen[i] = true;
            i = perm[i];
        }
    }
    (perm.len() - cycles) % 2 == 1
}

/// Determinant by unimodular row operations, valid for any modulus.
///
/// Each pair of rows is combined with the Bezout coefficients of their
/// entries in the current column, which moves the gcd into the pivot row
/// and clears the other entry without dividing.
pub fn det_rowreduce(a: MatRef<'_>) -> u64 {
    assert!(a.is_square(), "determinant of a non-square {}x{} matrix", a.rows(), a.cols());
    let ring = a.ring();
    let n = a.rows();
    let mut m = a.to_mat();
    let mut negate = false;

    for col in 0..n {
        for i in col + 1..n {
            let (x, y) = (m.get(col, col), m.get(i, col));
            if y == 0 {
                continue;
            }
            if x == 0 {
                m.swap_rows(col, i);
                negate = !negate;
                continue;
            }

            let (g, s, t) = extended_gcd(x, y);
            let (s, t) = (ring.from_i128(s), ring.from_i128(t));
            let (u, v) = (ring.neg(y / g), x / g);
            let mut view = m.view_mut();
            let (top, bottom) = view.row_pair_mut(col, i);
            for (p, q) in top[col..].iter_mut().zip(&mut bottom[col..]) {
                let (old_p, old_q) = (*p, *q);
                *p = ring.add(ring.mul(s, old_p), ring.mul(t, old_q));
                *q = ring.add(ring.mul(u, old_p), ring.mul(v, old_q));
            }
        }
        if m.get(col, col) == 0 {
            return 0;
        }
    }

    let d = (0..n).fold(ring.one(), |acc, i| ring.mul(acc, m.get(i, i)));
    if negate { ring.neg(d) } else { d }
}

/// Puts `a` into reduced row echelon form in place and returns its rank.
///
/// # Errors
///
/// See [`rank`].
pub fn rref(ctx: &MatContext, mut a: MatMut<'_>) -> Result<usize, NmodMatError> {
    let (m, n) = (a.rows(), a.cols());
    let ring = a.ring();
    let mut perm = vec![0; m];
    let rank = lu(ctx, &mut perm, a.rb_mut(), false)?;
    if rank == 0 {
        a.fill_zero();
        return Ok(0);
    }

    for i in 0..m {
        a.row_mut(i)[..rank.min(i)].fill(0);
    }

    let pivots = pivot_columns(a.rb(), rank);
    let nonpivots = complement(&pivots, n);

    // [U | V] with U the pivot columns; the form is [I | U^-1 V]
    let mut u = NmodMat::new(rank, rank, ring);
    for (i, &p) in pivots.iter().enumerate() {
        for j in 0..=i {
            u.set(j, i, a.get(j, p));
        }
    }
    let mut v = NmodMat::new(rank, nonpivots.len(), ring);
    for (i, &q) in nonpivots.iter().enumerate() {
        for j in 0..rank {
            v.set(j, i, a.get(j, q));
        }
    }
    solve_triu_in_place(ctx, u.view(), v.view_mut(), false)?;

    let one = ring.one();
    for (i, &p) in pivots.iter().enumerate() {
        for j in 0..=i {
            a.row_mut(j)[p] = if i == j { one } else { 0 };
        }
    }
    for (i, &q) in nonpivots.iter().enumerate() {
        for j in 0..rank {
            a.row_mut(j)[q] = v.get(j, i);
        }
    }
    Ok(rank)
}

fn complement(pivots: &[usize], n: usize) -> Vec<usize> {
    let mut is_pivot = vec![false; n];
    for &p in pivots {
        is_pivot[p] = true;
    }
    (0..n).filter(|&j| !is_pivot[j]).collect()
}

/// A basis of the right nullspace of `a`, one vector per column; the
/// number of columns is the nullity `cols - rank`.
///
/// # Errors
///
/// See [`rank`].
pub fn nullspace(ctx: &MatContext, a: MatRef<'_>) -> Result<NmodMat, NmodMatError> {
    let n = a.cols();
    let ring = a.ring();
    let mut reduced = a.to_mat();
    let rank = rref(ctx, reduced.view_mut())?;
    let nullity = n - rank;

    let pivots = pivot_columns(reduced.view(), rank);
    let nonpivots = complement(&pivots, n);

    let mut x = NmodMat::new(n, nullity, ring);
    for (i, &q) in nonpivots.iter().enumerate() {
        for (j, &p) in pivots.iter().enumerate() {
            x.set(p, i, ring.neg(reduced.get(j, q)));
        }
        x.set(q, i, ring.one());
    }
    Ok(x)
}

impl NmodMat {
    /// # Errors
    ///
    /// See [`rank`].
    pub fn rank(&self, ctx: &MatContext) -> Result<usize, NmodMatError> {
        rank(ctx, self.view())
    }

    pub fn det(&self, ctx: &MatContext) -> u64 {
        det(ctx, self.view())
    }

    /// Reduced row echelon form and rank.
    ///
    /// # Errors
    ///
    /// See [`rank`].
    pub fn rref(&self, ctx: &MatContext) -> Result<(usize, NmodMat), NmodMatError> {
        let mut out = self.clone();
        let rank = rref(ctx, out.view_mut())?;
        Ok((rank, out))
    }

    /// # Errors
    ///
    /// See [`rank`].
    pub fn nullspace(&self, ctx: &MatContext) -> Result<NmodMat, NmodMatError> {
        nullspace(ctx, self.view())
    }
}
