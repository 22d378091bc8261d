//! Triangular solves `L*X = B` and `U*X = B`.
//!
//! Both overwrite `B` with `X`; the copying variants first move `B` into
//! `X`. With `unit` set the diagonal of the triangular matrix is taken to
//! be all ones and never read, so the packed output of LU can be passed
//! directly.

use crate::config::MatContext;
use crate::errors::NmodMatError;
use crate::matrix::{MatMut, MatRef};
use crate::mul::submul;
use crate::vector::{DotParams, dot};

fn check_triangular(t: &MatRef<'_>, b: &MatMut<'_>) {
    assert!(t.is_square(), "triangular matrix must be square, got {}x{}", t.rows(), t.cols());
    assert_eq!(t.rows(), b.rows(), "triangular matrix and right-hand side differ in rows");
    assert_eq!(t.ring(), b.ring(), "operands over different moduli");
}

fn diagonal_inverses(t: MatRef<'_>, unit: bool) -> Result<Vec<u64>, NmodMatError> {
    if unit {
        return Ok(Vec::new());
    }
    let ring = t.ring();
    (0..t.rows()).map(|i| ring.inv(t.get(i, i))).collect()
}

/// Solves `L*X = B` into `x`.
///
/// # Errors
///
/// Returns `NmodMatError::NoInverse` if `unit` is false and a diagonal
/// entry is not invertible.
pub fn solve_tril(
    ctx: &MatContext,
    mut x: MatMut<'_>,
    l: MatRef<'_>,
    b: MatRef<'_>,
    unit: bool,
) -> Result<(), NmodMatError> {
    x.copy_from(b);
    solve_tril_in_place(ctx, l, x, unit)
}

/// Overwrites `b` with `L^-1 * b`.
///
/// # Errors
///
/// See [`solve_tril`].
pub fn solve_tril_in_place(
    ctx: &MatContext,
    l: MatRef<'_>,
    b: MatMut<'_>,
    unit: bool,
) -> Result<(), NmodMatError> {
    check_triangular(&l, &b);
    if b.is_empty() {
        return Ok(());
    }
    let tuning = ctx.tuning();
    if b.rows() < tuning.solve_tri_rows_cutoff || b.cols() < tuning.solve_tri_cols_cutoff {
        tril_classical(l, b, unit)
    } else {
        tracing::trace!(rows = b.rows(), cols = b.cols(), "recursive lower solve");
        tril_recursive(ctx, l, b, unit)
    }
}

/// Solves `U*X = B` into `x`.
///
/// # Errors
///
/// See [`solve_tril`].
pub fn solve_triu(
    ctx: &MatContext,
    mut x: MatMut<'_>,
    u: MatRef<'_>,
    b: MatRef<'_>,
    unit: bool,
) -> Result<(), NmodMatError> {
    x.copy_from(b);
    solve_triu_in_place(ctx, u, x, unit)
}

/// Overwrites `b` with `U^-1 * b`.
///
/// # Errors
///
/// See [`solve_tril`].
pub fn solve_triu_in_place(
    ctx: &MatContext,
    u: MatRef<'_>,
    b: MatMut<'_>,
    unit: bool,
) -> Result<(), NmodMatError> {
    check_triangular(&u, &b);
    if b.is_empty() {
        return Ok(());
    }
    let tuning = ctx.tuning();
    if b.rows() < tuning.solve_tri_rows_cutoff || b.cols() < tuning.solve_tri_cols_cutoff {
        triu_classical(u, b, unit)
    } else {
        tracing::trace!(rows = b.rows(), cols = b.cols(), "recursive upper solve");
        triu_recursive(ctx, u, b, unit)
    }
}

// Forward substitution one column of B at a time.
fn tril_classical(l: MatRef<'_>, mut b: MatMut<'_>, unit: bool) -> Result<(), NmodMatError> {
    let n = l.rows();
    let ring = l.ring();
    let inverses = diagonal_inverses(l, unit)?;
    let params = DotParams::new(n, ring);
    let mut column = vec![0u64; n];

    for col in 0..b.cols() {
        for (j, v) in column.iter_mut().enumerate() {
            *v = b.get(j, col);
        }
        for j in 0..n {
            let s = ring.sub(column[j], dot(&l.row(j)[..j], &column[..j], params));
            column[j] = if unit { s } else { ring.mul(s, inverses[j]) };
        }
        for (j, &v) in column.iter().enumerate() {
            b.row_mut(j)[col] = v;
        }
    }
    Ok(())
}

fn triu_classical(u: MatRef<'_>, mut b: MatMut<'_>, unit: bool) -> Result<(), NmodMatError> {
    let n = u.rows();
    let ring = u.ring();
    let inverses = diagonal_inverses(u, unit)?;
    let params = DotParams::new(n, ring);
    let mut column = vec![0u64; n];

    for col in 0..b.cols() {
        for (j, v) in column.iter_mut().enumerate() {
            *v = b.get(j, col);
        }
        for j in (0..n).rev() {
            let s = ring.sub(column[j], dot(&u.row(j)[j + 1..], &column[j + 1..], params));
            column[j] = if unit { s } else { ring.mul(s, inverses[j]) };
        }
        for (j, &v) in column.iter().enumerate() {
            b.row_mut(j)[col] = v;
        }
    }
    Ok(())
}

// [A 0; C D] [X; Y] = [B1; B2]:  X = A^-1 B1,  Y = D^-1 (B2 - C X)
fn tril_recursive(ctx: &MatContext, l: MatRef<'_>, b: MatMut<'_>, unit: bool) -> Result<(), NmodMatError> {
    let n = l.rows();
    let r = n / 2;
    let (mut top, mut bottom) = b.split_at_row(r);

    solve_tril_in_place(ctx, l.window(0, 0, r, r), top.rb_mut(), unit)?;
    submul(ctx, bottom.rb_mut(), l.window(r, 0, n, r), top.rb());
    solve_tril_in_place(ctx, l.window(r, r, n, n), bottom, unit)
}

// [A B; 0 D] [X; Y] = [B1; B2]:  Y = D^-1 B2,  X = A^-1 (B1 - B Y)
fn triu_recursive(ctx: &MatContext, u: MatRef<'_>, b: MatMut<'_>, unit: bool) -> Result<(), NmodMatError> {
    let n = u.rows();
    let r = n / 2;
    let (mut top, mut bottom) = b.split_at_row(r);

    solve_triu_in_place(ctx, u.window(r, r, n, n), bottom.rb_mut(), unit)?;
    submul(ctx, top.rb_mut(), u.window(0, r, r, n), bottom.rb());
    solve_triu_in_place(ctx, u.window(0, 0, r, r), top, unit)
}
