//! Row-by-row Gaussian elimination.

use crate::errors::NmodMatError;
use crate::matrix::MatMut;
use crate::vector;

/// First row at or below `row` whose entry in `col` is a unit.
///
/// `Ok(None)` means the column is zero from `row` down. Nonzero entries
/// that are all zero divisors are an error.
pub(super) fn find_pivot(a: &MatMut<'_>, row: usize, col: usize) -> Result<Option<usize>, NmodMatError> {
    let ring = a.ring();
    let mut zero_divisor = None;
    for i in row..a.rows() {
        let v = a.get(i, col);
        if v == 0 {
            continue;
        }
        if ring.is_unit(v) {
            return Ok(Some(i));
        }
        if zero_divisor.is_none() {
            zero_divisor = Some(v);
        }
    }
    match zero_divisor {
        None => Ok(None),
        Some(v) => Err(NmodMatError::NoInverse(format!(
            "No unit pivot in column {} (found {} mod {})",
            col,
            v,
            ring.modulus()
        ))),
    }
}

pub(super) fn lu(perm: &mut [usize], mut a: MatMut<'_>, rank_check: bool) -> Result<usize, NmodMatError> {
    let (m, n) = (a.rows(), a.cols());
    let ring = a.ring();
    let (mut row, mut col, mut rank) = (0, 0, 0);

    while row < m && col < n {
        let Some(pivot) = find_pivot(&a, row, col)? else {
            if rank_check {
                return Ok(0);
            }
            col += 1;
            continue;
        };
        if pivot != row {
            a.swap_rows(row, pivot);
            perm.swap(row, pivot);
        }
        rank += 1;

        let d = ring.inv(a.get(row, col))?;
        for i in row + 1..m {
            let (target, pivot_row) = a.row_pair_mut(i, row);
            let e = ring.mul(target[col], d);
            vector::scalar_submul(&mut target[col + 1..], &pivot_row[col + 1..], e, ring);
            target[col] = 0;
            target[rank - 1] = e;
        }
        row += 1;
        col += 1;
    }
    Ok(rank)
}
