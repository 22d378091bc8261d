//! Gaussian elimination with delayed reduction for moduli of at most half a
//! word.
//!
//! Rows below the pivot accumulate `f * pivot_row` unreduced. A row that
//! started reduced absorbs `limit` such updates before it could overflow, so
//! the trailing block is only reduced every `limit` pivots. The pivot
//! column and the pivot row are reduced on demand, and every entry is
//! reduced again before returning, on the early exits as well.

use crate::errors::NmodMatError;
use crate::matrix::MatMut;

use super::classical::find_pivot;

pub(super) fn lu(perm: &mut [usize], mut a: MatMut<'_>, rank_check: bool) -> Result<usize, NmodMatError> {
    let result = eliminate(perm, a.rb_mut(), rank_check);
    let ring = a.ring();
    for i in 0..a.rows() {
        for v in a.row_mut(i) {
            *v = ring.reduce(*v);
        }
    }
    result
}

fn eliminate(perm: &mut [usize], mut a: MatMut<'_>, rank_check: bool) -> Result<usize, NmodMatError> {
    let (m, n) = (a.rows(), a.cols());
    let ring = a.ring();
    let max = ring.modulus() - 1;
    let limit = (u64::MAX - max) / (max * max);

    let (mut row, mut col, mut rank) = (0, 0, 0);
    let mut pending = 0;

    while row < m && col < n {
        for i in row..m {
            let v = a.get(i, col);
            a.row_mut(i)[col] = ring.reduce(v);
        }

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

        for v in &mut a.row_mut(row)[col..] {
            *v = ring.reduce(*v);
        }
        if pending == limit {
            for i in row + 1..m {
                for v in &mut a.row_mut(i)[col + 1..] {
                    *v = ring.reduce(*v);
                }
            }
            pending = 0;
        }

        let d = ring.inv(a.get(row, col))?;
        for i in row + 1..m {
            let (target, pivot_row) = a.row_pair_mut(i, row);
            let e = ring.mul(target[col], d);
            let f = ring.neg(e);
            for (t, &p) in target[col + 1..].iter_mut().zip(&pivot_row[col + 1..]) {
                *t += f * p;
            }
            target[col] = 0;
            target[rank - 1] = e;
        }
        pending += 1;

        row += 1;
        col += 1;
    }
    Ok(rank)
}
