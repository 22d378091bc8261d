//! Column-recursive LU.
//!
//! Factor the left half, carry its row permutation to the right half, turn
//! the right half into `[U01; S]` with one triangular solve and one Schur
//! complement product, factor `S`, and finally move the `L` block of `S`
//! next to the `L` block of the left half when the left half was rank
//! deficient.

use crate::config::MatContext;
use crate::errors::NmodMatError;
use crate::matrix::MatMut;
use crate::mul::submul;
use crate::solve::solve_tril_in_place;

use super::compose;

pub(super) fn lu(
    ctx: &MatContext,
    perm: &mut [usize],
    mut a: MatMut<'_>,
    rank_check: bool,
) -> Result<usize, NmodMatError> {
    let (m, n) = (a.rows(), a.cols());
    let n1 = n / 2;

    let (r1, r2) = {
        let (mut left, mut right) = a.rb_mut().split_at_col(n1);

        let mut p1 = vec![0; m];
        let r1 = super::lu(ctx, &mut p1, left.rb_mut(), rank_check)?;
        if rank_check && r1 != n1.min(m) {
            return Ok(0);
        }
        right.permute_rows(&p1);
        compose(perm, &p1);

        let (mut a01, mut a11) = right.split_at_row(r1);
        {
            let l00 = left.rb().window(0, 0, r1, r1);
            let a10 = left.rb().window(r1, 0, m, r1);
            solve_tril_in_place(ctx, l00, a01.rb_mut(), true)?;
            submul(ctx, a11.rb_mut(), a10, a01.rb());
        }

        let mut p2 = vec![0; m - r1];
        let r2 = super::lu(ctx, &mut p2, a11, rank_check)?;
        if rank_check && r1 + r2 < m.min(n) {
            return Ok(0);
        }
        left.window(r1, 0, m, n1).permute_rows(&p2);
        compose(&mut perm[r1..], &p2);

        (r1, r2)
    };

    // L of the Schur complement sits in columns n1.., it belongs right after
    // the r1 columns of L from the left half
    if r1 != n1 {
        for i in 0..m - r1 {
            let row = a.row_mut(r1 + i);
            for j in 0..i.min(r2) {
                row[r1 + j] = row[n1 + j];
                row[n1 + j] = 0;
            }
        }
    }

    Ok(r1 + r2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::lu::tests::reconstruct;
    use crate::matrix::NmodMat;
    use crate::ring::ModRing;

    #[test]
    fn test_rank_deficient_left_half() -> Result<(), NmodMatError> {
        let ctx = MatContext::new(Tuning {
            lu_recursive_cutoff: 4,
            ..Tuning::default()
        });
        let ring = ModRing::try_with(101)?;
        // left half has rank 1, so the Schur complement L block must move
        let a = NmodMat::from_rows(
            &[
                vec![1, 2, 3, 4],
                vec![2, 4, 5, 1],
                vec![3, 6, 7, 7],
                vec![4, 8, 2, 9],
            ],
            ring,
        )?;
        let mut packed = a.clone();
        let mut perm = vec![0; 4];
        let rank = lu(&ctx, &mut perm, packed.view_mut(), false)?;
        assert_eq!(rank, 3);
        assert_eq!(reconstruct(&packed, &perm, rank), a);
        assert!(packed.row(3)[3..].iter().all(|&v| v == 0));
        Ok(())
    }
}
