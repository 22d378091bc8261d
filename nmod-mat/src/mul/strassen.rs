//! One level of Winograd's variant of Strassen multiplication: seven
//! half-size products and fifteen additions, with two scratch matrices.
//! Odd trailing rows, columns and the odd inner index are patched with thin
//! classical products afterwards.

use crate::config::MatContext;
use crate::matrix::{MatMut, MatRef, ops};

use super::{Accumulate, dispatch};

pub(crate) fn mul(ctx: &MatContext, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let ring = a.ring();
    let (ar, ac, bc) = (m / 2, k / 2, n / 2);

    if ar == 0 || ac == 0 || bc == 0 {
        super::classical::mul(c, a, b, Accumulate::Overwrite);
        return;
    }

    let a11 = a.window(0, 0, ar, ac);
    let a12 = a.window(0, ac, ar, 2 * ac);
    let a21 = a.window(ar, 0, 2 * ar, ac);
    let a22 = a.window(ar, ac, 2 * ar, 2 * ac);

    let b11 = b.window(0, 0, ac, bc);
    let b12 = b.window(0, bc, ac, 2 * bc);
    let b21 = b.window(ac, 0, 2 * ac, bc);
    let b22 = b.window(ac, bc, 2 * ac, 2 * bc);

    let (c_left, c_last_cols) = c.split_at_col(2 * bc);
    let (mut c_even, c_last_rows) = c_left.split_at_row(2 * ar);

    // X1 is used as ar x ac, then as ar x bc.
    let mut x1_buf = vec![0u64; ar * ac.max(bc)];
    let mut x2_buf = vec![0u64; ac * bc];
    let mut x2 = MatMut::from_slice(&mut x2_buf, ac, bc, bc, ring);

    {
        let (mut c11, mut c12, mut c21, mut c22) = c_even.rb_mut().split_at(ar, bc);

        {
            let mut x1 = MatMut::from_slice(&mut x1_buf, ar, ac, ac, ring);

            ops::sub(x1.rb_mut(), a11, a21);
            ops::sub(x2.rb_mut(), b22, b12);
            dispatch(ctx, c21.rb_mut(), x1.rb(), x2.rb(), Accumulate::Overwrite);

            ops::add(x1.rb_mut(), a21, a22);
            ops::sub(x2.rb_mut(), b12, b11);
            dispatch(ctx, c22.rb_mut(), x1.rb(), x2.rb(), Accumulate::Overwrite);

            ops::sub_assign(x1.rb_mut(), a11);
            ops::rsub_assign(x2.rb_mut(), b22);
            dispatch(ctx, c12.rb_mut(), x1.rb(), x2.rb(), Accumulate::Overwrite);

            ops::rsub_assign(x1.rb_mut(), a12);
            dispatch(ctx, c11.rb_mut(), x1.rb(), b22, Accumulate::Overwrite);
        }

        let mut x1 = MatMut::from_slice(&mut x1_buf, ar, bc, bc, ring);
        dispatch(ctx, x1.rb_mut(), a11, b11, Accumulate::Overwrite);

        ops::add_assign(c12.rb_mut(), x1.rb());
        ops::add_assign(c21.rb_mut(), c12.rb());
        ops::add_assign(c12.rb_mut(), c22.rb());
        ops::add_assign(c22.rb_mut(), c21.rb());
        ops::add_assign(c12.rb_mut(), c11.rb());

        ops::sub_assign(x2.rb_mut(), b21);
        dispatch(ctx, c11.rb_mut(), a22, x2.rb(), Accumulate::Overwrite);
        ops::sub_assign(c21.rb_mut(), c11.rb());

        dispatch(ctx, c11.rb_mut(), a12, b21, Accumulate::Overwrite);
        ops::add_assign(c11.rb_mut(), x1.rb());
    }

    if n > 2 * bc {
        dispatch(ctx, c_last_cols, a, b.window(0, 2 * bc, k, n), Accumulate::Overwrite);
    }
    if m > 2 * ar {
        dispatch(
            ctx,
            c_last_rows,
            a.window(2 * ar, 0, m, k),
            b.window(0, 0, k, 2 * bc),
            Accumulate::Overwrite,
        );
    }
    if k > 2 * ac {
        dispatch(
            ctx,
            c_even,
            a.window(0, 2 * ac, 2 * ar, k),
            b.window(2 * ac, 0, k, 2 * bc),
            Accumulate::Add,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::errors::NmodMatError;
    use crate::matrix::NmodMat;
    use crate::ring::ModRing;

    #[test]
    fn test_single_step_on_two_by_two() -> Result<(), NmodMatError> {
        let ctx = MatContext::new(Tuning::default());
        let ring = ModRing::try_with(1_000_000_007)?;
        let a = NmodMat::from_rows(&[vec![1, 2], vec![3, 4]], ring)?;
        let b = NmodMat::from_rows(&[vec![5, 6], vec![7, 8]], ring)?;
        let mut c = NmodMat::new(2, 2, ring);
        mul(&ctx, c.view_mut(), a.view(), b.view());
        assert_eq!(c, NmodMat::from_rows(&[vec![19, 22], vec![43, 50]], ring)?);
        Ok(())
    }

    #[test]
    fn test_odd_everything() -> Result<(), NmodMatError> {
        let ctx = MatContext::new(Tuning::default());
        let ring = ModRing::try_with(31)?;
        let a = NmodMat::from_entries(3, 3, (1..=9).collect(), ring)?;
        let b = NmodMat::from_entries(3, 3, (10..=18).collect(), ring)?;
        let mut c = NmodMat::new(3, 3, ring);
        mul(&ctx, c.view_mut(), a.view(), b.view());

        let mut expected = NmodMat::new(3, 3, ring);
        super::super::classical::mul(expected.view_mut(), a.view(), b.view(), Accumulate::Overwrite);
        assert_eq!(c, expected);
        Ok(())
    }
}
