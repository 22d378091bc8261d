//! # Multiplication Module
//!
//! `C = A*B`, `C += A*B` and `C -= A*B` over views, with a dispatcher that
//! picks a strategy from the shape, the modulus and the [`MatContext`]:
//!
//! 1. the f64 product with CRT reconstruction, for large products when the
//!    auxiliary-prime plan is cheap enough;
//! 2. the tiled product on the context's worker pool;
//! 3. the classical kernel below the Strassen cutoff;
//! 4. Winograd's variant of Strassen, recursing through this dispatcher.
//!
//! Every strategy returns the same matrix. Each one is also exposed on its
//! own so callers and tests can force it.

pub(crate) mod classical;
mod float;
pub mod multi_mod;
mod strassen;
mod threaded;

use std::ops::Mul;

use crate::config::MatContext;
use crate::matrix::{MatMut, MatRef, NmodMat, ops};
use crate::ring::ModRing;
use crate::vector::{self, DotParams};

/// How a product is merged into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Accumulate {
    Overwrite,
    Add,
    Sub,
}

impl Accumulate {
    #[inline]
    pub(crate) fn apply(self, old: u64, product: u64, ring: ModRing) -> u64 {
        match self {
            Accumulate::Overwrite => product,
            Accumulate::Add => ring.add(old, product),
            Accumulate::Sub => ring.sub(old, product),
        }
    }
}

fn check_operands(c: &MatMut<'_>, a: &MatRef<'_>, b: &MatRef<'_>) {
    assert_eq!(a.ring(), b.ring(), "operands over different moduli");
    assert_eq!(c.ring(), a.ring(), "output over a different modulus");
    assert_eq!(
        a.cols(),
        b.rows(),
        "inner dimensions differ: {}x{} times {}x{}",
        a.rows(),
        a.cols(),
        b.rows(),
        b.cols()
    );
    assert!(
        c.rows() == a.rows() && c.cols() == b.cols(),
        "output is {}x{} but the product is {}x{}",
        c.rows(),
        c.cols(),
        a.rows(),
        b.cols()
    );
}

/// `C = A*B`.
///
/// # Panics
///
/// Panics if the shapes are incompatible or the moduli differ.
///
/// # Example
///
/// ```
/// # use nmod_mat::{MatContext, ModRing, NmodMat};
/// let ring = ModRing::try_with(10).unwrap();
/// let a = NmodMat::from_rows(&[vec![1, 2], vec![3, 4]], ring).unwrap();
/// let mut c = NmodMat::new(2, 2, ring);
/// nmod_mat::mul::mul(&MatContext::default(), c.view_mut(), a.view(), a.view());
/// assert_eq!(c.row(0), &[7, 0]);
/// assert_eq!(c.row(1), &[5, 2]);
/// ```
pub fn mul(ctx: &MatContext, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_operands(&c, &a, &b);
    dispatch(ctx, c, a, b, Accumulate::Overwrite);
}

/// `C += A*B`.
pub fn addmul(ctx: &MatContext, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_operands(&c, &a, &b);
    dispatch(ctx, c, a, b, Accumulate::Add);
}

/// `C -= A*B`.
pub fn submul(ctx: &MatContext, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_operands(&c, &a, &b);
    dispatch(ctx, c, a, b, Accumulate::Sub);
}

pub(crate) fn dispatch(
    ctx: &MatContext,
    mut c: MatMut<'_>,
    a: MatRef<'_>,
    b: MatRef<'_>,
    op: Accumulate,
) {
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    if m == 0 || n == 0 {
        return;
    }
    if k == 0 || a.ring().is_trivial() {
        if op == Accumulate::Overwrite {
            c.fill_zero();
        }
        return;
    }

    let tuning = ctx.tuning();
    let dim = m.min(k).min(n);

    if tuning.float_enabled && dim > tuning.float_cutoff && float::mul(ctx, c.rb_mut(), a, b, op) {
        tracing::trace!(m, k, n, "multiplied with f64 kernels");
        return;
    }

    if ctx.threads() > 1 && dim >= tuning.threaded_min_dim {
        tracing::trace!(m, k, n, threads = ctx.threads(), "multiplying on worker pool");
        threaded::mul(ctx, c, a, b, op);
        return;
    }

    if dim < tuning.strassen_cutoff {
        classical::mul(c, a, b, op);
        return;
    }

    tracing::trace!(m, k, n, "Strassen-Winograd step");
    match op {
        Accumulate::Overwrite => strassen::mul(ctx, c, a, b),
        _ => {
            let mut product = NmodMat::new(m, n, a.ring());
            strassen::mul(ctx, product.view_mut(), a, b);
            match op {
                Accumulate::Add => ops::add_assign(c, product.view()),
                _ => ops::sub_assign(c, product.view()),
            }
        }
    }
}

/// `C = A*B` with the classical kernel only.
pub fn mul_classical(mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_operands(&c, &a, &b);
    if a.ring().is_trivial() {
        c.fill_zero();
        return;
    }
    classical::mul(c, a, b, Accumulate::Overwrite);
}

/// `C = A*B` starting with one Strassen-Winograd step; the seven
/// subproducts go back through the dispatcher.
pub fn mul_strassen(ctx: &MatContext, mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_operands(&c, &a, &b);
    if a.ring().is_trivial() || a.cols() == 0 {
        c.fill_zero();
        return;
    }
    strassen::mul(ctx, c, a, b);
}

/// `C = A*B` on the context's worker pool, or classically without one.
pub fn mul_threaded(ctx: &MatContext, mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_operands(&c, &a, &b);
    if a.ring().is_trivial() {
        c.fill_zero();
        return;
    }
    threaded::mul(ctx, c, a, b, Accumulate::Overwrite);
}

/// `C = A*B` through f64 products. Returns `false`, leaving `C` untouched,
/// when no auxiliary-prime plan within the context's limit covers the
/// entry bound.
pub fn mul_float(ctx: &MatContext, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) -> bool {
    check_operands(&c, &a, &b);
    float::mul(ctx, c, a, b, Accumulate::Overwrite)
}

/// `A^e` for a square `A`; `A^0` is the identity.
pub fn pow(ctx: &MatContext, a: MatRef<'_>, e: u64) -> NmodMat {
    assert!(a.is_square(), "power of a non-square {}x{} matrix", a.rows(), a.cols());
    let (dim, ring) = (a.rows(), a.ring());

    let mut result = NmodMat::identity(dim, ring);
    if e == 0 || dim == 0 {
        return result;
    }

    let mut base = a.to_mat();
    let mut scratch = NmodMat::new(dim, dim, ring);
    let mut e = e;
    loop {
        if e & 1 == 1 {
            mul(ctx, scratch.view_mut(), result.view(), base.view());
            result.swap(&mut scratch);
        }
        e >>= 1;
        if e == 0 {
            break;
        }
        mul(ctx, scratch.view_mut(), base.view(), base.view());
        base.swap(&mut scratch);
    }
    result
}

impl NmodMat {
    /// `self * rhs` with the default context.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::{ModRing, NmodMat};
    /// let ring = ModRing::try_with(7).unwrap();
    /// let a = NmodMat::from_rows(&[vec![1, 1], vec![0, 1]], ring).unwrap();
    /// assert_eq!(&a * &a, NmodMat::from_rows(&[vec![1, 2], vec![0, 1]], ring).unwrap());
    /// ```
    pub fn mul(&self, rhs: &NmodMat) -> NmodMat {
        self.mul_with(&MatContext::default(), rhs)
    }

    pub fn mul_with(&self, ctx: &MatContext, rhs: &NmodMat) -> NmodMat {
        let mut out = NmodMat::new(self.rows(), rhs.cols(), self.ring());
        mul(ctx, out.view_mut(), self.view(), rhs.view());
        out
    }

    /// `self + a*b`.
    pub fn addmul(&self, ctx: &MatContext, a: &NmodMat, b: &NmodMat) -> NmodMat {
        let mut out = self.clone();
        addmul(ctx, out.view_mut(), a.view(), b.view());
        out
    }

    /// `self - a*b`.
    pub fn submul(&self, ctx: &MatContext, a: &NmodMat, b: &NmodMat) -> NmodMat {
        let mut out = self.clone();
        submul(ctx, out.view_mut(), a.view(), b.view());
        out
    }

    pub fn pow(&self, ctx: &MatContext, e: u64) -> NmodMat {
        pow(ctx, self.view(), e)
    }

    /// Matrix times column vector; entries of `x` are reduced first.
    pub fn mul_vec(&self, x: &[u64]) -> Vec<u64> {
        assert_eq!(x.len(), self.cols(), "vector length must match column count");
        let ring = self.ring();
        let mut x = x.to_vec();
        vector::reduce(&mut x, ring);
        let params = DotParams::new(self.cols(), ring);
        (0..self.rows())
            .map(|i| vector::dot(self.row(i), &x, params))
            .collect()
    }

    /// Row vector times matrix; entries of `x` are reduced first.
    pub fn vec_mul(&self, x: &[u64]) -> Vec<u64> {
        assert_eq!(x.len(), self.rows(), "vector length must match row count");
        let ring = self.ring();
        let params = DotParams::new(self.rows(), ring);
        let view = self.view();
        (0..self.cols())
            .map(|j| {
                let pairs = x.iter().map(|&v| ring.reduce(v)).zip(view.col_iter(j));
                vector::dot_iter(pairs, params)
            })
            .collect()
    }
}

impl Mul for &NmodMat {
    type Output = NmodMat;

    fn mul(self, rhs: Self) -> NmodMat {
        NmodMat::mul(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::errors::NmodMatError;
    use crate::matrix::random::randtest;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn forced_strassen() -> MatContext {
        MatContext::new(Tuning {
            strassen_cutoff: 4,
            float_enabled: false,
            ..Tuning::default()
        })
    }

    #[test]
    fn test_strassen_matches_classical_on_odd_shapes() -> Result<(), NmodMatError> {
        let ctx = forced_strassen();
        let mut rng = StdRng::seed_from_u64(1);
        for &(m, k, n, modulus) in &[
            (9, 7, 11, 17),
            (16, 16, 16, 1_000_003),
            (13, 20, 5, u64::MAX - 58),
            (33, 31, 29, 2),
        ] {
            let ring = ModRing::try_with(modulus)?;
            let a = randtest(m, k, ring, &mut rng);
            let b = randtest(k, n, ring, &mut rng);

            let mut expected = NmodMat::new(m, n, ring);
            mul_classical(expected.view_mut(), a.view(), b.view());
            let mut got = NmodMat::new(m, n, ring);
            mul_strassen(&ctx, got.view_mut(), a.view(), b.view());
            assert_eq!(got, expected, "{m}x{k}x{n} mod {modulus}");
        }
        Ok(())
    }

    #[test]
    fn test_accumulating_variants() -> Result<(), NmodMatError> {
        let ctx = forced_strassen();
        let ring = ModRing::try_with(101)?;
        let mut rng = StdRng::seed_from_u64(2);
        let a = randtest(12, 10, ring, &mut rng);
        let b = randtest(10, 14, ring, &mut rng);
        let c = randtest(12, 14, ring, &mut rng);

        let ab = a.mul_with(&ctx, &b);
        assert_eq!(c.addmul(&ctx, &a, &b), &c + &ab);
        assert_eq!(c.submul(&ctx, &a, &b), &c - &ab);
        Ok(())
    }

    #[test]
    fn test_empty_and_trivial_products() -> Result<(), NmodMatError> {
        let ctx = MatContext::default();
        let ring = ModRing::try_with(9)?;
        let a = NmodMat::new(3, 0, ring);
        let b = NmodMat::new(0, 4, ring);
        let mut c = NmodMat::from_entries(3, 4, vec![5; 12], ring)?;
        mul(&ctx, c.view_mut(), a.view(), b.view());
        assert!(c.is_zero());

        let trivial = ModRing::try_with(1)?;
        let x = NmodMat::new(2, 2, trivial);
        assert!(x.pow(&ctx, 5).is_zero());
        Ok(())
    }

    #[test]
    #[should_panic(expected = "inner dimensions differ")]
    fn test_shape_mismatch_panics() {
        let ring = ModRing::try_with(5).unwrap();
        let a = NmodMat::new(2, 3, ring);
        let _ = &a * &a;
    }

    #[test]
    fn test_pow_matches_repeated_products() -> Result<(), NmodMatError> {
        let ctx = MatContext::default();
        let ring = ModRing::try_with(1_000_000_007)?;
        let mut rng = StdRng::seed_from_u64(3);
        let a = randtest(5, 5, ring, &mut rng);

        let mut expected = NmodMat::identity(5, ring);
        for _ in 0..11 {
            expected = &expected * &a;
        }
        assert_eq!(a.pow(&ctx, 11), expected);
        assert_eq!(a.pow(&ctx, 0), NmodMat::identity(5, ring));
        Ok(())
    }

    #[test]
    fn test_matrix_vector_products() -> Result<(), NmodMatError> {
        let ring = ModRing::try_with(10)?;
        let a = NmodMat::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]], ring)?;
        assert_eq!(a.mul_vec(&[1, 1, 11]), vec![6, 5]);
        assert_eq!(a.vec_mul(&[1, 2]), vec![9, 2, 5]);
        Ok(())
    }
}
