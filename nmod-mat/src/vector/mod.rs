//! # Vector primitives
//!
//! Dot products with overflow-free accumulation, and the scalar/vector
//! operations the matrix algorithms are written in terms of.
//!
//! A dot product of length `len` over Z/nZ sums at most `len * (n-1)^2`.
//! [`DotParams`] classifies that bound once per `(len, ring)` pair into the
//! number of machine words the accumulator needs, so code performing many
//! dot products of the same length (one matrix multiply) pays for the
//! classification once.

use crate::ring::ModRing;

use itertools::izip;

/// Accumulation strategy for a dot product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotMethod {
    /// Length zero or trivial ring: the result is 0.
    Zero,
    /// The whole sum fits in one word; reduce once at the end.
    OneLimb,
    /// The sum fits in two words.
    TwoLimbs,
    /// Two words plus a carry word.
    ThreeLimbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotParams {
    pub method: DotMethod,
    pub ring: ModRing,
}

impl DotParams {
    /// Selects the accumulation strategy for dot products of length `len`.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// # use nmod_mat::vector::{DotMethod, DotParams};
    /// let small = ModRing::try_with(17).unwrap();
    /// assert_eq!(DotParams::new(100, small).method, DotMethod::OneLimb);
    /// let large = ModRing::try_with(u64::MAX).unwrap();
    /// assert_eq!(DotParams::new(1, large).method, DotMethod::TwoLimbs);
    /// assert_eq!(DotParams::new(0, large).method, DotMethod::Zero);
    /// ```
    pub fn new(len: usize, ring: ModRing) -> Self {
        DotParams {
            method: Self::classify(len, ring),
            ring,
        }
    }

    fn classify(len: usize, ring: ModRing) -> DotMethod {
        let n = ring.modulus();
        if len == 0 || n == 1 {
            return DotMethod::Zero;
        }
        let max = (n - 1) as u128;
        match (max * max).checked_mul(len as u128) {
            Some(bound) if bound <= u64::MAX as u128 => DotMethod::OneLimb,
            Some(_) => DotMethod::TwoLimbs,
            None => DotMethod::ThreeLimbs,
        }
    }

    /// Number of words the accumulator occupies.
    pub fn limbs(&self) -> u32 {
        match self.method {
            DotMethod::Zero => 0,
            DotMethod::OneLimb => 1,
            DotMethod::TwoLimbs => 2,
            DotMethod::ThreeLimbs => 3,
        }
    }
}

/// Computes `Σ a[i]*b[i] mod n` over the common length of `a` and `b`.
///
/// # Example
///
/// ```
/// # use nmod_mat::ring::ModRing;
/// # use nmod_mat::vector::{dot, DotParams};
/// let ring = ModRing::try_with(7).unwrap();
/// let params = DotParams::new(3, ring);
/// assert_eq!(dot(&[1, 2, 3], &[4, 5, 6], params), 32 % 7);
/// ```
#[inline]
pub fn dot(a: &[u64], b: &[u64], params: DotParams) -> u64 {
    dot_iter(a.iter().copied().zip(b.iter().copied()), params)
}

/// Dot product over any iterator of reduced pairs, e.g. a strided column.
///
/// The iterator must not yield more pairs than the length `params` was
/// built for.
pub fn dot_iter<I>(pairs: I, params: DotParams) -> u64
where
    I: Iterator<Item = (u64, u64)>,
{
    let ring = params.ring;
    match params.method {
        DotMethod::Zero => 0,
        DotMethod::OneLimb => {
            let sum = pairs.fold(0u64, |acc, (x, y)| acc + x * y);
            ring.reduce(sum)
        }
        DotMethod::TwoLimbs => {
            let sum = pairs.fold(0u128, |acc, (x, y)| acc + x as u128 * y as u128);
            ring.reduce_wide(sum)
        }
        DotMethod::ThreeLimbs => {
            let mut hi = 0u64;
            let mut lo = 0u128;
            for (x, y) in pairs {
                let (sum, carry) = lo.overflowing_add(x as u128 * y as u128);
                lo = sum;
                hi += carry as u64;
            }
            ring.reduce_triple(hi, (lo >> 64) as u64, lo as u64)
        }
    }
}

/// `out[i] = a[i] + b[i] mod n`.
pub fn add(out: &mut [u64], a: &[u64], b: &[u64], ring: ModRing) {
    for (o, &x, &y) in izip!(out.iter_mut(), a, b) {
        *o = ring.add(x, y);
    }
}

/// `out[i] = a[i] - b[i] mod n`.
pub fn sub(out: &mut [u64], a: &[u64], b: &[u64], ring: ModRing) {
    for (o, &x, &y) in izip!(out.iter_mut(), a, b) {
        *o = ring.sub(x, y);
    }
}

pub fn add_assign(y: &mut [u64], x: &[u64], ring: ModRing) {
    for (t, &s) in y.iter_mut().zip(x) {
        *t = ring.add(*t, s);
    }
}

pub fn sub_assign(y: &mut [u64], x: &[u64], ring: ModRing) {
    for (t, &s) in y.iter_mut().zip(x) {
        *t = ring.sub(*t, s);
    }
}

/// `y[i] = x[i] - y[i] mod n`.
pub fn rsub_assign(y: &mut [u64], x: &[u64], ring: ModRing) {
    for (t, &s) in y.iter_mut().zip(x) {
        *t = ring.sub(s, *t);
    }
}

pub fn neg(y: &mut [u64], ring: ModRing) {
    for t in y.iter_mut() {
        *t = ring.neg(*t);
    }
}

/// `out[i] = c * x[i] mod n`.
pub fn scalar_mul(out: &mut [u64], x: &[u64], c: u64, ring: ModRing) {
    for (o, &s) in out.iter_mut().zip(x) {
        *o = ring.mul(s, c);
    }
}

pub fn scalar_mul_assign(y: &mut [u64], c: u64, ring: ModRing) {
    for t in y.iter_mut() {
        *t = ring.mul(*t, c);
    }
}

/// `y := y + c*x mod n`.
pub fn scalar_addmul(y: &mut [u64], x: &[u64], c: u64, ring: ModRing) {
    if c == 0 {
        return;
    }
    for (t, &s) in y.iter_mut().zip(x) {
        *t = ring.add(*t, ring.mul(s, c));
    }
}

/// `y := y - c*x mod n`.
pub fn scalar_submul(y: &mut [u64], x: &[u64], c: u64, ring: ModRing) {
    scalar_addmul(y, x, ring.neg(c), ring);
}

pub fn is_zero(x: &[u64]) -> bool {
    x.iter().all(|&v| v == 0)
}

/// Brings arbitrary words into `[0, n)`.
pub fn reduce(x: &mut [u64], ring: ModRing) {
    for t in x.iter_mut() {
        *t = ring.reduce(*t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NmodMatError;
    use quickcheck_macros::quickcheck;

    fn naive_dot(a: &[u64], b: &[u64], n: u64) -> u64 {
        let mut acc = 0u128;
        for (&x, &y) in a.iter().zip(b) {
            acc = (acc + x as u128 * y as u128) % n as u128;
        }
        acc as u64
    }

    #[test]
    fn test_classification_boundaries() -> Result<(), NmodMatError> {
        let ring = ModRing::try_with((1 << 16) + 1)?;
        assert_eq!(DotParams::new(1 << 20, ring).method, DotMethod::OneLimb);

        let ring = ModRing::try_with(1 << 40)?;
        assert_eq!(DotParams::new(1000, ring).method, DotMethod::TwoLimbs);

        let ring = ModRing::try_with(u64::MAX)?;
        assert_eq!(DotParams::new(1, ring).method, DotMethod::TwoLimbs);
        assert_eq!(DotParams::new(2, ring).method, DotMethod::ThreeLimbs);
        assert_eq!(DotParams::new(2, ring).limbs(), 3);

        let trivial = ModRing::try_with(1)?;
        assert_eq!(DotParams::new(10, trivial).method, DotMethod::Zero);
        Ok(())
    }

    #[test]
    fn test_three_limb_dot_with_carries() -> Result<(), NmodMatError> {
        let n = u64::MAX - 58;
        let ring = ModRing::try_with(n)?;
        let a = vec![n - 1; 64];
        let b = vec![n - 1; 64];
        let params = DotParams::new(a.len(), ring);
        assert_eq!(params.method, DotMethod::ThreeLimbs);
        // (-1)(-1) summed 64 times
        assert_eq!(dot(&a, &b, params), 64);
        Ok(())
    }

    #[test]
    fn test_dot_iter_strided() -> Result<(), NmodMatError> {
        let ring = ModRing::try_with(101)?;
        let row = [3u64, 4, 5];
        // column 1 of a 3x2 row-major block
        let block = [0u64, 10, 0, 20, 0, 30];
        let params = DotParams::new(3, ring);
        let value = dot_iter(row.iter().copied().zip(block.iter().skip(1).step_by(2).copied()), params);
        assert_eq!(value, (30 + 80 + 150) % 101);
        Ok(())
    }

    #[test]
    fn test_scalar_ops() -> Result<(), NmodMatError> {
        let ring = ModRing::try_with(11)?;
        let mut y = vec![1u64, 2, 3];
        scalar_addmul(&mut y, &[5, 6, 7], 2, ring);
        assert_eq!(y, vec![0, 3, 6]);
        scalar_submul(&mut y, &[5, 6, 7], 2, ring);
        assert_eq!(y, vec![1, 2, 3]);
        neg(&mut y, ring);
        assert_eq!(y, vec![10, 9, 8]);
        let mut out = vec![0; 3];
        scalar_mul(&mut out, &y, 3, ring);
        assert_eq!(out, vec![8, 5, 2]);
        assert!(!is_zero(&out));
        assert!(is_zero(&[0, 0]));
        Ok(())
    }

    #[quickcheck]
    fn prop_dot_matches_naive(n: u64, pairs: Vec<(u64, u64)>) -> bool {
        let n = n.max(1);
        let ring = ModRing::try_with(n).unwrap();
        let a: Vec<u64> = pairs.iter().map(|p| p.0 % n).collect();
        let b: Vec<u64> = pairs.iter().map(|p| p.1 % n).collect();
        dot(&a, &b, DotParams::new(a.len(), ring)) == naive_dot(&a, &b, n)
    }
}
