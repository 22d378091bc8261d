//! Products of integer matrices through word-size primes.
//!
//! Both operands are reduced modulo enough 62-bit primes that twice the
//! largest possible entry of the product is below their product; the word
//! products are combined by incremental CRT and lifted to the symmetric
//! range.

use lazy_static::lazy_static;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::config::MatContext;
use crate::errors::NmodMatError;
use crate::matrix::NmodMat;
use crate::ring::{ModRing, prev_prime};

use super::mul;

const PRIME_BITS: u32 = 62;
const PRIME_TABLE_LEN: usize = 32;

lazy_static! {
    /// The largest primes below `2^62`, descending.
    static ref PRIMES: Vec<u64> = {
        let mut primes = Vec::with_capacity(PRIME_TABLE_LEN);
        let mut next = 1u64 << PRIME_BITS;
        while primes.len() < PRIME_TABLE_LEN {
            match prev_prime(next) {
                Some(p) => {
                    primes.push(p);
                    next = p;
                }
                None => break,
            }
        }
        primes
    };
}

/// A dense matrix of arbitrary-precision integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntMat {
    rows: usize,
    cols: usize,
    entries: Vec<BigInt>,
}

impl IntMat {
    pub fn new(rows: usize, cols: usize) -> Self {
        IntMat {
            rows,
            cols,
            entries: vec![BigInt::zero(); rows * cols],
        }
    }

    /// # Errors
    ///
    /// Returns `NmodMatError::DimensionMismatch` if the rows are ragged.
    pub fn from_rows(data: &[Vec<BigInt>]) -> Result<Self, NmodMatError> {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        let mut entries = Vec::with_capacity(rows * cols);
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(NmodMatError::DimensionMismatch(format!(
                    "Row {} has length {} but expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            entries.extend(row.iter().cloned());
        }
        Ok(IntMat { rows, cols, entries })
    }

    /// # Errors
    ///
    /// Returns `NmodMatError::DimensionMismatch` if the rows are ragged.
    pub fn from_i64_rows(data: &[Vec<i64>]) -> Result<Self, NmodMatError> {
        let rows: Vec<Vec<BigInt>> = data
            .iter()
            .map(|row| row.iter().map(|&v| BigInt::from(v)).collect())
            .collect();
        Self::from_rows(&rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> &BigInt {
        assert!(i < self.rows && j < self.cols, "entry ({i}, {j}) out of range");
        &self.entries[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: BigInt) {
        assert!(i < self.rows && j < self.cols, "entry ({i}, {j}) out of range");
        self.entries[i * self.cols + j] = value;
    }

    /// Bit length of the largest absolute entry; 0 for a zero matrix.
    pub fn max_bits(&self) -> u64 {
        self.entries.iter().map(BigInt::bits).max().unwrap_or(0)
    }

    /// Entries reduced into Z/nZ.
    pub fn reduce_mod(&self, ring: ModRing) -> NmodMat {
        let entries = self
            .entries
            .iter()
            .map(|x| {
                let r = residue(x.magnitude(), ring);
                if x.sign() == Sign::Minus { ring.neg(r) } else { r }
            })
            .collect();
        NmodMat::from_reduced(self.rows, self.cols, ring, entries)
    }

    /// `self * other` with the default context.
    ///
    /// # Errors
    ///
    /// See [`mul_multi_mod`].
    pub fn mul(&self, other: &IntMat) -> Result<IntMat, NmodMatError> {
        mul_multi_mod(&MatContext::default(), self, other)
    }
}

fn residue(x: &BigUint, ring: ModRing) -> u64 {
    x.iter_u64_digits()
        .rev()
        .fold(0, |acc, digit| ring.reduce_ll(acc, digit))
}

/// Exact integer product `A * B`.
///
/// # Errors
///
/// Returns `NmodMatError::InvalidParameters` if the entry bound needs more
/// 62-bit primes than can be found.
///
/// # Panics
///
/// Panics if the inner dimensions differ.
pub fn mul_multi_mod(ctx: &MatContext, a: &IntMat, b: &IntMat) -> Result<IntMat, NmodMatError> {
    assert_eq!(a.cols, b.rows, "inner dimensions differ");
    let (m, k, n) = (a.rows, a.cols, b.cols);

    let (bits_a, bits_b) = (a.max_bits(), b.max_bits());
    if m == 0 || n == 0 || k == 0 || bits_a == 0 || bits_b == 0 {
        return Ok(IntMat::new(m, n));
    }

    // |c| < k * 2^(bits_a + bits_b); the primes must exceed 2|c|
    let needed = bits_a + bits_b + u64::from(usize::BITS - k.leading_zeros()) + 1;
    let primes = primes_covering(needed)?;
    tracing::debug!(m, k, n, primes = primes.len(), "multimodular integer product");

    let mut images = Vec::with_capacity(primes.len());
    for &p in &primes {
        let ring = ModRing::try_with(p)?;
        let mut c = NmodMat::new(m, n, ring);
        mul(ctx, c.view_mut(), a.reduce_mod(ring).view(), b.reduce_mod(ring).view());
        images.push(c);
    }

    // moduli[i] = p_0 ... p_{i-1}, inverses[i] = moduli[i]^-1 mod p_i
    let mut moduli = Vec::with_capacity(primes.len());
    let mut inverses = Vec::with_capacity(primes.len());
    let mut modulus = BigUint::from(1u32);
    for (image, &p) in images.iter().zip(&primes) {
        let ring = image.ring();
        inverses.push(ring.inv(residue(&modulus, ring))?);
        moduli.push(modulus.clone());
        modulus *= p;
    }
    let half = &modulus >> 1u32;

    let mut out = IntMat::new(m, n);
    for (idx, entry) in out.entries.iter_mut().enumerate() {
        let mut x = BigUint::zero();
        for (i, image) in images.iter().enumerate() {
            let ring = image.ring();
            let r = image.entries()[idx];
            let delta = ring.mul(ring.sub(r, residue(&x, ring)), inverses[i]);
            x += &moduli[i] * delta;
        }
        *entry = if x > half {
            BigInt::from(x) - BigInt::from(modulus.clone())
        } else {
            BigInt::from(x)
        };
    }
    Ok(out)
}

fn primes_covering(bits: u64) -> Result<Vec<u64>, NmodMatError> {
    let mut primes = Vec::new();
    let mut covered = 0u64;
    let mut table = PRIMES.iter().copied();
    let mut last = 1u64 << PRIME_BITS;
    while covered < bits {
        let p = match table.next() {
            Some(p) => p,
            None => prev_prime(last).ok_or_else(|| {
                NmodMatError::InvalidParameters(format!("no primes left to cover {bits} bits"))
            })?,
        };
        covered += u64::from(63 - p.leading_zeros());
        primes.push(p);
        last = p;
    }
    Ok(primes)
}
