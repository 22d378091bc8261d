//! Products through exact f64 arithmetic.
//!
//! Entries are lifted to symmetric residues in `[-n/2, n/2]`, so every
//! integer entry of the product is bounded by `B = k * (n/2)^2`. While
//! `B < 2^53` a single f64 product is exact. Otherwise the product is taken
//! modulo several auxiliary primes `p` with `k * (p/2)^2 < 2^53`, each
//! exact in f64, and the shifted value `T + B` in `[0, 2B]` is rebuilt by
//! Garner's mixed-radix CRT directly modulo `n`.

use rayon::prelude::*;

use crate::config::MatContext;
use crate::matrix::{MatMut, MatRef};
use crate::ring::helper::{isqrt, mul_mod};
use crate::ring::{ModRing, prev_prime};

use super::Accumulate;

const EXACT_BITS: u32 = 53;
/// Auxiliary primes below this would need too many of them to be useful.
const MIN_AUX_PRIME: u64 = 1 << 8;

pub(crate) fn mul(ctx: &MatContext, mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, op: Accumulate) -> bool {
    let ring = a.ring();
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    if m == 0 || n == 0 || k == 0 || ring.is_trivial() {
        return false;
    }

    let half = (ring.modulus() / 2) as u128;
    let direct = (half * half)
        .checked_mul(k as u128)
        .is_some_and(|bound| bound < 1u128 << EXACT_BITS);

    let a_signed: Vec<i64> = a.row_slices().flatten().map(|&x| ring.to_signed(x)).collect();
    let bt = b.transpose();
    let bt_signed: Vec<i64> = bt.entries().iter().map(|&x| ring.to_signed(x)).collect();

    if direct {
        let af: Vec<f64> = a_signed.iter().map(|&x| x as f64).collect();
        let btf: Vec<f64> = bt_signed.iter().map(|&x| x as f64).collect();
        let product = gemm(ctx, m, k, n, &af, &btf);
        for i in 0..m {
            for (j, out) in c.row_mut(i).iter_mut().enumerate() {
                let value = ring.from_i64(product[i * n + j] as i64);
                *out = op.apply(*out, value, ring);
            }
        }
        return true;
    }

    let Some(plan) = CrtPlan::new(k, ring, ctx.tuning().float_max_primes) else {
        return false;
    };
    tracing::debug!(m, k, n, primes = plan.primes.len(), "f64 product with CRT");

    let residues: Vec<Vec<u64>> = plan
        .primes
        .iter()
        .map(|&p| {
            let af: Vec<f64> = a_signed.iter().map(|&x| symmetric(x, p) as f64).collect();
            let btf: Vec<f64> = bt_signed.iter().map(|&x| symmetric(x, p) as f64).collect();
            gemm(ctx, m, k, n, &af, &btf)
                .into_iter()
                .map(|v| (v as i64).rem_euclid(p as i64) as u64)
                .collect()
        })
        .collect();

    let mut digits = vec![0u64; plan.primes.len()];
    let mut column = vec![0u64; plan.primes.len()];
    for i in 0..m {
        for (j, out) in c.row_mut(i).iter_mut().enumerate() {
            for (slot, r) in column.iter_mut().zip(&residues) {
                *slot = r[i * n + j];
            }
            let value = plan.reconstruct(&column, &mut digits);
            *out = op.apply(*out, value, ring);
        }
    }
    true
}

/// Symmetric residue of `x` modulo an odd `p`.
fn symmetric(x: i64, p: u64) -> i64 {
    let p = p as i64;
    let r = x.rem_euclid(p);
    if r > p / 2 { r - p } else { r }
}

/// Rows per block handed to the f64 kernel.
const BLOCK_ROWS: usize = 64;

/// `A * Bᵀ` for row-major `A` (`m x k`) and `Bᵀ` (`n x k`); row blocks are
/// spread over the context's pool when it has one.
fn gemm(ctx: &MatContext, m: usize, k: usize, n: usize, a: &[f64], bt: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; m * n];
    let block_kernel = |(b, out_block): (usize, &mut [f64])| {
        let rows = out_block.len() / n;
        let start = b * BLOCK_ROWS * k;
        block_product(rows, k, n, &a[start..start + rows * k], bt, out_block);
    };
    match ctx.pool() {
        Some(pool) => pool.install(|| out.par_chunks_mut(n * BLOCK_ROWS).enumerate().for_each(block_kernel)),
        None => out.chunks_mut(n * BLOCK_ROWS).enumerate().for_each(block_kernel),
    }
    out
}

/// `out = A * Bᵀ` for one block of `rows` rows of `A`.
#[cfg(feature = "blas")]
fn block_product(rows: usize, k: usize, n: usize, a: &[f64], bt: &[f64], out: &mut [f64]) {
    assert!(a.len() == rows * k && bt.len() == n * k && out.len() == rows * n);
    // SAFETY: the lengths above cover every offset dgemm reads or writes:
    // A is rows x k row-major, B = Bᵀ transposed is read with row stride 1
    // and column stride k, C is rows x n row-major.
    unsafe {
        matrixmultiply::dgemm(
            rows,
            k,
            n,
            1.0,
            a.as_ptr(),
            k as isize,
            1,
            bt.as_ptr(),
            1,
            k as isize,
            0.0,
            out.as_mut_ptr(),
            n as isize,
            1,
        );
    }
}

#[cfg(not(feature = "blas"))]
fn block_product(rows: usize, k: usize, n: usize, a: &[f64], bt: &[f64], out: &mut [f64]) {
    for (a_row, out_row) in a.chunks_exact(k).zip(out.chunks_exact_mut(n)).take(rows) {
        for (o, bt_row) in out_row.iter_mut().zip(bt.chunks_exact(k)) {
            *o = dot_f64(a_row, bt_row);
        }
    }
}

#[cfg(not(feature = "blas"))]
fn dot_f64(x: &[f64], y: &[f64]) -> f64 {
    let mut acc = [0.0f64; 4];
    let (xs, ys) = (x.chunks_exact(4), y.chunks_exact(4));
    let (x_rest, y_rest) = (xs.remainder(), ys.remainder());
    for (cx, cy) in xs.zip(ys) {
        for l in 0..4 {
            acc[l] += cx[l] * cy[l];
        }
    }
    let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
    for (u, v) in x_rest.iter().zip(y_rest) {
        sum += u * v;
    }
    sum
}

/// Auxiliary primes with the constants for Garner reconstruction modulo `n`.
#[derive(Debug)]
struct CrtPlan {
    ring: ModRing,
    primes: Vec<u64>,
    /// `(p_0 ... p_{i-1})^-1 mod p_i`.
    inverses: Vec<u64>,
    /// `p_0 ... p_{i-1} mod n`.
    radix: Vec<u64>,
    /// `B mod p_i`.
    offset: Vec<u64>,
    offset_n: u64,
}

impl CrtPlan {
    fn new(k: usize, ring: ModRing, max_primes: usize) -> Option<Self> {
        let n = ring.modulus();
        let half = n / 2;

        // every residue product sum stays below 2^53 when |r| <= hp
        let hp = isqrt(((1u128 << EXACT_BITS) - 1) / k as u128) as u64;
        let mut candidate = prev_prime(hp.checked_mul(2)?.checked_add(2)?)?;

        // 2B + 1 < 2^needed
        let needed = bit_length(k as u64) + 2 * bit_length(half) + 1;
        let mut primes = Vec::new();
        let mut bits = 0;
        while bits < needed {
            if candidate < MIN_AUX_PRIME || primes.len() == max_primes {
                return None;
            }
            primes.push(candidate);
            bits += 63 - candidate.leading_zeros();
            candidate = prev_prime(candidate)?;
        }

        let mut inverses = Vec::with_capacity(primes.len());
        let mut radix = Vec::with_capacity(primes.len());
        let mut offset = Vec::with_capacity(primes.len());
        let mut radix_n = ring.one();
        for (i, &p) in primes.iter().enumerate() {
            let prefix = primes[..i].iter().fold(1, |acc, &q| mul_mod(acc, q, p));
            inverses.push(ModRing::try_with(p).ok()?.inv(prefix).ok()?);
            radix.push(radix_n);
            radix_n = ring.mul(radix_n, ring.reduce(p));
            offset.push(bound_mod(k, half, p));
        }

        Some(CrtPlan {
            ring,
            primes,
            inverses,
            radix,
            offset,
            offset_n: bound_mod(k, half, n),
        })
    }

    /// Rebuilds `T mod n` from the residues of `T`.
    fn reconstruct(&self, residues: &[u64], digits: &mut [u64]) -> u64 {
        let ring = self.ring;
        let mut value = 0;
        for (i, &p) in self.primes.iter().enumerate() {
            let shifted = (residues[i] + self.offset[i]) % p;
            let mut partial = 0;
            let mut weight = 1 % p;
            for (&d, &q) in digits[..i].iter().zip(&self.primes) {
                partial = (partial + mul_mod(d, weight, p)) % p;
                weight = mul_mod(weight, q, p);
            }
            digits[i] = mul_mod((shifted + p - partial) % p, self.inverses[i], p);
            value = ring.add(value, ring.mul(ring.reduce(digits[i]), self.radix[i]));
        }
        ring.sub(value, self.offset_n)
    }
}

fn bit_length(x: u64) -> u32 {
    64 - x.leading_zeros()
}

/// `k * h^2 mod q`.
fn bound_mod(k: usize, h: u64, q: u64) -> u64 {
    let h = h % q;
    mul_mod((k as u64) % q, mul_mod(h, h, q), q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::errors::NmodMatError;
    use crate::matrix::NmodMat;
    use crate::matrix::random::randtest;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn compare(ctx: &MatContext, modulus: u64, m: usize, k: usize, n: usize) -> Result<bool, NmodMatError> {
        let ring = ModRing::try_with(modulus)?;
        let mut rng = StdRng::seed_from_u64(modulus);
        let a = randtest(m, k, ring, &mut rng);
        let b = randtest(k, n, ring, &mut rng);

        let mut expected = NmodMat::new(m, n, ring);
        super::super::classical::mul(expected.view_mut(), a.view(), b.view(), Accumulate::Overwrite);
        let mut got = NmodMat::new(m, n, ring);
        let used = mul(ctx, got.view_mut(), a.view(), b.view(), Accumulate::Overwrite);
        if used {
            assert_eq!(got, expected, "{m}x{k}x{n} mod {modulus}");
        } else {
            assert!(got.is_zero());
        }
        Ok(used)
    }

    #[test]
    fn test_direct_path() -> Result<(), NmodMatError> {
        assert!(compare(&MatContext::default(), 1_000_003, 9, 30, 7)?);
        Ok(())
    }

    #[test]
    fn test_crt_path() -> Result<(), NmodMatError> {
        let ctx = MatContext::new(Tuning {
            float_max_primes: 8,
            ..Tuning::default()
        });
        assert!(compare(&ctx, 1_000_000_007, 6, 40, 5)?);
        assert!(compare(&ctx, (1 << 40) - 87, 5, 17, 6)?);
        Ok(())
    }

    #[test]
    fn test_crt_path_on_pool() -> Result<(), NmodMatError> {
        let ctx = MatContext::with_threads(
            2,
            Tuning {
                float_max_primes: 8,
                ..Tuning::default()
            },
        )?;
        assert!(compare(&ctx, 998_244_353, 10, 21, 9)?);
        Ok(())
    }

    #[test]
    fn test_declines_when_too_many_primes() -> Result<(), NmodMatError> {
        let ctx = MatContext::new(Tuning {
            float_max_primes: 2,
            ..Tuning::default()
        });
        assert!(!compare(&ctx, u64::MAX - 58, 4, 8, 4)?);
        Ok(())
    }

    #[test]
    fn test_blocks_match_integer_product() -> Result<(), NmodMatError> {
        let (m, k, n) = (BLOCK_ROWS + 5, 13, 6);
        let a: Vec<i64> = (0..m * k).map(|x| (x as i64 * 37) % 201 - 100).collect();
        let bt: Vec<i64> = (0..n * k).map(|x| (x as i64 * 53) % 151 - 75).collect();
        let af: Vec<f64> = a.iter().map(|&x| x as f64).collect();
        let btf: Vec<f64> = bt.iter().map(|&x| x as f64).collect();

        let expected: Vec<f64> = (0..m * n)
            .map(|idx| {
                let (i, j) = (idx / n, idx % n);
                (0..k).map(|l| a[i * k + l] * bt[j * k + l]).sum::<i64>() as f64
            })
            .collect();
        assert_eq!(gemm(&MatContext::default(), m, k, n, &af, &btf), expected);
        let ctx = MatContext::with_threads(2, Tuning::default())?;
        assert_eq!(gemm(&ctx, m, k, n, &af, &btf), expected);
        Ok(())
    }

    #[test]
    fn test_symmetric_residue() {
        assert_eq!(symmetric(10, 7), 3);
        assert_eq!(symmetric(-10, 7), -3);
        assert_eq!(symmetric(4, 7), -3);
    }
}
