//! Word-size number theory used by the ring and by the prime-selecting
//! multiplication paths.

use num_integer::{ExtendedGcd, Integer};

/// Greatest common divisor of two words; `gcd(0, 0) == 0`.
pub fn gcd(a: u64, b: u64) -> u64 {
    a.gcd(&b)
}

/// Extended Euclid on words.
///
/// Returns `(g, x, y)` with `a*x + b*y == g` over the integers.
pub fn extended_gcd(a: u64, b: u64) -> (u64, i128, i128) {
    let ExtendedGcd { gcd, x, y, .. } = (a as i128).extended_gcd(&(b as i128));
    (gcd as u64, x, y)
}

#[inline]
pub(crate) fn mul_mod(a: u64, b: u64, n: u64) -> u64 {
    ((a as u128 * b as u128) % n as u128) as u64
}

pub(crate) fn pow_mod(mut base: u64, mut exp: u64, n: u64) -> u64 {
    let mut acc = 1 % n;
    base %= n;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, n);
        }
        base = mul_mod(base, base, n);
        exp >>= 1;
    }
    acc
}

// Deterministic Miller-Rabin witnesses for every 64-bit input.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Deterministic primality test for 64-bit words.
///
/// # Example
///
/// ```
/// # use nmod_mat::ring::is_prime;
/// assert!(is_prime(1_000_000_007));
/// assert!(!is_prime(1_000_000_007 * 3));
/// assert!(!is_prime(1));
/// ```
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Largest prime strictly below `n`, if any.
pub fn prev_prime(n: u64) -> Option<u64> {
    let mut candidate = n.checked_sub(1)?;
    while candidate >= 2 {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate -= 1;
    }
    None
}

/// Integer square root, rounded down.
pub(crate) fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = (n as f64).sqrt() as u128;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_gcd_identity() {
        let (g, x, y) = extended_gcd(240, 46);
        assert_eq!(g, 2);
        assert_eq!(240 * x + 46 * y, 2);

        let (g, x, y) = extended_gcd(u64::MAX, u64::MAX - 1);
        assert_eq!(g, 1);
        assert_eq!(u64::MAX as i128 * x + (u64::MAX - 1) as i128 * y, 1);
    }

    #[test]
    fn test_is_prime_small_and_large() {
        let small: Vec<u64> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(
            small,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
        // 2^64 - 59 is the largest 64-bit prime
        assert!(is_prime(u64::MAX - 58));
        assert!(!is_prime(u64::MAX));
        // Carmichael number
        assert!(!is_prime(561));
        // strong pseudoprime to bases 2, 3, 5, 7
        assert!(!is_prime(3_215_031_751));
    }

    #[test]
    fn test_prev_prime() {
        assert_eq!(prev_prime(2), None);
        assert_eq!(prev_prime(3), Some(2));
        assert_eq!(prev_prime(100), Some(97));
        assert_eq!(prev_prime(1 << 62), Some((1 << 62) - 57));
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(u64::MAX as u128), (1 << 32) - 1);
        assert_eq!(isqrt(1u128 << 100), 1u128 << 50);
    }
}
