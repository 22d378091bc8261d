//! Word-size modular arithmetic with a preinverted divisor.

use crate::errors::NmodMatError;

use super::extended_gcd;

use serde::{Deserialize, Serialize};

/// Represents the ring Z/nZ for a word-size modulus `n >= 1`.
///
/// Besides the modulus the ring keeps the normalization shift and the
/// preinverted normalized divisor, so double- and triple-word values are
/// reduced without a hardware 128-bit division. `n == 1` is the trivial ring
/// in which every element is 0.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ModRing {
    n: u64,
    ninv: u64,
    norm: u32,
}

impl ModRing {
    /// Create a new ring with the given modulus.
    ///
    /// The modulus must be at least 1.
    pub fn try_with(modulus: u64) -> Result<Self, NmodMatError> {
        if modulus == 0 {
            return Err(NmodMatError::InvalidModulus(
                "Modulus must be at least 1, got 0".to_string(),
            ));
        }

        let norm = modulus.leading_zeros();
        let normalized = (modulus << norm) as u128;
        let ninv = (u128::MAX / normalized) as u64;

        Ok(ModRing {
            n: modulus,
            ninv,
            norm,
        })
    }

    /// Returns the modulus of the ring.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// let ring = ModRing::try_with(13).unwrap();
    /// assert_eq!(ring.modulus(), 13);
    /// ```
    pub fn modulus(&self) -> u64 {
        self.n
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> u32 {
        64 - self.norm
    }

    pub fn is_trivial(&self) -> bool {
        self.n == 1
    }

    /// The multiplicative identity, which is 0 in the trivial ring.
    pub fn one(&self) -> u64 {
        1 % self.n
    }

    /// Reduces a single word.
    #[inline]
    pub fn reduce(&self, x: u64) -> u64 {
        x % self.n
    }

    /// Reduces `hi * 2^64 + lo`.
    #[inline]
    pub fn reduce_ll(&self, hi: u64, lo: u64) -> u64 {
        let hi = if hi >= self.n { hi % self.n } else { hi };
        if self.norm == 0 {
            return self.divrem_preinv(hi, lo);
        }
        let u1 = (hi << self.norm) | (lo >> (64 - self.norm));
        let u0 = lo << self.norm;
        self.divrem_preinv(u1, u0) >> self.norm
    }

    /// Reduces a double-word value.
    #[inline]
    pub fn reduce_wide(&self, x: u128) -> u64 {
        self.reduce_ll((x >> 64) as u64, x as u64)
    }

    /// Reduces the three-word value `hi * 2^128 + mid * 2^64 + lo`.
    #[inline]
    pub fn reduce_triple(&self, hi: u64, mid: u64, lo: u64) -> u64 {
        let top = self.reduce_ll(hi, mid);
        self.reduce_ll(top, lo)
    }

    // Remainder of (u1:u0) by the normalized divisor, requires u1 < n << norm.
    #[inline]
    fn divrem_preinv(&self, u1: u64, u0: u64) -> u64 {
        let d = self.n << self.norm;
        let q = (self.ninv as u128 * u1 as u128).wrapping_add(((u1 as u128) << 64) | u0 as u128);
        let q1 = ((q >> 64) as u64).wrapping_add(1);
        let q0 = q as u64;

        let mut r = u0.wrapping_sub(q1.wrapping_mul(d));
        if r > q0 {
            r = r.wrapping_add(d);
        }
        if r >= d {
            r -= d;
        }
        r
    }

    /// Lifts a signed integer into `[0, n)`.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// let ring = ModRing::try_with(10).unwrap();
    /// assert_eq!(ring.from_i64(15), 5);
    /// assert_eq!(ring.from_i64(-3), 7);
    /// assert_eq!(ring.from_i64(0), 0);
    /// ```
    pub fn from_i64(&self, value: i64) -> u64 {
        (value as i128).rem_euclid(self.n as i128) as u64
    }

    pub fn from_i128(&self, value: i128) -> u64 {
        value.rem_euclid(self.n as i128) as u64
    }

    /// Symmetric representative of `a`, in `[-n/2, n/2]`.
    pub fn to_signed(&self, a: u64) -> i64 {
        if a > self.n / 2 {
            (a as i128 - self.n as i128) as i64
        } else {
            a as i64
        }
    }

    /// Computes `(a + b) mod n` for reduced operands.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// let ring = ModRing::try_with(10).unwrap();
    /// assert_eq!(ring.add(7, 5), 2);
    /// let big = ModRing::try_with(u64::MAX).unwrap();
    /// assert_eq!(big.add(u64::MAX - 1, u64::MAX - 1), u64::MAX - 2);
    /// ```
    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        if a < self.n - b { a + b } else { a - (self.n - b) }
    }

    /// Computes `(a - b) mod n` for reduced operands.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// let ring = ModRing::try_with(10).unwrap();
    /// assert_eq!(ring.sub(7, 5), 2);
    /// assert_eq!(ring.sub(3, 5), 8);
    /// ```
    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        if a >= b { a - b } else { self.n - (b - a) }
    }

    /// Computes the additive inverse `-a mod n`.
    #[inline]
    pub fn neg(&self, a: u64) -> u64 {
        if a == 0 { 0 } else { self.n - a }
    }

    /// Computes `(a * b) mod n` for reduced operands.
    ///
    /// The product is formed in a double word and reduced with the
    /// preinverted divisor.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// let ring = ModRing::try_with(1_000_000_007).unwrap();
    /// assert_eq!(ring.mul(1_000_000_006, 1_000_000_006), 1);
    /// ```
    #[inline]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        self.reduce_wide(a as u128 * b as u128)
    }

    /// Computes `a^e mod n` by square-and-multiply; `a^0 == 1`.
    pub fn pow(&self, a: u64, mut e: u64) -> u64 {
        let mut base = a;
        let mut acc = self.one();
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            e >>= 1;
        }
        acc
    }

    /// Whether `a` is a unit, i.e. `gcd(a, n) == 1`.
    pub fn is_unit(&self, a: u64) -> bool {
        super::gcd(a, self.n) == 1
    }

    /// Computes the modular multiplicative inverse `a^-1 mod n`.
    ///
    /// The inverse exists if and only if `gcd(a, n) == 1`. In the trivial ring
    /// `0` is its own inverse.
    ///
    /// # Errors
    ///
    /// Returns `NmodMatError::NoInverse` if `a` is 0 in a nontrivial ring or
    /// shares a factor with the modulus.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::ring::ModRing;
    /// let ring = ModRing::try_with(10).unwrap();
    /// assert_eq!(ring.inv(3).unwrap(), 7);
    /// assert_eq!(ring.inv(9).unwrap(), 9);
    /// assert!(ring.inv(2).is_err());
    /// assert!(ring.inv(0).is_err());
    /// ```
    pub fn inv(&self, a: u64) -> Result<u64, NmodMatError> {
        if self.n == 1 {
            return Ok(0);
        }
        if a == 0 {
            return Err(NmodMatError::NoInverse(format!(
                "Cannot invert 0 in mod {}",
                self.n
            )));
        }

        let (g, x, _) = extended_gcd(a, self.n);
        if g != 1 {
            return Err(NmodMatError::NoInverse(format!(
                "Modular inverse does not exist for {} mod {} (gcd={})",
                a, self.n, g
            )));
        }

        Ok(self.from_i128(x))
    }
}

impl TryFrom<u64> for ModRing {
    type Error = NmodMatError;

    fn try_from(modulus: u64) -> Result<Self, Self::Error> {
        ModRing::try_with(modulus)
    }
}

impl From<ModRing> for u64 {
    fn from(ring: ModRing) -> u64 {
        ring.n
    }
}
