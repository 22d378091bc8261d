//! Entrywise matrix arithmetic.

use std::ops::{Add, Neg, Sub};

use crate::vector;

use super::{MatMut, MatRef, NmodMat};

fn check_same_shape(c: &MatMut<'_>, a: &MatRef<'_>) {
    assert!(
        c.rows() == a.rows() && c.cols() == a.cols(),
        "shape mismatch: {}x{} vs {}x{}",
        c.rows(),
        c.cols(),
        a.rows(),
        a.cols()
    );
    assert_eq!(c.ring(), a.ring(), "operands over different moduli");
}

/// `C = A + B`.
pub fn add(mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_same_shape(&c, &a);
    check_same_shape(&c, &b);
    let ring = c.ring();
    for i in 0..c.rows() {
        vector::add(c.row_mut(i), a.row(i), b.row(i), ring);
    }
}

/// `C = A - B`.
pub fn sub(mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    check_same_shape(&c, &a);
    check_same_shape(&c, &b);
    let ring = c.ring();
    for i in 0..c.rows() {
        vector::sub(c.row_mut(i), a.row(i), b.row(i), ring);
    }
}

/// `C += A`.
pub fn add_assign(mut c: MatMut<'_>, a: MatRef<'_>) {
    check_same_shape(&c, &a);
    let ring = c.ring();
    for i in 0..c.rows() {
        vector::add_assign(c.row_mut(i), a.row(i), ring);
    }
}

/// `C -= A`.
pub fn sub_assign(mut c: MatMut<'_>, a: MatRef<'_>) {
    check_same_shape(&c, &a);
    let ring = c.ring();
    for i in 0..c.rows() {
        vector::sub_assign(c.row_mut(i), a.row(i), ring);
    }
}

/// `C = A - C`.
pub fn rsub_assign(mut c: MatMut<'_>, a: MatRef<'_>) {
    check_same_shape(&c, &a);
    let ring = c.ring();
    for i in 0..c.rows() {
        vector::rsub_assign(c.row_mut(i), a.row(i), ring);
    }
}

pub fn neg_assign(mut c: MatMut<'_>) {
    let ring = c.ring();
    for i in 0..c.rows() {
        vector::neg(c.row_mut(i), ring);
    }
}

/// `C = s * C` for a scalar `s`, reduced first.
pub fn scalar_mul_assign(mut c: MatMut<'_>, s: u64) {
    let ring = c.ring();
    let s = ring.reduce(s);
    for i in 0..c.rows() {
        vector::scalar_mul_assign(c.row_mut(i), s, ring);
    }
}

impl NmodMat {
    pub fn add(&self, other: &NmodMat) -> NmodMat {
        let mut out = NmodMat::new(self.rows(), self.cols(), self.ring());
        add(out.view_mut(), self.view(), other.view());
        out
    }

    pub fn sub(&self, other: &NmodMat) -> NmodMat {
        let mut out = NmodMat::new(self.rows(), self.cols(), self.ring());
        sub(out.view_mut(), self.view(), other.view());
        out
    }

    pub fn neg(&self) -> NmodMat {
        let mut out = self.clone();
        neg_assign(out.view_mut());
        out
    }

    pub fn scalar_mul(&self, s: u64) -> NmodMat {
        let mut out = self.clone();
        scalar_mul_assign(out.view_mut(), s);
        out
    }
}

impl Add for &NmodMat {
    type Output = NmodMat;

    fn add(self, rhs: Self) -> NmodMat {
        NmodMat::add(self, rhs)
    }
}

impl Sub for &NmodMat {
    type Output = NmodMat;

    fn sub(self, rhs: Self) -> NmodMat {
        NmodMat::sub(self, rhs)
    }
}

impl Neg for &NmodMat {
    type Output = NmodMat;

    fn neg(self) -> NmodMat {
        NmodMat::neg(self)
    }
}
