//! Howell form over Z/nZ for arbitrary `n`.
//!
//! Elimination uses only unimodular row combinations, so it never needs an
//! inverse. Each pivot is scaled by a unit to the divisor `gcd(pivot, n)`,
//! entries above it are reduced modulo that divisor, and the row multiplied
//! by `n / pivot` (which vanishes in the pivot column) is kept as an extra
//! row. Those extra rows give the form its defining property: every vector
//! of the row span whose first `k` entries vanish is spanned by the rows
//! whose pivots lie beyond column `k`.

use crate::matrix::{MatMut, NmodMat};
use crate::ring::{ModRing, extended_gcd, gcd};
use crate::vector;

/// Overwrites `a` with its strong echelon form: row `k` is the row with
/// pivot in column `k`, or zero when column `k` has none. Rows from `cols`
/// on end up zero.
///
/// # Panics
///
/// Panics if `a` has fewer rows than columns; pad with zero rows first.
///
/// # Example
///
/// ```
/// # use nmod_mat::{ModRing, NmodMat};
/// let ring = ModRing::try_with(12).unwrap();
/// let mut a = NmodMat::from_rows(&[vec![4, 1], vec![0, 0]], ring).unwrap();
/// nmod_mat::echelon::strong_echelon_form(a.view_mut());
/// assert_eq!(a.row(0), &[4, 1]);
/// assert_eq!(a.row(1), &[0, 3]);
/// ```
pub fn strong_echelon_form(mut a: MatMut<'_>) {
    let (m, n) = (a.rows(), a.cols());
    assert!(m >= n, "strong echelon form needs at least as many rows as columns, got {m}x{n}");
    let ring = a.ring();
    if ring.is_trivial() {
        a.fill_zero();
        return;
    }

    // room for one annihilator row per column
    let mut w = NmodMat::new(m + n, n, ring);
    w.window_mut(0, 0, m, n).copy_from(a.rb());
    let mut len = m;
    let mut pivot_rows = vec![None; n];
    let mut r = 0;

    for k in 0..n {
        if r == len {
            break;
        }
        let mut work = w.view_mut();
        for i in r + 1..len {
            combine(&mut work, r, i, k, ring);
        }
        if work.get(r, k) == 0 {
            continue;
        }

        normalize(work.row_mut(r), k, ring);
        let pivot = work.get(r, k);
        for i in 0..r {
            let (row, pivot_row) = work.row_pair_mut(i, r);
            let q = row[k] / pivot;
            if q != 0 {
                vector::scalar_submul(row, pivot_row, q, ring);
            }
        }

        let annihilator = ring.modulus() / pivot;
        let mut extra = work.row(r).to_vec();
        vector::scalar_mul_assign(&mut extra, annihilator, ring);
        if !vector::is_zero(&extra) {
            w.row_mut(len).copy_from_slice(&extra);
            len += 1;
        }

        pivot_rows[k] = Some(r);
        r += 1;
    }

    a.fill_zero();
    for (k, source) in pivot_rows.iter().enumerate() {
        if let Some(t) = source {
            a.row_mut(k).copy_from_slice(w.row(*t));
        }
    }
}

/// Rows `r` and `i` replaced by a unimodular combination that moves
/// `gcd(w[r][k], w[i][k])` into row `r` and clears `w[i][k]`.
fn combine(w: &mut MatMut<'_>, r: usize, i: usize, k: usize, ring: ModRing) {
    let (x, y) = (w.get(r, k), w.get(i, k));
    if y == 0 {
        return;
    }
    if x == 0 {
        w.swap_rows(r, i);
        return;
    }

    let (g, s, t) = extended_gcd(x, y);
    let (s, t) = (ring.from_i128(s), ring.from_i128(t));
    let (u, v) = (ring.neg(y / g), x / g);
    let (top, bottom) = w.row_pair_mut(r, i);
    for (p, q) in top.iter_mut().zip(bottom.iter_mut()) {
        let (old_p, old_q) = (*p, *q);
        *p = ring.add(ring.mul(s, old_p), ring.mul(t, old_q));
        *q = ring.add(ring.mul(u, old_p), ring.mul(v, old_q));
    }
}

/// Scales `row` by a unit so that its entry in column `k` becomes
/// `gcd(row[k], n)`.
fn normalize(row: &mut [u64], k: usize, ring: ModRing) {
    let n = ring.modulus();
    let p = row[k];
    let g = gcd(p, n);
    if p == g {
        return;
    }

    // u * (p/g) = 1 mod n/g, lifted to a unit of Z/nZ
    let cofactor = n / g;
    let base = match ModRing::try_with(cofactor).and_then(|r| r.inv((p / g) % cofactor)) {
        Ok(b) => b,
        Err(_) => return,
    };
    let mut unit = base;
    while !ring.is_unit(unit) {
        unit += cofactor;
    }
    vector::scalar_mul_assign(row, unit, ring);
}

/// Overwrites `a` with its Howell form, nonzero rows first, and returns
/// the number of nonzero rows.
///
/// The form is canonical: two matrices with the same row span over Z/nZ
/// have the same Howell form.
///
/// # Panics
///
/// Panics if `a` has fewer rows than columns.
pub fn howell_form(mut a: MatMut<'_>) -> usize {
    strong_echelon_form(a.rb_mut());
    let mut count = 0;
    for i in 0..a.rows() {
        if vector::is_zero(a.row(i)) {
            continue;
        }
        if i != count {
            a.swap_rows(i, count);
        }
        count += 1;
    }
    count
}

impl NmodMat {
    /// Howell form and the number of nonzero rows.
    pub fn howell_form(&self) -> (usize, NmodMat) {
        let mut out = self.clone();
        let count = howell_form(out.view_mut());
        (count, out)
    }
}
