//! Random matrices with controlled structure, for tests and benchmarks.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::ring::ModRing;
use crate::vector;

use super::NmodMat;

/// Uniformly random entries.
pub fn randtest<R: Rng + ?Sized>(rows: usize, cols: usize, ring: ModRing, rng: &mut R) -> NmodMat {
    let n = ring.modulus();
    let entries = (0..rows * cols).map(|_| rng.random_range(0..n)).collect();
    NmodMat::from_reduced(rows, cols, ring, entries)
}

/// A uniformly random unit of the ring.
pub fn random_unit<R: Rng + ?Sized>(ring: ModRing, rng: &mut R) -> u64 {
    loop {
        let x = rng.random_range(0..ring.modulus());
        if ring.is_unit(x) {
            return x;
        }
    }
}

/// A matrix of exactly the given rank: `rank` unit entries placed on the
/// diagonal of randomly permuted rows and columns, zero elsewhere. Follow
/// with [`randops`] to hide the structure.
pub fn randrank<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    rank: usize,
    ring: ModRing,
    rng: &mut R,
) -> NmodMat {
    assert!(rank <= rows.min(cols), "rank {rank} impossible for {rows}x{cols}");
    assert!(rank == 0 || !ring.is_trivial(), "the trivial ring only has rank 0");

    let mut row_idx: Vec<usize> = (0..rows).collect();
    let mut col_idx: Vec<usize> = (0..cols).collect();
    row_idx.shuffle(rng);
    col_idx.shuffle(rng);

    let mut m = NmodMat::new(rows, cols, ring);
    for k in 0..rank {
        let unit = random_unit(ring, rng);
        m.set(row_idx[k], col_idx[k], unit);
    }
    m
}

/// Applies `count` random elementary operations, each adding a multiple of
/// one row (or column) to another. Rank and determinant are preserved.
pub fn randops<R: Rng + ?Sized>(m: &mut NmodMat, count: usize, rng: &mut R) {
    let (rows, cols) = (m.rows(), m.cols());
    let ring = m.ring();
    let n = ring.modulus();
    if rows == 0 || cols == 0 {
        return;
    }

    let mut view = m.view_mut();
    for _ in 0..count {
        let c = rng.random_range(0..n);
        if rng.random::<bool>() {
            if rows < 2 {
                continue;
            }
            let (i, j) = distinct_pair(rows, rng);
            let (target, source) = view.row_pair_mut(i, j);
            vector::scalar_addmul(target, source, c, ring);
        } else {
            if cols < 2 {
                continue;
            }
            let (i, j) = distinct_pair(cols, rng);
            for r in 0..rows {
                let row = view.row_mut(r);
                row[i] = ring.add(row[i], ring.mul(c, row[j]));
            }
        }
    }
}

fn distinct_pair<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    let i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}

/// Random lower-triangular matrix whose diagonal entries are units, all
/// ones when `unit` is set.
pub fn randtril<R: Rng + ?Sized>(n: usize, ring: ModRing, unit: bool, rng: &mut R) -> NmodMat {
    let mut m = randtest(n, n, ring, rng);
    for i in 0..n {
        let diag = if unit { ring.one() } else { random_unit(ring, rng) };
        let row = m.row_mut(i);
        row[i] = diag;
        row[i + 1..].fill(0);
    }
    m
}

/// Random upper-triangular matrix, see [`randtril`].
pub fn randtriu<R: Rng + ?Sized>(n: usize, ring: ModRing, unit: bool, rng: &mut R) -> NmodMat {
    let mut m = randtril(n, ring, unit, rng);
    m.transpose_in_place();
    m
}
