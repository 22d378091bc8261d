//! Tiled product on the context's worker pool.
//!
//! The output is cut into disjoint tiles. Workers claim tiles from a shared
//! queue until it drains, so tiles of unequal cost balance out. Each tile
//! runs one of two kernels:
//!
//! * packed: for small moduli the whole dot product fits one word, so a tile
//!   row is accumulated as a linear combination of rows of `B`. When
//!   `k*(n-1)^2 < 2^32` two entries of `B` share a word and a single
//!   multiply-add serves both;
//! * transposed: one dot product per entry against a transposed copy of `B`.

use std::sync::{Mutex, PoisonError};

use crate::config::MatContext;
use crate::matrix::{MatMut, MatRef};
use crate::ring::ModRing;
use crate::vector::{DotMethod, DotParams, dot};

use super::Accumulate;

const HALF_WORD: u32 = 32;
const LOW_HALF: u64 = (1 << HALF_WORD) - 1;

pub(crate) fn mul(ctx: &MatContext, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, op: Accumulate) {
    let Some(pool) = ctx.pool() else {
        super::classical::mul(c, a, b, op);
        return;
    };

    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let ring = a.ring();
    let tuning = ctx.tuning();
    let params = DotParams::new(k, ring);

    if params.method == DotMethod::OneLimb && m.min(n) >= tuning.packed_min_dim {
        let slots = if fits_half_word(k, ring) { 2 } else { 1 };
        let packed = PackedB::new(b, slots);
        tracing::trace!(m, k, n, slots, "packed tiles");
        run_tiles(pool, c, tuning.tile_rows, tuning.tile_cols, |r0, c0, tile| {
            packed_tile(a, &packed, ring, r0, c0, tile, op)
        });
    } else {
        let bt = b.transpose();
        run_tiles(pool, c, tuning.tile_rows, tuning.tile_cols, |r0, c0, mut tile| {
            for i in 0..tile.rows() {
                let a_row = a.row(r0 + i);
                for (j, out) in tile.row_mut(i).iter_mut().enumerate() {
                    let value = dot(a_row, bt.row(c0 + j), params);
                    *out = op.apply(*out, value, ring);
                }
            }
        });
    }
}

fn fits_half_word(len: usize, ring: ModRing) -> bool {
    let max = (ring.modulus() - 1) as u128;
    (max * max)
        .checked_mul(len as u128)
        .is_some_and(|bound| bound <= LOW_HALF as u128)
}

fn run_tiles<'c, F>(pool: &rayon::ThreadPool, c: MatMut<'c>, tile_rows: usize, tile_cols: usize, work: F)
where
    F: Fn(usize, usize, MatMut<'c>) + Sync,
{
    let tiles = c.into_tiles(tile_rows, tile_cols);
    let workers = pool.current_num_threads().min(tiles.len());
    let queue = Mutex::new(tiles.into_iter());

    pool.scope(|s| {
        for _ in 0..workers {
            s.spawn(|_| {
                loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some((r0, c0, tile)) = next else {
                        break;
                    };
                    work(r0, c0, tile);
                }
            });
        }
    });
}

/// `B` with `slots` consecutive entries of a row sharing one word.
struct PackedB {
    words: Vec<u64>,
    width: usize,
    slots: usize,
}

impl PackedB {
    fn new(b: MatRef<'_>, slots: usize) -> Self {
        let width = b.cols().div_ceil(slots);
        let mut words = vec![0u64; b.rows() * width];
        for (l, row) in b.row_slices().enumerate() {
            let packed = &mut words[l * width..(l + 1) * width];
            for (word, chunk) in packed.iter_mut().zip(row.chunks(slots)) {
                *word = chunk
                    .iter()
                    .enumerate()
                    .fold(0, |acc, (s, &v)| acc | v << (s as u32 * HALF_WORD));
            }
        }
        PackedB { words, width, slots }
    }

    fn row(&self, l: usize, from: usize, to: usize) -> &[u64] {
        &self.words[l * self.width + from..l * self.width + to]
    }

    fn unpack(&self, word: u64, slot: usize) -> u64 {
        if self.slots == 1 {
            word
        } else if slot == 0 {
            word & LOW_HALF
        } else {
            word >> HALF_WORD
        }
    }
}

fn packed_tile(
    a: MatRef<'_>,
    packed: &PackedB,
    ring: ModRing,
    r0: usize,
    c0: usize,
    mut tile: MatMut<'_>,
    op: Accumulate,
) {
    // tile_cols is even, so a tile never starts inside a shared word
    let slots = packed.slots;
    let first = c0 / slots;
    let last = (c0 + tile.cols()).div_ceil(slots);
    let mut acc = vec![0u64; last - first];

    for i in 0..tile.rows() {
        acc.fill(0);
        for (l, &x) in a.row(r0 + i).iter().enumerate() {
            if x == 0 {
                continue;
            }
            for (s, &y) in acc.iter_mut().zip(packed.row(l, first, last)) {
                *s += x * y;
            }
        }
        for (j, out) in tile.row_mut(i).iter_mut().enumerate() {
            let value = ring.reduce(packed.unpack(acc[j / slots], j % slots));
            *out = op.apply(*out, value, ring);
        }
    }
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

    fn pooled(packed_min_dim: usize) -> Result<MatContext, NmodMatError> {
        MatContext::with_threads(
            3,
            Tuning {
                packed_min_dim,
                tile_rows: 5,
                tile_cols: 6,
                ..Tuning::default()
            },
        )
    }

    fn check_against_classical(ctx: &MatContext, modulus: u64, m: usize, k: usize, n: usize) -> Result<(), NmodMatError> {
        let ring = ModRing::try_with(modulus)?;
        let mut rng = StdRng::seed_from_u64(modulus ^ (m * k * n) as u64);
        let a = randtest(m, k, ring, &mut rng);
        let b = randtest(k, n, ring, &mut rng);

        let mut expected = randtest(m, n, ring, &mut rng);
        let mut got = expected.clone();
        super::super::classical::mul(expected.view_mut(), a.view(), b.view(), Accumulate::Sub);
        mul(ctx, got.view_mut(), a.view(), b.view(), Accumulate::Sub);
        assert_eq!(got, expected, "{m}x{k}x{n} mod {modulus}");
        Ok(())
    }

    #[test]
    fn test_two_slot_packing() -> Result<(), NmodMatError> {
        let ctx = pooled(1)?;
        assert!(fits_half_word(40, ModRing::try_with(1000)?));
        check_against_classical(&ctx, 1000, 17, 40, 23)
    }

    #[test]
    fn test_one_slot_packing() -> Result<(), NmodMatError> {
        let ctx = pooled(1)?;
        assert!(!fits_half_word(30, ModRing::try_with(1 << 20)?));
        check_against_classical(&ctx, 1 << 20, 13, 30, 19)
    }

    #[test]
    fn test_transposed_kernel() -> Result<(), NmodMatError> {
        let ctx = pooled(usize::MAX)?;
        check_against_classical(&ctx, 1_000_000_007, 11, 9, 14)?;
        check_against_classical(&ctx, u64::MAX - 58, 7, 4, 8)
    }

    #[test]
    fn test_without_pool_falls_back() -> Result<(), NmodMatError> {
        check_against_classical(&MatContext::default(), 97, 6, 5, 4)
    }

    #[test]
    fn test_packing_layout() -> Result<(), NmodMatError> {
        let ring = ModRing::try_with(7)?;
        let b = NmodMat::from_rows(&[vec![1, 2, 3]], ring)?;
        let packed = PackedB::new(b.view(), 2);
        assert_eq!(packed.width, 2);
        assert_eq!(packed.words, vec![1u64 | 2 << 32, 3]);
        assert_eq!(packed.unpack(packed.words[0], 1), 2);
        Ok(())
    }
}
