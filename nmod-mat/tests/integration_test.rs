use nmod_mat::errors::NmodMatError;
use nmod_mat::matrix::random::{randops, randrank, randtest, randtril, randtriu};
use nmod_mat::mul::multi_mod::{IntMat, mul_multi_mod};
use nmod_mat::mul::{mul_classical, mul_float, mul_strassen, mul_threaded};
use nmod_mat::{MatContext, ModRing, NmodMat, Tuning};

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Once;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap();
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_line_number(false)
            .with_file(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    });
}

fn small_cutoffs() -> Tuning {
    Tuning {
        strassen_cutoff: 8,
        float_enabled: false,
        lu_recursive_cutoff: 8,
        solve_tri_rows_cutoff: 4,
        solve_tri_cols_cutoff: 2,
        ..Tuning::default()
    }
}

fn contexts() -> Result<Vec<MatContext>, NmodMatError> {
    let threaded = Tuning {
        threaded_min_dim: 4,
        packed_min_dim: 16,
        tile_rows: 16,
        tile_cols: 16,
        ..small_cutoffs()
    };
    Ok(vec![
        MatContext::default(),
        MatContext::new(small_cutoffs()),
        MatContext::with_threads(4, threaded)?,
    ])
}

const MODULI: [u64; 6] = [2, 17, 65_537, 1_000_000_007, (1 << 61) - 1, u64::MAX];

#[test]
fn test_every_strategy_agrees_with_classical() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(2024);
    let strassen_ctx = MatContext::new(small_cutoffs());
    let threaded_ctx = MatContext::with_threads(
        3,
        Tuning {
            threaded_min_dim: 1,
            packed_min_dim: 8,
            tile_rows: 8,
            tile_cols: 8,
            ..small_cutoffs()
        },
    )?;

    for modulus in MODULI {
        let ring = ModRing::try_with(modulus)?;
        for &(m, k, n) in &[(33, 40, 29), (64, 64, 64), (17, 90, 35)] {
            let a = randtest(m, k, ring, &mut rng);
            let b = randtest(k, n, ring, &mut rng);
            let mut expected = NmodMat::new(m, n, ring);
            mul_classical(expected.view_mut(), a.view(), b.view());

            let mut c = NmodMat::new(m, n, ring);
            mul_strassen(&strassen_ctx, c.view_mut(), a.view(), b.view());
            assert_eq!(c, expected, "strassen {m}x{k}x{n} mod {modulus}");

            let mut c = NmodMat::new(m, n, ring);
            mul_threaded(&threaded_ctx, c.view_mut(), a.view(), b.view());
            assert_eq!(c, expected, "threaded {m}x{k}x{n} mod {modulus}");

            let mut c = NmodMat::new(m, n, ring);
            if mul_float(&MatContext::default(), c.view_mut(), a.view(), b.view()) {
                assert_eq!(c, expected, "float {m}x{k}x{n} mod {modulus}");
            } else {
                info!(modulus, m, k, n, "float product declined");
            }
        }
    }
    Ok(())
}

#[test]
fn test_float_product_covers_word_primes() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(7);
    let ring = ModRing::try_with(1_000_000_007)?;
    let a = randtest(50, 120, ring, &mut rng);
    let b = randtest(120, 40, ring, &mut rng);

    let mut c = NmodMat::new(50, 40, ring);
    assert!(mul_float(&MatContext::default(), c.view_mut(), a.view(), b.view()));
    let mut expected = NmodMat::new(50, 40, ring);
    mul_classical(expected.view_mut(), a.view(), b.view());
    assert_eq!(c, expected);
    Ok(())
}

#[test]
fn test_product_is_associative() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(3);
    for ctx in contexts()? {
        for modulus in MODULI {
            let ring = ModRing::try_with(modulus)?;
            let a = randtest(21, 34, ring, &mut rng);
            let b = randtest(34, 19, ring, &mut rng);
            let c = randtest(19, 26, ring, &mut rng);

            let left = a.mul_with(&ctx, &b).mul_with(&ctx, &c);
            let right = a.mul_with(&ctx, &b.mul_with(&ctx, &c));
            assert_eq!(left, right, "mod {modulus}");
        }
    }
    Ok(())
}

#[test]
fn test_product_into_window_leaves_border() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(4);
    let ring = ModRing::try_with(97)?;
    let ctx = MatContext::new(small_cutoffs());
    let a = randtest(20, 30, ring, &mut rng);
    let b = randtest(30, 10, ring, &mut rng);

    let mut big = NmodMat::new(24, 16, ring);
    big.view_mut().fill(5);
    nmod_mat::mul::mul(&ctx, big.window_mut(2, 3, 22, 13), a.view(), b.view());

    assert_eq!(big.window(2, 3, 22, 13).to_mat(), &a * &b);
    assert!(big.row(0).iter().chain(big.row(23)).all(|&v| v == 5));
    assert!((2..22).all(|i| big.get(i, 0) == 5 && big.get(i, 15) == 5));
    Ok(())
}

#[test]
fn test_lu_reconstructs_input() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(5);
    for ctx in contexts()? {
        for modulus in [2, 3, 1_000_003, (1 << 61) - 1] {
            let ring = ModRing::try_with(modulus)?;
            for &(m, n, r) in &[(20, 20, 20), (30, 17, 11), (12, 40, 12), (25, 25, 0)] {
                let mut a = randrank(m, n, r, ring, &mut rng);
                randops(&mut a, 4 * (m + n), &mut rng);

                let mut packed = a.clone();
                let mut perm = vec![0; m];
                let rank = nmod_mat::lu::lu(&ctx, &mut perm, packed.view_mut(), false)?;
                assert_eq!(rank, r);

                // P*A = L*U with L unit lower m x r and U upper r x n
                let mut l = NmodMat::new(m, rank, ring);
                let mut u = NmodMat::new(rank, n, ring);
                for i in 0..m {
                    for j in 0..rank.min(i + 1) {
                        l.set(i, j, if i == j { 1 } else { packed.get(i, j) });
                    }
                }
                for i in 0..rank {
                    for j in i..n {
                        u.set(i, j, packed.get(i, j));
                    }
                }
                let mut permuted = NmodMat::new(m, n, ring);
                for (i, &p) in perm.iter().enumerate() {
                    permuted.row_mut(i).copy_from_slice(a.row(p));
                }
                assert_eq!(&l * &u, permuted, "{m}x{n} rank {r} mod {modulus}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_solve_and_inverse() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(6);
    for ctx in contexts()? {
        for modulus in [2, 65_537, 1_000_000_007, (1 << 61) - 1] {
            let ring = ModRing::try_with(modulus)?;
            for n in [1, 2, 9, 40] {
                let mut a = randtril(n, ring, true, &mut rng).mul(&randtriu(n, ring, false, &mut rng));
                randops(&mut a, 3 * n, &mut rng);
                let b = randtest(n, 5, ring, &mut rng);

                let x = a.solve(&ctx, &b)?;
                assert_eq!(a.mul_with(&ctx, &x), b);

                let inverse = a.inv(&ctx)?;
                assert_eq!(a.mul_with(&ctx, &inverse), NmodMat::identity(n, ring));

                let mut in_place = a.clone();
                in_place.inv_in_place(&ctx)?;
                assert_eq!(in_place, inverse);
            }
        }
    }
    Ok(())
}

#[test]
fn test_singular_systems_fail_cleanly() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(8);
    let ctx = MatContext::new(small_cutoffs());
    let ring = ModRing::try_with(1_000_000_007)?;
    let mut a = randrank(30, 30, 29, ring, &mut rng);
    randops(&mut a, 200, &mut rng);
    let b = randtest(30, 3, ring, &mut rng);

    let mut x = randtest(30, 3, ring, &mut rng);
    let result = nmod_mat::solve::solve(&ctx, x.view_mut(), a.view(), b.view());
    assert!(matches!(result, Err(NmodMatError::Singular)));
    assert!(x.is_zero());

    assert!(matches!(a.inv(&ctx), Err(NmodMatError::Singular)));
    assert_eq!(a.det(&ctx), 0);
    assert_eq!(a.rank(&ctx)?, 29);

    // b inside the column space is solvable, a generic b is not
    let y = randtest(30, 3, ring, &mut rng);
    let reachable = &a * &y;
    let x = a.can_solve(&ctx, &reachable)?;
    assert_eq!(&a * &x, reachable);
    assert!(matches!(a.can_solve(&ctx, &b), Err(NmodMatError::Inconsistent)));
    Ok(())
}

#[test]
fn test_nullspace_and_rref_agree() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(9);
    for ctx in contexts()? {
        let ring = ModRing::try_with(65_537)?;
        for &(m, n, r) in &[(15, 30, 10), (30, 15, 15), (20, 20, 3)] {
            let mut a = randrank(m, n, r, ring, &mut rng);
            randops(&mut a, 5 * (m + n), &mut rng);

            let (rank, reduced) = a.rref(&ctx)?;
            assert_eq!(rank, r);
            assert!(reduced.window(rank, 0, m, n).is_zero());

            let x = a.nullspace(&ctx)?;
            assert_eq!(x.cols(), n - r);
            assert!(a.mul_with(&ctx, &x).is_zero());
            assert!(reduced.mul_with(&ctx, &x).is_zero());
        }
    }
    Ok(())
}

#[test]
fn test_howell_form_is_canonical_over_composite() -> Result<(), NmodMatError> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(10);
    for modulus in [36, 1024, 2 * 3 * 5 * 7 * 11 * 13] {
        let ring = ModRing::try_with(modulus)?;
        let a = randtest(9, 6, ring, &mut rng);
        // multiplying by an invertible matrix keeps the row span
        let change = randtril(9, ring, false, &mut rng).mul(&randtriu(9, ring, true, &mut rng));
        let b = &change * &a;

        let (count_a, h_a) = a.howell_form();
        let (count_b, h_b) = b.howell_form();
        assert_eq!(count_a, count_b, "mod {modulus}");
        assert_eq!(h_a, h_b, "mod {modulus}");

        // stacking the form on its input adds nothing to the span
        let (count_stacked, stacked) = h_a.concat_vertical(&a).howell_form();
        assert_eq!(count_stacked, count_a);
        assert_eq!(stacked.window(0, 0, count_a, 6), h_a.window(0, 0, count_a, 6));
    }
    Ok(())
}

#[test]
fn test_integer_product_matches_reduction() -> Result<(), NmodMatError> {
    init_tracing();
    let a = IntMat::from_i64_rows(&[vec![i64::MAX, -3, 12], vec![-7, i64::MIN + 1, 0]])?;
    let b = IntMat::from_i64_rows(&[vec![5, i64::MAX], vec![-1, 2], vec![i64::MAX, -9]])?;
    let c = mul_multi_mod(&MatContext::default(), &a, &b)?;
    assert_eq!(c, a.mul(&b)?);

    let ring = ModRing::try_with(1_000_000_007)?;
    assert_eq!(c.reduce_mod(ring), &a.reduce_mod(ring) * &b.reduce_mod(ring));
    Ok(())
}
