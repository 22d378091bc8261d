use nmod_mat::errors::NmodMatError;
use nmod_mat::{MatContext, ModRing, NmodMat, Tuning};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
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

const P: u64 = 1_000_000_007;

fn mul_mod(x: u64, y: u64) -> u64 {
    (u128::from(x) * u128::from(y) % u128::from(P)) as u64
}

fn add_mod(x: u64, y: u64) -> u64 {
    ((u128::from(x) + u128::from(y)) % u128::from(P)) as u64
}

#[test]
fn showcase_cube_of_two_by_two() -> Result<(), NmodMatError> {
    init_tracing();

    let mut rng = StdRng::seed_from_u64(1_000_000_007);
    let [a, b, c, d]: [u64; 4] = std::array::from_fn(|_| rng.random_range(0..P));
    info!(a, b, c, d, "entries");

    let ring = ModRing::try_with(P)?;
    let m = NmodMat::from_rows(&[vec![a, b], vec![c, d]], ring)?;
    let ctx = MatContext::default();

    // M^2 then M^3 = M^2 * M, entry by entry
    let e00 = add_mod(mul_mod(a, a), mul_mod(b, c));
    let e01 = add_mod(mul_mod(a, b), mul_mod(b, d));
    let e10 = add_mod(mul_mod(c, a), mul_mod(d, c));
    let e11 = add_mod(mul_mod(c, b), mul_mod(d, d));
    let by_hand = NmodMat::from_rows(
        &[
            vec![add_mod(mul_mod(e00, a), mul_mod(e01, c)), add_mod(mul_mod(e00, b), mul_mod(e01, d))],
            vec![add_mod(mul_mod(e10, a), mul_mod(e11, c)), add_mod(mul_mod(e10, b), mul_mod(e11, d))],
        ],
        ring,
    )?;

    let sequential = m.mul_with(&ctx, &m).mul_with(&ctx, &m);
    let cube = m.pow(&ctx, 3);

    dbg!(&cube);
    assert_eq!(cube, sequential);
    assert_eq!(cube, by_hand);
    assert_eq!(nmod_mat::mul::pow(&ctx, m.view(), 0), NmodMat::identity(2, ring));
    Ok(())
}

#[test]
fn showcase_tuning_from_json() -> Result<(), NmodMatError> {
    init_tracing();

    let tuning = Tuning::from_json(r#"{ "strassen_cutoff": 16, "float_enabled": false }"#)?;
    assert_eq!(tuning.strassen_cutoff, 16);
    assert_eq!(tuning.lu_recursive_cutoff, Tuning::default().lu_recursive_cutoff);

    let ctx = MatContext::with_threads(2, tuning)?;
    let ring = ModRing::try_with(P)?;
    let mut rng = StdRng::seed_from_u64(99);
    let a = nmod_mat::matrix::random::randtest(70, 70, ring, &mut rng);
    let inverse = a.inv(&ctx)?;
    info!(threads = ctx.threads(), "inverted 70x70");
    assert_eq!(a.mul_with(&ctx, &inverse), NmodMat::identity(70, ring));
    Ok(())
}
