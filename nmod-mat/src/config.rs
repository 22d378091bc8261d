//! Algorithm-selection thresholds and the execution context.
//!
//! The thresholds only steer performance; every strategy computes the same
//! result. A [`MatContext`] bundles them with an optional worker pool and is
//! passed explicitly to every operation that may multiply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::NmodMatError;

/// Cutoffs for the dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Products with `min(m, k, n)` below this stay classical instead of Strassen.
    pub strassen_cutoff: usize,
    /// Allow the f64 product with CRT reconstruction. On by default only with
    /// the `blas` feature, which backs it with an optimized dgemm.
    pub float_enabled: bool,
    /// `min(m, k, n)` must exceed this for the f64 path.
    pub float_cutoff: usize,
    /// Largest number of auxiliary primes the f64 path may use.
    pub float_max_primes: usize,
    /// Below this `min(m, k, n)` a product runs on one thread even with a pool.
    pub threaded_min_dim: usize,
    /// Smallest `min(m, n)` for the packed threaded kernel.
    pub packed_min_dim: usize,
    pub tile_rows: usize,
    /// Rounded up to an even count so packed tiles hold whole word pairs.
    pub tile_cols: usize,
    /// LU runs classically while the column count is below this.
    pub lu_recursive_cutoff: usize,
    /// Moduli of at most this many bits use delayed reduction in classical
    /// LU; capped at 32 so a product of two residues fits a word.
    pub lu_delayed_max_bits: u32,
    pub solve_tri_rows_cutoff: usize,
    pub solve_tri_cols_cutoff: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            strassen_cutoff: 200,
            float_enabled: cfg!(all(feature = "blas", target_pointer_width = "64")),
            float_cutoff: 300,
            float_max_primes: 4,
            threaded_min_dim: 48,
            packed_min_dim: 64,
            tile_rows: 64,
            tile_cols: 64,
            lu_recursive_cutoff: 64,
            lu_delayed_max_bits: 32,
            solve_tri_rows_cutoff: 64,
            solve_tri_cols_cutoff: 64,
        }
    }
}

impl Tuning {
    /// Parses thresholds from JSON; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `NmodMatError::Configuration` for malformed JSON.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::Tuning;
    /// let tuning = Tuning::from_json(r#"{ "strassen_cutoff": 64 }"#).unwrap();
    /// assert_eq!(tuning.strassen_cutoff, 64);
    /// assert_eq!(tuning.tile_rows, Tuning::default().tile_rows);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, NmodMatError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.validated())
    }

    /// Clamps values under which the recursive algorithms would not shrink
    /// their subproblems.
    pub fn validated(self) -> Self {
        Tuning {
            strassen_cutoff: self.strassen_cutoff.max(2),
            tile_rows: self.tile_rows.max(1),
            tile_cols: self.tile_cols.max(2).next_multiple_of(2),
            lu_recursive_cutoff: self.lu_recursive_cutoff.max(4),
            lu_delayed_max_bits: self.lu_delayed_max_bits.min(32),
            solve_tri_rows_cutoff: self.solve_tri_rows_cutoff.max(2),
            ..self
        }
    }
}

/// Execution context: tuning plus an optional dedicated worker pool.
///
/// Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct MatContext {
    tuning: Tuning,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl MatContext {
    /// Single-threaded context.
    pub fn new(tuning: Tuning) -> Self {
        MatContext {
            tuning: tuning.validated(),
            pool: None,
        }
    }

    /// Context whose threaded products run on a pool of `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns `NmodMatError::InvalidParameters` for zero threads and
    /// `NmodMatError::ThreadPool` if the pool cannot be built.
    pub fn with_threads(threads: usize, tuning: Tuning) -> Result<Self, NmodMatError> {
        if threads == 0 {
            return Err(NmodMatError::InvalidParameters(
                "Thread count must be > 0".to_string(),
            ));
        }
        if threads == 1 {
            return Ok(Self::new(tuning));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("nmod-mat-{i}"))
            .build()?;
        tracing::debug!(threads, "built matrix worker pool");

        Ok(MatContext {
            tuning: tuning.validated(),
            pool: Some(Arc::new(pool)),
        })
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    pub(crate) fn pool(&self) -> Option<&rayon::ThreadPool> {
        self.pool.as_deref()
    }
}

impl Default for MatContext {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}
