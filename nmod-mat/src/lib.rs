//! Dense linear algebra over Z/nZ for word-size moduli.
//!
//! Matrices are row-major buffers of reduced `u64` entries tagged with the
//! [`ModRing`] they live in. Kernels take borrowed views ([`MatRef`],
//! [`MatMut`]) so that windows of a larger matrix can be passed anywhere a
//! whole matrix can, and a [`MatContext`] carrying the tuning cutoffs and an
//! optional thread pool.
//!
//! ```
//! use nmod_mat::{MatContext, ModRing, NmodMat};
//!
//! let ctx = MatContext::default();
//! let ring = ModRing::try_with(17).unwrap();
//! let a = NmodMat::from_rows(&[vec![2, 1], vec![7, 5]], ring).unwrap();
//! let b = NmodMat::from_rows(&[vec![1], vec![3]], ring).unwrap();
//!
//! let x = a.solve(&ctx, &b).unwrap();
//! assert_eq!(a.mul_with(&ctx, &x), b);
//!
//! let mut c = NmodMat::new(2, 2, ring);
//! nmod_mat::mul::mul(&ctx, c.view_mut(), a.view(), a.view());
//! assert_eq!(nmod_mat::echelon::det(&ctx, c.view()), ring.pow(a.det(&ctx), 2));
//! ```

pub mod config;
pub mod echelon;
pub mod errors;
pub mod lu;
pub mod matrix;
pub mod mul;
pub mod ring;
pub mod solve;
pub mod vector;

pub use config::{MatContext, Tuning};
pub use errors::NmodMatError;
pub use matrix::{MatMut, MatRef, NmodMat};
pub use ring::ModRing;
