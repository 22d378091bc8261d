//! # Ring Module
//!
//! Provides [`ModRing`], the word-size ring Z/nZ every matrix is defined over,
//! and the small number-theoretic helpers built around it.

pub mod helper;
pub mod math;

pub use helper::{extended_gcd, gcd, is_prime, prev_prime};
pub use math::ModRing;
