#[derive(thiserror::Error, Debug)]
pub enum NmodMatError {
    /// Error when creating a ring with an invalid modulus (n == 0).
    #[error("InvalidModulus: {0}")]
    InvalidModulus(String),
    /// Error when trying to find a modular inverse that doesn't exist (gcd(a, n) != 1).
    #[error("NoInverse: {0}")]
    NoInverse(String),
    #[error("DimensionMismatch: {0}")]
    DimensionMismatch(String),

    #[error("Matrix is singular")]
    Singular,
    #[error("Linear system has no solution")]
    Inconsistent,

    #[error("InvalidParameters: {0}")]
    InvalidParameters(String),

    #[error("Thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Configuration: {0}")]
    Configuration(#[from] serde_json::Error),
}
