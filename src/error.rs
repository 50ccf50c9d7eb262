//! Error types.
//!
//! - `FitError`: failures of the model, objective, and grid search
//! - `AppError`: what the binary reports (message + process exit code)

/// Failures raised by the fitting core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// The model is undefined at the given parameters (division by zero,
    /// non-finite intermediate). Recoverable: the search skips the point.
    #[error("model undefined: {0}")]
    Domain(String),

    /// Malformed bounds, data, or search settings. Fatal before any search.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Every grid point was excluded by a domain error.
    #[error("search space is empty: {excluded} of {grid_size} grid points excluded, none valid (check the bound box)")]
    EmptySearchSpace { grid_size: usize, excluded: usize },
}

impl FitError {
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::Configuration(_) => 2,
            FitError::Domain(_) => 3,
            FitError::EmptySearchSpace { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
