use thiserror::Error;

/// Typed failures the calculation core reports to its boundary.
///
/// The core never retries; the HTTP layer translates `kind()` into a
/// status code (bad request vs. internal).
#[derive(Debug, Error)]
pub enum CalcError {
    /// A required input (PV config, vehicle config, TOU tariff) is absent.
    #[error("missing required input: {0}")]
    MissingInput(String),

    /// A wall-clock string could not be parsed as "HH:MM".
    #[error("malformed time string: {0:?}")]
    MalformedTime(String),

    /// Input values violate a documented invariant (e.g. more V2G piles
    /// than total piles of a class).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The calculation configuration itself is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification for boundary status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Internal,
}

impl CalcError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingInput(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::MissingInput(_)
            | CalcError::MalformedTime(_)
            | CalcError::InvalidInput(_) => ErrorKind::BadRequest,
            CalcError::InvalidConfig(_) => ErrorKind::Internal,
        }
    }
}

impl From<validator::ValidationErrors> for CalcError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CalcError::InvalidInput(errors.to_string())
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
