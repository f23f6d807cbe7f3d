use std::fmt;

/// Failures the engine surfaces to its caller.
///
/// Out-of-range inputs are never errors: quality, scores and ceilings are
/// clamped. Only collaborator failures reach this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A record or reference store could not be read. Distinct from
    /// "nothing found", which is an empty result.
    DataUnavailable(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DataUnavailable(msg) => write!(f, "data unavailable: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;
