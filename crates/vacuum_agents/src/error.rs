//! Error types for the vacuum agents crate.
//!
//! None of the simulation paths return errors: planning failures, stale path
//! steps, battery exhaustion and out-of-bounds queries are all modelled as
//! rewards or safe defaults. Errors only surface at the edges, when building
//! a map, validating configuration, indexing the policy table or loading a
//! saved policy.

use crate::config::ConfigError;
use crate::persistence::PersistenceError;

/// A specialized `Result` type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error enum for all operations within the `vacuum_agents` crate.
#[derive(Debug)]
pub enum Error {
    /// An error related to the agent's configuration.
    Config(String),
    /// The grid could not be built, e.g. from a malformed layout.
    Grid(String),
    /// An error related to the policy table, such as an out-of-range action.
    Policy(String),
    /// A saved policy could not be read or written.
    Persistence(String),
    /// An unexpected internal error, which may indicate a bug.
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(s) => write!(f, "Configuration error: {}", s),
            Error::Grid(s) => write!(f, "Grid error: {}", s),
            Error::Policy(s) => write!(f, "Policy error: {}", s),
            Error::Persistence(s) => write!(f, "Persistence error: {}", s),
            Error::Internal(s) => write!(f, "Internal error: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<PersistenceError> for Error {
    fn from(e: PersistenceError) -> Self {
        Error::Persistence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                Error::Config("invalid setting".into()),
                "Configuration error: invalid setting",
            ),
            (Error::Grid("ragged row".into()), "Grid error: ragged row"),
            (
                Error::Policy("action 9 out of range".into()),
                "Policy error: action 9 out of range",
            ),
            (
                Error::Persistence("missing file".into()),
                "Persistence error: missing file",
            ),
            (
                Error::Internal("unexpected state".into()),
                "Internal error: unexpected state",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(format!("{}", error), expected);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{invalid}");
        let error: Error = json_result.unwrap_err().into();
        assert!(matches!(error, Error::Internal(_)));
    }

    #[test]
    fn test_from_config_error() {
        let error: Error = ConfigError::ZeroBinCapacity.into();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_from_persistence_error() {
        let error: Error = PersistenceError::InvalidFormat("bad".into()).into();
        assert!(matches!(error, Error::Persistence(_)));
        assert!(error.to_string().contains("bad"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<()> {
            Err(Error::Policy("test".into()))
        }
        assert!(returns_error().is_err());
    }
}
