//! Typed errors for simulation setup and compute backends.

use std::fmt;

/// Errors arising from configuration, device initialization, or device execution.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Invalid simulation parameters. Fails construction; values are never clamped.
    Configuration(String),

    /// No usable compute device could be created.
    BackendUnavailable(String),

    /// A device operation failed (allocation, shader compile, dispatch, map, poll).
    BackendExecution(String),
}

impl SimulationError {
    /// Device-side failures that the fallback manager should hear about
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::BackendExecution(_))
    }
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::BackendUnavailable(msg) => write!(f, "Compute device unavailable: {msg}"),
            Self::BackendExecution(msg) => write!(f, "Compute device execution failed: {msg}"),
        }
    }
}

impl std::error::Error for SimulationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_configuration() {
        let err = SimulationError::Configuration("width must be > 0".into());
        assert_eq!(err.to_string(), "Invalid configuration: width must be > 0");
    }

    #[test]
    fn display_backend_errors() {
        let err = SimulationError::BackendUnavailable("no adapter".into());
        assert!(err.to_string().contains("no adapter"));
        let err = SimulationError::BackendExecution("poll timed out".into());
        assert!(err.to_string().contains("poll timed out"));
    }

    #[test]
    fn backend_classification() {
        assert!(!SimulationError::Configuration(String::new()).is_backend());
        assert!(SimulationError::BackendUnavailable(String::new()).is_backend());
        assert!(SimulationError::BackendExecution(String::new()).is_backend());
    }

    #[test]
    fn error_trait_works() {
        let err = SimulationError::BackendExecution("map failed".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.to_string().starts_with("Compute device execution failed"));
    }
}
