// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the calibration crate.

use std::fmt;

/// Result type alias for calibration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Backend error
    Backend(BackendError),
    /// Validation error
    Validation(ValidationError),
    /// Calibration store error
    Calibration(CalibrationError),
    /// Experiment error
    Experiment(ExperimentError),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Backend(e) => write!(f, "Backend error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Calibration(e) => write!(f, "Calibration error: {}", e),
            Error::Experiment(e) => write!(f, "Experiment error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Backend(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Calibration(e) => Some(e),
            Error::Experiment(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Error::Backend(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Error::Calibration(e)
    }
}

impl From<ExperimentError> for Error {
    fn from(e: ExperimentError) -> Self {
        Error::Experiment(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Backend-specific errors.
#[derive(Debug)]
pub enum BackendError {
    /// Backend not found
    NotFound(String),
    /// Backend unavailable
    Unavailable(String),
    /// Execution failed
    ExecutionFailed(String),
    /// Invalid request
    InvalidRequest(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotFound(name) => write!(f, "Backend not found: {}", name),
            BackendError::Unavailable(msg) => write!(f, "Backend unavailable: {}", msg),
            BackendError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            BackendError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Validation errors.
#[derive(Debug)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Resource limit exceeded
    ResourceLimit {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::ResourceLimit {
                resource,
                limit,
                requested,
            } => {
                write!(
                    f,
                    "Resource limit exceeded for {}: limit={}, requested={}",
                    resource, limit, requested
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised by the calibration store.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// No schedule template for the name/qubit
    ScheduleNotFound { schedule: String, qubit: u32 },
    /// No valid value for the parameter
    ParameterNotFound {
        parameter: String,
        qubit: u32,
        schedule: String,
        group: String,
    },
    /// The schedule does not declare the parameter
    UnknownParameter { parameter: String, schedule: String },
    /// Group name rejected
    InvalidGroup(String),
    /// Value rejected (NaN, Inf)
    InvalidValue { parameter: String, value: f64 },
    /// Malformed schedule template
    InvalidSchedule { schedule: String, message: String },
    /// Attempt to bind a parameter the schedule does not contain
    UnboundParameter { parameter: String, schedule: String },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::ScheduleNotFound { schedule, qubit } => {
                write!(f, "Schedule '{}' not found for qubit {}", schedule, qubit)
            }
            CalibrationError::ParameterNotFound {
                parameter,
                qubit,
                schedule,
                group,
            } => write!(
                f,
                "No valid value for parameter '{}' (qubit {}, schedule '{}', group '{}')",
                parameter, qubit, schedule, group
            ),
            CalibrationError::UnknownParameter {
                parameter,
                schedule,
            } => write!(
                f,
                "Parameter '{}' is not declared by schedule '{}'",
                parameter, schedule
            ),
            CalibrationError::InvalidGroup(group) => {
                write!(f, "Invalid calibration group '{}'", group)
            }
            CalibrationError::InvalidValue { parameter, value } => {
                write!(f, "Invalid value {} for parameter '{}'", value, parameter)
            }
            CalibrationError::InvalidSchedule { schedule, message } => {
                write!(f, "Invalid schedule '{}': {}", schedule, message)
            }
            CalibrationError::UnboundParameter {
                parameter,
                schedule,
            } => write!(
                f,
                "Parameter '{}' is not free in schedule '{}'",
                parameter, schedule
            ),
        }
    }
}

impl std::error::Error for CalibrationError {}

/// Errors raised while building, running or analyzing an experiment.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentError {
    /// Experiment options or inputs are inconsistent
    InvalidOptions(String),
    /// No backend was set before running
    NoBackend,
    /// No analysis result with the name at the index
    ResultNotFound { name: String, index: i64 },
    /// Curve fit did not produce a usable estimate
    FitFailed(String),
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidOptions(msg) => write!(f, "Invalid options: {}", msg),
            ExperimentError::NoBackend => write!(f, "No backend set for experiment"),
            ExperimentError::ResultNotFound { name, index } => {
                write!(f, "No analysis result '{}' at index {}", name, index)
            }
            ExperimentError::FitFailed(msg) => write!(f, "Fit failed: {}", msg),
        }
    }
}

impl std::error::Error for ExperimentError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    // =========================================================================
    // Error Display tests
    // =========================================================================

    #[test]
    fn test_error_display_config() {
        let e = Error::Config("bad shots".into());
        assert_eq!(e.to_string(), "Configuration error: bad shots");
    }

    #[test]
    fn test_error_display_backend() {
        let e = Error::Backend(BackendError::NotFound("drag_simulator".into()));
        assert_eq!(
            e.to_string(),
            "Backend error: Backend not found: drag_simulator"
        );
    }

    #[test]
    fn test_error_display_calibration() {
        let e = Error::Calibration(CalibrationError::ScheduleNotFound {
            schedule: "sx".into(),
            qubit: 3,
        });
        assert_eq!(
            e.to_string(),
            "Calibration error: Schedule 'sx' not found for qubit 3"
        );
    }

    #[test]
    fn test_error_display_experiment() {
        let e = Error::Experiment(ExperimentError::ResultNotFound {
            name: "beta".into(),
            index: -1,
        });
        assert_eq!(
            e.to_string(),
            "Experiment error: No analysis result 'beta' at index -1"
        );
    }

    #[test]
    fn test_calibration_error_display_parameter_not_found() {
        let e = CalibrationError::ParameterNotFound {
            parameter: "β".into(),
            qubit: 0,
            schedule: "x".into(),
            group: "default".into(),
        };
        assert_eq!(
            e.to_string(),
            "No valid value for parameter 'β' (qubit 0, schedule 'x', group 'default')"
        );
    }

    #[test]
    fn test_calibration_error_display_invalid_group() {
        let e = CalibrationError::InvalidGroup("bad group".into());
        assert_eq!(e.to_string(), "Invalid calibration group 'bad group'");
    }

    #[test]
    fn test_validation_error_display_resource_limit() {
        let e = ValidationError::ResourceLimit {
            resource: "shots".into(),
            limit: 1000,
            requested: 2000,
        };
        assert_eq!(
            e.to_string(),
            "Resource limit exceeded for shots: limit=1000, requested=2000"
        );
    }

    // =========================================================================
    // Error::source() and From impls
    // =========================================================================

    #[test]
    fn test_error_source() {
        assert!(Error::Io(std::io::Error::other("disk")).source().is_some());
        assert!(Error::Calibration(CalibrationError::InvalidGroup("".into()))
            .source()
            .is_some());
        assert!(Error::Experiment(ExperimentError::NoBackend)
            .source()
            .is_some());
        assert!(Error::Config("x".into()).source().is_none());
        assert!(Error::Serialization("x".into()).source().is_none());
    }

    #[test]
    fn test_from_calibration_error() {
        let e: Error = CalibrationError::InvalidGroup("x y".into()).into();
        assert!(matches!(
            e,
            Error::Calibration(CalibrationError::InvalidGroup(_))
        ));
    }

    #[test]
    fn test_from_experiment_error() {
        let e: Error = ExperimentError::NoBackend.into();
        assert!(matches!(e, Error::Experiment(ExperimentError::NoBackend)));
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("{{{{").unwrap_err();
        let e: Error = yaml_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }
}
