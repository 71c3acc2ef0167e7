use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::Stage;

#[derive(Error, Debug)]
pub enum ReplenishError {
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    #[error("{service} returned an unusable payload: {message}")]
    MalformedResponse { service: String, message: String },

    #[error("No supplier offers for {quantity} of material {material}")]
    NoOffersAvailable { material: String, quantity: f64 },

    #[error("{service} rejected the order (HTTP {status}): {message}")]
    FulfillmentRejected {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Run cancelled before stage {stage}")]
    Cancelled { stage: Stage },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, ReplenishError>;

/// Serializable failure taxonomy surfaced in run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UpstreamUnavailable,
    MalformedResponse,
    NoOffersAvailable,
    FulfillmentRejected,
    Cancelled,
    InvalidInput,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Sourcing,
    Fulfillment,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ReplenishError {
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(service: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::NoOffersAvailable { .. } => ErrorKind::NoOffersAvailable,
            Self::FulfillmentRejected { .. } => ErrorKind::FulfillmentRejected,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::ValidationError { .. } => ErrorKind::InvalidInput,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorKind::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorKind::Internal,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::UpstreamUnavailable | ErrorKind::MalformedResponse => {
                ErrorCategory::Upstream
            }
            ErrorKind::NoOffersAvailable | ErrorKind::Cancelled => ErrorCategory::Sourcing,
            ErrorKind::FulfillmentRejected => ErrorCategory::Fulfillment,
            ErrorKind::InvalidInput | ErrorKind::Configuration => ErrorCategory::Configuration,
            ErrorKind::Internal => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::UpstreamUnavailable => ErrorSeverity::Medium,
            ErrorKind::MalformedResponse
            | ErrorKind::NoOffersAvailable
            | ErrorKind::FulfillmentRejected
            | ErrorKind::Cancelled
            | ErrorKind::InvalidInput => ErrorSeverity::High,
            ErrorKind::Configuration | ErrorKind::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::UpstreamUnavailable { service, .. } => format!(
                "Check connectivity and credentials for {} and re-run the replenishment",
                service
            ),
            Self::MalformedResponse { service, .. } => format!(
                "Verify that {} exposes the expected API version",
                service
            ),
            Self::NoOffersAvailable { material, .. } => format!(
                "Maintain a supplier catalog entry for {} or source it manually",
                material
            ),
            Self::FulfillmentRejected { .. } => {
                "Review the rejected order in the target system; orders already created were kept"
                    .to_string()
            }
            Self::Cancelled { .. } => {
                "Re-run the replenishment; orders issued before cancellation were kept".to_string()
            }
            Self::IoError(_) => "Check that the output path is writable".to_string(),
            Self::SerializationError(_) => "Report this as a bug".to_string(),
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => {
                "Fix the configuration file or command-line flags".to_string()
            }
            Self::ValidationError { .. } => "Check material, location and horizon".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Upstream => format!("A connected system could not be used: {}", self),
            ErrorCategory::Sourcing => format!("Sourcing stopped: {}", self),
            ErrorCategory::Fulfillment => format!("Order creation failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid setup: {}", self),
            ErrorCategory::System => format!("Local failure: {}", self),
        }
    }
}
