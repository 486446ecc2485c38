//! Layered error definitions
//!
//! Categorized by source: config / connection / acquisition / storage / payload

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum RigError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Hardware Errors =====
    /// Device connection error
    #[error("connection error for sensor '{sensor}': {message}")]
    Connection { sensor: String, message: String },

    /// Frame acquisition error
    #[error("acquisition error for sensor '{sensor}': {message}")]
    Acquisition { sensor: String, message: String },

    // ===== Storage Errors =====
    /// Recording store error
    #[error("storage error for '{path}': {message}")]
    Storage { path: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Payload Errors =====
    /// Annotation payload value rejected
    #[error("payload validation error for widget '{label}': {message}")]
    PayloadValidation { label: String, message: String },
}

impl RigError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create device connection error
    pub fn connection(sensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            sensor: sensor.into(),
            message: message.into(),
        }
    }

    /// Create frame acquisition error
    pub fn acquisition(sensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquisition {
            sensor: sensor.into(),
            message: message.into(),
        }
    }

    /// Create recording store error
    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create annotation payload error
    pub fn payload_validation(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadValidation {
            label: label.into(),
            message: message.into(),
        }
    }

    /// True for errors caught before any hardware I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = RigError::acquisition("thumb", "device unplugged");
        assert!(err.to_string().contains("thumb"));
        assert!(err.to_string().contains("device unplugged"));

        let err = RigError::storage("/tmp/run.trec", "disk full");
        assert!(err.to_string().contains("/tmp/run.trec"));
    }

    #[test]
    fn config_classification() {
        assert!(RigError::config_validation("sensors", "duplicate").is_config());
        assert!(!RigError::connection("a", "b").is_config());
    }
}
