//! Error types for route planning

use thiserror::Error;

/// Result type for route planning operations
pub type Result<T> = std::result::Result<T, Error>;

/// Route planning errors
///
/// Every planning error is fatal: a partially emitted plan would leave the hub
/// with asymmetric paths, so nothing is returned once one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Topology errors
    #[error("Entity not found: {name}")]
    UnknownEntity { name: String },

    #[error("Entity already registered: {name}")]
    DuplicateEntity { name: String },

    // Inspection errors
    #[error(
        "{entity} expects inspection by {inspector} for traffic to {target}, but {inspector} does not advertise inspection capabilities"
    )]
    InspectorNotCapable {
        entity: String,
        target: String,
        inspector: String,
    },

    #[error("Inspection of {entity} -> {target} by {inspector} is not supported: {reason}")]
    UnsupportedInspection {
        entity: String,
        target: String,
        inspector: String,
        reason: String,
    },

    #[error(
        "Ambiguous inspection for {entity} -> {target}: declared inspectors {}",
        inspectors.join(", ")
    )]
    AmbiguousInspection {
        entity: String,
        target: String,
        inspectors: Vec<String>,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    pub(crate) fn unsupported(
        entity: &str,
        target: &str,
        inspector: &str,
        reason: impl Into<String>,
    ) -> Self {
        Error::UnsupportedInspection {
            entity: entity.to_string(),
            target: target.to_string(),
            inspector: inspector.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(format!("invalid YAML: {}", e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(format!("invalid TOML: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(format!("invalid JSON: {}", e))
    }
}

impl From<ipnet::AddrParseError> for Error {
    fn from(e: ipnet::AddrParseError) -> Self {
        Error::Config(format!("invalid CIDR: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_triple() {
        let err = Error::InspectorNotCapable {
            entity: "workload-a".to_string(),
            target: "workload-b".to_string(),
            inspector: "egress".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("workload-a"));
        assert!(message.contains("workload-b"));
        assert!(message.contains("egress"));
    }

    #[test]
    fn test_ambiguous_lists_inspectors() {
        let err = Error::AmbiguousInspection {
            entity: "a".to_string(),
            target: "b".to_string(),
            inspectors: vec!["fw-1".to_string(), "fw-2".to_string()],
        };
        assert!(err.to_string().ends_with("fw-1, fw-2"));
    }
}
