use thiserror::Error;

#[derive(Error, Debug)]
pub enum DealError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DealError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DealError::ApiError(_) => ErrorCategory::Network,
            DealError::ConfigError { .. }
            | DealError::MissingConfigError { .. }
            | DealError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DealError::CsvError(_) | DealError::ProcessingError { .. } => ErrorCategory::Data,
            DealError::IoError(_) | DealError::DatabaseError(_) | DealError::StorageError { .. } => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            DealError::ApiError(_) => "Could not reach the flight search API".to_string(),
            DealError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            DealError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            DealError::ConfigError { message } => format!("Configuration problem: {}", message),
            DealError::DatabaseError(_) => "Price history database is unavailable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and the API base URL, then retry",
            ErrorCategory::Configuration => {
                "Set TEQUILA_API_KEY in the environment or .env and check the command-line flags"
            }
            ErrorCategory::Data => "Inspect the API response with --verbose",
            ErrorCategory::Storage => "Check that the output directory and database path are writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, DealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = DealError::MissingConfigError {
            field: "TEQUILA_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("TEQUILA_API_KEY"));
    }

    #[test]
    fn test_processing_errors_are_data_errors() {
        let err = DealError::ProcessingError {
            message: "Failed to finish CSV output".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = DealError::StorageError {
            message: "lock poisoned".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
