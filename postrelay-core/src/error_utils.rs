use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Source(e) => {
                error!("Post source error details: {:?}", e);
            }
            CoreError::Store(e) => {
                error!("Cursor store error details: {:?}", e);
            }
            CoreError::Delivery(e) => {
                error!("Delivery error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Source(e) => e.user_friendly_message(),
            CoreError::Store(e) => e.user_friendly_message(),
            CoreError::Delivery(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Source(_) => "SOURCE".to_string(),
            CoreError::Store(_) => "STORE".to_string(),
            CoreError::Delivery(_) => "DELIVERY".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
        }
    }
}

impl ErrorExt for SourceError {
    fn log_error(&self) -> &Self {
        error!("SourceError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("SourceError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            SourceError::SessionUnavailable { reason } => format!(
                "The browsing session is not usable ({}). Check the login cookies.",
                reason
            ),
            SourceError::RequestTimeout => {
                "The page took too long to render. The account will be retried next run."
                    .to_string()
            }
            SourceError::Api { status, .. } => {
                format!("The rendering service answered with status {}.", status)
            }
            SourceError::FixtureUnavailable { path } => {
                format!("Could not read the fixture file at {}.", path)
            }
            SourceError::InvalidResponse { .. } => {
                "The rendering service returned data in an unexpected shape.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            SourceError::SessionUnavailable { .. } => "SOURCE_SESSION_UNAVAILABLE".to_string(),
            SourceError::RequestTimeout => "SOURCE_TIMEOUT".to_string(),
            SourceError::Api { .. } => "SOURCE_API".to_string(),
            SourceError::InvalidResponse { .. } => "SOURCE_INVALID_RESPONSE".to_string(),
            SourceError::FixtureUnavailable { .. } => "SOURCE_FIXTURE_UNAVAILABLE".to_string(),
        }
    }
}

impl ErrorExt for StoreError {
    fn log_error(&self) -> &Self {
        error!("StoreError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("StoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StoreError::ConnectionFailed { .. } => {
                "Cursor database connection failed. Please try again.".to_string()
            }
            StoreError::InvalidKey { key } => format!(
                "Cursor key '{}' may only contain letters, digits, '.', '_' and '-'.",
                key
            ),
            StoreError::WriteFailed { key, .. } => format!(
                "Could not persist the cursor '{}'. The post may be relayed again.",
                key
            ),
            _ => "Cursor store error occurred. Please try again.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            StoreError::ConnectionFailed { .. } => "STORE_CONNECTION_FAILED".to_string(),
            StoreError::MigrationFailed { .. } => "STORE_MIGRATION_FAILED".to_string(),
            StoreError::InvalidKey { .. } => "STORE_INVALID_KEY".to_string(),
            StoreError::WriteFailed { .. } => "STORE_WRITE_FAILED".to_string(),
            StoreError::Sql(_) => "STORE_SQL_ERROR".to_string(),
        }
    }
}

impl ErrorExt for DeliveryError {
    fn log_error(&self) -> &Self {
        error!("DeliveryError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DeliveryError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DeliveryError::Rejected { status } => format!(
                "The webhook refused the message (HTTP {}). Check the webhook URL.",
                status
            ),
            DeliveryError::RateLimited { retry_after } => format!(
                "The webhook is rate limited. Wait {} seconds before the next run.",
                retry_after
            ),
            DeliveryError::Transport { .. } => {
                "Could not reach the webhook. Please check your connection.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            DeliveryError::Rejected { .. } => "DELIVERY_REJECTED".to_string(),
            DeliveryError::RateLimited { .. } => "DELIVERY_RATE_LIMITED".to_string(),
            DeliveryError::Transport { .. } => "DELIVERY_TRANSPORT".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for configuration field '{}'.", value, field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => {
                format!("Environment variable '{}' is not set.", var_name)
            }
            ConfigError::DuplicateCursorKey { key } => format!(
                "Cursor key '{}' is used by more than one account. Each account needs its own.",
                key
            ),
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is invalid: {}", reason)
            }
            ConfigError::Parse(_) => {
                "Configuration file is not valid TOML. Please check the syntax.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::DuplicateCursorKey { .. } => "CONFIG_DUPLICATE_CURSOR_KEY".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}
