use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Post source error: {0}")]
    Source(#[from] SourceError),

    #[error("Cursor store error: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Failures of the rendering collaborator that produces candidate listings.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Session not ready: {reason}")]
    SessionUnavailable { reason: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Source API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid source response: {details}")]
    InvalidResponse { details: String },

    #[error("Fixture not readable: {path}")]
    FixtureUnavailable { path: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Invalid cursor key: {key}")]
    InvalidKey { key: String },

    #[error("Write failed for {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

/// Failures reported by the notification collaborator.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Webhook rejected the message with status {status}")]
    Rejected { status: u16 },

    #[error("Webhook rate limited. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Duplicate cursor key: {key}")]
    DuplicateCursorKey { key: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
