//! Configuration error types.

/// Errors that can occur when loading, saving, or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse JSON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] serde_json::Error),

    /// Failed to serialize config to JSON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] serde_json::Error),

    /// A field without a default was absent from the file.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field was present but its value cannot produce a valid world.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
