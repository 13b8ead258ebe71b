use thiserror::Error;

/// Errors that can occur when resolving encoder options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("option \"{name}\" = \"{value}\" is unknown")]
    UnknownOption { name: String, value: String },

    #[error("could not parse value \"{value}\" for parameter \"{name}\"")]
    InvalidBool { name: String, value: String },

    #[error("missing value for parameter \"{name}\"")]
    MissingValue { name: String },

    #[error("invalid value for parameter \"{name}\": {message}")]
    InvalidValue { name: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
