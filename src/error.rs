//! Error types for the scheduler

use thiserror::Error;

/// Scheduler result type
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur while resolving credentials or acting on instances
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A caller-supplied value was rejected before any AWS call was made
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The delegated role could not be assumed
    #[error("Failed to assume role {role_arn}: {message}")]
    Authorization { role_arn: String, message: String },

    /// An Auto Scaling or EC2 call failed
    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    /// The config file could not be read or contained a bad value
    #[error("Config error in {path}: {message}")]
    Config { path: String, message: String },

    /// Terminal I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchedulerError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wrap an SDK error, keeping the whole source chain in the message
    pub fn provider<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error,
    {
        Self::Provider {
            operation,
            message: aws_sdk_ec2::error::DisplayErrorContext(err).to_string(),
        }
    }

    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
