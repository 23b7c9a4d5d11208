use thiserror::Error;
use uuid::Uuid;

/// Failure of a data-access collaborator.
///
/// The edit session does not tell these apart; any variant is a failed save.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report {0} not found")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid value: {value}")]
    Invalid { name: &'static str, value: String },
}
