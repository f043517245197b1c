use thiserror::Error;

/// Errors produced by the recurrence engine: rule parsing, next-occurrence
/// calculation, and date normalization. All of these surface to clients as
/// 400-class responses, so the messages are written for end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    #[error("unknown repeat rule: {0:?}")]
    UnknownRule(String),

    #[error("repeat rule {0:?} requires a parameter")]
    MissingParameter(&'static str),

    #[error("invalid repeat parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}
