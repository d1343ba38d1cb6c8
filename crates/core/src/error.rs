use crate::types::DbId;

/// Domain errors raised by entries and feeds.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: DbId },

    /// Data that can never form a valid entry.
    #[error("{0}")]
    Validation(String),

    /// A write that would overwrite an already derived artifact.
    #[error("{0}")]
    Conflict(String),
}
