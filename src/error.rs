use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the user and contact repositories.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more field rules failed; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A unique index rejected the write.
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: &'static str },

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// The document was read without its password, so it cannot be verified.
    #[error("credential was not loaded for this document")]
    CredentialNotLoaded,

    /// The password was set but the document has not been saved yet.
    #[error("credential has not been hashed yet")]
    CredentialNotHashed,

    /// A stored row could not be decoded into a document.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}
