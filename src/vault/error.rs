//! Vault facade errors.

use thiserror::Error;

use crate::blockchain::types::BlockchainError;

#[derive(Debug, Error)]
pub enum VaultError {
    /// No identity is connected.
    #[error("Please sign in first")]
    NotSignedIn,

    /// A required argument was absent or empty.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    /// An argument was present but could not be encoded.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// The wallet or network rejected the submission.
    #[error("Submission failed: {0}")]
    Submission(#[from] BlockchainError),

    #[error("Vault {0} not found")]
    NotFound(u64),
}

impl VaultError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        VaultError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error was raised before anything left the process.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            VaultError::NotSignedIn | VaultError::MissingArgument(_) | VaultError::InvalidArgument { .. }
        )
    }
}

pub type VaultResult<T> = Result<T, VaultError>;
