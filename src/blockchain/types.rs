//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Chain API connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Chain API request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Chain API answered with something we could not interpret.
    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    /// Read-only contract call was rejected by the node.
    #[error("Read-only call failed: {0}")]
    ReadOnlyCall(String),

    /// Wallet bridge unreachable, or the user declined the request.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Malformed Stacks address or contract identifier.
    #[error("Invalid principal '{value}': {reason}")]
    InvalidPrincipal { value: String, reason: String },

    /// Clarity value could not be encoded or decoded.
    #[error("Clarity codec error: {0}")]
    Codec(String),

    /// Address belongs to a different network than the one selected.
    #[error("Network mismatch: expected {expected}, got {actual}")]
    NetworkMismatch { expected: String, actual: String },

    /// Blockchain client not initialized or disabled.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Id of a broadcast transaction, as returned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful wallet submission.
///
/// Submission is not confirmation: the transaction may still be dropped or
/// abort on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSubmission {
    #[serde(rename = "txId")]
    pub tx_id: TxId,
}

/// On-chain status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in the mempool.
    Pending,
    /// Transaction is anchored and succeeded.
    Confirmed { block_height: u64 },
    /// Transaction aborted or was dropped.
    Failed(String),
}
