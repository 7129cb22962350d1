//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! typed arguments
//!     → clarity.rs (consensus serialization)
//!     → contract_call.rs (call + wallet payload)
//!     → wallet.rs (user approval, signing, broadcast)
//!
//! chain queries
//!     → client.rs (node API with timeouts + failover)
//! ```
//!
//! # Security Constraints
//! - No key material in this process; the wallet signs
//! - Never log private or sensitive data
//! - All API calls have configurable timeouts
//! - Addresses are checksum-verified before use

pub mod clarity;
pub mod client;
pub mod contract_call;
pub mod network;
pub mod principal;
pub mod types;
pub mod wallet;

pub use clarity::ClarityValue;
pub use client::{ChainReader, StacksApiClient, StacksClients};
pub use contract_call::{AppDetails, ContractCall, PostConditionMode};
pub use network::StacksNetwork;
pub use principal::{ContractPrincipal, Principal, StandardPrincipal};
pub use types::{BlockchainError, BlockchainResult, ConfirmationStatus, TxId, TxSubmission};
pub use wallet::{BridgeWallet, UserData, WalletProvider};
