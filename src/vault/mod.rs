//! Vault domain subsystem.
//!
//! # Data Flow
//! ```text
//! view form (validated input)
//!     → service.rs (typed arguments, wallet submission)
//!     → action.rs (pending → confirmed | failed)
//!
//! view load
//!     → repository.rs (vault snapshot by id)
//! ```
//!
//! # Design Decisions
//! - Vault semantics live in the contract; these types only mirror them
//! - The read side sits behind `VaultRepository` so a chain-backed
//!   implementation can replace the placeholder

pub mod action;
pub mod error;
pub mod notes;
pub mod repository;
pub mod service;
pub mod types;

pub use action::{ActionId, ActionRecord, ActionStatus, ActionTracker, TrackedAction};
pub use error::{VaultError, VaultResult};
pub use repository::{PlaceholderVaultRepository, VaultRepository};
pub use service::VaultService;
pub use types::{AddHeirParams, CreateVaultParams, DepositAssetParams, Guardian, Heir, NftParams, Vault, VaultAsset};
