//! Read side for vault state.
//!
//! The contract exposes no per-vault getter that this client reads yet, so
//! the shipped implementation serves a fixed snapshot. When a chain reader
//! is attached, ids the contract has not assigned are reported as missing.

use async_trait::async_trait;
use std::sync::Arc;

use crate::blockchain::client::ChainReader;
use crate::blockchain::principal::ContractPrincipal;
use crate::units::MICRO_STX_PER_STX;
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::types::{Vault, VaultAsset};

/// Owner of the placeholder snapshot.
pub const PLACEHOLDER_OWNER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

/// Read a vault by id.
#[async_trait]
pub trait VaultRepository: Send + Sync {
    async fn get_vault(&self, id: u64) -> VaultResult<Vault>;
}

/// Serves the same snapshot for every id, renumbered to the requested id.
#[derive(Default)]
pub struct PlaceholderVaultRepository {
    bound: Option<(Arc<dyn ChainReader>, ContractPrincipal)>,
}

impl PlaceholderVaultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject ids at or above the contract's next vault id.
    pub fn with_chain_bound(reader: Arc<dyn ChainReader>, contract: ContractPrincipal) -> Self {
        Self {
            bound: Some((reader, contract)),
        }
    }

    pub fn snapshot(id: u64) -> Vault {
        Vault {
            id,
            owner: PLACEHOLDER_OWNER.to_string(),
            unlock_height: 78_500,
            inactivity_timeout: 4_320,
            last_active_height: 70_000,
            assets: vec![VaultAsset::Stx {
                amount: 1_000 * MICRO_STX_PER_STX,
            }],
            heirs: Vec::new(),
            active: true,
            guardians: None,
            threshold: None,
            notes_ref: None,
        }
    }
}

#[async_trait]
impl VaultRepository for PlaceholderVaultRepository {
    async fn get_vault(&self, id: u64) -> VaultResult<Vault> {
        if id == 0 {
            return Err(VaultError::NotFound(id));
        }

        if let Some((reader, contract)) = &self.bound {
            let network = contract.issuer.network().unwrap_or_default();
            match reader.next_vault_id(network, contract).await {
                Ok(next) if id >= next => return Err(VaultError::NotFound(id)),
                Ok(_) => {}
                // Reads are best-effort; serve the snapshot
                Err(e) => tracing::warn!(vault_id = id, error = %e, "Could not check vault id on chain"),
            }
        }

        tracing::debug!(vault_id = id, "Serving placeholder vault snapshot");
        Ok(Self::snapshot(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::network::StacksNetwork;
    use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus, TxId};

    struct FixedNextId(Option<u64>);

    #[async_trait]
    impl ChainReader for FixedNextId {
        async fn current_block_height(&self, _network: StacksNetwork) -> BlockchainResult<u64> {
            Ok(75_000)
        }

        async fn transaction_status(
            &self,
            _network: StacksNetwork,
            _tx_id: &TxId,
        ) -> BlockchainResult<ConfirmationStatus> {
            Ok(ConfirmationStatus::Pending)
        }

        async fn next_vault_id(
            &self,
            _network: StacksNetwork,
            _contract: &ContractPrincipal,
        ) -> BlockchainResult<u64> {
            self.0.ok_or_else(|| BlockchainError::Rpc("connection refused".into()))
        }
    }

    fn contract() -> ContractPrincipal {
        "ST39PS2F0FVJKXD0D3G41ATAEK13NXXDN8VGQN5FW.timelock-vault"
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_snapshot() {
        let repo = PlaceholderVaultRepository::new();
        let vault = repo.get_vault(12).await.unwrap();
        assert_eq!(vault.id, 12);
        assert_eq!(vault.owner, PLACEHOLDER_OWNER);
        assert_eq!(vault.unlock_height, 78_500);
        assert_eq!(vault.inactivity_timeout, 4_320);
        assert!(vault.heirs.is_empty());

        assert!(matches!(repo.get_vault(0).await, Err(VaultError::NotFound(0))));
    }

    #[tokio::test]
    async fn test_chain_bound() {
        let repo = PlaceholderVaultRepository::with_chain_bound(Arc::new(FixedNextId(Some(5))), contract());
        assert!(repo.get_vault(4).await.is_ok());
        assert!(matches!(repo.get_vault(5).await, Err(VaultError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_unreachable_chain_serves_snapshot() {
        let repo = PlaceholderVaultRepository::with_chain_bound(Arc::new(FixedNextId(None)), contract());
        assert_eq!(repo.get_vault(99).await.unwrap().id, 99);
    }
}
