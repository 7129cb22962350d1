//! Vault data model.
//!
//! These are read-side mirrors of contract state. Nothing here is enforced
//! locally: heir percentages, unlock monotonicity and claim rights are the
//! contract's business.

use serde::{Deserialize, Serialize};

use crate::units::blocks_to_days;

/// An address entitled to a share of the vault once it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heir {
    pub address: String,
    pub percentage: u32,
}

/// Co-signer of a multi-signature release. Declared by the contract,
/// unused by the current flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub address: String,
    pub signed: bool,
}

/// An asset held by a vault. Amounts are in the asset's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VaultAsset {
    Stx {
        amount: u64,
    },
    Ft {
        amount: u64,
        contract_address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl VaultAsset {
    pub fn amount(&self) -> u64 {
        match self {
            VaultAsset::Stx { amount } | VaultAsset::Ft { amount, .. } => *amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: u64,
    pub owner: String,
    pub unlock_height: u64,
    /// Blocks of owner inactivity before inactivity release.
    pub inactivity_timeout: u64,
    pub last_active_height: u64,
    pub assets: Vec<VaultAsset>,
    pub heirs: Vec<Heir>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardians: Option<Vec<Guardian>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    /// Reference to off-chain notes, when the owner stored any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_ref: Option<String>,
}

impl Vault {
    /// Block height at which inactivity release becomes possible.
    pub fn inactivity_deadline(&self) -> u64 {
        self.last_active_height.saturating_add(self.inactivity_timeout)
    }

    /// Whether either release condition holds at `height`. Display hint
    /// only; the contract makes the real decision.
    pub fn is_claimable_at(&self, height: u64) -> bool {
        height >= self.unlock_height || height >= self.inactivity_deadline()
    }

    pub fn is_owner(&self, address: &str) -> bool {
        self.owner == address
    }

    pub fn is_heir(&self, address: &str) -> bool {
        self.heirs.iter().any(|h| h.address == address)
    }

    /// Sum of heir shares. May exceed 100; that is reported, not rejected.
    pub fn total_heir_percentage(&self) -> u32 {
        self.heirs.iter().map(|h| h.percentage).sum()
    }

    pub fn stx_balance(&self) -> u64 {
        self.assets
            .iter()
            .filter(|a| matches!(a, VaultAsset::Stx { .. }))
            .map(VaultAsset::amount)
            .sum()
    }

    pub fn inactivity_days(&self) -> f64 {
        blocks_to_days(self.inactivity_timeout)
    }
}

/// Parameters of `create-vault`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVaultParams {
    pub unlock_height: u64,
    pub inactivity_timeout: u64,
}

/// Parameters of `add-heir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddHeirParams {
    pub vault_id: u64,
    pub heir_address: String,
    pub percentage: u32,
}

/// Parameters of `deposit-stx`. `amount` is in micro-STX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAssetParams {
    pub vault_id: u64,
    pub amount: u64,
}

/// Parameters of the NFT extension's deposit and claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftParams {
    pub vault_id: u64,
    pub nft_contract: String,
    pub token_id: u64,
}
