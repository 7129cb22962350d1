//! Stacks network selection.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::blockchain::types::BlockchainError;

/// Address version for mainnet single-sig accounts (`SP...`).
pub const MAINNET_SINGLE_SIG: u8 = 22;
/// Address version for mainnet multi-sig accounts (`SM...`).
pub const MAINNET_MULTI_SIG: u8 = 20;
/// Address version for testnet single-sig accounts (`ST...`).
pub const TESTNET_SINGLE_SIG: u8 = 26;
/// Address version for testnet multi-sig accounts (`SN...`).
pub const TESTNET_MULTI_SIG: u8 = 21;

/// The Stacks network a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StacksNetwork {
    #[default]
    Testnet,
    Mainnet,
}

impl StacksNetwork {
    /// Lowercase network name used in config files and API hostnames.
    pub fn name(&self) -> &'static str {
        match self {
            StacksNetwork::Testnet => "testnet",
            StacksNetwork::Mainnet => "mainnet",
        }
    }

    /// Whether an address version byte belongs to this network.
    pub fn accepts_version(&self, version: u8) -> bool {
        match self {
            StacksNetwork::Mainnet => matches!(version, MAINNET_SINGLE_SIG | MAINNET_MULTI_SIG),
            StacksNetwork::Testnet => matches!(version, TESTNET_SINGLE_SIG | TESTNET_MULTI_SIG),
        }
    }

    /// Network an address version byte belongs to, if any.
    pub fn for_version(version: u8) -> Option<Self> {
        match version {
            MAINNET_SINGLE_SIG | MAINNET_MULTI_SIG => Some(StacksNetwork::Mainnet),
            TESTNET_SINGLE_SIG | TESTNET_MULTI_SIG => Some(StacksNetwork::Testnet),
            _ => None,
        }
    }

    /// Default public API base URL.
    pub fn default_api_url(&self) -> String {
        format!("https://stacks-node-api.{}.stacks.co", self.name())
    }
}

impl std::fmt::Display for StacksNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StacksNetwork {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(StacksNetwork::Testnet),
            "mainnet" => Ok(StacksNetwork::Mainnet),
            other => Err(BlockchainError::NotAvailable(format!("unknown network '{}'", other))),
        }
    }
}
