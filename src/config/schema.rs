//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the vault service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::blockchain::network::StacksNetwork;

/// Root configuration for the vault service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Network selection and per-network chain API endpoints.
    pub network: NetworkConfig,

    /// Deployed contract identifiers.
    pub contract: ContractConfig,

    /// Wallet bridge settings.
    pub wallet: WalletConfig,

    /// Application identity shown in wallet prompts.
    pub app: AppConfig,

    /// Submitted-action tracking.
    pub tracking: TrackingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Request timeout in seconds. Must cover a wallet approval.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 330,
        }
    }
}

/// Network selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network selected at startup ("testnet" or "mainnet").
    pub default: String,

    /// Testnet chain API.
    pub testnet: NetworkEndpointConfig,

    /// Mainnet chain API.
    pub mainnet: NetworkEndpointConfig,
}

impl NetworkConfig {
    /// Endpoint settings for `network`.
    pub fn endpoints(&self, network: StacksNetwork) -> &NetworkEndpointConfig {
        match network {
            StacksNetwork::Testnet => &self.testnet,
            StacksNetwork::Mainnet => &self.mainnet,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default: StacksNetwork::Testnet.name().to_string(),
            testnet: NetworkEndpointConfig::for_network(StacksNetwork::Testnet),
            mainnet: NetworkEndpointConfig::for_network(StacksNetwork::Mainnet),
        }
    }
}

/// Chain API endpoints for one network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkEndpointConfig {
    /// Chain API base URL.
    pub api_url: String,

    /// Failover chain API base URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain API request timeout in seconds.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_secs: u64,
}

fn default_rpc_timeout() -> u64 {
    10
}

impl NetworkEndpointConfig {
    pub fn for_network(network: StacksNetwork) -> Self {
        Self {
            api_url: network.default_api_url(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: default_rpc_timeout(),
        }
    }
}

/// Deployed contract identifiers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Deployer address of the vault contracts.
    pub address: String,

    /// Vault contract name.
    pub name: String,

    /// NFT extension contract name (same deployer).
    pub nft_extension_name: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: "ST39PS2F0FVJKXD0D3G41ATAEK13NXXDN8VGQN5FW".to_string(),
            name: "timelock-vault".to_string(),
            nft_extension_name: "nft-vault-extension".to_string(),
        }
    }
}

/// Wallet bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Base URL of the wallet bridge.
    pub bridge_url: String,

    /// How long to wait for the user to answer a wallet prompt, in seconds.
    pub timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            bridge_url: "http://127.0.0.1:8765".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub icon_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "TimeLock Vault".to_string(),
            icon_url: "http://127.0.0.1:3000/logo.png".to_string(),
        }
    }
}

/// Submitted-action tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Enable background confirmation polling.
    pub enabled: bool,

    /// Interval between transaction status polls, in seconds.
    pub confirmation_poll_secs: u64,

    /// Give up on a pending transaction after this many seconds.
    pub confirmation_timeout_secs: u64,

    /// Delay before refetching a vault after an NFT submission, in milliseconds.
    pub nft_refresh_delay_ms: u64,

    /// How long settled actions stay queryable, in seconds. Vault creations
    /// are kept regardless since they back the vault listing.
    pub retention_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confirmation_poll_secs: 10,
            confirmation_timeout_secs: 3600,
            nft_refresh_delay_ms: 3000,
            retention_secs: 86_400,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
