//! Wallet integration: sign-in and contract-call signing.
//!
//! # Security
//! - Keys never enter this process; signing happens inside the wallet
//! - Every state-changing call is approved by the user in the wallet
//! - Only addresses and transaction ids are logged

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::contract_call::{AppDetails, ContractCall};
use crate::blockchain::network::StacksNetwork;
use crate::blockchain::types::{BlockchainError, BlockchainResult, TxSubmission};
use crate::config::schema::WalletConfig;

/// Per-network STX addresses of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StxAddresses {
    pub mainnet: String,
    pub testnet: String,
}

/// Identity returned by the wallet after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub stx_address: StxAddresses,
    #[serde(default)]
    pub username: Option<String>,
}

impl UserData {
    /// The user's address on `network`.
    pub fn address_for(&self, network: StacksNetwork) -> &str {
        match network {
            StacksNetwork::Mainnet => &self.stx_address.mainnet,
            StacksNetwork::Testnet => &self.stx_address.testnet,
        }
    }
}

/// The wallet that authenticates the user and signs transactions.
///
/// Calls return once the wallet has *submitted* the transaction, not once
/// it is confirmed. A declined prompt surfaces as [`BlockchainError::Wallet`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompt the user to connect and return their identity.
    async fn connect(&self, app: &AppDetails) -> BlockchainResult<UserData>;

    /// Prompt the user to sign and broadcast a contract call.
    async fn open_contract_call(&self, call: &ContractCall) -> BlockchainResult<TxSubmission>;

    /// Forget the connected identity.
    async fn disconnect(&self) -> BlockchainResult<()> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct BridgeError {
    error: String,
}

/// Wallet reached through an HTTP bridge to the user's wallet.
///
/// # Endpoints
/// - `POST {bridge}/connect` with `AppDetails`, answers `UserData`
/// - `POST {bridge}/contract-call` with a `ContractCallPayload`, answers `{"txId": ..}`
/// - `POST {bridge}/disconnect`
#[derive(Debug, Clone)]
pub struct BridgeWallet {
    http: reqwest::Client,
    base_url: String,
    timeout_duration: Duration,
}

impl BridgeWallet {
    pub fn new(config: &WalletConfig) -> BlockchainResult<Self> {
        let base = url::Url::parse(&config.bridge_url).map_err(|e| {
            BlockchainError::Wallet(format!("Invalid bridge URL '{}': {}", config.bridge_url, e))
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            timeout_duration: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> BlockchainResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout_duration)
            .json(body)
            .send()
            .await
            .map_err(|e| BlockchainError::Wallet(format!("bridge unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<BridgeError>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(BlockchainError::Wallet(reason));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BlockchainError::Wallet(format!("invalid bridge response: {}", e)))
    }
}

#[async_trait]
impl WalletProvider for BridgeWallet {
    async fn connect(&self, app: &AppDetails) -> BlockchainResult<UserData> {
        let user: UserData = self.post("/connect", app).await?;
        tracing::info!(address = %user.stx_address.testnet, "Wallet connected");
        Ok(user)
    }

    async fn open_contract_call(&self, call: &ContractCall) -> BlockchainResult<TxSubmission> {
        let payload = call.to_payload()?;
        self.post("/contract-call", &payload).await
    }

    async fn disconnect(&self) -> BlockchainResult<()> {
        let _: serde_json::Value = self.post("/disconnect", &serde_json::json!({})).await?;
        Ok(())
    }
}
