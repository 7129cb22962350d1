//! Stacks node API client with timeout and failover handling.
//!
//! # Responsibilities
//! - Query chain state (tip height, transaction status)
//! - Run read-only contract calls
//! - Fail over across configured API endpoints
//! - Provide health check for chain API connectivity

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::clarity::ClarityValue;
use crate::blockchain::network::StacksNetwork;
use crate::blockchain::principal::{ContractPrincipal, StandardPrincipal};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus, TxId};
use crate::config::schema::{NetworkConfig, NetworkEndpointConfig};
use crate::observability::metrics;

/// Read access to chain state needed by the view layer.
///
/// Implemented by [`StacksClients`]; tests substitute fixed answers.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn current_block_height(&self, network: StacksNetwork) -> BlockchainResult<u64>;

    async fn transaction_status(
        &self,
        network: StacksNetwork,
        tx_id: &TxId,
    ) -> BlockchainResult<ConfirmationStatus>;

    async fn next_vault_id(
        &self,
        network: StacksNetwork,
        contract: &ContractPrincipal,
    ) -> BlockchainResult<u64>;
}

#[derive(Debug, Deserialize)]
struct BlockList {
    results: Vec<BlockSummary>,
}

#[derive(Debug, Deserialize)]
struct BlockSummary {
    height: u64,
}

#[derive(Debug, Deserialize)]
struct TransactionInfo {
    tx_status: String,
    #[serde(default)]
    block_height: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ReadOnlyRequest<'a> {
    sender: String,
    arguments: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ReadOnlyResponse {
    okay: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

/// Chain API client wrapper with failover support.
#[derive(Clone)]
pub struct StacksApiClient {
    http: reqwest::Client,
    /// Primary endpoint followed by failovers.
    endpoints: Vec<String>,
    network: StacksNetwork,
    timeout_duration: Duration,
}

impl StacksApiClient {
    /// Create a client for `network` using the configured endpoints.
    ///
    /// Invalid failover URLs are skipped; an invalid primary URL is an error.
    pub fn new(network: StacksNetwork, config: &NetworkEndpointConfig) -> BlockchainResult<Self> {
        let primary = url::Url::parse(&config.api_url).map_err(|e| {
            BlockchainError::Rpc(format!("Invalid API URL '{}': {}", config.api_url, e))
        })?;

        let mut endpoints = vec![primary.as_str().trim_end_matches('/').to_string()];
        for raw in &config.failover_urls {
            match url::Url::parse(raw) {
                Ok(url) => endpoints.push(url.as_str().trim_end_matches('/').to_string()),
                Err(_) => tracing::warn!(url = %raw, "Ignoring invalid failover API URL"),
            }
        }

        tracing::info!(
            network = %network,
            api_url = %endpoints[0],
            failovers = endpoints.len() - 1,
            "Chain API client initialized"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            endpoints,
            network,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    pub fn network(&self) -> StacksNetwork {
        self.network
    }

    /// Error once every endpoint has been tried. Timeouts on all of them
    /// are reported as such rather than as a generic failure.
    fn exhausted(&self, timeouts: usize, request: String) -> BlockchainError {
        if timeouts == self.endpoints.len() {
            BlockchainError::Timeout(self.timeout_duration.as_secs())
        } else {
            BlockchainError::Rpc(format!("All API endpoints failed for {}", request))
        }
    }

    /// GET `path` from the first endpoint that answers. `Ok(None)` on 404.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> BlockchainResult<Option<T>> {
        let mut timeouts = 0;
        for (i, base) in self.endpoints.iter().enumerate() {
            let url = format!("{}{}", base, path);
            let fut = async {
                let response = self.http.get(&url).send().await?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok::<_, reqwest::Error>(None);
                }
                response.error_for_status()?.json::<T>().await.map(Some)
            };
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(endpoint_idx = i, error = %e, "API error, trying next endpoint"),
                Err(_) => {
                    timeouts += 1;
                    tracing::warn!(endpoint_idx = i, "API timeout, trying next endpoint");
                }
            }
        }
        Err(self.exhausted(timeouts, format!("GET {}", path)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BlockchainResult<T> {
        self.get_optional(path)
            .await?
            .ok_or_else(|| BlockchainError::UnexpectedResponse(format!("{} not found", path)))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> BlockchainResult<T> {
        let mut timeouts = 0;
        for (i, base) in self.endpoints.iter().enumerate() {
            let url = format!("{}{}", base, path);
            let fut = async {
                self.http
                    .post(&url)
                    .json(body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<T>()
                    .await
            };
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(endpoint_idx = i, error = %e, "API error, trying next endpoint"),
                Err(_) => {
                    timeouts += 1;
                    tracing::warn!(endpoint_idx = i, "API timeout, trying next endpoint");
                }
            }
        }
        Err(self.exhausted(timeouts, format!("POST {}", path)))
    }

    /// Height of the latest anchored block.
    pub async fn get_block_height(&self) -> BlockchainResult<u64> {
        let blocks: BlockList = self.get_json("/extended/v1/block?limit=1").await?;
        blocks
            .results
            .first()
            .map(|b| b.height)
            .ok_or_else(|| BlockchainError::UnexpectedResponse("block list is empty".into()))
    }

    /// Evaluate a read-only contract function.
    pub async fn call_read_only(
        &self,
        contract: &ContractPrincipal,
        function: &str,
        args: &[ClarityValue],
        sender: &StandardPrincipal,
    ) -> BlockchainResult<ClarityValue> {
        let arguments = args
            .iter()
            .map(ClarityValue::to_hex)
            .collect::<BlockchainResult<Vec<_>>>()?;
        let path = format!(
            "/v2/contracts/call-read/{}/{}/{}",
            contract.issuer, contract.name, function
        );
        let request = ReadOnlyRequest {
            sender: sender.to_string(),
            arguments: &arguments,
        };

        let response: ReadOnlyResponse = self.post_json(&path, &request).await?;
        if !response.okay {
            return Err(BlockchainError::ReadOnlyCall(
                response.cause.unwrap_or_else(|| "unknown cause".to_string()),
            ));
        }
        let result = response
            .result
            .ok_or_else(|| BlockchainError::UnexpectedResponse("read-only result missing".into()))?;
        ClarityValue::from_hex(&result)
    }

    /// Id the contract will assign to the next created vault.
    pub async fn get_next_vault_id(&self, contract: &ContractPrincipal) -> BlockchainResult<u64> {
        let value = self
            .call_read_only(contract, "get-next-vault-id", &[], &contract.issuer)
            .await?
            .into_ok()?;
        value
            .as_uint()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| BlockchainError::UnexpectedResponse(format!("expected uint, got {:?}", value)))
    }

    /// Current status of a submitted transaction.
    ///
    /// Unknown transactions are reported as pending: a fresh submission may
    /// not have reached the node's mempool yet.
    pub async fn get_transaction_status(&self, tx_id: &TxId) -> BlockchainResult<ConfirmationStatus> {
        let info: Option<TransactionInfo> =
            self.get_optional(&format!("/extended/v1/tx/{}", tx_id)).await?;
        let Some(info) = info else {
            return Ok(ConfirmationStatus::Pending);
        };

        let status = match info.tx_status.as_str() {
            "pending" => ConfirmationStatus::Pending,
            "success" => ConfirmationStatus::Confirmed {
                block_height: info.block_height.unwrap_or_default(),
            },
            other => ConfirmationStatus::Failed(other.to_string()),
        };
        Ok(status)
    }

    /// Check if the chain API is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_height().await.is_ok();
        metrics::record_chain_api_health(self.network.name(), healthy);
        healthy
    }
}

/// One API client per network; reads go to the network they are asked about.
#[derive(Debug, Clone)]
pub struct StacksClients {
    testnet: StacksApiClient,
    mainnet: StacksApiClient,
}

impl StacksClients {
    pub fn new(config: &NetworkConfig) -> BlockchainResult<Self> {
        Ok(Self {
            testnet: StacksApiClient::new(
                StacksNetwork::Testnet,
                config.endpoints(StacksNetwork::Testnet),
            )?,
            mainnet: StacksApiClient::new(
                StacksNetwork::Mainnet,
                config.endpoints(StacksNetwork::Mainnet),
            )?,
        })
    }

    pub fn get(&self, network: StacksNetwork) -> &StacksApiClient {
        match network {
            StacksNetwork::Testnet => &self.testnet,
            StacksNetwork::Mainnet => &self.mainnet,
        }
    }
}

#[async_trait]
impl ChainReader for StacksClients {
    async fn current_block_height(&self, network: StacksNetwork) -> BlockchainResult<u64> {
        self.get(network).get_block_height().await
    }

    async fn transaction_status(
        &self,
        network: StacksNetwork,
        tx_id: &TxId,
    ) -> BlockchainResult<ConfirmationStatus> {
        self.get(network).get_transaction_status(tx_id).await
    }

    async fn next_vault_id(
        &self,
        network: StacksNetwork,
        contract: &ContractPrincipal,
    ) -> BlockchainResult<u64> {
        self.get(network).get_next_vault_id(contract).await
    }
}

impl std::fmt::Debug for StacksApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StacksApiClient")
            .field("network", &self.network)
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
