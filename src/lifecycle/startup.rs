//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the wallet bridge and per-network chain API clients from config
//! - Probe the chain API for the configured default network
//! - Assemble the application state the HTTP server runs on
//!
//! # Design Decisions
//! - Fail fast on invalid contract identifiers or unusable endpoint URLs
//! - An unreachable chain API is only a warning

use std::sync::Arc;

use crate::blockchain::{
    BlockchainError, BridgeWallet, ChainReader, ContractPrincipal, StacksClients, StacksNetwork,
    StandardPrincipal,
};
use crate::config::VaultConfig;
use crate::http::AppState;
use crate::vault::repository::PlaceholderVaultRepository;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("wallet bridge: {0}")]
    Wallet(BlockchainError),

    #[error("chain API clients: {0}")]
    ChainClients(BlockchainError),

    #[error("vault contract: {0}")]
    Contract(BlockchainError),
}

/// Build the application state from a validated configuration.
pub async fn build_state(config: VaultConfig) -> Result<AppState, StartupError> {
    let wallet = Arc::new(BridgeWallet::new(&config.wallet).map_err(StartupError::Wallet)?);
    let clients = StacksClients::new(&config.network).map_err(StartupError::ChainClients)?;

    let network: StacksNetwork = config.network.default.parse().unwrap_or_default();
    if clients.get(network).is_healthy().await {
        tracing::info!(network = %network, "Chain API reachable");
    } else {
        tracing::warn!(
            network = %network,
            api_url = %config.network.endpoints(network).api_url,
            "Chain API unreachable; vault reads will use placeholder data"
        );
    }

    let issuer: StandardPrincipal = config
        .contract
        .address
        .parse()
        .map_err(StartupError::Contract)?;
    let contract =
        ContractPrincipal::new(issuer, config.contract.name.clone()).map_err(StartupError::Contract)?;

    let chain: Arc<dyn ChainReader> = Arc::new(clients);
    let repository = Arc::new(PlaceholderVaultRepository::with_chain_bound(
        chain.clone(),
        contract,
    ));

    AppState::new(config, wallet, chain, repository).map_err(StartupError::Contract)
}
