//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and contract identifiers
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: VaultConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::blockchain::network::StacksNetwork;
use crate::blockchain::principal::{validate_contract_name, StandardPrincipal};
use crate::config::schema::{NetworkEndpointConfig, VaultConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &str, raw: &str) {
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

fn check_endpoints(errors: &mut Vec<ValidationError>, prefix: &str, endpoints: &NetworkEndpointConfig) {
    check_http_url(errors, &format!("{}.api_url", prefix), &endpoints.api_url);
    for (i, raw) in endpoints.failover_urls.iter().enumerate() {
        check_http_url(errors, &format!("{}.failover_urls[{}]", prefix, i), raw);
    }
    if endpoints.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{}.rpc_timeout_secs", prefix),
            "must be greater than zero",
        ));
    }
}

/// Chain reads a submission may make before the wallet prompt opens:
/// the vault lookup and the tip height.
const CHAIN_READS_PER_SUBMISSION: u64 = 2;

/// Worst-case seconds a submission handler can take on `endpoints`.
fn submission_budget_secs(wallet_timeout_secs: u64, endpoints: &NetworkEndpointConfig) -> u64 {
    let attempts = 1 + endpoints.failover_urls.len() as u64;
    let chain = endpoints
        .rpc_timeout_secs
        .saturating_mul(attempts)
        .saturating_mul(CHAIN_READS_PER_SUBMISSION);
    wallet_timeout_secs.saturating_add(chain)
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &VaultConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("server.bind_address", "not a socket address"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than zero"));
    }

    let network = config.network.default.parse::<StacksNetwork>();
    if network.is_err() {
        errors.push(ValidationError::new(
            "network.default",
            format!("unknown network '{}'", config.network.default),
        ));
    }
    check_endpoints(&mut errors, "network.testnet", &config.network.testnet);
    check_endpoints(&mut errors, "network.mainnet", &config.network.mainnet);

    match config.contract.address.parse::<StandardPrincipal>() {
        Ok(deployer) => {
            if let Ok(network) = network {
                if let Err(e) = deployer.ensure_network(network) {
                    errors.push(ValidationError::new("contract.address", e.to_string()));
                }
            }
        }
        Err(e) => errors.push(ValidationError::new("contract.address", e.to_string())),
    }
    if let Err(e) = validate_contract_name(&config.contract.name) {
        errors.push(ValidationError::new("contract.name", e.to_string()));
    }
    if let Err(e) = validate_contract_name(&config.contract.nft_extension_name) {
        errors.push(ValidationError::new("contract.nft_extension_name", e.to_string()));
    }

    check_http_url(&mut errors, "wallet.bridge_url", &config.wallet.bridge_url);
    if config.wallet.timeout_secs == 0 {
        errors.push(ValidationError::new("wallet.timeout_secs", "must be greater than zero"));
    }

    // The request timeout must outlast a submission, or it cancels one midway
    let budget = [&config.network.testnet, &config.network.mainnet]
        .into_iter()
        .map(|endpoints| submission_budget_secs(config.wallet.timeout_secs, endpoints))
        .max()
        .unwrap_or_default();
    if config.server.request_timeout_secs > 0 && config.server.request_timeout_secs <= budget {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            format!(
                "must exceed the wallet timeout plus chain API attempts ({}s)",
                budget
            ),
        ));
    }

    if config.tracking.enabled && config.tracking.confirmation_poll_secs == 0 {
        errors.push(ValidationError::new(
            "tracking.confirmation_poll_secs",
            "must be greater than zero",
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "expected \"pretty\" or \"json\"",
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&VaultConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = VaultConfig::default();
        config.server.bind_address = "nowhere".into();
        config.network.default = "devnet".into();
        config.contract.name = "1-bad".into();
        config.wallet.bridge_url = "ftp://wallet".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["server.bind_address", "network.default", "contract.name", "wallet.bridge_url"]
        );
    }

    #[test]
    fn test_request_timeout_must_outlast_submissions() {
        let mut config = VaultConfig::default();
        // 300s wallet + 2 reads x 10s x 3 endpoints on mainnet
        config.network.mainnet.failover_urls = vec![
            "https://api.hiro.so".into(),
            "https://api.hiro.so".into(),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "server.request_timeout_secs");
        assert!(errors[0].message.contains("360s"));

        config.server.request_timeout_secs = 361;
        assert_eq!(validate_config(&config), Ok(()));

        let mut config = VaultConfig::default();
        config.server.request_timeout_secs = config.wallet.timeout_secs;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_contract_address_must_match_network() {
        let mut config = VaultConfig::default();
        config.network.default = "mainnet".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "contract.address");
        assert!(errors[0].message.contains("mismatch"));
    }
}
