//! Contract call requests handed to the wallet for signing.

use serde::{Deserialize, Serialize};

use crate::blockchain::clarity::ClarityValue;
use crate::blockchain::network::StacksNetwork;
use crate::blockchain::principal::ContractPrincipal;
use crate::blockchain::types::BlockchainResult;

/// Application identity shown in the wallet prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDetails {
    pub name: String,
    pub icon: String,
}

/// How the wallet should treat asset transfers not covered by post-conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostConditionMode {
    Allow,
    #[default]
    Deny,
}

/// A state-changing call against a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: ContractPrincipal,
    pub function_name: String,
    pub function_args: Vec<ClarityValue>,
    pub network: StacksNetwork,
    pub post_condition_mode: PostConditionMode,
    pub app_details: AppDetails,
}

impl ContractCall {
    pub fn new(
        contract: ContractPrincipal,
        function_name: impl Into<String>,
        function_args: Vec<ClarityValue>,
        network: StacksNetwork,
        app_details: AppDetails,
    ) -> Self {
        Self {
            contract,
            function_name: function_name.into(),
            function_args,
            network,
            post_condition_mode: PostConditionMode::default(),
            app_details,
        }
    }

    pub fn with_post_condition_mode(mut self, mode: PostConditionMode) -> Self {
        self.post_condition_mode = mode;
        self
    }

    /// Encode into the JSON payload a wallet consumes.
    pub fn to_payload(&self) -> BlockchainResult<ContractCallPayload> {
        let function_args = self
            .function_args
            .iter()
            .map(ClarityValue::to_hex)
            .collect::<BlockchainResult<Vec<_>>>()?;

        Ok(ContractCallPayload {
            contract_address: self.contract.issuer.to_string(),
            contract_name: self.contract.name.clone(),
            function_name: self.function_name.clone(),
            function_args,
            network: self.network,
            post_condition_mode: self.post_condition_mode,
            app_details: self.app_details.clone(),
        })
    }
}

/// Wire form of a [`ContractCall`]: arguments are hex-serialized Clarity values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCallPayload {
    pub contract_address: String,
    pub contract_name: String,
    pub function_name: String,
    pub function_args: Vec<String>,
    pub network: StacksNetwork,
    pub post_condition_mode: PostConditionMode,
    pub app_details: AppDetails,
}
