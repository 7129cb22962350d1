//! Contract call facade.
//!
//! # Responsibilities
//! - Check that required arguments are present before anything is sent
//! - Encode arguments into typed Clarity values
//! - Target the configured vault contract (or its NFT extension)
//! - Submit through the wallet and return once the submission completes
//!
//! # Design Decisions
//! - Every operation takes an explicit `SessionContext`; no ambient session
//! - No retries: a failed submission is retried by the user
//! - No idempotency: submitting twice creates two pending transactions
//! - Deposits use `Allow` post-condition mode so the wallet lets the
//!   transfer into the contract through

use std::sync::Arc;

use crate::blockchain::clarity::ClarityValue;
use crate::blockchain::contract_call::{AppDetails, ContractCall, PostConditionMode};
use crate::blockchain::principal::{ContractPrincipal, StandardPrincipal};
use crate::blockchain::types::{BlockchainResult, TxSubmission};
use crate::blockchain::wallet::WalletProvider;
use crate::config::schema::{AppConfig, ContractConfig};
use crate::observability::metrics;
use crate::session::SessionContext;
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::types::{AddHeirParams, CreateVaultParams, DepositAssetParams, NftParams};

pub const FN_CREATE_VAULT: &str = "create-vault";
pub const FN_DEPOSIT_STX: &str = "deposit-stx";
pub const FN_ADD_HEIR: &str = "add-heir";
pub const FN_PING: &str = "ping";
pub const FN_STORE_NOTES_HASH: &str = "store-notes-hash";
pub const FN_CLAIM_AS_HEIR: &str = "claim-as-heir";
pub const FN_DEPOSIT_NFT: &str = "deposit-nft";
pub const FN_CLAIM_NFT: &str = "claim-nft";

/// Builds and submits vault contract calls.
#[derive(Clone)]
pub struct VaultService {
    wallet: Arc<dyn WalletProvider>,
    vault_contract: ContractPrincipal,
    nft_contract: ContractPrincipal,
    app: AppDetails,
}

impl VaultService {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        contract: &ContractConfig,
        app: &AppConfig,
    ) -> BlockchainResult<Self> {
        let issuer: StandardPrincipal = contract.address.parse()?;
        Ok(Self {
            wallet,
            vault_contract: ContractPrincipal::new(issuer, contract.name.clone())?,
            nft_contract: ContractPrincipal::new(issuer, contract.nft_extension_name.clone())?,
            app: AppDetails {
                name: app.name.clone(),
                icon: app.icon_url.clone(),
            },
        })
    }

    pub fn vault_contract(&self) -> &ContractPrincipal {
        &self.vault_contract
    }

    pub fn nft_contract(&self) -> &ContractPrincipal {
        &self.nft_contract
    }

    pub fn app_details(&self) -> &AppDetails {
        &self.app
    }

    /// Submit `create-vault(unlock-height, inactivity-timeout)`.
    pub async fn create_vault(
        &self,
        ctx: &SessionContext,
        params: &CreateVaultParams,
    ) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        if params.unlock_height == 0 {
            return Err(VaultError::MissingArgument("unlock_height"));
        }
        if params.inactivity_timeout == 0 {
            return Err(VaultError::MissingArgument("inactivity_timeout"));
        }

        let args = vec![
            ClarityValue::uint(params.unlock_height),
            ClarityValue::uint(params.inactivity_timeout),
        ];
        self.submit(ctx, self.vault_call(ctx, FN_CREATE_VAULT, args)).await
    }

    /// Submit `deposit-stx(vault-id, amount)`; `amount` in micro-STX.
    pub async fn deposit_stx(
        &self,
        ctx: &SessionContext,
        params: &DepositAssetParams,
    ) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        if params.amount == 0 {
            return Err(VaultError::MissingArgument("amount"));
        }

        let args = vec![ClarityValue::uint(params.vault_id), ClarityValue::uint(params.amount)];
        let call = self
            .vault_call(ctx, FN_DEPOSIT_STX, args)
            .with_post_condition_mode(PostConditionMode::Allow);
        self.submit(ctx, call).await
    }

    /// Submit `add-heir(vault-id, heir, percentage)`.
    ///
    /// The share total across heirs is not checked here.
    pub async fn add_heir(
        &self,
        ctx: &SessionContext,
        params: &AddHeirParams,
    ) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        let address = params.heir_address.trim();
        if address.is_empty() {
            return Err(VaultError::MissingArgument("heir_address"));
        }
        if params.percentage == 0 {
            return Err(VaultError::MissingArgument("percentage"));
        }
        let heir: StandardPrincipal = address
            .parse()
            .map_err(|e| VaultError::invalid("heir_address", format!("{}", e)))?;
        heir.ensure_network(ctx.network)
            .map_err(|e| VaultError::invalid("heir_address", format!("{}", e)))?;

        let args = vec![
            ClarityValue::uint(params.vault_id),
            ClarityValue::from(heir),
            ClarityValue::uint(params.percentage),
        ];
        self.submit(ctx, self.vault_call(ctx, FN_ADD_HEIR, args)).await
    }

    /// Submit `ping(vault-id)`, resetting the inactivity clock.
    pub async fn ping_vault(&self, ctx: &SessionContext, vault_id: u64) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        let args = vec![ClarityValue::uint(vault_id)];
        self.submit(ctx, self.vault_call(ctx, FN_PING, args)).await
    }

    /// Submit `store-notes-hash(vault-id, hash)`.
    pub async fn store_notes_hash(
        &self,
        ctx: &SessionContext,
        vault_id: u64,
        hash: &[u8],
    ) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        if hash.is_empty() {
            return Err(VaultError::MissingArgument("hash"));
        }

        let args = vec![ClarityValue::uint(vault_id), ClarityValue::buffer(hash)];
        self.submit(ctx, self.vault_call(ctx, FN_STORE_NOTES_HASH, args)).await
    }

    /// Submit `claim-as-heir(vault-id)`.
    pub async fn claim_as_heir(&self, ctx: &SessionContext, vault_id: u64) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        let args = vec![ClarityValue::uint(vault_id)];
        self.submit(ctx, self.vault_call(ctx, FN_CLAIM_AS_HEIR, args)).await
    }

    /// Submit `deposit-nft(vault-id, nft-contract, token-id)` on the extension.
    pub async fn deposit_nft(&self, ctx: &SessionContext, params: &NftParams) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        let args = nft_args(params)?;
        let call = ContractCall::new(
            self.nft_contract.clone(),
            FN_DEPOSIT_NFT,
            args,
            ctx.network,
            self.app.clone(),
        )
        .with_post_condition_mode(PostConditionMode::Allow);
        self.submit(ctx, call).await
    }

    /// Submit `claim-nft(vault-id, nft-contract, token-id)` on the extension.
    pub async fn claim_nft_as_heir(
        &self,
        ctx: &SessionContext,
        params: &NftParams,
    ) -> VaultResult<TxSubmission> {
        require_identity(ctx)?;
        let args = nft_args(params)?;
        let call = ContractCall::new(
            self.nft_contract.clone(),
            FN_CLAIM_NFT,
            args,
            ctx.network,
            self.app.clone(),
        );
        self.submit(ctx, call).await
    }

    fn vault_call(&self, ctx: &SessionContext, function: &str, args: Vec<ClarityValue>) -> ContractCall {
        ContractCall::new(
            self.vault_contract.clone(),
            function,
            args,
            ctx.network,
            self.app.clone(),
        )
    }

    async fn submit(&self, ctx: &SessionContext, call: ContractCall) -> VaultResult<TxSubmission> {
        let sender = ctx.address().unwrap_or_default();
        tracing::debug!(
            contract = %call.contract,
            function = %call.function_name,
            sender = %sender,
            network = %ctx.network,
            "Opening contract call in wallet"
        );

        match self.wallet.open_contract_call(&call).await {
            Ok(submission) => {
                metrics::record_contract_call(&call.function_name, true);
                tracing::info!(
                    function = %call.function_name,
                    tx_id = %submission.tx_id,
                    sender = %sender,
                    "Contract call submitted"
                );
                Ok(submission)
            }
            Err(e) => {
                metrics::record_contract_call(&call.function_name, false);
                tracing::error!(
                    function = %call.function_name,
                    sender = %sender,
                    error = %e,
                    "Contract call submission failed"
                );
                Err(VaultError::Submission(e))
            }
        }
    }
}

impl std::fmt::Debug for VaultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService")
            .field("vault_contract", &self.vault_contract.to_string())
            .field("nft_contract", &self.nft_contract.to_string())
            .finish()
    }
}

fn require_identity(ctx: &SessionContext) -> VaultResult<()> {
    if ctx.is_signed_in() {
        Ok(())
    } else {
        Err(VaultError::NotSignedIn)
    }
}

fn nft_args(params: &NftParams) -> VaultResult<Vec<ClarityValue>> {
    let contract = params.nft_contract.trim();
    if contract.is_empty() {
        return Err(VaultError::MissingArgument("nft_contract"));
    }
    let nft_contract: ContractPrincipal = contract
        .parse()
        .map_err(|e| VaultError::invalid("nft_contract", format!("{}", e)))?;

    Ok(vec![
        ClarityValue::uint(params.vault_id),
        ClarityValue::from(nft_contract),
        ClarityValue::uint(params.token_id),
    ])
}
