//! NFT panel of the management screen.
//!
//! Deposit is offered to the vault owner, claim to an heir once the vault
//! is claimable. A successful submission clears the inputs and schedules a
//! reload of the vault after a fixed delay, giving the transaction time to
//! become visible on-chain.

use serde::Serialize;
use std::time::Duration;

use crate::blockchain::network::StacksNetwork;
use crate::session::SessionContext;
use crate::vault::action::ActionRecord;
use crate::vault::service::{FN_CLAIM_NFT, FN_DEPOSIT_NFT};
use crate::vault::types::NftParams;
use crate::views::manage::ManageScreen;
use crate::views::{FormError, Submitted, ViewServices};

const MISSING_INPUT: &str = "Please enter NFT contract address and token ID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NftForm {
    pub contract: String,
    pub token_id: String,
    pub refresh_scheduled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NftAction {
    Deposit,
    Claim,
}

impl NftAction {
    fn function(self) -> &'static str {
        match self {
            NftAction::Deposit => FN_DEPOSIT_NFT,
            NftAction::Claim => FN_CLAIM_NFT,
        }
    }
}

impl ManageScreen {
    /// Deposit an NFT into the vault. Owner only.
    pub async fn deposit_nft(
        &self,
        services: &ViewServices,
        ctx: &SessionContext,
        contract: &str,
        token_id: &str,
    ) -> Result<Submitted, FormError> {
        self.submit_nft(services, ctx, NftAction::Deposit, contract, token_id)
            .await
    }

    /// Claim an NFT from the vault. Heirs only, once claimable.
    pub async fn claim_nft(
        &self,
        services: &ViewServices,
        ctx: &SessionContext,
        contract: &str,
        token_id: &str,
    ) -> Result<Submitted, FormError> {
        self.submit_nft(services, ctx, NftAction::Claim, contract, token_id)
            .await
    }

    async fn submit_nft(
        &self,
        services: &ViewServices,
        ctx: &SessionContext,
        action: NftAction,
        contract: &str,
        token_id: &str,
    ) -> Result<Submitted, FormError> {
        let form = action.function();
        if !ctx.is_signed_in() {
            return Err(services.reject(form, FormError::NotSignedIn));
        }
        self.ensure_loaded(services, ctx.network).await?;

        let (params, guard) = {
            let mut state = self.state.lock().await;
            state.nft.contract = contract.to_string();
            state.nft.token_id = token_id.to_string();

            let contract = contract.trim();
            let token_id = token_id.trim().parse::<u64>().ok();
            let (vault_id, token_id) = match (state.vault_id, token_id) {
                (id, Some(token)) if id > 0 && !contract.is_empty() => (id, token),
                _ => return Err(services.reject(form, FormError::Invalid(MISSING_INPUT.into()))),
            };

            let address = ctx.address().unwrap_or_default();
            let vault = state.vault.as_ref();
            match action {
                NftAction::Deposit if !vault.is_some_and(|v| v.is_owner(address)) => {
                    return Err(services.reject(
                        form,
                        FormError::NotPermitted("Only the vault owner can deposit NFTs"),
                    ));
                }
                NftAction::Claim if !(vault.is_some_and(|v| v.is_heir(address)) && state.can_claim()) => {
                    return Err(services.reject(
                        form,
                        FormError::NotPermitted("Only an heir can claim NFTs once the vault unlocks"),
                    ));
                }
                _ => {}
            }

            state.begin(form)?;
            let params = NftParams {
                vault_id,
                nft_contract: contract.to_string(),
                token_id,
            };
            (params, self.in_flight_guard(form))
        };

        let outcome = match action {
            NftAction::Deposit => services.vaults.deposit_nft(ctx, &params).await,
            NftAction::Claim => services.vaults.claim_nft_as_heir(ctx, &params).await,
        };
        let record = ActionRecord::new(form, ctx.network)
            .vault(params.vault_id)
            .sender(ctx.address())
            .detail(serde_json::json!({
                "nft_contract": params.nft_contract,
                "token_id": params.token_id,
            }));
        let (success, failure) = match action {
            NftAction::Deposit => ("NFT deposit transaction submitted!", "Failed to deposit NFT"),
            NftAction::Claim => ("NFT claim transaction submitted!", "Failed to claim NFT"),
        };

        let submitted = {
            let mut state = self.state.lock().await;
            guard.release(&mut state);
            let submitted = services.finish(record, outcome, success, failure)?;
            state.nft.contract.clear();
            state.nft.token_id.clear();
            state.nft.refresh_scheduled = true;
            submitted
        };

        self.schedule_refresh(services.clone(), ctx.network, services.nft_refresh_delay);
        Ok(submitted)
    }

    /// Reload the vault after `delay` on a detached task.
    pub fn schedule_refresh(&self, services: ViewServices, network: StacksNetwork, delay: Duration) {
        let screen = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = screen.reload(&services, network).await {
                tracing::warn!(error = %e, "Delayed vault refresh failed");
            }
            screen.state.lock().await.nft.refresh_scheduled = false;
        });
    }
}
