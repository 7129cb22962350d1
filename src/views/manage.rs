//! Vault management screen: assets, heirs and notes tabs.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::network::StacksNetwork;
use crate::session::SessionContext;
use crate::units::{micro_to_stx_string, stx_to_micro};
use crate::vault::action::ActionRecord;
use crate::vault::error::VaultError;
use crate::vault::notes::hash_notes;
use crate::vault::service::{FN_ADD_HEIR, FN_CLAIM_AS_HEIR, FN_DEPOSIT_STX, FN_PING, FN_STORE_NOTES_HASH};
use crate::vault::types::{AddHeirParams, DepositAssetParams, Vault};
use crate::views::nft::NftForm;
use crate::views::{FormError, SubmitGuard, Submitted, ViewServices};

pub const DEFAULT_HEIR_PERCENTAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManageTab {
    #[default]
    Assets,
    Heirs,
    Notes,
}

/// Current input of each form on the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManageForms {
    pub stx_amount: String,
    pub heir_address: String,
    pub heir_percentage: u32,
    pub notes: String,
}

impl Default for ManageForms {
    fn default() -> Self {
        Self {
            stx_amount: String::new(),
            heir_address: String::new(),
            heir_percentage: DEFAULT_HEIR_PERCENTAGE,
            notes: String::new(),
        }
    }
}

/// Per-vault screen state.
#[derive(Debug, Default)]
pub struct ManageState {
    pub(crate) vault_id: u64,
    pub(crate) vault: Option<Vault>,
    pub(crate) current_height: Option<u64>,
    pub(crate) tab: ManageTab,
    pub(crate) forms: ManageForms,
    pub(crate) nft: NftForm,
    /// Forms whose submission is in flight.
    pub(crate) in_flight: BTreeSet<&'static str>,
    /// Completed reloads of the vault snapshot.
    pub(crate) loads: u32,
}

impl ManageState {
    fn new(vault_id: u64) -> Self {
        Self {
            vault_id,
            ..Default::default()
        }
    }

    /// Mark `form` as submitting. Fails if it already is.
    pub(crate) fn begin(&mut self, form: &'static str) -> Result<(), FormError> {
        if !self.in_flight.insert(form) {
            return Err(FormError::InFlight(form));
        }
        Ok(())
    }

    pub(crate) fn end(&mut self, form: &'static str) {
        self.in_flight.remove(form);
    }

    /// Whether the identity may claim at the last known height.
    pub(crate) fn can_claim(&self) -> bool {
        match (&self.vault, self.current_height) {
            (Some(vault), Some(height)) => vault.active && vault.is_claimable_at(height),
            _ => false,
        }
    }
}

/// What the screen shows to a given identity.
#[derive(Debug, Clone, Serialize)]
pub struct ManageSnapshot {
    pub vault_id: u64,
    pub vault: Option<Vault>,
    pub tab: ManageTab,
    pub forms: ManageForms,
    pub nft: NftForm,
    pub is_owner: bool,
    pub is_heir: bool,
    pub can_claim: bool,
    pub current_height: Option<u64>,
    pub stx_balance: Option<String>,
    pub total_heir_percentage: Option<u32>,
    pub unlock_in_days: Option<f64>,
    pub in_flight: Vec<&'static str>,
    /// Notes text is not stored anywhere; only its hash goes on-chain.
    pub notes_persisted: bool,
}

/// Handle to one vault's screen.
#[derive(Debug, Clone)]
pub struct ManageScreen {
    pub(crate) state: Arc<Mutex<ManageState>>,
}

impl ManageScreen {
    pub fn new(vault_id: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManageState::new(vault_id))),
        }
    }

    /// Load the vault snapshot unless it is already loaded.
    pub async fn ensure_loaded(&self, services: &ViewServices, network: StacksNetwork) -> Result<(), FormError> {
        if self.state.lock().await.vault.is_some() {
            return Ok(());
        }
        self.reload(services, network).await
    }

    /// Fetch the vault and the tip height of `network` again.
    pub async fn reload(&self, services: &ViewServices, network: StacksNetwork) -> Result<(), FormError> {
        let vault_id = self.state.lock().await.vault_id;

        let vault = match services.repository.get_vault(vault_id).await {
            Ok(vault) => vault,
            Err(e @ VaultError::NotFound(_)) => return Err(FormError::Vault(e)),
            Err(e) => {
                tracing::error!(vault_id, error = %e, "Failed to load vault");
                services.notifier.error("Failed to load vault data", None);
                return Err(FormError::Vault(e));
            }
        };
        let height = match services.chain.current_block_height(network).await {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(vault_id, error = %e, "Block height unavailable; claim state unknown");
                None
            }
        };

        let mut state = self.state.lock().await;
        state.vault = Some(vault);
        if height.is_some() {
            state.current_height = height;
        }
        state.loads += 1;
        Ok(())
    }

    pub async fn snapshot(&self, ctx: &SessionContext) -> ManageSnapshot {
        let state = self.state.lock().await;
        let address = ctx.address().unwrap_or_default();
        let vault = state.vault.as_ref();

        ManageSnapshot {
            vault_id: state.vault_id,
            vault: state.vault.clone(),
            tab: state.tab,
            forms: state.forms.clone(),
            nft: state.nft.clone(),
            is_owner: vault.is_some_and(|v| v.is_owner(address)),
            is_heir: vault.is_some_and(|v| v.is_heir(address)),
            can_claim: state.can_claim(),
            current_height: state.current_height,
            stx_balance: vault.map(|v| micro_to_stx_string(v.stx_balance())),
            total_heir_percentage: vault.map(Vault::total_heir_percentage),
            unlock_in_days: vault.zip(state.current_height).map(|(v, h)| {
                crate::units::blocks_to_days(v.unlock_height.saturating_sub(h))
            }),
            in_flight: state.in_flight.iter().copied().collect(),
            notes_persisted: false,
        }
    }

    /// Clears `form` from the in-flight set when dropped or released.
    pub(crate) fn in_flight_guard(&self, form: &'static str) -> SubmitGuard<ManageState> {
        SubmitGuard::new(Arc::clone(&self.state), move |state: &mut ManageState| state.end(form))
    }

    pub async fn loads(&self) -> u32 {
        self.state.lock().await.loads
    }

    pub async fn set_tab(&self, tab: ManageTab) {
        self.state.lock().await.tab = tab;
    }

    /// Deposit STX from the assets tab. `amount` is the raw STX input.
    pub async fn deposit_stx(
        &self,
        services: &ViewServices,
        ctx: &SessionContext,
        amount: &str,
    ) -> Result<Submitted, FormError> {
        let (params, guard) = {
            let mut state = self.state.lock().await;
            state.forms.stx_amount = amount.to_string();
            let micro = match stx_to_micro(amount) {
                Ok(micro) if micro > 0 && state.vault_id > 0 => micro,
                _ => {
                    return Err(services.reject(
                        FN_DEPOSIT_STX,
                        FormError::Invalid("Please enter a valid amount".into()),
                    ))
                }
            };
            state.begin(FN_DEPOSIT_STX)?;
            let params = DepositAssetParams {
                vault_id: state.vault_id,
                amount: micro,
            };
            (params, self.in_flight_guard(FN_DEPOSIT_STX))
        };

        let outcome = services.vaults.deposit_stx(ctx, &params).await;
        let record = ActionRecord::new(FN_DEPOSIT_STX, ctx.network)
            .vault(params.vault_id)
            .sender(ctx.address())
            .detail(serde_json::json!({ "amount": params.amount }));

        let mut state = self.state.lock().await;
        guard.release(&mut state);
        let submitted = services.finish(
            record,
            outcome,
            "Deposit transaction submitted!",
            "Failed to deposit STX",
        )?;
        state.forms.stx_amount.clear();
        Ok(submitted)
    }

    /// Register an heir from the heirs tab.
    pub async fn add_heir(
        &self,
        services: &ViewServices,
        ctx: &SessionContext,
        heir_address: &str,
        percentage: u32,
    ) -> Result<Submitted, FormError> {
        let (params, guard) = {
            let mut state = self.state.lock().await;
            state.forms.heir_address = heir_address.to_string();
            state.forms.heir_percentage = percentage;
            let address = heir_address.trim();
            if state.vault_id == 0 || address.is_empty() || percentage == 0 || percentage > 100 {
                return Err(services.reject(
                    FN_ADD_HEIR,
                    FormError::Invalid("Please enter valid heir details".into()),
                ));
            }
            state.begin(FN_ADD_HEIR)?;
            let params = AddHeirParams {
                vault_id: state.vault_id,
                heir_address: address.to_string(),
                percentage,
            };
            (params, self.in_flight_guard(FN_ADD_HEIR))
        };

        let outcome = services.vaults.add_heir(ctx, &params).await;
        let record = ActionRecord::new(FN_ADD_HEIR, ctx.network)
            .vault(params.vault_id)
            .sender(ctx.address())
            .detail(serde_json::json!({
                "heir_address": params.heir_address,
                "percentage": params.percentage,
            }));

        let mut state = self.state.lock().await;
        guard.release(&mut state);
        let submitted = services.finish(
            record,
            outcome,
            "Add heir transaction submitted!",
            "Failed to add heir",
        )?;
        state.forms.heir_address.clear();
        state.forms.heir_percentage = DEFAULT_HEIR_PERCENTAGE;
        Ok(submitted)
    }

    /// Reset the inactivity clock.
    pub async fn ping(&self, services: &ViewServices, ctx: &SessionContext) -> Result<Submitted, FormError> {
        let (vault_id, guard) = {
            let mut state = self.state.lock().await;
            state.begin(FN_PING)?;
            (state.vault_id, self.in_flight_guard(FN_PING))
        };

        let outcome = services.vaults.ping_vault(ctx, vault_id).await;
        let record = ActionRecord::new(FN_PING, ctx.network).vault(vault_id).sender(ctx.address());

        guard.release(&mut *self.state.lock().await);
        services.finish(record, outcome, "Ping transaction submitted!", "Failed to ping vault")
    }

    /// Hash the notes and store the digest on-chain.
    ///
    /// The plaintext is dropped after hashing; off-chain encrypted storage
    /// is not provided by this application.
    pub async fn save_notes(
        &self,
        services: &ViewServices,
        ctx: &SessionContext,
        notes: &str,
    ) -> Result<NotesSubmitted, FormError> {
        let (vault_id, hash, guard) = {
            let mut state = self.state.lock().await;
            state.forms.notes = notes.to_string();
            if state.vault_id == 0 || notes.is_empty() {
                return Err(services.reject(
                    FN_STORE_NOTES_HASH,
                    FormError::Invalid("Please enter some notes".into()),
                ));
            }
            state.begin(FN_STORE_NOTES_HASH)?;
            (state.vault_id, hash_notes(notes), self.in_flight_guard(FN_STORE_NOTES_HASH))
        };

        tracing::info!(
            vault_id,
            "Storing notes hash only; encrypted off-chain notes storage is not available"
        );
        let outcome = services.vaults.store_notes_hash(ctx, vault_id, &hash).await;
        let hash_hex = hex::encode(hash);
        let record = ActionRecord::new(FN_STORE_NOTES_HASH, ctx.network)
            .vault(vault_id)
            .sender(ctx.address())
            .detail(serde_json::json!({ "hash": hash_hex }));

        let mut state = self.state.lock().await;
        guard.release(&mut state);
        let submitted = services.finish(
            record,
            outcome,
            "Notes hash transaction submitted!",
            "Failed to store notes",
        )?;
        state.forms.notes.clear();
        Ok(NotesSubmitted {
            submitted,
            hash: hash_hex,
            notes_persisted: false,
        })
    }

    /// Claim the vault as an heir.
    pub async fn claim(&self, services: &ViewServices, ctx: &SessionContext) -> Result<Submitted, FormError> {
        let (vault_id, guard) = {
            let mut state = self.state.lock().await;
            state.begin(FN_CLAIM_AS_HEIR)?;
            (state.vault_id, self.in_flight_guard(FN_CLAIM_AS_HEIR))
        };

        let outcome = services.vaults.claim_as_heir(ctx, vault_id).await;
        let record = ActionRecord::new(FN_CLAIM_AS_HEIR, ctx.network).vault(vault_id).sender(ctx.address());

        guard.release(&mut *self.state.lock().await);
        services.finish(record, outcome, "Claim transaction submitted!", "Failed to claim vault")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotesSubmitted {
    #[serde(flatten)]
    pub submitted: Submitted,
    /// Hex SHA-256 of the notes.
    pub hash: String,
    pub notes_persisted: bool,
}

/// Open management screens, one per vault id.
#[derive(Debug, Default)]
pub struct ManageScreens {
    screens: DashMap<u64, ManageScreen>,
}

impl ManageScreens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, vault_id: u64) -> ManageScreen {
        self.screens
            .entry(vault_id)
            .or_insert_with(|| ManageScreen::new(vault_id))
            .clone()
    }

    /// Forget every screen, e.g. on sign-out.
    pub fn clear(&self) {
        self.screens.clear();
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_defaults() {
        let forms = ManageForms::default();
        assert_eq!(forms.heir_percentage, 100);
        assert!(forms.stx_amount.is_empty());
    }

    #[test]
    fn test_in_flight_guard() {
        let mut state = ManageState::new(1);
        state.begin(FN_PING).unwrap();
        assert!(matches!(state.begin(FN_PING), Err(FormError::InFlight(_))));
        // Other forms stay usable
        state.begin(FN_DEPOSIT_STX).unwrap();
        state.end(FN_PING);
        state.begin(FN_PING).unwrap();
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_form() {
        let screen = ManageScreen::new(1);
        let guard = {
            let mut state = screen.state.lock().await;
            state.begin(FN_PING).unwrap();
            screen.in_flight_guard(FN_PING)
        };
        drop(guard);
        assert!(screen.state.lock().await.in_flight.is_empty());

        // Dropped while the screen is locked: released once the lock frees up
        {
            let mut state = screen.state.lock().await;
            state.begin(FN_PING).unwrap();
            drop(screen.in_flight_guard(FN_PING));
            assert!(state.in_flight.contains(FN_PING));
        }
        for _ in 0..50 {
            if screen.state.lock().await.in_flight.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("form still in flight");
    }

    #[test]
    fn test_can_claim_needs_height() {
        let mut state = ManageState::new(1);
        state.vault = Some(crate::vault::repository::PlaceholderVaultRepository::snapshot(1));
        assert!(!state.can_claim());
        state.current_height = Some(74_320);
        assert!(state.can_claim());
        state.current_height = Some(70_001);
        assert!(!state.can_claim());
    }

    #[test]
    fn test_screens_reuse_state() {
        let screens = ManageScreens::new();
        let a = screens.open(3);
        let b = screens.open(3);
        assert!(Arc::ptr_eq(&a.state, &b.state));
        screens.clear();
        assert!(screens.is_empty());
    }
}
