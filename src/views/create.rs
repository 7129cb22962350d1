//! Vault creation flow.
//!
//! # States
//! ```text
//! CollectingDurations --next--> ReviewingSummary --create--> Submitting
//!          ^                         |   ^                      |
//!          +----------back-----------+   +------failure---------+
//! ```
//! Success leaves the flow (back to defaults) and points at `/my-vaults`.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::types::TxId;
use crate::session::SessionContext;
use crate::units::{blocks_to_days, days_to_blocks};
use crate::vault::action::{ActionId, ActionRecord};
use crate::vault::error::VaultError;
use crate::vault::service::FN_CREATE_VAULT;
use crate::vault::types::CreateVaultParams;
use crate::views::{FormError, SubmitGuard, ViewServices};

pub const UNLOCK_DAYS_MIN: u32 = 30;
pub const UNLOCK_DAYS_MAX: u32 = 3650;
pub const UNLOCK_DAYS_DEFAULT: u32 = 365;
pub const INACTIVITY_DAYS_MIN: u32 = 7;
pub const INACTIVITY_DAYS_MAX: u32 = 365;
pub const INACTIVITY_DAYS_DEFAULT: u32 = 30;

/// Where the user goes after a successful creation.
pub const AFTER_CREATE_ROUTE: &str = "/my-vaults";

const CREATED: &str = "Vault creation transaction submitted!";
const CREATE_FAILED: &str = "Failed to create vault. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStep {
    CollectingDurations,
    ReviewingSummary,
    Submitting,
}

impl CreateStep {
    fn describe(self) -> &'static str {
        match self {
            CreateStep::CollectingDurations => "collecting durations",
            CreateStep::ReviewingSummary => "reviewing the summary",
            CreateStep::Submitting => "submitting",
        }
    }
}

/// The two durations with their live block conversions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationSummary {
    pub unlock_days: u32,
    pub unlock_blocks: u64,
    pub inactivity_days: u32,
    pub inactivity_blocks: u64,
    /// `inactivity_blocks` converted back, as the summary displays it.
    pub inactivity_days_display: f64,
}

/// Creation flow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateVaultFlow {
    step: CreateStep,
    unlock_days: u32,
    inactivity_days: u32,
}

impl Default for CreateVaultFlow {
    fn default() -> Self {
        Self {
            step: CreateStep::CollectingDurations,
            unlock_days: UNLOCK_DAYS_DEFAULT,
            inactivity_days: INACTIVITY_DAYS_DEFAULT,
        }
    }
}

impl CreateVaultFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> CreateStep {
        self.step
    }

    pub fn summary(&self) -> DurationSummary {
        let inactivity_blocks = days_to_blocks(f64::from(self.inactivity_days));
        DurationSummary {
            unlock_days: self.unlock_days,
            unlock_blocks: days_to_blocks(f64::from(self.unlock_days)),
            inactivity_days: self.inactivity_days,
            inactivity_blocks,
            inactivity_days_display: blocks_to_days(inactivity_blocks),
        }
    }

    /// Move both sliders. Only allowed while collecting durations.
    pub fn set_durations(&mut self, unlock_days: u32, inactivity_days: u32) -> Result<(), FormError> {
        self.expect_step(CreateStep::CollectingDurations, "change durations")?;
        if !(UNLOCK_DAYS_MIN..=UNLOCK_DAYS_MAX).contains(&unlock_days) {
            return Err(FormError::Invalid(format!(
                "Unlock delay must be between {} and {} days",
                UNLOCK_DAYS_MIN, UNLOCK_DAYS_MAX
            )));
        }
        if !(INACTIVITY_DAYS_MIN..=INACTIVITY_DAYS_MAX).contains(&inactivity_days) {
            return Err(FormError::Invalid(format!(
                "Inactivity timeout must be between {} and {} days",
                INACTIVITY_DAYS_MIN, INACTIVITY_DAYS_MAX
            )));
        }
        self.unlock_days = unlock_days;
        self.inactivity_days = inactivity_days;
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), FormError> {
        self.expect_step(CreateStep::CollectingDurations, "continue")?;
        self.step = CreateStep::ReviewingSummary;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), FormError> {
        self.expect_step(CreateStep::ReviewingSummary, "go back")?;
        self.step = CreateStep::CollectingDurations;
        Ok(())
    }

    /// Enter `Submitting`. Requires an identity and no submission in flight.
    pub fn begin_submit(&mut self, ctx: &SessionContext) -> Result<DurationSummary, FormError> {
        if !ctx.is_signed_in() {
            return Err(FormError::NotSignedIn);
        }
        if self.step == CreateStep::Submitting {
            return Err(FormError::InFlight("vault creation"));
        }
        self.expect_step(CreateStep::ReviewingSummary, "create the vault")?;
        self.step = CreateStep::Submitting;
        Ok(self.summary())
    }

    /// Submission failed: back to the summary with the durations kept.
    pub fn submit_failed(&mut self) {
        if self.step == CreateStep::Submitting {
            self.step = CreateStep::ReviewingSummary;
        }
    }

    /// Submission accepted: the flow is left and starts over next time.
    pub fn submit_succeeded(&mut self) {
        *self = Self::default();
    }

    fn expect_step(&self, expected: CreateStep, action: &'static str) -> Result<(), FormError> {
        if self.step == CreateStep::Submitting {
            return Err(FormError::InFlight("vault creation"));
        }
        if self.step != expected {
            return Err(FormError::InvalidStep {
                action,
                step: self.step.describe(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFlowSnapshot {
    pub step: CreateStep,
    pub submitting: bool,
    #[serde(flatten)]
    pub durations: DurationSummary,
}

/// Result of an accepted creation.
#[derive(Debug, Clone, Serialize)]
pub struct VaultCreated {
    pub action_id: ActionId,
    pub tx_id: TxId,
    pub unlock_height: u64,
    pub inactivity_timeout: u64,
    pub message: &'static str,
    pub redirect: &'static str,
}

/// The creation screen: one flow guarded by a lock.
#[derive(Debug, Default)]
pub struct CreateVaultView {
    flow: Arc<Mutex<CreateVaultFlow>>,
}

impl CreateVaultView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> CreateFlowSnapshot {
        let flow = self.flow.lock().await;
        CreateFlowSnapshot {
            step: flow.step(),
            submitting: flow.step() == CreateStep::Submitting,
            durations: flow.summary(),
        }
    }

    pub async fn set_durations(
        &self,
        services: &ViewServices,
        unlock_days: u32,
        inactivity_days: u32,
    ) -> Result<CreateFlowSnapshot, FormError> {
        self.flow
            .lock()
            .await
            .set_durations(unlock_days, inactivity_days)
            .map_err(|e| services.reject(FN_CREATE_VAULT, e))?;
        Ok(self.snapshot().await)
    }

    pub async fn next(&self) -> Result<CreateFlowSnapshot, FormError> {
        self.flow.lock().await.next()?;
        Ok(self.snapshot().await)
    }

    pub async fn back(&self) -> Result<CreateFlowSnapshot, FormError> {
        self.flow.lock().await.back()?;
        Ok(self.snapshot().await)
    }

    /// Fetch the tip height, turn the unlock delay into an absolute height
    /// and submit `create-vault`.
    ///
    /// The lock is not held while the wallet prompt is open; the
    /// `Submitting` step keeps concurrent submissions out instead. If the
    /// call is abandoned midway the flow returns to the summary.
    pub async fn submit(&self, services: &ViewServices, ctx: &SessionContext) -> Result<VaultCreated, FormError> {
        let (summary, guard) = {
            let mut flow = self.flow.lock().await;
            match flow.begin_submit(ctx) {
                Ok(summary) => (
                    summary,
                    SubmitGuard::new(Arc::clone(&self.flow), CreateVaultFlow::submit_failed),
                ),
                Err(e @ FormError::NotSignedIn) => return Err(services.reject(FN_CREATE_VAULT, e)),
                Err(e) => return Err(e),
            }
        };

        let mut params = CreateVaultParams {
            unlock_height: 0,
            inactivity_timeout: summary.inactivity_blocks,
        };
        let outcome = match services.chain.current_block_height(ctx.network).await {
            Ok(height) => {
                params.unlock_height = height.saturating_add(summary.unlock_blocks);
                services.vaults.create_vault(ctx, &params).await
            }
            Err(e) => Err(VaultError::Submission(e)),
        };

        let record = ActionRecord::new(FN_CREATE_VAULT, ctx.network)
            .sender(ctx.address())
            .detail(serde_json::json!({
                "unlock_height": params.unlock_height,
                "inactivity_timeout": params.inactivity_timeout,
                "unlock_days": summary.unlock_days,
                "inactivity_days": summary.inactivity_days,
            }));
        let result = services.finish(record, outcome, CREATED, CREATE_FAILED);

        let mut flow = self.flow.lock().await;
        match result {
            Ok(submitted) => {
                guard.disarm();
                flow.submit_succeeded();
                Ok(VaultCreated {
                    action_id: submitted.action_id,
                    tx_id: submitted.tx_id,
                    unlock_height: params.unlock_height,
                    inactivity_timeout: params.inactivity_timeout,
                    message: submitted.message,
                    redirect: AFTER_CREATE_ROUTE,
                })
            }
            Err(e) => {
                guard.release(&mut flow);
                Err(e)
            }
        }
    }

    /// Drop back to the defaults, e.g. after sign-out.
    pub async fn reset(&self) {
        *self.flow.lock().await = CreateVaultFlow::default();
    }
}
