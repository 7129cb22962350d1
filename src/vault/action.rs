//! Per-action submission tracking.
//!
//! # Responsibilities
//! - Give every submitted action an id and a status
//! - Start `Pending` on successful submission, `Failed` on rejection
//! - Watch pending transactions until they confirm, fail or time out
//!
//! # Design Decisions
//! - Submission success is never reported as confirmation
//! - Watchers are detached tasks; a lost watcher leaves the action pending
//! - Statuses only move forward: a settled action never changes again
//! - Settled actions are evicted after a retention window, except vault
//!   creations, which back the vault listing

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval, timeout};
use uuid::Uuid;

use crate::blockchain::client::ChainReader;
use crate::blockchain::network::StacksNetwork;
use crate::blockchain::types::{ConfirmationStatus, TxId, TxSubmission};
use crate::config::schema::TrackingConfig;
use crate::observability::metrics;
use crate::vault::error::VaultResult;
use crate::vault::service::FN_CREATE_VAULT;

const DEFAULT_RETENTION: Duration = Duration::from_secs(86_400);

pub type ActionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Confirmed { block_height: u64 },
    Failed { reason: String },
}

impl ActionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Confirmed { .. } => "confirmed",
            ActionStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, ActionStatus::Pending)
    }
}

/// One submitted contract call and what became of it.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedAction {
    pub id: ActionId,
    pub function: String,
    pub network: StacksNetwork,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<TxId>,
    #[serde(flatten)]
    pub status: ActionStatus,
    /// Unix seconds.
    pub submitted_at: u64,
    /// Request parameters, for listings.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub detail: serde_json::Value,
}

/// Describes an action before its outcome is known.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub function: &'static str,
    pub network: StacksNetwork,
    pub vault_id: Option<u64>,
    pub sender: Option<String>,
    pub detail: serde_json::Value,
}

impl ActionRecord {
    pub fn new(function: &'static str, network: StacksNetwork) -> Self {
        Self {
            function,
            network,
            vault_id: None,
            sender: None,
            detail: serde_json::Value::Null,
        }
    }

    pub fn vault(mut self, vault_id: u64) -> Self {
        self.vault_id = Some(vault_id);
        self
    }

    pub fn sender(mut self, sender: Option<&str>) -> Self {
        self.sender = sender.map(str::to_string);
        self
    }

    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Registry of tracked actions plus their confirmation watchers.
pub struct ActionTracker {
    actions: DashMap<ActionId, TrackedAction>,
    reader: Option<Arc<dyn ChainReader>>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
    retention: Duration,
}

impl ActionTracker {
    /// Watchers run only when tracking is enabled and a reader is given.
    pub fn new(config: &TrackingConfig, reader: Option<Arc<dyn ChainReader>>) -> Self {
        Self::with_timing(
            if config.enabled { reader } else { None },
            Duration::from_secs(config.confirmation_poll_secs),
            Duration::from_secs(config.confirmation_timeout_secs),
        )
        .retain_for(Duration::from_secs(config.retention_secs))
    }

    pub fn with_timing(
        reader: Option<Arc<dyn ChainReader>>,
        poll_interval: Duration,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            actions: DashMap::new(),
            reader,
            poll_interval,
            confirmation_timeout,
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn retain_for(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Record the outcome of a submission and start watching it if pending.
    pub fn record(self: &Arc<Self>, record: ActionRecord, outcome: &VaultResult<TxSubmission>) -> ActionId {
        let id = Uuid::new_v4();
        let (tx_id, status) = match outcome {
            Ok(submission) => (Some(submission.tx_id.clone()), ActionStatus::Pending),
            Err(e) => (
                None,
                ActionStatus::Failed {
                    reason: e.to_string(),
                },
            ),
        };

        metrics::record_action_status(status.label());
        tracing::debug!(
            action_id = %id,
            function = record.function,
            status = status.label(),
            "Action recorded"
        );

        self.prune(unix_now());
        self.actions.insert(
            id,
            TrackedAction {
                id,
                function: record.function.to_string(),
                network: record.network,
                vault_id: record.vault_id,
                sender: record.sender,
                tx_id: tx_id.clone(),
                status,
                submitted_at: unix_now(),
                detail: record.detail,
            },
        );

        if let (Some(tx_id), Some(reader)) = (tx_id, self.reader.clone()) {
            let tracker = Arc::clone(self);
            let network = record.network;
            tokio::spawn(async move {
                tracker.watch(id, network, tx_id, reader).await;
            });
        }

        id
    }

    pub fn get(&self, id: &ActionId) -> Option<TrackedAction> {
        self.actions.get(id).map(|a| a.value().clone())
    }

    /// Actions of `function` submitted by `sender`, oldest first.
    pub fn by_sender(&self, sender: &str, function: &str) -> Vec<TrackedAction> {
        let mut found: Vec<TrackedAction> = self
            .actions
            .iter()
            .filter(|a| a.function == function && a.sender.as_deref() == Some(sender))
            .map(|a| a.value().clone())
            .collect();
        found.sort_by_key(|a| a.submitted_at);
        found
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop settled actions older than the retention window.
    fn prune(&self, now: u64) {
        let retention = self.retention.as_secs();
        let before = self.actions.len();
        self.actions.retain(|_, action| {
            action.function == FN_CREATE_VAULT
                || !action.status.is_settled()
                || now.saturating_sub(action.submitted_at) < retention
        });
        let evicted = before.saturating_sub(self.actions.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Pruned settled actions");
        }
    }

    /// Move a pending action to its settled status. Settled actions are left alone.
    fn settle(&self, id: &ActionId, status: ActionStatus) {
        if let Some(mut action) = self.actions.get_mut(id) {
            if action.status.is_settled() {
                return;
            }
            metrics::record_action_status(status.label());
            tracing::info!(
                action_id = %id,
                function = %action.function,
                status = status.label(),
                "Action settled"
            );
            action.status = status;
        }
    }

    async fn watch(&self, id: ActionId, network: StacksNetwork, tx_id: TxId, reader: Arc<dyn ChainReader>) {
        let result = timeout(self.confirmation_timeout, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                match reader.transaction_status(network, &tx_id).await {
                    Ok(ConfirmationStatus::Pending) => {
                        tracing::debug!(tx_id = %tx_id, "Transaction pending");
                    }
                    Ok(ConfirmationStatus::Confirmed { block_height }) => {
                        return ActionStatus::Confirmed { block_height };
                    }
                    Ok(ConfirmationStatus::Failed(reason)) => {
                        return ActionStatus::Failed { reason };
                    }
                    Err(e) => {
                        tracing::warn!(tx_id = %tx_id, error = %e, "Transaction status check failed");
                    }
                }
            }
        })
        .await;

        let status = result.unwrap_or_else(|_| ActionStatus::Failed {
            reason: format!(
                "not confirmed within {} seconds",
                self.confirmation_timeout.as_secs()
            ),
        });
        self.settle(&id, status);
    }
}

impl std::fmt::Debug for ActionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionTracker")
            .field("actions", &self.actions.len())
            .field("watching", &self.reader.is_some())
            .finish()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::principal::ContractPrincipal;
    use crate::blockchain::types::{BlockchainError, BlockchainResult};
    use crate::vault::error::VaultError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports pending for the first `pending_polls` checks, then `outcome`.
    struct ScriptedChain {
        pending_polls: u32,
        polls: AtomicU32,
        outcome: ConfirmationStatus,
    }

    #[async_trait]
    impl ChainReader for ScriptedChain {
        async fn current_block_height(&self, _network: StacksNetwork) -> BlockchainResult<u64> {
            Ok(1)
        }

        async fn transaction_status(
            &self,
            _network: StacksNetwork,
            _tx_id: &TxId,
        ) -> BlockchainResult<ConfirmationStatus> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < self.pending_polls {
                Ok(ConfirmationStatus::Pending)
            } else {
                Ok(self.outcome.clone())
            }
        }

        async fn next_vault_id(
            &self,
            _network: StacksNetwork,
            _contract: &ContractPrincipal,
        ) -> BlockchainResult<u64> {
            Err(BlockchainError::NotAvailable("unused".into()))
        }
    }

    fn tracker(pending_polls: u32, outcome: ConfirmationStatus, timeout_ms: u64) -> Arc<ActionTracker> {
        let chain = ScriptedChain {
            pending_polls,
            polls: AtomicU32::new(0),
            outcome,
        };
        Arc::new(ActionTracker::with_timing(
            Some(Arc::new(chain)),
            Duration::from_millis(10),
            Duration::from_millis(timeout_ms),
        ))
    }

    fn submitted() -> VaultResult<TxSubmission> {
        Ok(TxSubmission {
            tx_id: TxId("0x01".into()),
        })
    }

    async fn settled(tracker: &ActionTracker, id: &ActionId) -> ActionStatus {
        for _ in 0..100 {
            let status = tracker.get(id).unwrap().status;
            if status.is_settled() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tracker.get(id).unwrap().status
    }

    #[tokio::test]
    async fn test_pending_then_confirmed() {
        let tracker = tracker(2, ConfirmationStatus::Confirmed { block_height: 80_000 }, 5_000);
        let id = tracker.record(ActionRecord::new("ping", StacksNetwork::Testnet).vault(1), &submitted());
        assert_eq!(tracker.get(&id).unwrap().status, ActionStatus::Pending);

        assert_eq!(
            settled(&tracker, &id).await,
            ActionStatus::Confirmed { block_height: 80_000 }
        );
    }

    #[tokio::test]
    async fn test_aborted_transaction_fails() {
        let tracker = tracker(0, ConfirmationStatus::Failed("abort_by_response".into()), 5_000);
        let id = tracker.record(ActionRecord::new("claim-as-heir", StacksNetwork::Testnet), &submitted());
        assert_eq!(
            settled(&tracker, &id).await,
            ActionStatus::Failed {
                reason: "abort_by_response".into()
            }
        );
    }

    #[tokio::test]
    async fn test_confirmation_timeout_fails() {
        let tracker = tracker(u32::MAX, ConfirmationStatus::Pending, 50);
        let id = tracker.record(ActionRecord::new("ping", StacksNetwork::Testnet), &submitted());
        assert!(matches!(settled(&tracker, &id).await, ActionStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_rejected_submission_is_failed_immediately() {
        let tracker = Arc::new(ActionTracker::with_timing(None, Duration::from_secs(1), Duration::from_secs(1)));
        let outcome = Err(VaultError::Submission(BlockchainError::Wallet("declined".into())));
        let id = tracker.record(ActionRecord::new("deposit-stx", StacksNetwork::Testnet), &outcome);

        let action = tracker.get(&id).unwrap();
        assert!(action.tx_id.is_none());
        assert!(matches!(action.status, ActionStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_without_reader_stays_pending() {
        let tracker = Arc::new(ActionTracker::with_timing(None, Duration::from_millis(1), Duration::from_millis(1)));
        let id = tracker.record(ActionRecord::new("ping", StacksNetwork::Testnet), &submitted());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(tracker.get(&id).unwrap().status, ActionStatus::Pending);
    }

    #[tokio::test]
    async fn test_by_sender_filters() {
        let tracker = Arc::new(ActionTracker::with_timing(None, Duration::from_secs(1), Duration::from_secs(1)));
        tracker.record(ActionRecord::new("create-vault", StacksNetwork::Testnet).sender(Some("ST1A")), &submitted());
        tracker.record(ActionRecord::new("create-vault", StacksNetwork::Testnet).sender(Some("ST1B")), &submitted());
        tracker.record(ActionRecord::new("ping", StacksNetwork::Testnet).sender(Some("ST1A")), &submitted());

        let mine = tracker.by_sender("ST1A", "create-vault");
        assert_eq!(mine.len(), 1);
        assert_eq!(tracker.len(), 3);
    }

    #[tokio::test]
    async fn test_settled_actions_are_evicted_after_retention() {
        let tracker = Arc::new(
            ActionTracker::with_timing(None, Duration::from_secs(1), Duration::from_secs(1))
                .retain_for(Duration::ZERO),
        );
        let declined = || -> VaultResult<TxSubmission> {
            Err(VaultError::Submission(BlockchainError::Wallet("declined".into())))
        };

        let old_ping = tracker.record(ActionRecord::new("ping", StacksNetwork::Testnet), &declined());
        let create = tracker.record(ActionRecord::new("create-vault", StacksNetwork::Testnet), &declined());
        let pending = tracker.record(ActionRecord::new("ping", StacksNetwork::Testnet), &submitted());
        let latest = tracker.record(ActionRecord::new("deposit-stx", StacksNetwork::Testnet), &declined());

        assert!(tracker.get(&old_ping).is_none());
        assert!(tracker.get(&create).is_some());
        assert!(tracker.get(&pending).is_some());
        assert!(tracker.get(&latest).is_some());
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_value(ActionStatus::Confirmed { block_height: 9 }).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["block_height"], 9);
    }
}
