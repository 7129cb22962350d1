//! View layer: the application's screens as request-driven state.
//!
//! # Data Flow
//! ```text
//! request + SessionContext
//!     → routes.rs (guard: signed-out users go back to "/")
//!     → create.rs / manage.rs / nft.rs (validate form input)
//!     → vault::service (submit) → vault::action (track)
//!     → notify.rs (success / failure notification)
//! ```
//!
//! # Design Decisions
//! - Validation failures never reach the facade
//! - A form with a submission in flight rejects further submissions; an
//!   abandoned submission releases its form
//! - Inputs are cleared only after a successful submission
//! - User-facing failure messages do not distinguish a declined signature
//!   from an unreachable network

pub mod create;
pub mod manage;
pub mod nft;
pub mod notify;
pub mod routes;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::blockchain::client::ChainReader;
use crate::blockchain::types::{TxId, TxSubmission};
use crate::observability::metrics;
use crate::vault::action::{ActionId, ActionRecord, ActionTracker};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::repository::VaultRepository;
use crate::vault::service::VaultService;

pub use create::{CreateStep, CreateVaultFlow, CreateVaultView};
pub use manage::{ManageScreen, ManageScreens, ManageTab};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use routes::Route;

/// Errors surfaced by a view operation.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please sign in first")]
    NotSignedIn,

    /// Client-side validation failure; the message is shown as-is.
    #[error("{0}")]
    Invalid(String),

    /// The identity has no use for this form on this vault.
    #[error("{0}")]
    NotPermitted(&'static str),

    #[error("A {0} submission is already in progress")]
    InFlight(&'static str),

    #[error("Cannot {action} while {step}")]
    InvalidStep {
        action: &'static str,
        step: &'static str,
    },

    /// The wallet or network rejected a submission.
    #[error("{message}")]
    SubmissionFailed {
        message: &'static str,
        action_id: ActionId,
        reason: String,
    },

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Response to an accepted submission. Acceptance is not confirmation;
/// follow `action_id` for the outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Submitted {
    pub action_id: ActionId,
    pub tx_id: TxId,
    pub message: &'static str,
}

/// Everything a view needs besides its own state.
#[derive(Clone)]
pub struct ViewServices {
    pub vaults: VaultService,
    pub repository: Arc<dyn VaultRepository>,
    pub chain: Arc<dyn ChainReader>,
    pub tracker: Arc<ActionTracker>,
    pub notifier: Arc<Notifier>,
    pub nft_refresh_delay: Duration,
}

impl ViewServices {
    /// Report a validation failure and hand the error back.
    pub(crate) fn reject(&self, form: &'static str, err: FormError) -> FormError {
        metrics::record_validation_rejection(form);
        tracing::debug!(form, error = %err, "Form rejected");
        self.notifier.error(err.to_string(), None);
        err
    }

    /// Track a facade outcome and notify the user about it.
    pub(crate) fn finish(
        &self,
        record: ActionRecord,
        outcome: VaultResult<TxSubmission>,
        success: &'static str,
        failure: &'static str,
    ) -> Result<Submitted, FormError> {
        let outcome = match outcome {
            Err(e) if e.is_client_side() => {
                return Err(self.reject(record.function, FormError::Vault(e)));
            }
            other => other,
        };

        let action_id = self.tracker.record(record, &outcome);
        match outcome {
            Ok(submission) => {
                self.notifier.success(success, Some(action_id));
                Ok(Submitted {
                    action_id,
                    tx_id: submission.tx_id,
                    message: success,
                })
            }
            Err(e) => {
                self.notifier.error(failure, Some(action_id));
                Err(FormError::SubmissionFailed {
                    message: failure,
                    action_id,
                    reason: e.to_string(),
                })
            }
        }
    }
}

type Release<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Undoes a form's "submitting" mark unless the submission ran to the end.
///
/// A handler future dropped mid-submission (client gone, request timeout)
/// never reaches its own cleanup; this runs it instead.
pub(crate) struct SubmitGuard<T: Send + 'static> {
    state: Arc<Mutex<T>>,
    release: Option<Release<T>>,
}

impl<T: Send + 'static> SubmitGuard<T> {
    pub(crate) fn new(state: Arc<Mutex<T>>, release: impl FnOnce(&mut T) + Send + 'static) -> Self {
        Self {
            state,
            release: Some(Box::new(release)),
        }
    }

    /// The submission finished and its own cleanup ran.
    pub(crate) fn disarm(mut self) {
        self.release = None;
    }

    /// Run the release on state the caller has already locked.
    pub(crate) fn release(mut self, state: &mut T) {
        if let Some(release) = self.release.take() {
            release(state);
        }
    }
}

impl<T: Send + 'static> Drop for SubmitGuard<T> {
    fn drop(&mut self) {
        let Some(release) = self.release.take() else {
            return;
        };
        tracing::warn!("Submission abandoned before completing; releasing form");
        if let Ok(mut state) = self.state.try_lock() {
            release(&mut *state);
            return;
        }
        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { release(&mut *state.lock().await) });
            }
            Err(_) => tracing::error!("No runtime to release abandoned submission"),
        }
    }
}

impl std::fmt::Debug for ViewServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewServices")
            .field("vaults", &self.vaults)
            .field("tracker", &self.tracker)
            .field("nft_refresh_delay", &self.nft_refresh_delay)
            .finish()
    }
}
