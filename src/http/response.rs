//! Error to HTTP response mapping.
//!
//! # Status Codes
//! - 400: client-side validation failure (nothing was submitted)
//! - 401: no identity for an operation that needs one
//! - 403: the identity has no use for this form on this vault
//! - 404: unknown vault or action
//! - 409: a submission for the same form is still in flight
//! - 502: the wallet or chain API rejected or failed the request
//!
//! Bodies are `{"error": "<message>"}`, plus `action_id` when the failure
//! was tracked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::types::BlockchainError;
use crate::vault::action::ActionId;
use crate::vault::error::VaultError;
use crate::views::FormError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_id: Option<ActionId>,
}

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    Form(FormError),
    Chain(BlockchainError),
    BadRequest(String),
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Form(e) => form_status(e),
            ApiError::Chain(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

fn form_status(err: &FormError) -> StatusCode {
    match err {
        FormError::NotSignedIn => StatusCode::UNAUTHORIZED,
        FormError::Invalid(_) => StatusCode::BAD_REQUEST,
        FormError::NotPermitted(_) => StatusCode::FORBIDDEN,
        FormError::InFlight(_) | FormError::InvalidStep { .. } => StatusCode::CONFLICT,
        FormError::SubmissionFailed { .. } => StatusCode::BAD_GATEWAY,
        FormError::Vault(e) => match e {
            VaultError::NotSignedIn => StatusCode::UNAUTHORIZED,
            VaultError::MissingArgument(_) | VaultError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            VaultError::NotFound(_) => StatusCode::NOT_FOUND,
            VaultError::Submission(_) => StatusCode::BAD_GATEWAY,
        },
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        ApiError::Form(err)
    }
}

impl From<BlockchainError> for ApiError {
    fn from(err: BlockchainError) -> Self {
        ApiError::Chain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Form(FormError::SubmissionFailed { message, action_id, .. }) => ErrorBody {
                error: message.to_string(),
                action_id: Some(action_id),
            },
            ApiError::Form(e) => ErrorBody {
                error: e.to_string(),
                action_id: None,
            },
            ApiError::Chain(e) => {
                tracing::error!(error = %e, "Chain or wallet request failed");
                ErrorBody {
                    error: e.to_string(),
                    action_id: None,
                }
            }
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => ErrorBody {
                error: msg,
                action_id: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
