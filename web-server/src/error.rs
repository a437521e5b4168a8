// web-server/src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::wallet::VerifyError;
use serde_json::json;
use thiserror::Error;

use crate::chain::ChainError;
use crate::discord::DiscordError;

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no verified wallet")]
    WalletNotAuthorized,
    #[error("login payload rejected: {0}")]
    InvalidSignature(#[from] VerifyError),
    #[error("no Discord session")]
    NotLoggedIn,
    #[error("wallet holds no NFT")]
    NotEligible,
    #[error("Discord refused the role grant: {0}")]
    RoleGrantFailed(DiscordError),
    #[error("balance lookup failed: {0}")]
    Chain(#[from] ChainError),
    #[error("Discord sign-in failed: {0}")]
    OAuth(DiscordError),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<actix::MailboxError> for ApiError {
    fn from(e: actix::MailboxError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    /// Message returned to the caller; detail stays in the logs
    pub fn public_message(&self) -> String {
        match self {
            ApiError::WalletNotAuthorized | ApiError::InvalidSignature(_) => {
                "Wallet not authorized!".to_string()
            }
            ApiError::NotLoggedIn => "Not logged in".to_string(),
            ApiError::NotEligible => "User does not have an NFT".to_string(),
            ApiError::RoleGrantFailed(_) => "Error granting role, are you in the server?".to_string(),
            ApiError::Chain(_) => "Failed to read NFT balance".to_string(),
            ApiError::OAuth(_) => "Discord sign-in failed".to_string(),
            ApiError::BadRequest(reason) => reason.clone(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::WalletNotAuthorized
            | ApiError::InvalidSignature(_)
            | ApiError::NotLoggedIn
            | ApiError::NotEligible => StatusCode::UNAUTHORIZED,
            ApiError::RoleGrantFailed(_) | ApiError::Chain(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::OAuth(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.status_code() {
            status if status.is_server_error() => tracing::error!("{}", self),
            _ => tracing::warn!("{}", self),
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.public_message()
        }))
    }
}
