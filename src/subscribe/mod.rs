//! Newsletter subscription proxy
//!
//! The browser posts `{email}`; we forward it to the mailing list API with
//! server-side credentials and answer `{error: ""}` or `{error: <message>}`.

mod mailchimp;

pub use mailchimp::{Credentials, Mailchimp};

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::SubscribeError;

/// Shown for any failure on our side of the proxy
const SERVER_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Body of a subscription request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

impl SubscribeRequest {
    /// Parse a request body; an empty or unreadable body carries no email
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|e| {
            tracing::debug!("Unreadable subscribe body: {}", e);
            Self::default()
        })
    }

    /// The trimmed email, if one was given
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Body of every subscription response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub error: String,
}

/// A mailing list that accepts new members
pub trait MailingList {
    /// Add `email`, returning the upstream HTTP status
    fn add_member(&self, email: &str) -> impl Future<Output = Result<u16, SubscribeError>> + Send;
}

/// Run one subscription request against `list`.
///
/// `upstream_message` replaces whatever the mailing list said when it rejects
/// the address.
pub async fn handle<L: MailingList>(
    list: &L,
    request: &SubscribeRequest,
    upstream_message: &str,
) -> (StatusCode, SubscribeResponse) {
    match subscribe(list, request).await {
        Ok(()) => (
            StatusCode::CREATED,
            SubscribeResponse {
                error: String::new(),
            },
        ),
        Err(e) => {
            let message = match &e {
                SubscribeError::Validation => e.to_string(),
                SubscribeError::Upstream(status) => {
                    tracing::warn!("Mailing list rejected subscription with status {}", status);
                    upstream_message.to_string()
                }
                SubscribeError::Config(_) | SubscribeError::Unexpected(_) => {
                    tracing::error!("Subscription failed: {}", e);
                    SERVER_ERROR_MESSAGE.to_string()
                }
            };
            (e.status(), SubscribeResponse { error: message })
        }
    }
}

async fn subscribe<L: MailingList>(list: &L, request: &SubscribeRequest) -> Result<(), SubscribeError> {
    let email = request.email().ok_or(SubscribeError::Validation)?;

    let status = list.add_member(email).await?;
    if status >= 400 {
        return Err(SubscribeError::Upstream(status));
    }

    tracing::info!("Subscribed a new reader");
    Ok(())
}
