//! Upstream credential issuance.
//!
//! [`CredentialIssuer`] is the seam the resolver depends on; [`wechat::WeChatClient`]
//! is the production implementation talking to the WeChat API.

pub mod error;
pub mod wechat;

use error::UpstreamError;

/// A freshly issued credential and the lifetime the provider declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub value: String,
    pub lifetime_seconds: i64,
}

impl IssuedCredential {
    pub fn new(value: impl Into<String>, lifetime_seconds: i64) -> Self {
        Self {
            value: value.into(),
            lifetime_seconds,
        }
    }
}

pub trait CredentialIssuer: Send + Sync {
    fn issue_access_token(
        &self,
    ) -> impl std::future::Future<Output = Result<IssuedCredential, UpstreamError>> + Send;

    fn issue_ticket(
        &self,
        access_token: &str,
        ticket_type: &str,
    ) -> impl std::future::Future<Output = Result<IssuedCredential, UpstreamError>> + Send;
}
