use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::settings::UpstreamConfig;
use crate::upstream::error::{UpstreamError, INVALID_ACCESS_TOKEN_CODE};
use crate::upstream::{CredentialIssuer, IssuedCredential};
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, WECHAT_TICKET_PATH, WECHAT_TOKEN_PATH};

static ACCESS_TOKEN_MSG: &'static str = "access token";
static TICKET_MSG: &'static str = "ticket";

/// Body of both WeChat issuance endpoints. Business errors come back in
/// `errcode`/`errmsg`, often with a 200 status.
#[derive(Debug, Deserialize, Default)]
struct ProviderResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    ticket: Option<String>,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

#[derive(Debug, Clone)]
pub struct WeChatClient {
    client: Client,
    api_root: Option<String>,
    app_id: Option<String>,
    app_secret: Option<String>,
}

impl WeChatClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let timeout_ms = cfg.timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            client,
            api_root: non_empty(&cfg.api_root).map(|root| root.trim_end_matches('/').to_owned()),
            app_id: non_empty(&cfg.app_id),
            app_secret: non_empty(&cfg.app_secret),
        })
    }

    fn api_root(&self) -> Result<&str, UpstreamError> {
        self.api_root
            .as_deref()
            .ok_or(UpstreamError::Config("upstream.api_root"))
    }

    async fn send(
        &self,
        what: &'static str,
        request: RequestBuilder,
    ) -> Result<ProviderResponse, UpstreamError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ProviderResponse>(&body) {
            Ok(decoded) => Ok(decoded),
            Err(_) if !status.is_success() => {
                warn!("{} request returned {} with non-JSON body", what, status);
                Err(UpstreamError::Status { what, status })
            }
            Err(source) => Err(UpstreamError::Decode { what, source }),
        }
    }
}

impl CredentialIssuer for WeChatClient {
    async fn issue_access_token(&self) -> Result<IssuedCredential, UpstreamError> {
        let url = format!("{}{}", self.api_root()?, WECHAT_TOKEN_PATH);
        let app_id = self
            .app_id
            .as_deref()
            .ok_or(UpstreamError::Config("upstream.app_id"))?;
        let app_secret = self
            .app_secret
            .as_deref()
            .ok_or(UpstreamError::Config("upstream.app_secret"))?;

        debug!("requesting access token from {}", url);
        let request = self.client.get(&url).query(&[
            ("grant_type", "client_credential"),
            ("appid", app_id),
            ("secret", app_secret),
        ]);

        let mut response = self.send(ACCESS_TOKEN_MSG, request).await?;
        let value = response.access_token.take();
        into_issued(ACCESS_TOKEN_MSG, value, response, false)
    }

    async fn issue_ticket(
        &self,
        access_token: &str,
        ticket_type: &str,
    ) -> Result<IssuedCredential, UpstreamError> {
        let url = format!("{}{}", self.api_root()?, WECHAT_TICKET_PATH);

        debug!("requesting ticket '{}' from {}", ticket_type, url);
        let request = self
            .client
            .get(&url)
            .query(&[("access_token", access_token), ("type", ticket_type)]);

        let mut response = self.send(TICKET_MSG, request).await?;
        let value = response.ticket.take();
        into_issued(TICKET_MSG, value, response, true)
    }
}

/// An empty or absent value means the provider refused; `token_bound` calls
/// report code 40001 as a revoked access token.
fn into_issued(
    what: &'static str,
    value: Option<String>,
    response: ProviderResponse,
    token_bound: bool,
) -> Result<IssuedCredential, UpstreamError> {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => Ok(IssuedCredential::new(value, response.expires_in)),
        None if token_bound && response.errcode == INVALID_ACCESS_TOKEN_CODE => {
            Err(UpstreamError::InvalidAccessToken {
                what,
                message: response.errmsg,
            })
        }
        None => Err(UpstreamError::Provider {
            what,
            code: response.errcode,
            message: response.errmsg,
        }),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_owned())
}
