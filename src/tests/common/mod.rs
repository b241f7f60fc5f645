// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde_json::json;

use crate::config::settings::AuthConfig;
use crate::upstream::error::UpstreamError;
use crate::upstream::{CredentialIssuer, IssuedCredential};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        audience: "wechat-token-hub".to_owned(),
        keys: HashMap::from([("key1".to_owned(), "secret1".to_owned())]),
        keys_from_env: true,
    }
}

/// Sign a caller token; `kid: None` leaves the header without a key id.
pub fn mint_jwt(alg: Algorithm, kid: Option<&str>, secret: &str, aud: &str, exp: Option<i64>) -> String {
    let mut header = Header::new(alg);
    header.kid = kid.map(str::to_owned);

    let mut claims = json!({ "aud": aud, "sub": "tester" });
    if let Some(exp) = exp {
        claims["exp"] = json!(exp);
    }
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("sign jwt")
}

pub fn valid_bearer() -> String {
    let exp = chrono::Utc::now().timestamp() + 300;
    format!(
        "Bearer {}",
        mint_jwt(Algorithm::HS256, Some("key1"), "secret1", "wechat-token-hub", Some(exp))
    )
}

pub fn invalid_access_token() -> UpstreamError {
    UpstreamError::InvalidAccessToken {
        what: "ticket",
        message: "invalid credential, access_token is invalid or not latest".to_owned(),
    }
}

pub fn provider_error(code: i64, message: &str) -> UpstreamError {
    UpstreamError::Provider {
        what: "ticket",
        code,
        message: message.to_owned(),
    }
}

type Script = Mutex<VecDeque<Result<IssuedCredential, UpstreamError>>>;

/// Upstream fake answering from per-call scripts and counting calls.
/// An exhausted script answers with a provider error.
#[derive(Default)]
pub struct ScriptedIssuer {
    access_tokens: Script,
    tickets: Script,
    access_token_calls: AtomicUsize,
    ticket_calls: AtomicUsize,
    ticket_tokens: Mutex<Vec<String>>,
}

impl ScriptedIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_token(self, value: &str, lifetime_seconds: i64) -> Self {
        self.access_tokens
            .lock()
            .unwrap()
            .push_back(Ok(IssuedCredential::new(value, lifetime_seconds)));
        self
    }

    pub fn with_access_token_error(self, err: UpstreamError) -> Self {
        self.access_tokens.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_ticket(self, value: &str, lifetime_seconds: i64) -> Self {
        self.tickets
            .lock()
            .unwrap()
            .push_back(Ok(IssuedCredential::new(value, lifetime_seconds)));
        self
    }

    pub fn with_ticket_error(self, err: UpstreamError) -> Self {
        self.tickets.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn access_token_calls(&self) -> usize {
        self.access_token_calls.load(Ordering::SeqCst)
    }

    pub fn ticket_calls(&self) -> usize {
        self.ticket_calls.load(Ordering::SeqCst)
    }

    /// Access tokens presented to ticket issuance, in call order.
    pub fn ticket_tokens(&self) -> Vec<String> {
        self.ticket_tokens.lock().unwrap().clone()
    }

    fn next(script: &Script) -> Result<IssuedCredential, UpstreamError> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(provider_error(-1, "script exhausted")))
    }
}

impl CredentialIssuer for ScriptedIssuer {
    async fn issue_access_token(&self) -> Result<IssuedCredential, UpstreamError> {
        self.access_token_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.access_tokens)
    }

    async fn issue_ticket(&self, access_token: &str, _ticket_type: &str) -> Result<IssuedCredential, UpstreamError> {
        self.ticket_calls.fetch_add(1, Ordering::SeqCst);
        self.ticket_tokens.lock().unwrap().push(access_token.to_owned());
        Self::next(&self.tickets)
    }
}

/// Call counters of [`spawn_fake_wechat`].
#[derive(Default)]
pub struct WeChatCalls {
    pub token: AtomicUsize,
    pub ticket: AtomicUsize,
}

/// Fake WeChat API: secret `secret1` yields `token1`; a ticket needs `token1`
/// except for type `not_support`, which always answers 40001.
pub async fn spawn_fake_wechat() -> (JoinHandle<()>, String, Arc<WeChatCalls>) {
    let calls = Arc::new(WeChatCalls::default());

    let router = Router::new()
        .route(
            "/cgi-bin/token",
            get(
                |State(calls): State<Arc<WeChatCalls>>, Query(q): Query<HashMap<String, String>>| async move {
                    calls.token.fetch_add(1, Ordering::SeqCst);
                    if q.get("secret").map(String::as_str) == Some("secret1")
                        && q.get("grant_type").map(String::as_str) == Some("client_credential")
                    {
                        (StatusCode::OK, r#"{"access_token":"token1","expires_in":7200}"#)
                    } else {
                        (StatusCode::UNAUTHORIZED, r#"{"errcode":40001,"errmsg":"invalid appsecret"}"#)
                    }
                },
            ),
        )
        .route(
            "/cgi-bin/ticket/getticket",
            get(
                |State(calls): State<Arc<WeChatCalls>>, Query(q): Query<HashMap<String, String>>| async move {
                    calls.ticket.fetch_add(1, Ordering::SeqCst);
                    let ticket_type = q.get("type").map(String::as_str);
                    let token = q.get("access_token").map(String::as_str);
                    if ticket_type != Some("not_support") && token == Some("token1") {
                        (StatusCode::OK, r#"{"errcode":0,"errmsg":"ok","ticket":"ticket1","expires_in":7200}"#)
                    } else {
                        (StatusCode::UNAUTHORIZED, r#"{"errcode":40001,"errmsg":"invalid access token"}"#)
                    }
                },
            ),
        )
        .with_state(calls.clone());

    let (handle, addr) = spawn_axum(router).await;
    (handle, format!("http://{}", addr), calls)
}
