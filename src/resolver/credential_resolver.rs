use std::future::Future;

use tracing::{debug, info, warn};

use crate::cache::credential::CredentialKind;
use crate::cache::credential_store::CredentialStore;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::upstream::error::UpstreamError;
use crate::upstream::{CredentialIssuer, IssuedCredential};

static HIT_MSG: &'static str = "hit";
static MISS_MSG: &'static str = "miss";
static ROTATE_MSG: &'static str = "rotate";

/// Resolves access tokens and tickets through the store, issuing upstream on
/// a miss or when the caller proves the cached value stale.
///
/// Concurrent misses are not collapsed: each one issues upstream and the last
/// successful write wins.
#[derive(Debug)]
pub struct CredentialResolver<C> {
    store: CredentialStore,
    issuer: C,
}

impl<C: CredentialIssuer> CredentialResolver<C> {
    pub fn new(store: CredentialStore, issuer: C) -> Self {
        Self { store, issuer }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn issuer(&self) -> &C {
        &self.issuer
    }

    /// Cached access token, unless absent or equal to `rotate_hint`.
    pub async fn resolve_access_token(&self, rotate_hint: Option<&str>) -> Result<String, UpstreamError> {
        let kind = CredentialKind::AccessToken;
        if let Some(cached) = self.lookup(&kind, rotate_hint).await {
            return Ok(cached);
        }

        let issued = self.issue(&kind, self.issuer.issue_access_token()).await?;
        Ok(self.remember(&kind, issued).await)
    }

    /// Cached ticket of `ticket_type`, unless absent or equal to `rotate_hint`.
    ///
    /// A ticket call rejected because the access token was invalidated
    /// upstream is retried exactly once, after forcing the access token past
    /// the value that was just rejected.
    pub async fn resolve_ticket(
        &self,
        ticket_type: &str,
        rotate_hint: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let kind = CredentialKind::Ticket(ticket_type.to_owned());
        if let Some(cached) = self.lookup(&kind, rotate_hint).await {
            return Ok(cached);
        }

        let access_token = self.resolve_access_token(None).await?;
        let issued = match self
            .issue(&kind, self.issuer.issue_ticket(&access_token, ticket_type))
            .await
        {
            Err(err) if err.is_invalid_access_token() => {
                info!("{} rejected the access token ({}), rotating it once", kind, err);
                self.recover_ticket(&kind, ticket_type, &access_token).await?
            }
            result => result?,
        };
        Ok(self.remember(&kind, issued).await)
    }

    async fn recover_ticket(
        &self,
        kind: &CredentialKind,
        ticket_type: &str,
        rejected_token: &str,
    ) -> Result<IssuedCredential, UpstreamError> {
        let metrics = get_metrics().await;
        let result = async {
            let access_token = self.resolve_access_token(Some(rejected_token)).await?;
            self.issue(kind, self.issuer.issue_ticket(&access_token, ticket_type))
                .await
        }
        .await;

        match &result {
            Ok(_) => metrics.token_recoveries.with_label_values(&["success"]).inc(),
            Err(err) => {
                warn!("{} still failing after access token rotation: {}", kind, err);
                metrics.token_recoveries.with_label_values(&["failure"]).inc();
            }
        }
        result
    }

    async fn lookup(&self, kind: &CredentialKind, rotate_hint: Option<&str>) -> Option<String> {
        let metrics = get_metrics().await;
        let key = kind.cache_key();
        match self.store.get(&key).await {
            Some(cached) if rotate_hint != Some(cached.as_str()) => {
                debug!("{} served from cache", kind);
                metrics.cache_lookups.with_label_values(&[kind.label(), HIT_MSG]).inc();
                Some(cached)
            }
            Some(_) => {
                info!("{} reported stale by caller, refreshing", kind);
                metrics.cache_lookups.with_label_values(&[kind.label(), ROTATE_MSG]).inc();
                None
            }
            None => {
                debug!("{} not cached", kind);
                metrics.cache_lookups.with_label_values(&[kind.label(), MISS_MSG]).inc();
                None
            }
        }
    }

    async fn issue<F>(&self, kind: &CredentialKind, call: F) -> Result<IssuedCredential, UpstreamError>
    where
        F: Future<Output = Result<IssuedCredential, UpstreamError>>,
    {
        let metrics = get_metrics().await;
        let start = get_instant();
        metrics.upstream_requests.with_label_values(&[kind.label()]).inc();

        let result = call.await;
        metrics
            .upstream_duration
            .with_label_values(&[kind.label()])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(issued) => info!("issued {}, lifetime {}s", kind, issued.lifetime_seconds),
            Err(err) => {
                warn!("issuing {} failed: {}", kind, err);
                metrics
                    .upstream_failures
                    .with_label_values(&[kind.label(), err.reason()])
                    .inc();
            }
        }
        result
    }

    async fn remember(&self, kind: &CredentialKind, issued: IssuedCredential) -> String {
        self.store
            .set(&kind.cache_key(), issued.value.clone(), issued.lifetime_seconds)
            .await;
        issued.value
    }
}
