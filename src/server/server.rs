use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::jwt::Authenticator;
use crate::auth::middleware::require_bearer;
use crate::config::settings::{MetricsConfig, SettingsConfig};
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::resolver::CredentialResolver;
use crate::server::access_log::access_log;
use crate::server::handlers::{access_token, ticket};
use crate::upstream::CredentialIssuer;
use crate::utils::constants::{ACCESS_TOKEN_PATH, TICKET_PATH};

pub struct AppState<C> {
    pub resolver: Arc<CredentialResolver<C>>,
    pub authenticator: Arc<Authenticator>,
}

impl<C> AppState<C> {
    pub fn new(resolver: CredentialResolver<C>, authenticator: Authenticator) -> Self {
        Self {
            resolver: Arc::new(resolver),
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Credential routes behind bearer auth, the optional metrics route, and
/// the access log around everything.
pub async fn router<C>(state: AppState<C>, metrics_config: &MetricsConfig) -> Router
where
    C: CredentialIssuer + 'static,
{
    let metrics = get_metrics().await;
    let metrics_state = MetricsState::new(metrics.registry.clone());

    let credentials = Router::new()
        .route(ACCESS_TOKEN_PATH, get(access_token::<C>))
        .route(TICKET_PATH, get(ticket::<C>))
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            require_bearer,
        ));

    Router::new()
        .merge(credentials)
        .merge(metrics_state.router(metrics_config))
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

/// Serve until Ctrl-C / SIGTERM.
pub async fn start<C>(settings_config: &SettingsConfig, state: AppState<C>) -> Result<()>
where
    C: CredentialIssuer + 'static,
{
    let metrics = get_metrics().await;
    let app = router(state, &settings_config.metrics).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", bind_addr))?;
    info!("listening on {}", listener.local_addr()?);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    metrics.up.set(0);

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
