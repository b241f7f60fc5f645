use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::auth::jwt::Authenticator;
use crate::observability::metrics::get_metrics;

/// Reject requests without a valid bearer token.
pub async fn require_bearer(
    State(authenticator): State<Arc<Authenticator>>,
    req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match authenticator.authorize(header) {
        Ok(claims) => {
            debug!("authorized caller {:?}", claims.sub);
            next.run(req).await
        }
        Err(err) => {
            info!("rejected {} {}: {}", req.method(), req.uri().path(), err);
            get_metrics()
                .await
                .auth_rejections
                .with_label_values(&[err.reason()])
                .inc();
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
    }
}
