use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{ACCESS_TOKEN_PATH, TICKET_PATH};

static OTHER_PATH: &'static str = "other";

/// One log line and one counter sample per inbound request.
pub async fn access_log(req: Request, next: Next) -> Response {
    let start = get_instant();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    info!(
        "{} {} {} {:?}",
        method,
        path,
        status.canonical_reason().unwrap_or(status.as_str()),
        elapsed
    );

    let metrics = get_metrics().await;
    let label = path_label(&path);
    metrics
        .http_requests
        .with_label_values(&[label, status.as_str()])
        .inc();
    metrics
        .http_duration
        .with_label_values(&[label])
        .observe(elapsed.as_secs_f64());

    response
}

// keeps metric cardinality bounded
fn path_label(path: &str) -> &'static str {
    match path {
        ACCESS_TOKEN_PATH => ACCESS_TOKEN_PATH,
        TICKET_PATH => TICKET_PATH,
        _ => OTHER_PATH,
    }
}
