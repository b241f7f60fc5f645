use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Lazily initialised process-wide metrics.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Cache metrics
    pub cache_lookups: IntCounterVec,

    // Upstream metrics
    pub upstream_requests: IntCounterVec,
    pub upstream_failures: IntCounterVec,
    pub upstream_duration: HistogramVec,
    pub token_recoveries: IntCounterVec,

    // Inbound metrics
    pub http_requests: IntCounterVec,
    pub http_duration: HistogramVec,
    pub auth_rejections: IntCounterVec,

    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenhub".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            cache_lookups: IntCounterVec::new(Opts::new("cache_lookups_total", "Credential cache lookups by result"), &["kind", "result"]).unwrap(),

            upstream_requests: IntCounterVec::new(Opts::new("upstream_requests_total", "Upstream issuance calls"), &["kind"]).unwrap(),
            upstream_failures: IntCounterVec::new(Opts::new("upstream_failures_total", "Upstream issuance failures by reason"), &["kind", "reason"]).unwrap(),
            upstream_duration: HistogramVec::new(HistogramOpts::new("upstream_request_duration_seconds", "Upstream issuance duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["kind"]).unwrap(),
            token_recoveries: IntCounterVec::new(Opts::new("token_recoveries_total", "Ticket retries after an invalidated access token"), &["outcome"]).unwrap(),

            http_requests: IntCounterVec::new(Opts::new("http_requests_total", "Inbound requests by path and status"), &["path", "status"]).unwrap(),
            http_duration: HistogramVec::new(HistogramOpts::new("http_request_duration_seconds", "Inbound request duration seconds").buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]), &["path"]).unwrap(),
            auth_rejections: IntCounterVec::new(Opts::new("auth_rejections_total", "Rejected inbound bearer tokens"), &["reason"]).unwrap(),

            up: IntGauge::new("up", "1 if service is serving").unwrap(),

            registry,
        });

        let reg = &metrics.registry;
        reg.register(Box::new(metrics.cache_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_requests.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_failures.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_recoveries.clone())).unwrap();
        reg.register(Box::new(metrics.http_requests.clone())).unwrap();
        reg.register(Box::new(metrics.http_duration.clone())).unwrap();
        reg.register(Box::new(metrics.auth_rejections.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
