use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Pipeline counters. Each increment is also reported to the `metrics`
/// facade so a host process can attach an exporter.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    plans_generated_total: AtomicU64,
    extraction_fallback_total: AtomicU64,
    stage_fallback_total: AtomicU64,
    collaborator_failure_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub plans_generated_total: u64,
    pub extraction_fallback_total: u64,
    pub stage_fallback_total: u64,
    pub collaborator_failure_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dreamtrip_requests_total").increment(1);
    }

    pub fn inc_plan_generated(&self) {
        self.plans_generated_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dreamtrip_plans_generated_total").increment(1);
    }

    pub fn inc_extraction_fallback(&self) {
        self.extraction_fallback_total
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dreamtrip_stage_fallback_total", "stage" => "extraction").increment(1);
    }

    /// `stage` names the pipeline step that substituted its deterministic
    /// result, e.g. "research_queries" or "budget".
    pub fn inc_stage_fallback(&self, stage: &'static str) {
        self.stage_fallback_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dreamtrip_stage_fallback_total", "stage" => stage).increment(1);
    }

    pub fn inc_collaborator_failure(&self, service: &'static str) {
        self.collaborator_failure_total
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dreamtrip_collaborator_failure_total", "service" => service)
            .increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            plans_generated_total: self.plans_generated_total.load(Ordering::Relaxed),
            extraction_fallback_total: self.extraction_fallback_total.load(Ordering::Relaxed),
            stage_fallback_total: self.stage_fallback_total.load(Ordering::Relaxed),
            collaborator_failure_total: self.collaborator_failure_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,dreamtrip_agents=info,dreamtrip_api=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_requests() {
        let metrics = AppMetrics::default();
        assert_eq!(metrics.snapshot().avg_latency_millis, 0.0);

        metrics.inc_request();
        metrics.inc_request();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(50));
        metrics.inc_stage_fallback("budget");
        metrics.inc_collaborator_failure("places");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.avg_latency_millis, 40.0);
        assert_eq!(snapshot.stage_fallback_total, 1);
        assert_eq!(snapshot.collaborator_failure_total, 1);
    }
}
