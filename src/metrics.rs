//! Prometheus counters for webhook processing.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Process-lifetime counters, registered on an instance-owned registry
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    pub webhooks_processed: IntCounter,
    pub unknown_webhooks: IntCounter,
    pub webhooks_per_project: IntCounterVec,
}

impl RelayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let webhooks_processed = IntCounter::with_opts(Opts::new(
            "jira_webhooks_processed_total",
            "The total number of processed JIRA webhook events since application start",
        ))?;
        let unknown_webhooks = IntCounter::with_opts(Opts::new(
            "jira_unknown_webhooks_received_total",
            "The total number of unknown JIRA webhook events received since application start",
        ))?;
        let webhooks_per_project = IntCounterVec::new(
            Opts::new(
                "jira_webhooks_processed_per_project",
                "The total number of processed JIRA webhook events since application start per JIRA project",
            ),
            &["project"],
        )?;

        registry.register(Box::new(webhooks_processed.clone()))?;
        registry.register(Box::new(unknown_webhooks.clone()))?;
        registry.register(Box::new(webhooks_per_project.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            webhooks_processed,
            unknown_webhooks,
            webhooks_per_project,
        })
    }

    /// Count an event delivered to a configured project
    pub fn record_project(&self, project: &str) {
        self.webhooks_per_project
            .with_label_values(&[project])
            .inc();
    }

    /// Render all metrics in the text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
