//! Periodic metrics reporter
//!
//! Snapshots a [`MetricsRegistry`] at the configured interval and logs the
//! formatted result via tracing. Counter rates are computed against the
//! previous snapshot, so the first report only establishes a baseline.

use std::sync::Arc;

use courier_config::{MetricsConfig, MetricsFormat};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{HumanFormatter, JsonFormatter, MetricsFormatter, MetricsRegistry, MetricsSnapshot};

/// Metrics reporter
pub struct Reporter {
    config: MetricsConfig,
    formatter: Box<dyn MetricsFormatter>,
    registry: Arc<MetricsRegistry>,
    previous: Option<MetricsSnapshot>,
}

impl Reporter {
    /// Create a reporter for a registry
    pub fn new(config: MetricsConfig, registry: Arc<MetricsRegistry>) -> Self {
        let formatter: Box<dyn MetricsFormatter> = match config.format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };

        Self {
            config,
            formatter,
            registry,
            previous: None,
        }
    }

    /// Run the reporter until cancellation
    ///
    /// This is the main entry point - spawn this as a tokio task.
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval.as_secs(),
            format = ?self.config.format,
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let output = self.report();
                    for line in output.lines() {
                        info!("{}", line);
                    }
                }
            }
        }
    }

    /// Take a snapshot and format it
    pub fn report(&mut self) -> String {
        let mut snapshot = self.registry.snapshot();
        if !self.config.include_counters {
            snapshot.counters.clear();
        }
        if !self.config.include_values {
            snapshot.values.clear();
        }

        let rates = self
            .previous
            .as_ref()
            .and_then(|prev| snapshot.rates(prev));
        let output = self.formatter.format_snapshot(&snapshot, rates.as_deref());

        self.previous = Some(snapshot);
        output
    }
}
