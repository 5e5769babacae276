//! Sink manager - registry and router for envelope consumers
//!
//! Sinks are registered under a [`Scope`]: one application, or the firehose
//! that sees every envelope. Routing snapshots the matching sinks under a
//! read lock, releases it, then offers the envelope to each sink in turn.
//! Sinks never block, so one slow consumer cannot hold up the others or the
//! caller.
//!
//! # Population accounting
//!
//! Per-kind and firehose counts change only inside `register`, `unregister`
//! and the reap operations, and are published while the write lock is still
//! held. Published values therefore always match the registry contents, in
//! mutation order.
//!
//! # Unhealthy sinks
//!
//! A sink that fails on its own (a syslog drain that stopped accepting
//! writes, a websocket whose peer went away) fires its health signal. A
//! watcher task spawned at registration then removes and closes it, without
//! waiting for further routing. Sinks found unhealthy while routing are
//! reaped the same way. The application's error-receiving sinks get an
//! error envelope saying so.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use courier_metrics::MetricEmitter;
use courier_protocol::wire::v1;
use courier_protocol::{Envelope, Event};
use courier_sinks::{ContainerMetricSink, Delivery, DumpSink, Sink, SinkKind};

use crate::metrics::{Population, RouterMetrics};
use crate::{PipelineError, Result};

/// Origin of envelopes generated by the manager itself
pub const ERROR_ORIGIN: &str = "courier";

/// Source type of generated error log messages
pub const ERROR_SOURCE_TYPE: &str = "RTR";

/// Where a sink receives envelopes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Envelopes of one application
    App(String),
    /// Every envelope
    Firehose,
}

impl Scope {
    pub fn app(app_id: impl Into<String>) -> Self {
        Self::App(app_id.into())
    }

    #[inline]
    pub fn is_firehose(&self) -> bool {
        matches!(self, Self::Firehose)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(app_id) => write!(f, "app:{app_id}"),
            Self::Firehose => f.write_str("firehose"),
        }
    }
}

/// Outcome of routing one envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteReport {
    /// Sinks that accepted the envelope
    pub accepted: usize,
    /// Sinks that dropped it
    pub dropped: usize,
}

impl RouteReport {
    /// Sinks the envelope was offered to
    pub fn targets(&self) -> usize {
        self.accepted + self.dropped
    }
}

type SinkMap = HashMap<String, Arc<dyn Sink>>;

#[derive(Default)]
struct Registry {
    apps: HashMap<String, SinkMap>,
    firehose: SinkMap,
    population: Population,
}

impl Registry {
    fn app_sinks(&self, app_id: &str) -> impl Iterator<Item = &Arc<dyn Sink>> {
        self.apps.get(app_id).into_iter().flat_map(|sinks| sinks.values())
    }
}

/// Registry of sinks and router of envelopes to them
pub struct SinkManager {
    registry: RwLock<Registry>,
    emitter: Arc<dyn MetricEmitter>,
    metrics: Arc<RouterMetrics>,
    /// Handed to health watchers so they never keep the manager alive
    this: Weak<SinkManager>,
}

impl SinkManager {
    pub fn new(emitter: Arc<dyn MetricEmitter>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            registry: RwLock::new(Registry::default()),
            emitter,
            metrics: Arc::new(RouterMetrics::new()),
            this: this.clone(),
        })
    }

    /// Routing activity counters
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Current registered counts
    pub fn population(&self) -> Population {
        self.registry.read().population.clone()
    }

    /// Whether a sink with `sink_id` is registered under `scope`
    pub fn contains(&self, sink_id: &str, scope: &Scope) -> bool {
        let registry = self.registry.read();
        match scope {
            Scope::App(app_id) => registry
                .apps
                .get(app_id)
                .is_some_and(|sinks| sinks.contains_key(sink_id)),
            Scope::Firehose => registry.firehose.contains_key(sink_id),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register `sink` under `scope`
    ///
    /// A sink with the same id already in that scope is replaced and closed.
    /// Only websocket sinks may consume the firehose, and an app-scoped sink
    /// must serve the scope's application.
    pub fn register(&self, sink: Arc<dyn Sink>, scope: Scope) -> Result<()> {
        let kind = sink.kind();
        match &scope {
            Scope::Firehose if kind != SinkKind::Websocket => {
                return Err(PipelineError::FirehoseUnsupported(kind));
            }
            Scope::App(app_id) if sink.app_id() != Some(app_id.as_str()) => {
                return Err(PipelineError::ScopeMismatch {
                    sink: sink.id().to_string(),
                    scope: scope.clone(),
                });
            }
            _ => {}
        }

        let firehose = scope.is_firehose();
        let replaced = {
            let mut guard = self.registry.write();
            let registry = &mut *guard;
            let sinks = match &scope {
                Scope::App(app_id) => registry.apps.entry(app_id.clone()).or_default(),
                Scope::Firehose => &mut registry.firehose,
            };
            let replaced = sinks.insert(sink.id().to_string(), Arc::clone(&sink));

            if let Some(old) = &replaced {
                registry.population.remove(old.kind(), firehose);
                registry.population.emit(&*self.emitter, old.kind(), firehose);
            }
            registry.population.add(kind, firehose);
            registry.population.emit(&*self.emitter, kind, firehose);
            replaced
        };

        if let Some(old) = replaced {
            old.close();
            tracing::debug!(sink = %sink.id(), kind = %kind, %scope, "replaced sink");
        } else {
            tracing::debug!(sink = %sink.id(), kind = %kind, %scope, "registered sink");
        }
        self.watch_health(&sink, scope);
        Ok(())
    }

    /// Unregister `sink` as soon as its health signal fires
    ///
    /// Needs a tokio runtime; without one, failed sinks are only reaped
    /// while routing.
    fn watch_health(&self, sink: &Arc<dyn Sink>, scope: Scope) {
        let Some(signal) = sink.health_signal() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let manager = self.this.clone();
        let watched = Arc::downgrade(sink);
        runtime.spawn(async move {
            signal.cancelled().await;
            if let (Some(manager), Some(sink)) = (manager.upgrade(), watched.upgrade()) {
                manager.reap_failed(&sink, scope);
            }
        });
    }

    /// Remove `sink` if it is still the one registered under its id
    ///
    /// A sink that was unregistered or replaced in the meantime is left
    /// alone.
    fn reap_failed(&self, sink: &Arc<dyn Sink>, scope: Scope) {
        let removed = {
            let mut guard = self.registry.write();
            let registry = &mut *guard;
            let sinks = match &scope {
                Scope::App(app_id) => registry.apps.get_mut(app_id),
                Scope::Firehose => Some(&mut registry.firehose),
            };
            let Some(sinks) = sinks else {
                return;
            };
            if !sinks
                .get(sink.id())
                .is_some_and(|registered| Arc::ptr_eq(registered, sink))
            {
                return;
            }
            sinks.remove(sink.id());
            if let Scope::App(app_id) = &scope
                && registry.apps.get(app_id).is_some_and(HashMap::is_empty)
            {
                registry.apps.remove(app_id);
            }

            let firehose = scope.is_firehose();
            registry.population.remove(sink.kind(), firehose);
            registry.population.emit(&*self.emitter, sink.kind(), firehose);
            vec![(scope, Arc::clone(sink))]
        };
        self.retire(&removed);
    }

    /// Remove and close the sink `sink_id` registered under `scope`
    ///
    /// Returns false if no such sink was registered.
    pub fn unregister(&self, sink_id: &str, scope: &Scope) -> bool {
        let removed = {
            let mut guard = self.registry.write();
            let registry = &mut *guard;
            let removed = match scope {
                Scope::App(app_id) => {
                    let removed = registry
                        .apps
                        .get_mut(app_id)
                        .and_then(|sinks| sinks.remove(sink_id));
                    if registry.apps.get(app_id).is_some_and(HashMap::is_empty) {
                        registry.apps.remove(app_id);
                    }
                    removed
                }
                Scope::Firehose => registry.firehose.remove(sink_id),
            };

            if let Some(sink) = &removed {
                let firehose = scope.is_firehose();
                registry.population.remove(sink.kind(), firehose);
                registry.population.emit(&*self.emitter, sink.kind(), firehose);
            }
            removed
        };

        match removed {
            Some(sink) => {
                sink.close();
                tracing::debug!(sink = %sink_id, kind = %sink.kind(), %scope, "unregistered sink");
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Offer `envelope` to its application's sinks and every firehose sink
    ///
    /// Best effort per sink. Unhealthy sinks found along the way are reaped
    /// once delivery finishes.
    pub fn route(&self, envelope: Arc<Envelope>) -> RouteReport {
        self.metrics.record_received();
        let app_id = envelope.app_id();

        let targets: Vec<Arc<dyn Sink>> = {
            let registry = self.registry.read();
            let app_sinks = app_id
                .as_deref()
                .map(|app_id| registry.app_sinks(app_id))
                .into_iter()
                .flatten();
            app_sinks
                .chain(registry.firehose.values())
                .cloned()
                .collect()
        };

        if targets.is_empty() {
            self.metrics.record_unrouted();
            tracing::trace!(app_id = ?app_id, "no sinks for envelope");
            return RouteReport::default();
        }

        let mut report = RouteReport::default();
        let mut found_unhealthy = false;
        for sink in &targets {
            if !sink.is_healthy() {
                found_unhealthy = true;
                report.dropped += 1;
                continue;
            }
            match sink.deliver(Arc::clone(&envelope)) {
                Delivery::Accepted => report.accepted += 1,
                Delivery::Dropped => report.dropped += 1,
            }
        }
        self.metrics
            .record_deliveries(report.accepted as u64, report.dropped as u64);

        if found_unhealthy {
            self.reap_unhealthy();
        }
        report
    }

    /// Route every envelope from `receiver` until it closes
    pub async fn run(&self, mut receiver: mpsc::Receiver<Arc<Envelope>>) {
        tracing::info!(sinks = self.population().total(), "sink manager starting");

        while let Some(envelope) = receiver.recv().await {
            self.route(envelope);
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            envelopes_received = snapshot.envelopes_received,
            envelopes_unrouted = snapshot.envelopes_unrouted,
            deliveries_accepted = snapshot.deliveries_accepted,
            deliveries_dropped = snapshot.deliveries_dropped,
            sinks_reaped = snapshot.sinks_reaped,
            "sink manager stopped"
        );
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove and close every unhealthy sink
    ///
    /// Each affected application's error-receiving sinks are told which sink
    /// was removed. Returns the number of sinks removed.
    pub fn reap_unhealthy(&self) -> usize {
        let removed = self.remove_where(|sink| !sink.is_healthy());
        self.retire(&removed);
        removed.len()
    }

    /// Close removed unhealthy sinks and tell their applications
    fn retire(&self, removed: &[(Scope, Arc<dyn Sink>)]) {
        for (scope, sink) in removed {
            tracing::warn!(sink = %sink.id(), kind = %sink.kind(), %scope, "removing unhealthy sink");
            sink.close();
            if let Scope::App(app_id) = scope {
                self.send_error(
                    app_id,
                    &format!("{} sink {} removed: delivery failed", sink.kind(), sink.id()),
                );
            }
        }
        self.metrics.record_reaped(removed.len() as u64);
    }

    /// Remove and close dump sinks that received nothing for `timeout`
    pub fn reap_idle_dumps(&self, timeout: Duration) -> usize {
        let removed = self.remove_where(|sink| {
            downcast::<DumpSink>(sink.as_ref()).is_some_and(|dump| dump.is_idle(timeout))
        });
        for (scope, sink) in &removed {
            tracing::debug!(sink = %sink.id(), %scope, "removing idle dump sink");
            sink.close();
        }
        self.metrics.record_reaped(removed.len() as u64);
        removed.len()
    }

    /// Unregister every sink matching `predicate`, keeping the population in step
    fn remove_where(&self, predicate: impl Fn(&Arc<dyn Sink>) -> bool) -> Vec<(Scope, Arc<dyn Sink>)> {
        let mut guard = self.registry.write();
        let registry = &mut *guard;
        let mut removed = Vec::new();

        for (app_id, sinks) in registry.apps.iter_mut() {
            sinks.retain(|_, sink| {
                let keep = !predicate(sink);
                if !keep {
                    removed.push((Scope::App(app_id.clone()), Arc::clone(sink)));
                }
                keep
            });
        }
        registry.apps.retain(|_, sinks| !sinks.is_empty());

        registry.firehose.retain(|_, sink| {
            let keep = !predicate(sink);
            if !keep {
                removed.push((Scope::Firehose, Arc::clone(sink)));
            }
            keep
        });

        for (scope, sink) in &removed {
            let firehose = scope.is_firehose();
            registry.population.remove(sink.kind(), firehose);
            registry.population.emit(&*self.emitter, sink.kind(), firehose);
        }
        removed
    }

    // =========================================================================
    // Application queries
    // =========================================================================

    /// Deliver an error log message to `app_id`'s error-receiving sinks
    ///
    /// Returns the number of sinks that accepted it.
    pub fn send_error(&self, app_id: &str, message: &str) -> usize {
        let targets: Vec<Arc<dyn Sink>> = {
            let registry = self.registry.read();
            registry
                .app_sinks(app_id)
                .filter(|sink| sink.should_receive_errors())
                .cloned()
                .collect()
        };
        if targets.is_empty() {
            return 0;
        }

        let envelope = Arc::new(error_envelope(app_id, message));
        self.metrics.record_error_sent();
        targets
            .iter()
            .filter(|sink| sink.deliver(Arc::clone(&envelope)).is_accepted())
            .count()
    }

    /// Recent envelopes held by `app_id`'s dump sink, oldest first
    pub fn recent_envelopes(&self, app_id: &str) -> Vec<Arc<Envelope>> {
        self.find_app_sink::<DumpSink, _>(app_id, DumpSink::dump)
            .unwrap_or_default()
    }

    /// Latest container metric per instance for `app_id`
    pub fn latest_container_metrics(&self, app_id: &str) -> Vec<Arc<Envelope>> {
        self.find_app_sink::<ContainerMetricSink, _>(app_id, ContainerMetricSink::latest)
            .unwrap_or_default()
    }

    fn find_app_sink<T: Sink, R>(&self, app_id: &str, read: impl Fn(&T) -> R) -> Option<R> {
        let registry = self.registry.read();
        registry
            .app_sinks(app_id)
            .find_map(|sink| downcast::<T>(sink.as_ref()))
            .map(read)
    }
}

impl fmt::Debug for SinkManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkManager")
            .field("population", &self.population())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

fn downcast<T: Sink>(sink: &dyn Sink) -> Option<&T> {
    let any: &dyn Any = sink;
    any.downcast_ref::<T>()
}

fn error_envelope(app_id: &str, message: &str) -> Envelope {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0);

    let log = v1::LogMessage {
        message: Some(message.as_bytes().to_vec()),
        message_type: Some(v1::MessageType::Err as i32),
        timestamp: Some(timestamp),
        app_id: Some(app_id.to_string()),
        source_type: Some(ERROR_SOURCE_TYPE.to_string()),
        source_instance: None,
    };
    Envelope::new(ERROR_ORIGIN, Event::LogMessage(log)).with_timestamp(timestamp)
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
