//! In-memory metrics registry
//!
//! Aggregates counters by name and tag set, and keeps the latest value of
//! each value metric. Snapshots are sorted so reports are stable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

use crate::{Counter, MetricEmitter};

/// Counter identity: name plus sorted tags
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CounterKey {
    name: String,
    tags: Vec<(String, String)>,
}

impl CounterKey {
    fn new(name: &str, tags: &[(&str, &str)]) -> Self {
        let mut tags: Vec<(String, String)> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        tags.sort();
        Self {
            name: name.to_string(),
            tags,
        }
    }
}

#[derive(Debug, Clone)]
struct ValueEntry {
    value: f64,
    unit: String,
}

/// Aggregating in-memory emitter
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<CounterKey, Arc<Counter>>>,
    values: RwLock<HashMap<String, ValueEntry>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of an untagged counter
    pub fn counter(&self, name: &str) -> u64 {
        self.counter_with_tags(name, &[])
    }

    /// Value of a counter with exactly these tags
    pub fn counter_with_tags(&self, name: &str, tags: &[(&str, &str)]) -> u64 {
        self.counters
            .read()
            .get(&CounterKey::new(name, tags))
            .map_or(0, |c| c.get())
    }

    /// Sum of a counter across all tag sets
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .read()
            .iter()
            .filter(|(key, _)| key.name == name)
            .map(|(_, c)| c.get())
            .sum()
    }

    /// Latest reported value of a value metric
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.read().get(name).map(|v| v.value)
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut counters: Vec<CounterSample> = self
            .counters
            .read()
            .iter()
            .map(|(key, counter)| CounterSample {
                name: key.name.clone(),
                tags: key.tags.clone(),
                value: counter.get(),
            })
            .collect();
        counters.sort_by(|a, b| (&a.name, &a.tags).cmp(&(&b.name, &b.tags)));

        let mut values: Vec<ValueSample> = self
            .values
            .read()
            .iter()
            .map(|(name, entry)| ValueSample {
                name: name.clone(),
                value: entry.value,
                unit: entry.unit.clone(),
            })
            .collect();
        values.sort_by(|a, b| a.name.cmp(&b.name));

        MetricsSnapshot {
            taken_at: Some(Instant::now()),
            counters,
            values,
        }
    }

    fn counter_handle(&self, key: CounterKey) -> Arc<Counter> {
        if let Some(counter) = self.counters.read().get(&key) {
            return Arc::clone(counter);
        }
        Arc::clone(self.counters.write().entry(key).or_default())
    }
}

impl MetricEmitter for MetricsRegistry {
    fn add_counter(&self, name: &str, delta: u64, tags: &[(&str, &str)]) {
        self.counter_handle(CounterKey::new(name, tags)).add(delta);
    }

    fn send_value(&self, name: &str, value: f64, unit: &str) {
        self.values.write().insert(
            name.to_string(),
            ValueEntry {
                value,
                unit: unit.to_string(),
            },
        );
    }
}

/// Point-in-time copy of a registry
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    /// When the snapshot was taken
    #[serde(skip)]
    pub taken_at: Option<Instant>,
    pub counters: Vec<CounterSample>,
    pub values: Vec<ValueSample>,
}

/// One counter in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSample {
    pub name: String,
    pub tags: Vec<(String, String)>,
    pub value: u64,
}

impl CounterSample {
    /// Display key: `name` or `name{k=v,...}`
    pub fn key(&self) -> String {
        if self.tags.is_empty() {
            return self.name.clone();
        }
        let tags: Vec<String> = self.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}{{{}}}", self.name, tags.join(","))
    }
}

/// One value metric in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueSample {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

/// Per-second rate of a counter between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct CounterRate {
    pub key: String,
    pub total: u64,
    pub per_sec: f64,
}

impl MetricsSnapshot {
    /// Counter rates relative to a previous snapshot
    ///
    /// Returns `None` if either snapshot lacks a timestamp or no time has
    /// passed. Counters absent from `previous` are rated from zero.
    pub fn rates(&self, previous: &MetricsSnapshot) -> Option<Vec<CounterRate>> {
        let elapsed = self
            .taken_at?
            .checked_duration_since(previous.taken_at?)
            .filter(|d| *d > Duration::ZERO)?;

        let before: HashMap<String, u64> = previous
            .counters
            .iter()
            .map(|c| (c.key(), c.value))
            .collect();

        let rates = self
            .counters
            .iter()
            .map(|c| {
                let key = c.key();
                let delta = c.value.saturating_sub(before.get(&key).copied().unwrap_or(0));
                CounterRate {
                    key,
                    total: c.value,
                    per_sec: delta as f64 / elapsed.as_secs_f64(),
                }
            })
            .collect();

        Some(rates)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
