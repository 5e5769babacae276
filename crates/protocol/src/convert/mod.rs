//! Translation between the two wire generations
//!
//! - [`to_v2`] maps a legacy envelope onto the newer payload set, moving
//!   payload fields that have no slot in the target message into typed tags.
//! - [`to_v1`] reverses the mapping, using the `__v1_type` tag to pick the
//!   legacy payload when the newer payload alone is ambiguous.
//! - [`convert`] decodes legacy bytes and translates them in one step.
//!
//! # Tag layout
//!
//! | Legacy type | Newer payload | Payload tags |
//! |-------------|---------------|--------------|
//! | HttpStartStop | `Timer "http"` | `request_id`, `peer_type`, `method`, `uri`, `remote_address`, `user_agent`, `status_code`, `content_length`, `instance_index`, `instance_id`, `forwarded` |
//! | LogMessage | `Log` | `source_type`, `source_instance`, `log_timestamp` |
//! | ValueMetric | `Gauge` (one entry) | |
//! | CounterEvent | `Counter` | |
//! | Error | `Log` (ERR) | `source`, `code` |
//! | ContainerMetric | `Gauge` (cpu, memory, disk, quotas) | `instance_index` |
//!
//! Every translated envelope also carries `__v1_type` and the metadata tags
//! `origin`, `deployment`, `job`, `index` and `ip` when present.
//!
//! # Log timestamps
//!
//! A log message's own timestamp fills the envelope timestamp when the
//! legacy envelope has none. Whenever the two differ, the log's value (0 for
//! none) also goes into the integer tag `log_timestamp`. Reading it back, a
//! tag equal to the envelope timestamp means that timestamp was borrowed
//! from the log.

mod to_v1;
mod to_v2;

pub use to_v1::to_v1;
pub use to_v2::to_v2;

use std::collections::HashMap;

use crate::Result;
use crate::wire::{self, v2};

/// Tag holding the legacy event type name
pub const V1_TYPE_TAG: &str = "__v1_type";

/// Metadata tags, in legacy field order
pub const METADATA_TAGS: [&str; 5] = ["origin", "deployment", "job", "index", "ip"];

/// Timer name used for HTTP exchanges
pub const HTTP_TIMER_NAME: &str = "http";

/// Separator for list-valued tags
const LIST_SEPARATOR: &str = "\n";

/// Payload tags of an HTTP exchange
const HTTP_TAGS: &[&str] = &[
    "request_id",
    "peer_type",
    "method",
    "uri",
    "remote_address",
    "user_agent",
    "status_code",
    "content_length",
    "instance_index",
    "instance_id",
    "forwarded",
];

/// Log message timestamp, when it differs from the envelope's
pub const LOG_TIMESTAMP_TAG: &str = "log_timestamp";

/// Payload tags of a log message
const LOG_TAGS: &[&str] = &["source_type", "source_instance", LOG_TIMESTAMP_TAG];

/// Payload tags of an error
const ERROR_TAGS: &[&str] = &["source", "code"];

/// Payload kinds carried entirely in the message body
const NO_TAGS: &[&str] = &[];

/// Payload tags of a container metric
const CONTAINER_TAGS: &[&str] = &["instance_index"];

/// Gauge entries of a container metric
const CPU: &str = "cpu";
const MEMORY: &str = "memory";
const DISK: &str = "disk";
const MEMORY_QUOTA: &str = "memory_quota";
const DISK_QUOTA: &str = "disk_quota";

const PERCENTAGE_UNIT: &str = "percentage";
const BYTES_UNIT: &str = "bytes";

/// Decode legacy bytes and translate them to the newer generation
///
/// Returns `Ok(None)` when the bytes decode but the declared payload is
/// missing.
pub fn convert(bytes: &[u8]) -> Result<Option<v2::Envelope>> {
    let legacy = wire::decode_v1(bytes)?;
    Ok(to_v2(&legacy))
}

/// Source id used when an envelope has no application
pub fn fallback_source_id(deployment: Option<&str>, job: Option<&str>) -> String {
    format!("{}/{}", deployment.unwrap_or_default(), job.unwrap_or_default())
}

fn tag_text<'a>(tags: &'a HashMap<String, v2::Value>, key: &str) -> Option<&'a str> {
    tags.get(key).and_then(v2::Value::as_text)
}

fn tag_integer(tags: &HashMap<String, v2::Value>, key: &str) -> Option<i64> {
    tags.get(key).and_then(v2::Value::as_integer)
}

#[cfg(test)]
#[path = "convert_test.rs"]
mod tests;
