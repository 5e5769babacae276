//! Newer envelope generation
//!
//! Identifies the producer by a `source_id` string, carries a typed tag map
//! and holds exactly one payload in a `oneof`.

use std::collections::HashMap;

/// Newer wire envelope
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    /// Nanoseconds since the unix epoch
    #[prost(int64, tag = "1")]
    pub timestamp: i64,

    #[prost(string, tag = "2")]
    pub source_id: String,

    #[prost(map = "string, message", tag = "3")]
    pub tags: HashMap<String, Value>,

    #[prost(oneof = "envelope::Message", tags = "4, 5, 6, 7")]
    pub message: Option<envelope::Message>,
}

pub mod envelope {
    /// Payload of a newer-generation envelope
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "4")]
        Log(super::Log),
        #[prost(message, tag = "5")]
        Counter(super::Counter),
        #[prost(message, tag = "6")]
        Gauge(super::Gauge),
        #[prost(message, tag = "7")]
        Timer(super::Timer),
    }
}

/// Typed tag value
#[derive(Clone, PartialEq, prost::Message)]
pub struct Value {
    #[prost(oneof = "value::Data", tags = "1, 2, 3")]
    pub data: Option<value::Data>,
}

pub mod value {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Data {
        #[prost(string, tag = "1")]
        Text(String),
        #[prost(int64, tag = "2")]
        Integer(i64),
        #[prost(double, tag = "3")]
        Decimal(f64),
    }
}

impl Value {
    /// Text-valued tag
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            data: Some(value::Data::Text(s.into())),
        }
    }

    /// Integer-valued tag
    pub fn integer(i: i64) -> Self {
        Self {
            data: Some(value::Data::Integer(i)),
        }
    }

    /// Decimal-valued tag
    pub fn decimal(d: f64) -> Self {
        Self {
            data: Some(value::Data::Decimal(d)),
        }
    }

    /// The text content, if this is a text tag
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            Some(value::Data::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The integer content, if this is an integer tag
    pub fn as_integer(&self) -> Option<i64> {
        match self.data {
            Some(value::Data::Integer(i)) => Some(i),
            _ => None,
        }
    }
}

/// Output stream of a log payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LogType {
    Out = 0,
    Err = 1,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Log {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: Vec<u8>,

    #[prost(enumeration = "LogType", tag = "2")]
    pub r#type: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Counter {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(uint64, tag = "2")]
    pub delta: u64,

    #[prost(uint64, tag = "3")]
    pub total: u64,
}

/// A set of named values sampled together
#[derive(Clone, PartialEq, prost::Message)]
pub struct Gauge {
    #[prost(map = "string, message", tag = "1")]
    pub metrics: HashMap<String, GaugeValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GaugeValue {
    #[prost(string, tag = "1")]
    pub unit: String,

    #[prost(double, tag = "2")]
    pub value: f64,
}

/// A named interval
#[derive(Clone, PartialEq, prost::Message)]
pub struct Timer {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(int64, tag = "2")]
    pub start: i64,

    #[prost(int64, tag = "3")]
    pub stop: i64,
}
