//! Legacy envelope generation
//!
//! A flat message carrying an `event_type` code plus one optional field per
//! payload kind. Only the field matching `event_type` is meaningful; the
//! decoder accepts any combination and validation into [`crate::Envelope`]
//! rejects envelopes whose declared payload is missing.
//!
//! Field numbers match the legacy byte format so existing producers can be
//! decoded without translation.

use std::collections::HashMap;

/// Legacy wire envelope
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    /// Producer name (required by the legacy format)
    #[prost(string, optional, tag = "1")]
    pub origin: Option<String>,

    /// Raw event type code (required by the legacy format)
    ///
    /// Kept as a raw integer so that unknown codes survive decoding.
    #[prost(int32, optional, tag = "2")]
    pub event_type: Option<i32>,

    /// Nanoseconds since the unix epoch
    #[prost(int64, optional, tag = "6")]
    pub timestamp: Option<i64>,

    #[prost(message, optional, tag = "7")]
    pub http_start_stop: Option<HttpStartStop>,

    #[prost(message, optional, tag = "8")]
    pub log_message: Option<LogMessage>,

    #[prost(message, optional, tag = "9")]
    pub value_metric: Option<ValueMetric>,

    #[prost(message, optional, tag = "10")]
    pub counter_event: Option<CounterEvent>,

    #[prost(message, optional, tag = "11")]
    pub error: Option<Error>,

    #[prost(message, optional, tag = "12")]
    pub container_metric: Option<ContainerMetric>,

    #[prost(string, optional, tag = "13")]
    pub deployment: Option<String>,

    #[prost(string, optional, tag = "14")]
    pub job: Option<String>,

    #[prost(string, optional, tag = "15")]
    pub index: Option<String>,

    #[prost(string, optional, tag = "16")]
    pub ip: Option<String>,

    /// Free-form producer tags
    #[prost(map = "string, string", tag = "17")]
    pub tags: HashMap<String, String>,
}

/// Event type codes of the legacy generation
///
/// Codes 1-3 belonged to retired event kinds and decode as unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    HttpStartStop = 4,
    LogMessage = 5,
    ValueMetric = 6,
    CounterEvent = 7,
    Error = 8,
    ContainerMetric = 9,
}

impl EventType {
    /// All known event types, in code order
    pub const ALL: [EventType; 6] = [
        EventType::HttpStartStop,
        EventType::LogMessage,
        EventType::ValueMetric,
        EventType::CounterEvent,
        EventType::Error,
        EventType::ContainerMetric,
    ];

    /// Look up a known event type by its raw code
    #[inline]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::try_from(code).ok()
    }

    /// Raw wire code
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Canonical type name (`HttpStartStop`, `LogMessage`, ...)
    pub fn name(self) -> &'static str {
        match self {
            Self::HttpStartStop => "HttpStartStop",
            Self::LogMessage => "LogMessage",
            Self::ValueMetric => "ValueMetric",
            Self::CounterEvent => "CounterEvent",
            Self::Error => "Error",
            Self::ContainerMetric => "ContainerMetric",
        }
    }

    /// Parse a canonical type name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// 128-bit identifier split into two little-endian halves
#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message)]
pub struct Uuid {
    #[prost(uint64, optional, tag = "1")]
    pub low: Option<u64>,

    #[prost(uint64, optional, tag = "2")]
    pub high: Option<u64>,
}

/// Which side of an HTTP exchange reported the event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PeerType {
    Client = 1,
    Server = 2,
}

impl PeerType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Server => "Server",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Client" => Some(Self::Client),
            "Server" => Some(Self::Server),
            _ => None,
        }
    }
}

macro_rules! http_methods {
    ($($variant:ident = $code:literal => $name:literal),+ $(,)?) => {
        /// HTTP request method
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
        #[repr(i32)]
        pub enum Method {
            $($variant = $code),+
        }

        impl Method {
            /// Upper-case method name as it appears on the wire (`GET`)
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }

            /// Parse an upper-case method name
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

http_methods! {
    Get = 1 => "GET",
    Post = 2 => "POST",
    Put = 3 => "PUT",
    Delete = 4 => "DELETE",
    Head = 5 => "HEAD",
    Acl = 6 => "ACL",
    BaselineControl = 7 => "BASELINE_CONTROL",
    Bind = 8 => "BIND",
    Checkin = 9 => "CHECKIN",
    Checkout = 10 => "CHECKOUT",
    Connect = 11 => "CONNECT",
    Copy = 12 => "COPY",
    Debug = 13 => "DEBUG",
    Label = 14 => "LABEL",
    Link = 15 => "LINK",
    Lock = 16 => "LOCK",
    Merge = 17 => "MERGE",
    Mkactivity = 18 => "MKACTIVITY",
    Mkcalendar = 19 => "MKCALENDAR",
    Mkcol = 20 => "MKCOL",
    Mkredirectref = 21 => "MKREDIRECTREF",
    Mkworkspace = 22 => "MKWORKSPACE",
    Move = 23 => "MOVE",
    Options = 24 => "OPTIONS",
    Orderpatch = 25 => "ORDERPATCH",
    Patch = 26 => "PATCH",
    Pri = 27 => "PRI",
    Propfind = 28 => "PROPFIND",
    Proppatch = 29 => "PROPPATCH",
    Rebind = 30 => "REBIND",
    Report = 31 => "REPORT",
    Search = 32 => "SEARCH",
    Showmethod = 33 => "SHOWMETHOD",
    Spacejump = 34 => "SPACEJUMP",
    Textsearch = 35 => "TEXTSEARCH",
    Trace = 36 => "TRACE",
    Track = 37 => "TRACK",
    Unbind = 38 => "UNBIND",
    Uncheckout = 39 => "UNCHECKOUT",
    Unlink = 40 => "UNLINK",
    Unlock = 41 => "UNLOCK",
    Update = 42 => "UPDATE",
    Updateredirectref = 43 => "UPDATEREDIRECTREF",
    VersionControl = 44 => "VERSION_CONTROL",
}

/// A complete HTTP request/response exchange
#[derive(Clone, PartialEq, prost::Message)]
pub struct HttpStartStop {
    #[prost(int64, optional, tag = "1")]
    pub start_timestamp: Option<i64>,

    #[prost(int64, optional, tag = "2")]
    pub stop_timestamp: Option<i64>,

    #[prost(message, optional, tag = "3")]
    pub request_id: Option<Uuid>,

    #[prost(enumeration = "PeerType", optional, tag = "4")]
    pub peer_type: Option<i32>,

    #[prost(enumeration = "Method", optional, tag = "5")]
    pub method: Option<i32>,

    #[prost(string, optional, tag = "6")]
    pub uri: Option<String>,

    #[prost(string, optional, tag = "7")]
    pub remote_address: Option<String>,

    #[prost(string, optional, tag = "8")]
    pub user_agent: Option<String>,

    #[prost(int32, optional, tag = "9")]
    pub status_code: Option<i32>,

    #[prost(int64, optional, tag = "10")]
    pub content_length: Option<i64>,

    #[prost(message, optional, tag = "12")]
    pub application_id: Option<Uuid>,

    #[prost(int32, optional, tag = "13")]
    pub instance_index: Option<i32>,

    #[prost(string, optional, tag = "14")]
    pub instance_id: Option<String>,

    /// Addresses from `X-Forwarded-For`, in order
    #[prost(string, repeated, tag = "15")]
    pub forwarded: Vec<String>,
}

/// Stream a log line was written to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Out = 1,
    Err = 2,
}

/// One line of application or platform output
#[derive(Clone, PartialEq, prost::Message)]
pub struct LogMessage {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub message: Option<Vec<u8>>,

    #[prost(enumeration = "MessageType", optional, tag = "2")]
    pub message_type: Option<i32>,

    #[prost(int64, optional, tag = "3")]
    pub timestamp: Option<i64>,

    #[prost(string, optional, tag = "4")]
    pub app_id: Option<String>,

    #[prost(string, optional, tag = "5")]
    pub source_type: Option<String>,

    #[prost(string, optional, tag = "6")]
    pub source_instance: Option<String>,
}

/// A named value with a unit
#[derive(Clone, PartialEq, prost::Message)]
pub struct ValueMetric {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,

    #[prost(double, optional, tag = "2")]
    pub value: Option<f64>,

    #[prost(string, optional, tag = "3")]
    pub unit: Option<String>,
}

/// A monotonically increasing counter sample
#[derive(Clone, PartialEq, prost::Message)]
pub struct CounterEvent {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,

    #[prost(uint64, optional, tag = "2")]
    pub delta: Option<u64>,

    #[prost(uint64, optional, tag = "3")]
    pub total: Option<u64>,
}

/// An error reported by a platform component
#[derive(Clone, PartialEq, prost::Message)]
pub struct Error {
    #[prost(string, optional, tag = "1")]
    pub source: Option<String>,

    #[prost(int32, optional, tag = "2")]
    pub code: Option<i32>,

    #[prost(string, optional, tag = "3")]
    pub message: Option<String>,
}

/// Resource usage of one application instance
#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerMetric {
    #[prost(string, optional, tag = "1")]
    pub application_id: Option<String>,

    #[prost(int32, optional, tag = "2")]
    pub instance_index: Option<i32>,

    #[prost(double, optional, tag = "3")]
    pub cpu_percentage: Option<f64>,

    #[prost(uint64, optional, tag = "4")]
    pub memory_bytes: Option<u64>,

    #[prost(uint64, optional, tag = "5")]
    pub disk_bytes: Option<u64>,

    #[prost(uint64, optional, tag = "6")]
    pub memory_bytes_quota: Option<u64>,

    #[prost(uint64, optional, tag = "7")]
    pub disk_bytes_quota: Option<u64>,
}
