//! Request lifecycle events
//!
//! An [`Event`] is one decoded stat-log record: a lookup, update, add,
//! remove or group change, either successful or failed, as observed by a
//! single host. Events are produced only by the [`parser`] and never
//! mutated afterwards; everything downstream derives aggregates from them.

pub mod parser;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use parser::{parse_connect_time, parse_line};

/// Operation family of a request, independent of its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Lookup,
    Update,
    Add,
    Remove,
    GroupChange,
}

impl OpKind {
    /// All operation kinds in report order
    pub const ALL: [OpKind; 5] = [
        OpKind::Lookup,
        OpKind::Update,
        OpKind::Add,
        OpKind::Remove,
        OpKind::GroupChange,
    ];

    /// Prefix used for per-kind report files (`readlatencies_cdf.txt`, ...)
    pub fn report_prefix(self) -> &'static str {
        match self {
            OpKind::Lookup => "read",
            OpKind::Update => "write",
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::GroupChange => "group_change",
        }
    }

    /// Label used for this kind in the summary report
    pub fn summary_label(self) -> &'static str {
        match self {
            OpKind::Lookup => "Read",
            OpKind::Update => "Write",
            OpKind::Add => "Add",
            OpKind::Remove => "Remove",
            OpKind::GroupChange => "GroupChange",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report_prefix())
    }
}

/// Tagged event kind: operation family plus outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    LookupSuccess,
    LookupFailure,
    UpdateSuccess,
    UpdateFailure,
    AddSuccess,
    AddFailure,
    RemoveSuccess,
    RemoveFailure,
    GroupChangeSuccess,
}

impl EventKind {
    pub fn op(self) -> OpKind {
        match self {
            EventKind::LookupSuccess | EventKind::LookupFailure => OpKind::Lookup,
            EventKind::UpdateSuccess | EventKind::UpdateFailure => OpKind::Update,
            EventKind::AddSuccess | EventKind::AddFailure => OpKind::Add,
            EventKind::RemoveSuccess | EventKind::RemoveFailure => OpKind::Remove,
            EventKind::GroupChangeSuccess => OpKind::GroupChange,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(
            self,
            EventKind::LookupSuccess
                | EventKind::UpdateSuccess
                | EventKind::AddSuccess
                | EventKind::RemoveSuccess
                | EventKind::GroupChangeSuccess
        )
    }

    /// Short code written to the tuple log
    pub fn short_code(self) -> &'static str {
        match self {
            EventKind::LookupSuccess => "r",
            EventKind::LookupFailure => "rf",
            EventKind::UpdateSuccess => "w",
            EventKind::UpdateFailure => "wf",
            EventKind::AddSuccess => "a",
            EventKind::AddFailure => "af",
            EventKind::RemoveSuccess => "d",
            EventKind::RemoveFailure => "df",
            EventKind::GroupChangeSuccess => "gc",
        }
    }
}

/// One decoded request record
///
/// `latency_ms` is always present on successes. On failures it holds the
/// elapsed time only when the record carried a non-negative value; a
/// missing or negative value means the request never completed.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub name: String,
    pub latency_ms: Option<f64>,
    /// Absolute start time in the observing host's clock domain
    pub start_time_raw: Option<f64>,
    pub local_node: Option<i64>,
    pub remote_node: Option<i64>,
    /// Wire attempts; 0 means answered from the local cache
    pub transmissions: u32,
    /// Fallbacks to the primary replica
    pub restarts: u32,
    /// Explicit cache-hit marker on the record
    pub cache_marker: bool,
    /// Ping latency to the first name server contacted (lookups only)
    pub ping_ms: Option<f64>,
}

impl Event {
    pub fn is_success(&self) -> bool {
        self.kind.is_success()
    }

    /// Lookup answered from the local cache without a network round trip
    pub fn is_cache_hit(&self) -> bool {
        self.kind == EventKind::LookupSuccess && (self.transmissions == 0 || self.cache_marker)
    }

    /// Successful request that needed more than one wire attempt
    pub fn is_retransmission(&self) -> bool {
        self.is_success() && self.transmissions > 1
    }

    /// Successful request that had to fall back to the primary replica
    pub fn contacted_primary(&self) -> bool {
        self.is_success() && self.restarts > 0
    }
}

/// Error decoding a line that carried a recognized marker
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{marker}: expected at least {arity} fields, found {found}")]
    MissingField {
        marker: &'static str,
        arity: usize,
        found: usize,
    },

    #[error("{marker}: field {field} is not a valid number: {value:?}")]
    InvalidNumber {
        marker: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{marker}: negative latency {value} on a completed request")]
    NegativeLatency { marker: &'static str, value: f64 },
}
