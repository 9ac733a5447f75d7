//! Stat-log line decoder
//!
//! Each stat-log record is a single line whose first field is a marker such
//! as `Success-LookupRequest` or `Failed-Update`, optionally wrapped in
//! `<message>...</message>`. The marker selects a decoder from [`MARKERS`];
//! every decoder owns the fixed field layout for its record kind.
//!
//! Field layouts (index 0 is the marker):
//!
//! | marker                   | fields                                                           |
//! |--------------------------|------------------------------------------------------------------|
//! | `Success-Lookup*`        | 3 name, 4 latency, 5 ping, 8 transmissions, 10 local node,       |
//! |                          | 11 start, 12 restarts, 13 queried name servers (`a\|b\|c`)       |
//! | `Success-Update/Add/Remove` | 1 name, 2 latency, 4 name server, 5 local node, 7 restarts, 8 start |
//! | `Failed-Lookup*`         | 3 name, 5 latency, 8 name server                                 |
//! | `Failed-Update/Add/Remove*` | 3 name, 2 latency, 4 name server                              |
//! | `Success-GroupChange`    | 1 name, 3 latency                                                |
//!
//! Failure detail fields are best effort: the request is counted as failed
//! as long as its name can be read.
//!
//! Connection-setup records (`<prefix> Success-ConnectTime <ms> ...`) are
//! not requests and are decoded separately by [`parse_connect_time`].

use super::{Event, EventKind, ParseError};
use std::str::FromStr;

const MESSAGE_OPEN: &str = "<message>";
const MESSAGE_CLOSE: &str = "</message>";

type Decoder = fn(&'static str, EventKind, &[&str]) -> Result<Event, ParseError>;

/// Marker prefix, kind and decoder for every recognized record
const MARKERS: &[(&str, EventKind, Decoder)] = &[
    ("Success-Lookup", EventKind::LookupSuccess, decode_lookup_success),
    ("Failed-Lookup", EventKind::LookupFailure, decode_lookup_failure),
    ("Success-Update", EventKind::UpdateSuccess, decode_update_success),
    ("Failed-Update", EventKind::UpdateFailure, decode_update_failure),
    ("Success-Add", EventKind::AddSuccess, decode_update_success),
    ("Failed-Add", EventKind::AddFailure, decode_update_failure),
    ("Success-Remove", EventKind::RemoveSuccess, decode_update_success),
    ("Failed-Remove", EventKind::RemoveFailure, decode_update_failure),
    ("Success-GroupChange", EventKind::GroupChangeSuccess, decode_group_change),
];

/// Decode one raw log line
///
/// Returns `Ok(None)` for blank lines and lines without a recognized
/// marker, `Err` for recognized records whose fields do not decode.
pub fn parse_line(line: &str) -> Result<Option<Event>, ParseError> {
    let line = line.trim();
    let line = line.strip_prefix(MESSAGE_OPEN).unwrap_or(line);
    let line = line.strip_suffix(MESSAGE_CLOSE).unwrap_or(line).trim_end();
    if line.is_empty() {
        return Ok(None);
    }

    let tokens: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    let marker_token = tokens[0];
    let Some(&(marker, kind, decode)) = MARKERS
        .iter()
        .find(|(prefix, _, _)| marker_token.starts_with(prefix))
    else {
        return Ok(None);
    };

    decode(marker, kind, &tokens).map(Some)
}

/// Connection setup markers; the marker is the second whitespace token
const CONNECT_MARKERS: [&str; 2] = ["Success-ConnectTime", "Failed-ConnectTime"];

/// Decode a connection-setup record
///
/// These records carry a leading prefix token before the marker and the
/// time to connect in milliseconds right after it. Returns `Ok(None)` for
/// every line that is not a connection-setup record.
pub fn parse_connect_time(line: &str) -> Result<Option<f64>, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Ok(None);
    }
    let Some(&marker) = CONNECT_MARKERS.iter().find(|m| tokens[1] == **m) else {
        return Ok(None);
    };

    let fields = Fields {
        marker,
        tokens: &tokens,
    };
    let value = fields.finite(2, "connect_time")?;
    if value < 0.0 {
        return Err(ParseError::NegativeLatency { marker, value });
    }
    Ok(Some(value))
}

fn decode_lookup_success(
    marker: &'static str,
    kind: EventKind,
    tokens: &[&str],
) -> Result<Event, ParseError> {
    let fields = Fields::new(marker, tokens, 14)?;

    let latency = fields.latency(4)?;
    Ok(Event {
        kind,
        name: tokens[3].to_string(),
        latency_ms: Some(latency),
        start_time_raw: Some(fields.time(11)?),
        local_node: Some(fields.number::<i64>(10, "local_node")?),
        remote_node: tokens[13]
            .rsplit('|')
            .next()
            .and_then(|ns| ns.trim().parse().ok()),
        transmissions: fields.number(8, "transmissions")?,
        restarts: fields.number(12, "restarts")?,
        cache_marker: tokens[0].ends_with("CacheHit"),
        ping_ms: tokens[5].parse().ok(),
    })
}

fn decode_update_success(
    marker: &'static str,
    kind: EventKind,
    tokens: &[&str],
) -> Result<Event, ParseError> {
    let fields = Fields::new(marker, tokens, 9)?;

    Ok(Event {
        kind,
        name: tokens[1].to_string(),
        latency_ms: Some(fields.latency(2)?),
        start_time_raw: Some(fields.time(8)?),
        local_node: Some(fields.number::<i64>(5, "local_node")?),
        remote_node: Some(fields.number::<i64>(4, "name_server")?),
        transmissions: 1,
        restarts: fields.number(7, "restarts")?,
        cache_marker: false,
        ping_ms: None,
    })
}

fn decode_group_change(
    marker: &'static str,
    kind: EventKind,
    tokens: &[&str],
) -> Result<Event, ParseError> {
    let fields = Fields::new(marker, tokens, 4)?;

    Ok(Event {
        kind,
        name: tokens[1].to_string(),
        latency_ms: Some(fields.latency(3)?),
        start_time_raw: None,
        local_node: None,
        remote_node: None,
        transmissions: 0,
        restarts: 0,
        cache_marker: false,
        ping_ms: None,
    })
}

fn decode_lookup_failure(
    marker: &'static str,
    kind: EventKind,
    tokens: &[&str],
) -> Result<Event, ParseError> {
    Fields::new(marker, tokens, 4)?;
    Ok(failure(kind, tokens, 5, 8))
}

fn decode_update_failure(
    marker: &'static str,
    kind: EventKind,
    tokens: &[&str],
) -> Result<Event, ParseError> {
    Fields::new(marker, tokens, 4)?;
    Ok(failure(kind, tokens, 2, 4))
}

fn failure(kind: EventKind, tokens: &[&str], latency_at: usize, server_at: usize) -> Event {
    let latency_ms = tokens
        .get(latency_at)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| *v >= 0.0 && v.is_finite());

    Event {
        kind,
        name: tokens[3].to_string(),
        latency_ms,
        start_time_raw: None,
        local_node: None,
        remote_node: tokens.get(server_at).and_then(|v| v.parse().ok()),
        transmissions: 0,
        restarts: 0,
        cache_marker: false,
        ping_ms: None,
    }
}

/// Positional field access with arity checked up front
struct Fields<'a> {
    marker: &'static str,
    tokens: &'a [&'a str],
}

impl<'a> Fields<'a> {
    fn new(marker: &'static str, tokens: &'a [&'a str], arity: usize) -> Result<Self, ParseError> {
        if tokens.len() < arity {
            return Err(ParseError::MissingField {
                marker,
                arity,
                found: tokens.len(),
            });
        }
        Ok(Self { marker, tokens })
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, ParseError> {
        let value = self.tokens[index];
        value.parse().map_err(|_| ParseError::InvalidNumber {
            marker: self.marker,
            field,
            value: value.to_string(),
        })
    }

    /// Float field that must be finite
    fn finite(&self, index: usize, field: &'static str) -> Result<f64, ParseError> {
        let value: f64 = self.number(index, field)?;
        if !value.is_finite() {
            return Err(ParseError::InvalidNumber {
                marker: self.marker,
                field,
                value: self.tokens[index].to_string(),
            });
        }
        Ok(value)
    }

    /// Absolute request start time
    fn time(&self, index: usize) -> Result<f64, ParseError> {
        self.finite(index, "start_time")
    }

    /// Latency of a completed request; must be a finite non-negative number
    fn latency(&self, index: usize) -> Result<f64, ParseError> {
        let value = self.finite(index, "latency")?;
        if value < 0.0 {
            return Err(ParseError::NegativeLatency {
                marker: self.marker,
                value,
            });
        }
        Ok(value)
    }
}
