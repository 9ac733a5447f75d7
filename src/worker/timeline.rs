//! Per-host timestamp normalization
//!
//! Hosts log with unsynchronized clocks, so absolute start times are only
//! comparable within one host. A [`HostTimeline`] takes the start time of
//! the host's first timestamped success as its baseline and reports every
//! event relative to it. This makes intra-host timing meaningful; it does
//! not synchronize clocks across hosts.
//!
//! Records without their own start time (failures, group changes) are
//! placed at the most recent start time seen on the host. Records that
//! arrive before the baseline exists are held back and placed at zero once
//! it is known. If a host never logs a timestamped success its events stay
//! at zero and are flagged as unanchored.

use crate::event::Event;

/// An event with its host-relative time
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub event: Event,
    /// Milliseconds since the host's baseline
    pub start_ms: f64,
    /// False if the host never established a baseline
    pub anchored: bool,
}

impl TimedEvent {
    /// Completion time relative to the baseline
    pub fn end_ms(&self) -> f64 {
        match self.event.latency_ms {
            Some(latency) if self.event.is_success() => self.start_ms + latency,
            _ => self.start_ms,
        }
    }
}

/// Chronological event sequence of one host
#[derive(Debug, Default)]
pub struct HostTimeline {
    baseline: Option<f64>,
    cursor: Option<f64>,
    pending: Vec<Event>,
    events: Vec<TimedEvent>,
}

impl HostTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw start time chosen as this host's zero point
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Append the next event in shard order
    pub fn push(&mut self, event: Event) {
        if self.baseline.is_none() {
            match event.start_time_raw {
                Some(raw) if event.is_success() => {
                    self.baseline = Some(raw);
                    self.flush_pending();
                }
                _ => {
                    self.pending.push(event);
                    return;
                }
            }
        }

        let baseline = self.baseline.unwrap_or_default();
        if let Some(raw) = event.start_time_raw {
            self.cursor = Some(raw);
        }
        let raw = event.start_time_raw.or(self.cursor).unwrap_or(baseline);

        self.events.push(TimedEvent {
            event,
            start_ms: raw - baseline,
            anchored: true,
        });
    }

    /// Events held back before the baseline sit at the baseline itself
    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.events.extend(pending.into_iter().map(|event| TimedEvent {
            event,
            start_ms: 0.0,
            anchored: true,
        }));
    }

    /// Number of events pushed so far
    pub fn len(&self) -> usize {
        self.events.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finish the host and return its normalized events in order
    pub fn finish(mut self) -> Vec<TimedEvent> {
        let pending = std::mem::take(&mut self.pending);
        self.events.extend(pending.into_iter().map(|event| TimedEvent {
            event,
            start_ms: 0.0,
            anchored: false,
        }));
        self.events
    }
}
