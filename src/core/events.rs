//! Lifecycle event emission for bulkhead executions.
//!
//! Events are delivered to an injected [`EventSink`] with best-effort
//! semantics: a sink that errors or panics is logged and ignored, and never
//! changes the outcome of the execution that emitted the event.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::pool::PoolStats;
use crate::util::clock::now_ms;

/// A lifecycle notification emitted while executing work through a bulkhead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BulkheadEvent {
    /// A slot was acquired and the protected work is about to run.
    Acquired {
        /// Name of the emitting bulkhead.
        bulkhead: String,
        /// Pool snapshot taken at emission.
        stats: PoolStats,
        /// Wall-clock timestamp, milliseconds since epoch.
        at_ms: u64,
    },
    /// The protected work returned successfully.
    Completed {
        /// Name of the emitting bulkhead.
        bulkhead: String,
        /// Pool snapshot taken at emission.
        stats: PoolStats,
        /// Time spent executing the work.
        elapsed: Duration,
        /// Wall-clock timestamp, milliseconds since epoch.
        at_ms: u64,
    },
    /// The protected work failed; the original error is re-raised to the
    /// caller after this event.
    Failed {
        /// Name of the emitting bulkhead.
        bulkhead: String,
        /// Pool snapshot taken at emission.
        stats: PoolStats,
        /// Time spent executing the work.
        elapsed: Duration,
        /// The work's error, rendered for observability.
        error: String,
        /// Wall-clock timestamp, milliseconds since epoch.
        at_ms: u64,
    },
    /// The slot was returned to the pool.
    Released {
        /// Name of the emitting bulkhead.
        bulkhead: String,
        /// Pool snapshot taken at emission.
        stats: PoolStats,
        /// Wall-clock timestamp, milliseconds since epoch.
        at_ms: u64,
    },
}

impl BulkheadEvent {
    /// Build an `Acquired` event stamped with the current wall clock.
    pub fn acquired(bulkhead: impl Into<String>, stats: PoolStats) -> Self {
        Self::Acquired {
            bulkhead: bulkhead.into(),
            stats,
            at_ms: now_ms(),
        }
    }

    /// Build a `Completed` event stamped with the current wall clock.
    pub fn completed(bulkhead: impl Into<String>, stats: PoolStats, elapsed: Duration) -> Self {
        Self::Completed {
            bulkhead: bulkhead.into(),
            stats,
            elapsed,
            at_ms: now_ms(),
        }
    }

    /// Build a `Failed` event stamped with the current wall clock.
    pub fn failed(
        bulkhead: impl Into<String>,
        stats: PoolStats,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self::Failed {
            bulkhead: bulkhead.into(),
            stats,
            elapsed,
            error: error.into(),
            at_ms: now_ms(),
        }
    }

    /// Build a `Released` event stamped with the current wall clock.
    pub fn released(bulkhead: impl Into<String>, stats: PoolStats) -> Self {
        Self::Released {
            bulkhead: bulkhead.into(),
            stats,
            at_ms: now_ms(),
        }
    }

    /// Dotted event kind, e.g. `bulkhead.acquired`.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Acquired { .. } => "bulkhead.acquired",
            Self::Completed { .. } => "bulkhead.completed",
            Self::Failed { .. } => "bulkhead.failed",
            Self::Released { .. } => "bulkhead.released",
        }
    }

    /// Name of the bulkhead that emitted this event.
    pub fn bulkhead(&self) -> &str {
        match self {
            Self::Acquired { bulkhead, .. }
            | Self::Completed { bulkhead, .. }
            | Self::Failed { bulkhead, .. }
            | Self::Released { bulkhead, .. } => bulkhead,
        }
    }
}

/// Sink for bulkhead lifecycle events.
///
/// Implementations may fail; the bulkhead discards sink errors after
/// logging them and never lets them reach the caller.
pub trait EventSink: Send + Sync {
    /// Record a single event.
    fn record(&self, event: &BulkheadEvent) -> anyhow::Result<()>;
}

/// In-memory event sink with a bounded buffer, for tests and development.
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<BulkheadEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink retaining at most `max_events` (oldest dropped first).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Snapshot of the retained events, oldest first.
    pub fn events(&self) -> Vec<BulkheadEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Event kinds in emission order, for compact assertions.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(BulkheadEvent::kind).collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: &BulkheadEvent) -> anyhow::Result<()> {
        if self.max_events == 0 {
            return Ok(());
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_bulkhead_accessors() {
        let event = BulkheadEvent::acquired("db", PoolStats::default());
        assert_eq!(event.kind(), "bulkhead.acquired");
        assert_eq!(event.bulkhead(), "db");

        let event = BulkheadEvent::failed(
            "db",
            PoolStats::default(),
            Duration::from_millis(5),
            "boom",
        );
        assert_eq!(event.kind(), "bulkhead.failed");
    }

    #[test]
    fn in_memory_sink_is_bounded() {
        let sink = InMemoryEventSink::new(2);
        for _ in 0..3 {
            sink.record(&BulkheadEvent::released("x", PoolStats::default()))
                .unwrap();
        }
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn zero_capacity_sink_retains_nothing() {
        let sink = InMemoryEventSink::new(0);
        sink.record(&BulkheadEvent::released("x", PoolStats::default()))
            .unwrap();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let event = BulkheadEvent::completed("db", PoolStats::default(), Duration::from_secs(1));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"completed\""));
        assert!(json.contains("\"bulkhead\":\"db\""));
    }
}
