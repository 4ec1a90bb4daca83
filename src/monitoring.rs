//! Counters emitted by the store and relay paths

use std::fmt;
use std::sync::Mutex;

/// Monitored occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A C-STORE request was received
    CStoreRequest,
    /// Payload bytes of a successful C-STORE
    CStoreBytes,
    /// A C-STORE ended in a failure status
    CStoreError,
    /// Bytes moved by one relay
    RelayBytes,
    /// A relay failed
    RelayError,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CStoreRequest => "cstore_requests",
            Event::CStoreBytes => "cstore_bytes",
            Event::CStoreError => "cstore_errors",
            Event::RelayBytes => "relay_bytes",
            Event::RelayError => "relay_errors",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sink for monitoring events. `value` is `None` for plain occurrences.
pub trait MonitoringService: Send + Sync {
    fn add_event(&self, event: Event, value: Option<u64>);
}

/// Emits every event as a `tracing` record under the `monitoring` target
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMonitor;

impl MonitoringService for LogMonitor {
    fn add_event(&self, event: Event, value: Option<u64>) {
        match value {
            Some(value) => tracing::info!(target: "monitoring", event = %event, value),
            None => tracing::info!(target: "monitoring", event = %event),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl MonitoringService for NoopMonitor {
    fn add_event(&self, _event: Event, _value: Option<u64>) {}
}

/// Keeps every event in memory, for inspection by callers
#[derive(Debug, Default)]
pub struct InMemoryMonitor {
    events: Mutex<Vec<(Event, Option<u64>)>>,
}

impl InMemoryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Event, Option<u64>)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of recorded occurrences of `event`
    pub fn count(&self, event: Event) -> usize {
        self.events().iter().filter(|(e, _)| *e == event).count()
    }

    /// Values recorded for `event`, in arrival order
    pub fn values(&self, event: Event) -> Vec<u64> {
        self.events()
            .iter()
            .filter(|(e, _)| *e == event)
            .filter_map(|(_, v)| *v)
            .collect()
    }
}

impl MonitoringService for InMemoryMonitor {
    fn add_event(&self, event: Event, value: Option<u64>) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((event, value));
    }
}
