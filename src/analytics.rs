use serde::{Deserialize, Serialize};

use crate::storage::{LocalStore, MemoryStore, StorageError, KEY_ANALYTICS_EVENTS};

/// The five user decisions the ledger counts.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventKind {
    Accept,
    Edit,
    Response,
    Ignore,
    Resolve,
}

impl AnalyticsEventKind {
    pub const ALL: [AnalyticsEventKind; 5] = [
        AnalyticsEventKind::Accept,
        AnalyticsEventKind::Edit,
        AnalyticsEventKind::Response,
        AnalyticsEventKind::Ignore,
        AnalyticsEventKind::Resolve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEventKind::Accept => "accept",
            AnalyticsEventKind::Edit => "edit",
            AnalyticsEventKind::Response => "response",
            AnalyticsEventKind::Ignore => "ignore",
            AnalyticsEventKind::Resolve => "resolve",
        }
    }
}

/// One recorded decision. Append-only; never mutated after insertion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub kind: AnalyticsEventKind,
    pub task_id: String,
    pub timestamp: i64,
}

/// Aggregate over the whole unbounded history.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventCounts {
    pub accept: u64,
    pub edit: u64,
    pub response: u64,
    pub ignore: u64,
    pub resolve: u64,
}

impl EventCounts {
    /// Fold a history into per-kind totals.
    pub fn from_events(events: &[AnalyticsEvent]) -> Self {
        let mut counts = EventCounts::default();
        for event in events {
            counts.bump(event.kind);
        }
        counts
    }

    pub fn get(&self, kind: AnalyticsEventKind) -> u64 {
        match kind {
            AnalyticsEventKind::Accept => self.accept,
            AnalyticsEventKind::Edit => self.edit,
            AnalyticsEventKind::Response => self.response,
            AnalyticsEventKind::Ignore => self.ignore,
            AnalyticsEventKind::Resolve => self.resolve,
        }
    }

    pub fn total(&self) -> u64 {
        self.accept + self.edit + self.response + self.ignore + self.resolve
    }

    fn bump(&mut self, kind: AnalyticsEventKind) {
        match kind {
            AnalyticsEventKind::Accept => self.accept += 1,
            AnalyticsEventKind::Edit => self.edit += 1,
            AnalyticsEventKind::Response => self.response += 1,
            AnalyticsEventKind::Ignore => self.ignore += 1,
            AnalyticsEventKind::Resolve => self.resolve += 1,
        }
    }
}

/// Narrow backend contract so a remote-telemetry sink can replace the local
/// store without touching call sites.
pub trait AnalyticsBackend {
    fn save_event(&mut self, event: &AnalyticsEvent) -> Result<(), StorageError>;
    fn load_events(&self) -> Result<Vec<AnalyticsEvent>, StorageError>;
    fn clear_events(&mut self) -> Result<(), StorageError>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    events: Vec<AnalyticsEvent>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalyticsBackend for MemoryBackend {
    fn save_event(&mut self, event: &AnalyticsEvent) -> Result<(), StorageError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn load_events(&self) -> Result<Vec<AnalyticsEvent>, StorageError> {
        Ok(self.events.clone())
    }

    fn clear_events(&mut self) -> Result<(), StorageError> {
        self.events.clear();
        Ok(())
    }
}

/// Default backend: the whole history lives as one JSON array under a single
/// local-store key, rewritten on every append. A value that fails to parse is
/// treated as an empty history rather than an error.
pub struct StoreBackend<S: LocalStore> {
    store: S,
}

impl<S: LocalStore> StoreBackend<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn read_events(&self) -> Result<Vec<AnalyticsEvent>, StorageError> {
        let raw = match self.store.get(KEY_ANALYTICS_EVENTS)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        match serde_json::from_str(&raw) {
            Ok(events) => Ok(events),
            Err(err) => {
                tracing::warn!(error = %err, "analytics history unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }
}

impl<S: LocalStore> AnalyticsBackend for StoreBackend<S> {
    fn save_event(&mut self, event: &AnalyticsEvent) -> Result<(), StorageError> {
        let mut events = self.read_events()?;
        events.push(event.clone());
        let serialized = serde_json::to_string(&events)?;
        self.store.set(KEY_ANALYTICS_EVENTS, &serialized)
    }

    fn load_events(&self) -> Result<Vec<AnalyticsEvent>, StorageError> {
        self.read_events()
    }

    fn clear_events(&mut self) -> Result<(), StorageError> {
        self.store.remove(KEY_ANALYTICS_EVENTS)
    }
}

/// Ledger facade. Storage failures never propagate past this boundary: a
/// failed append is a logged no-op and failed reads return empty defaults.
pub struct AnalyticsLedger {
    backend: Box<dyn AnalyticsBackend>,
}

impl AnalyticsLedger {
    pub fn new(backend: Box<dyn AnalyticsBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    pub fn over_store<S: LocalStore + 'static>(store: S) -> Self {
        Self::new(Box::new(StoreBackend::new(store)))
    }

    /// Append one event stamped with the current wall-clock time.
    pub fn record(&mut self, kind: AnalyticsEventKind, task_id: &str) {
        let event = AnalyticsEvent {
            kind,
            task_id: task_id.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        if let Err(err) = self.backend.save_event(&event) {
            tracing::warn!(kind = kind.as_str(), error = %err, "dropping analytics event");
        }
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        match self.backend.load_events() {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(error = %err, "analytics history unavailable");
                Vec::new()
            }
        }
    }

    pub fn event_counts(&self) -> EventCounts {
        EventCounts::from_events(&self.events())
    }

    /// Full irreversible wipe.
    pub fn clear(&mut self) {
        if let Err(err) = self.backend.clear_events() {
            tracing::warn!(error = %err, "analytics clear failed");
        }
    }
}
