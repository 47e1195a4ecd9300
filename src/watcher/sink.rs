use std::sync::{Arc, Mutex};

use crate::watcher::event::Record;

/// Destination for dispatched records.
///
/// Writes are fire-and-forget: the dispatcher never waits on an acknowledgement,
/// and a failing sink is expected to deal with the failure itself.
pub trait LogSink: Send + 'static {
    fn record(&mut self, record: Record);
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn record(&mut self, record: Record) {
        (**self).record(record)
    }
}

/// Writes every record through `tracing` under [`WATCH_TARGET`](crate::logging::WATCH_TARGET):
/// events at `info`, errors at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&mut self, record: Record) {
        match record {
            Record::Event(event) => crate::watch_event!(INFO, "sink", "event", "{event}"),
            Record::Error(error) => crate::watch_event!(ERROR, "sink", "error", "{error}"),
        }
    }
}

/// Keeps records in memory, in arrival order.
///
/// Clones share the same buffer, so one clone can be handed to a dispatcher while
/// another is used to read what was recorded.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn record(&mut self, record: Record) {
        self.lock().push(record);
    }
}
