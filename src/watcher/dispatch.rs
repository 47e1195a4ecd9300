//! Fan-in of a source's event and error streams into a single log sink.
//!
//! The dispatcher selects over three inputs with no fixed priority between the
//! two streams:
//!
//! - the event stream, forwarded as [`Record::Event`]
//! - the error stream, forwarded as [`Record::Error`]
//! - a cancellation token, the explicit stop signal
//!
//! A stream that reports closure is dropped from the select so the loop never
//! spins on it. The loop ends when both streams are closed or the token fires,
//! and the [`DoneGuard`] it owns releases the caller's wait on every exit path.

use tokio_util::sync::CancellationToken;

use crate::signal::DoneGuard;
use crate::watcher::event::{Record, RecordKind};
use crate::watcher::sink::LogSink;
use crate::watcher::source::WatchStreams;

/// Which streams are still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Running,
    EventsClosed,
    ErrorsClosed,
    Done,
}

impl DispatchState {
    pub fn close_events(self) -> Self {
        match self {
            DispatchState::Running => DispatchState::EventsClosed,
            DispatchState::ErrorsClosed => DispatchState::Done,
            state => state,
        }
    }

    pub fn close_errors(self) -> Self {
        match self {
            DispatchState::Running => DispatchState::ErrorsClosed,
            DispatchState::EventsClosed => DispatchState::Done,
            state => state,
        }
    }

    pub fn events_open(&self) -> bool {
        matches!(self, DispatchState::Running | DispatchState::ErrorsClosed)
    }

    pub fn errors_open(&self) -> bool {
        matches!(self, DispatchState::Running | DispatchState::EventsClosed)
    }

    pub fn is_done(&self) -> bool {
        *self == DispatchState::Done
    }
}

/// Why a dispatcher run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source closed both streams without being asked to stop.
    SourceClosed,
    /// The run was cancelled through its token.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub events: usize,
    pub errors: usize,
    pub reason: StopReason,
}

pub struct Dispatcher<S> {
    streams: WatchStreams,
    sink: S,
    cancel: CancellationToken,
    events: usize,
    errors: usize,
}

impl<S: LogSink> Dispatcher<S> {
    pub fn new(streams: WatchStreams, sink: S, cancel: CancellationToken) -> Self {
        Self {
            streams,
            sink,
            cancel,
            events: 0,
            errors: 0,
        }
    }

    /// Runs the loop to completion.
    ///
    /// `done` must stand for a unit the caller registered before starting the
    /// dispatcher. It is released when this future finishes or unwinds, and also
    /// if the future is dropped before completion.
    pub async fn run(mut self, done: DoneGuard) -> DispatchReport {
        let _done = done;
        let mut state = DispatchState::Running;

        let reason = loop {
            if state.is_done() {
                break StopReason::SourceClosed;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.drain(state);
                    break StopReason::Cancelled;
                }
                item = self.streams.events.recv(), if state.events_open() => match item {
                    Some(event) => self.forward(Record::Event(event)),
                    None => {
                        state = state.close_events();
                        crate::watch_event!(DEBUG, "dispatch", "event stream closed", "{state:?}");
                    }
                },
                item = self.streams.errors.recv(), if state.errors_open() => match item {
                    Some(error) => self.forward(Record::Error(error)),
                    None => {
                        state = state.close_errors();
                        crate::watch_event!(DEBUG, "dispatch", "error stream closed", "{state:?}");
                    }
                },
            }
        };

        DispatchReport {
            events: self.events,
            errors: self.errors,
            reason,
        }
    }

    /// Records whatever is already queued on the open streams, without waiting.
    fn drain(&mut self, state: DispatchState) {
        if state.events_open() {
            while let Ok(event) = self.streams.events.try_recv() {
                self.forward(Record::Event(event));
            }
        }

        if state.errors_open() {
            while let Ok(error) = self.streams.errors.try_recv() {
                self.forward(Record::Error(error));
            }
        }
    }

    fn forward(&mut self, record: Record) {
        match record.kind() {
            RecordKind::Event => self.events += 1,
            RecordKind::Error => self.errors += 1,
        }
        self.sink.record(record);
    }
}
