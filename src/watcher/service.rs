use std::path::Path;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::{WatchError, WatchResult},
    signal::WaitGroup,
    watcher::{
        dispatch::{DispatchReport, Dispatcher, StopReason},
        sink::{LogSink, TracingSink},
        source::{NotifySource, WatchSource},
    },
};

/// Cloneable handle that ends a running [`WatcherService`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Watches one path with a source and dispatches everything it reports to a sink.
pub struct WatcherService<W, S> {
    source: W,
    sink: S,
    cancel: CancellationToken,
}

impl<W: WatchSource, S: LogSink> WatcherService<W, S> {
    pub fn new(source: W, sink: S) -> Self {
        WatcherService {
            source,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Handle for stopping the run. Stopping before `run` makes the run end as
    /// soon as it has started.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.cancel.clone(),
        }
    }

    /// Starts the source on `path`, dispatches until the run ends, then tears the
    /// source down.
    ///
    /// Startup failures are returned before any dispatcher exists. The run ends
    /// when the source closes both streams or the stop handle fires.
    pub async fn run(self, path: impl AsRef<Path>) -> WatchResult<DispatchReport> {
        let path = path.as_ref();
        let span = tracing::info_span!("watch", run = %Uuid::new_v4(), path = %path.display());

        self.run_inner(path).instrument(span).await
    }

    async fn run_inner(mut self, path: &Path) -> WatchResult<DispatchReport> {
        let pending = WaitGroup::new();
        pending.add(1);
        let done = pending.guard();

        // On failure the guard is dropped here, releasing the unit again.
        let streams = self.source.start(path).inspect_err(|e| {
            crate::watch_event!(ERROR, "service", "failed to start", "{e}");
        })?;

        crate::watch_event!(INFO, "service", "started", "{}", path.display());

        let dispatcher = Dispatcher::new(streams, self.sink, self.cancel.clone());
        let task = tokio::spawn(dispatcher.run(done).in_current_span());

        pending.wait().await;
        self.source.stop();

        let report = task.await.map_err(|e| WatchError::DispatcherPanicked {
            reason: join_failure(e),
        })?;

        match report.reason {
            StopReason::Cancelled => crate::watch_event!(
                INFO,
                "service",
                "stopped",
                "{} events, {} errors",
                report.events,
                report.errors
            ),
            StopReason::SourceClosed => crate::watch_event!(
                WARN,
                "service",
                "source closed its streams",
                "{} events, {} errors",
                report.events,
                report.errors
            ),
        }

        Ok(report)
    }
}

fn join_failure(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }

    let payload = error.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "dispatcher panicked".to_string()
    }
}

/// Watches `path` with `notify`, logging through `tracing`, until Ctrl-C.
pub async fn run(path: impl AsRef<Path>) -> WatchResult<DispatchReport> {
    let service = WatcherService::new(NotifySource::new(), TracingSink);
    let stop = service.stop_handle();

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            crate::watch_event!(DEBUG, "service", "interrupt received");
            stop.stop();
        }
    });

    let result = service.run(path).await;
    interrupt.abort();
    result
}
