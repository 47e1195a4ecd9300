use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::error::{WatchError, WatchResult};
use crate::watcher::event::{FsError, FsEvent};

/// The two streams a started source produces.
///
/// Each stream is closed independently by its producer; the receiver observes the
/// closure as `None`.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: UnboundedReceiver<FsEvent>,
    pub errors: UnboundedReceiver<FsError>,
}

/// Something that observes a path and reports changes on a pair of streams.
pub trait WatchSource {
    /// Starts watching `path`. Failures here are fatal to the run.
    fn start(&mut self, path: &Path) -> WatchResult<WatchStreams>;

    /// Tears the watch down. Both streams close once the producer side is gone.
    fn stop(&mut self);
}

/// Watch source backed by the platform's recommended `notify` backend.
///
/// Only the given path itself is watched (non-recursive).
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

impl WatchSource for NotifySource {
    fn start(&mut self, path: &Path) -> WatchResult<WatchStreams> {
        if self.watcher.is_some() {
            return Err(WatchError::AlreadyStarted);
        }

        if !path.exists() {
            return Err(WatchError::PathNotFound {
                path: path.to_path_buf(),
            });
        }

        let (event_tx, events) = unbounded_channel();
        let (error_tx, errors) = unbounded_channel();

        // The senders live inside the handler, so dropping the watcher closes both streams.
        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let _ = event_tx.send(FsEvent::from(event));
                }
                Err(error) => {
                    let _ = error_tx.send(FsError::from(error));
                }
            },
        )?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        crate::watch_event!(DEBUG, "source", "registered", "{}", path.display());
        self.watcher = Some(watcher);

        Ok(WatchStreams { events, errors })
    }

    fn stop(&mut self) {
        if self.watcher.take().is_some() {
            crate::watch_event!(DEBUG, "source", "notify watcher dropped");
        }
    }
}

/// Source whose streams are fed by the caller through a [`ChannelFeed`].
///
/// Useful for embedding the dispatcher behind a producer other than `notify`,
/// and for driving runs deterministically in tests.
#[derive(Debug)]
pub struct ChannelSource {
    streams: Option<WatchStreams>,
}

/// Producer half of a [`ChannelSource`].
#[derive(Debug)]
pub struct ChannelFeed {
    events: Option<UnboundedSender<FsEvent>>,
    errors: Option<UnboundedSender<FsError>>,
}

impl ChannelSource {
    pub fn new() -> (Self, ChannelFeed) {
        let (event_tx, events) = unbounded_channel();
        let (error_tx, errors) = unbounded_channel();

        (
            Self {
                streams: Some(WatchStreams { events, errors }),
            },
            ChannelFeed {
                events: Some(event_tx),
                errors: Some(error_tx),
            },
        )
    }
}

impl WatchSource for ChannelSource {
    fn start(&mut self, _path: &Path) -> WatchResult<WatchStreams> {
        self.streams.take().ok_or(WatchError::AlreadyStarted)
    }

    // Closure is driven by the feed.
    fn stop(&mut self) {}
}

impl ChannelFeed {
    /// Queues an event. Returns `false` if the event stream is closed or nobody is listening.
    pub fn event(&self, event: FsEvent) -> bool {
        self.events.as_ref().is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Queues an error. Returns `false` if the error stream is closed or nobody is listening.
    pub fn error(&self, error: FsError) -> bool {
        self.errors.as_ref().is_some_and(|tx| tx.send(error).is_ok())
    }

    pub fn close_events(&mut self) {
        self.events.take();
    }

    pub fn close_errors(&mut self) {
        self.errors.take();
    }

    pub fn close(&mut self) {
        self.close_events();
        self.close_errors();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::event::ChangeKind;
    use tempfile::TempDir;

    #[test]
    fn notify_source_rejects_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let mut source = NotifySource::new();
        let err = source.start(&missing).unwrap_err();

        assert!(matches!(err, WatchError::PathNotFound { path } if path == missing));
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn notify_source_refuses_second_start() {
        let dir = TempDir::new().unwrap();
        let mut source = NotifySource::new();

        let _streams = source.start(dir.path()).unwrap();
        assert!(matches!(
            source.start(dir.path()),
            Err(WatchError::AlreadyStarted)
        ));

        source.stop();
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn channel_feed_closes_streams_independently() {
        let (mut source, mut feed) = ChannelSource::new();
        let mut streams = source.start(Path::new("/unused")).unwrap();

        assert!(feed.event(FsEvent::new(ChangeKind::Create, "/x")));
        feed.close_events();
        assert!(!feed.event(FsEvent::new(ChangeKind::Write, "/x")));

        assert_eq!(
            streams.events.recv().await,
            Some(FsEvent::new(ChangeKind::Create, "/x"))
        );
        assert_eq!(streams.events.recv().await, None);

        assert!(feed.error(FsError::new("EPERM")));
        assert_eq!(streams.errors.recv().await, Some(FsError::new("EPERM")));
    }

    #[test]
    fn channel_source_hands_out_streams_once() {
        let (mut source, _feed) = ChannelSource::new();
        assert!(source.start(Path::new("/unused")).is_ok());
        assert!(matches!(
            source.start(Path::new("/unused")),
            Err(WatchError::AlreadyStarted)
        ));
    }
}
