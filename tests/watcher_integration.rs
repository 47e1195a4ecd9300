use lilnas_core::error::WatchError;
use lilnas_core::watcher::{
    ChangeKind, ChannelSource, FsError, FsEvent, LogSink, MemorySink, NotifySource, Record,
    StopReason, WatcherService,
};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

struct PanickingSink;

impl LogSink for PanickingSink {
    fn record(&mut self, record: Record) {
        panic!("sink rejected {record}");
    }
}

#[tokio::test]
async fn run_reports_source_closure() -> Result<(), WatchError> {
    let (source, mut feed) = ChannelSource::new();
    let sink = MemorySink::new();

    feed.event(FsEvent::new(ChangeKind::Create, "/x"));
    feed.event(FsEvent::new(ChangeKind::Write, "/x"));
    feed.error(FsError::new("EPERM"));
    feed.close();

    let report = WatcherService::new(source, sink.clone()).run("/x").await?;

    assert_eq!(report.events, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(report.reason, StopReason::SourceClosed);
    assert_eq!(sink.len(), 3);
    Ok(())
}

#[tokio::test]
async fn stop_handle_ends_a_run_with_open_streams() -> Result<(), WatchError> {
    let (source, feed) = ChannelSource::new();
    let sink = MemorySink::new();

    let service = WatcherService::new(source, sink.clone());
    let stop = service.stop_handle();
    let run = tokio::spawn(service.run("/x"));

    feed.event(FsEvent::new(ChangeKind::Remove, "/x"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.stop();

    let report = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("stopped run did not finish")
        .unwrap()?;

    assert!(stop.is_stopped());
    assert_eq!(report.reason, StopReason::Cancelled);
    assert_eq!(
        sink.records(),
        vec![Record::Event(FsEvent::new(ChangeKind::Remove, "/x"))]
    );
    Ok(())
}

#[tokio::test]
async fn panicking_sink_still_releases_the_wait() {
    let (source, feed) = ChannelSource::new();
    feed.event(FsEvent::new(ChangeKind::Create, "/x"));

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        WatcherService::new(source, PanickingSink).run("/x"),
    )
    .await
    .expect("run hung after the dispatcher panicked");

    match result {
        Err(WatchError::DispatcherPanicked { reason }) => {
            assert!(reason.contains("sink rejected"), "{reason}");
        }
        other => panic!("expected a dispatcher failure, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_path_fails_before_dispatch() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("not-there");
    let sink = MemorySink::new();

    let err = WatcherService::new(NotifySource::new(), sink.clone())
        .run(&missing)
        .await
        .unwrap_err();

    assert!(matches!(err, WatchError::PathNotFound { .. }));
    assert!(sink.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn notify_source_reports_file_creation() -> Result<(), WatchError> {
    let dir = TempDir::new()?;
    let sink = MemorySink::new();

    let service = WatcherService::new(NotifySource::new(), sink.clone());
    let stop = service.stop_handle();
    let watched = dir.path().to_path_buf();
    let run = tokio::spawn(async move { service.run(&watched).await });

    // Give the watch time to register.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let file = dir.path().join("new-file.txt");
    fs::write(&file, "hello")?;

    let mut created = false;
    for _ in 0..40 {
        created = sink.records().iter().any(|r| match r {
            Record::Event(e) => {
                e.kind == ChangeKind::Create
                    && e.paths.iter().any(|p| p.file_name() == file.file_name())
            }
            Record::Error(_) => false,
        });
        if created {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    stop.stop();
    let report = run.await.unwrap()?;

    assert!(created, "creation was not recorded: {:?}", sink.records());
    assert_eq!(report.reason, StopReason::Cancelled);
    assert!(report.events >= 1);
    Ok(())
}
