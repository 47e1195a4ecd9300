use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch path does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("cannot watch {}: {reason}", path.display())]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("watch source already started")]
    AlreadyStarted,

    #[error("dispatcher task failed: {reason}")]
    DispatcherPanicked { reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

pub type WatchResult<T> = Result<T, WatchError>;
