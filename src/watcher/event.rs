use notify::EventKind;
use notify::event::ModifyKind;
use std::fmt;
use std::path::PathBuf;

/// What happened to the watched paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Write,
    Remove,
    Rename,
    Chmod,
    Other,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "CREATE",
            ChangeKind::Write => "WRITE",
            ChangeKind::Remove => "REMOVE",
            ChangeKind::Rename => "RENAME",
            ChangeKind::Chmod => "CHMOD",
            ChangeKind::Other => "OTHER",
        }
    }
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => ChangeKind::Create,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
            EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Chmod,
            EventKind::Modify(_) => ChangeKind::Write,
            EventKind::Remove(_) => ChangeKind::Remove,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => ChangeKind::Other,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filesystem change reported by a watch source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: ChangeKind,
    pub paths: Vec<PathBuf>,
    /// The backend dropped events and the watched path has to be rescanned.
    pub needs_rescan: bool,
}

impl FsEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            paths: vec![path.into()],
            needs_rescan: false,
        }
    }
}

impl From<notify::Event> for FsEvent {
    fn from(event: notify::Event) -> Self {
        Self {
            kind: ChangeKind::from(&event.kind),
            needs_rescan: event.need_rescan(),
            paths: event.paths,
        }
    }
}

impl fmt::Display for FsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (i, path) in self.paths.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{:?}", path.display().to_string())?;
        }
        if self.needs_rescan {
            f.write_str(" (events lost, rescan needed)")?;
        }
        Ok(())
    }
}

/// A failure reported by a watch source while it is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsError {
    pub message: String,
    pub paths: Vec<PathBuf>,
}

impl FsError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            paths: Vec::new(),
        }
    }
}

impl From<notify::Error> for FsError {
    fn from(error: notify::Error) -> Self {
        let message = match &error.kind {
            notify::ErrorKind::Generic(msg) => msg.clone(),
            notify::ErrorKind::Io(err) => err.to_string(),
            other => format!("{other:?}"),
        };

        Self {
            message,
            paths: error.paths,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.paths.is_empty() {
            let paths: Vec<_> = self.paths.iter().map(|p| p.display().to_string()).collect();
            write!(f, " ({})", paths.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FsError {}

/// Tag carried by every sink record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Event,
    Error,
}

/// One item handed to a [`LogSink`](super::sink::LogSink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Event(FsEvent),
    Error(FsError),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Event(_) => RecordKind::Event,
            Record::Error(_) => RecordKind::Error,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Event(event) => write!(f, "event: {event}"),
            Record::Error(error) => write!(f, "error: {error}"),
        }
    }
}
