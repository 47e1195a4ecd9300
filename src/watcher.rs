//! Single-path filesystem watching.
//!
//! ```text
//! WatchSource ──events──┐
//!                       ├─> Dispatcher ──> LogSink
//! WatchSource ──errors──┘        │
//!                                └─ DoneGuard ─> WaitGroup ─> WatcherService::run returns
//! ```

pub mod dispatch;
pub mod event;
pub mod service;
pub mod sink;
pub mod source;

pub use dispatch::{DispatchReport, DispatchState, Dispatcher, StopReason};
pub use event::{ChangeKind, FsError, FsEvent, Record, RecordKind};
pub use service::{StopHandle, WatcherService};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use source::{ChannelFeed, ChannelSource, NotifySource, WatchSource, WatchStreams};
