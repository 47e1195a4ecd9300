//! # lilnas_core
//!
//! Watches a single filesystem path and reports every change notification and
//! watch error to a log sink until it is told to stop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lilnas_core::watcher::{NotifySource, TracingSink, WatcherService};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! lilnas_core::logging::init();
//!
//! let service = WatcherService::new(NotifySource::new(), TracingSink);
//! let stop = service.stop_handle();
//!
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     stop.stop();
//! });
//!
//! let report = service.run("/srv/share").await?;
//! println!("{} events, {} errors", report.events, report.errors);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`signal`]**: [`WaitGroup`](signal::WaitGroup), the completion signal a
//!   run waits on, and its drop guard
//! - **[`watcher`]**: watch sources, the dispatcher that fans their event and
//!   error streams into a sink, and the service tying them together
//! - **[`config`]**: layered settings (defaults, TOML, `LILNAS_` environment)
//! - **[`logging`]**: `tracing` subscriber setup
//! - **[`error`]**: the crate error type
//!
//! ## Lifecycle of a run
//!
//! [`WatcherService::run`](watcher::WatcherService::run) registers one unit of
//! work on a fresh `WaitGroup`, starts the source, spawns the dispatcher and
//! waits. The dispatcher releases the unit when both streams have closed or the
//! stop handle fired, on every exit path including a panicking sink, so the wait
//! cannot outlive the dispatcher. Startup failures are returned before a
//! dispatcher exists.

pub mod config;
pub mod error;
pub mod logging;
pub mod signal;
pub mod watcher;

/// Re-exports the most commonly used types for convenience.
pub use error::{WatchError, WatchResult};
pub use watcher::service::run;
