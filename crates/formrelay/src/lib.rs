//! `formrelay` - Relay web form submissions into a JSON record file
//!
//! This library provides an HTTP front end that forwards raw form bodies over
//! a loopback datagram relay to a single ingest loop, which parses them and
//! persists every submission into one JSON document keyed by timestamp.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod form;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod record;
pub mod relay;
pub mod shutdown;
pub mod storage;
pub mod web;

// Platform-specific support using conditional compilation
#[cfg(target_os = "linux")]
pub use formrelay_linux as platform;

#[cfg(target_os = "macos")]
pub use formrelay_mac as platform;

pub use config::Config;
pub use daemon::{serve, Daemon};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Record, RecordStore};
pub use relay::{Datagram, PayloadSink, RelayReceiver, RelaySender};
pub use shutdown::ShutdownHandle;
pub use storage::{Storage, StorageStats};
