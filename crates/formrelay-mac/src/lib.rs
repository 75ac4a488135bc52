//! macOS-specific implementation for formrelay.
//!
//! This crate provides macOS-specific functionality for the formrelay project,
//! currently launching URLs through Launch Services.

#![cfg(target_os = "macos")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::process::{Command, Stdio};

/// Launch Services command used to open URLs.
pub const OPENER: &str = "open";

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    "macOS"
}

/// Open a URL in the user's default browser.
///
/// # Errors
///
/// Returns an error if `open` cannot be run or reports a failure.
pub fn open_url(url: &str) -> io::Result<()> {
    tracing::debug!("Opening {} with {}", url, OPENER);
    let status = Command::new(OPENER)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("{OPENER} exited with {status}")))
    }
}
