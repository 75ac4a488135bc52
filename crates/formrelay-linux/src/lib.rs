//! Linux-specific implementation for formrelay
//!
//! This crate provides Linux-specific functionality for the formrelay project.

#![cfg(target_os = "linux")]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::process::{Command, Stdio};

/// Desktop opener used to launch URLs.
pub const OPENER: &str = "xdg-open";

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// Open a URL in the user's default browser.
///
/// The opener runs in the background; this returns as soon as it has been
/// started.
///
/// # Errors
///
/// Returns an error if the opener cannot be started.
pub fn open_url(url: &str) -> io::Result<()> {
    let mut child = Command::new(OPENER)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    tracing::debug!("Started {} for {}", OPENER, url);

    std::thread::spawn(move || {
        if let Ok(status) = child.wait() {
            if !status.success() {
                tracing::warn!("{} exited with {}", OPENER, status);
            }
        }
    });
    Ok(())
}
