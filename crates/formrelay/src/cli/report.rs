//! Output of the inspection commands.
//!
//! Each command writes to a caller-supplied sink so the binary can pass
//! stdout and tests can pass a buffer.

use std::io::Write;
use std::net::SocketAddr;

use crate::config::Config;
use crate::error::Result;
use crate::format::{render_html, render_table};
use crate::platform;
use crate::record::RecordStore;
use crate::relay::RelaySender;
use crate::storage::{document, StorageStats};

use super::OutputFormat;

/// Write the stored records in the requested format.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_records<W: Write>(
    out: &mut W,
    store: &RecordStore,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => out.write_all(render_table(store).as_bytes())?,
        OutputFormat::Json => out.write_all(&document::encode(store)?)?,
        OutputFormat::Html => writeln!(out, "{}", render_html(store))?,
    }
    Ok(())
}

/// Write storage and address status.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_status<W: Write>(
    out: &mut W,
    config: &Config,
    stats: &StorageStats,
    json: bool,
) -> Result<()> {
    if json {
        let status = serde_json::json!({
            "platform": platform::platform_name(),
            "storage_path": config.storage.path,
            "total_records": stats.total_records,
            "oldest_record": stats.oldest_record,
            "newest_record": stats.newest_record,
            "file_size_bytes": stats.file_size_bytes,
            "http_addr": config.http_addr().to_string(),
            "relay_addr": config.relay_addr().to_string(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
    } else {
        writeln!(out, "formrelay status")?;
        writeln!(out, "----------------")?;
        writeln!(out, "Platform:      {}", platform::platform_name())?;
        writeln!(out, "Storage:       {}", config.storage.path.display())?;
        writeln!(out, "Records:       {}", stats.total_records)?;
        writeln!(
            out,
            "Oldest:        {}",
            stats.oldest_record.as_deref().unwrap_or("-")
        )?;
        writeln!(
            out,
            "Newest:        {}",
            stats.newest_record.as_deref().unwrap_or("-")
        )?;
        writeln!(out, "File size:     {} bytes", stats.file_size_bytes)?;
        writeln!(out, "HTTP:          http://{}", config.http_addr())?;
        writeln!(out, "Relay:         udp://{}", config.relay_addr())?;
    }
    Ok(())
}

/// Write the active configuration.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_config<W: Write>(out: &mut W, config: &Config, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
        return Ok(());
    }

    writeln!(out, "Current Configuration")?;
    writeln!(out, "=====================")?;
    writeln!(out)?;
    writeln!(out, "[HTTP]")?;
    writeln!(out, "  Address:            {}", config.http_addr())?;
    writeln!(out, "  Open browser:       {}", config.http.open_browser)?;
    writeln!(out, "  Body limit (bytes): {}", config.http.body_limit)?;
    writeln!(out)?;
    writeln!(out, "[Relay]")?;
    writeln!(out, "  Address:            {}", config.relay_addr())?;
    writeln!(out, "  Max payload:        {}", config.relay.max_payload)?;
    writeln!(out)?;
    writeln!(out, "[Storage]")?;
    writeln!(out, "  Record file:        {}", config.storage.path.display())?;
    writeln!(out, "  Echo table:         {}", config.storage.echo_table)?;
    writeln!(out)?;
    writeln!(out, "[Web]")?;
    writeln!(out, "  Root:               {}", config.web.root.display())?;
    Ok(())
}

/// Send one raw form body through the relay, as the web front end does.
///
/// Returns the address the datagram was sent to.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the body exceeds the
/// relay bound, or the datagram cannot be sent.
pub async fn send_body(config: &Config, body: &str) -> Result<SocketAddr> {
    config.validate()?;

    let sender = RelaySender::bind(config.relay_addr(), config.relay.max_payload).await?;
    sender.send(body.as_bytes()).await?;
    Ok(sender.target())
}
