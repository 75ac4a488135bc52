//! Command-line interface for formrelay.
//!
//! This module provides the CLI structure for the `formrelay` binary.

mod commands;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, OutputFormat, SendCommand, ServeCommand, ShowCommand, StatusCommand,
};
pub use report::{send_body, write_config, write_records, write_status};

/// formrelay - Relay web form submissions into a JSON record file
///
/// Serves a form over HTTP, hands every submission to a local ingest loop
/// over loopback UDP and keeps all submissions in one JSON document.
#[derive(Debug, Parser)]
#[command(name = "formrelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server and the ingest loop
    Serve(ServeCommand),

    /// Print the stored records
    Show(ShowCommand),

    /// Send one raw form body through the relay
    Send(SendCommand),

    /// Show storage and address status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "formrelay");
    }

    #[test]
    fn test_verbosity_quiet() {
        assert_eq!(
            status_cli(0, true).verbosity(),
            crate::logging::Verbosity::Quiet
        );
    }

    #[test]
    fn test_verbosity_normal() {
        assert_eq!(
            status_cli(0, false).verbosity(),
            crate::logging::Verbosity::Normal
        );
    }

    #[test]
    fn test_verbosity_verbose() {
        assert_eq!(
            status_cli(1, false).verbosity(),
            crate::logging::Verbosity::Verbose
        );
    }

    #[test]
    fn test_verbosity_trace() {
        assert_eq!(
            status_cli(2, false).verbosity(),
            crate::logging::Verbosity::Trace
        );
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["formrelay", "serve", "--no-browser"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve(ServeCommand { no_browser: true })
        ));
    }

    #[test]
    fn test_parse_show_default_format() {
        let cli = Cli::try_parse_from(["formrelay", "show"]).unwrap();
        match cli.command {
            Command::Show(cmd) => assert_eq!(cmd.format, OutputFormat::Table),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_show_json() {
        let cli = Cli::try_parse_from(["formrelay", "show", "--format", "json"]).unwrap();
        match cli.command {
            Command::Show(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from(["formrelay", "send", "name=Alice&msg=Hi"]).unwrap();
        match cli.command {
            Command::Send(cmd) => assert_eq!(cmd.body, "name=Alice&msg=Hi"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_send_requires_body() {
        assert!(Cli::try_parse_from(["formrelay", "send"]).is_err());
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(["formrelay", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Status(StatusCommand { json: true })
        ));
    }

    fn create_test_storage() -> (tempfile::TempDir, crate::Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::Storage::open(dir.path().join("data.json")).unwrap();
        let record: crate::Record = [("name", "Alice")].into_iter().collect();
        storage.append(record, "2024-01-15 10:00:00.000000").unwrap();
        (dir, storage)
    }

    #[test]
    fn test_show_json_prints_record_document() {
        let (_dir, storage) = create_test_storage();
        let cli = Cli::try_parse_from(["formrelay", "show", "--format", "json"]).unwrap();
        let Command::Show(cmd) = cli.command else {
            panic!("expected show command");
        };

        let mut out = Vec::new();
        write_records(&mut out, &storage.load().unwrap(), cmd.format).unwrap();

        assert_eq!(out, std::fs::read(storage.path()).unwrap());
    }

    #[test]
    fn test_show_table_prints_grid() {
        let (_dir, storage) = create_test_storage();
        let cli = Cli::try_parse_from(["formrelay", "show"]).unwrap();
        let Command::Show(cmd) = cli.command else {
            panic!("expected show command");
        };

        let mut out = Vec::new();
        write_records(&mut out, &storage.load().unwrap(), cmd.format).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("| 2024-01-15 10:00:00.000000 | Alice |"));
        assert!(text.contains("+==="));
    }

    #[test]
    fn test_status_json_counts_records() {
        let (_dir, storage) = create_test_storage();
        let cli = Cli::try_parse_from(["formrelay", "status", "--json"]).unwrap();
        let Command::Status(cmd) = cli.command else {
            panic!("expected status command");
        };
        let mut config = crate::Config::default();
        config.storage.path = storage.path().to_path_buf();

        let mut out = Vec::new();
        write_status(&mut out, &config, &storage.stats().unwrap(), cmd.json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["total_records"], 1);
        assert_eq!(value["oldest_record"], "2024-01-15 10:00:00.000000");
        assert_eq!(value["storage_path"], storage.path().to_str().unwrap());
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["formrelay", "config", "validate", "--file", "x.toml"]).unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Validate { file }) => {
                assert_eq!(file, Some(PathBuf::from("x.toml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["formrelay", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let args = vec!["formrelay", "-v", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_parse_with_quiet() {
        let args = vec!["formrelay", "-q", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.quiet);
    }
}
