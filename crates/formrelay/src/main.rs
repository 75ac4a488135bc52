//! `formrelay` - CLI for formrelay
//!
//! This binary runs the formrelay server and provides commands for inspecting
//! stored submissions and the active configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use formrelay::cli::{
    send_body, write_config, write_records, write_status, Cli, Command, ConfigCommand,
    OutputFormat,
};
use formrelay::{init_logging, Config, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => {
            let open_browser = config.http.open_browser && !cmd.no_browser;
            formrelay::serve(config, open_browser).await?;
            Ok(())
        }
        Command::Show(cmd) => handle_show(&config, cmd.format),
        Command::Send(cmd) => handle_send(&config, &cmd.body).await,
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_show(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let store = Storage::at(&config.storage.path).load()?;
    write_records(&mut std::io::stdout().lock(), &store, format)?;
    Ok(())
}

async fn handle_send(config: &Config, body: &str) -> anyhow::Result<()> {
    let target = send_body(config, body)
        .await
        .with_context(|| format!("sending to udp://{}", config.relay_addr()))?;

    println!("Sent {} bytes to udp://{}", body.len(), target);
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let stats = Storage::at(&config.storage.path).stats()?;
    write_status(&mut std::io::stdout().lock(), config, &stats, json)?;
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            write_config(&mut std::io::stdout().lock(), config, json)?;
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
