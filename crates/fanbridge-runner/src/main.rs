//! Fanbridge control daemon.
//!
//! Wires the serial link, signal catalog, and fan driver together behind a
//! small interactive console. Typical invocation:
//!
//! ```text
//! RUST_LOG=debug fanbridge --port /dev/ttyUSB0 --catalog demos/signals.json
//! ```
//!
//! A YAML config file can replace the flags (`--config demos/fanbridge.yaml`).
//! `--check` validates the configuration and catalog without touching the
//! serial port.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fanbridge_driver::{DriverResult, FanAccessory, JsonStateStore};
use fanbridge_link::{LinkConfig, SerialLink};
use fanbridge_protocol::SignalCatalog;

use config::{FileConfig, Overrides, Settings};

#[derive(Debug, Parser)]
#[command(name = "fanbridge", about = "IR fan control daemon", version)]
struct Args {
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port path (e.g. /dev/ttyUSB0).
    #[arg(long)]
    port: Option<String>,

    /// Baud rate of the IR blaster port.
    #[arg(long)]
    baud: Option<u32>,

    /// Signal catalog JSON file.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Persisted state file.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Validate configuration and catalog, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        file,
        Overrides {
            port: args.port,
            baud: args.baud,
            catalog: args.catalog,
            state_file: args.state_file,
        },
    )?;
    settings.driver.validate()?;

    let catalog = SignalCatalog::load(&settings.catalog)?;
    catalog.validate_names(settings.driver.required_signals())?;
    info!(
        "loaded {} signal(s) from {}",
        catalog.len(),
        settings.catalog.display()
    );

    if args.check {
        println!("configuration ok");
        return Ok(());
    }

    let link = Arc::new(SerialLink::new(
        &settings.port,
        settings.baud,
        LinkConfig {
            retry_period: settings.retry_period,
        },
    ));
    if let Err(e) = link.open().await {
        warn!("initial open failed: {} (reconnecting in the background)", e);
    }

    let store = Arc::new(JsonStateStore::new(&settings.state_file));
    let accessory = FanAccessory::new(Arc::clone(&link), catalog, store, settings.driver)?;

    run_console(&accessory, &link).await;

    link.close().await;
    Ok(())
}

/// Read commands from stdin until EOF or `quit`.
async fn run_console(accessory: &FanAccessory<SerialLink>, link: &SerialLink) {
    println!("fanbridge console. commands: on | off | speed <0-100> | state | quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let mut parts = line.split_whitespace();
                match parts.next() {
                    None => {}
                    Some("on") => report(accessory.set_on(true)),
                    Some("off") => report(accessory.set_on(false)),
                    Some("speed") => match parts.next().map(str::parse::<u8>) {
                        Some(Ok(speed)) if speed <= 100 => report(accessory.set_speed(speed)),
                        _ => println!("usage: speed <0-100>"),
                    },
                    Some("state") => {
                        let state = accessory.state();
                        println!(
                            "on={} speed={} link={:?}",
                            state.on,
                            state.speed,
                            link.state()
                        );
                    }
                    Some("quit") | Some("exit") => break,
                    Some(other) => println!("unknown command '{}'", other),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("stdin error: {}", e);
                break;
            }
        }
    }
}

fn report(result: DriverResult<()>) {
    if let Err(e) = result {
        println!("error: {}", e);
    }
}
