// src/main.rs
//! GPS Clock Sync - set the system clock from a serial GPS receiver

use clap::Parser;
use gps_clock_sync::{
    clock::ensure_privileged, extractor::list_serial_ports, logging, ClockSetter, ClockSync,
    DryRunClock, Result, SyncConfig, SystemClock,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gps-clock-sync", version, about = "Set the system UTC clock from the first GPS fix on a serial port")]
struct Cli {
    /// Serial port to scan (repeatable); skips device discovery
    #[arg(short, long = "port", value_name = "PATH")]
    ports: Vec<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Per-line read timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Lines to read from each port before giving up on it
    #[arg(short = 'n', long)]
    max_lines: Option<usize>,

    /// Directory searched for serial devices
    #[arg(long, value_name = "DIR")]
    device_dir: Option<String>,

    /// Derive and print the timestamp without setting the clock
    #[arg(long)]
    dry_run: bool,

    /// List candidate serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Config file (defaults to ~/.config/gps-clock-sync/config.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut SyncConfig) {
        if !self.ports.is_empty() {
            config.ports = self.ports.clone();
        }
        if let Some(dir) = &self.device_dir {
            config.device_dir = dir.clone();
        }
        config.update_serial(
            self.baud.unwrap_or(config.baudrate),
            self.timeout.unwrap_or(config.read_timeout_secs),
            self.max_lines.unwrap_or(config.max_lines),
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logger(cli.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("gps-clock-sync: {}", e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = SyncConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    if cli.list_ports {
        list_serial_ports(&config).await?;
        return Ok(());
    }

    if cli.dry_run {
        sync_once(config, DryRunClock, "Would set").await
    } else {
        ensure_privileged()?;
        sync_once(config, SystemClock, "Set").await
    }
}

async fn sync_once<C: ClockSetter>(config: SyncConfig, clock: C, verb: &str) -> Result<()> {
    let mut sync = ClockSync::new(config, clock);
    let outcome = sync.run().await?;

    println!("Fix on {}: {}", outcome.fix.port, outcome.fix.raw_sentence);
    println!("{} system clock to {} UTC", verb, outcome.timestamp);
    Ok(())
}
