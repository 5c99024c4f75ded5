//! Lumawall wall controller
//!
//! # Usage
//!
//! ```bash
//! # Drive the wall from the co-processor link
//! lumawall run --config /etc/lumawall/screen1.toml
//!
//! # Send single commands as the co-processor would
//! lumawall send /dev/ttyUSB1 text 5 "HELLO" --x 10 --y 20
//! lumawall send /dev/ttyUSB1 status
//!
//! # List serial ports
//! lumawall ports
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use lumawall_host::config::DEFAULT_BAUDRATE;
use lumawall_host::send::{send_command, SendAction};
use lumawall_host::serial::{list_ports, PortConfig};
use lumawall_host::{load_config, FontLibrary, HeadlessPanel, ImageLibrary, Runtime, ScreenConfig, SerialLink};

/// LED video wall controller
#[derive(Parser)]
#[command(name = "lumawall")]
#[command(version)]
#[command(about = "Host-side controller for a tiled LED video wall")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the wall controller
    Run {
        /// Screen configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Leave the panel black while no element is shown
        #[arg(long)]
        no_diagnostics: bool,

        /// Serial port (overrides the configuration file)
        #[arg(short, long)]
        port: Option<String>,
    },

    /// Send one command to a screen and print its response
    Send {
        /// Serial port connected to the wall
        port: String,

        /// Screen id to address
        #[arg(short, long, default_value_t = 1)]
        screen: u8,

        #[arg(short, long, default_value_t = DEFAULT_BAUDRATE)]
        baud: u32,

        /// How long to wait for the response
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,

        #[command(subcommand)]
        action: SendAction,
    },

    /// List available serial ports
    Ports,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Run {
            config,
            no_diagnostics,
            port,
        } => cmd_run(config, no_diagnostics, port),
        Commands::Send {
            port,
            screen,
            baud,
            timeout_ms,
            action,
        } => cmd_send(&port, screen, baud, Duration::from_millis(timeout_ms), &action),
        Commands::Ports => cmd_ports(),
    }
}

fn cmd_run(config_path: Option<PathBuf>, no_diagnostics: bool, port: Option<String>) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => load_config(path).with_context(|| format!("cannot load {}", path.display()))?,
        None => {
            info!("No configuration file given, using defaults");
            ScreenConfig::default()
        }
    };
    if let Some(port) = port {
        config.serial.port = port;
    }
    if no_diagnostics {
        config.display.show_diagnostics = false;
    }
    config.validate()?;
    config.log_summary();

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("failed to install signal handler")?;

    let link = SerialLink::open(PortConfig::new(&config.serial.port).with_baud_rate(config.serial.baudrate))
        .context("cannot open co-processor link")?;
    info!(
        "Co-processor link on {} at {} baud",
        link.config().port_path,
        link.config().baud_rate
    );

    let (width, height) = config.panel.dimensions();
    let mut panel = HeadlessPanel::new(width, height);
    if let Some(snapshot) = &config.display.snapshot {
        info!("Writing frames to {}", snapshot.display());
        panel = panel.with_snapshot(snapshot);
    }

    let images = ImageLibrary::new(&config.display.image_root);
    let fonts = FontLibrary::load_dir(&config.display.font_dir);

    let mut runtime = Runtime::new(&config, link, panel, images, fonts);
    runtime.run(&shutdown);
    Ok(())
}

fn cmd_send(port: &str, screen: u8, baud: u32, timeout: Duration, action: &SendAction) -> Result<()> {
    let command = action.to_command(screen)?;
    // Writes may block for as long as the response is awaited
    let config = PortConfig::new(port).with_baud_rate(baud).with_timeout(timeout);
    let mut link = SerialLink::open(config)?;

    let response = send_command(&mut link, &command, timeout)?;
    match response.text().filter(|text| !text.is_empty()) {
        Some(text) => println!("{}: {}", response.code.name(), text),
        None => println!("{}", response.code.name()),
    }
    Ok(())
}

fn cmd_ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }
    for port in ports {
        match port.vid_pid {
            Some((vid, pid)) => println!("{}  {} [{:04x}:{:04x}]", port.path, port.description, vid, pid),
            None => println!("{}  {}", port.path, port.description),
        }
    }
    Ok(())
}
