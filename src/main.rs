// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use webcam::{HostKind, ScreenshotFormat};

mod cli;

#[derive(Parser)]
#[command(name = "webcam")]
#[command(about = "Shared webcam view with still snapshots")]
#[command(version = webcam::constants::app_info::version())]
struct Cli {
    /// Media host to use (pattern, dir); defaults to the configured host
    #[arg(long, global = true)]
    host: Option<HostKind>,

    /// Image directory for the directory host
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List capture devices offered by the host
    Devices,

    /// Capture a still frame
    Snapshot {
        /// Image format (webp, png, jpeg)
        #[arg(short, long)]
        format: Option<ScreenshotFormat>,

        /// Displayed width in pixels or percent (e.g. 640, 50%)
        #[arg(short, long)]
        width: Option<String>,

        /// Output directory (default: ~/Pictures/webcam)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the data URL instead of saving a file
        #[arg(long)]
        print: bool,
    },

    /// Print the rendered video element
    Render,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=webcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = webcam::Config::load();
    if let Some(dir) = cli.dir {
        config.image_directory = Some(dir);
        if cli.host.is_none() {
            config.host = HostKind::ImageDirectory;
        }
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Devices => runtime.block_on(cli::list_devices(&config)),
        Commands::Snapshot {
            format,
            width,
            output,
            print,
        } => runtime.block_on(cli::take_snapshot(&config, format, width, output, print)),
        Commands::Render => runtime.block_on(cli::render(&config)),
    }
}
