// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing capture devices
//! - Capturing still frames
//! - Printing the rendered video element

use std::path::PathBuf;
use webcam::backends::create_host;
use webcam::storage;
use webcam::{CaptureSession, Config, Dimension, ScreenshotFormat, Webcam, WebcamProps};

/// Mount one instance with the configured props and wait for its stream
async fn mount_ready(
    config: &Config,
    props: WebcamProps,
) -> Result<Webcam, Box<dyn std::error::Error>> {
    let host = create_host(config.host, config)?;
    let session = CaptureSession::new(host);
    let view = Webcam::mount(&session, props);
    session.settled().await;

    if !view.has_stream() {
        return Err(format!("No stream from the {} host", config.host).into());
    }
    Ok(view)
}

/// List all devices the host offers
pub async fn list_devices(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let host = create_host(config.host, config)?;

    let devices = match (host.enumerate_devices(), host.legacy_sources()) {
        (Some(enumeration), _) => enumeration.await?,
        (None, Some(sources)) => sources,
        (None, None) => {
            println!("The {} host cannot list devices.", config.host);
            return Ok(());
        }
    };

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("Available devices:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        let kind = format!("{:?}", device.kind).to_lowercase();
        if device.label.is_empty() || device.label == device.id {
            println!("  [{}] {:<6} {}", index, kind, device.id);
        } else {
            println!("  [{}] {:<6} {} ({})", index, kind, device.id, device.label);
        }
    }

    Ok(())
}

/// Capture one still frame and save or print it
pub async fn take_snapshot(
    config: &Config,
    format: Option<ScreenshotFormat>,
    width: Option<String>,
    output: Option<PathBuf>,
    print: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut props = config.props.clone();
    if let Some(format) = format {
        props.screenshot_format = format;
    }
    if let Some(width) = width {
        props.width = width.parse::<Dimension>()?;
    }

    let view = mount_ready(config, props).await?;

    // Percentages are taken relative to the native frame width
    if let Some(stream) = view.stream() {
        view.set_container_width(stream.native_size().0);
    }

    let canvas = view.try_canvas()?;
    let data_url = canvas.to_data_url(view.props().screenshot_format)?;

    if print {
        println!("{}", data_url);
        return Ok(());
    }

    let dir = output
        .or_else(|| config.snapshot_dir.clone())
        .unwrap_or_else(storage::default_snapshot_dir);
    let path = storage::save_data_url(&data_url, &dir)?;

    println!(
        "Saved {}x{} snapshot to {}",
        canvas.width(),
        canvas.height(),
        path.display()
    );

    Ok(())
}

/// Print the element an instance renders once its stream is attached
pub async fn render(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let view = mount_ready(config, config.props.clone()).await?;
    println!("{}", view.render());
    Ok(())
}
