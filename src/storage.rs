// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for snapshots

use crate::config::ScreenshotFormat;
use crate::constants::{app_info, snapshot};
use crate::errors::{WebcamError, WebcamResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default snapshot directory: `~/Pictures/webcam`, or `./snapshots`
pub fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .map(|dir| dir.join(app_info::APP_ID))
        .unwrap_or_else(|| PathBuf::from("snapshots"))
}

/// Split a base64 data URL into its format and decoded bytes
pub fn decode_data_url(data_url: &str) -> WebcamResult<(ScreenshotFormat, Vec<u8>)> {
    let rest = data_url
        .strip_prefix(snapshot::DATA_URL_SCHEME)
        .ok_or_else(|| WebcamError::Other("not a data URL".to_string()))?;
    let (mime, payload) = rest
        .split_once(snapshot::BASE64_MARKER)
        .ok_or_else(|| WebcamError::Other("data URL is not base64 encoded".to_string()))?;
    let format = ScreenshotFormat::from_mime(mime)
        .ok_or_else(|| WebcamError::Other(format!("unsupported image type '{}'", mime)))?;
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| WebcamError::Other(format!("invalid base64 payload: {}", e)))?;

    Ok((format, bytes))
}

/// Write a snapshot data URL to `dir` as `IMG_<timestamp>.<ext>`
pub fn save_data_url(data_url: &str, dir: &Path) -> WebcamResult<PathBuf> {
    let (format, bytes) = decode_data_url(data_url)?;

    std::fs::create_dir_all(dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut path = dir.join(format!("IMG_{}.{}", timestamp, format.extension()));
    let mut suffix = 1;
    while path.exists() {
        path = dir.join(format!("IMG_{}_{}.{}", timestamp, suffix, format.extension()));
        suffix += 1;
    }

    std::fs::write(&path, &bytes)?;
    info!(path = %path.display(), size = bytes.len(), "Snapshot saved");
    Ok(path)
}
