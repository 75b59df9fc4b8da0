// SPDX-License-Identifier: GPL-3.0-only

//! Still image directory host
//!
//! Every supported image file in a directory shows up as a video device whose
//! id is the file name. Granting a stream loads that image and displays it as
//! a frozen frame. There are no audio devices.

use super::types::{
    DeviceKind, MediaDeviceInfo, MediaStream, MediaStreamConstraints, MediaStreamTrack,
    StillFrameSource, TrackKind,
};
use super::{HostFuture, MediaHost};
use crate::constants::file_formats;
use crate::errors::{MediaError, MediaResult};
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Host serving still images from a directory
#[derive(Debug, Clone)]
pub struct ImageDirectoryHost {
    dir: PathBuf,
}

impl ImageDirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }
}

/// List image files as video devices, sorted by file name
fn scan_directory(dir: &Path) -> MediaResult<Vec<MediaDeviceInfo>> {
    let entries = std::fs::read_dir(dir).map_err(|e| MediaError::EnumerationFailed {
        name: "NotReadableError".to_string(),
        message: format!("{}: {}", dir.display(), e),
    })?;

    let mut devices: Vec<MediaDeviceInfo> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(file_formats::is_image_extension)
                .unwrap_or(false)
        })
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .map(|name| MediaDeviceInfo::new(DeviceKind::Video, name.clone()).with_label(name))
        .collect();

    devices.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(dir = %dir.display(), count = devices.len(), "Scanned image directory");
    Ok(devices)
}

fn open_stream(dir: &Path, source_id: Option<&str>) -> MediaResult<MediaStream> {
    let file_name = match source_id {
        Some(id) => id.to_string(),
        None => scan_directory(dir)
            .map_err(|e| MediaError::DeviceUnavailable(e.message().to_string()))?
            .into_iter()
            .next()
            .map(|device| device.id)
            .ok_or_else(|| {
                MediaError::DeviceUnavailable(format!("no images in {}", dir.display()))
            })?,
    };

    // Source ids are plain file names; refuse anything that walks out of the directory
    if Path::new(&file_name).components().count() != 1 {
        return Err(MediaError::DeviceUnavailable(format!(
            "invalid device id '{}'",
            file_name
        )));
    }

    let path = dir.join(&file_name);
    let image = image::open(&path).map_err(|e| {
        MediaError::DeviceUnavailable(format!("failed to open '{}': {}", path.display(), e))
    })?;
    let frame = image.to_rgba8();

    info!(
        path = %path.display(),
        width = frame.width(),
        height = frame.height(),
        "Image stream granted"
    );

    Ok(MediaStream::builder(Arc::new(StillFrameSource::new(frame)))
        .track(MediaStreamTrack::new(TrackKind::Video, file_name))
        .build())
}

impl MediaHost for ImageDirectoryHost {
    fn name(&self) -> &str {
        "image-directory"
    }

    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> HostFuture<MediaStream> {
        if constraints.audio.is_some() {
            debug!("Image directory host has no microphones, ignoring audio constraint");
        }
        let dir = self.dir.clone();
        let source_id = constraints.video.source_id().map(str::to_string);
        async move { open_stream(&dir, source_id.as_deref()) }.boxed()
    }

    fn enumerate_devices(&self) -> Option<HostFuture<Vec<MediaDeviceInfo>>> {
        let dir = self.dir.clone();
        Some(async move { scan_directory(&dir) }.boxed())
    }
}
