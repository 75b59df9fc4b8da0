// SPDX-License-Identifier: GPL-3.0-only

//! Colour bar host
//!
//! Serves a generated colour bar frame from a virtual camera and exposes a
//! virtual microphone, so the full acquisition path can run without hardware.

use super::types::{
    DeviceKind, MediaDeviceInfo, MediaStream, MediaStreamConstraints, MediaStreamTrack,
    StillFrameSource, TrackKind,
};
use super::{HostFuture, MediaHost};
use crate::constants::{object_url, pattern};
use crate::errors::MediaError;
use futures::FutureExt;
use image::{Rgba, RgbaImage};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Render vertical colour bars
pub fn color_bars(width: u32, height: u32) -> RgbaImage {
    let bars = pattern::BARS.len() as u32;
    RgbaImage::from_fn(width, height, |x, _| {
        let index = (x * bars / width.max(1)).min(bars - 1) as usize;
        let [r, g, b] = pattern::BARS[index];
        Rgba([r, g, b, 255])
    })
}

/// Host backed by a generated test pattern
pub struct TestPatternHost {
    frame: Arc<StillFrameSource>,
    live_urls: Mutex<HashSet<String>>,
}

impl TestPatternHost {
    pub fn new() -> Self {
        Self::with_size(pattern::WIDTH, pattern::HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            frame: Arc::new(StillFrameSource::new(color_bars(width, height))),
            live_urls: Mutex::new(HashSet::new()),
        }
    }

    /// Object URLs created and not yet revoked
    pub fn live_object_urls(&self) -> usize {
        self.live_urls.lock().unwrap().len()
    }

    fn devices() -> Vec<MediaDeviceInfo> {
        vec![
            MediaDeviceInfo::new(DeviceKind::Video, pattern::VIDEO_DEVICE_ID)
                .with_label("Colour bars"),
            MediaDeviceInfo::new(DeviceKind::Audio, pattern::AUDIO_DEVICE_ID)
                .with_label("Silent microphone"),
        ]
    }
}

impl Default for TestPatternHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaHost for TestPatternHost {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> HostFuture<MediaStream> {
        let video_id = constraints
            .video
            .source_id()
            .unwrap_or(pattern::VIDEO_DEVICE_ID)
            .to_string();

        if video_id != pattern::VIDEO_DEVICE_ID {
            let err = MediaError::DeviceUnavailable(format!("no camera with id '{}'", video_id));
            return futures::future::ready(Err(err)).boxed();
        }

        let mut builder = MediaStream::builder(self.frame.clone())
            .track(MediaStreamTrack::new(TrackKind::Video, video_id));

        if let Some(audio) = &constraints.audio {
            let audio_id = audio.source_id().unwrap_or(pattern::AUDIO_DEVICE_ID);
            builder = builder.track(MediaStreamTrack::new(TrackKind::Audio, audio_id));
        }

        let stream = builder.build();
        info!(
            stream = %stream.id(),
            audio = constraints.audio.is_some(),
            "Test pattern stream granted"
        );
        futures::future::ready(Ok(stream)).boxed()
    }

    fn enumerate_devices(&self) -> Option<HostFuture<Vec<MediaDeviceInfo>>> {
        Some(futures::future::ready(Ok(Self::devices())).boxed())
    }

    fn create_object_url(&self, stream: &MediaStream) -> String {
        let url = format!("{}{}", object_url::PREFIX, stream.id());
        self.live_urls.lock().unwrap().insert(url.clone());
        url
    }

    fn revoke_object_url(&self, url: &str) {
        let removed = self.live_urls.lock().unwrap().remove(url);
        debug!(url, removed, "Revoked object URL");
    }
}
