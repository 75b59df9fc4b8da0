// SPDX-License-Identifier: MPL-2.0

//! Recording media host shared by the integration tests

#![allow(dead_code)]

use futures::FutureExt;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use webcam::backends::{
    DeviceKind, HostFuture, MediaDeviceInfo, MediaHost, MediaStream, MediaStreamConstraints,
    MediaStreamTrack, StillFrameSource, TrackKind,
};
use webcam::{Canvas, MediaError};

/// How the mock answers `get_user_media`
#[derive(Clone)]
pub enum Outcome {
    Grant,
    Deny,
}

pub struct MockHost {
    supports: bool,
    outcome: Outcome,
    frame_size: (u32, u32),
    with_legacy_stop: bool,
    devices: Option<Result<Vec<MediaDeviceInfo>, MediaError>>,
    legacy: Option<Vec<MediaDeviceInfo>>,
    gate: Option<Arc<Semaphore>>,

    pub requests: Mutex<Vec<MediaStreamConstraints>>,
    pub streams: Mutex<Vec<MediaStream>>,
    pub enumerations: AtomicUsize,
    pub surfaces_created: AtomicUsize,
    pub created_urls: Mutex<Vec<String>>,
    pub revoked_urls: Mutex<Vec<String>>,
    pub legacy_stops: Arc<AtomicUsize>,
}

impl MockHost {
    /// Grants every request; offers one camera and one microphone
    pub fn granting() -> Self {
        Self {
            supports: true,
            outcome: Outcome::Grant,
            frame_size: (1280, 720),
            with_legacy_stop: false,
            devices: Some(Ok(vec![
                MediaDeviceInfo::new(DeviceKind::Video, "cam-1"),
                MediaDeviceInfo::new(DeviceKind::Audio, "mic-1"),
            ])),
            legacy: None,
            gate: None,
            requests: Mutex::new(Vec::new()),
            streams: Mutex::new(Vec::new()),
            enumerations: AtomicUsize::new(0),
            surfaces_created: AtomicUsize::new(0),
            created_urls: Mutex::new(Vec::new()),
            revoked_urls: Mutex::new(Vec::new()),
            legacy_stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denying() -> Self {
        Self {
            outcome: Outcome::Deny,
            ..Self::granting()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supports: false,
            ..Self::granting()
        }
    }

    pub fn with_devices(mut self, devices: Vec<MediaDeviceInfo>) -> Self {
        self.devices = Some(Ok(devices));
        self
    }

    pub fn with_enumeration_error(mut self) -> Self {
        self.devices = Some(Err(MediaError::EnumerationFailed {
            name: "AbortError".to_string(),
            message: "device listing aborted".to_string(),
        }));
        self
    }

    /// Remove deferred enumeration and offer a legacy listing instead
    pub fn with_legacy_only(mut self, sources: Vec<MediaDeviceInfo>) -> Self {
        self.devices = None;
        self.legacy = Some(sources);
        self
    }

    /// Remove every device selection capability
    pub fn without_listing(mut self) -> Self {
        self.devices = None;
        self.legacy = None;
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    pub fn with_legacy_stop(mut self) -> Self {
        self.with_legacy_stop = true;
        self
    }

    /// Hold every response until `open_gate` is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            // Waiters on a closed semaphore return immediately
            gate.close();
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<MediaStreamConstraints> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn last_stream(&self) -> Option<MediaStream> {
        self.streams.lock().unwrap().last().cloned()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked_urls.lock().unwrap().clone()
    }

    fn build_stream(&self, constraints: &MediaStreamConstraints) -> MediaStream {
        let (width, height) = self.frame_size;
        let frame = RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255]));
        let video_id = constraints.video.source_id().unwrap_or("default-camera");

        let mut builder = MediaStream::builder(Arc::new(StillFrameSource::new(frame)))
            .track(MediaStreamTrack::new(TrackKind::Video, video_id));
        if let Some(audio) = &constraints.audio {
            let audio_id = audio.source_id().unwrap_or("default-microphone");
            builder = builder.track(MediaStreamTrack::new(TrackKind::Audio, audio_id));
        }
        if self.with_legacy_stop {
            let stops = Arc::clone(&self.legacy_stops);
            builder = builder.legacy_stop(move || {
                stops.fetch_add(1, Ordering::SeqCst);
            });
        }

        let stream = builder.build();
        self.streams.lock().unwrap().push(stream.clone());
        stream
    }
}

impl MediaHost for MockHost {
    fn name(&self) -> &str {
        "mock"
    }

    fn supports_user_media(&self) -> bool {
        self.supports
    }

    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> HostFuture<MediaStream> {
        self.requests.lock().unwrap().push(constraints.clone());

        let result = match self.outcome {
            Outcome::Grant => Ok(self.build_stream(constraints)),
            Outcome::Deny => Err(MediaError::PermissionDenied(
                "permission dismissed".to_string(),
            )),
        };

        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire_owned().await;
            }
            result
        }
        .boxed()
    }

    fn enumerate_devices(&self) -> Option<HostFuture<Vec<MediaDeviceInfo>>> {
        let devices = self.devices.clone()?;
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Some(futures::future::ready(devices).boxed())
    }

    fn legacy_sources(&self) -> Option<Vec<MediaDeviceInfo>> {
        self.legacy.clone()
    }

    fn create_object_url(&self, stream: &MediaStream) -> String {
        let url = format!("blob:mock/{}", stream.id());
        self.created_urls.lock().unwrap().push(url.clone());
        url
    }

    fn revoke_object_url(&self, url: &str) {
        self.revoked_urls.lock().unwrap().push(url.to_string());
    }

    fn create_surface(&self, width: u32, height: u32) -> Canvas {
        self.surfaces_created.fetch_add(1, Ordering::SeqCst);
        Canvas::new(width, height)
    }
}
