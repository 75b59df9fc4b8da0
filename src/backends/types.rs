// SPDX-License-Identifier: GPL-3.0-only
// Shared types for media host abstraction

//! Shared types for media hosts: devices, constraints, tracks and streams

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// Media host implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HostKind {
    /// Generated colour bars with a virtual microphone
    #[default]
    TestPattern,
    /// Still images from a directory, one camera per file
    ImageDirectory,
}

impl std::fmt::Display for HostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostKind::TestPattern => write!(f, "test pattern"),
            HostKind::ImageDirectory => write!(f, "image directory"),
        }
    }
}

impl std::str::FromStr for HostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" | "test-pattern" => Ok(HostKind::TestPattern),
            "dir" | "directory" | "image-directory" => Ok(HostKind::ImageDirectory),
            other => Err(format!("unknown host '{}'", other)),
        }
    }
}

/// Kind tag reported by device enumeration
///
/// Only the exact tags `audio` and `video` take part in device selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Audio,
    Video,
    #[serde(other)]
    Unknown,
}

impl DeviceKind {
    /// Parse a host kind tag; anything unrecognised is `Unknown`
    pub fn parse(kind: &str) -> Self {
        match kind {
            "audio" => DeviceKind::Audio,
            "video" => DeviceKind::Video,
            _ => DeviceKind::Unknown,
        }
    }
}

/// One entry of a device listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub kind: DeviceKind,
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl MediaDeviceInfo {
    pub fn new(kind: DeviceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A single candidate source for one track kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConstraint {
    pub source_id: Option<String>,
}

/// Constraints for one track kind: an ordered list of optional candidates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConstraints {
    pub optional: Vec<SourceConstraint>,
}

impl TrackConstraints {
    /// Constraints naming a single candidate source
    pub fn source(source_id: Option<String>) -> Self {
        Self {
            optional: vec![SourceConstraint { source_id }],
        }
    }

    /// The first candidate source id, if any
    pub fn source_id(&self) -> Option<&str> {
        self.optional.iter().find_map(|c| c.source_id.as_deref())
    }
}

/// Request sent to [`super::MediaHost::get_user_media`]
///
/// Serializes to `{"video":{"optional":[{"sourceId":..}]},"audio":{..}}`;
/// `audio` is omitted entirely when audio was not requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamConstraints {
    pub video: TrackConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<TrackConstraints>,
}

/// Track media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug)]
struct TrackInner {
    id: String,
    kind: TrackKind,
    stopped: AtomicBool,
    stop_calls: AtomicUsize,
}

/// Handle to one hardware capture track
///
/// Clones share state: stopping any clone stops the track.
#[derive(Debug, Clone)]
pub struct MediaStreamTrack {
    inner: Arc<TrackInner>,
}

impl MediaStreamTrack {
    pub fn new(kind: TrackKind, id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: id.into(),
                kind,
                stopped: AtomicBool::new(false),
                stop_calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    /// Stop capturing; idempotent
    pub fn stop(&self) {
        self.inner.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// How many times `stop` was called on this track
    pub fn stop_calls(&self) -> usize {
        self.inner.stop_calls.load(Ordering::SeqCst)
    }
}

/// Supplies the frames displayed by a stream
pub trait FrameSource: Send + Sync {
    /// Intrinsic video size; `(0, 0)` until the source knows it
    fn native_size(&self) -> (u32, u32);

    /// The frame currently being displayed, if any
    fn current_frame(&self) -> Option<Arc<RgbaImage>>;
}

/// A source that always shows the same frame
#[derive(Debug, Clone)]
pub struct StillFrameSource {
    frame: Arc<RgbaImage>,
}

impl StillFrameSource {
    pub fn new(frame: RgbaImage) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }
}

impl FrameSource for StillFrameSource {
    fn native_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn current_frame(&self) -> Option<Arc<RgbaImage>> {
        Some(Arc::clone(&self.frame))
    }
}

/// Old-style whole-stream stop hook, preferred over per-track stops
pub type LegacyStop = Box<dyn Fn() + Send + Sync>;

struct StreamInner {
    id: Uuid,
    video_tracks: Vec<MediaStreamTrack>,
    audio_tracks: Vec<MediaStreamTrack>,
    legacy_stop: Option<LegacyStop>,
    source: Arc<dyn FrameSource>,
}

/// Shared handle to an active capture session granted by a host
///
/// Cloning is cheap; every clone refers to the same underlying session.
#[derive(Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

impl MediaStream {
    pub fn builder(source: Arc<dyn FrameSource>) -> MediaStreamBuilder {
        MediaStreamBuilder {
            video_tracks: Vec::new(),
            audio_tracks: Vec::new(),
            legacy_stop: None,
            source,
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn video_tracks(&self) -> &[MediaStreamTrack] {
        &self.inner.video_tracks
    }

    pub fn audio_tracks(&self) -> &[MediaStreamTrack] {
        &self.inner.audio_tracks
    }

    pub fn has_legacy_stop(&self) -> bool {
        self.inner.legacy_stop.is_some()
    }

    /// Release the hardware: the legacy hook if present, otherwise every track
    pub fn release(&self) {
        if let Some(stop) = &self.inner.legacy_stop {
            stop();
            return;
        }
        for track in self.video_tracks().iter().chain(self.audio_tracks()) {
            track.stop();
        }
    }

    pub fn native_size(&self) -> (u32, u32) {
        self.inner.source.native_size()
    }

    pub fn current_frame(&self) -> Option<Arc<RgbaImage>> {
        self.inner.source.current_frame()
    }

    /// True if both handles refer to the same capture session
    pub fn ptr_eq(a: &MediaStream, b: &MediaStream) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.inner.id)
            .field("video_tracks", &self.inner.video_tracks.len())
            .field("audio_tracks", &self.inner.audio_tracks.len())
            .field("legacy_stop", &self.has_legacy_stop())
            .finish()
    }
}

/// Builder for [`MediaStream`]
pub struct MediaStreamBuilder {
    video_tracks: Vec<MediaStreamTrack>,
    audio_tracks: Vec<MediaStreamTrack>,
    legacy_stop: Option<LegacyStop>,
    source: Arc<dyn FrameSource>,
}

impl MediaStreamBuilder {
    pub fn track(mut self, track: MediaStreamTrack) -> Self {
        match track.kind() {
            TrackKind::Video => self.video_tracks.push(track),
            TrackKind::Audio => self.audio_tracks.push(track),
        }
        self
    }

    pub fn legacy_stop(mut self, stop: impl Fn() + Send + Sync + 'static) -> Self {
        self.legacy_stop = Some(Box::new(stop));
        self
    }

    pub fn build(self) -> MediaStream {
        MediaStream {
            inner: Arc::new(StreamInner {
                id: Uuid::new_v4(),
                video_tracks: self.video_tracks,
                audio_tracks: self.audio_tracks,
                legacy_stop: self.legacy_stop,
                source: self.source,
            }),
        }
    }
}
