// SPDX-License-Identifier: GPL-3.0-only

//! Device selection and the acquisition request
//!
//! Sources are chosen by the first applicable tier:
//!
//! 1. explicit audio and video source ids from the props,
//! 2. the host's deferred device enumeration,
//! 3. the host's legacy synchronous source listing.
//!
//! Enumeration and legacy listing pick the first `audio` and the first `video`
//! device; later devices of the same kind and devices of other kinds are ignored.

use crate::backends::{
    DeviceKind, MediaDeviceInfo, MediaHost, MediaStream, MediaStreamConstraints,
    TrackConstraints,
};
use crate::config::WebcamProps;
use crate::errors::MediaResult;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The subset of props that shapes an acquisition request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePreferences {
    pub audio: bool,
    pub audio_source: Option<String>,
    pub video_source: Option<String>,
}

impl From<&WebcamProps> for SourcePreferences {
    fn from(props: &WebcamProps) -> Self {
        Self {
            audio: props.audio,
            audio_source: props.audio_source.clone(),
            video_source: props.video_source.clone(),
        }
    }
}

/// Source ids picked for a request; `None` leaves the choice to the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedSources {
    pub audio: Option<String>,
    pub video: Option<String>,
}

/// Which selection tier produced the sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    Explicit,
    Enumeration,
    Legacy,
}

impl std::fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionTier::Explicit => write!(f, "explicit"),
            SelectionTier::Enumeration => write!(f, "enumeration"),
            SelectionTier::Legacy => write!(f, "legacy"),
        }
    }
}

/// Pick the first audio and the first video device
pub fn select_sources(devices: &[MediaDeviceInfo]) -> SelectedSources {
    let mut selected = SelectedSources::default();

    for device in devices {
        match device.kind {
            DeviceKind::Audio if selected.audio.is_none() => {
                selected.audio = Some(device.id.clone());
            }
            DeviceKind::Video if selected.video.is_none() => {
                selected.video = Some(device.id.clone());
            }
            _ => {}
        }
    }

    selected
}

/// Build request constraints; audio is included only when requested
pub fn build_constraints(audio: bool, sources: SelectedSources) -> MediaStreamConstraints {
    MediaStreamConstraints {
        video: TrackConstraints::source(sources.video),
        audio: audio.then(|| TrackConstraints::source(sources.audio)),
    }
}

/// Resolve sources through the selection tiers
///
/// Returns `None` when no tier produced sources: enumeration failed (logged)
/// or the host offers neither enumeration nor legacy listing.
async fn resolve_sources(
    host: &dyn MediaHost,
    prefs: &SourcePreferences,
) -> Option<(SelectionTier, SelectedSources)> {
    if let (Some(audio), Some(video)) = (&prefs.audio_source, &prefs.video_source) {
        return Some((
            SelectionTier::Explicit,
            SelectedSources {
                audio: Some(audio.clone()),
                video: Some(video.clone()),
            },
        ));
    }

    if let Some(enumeration) = host.enumerate_devices() {
        return match enumeration.await {
            Ok(devices) => {
                debug!(count = devices.len(), "Enumerated devices");
                Some((SelectionTier::Enumeration, select_sources(&devices)))
            }
            Err(e) => {
                warn!("{}: {}", e.name(), e.message());
                None
            }
        };
    }

    if let Some(sources) = host.legacy_sources() {
        debug!(count = sources.len(), "Listed legacy sources");
        return Some((SelectionTier::Legacy, select_sources(&sources)));
    }

    warn!(host = host.name(), "Host offers no way to select capture devices");
    None
}

/// Run one acquisition: select sources, then ask the host for a stream
///
/// `None` means the attempt was abandoned before a request was made.
pub async fn request_stream(
    host: Arc<dyn MediaHost>,
    prefs: SourcePreferences,
) -> Option<MediaResult<MediaStream>> {
    let (tier, sources) = resolve_sources(host.as_ref(), &prefs).await?;
    let constraints = build_constraints(prefs.audio, sources);

    info!(
        host = host.name(),
        %tier,
        video = ?constraints.video.source_id(),
        audio = ?constraints.audio.as_ref().map(|a| a.source_id()),
        "Requesting user media"
    );

    Some(host.get_user_media(&constraints).await)
}
