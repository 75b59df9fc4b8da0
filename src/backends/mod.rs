// SPDX-License-Identifier: MPL-2.0

//! Media host abstraction
//!
//! A media host is whatever grants access to capture hardware: in a browser
//! it would be `navigator.mediaDevices` plus `URL.createObjectURL` and canvas
//! creation. The capture session and the webcam view only talk to hardware
//! through the [`MediaHost`] trait.
//!
//! ```text
//! ┌─────────────────────┐
//! │   Webcam instances  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← Shared acquisition, fan-out, teardown
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  MediaHost trait    │  ← Permission, enumeration, object URLs, surfaces
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!  TestPattern  ImageDirectory
//! ```
//!
//! # Modules
//!
//! - [`types`]: devices, constraints, tracks and streams
//! - [`pattern`]: generated colour bar host
//! - [`directory`]: still image directory host

pub mod directory;
pub mod pattern;
pub mod types;

pub use directory::ImageDirectoryHost;
pub use pattern::TestPatternHost;
pub use types::*;

use crate::config::Config;
use crate::constants::object_url;
use crate::errors::{MediaResult, WebcamError, WebcamResult};
use crate::webcam::Canvas;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Deferred host response
pub type HostFuture<T> = BoxFuture<'static, MediaResult<T>>;

/// Host environment providing media capture primitives
///
/// Capabilities that a host may lack (`enumerate_devices`, `legacy_sources`)
/// return `None` when absent, which drives the device selection fallback.
pub trait MediaHost: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Whether the host can grant user media at all
    fn supports_user_media(&self) -> bool {
        true
    }

    /// Ask for a stream matching the constraints (permission prompt)
    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> HostFuture<MediaStream>;

    /// Deferred device listing, if the host supports it
    fn enumerate_devices(&self) -> Option<HostFuture<Vec<MediaDeviceInfo>>> {
        None
    }

    /// Synchronous legacy device listing, if the host supports it
    fn legacy_sources(&self) -> Option<Vec<MediaDeviceInfo>> {
        None
    }

    /// Mint a playable URL for a stream
    fn create_object_url(&self, stream: &MediaStream) -> String {
        format!("{}{}", object_url::PREFIX, stream.id())
    }

    /// Invalidate a URL minted by `create_object_url`
    fn revoke_object_url(&self, _url: &str) {}

    /// Allocate an offscreen drawing surface
    fn create_surface(&self, width: u32, height: u32) -> Canvas {
        Canvas::new(width, height)
    }
}

/// Construct the host selected in the config
pub fn create_host(kind: HostKind, config: &Config) -> WebcamResult<Arc<dyn MediaHost>> {
    match kind {
        HostKind::TestPattern => Ok(Arc::new(TestPatternHost::new())),
        HostKind::ImageDirectory => {
            let dir = config.image_directory.clone().ok_or_else(|| {
                WebcamError::Config("image directory host needs an image_directory".to_string())
            })?;
            Ok(Arc::new(ImageDirectoryHost::new(dir)))
        }
    }
}
