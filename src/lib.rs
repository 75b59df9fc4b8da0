// SPDX-License-Identifier: MPL-2.0

//! Webcam - a live camera view with shared capture and still snapshots
//!
//! Any number of [`Webcam`] instances can be mounted on one
//! [`CaptureSession`]. The session acquires the hardware stream once, hands
//! the same stream to every mounted instance and releases it when the last
//! instance holding it unmounts. Each instance can capture the current frame
//! as a data URL.
//!
//! # Architecture
//!
//! - [`backends`]: media host abstraction and built-in hosts
//! - [`capture`]: shared session, device selection
//! - [`webcam`]: instances, rendering and snapshot surfaces
//! - [`config`]: props and persisted configuration
//! - [`storage`]: saving snapshots to disk
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use webcam::{CaptureSession, ScreenshotFormat, Webcam, WebcamProps};
//! use webcam::backends::TestPatternHost;
//!
//! let session = CaptureSession::new(Arc::new(TestPatternHost::new()));
//! let props = WebcamProps {
//!     screenshot_format: ScreenshotFormat::Png,
//!     ..WebcamProps::default()
//! };
//! let view = Webcam::mount(&session, props);
//! let png = view.get_screenshot();
//! ```

pub mod backends;
pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod storage;
pub mod webcam;

// Re-export commonly used types
pub use backends::{HostKind, MediaHost, MediaStream};
pub use capture::CaptureSession;
pub use config::{Config, Dimension, ScreenshotFormat, WebcamProps};
pub use errors::{MediaError, SnapshotError, WebcamError, WebcamResult};
pub use webcam::{Canvas, StreamState, VideoElement, Webcam};
