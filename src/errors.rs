// SPDX-License-Identifier: MPL-2.0

//! Error types for the webcam component

use std::fmt;

/// Result type alias using WebcamError
pub type WebcamResult<T> = Result<T, WebcamError>;

/// Result type for host media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Main crate error type
#[derive(Debug, Clone)]
pub enum WebcamError {
    /// Media acquisition or enumeration errors
    Media(MediaError),
    /// Snapshot errors
    Snapshot(SnapshotError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors reported by the host media environment
///
/// Names follow the DOMException names a browser reports for
/// `getUserMedia` and `enumerateDevices` failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The host has no user media capability at all
    NotSupported,
    /// The user or the host policy refused access
    PermissionDenied(String),
    /// The requested device is missing or already in use
    DeviceUnavailable(String),
    /// Listing devices failed
    EnumerationFailed { name: String, message: String },
    /// Any other host failure
    Host { name: String, message: String },
}

/// Reasons a snapshot could not be produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The instance has no attached stream
    NoStream,
    /// The stream has not reported its native dimensions yet
    NoVideoDimensions,
    /// The requested surface exceeds the size limits
    SurfaceTooLarge { width: u32, height: u32 },
    /// Encoding the surface failed
    EncodingFailed(String),
}

impl MediaError {
    /// DOM-style error name
    pub fn name(&self) -> &str {
        match self {
            MediaError::NotSupported => "NotSupportedError",
            MediaError::PermissionDenied(_) => "NotAllowedError",
            MediaError::DeviceUnavailable(_) => "NotReadableError",
            MediaError::EnumerationFailed { name, .. } => name.as_str(),
            MediaError::Host { name, .. } => name.as_str(),
        }
    }

    /// Human readable detail
    pub fn message(&self) -> &str {
        match self {
            MediaError::NotSupported => "user media is not supported by this host",
            MediaError::PermissionDenied(msg) => msg.as_str(),
            MediaError::DeviceUnavailable(msg) => msg.as_str(),
            MediaError::EnumerationFailed { message, .. } => message.as_str(),
            MediaError::Host { message, .. } => message.as_str(),
        }
    }
}

impl fmt::Display for WebcamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebcamError::Media(e) => write!(f, "Media error: {}", e),
            WebcamError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
            WebcamError::Config(msg) => write!(f, "Configuration error: {}", msg),
            WebcamError::Storage(msg) => write!(f, "Storage error: {}", msg),
            WebcamError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.message())
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::NoStream => write!(f, "No stream attached"),
            SnapshotError::NoVideoDimensions => write!(f, "Video dimensions not available"),
            SnapshotError::SurfaceTooLarge { width, height } => {
                write!(f, "Surface of {}x{} exceeds the size limit", width, height)
            }
            SnapshotError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for WebcamError {}
impl std::error::Error for MediaError {}
impl std::error::Error for SnapshotError {}

impl From<MediaError> for WebcamError {
    fn from(err: MediaError) -> Self {
        WebcamError::Media(err)
    }
}

impl From<SnapshotError> for WebcamError {
    fn from(err: SnapshotError) -> Self {
        WebcamError::Snapshot(err)
    }
}

impl From<String> for WebcamError {
    fn from(msg: String) -> Self {
        WebcamError::Other(msg)
    }
}

impl From<&str> for WebcamError {
    fn from(msg: &str) -> Self {
        WebcamError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for WebcamError {
    fn from(err: std::io::Error) -> Self {
        WebcamError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WebcamError {
    fn from(err: serde_json::Error) -> Self {
        WebcamError::Config(err.to_string())
    }
}

impl From<image::ImageError> for SnapshotError {
    fn from(err: image::ImageError) -> Self {
        SnapshotError::EncodingFailed(err.to_string())
    }
}
