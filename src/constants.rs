// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

/// Default rendered video width in pixels
pub const DEFAULT_WIDTH: u32 = 640;

/// Default rendered video height in pixels
pub const DEFAULT_HEIGHT: u32 = 480;

/// Snapshot encoding constants
pub mod snapshot {
    /// JPEG quality used for `image/jpeg` snapshots (matches the 0.92 canvas default)
    pub const JPEG_QUALITY: u8 = 92;

    /// Data URL returned for a surface with no pixels
    pub const EMPTY_DATA_URL: &str = "data:,";

    /// Prefix of every non-empty snapshot data URL
    pub const DATA_URL_SCHEME: &str = "data:";

    /// Separator between the MIME type and the base64 payload
    pub const BASE64_MARKER: &str = ";base64,";

    /// Largest width or height of a snapshot surface
    pub const MAX_SURFACE_DIMENSION: u32 = 32_767;

    /// Largest pixel count of a snapshot surface (16384 x 16384)
    pub const MAX_SURFACE_AREA: u64 = 268_435_456;
}

/// Object URL constants
pub mod object_url {
    /// Scheme prefix of object URLs minted by the built-in hosts
    pub const PREFIX: &str = "blob:webcam/";
}

/// Test pattern host constants
pub mod pattern {
    /// Native width of the generated pattern
    pub const WIDTH: u32 = 1280;

    /// Native height of the generated pattern
    pub const HEIGHT: u32 = 720;

    /// Identifier of the pattern camera
    pub const VIDEO_DEVICE_ID: &str = "pattern-camera";

    /// Identifier of the pattern microphone
    pub const AUDIO_DEVICE_ID: &str = "pattern-microphone";

    /// Classic 75% colour bars, left to right
    pub const BARS: [[u8; 3]; 8] = [
        [191, 191, 191],
        [191, 191, 0],
        [0, 191, 191],
        [0, 191, 0],
        [191, 0, 191],
        [191, 0, 0],
        [0, 0, 191],
        [16, 16, 16],
    ];
}

/// Supported file formats for the image directory host
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Application identifier used for config and output directories
    pub const APP_ID: &str = "webcam";

    /// Config file name inside the application config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
