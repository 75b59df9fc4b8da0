// SPDX-License-Identifier: GPL-3.0-only

//! Component props and persisted configuration

use crate::backends::HostKind;
use crate::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH, app_info};
use crate::errors::{WebcamError, WebcamResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Image format used for snapshots
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ScreenshotFormat {
    /// `image/webp` (lossless)
    #[default]
    #[serde(rename = "image/webp")]
    Webp,
    /// `image/png`
    #[serde(rename = "image/png")]
    Png,
    /// `image/jpeg`
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl ScreenshotFormat {
    /// All supported formats
    pub const ALL: [ScreenshotFormat; 3] = [
        ScreenshotFormat::Webp,
        ScreenshotFormat::Png,
        ScreenshotFormat::Jpeg,
    ];

    /// MIME type written into data URLs
    pub fn mime_type(&self) -> &'static str {
        match self {
            ScreenshotFormat::Webp => "image/webp",
            ScreenshotFormat::Png => "image/png",
            ScreenshotFormat::Jpeg => "image/jpeg",
        }
    }

    /// File extension used when saving snapshots
    pub fn extension(&self) -> &'static str {
        match self {
            ScreenshotFormat::Webp => "webp",
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Jpeg => "jpg",
        }
    }

    /// Look up a format by its MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.mime_type() == mime)
    }
}

impl fmt::Display for ScreenshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl FromStr for ScreenshotFormat {
    type Err = String;

    /// Accepts a MIME type or a short name (`png`, `jpg`, `jpeg`, `webp`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(format) = Self::from_mime(&s) {
            return Ok(format);
        }
        match s.as_str() {
            "webp" => Ok(ScreenshotFormat::Webp),
            "png" => Ok(ScreenshotFormat::Png),
            "jpg" | "jpeg" => Ok(ScreenshotFormat::Jpeg),
            other => Err(format!("unsupported screenshot format '{}'", other)),
        }
    }
}

/// Rendered size: either a pixel count or a percentage of the container
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    Pixels(u32),
    Percent(f32),
}

/// Wire form of [`Dimension`]: a JSON number or a string such as `"100%"`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(u32),
    Text(String),
}

impl Dimension {
    /// Resolve to pixels against a container width, if one is known
    pub fn resolve(&self, container: Option<u32>) -> Option<u32> {
        match self {
            Dimension::Pixels(px) => Some(*px),
            Dimension::Percent(pct) => {
                container.map(|width| (width as f64 * *pct as f64 / 100.0) as u32)
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Pixels(px) => write!(f, "{}", px),
            Dimension::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(pct) = s.strip_suffix('%') {
            let value: f32 = pct
                .trim()
                .parse()
                .map_err(|_| format!("invalid percentage '{}'", s))?;
            if !value.is_finite() || value < 0.0 {
                return Err(format!("invalid percentage '{}'", s));
            }
            Ok(Dimension::Percent(value))
        } else {
            let px = s.strip_suffix("px").unwrap_or(s).trim();
            px.parse()
                .map(Dimension::Pixels)
                .map_err(|_| format!("invalid dimension '{}'", s))
        }
    }
}

impl From<u32> for Dimension {
    fn from(px: u32) -> Self {
        Dimension::Pixels(px)
    }
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Number(px) => Ok(Dimension::Pixels(px)),
            DimensionRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(dim: Dimension) -> Self {
        match dim {
            Dimension::Pixels(px) => DimensionRepr::Number(px),
            percent => DimensionRepr::Text(percent.to_string()),
        }
    }
}

/// Callback fired when an instance first receives a stream
#[derive(Clone)]
pub struct UserMediaCallback(Arc<dyn Fn() + Send + Sync>);

impl UserMediaCallback {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    pub fn call(&self) {
        (self.0)()
    }
}

impl Default for UserMediaCallback {
    fn default() -> Self {
        Self::new(|| {})
    }
}

// Callbacks are not persisted, so they never make two props differ
impl PartialEq for UserMediaCallback {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for UserMediaCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserMediaCallback")
    }
}

/// Per-instance configuration of a webcam view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebcamProps {
    /// Include an audio track in the request
    pub audio: bool,
    /// Mute the rendered video element
    pub muted: bool,
    /// Fired once on the first successful acquisition
    #[serde(skip)]
    pub on_user_media: UserMediaCallback,
    pub height: Dimension,
    pub width: Dimension,
    /// Format of `get_screenshot` data URLs
    pub screenshot_format: ScreenshotFormat,
    /// Inline style passed through to the video element
    pub style: BTreeMap<String, String>,
    /// Class attribute passed through to the video element
    pub class_name: String,
    /// Explicit audio device; used only together with `video_source`
    pub audio_source: Option<String>,
    /// Explicit video device; used only together with `audio_source`
    pub video_source: Option<String>,
}

impl Default for WebcamProps {
    fn default() -> Self {
        Self {
            audio: true,
            muted: false,
            on_user_media: UserMediaCallback::default(),
            height: Dimension::Pixels(DEFAULT_HEIGHT),
            width: Dimension::Pixels(DEFAULT_WIDTH),
            screenshot_format: ScreenshotFormat::default(),
            style: BTreeMap::new(),
            class_name: String::new(),
            audio_source: None,
            video_source: None,
        }
    }
}

impl WebcamProps {
    /// Replace the acquisition callback
    pub fn on_user_media(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_user_media = UserMediaCallback::new(callback);
        self
    }
}

/// Persisted configuration for the `webcam` binary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version of the file
    pub version: u32,
    /// Props applied to every instance the binary mounts
    pub props: WebcamProps,
    /// Host used to satisfy media requests
    pub host: HostKind,
    /// Image directory served by the directory host
    pub image_directory: Option<PathBuf>,
    /// Where snapshots are written (defaults to the pictures directory)
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            props: WebcamProps::default(),
            host: HostKind::default(),
            image_directory: None,
            snapshot_dir: None,
        }
    }
}

impl Config {
    pub const VERSION: u32 = 1;

    /// Location of the config file, if the platform has a config directory
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_ID).join(app_info::CONFIG_FILE))
    }

    /// Load the user's config, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load a config file from an explicit path
    pub fn load_from(path: &Path) -> WebcamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;

        if config.version > Self::VERSION {
            warn!(
                found = config.version,
                supported = Self::VERSION,
                "Config written by a newer version"
            );
        }

        Ok(config)
    }

    /// Save to the default location
    pub fn save(&self) -> WebcamResult<()> {
        let path = Self::path()
            .ok_or_else(|| WebcamError::Config("No config directory available".to_string()))?;
        self.save_to(&path)
    }

    /// Save to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> WebcamResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }
}
