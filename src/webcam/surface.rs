// SPDX-License-Identifier: GPL-3.0-only

//! Offscreen drawing surface and data URL export

use crate::config::ScreenshotFormat;
use crate::constants::snapshot;
use crate::errors::{SnapshotError, SnapshotResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Offscreen RGBA bitmap used to rasterize video frames
///
/// Clones share the same pixels.
#[derive(Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Arc<Mutex<RgbaImage>>,
}

impl Canvas {
    /// Whether a surface of this size can be allocated
    ///
    /// Each side is capped at `MAX_SURFACE_DIMENSION` and the total area at
    /// `MAX_SURFACE_AREA`.
    pub fn fits(width: u32, height: u32) -> bool {
        if width > snapshot::MAX_SURFACE_DIMENSION || height > snapshot::MAX_SURFACE_DIMENSION {
            return false;
        }
        (width as u64)
            .checked_mul(height as u64)
            .is_some_and(|area| area <= snapshot::MAX_SURFACE_AREA)
    }

    /// Transparent surface of the given size
    ///
    /// Callers check [`Canvas::fits`] first; oversized surfaces panic on
    /// allocation.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Arc::new(Mutex::new(RgbaImage::new(width, height))),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Draw a frame stretched over the whole surface
    pub fn draw_image(&self, frame: &RgbaImage) {
        if self.width == 0 || self.height == 0 || frame.width() == 0 || frame.height() == 0 {
            return;
        }

        let mut pixels = self.pixels.lock().unwrap();
        if frame.dimensions() == (self.width, self.height) {
            pixels.copy_from_slice(frame.as_raw());
        } else {
            *pixels = imageops::resize(frame, self.width, self.height, FilterType::Triangle);
        }
    }

    /// Copy of the current pixels
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.lock().unwrap().clone()
    }

    /// Encode the surface as a `data:` URL
    ///
    /// A surface without pixels yields `data:,`.
    pub fn to_data_url(&self, format: ScreenshotFormat) -> SnapshotResult<String> {
        if self.width == 0 || self.height == 0 {
            return Ok(snapshot::EMPTY_DATA_URL.to_string());
        }

        let bytes = encode(&self.snapshot(), format)?;
        debug!(
            format = %format,
            width = self.width,
            height = self.height,
            size = bytes.len(),
            "Encoded snapshot"
        );

        Ok(format!(
            "{}{}{}{}",
            snapshot::DATA_URL_SCHEME,
            format.mime_type(),
            snapshot::BASE64_MARKER,
            BASE64.encode(bytes)
        ))
    }

    /// True if both handles refer to the same surface
    pub fn ptr_eq(a: &Canvas, b: &Canvas) -> bool {
        Arc::ptr_eq(&a.pixels, &b.pixels)
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Encode RGBA pixels in the requested format
pub fn encode(image: &RgbaImage, format: ScreenshotFormat) -> SnapshotResult<Vec<u8>> {
    let mut buffer = Vec::new();

    match format {
        ScreenshotFormat::Png => {
            image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        }
        ScreenshotFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, snapshot::JPEG_QUALITY)
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
        }
        ScreenshotFormat::Webp => {
            image::codecs::webp::WebPEncoder::new_lossless(&mut buffer).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }

    if buffer.is_empty() {
        return Err(SnapshotError::EncodingFailed(format!(
            "{} encoder produced no data",
            format
        )));
    }
    Ok(buffer)
}
