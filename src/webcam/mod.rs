// SPDX-License-Identifier: GPL-3.0-only

//! Webcam view instances
//!
//! A [`Webcam`] registers with a [`CaptureSession`] when mounted, displays the
//! shared stream once the session delivers it, and can rasterize the current
//! frame into a cached offscreen [`Canvas`] for snapshots.
//!
//! ```text
//!  NoStream ──handle_stream(Ok)──▶ HasStream
//!     │
//!     └─────handle_stream(Err)──▶ Failed
//! ```
//!
//! The snapshot surface is sized on the first capture from the displayed width
//! and the stream's aspect ratio, then reused as-is for the instance's lifetime.

pub mod surface;
pub mod view;

pub use surface::Canvas;
pub use view::VideoElement;

use crate::backends::{MediaHost, MediaStream};
use crate::capture::{
    AttachedStream, CaptureSession, InstanceId, SourcePreferences, StreamSubscriber,
};
use crate::config::WebcamProps;
use crate::errors::{MediaResult, SnapshotError, SnapshotResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stream state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Waiting for the session (initial)
    #[default]
    NoStream,
    /// Displaying the shared stream
    HasStream,
    /// The acquisition failed; renders like `NoStream`
    Failed,
}

#[derive(Default)]
struct InstanceState {
    stream_state: StreamState,
    stream: Option<MediaStream>,
    src: Option<String>,
    surface: Option<Canvas>,
    notified: bool,
    container_width: Option<u32>,
}

/// Per-instance state reachable from the session's fan-out
struct InstanceCore {
    id: InstanceId,
    props: WebcamProps,
    host: Arc<dyn MediaHost>,
    state: Mutex<InstanceState>,
    unmounted: AtomicBool,
}

impl StreamSubscriber for InstanceCore {
    fn handle_stream(&self, result: MediaResult<MediaStream>) {
        if self.unmounted.load(Ordering::SeqCst) {
            debug!(instance = %self.id, "Ignoring stream for unmounted instance");
            return;
        }

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                warn!(instance = %self.id, error = %e, "No stream for instance");
                self.state.lock().unwrap().stream_state = StreamState::Failed;
                return;
            }
        };

        let src = self.host.create_object_url(&stream);
        let first = {
            let mut state = self.state.lock().unwrap();
            state.stream = Some(stream);
            state.src = Some(src);
            state.stream_state = StreamState::HasStream;
            !std::mem::replace(&mut state.notified, true)
        };

        debug!(instance = %self.id, "Stream attached");
        if first {
            self.props.on_user_media.call();
        }
    }
}

/// A mounted webcam view
///
/// Dropping the value unmounts it.
pub struct Webcam {
    core: Arc<InstanceCore>,
    session: CaptureSession,
    registered: bool,
}

impl Webcam {
    /// Mount a new instance on a session
    pub fn mount(session: &CaptureSession, props: WebcamProps) -> Self {
        let core = Arc::new(InstanceCore {
            id: Uuid::new_v4(),
            host: session.host(),
            state: Mutex::new(InstanceState::default()),
            unmounted: AtomicBool::new(false),
            props,
        });

        let prefs = SourcePreferences::from(&core.props);
        let subscriber: Weak<dyn StreamSubscriber> = Arc::downgrade(&core) as Weak<_>;
        let registered = session.register(core.id, subscriber, &prefs);

        debug!(instance = %core.id, registered, "Webcam mounted");

        Self {
            core,
            session: session.clone(),
            registered,
        }
    }

    /// Unmount explicitly; equivalent to dropping
    pub fn unmount(self) {
        drop(self)
    }

    pub fn id(&self) -> InstanceId {
        self.core.id
    }

    pub fn props(&self) -> &WebcamProps {
        &self.core.props
    }

    pub fn state(&self) -> StreamState {
        self.core.state.lock().unwrap().stream_state
    }

    pub fn has_stream(&self) -> bool {
        self.state() == StreamState::HasStream
    }

    /// The attached stream handle
    pub fn stream(&self) -> Option<MediaStream> {
        self.core.state.lock().unwrap().stream.clone()
    }

    /// Object URL of the attached stream
    pub fn src(&self) -> Option<String> {
        self.core.state.lock().unwrap().src.clone()
    }

    /// Layout width of the container, used to resolve percentage widths
    pub fn set_container_width(&self, width: u32) {
        self.core.state.lock().unwrap().container_width = Some(width);
    }

    /// Describe the element to display
    pub fn render(&self) -> VideoElement {
        let state = self.core.state.lock().unwrap();
        let src = match state.stream_state {
            StreamState::HasStream => state.src.clone(),
            StreamState::NoStream | StreamState::Failed => None,
        };
        VideoElement::new(&self.core.props, src)
    }

    /// Current frame as a data URL in the configured format
    ///
    /// `None` unless the instance has a stream.
    pub fn get_screenshot(&self) -> Option<String> {
        self.try_screenshot()
            .map_err(|e| debug!(instance = %self.core.id, error = %e, "No screenshot"))
            .ok()
    }

    /// The snapshot surface with the current frame drawn into it
    ///
    /// `None` unless the instance has a stream.
    pub fn get_canvas(&self) -> Option<Canvas> {
        self.try_canvas()
            .map_err(|e| debug!(instance = %self.core.id, error = %e, "No canvas"))
            .ok()
    }

    pub fn try_screenshot(&self) -> SnapshotResult<String> {
        let canvas = self.try_canvas()?;
        canvas.to_data_url(self.core.props.screenshot_format)
    }

    pub fn try_canvas(&self) -> SnapshotResult<Canvas> {
        let (stream, cached, container_width) = {
            let state = self.core.state.lock().unwrap();
            match (&state.stream_state, &state.stream) {
                (StreamState::HasStream, Some(stream)) => {
                    (stream.clone(), state.surface.clone(), state.container_width)
                }
                _ => return Err(SnapshotError::NoStream),
            }
        };

        let canvas = match cached {
            Some(canvas) => canvas,
            None => self.create_surface(&stream, container_width)?,
        };

        match stream.current_frame() {
            Some(frame) => canvas.draw_image(&frame),
            None => debug!(instance = %self.core.id, "No frame to draw yet"),
        }

        Ok(canvas)
    }

    /// Width the video occupies on screen
    fn displayed_width(&self, container_width: Option<u32>, native_width: u32) -> u32 {
        self.core
            .props
            .width
            .resolve(container_width)
            .unwrap_or(native_width)
    }

    fn create_surface(
        &self,
        stream: &MediaStream,
        container_width: Option<u32>,
    ) -> SnapshotResult<Canvas> {
        let (native_width, native_height) = stream.native_size();
        if native_width == 0 || native_height == 0 {
            return Err(SnapshotError::NoVideoDimensions);
        }

        let width = self.displayed_width(container_width, native_width);
        let aspect_ratio = native_width as f64 / native_height as f64;
        let height = (width as f64 / aspect_ratio) as u32;
        if !Canvas::fits(width, height) {
            warn!(instance = %self.core.id, width, height, "Snapshot surface too large");
            return Err(SnapshotError::SurfaceTooLarge { width, height });
        }

        info!(instance = %self.core.id, width, height, "Creating snapshot surface");
        let canvas = self.core.host.create_surface(width, height);

        let mut state = self.core.state.lock().unwrap();
        Ok(state.surface.get_or_insert(canvas).clone())
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        self.core.unmounted.store(true, Ordering::SeqCst);

        let attached = {
            let state = self.core.state.lock().unwrap();
            match (&state.stream_state, &state.stream, &state.src) {
                (StreamState::HasStream, Some(stream), Some(src)) => Some(AttachedStream {
                    stream: stream.clone(),
                    src: src.clone(),
                }),
                _ => None,
            }
        };

        debug!(instance = %self.core.id, had_stream = attached.is_some(), "Webcam unmounting");
        self.session.unregister(self.core.id, attached);
    }
}

impl std::fmt::Debug for Webcam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webcam")
            .field("id", &self.core.id)
            .field("state", &self.state())
            .field("registered", &self.registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::TestPatternHost;
    use crate::config::ScreenshotFormat;

    #[test]
    fn test_pattern_host_round_trip() {
        let host = Arc::new(TestPatternHost::with_size(16, 8));
        let session = CaptureSession::new(host.clone());

        let view = Webcam::mount(
            &session,
            WebcamProps {
                screenshot_format: ScreenshotFormat::Png,
                ..WebcamProps::default()
            },
        );
        assert!(view.has_stream());
        assert_eq!(host.live_object_urls(), 1);

        let canvas = view.get_canvas().unwrap();
        assert_eq!((canvas.width(), canvas.height()), (640, 320));
        assert!(view.get_screenshot().unwrap().starts_with("data:image/png;base64,"));

        view.unmount();
        assert_eq!(host.live_object_urls(), 0);
        assert!(!session.is_acquisition_in_flight());
    }

    #[test]
    fn test_render_binds_src_only_with_stream() {
        let session = CaptureSession::new(Arc::new(TestPatternHost::with_size(4, 4)));
        let view = Webcam::mount(&session, WebcamProps::default());

        let element = view.render();
        assert!(element.autoplay);
        assert_eq!(element.src, view.src());
        assert!(element.src.is_some());
    }
}
