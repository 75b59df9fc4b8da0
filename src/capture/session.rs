// SPDX-License-Identifier: GPL-3.0-only

//! Shared capture session
//!
//! One `CaptureSession` is shared by every webcam instance that should see the
//! same hardware stream. It keeps the mounted instances in mount order, issues
//! at most one acquisition per epoch, fans the result out to whoever is mounted
//! when the host answers, and tears the stream down when the last instance
//! holding it unmounts.
//!
//! Instances mounted after the stream was delivered are attached to it
//! immediately.
//!
//! The "acquisition in flight" flag is set when a request is issued and is only
//! cleared by that final teardown. A failed acquisition therefore blocks new
//! attempts for the rest of the session.

use super::selection::{self, SourcePreferences};
use crate::backends::{MediaHost, MediaStream};
use crate::errors::MediaResult;
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifier of a mounted instance
pub type InstanceId = Uuid;

/// Receives the outcome of an acquisition
pub trait StreamSubscriber: Send + Sync {
    fn handle_stream(&self, result: MediaResult<MediaStream>);
}

/// What an unmounting instance was displaying
#[derive(Debug, Clone)]
pub struct AttachedStream {
    pub stream: MediaStream,
    pub src: String,
}

struct Subscriber {
    id: InstanceId,
    instance: Weak<dyn StreamSubscriber>,
}

/// Internal session state
#[derive(Default)]
struct SessionState {
    /// Mounted instances in mount order
    subscribers: Vec<Subscriber>,
    /// Number of mounted instances
    mount_count: usize,
    /// An acquisition was issued for the current epoch
    in_flight: bool,
    /// The stream delivered in the current epoch
    active: Option<MediaStream>,
    /// Spawned acquisition task, awaited by `settled`
    pending: Option<JoinHandle<()>>,
}

struct SessionInner {
    host: Arc<dyn MediaHost>,
    runtime: Option<Handle>,
    state: Mutex<SessionState>,
}

/// Capture session shared by webcam instances
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<SessionInner>,
}

impl CaptureSession {
    /// Create a session over a host
    ///
    /// Acquisitions are spawned on the current tokio runtime when there is one,
    /// and otherwise run to completion on the thread that mounts the instance.
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self::build(host, Handle::try_current().ok())
    }

    /// Create a session that spawns acquisitions on a specific runtime
    pub fn with_runtime(host: Arc<dyn MediaHost>, runtime: Handle) -> Self {
        Self::build(host, Some(runtime))
    }

    fn build(host: Arc<dyn MediaHost>, runtime: Option<Handle>) -> Self {
        info!(host = host.name(), spawned = runtime.is_some(), "Creating capture session");
        Self {
            inner: Arc::new(SessionInner {
                host,
                runtime,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    pub fn host(&self) -> Arc<dyn MediaHost> {
        Arc::clone(&self.inner.host)
    }

    /// Number of mounted instances
    pub fn mounted_count(&self) -> usize {
        self.inner.state.lock().unwrap().mount_count
    }

    pub fn is_acquisition_in_flight(&self) -> bool {
        self.inner.state.lock().unwrap().in_flight
    }

    /// The stream delivered in the current epoch, if any
    pub fn active_stream(&self) -> Option<MediaStream> {
        self.inner.state.lock().unwrap().active.clone()
    }

    /// Add a mounted instance and start an acquisition if none is under way
    ///
    /// An instance mounted after this epoch's stream was delivered is handed
    /// that stream immediately instead of waiting for a new acquisition.
    ///
    /// Returns `false` if the host has no user media support, in which case
    /// the instance is not registered.
    pub fn register(
        &self,
        id: InstanceId,
        instance: Weak<dyn StreamSubscriber>,
        prefs: &SourcePreferences,
    ) -> bool {
        if !self.inner.host.supports_user_media() {
            debug!(instance = %id, host = self.inner.host.name(), "Host has no user media support");
            return false;
        }

        let late = instance.clone();
        let (should_acquire, active) = {
            let mut state = self.inner.state.lock().unwrap();
            state.subscribers.push(Subscriber { id, instance });
            state.mount_count += 1;

            debug!(instance = %id, mounted = state.mount_count, "Instance registered");

            if !state.in_flight && state.active.is_none() {
                state.in_flight = true;
                (true, None)
            } else {
                (false, state.active.clone())
            }
        };

        if should_acquire {
            self.acquire(prefs.clone());
        } else if let (Some(stream), Some(subscriber)) = (active, late.upgrade()) {
            // Mounted after the stream was delivered: share it right away
            debug!(instance = %id, stream = %stream.id(), "Attaching active stream");
            subscriber.handle_stream(Ok(stream));
        }
        true
    }

    /// Remove an unmounting instance
    ///
    /// When the registry empties and the instance held the stream, the stream
    /// is released, its object URL revoked and the epoch ends.
    pub fn unregister(&self, id: InstanceId, attached: Option<AttachedStream>) {
        let release = {
            let mut state = self.inner.state.lock().unwrap();
            let before = state.subscribers.len();
            state.subscribers.retain(|s| s.id != id);
            if state.subscribers.len() == before {
                return;
            }
            state.mount_count -= 1;

            debug!(instance = %id, mounted = state.mount_count, "Instance unregistered");

            if state.mount_count == 0 && attached.is_some() {
                state.in_flight = false;
                state.active = None;
                attached
            } else {
                None
            }
        };

        if let Some(attached) = release {
            info!(stream = %attached.stream.id(), "Last instance unmounted, releasing stream");
            attached.stream.release();
            self.inner.host.revoke_object_url(&attached.src);
        }
    }

    /// Wait for a spawned acquisition to finish distributing its result
    pub async fn settled(&self) {
        let pending = self.inner.state.lock().unwrap().pending.take();
        if let Some(task) = pending {
            if let Err(e) = task.await {
                warn!(error = %e, "Acquisition task failed");
            }
        }
    }

    fn acquire(&self, prefs: SourcePreferences) {
        info!(
            host = self.inner.host.name(),
            audio = prefs.audio,
            "Acquiring shared capture stream"
        );

        let host = self.host();
        let session = Arc::downgrade(&self.inner);
        let task = async move {
            let Some(result) = selection::request_stream(host, prefs).await else {
                return;
            };
            match session.upgrade() {
                Some(inner) => inner.distribute(result),
                None => {
                    if let Ok(stream) = result {
                        warn!(
                            stream = %stream.id(),
                            "Session dropped before stream arrived, releasing"
                        );
                        stream.release();
                    }
                }
            }
        };

        match &self.inner.runtime {
            Some(runtime) => {
                let handle = runtime.spawn(task);
                self.inner.state.lock().unwrap().pending = Some(handle);
            }
            None => futures::executor::block_on(task),
        }
    }
}

impl SessionInner {
    fn is_registered(&self, id: InstanceId) -> bool {
        let state = self.state.lock().unwrap();
        state.subscribers.iter().any(|s| s.id == id)
    }

    /// Deliver an acquisition result to every instance mounted right now
    ///
    /// Membership is checked again before each delivery, so an instance that
    /// unmounts while earlier recipients are being notified is skipped.
    fn distribute(&self, result: MediaResult<MediaStream>) {
        let recipients: Vec<(InstanceId, Arc<dyn StreamSubscriber>)> = {
            let mut state = self.state.lock().unwrap();
            let recipients: Vec<_> = state
                .subscribers
                .iter()
                .filter_map(|s| s.instance.upgrade().map(|instance| (s.id, instance)))
                .collect();
            if let Ok(stream) = &result {
                if !recipients.is_empty() {
                    state.active = Some(stream.clone());
                }
            }
            recipients
        };

        match &result {
            Ok(stream) if recipients.is_empty() => {
                warn!(stream = %stream.id(), "No mounted instance for stream, releasing");
                stream.release();
                return;
            }
            Ok(stream) => {
                debug!(stream = %stream.id(), recipients = recipients.len(), "Distributing stream");
            }
            Err(e) => {
                warn!(error = %e, recipients = recipients.len(), "Acquisition failed");
            }
        }

        for (id, recipient) in recipients {
            if !self.is_registered(id) {
                debug!(instance = %id, "Instance unmounted during fan-out, skipping");
                continue;
            }
            recipient.handle_stream(result.clone());
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().unwrap();
        f.debug_struct("CaptureSession")
            .field("host", &self.inner.host.name())
            .field("mounted", &state.mount_count)
            .field("in_flight", &state.in_flight)
            .field("active", &state.active.as_ref().map(|s| s.id()))
            .finish()
    }
}
