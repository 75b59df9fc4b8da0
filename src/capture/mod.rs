// SPDX-License-Identifier: GPL-3.0-only

//! Shared stream acquisition
//!
//! - [`session`]: registry of mounted instances, acquisition and teardown
//! - [`selection`]: device selection tiers and request constraints

pub mod selection;
pub mod session;

pub use selection::{SelectedSources, SelectionTier, SourcePreferences};
pub use session::{AttachedStream, CaptureSession, InstanceId, StreamSubscriber};
