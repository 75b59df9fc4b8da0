// SPDX-License-Identifier: MPL-2.0

//! Integration tests for shared stream acquisition and teardown

mod common;

use common::MockHost;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use webcam::backends::{DeviceKind, MediaDeviceInfo};
use webcam::{CaptureSession, MediaStream, StreamState, Webcam, WebcamProps};

fn session_with(host: &Arc<MockHost>) -> CaptureSession {
    CaptureSession::new(host.clone())
}

#[test]
fn test_many_mounts_issue_one_request() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);

    let views: Vec<Webcam> = (0..5)
        .map(|_| Webcam::mount(&session, WebcamProps::default()))
        .collect();

    assert_eq!(host.request_count(), 1);
    assert_eq!(session.mounted_count(), 5);

    let first = views[0].stream().expect("first view should have a stream");
    for view in &views {
        assert_eq!(view.state(), StreamState::HasStream);
        let stream = view.stream().unwrap();
        assert!(MediaStream::ptr_eq(&stream, &first));
    }
}

#[tokio::test]
async fn test_instances_mounted_while_pending_receive_stream() {
    let host = Arc::new(MockHost::granting().gated());
    let session = session_with(&host);

    let a = Webcam::mount(&session, WebcamProps::default());
    let b = Webcam::mount(&session, WebcamProps::default());
    assert_eq!(a.state(), StreamState::NoStream);
    assert_eq!(b.state(), StreamState::NoStream);
    assert!(session.is_acquisition_in_flight());

    host.open_gate();
    session.settled().await;

    assert_eq!(host.request_count(), 1);
    assert!(a.has_stream());
    assert!(b.has_stream());
    assert!(MediaStream::ptr_eq(&a.stream().unwrap(), &b.stream().unwrap()));
}

#[tokio::test]
async fn test_unmounted_while_pending_is_skipped() {
    let host = Arc::new(MockHost::granting().gated());
    let session = session_with(&host);

    let a = Webcam::mount(&session, WebcamProps::default());
    let b = Webcam::mount(&session, WebcamProps::default());
    b.unmount();

    host.open_gate();
    session.settled().await;

    assert!(a.has_stream());
    assert_eq!(session.mounted_count(), 1);
    assert_eq!(host.created_urls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_instance_unmounted_during_fan_out_is_not_notified() {
    let host = Arc::new(MockHost::granting().gated());
    let session = session_with(&host);

    let sibling: Arc<Mutex<Option<Webcam>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&sibling);
    let a = Webcam::mount(
        &session,
        WebcamProps::default().on_user_media(move || {
            let b = slot.lock().unwrap().take();
            drop(b);
        }),
    );

    let b_fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&b_fired);
    let b = Webcam::mount(
        &session,
        WebcamProps::default().on_user_media(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    *sibling.lock().unwrap() = Some(b);

    host.open_gate();
    session.settled().await;

    assert!(a.has_stream());
    assert!(sibling.lock().unwrap().is_none());
    assert_eq!(session.mounted_count(), 1);
    assert_eq!(b_fired.load(Ordering::SeqCst), 0);
    assert_eq!(host.created_urls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stream_arriving_after_everyone_left_is_released() {
    let host = Arc::new(MockHost::granting().gated());
    let session = session_with(&host);

    let a = Webcam::mount(&session, WebcamProps::default());
    a.unmount();

    host.open_gate();
    session.settled().await;

    let stream = host.last_stream().unwrap();
    assert!(stream.video_tracks().iter().all(|t| t.is_stopped()));
    assert!(session.active_stream().is_none());

    // The epoch was never torn down, so no new request is made
    assert!(session.is_acquisition_in_flight());
    let c = Webcam::mount(&session, WebcamProps::default());
    assert_eq!(host.request_count(), 1);
    assert_eq!(c.state(), StreamState::NoStream);
}

#[test]
fn test_last_unmount_releases_once() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);

    let a = Webcam::mount(&session, WebcamProps::default());
    let b = Webcam::mount(&session, WebcamProps::default());
    let stream = a.stream().unwrap();
    let src = b.src().unwrap();

    a.unmount();
    assert!(host.revoked().is_empty());
    assert!(stream.video_tracks().iter().all(|t| !t.is_stopped()));

    b.unmount();
    assert_eq!(host.revoked(), vec![src]);
    for track in stream.video_tracks().iter().chain(stream.audio_tracks()) {
        assert_eq!(track.stop_calls(), 1);
    }
    assert!(!session.is_acquisition_in_flight());
    assert_eq!(session.mounted_count(), 0);
}

#[test]
fn test_remount_after_teardown_acquires_again() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);

    Webcam::mount(&session, WebcamProps::default()).unmount();
    let view = Webcam::mount(&session, WebcamProps::default());

    assert_eq!(host.request_count(), 2);
    assert!(view.has_stream());
}

#[test]
fn test_late_mount_shares_active_stream() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);

    let a = Webcam::mount(&session, WebcamProps::default());
    let b = Webcam::mount(&session, WebcamProps::default());
    a.unmount();

    // `b` now holds the stream, so its unmount tears the epoch down
    let stream = b.stream().unwrap();
    b.unmount();
    assert!(stream.video_tracks().iter().all(|t| t.is_stopped()));
    assert_eq!(host.revoked().len(), 1);
}

#[test]
fn test_legacy_stop_is_preferred() {
    let host = Arc::new(MockHost::granting().with_legacy_stop());
    let session = session_with(&host);

    let view = Webcam::mount(&session, WebcamProps::default());
    let stream = view.stream().unwrap();
    view.unmount();

    assert_eq!(host.legacy_stops.load(Ordering::SeqCst), 1);
    assert!(stream.video_tracks().iter().all(|t| !t.is_stopped()));
    assert_eq!(host.revoked().len(), 1);
}

#[test]
fn test_failure_marks_instances_failed_and_blocks_retry() {
    let host = Arc::new(MockHost::denying());
    let session = session_with(&host);

    let a = Webcam::mount(&session, WebcamProps::default());
    assert_eq!(a.state(), StreamState::Failed);
    assert!(!a.has_stream());
    assert_eq!(a.render().src, None);

    let b = Webcam::mount(&session, WebcamProps::default());
    assert_eq!(host.request_count(), 1);
    assert_eq!(b.state(), StreamState::NoStream);

    // Nobody held a stream, so unmounting everything does not reset the flag
    a.unmount();
    b.unmount();
    assert!(session.is_acquisition_in_flight());
    assert!(host.revoked().is_empty());
}

#[test]
fn test_enumeration_failure_leaves_no_stream() {
    let host = Arc::new(MockHost::granting().with_enumeration_error());
    let session = session_with(&host);

    let view = Webcam::mount(&session, WebcamProps::default());

    assert_eq!(host.request_count(), 0);
    assert_eq!(view.state(), StreamState::NoStream);
    assert!(session.is_acquisition_in_flight());
}

#[test]
fn test_enumeration_picks_first_device_of_each_kind() {
    let host = Arc::new(MockHost::granting().with_devices(vec![
        MediaDeviceInfo::new(DeviceKind::Video, "v1"),
        MediaDeviceInfo::new(DeviceKind::Audio, "a1"),
        MediaDeviceInfo::new(DeviceKind::Video, "v2"),
    ]));
    let session = session_with(&host);

    let _view = Webcam::mount(&session, WebcamProps::default());

    let request = host.last_request().unwrap();
    assert_eq!(request.video.source_id(), Some("v1"));
    assert_eq!(request.audio.unwrap().source_id(), Some("a1"));
}

#[test]
fn test_legacy_listing_used_without_enumeration() {
    let host = Arc::new(MockHost::granting().with_legacy_only(vec![
        MediaDeviceInfo::new(DeviceKind::Unknown, "speaker"),
        MediaDeviceInfo::new(DeviceKind::Audio, "a1"),
        MediaDeviceInfo::new(DeviceKind::Video, "v1"),
        MediaDeviceInfo::new(DeviceKind::Audio, "a2"),
    ]));
    let session = session_with(&host);

    let view = Webcam::mount(&session, WebcamProps::default());

    let request = host.last_request().unwrap();
    assert_eq!(request.video.source_id(), Some("v1"));
    assert_eq!(request.audio.unwrap().source_id(), Some("a1"));
    assert!(view.has_stream());
}

#[test]
fn test_no_listing_capability_requests_nothing() {
    let host = Arc::new(MockHost::granting().without_listing());
    let session = session_with(&host);

    let view = Webcam::mount(&session, WebcamProps::default());

    assert_eq!(host.request_count(), 0);
    assert_eq!(view.state(), StreamState::NoStream);
}

#[test]
fn test_explicit_sources_bypass_enumeration() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);
    let props = WebcamProps {
        audio_source: Some("usb-mic".into()),
        video_source: Some("usb-cam".into()),
        ..WebcamProps::default()
    };

    let _view = Webcam::mount(&session, props);

    assert_eq!(host.enumerations.load(Ordering::SeqCst), 0);
    let request = host.last_request().unwrap();
    assert_eq!(request.video.source_id(), Some("usb-cam"));
    assert_eq!(request.audio.unwrap().source_id(), Some("usb-mic"));
}

#[test]
fn test_single_explicit_source_falls_back_to_enumeration() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);
    let props = WebcamProps {
        video_source: Some("usb-cam".into()),
        ..WebcamProps::default()
    };

    let _view = Webcam::mount(&session, props);

    assert_eq!(host.enumerations.load(Ordering::SeqCst), 1);
    assert_eq!(host.last_request().unwrap().video.source_id(), Some("cam-1"));
}

#[test]
fn test_audio_disabled_sends_no_audio_constraint() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);
    let props = WebcamProps {
        audio: false,
        ..WebcamProps::default()
    };

    let view = Webcam::mount(&session, props);

    let request = host.last_request().unwrap();
    assert!(request.audio.is_none());
    assert!(view.stream().unwrap().audio_tracks().is_empty());
}

#[test]
fn test_unsupported_host_never_registers() {
    let host = Arc::new(MockHost::unsupported());
    let session = session_with(&host);

    let view = Webcam::mount(&session, WebcamProps::default());

    assert_eq!(session.mounted_count(), 0);
    assert_eq!(host.request_count(), 0);
    assert_eq!(view.state(), StreamState::NoStream);
    view.unmount();
    assert_eq!(session.mounted_count(), 0);
}

#[test]
fn test_on_user_media_fires_once_per_instance() {
    let host = Arc::new(MockHost::granting());
    let session = session_with(&host);
    let fired = Arc::new(AtomicUsize::new(0));

    let views: Vec<Webcam> = (0..3)
        .map(|_| {
            let fired = Arc::clone(&fired);
            let props = WebcamProps::default().on_user_media(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            Webcam::mount(&session, props)
        })
        .collect();

    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert!(views.iter().all(Webcam::has_stream));
}
