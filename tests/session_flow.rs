//! End-to-end booth sessions driven by a scripted camera and preview.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crabbooth::invariant_ppt::{clear_invariant_log, contract_test};
use crabbooth::session::{announcement, CaptureSession, SessionSettings, TerminationReason};
use crabbooth::storage::photo_filename;
use crabbooth::testing::{synthetic_video_frame, ScriptStep, ScriptedCamera, ScriptedPreview};
use crabbooth::{BoothCommand, BoothError};

const W: u32 = 64;
const H: u32 = 48;

fn settings(dir: &Path) -> SessionSettings {
    SessionSettings {
        output_directory: dir.join("photos"),
        capture_pause: Duration::ZERO,
        ..SessionSettings::default()
    }
}

fn photos_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read output dir")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn not_interrupted() -> AtomicBool {
    AtomicBool::new(false)
}

#[test]
fn n_captures_produce_n_distinct_files() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::endless(W, H);
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Capture; 4]);

    let summary = session.run(&mut preview, &not_interrupted());

    assert_eq!(summary.photo_count, 4);
    assert_eq!(summary.termination, TerminationReason::Quit);

    let names = photos_in(&tmp.path().join("photos"));
    assert_eq!(names.len(), 4);
    for (i, name) in names.iter().enumerate() {
        assert!(
            name.starts_with(&format!("photo_{:03}_", i + 1)),
            "unexpected name {}",
            name
        );
        assert!(name.ends_with(".jpg"));
    }
    assert_eq!(summary.saved().len(), 4);
}

#[test]
fn one_capture_then_quit() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::endless(W, H);
    let releases = camera.release_counter();
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Capture, BoothCommand::Quit]);

    let summary = session.run(&mut preview, &not_interrupted());

    assert_eq!(photos_in(&tmp.path().join("photos")).len(), 1);
    assert_eq!(releases.get(), 1);
    assert_eq!(preview.close_calls, 1);

    let lines = summary.lines();
    assert!(lines.contains(&"Total photos taken: 1".to_string()));
    let dir_line = format!("Photos saved in: {}/", tmp.path().join("photos").display());
    assert!(lines.contains(&dir_line), "missing {:?} in {:?}", dir_line, lines);
    assert!(preview.has_status_containing("Taking photo"));
    assert!(preview.has_status_containing("Photo saved: "));
}

#[test]
fn immediate_quit_creates_directory_and_no_photos() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("photos");
    assert!(!out.exists());

    let session =
        CaptureSession::open(|| Ok(ScriptedCamera::endless(W, H)), settings(tmp.path())).unwrap();
    assert!(session.directory_created());
    assert!(out.is_dir());

    let mut preview = ScriptedPreview::keys([BoothCommand::Quit]);
    let summary = session.run(&mut preview, &not_interrupted());

    assert_eq!(summary.photo_count, 0);
    assert!(photos_in(&out).is_empty());
    assert!(summary
        .lines()
        .contains(&announcement("Thanks for trying the photo booth!")));
}

#[test]
fn existing_directory_is_reused() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("photos")).unwrap();

    let session =
        CaptureSession::open(|| Ok(ScriptedCamera::endless(W, H)), settings(tmp.path())).unwrap();
    assert!(!session.directory_created());
}

#[test]
fn unavailable_device_is_fatal_and_leaves_no_directory() {
    let tmp = tempfile::tempdir().unwrap();

    let result = CaptureSession::<ScriptedCamera>::open(
        || Err(BoothError::DeviceUnavailable("no camera at index 0".into())),
        settings(tmp.path()),
    );

    assert!(matches!(result, Err(BoothError::DeviceUnavailable(_))));
    assert!(!tmp.path().join("photos").exists());
}

#[test]
fn frame_failure_on_third_read_keeps_two_photos() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::failing_after(2, W, H);
    let releases = camera.release_counter();
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Capture, BoothCommand::Capture]);

    let summary = session.run(&mut preview, &not_interrupted());

    assert_eq!(summary.photo_count, 2);
    assert!(matches!(
        summary.termination,
        TerminationReason::FrameReadFailure(_)
    ));
    assert_eq!(photos_in(&tmp.path().join("photos")).len(), 2);
    assert_eq!(releases.get(), 1);
    assert_eq!(preview.polls, 2, "the failed read must not be followed by a poll");
    assert!(summary.lines()[0].starts_with("Could not read from camera: "));
}

#[test]
fn summary_lists_each_capture_and_the_read_failure_cause() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::failing_after(1, W, H);
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Capture]);

    let summary = session.run(&mut preview, &not_interrupted());
    let text = summary.to_string();

    let saved = summary.saved()[0].to_path_buf();
    assert!(
        text.contains(&format!("Photo saved: {}", saved.display())),
        "no per-photo line in {}",
        text
    );
    assert!(text.contains("scripted camera disconnected"));
}

#[test]
fn device_released_once_on_every_exit_path() {
    // Quit key
    {
        let tmp = tempfile::tempdir().unwrap();
        let camera = ScriptedCamera::endless(W, H);
        let releases = camera.release_counter();
        let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
        session.run(&mut ScriptedPreview::keys([BoothCommand::Quit]), &not_interrupted());
        assert_eq!(releases.get(), 1, "quit");
    }

    // Device failure
    {
        let tmp = tempfile::tempdir().unwrap();
        let camera = ScriptedCamera::failing_after(0, W, H);
        let releases = camera.release_counter();
        let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
        let summary = session.run(&mut ScriptedPreview::empty(), &not_interrupted());
        assert!(matches!(
            summary.termination,
            TerminationReason::FrameReadFailure(_)
        ));
        assert_eq!(releases.get(), 1, "device failure");
    }

    // External interrupt raised between frames
    {
        let tmp = tempfile::tempdir().unwrap();
        let camera = ScriptedCamera::endless(W, H);
        let releases = camera.release_counter();
        let interrupt = Arc::new(AtomicBool::new(false));
        let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
        let mut preview = ScriptedPreview::new([
            ScriptStep::Key(BoothCommand::Capture),
            ScriptStep::Idle,
            ScriptStep::RaiseInterrupt,
            ScriptStep::Key(BoothCommand::Capture),
        ])
        .with_interrupt(interrupt.clone());

        let summary = session.run(&mut preview, &interrupt);

        assert_eq!(summary.termination, TerminationReason::Interrupted);
        assert_eq!(summary.photo_count, 1, "capture after the interrupt must not run");
        assert_eq!(preview.polls, 3);
        assert_eq!(releases.get(), 1, "interrupt");
        assert_eq!(summary.lines()[0], "Booth stopped by user");
    }

    // Ctrl-C delivered as a key in raw mode
    {
        let tmp = tempfile::tempdir().unwrap();
        let camera = ScriptedCamera::endless(W, H);
        let releases = camera.release_counter();
        let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
        let summary = session.run(
            &mut ScriptedPreview::keys([BoothCommand::Interrupt]),
            &not_interrupted(),
        );
        assert_eq!(summary.termination, TerminationReason::Interrupted);
        assert_eq!(releases.get(), 1, "interrupt key");
    }
}

#[test]
fn interrupt_before_first_frame_reads_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::endless(W, H);
    let releases = camera.release_counter();
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::empty();

    let summary = session.run(&mut preview, &AtomicBool::new(true));

    assert_eq!(summary.termination, TerminationReason::Interrupted);
    assert!(preview.presented.is_empty());
    assert_eq!(releases.get(), 1);
}

#[test]
fn display_failure_ends_session_and_releases() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::endless(W, H);
    let releases = camera.release_counter();
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Capture]).failing_present();

    let summary = session.run(&mut preview, &not_interrupted());

    assert!(matches!(
        summary.termination,
        TerminationReason::DisplayFailure(_)
    ));
    assert_eq!(summary.photo_count, 0);
    assert_eq!(releases.get(), 1);
    assert_eq!(preview.close_calls, 1);
}

#[test]
fn failed_save_consumes_a_counter_value_and_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("photos");
    let session =
        CaptureSession::open(|| Ok(ScriptedCamera::endless(W, H)), settings(tmp.path())).unwrap();

    // Replace the output directory with a plain file so every write fails
    fs::remove_dir(&out).unwrap();
    fs::write(&out, b"not a directory").unwrap();

    let mut preview = ScriptedPreview::keys([BoothCommand::Capture, BoothCommand::Capture]);
    let summary = session.run(&mut preview, &not_interrupted());

    assert_eq!(summary.photo_count, 2);
    assert_eq!(summary.failed_saves(), 2);
    assert!(summary.saved().is_empty());
    assert_eq!(summary.termination, TerminationReason::Quit);
    assert!(preview.has_status_containing("Error saving photo"));
    assert!(summary
        .lines()
        .contains(&"Photos that failed to save: 2".to_string()));
    let errors = summary
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("Error saving photo: "))
        .count();
    assert_eq!(errors, 2);
}

#[test]
fn preview_is_mirrored_and_overlaid_and_saved_as_shown() {
    let tmp = tempfile::tempdir().unwrap();
    let camera = ScriptedCamera::endless(640, 480);
    let session = CaptureSession::open(|| Ok(camera), settings(tmp.path())).unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Capture]);

    let summary = session.run(&mut preview, &not_interrupted());

    let shown = &preview.presented[0];
    assert_eq!(shown.dimensions(), (640, 480));

    // Row 200 is clear of the overlay, so it is the raw frame mirrored
    let raw = synthetic_video_frame(1, 640, 480);
    assert_eq!(shown.image.get_pixel(0, 200), raw.image.get_pixel(639, 200));
    assert_eq!(shown.image.get_pixel(639, 200), raw.image.get_pixel(0, 200));

    // Overlay pixels differ from the raw frame in the title band
    let touched = (0..640).any(|x| shown.image.get_pixel(x, 20) != raw.image.get_pixel(639 - x, 20));
    assert!(touched);

    let path = summary.saved()[0];
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        photo_filename("photo", 1, &shown.timestamp.naive_local()),
        "photo is named after the frame it came from"
    );
    let saved = image::open(path).expect("decode saved photo");
    assert_eq!((saved.width(), saved.height()), (640, 480));
}

#[test]
fn unmirrored_when_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    let session = CaptureSession::open(
        || Ok(ScriptedCamera::endless(640, 480)),
        SessionSettings {
            mirror: false,
            ..settings(tmp.path())
        },
    )
    .unwrap();
    let mut preview = ScriptedPreview::keys([BoothCommand::Quit]);
    session.run(&mut preview, &not_interrupted());

    let raw = synthetic_video_frame(1, 640, 480);
    assert_eq!(
        preview.presented[0].image.get_pixel(0, 200),
        raw.image.get_pixel(0, 200)
    );
}

#[test]
fn contract_capture_checks_counter_and_overlay_invariants() {
    clear_invariant_log();
    let tmp = tempfile::tempdir().unwrap();
    let session =
        CaptureSession::open(|| Ok(ScriptedCamera::endless(W, H)), settings(tmp.path())).unwrap();
    session.run(
        &mut ScriptedPreview::keys([BoothCommand::Capture]),
        &not_interrupted(),
    );

    contract_test(
        "booth capture",
        &[
            "Photo counter strictly increases",
            "Overlay rendering never changes frame dimensions",
        ],
    );
}
