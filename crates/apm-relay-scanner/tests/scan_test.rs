//! End-to-end scans against scripted cameras.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use apm_relay_core::{Error, ScannerSettings};
use apm_relay_scanner::testing::{barcode_frame, blank_frame, ScriptedSource};
use apm_relay_scanner::{
    CameraSource, CancelToken, Code128Decoder, HeadlessSurface, ImageFolderCamera, ScanBackend,
    ScanRequest, Scanner,
};

fn scanner_over(source: &ScriptedSource, token: CancelToken) -> Scanner {
    let backend = ScanBackend::probe(
        Some(Arc::new(source.clone())),
        Some(Arc::new(Code128Decoder::new())),
        Some(Arc::new(HeadlessSurface::new(token))),
    );
    Scanner::new(ScannerSettings::default(), backend)
}

fn request(timeout_ms: u64) -> ScanRequest {
    ScanRequest::new(0, Duration::from_millis(timeout_ms))
}

#[test]
fn test_returns_value_after_blank_frames() {
    let source = ScriptedSource::new(vec![
        Some(blank_frame()),
        Some(blank_frame()),
        Some(barcode_frame("4410023")),
    ]);
    let scanner = scanner_over(&source, CancelToken::new());

    let value = scanner.scan_with(&request(5000)).unwrap();
    assert_eq!(value, "4410023");
    assert_eq!(source.opens(), 1);
    assert_eq!(source.releases(), 1);
}

#[test]
fn test_short_timeout_is_raised_to_one_second() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let scanner = scanner_over(&source, CancelToken::new());

    let started = Instant::now();
    let err = scanner.scan_with(&request(100)).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::Timeout(1000)), "got {err:?}");
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
    assert_eq!(source.releases(), 1);
}

#[test]
fn test_failed_reads_end_in_no_frame() {
    let source = ScriptedSource::new(vec![None]);
    let scanner = scanner_over(&source, CancelToken::new());

    let started = Instant::now();
    let err = scanner.scan_with(&request(10_000)).unwrap_err();

    assert!(matches!(err, Error::NoFrame));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(source.releases(), 1);
}

#[test]
fn test_brief_read_failures_are_tolerated() {
    let source = ScriptedSource::new(vec![None, None, None, Some(barcode_frame("77"))]);
    let scanner = scanner_over(&source, CancelToken::new());
    assert_eq!(scanner.scan_with(&request(2000)).unwrap(), "77");
}

#[test]
fn test_cancel_requested_before_open_is_honoured() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let token = CancelToken::new();
    let scanner = scanner_over(&source, token.clone());

    token.cancel();
    let started = Instant::now();
    let err = scanner.scan_with(&request(10_000)).unwrap_err();

    assert!(matches!(err, Error::CancelledByOperator));
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(source.releases(), 1);
}

#[test]
fn test_cancel_is_seen_while_reads_fail() {
    let source = ScriptedSource::new(vec![None]);
    let token = CancelToken::new();
    let scanner = scanner_over(&source, token.clone());

    token.cancel();
    let err = scanner.scan_with(&request(10_000)).unwrap_err();
    assert!(matches!(err, Error::CancelledByOperator));
    assert_eq!(source.releases(), 1);
}

#[test]
fn test_operator_cancel_releases_once() {
    let source = ScriptedSource::new(vec![Some(blank_frame())]);
    let token = CancelToken::new();
    let scanner = scanner_over(&source, token.clone());

    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            token.cancel();
        })
    };
    let started = Instant::now();
    let err = scanner.scan_with(&request(10_000)).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, Error::CancelledByOperator));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(source.opens(), 1);
    assert_eq!(source.releases(), 1);
}

#[test]
fn test_unavailable_scanner_never_opens_device() {
    let source = ScriptedSource::new(vec![Some(barcode_frame("1"))]);
    let backend = ScanBackend::probe(
        Some(Arc::new(source.clone()) as Arc<dyn CameraSource>),
        None,
        Some(Arc::new(HeadlessSurface::default())),
    );
    let scanner = Scanner::new(ScannerSettings::default(), backend);

    assert!(!scanner.is_available());
    let err = scanner.scan_with(&request(1000)).unwrap_err();
    assert!(err.to_string().contains("barcode decoder"));
    assert_eq!(source.opens(), 0);
}

#[test]
fn test_device_open_failure_is_reported() {
    let source = ScriptedSource::unopenable();
    let scanner = scanner_over(&source, CancelToken::new());
    let err = scanner
        .scan_with(&ScanRequest::new(4, Duration::from_secs(1)))
        .unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable(4)));
    assert_eq!(source.releases(), 0);
}

#[test]
fn test_scan_from_image_folder() {
    let dir = tempfile::tempdir().unwrap();
    blank_frame().save(dir.path().join("000.png")).unwrap();
    barcode_frame("5550001").save(dir.path().join("001.png")).unwrap();

    let settings = ScannerSettings {
        frames_dir: Some(dir.path().to_path_buf()),
        scan_timeout_ms: 3000,
        ..ScannerSettings::default()
    };
    let scanner = Scanner::from_settings(settings, CancelToken::new());
    assert!(scanner.is_available());
    assert_eq!(scanner.scan().unwrap(), "5550001");
}

#[test]
fn test_image_folder_source_standalone() {
    let dir = tempfile::tempdir().unwrap();
    barcode_frame("12").save(dir.path().join("card.png")).unwrap();
    let source = ImageFolderCamera::new(dir.path()).with_frame_interval(Duration::ZERO);
    assert_eq!(source.name(), "image-folder");
    assert!(source.open(0).is_ok());
}

fn qr_card(text: &str) -> image::GrayImage {
    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let module_px = 5;
    let size = (modules + 8) * module_px;
    image::GrayImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / module_px, y / module_px);
        let inside = (4..modules + 4).contains(&mx) && (4..modules + 4).contains(&my);
        let dark =
            inside && colors[((my - 4) * modules + (mx - 4)) as usize] == qrcode::Color::Dark;
        image::Luma([if dark { 0 } else { 255 }])
    })
}

#[test]
fn test_scan_reads_qr_card_from_image_folder() {
    let dir = tempfile::tempdir().unwrap();
    blank_frame().save(dir.path().join("000.png")).unwrap();
    qr_card("0002345678901").save(dir.path().join("001.png")).unwrap();

    let settings = ScannerSettings {
        frames_dir: Some(dir.path().to_path_buf()),
        scan_timeout_ms: 3000,
        ..ScannerSettings::default()
    };
    let scanner = Scanner::from_settings(settings, CancelToken::new());
    assert_eq!(scanner.scan().unwrap(), "0002345678901");
}

#[test]
fn test_image_folder_answers_only_configured_camera() {
    let dir = tempfile::tempdir().unwrap();
    barcode_frame("12").save(dir.path().join("card.png")).unwrap();
    let settings = ScannerSettings {
        frames_dir: Some(dir.path().to_path_buf()),
        camera_id: 1,
        scan_timeout_ms: 1000,
        ..ScannerSettings::default()
    };
    let scanner = Scanner::from_settings(settings, CancelToken::new());

    assert_eq!(scanner.scan().unwrap(), "12");
    let err = scanner
        .scan_with(&ScanRequest::new(0, Duration::from_millis(1000)))
        .unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable(0)));
}
