use barcode_gate::tools::{DirectoryCamera, LabelDecoder};
use barcode_gate::{ScanController, ScanError, ScanSessionState};
use image::{GrayImage, Luma};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX epoch")
        .as_nanos();
    let sequence = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = env::temp_dir().join(format!("barcode_gate_scan_{nanos}_{sequence}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_shot(dir: &Path, name: &str, label: Option<&str>) {
    let image = GrayImage::from_pixel(64, 48, Luma([200u8]));
    image.save(dir.join(format!("{name}.png"))).expect("failed to write png");
    if let Some(label) = label {
        fs::write(dir.join(format!("{name}.txt")), format!("{label}\n")).expect("failed to write label");
    }
}

#[test]
fn scans_labelled_shelf_photos_in_order() {
    let dir = temp_dir();
    write_shot(&dir, "01_blurry", Some("4006381"));
    write_shot(&dir, "02_glare", None);
    write_shot(&dir, "03_torn", Some("4006381333932"));
    write_shot(&dir, "04_clean", Some("4006381333931"));
    write_shot(&dir, "05_next_item", Some("036000291452"));

    let mut controller = ScanController::new(DirectoryCamera::new(&dir), LabelDecoder::new());
    let handle = controller.open(|_| {});
    let state = controller.run();

    assert_eq!(state, Some(ScanSessionState::Succeeded("4006381333931".into())));
    let stats = handle.stats();
    assert_eq!(stats.frames_seen, 4);
    assert_eq!(stats.decodes, 3);
    assert_eq!(stats.invalid_attempts, 2);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn shelf_without_valid_code_ends_stream() {
    let dir = temp_dir();
    write_shot(&dir, "a", Some("nope"));
    write_shot(&dir, "b", None);

    let mut controller = ScanController::new(DirectoryCamera::new(&dir), LabelDecoder::new());
    let handle = controller.open(|_| {});
    controller.run();

    assert_eq!(handle.state(), ScanSessionState::Failed(ScanError::StreamEnded));
    assert_eq!(handle.stats().invalid_attempts, 1);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn limit_caps_served_images() {
    let dir = temp_dir();
    write_shot(&dir, "a", None);
    write_shot(&dir, "b", Some("4006381333931"));

    let camera = DirectoryCamera::new(&dir).with_limit(Some(1));
    let mut controller = ScanController::new(camera, LabelDecoder::new());
    let handle = controller.open(|_| {});
    controller.run();

    assert_eq!(handle.state(), ScanSessionState::Failed(ScanError::StreamEnded));
    assert_eq!(handle.stats().frames_seen, 1);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_directory_means_no_camera() {
    let dir = temp_dir().join("does_not_exist");
    let mut controller = ScanController::new(DirectoryCamera::new(&dir), LabelDecoder::new());
    let handle = controller.open(|_| {});
    assert_eq!(handle.state(), ScanSessionState::Failed(ScanError::NoCameraAvailable));
}
