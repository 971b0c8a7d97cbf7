use barcode_gate::tools::{ScriptedCamera, ScriptedDecoder, scripted};
use barcode_gate::{Frame, ScanConfig, ScanController, ScanRegion};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn invalid_then_valid(invalid: usize) -> Vec<Option<String>> {
    let mut script: Vec<Option<String>> = (0..invalid).map(|i| Some(format!("bad read {}", i))).collect();
    script.push(Some("4006381333931".to_string()));
    script
}

fn bench_session_to_success(c: &mut Criterion) {
    let script = invalid_then_valid(50);
    c.bench_function("session_50_invalid_then_success", |b| {
        b.iter(|| {
            let (camera, decoder, _probe) = scripted(script.clone());
            let mut controller = ScanController::new(camera, decoder);
            controller.open(|_| {});
            black_box(controller.run())
        })
    });
}

fn bench_session_full_frame_vs_region(c: &mut Criterion) {
    let script = invalid_then_valid(20);
    for (name, region) in [
        ("session_1280x720_region_250", Some(ScanRegion::new(250, 250))),
        ("session_1280x720_full_frame", None),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let camera = ScriptedCamera::new(script.len()).with_frame_size(1280, 720);
                let config = ScanConfig::default().with_scan_region(region);
                let mut controller =
                    ScanController::new(camera, ScriptedDecoder::new(script.clone())).with_config(config);
                controller.open(|_| {});
                black_box(controller.run())
            })
        });
    }
}

fn bench_frame_crop(c: &mut Criterion) {
    let frame = Frame::blank(1920, 1080, 0);
    let region = ScanRegion::new(250, 250);
    c.bench_function("frame_crop_1920x1080_to_250", |b| {
        b.iter(|| black_box(&frame).crop(black_box(region)).width())
    });
}

criterion_group!(
    benches,
    bench_session_to_success,
    bench_session_full_frame_vs_region,
    bench_frame_crop
);
criterion_main!(benches);
