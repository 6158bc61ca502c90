use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{ImageFormat, RgbImage};
use registry::{ModelHandle, ModelStage};
use service::{
    ModelSet, ModelSlot,
    models::{CLASSIFIER_MODEL, DETECTOR_MODEL, REGRESSOR_MODEL},
    pipeline,
};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

fn slot(name: &str) -> ModelSlot {
    ModelSlot::Loaded(Arc::new(ModelHandle {
        name: name.to_string(),
        stage: ModelStage::Production,
        version: "1".to_string(),
        source: String::new(),
        run_id: None,
    }))
}

/// Encode a gradient test image in the given format
fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn bench_predict(c: &mut Criterion) {
    let models = ModelSet {
        detector: slot(DETECTOR_MODEL),
        classifier: slot(CLASSIFIER_MODEL),
        regressor: slot(REGRESSOR_MODEL),
    };

    let mut group = c.benchmark_group("predict");
    for (width, height) in [(640, 480), (1280, 720), (1920, 1080)] {
        let jpeg = encoded_image(width, height, ImageFormat::Jpeg);
        group.bench_with_input(
            BenchmarkId::new("jpeg", format!("{width}x{height}")),
            &jpeg,
            |b, bytes| {
                b.iter(|| pipeline::predict(black_box(&models), black_box(bytes), Instant::now()))
            },
        );
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let png = encoded_image(1280, 720, ImageFormat::Png);
    let jpeg = encoded_image(1280, 720, ImageFormat::Jpeg);

    c.bench_function("decode_png_720p", |b| {
        b.iter(|| pipeline::decode_image(black_box(&png)))
    });
    c.bench_function("decode_jpeg_720p", |b| {
        b.iter(|| pipeline::decode_image(black_box(&jpeg)))
    });
}

criterion_group!(benches, bench_predict, bench_decode);
criterion_main!(benches);
