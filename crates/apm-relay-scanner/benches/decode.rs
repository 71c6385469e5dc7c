use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use apm_relay_scanner::testing::render_code128;
use apm_relay_scanner::Code128Decoder;
use image::{imageops, GrayImage, Luma};

/// Place a barcode in the lower third of a camera-sized white frame
fn camera_frame(text: &str, width: u32, height: u32) -> GrayImage {
    let module = (width / 250).max(1);
    let code = render_code128(text, module, height / 6).unwrap();
    let mut frame = GrayImage::from_pixel(width, height, Luma([230]));
    let x = i64::from(width.saturating_sub(code.width()) / 2);
    imageops::replace(&mut frame, &code, x, i64::from(height * 2 / 3));
    frame
}

fn bench_decode_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_hit");

    for size in [(320, 240), (640, 480), (1280, 720)].iter() {
        let (width, height) = *size;
        let frame = camera_frame("0001234567890", width, height);
        let decoder = Code128Decoder::new();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &frame,
            |b, frame| b.iter(|| decoder.decode_luma(black_box(frame))),
        );
    }

    group.finish();
}

fn bench_decode_miss(c: &mut Criterion) {
    let frame = GrayImage::from_fn(640, 480, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
    let decoder = Code128Decoder::new();

    c.bench_function("decode_miss_640x480", |b| {
        b.iter(|| decoder.decode_luma(black_box(&frame)))
    });
}

criterion_group!(benches, bench_decode_hit, bench_decode_miss);
criterion_main!(benches);
