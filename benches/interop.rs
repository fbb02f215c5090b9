use archmage::SimdToken;
use criterion::{BenchmarkGroup, Criterion, Throughput, measurement::WallTime};
use pinpix::{BitmapAdapter, DescriptorRegistry, ExternalBitmap, PixelBuffer, PixelFormat};
use rgb::{Rgb, Rgba};

// === SIMD tier detection ===

fn probe<T: SimdToken>() -> &'static str {
    if T::summon().is_some() {
        "available"
    } else {
        "not available"
    }
}

fn print_simd_info() {
    eprintln!("=== SIMD Tier Detection ===");
    #[cfg(target_arch = "x86_64")]
    eprintln!(
        "  AVX2+FMA (x86-64-v3):    {}",
        probe::<archmage::X64V3Token>()
    );
    eprintln!("  Scalar:                  always available");
    eprintln!("===========================");
}

fn disable_all_simd() {
    let _ = archmage::dangerously_disable_tokens_except_wasm(true);
}

fn enable_all_simd() {
    let _ = archmage::dangerously_disable_tokens_except_wasm(false);
}

// === Benchmark helpers ===

const W: usize = 1920;
const H: usize = 1080;

fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

/// Import `bmp` with the exact path and with the swapping path at best SIMD
/// and scalar tiers.
fn bench_import_4bpp(group: &mut BenchmarkGroup<WallTime>, adapter: BitmapAdapter<'_>, bmp: ExternalBitmap<'_>) {
    group.bench_function("exact", |b| {
        b.iter(|| adapter.from_external::<Rgba<u8>>(&bmp).unwrap());
    });

    let swapped = ExternalBitmap::new(PixelFormat::Bgra32, bmp.width(), bmp.height(), bmp.stride(), bmp.data())
        .unwrap();
    group.bench_function("swapped", |b| {
        b.iter(|| adapter.from_external_swapped::<Rgba<u8>>(&swapped).unwrap());
    });

    disable_all_simd();
    group.bench_function("swapped_scalar", |b| {
        b.iter(|| adapter.from_external_swapped::<Rgba<u8>>(&swapped).unwrap());
    });
    enable_all_simd();
}

// === Benchmark groups ===

fn bench_import_packed(c: &mut Criterion, adapter: BitmapAdapter<'_>) {
    let mut group = c.benchmark_group("import_rgba_packed");
    let bytes = pattern(W * H * 4);
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    let bmp = ExternalBitmap::packed(PixelFormat::Rgba32, W, H, &bytes).unwrap();
    bench_import_4bpp(&mut group, adapter, bmp);
    group.finish();
}

fn bench_import_padded(c: &mut Criterion, adapter: BitmapAdapter<'_>) {
    let mut group = c.benchmark_group("import_rgba_padded");
    let stride = W * 4 + 64;
    let bytes = pattern(stride * H);
    group.throughput(Throughput::Bytes((W * H * 4) as u64));
    let bmp = ExternalBitmap::new(PixelFormat::Rgba32, W, H, stride, &bytes).unwrap();
    bench_import_4bpp(&mut group, adapter, bmp);
    group.finish();
}

fn bench_export(c: &mut Criterion, adapter: BitmapAdapter<'_>) {
    let mut group = c.benchmark_group("export_rgb");
    group.throughput(Throughput::Bytes((W * H * 3) as u64));
    let img = PixelBuffer::from_vec(W, H, vec![Rgb::new(1u8, 2, 3); W * H]).unwrap();
    group.bench_function("packed", |b| b.iter(|| adapter.to_external(&img).unwrap()));
    group.bench_function("dib_aligned", |b| {
        b.iter(|| adapter.to_external_aligned(&img, 4).unwrap())
    });
    group.bench_function("swapped", |b| {
        b.iter(|| adapter.to_external_swapped(&img).unwrap())
    });
    group.finish();
}

// === Custom main for tier detection before criterion runs ===

fn main() {
    print_simd_info();

    let registry = DescriptorRegistry::new();
    let adapter = BitmapAdapter::new(&registry);

    let mut criterion = Criterion::default().configure_from_args();
    bench_import_packed(&mut criterion, adapter);
    bench_import_padded(&mut criterion, adapter);
    bench_export(&mut criterion, adapter);
    criterion.final_summary();
}
