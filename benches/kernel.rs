use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{Criterion, Throughput};
use pinpix::{Launcher, PixelBuffer};
use rgb::Rgba;

const W: usize = 1920;
const H: usize = 1080;

fn invert(px: &mut Rgba<u8>) {
    px.r = !px.r;
    px.g = !px.g;
    px.b = !px.b;
}

// === Benchmark groups ===

fn bench_launch_pixels(c: &mut Criterion) {
    let mut group = c.benchmark_group("launch_pixels_invert");
    group.throughput(Throughput::Elements((W * H) as u64));
    let mut img = PixelBuffer::from_vec(W, H, vec![Rgba::new(10u8, 20, 30, 255); W * H]).unwrap();

    let global = Launcher::new();
    group.bench_function("global_pool", |b| {
        b.iter(|| global.launch_pixels(&mut img, |_t, px| invert(px)).unwrap())
    });

    let single = Launcher::builder().threads(1).build().unwrap();
    group.bench_function("one_thread", |b| {
        b.iter(|| single.launch_pixels(&mut img, |_t, px| invert(px)).unwrap())
    });

    group.bench_function("naive", |b| {
        b.iter(|| img.pixels_mut().iter_mut().for_each(invert))
    });
    group.finish();
}

fn bench_launch_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("launch_grid_sum");
    group.throughput(Throughput::Elements((W * H) as u64));
    let launcher = Launcher::new();
    group.bench_function("atomic_sum", |b| {
        b.iter(|| {
            let sum = AtomicU64::new(0);
            launcher
                .launch(
                    |t| {
                        sum.fetch_add((t.x ^ t.y) as u64, Ordering::Relaxed);
                    },
                    W,
                    H,
                )
                .unwrap();
            sum.into_inner()
        })
    });
    group.finish();
}

fn main() {
    let mut criterion = Criterion::default().configure_from_args();
    bench_launch_pixels(&mut criterion);
    bench_launch_grid(&mut criterion);
    criterion.final_summary();
}
