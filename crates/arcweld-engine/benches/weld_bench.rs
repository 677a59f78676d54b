//! Benchmarks for the weld loop.
//!
//! Run with: cargo bench -p arcweld-engine

use arcweld_engine::{ArcWelder, SilentObserver};
use arcweld_settings::WelderConfig;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

/// Concentric circles of 72 segments each, like a sliced cylinder wall
fn circles(count: usize) -> String {
    let mut gcode = String::from("G21\nG90\nM82\nG92 E0\n");
    let mut e = 0.0;
    for ring in 0..count {
        let radius = 5.0 + ring as f64 * 0.4;
        gcode.push_str(&format!("G0 X{:.3} Y0 F6000\n", radius));
        for step in 1..=72 {
            let a = (step as f64 * 5.0).to_radians();
            e += 0.01;
            gcode.push_str(&format!(
                "G1 X{:.3} Y{:.3} E{:.5} F1800\n",
                radius * a.cos(),
                radius * a.sin(),
                e
            ));
        }
    }
    gcode
}

/// Straight zig-zag infill, nothing to weld
fn infill(count: usize) -> String {
    let mut gcode = String::from("G21\nG90\nM83\n");
    for line in 0..count {
        let x = if line % 2 == 0 { 100.0 } else { 0.0 };
        gcode.push_str(&format!("G1 X{:.3} Y{:.3} E0.5 F2400\n", x, line as f64 * 0.4));
    }
    gcode
}

fn bench_weld(c: &mut Criterion) {
    let mut group = c.benchmark_group("weld");
    let inputs = [
        ("circles", circles(100)),
        ("infill", infill(7200)),
    ];

    for (name, source) in &inputs {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            let welder = ArcWelder::new(WelderConfig::default());
            b.iter(|| {
                let mut target = Vec::with_capacity(source.len());
                let results = welder.process_stream(
                    Cursor::new(black_box(source.as_bytes())),
                    source.len() as u64,
                    &mut target,
                    &mut SilentObserver,
                );
                black_box((results, target))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_weld);
criterion_main!(benches);
