//! Scan cycle benchmark: full rung + process pass under the image locks.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use plc_common::image::{Bank, BankSizes, ControllerState, ProcessImage};
use plc_scan::execute_scan;
use plc_scan::process::seed_initial_conditions;
use plc_scan::rungs::{self, RungInputs};

fn bench_execute_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_scan");
    for len in [64usize, 1024, 65_536] {
        let image = Arc::new(ProcessImage::new(BankSizes::uniform(len)));
        seed_initial_conditions(&image).unwrap();
        image.write_bit(Bank::BinaryInputs, 0, true).unwrap();
        image.write_bit(Bank::BinaryInputs, 3, true).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(len), &image, |b, image| {
            b.iter(|| black_box(execute_scan(image).unwrap()));
        });
    }
    group.finish();
}

fn bench_rung_evaluation(c: &mut Criterion) {
    let inputs = RungInputs {
        start: true,
        tank_level_low: true,
        temperature: 795,
        pressure: 400,
        setpoint: 800,
        ..RungInputs::default()
    };
    c.bench_function("rungs::evaluate", |b| {
        b.iter(|| black_box(rungs::evaluate(black_box(&inputs), ControllerState::default())));
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let image = ProcessImage::default();
    c.bench_function("snapshot_64", |b| b.iter(|| black_box(image.snapshot())));
}

criterion_group!(benches, bench_execute_scan, bench_rung_evaluation, bench_snapshot);
criterion_main!(benches);
