//! # Validation Benchmarks
//!
//! Performance benchmarks for the completeness rules and draft evaluation.
//!
//! Run with: `cargo bench -p fieldkit-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fieldkit_core::{
    AmplifierMode, Asset, AssetDraft, AssetId, AssetKind, Frequency, PhotoCounts, Port, PortIndex,
    ReportId, ValidationContext, Workspace, evaluate,
};
use std::hint::black_box;

/// A report full of amplifiers spread over every position.
fn siblings(count: usize) -> Vec<Asset> {
    let ports = [Port::Main, Port::Aux, Port::Bridger, Port::Express];
    (0..count)
        .map(|i| Asset {
            id: AssetId(i as u64 + 1),
            report_id: ReportId(1),
            kind: AssetKind::Amplifier,
            frequency: Frequency::Mhz85,
            technology: None,
            amplifier_mode: Some(AmplifierMode::Hgd),
            port: Some(ports[i % ports.len()]),
            port_index: PortIndex::new((i % 4) as u8 + 1).ok(),
        })
        .collect()
}

fn amplifier_draft() -> AssetDraft {
    let mut draft = AssetDraft::new(ReportId(1), AssetKind::Amplifier);
    draft.frequency = Some(Frequency::Mhz42);
    draft.amplifier_mode = Some(AmplifierMode::Le);
    draft.port = Some(Port::Main);
    draft.port_index = PortIndex::new(1).ok();
    draft
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let draft = amplifier_draft();
    let photos = PhotoCounts {
        module: 2,
        ..PhotoCounts::default()
    };

    for size in [0, 16, 256].iter() {
        let assets = siblings(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &assets, |b, assets| {
            let ctx = ValidationContext {
                siblings: assets,
                plan_row: None,
                photos,
            };
            b.iter(|| black_box(evaluate(black_box(&draft), &ctx)));
        });
    }

    group.finish();
}

fn bench_workspace_evaluate(c: &mut Criterion) {
    let mut ws = Workspace::new();
    let Ok(report) = ws.create_report("Bench", "N-1") else {
        return;
    };
    let mut draft = amplifier_draft();
    draft.report_id = report.id;

    c.bench_function("workspace_evaluate_draft", |b| {
        b.iter(|| black_box(ws.evaluate_draft(black_box(&draft))));
    });
}

criterion_group!(benches, bench_evaluate, bench_workspace_evaluate);
criterion_main!(benches);
