use criterion::{Criterion, criterion_group, criterion_main};
use nd_compare::{CompareConfig, SortKey, TableBuilder, sort_rows};
use nd_core::{CorrelationMatrix, FitSnapshot, ParameterSnapshot, PrefitSnapshot, SnapshotSet};
use nd_pulls::PullRegistry;
use std::hint::black_box;

fn snapshots(n: usize) -> SnapshotSet {
    let names: Vec<String> = std::iter::once("r".to_string()).chain((0..n).map(|i| format!("np_{i:04}"))).collect();
    let n_all = names.len();
    let mut matrix = vec![vec![0.0; n_all]; n_all];
    for i in 0..n_all {
        matrix[i][i] = 1.0;
        if i > 0 {
            let rho = ((i as f64) * 0.37).sin() * 0.5;
            matrix[0][i] = rho;
            matrix[i][0] = rho;
        }
    }
    let corr = CorrelationMatrix::new(names.clone(), matrix).unwrap();

    let post = |shift: f64| -> Vec<ParameterSnapshot> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let x = ((i as f64) * 0.11 + shift).cos() * 1.5;
                ParameterSnapshot::asymmetric(name.clone(), x, 0.8, 0.9)
            })
            .collect()
    };
    let prefit = names.iter().skip(1).map(|name| ParameterSnapshot::symmetric(name.clone(), 0.0, 1.0)).collect();

    SnapshotSet {
        fit_b: FitSnapshot::new(post(0.0), CorrelationMatrix::default()),
        fit_s: FitSnapshot::new(post(0.3), corr),
        prefit: PrefitSnapshot::new(prefit),
    }
}

fn bench_table(c: &mut Criterion) {
    let snaps = snapshots(500);
    let reg = PullRegistry::standard();

    let plan = CompareConfig { show_all: true, ..Default::default() }.resolve(&reg, false).unwrap();
    c.bench_function("build_and_sort_500", |b| {
        b.iter(|| {
            let table = TableBuilder::new(&plan, &snaps).build().unwrap();
            black_box(sort_rows(&table, SortKey::Impact).len())
        })
    });

    let pull_plan = CompareConfig { pull_definition: Some("diffPullAsym".to_string()), ..Default::default() }
        .resolve(&reg, false)
        .unwrap();
    c.bench_function("build_pull_mode_500", |b| {
        b.iter(|| black_box(TableBuilder::new(&pull_plan, &snaps).build().unwrap().len()))
    });
}

criterion_group!(benches, bench_table);
criterion_main!(benches);
