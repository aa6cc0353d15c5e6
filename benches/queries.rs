use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dep_insight::graph::DependencyGraph;
use dep_insight::manifest::PackageRecord;
use dep_insight::query::{
    CentralityMetric, CriticalPackagesQuery, CyclesQuery, HubsQuery, Query, StatsQuery,
};

fn synthetic_packages(count: usize) -> Vec<PackageRecord> {
    (0..count)
        .map(|i| {
            let mut rec = PackageRecord::new(&format!("pkg{i:04}"), "1.0.0");
            let fanout = (i * 7 + 3) % 5;
            for k in 1..=fanout {
                let target = (i * 13 + k * 17) % count;
                if target != i {
                    rec = rec.with_dependency(&format!("pkg{target:04}"), "^1.0.0");
                }
            }
            rec
        })
        .collect()
}

fn bench_queries(c: &mut Criterion) {
    let packages = synthetic_packages(500);
    let graph = DependencyGraph::build_from_package_list(&packages).expect("build graph");

    let mut group = c.benchmark_group("queries");
    group.bench_function("hubs_total_top10", |b| {
        b.iter(|| black_box(HubsQuery::new(CentralityMetric::Total, 10).run(&graph)).len())
    });
    group.bench_function("critical_packages", |b| {
        b.iter(|| black_box(CriticalPackagesQuery.run(&graph)).len())
    });
    group.bench_function("cycles_all", |b| {
        b.iter(|| black_box(CyclesQuery::new(None).run(&graph)).len())
    });
    group.bench_function("stats_clone", |b| {
        b.iter(|| black_box(StatsQuery.run(&graph)).total_packages)
    });
    group.finish();
}

criterion_group!(name = benches; config = Criterion::default(); targets = bench_queries);
criterion_main!(benches);
