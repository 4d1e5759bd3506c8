use criterion::*;
use jdqmr::*;
use ndarray::*;

fn thick_restart_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("thick_restart_plan");
    for &m in &[16, 64, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("thick", m), &m, |b, &m| {
            b.iter(|| jdqmr::restart::thick_restart_plan(m, m / 8, 4, m / 4))
        });
    }
}

fn dtr_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("dtr_plan");
    for &m in &[16, 64, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("dtr", m), &m, |b, &m| {
            let hvals: Array1<f64> = Array1::linspace(0.0, m as f64, m);
            b.iter(|| jdqmr::restart::dtr_plan(&hvals, 0.0, 4, m / 4, None))
        });
    }
}

fn restart_basis(c: &mut Criterion) {
    let mut group = c.benchmark_group("restart_basis");
    for &(n, m) in &[(256usize, 32usize), (1024, 64)] {
        group.bench_with_input(BenchmarkId::new("basis", m), &(n, m), |b, &(n, m)| {
            let v: Array2<f64> = random((n, m));
            let w: Array2<f64> = random((n, m));
            let c_mat: Array2<f64> = Array2::eye(m);
            b.iter(|| jdqmr::restart::restart_basis(&v, &w, &c_mat))
        });
    }
}

criterion_group!(benches, thick_restart_plan, dtr_plan, restart_basis);
criterion_main!(benches);
