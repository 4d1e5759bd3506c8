use criterion::*;
use jdqmr::correction::{gdk_correction, jdqmr_correction};
use jdqmr::operator::{LocalSum, MatVec};
use jdqmr::params::{ConvTest, Projectors};
use ndarray::*;

struct DenseMatVec {
    a: Array2<f64>,
}

impl MatVec for DenseMatVec {
    type Elem = f64;
    fn matvec(&mut self, x: ArrayView2<f64>) -> Array2<f64> {
        self.a.dot(&x)
    }
}

fn gdk(c: &mut Criterion) {
    let mut group = c.benchmark_group("gdk_correction");
    for &n in &[64, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("n", n), &n, |b, &n| {
            let r: Array1<f64> = random(n);
            let mut x: Array1<f64> = Array1::zeros(n);
            x[0] = 1.0;
            b.iter(|| gdk_correction(r.view(), x.view(), None, None, &Projectors::default(), &LocalSum))
        });
    }
}

fn jdqmr(c: &mut Criterion) {
    let mut group = c.benchmark_group("jdqmr_correction");
    for &n in &[64, 256] {
        group.bench_with_input(BenchmarkId::new("n", n), &n, |b, &n| {
            let a: Array2<f64> = {
                let raw: Array2<f64> = random((n, n));
                &raw + &raw.t()
            };
            let r: Array1<f64> = random(n);
            let mut x: Array1<f64> = Array1::zeros(n);
            x[0] = 1.0;
            let mut mv = DenseMatVec { a };
            let skew: Option<&jdqmr::correction::SkewContext<f64, ndarray::OwnedRepr<f64>>> = None;
            b.iter(|| {
                jdqmr_correction(
                    &mut mv,
                    r.view(),
                    x.view(),
                    0.0,
                    None,
                    None,
                    &Projectors::default(),
                    skew,
                    ConvTest::Adaptive,
                    1.5,
                    20,
                    &LocalSum,
                )
            })
        });
    }
}

criterion_group!(benches, gdk, jdqmr);
criterion_main!(benches);
