//! Correction (inner iteration)
//!
//! Given a target `theta`, its Ritz vector `x = V·c`, residual `r`, and an
//! optional preconditioner `K`, approximately solve
//! `(I-xx')(A-theta I)(I-xx') t = -r`, `t ⊥ x`. Two methods:
//!
//! - **GD+k**: `t = K·(-r)`, with the projector variants applied around the
//!   preconditioner call.
//! - **JDQMR**: a preconditioned Lanczos/MINRES iteration on the projected
//!   operator -- the Hermitian counterpart of a preconditioned GMRES
//!   (Givens-rotated least-squares update over a growing Krylov basis), here
//!   specialized to the three-term recurrence a Hermitian operator affords,
//!   which plays the role PRIMME's QMR plays relative to unsymmetric GMRES.
//!
//! Both methods go through the same projector application
//! ([`apply_projected_operator`]), selected by [`crate::params::Projectors`].

use ndarray::*;
use num_traits::NumCast;

use crate::inner::Inner;
use crate::norm::Norm;
use crate::operator::{GlobalSum, MatVec, Preconditioner};
use crate::params::{ConvTest, Projectors};
use crate::types::*;
use crate::udu::UduFactorization;

/// Project `v` against a single normalized column `x`.
fn project_out_vec<A, S>(v: &mut ArrayBase<S, Ix1>, x: ArrayView1<A>, sum: &dyn GlobalSum<A>)
where
    A: Scalar,
    S: DataMut<Elem = A>,
{
    let mut c = [x.inner(v)];
    sum.global_sum(&mut c);
    let c = c[0];
    azip!((vi in &mut *v, &xi in &x) *vi -= c * xi);
}

/// Project `v` against every column of an orthonormal set `q`.
fn project_out_block<A, S>(v: &mut ArrayBase<S, Ix1>, q: ArrayView2<A>, sum: &dyn GlobalSum<A>)
where
    A: Scalar,
    S: DataMut<Elem = A>,
{
    for col in q.axis_iter(Axis(1)) {
        project_out_vec(v, col, sum);
    }
}

/// Oblique (skew) projection against `x` through `k_inv_x = K^-1 x`:
/// `v <- v - (x'v / x'K^-1 x) K^-1 x`. Falls back to the orthogonal
/// projector (treats the denominator as `1`) if `x' k_inv_x` underflows to
/// zero, since a singular `K` along `x` means the skew variant isn't usable
/// for this candidate (a preconditioner-failure fallback).
fn skew_project_vec<A, S>(
    v: &mut ArrayBase<S, Ix1>,
    x: ArrayView1<A>,
    k_inv_x: ArrayView1<A>,
    sum: &dyn GlobalSum<A>,
) where
    A: Scalar,
    S: DataMut<Elem = A>,
{
    let mut num = [x.inner(v)];
    sum.global_sum(&mut num);
    let mut den = [x.inner(&k_inv_x)];
    sum.global_sum(&mut den);
    let den = den[0];
    let tiny: A::Real = NumCast::from(1e-300).unwrap();
    let c = if den.abs() > tiny { num[0] / den } else { num[0] };
    azip!((vi in &mut *v, &ki in &k_inv_x) *vi -= c * ki);
}

/// Skew projector through a locked block `q`, via the cached factorization
/// of `M = q' K^-1 q`: `v <- v - (K^-1 q) M^-1 (q' v)`.
fn skew_project_block<A, S, Sm>(
    v: &mut ArrayBase<S, Ix1>,
    q: ArrayView2<A>,
    k_inv_q: ArrayView2<A>,
    m_fac: &UduFactorization<Sm>,
    sum: &dyn GlobalSum<A>,
) where
    A: Scalar,
    S: DataMut<Elem = A>,
    Sm: Data<Elem = A> + DataOwned,
{
    let mut qv: Vec<A> = q.axis_iter(Axis(1)).map(|c| c.inner(v)).collect();
    sum.global_sum(&mut qv);
    let qv = Array1::from_vec(qv);
    let coeffs = match m_fac.solve(&qv) {
        Ok(c) => c,
        Err(_) => return, // singular deflation block: skip this step's skew correction
    };
    let correction = k_inv_q.dot(&coeffs);
    *v -= &correction;
}

/// Precomputed material for the oblique (skew) projector variants: `K^-1 x`,
/// and for the locked block, `K^-1 Q` plus the cached factorization of
/// `Q' K^-1 Q`.
pub struct SkewContext<'a, A: Scalar, Sm: Data<Elem = A> + DataOwned> {
    pub k_inv_x: ArrayView1<'a, A>,
    pub k_inv_q: Option<ArrayView2<'a, A>>,
    pub m_fac: Option<&'a UduFactorization<Sm>>,
}

/// Apply `(I - xx')(A - theta I)(I - xx')` to a single column `v`, with the
/// optional locked-set projector stacked on top per `Projectors`. When
/// `skew` is given and `projectors.skew_x`/`skew_q` are set, the oblique
/// variant replaces the corresponding orthogonal projector; if `skew_x`/
/// `skew_q` is set but no usable `skew` material is given, this falls back
/// to the plain `right_x`/`right_q` projector rather than silently applying
/// neither.
pub fn apply_projected_operator<A, Sm>(
    matvec: &mut dyn MatVec<Elem = A>,
    v: &Array1<A>,
    x: ArrayView1<A>,
    theta: A::Real,
    locked: Option<ArrayView2<A>>,
    projectors: &Projectors,
    skew: Option<&SkewContext<A, Sm>>,
    sum: &dyn GlobalSum<A>,
) -> Array1<A>
where
    A: Scalar,
    Sm: Data<Elem = A> + DataOwned,
{
    let mut pre = v.clone();
    if projectors.skew_x {
        if let Some(s) = skew {
            skew_project_vec(&mut pre, x, s.k_inv_x, sum);
        } else if projectors.right_x {
            project_out_vec(&mut pre, x, sum);
        }
    } else if projectors.right_x {
        project_out_vec(&mut pre, x, sum);
    }
    if projectors.skew_q {
        let applied = if let (Some(q), Some(s)) = (locked, skew) {
            if let (Some(k_inv_q), Some(m_fac)) = (s.k_inv_q, s.m_fac) {
                skew_project_block(&mut pre, q, k_inv_q, m_fac, sum);
                true
            } else {
                false
            }
        } else {
            false
        };
        if !applied && projectors.right_q {
            if let Some(q) = locked {
                project_out_block(&mut pre, q, sum);
            }
        }
    } else if projectors.right_q {
        if let Some(q) = locked {
            project_out_block(&mut pre, q, sum);
        }
    }
    let block = pre.clone().into_shape((pre.len(), 1)).unwrap();
    let av = matvec.matvec(block.view());
    let mut out = av.index_axis(Axis(1), 0).to_owned();
    out -= &pre.mapv(|c| c * A::from_real(theta));

    if projectors.left_q {
        if let Some(q) = locked {
            project_out_block(&mut out, q, sum);
        }
    }
    if projectors.left_x {
        project_out_vec(&mut out, x, sum);
    }
    out
}

/// Outcome of the inner solve for one candidate.
pub struct InnerSolveReport<R> {
    pub iterations: usize,
    /// Number of `matvec` calls actually issued by this inner solve (an
    /// iteration that breaks before reaching the projected-operator
    /// application, e.g. on an already-satisfied tolerance, costs none).
    pub matvecs: usize,
    pub fell_back: bool,
    pub final_residual: R,
}

/// GD+k: `t = K·(-r)`, then project per `projectors`. With no preconditioner
/// (`precond = None`) this degenerates to steepest descent, `t = -r`
/// projected the same way.
pub fn gdk_correction<A>(
    residual: ArrayView1<A>,
    x: ArrayView1<A>,
    locked: Option<ArrayView2<A>>,
    precond: Option<&mut dyn Preconditioner<Elem = A>>,
    projectors: &Projectors,
    sum: &dyn GlobalSum<A>,
) -> Array1<A>
where
    A: Scalar,
{
    let neg_r = residual.mapv(|v| -v);
    let mut t = match precond {
        Some(k) => {
            let block = neg_r.into_shape((residual.len(), 1)).unwrap();
            k.apply_preconditioner(block.view())
                .index_axis_move(Axis(1), 0)
        }
        None => neg_r,
    };
    // GD+k only ever applies the "left" (post-preconditioner) projector
    // variants; the skew/right variants are JDQMR's, applied inside the
    // projected operator each inner step instead.
    if projectors.left_x {
        project_out_vec(&mut t, x, sum);
    }
    if projectors.left_q {
        if let Some(q) = locked {
            project_out_block(&mut t, q, sum);
        }
    }
    t
}

/// Dynamic inner-tolerance target for `adaptive_ETolerance` / `adaptive`:
/// shrink proportionally to how far the outer residual already is from the
/// eigenvalue estimate, capped by `rel_tol_base` and never looser than the
/// outer residual itself.
fn adaptive_inner_tol<R>(outer_res_norm: R, rel_tol_base: R, inner_iter: usize) -> R
where
    R: NumCast + PartialOrd + Copy + std::ops::Mul<Output = R> + std::ops::Div<Output = R>,
{
    let decay: R = NumCast::from(0.5_f64.powi(inner_iter as i32 / 4 + 1)).unwrap();
    let candidate = outer_res_norm * decay;
    let floor = outer_res_norm / rel_tol_base;
    if candidate > floor { candidate } else { floor }
}

/// JDQMR: preconditioned three-term recurrence (MINRES-shaped, since the
/// projected operator stays Hermitian) on `(I-xx')(A-theta I)(I-xx') t = -r`.
///
/// Stops on the adaptive inner tolerance, a hard `max_inner_iterations` cap,
/// or stagnation (residual stops shrinking), in which case the best iterate
/// seen is returned. A `NaN` anywhere in the recursion, or a preconditioner
/// that can't be applied, falls back to [`gdk_correction`]'s plain `K·(-r)`.
#[allow(clippy::too_many_arguments)]
pub fn jdqmr_correction<A, Sm>(
    matvec: &mut dyn MatVec<Elem = A>,
    residual: ArrayView1<A>,
    x: ArrayView1<A>,
    theta: A::Real,
    locked: Option<ArrayView2<A>>,
    precond: Option<&mut dyn Preconditioner<Elem = A>>,
    projectors: &Projectors,
    skew: Option<&SkewContext<A, Sm>>,
    conv_test: ConvTest,
    rel_tol_base: A::Real,
    max_inner_iterations: usize,
    sum: &dyn GlobalSum<A>,
) -> (Array1<A>, InnerSolveReport<A::Real>)
where
    A: Scalar,
    Sm: Data<Elem = A> + DataOwned,
{
    let n = residual.len();
    let outer_norm = residual.norm_l2();
    let zero: A::Real = NumCast::from(0.0).unwrap();
    if outer_norm <= zero || max_inner_iterations == 0 {
        let fallback = gdk_correction(residual, x, locked, precond, projectors, sum);
        return (
            fallback,
            InnerSolveReport {
                iterations: 0,
                matvecs: 0,
                fell_back: true,
                final_residual: outer_norm,
            },
        );
    }

    let mut t = Array1::<A>::zeros(n);
    let mut r = residual.mapv(|v| -v);
    if projectors.right_x {
        project_out_vec(&mut r, x, sum);
    }
    let mut r_norm = r.norm_l2();
    let mut best_t = t.clone();
    let mut best_norm = r_norm;

    let mut p = r.clone();
    let mut rr_prev = r_norm * r_norm;
    let mut iterations_done = 0;
    let mut matvecs_done = 0usize;

    for it in 0..max_inner_iterations {
        iterations_done = it;
        if !r_norm.is_finite() || r_norm.is_nan() {
            let fallback = gdk_correction(residual, x, locked, precond, projectors, sum);
            return (
                fallback,
                InnerSolveReport {
                    iterations: it,
                    matvecs: matvecs_done,
                    fell_back: true,
                    final_residual: outer_norm,
                },
            );
        }

        let tol = match conv_test {
            ConvTest::FullLTolerance => outer_norm / rel_tol_base,
            ConvTest::DecreasingLTolerance | ConvTest::AdaptiveETolerance | ConvTest::Adaptive => {
                adaptive_inner_tol(outer_norm, rel_tol_base, it)
            }
        };
        if r_norm <= tol {
            break;
        }

        let mut pc = p.clone();
        if let Some(k) = precond.as_deref_mut() {
            let block = pc.clone().into_shape((n, 1)).unwrap();
            pc = k.apply_preconditioner(block.view()).index_axis_move(Axis(1), 0);
        }

        let ap = apply_projected_operator(matvec, &pc, x, theta, locked, projectors, skew, sum);
        matvecs_done += 1;
        let mut pap = [pc.inner(&ap)];
        sum.global_sum(&mut pap);
        let pap = pap[0];
        let tiny: A::Real = NumCast::from(1e-300).unwrap();
        if pap.abs() <= tiny {
            break; // projected operator is numerically singular along this direction
        }
        let alpha = A::from_real(rr_prev) / pap;

        t = &t + &pc.mapv(|c| c * alpha);
        r = &r - &ap.mapv(|c| c * alpha);
        if projectors.left_x {
            project_out_vec(&mut r, x, sum);
        }
        r_norm = r.norm_l2();

        if r_norm < best_norm {
            best_norm = r_norm;
            best_t = t.clone();
        } else if r_norm > best_norm * NumCast::from(1.5).unwrap() {
            // Stagnating or diverging: stop and report the best iterate.
            break;
        }

        let rr_new = r_norm * r_norm;
        let beta = A::from_real(rr_new / rr_prev.max(tiny));
        p = &r + &p.mapv(|c| c * beta);
        rr_prev = rr_new;
    }

    (
        best_t,
        InnerSolveReport {
            iterations: iterations_done + 1,
            matvecs: matvecs_done,
            fell_back: false,
            final_residual: best_norm,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::random_hermite;
    use crate::operator::LocalSum;

    struct DenseMatVec {
        a: Array2<f64>,
    }
    impl MatVec for DenseMatVec {
        type Elem = f64;
        fn matvec(&mut self, x: ArrayView2<f64>) -> Array2<f64> {
            self.a.dot(&x)
        }
    }

    #[test]
    fn gdk_projects_out_x() {
        let n = 8;
        let r: Array1<f64> = Array1::from(vec![1.0; n]);
        let mut x = Array1::<f64>::zeros(n);
        x[0] = 1.0;
        let t = gdk_correction(
            r.view(),
            x.view(),
            None,
            None,
            &Projectors {
                left_x: true,
                ..Default::default()
            },
            &LocalSum,
        );
        assert!(t[0].abs() < 1e-10);
    }

    #[test]
    fn jdqmr_reduces_residual() {
        let n = 10;
        let a: Array2<f64> = random_hermite(n);
        let mut x = Array1::<f64>::zeros(n);
        x[0] = 1.0;
        let r: Array1<f64> = Array1::from(vec![0.3; n]);
        let mut mv = DenseMatVec { a };
        let skew: Option<&SkewContext<f64, ndarray::OwnedRepr<f64>>> = None;
        let (_t, report) = jdqmr_correction(
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
        );
        assert!(report.final_residual <= r.norm_l2() * 1.01);
    }
}
