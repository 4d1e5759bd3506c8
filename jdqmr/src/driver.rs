//! Main driver state machine:
//! `INIT -> EXTEND -> ORTHO -> UPDATE_PROJ -> SOLVE_H -> CONVERGE ->
//! {BLOCK | RESTART | LOCK | DONE}`.
//!
//! An explicit `enum DriverState` matched in a loop, rather than one flat
//! `loop { ... break ... }` body -- the state machine has enough branches
//! (restart vs. lock vs. plain block-extend) that a flat loop body would
//! stop being readable. `INIT`, `EXTEND`, `ORTHO` and `UPDATE_PROJ` are
//! folded into the `SolveH`-adjacent code paths below rather than given
//! their own loop arms, since each only ever runs as an immediate prelude
//! to a `SolveH`/`Converge` pair and never needs to be re-entered on its
//! own.

use ndarray::*;
use num_traits::NumCast;

use crate::candidates::compute_candidate_block;
use crate::convergence::{converged_threshold, ConvergenceFlag, ConvergenceTest};
use crate::correction::{gdk_correction, jdqmr_correction, SkewContext};
use crate::error::{wrap_linalg, EigenError, EigenResult, ErrorTraceEntry};
use crate::generate::random;
use crate::locking::{hard_lock, permute_vecs};
use crate::numeric::overlap_safe_copy;
use crate::operator::{GlobalSum, MatVec, Preconditioner};
use crate::ortho::orthogonalize_block_or_fail;
use crate::params::{Projection, SolverParams, Target};
use crate::projection::{update_h, update_qr};
use crate::qr::QRInto;
use crate::restart::{augment_with_previous, plan_restart, restart_basis, restart_indices, restart_qr};
use crate::solve_h::{solve_h, RitzPairs};
use crate::trace_error;
use crate::types::*;

/// Driver state labels, matched in the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    SolveH,
    Converge,
    Block,
    Restart,
    Lock,
    Done,
}

/// Run statistics accumulated across the solve, including the error-trace
/// stack rather than any global state.
#[derive(Debug, Default)]
pub struct SolverStats {
    pub matvecs: usize,
    pub outer_iterations: usize,
    pub restarts: usize,
    pub locks: usize,
    pub num_converged: usize,
    pub error_trace: Vec<ErrorTraceEntry>,
}

/// The solve's final result: sorted eigenpairs plus run statistics.
pub struct SolveResult<A: Scalar> {
    pub evals: Vec<A::Real>,
    pub evecs: Array2<A>,
    pub stats: SolverStats,
}

fn target_shift<R: Copy>(target: Target<R>) -> Option<R> {
    match target {
        Target::ClosestGeq(tau) | Target::ClosestLeq(tau) | Target::ClosestAbs(tau) => Some(tau),
        Target::Smallest | Target::Largest => None,
    }
}

/// Refined/harmonic extraction needs a shift to build `(A - tau I)`; if the
/// target has none (smallest/largest), fall back to plain Rayleigh-Ritz
/// regardless of what the caller configured.
fn effective_projection<R: Copy>(requested: Projection, target: Target<R>) -> Projection {
    match requested {
        Projection::RayleighRitz => Projection::RayleighRitz,
        Projection::Refined | Projection::Harmonic => match target_shift(target) {
            Some(_) => requested,
            None => Projection::RayleighRitz,
        },
    }
}

/// Converged and practically-converged pairs are both "done": neither is
/// re-selected for correction, and both count toward `numEvals`.
fn is_settled(f: ConvergenceFlag) -> bool {
    matches!(f, ConvergenceFlag::Converged | ConvergenceFlag::PracticallyConverged)
}

fn symmetrize<A: Scalar>(m: Array2<A>) -> Array2<A> {
    let t = m.t().mapv(|x| x.conj());
    (&m + &t).mapv(|x| x / (A::one() + A::one()))
}

/// Shifted product `(A - tau I) x = w - tau x` needed by refined/harmonic
/// extraction's auxiliary `QR(A - tau I, V)` factorization.
fn shifted_image<A: Scalar>(w: &Array2<A>, x: &Array2<A>, tau: A::Real) -> Array2<A> {
    w - &x.mapv(|c| c * A::from_real(tau))
}

fn sqrt_real<R: NumCast>(x: R) -> R {
    let as_f64: f64 = NumCast::from(x).unwrap();
    NumCast::from(as_f64.sqrt()).unwrap()
}

/// Map `printLevel` onto a `log` crate level: 0 silences all output, higher
/// values progressively unlock warn/info/debug/trace.
fn log_level(print_level: u8) -> Option<log::Level> {
    match print_level {
        0 => None,
        1 => Some(log::Level::Warn),
        2 | 3 => Some(log::Level::Info),
        4 => Some(log::Level::Debug),
        _ => Some(log::Level::Trace),
    }
}

/// Run the full eigensolve described by `params` against `matvec` (and,
/// optionally, `precond`), reducing every inner product through `sum`.
pub fn solve<A>(
    params: &SolverParams<A::Real>,
    matvec: &mut dyn MatVec<Elem = A>,
    mut precond: Option<&mut dyn Preconditioner<Elem = A>>,
    sum: &dyn GlobalSum<A>,
) -> EigenResult<SolveResult<A>>
where
    A: Scalar + Lapack,
{
    crate::params::validate(params)?;

    let n = params.n_local;
    let mut stats = SolverStats::default();
    let tol: A::Real = NumCast::from(1e-10).unwrap();
    let target = params.target;
    let projection = effective_projection(params.projection, target);

    let mut evecs: Array2<A> = Array2::zeros((n, params.num_evals));
    let mut evals: Vec<A::Real> = Vec::with_capacity(params.num_evals);
    let mut num_locked = 0usize;

    // INIT + ORTHO: a random initial block, orthonormalized against nothing
    // (the locked set starts empty).
    let mut v: Array2<A> = random((n, params.init_size));
    let empty = Array2::<A>::zeros((n, 0));
    let kept = orthogonalize_block_or_fail(&mut v, None, empty.view(), tol, sum, 1).map_err(|e| {
        trace_error!(stats.error_trace, "init_ortho", e.to_string());
        e
    })?;
    v = v.slice(s![.., ..kept]).to_owned();

    // UPDATE_PROJ (first pass): W = AV, H = V'W, and (refined/harmonic
    // only) the QR factorization of the shifted image.
    let mut w = matvec.matvec(v.view());
    stats.matvecs += 1;
    let mut h = symmetrize(v.t().dot(&w));

    let mut q: Option<Array2<A>> = None;
    let mut r: Option<Array2<A>> = None;
    let mut qv: Option<Array2<A>> = None;
    if let Some(tau) = target_shift(target).filter(|_| projection != Projection::RayleighRitz) {
        let aw = shifted_image(&w, &v, tau);
        let (q0, r0) = QRInto::qr_into(aw).map_err(|e| wrap_linalg("init_qr", e))?;
        qv = Some(q0.t().dot(&v));
        q = Some(q0);
        r = Some(r0);
    }

    let mut flags: Vec<ConvergenceFlag> = vec![ConvergenceFlag::Unconverged; v.ncols()];
    let mut soft_locked_evals: Vec<Option<A::Real>> = vec![None; v.ncols()];
    let mut previous_hvecs: Array2<A> = Array2::zeros((v.ncols(), 0));
    let mut conv_test = ConvergenceTest::<A>::new(
        params.eps,
        params.a_norm.unwrap_or_else(|| NumCast::from(1.0).unwrap()),
        NumCast::from(1e-16).unwrap(),
    );

    let mut state = DriverState::SolveH;
    let mut pairs: Option<RitzPairs<A>> = None;

    // W's staleness since the last full recompute:
    // `estimateResidualError = 2*sqrt(restartsSinceReset)*epsMachine*||A||`.
    let mut restarts_since_reset: usize = 0;
    let mut estimate_residual_error: A::Real = NumCast::from(0.0).unwrap();
    let mut needs_reset = false;

    loop {
        match state {
            DriverState::SolveH => {
                let solved = solve_h(projection, &h, qv.as_ref(), r.as_ref(), target)
                    .map_err(|e| wrap_linalg("solve_h", e))?;
                if solved.vals.len() > flags.len() {
                    flags.resize(solved.vals.len(), ConvergenceFlag::Unconverged);
                    soft_locked_evals.resize(solved.vals.len(), None);
                }
                pairs = Some(solved);
                state = DriverState::Converge;
            }

            DriverState::Converge => {
                stats.outer_iterations += 1;
                let rp = pairs.as_ref().expect("SolveH always populates pairs before Converge");
                let max_sval = rp.vals.iter().cloned().fold(NumCast::from(0.0).unwrap(), |acc: A::Real, v| {
                    if v.abs() > acc {
                        v.abs()
                    } else {
                        acc
                    }
                });

                // A candidate is "practically converged" when its residual
                // sits above the strict threshold but within the estimated
                // accumulated error in W (which grows with every restart
                // since the last full recompute, and cannot be beaten
                // without resetting V/W).
                let strict_threshold = converged_threshold(conv_test.eps, conv_test.a_norm, max_sval, conv_test.eps_machine);
                let two: A::Real = NumCast::from(2.0).unwrap();
                let restarts_r: A::Real = NumCast::from(restarts_since_reset).unwrap();
                estimate_residual_error = two * sqrt_real(restarts_r) * conv_test.eps_machine * conv_test.a_norm;
                needs_reset = estimate_residual_error > strict_threshold;

                let all_indices: Vec<usize> = (0..flags.len()).collect();
                let c = compute_candidate_block(&v, &w, &rp.vals, &rp.vecs, &all_indices);

                for i in 0..flags.len() {
                    let eval = c.theta[i];
                    let res_norm = c.res_norms[i];
                    let settled = is_settled(flags[i]);
                    match soft_locked_evals[i] {
                        Some(recorded) if settled && !params.locking => {
                            // Soft-locked: re-examine for drift every outer
                            // step, since it stays in the active basis.
                            if (eval - recorded).abs() > res_norm {
                                flags[i] = ConvergenceFlag::Unconverged;
                                soft_locked_evals[i] = None;
                            }
                        }
                        _ if settled => {
                            // Hard-locked (or soft-locked with locking
                            // disabled already handled above): never
                            // revisited again this call.
                        }
                        _ => {
                            let evec = c.x.column(i);
                            let flag = conv_test.evaluate(eval, evec, res_norm, max_sval, estimate_residual_error);
                            flags[i] = flag;
                            if is_settled(flag) {
                                soft_locked_evals[i] = Some(eval);
                            }
                        }
                    }
                }

                let num_converged_here = flags.iter().filter(|f| is_settled(**f)).count();
                stats.num_converged = num_locked + num_converged_here;

                if let Some(lvl) = log_level(params.print_level) {
                    log::log!(
                        lvl,
                        "outer {}: matvecs={} basis={} converged={}/{}",
                        stats.outer_iterations,
                        stats.matvecs,
                        v.ncols(),
                        stats.num_converged,
                        params.num_evals
                    );
                }

                if stats.num_converged >= params.num_evals {
                    state = DriverState::Done;
                } else if params.locking && num_converged_here > 0 {
                    state = DriverState::Lock;
                } else if v.ncols() + params.max_block_size > params.max_basis_size {
                    state = DriverState::Restart;
                } else if stats.outer_iterations >= params.max_outer_iterations
                    || stats.matvecs >= params.max_matvecs
                {
                    let err = EigenError::ConvergenceAborted {
                        outer_iterations: stats.outer_iterations,
                        matvecs: stats.matvecs,
                        num_converged: stats.num_converged,
                        num_evals: params.num_evals,
                    };
                    trace_error!(stats.error_trace, "outer_budget", err.to_string());
                    return Err(err);
                } else {
                    state = DriverState::Block;
                }
            }

            DriverState::Block => {
                let rp = pairs.as_ref().unwrap();
                let indices: Vec<usize> = flags
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| **f == ConvergenceFlag::Unconverged)
                    .take(params.max_block_size)
                    .map(|(i, _)| i)
                    .collect();
                let c = compute_candidate_block(&v, &w, &rp.vals, &rp.vecs, &indices);

                let locked_view = if num_locked > 0 {
                    Some(evecs.slice(s![.., ..num_locked]))
                } else {
                    None
                };

                let mut t_block = Array2::<A>::zeros((n, indices.len()));
                for slot in 0..indices.len() {
                    let theta = c.theta[slot];
                    let x = c.x.column(slot);
                    let r_col = c.residual.column(slot);
                    let skew: Option<&SkewContext<A, ndarray::OwnedRepr<A>>> = None;
                    let no_inner_solve = params.correction_params.max_inner_iterations == 0;
                    let t = if no_inner_solve {
                        gdk_correction(
                            r_col,
                            x,
                            locked_view,
                            precond.as_deref_mut(),
                            &params.correction_params.projectors,
                            sum,
                        )
                    } else {
                        let (t, report) = jdqmr_correction(
                            matvec,
                            r_col,
                            x,
                            theta,
                            locked_view,
                            precond.as_deref_mut(),
                            &params.correction_params.projectors,
                            skew,
                            params.correction_params.conv_test,
                            params.correction_params.rel_tol_base,
                            params.correction_params.max_inner_iterations,
                            sum,
                        );
                        stats.matvecs += report.matvecs;
                        t
                    };
                    t_block.column_mut(slot).assign(&t);
                }

                let v_old = v.clone();
                let basis_before = v.ncols();
                let kept = orthogonalize_block_or_fail(&mut t_block, locked_view, v.view(), tol, sum, 1).map_err(|e| {
                    trace_error!(stats.error_trace, "extend_ortho", e.to_string());
                    e
                })?;
                let t_block = t_block.slice(s![.., ..kept]).to_owned();

                let w_new = matvec.matvec(t_block.view());
                stats.matvecs += 1;

                let mut v_next = Array2::<A>::zeros((n, basis_before + kept));
                overlap_safe_copy(&v_old, &mut v_next.slice_mut(s![.., ..basis_before]));
                v_next.slice_mut(s![.., basis_before..]).assign(&t_block);
                let mut w_next = Array2::<A>::zeros((n, basis_before + kept));
                overlap_safe_copy(&w, &mut w_next.slice_mut(s![.., ..basis_before]));
                w_next.slice_mut(s![.., basis_before..]).assign(&w_new);

                h = update_h(&h.view(), v_old.view(), w_new.view(), t_block.view());
                if let (Some(q_cur), Some(r_cur)) = (q.as_ref(), r.as_ref()) {
                    let tau = target_shift(target).expect("q/r only populated when a shift is available");
                    let aw_new = shifted_image(&w_new, &t_block, tau);
                    let (q_new, r_new) = update_qr(q_cur.view(), r_cur.view(), aw_new.view(), tol, sum);
                    qv = Some(q_new.t().dot(&v_next));
                    q = Some(q_new);
                    r = Some(r_new);
                }
                v = v_next;
                w = w_next;
                flags.resize(v.ncols(), ConvergenceFlag::Unconverged);
                soft_locked_evals.resize(v.ncols(), None);
                state = DriverState::SolveH;
            }

            DriverState::Restart => {
                stats.restarts += 1;
                log::debug!("restart #{}: basis {} columns before restart", stats.restarts, v.ncols());
                let rp = pairs.as_ref().unwrap();
                let num_converged_active = flags.iter().filter(|f| is_settled(**f)).count();
                let last_converged_unlocked = flags
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| is_settled(**f))
                    .map(|(i, _)| i)
                    .max();
                let plan = plan_restart(
                    params.restarting_params.scheme,
                    &rp.vals,
                    rp.vals[0],
                    num_converged_active,
                    params.max_block_size,
                    params.min_restart_size,
                    last_converged_unlocked,
                );
                let idx = restart_indices(plan);
                let selected = rp.vecs.select(Axis(1), &idx);
                let c = augment_with_previous(
                    &selected,
                    &previous_hvecs,
                    params.restarting_params.max_prev_retain,
                    tol,
                    sum,
                );

                let (v_new, mut w_new, mut h_new) = restart_basis(&v, &w, &c);
                if needs_reset {
                    w_new = matvec.matvec(v_new.view());
                    stats.matvecs += 1;
                    h_new = symmetrize(v_new.t().dot(&w_new));
                    restarts_since_reset = 0;
                    log::debug!("reset #{}: recomputing W = A*V (estimate exceeded strict threshold)", stats.restarts);
                } else {
                    restarts_since_reset += 1;
                }
                h = h_new;
                if let Some(r_cur) = r.as_ref() {
                    let (q_new, r_new) = restart_qr(r_cur, &c).map_err(|e| wrap_linalg("restart_qr", e))?;
                    qv = Some(q_new.t().dot(&v_new));
                    q = Some(q_new);
                    r = Some(r_new);
                }
                previous_hvecs = {
                    let dropped: Vec<usize> = (0..rp.vecs.ncols()).filter(|i| !idx.contains(i)).collect();
                    rp.vecs.select(Axis(1), &dropped)
                };
                v = v_new;
                w = w_new;
                // Only the exact `idx` columns carry their flag forward into
                // the restarted basis; `+k`-augmented columns start life
                // unconverged again in the new coordinates.
                let new_len = c.ncols();
                let mut kept_flags = vec![ConvergenceFlag::Unconverged; new_len];
                let mut kept_soft = vec![None; new_len];
                for (slot, &i) in idx.iter().enumerate() {
                    kept_flags[slot] = flags[i];
                    kept_soft[slot] = soft_locked_evals[i];
                }
                flags = kept_flags;
                soft_locked_evals = kept_soft;
                state = DriverState::SolveH;
            }

            DriverState::Lock => {
                let rp = pairs.as_ref().unwrap();
                let converged_indices: Vec<usize> = flags
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| is_settled(**f))
                    .map(|(i, _)| i)
                    .collect();
                let (v_new, w_new) = hard_lock(
                    &v,
                    &w,
                    rp.vals.as_slice().expect("hVals is always contiguous"),
                    &converged_indices,
                    &mut evecs,
                    &mut evals,
                    &mut num_locked,
                );
                stats.locks += converged_indices.len();
                log::info!("locked {} pair(s), {} total", converged_indices.len(), num_locked);

                let keep: Vec<usize> = (0..flags.len()).filter(|i| !converged_indices.contains(i)).collect();
                flags = keep.iter().map(|&i| flags[i]).collect();
                soft_locked_evals = keep.iter().map(|&i| soft_locked_evals[i]).collect();

                h = symmetrize(v_new.t().dot(&w_new));
                if let Some(tau) = target_shift(target).filter(|_| projection != Projection::RayleighRitz) {
                    let aw = shifted_image(&w_new, &v_new, tau);
                    let (q_new, r_new) = QRInto::qr_into(aw).map_err(|e| wrap_linalg("lock_qr", e))?;
                    qv = Some(q_new.t().dot(&v_new));
                    q = Some(q_new);
                    r = Some(r_new);
                }
                v = v_new;
                w = w_new;
                state = DriverState::SolveH;
            }

            DriverState::Done => {
                let (sorted_evals, sorted_evecs) = permute_vecs(&evals, &evecs);
                return Ok(SolveResult {
                    evals: sorted_evals,
                    evecs: sorted_evecs,
                    stats,
                });
            }
        }
    }
}
