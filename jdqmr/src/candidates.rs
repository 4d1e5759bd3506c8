//! Prepare candidates & block selection
//!
//! From the sorted Ritz values, pick up to `max_block_size` pairs that still
//! need correction and compute their residuals with the cache-blocked kernel
//! from [`crate::numeric`], mirroring `prepare_candidates_dprimme` +
//! `reset_update_VWXR`'s fused residual computation.

use ndarray::*;

use crate::convergence::ConvergenceFlag;
use crate::norm::Norm;
use crate::numeric::residual_block;
use crate::types::*;

/// The block handed to the correction solver: which basis-local indices were
/// chosen, their Ritz values/vectors-in-the-basis, and the matching
/// `V·c`/residual block.
pub struct CandidateBlock<A: Scalar> {
    pub indices: Vec<usize>,
    pub theta: Array1<A::Real>,
    pub x: Array2<A>,
    pub residual: Array2<A>,
    pub res_norms: Array1<A::Real>,
}

/// Choose up to `max_block_size` indices into `flags`/`vals` that are still
/// `Unconverged`, in the order they already appear (i.e. already sorted by
/// target, since this runs against the output of `solve_h`). Locked pairs
/// are never present in `flags` -- they have been moved into `evecs` by the
/// time this runs under hard locking, or are simply absent from the
/// "still active" index range under soft locking.
pub fn select_candidates(flags: &[ConvergenceFlag], max_block_size: usize) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, f)| **f == ConvergenceFlag::Unconverged)
        .take(max_block_size)
        .map(|(i, _)| i)
        .collect()
}

/// Compute the residual block `R_block = W·c − (V·c)·diag(hVals)` for the
/// selected columns of `hvecs`, along with each column's L2 norm.
pub fn compute_candidate_block<A>(
    v: &Array2<A>,
    w: &Array2<A>,
    hvals: &Array1<A::Real>,
    hvecs: &Array2<A>,
    indices: &[usize],
) -> CandidateBlock<A>
where
    A: Scalar,
{
    let c = hvecs.select(Axis(1), indices);
    let theta = Array1::from_iter(indices.iter().map(|&i| hvals[i]));
    let x = v.dot(&c);
    let w_block = w.dot(&c);
    let residual = residual_block(&x, &w_block, &theta.mapv(A::from_real));
    let res_norms = Array1::from_iter(residual.axis_iter(Axis(1)).map(|col| col.norm_l2()));
    CandidateBlock {
        indices: indices.to_vec(),
        theta,
        x,
        residual,
        res_norms,
    }
}

/// Convenience wrapper: select then compute in one call, as the driver uses
/// it every CONVERGE→BLOCK transition.
pub fn prepare_candidates<A>(
    v: &Array2<A>,
    w: &Array2<A>,
    hvals: &Array1<A::Real>,
    hvecs: &Array2<A>,
    flags: &[ConvergenceFlag],
    max_block_size: usize,
) -> CandidateBlock<A>
where
    A: Scalar,
{
    let indices = select_candidates(flags, max_block_size);
    compute_candidate_block(v, w, hvals, hvecs, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::random;

    #[test]
    fn selects_up_to_block_size_unconverged_pairs() {
        let flags = vec![
            ConvergenceFlag::Converged,
            ConvergenceFlag::Unconverged,
            ConvergenceFlag::PracticallyConverged,
            ConvergenceFlag::Unconverged,
            ConvergenceFlag::Unconverged,
        ];
        let idx = select_candidates(&flags, 2);
        assert_eq!(idx, vec![1, 3]);
    }

    #[test]
    fn residual_block_matches_definition() {
        let n = 8;
        let m = 3;
        let v: Array2<f64> = random((n, m));
        let w: Array2<f64> = random((n, m));
        let hvals = Array1::from(vec![1.0, 2.0, 3.0]);
        let hvecs: Array2<f64> = Array2::eye(m);
        let block = compute_candidate_block(&v, &w, &hvals, &hvecs, &[0, 1, 2]);
        for j in 0..m {
            for i in 0..n {
                let expected = w[(i, j)] - v[(i, j)] * hvals[j];
                assert!((block.residual[(i, j)] - expected).abs() < 1e-10);
            }
        }
    }
}
