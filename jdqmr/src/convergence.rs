//! Convergence test (`convTestFunAbsolute`)
//!
//! A single default formula, with a slot for the caller to override it the
//! same way `primme_params.convTestFun` lets PRIMME callers replace the
//! default. Every comparison here is against `A::Real`; the complex scalar
//! itself never enters the convergence decision.

use num_traits::NumCast;

use crate::operator::ConvTestFn;
use crate::types::*;

/// Per-Ritz-pair convergence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceFlag {
    Unconverged,
    PracticallyConverged,
    Converged,
}

/// `resNorm < max(eps * max(||A||, estLargestSVal), 3.16 * epsMachine * estLargestSVal)`.
pub fn converged_threshold<R>(eps: R, a_norm: R, est_largest_sval: R, eps_machine: R) -> R
where
    R: PartialOrd + NumCast + Copy + std::ops::Mul<Output = R>,
{
    let scale = if a_norm > est_largest_sval { a_norm } else { est_largest_sval };
    let strict = eps * scale;
    let floor = machine_floor(eps_machine, est_largest_sval);
    if strict > floor { strict } else { floor }
}

fn machine_floor<R>(eps_machine: R, est_largest_sval: R) -> R
where
    R: NumCast + std::ops::Mul<Output = R> + Copy,
{
    let c: R = NumCast::from(3.16).unwrap();
    c * eps_machine * est_largest_sval
}

/// The default `convTestFunAbsolute` test: compares a single pair's residual
/// norm against [`converged_threshold`] and, failing that, against the
/// caller's `estimate_residual_error` for the practically-converged state.
pub fn conv_test_absolute<R>(
    res_norm: R,
    eps: R,
    a_norm: R,
    est_largest_sval: R,
    eps_machine: R,
    estimate_residual_error: R,
) -> ConvergenceFlag
where
    R: PartialOrd + NumCast + Copy + std::ops::Mul<Output = R>,
{
    let threshold = converged_threshold(eps, a_norm, est_largest_sval, eps_machine);
    if res_norm < threshold {
        ConvergenceFlag::Converged
    } else if res_norm <= estimate_residual_error {
        ConvergenceFlag::PracticallyConverged
    } else {
        ConvergenceFlag::Unconverged
    }
}

/// Evaluate the active test for one Ritz pair: the caller-supplied override
/// if present, otherwise [`conv_test_absolute`].
pub struct ConvergenceTest<A: Scalar> {
    pub eps: A::Real,
    pub a_norm: A::Real,
    pub eps_machine: A::Real,
    pub override_fn: Option<Box<dyn ConvTestFn<A>>>,
}

impl<A: Scalar> ConvergenceTest<A> {
    pub fn new(eps: A::Real, a_norm: A::Real, eps_machine: A::Real) -> Self {
        ConvergenceTest {
            eps,
            a_norm,
            eps_machine,
            override_fn: None,
        }
    }

    pub fn with_override(mut self, f: Box<dyn ConvTestFn<A>>) -> Self {
        self.override_fn = Some(f);
        self
    }

    pub fn evaluate(
        &mut self,
        eval: A::Real,
        evec: ndarray::ArrayView1<A>,
        res_norm: A::Real,
        est_largest_sval: A::Real,
        estimate_residual_error: A::Real,
    ) -> ConvergenceFlag {
        if let Some(f) = self.override_fn.as_mut() {
            return if f.is_converged(eval, evec, res_norm) {
                ConvergenceFlag::Converged
            } else {
                ConvergenceFlag::Unconverged
            };
        }
        conv_test_absolute(
            res_norm,
            self.eps,
            self.a_norm,
            est_largest_sval,
            self.eps_machine,
            estimate_residual_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_residual_converges() {
        let flag = conv_test_absolute(1e-10, 1e-8, 1.0, 1.0, 1e-16, 1e-9);
        assert_eq!(flag, ConvergenceFlag::Converged);
    }

    #[test]
    fn loose_residual_within_estimate_is_practically_converged() {
        let flag = conv_test_absolute(1e-3, 1e-8, 1.0, 1.0, 1e-16, 1e-2);
        assert_eq!(flag, ConvergenceFlag::PracticallyConverged);
    }

    #[test]
    fn loose_residual_beyond_estimate_is_unconverged() {
        let flag = conv_test_absolute(1e-1, 1e-8, 1.0, 1.0, 1e-16, 1e-2);
        assert_eq!(flag, ConvergenceFlag::Unconverged);
    }
}
