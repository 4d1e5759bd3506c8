//! Solver configuration (`primme_params`)
//!
//! A single flat struct enumerating every field, built with chained
//! builder methods (`.eps(...)`, `.max_outer_iterations(...)`,
//! `.precondition(...)`). No runtime mutation after `solve`/`size_query`
//! starts.

use num_traits::NumCast;

use crate::error::{EigenError, EigenResult};
use crate::types::*;

/// Which part of the spectrum the driver is after (`primme_params.target`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<R> {
    Smallest,
    Largest,
    ClosestGeq(R),
    ClosestLeq(R),
    ClosestAbs(R),
}

/// Extraction strategy (`primme_params.projectionParams.projection`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    RayleighRitz,
    Refined,
    Harmonic,
}

/// Restart size policy (`primme_params.restartingParams.scheme`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartScheme {
    Thick,
    Dtr,
}

/// Inner-solver stopping rule (`primme_params.correctionParams.convTest`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvTest {
    FullLTolerance,
    DecreasingLTolerance,
    AdaptiveETolerance,
    Adaptive,
}

/// Which of the four Jacobi-Davidson projector variants are active
/// (`primme_params.correctionParams.projectors`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Projectors {
    pub left_q: bool,
    pub left_x: bool,
    pub right_q: bool,
    pub right_x: bool,
    pub skew_q: bool,
    pub skew_x: bool,
}

/// `primme_params.restartingParams`.
#[derive(Debug, Clone, Copy)]
pub struct RestartingParams {
    pub scheme: RestartScheme,
    pub max_prev_retain: usize,
}

impl Default for RestartingParams {
    fn default() -> Self {
        RestartingParams {
            scheme: RestartScheme::Thick,
            max_prev_retain: 0,
        }
    }
}

/// `primme_params.correctionParams`.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionParams<R> {
    pub precondition: bool,
    pub conv_test: ConvTest,
    pub rel_tol_base: R,
    pub projectors: Projectors,
    pub max_inner_iterations: usize,
}

impl<R: NumCast> Default for CorrectionParams<R> {
    fn default() -> Self {
        CorrectionParams {
            precondition: false,
            conv_test: ConvTest::AdaptiveETolerance,
            rel_tol_base: NumCast::from(1.5).unwrap(),
            projectors: Projectors::default(),
            max_inner_iterations: usize::MAX, // unlimited by default
        }
    }
}

/// Flat solver configuration, the Rust counterpart of `primme_params`.
#[derive(Debug, Clone)]
pub struct SolverParams<R> {
    pub n: usize,
    pub n_local: usize,
    pub num_procs: usize,
    pub proc_id: usize,
    pub num_evals: usize,
    pub target: Target<R>,
    pub eps: R,
    pub a_norm: Option<R>,
    pub max_basis_size: usize,
    pub min_restart_size: usize,
    pub max_block_size: usize,
    pub max_outer_iterations: usize,
    pub max_matvecs: usize,
    pub num_ortho_const: usize,
    pub init_size: usize,
    pub locking: bool,
    pub iseed: [i64; 4],
    pub print_level: u8,
    pub projection: Projection,
    pub restarting_params: RestartingParams,
    pub correction_params: CorrectionParams<R>,
}

/// Builder for [`SolverParams`], a chained `.builder(...).eps(...).max_matvecs(...)` call.
pub struct SolverParamsBuilder<R> {
    params: SolverParams<R>,
}

impl<R> SolverParams<R>
where
    R: NumCast + PartialOrd + Copy,
{
    /// Start a builder with the minimal mandatory fields (`n`, `num_evals`,
    /// `target`); everything else takes PRIMME's documented defaults.
    pub fn builder(n: usize, num_evals: usize, target: Target<R>) -> SolverParamsBuilder<R> {
        let max_block_size = 1;
        SolverParamsBuilder {
            params: SolverParams {
                n,
                n_local: n,
                num_procs: 1,
                proc_id: 0,
                num_evals,
                target,
                eps: NumCast::from(1e-12).unwrap(),
                a_norm: None,
                max_basis_size: usize::min(n, 2 * num_evals + max_block_size).max(num_evals + max_block_size),
                min_restart_size: num_evals,
                max_block_size,
                max_outer_iterations: usize::MAX,
                max_matvecs: usize::MAX,
                num_ortho_const: 0,
                init_size: num_evals,
                locking: false,
                iseed: [1, 2, 3, 5],
                print_level: 0,
                projection: Projection::RayleighRitz,
                restarting_params: RestartingParams::default(),
                correction_params: CorrectionParams::default(),
            },
        }
    }
}

impl<R> SolverParamsBuilder<R>
where
    R: NumCast + PartialOrd + Copy,
{
    pub fn eps(mut self, eps: R) -> Self {
        self.params.eps = eps;
        self
    }

    pub fn a_norm(mut self, a_norm: R) -> Self {
        self.params.a_norm = Some(a_norm);
        self
    }

    pub fn max_basis_size(mut self, max_basis_size: usize) -> Self {
        self.params.max_basis_size = max_basis_size;
        self
    }

    pub fn min_restart_size(mut self, min_restart_size: usize) -> Self {
        self.params.min_restart_size = min_restart_size;
        self
    }

    pub fn max_block_size(mut self, max_block_size: usize) -> Self {
        self.params.max_block_size = max_block_size;
        self
    }

    pub fn max_outer_iterations(mut self, n: usize) -> Self {
        self.params.max_outer_iterations = n;
        self
    }

    pub fn max_matvecs(mut self, n: usize) -> Self {
        self.params.max_matvecs = n;
        self
    }

    pub fn locking(mut self, locking: bool) -> Self {
        self.params.locking = locking;
        self
    }

    pub fn print_level(mut self, level: u8) -> Self {
        self.params.print_level = level.min(5);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.params.projection = projection;
        self
    }

    pub fn restart_scheme(mut self, scheme: RestartScheme, max_prev_retain: usize) -> Self {
        self.params.restarting_params = RestartingParams {
            scheme,
            max_prev_retain,
        };
        self
    }

    pub fn precondition(mut self, precondition: bool) -> Self {
        self.params.correction_params.precondition = precondition;
        self
    }

    pub fn conv_test(mut self, conv_test: ConvTest) -> Self {
        self.params.correction_params.conv_test = conv_test;
        self
    }

    pub fn projectors(mut self, projectors: Projectors) -> Self {
        self.params.correction_params.projectors = projectors;
        self
    }

    pub fn max_inner_iterations(mut self, n: usize) -> Self {
        self.params.correction_params.max_inner_iterations = n;
        self
    }

    pub fn iseed(mut self, iseed: [i64; 4]) -> Self {
        self.params.iseed = remap_iseed(iseed, self.params.proc_id);
        self
    }

    pub fn proc_id(mut self, proc_id: usize, num_procs: usize) -> Self {
        self.params.proc_id = proc_id;
        self.params.num_procs = num_procs;
        self
    }

    /// Finish building and run the full-battery field validation
    /// (`check_input`).
    pub fn build(self) -> EigenResult<SolverParams<R>> {
        validate(&self.params)?;
        Ok(self.params)
    }
}

/// Remap an out-of-range `iseed` component deterministically from `proc_id`
/// into a LARNV-compatible seed instead of just re-randomizing. LARNV
/// requires each component in `0..=4095` and the last component odd.
pub fn remap_iseed(mut iseed: [i64; 4], proc_id: usize) -> [i64; 4] {
    for (k, s) in iseed.iter_mut().enumerate() {
        if !(0..=4095).contains(s) {
            *s = ((proc_id as i64) * 7 + (k as i64) * 13 + 1) % 4096;
        }
    }
    if iseed[3] % 2 == 0 {
        iseed[3] = (iseed[3] + 1) % 4096;
    }
    iseed
}

/// Field-by-field validation (`check_input`). Each failure names the
/// offending field so callers can report it the way the `-4..-33` exit
/// codes do.
pub fn validate<R>(p: &SolverParams<R>) -> EigenResult<()>
where
    R: NumCast + PartialOrd + Copy,
{
    let fail = |field: &'static str, reason: &str| {
        Err(EigenError::InvalidInput {
            field,
            reason: reason.to_string(),
        })
    };

    if p.n == 0 {
        return fail("n", "must be positive");
    }
    if p.n_local == 0 || p.n_local > p.n {
        return fail("n_local", "must be in 1..=n");
    }
    if p.num_evals == 0 || p.num_evals > p.n {
        return fail("num_evals", "must be in 1..=n");
    }
    if p.max_block_size == 0 {
        return fail("max_block_size", "must be positive");
    }
    if p.max_basis_size < p.num_evals + p.max_block_size {
        return fail(
            "max_basis_size",
            "must be at least num_evals + max_block_size",
        );
    }
    if p.min_restart_size == 0 || p.min_restart_size >= p.max_basis_size {
        return fail("min_restart_size", "must be in 1..max_basis_size");
    }
    let eps_floor: R = NumCast::from(1e-15).unwrap();
    if p.eps < eps_floor {
        return fail("eps", "below machine epsilon floor");
    }
    if p.locking && p.init_size > p.max_basis_size {
        return fail("init_size", "exceeds max_basis_size under locking");
    }
    if p.correction_params.conv_test == ConvTest::FullLTolerance
        && p.correction_params.rel_tol_base <= NumCast::from(1.0).unwrap()
    {
        return fail(
            "correction_params.rel_tol_base",
            "full_LTolerance requires rel_tol_base > 1",
        );
    }
    for s in p.iseed.iter() {
        if !(0..4096).contains(s) {
            return fail("iseed", "component out of 0..4095 after remap");
        }
    }
    if p.correction_params.projectors.skew_x || p.correction_params.projectors.skew_q {
        return fail(
            "correction_params.projectors",
            "skew_x/skew_q require a UDU-factorized skew context the driver does not build yet",
        );
    }
    if p.num_ortho_const != 0 {
        return fail(
            "num_ortho_const",
            "caller-supplied constraint vectors are not implemented yet",
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_validate() {
        let params = SolverParams::<f64>::builder(10, 3, Target::Smallest)
            .max_basis_size(6)
            .build()
            .unwrap();
        assert_eq!(params.num_evals, 3);
        assert_eq!(params.max_basis_size, 6);
    }

    #[test]
    fn rejects_undersized_basis() {
        let err = SolverParams::<f64>::builder(10, 5, Target::Smallest)
            .max_basis_size(3)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn iseed_remap_is_deterministic_from_proc_id() {
        let seed = remap_iseed([-1, 2, 3, 10], 7);
        assert!(seed.iter().all(|s| (0..4096).contains(s)));
        assert_eq!(remap_iseed([-1, 2, 3, 10], 7), seed);
        assert_eq!(seed[3] % 2, 1);
    }
}
