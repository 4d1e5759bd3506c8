//! Define Errors

use ndarray::{Ixs, ShapeError};
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, LinalgError>;

/// Master Error type of this crate
#[derive(Debug, Error)]
pub enum LinalgError {
    /// Matrix is not square
    #[error("Not square: rows({}) != cols({})", rows, cols)]
    NotSquare { rows: i32, cols: i32 },

    #[error(
        "Invalid value for LAPACK subroutine {}-th argument",
        -return_code
    )]
    LapackInvalidValue { return_code: i32 },

    #[error(
        "Comutational failure in LAPACK subroutine: return_code = {}",
        return_code
    )]
    LapackComputationalFailure { return_code: i32 },

    /// Strides of the array is not supported
    #[error("invalid stride: s0={}, s1={}", s0, s1)]
    InvalidStride { s0: Ixs, s1: Ixs },

    /// Memory is not aligned continously
    #[error("Memroy is not continously")]
    MemoryNotCont,

    /// Obj cannot be made from a (rows, cols) matrix
    #[error("{} cannot be made from a ({}, {}) matrix", obj, rows, cols)]
    NotStandardShape {
        obj: &'static str,
        rows: i32,
        cols: i32,
    },

    /// Strides of the array is not supported
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Result type of the eigensolver driver and its subsystems
pub type EigenResult<T> = ::std::result::Result<T, EigenError>;

/// Errors surfaced by the solver driver, one variant per failure kind the
/// driver distinguishes when it captures the first non-zero subsystem code.
#[derive(Debug, Error)]
pub enum EigenError {
    /// A `SolverParams` field is out of range; `field` names the offending
    /// parameter so callers can report it the way `check_input` does.
    #[error("invalid solver parameter `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The workspace arena could not provide a slice of the requested size.
    #[error("workspace allocation failed: requested {requested} elements, pool has {available}")]
    AllocationFailure { requested: usize, available: usize },

    /// A dense LAPACK call inside a subsystem (eigh/SVD/QR/UDU) returned a
    /// non-zero info code.
    #[error("numerical failure in {subsystem}: {source}")]
    NumericalFailure {
        subsystem: &'static str,
        #[source]
        source: lax::error::Error,
    },

    /// Orthogonalization could not recover a linearly independent column
    /// after exhausting its random-replacement cap.
    #[error("orthogonalization stagnated after {attempts} random replacements")]
    StagnationFailure { attempts: usize },

    /// The driver exhausted `maxOuterIterations` or `maxMatvecs` before
    /// reaching `numEvals` converged pairs.
    #[error("convergence aborted after {outer_iterations} outer iterations, {matvecs} matvecs, {num_converged}/{num_evals} converged")]
    ConvergenceAborted {
        outer_iterations: usize,
        matvecs: usize,
        num_converged: usize,
        num_evals: usize,
    },

    /// A user-supplied collaborator (matvec, preconditioner, global sum,
    /// convergence test) signaled failure.
    #[error("collaborator `{collaborator}` failed: {reason}")]
    CallbackFailure {
        collaborator: &'static str,
        reason: String,
    },
}

/// One entry of the driver's error-trace stack, hung off `SolverStats`
/// rather than kept as global state.
#[derive(Debug, Clone)]
pub struct ErrorTraceEntry {
    pub site: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub detail: String,
}

impl ErrorTraceEntry {
    pub fn new(site: &'static str, file: &'static str, line: u32, detail: impl Into<String>) -> Self {
        ErrorTraceEntry {
            site,
            file,
            line,
            detail: detail.into(),
        }
    }
}

/// Lift a dense-linear-algebra failure (`eigh`/`svd`/`qr`/`udu`, all of
/// which return [`LinalgError`]) into the driver's [`EigenError`], tagging
/// it with the subsystem that raised it.
pub fn wrap_linalg(subsystem: &'static str, e: LinalgError) -> EigenError {
    let source = match e {
        LinalgError::LapackInvalidValue { return_code } => {
            lax::error::Error::LapackInvalidValue { return_code }
        }
        LinalgError::LapackComputationalFailure { return_code } => {
            lax::error::Error::LapackComputationalFailure { return_code }
        }
        _ => lax::error::Error::InvalidShape,
    };
    EigenError::NumericalFailure { subsystem, source }
}

/// Records `$detail` at the current source location into `$stack: &mut Vec<ErrorTraceEntry>`.
#[macro_export]
macro_rules! trace_error {
    ($stack:expr, $site:expr, $detail:expr) => {
        $stack.push($crate::error::ErrorTraceEntry::new($site, file!(), line!(), $detail))
    };
}
