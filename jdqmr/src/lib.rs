//! `jdqmr` is a preconditioned Jacobi-Davidson/JDQMR eigensolver for large,
//! sparse Hermitian problems `A x = lambda x`, built on [`ndarray`](https://github.com/rust-ndarray/ndarray)
//! and [LAPACK](http://www.netlib.org/lapack/) (via the companion `lax` crate).
//!
//! The entry point is [`solve`], which drives a subspace of Ritz pairs
//! through extraction, a convergence test, preconditioned correction, and
//! restart/locking until `num_evals` pairs of the requested [`Target`] have
//! converged. Everything the driver needs from the caller is expressed as a
//! trait: [`operator::MatVec`] for the matrix-vector product,
//! [`operator::Preconditioner`] for an optional preconditioner, and
//! [`operator::GlobalSum`] for the inner-product reduction (the identity for
//! a single process, an `MPI_Allreduce`-style collaborator for a distributed
//! caller).
//!
//! Module map
//! -----------------------
//! - Configuration: [`params`] (`SolverParams`, `Target`, `Projection`, ...)
//! - Driver: [`driver`] (the main state machine)
//! - Extraction: [`solve_h`] (Rayleigh-Ritz, refined, harmonic)
//! - Correction: [`correction`] (GD+k, JDQMR)
//! - Restart and locking: [`restart`], [`locking`]
//! - Convergence test: [`convergence`]
//! - Orthogonalization and incremental projection: [`ortho`], [`projection`]
//! - Dense linear algebra primitives: [`eigh`], [`svd`], [`qr`], [`triangular`],
//!   [`cholesky`], [`udu`]
//! - Errors: [`error`]

#![allow(
    clippy::module_inception,
    clippy::many_single_char_names,
    clippy::type_complexity,
    clippy::ptr_arg
)]
#![deny(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links)]

#[macro_use]
extern crate ndarray;

pub mod assert;
pub mod candidates;
pub mod cholesky;
pub mod convergence;
pub mod convert;
pub mod correction;
pub mod diagonal;
pub mod driver;
pub mod eigh;
pub mod error;
pub mod generate;
pub mod inner;
pub mod layout;
pub mod locking;
pub mod norm;
pub mod numeric;
pub mod operator;
pub mod opnorm;
pub mod ortho;
pub mod params;
pub mod projection;
pub mod qr;
pub mod restart;
pub mod solve_h;
pub mod svd;
pub mod trace;
pub mod triangular;
pub mod types;
pub mod udu;
pub mod workspace;

pub use crate::assert::*;
pub use crate::cholesky::*;
pub use crate::convergence::ConvergenceFlag;
pub use crate::convert::*;
pub use crate::diagonal::*;
pub use crate::driver::{solve, DriverState, SolverStats};
pub use crate::eigh::*;
pub use crate::generate::*;
pub use crate::inner::*;
pub use crate::layout::*;
pub use crate::norm::*;
pub use crate::operator::*;
pub use crate::opnorm::*;
pub use crate::params::{
    ConvTest, CorrectionParams, Projection, Projectors, RestartScheme, RestartingParams,
    SolverParams, SolverParamsBuilder, Target,
};
pub use crate::qr::*;
pub use crate::solve_h::RitzPairs;
pub use crate::svd::*;
pub use crate::trace::*;
pub use crate::triangular::*;
pub use crate::types::*;
pub use crate::workspace::{size_query, WorkspaceBreakdown};
pub use crate::error::{EigenError, EigenResult};
