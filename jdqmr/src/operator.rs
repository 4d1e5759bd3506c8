//! Generic linear operators acting on vectors and matrices
//!
//! This is the trait that lets the Krylov/Davidson machinery stay agnostic
//! to whether the action of `A` comes from a dense matrix, a preconditioner,
//! or a user-supplied matrix-vector product callback.

use ndarray::*;

use crate::types::*;

/// An operator mapping vectors to vectors, `y = A x`
pub trait LinearOperator {
    type Elem: Scalar;

    /// Apply the operator to `a`, returning a new array
    fn apply<S>(&self, a: &ArrayBase<S, Ix1>) -> Array1<Self::Elem>
    where
        S: Data<Elem = Self::Elem>,
    {
        let mut b = a.to_owned();
        self.apply_mut(&mut b);
        b
    }

    /// Apply the operator to `a`, overwriting it in place
    fn apply_mut<S>(&self, a: &mut ArrayBase<S, Ix1>)
    where
        S: DataMut<Elem = Self::Elem>;

    /// Apply the operator column-wise to a block of vectors
    fn apply2<S>(&self, a: &ArrayBase<S, Ix2>) -> Array2<Self::Elem>
    where
        S: Data<Elem = Self::Elem>,
    {
        let mut b = a.to_owned();
        self.apply2_mut(&mut b);
        b
    }

    /// Apply the operator column-wise to a block of vectors in place
    fn apply2_mut<S>(&self, a: &mut ArrayBase<S, Ix2>)
    where
        S: DataMut<Elem = Self::Elem>,
    {
        for mut col in a.axis_iter_mut(Axis(1)) {
            self.apply_mut(&mut col);
        }
    }
}

/// A dense matrix is itself a linear operator through ordinary `dot`
impl<A, S> LinearOperator for ArrayBase<S, Ix2>
where
    A: Scalar,
    S: Data<Elem = A>,
{
    type Elem = A;

    fn apply_mut<Sb>(&self, a: &mut ArrayBase<Sb, Ix1>)
    where
        Sb: DataMut<Elem = A>,
    {
        let y = self.dot(a);
        a.assign(&y);
    }

    fn apply2_mut<Sb>(&self, a: &mut ArrayBase<Sb, Ix2>)
    where
        Sb: DataMut<Elem = A>,
    {
        let y = self.dot(a);
        a.assign(&y);
    }
}

/// The user-supplied matrix–vector product `y <- A x`, applied one block of
/// columns at a time. Named separately from [`LinearOperator`] so a driver
/// can hold `Box<dyn MatVec<Elem = A>>` instead of threading a closure
/// generic through every call site.
pub trait MatVec {
    type Elem: Scalar;

    fn matvec(&mut self, x: ArrayView2<Self::Elem>) -> Array2<Self::Elem>;
}

/// `y <- K^-1 x`, an approximation to `(A - sigma I)^-1`. Absence of a
/// preconditioner (GD+k with no `K`) is represented by `Option<&mut dyn
/// Preconditioner<Elem = A>>` at call sites rather than an identity impl,
/// so the correction solver can tell "no preconditioner" apart from "the
/// identity preconditioner" when deciding whether the skew projector path
/// is available at all.
pub trait Preconditioner {
    type Elem: Scalar;

    fn apply_preconditioner(&mut self, x: ArrayView2<Self::Elem>) -> Array2<Self::Elem>;
}

/// `out <- sum(in)` across ranks (MPI_Allreduce-equivalent). The core
/// never assumes anything about how the sum is carried out beyond "every
/// rank performs the same sequence of calls with identical reduction
/// lengths" -- single-process callers use [`LocalSum`], which is the
/// identity.
pub trait GlobalSum<A> {
    fn global_sum(&self, local: &mut [A]);
}

/// The trivial single-rank reducer: every dot product and residual-norm
/// square in this crate passes through exactly one `global_sum` call so
/// that swapping in an MPI-backed [`GlobalSum`] later is a drop-in change,
/// not a rewrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSum;

impl<A> GlobalSum<A> for LocalSum {
    fn global_sum(&self, _local: &mut [A]) {}
}

/// User override of the convergence test (`primme_params.convTestFun`).
/// `eval`/`evec`/`r_norm` describe the candidate pair; the default
/// implementation used when a caller supplies none is
/// `convergence::ConvergenceTest::Absolute`.
pub trait ConvTestFn<A: Scalar> {
    fn is_converged(&mut self, eval: A::Real, evec: ArrayView1<A>, r_norm: A::Real) -> bool;
}
