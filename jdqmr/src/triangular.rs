//! Solve triangular linear systems and mask matrices to their triangular part

use ndarray::*;

use crate::convert::*;
use crate::error::*;
use crate::layout::*;
use crate::types::*;

pub use lax::{Diag, UPLO};

/// Zero out everything outside the requested triangle
pub trait IntoTriangular {
    fn into_triangular(self, uplo: UPLO) -> Self;
}

impl<A, S> IntoTriangular for ArrayBase<S, Ix2>
where
    A: Scalar,
    S: DataMut<Elem = A>,
{
    fn into_triangular(mut self, uplo: UPLO) -> Self {
        match uplo {
            UPLO::Upper => {
                for ((i, j), v) in self.indexed_iter_mut() {
                    if i > j {
                        *v = A::zero();
                    }
                }
            }
            UPLO::Lower => {
                for ((i, j), v) in self.indexed_iter_mut() {
                    if i < j {
                        *v = A::zero();
                    }
                }
            }
        }
        self
    }
}

/// Solve `self x = b` where `self` is triangular
pub trait SolveTriangular {
    type Elem: Scalar;

    fn solve_triangular<S>(
        &self,
        uplo: UPLO,
        diag: Diag,
        b: &ArrayBase<S, Ix2>,
    ) -> Result<Array2<Self::Elem>>
    where
        S: Data<Elem = Self::Elem>;
}

impl<A, Sa> SolveTriangular for ArrayBase<Sa, Ix2>
where
    A: Scalar + Lapack,
    Sa: Data<Elem = A>,
{
    type Elem = A;

    fn solve_triangular<Sb>(
        &self,
        uplo: UPLO,
        diag: Diag,
        b: &ArrayBase<Sb, Ix2>,
    ) -> Result<Array2<A>>
    where
        Sb: Data<Elem = A>,
    {
        let a_owned: Array2<A> = replicate(self);
        let al = a_owned.square_layout()?;
        let mut b_owned: Array2<A> = replicate(b);
        let bl = b_owned.layout()?;
        A::solve_triangular(
            al,
            bl,
            uplo,
            diag,
            a_owned.as_allocated()?,
            b_owned.as_allocated_mut()?,
        )?;
        Ok(b_owned)
    }
}
