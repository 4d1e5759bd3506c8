//! Cholesky decomposition of Hermitian (or real symmetric) positive definite matrices

use ndarray::*;

use crate::convert::*;
use crate::error::*;
use crate::layout::*;
use crate::types::*;

pub use lax::UPLO;

/// Cholesky decomposition of Hermitian matrix reference
pub trait Cholesky {
    type Output;
    fn cholesky(&self, uplo: UPLO) -> Result<Self::Output>;
}

/// Cholesky decomposition of Hermitian matrix
pub trait CholeskyInto: Sized {
    fn cholesky_into(self, uplo: UPLO) -> Result<Self>;
}

/// Cholesky decomposition of mutable reference of Hermitian matrix
pub trait CholeskyInplace {
    fn cholesky_inplace(&mut self, uplo: UPLO) -> Result<&mut Self>;
}

impl<A, S> CholeskyInto for ArrayBase<S, Ix2>
where
    A: Scalar + Lapack,
    S: DataMut<Elem = A>,
{
    fn cholesky_into(mut self, uplo: UPLO) -> Result<Self> {
        self.cholesky_inplace(uplo)?;
        Ok(self)
    }
}

impl<A, S> Cholesky for ArrayBase<S, Ix2>
where
    A: Scalar + Lapack,
    S: Data<Elem = A>,
{
    type Output = Array2<A>;

    fn cholesky(&self, uplo: UPLO) -> Result<Self::Output> {
        let a = self.to_owned();
        a.cholesky_into(uplo)
    }
}

impl<A, S> CholeskyInplace for ArrayBase<S, Ix2>
where
    A: Scalar + Lapack,
    S: DataMut<Elem = A>,
{
    fn cholesky_inplace(&mut self, uplo: UPLO) -> Result<&mut Self> {
        let l = self.square_layout()?;
        A::cholesky(l, uplo, self.as_allocated_mut()?)?;
        triangular_fill_hermitian(self, uplo);
        Ok(self)
    }
}

/// Cholesky factor kept around so repeated solves against the same matrix
/// don't refactor it every time (used for the constraint and Gram-matrix
/// projections in block orthogonalization)
pub struct CholeskyFactorized<S: DataOwned> {
    factor: ArrayBase<S, Ix2>,
    uplo: UPLO,
}

/// Factorize once, then reuse via [`CholeskyFactorized::solvec`]
pub trait FactorizeC<S: DataOwned> {
    fn factorizec(&self, uplo: UPLO) -> Result<CholeskyFactorized<S>>;
}

impl<A, Si, So> FactorizeC<So> for ArrayBase<Si, Ix2>
where
    A: Scalar + Lapack,
    Si: Data<Elem = A>,
    So: DataOwned<Elem = A> + DataMut,
{
    fn factorizec(&self, uplo: UPLO) -> Result<CholeskyFactorized<So>> {
        let a: ArrayBase<So, Ix2> = replicate(self);
        let factor = a.cholesky_into(uplo)?;
        Ok(CholeskyFactorized { factor, uplo })
    }
}

impl<A, S> CholeskyFactorized<S>
where
    A: Scalar + Lapack,
    S: Data<Elem = A> + DataOwned,
{
    /// Solve `A x = b` given the cached Cholesky factor of `A`
    pub fn solvec<Sb>(&self, b: &ArrayBase<Sb, Ix1>) -> Result<Array1<A>>
    where
        Sb: Data<Elem = A>,
    {
        let mut x = b.to_owned();
        A::solve_cholesky(
            self.factor.square_layout()?,
            self.uplo,
            self.factor.as_allocated()?,
            x.as_slice_mut().ok_or(LinalgError::MemoryNotCont)?,
        )?;
        Ok(x)
    }
}
