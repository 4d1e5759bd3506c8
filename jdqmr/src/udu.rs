//! Symmetric indefinite (Bunch-Kaufman) factorize/solve
//!
//! Used for the `evecs' * K^-1 * evecs` projector behind the skew
//! projectors in the inner correction solver (`correction.rs`). Mirrors
//! [`crate::cholesky::CholeskyFactorized`]'s "factorize once, solve many"
//! shape, but over the indefinite `UPLO`-symmetric factorization
//! (`*sytrf`/`*sytrs`, exposed here through `lax::Solveh_`) rather than
//! Cholesky, since `M = evecs' K^-1 evecs` need not be positive definite.

use ndarray::*;

use crate::convert::replicate;
use crate::error::*;
use crate::layout::*;
use crate::types::*;

pub use lax::{Pivot, UPLO};

/// A factorized symmetric indefinite matrix, ready for repeated solves.
pub struct UduFactorization<S: DataOwned> {
    factor: ArrayBase<S, Ix2>,
    ipiv: Pivot,
    uplo: UPLO,
}

/// Factorize `self` (symmetric, `uplo` triangle authoritative) via
/// Bunch-Kaufman diagonal pivoting.
pub trait FactorizeUdu<S: DataOwned> {
    fn factorize_udu(&self, uplo: UPLO) -> Result<UduFactorization<S>>;
}

impl<A, Si, So> FactorizeUdu<So> for ArrayBase<Si, Ix2>
where
    A: Scalar + Lapack,
    Si: Data<Elem = A>,
    So: DataOwned<Elem = A> + DataMut,
{
    fn factorize_udu(&self, uplo: UPLO) -> Result<UduFactorization<So>> {
        let mut factor: ArrayBase<So, Ix2> = replicate(self);
        let l = factor.square_layout()?;
        let ipiv = A::bk(l, uplo, factor.as_allocated_mut()?)?;
        Ok(UduFactorization { factor, ipiv, uplo })
    }
}

impl<A, S> UduFactorization<S>
where
    A: Scalar + Lapack,
    S: Data<Elem = A> + DataOwned,
{
    /// Solve `M x = b` given the cached factorization of `M`.
    ///
    /// A non-zero pivot failure here (singular `M`) is the caller's signal
    /// to disable the skew projector for this step, not to abort the solve.
    pub fn solve<Sb>(&self, b: &ArrayBase<Sb, Ix1>) -> Result<Array1<A>>
    where
        Sb: Data<Elem = A>,
    {
        let mut x = b.to_owned();
        A::solveh(
            self.factor.square_layout()?,
            self.uplo,
            self.factor.as_allocated()?,
            &self.ipiv,
            x.as_slice_mut().ok_or(LinalgError::MemoryNotCont)?,
        )?;
        Ok(x)
    }

    /// Solve `M X = B` for a whole block of right-hand sides at once,
    /// column by column (the projector is applied to a block of residual
    /// vectors, never a single one, in the correction solver).
    pub fn solve_block<Sb>(&self, b: &ArrayBase<Sb, Ix2>) -> Result<Array2<A>>
    where
        Sb: Data<Elem = A>,
    {
        let cols: Result<Vec<Array1<A>>> = b.axis_iter(Axis(1)).map(|c| self.solve(&c)).collect();
        let cols = cols?;
        let views: Vec<_> = cols.iter().map(|c| c.view()).collect();
        Ok(stack(Axis(1), &views)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::close_l2;
    use crate::generate;

    #[test]
    fn solves_identity_rhs() {
        let m: Array2<f64> = generate::random_hermite(5);
        let fac = m.factorize_udu(UPLO::Lower).unwrap();
        let ident: Array2<f64> = Array2::eye(5);
        let minv = fac.solve_block(&ident).unwrap();
        let reconstructed = m.dot(&minv);
        close_l2(&reconstructed, &ident, 1e-8);
    }
}
