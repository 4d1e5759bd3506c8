//! Vector norms

use ndarray::*;
use num_traits::Zero;

use crate::types::*;

pub trait Norm {
    type Output;

    /// 1-norm, sum of absolute values
    fn norm_l1(&self) -> Self::Output;

    /// 2-norm, Euclidean length
    fn norm_l2(&self) -> Self::Output;

    /// max-norm, largest absolute entry
    fn norm_max(&self) -> Self::Output;
}

impl<A, S, D> Norm for ArrayBase<S, D>
where
    A: Scalar,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = A::Real;

    fn norm_l1(&self) -> Self::Output {
        self.iter().fold(Zero::zero(), |acc, x| acc + x.abs())
    }

    fn norm_l2(&self) -> Self::Output {
        self.iter()
            .fold(Zero::zero(), |acc: Self::Output, x| {
                let r = x.abs();
                acc + r * r
            })
            .sqrt()
    }

    fn norm_max(&self) -> Self::Output {
        self.iter()
            .fold(Zero::zero(), |acc: Self::Output, x| acc.max(x.abs()))
    }
}
