//! Inner product of vectors

use ndarray::*;

use crate::types::*;

/// Hermitian inner product `<self, rhs> = self^H rhs`
pub trait Inner {
    type Elem: Scalar;

    fn inner<S>(&self, rhs: &ArrayBase<S, Ix1>) -> Self::Elem
    where
        S: Data<Elem = Self::Elem>;
}

impl<A, S1> Inner for ArrayBase<S1, Ix1>
where
    A: Scalar,
    S1: Data<Elem = A>,
{
    type Elem = A;

    fn inner<S2>(&self, rhs: &ArrayBase<S2, Ix1>) -> A
    where
        S2: Data<Elem = A>,
    {
        assert_eq!(self.len(), rhs.len());
        Zip::from(self)
            .and(rhs)
            .fold(A::zero(), |acc, &a, &b| acc + a.conj() * b)
    }
}
