//! Test assertion helpers comparing arrays up to a tolerance

use ndarray::*;

use crate::norm::Norm;
use crate::types::*;

/// Relative-or-absolute closeness of two scalars
pub fn rclose<A: Scalar>(a: A, b: A, atol: A::Real) -> bool {
    (a - b).abs() < atol
}

/// Panics if the L1 distance between `a` and `b` exceeds `atol`
pub fn close_l1<A, S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>, atol: A::Real)
where
    A: Scalar,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    let diff = (a - b).norm_l1();
    assert!(
        diff < atol,
        "Deviates too much (L1): diff = {:?}, atol = {:?}\na = {:?}\nb = {:?}",
        diff,
        atol,
        a,
        b
    );
}

/// Panics if the L2 distance between `a` and `b` exceeds `atol`
pub fn close_l2<A, S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>, atol: A::Real)
where
    A: Scalar,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    let diff = (a - b).norm_l2();
    assert!(
        diff < atol,
        "Deviates too much (L2): diff = {:?}, atol = {:?}\na = {:?}\nb = {:?}",
        diff,
        atol,
        a,
        b
    );
}

/// Panics if the max-norm distance between `a` and `b` exceeds `atol`
pub fn close_max<A, S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>, atol: A::Real)
where
    A: Scalar,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    let diff = (a - b).norm_max();
    assert!(
        diff < atol,
        "Deviates too much (max): diff = {:?}, atol = {:?}\na = {:?}\nb = {:?}",
        diff,
        atol,
        a,
        b
    );
}
