//! Incremental maintenance of the projected matrices H = V*AV, and (for
//! refined/harmonic targeting) Q, R, QV = Q*V
//!
//! Each routine extends the projection by exactly the new block of columns
//! that were just appended to V/W, rather than recomputing the whole
//! projected matrix from scratch every outer step.

use ndarray::*;

use crate::error::Result as LResult;
use crate::norm::Norm;
use crate::numeric::overlap_safe_copy;
use crate::operator::GlobalSum;
use crate::ortho::orthogonalize_block;
use crate::types::*;

/// Extend `h` (m x m, `uplo` triangle authoritative) to `(m+b) x (m+b)` given
/// that `v`/`w` have just grown by `b` columns.
///
/// `h_new[i, m..] = v[:, i]' * w_new[:, m..]` for every old column `i`, and
/// the new block's self-interaction `v_new' * w_new` is symmetrized the same
/// way `eigh`'s Cholesky-adjacent routines fold a computed block back onto
/// itself.
pub fn update_h<A>(
    h: &ArrayView2<A>,
    v_old: ArrayView2<A>,
    w_new: ArrayView2<A>,
    v_new: ArrayView2<A>,
) -> Array2<A>
where
    A: Scalar,
{
    let m = h.nrows();
    let b = w_new.ncols();
    let n = m + b;
    let mut out = Array2::<A>::zeros((n, n));
    overlap_safe_copy(h, &mut out.slice_mut(s![..m, ..m]));

    let top_right = v_old.t().dot(&w_new); // m x b
    out.slice_mut(s![..m, m..]).assign(&top_right);
    for i in 0..m {
        for j in 0..b {
            out[(m + j, i)] = top_right[(i, j)].conj();
        }
    }

    let mut corner = v_new.t().dot(&w_new); // b x b
    let corner_t = corner.t().mapv(|x| x.conj());
    corner = (&corner + &corner_t).mapv(|x| x / (A::one() + A::one()));
    out.slice_mut(s![m.., m..]).assign(&corner);

    out
}

/// Extend `(q, r)`, the QR factorization of `(A - tau I) V`, by the columns
/// corresponding to the new block `aw_new = (A - tau I) v_new`.
///
/// `r` grows from `m x m` to `(m+b) x (m+b)` and stays upper triangular;
/// `q` grows from `n x m` to `n x (m+b)` with orthonormal columns, using the
/// same block-CGS engine as ordinary basis orthogonalization, against
/// the existing `q` as the "basis to the left".
pub fn update_qr<A>(
    q: ArrayView2<A>,
    r: ArrayView2<A>,
    aw_new: ArrayView2<A>,
    tol: A::Real,
    sum: &dyn GlobalSum<A>,
) -> (Array2<A>, Array2<A>)
where
    A: Scalar,
{
    let m = r.nrows();
    let b = aw_new.ncols();
    let n = m + b;

    let r_top = q.t().dot(&aw_new); // m x b: component already in span(Q)
    let mut block = aw_new.to_owned();
    for (mut col, proj) in block.axis_iter_mut(Axis(1)).zip(r_top.axis_iter(Axis(1))) {
        let correction = q.dot(&proj);
        col -= &correction;
    }
    // The residual norm before normalization is exactly the new diagonal
    // entry of R; capture it here since `orthogonalize_block` normalizes
    // its columns in place and doesn't hand norms back.
    let diag: Vec<A> = block
        .axis_iter(Axis(1))
        .map(|c| A::from_real(c.norm_l2()))
        .collect();

    let kept = orthogonalize_block(&mut block, None, q, tol, sum);
    debug_assert_eq!(kept, b, "update_qr: new columns became linearly dependent on Q");

    let mut q_new = Array2::<A>::zeros((q.nrows(), n));
    q_new.slice_mut(s![.., ..m]).assign(&q);
    q_new.slice_mut(s![.., m..]).assign(&block.slice(s![.., ..kept]));

    let mut r_new = Array2::<A>::zeros((n, n));
    r_new.slice_mut(s![..m, ..m]).assign(&r);
    r_new.slice_mut(s![..m, m..]).assign(&r_top);
    for j in 0..kept {
        r_new[(m + j, m + j)] = diag[j];
    }

    (q_new, r_new)
}

pub fn update_h_workspace_len(m: usize, block: usize) -> usize {
    (m + block) * block
}

pub fn update_qr_workspace_len(n: usize, block: usize) -> usize {
    n * block
}

pub type ProjectionResult<T> = LResult<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::close_l2;
    use crate::generate::random;
    use crate::operator::LocalSum;

    #[test]
    fn update_h_matches_full_recompute() {
        let n = 12;
        let v: Array2<f64> = {
            let raw: Array2<f64> = random((n, 4));
            let (q, _) = crate::qr::QRInto::qr_into(raw).unwrap();
            q
        };
        let a: Array2<f64> = {
            let raw: Array2<f64> = random((n, n));
            &raw + &raw.t()
        };
        let w = a.dot(&v);

        let v_old = v.slice(s![.., ..2]);
        let w_old = w.slice(s![.., ..2]);
        let v_new = v.slice(s![.., 2..]);
        let w_new = w.slice(s![.., 2..]);

        let h_old = v_old.t().dot(&w_old);
        let h_full = update_h(&h_old.view(), v_old, w_new, v_new);
        let expected = v.t().dot(&w);
        close_l2(&h_full, &expected, 1e-8);
    }

    #[test]
    fn update_qr_keeps_r_upper_triangular_block() {
        let n = 10;
        let v: Array2<f64> = {
            let raw: Array2<f64> = random((n, 2));
            let (q, _) = crate::qr::QRInto::qr_into(raw).unwrap();
            q
        };
        let (q0, r0) = crate::qr::QRInto::qr_into(v.clone()).unwrap();
        let more: Array2<f64> = random((n, 2));
        let (q1, r1) = update_qr(q0.view(), r0.view(), more.view(), 1e-10, &LocalSum);
        assert_eq!(q1.ncols(), 4);
        assert_eq!(r1.nrows(), 4);
        for i in 0..4 {
            for j in 0..i {
                assert!(r1[(i, j)].abs() < 1e-6);
            }
        }
    }
}
