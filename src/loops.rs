//! Block iteration and reduction over the amplitude buffer
//!
//! Public operations lower to loops over either every amplitude or
//! every subspace block of the target qubits. Blocks produced for
//! distinct outer counters are disjoint (they are cosets of the
//! subgroup generated by the target bits), so block kernels may run
//! concurrently without synchronization; [`AmpView`] carries the
//! shared pointer across rayon workers on that basis.
//!
//! Reductions accumulate a real pair per iteration and sum partials
//! with associative real addition; with multiple workers the summation
//! order (and thus the rounding) depends on the split.

use crate::indexing::BlockIndexes;
use num_complex::Complex64;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Shared mutable view of the amplitude buffer for block kernels.
///
/// Accessors are unchecked in release builds; kernels address only the
/// indexes of their own block.
#[derive(Copy, Clone)]
pub(crate) struct AmpView {
    ptr: *mut Complex64,
    len: usize,
}

// Safety: kernels invoked through `for_each_block` touch disjoint
// index sets, so concurrent access never aliases.
unsafe impl Send for AmpView {}
unsafe impl Sync for AmpView {}

impl AmpView {
    #[inline]
    pub(crate) fn new(data: &mut [Complex64]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
        }
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> Complex64 {
        debug_assert!(i < self.len);
        unsafe { *self.ptr.add(i) }
    }

    #[inline]
    pub(crate) fn set(&self, i: usize, value: Complex64) {
        debug_assert!(i < self.len);
        unsafe {
            *self.ptr.add(i) = value;
        }
    }

    #[inline]
    pub(crate) fn mul(&self, i: usize, factor: Complex64) {
        debug_assert!(i < self.len);
        unsafe {
            *self.ptr.add(i) *= factor;
        }
    }

    #[inline]
    pub(crate) fn swap(&self, i: usize, j: usize) {
        debug_assert!(i < self.len && j < self.len);
        unsafe {
            std::ptr::swap(self.ptr.add(i), self.ptr.add(j));
        }
    }
}

/// Sorted scratch copy of a qubit list
#[inline]
pub(crate) fn sorted_qubits(qubits: &[usize]) -> SmallVec<[usize; 8]> {
    let mut sorted: SmallVec<[usize; 8]> = SmallVec::from_slice(qubits);
    sorted.sort_unstable();
    sorted
}

/// Run `kernel` over every subspace block of `qubits`.
///
/// The index-table type `I` selects the fixed-size (M = 1..4) or
/// dynamic variant; dispatchers pick it per arity.
pub(crate) fn for_each_block<I, K>(
    data: &mut [Complex64],
    qubits: &[usize],
    parallel: bool,
    kernel: K,
) where
    I: BlockIndexes,
    K: Fn(&AmpView, &I) + Sync,
{
    let sorted = sorted_qubits(qubits);
    let end = data.len() >> qubits.len();
    let view = AmpView::new(data);

    if parallel {
        (0..end).into_par_iter().for_each(|k| {
            let inds = I::build(qubits, &sorted, k);
            kernel(&view, &inds);
        });
    } else {
        for k in 0..end {
            let inds = I::build(qubits, &sorted, k);
            kernel(&view, &inds);
        }
    }
}

/// Sum `kernel`'s real pair over every subspace block of `qubits`
pub(crate) fn reduce_blocks<I, K>(
    len: usize,
    qubits: &[usize],
    parallel: bool,
    kernel: K,
) -> Complex64
where
    I: BlockIndexes,
    K: Fn(&I) -> (f64, f64) + Sync,
{
    let sorted = sorted_qubits(qubits);
    let end = len >> qubits.len();

    let eval = |k: usize| kernel(&I::build(qubits, &sorted, k));
    let (re, im) = if parallel {
        (0..end)
            .into_par_iter()
            .map(eval)
            .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
    } else {
        (0..end)
            .map(eval)
            .fold((0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
    };
    Complex64::new(re, im)
}

/// Sum `kernel`'s real pair over every amplitude index
pub(crate) fn reduce_entries<K>(len: usize, parallel: bool, kernel: K) -> Complex64
where
    K: Fn(usize) -> (f64, f64) + Sync,
{
    let (re, im) = if parallel {
        (0..len)
            .into_par_iter()
            .map(&kernel)
            .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
    } else {
        (0..len)
            .map(&kernel)
            .fold((0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
    };
    Complex64::new(re, im)
}
