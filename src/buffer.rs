//! Amplitude storage with aligned memory
//!
//! Kernels are written against the small [`AmpBuffer`] capability set
//! so that alternative storage (device memory, mapped buffers) can be
//! substituted. The default backend is an exclusively owned, 64-byte
//! aligned allocation of complex doubles.

use crate::error::{Result, StateError};
use num_complex::Complex64;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

/// Alignment for the default backend (64 bytes for AVX-512)
const SIMD_ALIGNMENT: usize = 64;

/// Capability set required of an amplitude container.
///
/// Buffers are exclusively owned by the statevector; no interior
/// references outlive a public call.
pub trait AmpBuffer: Send + Sync {
    /// Allocate a zeroed buffer of `len` amplitudes
    fn allocate(len: usize) -> Result<Self>
    where
        Self: Sized;

    /// Number of amplitudes
    fn len(&self) -> usize;

    /// Whether the buffer is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read view of all amplitudes
    fn as_slice(&self) -> &[Complex64];

    /// Write view of all amplitudes
    fn as_mut_slice(&mut self) -> &mut [Complex64];

    /// Bulk zero
    fn fill_zero(&mut self);

    /// Bulk copy from an equally sized buffer
    fn copy_from(&mut self, other: &Self);
}

/// Default owned backend: contiguous 64-byte aligned complex doubles
pub struct AlignedBuffer {
    data: NonNull<Complex64>,
    len: usize,
    layout: Layout,
}

impl AmpBuffer for AlignedBuffer {
    fn allocate(len: usize) -> Result<Self> {
        let size = len
            .checked_mul(std::mem::size_of::<Complex64>())
            .ok_or(StateError::AllocationFailed { size: usize::MAX })?;

        let layout = Layout::from_size_align(size, SIMD_ALIGNMENT)
            .map_err(|_| StateError::AllocationFailed { size })?;

        let data = unsafe {
            let ptr = alloc_zeroed(layout) as *mut Complex64;
            if ptr.is_null() {
                return Err(StateError::AllocationFailed { size });
            }
            NonNull::new_unchecked(ptr)
        };

        Ok(Self { data, len, layout })
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn as_slice(&self) -> &[Complex64] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [Complex64] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    fn fill_zero(&mut self) {
        unsafe {
            std::ptr::write_bytes(self.data.as_ptr(), 0, self.len);
        }
    }

    fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.len, other.len);
        unsafe {
            std::ptr::copy_nonoverlapping(other.data.as_ptr(), self.data.as_ptr(), self.len);
        }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.data.as_ptr() as *mut u8, self.layout);
        }
    }
}

// Safety: AlignedBuffer owns its allocation and hands out access only
// through &self / &mut self.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}
