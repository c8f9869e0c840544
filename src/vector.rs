//! Dense statevector with checkpointing
//!
//! [`QubitVector`] owns a contiguous buffer of 2^N complex amplitudes
//! in tensor-product ordering (qubit 0 = least significant bit of the
//! basis label) plus an optional checkpoint buffer of identical
//! layout. Gate kernels, fusion, and measurement queries live in the
//! sibling modules and operate through this type.
//!
//! The amplitude container is pluggable through [`AmpBuffer`] so that
//! alternative storage can be substituted; the default is the owned
//! aligned buffer.
//!
//! # Example
//!
//! ```
//! use statevec::QubitVector;
//! use num_complex::Complex64;
//!
//! let h = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
//! let hadamard = vec![h, h, h, -h];
//!
//! let mut state = QubitVector::new(2).unwrap();
//! state.apply_matrix(&[0], &hadamard).unwrap();
//! state.apply_mcx(&[0, 1]).unwrap();
//!
//! let probs = state.probabilities();
//! assert!((probs[0] - 0.5).abs() < 1e-12);
//! assert!((probs[3] - 0.5).abs() < 1e-12);
//! ```

use crate::buffer::{AlignedBuffer, AmpBuffer};
use crate::config::Config;
use crate::error::{Result, StateError};
use crate::loops::reduce_entries;
use num_complex::Complex64;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Dense statevector over `num_qubits` qubits
pub struct QubitVector<B: AmpBuffer = AlignedBuffer> {
    /// Number of qubits; the buffer holds exactly 2^num_qubits entries
    num_qubits: usize,

    /// Amplitude buffer, exclusively owned
    data: B,

    /// Lazily allocated snapshot for revert / inner_product
    checkpoint: Option<B>,

    /// Parallelism, sampling, and serialization settings
    config: Config,
}

fn dimension_of(num_qubits: usize) -> Result<usize> {
    1usize
        .checked_shl(num_qubits as u32)
        .ok_or(StateError::AllocationFailed { size: usize::MAX })
}

impl QubitVector<AlignedBuffer> {
    /// Create a statevector in |0...0⟩ with default configuration
    pub fn new(num_qubits: usize) -> Result<Self> {
        Self::with_config(num_qubits, Config::default())
    }

    /// Create a statevector in |0...0⟩ with the given configuration
    pub fn with_config(num_qubits: usize, config: Config) -> Result<Self> {
        Self::with_backend(num_qubits, config)
    }
}

impl<B: AmpBuffer> QubitVector<B> {
    /// Create a statevector in |0...0⟩ on a caller-chosen backend
    pub fn with_backend(num_qubits: usize, config: Config) -> Result<Self> {
        let dimension = dimension_of(num_qubits)?;
        let mut data = B::allocate(dimension)?;
        data.as_mut_slice()[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            data,
            checkpoint: None,
            config,
        })
    }

    /// Number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Buffer size (2^num_qubits)
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Read an amplitude by basis label
    #[inline]
    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.data.as_slice()[index]
    }

    /// Read view of all amplitudes
    #[inline]
    pub fn amplitudes(&self) -> &[Complex64] {
        self.data.as_slice()
    }

    /// Write view of all amplitudes
    #[inline]
    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        self.data.as_mut_slice()
    }

    /// Copy of all amplitudes
    pub fn vector(&self) -> Vec<Complex64> {
        self.data.as_slice().to_vec()
    }

    /// Current configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Set the worker count. Non-positive values are ignored.
    pub fn set_threads(&mut self, n: usize) {
        if n > 0 {
            self.config.threads = n;
        }
    }

    /// Set the parallel qubit threshold. Zero is ignored.
    pub fn set_parallel_threshold(&mut self, n: usize) {
        if n > 0 {
            self.config.parallel_threshold = n;
        }
    }

    /// Set the sample-measure index size. Zero is ignored.
    pub fn set_sample_index_size(&mut self, n: u32) {
        if n > 0 {
            self.config.sample_index_size = n;
        }
    }

    /// Set the serialization chop threshold
    pub fn set_chop_threshold(&mut self, threshold: f64) {
        self.config.chop_threshold = threshold;
    }

    /// Whether loops should fan out for the current register size
    #[inline]
    pub(crate) fn parallel(&self) -> bool {
        self.config.parallel_for(self.num_qubits)
    }

    /// Validate that every referenced qubit is inside the register
    pub(crate) fn check_qubits(&self, qubits: &[usize]) -> Result<()> {
        for &qubit in qubits {
            if qubit >= self.num_qubits {
                return Err(StateError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
        }
        Ok(())
    }

    /// Fail unless `other` has the same buffer size, reporting both
    pub fn check_compatible<C: AmpBuffer>(&self, other: &QubitVector<C>) -> Result<()> {
        if self.size() != other.size() {
            return Err(StateError::DimensionMismatch {
                expected: self.size(),
                actual: other.size(),
            });
        }
        Ok(())
    }

    /// Set every amplitude to zero
    pub fn zero(&mut self) {
        self.data.fill_zero();
    }

    /// Reset to |0...0⟩
    pub fn initialize(&mut self) {
        self.data.fill_zero();
        self.data.as_mut_slice()[0] = Complex64::new(1.0, 0.0);
    }

    /// Load a full statevector, validating its length
    pub fn initialize_from_vector(&mut self, statevec: &[Complex64]) -> Result<()> {
        if statevec.len() != self.size() {
            return Err(StateError::DimensionMismatch {
                expected: self.size(),
                actual: statevec.len(),
            });
        }
        self.data.as_mut_slice().copy_from_slice(statevec);
        Ok(())
    }

    /// Reallocate for a new qubit count.
    ///
    /// Amplitude contents after a resize are unspecified (all-zero on
    /// the default backend); callers are expected to `initialize`.
    /// Any checkpoint is dropped.
    pub fn resize(&mut self, num_qubits: usize) -> Result<()> {
        self.checkpoint = None;
        if num_qubits != self.num_qubits {
            let dimension = dimension_of(num_qubits)?;
            self.data = B::allocate(dimension)?;
            self.num_qubits = num_qubits;
        }
        Ok(())
    }

    /// Snapshot the current state into the checkpoint buffer,
    /// allocating it on first use
    pub fn checkpoint(&mut self) -> Result<()> {
        if self.checkpoint.is_none() {
            self.checkpoint = Some(B::allocate(self.data.len())?);
        }
        if let Some(saved) = &mut self.checkpoint {
            saved.copy_from(&self.data);
        }
        Ok(())
    }

    /// Whether a checkpoint currently exists
    #[inline]
    pub fn has_checkpoint(&self) -> bool {
        self.checkpoint.is_some()
    }

    /// Restore the checkpointed state; release the checkpoint buffer
    /// unless `keep` is set
    pub fn revert(&mut self, keep: bool) -> Result<()> {
        let saved = self
            .checkpoint
            .as_ref()
            .ok_or(StateError::MissingCheckpoint)?;
        self.data.copy_from(saved);
        if !keep {
            self.checkpoint = None;
        }
        Ok(())
    }

    /// Inner product of the current state with the checkpoint:
    /// sum over k of a\[k\] * conj(checkpoint\[k\])
    pub fn inner_product(&self) -> Result<Complex64> {
        let saved = self
            .checkpoint
            .as_ref()
            .ok_or(StateError::MissingCheckpoint)?;
        let state = self.data.as_slice();
        let saved = saved.as_slice();
        Ok(reduce_entries(state.len(), self.parallel(), |k| {
            let z = state[k] * saved[k].conj();
            (z.re, z.im)
        }))
    }
}

impl<B: AmpBuffer> Index<usize> for QubitVector<B> {
    type Output = Complex64;

    #[inline]
    fn index(&self, index: usize) -> &Complex64 {
        &self.data.as_slice()[index]
    }
}

impl<B: AmpBuffer> IndexMut<usize> for QubitVector<B> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Complex64 {
        &mut self.data.as_mut_slice()[index]
    }
}

impl<B: AmpBuffer> fmt::Debug for QubitVector<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QubitVector")
            .field("num_qubits", &self.num_qubits)
            .field("size", &self.size())
            .field("has_checkpoint", &self.has_checkpoint())
            .finish()
    }
}
