//! Dense statevector simulator core
//!
//! This crate owns the numerically hard part of a quantum circuit
//! simulator: a contiguous buffer of 2^N complex amplitudes together
//! with the primitive operations a driver needs. It applies k-qubit
//! gates in place with index arithmetic over the tensor-product
//! ordering, fuses short gate sequences into one dense gate, answers
//! Born-rule probability and marginal queries, draws measurement
//! samples, and checkpoints the state for rollback and overlap
//! queries.
//!
//! Circuit parsing, gate scheduling, noise models, and alternative
//! state representations are out of scope; a higher-level simulator
//! drives this core.
//!
//! # Parallelism
//!
//! Loops over amplitude blocks fan out over rayon when the
//! configuration requests more than one worker *and* the register
//! exceeds the qubit threshold; block index sets are disjoint, so no
//! synchronization is needed inside a dispatch. Reductions combine
//! per-worker partial sums at the end. The core is not safe for
//! concurrent public calls on one instance; concurrency is strictly
//! intra-call.
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
//! // Bell pair
//! let mut state = QubitVector::new(2).unwrap();
//! state.apply_matrix(&[0], &hadamard).unwrap();
//! state.apply_mcx(&[0, 1]).unwrap();
//!
//! assert_eq!(state.sample_measure(&[0.25, 0.75]), vec![0, 3]);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod indexing;
mod fusion;
mod gates;
mod loops;
mod measure;
mod serialize;
mod vector;

pub use buffer::{AlignedBuffer, AmpBuffer};
pub use config::Config;
pub use error::{Result, StateError};
pub use vector::QubitVector;
