//! Error types for statevector operations

use thiserror::Error;

/// Errors that can occur during statevector operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// A referenced qubit is outside the register
    #[error("qubit index {qubit} out of range for {num_qubits}-qubit state")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    /// A supplied matrix, diagonal, or vector has the wrong length
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `revert` or `inner_product` called with no prior `checkpoint`
    #[error("checkpoint must exist for revert() or inner_product()")]
    MissingCheckpoint,

    /// Fusion can only lift 1- and 2-qubit matrices onto a larger qubit set
    #[error("fusion cannot expand a {qubits}-qubit matrix")]
    UnsupportedFusion { qubits: usize },

    /// Memory allocation failure
    #[error("failed to allocate {size} bytes for amplitude buffer")]
    AllocationFailed { size: usize },

    /// Internal invariant violation; indicates a bug in the caller or crate
    #[error("internal error: {context}")]
    Internal { context: &'static str },
}

/// Result type for statevector operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Shape check for supplied matrices, diagonals, and vectors
#[inline]
pub(crate) fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(StateError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
