//! In-place gate kernels
//!
//! Every kernel runs over subspace blocks produced by the block
//! iterator; the arity dispatcher selects fixed-size index tables for
//! 1..4 target qubits and the heap-allocated table beyond.
//!
//! Single-qubit paths branch on bit-exact equality against 0, 1, and
//! ±i. Callers pass literal constants for the common gates, and the
//! equality tests are the fast-path trigger; they must not be replaced
//! with tolerance comparisons.

use crate::buffer::AmpBuffer;
use crate::error::{check_len, Result, StateError};
use crate::loops::{for_each_block, AmpView};
use crate::vector::QubitVector;
use num_complex::Complex64;
use smallvec::SmallVec;

/// Run a slice-shaped kernel over all blocks, selecting the
/// fixed-size index table for 1..4 qubits and the dynamic one beyond
fn dispatch_blocks<K>(data: &mut [Complex64], qubits: &[usize], parallel: bool, kernel: K)
where
    K: Fn(&AmpView, &[usize]) + Sync,
{
    match qubits.len() {
        1 => for_each_block::<[usize; 2], _>(data, qubits, parallel, |v, i| kernel(v, i.as_slice())),
        2 => for_each_block::<[usize; 4], _>(data, qubits, parallel, |v, i| kernel(v, i.as_slice())),
        3 => for_each_block::<[usize; 8], _>(data, qubits, parallel, |v, i| kernel(v, i.as_slice())),
        4 => {
            for_each_block::<[usize; 16], _>(data, qubits, parallel, |v, i| kernel(v, i.as_slice()))
        }
        _ => for_each_block::<Vec<usize>, _>(data, qubits, parallel, |v, i| kernel(v, i.as_slice())),
    }
}

impl<B: AmpBuffer> QubitVector<B> {
    /// Apply a dense k-qubit gate.
    ///
    /// `mat` is the column-major vectorization of a 2^k x 2^k matrix
    /// (entry (r, c) at offset r + 2^k * c).
    pub fn apply_matrix(&mut self, qubits: &[usize], mat: &[Complex64]) -> Result<()> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        check_len(mat.len(), dim * dim)?;

        if qubits.len() == 1 {
            self.apply_matrix_1q(qubits[0], mat);
            return Ok(());
        }

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            let mut cache: SmallVec<[Complex64; 16]> = SmallVec::with_capacity(dim);
            for &idx in inds {
                cache.push(v.get(idx));
            }
            for i in 0..dim {
                let mut acc = Complex64::new(0.0, 0.0);
                for (j, &c) in cache.iter().enumerate() {
                    acc += mat[i + dim * j] * c;
                }
                v.set(inds[i], acc);
            }
        });
        Ok(())
    }

    /// Single-qubit dense gate; diagonal matrices are rerouted to the
    /// diagonal kernel
    fn apply_matrix_1q(&mut self, qubit: usize, mat: &[Complex64]) {
        let zero = Complex64::new(0.0, 0.0);
        if mat[1] == zero && mat[2] == zero {
            let diag = [mat[0], mat[3]];
            self.apply_diagonal_1q(qubit, &diag);
            return;
        }

        let parallel = self.parallel();
        let (m00, m10, m01, m11) = (mat[0], mat[1], mat[2], mat[3]);
        dispatch_blocks(self.amplitudes_mut(), &[qubit], parallel, |v, inds| {
            let cache = v.get(inds[0]);
            v.set(inds[0], m00 * cache + m01 * v.get(inds[1]));
            v.set(inds[1], m10 * cache + m11 * v.get(inds[1]));
        });
    }

    /// Apply a diagonal k-qubit gate given its 2^k diagonal entries
    pub fn apply_diagonal_matrix(&mut self, qubits: &[usize], diag: &[Complex64]) -> Result<()> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        check_len(diag.len(), dim)?;

        if qubits.len() == 1 {
            self.apply_diagonal_1q(qubits[0], &[diag[0], diag[1]]);
            return Ok(());
        }

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            for (i, &idx) in inds.iter().enumerate() {
                v.mul(idx, diag[i]);
            }
        });
        Ok(())
    }

    /// Single-qubit diagonal gate with degenerate-pattern fast paths
    fn apply_diagonal_1q(&mut self, qubit: usize, diag: &[Complex64; 2]) {
        let parallel = self.parallel();
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let plus_i = Complex64::new(0.0, 1.0);
        let minus_i = Complex64::new(0.0, -1.0);
        let qubits = [qubit];

        if diag[0] == one {
            if diag[1] == one {
                return; // identity
            }
            if diag[1] == minus_i {
                // [[1, 0], [0, -i]]
                dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                    let a = v.get(inds[1]);
                    v.set(inds[1], Complex64::new(a.im, -a.re));
                });
                return;
            }
            if diag[1] == plus_i {
                // [[1, 0], [0, i]]
                dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                    let a = v.get(inds[1]);
                    v.set(inds[1], Complex64::new(-a.im, a.re));
                });
                return;
            }
            if diag[1] == zero {
                // projector [[1, 0], [0, 0]]
                dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                    v.set(inds[1], Complex64::new(0.0, 0.0));
                });
                return;
            }
            // general [[1, 0], [0, z]]
            let z = diag[1];
            dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                v.mul(inds[1], z);
            });
            return;
        }

        if diag[1] == one {
            if diag[0] == minus_i {
                // [[-i, 0], [0, 1]]
                dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                    let a = v.get(inds[0]);
                    v.set(inds[0], Complex64::new(a.im, -a.re));
                });
                return;
            }
            if diag[0] == plus_i {
                // [[i, 0], [0, 1]]
                dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                    let a = v.get(inds[0]);
                    v.set(inds[0], Complex64::new(-a.im, a.re));
                });
                return;
            }
            if diag[0] == zero {
                // projector [[0, 0], [0, 1]]
                dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                    v.set(inds[0], Complex64::new(0.0, 0.0));
                });
                return;
            }
            // general [[z, 0], [0, 1]]
            let z = diag[0];
            dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
                v.mul(inds[0], z);
            });
            return;
        }

        let (d0, d1) = (diag[0], diag[1]);
        dispatch_blocks(self.amplitudes_mut(), &qubits, parallel, |v, inds| {
            v.mul(inds[0], d0);
            v.mul(inds[1], d1);
        });
    }

    /// Apply a permutation gate given as swap pairs of subspace basis
    /// elements
    pub fn apply_permutation_matrix(
        &mut self,
        qubits: &[usize],
        pairs: &[(usize, usize)],
    ) -> Result<()> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        for &(a, b) in pairs {
            if a >= dim || b >= dim {
                return Err(StateError::DimensionMismatch {
                    expected: dim,
                    actual: a.max(b) + 1,
                });
            }
        }

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            for &(a, b) in pairs {
                v.swap(inds[a], inds[b]);
            }
        });
        Ok(())
    }

    /// Multi-controlled X: the last qubit is the target, all others
    /// are controls. N = 1 is a plain X, N = 2 a CX, N = 3 a Toffoli.
    pub fn apply_mcx(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_qubits(qubits)?;
        if qubits.is_empty() {
            return Err(StateError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let n = qubits.len();
        let pos0 = (1usize << (n - 1)) - 1;
        let pos1 = (1usize << n) - 1;

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            v.swap(inds[pos0], inds[pos1]);
        });
        Ok(())
    }

    /// Multi-controlled Y (last qubit is the target)
    pub fn apply_mcy(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_qubits(qubits)?;
        if qubits.is_empty() {
            return Err(StateError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let n = qubits.len();
        let pos0 = (1usize << (n - 1)) - 1;
        let pos1 = (1usize << n) - 1;
        let plus_i = Complex64::new(0.0, 1.0);
        let minus_i = Complex64::new(0.0, -1.0);

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            let cache = v.get(inds[pos0]);
            v.set(inds[pos0], minus_i * v.get(inds[pos1]));
            v.set(inds[pos1], plus_i * cache);
        });
        Ok(())
    }

    /// Multi-controlled Z; symmetric in all qubits
    pub fn apply_mcz(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_qubits(qubits)?;
        if qubits.is_empty() {
            return Err(StateError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let pos1 = (1usize << qubits.len()) - 1;
        let minus_one = Complex64::new(-1.0, 0.0);

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            v.mul(inds[pos1], minus_one);
        });
        Ok(())
    }

    /// Multi-controlled SWAP: the last two qubits are the swap
    /// targets. N = 2 is a plain SWAP, N = 3 a Fredkin gate.
    pub fn apply_mcswap(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_qubits(qubits)?;
        if qubits.len() < 2 {
            return Err(StateError::DimensionMismatch {
                expected: 2,
                actual: qubits.len(),
            });
        }
        let n = qubits.len();
        let pos0 = (1usize << (n - 1)) - 1;
        let pos1 = pos0 + (1usize << (n - 2));

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            v.swap(inds[pos0], inds[pos1]);
        });
        Ok(())
    }

    /// Multi-controlled single-qubit unitary (last qubit is the
    /// target). N = 1 reduces to the plain single-qubit path; the
    /// diagonal fast path mirrors it.
    pub fn apply_mcu(&mut self, qubits: &[usize], mat: &[Complex64]) -> Result<()> {
        self.check_qubits(qubits)?;
        if qubits.is_empty() {
            return Err(StateError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        check_len(mat.len(), 4)?;

        let n = qubits.len();
        let pos0 = (1usize << (n - 1)) - 1;
        let pos1 = (1usize << n) - 1;
        let zero = Complex64::new(0.0, 0.0);
        let parallel = self.parallel();

        if mat[1] == zero && mat[2] == zero {
            if n == 1 {
                self.apply_diagonal_1q(qubits[0], &[mat[0], mat[3]]);
                return Ok(());
            }
            let (d0, d1) = (mat[0], mat[3]);
            dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
                v.mul(inds[pos0], d0);
                v.mul(inds[pos1], d1);
            });
            return Ok(());
        }

        if n == 1 {
            self.apply_matrix_1q(qubits[0], mat);
            return Ok(());
        }
        let (m00, m10, m01, m11) = (mat[0], mat[1], mat[2], mat[3]);
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            let cache = v.get(inds[pos0]);
            v.set(inds[pos0], m00 * cache + m01 * v.get(inds[pos1]));
            v.set(inds[pos1], m10 * cache + m11 * v.get(inds[pos1]));
        });
        Ok(())
    }

    /// Tensor a 2^k-component vector onto `qubits`, which must already
    /// be in their |0...0⟩ branch (post-reset). The remaining qubits'
    /// state is preserved as the common factor.
    pub fn initialize_component(&mut self, qubits: &[usize], state: &[Complex64]) -> Result<()> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        check_len(state.len(), dim)?;

        let parallel = self.parallel();
        dispatch_blocks(self.amplitudes_mut(), qubits, parallel, |v, inds| {
            let cache = v.get(inds[0]);
            for (i, &idx) in inds.iter().enumerate() {
                v.set(idx, cache * state[i]);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StateError;
    use crate::QubitVector;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn hadamard() -> Vec<Complex64> {
        let h = FRAC_1_SQRT_2;
        vec![c(h, 0.0), c(h, 0.0), c(h, 0.0), c(-h, 0.0)]
    }

    fn pauli_x() -> Vec<Complex64> {
        vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)]
    }

    fn assert_state_eq(state: &QubitVector, expected: &[Complex64]) {
        for (j, want) in expected.iter().enumerate() {
            let got = state.amplitude(j);
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_x_flips_basis_state() {
        let mut state = QubitVector::new(1).unwrap();
        state.apply_matrix(&[0], &pauli_x()).unwrap();
        assert_state_eq(&state, &[c(0.0, 0.0), c(1.0, 0.0)]);
    }

    #[test]
    fn test_hadamard_superposition() {
        let mut state = QubitVector::new(1).unwrap();
        state.apply_matrix(&[0], &hadamard()).unwrap();
        let h = FRAC_1_SQRT_2;
        assert_state_eq(&state, &[c(h, 0.0), c(h, 0.0)]);
    }

    #[test]
    fn test_hadamard_on_high_qubit() {
        let mut state = QubitVector::new(3).unwrap();
        state.apply_matrix(&[2], &hadamard()).unwrap();
        let h = FRAC_1_SQRT_2;
        assert_relative_eq!(state.amplitude(0).re, h, epsilon = 1e-12);
        assert_relative_eq!(state.amplitude(4).re, h, epsilon = 1e-12);
        assert_relative_eq!(state.amplitude(2).re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dense_two_qubit_cx_matrix() {
        // CX with control 0, target 1, column-major
        let mut mat = vec![c(0.0, 0.0); 16];
        mat[0] = c(1.0, 0.0); // |00> -> |00>
        mat[13] = c(1.0, 0.0); // |01> -> |11>
        mat[10] = c(1.0, 0.0); // |10> -> |10>
        mat[7] = c(1.0, 0.0); // |11> -> |01>

        let mut state = QubitVector::new(2).unwrap();
        state.apply_matrix(&[0], &hadamard()).unwrap();
        state.apply_matrix(&[0, 1], &mat).unwrap();

        let h = FRAC_1_SQRT_2;
        assert_state_eq(&state, &[c(h, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(h, 0.0)]);
    }

    #[test]
    fn test_diagonal_fast_paths_match_general() {
        let phases = [
            [c(1.0, 0.0), c(1.0, 0.0)],
            [c(1.0, 0.0), c(0.0, 1.0)],
            [c(1.0, 0.0), c(0.0, -1.0)],
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 1.0), c(1.0, 0.0)],
            [c(0.0, -1.0), c(1.0, 0.0)],
            [c(0.0, 0.0), c(1.0, 0.0)],
            [c(1.0, 0.0), c(FRAC_1_SQRT_2, FRAC_1_SQRT_2)],
            [c(0.3, 0.4), c(-0.5, 0.2)],
        ];

        for diag in phases {
            let mut fast = QubitVector::new(2).unwrap();
            let mut slow = QubitVector::new(2).unwrap();
            for q in 0..2 {
                fast.apply_matrix(&[q], &hadamard()).unwrap();
                slow.apply_matrix(&[q], &hadamard()).unwrap();
            }

            fast.apply_diagonal_matrix(&[1], &diag).unwrap();
            // Dense equivalent forced through the non-diagonal kernel
            // is not possible with zeros off-diagonal, so multiply
            // amplitudes directly as the reference.
            for (j, amp) in slow.amplitudes_mut().iter_mut().enumerate() {
                *amp *= diag[(j >> 1) & 1];
            }

            for j in 0..4 {
                let a = fast.amplitude(j);
                let b = slow.amplitude(j);
                assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
                assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_single_qubit_diagonal_reroute() {
        // A diagonal matrix passed to apply_matrix takes the diagonal
        // kernel and still produces the right state
        let s_gate = vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 1.0)];
        let mut state = QubitVector::new(1).unwrap();
        state.apply_matrix(&[0], &pauli_x()).unwrap();
        state.apply_matrix(&[0], &s_gate).unwrap();
        assert_state_eq(&state, &[c(0.0, 0.0), c(0.0, 1.0)]);
    }

    #[test]
    fn test_multi_qubit_diagonal() {
        let diag = vec![c(1.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(-1.0, 0.0)];
        let mut state = QubitVector::new(2).unwrap();
        state
            .initialize_from_vector(&[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0)])
            .unwrap();
        state.apply_diagonal_matrix(&[0, 1], &diag).unwrap();
        assert_state_eq(&state, &[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(-0.5, 0.0)]);
    }

    #[test]
    fn test_permutation_is_x() {
        let mut state = QubitVector::new(1).unwrap();
        state.apply_permutation_matrix(&[0], &[(0, 1)]).unwrap();
        assert_state_eq(&state, &[c(0.0, 0.0), c(1.0, 0.0)]);
    }

    #[test]
    fn test_mcx_cx_builds_bell_pair() {
        let mut state = QubitVector::new(2).unwrap();
        state.apply_matrix(&[0], &hadamard()).unwrap();
        state.apply_mcx(&[0, 1]).unwrap();

        let h = FRAC_1_SQRT_2;
        assert_state_eq(&state, &[c(h, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(h, 0.0)]);
    }

    #[test]
    fn test_mcx_involution() {
        let mut state = QubitVector::new(3).unwrap();
        for q in 0..3 {
            state.apply_matrix(&[q], &hadamard()).unwrap();
        }
        let before = state.vector();

        state.apply_mcx(&[0, 1, 2]).unwrap();
        state.apply_mcx(&[0, 1, 2]).unwrap();

        for (got, want) in state.vector().iter().zip(before.iter()) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mcy_on_one_qubit() {
        let mut state = QubitVector::new(1).unwrap();
        state.apply_mcy(&[0]).unwrap();
        // Y|0> = i|1>
        assert_state_eq(&state, &[c(0.0, 0.0), c(0.0, 1.0)]);
    }

    #[test]
    fn test_mcz_flips_sign_of_all_ones() {
        let mut state = QubitVector::new(2).unwrap();
        state
            .initialize_from_vector(&[c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)])
            .unwrap();
        state.apply_mcz(&[0, 1]).unwrap();
        assert_state_eq(&state, &[c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)]);
    }

    #[test]
    fn test_mcz_leaves_other_components() {
        let mut state = QubitVector::new(2).unwrap();
        state
            .initialize_from_vector(&[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0)])
            .unwrap();
        state.apply_mcz(&[0, 1]).unwrap();
        assert_state_eq(&state, &[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(-0.5, 0.0)]);
    }

    #[test]
    fn test_swap_exchanges_qubits() {
        let mut state = QubitVector::new(2).unwrap();
        state.apply_matrix(&[0], &pauli_x()).unwrap(); // |01>
        state.apply_mcswap(&[0, 1]).unwrap(); // -> |10>
        assert_state_eq(&state, &[c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)]);
    }

    #[test]
    fn test_fredkin_controlled_swap() {
        let mut state = QubitVector::new(3).unwrap();
        // |011>: control (qubit 0) set, qubit 1 set
        state
            .initialize_from_vector(&{
                let mut v = vec![c(0.0, 0.0); 8];
                v[3] = c(1.0, 0.0);
                v
            })
            .unwrap();
        state.apply_mcswap(&[0, 1, 2]).unwrap();
        // targets (qubits 1, 2) swap: |011> -> |101>
        assert_relative_eq!(state.amplitude(5).re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.amplitude(3).re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mcswap_requires_two_qubits() {
        let mut state = QubitVector::new(2).unwrap();
        assert_eq!(
            state.apply_mcswap(&[0]),
            Err(StateError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_mcu_matches_dense_controlled_u() {
        // CU with control 0, target 1 compared against the explicit
        // 4x4 column-major matrix
        let u = vec![c(0.6, 0.0), c(0.8, 0.0), c(-0.8, 0.0), c(0.6, 0.0)];
        let mut cu = vec![c(0.0, 0.0); 16];
        cu[0] = c(1.0, 0.0); // |00>
        cu[10] = c(1.0, 0.0); // |10>
        cu[1 + 4] = u[0]; // (1,1) = u00
        cu[3 + 4] = u[1]; // (3,1) = u10
        cu[1 + 12] = u[2]; // (1,3) = u01
        cu[3 + 12] = u[3]; // (3,3) = u11

        let mut via_mcu = QubitVector::new(2).unwrap();
        let mut via_dense = QubitVector::new(2).unwrap();
        for q in 0..2 {
            via_mcu.apply_matrix(&[q], &hadamard()).unwrap();
            via_dense.apply_matrix(&[q], &hadamard()).unwrap();
        }

        via_mcu.apply_mcu(&[0, 1], &u).unwrap();
        via_dense.apply_matrix(&[0, 1], &cu).unwrap();

        for j in 0..4 {
            let a = via_mcu.amplitude(j);
            let b = via_dense.amplitude(j);
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mcu_diagonal_fast_path_uses_block_positions() {
        // Controlled phase as mcu: only the |11> component moves
        let phase = vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 1.0)];
        let mut state = QubitVector::new(2).unwrap();
        state
            .initialize_from_vector(&[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0)])
            .unwrap();
        state.apply_mcu(&[0, 1], &phase).unwrap();
        assert_state_eq(&state, &[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.0, 0.5)]);
    }

    #[test]
    fn test_mcu_single_qubit_reduces_to_plain_path() {
        let u = vec![c(0.6, 0.0), c(0.8, 0.0), c(-0.8, 0.0), c(0.6, 0.0)];
        let mut a = QubitVector::new(1).unwrap();
        let mut b = QubitVector::new(1).unwrap();

        a.apply_mcu(&[0], &u).unwrap();
        b.apply_matrix(&[0], &u).unwrap();
        assert_eq!(a.vector(), b.vector());
    }

    #[test]
    fn test_initialize_component() {
        // N=2, state |00>; tensor [1/sqrt2, 1/sqrt2] onto qubit 1
        let h = FRAC_1_SQRT_2;
        let mut state = QubitVector::new(2).unwrap();
        state
            .initialize_component(&[1], &[c(h, 0.0), c(h, 0.0)])
            .unwrap();
        assert_state_eq(&state, &[c(h, 0.0), c(0.0, 0.0), c(h, 0.0), c(0.0, 0.0)]);
    }

    #[test]
    fn test_initialize_component_preserves_other_qubits() {
        let h = FRAC_1_SQRT_2;
        let mut state = QubitVector::new(2).unwrap();
        state.apply_matrix(&[0], &hadamard()).unwrap();
        // Qubit 1 is in |0>; tensor X-basis plus state onto it
        state
            .initialize_component(&[1], &[c(h, 0.0), c(h, 0.0)])
            .unwrap();
        assert_state_eq(&state, &[c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.5, 0.0)]);
    }

    #[test]
    fn test_dimension_validation() {
        let mut state = QubitVector::new(2).unwrap();
        let short = vec![c(1.0, 0.0); 3];
        assert!(matches!(
            state.apply_matrix(&[0], &short),
            Err(StateError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            state.apply_diagonal_matrix(&[0, 1], &short),
            Err(StateError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut state = QubitVector::new(2).unwrap();
        assert_eq!(
            state.apply_mcx(&[0, 5]),
            Err(StateError::QubitOutOfRange {
                qubit: 5,
                num_qubits: 2
            })
        );
    }

    #[test]
    fn test_five_qubit_dense_gate_uses_heap_path() {
        // 5-qubit identity leaves any state untouched
        let dim = 32;
        let mut mat = vec![c(0.0, 0.0); dim * dim];
        for i in 0..dim {
            mat[i + dim * i] = c(1.0, 0.0);
        }

        let mut state = QubitVector::new(5).unwrap();
        for q in 0..5 {
            state.apply_matrix(&[q], &hadamard()).unwrap();
        }
        let before = state.vector();
        state.apply_matrix(&[0, 1, 2, 3, 4], &mat).unwrap();

        for (got, want) in state.vector().iter().zip(before.iter()) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }
}
