//! Offline composition of short gate sequences
//!
//! A run of 1- and 2-qubit gates can be collapsed into one dense gate
//! on the union of their qubits: lift each matrix to the union with
//! [`expand_matrix`], multiply the lifted matrices in application
//! order, and apply the product once. Anything touching more than two
//! qubits falls back to per-gate application.

use crate::buffer::AmpBuffer;
use crate::error::{check_len, Result, StateError};
use crate::vector::QubitVector;
use num_complex::Complex64;

impl<B: AmpBuffer> QubitVector<B> {
    /// Apply a sequence of gates, fused into a single dense gate when
    /// every gate touches at most two qubits.
    ///
    /// `regs[m]` and `mats[m]` describe gate m (column-major
    /// vectorized matrix); gates apply left-to-right.
    pub fn apply_matrix_sequence(
        &mut self,
        regs: &[Vec<usize>],
        mats: &[Vec<Complex64>],
    ) -> Result<()> {
        if mats.is_empty() {
            return Ok(());
        }
        if regs.len() != mats.len() {
            return Err(StateError::DimensionMismatch {
                expected: regs.len(),
                actual: mats.len(),
            });
        }

        if regs.iter().any(|reg| reg.len() > 2) {
            for (reg, mat) in regs.iter().zip(mats) {
                self.apply_matrix(reg, mat)?;
            }
            return Ok(());
        }

        let mut union: Vec<usize> = Vec::new();
        for reg in regs {
            for &qubit in reg {
                if !union.contains(&qubit) {
                    union.push(qubit);
                }
            }
        }
        union.sort_unstable();

        let dim = 1usize << union.len();
        let mut composed: Vec<Complex64> = Vec::new();
        for (reg, mat) in regs.iter().zip(mats) {
            let lifted = expand_matrix(reg, &union, mat)?;
            composed = if composed.is_empty() {
                lifted
            } else {
                multiply(&lifted, &composed, dim)
            };
        }

        self.apply_matrix(&union, &composed)
    }
}

/// Column-major product `left * right` of dim x dim matrices
fn multiply(left: &[Complex64], right: &[Complex64], dim: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
    for j in 0..dim {
        for k in 0..dim {
            let r = right[k + j * dim];
            for i in 0..dim {
                out[i + j * dim] += left[i + k * dim] * r;
            }
        }
    }
    out
}

fn position_of(dst_sorted: &[usize], qubit: usize) -> Result<usize> {
    dst_sorted
        .iter()
        .position(|&q| q == qubit)
        .ok_or(StateError::Internal {
            context: "fusion source qubit missing from destination set",
        })
}

/// Lift a 1- or 2-qubit matrix onto the sorted qubit set
/// `dst_sorted`, acting as identity on the extra qubits.
pub(crate) fn expand_matrix(
    src: &[usize],
    dst_sorted: &[usize],
    mat: &[Complex64],
) -> Result<Vec<Complex64>> {
    let src_dim = 1usize << src.len();
    check_len(mat.len(), src_dim * src_dim)?;

    let dst_dim = 1usize << dst_sorted.len();
    let mut u = vec![Complex64::new(0.0, 0.0); dst_dim * dst_dim];
    let mut filled = vec![false; dst_dim];

    match src.len() {
        1 => {
            let delta = 1usize << position_of(dst_sorted, src[0])?;
            for i in 0..dst_dim {
                if filled[i] {
                    continue;
                }
                u[i + i * dst_dim] = mat[0];
                u[i + (i + delta) * dst_dim] = mat[2];
                u[(i + delta) + i * dst_dim] = mat[1];
                u[(i + delta) + (i + delta) * dst_dim] = mat[3];
                filled[i] = true;
                filled[i + delta] = true;
            }
        }
        2 => {
            let mut sorted_src = src.to_vec();
            sorted_src.sort_unstable();
            let sorted_mat = sort_matrix(src, &sorted_src, mat)?;

            let low_delta = 1usize << position_of(dst_sorted, sorted_src[0])?;
            let high_delta = 1usize << position_of(dst_sorted, sorted_src[1])?;

            for i in 0..dst_dim {
                if filled[i] {
                    continue;
                }
                let offsets = [i, i + low_delta, i + high_delta, i + low_delta + high_delta];
                for (sc, &col) in offsets.iter().enumerate() {
                    for (sr, &row) in offsets.iter().enumerate() {
                        u[row + col * dst_dim] = sorted_mat[sr + sc * 4];
                    }
                }
                for &offset in &offsets {
                    filled[offset] = true;
                }
            }
        }
        n => {
            return Err(StateError::UnsupportedFusion { qubits: n });
        }
    }

    Ok(u)
}

/// Rewrite a dense matrix from source qubit order `src` into sorted
/// order `sorted` by conjugating with basis transpositions.
pub(crate) fn sort_matrix(
    src: &[usize],
    sorted: &[usize],
    mat: &[Complex64],
) -> Result<Vec<Complex64>> {
    let dim = 1usize << src.len();
    let mut ret = mat.to_vec();
    let mut current = src.to_vec();

    while current != sorted {
        let from = match current.iter().zip(sorted).position(|(a, b)| a != b) {
            Some(from) => from,
            None => break,
        };
        let to = match (from + 1..current.len()).find(|&to| current[from] == sorted[to]) {
            Some(to) => to,
            None => {
                return Err(StateError::Internal {
                    context: "sort_matrix cannot make progress",
                })
            }
        };
        swap_cols_and_rows(from, to, &mut ret, dim);
        current.swap(from, to);
    }

    Ok(ret)
}

/// Conjugate a vectorized matrix by the transposition of basis bits
/// `idx1` and `idx2`: swap every row pair differing only in those
/// bits, then the matching column pairs.
fn swap_cols_and_rows(idx1: usize, idx2: usize, mat: &mut [Complex64], dim: usize) {
    let mask1 = 1usize << idx1;
    let mask2 = 1usize << idx2;

    for first in 0..dim {
        if (first & mask1) != 0 && (first & mask2) == 0 {
            let second = (first ^ mask1) | mask2;
            for i in 0..dim {
                mat.swap(first + i * dim, second + i * dim);
            }
            for i in 0..dim {
                mat.swap(i + first * dim, i + second * dim);
            }
        }
    }
}
