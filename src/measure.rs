//! Born-rule queries: probabilities, marginals, norms, and sampling
//!
//! These are the read side of the core. Everything reduces over the
//! amplitude buffer, either element-wise or per block of the queried
//! qubits, with per-worker partial accumulators when parallel.

use crate::buffer::AmpBuffer;
use crate::error::{check_len, Result};
use crate::indexing::BlockIndexes;
use crate::loops::{reduce_blocks, reduce_entries, sorted_qubits};
use crate::vector::QubitVector;
use num_complex::Complex64;
use rayon::prelude::*;

/// Reduce a slice-shaped kernel over all blocks, selecting the
/// fixed-size index table for 1..4 qubits and the dynamic one beyond
fn dispatch_reduce<K>(len: usize, qubits: &[usize], parallel: bool, kernel: K) -> Complex64
where
    K: Fn(&[usize]) -> (f64, f64) + Sync,
{
    match qubits.len() {
        1 => reduce_blocks::<[usize; 2], _>(len, qubits, parallel, |i| kernel(i.as_slice())),
        2 => reduce_blocks::<[usize; 4], _>(len, qubits, parallel, |i| kernel(i.as_slice())),
        3 => reduce_blocks::<[usize; 8], _>(len, qubits, parallel, |i| kernel(i.as_slice())),
        4 => reduce_blocks::<[usize; 16], _>(len, qubits, parallel, |i| kernel(i.as_slice())),
        _ => reduce_blocks::<Vec<usize>, _>(len, qubits, parallel, |i| kernel(i.as_slice())),
    }
}

impl<B: AmpBuffer> QubitVector<B> {
    /// Born-rule probability of measuring basis label `outcome`
    #[inline]
    pub fn probability(&self, outcome: usize) -> f64 {
        self.amplitudes()[outcome].norm_sqr()
    }

    /// Full measurement distribution over all 2^N outcomes
    pub fn probabilities(&self) -> Vec<f64> {
        let amps = self.amplitudes();
        if self.parallel() {
            amps.par_iter().map(|a| a.norm_sqr()).collect()
        } else {
            amps.iter().map(|a| a.norm_sqr()).collect()
        }
    }

    /// Marginal distribution over `qubits`, in the caller's qubit
    /// ordering (outcome bit j of the result indexes qubits\[j\]).
    pub fn probabilities_for(&self, qubits: &[usize]) -> Result<Vec<f64>> {
        self.check_qubits(qubits)?;
        let n = qubits.len();

        if n == 0 {
            return Ok(vec![self.norm()]);
        }

        let sorted = sorted_qubits(qubits);
        if n == self.num_qubits() && qubits == sorted.as_slice() {
            return Ok(self.probabilities());
        }

        let amps = self.amplitudes();
        if n == 1 {
            // p(0) in the real slot, p(1) in the imag slot
            let pair = dispatch_reduce(amps.len(), qubits, self.parallel(), |inds| {
                (amps[inds[0]].norm_sqr(), amps[inds[1]].norm_sqr())
            });
            return Ok(vec![pair.re, pair.im]);
        }

        let dim = 1usize << n;
        let end = amps.len() >> n;
        let accumulate = |mut acc: Vec<f64>, k: usize| {
            let inds = Vec::<usize>::build(qubits, &sorted, k);
            for (m, &idx) in inds.iter().enumerate() {
                acc[m] += amps[idx].norm_sqr();
            }
            acc
        };

        let probs = if self.parallel() {
            (0..end)
                .into_par_iter()
                .fold(|| vec![0.0; dim], accumulate)
                .reduce(
                    || vec![0.0; dim],
                    |mut a, b| {
                        for (x, y) in a.iter_mut().zip(b) {
                            *x += y;
                        }
                        a
                    },
                )
        } else {
            (0..end).fold(vec![0.0; dim], accumulate)
        };
        Ok(probs)
    }

    /// Squared L2 norm: sum over j of |a\[j\]|^2
    pub fn norm(&self) -> f64 {
        let amps = self.amplitudes();
        reduce_entries(amps.len(), self.parallel(), |k| (amps[k].norm_sqr(), 0.0)).re
    }

    /// Norm of M|psi> for a dense k-qubit matrix M, without modifying
    /// the state
    pub fn matrix_norm(&self, qubits: &[usize], mat: &[Complex64]) -> Result<f64> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        check_len(mat.len(), dim * dim)?;

        if qubits.len() == 1 {
            let zero = Complex64::new(0.0, 0.0);
            if mat[1] == zero && mat[2] == zero {
                return self.diagonal_norm(qubits, &[mat[0], mat[3]]);
            }
        }

        let amps = self.amplitudes();
        let total = dispatch_reduce(amps.len(), qubits, self.parallel(), |inds| {
            let mut sum = 0.0;
            for i in 0..dim {
                let mut vi = Complex64::new(0.0, 0.0);
                for (j, &idx) in inds.iter().enumerate() {
                    vi += mat[i + dim * j] * amps[idx];
                }
                sum += vi.norm_sqr();
            }
            (sum, 0.0)
        });
        Ok(total.re)
    }

    /// Norm of D|psi> for a diagonal k-qubit matrix D
    pub fn diagonal_norm(&self, qubits: &[usize], diag: &[Complex64]) -> Result<f64> {
        self.check_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        check_len(diag.len(), dim)?;

        let amps = self.amplitudes();
        let total = dispatch_reduce(amps.len(), qubits, self.parallel(), |inds| {
            let mut sum = 0.0;
            for (i, &idx) in inds.iter().enumerate() {
                sum += (diag[i] * amps[idx]).norm_sqr();
            }
            (sum, 0.0)
        });
        Ok(total.re)
    }

    /// Draw measurement outcomes for the supplied uniform randoms.
    ///
    /// Outcomes are returned in input order; the result is
    /// deterministic in (state, rnds). The cumulative sweep visits
    /// amplitudes in increasing index order with a strict `<`, so a
    /// random landing on a zero-probability amplitude resolves to the
    /// preceding nonzero one.
    ///
    /// Below 2^sample_index_size amplitudes each shot walks the full
    /// distribution; above it, a coarse table of per-block probability
    /// masses is built first and each shot descends the table before
    /// walking the matching block.
    pub fn sample_measure(&self, rnds: &[f64]) -> Vec<usize> {
        let size = self.size();
        let amps = self.amplitudes();
        let parallel = self.parallel();
        let index_size = self.config().sample_index_size;
        let index_end = 1usize.checked_shl(index_size).unwrap_or(usize::MAX);

        if size < index_end {
            let walk = |rnd: f64| -> usize {
                let mut p = 0.0;
                let mut sample = size - 1;
                for j in 0..size - 1 {
                    p += amps[j].norm_sqr();
                    if rnd < p {
                        sample = j;
                        break;
                    }
                }
                sample
            };
            return if parallel {
                rnds.par_iter().map(|&rnd| walk(rnd)).collect()
            } else {
                rnds.iter().map(|&rnd| walk(rnd)).collect()
            };
        }

        let block_len = size >> index_size;
        let block_mass = |i: usize| -> f64 {
            let base = block_len * i;
            (0..block_len).map(|j| amps[base | j].norm_sqr()).sum()
        };
        let idxs: Vec<f64> = if parallel {
            (0..index_end).into_par_iter().map(block_mass).collect()
        } else {
            (0..index_end).map(block_mass).collect()
        };

        let walk = |rnd: f64| -> usize {
            let mut p = 0.0;
            let mut sample = 0usize;
            for &mass in &idxs {
                if rnd < p + mass {
                    break;
                }
                p += mass;
                sample += block_len;
            }
            while sample < size - 1 {
                p += amps[sample].norm_sqr();
                if rnd < p {
                    break;
                }
                sample += 1;
            }
            sample.min(size - 1)
        };
        if parallel {
            rnds.par_iter().map(|&rnd| walk(rnd)).collect()
        } else {
            rnds.iter().map(|&rnd| walk(rnd)).collect()
        }
    }
}
