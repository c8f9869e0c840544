//! Runtime configuration for the statevector core

/// Configuration knobs for parallelism, sampling, and serialization.
///
/// The core is single-threaded unless `threads > 1` *and* the register
/// is larger than `parallel_threshold` qubits; below that the rayon
/// dispatch overhead outweighs the work per block.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of data-parallel workers requested (>= 1; 1 disables
    /// parallel dispatch). Thread provisioning itself belongs to the
    /// embedding runtime via rayon's global pool.
    pub threads: usize,

    /// Qubit count above which parallel dispatch is engaged
    pub parallel_threshold: usize,

    /// log2 of the coarse index table used by `sample_measure` on
    /// large states
    pub sample_index_size: u32,

    /// Serialization chop threshold: real/imag parts with absolute
    /// value <= this are emitted as exactly 0. Zero disables chopping.
    pub chop_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 1,
            parallel_threshold: 14,
            sample_index_size: 10,
            chop_threshold: 0.0,
        }
    }
}

impl Config {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set worker count. Non-positive values are ignored.
    pub fn with_threads(mut self, n: usize) -> Self {
        if n > 0 {
            self.threads = n;
        }
        self
    }

    /// Builder: set the parallel qubit threshold. Zero is ignored.
    pub fn with_parallel_threshold(mut self, n: usize) -> Self {
        if n > 0 {
            self.parallel_threshold = n;
        }
        self
    }

    /// Builder: set the sample-measure index size. Zero is ignored.
    pub fn with_sample_index_size(mut self, n: u32) -> Self {
        if n > 0 {
            self.sample_index_size = n;
        }
        self
    }

    /// Builder: set the serialization chop threshold
    pub fn with_chop_threshold(mut self, threshold: f64) -> Self {
        self.chop_threshold = threshold;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.threads == 0 {
            return Err("threads must be >= 1".to_string());
        }
        if self.sample_index_size == 0 {
            return Err("sample_index_size must be >= 1".to_string());
        }
        if !(self.chop_threshold >= 0.0) {
            return Err("chop_threshold must be non-negative".to_string());
        }
        Ok(())
    }

    /// Whether loops over a `num_qubits`-qubit state should fan out
    #[inline]
    pub(crate) fn parallel_for(&self, num_qubits: usize) -> bool {
        self.threads > 1 && num_qubits > self.parallel_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.parallel_threshold, 14);
        assert_eq!(config.sample_index_size, 10);
        assert_eq!(config.chop_threshold, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_threads(4)
            .with_parallel_threshold(10)
            .with_sample_index_size(8)
            .with_chop_threshold(1e-15);

        assert_eq!(config.threads, 4);
        assert_eq!(config.parallel_threshold, 10);
        assert_eq!(config.sample_index_size, 8);
        assert_eq!(config.chop_threshold, 1e-15);
    }

    #[test]
    fn test_builder_ignores_zero() {
        let config = Config::new().with_threads(0).with_sample_index_size(0);
        assert_eq!(config.threads, 1);
        assert_eq!(config.sample_index_size, 10);
    }

    #[test]
    fn test_validation() {
        let config = Config {
            threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            chop_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parallel_gate() {
        let serial = Config::default();
        assert!(!serial.parallel_for(20));

        let parallel = Config::new().with_threads(8);
        assert!(!parallel.parallel_for(14));
        assert!(parallel.parallel_for(15));
    }
}
