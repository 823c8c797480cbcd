//! Executor-wide configuration, in the same "small `Default`-able struct
//! with named, documented fields" shape this codebase uses for its
//! top-level `Config`.

/// Tuning knobs for a single query execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on the number of buckets a group-by's direct-addressing
    /// hash table (`R = Π(max_j - min_j + 1)`) may allocate. Exceeding it is
    /// a resource error (§4.4) rather than an attempt to allocate.
    pub max_group_by_buckets: usize,

    /// Size of the rayon thread pool used for intra-operator parallelism.
    /// `None` uses rayon's process-wide default pool.
    pub rayon_threads: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_group_by_buckets: 64 * 1024 * 1024,
            rayon_threads: None,
        }
    }
}

impl ExecutorConfig {
    pub fn with_max_group_by_buckets(mut self, limit: usize) -> Self {
        self.max_group_by_buckets = limit;
        self
    }

    pub fn with_rayon_threads(mut self, threads: usize) -> Self {
        self.rayon_threads = Some(threads);
        self
    }
}
