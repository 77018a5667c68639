//! Host runtime configuration

/// Limits applied to the QuickJS runtime backing the host document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostConfig {
    /// Heap limit in bytes
    pub memory_limit: Option<usize>,
    /// Native stack limit in bytes
    pub max_stack_size: Option<usize>,
    /// Allocation threshold that triggers garbage collection
    pub gc_threshold: Option<usize>,
}

impl HostConfig {
    /// Apply these limits to a runtime
    pub(crate) fn apply(&self, runtime: &rquickjs::Runtime) {
        if let Some(limit) = self.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = self.max_stack_size {
            runtime.set_max_stack_size(limit);
        }
        if let Some(threshold) = self.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }
    }
}
