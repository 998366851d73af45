use serde::Deserialize;

pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Size of the first allocation in bytes, must be non-zero
    pub initial_capacity: usize,
    /// Hard limit on the size of the backing block. Growth that would need a
    /// larger block fails instead, even when the bytes being appended would
    /// have fit under the limit.
    pub max_capacity: Option<usize>,
    /// Check buffer invariants after every mutation, panicking on violation
    pub sanity_check: bool,
}

impl BufferConfig {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        BufferConfig { initial_capacity, ..Default::default() }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: None,
            sanity_check: cfg!(debug_assertions),
        }
    }
}
