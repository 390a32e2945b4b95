use crate::error::TableError;

/// Bucket count of a fresh table: prime, close to 256, so power-of-two
/// biased hashes still spread.
pub const DEFAULT_INITIAL_CAPACITY: usize = 257;

/// Load factor (`len / capacity`) above which a new key triggers growth.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.7;

/// Construction-time sizing policy, fixed for the table's lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub max_load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_max_load_factor(mut self, lf: f64) -> Self {
        self.max_load_factor = lf;
        self
    }

    pub fn validate(&self) -> Result<(), TableError> {
        if self.initial_capacity == 0 {
            return Err(TableError::InvalidConfig("initial capacity must be non-zero"));
        }
        if !self.max_load_factor.is_finite() || self.max_load_factor <= 0.0 {
            return Err(TableError::InvalidConfig(
                "max load factor must be finite and positive",
            ));
        }
        Ok(())
    }

    /// Whether a table holding `len` entries in `capacity` buckets is over
    /// the threshold.
    pub(crate) fn over_threshold(&self, len: usize, capacity: usize) -> bool {
        len as f64 > self.max_load_factor * capacity as f64
    }
}
