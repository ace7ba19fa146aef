use serde::{Deserialize, Serialize};

/// Tuning knobs for the duplicate detection engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Edge length of the perceptual hash grid. The default of 8 yields
    /// 64-bit hashes encoded as 16 hex characters.
    pub hash_size: u32,

    /// Maximum Hamming distance between difference hashes for two photos to
    /// count as perceptual duplicates.
    /// 0 = identical, 10 = very similar, 20+ = different images.
    pub similarity_threshold: u32,

    /// Upper bound on concurrent byte retrievals within a single scan.
    pub fetch_concurrency: usize,
}

impl DetectorConfig {
    pub const DEFAULT_HASH_SIZE: u32 = 8;
    pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 10;
    pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

    /// Total number of bits in a perceptual hash at this size.
    pub fn total_bits(&self) -> u32 {
        self.hash_size * self.hash_size
    }

    /// Number of hex characters in an encoded perceptual hash.
    pub fn hex_len(&self) -> usize {
        (self.hash_size * self.hash_size / 4) as usize
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hash_size: Self::DEFAULT_HASH_SIZE,
            similarity_threshold: Self::DEFAULT_SIMILARITY_THRESHOLD,
            fetch_concurrency: Self::DEFAULT_FETCH_CONCURRENCY,
        }
    }
}
