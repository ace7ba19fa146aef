pub mod duplicate;
pub mod fingerprint;
pub mod similarity;

pub use duplicate::DuplicateDetector;
pub use fingerprint::FingerprintService;
