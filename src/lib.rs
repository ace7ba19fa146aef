//! Duplicate and near-duplicate photo detection.
//!
//! Identifies duplicate photos by content fingerprints (an exact byte digest
//! plus two perceptual hashes) rather than byte comparison, and groups them
//! within a single collection, across all of a user's collections, or checks
//! a single incoming image against a target collection before insert.

pub mod config;
pub mod core;
pub mod provenance;
pub mod scanner;
pub mod store;

pub use config::DetectorConfig;
pub use crate::core::duplicate::{
    DuplicateDetector, DuplicateGroup, DuplicateMatch, FingerprintedPhoto, GroupMember,
};
pub use crate::core::fingerprint::{FingerprintError, FingerprintService, ImageFingerprint};
pub use crate::core::similarity::{hamming_distance, similarity_percent, SimilarityError};
pub use provenance::PhotoRecord;
pub use scanner::{
    CollectionScanReport, CrossCollectionGroup, DuplicateScanner, LibraryScanReport,
    PreInsertReport, ScanError, SkipReason, SkippedPhoto,
};
pub use store::{MetadataError, MetadataStore, ObjectStore, RetrievalError};
