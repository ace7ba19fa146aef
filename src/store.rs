use std::future::Future;

use thiserror::Error;

use crate::provenance::PhotoRecord;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Object not found: {reference}")]
    NotFound { reference: String },

    #[error("Storage backend error: {message}")]
    Backend { message: String },
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata backend error: {message}")]
    Backend { message: String },
}

/// Remote object store holding encoded photo bytes.
///
/// Implementations own their timeout and retry discipline; the engine treats
/// any returned error as "this photo is unavailable for this scan" and keeps
/// going.
pub trait ObjectStore: Send + Sync {
    /// Fetch the raw encoded bytes behind a photo reference.
    fn fetch_bytes(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Vec<u8>, RetrievalError>> + Send;
}

/// Remote structured store holding collection and photo metadata.
///
/// Listings are expected to be pre-filtered to non-deleted album and photo
/// records; visibility and artifact-filename filtering stays with the engine.
pub trait MetadataStore: Send + Sync {
    /// All photos in a collection, in natural scan order.
    fn list_photos(
        &self,
        collection_id: &str,
    ) -> impl Future<Output = Result<Vec<PhotoRecord>, MetadataError>> + Send;

    /// All collection ids owned by a user, in listing order.
    fn list_collections(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, MetadataError>> + Send;
}
