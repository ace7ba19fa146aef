use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DetectorConfig;
use crate::core::duplicate::{
    DuplicateDetector, DuplicateGroup, DuplicateMatch, FingerprintedPhoto,
};
use crate::core::fingerprint::{FingerprintError, FingerprintService, ImageFingerprint};
use crate::provenance::{self, PhotoRecord};
use crate::store::{MetadataError, MetadataStore, ObjectStore};

#[derive(Debug, Error)]
pub enum ScanError {
    /// Nothing can be scanned without a metadata listing; this is the only
    /// fatal condition.
    #[error("Metadata listing failed: {0}")]
    Metadata(#[from] MetadataError),

    /// The pre-insert candidate itself could not be decoded.
    #[error("Candidate image could not be decoded: {0}")]
    Candidate(#[from] FingerprintError),
}

/// Why a photo was left out of a scan. The scan itself always completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    RetrievalFailed,
    DecodeFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPhoto {
    pub photo_id: String,
    pub reason: SkipReason,
}

/// Result of a single-collection scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionScanReport {
    pub groups: Vec<DuplicateGroup>,
    /// Visible photos in the collection, including any that were skipped.
    pub total_photos: usize,
    /// Sum of (group size - 1) over all groups.
    pub duplicates_found: usize,
    pub groups_found: usize,
    pub skipped: Vec<SkippedPhoto>,
}

/// A duplicate group found across collections, annotated with the distinct
/// collections its members come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCollectionGroup {
    #[serde(flatten)]
    pub group: DuplicateGroup,
    pub cross_collection: bool,
    pub collections: Vec<String>,
}

/// Result of a scan over every collection a user owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryScanReport {
    pub groups: Vec<CrossCollectionGroup>,
    /// Photos that were successfully fingerprinted across all collections.
    pub total_photos: usize,
    pub duplicates_found: usize,
    pub groups_found: usize,
    pub cross_collection_groups: usize,
    pub skipped: Vec<SkippedPhoto>,
}

/// Result of checking one incoming image against a target collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreInsertReport {
    pub is_duplicate: bool,
    pub matches: Vec<DuplicateMatch>,
    pub skipped: Vec<SkippedPhoto>,
}

/// Entry point for the three duplicate-detection scopes.
///
/// Holds no state across invocations: every call recomputes fingerprints
/// from the current contents of the supplied photo set, so independent
/// invocations are fully parallelizable with zero contention.
pub struct DuplicateScanner<M, O> {
    metadata: Arc<M>,
    objects: Arc<O>,
    fingerprints: FingerprintService,
    detector: DuplicateDetector,
    config: DetectorConfig,
}

impl<M, O> DuplicateScanner<M, O>
where
    M: MetadataStore + 'static,
    O: ObjectStore + 'static,
{
    pub fn new(metadata: Arc<M>, objects: Arc<O>, config: DetectorConfig) -> Self {
        Self {
            fingerprints: FingerprintService::new(config.hash_size),
            detector: DuplicateDetector::new(&config),
            metadata,
            objects,
            config,
        }
    }

    pub fn with_defaults(metadata: Arc<M>, objects: Arc<O>) -> Self {
        Self::new(metadata, objects, DetectorConfig::default())
    }

    /// Find duplicate groups among the visible photos of one collection.
    pub async fn find_duplicates_in_collection(
        &self,
        collection_id: &str,
    ) -> Result<CollectionScanReport, ScanError> {
        let photos = provenance::visible_photos(self.metadata.list_photos(collection_id).await?);
        let total_photos = photos.len();

        // With fewer than two visible photos there is nothing to compare;
        // skip byte retrieval entirely.
        if total_photos < 2 {
            return Ok(CollectionScanReport {
                groups: Vec::new(),
                total_photos,
                duplicates_found: 0,
                groups_found: 0,
                skipped: Vec::new(),
            });
        }

        let (fingerprinted, skipped) = self.fingerprint_photos(photos).await;
        let groups = self.detector.group_photos(&fingerprinted);
        let groups_found = groups.len();
        let duplicates_found = groups.iter().map(|g| g.count - 1).sum();

        log::info!(
            "Collection {collection_id}: {total_photos} photos, {groups_found} duplicate group(s), {} skipped",
            skipped.len()
        );

        Ok(CollectionScanReport {
            groups,
            total_photos,
            duplicates_found,
            groups_found,
            skipped,
        })
    }

    /// Find duplicate groups across every collection owned by `owner_id`,
    /// flagging groups whose members span more than one collection.
    pub async fn find_duplicates_across_collections(
        &self,
        owner_id: &str,
    ) -> Result<LibraryScanReport, ScanError> {
        let collections = self.metadata.list_collections(owner_id).await?;

        let mut photos = Vec::new();
        for collection_id in &collections {
            photos.extend(provenance::visible_photos(
                self.metadata.list_photos(collection_id).await?,
            ));
        }

        if photos.len() < 2 {
            return Ok(LibraryScanReport {
                groups: Vec::new(),
                total_photos: photos.len(),
                duplicates_found: 0,
                groups_found: 0,
                cross_collection_groups: 0,
                skipped: Vec::new(),
            });
        }

        let (fingerprinted, skipped) = self.fingerprint_photos(photos).await;
        let total_photos = fingerprinted.len();

        let groups: Vec<CrossCollectionGroup> = self
            .detector
            .group_photos(&fingerprinted)
            .into_iter()
            .map(annotate_collections)
            .collect();

        let groups_found = groups.len();
        let duplicates_found = groups.iter().map(|g| g.group.count - 1).sum();
        let cross_collection_groups = groups.iter().filter(|g| g.cross_collection).count();

        log::info!(
            "Owner {owner_id}: {} collection(s), {total_photos} photos, {groups_found} group(s), {cross_collection_groups} cross-collection",
            collections.len()
        );

        Ok(LibraryScanReport {
            groups,
            total_photos,
            duplicates_found,
            groups_found,
            cross_collection_groups,
            skipped,
        })
    }

    /// Check a not-yet-persisted image against every visible photo already in
    /// the target collection. Returns a flat match list rather than groups.
    pub async fn check_duplicate_before_insert(
        &self,
        candidate_bytes: &[u8],
        target_collection_id: &str,
    ) -> Result<PreInsertReport, ScanError> {
        let candidate = self.fingerprints.compute(candidate_bytes)?;

        let photos =
            provenance::visible_photos(self.metadata.list_photos(target_collection_id).await?);
        let (fingerprinted, skipped) = self.fingerprint_photos(photos).await;

        let matches = self.detector.match_candidate(&candidate, &fingerprinted);
        Ok(PreInsertReport {
            is_duplicate: !matches.is_empty(),
            matches,
            skipped,
        })
    }

    /// Expose the candidate fingerprint on its own, for callers that want to
    /// record it alongside an accepted upload.
    pub fn fingerprint_bytes(&self, bytes: &[u8]) -> Result<ImageFingerprint, FingerprintError> {
        self.fingerprints.compute(bytes)
    }

    /// Fetch bytes for every photo concurrently, then fingerprint in
    /// parallel. Input order is preserved; photos whose retrieval or decode
    /// fails are dropped from the result, logged, and reported in the skip
    /// list so systematic failures stay observable.
    async fn fingerprint_photos(
        &self,
        photos: Vec<PhotoRecord>,
    ) -> (Vec<FingerprintedPhoto>, Vec<SkippedPhoto>) {
        let semaphore = Arc::new(Semaphore::new(self.config.fetch_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, photo) in photos.iter().enumerate() {
            let objects = Arc::clone(&self.objects);
            let semaphore = Arc::clone(&semaphore);
            let reference = photo.hash_source_ref().to_string();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore open");
                (index, objects.fetch_bytes(&reference).await)
            });
        }

        let mut fetched: Vec<Option<Vec<u8>>> = vec![None; photos.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(bytes))) => fetched[index] = Some(bytes),
                Ok((index, Err(err))) => {
                    log::warn!("Failed to retrieve bytes for photo {}: {err}", photos[index].id);
                }
                Err(err) => {
                    log::warn!("Byte retrieval task failed: {err}");
                }
            }
        }

        let decoded: Vec<Option<Result<ImageFingerprint, FingerprintError>>> = fetched
            .into_par_iter()
            .map(|bytes| bytes.map(|bytes| self.fingerprints.compute(&bytes)))
            .collect();

        let mut fingerprinted = Vec::with_capacity(photos.len());
        let mut skipped = Vec::new();
        for (photo, outcome) in photos.into_iter().zip(decoded) {
            match outcome {
                Some(Ok(fingerprint)) => fingerprinted.push(FingerprintedPhoto {
                    record: photo,
                    fingerprint,
                }),
                Some(Err(err)) => {
                    log::warn!("Failed to decode photo {}: {err}", photo.id);
                    skipped.push(SkippedPhoto {
                        photo_id: photo.id,
                        reason: SkipReason::DecodeFailed,
                    });
                }
                None => skipped.push(SkippedPhoto {
                    photo_id: photo.id,
                    reason: SkipReason::RetrievalFailed,
                }),
            }
        }

        (fingerprinted, skipped)
    }
}

/// Distinct collection ids represented in a group, in first-appearance order.
fn annotate_collections(group: DuplicateGroup) -> CrossCollectionGroup {
    let mut collections: Vec<String> = Vec::new();
    for member in &group.photos {
        if !collections.contains(&member.photo.collection_id) {
            collections.push(member.photo.collection_id.clone());
        }
    }
    CrossCollectionGroup {
        cross_collection: collections.len() > 1,
        collections,
        group,
    }
}
