use serde::{Deserialize, Serialize};

/// A photo as known to the engine, shaped from raw metadata records for the
/// duration of one scan. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: String,
    pub collection_id: String,
    pub filename: String,

    /// Reference for fetching the full-size byte stream.
    pub content_ref: String,

    /// Reference for a smaller representative variant, preferred for hashing
    /// to bound decode and resize cost.
    pub preview_ref: Option<String>,

    /// False for soft-deleted or hidden entries.
    pub visible: bool,
}

impl PhotoRecord {
    /// The byte reference to hash: the smaller representative variant when
    /// available, otherwise the full-size stream.
    pub fn hash_source_ref(&self) -> &str {
        self.preview_ref.as_deref().unwrap_or(&self.content_ref)
    }
}

/// True for filesystem artifacts such as `.DS_Store` that sometimes end up
/// in imported collections.
pub fn is_artifact_filename(filename: &str) -> bool {
    filename.starts_with('.')
}

/// Drop records the engine must never fingerprint: soft-deleted photos and
/// dot-prefixed filesystem artifacts. Applied in every scan scope before any
/// byte retrieval.
pub fn visible_photos(records: Vec<PhotoRecord>) -> Vec<PhotoRecord> {
    records
        .into_iter()
        .filter(|photo| photo.visible && !is_artifact_filename(&photo.filename))
        .collect()
}
