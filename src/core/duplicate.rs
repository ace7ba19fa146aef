use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::core::fingerprint::ImageFingerprint;
use crate::core::similarity;
use crate::provenance::PhotoRecord;

/// A photo paired with its computed fingerprint, valid for one scan.
#[derive(Debug, Clone)]
pub struct FingerprintedPhoto {
    pub record: PhotoRecord,
    pub fingerprint: ImageFingerprint,
}

/// One member of a duplicate group. The photo's own fields are flattened into
/// the serialized form alongside its similarity to the group primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    #[serde(flatten)]
    pub photo: PhotoRecord,
    /// 0-100, relative to the group primary. The primary itself carries 100.
    pub similarity: u32,
    pub exact_match: bool,
}

/// An ordered set of 2+ photos believed to depict the same image. The first
/// member is the primary: the first photo seen in scan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub photos: Vec<GroupMember>,
    pub count: usize,
}

/// A single hit from the pre-insert check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    pub photo_id: String,
    pub filename: String,
    pub similarity: u32,
    pub exact_match: bool,
}

/// Greedy single-pass duplicate grouping with exact-match short-circuiting.
///
/// Deliberately O(n²): duplicate sets in a personal photo library are small
/// (tens to low hundreds per collection), and exhaustive comparison avoids
/// the false negatives an approximate index could silently introduce.
pub struct DuplicateDetector {
    similarity_threshold: u32,
    total_bits: u32,
}

impl DuplicateDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            total_bits: config.total_bits(),
        }
    }

    /// Partition `photos` into duplicate groups, preserving scan order.
    ///
    /// Each photo joins at most one group, enforced by the `processed` set.
    /// A primary that matches nothing emits no group and is *not* marked
    /// processed; grouping therefore depends on the input order, which
    /// callers must preserve to keep results reproducible.
    pub fn group_photos(&self, photos: &[FingerprintedPhoto]) -> Vec<DuplicateGroup> {
        let mut groups = Vec::new();
        let mut processed: HashSet<&str> = HashSet::new();

        for (i, primary) in photos.iter().enumerate() {
            if processed.contains(primary.record.id.as_str()) {
                continue;
            }

            let mut members = vec![GroupMember {
                photo: primary.record.clone(),
                similarity: 100,
                exact_match: true,
            }];

            for candidate in &photos[i + 1..] {
                if processed.contains(candidate.record.id.as_str()) {
                    continue;
                }
                if let Some((similarity, exact_match)) =
                    self.compare(&primary.fingerprint, &candidate.fingerprint)
                {
                    members.push(GroupMember {
                        photo: candidate.record.clone(),
                        similarity,
                        exact_match,
                    });
                    processed.insert(candidate.record.id.as_str());
                }
            }

            if members.len() > 1 {
                processed.insert(primary.record.id.as_str());
                groups.push(DuplicateGroup {
                    count: members.len(),
                    photos: members,
                });
            }
        }

        groups
    }

    /// Compare one not-yet-stored fingerprint against every photo in
    /// `existing`, in order. Returns the flat match list used by the
    /// pre-insert check.
    pub fn match_candidate(
        &self,
        candidate: &ImageFingerprint,
        existing: &[FingerprintedPhoto],
    ) -> Vec<DuplicateMatch> {
        let mut matches = Vec::new();
        for photo in existing {
            if let Some((similarity, exact_match)) = self.compare(candidate, &photo.fingerprint) {
                matches.push(DuplicateMatch {
                    photo_id: photo.record.id.clone(),
                    filename: photo.record.filename.clone(),
                    similarity,
                    exact_match,
                });
            }
        }
        matches
    }

    /// Exact-hash equality is checked first and short-circuits perceptual
    /// comparison. Incomparable hashes are treated as "not a match".
    fn compare(&self, a: &ImageFingerprint, b: &ImageFingerprint) -> Option<(u32, bool)> {
        if a.exact_hash == b.exact_hash {
            return Some((100, true));
        }
        match similarity::hamming_distance(&a.difference_hash, &b.difference_hash) {
            Ok(distance) if distance <= self.similarity_threshold => Some((
                similarity::similarity_percent(distance, self.total_bits),
                false,
            )),
            Ok(_) => None,
            Err(err) => {
                log::warn!("Skipping perceptual comparison: {err}");
                None
            }
        }
    }
}
