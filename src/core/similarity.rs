use thiserror::Error;

/// Defensive failures when comparing perceptual hash strings. The engine only
/// compares hashes it produced itself, so these should never occur in
/// practice; callers treat them as "not a match", never as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("Hash lengths differ: {left} vs {right} hex chars")]
    Incomparable { left: usize, right: usize },

    #[error("Hash contains a non-hex character: {character:?}")]
    InvalidDigit { character: char },
}

/// Number of differing bits between two hex-encoded hashes of equal length.
/// Each hex digit contributes 4 bits.
pub fn hamming_distance(a: &str, b: &str) -> Result<u32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::Incomparable {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut distance = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        let na = ca
            .to_digit(16)
            .ok_or(SimilarityError::InvalidDigit { character: ca })?;
        let nb = cb
            .to_digit(16)
            .ok_or(SimilarityError::InvalidDigit { character: cb })?;
        distance += (na ^ nb).count_ones();
    }
    Ok(distance)
}

/// Convert a Hamming distance into a human-facing similarity percentage:
/// `100 - distance * 100 / total_bits`, rounded down. Distance 0 maps to 100
/// and the value decreases monotonically with distance.
pub fn similarity_percent(distance: u32, total_bits: u32) -> u32 {
    100u32.saturating_sub(distance.saturating_mul(100) / total_bits.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_counts_differing_bits() {
        assert_eq!(hamming_distance("0000", "ffff").unwrap(), 16);
        assert_eq!(hamming_distance("0000", "0001").unwrap(), 1);
        assert_eq!(hamming_distance("00f0", "0ff0").unwrap(), 4);
    }

    #[test]
    fn distance_is_reflexive_and_symmetric() {
        let pairs = [
            ("0000000000000000", "ffffffffffffffff"),
            ("a5a5a5a5a5a5a5a5", "5a5a5a5a5a5a5a5a"),
            ("0123456789abcdef", "fedcba9876543210"),
        ];
        for (a, b) in pairs {
            assert_eq!(hamming_distance(a, a).unwrap(), 0);
            assert_eq!(
                hamming_distance(a, b).unwrap(),
                hamming_distance(b, a).unwrap()
            );
        }
    }

    #[test]
    fn mismatched_lengths_are_incomparable() {
        let err = hamming_distance("0000", "00000").unwrap_err();
        assert_eq!(err, SimilarityError::Incomparable { left: 4, right: 5 });
    }

    #[test]
    fn non_hex_digits_are_rejected() {
        let err = hamming_distance("00g0", "0000").unwrap_err();
        assert_eq!(err, SimilarityError::InvalidDigit { character: 'g' });
    }

    #[test]
    fn percentage_is_100_at_distance_zero_and_decreases() {
        assert_eq!(similarity_percent(0, 64), 100);
        assert_eq!(similarity_percent(1, 64), 99);
        assert_eq!(similarity_percent(2, 64), 97);
        assert_eq!(similarity_percent(10, 64), 85);
        assert_eq!(similarity_percent(64, 64), 0);

        let mut previous = 100;
        for distance in 0..=64 {
            let current = similarity_percent(distance, 64);
            assert!(current <= previous);
            previous = current;
        }
    }
}
