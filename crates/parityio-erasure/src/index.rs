//! Erasure patterns

use crate::ErasureError;
use crate::generator::check_capacity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One lost data column and the parity shard substituted into its place
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErasureIndex {
    /// Data column that was lost, in `[0, K)`
    pub data_index: usize,
    /// Parity shard whose symbols now occupy that column, in `[0, M)`
    pub ec_index: usize,
}

impl ErasureIndex {
    #[must_use]
    pub const fn new(data_index: usize, ec_index: usize) -> Self {
        Self {
            data_index,
            ec_index,
        }
    }
}

impl From<(usize, usize)> for ErasureIndex {
    fn from((data_index, ec_index): (usize, usize)) -> Self {
        Self::new(data_index, ec_index)
    }
}

impl fmt::Display for ErasureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data[{}]<-parity[{}]", self.data_index, self.ec_index)
    }
}

/// Check that a pattern can be decoded with K data and M parity shards
///
/// The pattern may not be larger than M, every index must be in range, and
/// no data or parity index may appear twice. Shapes beyond the field's
/// capacity fail with [`ErasureError::InvalidConfig`].
pub fn validate_pattern(
    indexes: &[ErasureIndex],
    data_shards: usize,
    parity_shards: usize,
) -> Result<(), ErasureError> {
    check_capacity(data_shards, parity_shards)?;
    if indexes.len() > parity_shards {
        return Err(ErasureError::InvalidErasurePattern(format!(
            "{} erasures exceed {parity_shards} parity shards",
            indexes.len()
        )));
    }

    // Every index is below 256 once the range checks pass
    let mut seen_data = [false; 256];
    let mut seen_parity = [false; 256];
    for index in indexes {
        if index.data_index >= data_shards {
            return Err(ErasureError::InvalidErasurePattern(format!(
                "data index {} out of range for {data_shards} data shards",
                index.data_index
            )));
        }
        if index.ec_index >= parity_shards {
            return Err(ErasureError::InvalidErasurePattern(format!(
                "parity index {} out of range for {parity_shards} parity shards",
                index.ec_index
            )));
        }
        if std::mem::replace(&mut seen_data[index.data_index], true) {
            return Err(ErasureError::InvalidErasurePattern(format!(
                "data index {} erased twice",
                index.data_index
            )));
        }
        if std::mem::replace(&mut seen_parity[index.ec_index], true) {
            return Err(ErasureError::InvalidErasurePattern(format!(
                "parity index {} used twice",
                index.ec_index
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(pairs: &[(usize, usize)]) -> Vec<ErasureIndex> {
        pairs.iter().copied().map(ErasureIndex::from).collect()
    }

    #[test]
    fn test_valid_patterns() {
        assert!(validate_pattern(&[], 4, 2).is_ok());
        assert!(validate_pattern(&[], 4, 0).is_ok());
        assert!(validate_pattern(&pattern(&[(5, 1), (9, 0), (3, 3)]), 10, 6).is_ok());
        assert!(validate_pattern(&pattern(&[(0, 1), (3, 0)]), 4, 2).is_ok());
    }

    #[test]
    fn test_pattern_larger_than_parity() {
        let err = validate_pattern(&pattern(&[(0, 0), (1, 1), (2, 2)]), 4, 2).unwrap_err();
        assert!(matches!(err, ErasureError::InvalidErasurePattern(_)));
        assert!(validate_pattern(&pattern(&[(0, 0)]), 4, 0).is_err());
    }

    #[test]
    fn test_out_of_range() {
        assert!(validate_pattern(&pattern(&[(4, 0)]), 4, 2).is_err());
        assert!(validate_pattern(&pattern(&[(0, 2)]), 4, 2).is_err());
        assert!(validate_pattern(&pattern(&[(usize::MAX, 0)]), 4, 2).is_err());
    }

    #[test]
    fn test_shape_beyond_field() {
        assert!(matches!(
            validate_pattern(&[], 200, 56),
            Err(ErasureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overflowing_shape() {
        assert!(matches!(
            validate_pattern(&[], 2, usize::MAX),
            Err(ErasureError::InvalidConfig(_))
        ));
        assert!(matches!(
            validate_pattern(&[], usize::MAX, 2),
            Err(ErasureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicates() {
        let dup_data = validate_pattern(&pattern(&[(1, 0), (1, 1)]), 4, 2).unwrap_err();
        assert!(dup_data.to_string().contains("data index 1"));
        let dup_parity = validate_pattern(&pattern(&[(1, 0), (2, 0)]), 4, 2).unwrap_err();
        assert!(dup_parity.to_string().contains("parity index 0"));
    }

    #[test]
    fn test_display_and_ordering() {
        let a = ErasureIndex::new(5, 1);
        assert_eq!(a.to_string(), "data[5]<-parity[1]");
        let mut list = pattern(&[(9, 0), (3, 3), (5, 1)]);
        list.sort();
        assert_eq!(list, pattern(&[(3, 3), (5, 1), (9, 0)]));
    }

    #[test]
    fn test_serde_roundtrip() {
        let index = ErasureIndex::new(3, 2);
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"data_index":3,"ec_index":2}"#);
        let parsed: ErasureIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, index);
    }
}
