//! Core types for ParityIO

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest number of shards (data + parity) one stripe can carry.
///
/// Every shard needs its own nonzero element of GF(256).
pub const MAX_TOTAL_SHARDS: usize = 255;

/// Erasure coding configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErasureConfig {
    /// Number of data shards (k)
    pub data_shards: u8,
    /// Number of parity shards (m)
    pub parity_shards: u8,
}

impl ErasureConfig {
    /// Create a new erasure config
    #[must_use]
    pub const fn new(data_shards: u8, parity_shards: u8) -> Self {
        Self {
            data_shards,
            parity_shards,
        }
    }

    /// Total number of shards (k + m)
    #[must_use]
    pub const fn total_shards(&self) -> usize {
        self.data_shards as usize + self.parity_shards as usize
    }

    /// Number of lost shards a stripe survives
    #[must_use]
    pub const fn fault_tolerance(&self) -> usize {
        self.parity_shards as usize
    }

    /// Storage efficiency (k / (k + m))
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        f64::from(self.data_shards) / (f64::from(self.data_shards) + f64::from(self.parity_shards))
    }

    /// Check that the configuration fits in GF(256)
    pub fn validate(&self) -> Result<(), Error> {
        if self.data_shards == 0 {
            return Err(Error::configuration("data_shards must be > 0"));
        }
        if self.total_shards() > MAX_TOTAL_SHARDS {
            return Err(Error::configuration(format!(
                "total shards must be <= {MAX_TOTAL_SHARDS}, got {}",
                self.total_shards()
            )));
        }
        Ok(())
    }

    /// Default 4+2 configuration
    pub const EC_4_2: Self = Self::new(4, 2);

    /// 6+3 configuration
    pub const EC_6_3: Self = Self::new(6, 3);

    /// 8+4 configuration
    pub const EC_8_4: Self = Self::new(8, 4);

    /// 10+6 configuration
    pub const EC_10_6: Self = Self::new(10, 6);
}

impl Default for ErasureConfig {
    fn default() -> Self {
        Self::EC_4_2
    }
}

impl fmt::Display for ErasureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.data_shards, self.parity_shards)
    }
}

impl FromStr for ErasureConfig {
    type Err = Error;

    /// Parse a `k+m` scheme such as `10+6`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, m) = s
            .split_once('+')
            .ok_or_else(|| Error::invalid_argument(format!("expected k+m, got {s:?}")))?;
        let data_shards = k
            .trim()
            .parse::<u8>()
            .map_err(|e| Error::invalid_argument(format!("invalid data shard count {k:?}: {e}")))?;
        let parity_shards = m.trim().parse::<u8>().map_err(|e| {
            Error::invalid_argument(format!("invalid parity shard count {m:?}: {e}"))
        })?;
        let config = Self::new(data_shards, parity_shards);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erasure_config() {
        let ec = ErasureConfig::EC_4_2;
        assert_eq!(ec.data_shards, 4);
        assert_eq!(ec.parity_shards, 2);
        assert_eq!(ec.total_shards(), 6);
        assert_eq!(ec.fault_tolerance(), 2);
        assert!((ec.efficiency() - 0.666_666_666_666_666_6).abs() < 0.001);
    }

    #[test]
    fn test_erasure_config_validate() {
        assert!(ErasureConfig::EC_10_6.validate().is_ok());
        assert!(ErasureConfig::new(4, 0).validate().is_ok());
        assert!(ErasureConfig::new(200, 55).validate().is_ok());
        assert!(ErasureConfig::new(0, 2).validate().is_err());
        assert!(ErasureConfig::new(200, 56).validate().is_err());
    }

    #[test]
    fn test_erasure_config_total_does_not_wrap() {
        let ec = ErasureConfig::new(255, 255);
        assert_eq!(ec.total_shards(), 510);
        assert!(ec.validate().is_err());
    }

    #[test]
    fn test_erasure_config_parse() {
        assert_eq!(
            "10+6".parse::<ErasureConfig>().unwrap(),
            ErasureConfig::EC_10_6
        );
        assert_eq!(
            " 8 + 4 ".parse::<ErasureConfig>().unwrap(),
            ErasureConfig::EC_8_4
        );
        assert!("10".parse::<ErasureConfig>().is_err());
        assert!("x+2".parse::<ErasureConfig>().is_err());
        assert!("0+2".parse::<ErasureConfig>().is_err());
        assert!("250+10".parse::<ErasureConfig>().is_err());
    }

    #[test]
    fn test_erasure_config_display() {
        assert_eq!(ErasureConfig::EC_6_3.to_string(), "6+3");
    }
}
