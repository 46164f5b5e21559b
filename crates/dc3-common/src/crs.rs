//! Coordinate Reference System identifiers.
//!
//! Unlike a WMS server, the cube builder accepts an open-ended set of source
//! CRSs (whatever a satellite archive was delivered in) and a handful of
//! well-known target CRSs. We keep the identifier as an EPSG code string and
//! leave the actual transform math to `dc3-projection`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate reference system, identified by its authority code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(String);

impl Crs {
    pub const WGS84: &'static str = "EPSG:4326";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn wgs84() -> Self {
        Self(Self::WGS84.to_string())
    }

    /// Parse a CRS string, accepting "EPSG:4326", "epsg:4326", or a bare "4326".
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CrsParseError::Empty);
        }
        if let Ok(code) = trimmed.parse::<u32>() {
            return Ok(Self(format!("EPSG:{code}")));
        }
        let upper = trimmed.to_uppercase();
        if upper.starts_with("EPSG:") {
            return Ok(Self(upper));
        }
        Err(CrsParseError::Unrecognized(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EPSG:4326 and EPSG:4269 style geographic CRSs use degrees on both axes.
    /// This is a heuristic the orchestrator uses before a full PROJ lookup is
    /// available; `dc3-projection` performs the authoritative check.
    pub fn is_likely_geographic(&self) -> bool {
        matches!(self.0.as_str(), "EPSG:4326" | "EPSG:4269" | "CRS:84")
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("empty CRS string")]
    Empty,
    #[error("unrecognized CRS: {0}")]
    Unrecognized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::new("EPSG:4326"));
        assert_eq!(Crs::parse("epsg:32631").unwrap(), Crs::new("EPSG:32631"));
        assert_eq!(Crs::parse("32631").unwrap(), Crs::new("EPSG:32631"));
        assert!(Crs::parse("").is_err());
    }

    #[test]
    fn test_is_likely_geographic() {
        assert!(Crs::wgs84().is_likely_geographic());
        assert!(!Crs::new("EPSG:32631").is_likely_geographic());
    }
}
