//! Coordinate reference systems

mod reproject;

pub use reproject::{
    parse_utm_epsg, reproject_bounds, reproject_geometry, transform_point, utm_epsg_for,
};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EPSG code of WGS84 geographic coordinates
pub const WGS84_EPSG: u32 = 4326;

/// Coordinate reference system, identified by EPSG code where known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    epsg: Option<u32>,
    /// WKT text for systems without an EPSG code
    wkt: Option<String>,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(WGS84_EPSG)
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// EPSG code, or [`Error::UnsupportedCrs`] when there is none
    pub fn require_epsg(&self) -> Result<u32> {
        self.epsg
            .ok_or_else(|| Error::UnsupportedCrs(self.identifier()))
    }

    pub fn is_geographic(&self) -> bool {
        self.epsg == Some(WGS84_EPSG)
    }

    /// `(zone, north)` for WGS84 / UTM systems
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        self.epsg.and_then(parse_utm_epsg)
    }

    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// `EPSG:<code>`, a WKT prefix, or `Unknown`
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", wkt.chars().take(50).collect::<String>());
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// Parses `EPSG:32610`, `epsg:4326` or a bare code
impl FromStr for CRS {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let code = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        code.parse::<u32>()
            .map(CRS::from_epsg)
            .map_err(|_| Error::UnsupportedCrs(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_parse() {
        let crs: CRS = "EPSG:32610".parse().unwrap();
        assert_eq!(crs.epsg(), Some(32610));
        assert_eq!(crs.utm_zone(), Some((10, true)));
        assert_eq!("4326".parse::<CRS>().unwrap(), CRS::wgs84());
        assert!("EPSG:abc".parse::<CRS>().is_err());
    }

    #[test]
    fn test_crs_equivalence() {
        assert!(CRS::from_epsg(4326).is_equivalent(&CRS::wgs84()));
        assert!(!CRS::from_epsg(32610).is_equivalent(&CRS::wgs84()));
        assert!(!CRS::from_wkt("X").is_equivalent(&CRS::wgs84()));
    }
}
