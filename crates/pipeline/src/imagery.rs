//! Time-tagged imagery granules and the source they are searched from

use crate::error::{PipelineError, Result};
use burnscar_algorithms::vector::BoundingBox;
use burnscar_core::crs::{reproject_bounds, CRS};
use burnscar_core::raster::{GeoTransform, Raster};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One acquisition: named bands sharing a CRS and acquisition date
#[derive(Debug, Clone)]
pub struct Granule {
    pub id: String,
    pub acquired: NaiveDate,
    crs: CRS,
    bands: BTreeMap<String, Raster<f64>>,
}

impl Granule {
    /// Every band is tagged with `crs`. At least one band is required.
    pub fn new<I>(id: impl Into<String>, acquired: NaiveDate, crs: CRS, bands: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Raster<f64>)>,
    {
        let id = id.into();
        let bands: BTreeMap<String, Raster<f64>> = bands
            .into_iter()
            .map(|(name, mut raster)| {
                raster.set_crs(Some(crs.clone()));
                (name, raster)
            })
            .collect();
        if bands.is_empty() {
            return Err(PipelineError::InsufficientImagery(format!(
                "granule {id} has no bands"
            )));
        }
        Ok(Self {
            id,
            acquired,
            crs,
            bands,
        })
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn band(&self, name: &str) -> Option<&Raster<f64>> {
        self.bands.get(name)
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    /// Transform of the first band in name order
    pub fn transform(&self) -> Option<&GeoTransform> {
        self.bands.values().next().map(|r| r.transform())
    }

    /// Envelope of every band, in WGS84 degrees
    pub fn footprint_wgs84(&self) -> Result<BoundingBox> {
        let mut out: Option<BoundingBox> = None;
        for raster in self.bands.values() {
            let b = BoundingBox::from_tuple(reproject_bounds(
                &self.crs,
                &CRS::wgs84(),
                raster.bounds(),
            )?);
            out = Some(match out {
                None => b,
                Some(o) => BoundingBox::new(
                    o.min_x.min(b.min_x),
                    o.min_y.min(b.min_y),
                    o.max_x.max(b.max_x),
                    o.max_y.max(b.max_y),
                ),
            });
        }
        out.ok_or_else(|| PipelineError::InsufficientImagery(format!("granule {} has no bands", self.id)))
    }

    /// Copy holding only `names`; `None` if any is missing
    pub fn select_bands(&self, names: &[&str]) -> Option<Granule> {
        let bands = names
            .iter()
            .map(|n| self.bands.get(*n).map(|r| (n.to_string(), r.clone())))
            .collect::<Option<BTreeMap<_, _>>>()?;
        Some(Granule {
            id: self.id.clone(),
            acquired: self.acquired,
            crs: self.crs.clone(),
            bands,
        })
    }
}

/// Inclusive date range, written `YYYY-MM-DD/YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(PipelineError::Config(format!(
                "date window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl FromStr for DateWindow {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| PipelineError::Config(format!("expected START/END, got '{s}'")))?;
        Self::new(parse_date(start)?, parse_date(end)?)
    }
}

impl TryFrom<String> for DateWindow {
    type Error = PipelineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DateWindow> for String {
    fn from(w: DateWindow) -> String {
        w.to_string()
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| PipelineError::Config(format!("invalid date '{s}': {e}")))
}

/// Pre- and post-fire acquisition windows of one fire event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireEventWindows {
    pub prefire: DateWindow,
    pub postfire: DateWindow,
}

impl FireEventWindows {
    pub fn new(prefire: DateWindow, postfire: DateWindow) -> Self {
        Self { prefire, postfire }
    }

    /// `[ignition - buffer, ignition]` before the fire and
    /// `[containment, containment + buffer]` after it
    pub fn from_event(
        ignition: NaiveDate,
        containment: NaiveDate,
        buffer_days: u64,
    ) -> Result<Self> {
        if containment < ignition {
            return Err(PipelineError::Config(format!(
                "containment {containment} precedes ignition {ignition}"
            )));
        }
        let days = Days::new(buffer_days);
        let before = ignition
            .checked_sub_days(days)
            .ok_or_else(|| PipelineError::Config("prefire window out of range".into()))?;
        let after = containment
            .checked_add_days(days)
            .ok_or_else(|| PipelineError::Config("postfire window out of range".into()))?;
        Ok(Self {
            prefire: DateWindow::new(before, ignition)?,
            postfire: DateWindow::new(containment, after)?,
        })
    }
}

/// Catalog of granules searchable by place and time
pub trait ImagerySource {
    /// Granules intersecting `extent` (WGS84 degrees) acquired within
    /// `window` that carry every band in `bands`
    fn search(&self, extent: &BoundingBox, window: &DateWindow, bands: &[&str])
        -> Result<Vec<Granule>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn utm_band() -> Raster<f64> {
        let mut r = Raster::filled(10, 10, 0.3);
        r.set_transform(GeoTransform::new(600_000.0, 4_270_000.0, 20.0, -20.0));
        r
    }

    #[test]
    fn test_date_window_parse_and_display() {
        let w: DateWindow = "2023-07-01/2023-07-31".parse().unwrap();
        assert_eq!(w.start, date("2023-07-01"));
        assert!(w.contains(date("2023-07-31")));
        assert!(!w.contains(date("2023-08-01")));
        assert_eq!(w.to_string(), "2023-07-01/2023-07-31");
        assert!("2023-07-31/2023-07-01".parse::<DateWindow>().is_err());
        assert!("2023-07-01".parse::<DateWindow>().is_err());
    }

    #[test]
    fn test_date_window_serde() {
        let w: DateWindow = serde_json::from_str(r#""2023-07-01/2023-07-31""#).unwrap();
        assert_eq!(serde_json::to_string(&w).unwrap(), r#""2023-07-01/2023-07-31""#);
    }

    #[test]
    fn test_fire_event_windows() {
        let w = FireEventWindows::from_event(date("2023-08-10"), date("2023-09-02"), 30).unwrap();
        assert_eq!(w.prefire.to_string(), "2023-07-11/2023-08-10");
        assert_eq!(w.postfire.to_string(), "2023-09-02/2023-10-02");
        assert!(FireEventWindows::from_event(date("2023-09-02"), date("2023-08-10"), 30).is_err());
    }

    #[test]
    fn test_granule_bands_and_footprint() {
        let g = Granule::new(
            "S2A_T10SFH_20230801",
            date("2023-08-01"),
            CRS::from_epsg(32610),
            [("B8A".to_string(), utm_band()), ("B12".to_string(), utm_band())],
        )
        .unwrap();
        assert_eq!(g.band("B8A").unwrap().crs(), Some(&CRS::from_epsg(32610)));
        assert_eq!(g.band_names().collect::<Vec<_>>(), vec!["B12", "B8A"]);
        assert!(g.select_bands(&["B8A", "B04"]).is_none());
        assert_eq!(g.select_bands(&["B12"]).unwrap().band_names().count(), 1);

        let fp = g.footprint_wgs84().unwrap();
        assert!(fp.min_x > -122.0 && fp.max_x < -121.0);
        assert!(fp.min_y > 38.0 && fp.max_y < 39.0);
    }

    #[test]
    fn test_granule_requires_bands() {
        let empty: Vec<(String, Raster<f64>)> = Vec::new();
        assert!(Granule::new("x", date("2023-08-01"), CRS::wgs84(), empty).is_err());
    }
}
