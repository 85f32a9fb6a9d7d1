//! Burn-severity metrics from pre- and post-fire NBR
//!
//! - `dNBR  = NBR_pre - NBR_post` (Key & Benson, 2006)
//! - `RdNBR = dNBR / sqrt(|NBR_pre|)` (Miller & Thode, 2007)
//! - `RBR   = dNBR / (NBR_pre + 1.001)` (Parks et al., 2014)

use super::indices::{build_output, check_dimensions, nbr};
use crate::maybe_rayon::*;
use burnscar_core::raster::Raster;
use burnscar_core::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Offset that keeps the RBR denominator away from zero
pub const RBR_OFFSET: f64 = 1.001;

/// The five layers of a metric stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BurnMetric {
    NbrPrefire,
    NbrPostfire,
    Dnbr,
    Rdnbr,
    Rbr,
}

impl BurnMetric {
    pub const ALL: [BurnMetric; 5] = [
        BurnMetric::NbrPrefire,
        BurnMetric::NbrPostfire,
        BurnMetric::Dnbr,
        BurnMetric::Rdnbr,
        BurnMetric::Rbr,
    ];

    /// Layer name, also used as the persisted file stem
    pub fn name(&self) -> &'static str {
        match self {
            BurnMetric::NbrPrefire => "nbr_prefire",
            BurnMetric::NbrPostfire => "nbr_postfire",
            BurnMetric::Dnbr => "dnbr",
            BurnMetric::Rdnbr => "rdnbr",
            BurnMetric::Rbr => "rbr",
        }
    }
}

impl fmt::Display for BurnMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BurnMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BurnMetric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidParameter {
                name: "metric",
                value: s.to_string(),
                reason: "expected one of nbr_prefire, nbr_postfire, dnbr, rdnbr, rbr".into(),
            })
    }
}

/// Time-reduced NIR and SWIR reflectance on one grid
#[derive(Debug, Clone)]
pub struct ReducedImagery {
    pub nir: Raster<f64>,
    pub swir: Raster<f64>,
}

impl ReducedImagery {
    /// Fails unless both bands share a grid
    pub fn new(nir: Raster<f64>, swir: Raster<f64>) -> Result<Self> {
        nir.ensure_same_grid(&swir)?;
        Ok(Self { nir, swir })
    }
}

/// Five burn-severity layers sharing one grid and CRS
#[derive(Debug, Clone)]
pub struct MetricStack {
    pub nbr_prefire: Raster<f64>,
    pub nbr_postfire: Raster<f64>,
    pub dnbr: Raster<f64>,
    pub rdnbr: Raster<f64>,
    pub rbr: Raster<f64>,
}

impl MetricStack {
    /// Assemble a stack from named layers.
    ///
    /// Every metric must be present and all layers must share a grid.
    pub fn from_layers(mut layers: HashMap<BurnMetric, Raster<f64>>) -> Result<Self> {
        let missing: Vec<String> = BurnMetric::ALL
            .iter()
            .filter(|m| !layers.contains_key(m))
            .map(|m| m.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingLayers(missing));
        }

        let mut take = |m: BurnMetric| {
            layers
                .remove(&m)
                .ok_or_else(|| Error::MissingLayers(vec![m.name().to_string()]))
        };
        let stack = MetricStack {
            nbr_prefire: take(BurnMetric::NbrPrefire)?,
            nbr_postfire: take(BurnMetric::NbrPostfire)?,
            dnbr: take(BurnMetric::Dnbr)?,
            rdnbr: take(BurnMetric::Rdnbr)?,
            rbr: take(BurnMetric::Rbr)?,
        };

        for (_, layer) in stack.iter().skip(1) {
            stack.nbr_prefire.ensure_same_grid(layer)?;
        }
        Ok(stack)
    }

    pub fn get(&self, metric: BurnMetric) -> &Raster<f64> {
        match metric {
            BurnMetric::NbrPrefire => &self.nbr_prefire,
            BurnMetric::NbrPostfire => &self.nbr_postfire,
            BurnMetric::Dnbr => &self.dnbr,
            BurnMetric::Rdnbr => &self.rdnbr,
            BurnMetric::Rbr => &self.rbr,
        }
    }

    /// Layers in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (BurnMetric, &Raster<f64>)> {
        BurnMetric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Apply a grid-preserving or grid-changing operation to every layer
    pub fn try_map<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&Raster<f64>) -> Result<Raster<f64>>,
    {
        let layers = self
            .iter()
            .map(|(m, layer)| f(layer).map(|out| (m, out)))
            .collect::<Result<HashMap<_, _>>>()?;
        Self::from_layers(layers)
    }

    /// Reference grid of the stack
    pub fn grid(&self) -> &Raster<f64> {
        &self.nbr_prefire
    }
}

/// Compute the metric stack from pre- and post-fire reflectance.
///
/// NaN in any input band propagates to every derived layer at that cell.
pub fn compute_burn_metrics(
    prefire: &ReducedImagery,
    postfire: &ReducedImagery,
) -> Result<MetricStack> {
    prefire.nir.ensure_same_grid(&postfire.nir)?;

    let nbr_prefire = nbr(&prefire.nir, &prefire.swir)?;
    let nbr_postfire = nbr(&postfire.nir, &postfire.swir)?;

    let dnbr = combine(&nbr_prefire, &nbr_postfire, |pre, post| pre - post)?;
    let rdnbr = combine(&dnbr, &nbr_prefire, |d, pre| d / pre.abs().sqrt())?;
    let rbr = combine(&dnbr, &nbr_prefire, |d, pre| d / (pre + RBR_OFFSET))?;

    Ok(MetricStack {
        nbr_prefire,
        nbr_postfire,
        dnbr,
        rdnbr,
        rbr,
    })
}

/// Cell-wise binary operation with plain IEEE semantics
fn combine<F>(a: &Raster<f64>, b: &Raster<f64>, op: F) -> Result<Raster<f64>>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    check_dimensions(a, b)?;
    let (rows, cols) = a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let x = unsafe { a.get_unchecked(row, col) };
                    let y = unsafe { b.get_unchecked(row, col) };
                    op(x, y)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    build_output(a, rows, cols, data)
}
