//! Mask clean-up applied between thresholding and segmentation

use super::dilate::binary_dilate;
use super::element::StructuringElement;
use super::fill_holes::fill_holes;
use super::smooth::gaussian_smooth_mask;
use burnscar_core::raster::Raster;
use burnscar_core::Result;

/// Clean-up steps, always run in the order hole fill, smooth, dilate
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessParams {
    pub fill_holes: bool,
    /// Gaussian sigma in cells; `None` skips smoothing
    pub smooth_sigma: Option<f64>,
    /// Dilation passes with a 3x3 cross; `None` skips dilation
    pub dilate_iterations: Option<usize>,
}

impl Default for PostProcessParams {
    fn default() -> Self {
        Self {
            fill_holes: true,
            smooth_sigma: None,
            dilate_iterations: None,
        }
    }
}

impl PostProcessParams {
    /// Every step disabled
    pub fn none() -> Self {
        Self {
            fill_holes: false,
            smooth_sigma: None,
            dilate_iterations: None,
        }
    }
}

/// Run the enabled clean-up steps over a {0, 1} mask
pub fn postprocess_mask(mask: &Raster<u8>, params: &PostProcessParams) -> Result<Raster<u8>> {
    let mut current = mask.clone();

    if params.fill_holes {
        current = fill_holes(&current)?;
    }
    if let Some(sigma) = params.smooth_sigma {
        current = gaussian_smooth_mask(&current, sigma)?;
    }
    if let Some(iterations) = params.dilate_iterations {
        current = binary_dilate(&current, &StructuringElement::default(), iterations)?;
    }

    Ok(current)
}
