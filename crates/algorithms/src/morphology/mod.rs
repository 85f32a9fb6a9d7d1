//! Binary mask morphology
//!
//! - **fill_holes**: close background pockets enclosed by the mask
//! - **gaussian_smooth_mask**: blur and re-binarise to drop specks
//! - **binary_dilate**: grow the mask by a structuring element
//! - **postprocess_mask**: the three above in fixed order

mod dilate;
mod element;
mod fill_holes;
mod postprocess;
mod smooth;

pub use dilate::binary_dilate;
pub use element::StructuringElement;
pub use fill_holes::fill_holes;
pub use postprocess::{postprocess_mask, PostProcessParams};
pub use smooth::gaussian_smooth_mask;
