//! Binary classification of continuous layers
//!
//! - **Otsu**: histogram-based automatic threshold
//! - **Simple**: fixed, caller-supplied cut-off

mod threshold;

pub use threshold::{OtsuThreshold, SimpleThreshold, Thresholding, ThresholdingStrategy};
