//! Error types for the burn analysis pipeline.

use thiserror::Error;

/// Errors produced while analysing one fire event.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("insufficient imagery: {0}")]
    InsufficientImagery(String),

    #[error("{metric} has {cells} no-data cell(s) inside its valid footprint")]
    InteriorNoData { metric: String, cells: usize },

    #[error("no fire boundary detected")]
    NoFireBoundaryDetected,

    #[error("{0} is entirely NaN")]
    AllNaNMetrics(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("object store: {0}")]
    Storage(String),

    #[error("core error: {0}")]
    Core(#[from] burnscar_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Coarse outcome class an outer layer maps to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Analysis ran but found no burn boundary; not a fault
    NoBoundary,
    /// Imagery or metrics too sparse to analyse
    InsufficientData,
    /// Caller supplied something unusable
    InvalidInput,
    Storage,
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::NoFireBoundaryDetected => FailureKind::NoBoundary,
            PipelineError::InsufficientImagery(_)
            | PipelineError::InteriorNoData { .. }
            | PipelineError::AllNaNMetrics(_) => FailureKind::InsufficientData,
            PipelineError::Config(_) | PipelineError::Json(_) | PipelineError::GeoJson(_) => {
                FailureKind::InvalidInput
            }
            PipelineError::Storage(_) | PipelineError::Io(_) => FailureKind::Storage,
            PipelineError::Core(e) => match e {
                burnscar_core::Error::Io(_) => FailureKind::Storage,
                burnscar_core::Error::InvalidGeometry(_)
                | burnscar_core::Error::InvalidParameter { .. }
                | burnscar_core::Error::UnsupportedCrs(_)
                | burnscar_core::Error::GeoJson(_) => FailureKind::InvalidInput,
                _ => FailureKind::Internal,
            },
        }
    }

    pub fn is_no_boundary(&self) -> bool {
        self.kind() == FailureKind::NoBoundary
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
