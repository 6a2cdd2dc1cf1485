use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

/// Why a chart block could not become a [`crate::chart::ChartConfig`].
///
/// The display strings are meant to be shown to the reader next to the block source.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to parse chart configuration")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse chart configuration: {0}")]
    Unparseable(String),

    #[error("Chart data is empty")]
    EmptyData,

    #[error("Chart type is required (bar, line, pie, area, scatter, composed)")]
    MissingType,
}

pub type FenceResult<T> = Result<T, FenceError>;

/// Failures reported while turning a fenced block into rich output.
#[derive(Debug, Error)]
pub enum FenceError {
    #[error("sanitized SVG is empty")]
    EmptySvg,

    #[error("PlantUML diagram must start with @start... (e.g., @startuml, @startmindmap)")]
    MissingPlantUmlStart,

    #[error("PlantUML diagram must end with @end... (e.g., @enduml, @endmindmap)")]
    MissingPlantUmlEnd,

    #[error("Unable to detect ABC notation; expected headers like X:, T:, M:, L:, or K:")]
    MissingAbcHeaders,

    #[error("{kind} renderer failed: {message}")]
    Renderer { kind: &'static str, message: String },
}
