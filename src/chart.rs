//! Chart blocks: configuration model, the three block dialects, and render-time defaults.

pub mod config;
pub mod format;
pub mod parse;
pub mod series;

pub use config::*;
pub use format::*;
pub use parse::*;
pub use series::*;

/// Fence tags that carry a chart configuration.
pub const CHART_TAGS: [&str; 3] = ["chart", "chart-json", "chart-table"];

pub fn is_chart_tag(tag: &str) -> bool {
    CHART_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
}
