//! Markdown preprocessing for LLM output.
//!
//! [`preprocess`] rewrites raw markdown so a commonmark renderer with a math extension never
//! confuses a currency `$` with a math delimiter, while fenced code, inline code and display
//! math pass through untouched. [`chart`] parses chart blocks, and [`pending`] decides whether
//! a chart block that fails to parse is broken or still streaming in.

pub mod autowrap;
pub mod chart;
pub mod currency;
pub mod delimiters;
pub mod disambiguate;
pub mod error;
pub mod fence;
pub mod mask;
pub mod options;
pub mod pending;
pub mod placeholder;
pub mod preprocess;
pub mod syntax;
pub mod telemetry;

#[cfg(feature = "pulldown")]
pub mod adapters;

pub use chart::{ChartConfig, derive_series, parse_chart, resolve_layout};
pub use error::*;
pub use fence::*;
pub use mask::{Masked, mask, unmask};
pub use options::*;
pub use pending::{ChartOutcome, StreamDecision, StreamingGate, evaluate_chart, looks_incomplete};
pub use placeholder::*;
pub use preprocess::*;
