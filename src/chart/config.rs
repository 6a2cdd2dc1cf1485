use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChartError, ChartResult};

pub const DEFAULT_COLORS: [&str; 8] = [
    "#3b82f6", "#8b5cf6", "#ec4899", "#f59e0b", "#10b981", "#06b6d4", "#6366f1", "#ef4444",
];

pub fn default_colors() -> Vec<String> {
    DEFAULT_COLORS.iter().map(|c| c.to_string()).collect()
}

/// One data row: column name to value, in column order.
pub type Record = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
    Composed,
}

impl ChartType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Some(Self::Bar),
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            "area" => Some(Self::Area),
            "scatter" => Some(Self::Scatter),
            "composed" => Some(Self::Composed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Area => "area",
            Self::Scatter => "scatter",
            Self::Composed => "composed",
        }
    }

    /// The series type used for every series of a non-composed chart.
    pub fn default_series_type(self) -> SeriesType {
        match self {
            Self::Line => SeriesType::Line,
            Self::Area => SeriesType::Area,
            Self::Scatter => SeriesType::Scatter,
            Self::Bar | Self::Pie | Self::Composed => SeriesType::Bar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Bar,
    Line,
    Area,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Start,
    Middle,
    #[default]
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Number,
    Compact,
    Currency,
    Percent,
}

impl ValueFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Some(Self::Number),
            "compact" => Some(Self::Compact),
            "currency" => Some(Self::Currency),
            "percent" => Some(Self::Percent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub series_type: Option<SeriesType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_id: Option<AxisSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLineConfig {
    /// Number or category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LabelPosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    /// ISO 4217 code; `USD` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_fraction_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_fraction_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl FormatterConfig {
    /// Overwrites every field that `other` sets.
    pub fn merge(&mut self, other: FormatterConfig) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.format, other.format);
        take(&mut self.currency, other.currency);
        take(&mut self.decimals, other.decimals);
        take(&mut self.minimum_fraction_digits, other.minimum_fraction_digits);
        take(&mut self.maximum_fraction_digits, other.maximum_fraction_digits);
        take(&mut self.prefix, other.prefix);
        take(&mut self.suffix, other.suffix);
    }
}

/// A chart description as written in a `chart`, `chart-table` or `chart-json` block.
///
/// Field names serialize in camelCase so the JSON dialect and this struct share one shape.
/// A parsed config is not necessarily renderable; see [`ChartConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<SeriesConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_lines: Option<Vec<ReferenceLineConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<FormatterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_right_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl ChartConfig {
    /// Checks the fields a renderer cannot do without.
    pub fn validate(&self) -> ChartResult<()> {
        if self.data.is_empty() {
            return Err(ChartError::EmptyData);
        }
        if self.chart_type.is_none() {
            return Err(ChartError::MissingType);
        }
        Ok(())
    }

    /// Colours to cycle through: the configured list, or the built-in palette.
    pub fn palette(&self) -> Vec<String> {
        match &self.colors {
            Some(colors) if !colors.is_empty() => colors.clone(),
            _ => default_colors(),
        }
    }

    pub fn is_stacked(&self) -> bool {
        self.stacked.unwrap_or(false)
    }
}
