use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;

use crate::chart::config::{AxisSide, ChartConfig, ChartType, LabelPosition, SeriesConfig, SeriesType};

pub const DEFAULT_HEIGHT: f64 = 320.0;
pub const DEFAULT_AXIS_LABEL: &str = "Value";
pub const REFERENCE_LINE_COLOR: &str = "#9ca3af";
pub const REFERENCE_LABEL_COLOR: &str = "#4b5563";
pub const REFERENCE_DASH: &str = "4 4";

/// A series with every default filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSeries {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    pub color: String,
    pub y_axis_id: AxisSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    pub stroke_width: f64,
    pub dot: bool,
    pub opacity: f64,
}

/// Expands a config into the series a renderer draws.
///
/// Explicit `series` win; otherwise one series per data key, or a single `value` series.
/// Entries without a key are dropped.
pub fn derive_series(config: &ChartConfig) -> Vec<ResolvedSeries> {
    let base: Vec<SeriesConfig> = match (&config.series, &config.data_keys) {
        (Some(series), _) if !series.is_empty() => series.clone(),
        (_, Some(keys)) if !keys.is_empty() => keys
            .iter()
            .map(|key| SeriesConfig {
                key: Some(key.clone()),
                ..SeriesConfig::default()
            })
            .collect(),
        _ => vec![SeriesConfig {
            key: Some("value".to_string()),
            ..SeriesConfig::default()
        }],
    };

    let palette = config.palette();
    let chart_type = config.chart_type.unwrap_or(ChartType::Bar);
    let default_type = chart_type.default_series_type();

    base.into_iter()
        .filter_map(|mut series| {
            let key = series.key.take().filter(|k| !k.is_empty())?;
            Some((key, series))
        })
        .enumerate()
        .map(|(idx, (key, series))| {
            let series_type = if chart_type == ChartType::Composed {
                series.series_type.unwrap_or(default_type)
            } else {
                default_type
            };
            let stack_id = series
                .stack_id
                .or_else(|| config.is_stacked().then(|| "stack".to_string()));
            ResolvedSeries {
                name: series.name.unwrap_or_else(|| key.clone()),
                key,
                series_type,
                color: series
                    .color
                    .unwrap_or_else(|| palette[idx % palette.len()].clone()),
                y_axis_id: series.y_axis_id.unwrap_or_default(),
                stack_id,
                stroke_width: series.stroke_width.unwrap_or(match series_type {
                    SeriesType::Line => 2.0,
                    _ => 1.0,
                }),
                dot: series.dot.unwrap_or(true),
                opacity: series.opacity.unwrap_or(match series_type {
                    SeriesType::Area => 0.55,
                    _ => 1.0,
                }),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReferenceLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub stroke: String,
    pub label_color: String,
    pub stroke_dasharray: String,
    pub position: LabelPosition,
}

/// Everything a chart widget needs beyond the raw data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    pub show_legend: bool,
    pub show_grid: bool,
    pub left_axis_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_axis_label: Option<String>,
    pub series: Vec<ResolvedSeries>,
    pub reference_lines: Vec<ResolvedReferenceLine>,
}

pub fn resolve_layout(config: &ChartConfig) -> ChartLayout {
    let series = derive_series(config);
    let has_right_axis = series.iter().any(|s| s.y_axis_id == AxisSide::Right);

    let left_axis_label = config
        .y_axis_label
        .clone()
        .or_else(|| infer_axis_label(&series, AxisSide::Left))
        .unwrap_or_else(|| DEFAULT_AXIS_LABEL.to_string());
    let right_axis_label = if has_right_axis {
        config
            .y_axis_right_label
            .clone()
            .or_else(|| infer_axis_label(&series, AxisSide::Right))
    } else {
        None
    };

    let reference_lines = config
        .reference_lines
        .iter()
        .flatten()
        .filter(|line| line.x.is_some() || line.y.is_some())
        .map(|line| ResolvedReferenceLine {
            x: line.x.clone(),
            y: line.y.clone(),
            label: line.label.clone(),
            stroke: line
                .color
                .clone()
                .unwrap_or_else(|| REFERENCE_LINE_COLOR.to_string()),
            label_color: line
                .color
                .clone()
                .unwrap_or_else(|| REFERENCE_LABEL_COLOR.to_string()),
            stroke_dasharray: line
                .stroke_dasharray
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| REFERENCE_DASH.to_string()),
            position: line.position.unwrap_or_default(),
        })
        .collect();

    ChartLayout {
        height: config
            .height
            .filter(|h| *h > 0.0)
            .unwrap_or(DEFAULT_HEIGHT),
        width: config.width,
        show_legend: config
            .show_legend
            .unwrap_or(config.chart_type == Some(ChartType::Pie) || series.len() > 1),
        show_grid: config.show_grid.unwrap_or(true),
        left_axis_label,
        right_axis_label,
        series,
        reference_lines,
    }
}

fn infer_axis_label(series: &[ResolvedSeries], axis: AxisSide) -> Option<String> {
    let names: IndexSet<&str> = series
        .iter()
        .filter(|s| s.y_axis_id == axis)
        .map(|s| if s.name.is_empty() { s.key.as_str() } else { s.name.as_str() })
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }
    Some(names.into_iter().collect::<Vec<_>>().join(" / "))
}
