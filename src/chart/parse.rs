//! Chart block parsing.
//!
//! Three dialects share one output type:
//!
//! - `chart-json`: the block is a JSON object in the [`ChartConfig`] shape.
//! - table: any line contains `|`; the first pipe line is the header, the second a separator,
//!   the rest data rows. Plain `key: value` lines above the table still apply.
//! - lines: one `key: value` setting per line.

use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::chart::config::{
    ChartConfig, ChartType, FormatterConfig, Record, ReferenceLineConfig, SeriesConfig,
    ValueFormat, default_colors,
};
use crate::error::{ChartError, ChartResult};

/// How a chart block is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartDialect {
    Json,
    Table,
    Lines,
}

impl ChartDialect {
    /// Picks the dialect from the fence tag and, for non-JSON tags, the block content.
    pub fn detect(text: &str, tag: &str) -> ChartResult<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "chart-json" => Ok(Self::Json),
            "chart" | "chart-table" => {
                if text.trim().lines().any(|line| line.contains('|')) {
                    Ok(Self::Table)
                } else {
                    Ok(Self::Lines)
                }
            }
            other => Err(ChartError::Unparseable(format!(
                "unsupported chart tag `{other}`"
            ))),
        }
    }
}

/// Parses a chart block tagged `tag`.
///
/// A successful parse is not yet renderable: call [`ChartConfig::validate`] for the
/// empty-data and missing-type checks.
pub fn parse_chart(text: &str, tag: &str) -> ChartResult<ChartConfig> {
    let dialect = ChartDialect::detect(text, tag)?;
    let result = match dialect {
        ChartDialect::Json => serde_json::from_str::<ChartConfig>(text).map_err(ChartError::from),
        ChartDialect::Table => parse_table(text),
        ChartDialect::Lines => Ok(parse_lines(text)),
    };
    match &result {
        Ok(config) => debug!(
            ?dialect,
            records = config.data.len(),
            "parsed chart block"
        ),
        Err(err) => warn!(?dialect, error = %err, "chart block did not parse"),
    }
    result
}

fn parse_table(text: &str) -> ChartResult<ChartConfig> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let mut table = lines.iter().filter(|line| line.contains('|'));

    let header_line = table
        .next()
        .ok_or_else(|| ChartError::Unparseable("missing table header".to_string()))?;
    let headers: Vec<String> = header_line
        .split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(ChartError::Unparseable(
            "table header has no column names".to_string(),
        ));
    }

    // The line after the header is taken to be the `|---|` separator.
    let data = table
        .skip(1)
        .filter_map(|row| table_row(row, &headers))
        .collect();

    let mut config = ChartConfig {
        data,
        colors: Some(default_colors()),
        x_key: headers.first().cloned(),
        data_keys: Some(headers[1..].to_vec()),
        ..ChartConfig::default()
    };

    for line in lines.iter().take_while(|line| !line.contains('|')) {
        if let Some((key, value)) = line.split_once(':') {
            apply_setting(&mut config, key, value);
        }
    }

    normalize(&mut config);
    Ok(config)
}

fn table_row(row: &str, headers: &[String]) -> Option<Record> {
    let mut cells: Vec<&str> = row.split('|').map(str::trim).collect();
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.iter().all(|c| c.is_empty()) {
        return None;
    }

    let mut record = Record::new();
    for (header, cell) in headers.iter().zip(cells) {
        if cell.is_empty() {
            continue;
        }
        record.insert(header.clone(), cell_value(cell));
    }
    Some(record)
}

/// Numbers stay numbers (integers as integers); everything else is kept as text.
pub fn cell_value(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Number(n.into());
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

fn parse_lines(text: &str) -> ChartConfig {
    let mut config = ChartConfig {
        colors: Some(default_colors()),
        ..ChartConfig::default()
    };
    let mut raw_data: Option<RawData> = None;

    for line in text.trim().lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("data") {
            match RawData::parse(value.trim()) {
                Ok(parsed) => raw_data = Some(parsed),
                Err(err) => debug!(error = %err, "ignoring unparseable chart data"),
            }
            continue;
        }
        apply_setting(&mut config, key, value);
    }

    match raw_data {
        Some(RawData::Records(records)) => config.data = records,
        Some(RawData::Values(values)) => config.data = records_from_values(&mut config, values),
        None => {}
    }
    normalize(&mut config);
    config
}

/// A `data:` value before the labels are known.
enum RawData {
    /// Objects, deserialized straight into records so their keys keep source order.
    Records(Vec<Record>),
    Values(Vec<Value>),
}

impl RawData {
    fn parse(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Vec<Record>>(value)
            .map(Self::Records)
            .or_else(|_| serde_json::from_str::<Vec<Value>>(value).map(Self::Values))
    }
}

/// Turns a `data:` array that is not all objects into records; a plain list of numbers becomes
/// `{name, value}` rows, and any objects mixed into another list are kept.
fn records_from_values(config: &mut ChartConfig, values: Vec<Value>) -> Vec<Record> {
    if !values.first().is_some_and(Value::is_number) {
        return values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map.into_iter().collect()),
                _ => None,
            })
            .collect();
    }

    let labels = config.labels.clone().unwrap_or_default();
    let records = values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            let name = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("Item {}", idx + 1));
            let mut record = Record::new();
            record.insert("name".to_string(), Value::String(name));
            record.insert("value".to_string(), value);
            record
        })
        .collect();
    config.x_key = Some("name".to_string());
    config.data_keys = Some(vec!["value".to_string()]);
    records
}

fn normalize(config: &mut ChartConfig) {
    if config.colors.as_ref().is_none_or(Vec::is_empty) {
        config.colors = Some(default_colors());
    }
}

/// Applies one `key: value` setting. Keys are case-insensitive; unknown keys and values that do
/// not parse are ignored.
pub fn apply_setting(config: &mut ChartConfig, key: &str, value: &str) {
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return;
    }

    match key.to_ascii_lowercase().as_str() {
        "type" => {
            if let Some(chart_type) = ChartType::parse(value) {
                config.chart_type = Some(chart_type);
            }
        }
        "title" => config.title = Some(value.to_string()),
        "description" => config.description = Some(value.to_string()),
        "xaxislabel" => config.x_axis_label = Some(value.to_string()),
        "yaxislabel" => config.y_axis_label = Some(value.to_string()),
        "yaxisrightlabel" => config.y_axis_right_label = Some(value.to_string()),
        "xkey" => config.x_key = Some(value.to_string()),
        "stacked" => config.stacked = Some(parse_flag(value)),
        "showlegend" => config.show_legend = Some(parse_flag(value)),
        "showgrid" => config.show_grid = Some(parse_flag(value)),
        "height" => {
            if let Some(n) = parse_dimension(value) {
                config.height = Some(n);
            }
        }
        "width" => {
            if let Some(n) = parse_dimension(value) {
                config.width = Some(n);
            }
        }
        "valueformat" => {
            if let Some(format) = ValueFormat::parse(value) {
                formatter(config).format = Some(format);
            }
        }
        "valueprefix" => formatter(config).prefix = Some(value.to_string()),
        "valuesuffix" => formatter(config).suffix = Some(value.to_string()),
        "valuecurrency" => formatter(config).currency = Some(value.to_string()),
        "valuedecimals" => {
            if let Some(n) = parse_dimension(value).filter(|n| *n >= 0.0) {
                formatter(config).decimals = Some(n.round() as u32);
            }
        }
        "formatter" => {
            if let Ok(parsed) = serde_json::from_str::<FormatterConfig>(value) {
                formatter(config).merge(parsed);
            } else if let Some(format) = ValueFormat::parse(value) {
                formatter(config).format = Some(format);
            }
        }
        "colors" => config.colors = Some(parse_list(value)),
        "labels" => config.labels = Some(parse_list(value)),
        "datakeys" => config.data_keys = Some(parse_list(value)),
        "data" => {
            if let Ok(parsed) = serde_json::from_str::<Vec<Record>>(value) {
                config.data = parsed;
            }
        }
        "series" => {
            if let Ok(parsed) = serde_json::from_str::<Vec<SeriesConfig>>(value) {
                config.series = Some(parsed);
            }
        }
        "referencelines" => {
            if let Ok(parsed) = serde_json::from_str::<Vec<ReferenceLineConfig>>(value) {
                config.reference_lines = Some(parsed);
            }
        }
        _ => {}
    }
}

fn formatter(config: &mut ChartConfig) -> &mut FormatterConfig {
    config.formatter.get_or_insert_with(FormatterConfig::default)
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Parses `480`, `480px` or `12.5`.
pub fn parse_dimension(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = match value.len().checked_sub(2).and_then(|at| value.get(at..)) {
        Some(unit) if unit.eq_ignore_ascii_case("px") => &value[..value.len() - 2],
        _ => value,
    };
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a list given as a JSON string array, `[a, b]`, or `a, b`. Surrounding quotes are
/// stripped from each item and empty items dropped.
pub fn parse_list(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        return Vec::new();
    }
    if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
        return items;
    }
    let inner = value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(|item| strip_quotes(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn strip_quotes(item: &str) -> &str {
    let item = item.strip_prefix(['"', '\'']).unwrap_or(item);
    item.strip_suffix(['"', '\'']).unwrap_or(item)
}
