//! Display formatting for chart values (tooltips, axis ticks).

use serde_json::Value;

use crate::chart::config::{FormatterConfig, ValueFormat};

/// Fraction digits are clamped to `0..=MAX_FRACTION_DIGITS`.
pub const MAX_FRACTION_DIGITS: u32 = 20;

/// Formats `value` for display.
///
/// Non-numbers are shown as-is (`null` as an empty string). Numbers use `,` grouping; without a
/// formatter they keep up to three fraction digits.
pub fn format_value(value: &Value, formatter: Option<&FormatterConfig>) -> String {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Null => return String::new(),
        Value::String(s) => return s.clone(),
        other => return other.to_string(),
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        return value.to_string();
    };

    let Some(formatter) = formatter else {
        return group_fixed(number, 0, 3);
    };

    let format = formatter.format.unwrap_or_default();
    let (min, max) = fraction_digits(formatter, format);
    let body = match format {
        ValueFormat::Currency => {
            let code = formatter
                .currency
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or("USD");
            let digits = group_fixed(number.abs(), min, max);
            let sign = if number < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0') {
                "-"
            } else {
                ""
            };
            format!("{sign}{}{digits}", currency_symbol(code))
        }
        ValueFormat::Percent => format!("{}%", group_fixed(number * 100.0, min, max)),
        ValueFormat::Compact => compact(number, min, max),
        ValueFormat::Number => group_fixed(number, min, max),
    };

    format!(
        "{}{body}{}",
        formatter.prefix.as_deref().unwrap_or(""),
        formatter.suffix.as_deref().unwrap_or("")
    )
}

fn fraction_digits(formatter: &FormatterConfig, format: ValueFormat) -> (u32, u32) {
    if let Some(decimals) = formatter.decimals {
        let decimals = decimals.min(MAX_FRACTION_DIGITS);
        return (decimals, decimals);
    }
    let (default_min, default_max) = match format {
        ValueFormat::Currency => {
            let zero_decimal = formatter
                .currency
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("JPY"));
            if zero_decimal { (0, 0) } else { (2, 2) }
        }
        ValueFormat::Percent => (0, 0),
        ValueFormat::Compact => (0, 1),
        ValueFormat::Number => (0, 2),
    };
    let min = formatter
        .minimum_fraction_digits
        .unwrap_or(default_min)
        .min(MAX_FRACTION_DIGITS);
    let max = formatter
        .maximum_fraction_digits
        .unwrap_or(default_max)
        .clamp(min, MAX_FRACTION_DIGITS);
    (min, max)
}

fn currency_symbol(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => format!("{other} "),
    }
}

/// Picks the unit after rounding, so `999_999` reads `1M` rather than `1,000K`.
fn compact(number: f64, min: u32, max: u32) -> String {
    const UNITS: [(f64, &str); 5] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];
    let mut idx = UNITS
        .iter()
        .rposition(|&(scale, _)| number.abs() >= scale)
        .unwrap_or(0);
    loop {
        let (scale, unit) = UNITS[idx];
        let scaled = number / scale;
        if rounded(scaled.abs(), max) >= 1000.0 && idx + 1 < UNITS.len() {
            idx += 1;
            continue;
        }
        return format!("{}{unit}", group_fixed(scaled, min, max));
    }
}

fn rounded(number: f64, digits: u32) -> f64 {
    format!("{:.*}", digits as usize, number)
        .parse()
        .unwrap_or(number)
}

/// Rounds to `max` fraction digits, trims trailing zeros down to `min`, groups thousands.
fn group_fixed(number: f64, min: u32, max: u32) -> String {
    let fixed = format!("{:.*}", max as usize, number.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (fixed.as_str(), ""),
    };

    let mut frac = frac_part.to_string();
    while frac.len() > min as usize && frac.ends_with('0') {
        frac.pop();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac.chars().all(|c| c == '0');
    let sign = if number < 0.0 && !is_zero { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}
