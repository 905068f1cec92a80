//! Gauge label formatting.

use serde::{Deserialize, Serialize};

/// How a gauge renders its value as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    /// Whole number with thousands separators, e.g. `1,250`.
    Grouped,
    /// Rounded to two decimals without trailing zeros, e.g. `32.46`, `20`.
    TwoDecimals,
}

impl LabelFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            LabelFormat::Grouped => format_grouped(value),
            LabelFormat::TwoDecimals => format_two_decimals(value),
        }
    }
}

/// Round half away from zero and insert `,` every three digits.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Above this magnitude an `f64` has no fractional digits left to round.
const EXACT_MAGNITUDE: f64 = 1e15;

/// Round half up to two decimals and print the shortest representation.
pub fn format_two_decimals(value: f64) -> String {
    if !value.is_finite() || value.abs() >= EXACT_MAGNITUDE {
        return value.to_string();
    }
    let rounded = (value * 100.0 + 0.5).floor() / 100.0;
    // -0.0 would print as "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    rounded.to_string()
}
