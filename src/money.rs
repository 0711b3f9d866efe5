// Money and unit helpers — decimal money parsing/formatting, http(s)
// URL validation, and weight-unit conversion to grams.
//
// Generalizes a common price-cleaning pattern that strips
// `$`/commas/whitespace and falls back to 0.0 on failure. This engine
// needs a strict variant that distinguishes "empty" from "unparsable"
// so the Shopify/Amazon/eBay/Etsy optimizers can emit the right issue.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MONEY_RE: Regex = Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap();
}

/// Parse a money string like `"$1,299.00"` or `"-4.5"` into a decimal
/// number. Returns `None` for anything that doesn't reduce to a plain
/// signed decimal after stripping currency symbols, commas and
/// whitespace.
pub fn parse_money(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '£' | '€' | '¥' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if !MONEY_RE.is_match(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Format a number as a fixed two-decimal money string, e.g. `19.99`.
pub fn format_money(n: f64) -> String {
    format!("{:.2}", n)
}

/// Is `s` a well-formed `http://` or `https://` URL with a host?
pub fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    let rest = if let Some(r) = s.strip_prefix("https://") {
        r
    } else if let Some(r) = s.strip_prefix("http://") {
        r
    } else {
        return false;
    };
    // Host component: everything up to the first '/', '?' or '#', must
    // be non-empty and contain no whitespace.
    let host_end = rest
        .find(|c: char| c == '/' || c == '?' || c == '#')
        .unwrap_or(rest.len());
    let host = &rest[..host_end];
    !host.is_empty() && !host.contains(char::is_whitespace)
}

/// Is `s` parseable as a non-negative integer (used for inventory
/// quantity / image position / eBay quantity checks)?
pub fn parse_nonneg_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let n: i64 = s.parse().ok()?;
    if n < 0 {
        None
    } else {
        Some(n)
    }
}

/// Weight unit, for conversion to the Shopify canonical gram field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Grams,
    Kilograms,
    Ounces,
    Pounds,
}

impl WeightUnit {
    pub fn parse(s: &str) -> Option<WeightUnit> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(WeightUnit::Grams),
            "kg" | "kilogram" | "kilograms" => Some(WeightUnit::Kilograms),
            "oz" | "ounce" | "ounces" => Some(WeightUnit::Ounces),
            "lb" | "lbs" | "pound" | "pounds" => Some(WeightUnit::Pounds),
            _ => None,
        }
    }

    pub fn grams_per_unit(self) -> f64 {
        match self {
            WeightUnit::Grams => 1.0,
            WeightUnit::Kilograms => 1000.0,
            WeightUnit::Ounces => 28.349_523_125,
            WeightUnit::Pounds => 453.592_37,
        }
    }
}

/// Convert a weight value + unit string to grams. Returns `None` if
/// either the value or the unit fails to parse.
pub fn weight_to_grams(value: &str, unit: &str) -> Option<f64> {
    let v: f64 = value.trim().parse().ok()?;
    let u = WeightUnit::parse(unit)?;
    Some(v * u.grams_per_unit())
}
