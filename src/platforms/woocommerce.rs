// WooCommerce Products optimizer — simple + variable + variation rows
// in one flat CSV, matching WooCommerce's own product-CSV importer
// shape. Supports an `auto_create_missing_parents` mode for variation
// rows that reference a parent SKU the file never defines.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::issue::{catch_row_panic, IssueSink};
use crate::model::{Format, FormatCategory, FormatSource, Issue, Row, Severity};
use crate::model::{FixResult, Headers};
use crate::money::parse_money;

const PRODUCT_TYPES: &[&str] = &["simple", "variable", "variation", "grouped", "external"];

lazy_static! {
    static ref ATTRIBUTE_NAME_RE: Regex = Regex::new(r"(?i)^attribute (\d+) name$").unwrap();
    static ref ATTRIBUTE_VALUE_RE: Regex = Regex::new(r"(?i)^attribute (\d+) value\(?s?\)?$").unwrap();
}

fn canonicalize_type(raw: &str) -> Option<&'static str> {
    let lower = raw.trim().to_lowercase();
    PRODUCT_TYPES.iter().find(|t| **t == lower).copied()
}

fn canonicalize_boolean01(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "yes" | "y" | "true" | "t" => Some("1"),
        "0" | "no" | "n" | "false" | "f" => Some("0"),
        _ => None,
    }
}

fn normalize_categories(raw: &str) -> String {
    raw.split('>')
        .map(|s| s.trim())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Numeric suffixes of every `Attribute N name`/`Attribute N value(s)`
/// column pair found in `headers`, in ascending order.
fn attribute_columns(headers: &Headers) -> Vec<(String, String)> {
    let mut names: HashMap<u32, String> = HashMap::new();
    let mut values: HashMap<u32, String> = HashMap::new();
    for h in headers.iter() {
        if let Some(c) = ATTRIBUTE_NAME_RE.captures(h) {
            names.insert(c[1].parse().unwrap(), h.clone());
        } else if let Some(c) = ATTRIBUTE_VALUE_RE.captures(h) {
            values.insert(c[1].parse().unwrap(), h.clone());
        }
    }
    let mut indices: Vec<u32> = names.keys().chain(values.keys()).cloned().collect();
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .filter_map(|i| Some((names.get(&i)?.clone(), values.get(&i)?.clone())))
        .collect()
}

fn attribute_signature(row: &Row, columns: &[(String, String)]) -> String {
    columns
        .iter()
        .map(|(_, value_col)| row.get(value_col).trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
}

pub struct Options {
    pub auto_create_missing_parents: bool,
}

fn apply_with_options(headers: &Headers, rows: &[Row], max_issues: usize, options: &Options) -> FixResult {
    let mut sink = IssueSink::new(max_issues);
    let mut result = FixResult::empty();
    let attr_cols = attribute_columns(headers);

    let has_sku = headers.contains("SKU");
    let has_type = headers.contains("Type");
    let has_parent = headers.contains("Parent");

    let mut fixed_rows: Vec<Row> = Vec::with_capacity(rows.len());
    let mut type_fixed = false;
    let mut bool_fixed = false;
    let mut category_fixed = false;

    for (idx, row) in rows.iter().enumerate() {
        let row_index = idx as i64;
        let mut out = row.clone();
        let failure = catch_row_panic(
            row_index,
            std::panic::AssertUnwindSafe(|| {
                if has_type {
                    let raw = row.get("Type").to_string();
                    if !raw.trim().is_empty() {
                        match canonicalize_type(&raw) {
                            Some(t) => {
                                if t != raw {
                                    type_fixed = true;
                                }
                                out.set("Type", t);
                            }
                            None => {
                                // no row index known yet here; filled in below
                            }
                        }
                    }
                }
                for field in ["Published", "In stock?", "Backorders allowed?", "Sold individually?"] {
                    if !headers.contains(field) {
                        continue;
                    }
                    let raw = row.get(field).to_string();
                    if raw.trim().is_empty() {
                        continue;
                    }
                    if let Some(v) = canonicalize_boolean01(&raw) {
                        if v != raw {
                            bool_fixed = true;
                        }
                        out.set(field, v);
                    }
                }
                if headers.contains("Categories") {
                    let raw = row.get("Categories").to_string();
                    let normalized = normalize_categories(&raw);
                    if normalized != raw {
                        category_fixed = true;
                    }
                    out.set("Categories", normalized);
                }
            }),
        );
        let out = match failure {
            Some(issue) => {
                sink.push(issue);
                row.clone()
            }
            None => out,
        };
        fixed_rows.push(out);
    }

    if type_fixed {
        result.push_fix("Canonicalized WooCommerce product type");
    }
    if bool_fixed {
        result.push_fix("Normalized WooCommerce boolean fields");
    }
    if category_fixed {
        result.push_fix("Normalized WooCommerce category hierarchy separators");
    }

    // Per-row validation that does need a row index.
    for (idx, row) in fixed_rows.iter().enumerate() {
        let i = idx as i64;
        let failure = catch_row_panic(
            i,
            std::panic::AssertUnwindSafe(|| {
                if has_type {
                    let raw = row.get("Type").to_string();
                    if !raw.trim().is_empty() && canonicalize_type(&raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "Type",
                            Severity::Error,
                            "woocommerce/invalid_type",
                            format!("`{}` is not a recognized product type.", raw),
                        ));
                    }
                }
                if headers.contains("Regular price") {
                    let regular_raw = row.get("Regular price").to_string();
                    let sale_raw = row.get("Sale price").to_string();
                    let regular = if regular_raw.trim().is_empty() { None } else { parse_money(&regular_raw) };
                    let sale = if sale_raw.trim().is_empty() { None } else { parse_money(&sale_raw) };
                    if !regular_raw.trim().is_empty() && regular.is_none() {
                        sink.push(Issue::new(
                            i,
                            "Regular price",
                            Severity::Error,
                            "woocommerce/invalid_money",
                            format!("`{}` is not a valid money value.", regular_raw),
                        ));
                    }
                    if !sale_raw.trim().is_empty() && sale.is_none() {
                        sink.push(Issue::new(
                            i,
                            "Sale price",
                            Severity::Error,
                            "woocommerce/invalid_money",
                            format!("`{}` is not a valid money value.", sale_raw),
                        ));
                    }
                    if let (Some(r), Some(s)) = (regular, sale) {
                        if s >= r {
                            sink.push(Issue::new(
                                i,
                                "Sale price",
                                Severity::Warning,
                                "woocommerce/sale_price_not_lower",
                                "Sale price is not lower than regular price.",
                            ));
                        }
                    }
                }
            }),
        );
        if let Some(issue) = failure {
            sink.push(issue);
        }
    }

    // --- variation structural pass ---
    if has_type && has_sku && has_parent {
        let sku_to_index: HashMap<String, usize> = fixed_rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.get("SKU").trim().is_empty())
            .map(|(i, r)| (r.get("SKU").trim().to_string(), i))
            .collect();

        let mut synthesized: Vec<Row> = Vec::new();
        let mut by_parent: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, row) in fixed_rows.iter().enumerate() {
            if canonicalize_type(row.get("Type")) != Some("variation") {
                continue;
            }
            let parent_ref = row.get("Parent").trim().to_string();
            if parent_ref.is_empty() {
                sink.push(Issue::new(
                    idx as i64,
                    "Parent",
                    Severity::Error,
                    "woocommerce/variation_missing_parent",
                    "Variation row has no parent reference.",
                ));
                continue;
            }
            if !sku_to_index.contains_key(&parent_ref) {
                if options.auto_create_missing_parents {
                    result.push_fix(format!(
                        "WooCommerce: auto-created parent row for '{}'",
                        parent_ref
                    ));
                    let mut parent_row = Row::new();
                    for h in headers.iter() {
                        parent_row.set(h.clone(), String::new());
                    }
                    parent_row.set("Type", "variable");
                    parent_row.set("SKU", parent_ref.clone());
                    synthesized.push(parent_row);
                } else {
                    sink.push(
                        Issue::new(
                            idx as i64,
                            "Parent",
                            Severity::Error,
                            "woocommerce/variation_orphan",
                            format!("Variation references parent SKU `{}`, which does not exist in this file.", parent_ref),
                        )
                        .with_suggestion("Add the parent row or enable auto-create-missing-parents"),
                    );
                }
            }
            by_parent.entry(parent_ref).or_default().push(idx);
        }

        if !attr_cols.is_empty() {
            for (parent, indices) in &by_parent {
                let mut by_combo: HashMap<String, Vec<usize>> = HashMap::new();
                for &idx in indices {
                    let combo = attribute_signature(&fixed_rows[idx], &attr_cols);
                    by_combo.entry(combo).or_default().push(idx);
                }
                for (_combo, combo_indices) in by_combo {
                    if combo_indices.len() < 2 {
                        continue;
                    }
                    for &idx in &combo_indices {
                        sink.push(
                            Issue::new(
                                idx as i64,
                                "Parent",
                                Severity::Error,
                                "woocommerce/duplicate_attribute_combo",
                                format!("Duplicate attribute combination under parent `{}`.", parent),
                            )
                            .with_details(serde_json::json!({ "rows": combo_indices, "parent": parent })),
                        );
                    }
                }
            }
        }

        fixed_rows.extend(synthesized);
    }

    result.fixed_headers = headers.clone();
    result.fixed_rows = fixed_rows;
    result.issues = sink.finish();
    result
}

pub fn format() -> Format {
    Format {
        id: "woocommerce_products".to_string(),
        name: "WooCommerce Products".to_string(),
        description: "WooCommerce product CSV importer/exporter format (simple + variable)".to_string(),
        category: FormatCategory::Ecommerce,
        source: FormatSource::Builtin,
        apply_fn: Box::new(|h, r, max_issues| {
            apply_with_options(h, r, max_issues, &Options { auto_create_missing_parents: false })
        }),
        expected_headers: Some(vec![
            "Type".to_string(),
            "SKU".to_string(),
            "Name".to_string(),
            "Published".to_string(),
            "Regular price".to_string(),
            "Sale price".to_string(),
            "Categories".to_string(),
            "Parent".to_string(),
        ]),
        example_row: Some(vec![
            "simple".to_string(),
            "WOO-1".to_string(),
            "Sample Product".to_string(),
            "1".to_string(),
            "19.99".to_string(),
            "".to_string(),
            "Widgets > Small".to_string(),
            "".to_string(),
        ]),
    }
}

pub fn format_variable() -> Format {
    Format {
        id: "woocommerce_variable".to_string(),
        name: "WooCommerce Variable Products".to_string(),
        description: "WooCommerce product CSV with automatic parent synthesis for orphaned variations".to_string(),
        category: FormatCategory::Ecommerce,
        source: FormatSource::Builtin,
        apply_fn: Box::new(|h, r, max_issues| {
            apply_with_options(h, r, max_issues, &Options { auto_create_missing_parents: true })
        }),
        expected_headers: None,
        example_row: None,
    }
}
