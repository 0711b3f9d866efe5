// Shopify Products optimizer — strict schema validation and safe fixes.
//
// The hardest part of the whole engine: handle grouping, variant combo
// collision detection, and image-position coherence all key off the
// same resolved header set, so this module builds that resolution once
// per run and threads it through every cross-row pass.

use std::collections::HashMap;

use crate::issue::{catch_row_panic, IssueSink};
use crate::model::{Format, FormatCategory, FormatSource, Issue, Row, Severity};
use crate::model::{FixResult, Headers};
use crate::money::{format_money, is_http_url, parse_money, parse_nonneg_int, weight_to_grams};
use crate::variant_resolver::{has_variant_signal, resolve_option_columns, variant_signature, OptionColumns};

/// The Shopify official product-export template header order.
/// The trailing Google Shopping block's exact field list is resolved
/// per DESIGN.md Open Question 1 to this concrete set.
pub const OFFICIAL_HEADERS: &[&str] = &[
    "Title",
    "URL handle",
    "Description",
    "Vendor",
    "Product category",
    "Type",
    "Tags",
    "Published on online store",
    "Status",
    "SKU",
    "Barcode",
    "Option1 name",
    "Option1 value",
    "Option1 Linked To",
    "Option2 name",
    "Option2 value",
    "Option2 Linked To",
    "Option3 name",
    "Option3 value",
    "Option3 Linked To",
    "Price",
    "Compare-at price",
    "Cost per item",
    "Charge tax",
    "Tax code",
    "Unit price total measure",
    "Unit price total measure unit",
    "Unit price base measure",
    "Unit price base measure unit",
    "Inventory tracker",
    "Inventory quantity",
    "Continue selling when out of stock",
    "Weight value (grams)",
    "Weight unit for display",
    "Requires shipping",
    "Fulfillment service",
    "Product image URL",
    "Image position",
    "Image alt text",
    "Variant image URL",
    "Gift card",
    "SEO title",
    "SEO description",
    "Google Shopping / Google Product Category",
    "Google Shopping / Gender",
    "Google Shopping / Age Group",
    "Google Shopping / MPN",
    "Google Shopping / Condition",
    "Google Shopping / Custom Product",
];

pub(crate) const BOOLEAN_FIELDS: &[&str] = &[
    "Published on online store",
    "Requires shipping",
    "Continue selling when out of stock",
    "Charge tax",
    "Gift card",
];

const MONEY_FIELDS: &[&str] = &["Price", "Compare-at price", "Cost per item"];

/// `(synonym, canonical)` pairs, matched case-insensitively after
/// trimming. Earlier entries win if a header matches more than one
/// synonym (it won't in practice; the canonical name itself is always
/// checked first).
fn synonyms() -> Vec<(&'static str, &'static str)> {
    vec![
        ("handle", "URL handle"),
        ("body (html)", "Description"),
        ("body html", "Description"),
        ("variant sku", "SKU"),
        ("option1 name", "Option1 name"),
        ("option1value", "Option1 value"),
        ("option 1 name", "Option1 name"),
        ("option 1 value", "Option1 value"),
        ("option2 name", "Option2 name"),
        ("option 2 name", "Option2 name"),
        ("option 2 value", "Option2 value"),
        ("option3 name", "Option3 name"),
        ("option 3 name", "Option3 name"),
        ("option 3 value", "Option3 value"),
        ("variant price", "Price"),
        ("variant compare at price", "Compare-at price"),
        ("variant inventory qty", "Inventory quantity"),
        ("inventory quantity", "Inventory quantity"),
        ("variant grams", "Weight value (grams)"),
        // "Variant Weight" is handled separately in `apply` (it needs a
        // unit conversion, not a plain rename); its unit sibling still
        // passes through directly as the display unit.
        ("variant weight unit", "Weight unit for display"),
        ("variant requires shipping", "Requires shipping"),
        ("variant taxable", "Charge tax"),
        ("variant fulfillment service", "Fulfillment service"),
        ("image src", "Product image URL"),
        ("product image", "Product image URL"),
        ("image position", "Image position"),
        ("image alt text", "Image alt text"),
        ("variant image", "Variant image URL"),
        ("published", "Published on online store"),
        ("seo title", "SEO title"),
        ("seo description", "SEO description"),
        ("product category", "Product category"),
        ("cost per item", "Cost per item"),
        ("tax code", "Tax code"),
        ("gift card", "Gift card"),
        ("vendor", "Vendor"),
        ("type", "Type"),
        ("tags", "Tags"),
        ("status", "Status"),
        ("barcode", "Barcode"),
        ("title", "Title"),
        ("sku", "SKU"),
        ("inventory tracker", "Inventory tracker"),
    ]
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Map each raw input header to a canonical name (synonym resolved) or
/// leave it as-is if it's not a recognized Shopify field at all.
fn canonicalize_headers(headers: &Headers) -> HashMap<String, String> {
    let table = synonyms();
    let mut map = HashMap::new();
    for h in headers.iter() {
        let folded = fold(h);
        let canonical = OFFICIAL_HEADERS
            .iter()
            .find(|c| fold(c) == folded)
            .map(|c| c.to_string())
            .or_else(|| table.iter().find(|(syn, _)| *syn == folded).map(|(_, canon)| canon.to_string()));
        map.insert(h.clone(), canonical.unwrap_or_else(|| h.clone()));
    }
    map
}

fn is_kebab_case(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

struct RowContext {
    canonical: Row,
    unknown: Row,
}

/// Remap a raw input row onto canonical column names; columns that
/// didn't resolve to a known Shopify field are kept under their
/// original header for stable passthrough.
fn remap_row(row: &Row, header_map: &HashMap<String, String>, known: &[&'static str]) -> RowContext {
    let mut canonical = Row::new();
    let mut unknown = Row::new();
    for (raw_header, canonical_header) in header_map {
        let value = row.get(raw_header).to_string();
        if known.contains(&canonical_header.as_str()) {
            canonical.set(canonical_header.clone(), value);
        } else {
            unknown.set(raw_header.clone(), value);
        }
    }
    RowContext { canonical, unknown }
}

pub fn apply(headers: &Headers, rows: &[Row], max_issues: usize) -> FixResult {
    let header_map = canonicalize_headers(headers);
    let header_aliased = header_map.iter().any(|(raw, canon)| raw != canon);

    let remapped: Vec<RowContext> = rows.iter().map(|r| remap_row(r, &header_map, OFFICIAL_HEADERS)).collect();

    let mut sink = IssueSink::new(max_issues);
    let mut result = FixResult::empty();
    if header_aliased {
        result.push_fix("Canonicalized Shopify header names");
    }

    let option_headers = Headers::new(OFFICIAL_HEADERS.iter().map(|s| s.to_string()).collect());
    let option_columns = resolve_option_columns(&option_headers);

    let legacy_weight_header = headers.iter().find(|h| fold(h) == "variant weight").cloned();

    let mut fixed_canonical: Vec<Row> = Vec::with_capacity(remapped.len());

    // --- per-row validation + safe fixes ---
    for (idx, ctx) in remapped.iter().enumerate() {
        let mut row = ctx.canonical.clone();
        let row_index = idx as i64;
        let failure = catch_row_panic(
            row_index,
            std::panic::AssertUnwindSafe(|| {
                if let Some(legacy_header) = &legacy_weight_header {
                    convert_legacy_weight(row_index, legacy_header, &rows[idx], &mut row, &mut sink, &mut result);
                }
                validate_row(row_index, &mut row, &mut sink, &mut result);
            }),
        );
        let row = match failure {
            Some(issue) => {
                sink.push(issue);
                ctx.canonical.clone()
            }
            None => row,
        };
        fixed_canonical.push(row);
    }

    // --- cross-row structural analysis ---
    detect_duplicate_skus(&fixed_canonical, &mut sink);
    detect_variant_combo_collisions(&fixed_canonical, &option_columns, &mut sink);
    detect_inconsistent_product_fields(&fixed_canonical, &mut sink);
    detect_image_position_issues(&fixed_canonical, &mut sink);

    // --- assemble unknown columns, stable input order ---
    let mut unknown_order: Vec<String> = Vec::new();
    for h in headers.iter() {
        let canon = &header_map[h];
        if !OFFICIAL_HEADERS.contains(&canon.as_str()) && !unknown_order.contains(h) {
            unknown_order.push(h.clone());
        }
    }

    let mut fixed_headers: Vec<String> = OFFICIAL_HEADERS.iter().map(|s| s.to_string()).collect();
    fixed_headers.extend(unknown_order.iter().cloned());

    let fixed_rows: Vec<Row> = fixed_canonical
        .iter()
        .zip(remapped.iter())
        .map(|(canon_row, ctx)| {
            let mut out = Row::new();
            for h in &fixed_headers {
                if OFFICIAL_HEADERS.contains(&h.as_str()) {
                    out.set(h.clone(), canon_row.get(h).to_string());
                } else {
                    out.set(h.clone(), ctx.unknown.get(h).to_string());
                }
            }
            out
        })
        .collect();

    result.fixed_headers = Headers::new(fixed_headers);
    result.fixed_rows = fixed_rows;
    result.issues = sink.finish();
    result
}

/// Final Shopify post-enforcement step (run by [`crate::engine::Engine`]
/// after universal cleanup, not by [`apply`] itself): lowercase the
/// boolean fields `validate_row` already normalized to `TRUE`/`FALSE`
/// down to `true`/`false` for Shopify's official output casing.
pub(crate) fn lowercase_booleans_for_output(result: &mut FixResult) {
    let mut changed = false;
    for row in result.fixed_rows.iter_mut() {
        for field in BOOLEAN_FIELDS {
            let v = row.get(field);
            if v == "TRUE" || v == "FALSE" {
                row.set(*field, v.to_lowercase());
                changed = true;
            }
        }
    }
    if changed {
        result.push_fix("Lowercased Shopify boolean fields for final output");
    }
}

/// Convert a legacy `Variant Weight` + `Variant Weight Unit` pair into
/// the canonical `Weight value (grams)` field. The
/// display-unit field is already carried over as a plain synonym
/// rename; only the gram value needs an actual conversion.
fn convert_legacy_weight(
    row_index: i64,
    legacy_header: &str,
    raw_row: &Row,
    canonical: &mut Row,
    sink: &mut IssueSink,
    result: &mut FixResult,
) {
    let raw_value = raw_row.get(legacy_header).trim().to_string();
    if raw_value.is_empty() {
        return;
    }
    let unit = canonical.get("Weight unit for display").trim().to_string();
    let unit = if unit.is_empty() { "g".to_string() } else { unit };
    match weight_to_grams(&raw_value, &unit) {
        Some(grams) => {
            canonical.set("Weight value (grams)", format!("{:.3}", grams));
            result.push_fix("Converted legacy Shopify weight fields to grams");
        }
        None => sink.push(Issue::new(
            row_index,
            "Weight value (grams)",
            Severity::Error,
            "shopify/invalid_weight",
            format!("Could not convert `{}` ({}) to grams.", raw_value, unit),
        )),
    }
}

fn validate_row(row_index: i64, row: &mut Row, sink: &mut IssueSink, result: &mut FixResult) {
    let mut booleans_fixed = false;
    for field in BOOLEAN_FIELDS {
        let raw = row.get(field).to_string();
        if raw.trim().is_empty() {
            continue;
        }
        match crate::normalizer::normalize_boolean(&raw) {
            Some(v) => {
                if v != raw {
                    booleans_fixed = true;
                }
                row.set(*field, v);
            }
            None => {
                sink.push(
                    Issue::new(
                        row_index,
                        *field,
                        Severity::Warning,
                        "shopify/unrecognized_boolean",
                        format!("Unrecognized value `{}` for {}; expected true/false.", raw, field),
                    )
                    .with_suggestion("Use TRUE or FALSE"),
                );
            }
        }
    }
    if booleans_fixed {
        result.push_fix("Normalized Shopify boolean fields");
    }

    let mut money_fixed = false;
    for field in MONEY_FIELDS {
        let raw = row.get(field).to_string();
        if raw.trim().is_empty() {
            continue;
        }
        match parse_money(&raw) {
            Some(n) => {
                let formatted = format_money(n);
                if formatted != raw {
                    money_fixed = true;
                }
                row.set(*field, formatted);
            }
            None => {
                sink.push(Issue::new(
                    row_index,
                    *field,
                    Severity::Error,
                    "shopify/invalid_money",
                    format!("`{}` in {} is not a valid money value.", raw, field),
                ));
            }
        }
    }
    if money_fixed {
        result.push_fix("Reformatted Shopify money fields");
    }

    let qty_raw = row.get("Inventory quantity").to_string();
    if !qty_raw.trim().is_empty() {
        match parse_nonneg_int(&qty_raw) {
            Some(n) => row.set("Inventory quantity", n.to_string()),
            None => sink.push(Issue::new(
                row_index,
                "Inventory quantity",
                Severity::Error,
                "shopify/invalid_inventory_quantity",
                format!("`{}` is not a non-negative integer.", qty_raw),
            )),
        }
    }

    let handle_raw = row.get("URL handle").to_string();
    if !handle_raw.trim().is_empty() && !is_kebab_case(&handle_raw) {
        sink.push(
            Issue::new(
                row_index,
                "URL handle",
                Severity::Warning,
                "shopify/non_kebab_handle",
                format!("`{}` is not kebab-case (lowercase letters, digits, hyphens).", handle_raw),
            )
            .with_suggestion("Use lowercase letters, digits and hyphens only"),
        );
    }

    for field in ["Product image URL", "Variant image URL"] {
        let raw = row.get(field).to_string();
        if !raw.trim().is_empty() && !is_http_url(&raw) {
            sink.push(Issue::new(
                row_index,
                field,
                Severity::Warning,
                "shopify/invalid_image_url",
                format!("`{}` in {} is not a valid http(s) URL.", raw, field),
            ));
        }
    }
}

fn detect_duplicate_skus(rows: &[Row], sink: &mut IssueSink) {
    let mut by_sku: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        let sku = row.get("SKU").trim().to_string();
        if sku.is_empty() {
            continue;
        }
        by_sku.entry(sku).or_default().push(i);
    }
    for (sku, indices) in by_sku {
        if indices.len() < 2 {
            continue;
        }
        let handles: std::collections::HashSet<String> =
            indices.iter().map(|&i| rows[i].get("URL handle").trim().to_string()).collect();
        let (code, message) = if handles.len() > 1 {
            (
                "shopify/duplicate_sku_cross_handle",
                format!("SKU `{}` is reused across {} different product handles.", sku, handles.len()),
            )
        } else {
            (
                "shopify/duplicate_sku",
                format!("SKU `{}` appears in {} rows.", sku, indices.len()),
            )
        };
        for &i in &indices {
            sink.push(
                Issue::new(i as i64, "SKU", Severity::Warning, code, message.clone()).with_details(
                    serde_json::json!({ "rows": indices, "sku": sku }),
                ),
            );
        }
    }
}

fn detect_variant_combo_collisions(rows: &[Row], columns: &OptionColumns, sink: &mut IssueSink) {
    let mut by_handle: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        by_handle.entry(row.get("URL handle").trim().to_string()).or_default().push(i);
    }
    for (_handle, indices) in by_handle {
        let mut by_combo: HashMap<String, Vec<usize>> = HashMap::new();
        for &i in &indices {
            let row = &rows[i];
            if !has_variant_signal(columns, row, "SKU", "Price") {
                continue;
            }
            let combo = variant_signature(columns, row);
            by_combo.entry(combo).or_default().push(i);
        }
        for (_combo, combo_indices) in by_combo {
            if combo_indices.len() < 2 {
                continue;
            }
            for &i in &combo_indices {
                sink.push(
                    Issue::new(
                        i as i64,
                        "Option1 value",
                        Severity::Error,
                        "shopify/duplicate_variant_combo",
                        "Multiple variants in this product share the same option combination.",
                    )
                    .with_details(serde_json::json!({ "rows": combo_indices })),
                );
            }
        }
    }
}

const PRODUCT_LEVEL_FIELDS: &[&str] = &["Title", "Vendor", "Type", "Tags", "Status", "Description"];

fn detect_inconsistent_product_fields(rows: &[Row], sink: &mut IssueSink) {
    let mut by_handle: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        let handle = row.get("URL handle").trim().to_string();
        if handle.is_empty() {
            continue;
        }
        by_handle.entry(handle).or_default().push(i);
    }
    for (handle, indices) in by_handle {
        if indices.len() < 2 {
            continue;
        }
        for field in PRODUCT_LEVEL_FIELDS {
            let mut values: std::collections::HashSet<String> = std::collections::HashSet::new();
            for &i in &indices {
                values.insert(rows[i].get(field).to_string());
            }
            if values.len() > 1 {
                for &i in &indices {
                    sink.push(
                        Issue::new(
                            i as i64,
                            *field,
                            Severity::Warning,
                            "shopify/inconsistent_product_field",
                            format!("`{}` varies across rows sharing handle `{}`.", field, handle),
                        )
                        .with_details(serde_json::json!({ "rows": indices, "handle": handle })),
                    );
                }
            }
        }
    }
}

fn detect_image_position_issues(rows: &[Row], sink: &mut IssueSink) {
    let mut by_handle: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        by_handle.entry(row.get("URL handle").trim().to_string()).or_default().push(i);
    }
    for (_handle, indices) in by_handle {
        let mut positions: Vec<(usize, i64)> = Vec::new();
        for &i in &indices {
            let raw = rows[i].get("Image position").trim();
            if raw.is_empty() {
                continue;
            }
            if let Some(n) = parse_nonneg_int(raw) {
                if n > 0 {
                    positions.push((i, n));
                }
            }
        }
        if positions.is_empty() {
            continue;
        }
        let mut seen: HashMap<i64, usize> = HashMap::new();
        for &(i, pos) in &positions {
            if let Some(&_first) = seen.get(&pos) {
                sink.push(Issue::new(
                    i as i64,
                    "Image position",
                    Severity::Info,
                    "shopify/duplicate_image_position",
                    format!("Image position {} is used more than once for this product.", pos),
                ));
            } else {
                seen.insert(pos, i);
            }
        }
        let mut sorted: Vec<i64> = positions.iter().map(|(_, p)| *p).collect();
        sorted.sort_unstable();
        sorted.dedup();
        for window in sorted.windows(2) {
            if window[1] - window[0] > 1 {
                sink.push(Issue::file_level(
                    Severity::Info,
                    "shopify/image_position_gap",
                    format!("Image positions jump from {} to {} for a product.", window[0], window[1]),
                ));
            }
        }
    }
}

pub fn format() -> Format {
    Format {
        id: "shopify_products".to_string(),
        name: "Shopify Products".to_string(),
        description: "Shopify Products CSV (official export/import template)".to_string(),
        category: FormatCategory::Ecommerce,
        source: FormatSource::Builtin,
        apply_fn: Box::new(apply),
        expected_headers: Some(OFFICIAL_HEADERS.iter().map(|s| s.to_string()).collect()),
        example_row: Some(vec![
            "Sample Product".to_string(),
            "sample-product".to_string(),
            "A great sample product.".to_string(),
            "Acme".to_string(),
            "".to_string(),
            "Widgets".to_string(),
            "sample, demo".to_string(),
            "true".to_string(),
            "active".to_string(),
            "SAMPLE-001".to_string(),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;

    fn headers(names: &[&str]) -> Headers {
        Headers::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn canonicalizes_legacy_synonyms_and_enforces_template_order() {
        let h = headers(&["Handle", "Title", "Variant SKU", "Variant Price"]);
        let rows = vec![row(&[
            ("Handle", "red-shirt"),
            ("Title", "Red Shirt"),
            ("Variant SKU", "RS-1"),
            ("Variant Price", "19.99"),
        ])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert_eq!(result.fixed_headers.0, OFFICIAL_HEADERS.to_vec());
        assert_eq!(result.fixed_rows[0].get("SKU"), "RS-1");
        assert_eq!(result.fixed_rows[0].get("Price"), "19.99");
        assert!(result.fixes_applied.iter().any(|f| f.contains("Canonicalized")));
    }

    #[test]
    fn legacy_weight_and_unit_convert_to_grams() {
        let h = headers(&["Variant Weight", "Variant Weight Unit"]);
        let rows = vec![row(&[("Variant Weight", "2"), ("Variant Weight Unit", "lb")])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert_eq!(result.fixed_rows[0].get("Weight value (grams)"), "907.185");
        assert!(result.fixes_applied.iter().any(|f| f.contains("Converted legacy")));
        assert!(!result.issues.iter().any(|i| i.code == "shopify/invalid_weight"));
    }

    #[test]
    fn unconvertible_legacy_weight_is_an_error() {
        let h = headers(&["Variant Weight", "Variant Weight Unit"]);
        let rows = vec![row(&[("Variant Weight", "heavy"), ("Variant Weight Unit", "lb")])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "shopify/invalid_weight"));
    }

    #[test]
    fn duplicate_sku_across_handles_is_cross_handle_warning() {
        let h = headers(&["URL handle", "SKU"]);
        let rows = vec![
            row(&[("URL handle", "a"), ("SKU", "AAA-1")]),
            row(&[("URL handle", "b"), ("SKU", "AAA-1")]),
        ];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        let dup: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.code == "shopify/duplicate_sku_cross_handle")
            .collect();
        assert_eq!(dup.len(), 2);
        assert!(dup.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn variant_combo_collision_is_an_error() {
        let h = headers(&["URL handle", "Option1 value", "Option2 value", "SKU"]);
        let rows = vec![
            row(&[("URL handle", "red-shirt"), ("Option1 value", "Red"), ("Option2 value", "M"), ("SKU", "A")]),
            row(&[("URL handle", "red-shirt"), ("Option1 value", "red"), ("Option2 value", "m"), ("SKU", "B")]),
        ];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        let collisions: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.code == "shopify/duplicate_variant_combo")
            .collect();
        assert_eq!(collisions.len(), 2);
        assert!(collisions.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn image_only_rows_are_exempt_from_combo_check() {
        let h = headers(&["URL handle", "Option1 value", "SKU", "Price", "Product image URL"]);
        let rows = vec![
            row(&[("URL handle", "x"), ("Option1 value", ""), ("SKU", ""), ("Price", ""), ("Product image URL", "https://a")]),
            row(&[("URL handle", "x"), ("Option1 value", ""), ("SKU", ""), ("Price", ""), ("Product image URL", "https://b")]),
        ];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(!result.issues.iter().any(|i| i.code == "shopify/duplicate_variant_combo"));
    }

    #[test]
    fn invalid_money_is_an_error_and_unparsable_cells_are_not_rewritten() {
        let h = headers(&["Price"]);
        let rows = vec![row(&[("Price", "free")])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "shopify/invalid_money"));
        assert_eq!(result.fixed_rows[0].get("Price"), "free");
    }

    #[test]
    fn lowercase_booleans_for_output_only_touches_recognized_casing() {
        let h = headers(&["Published on online store", "Gift card"]);
        let rows = vec![row(&[("Published on online store", "TRUE"), ("Gift card", "FALSE")])];
        let mut result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        lowercase_booleans_for_output(&mut result);
        assert_eq!(result.fixed_rows[0].get("Published on online store"), "true");
        assert_eq!(result.fixed_rows[0].get("Gift card"), "false");
        assert!(result.fixes_applied.iter().any(|f| f.contains("Lowercased")));
    }

    #[test]
    fn inconsistent_product_field_across_handle_group() {
        let h = headers(&["URL handle", "Vendor"]);
        let rows = vec![
            row(&[("URL handle", "p"), ("Vendor", "Acme")]),
            row(&[("URL handle", "p"), ("Vendor", "Other")]),
        ];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "shopify/inconsistent_product_field"));
    }
}
