// Amazon Inventory Loader optimizer — enum/length/price validation for
// the flat-file inventory loader feed template.

use std::collections::HashMap;

use crate::issue::{catch_row_panic, IssueSink};
use crate::model::{Format, FormatCategory, FormatSource, Issue, Row, Severity};
use crate::model::{FixResult, Headers};
use crate::money::{parse_money, parse_nonneg_int};

const PRODUCT_ID_TYPES: &[&str] = &["ASIN", "UPC", "EAN", "ISBN", "JAN", "GCID"];
const ITEM_CONDITIONS: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8", "10", "11"];
const FULFILLMENT_CHANNELS: &[&str] = &["DEFAULT", "AMAZON_NA", "AMAZON_EU", "AMAZON_FE"];

const SKU_MAX: usize = 40;
const ITEM_NAME_MAX: usize = 500;
const DESCRIPTION_MAX: usize = 2000;
const BRAND_MAX: usize = 50;

fn apply(headers: &Headers, rows: &[Row], max_issues: usize) -> FixResult {
    let mut sink = IssueSink::new(max_issues);
    let mut result = FixResult::empty();

    let mut fixed_rows: Vec<Row> = Vec::with_capacity(rows.len());
    let mut enum_fixed = false;

    for (idx, row) in rows.iter().enumerate() {
        let row_index = idx as i64;
        let mut out = row.clone();
        let failure = catch_row_panic(
            row_index,
            std::panic::AssertUnwindSafe(|| {
                if headers.contains("product-id-type") {
                    let raw = row.get("product-id-type").to_string();
                    let upper = raw.trim().to_uppercase();
                    if PRODUCT_ID_TYPES.contains(&upper.as_str()) && upper != raw {
                        enum_fixed = true;
                        out.set("product-id-type", upper);
                    }
                }
                if headers.contains("add-delete") {
                    let raw = row.get("add-delete").to_string();
                    let lower = raw.trim().to_lowercase();
                    if (lower == "a" || lower == "d") && lower != raw {
                        enum_fixed = true;
                        out.set("add-delete", lower);
                    }
                }
                if headers.contains("fulfillment-channel") {
                    let raw = row.get("fulfillment-channel").to_string();
                    let upper = raw.trim().to_uppercase();
                    if FULFILLMENT_CHANNELS.contains(&upper.as_str()) && upper != raw {
                        enum_fixed = true;
                        out.set("fulfillment-channel", upper);
                    }
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
    if enum_fixed {
        result.push_fix("Normalized Amazon enum field casing");
    }

    for (idx, row) in fixed_rows.iter().enumerate() {
        let i = idx as i64;
        let failure = catch_row_panic(
            i,
            std::panic::AssertUnwindSafe(|| {
                if headers.contains("product-id-type") {
                    let raw = row.get("product-id-type").trim().to_uppercase();
                    if !raw.is_empty() && !PRODUCT_ID_TYPES.contains(&raw.as_str()) {
                        sink.push(Issue::new(
                            i,
                            "product-id-type",
                            Severity::Error,
                            "amazon/invalid_product_id_type",
                            format!("`{}` is not one of {:?}.", raw, PRODUCT_ID_TYPES),
                        ));
                    }
                }
                if headers.contains("item-condition") {
                    let raw = row.get("item-condition").trim();
                    if !raw.is_empty() && !ITEM_CONDITIONS.contains(&raw) {
                        sink.push(Issue::new(
                            i,
                            "item-condition",
                            Severity::Error,
                            "amazon/invalid_item_condition",
                            format!("`{}` is not one of {:?}.", raw, ITEM_CONDITIONS),
                        ));
                    }
                }
                if headers.contains("add-delete") {
                    let raw = row.get("add-delete").trim().to_lowercase();
                    if !raw.is_empty() && raw != "a" && raw != "d" {
                        sink.push(Issue::new(
                            i,
                            "add-delete",
                            Severity::Error,
                            "amazon/invalid_add_delete",
                            format!("`{}` must be 'a' or 'd'.", raw),
                        ));
                    }
                }
                if headers.contains("fulfillment-channel") {
                    let raw = row.get("fulfillment-channel").trim().to_uppercase();
                    if !raw.is_empty() && !FULFILLMENT_CHANNELS.contains(&raw.as_str()) {
                        sink.push(Issue::new(
                            i,
                            "fulfillment-channel",
                            Severity::Error,
                            "amazon/invalid_fulfillment_channel",
                            format!("`{}` is not one of {:?}.", raw, FULFILLMENT_CHANNELS),
                        ));
                    }
                }

                check_length(&mut sink, i, row, "sku", SKU_MAX, Severity::Error);
                check_length(&mut sink, i, row, "item-name", ITEM_NAME_MAX, Severity::Warning);
                check_length(&mut sink, i, row, "item-description", DESCRIPTION_MAX, Severity::Warning);
                check_length(&mut sink, i, row, "brand-name", BRAND_MAX, Severity::Warning);

                if headers.contains("price") {
                    let raw = row.get("price").to_string();
                    if !raw.trim().is_empty() && parse_money(&raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "price",
                            Severity::Error,
                            "amazon/invalid_money",
                            format!("`{}` is not a valid money value.", raw),
                        ));
                    }
                }
                if headers.contains("quantity") {
                    let raw = row.get("quantity").to_string();
                    if !raw.trim().is_empty() && parse_nonneg_int(&raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "quantity",
                            Severity::Error,
                            "amazon/invalid_quantity",
                            format!("`{}` is not a non-negative integer.", raw),
                        ));
                    }
                }
                for field in ["will-ship-internationally", "expedited-shipping"] {
                    if !headers.contains(field) {
                        continue;
                    }
                    let raw = row.get(field).trim().to_lowercase();
                    if !raw.is_empty() && raw != "y" && raw != "n" {
                        sink.push(Issue::new(
                            idx as i64,
                            field,
                            Severity::Warning,
                            "amazon/invalid_boolean",
                            format!("`{}` in {} must be 'y', 'n', or empty.", raw, field),
                        ));
                    }
                }
            }),
        );
        if let Some(issue) = failure {
            sink.push(issue);
        }
    }

    if headers.contains("sku") {
        let mut by_sku: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in fixed_rows.iter().enumerate() {
            let sku = row.get("sku").trim().to_string();
            if !sku.is_empty() {
                by_sku.entry(sku).or_default().push(i);
            }
        }
        for (sku, indices) in by_sku {
            if indices.len() < 2 {
                continue;
            }
            for &i in &indices {
                sink.push(
                    Issue::new(
                        i as i64,
                        "sku",
                        Severity::Warning,
                        "amazon/duplicate_sku",
                        format!("SKU `{}` appears in {} rows.", sku, indices.len()),
                    )
                    .with_details(serde_json::json!({ "rows": indices })),
                );
            }
        }
    }

    result.fixed_headers = headers.clone();
    result.fixed_rows = fixed_rows;
    result.issues = sink.finish();
    result
}

fn check_length(sink: &mut IssueSink, row_index: i64, row: &Row, field: &str, max: usize, severity: Severity) {
    let raw = row.get(field);
    if raw.chars().count() > max {
        sink.push(
            Issue::new(
                row_index,
                field,
                severity,
                format!("amazon/{}_too_long", field.replace('-', "_")),
                format!("{} exceeds the {}-character limit.", field, max),
            )
            .with_details(serde_json::json!({ "length": raw.chars().count(), "max": max })),
        );
    }
}

pub fn format() -> Format {
    Format {
        id: "amazon_inventory_loader".to_string(),
        name: "Amazon Inventory Loader".to_string(),
        description: "Amazon Seller Central inventory loader flat file".to_string(),
        category: FormatCategory::Ecommerce,
        source: FormatSource::Builtin,
        apply_fn: Box::new(apply),
        expected_headers: Some(vec![
            "sku".to_string(),
            "product-id".to_string(),
            "product-id-type".to_string(),
            "item-name".to_string(),
            "item-description".to_string(),
            "brand-name".to_string(),
            "item-condition".to_string(),
            "price".to_string(),
            "quantity".to_string(),
            "add-delete".to_string(),
            "fulfillment-channel".to_string(),
        ]),
        example_row: Some(vec![
            "SKU-001".to_string(),
            "123456789012".to_string(),
            "UPC".to_string(),
            "Sample Item".to_string(),
            "A great sample item.".to_string(),
            "Acme".to_string(),
            "11".to_string(),
            "19.99".to_string(),
            "10".to_string(),
            "a".to_string(),
            "DEFAULT".to_string(),
        ]),
    }
}
