// eBay Listings/Variations optimizer — File Exchange-style bulk
// listing template, including variation-specific duplicate detection.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::issue::{catch_row_panic, IssueSink};
use crate::model::{Format, FormatCategory, FormatSource, Issue, Row, Severity};
use crate::model::{FixResult, Headers};
use crate::money::{is_http_url, parse_money, parse_nonneg_int};

const ACTIONS: &[&str] = &["Add", "Revise", "Delete", "End"];
const CONDITION_IDS: &[&str] = &[
    "1000", "1500", "1750", "2000", "2010", "2500", "2750", "3000", "4000", "5000", "6000", "7000",
];
const TITLE_MAX: usize = 80;
const MAX_PICTURES: usize = 12;

lazy_static! {
    static ref DURATION_RE: Regex = Regex::new(r"^(GTC|Days_\d+)$").unwrap();
}

fn canonicalize_action(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    ACTIONS.iter().find(|a| a.eq_ignore_ascii_case(trimmed)).copied()
}

fn apply(headers: &Headers, rows: &[Row], max_issues: usize) -> FixResult {
    let mut sink = IssueSink::new(max_issues);
    let mut result = FixResult::empty();

    let mut fixed_rows: Vec<Row> = Vec::with_capacity(rows.len());
    let mut action_fixed = false;
    for (idx, row) in rows.iter().enumerate() {
        let row_index = idx as i64;
        let mut out = row.clone();
        let failure = catch_row_panic(
            row_index,
            std::panic::AssertUnwindSafe(|| {
                if headers.contains("Action") {
                    let raw = row.get("Action").to_string();
                    if let Some(canon) = canonicalize_action(&raw) {
                        if canon != raw {
                            action_fixed = true;
                        }
                        out.set("Action", canon);
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
    if action_fixed {
        result.push_fix("Canonicalized eBay Action casing");
    }

    for (idx, row) in fixed_rows.iter().enumerate() {
        let i = idx as i64;
        let failure = catch_row_panic(
            i,
            std::panic::AssertUnwindSafe(|| {
                if headers.contains("Action") {
                    let raw = row.get("Action").trim();
                    if !raw.is_empty() && canonicalize_action(raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "Action",
                            Severity::Error,
                            "ebay/invalid_action",
                            format!("`{}` is not one of {:?}.", raw, ACTIONS),
                        ));
                    }
                }
                if headers.contains("Title") {
                    let raw = row.get("Title");
                    if raw.chars().count() > TITLE_MAX {
                        sink.push(Issue::new(
                            i,
                            "Title",
                            Severity::Error,
                            "ebay/title_too_long",
                            format!("Title exceeds the {}-character limit.", TITLE_MAX),
                        ));
                    }
                }
                if headers.contains("StartPrice") {
                    let raw = row.get("StartPrice").to_string();
                    if !raw.trim().is_empty() && parse_money(&raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "StartPrice",
                            Severity::Error,
                            "ebay/invalid_money",
                            format!("`{}` is not a valid money value.", raw),
                        ));
                    }
                }
                if headers.contains("Quantity") {
                    let raw = row.get("Quantity").to_string();
                    if !raw.trim().is_empty() && parse_nonneg_int(&raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "Quantity",
                            Severity::Error,
                            "ebay/invalid_quantity",
                            format!("`{}` is not a non-negative integer.", raw),
                        ));
                    }
                }
                if headers.contains("ConditionID") {
                    let raw = row.get("ConditionID").trim();
                    if !raw.is_empty() && !CONDITION_IDS.contains(&raw) {
                        sink.push(Issue::new(
                            i,
                            "ConditionID",
                            Severity::Error,
                            "ebay/invalid_condition_id",
                            format!("`{}` is not one of {:?}.", raw, CONDITION_IDS),
                        ));
                    }
                }
                if headers.contains("Duration") {
                    let raw = row.get("Duration").trim();
                    if !raw.is_empty() && !DURATION_RE.is_match(raw) {
                        sink.push(Issue::new(
                            i,
                            "Duration",
                            Severity::Error,
                            "ebay/invalid_duration",
                            format!("`{}` must match GTC or Days_<n>.", raw),
                        ));
                    }
                }
                if headers.contains("PictureURL") {
                    let raw = row.get("PictureURL").to_string();
                    if !raw.trim().is_empty() {
                        let urls: Vec<&str> = raw.split('|').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
                        if urls.len() > MAX_PICTURES {
                            sink.push(Issue::new(
                                i,
                                "PictureURL",
                                Severity::Error,
                                "ebay/too_many_pictures",
                                format!("{} pictures exceeds the {}-picture limit.", urls.len(), MAX_PICTURES),
                            ));
                        }
                        for url in &urls {
                            if !is_http_url(url) {
                                sink.push(Issue::new(
                                    i,
                                    "PictureURL",
                                    Severity::Warning,
                                    "ebay/invalid_picture_url",
                                    format!("`{}` is not a valid http(s) URL.", url),
                                ));
                            }
                        }
                    }
                }
                let has_name = headers.contains("VariationSpecificsName");
                let has_value = headers.contains("VariationSpecificsValue");
                if has_name && has_value {
                    let name_empty = row.get("VariationSpecificsName").trim().is_empty();
                    let value_empty = row.get("VariationSpecificsValue").trim().is_empty();
                    if name_empty != value_empty {
                        sink.push(Issue::new(
                            i,
                            "VariationSpecificsName",
                            Severity::Error,
                            "ebay/variation_specifics_mismatch",
                            "VariationSpecificsName and VariationSpecificsValue must both be present or both empty.",
                        ));
                    }
                }
            }),
        );
        if let Some(issue) = failure {
            sink.push(issue);
        }
    }

    if headers.contains("CustomLabel") && headers.contains("VariationSpecificsValue") {
        let mut by_label: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in fixed_rows.iter().enumerate() {
            let label = row.get("CustomLabel").trim().to_string();
            if !label.is_empty() {
                by_label.entry(label).or_default().push(i);
            }
        }
        for (label, indices) in by_label {
            let mut by_combo: HashMap<String, Vec<usize>> = HashMap::new();
            for &i in &indices {
                let combo = fixed_rows[i].get("VariationSpecificsValue").trim().to_lowercase();
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
                            "VariationSpecificsValue",
                            Severity::Error,
                            "ebay/duplicate_variation_combo",
                            format!("Duplicate variation combination under CustomLabel `{}`.", label),
                        )
                        .with_details(serde_json::json!({ "rows": combo_indices })),
                    );
                }
            }
        }
    }

    result.fixed_headers = headers.clone();
    result.fixed_rows = fixed_rows;
    result.issues = sink.finish();
    result
}

pub fn format() -> Format {
    Format {
        id: "ebay_listings".to_string(),
        name: "eBay Listings & Variations".to_string(),
        description: "eBay File Exchange bulk listing template, including variations".to_string(),
        category: FormatCategory::Ecommerce,
        source: FormatSource::Builtin,
        apply_fn: Box::new(apply),
        expected_headers: Some(vec![
            "Action".to_string(),
            "CustomLabel".to_string(),
            "Title".to_string(),
            "ConditionID".to_string(),
            "StartPrice".to_string(),
            "Quantity".to_string(),
            "Duration".to_string(),
            "PictureURL".to_string(),
        ]),
        example_row: Some(vec![
            "Add".to_string(),
            "SAMPLE-001".to_string(),
            "Sample Listing".to_string(),
            "1000".to_string(),
            "19.99".to_string(),
            "5".to_string(),
            "GTC".to_string(),
            "https://example.com/image.jpg".to_string(),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Headers {
        Headers::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn title_too_long_is_an_error() {
        let h = headers(&["Title"]);
        let rows = vec![row(&[("Title", &"x".repeat(81))])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "ebay/title_too_long"));
    }

    #[test]
    fn too_many_pictures_is_an_error() {
        let h = headers(&["PictureURL"]);
        let urls = (0..13).map(|i| format!("https://example.com/{}.jpg", i)).collect::<Vec<_>>().join("|");
        let rows = vec![row(&[("PictureURL", &urls)])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "ebay/too_many_pictures"));
    }

    #[test]
    fn duplicate_variation_combo_is_an_error() {
        let h = headers(&["CustomLabel", "VariationSpecificsName", "VariationSpecificsValue"]);
        let rows = vec![
            row(&[("CustomLabel", "L1"), ("VariationSpecificsName", "Color"), ("VariationSpecificsValue", "Red")]),
            row(&[("CustomLabel", "L1"), ("VariationSpecificsName", "Color"), ("VariationSpecificsValue", "red")]),
        ];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert_eq!(result.issues.iter().filter(|i| i.code == "ebay/duplicate_variation_combo").count(), 2);
    }

    #[test]
    fn variation_specifics_must_both_be_present_or_absent() {
        let h = headers(&["VariationSpecificsName", "VariationSpecificsValue"]);
        let rows = vec![row(&[("VariationSpecificsName", "Color"), ("VariationSpecificsValue", "")])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "ebay/variation_specifics_mismatch"));
    }
}
