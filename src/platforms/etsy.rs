// Etsy Listings optimizer — bulk listing CSV template validation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::issue::{catch_row_panic, IssueSink};
use crate::model::{Format, FormatCategory, FormatSource, Issue, Row, Severity};
use crate::model::{FixResult, Headers};
use crate::money::{is_http_url, parse_money, parse_nonneg_int};

const TITLE_MAX: usize = 140;
const TAGS_MAX: usize = 13;
const TAG_LEN_MAX: usize = 20;

lazy_static! {
    static ref CURRENCY_RE: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
}

fn apply(headers: &Headers, rows: &[Row], max_issues: usize) -> FixResult {
    let mut sink = IssueSink::new(max_issues);
    let mut result = FixResult::empty();

    let mut fixed_rows: Vec<Row> = Vec::with_capacity(rows.len());
    let mut currency_fixed = false;
    for (idx, row) in rows.iter().enumerate() {
        let row_index = idx as i64;
        let mut out = row.clone();
        let failure = catch_row_panic(
            row_index,
            std::panic::AssertUnwindSafe(|| {
                if headers.contains("Currency") {
                    let raw = row.get("Currency").to_string();
                    let upper = raw.trim().to_uppercase();
                    if CURRENCY_RE.is_match(&upper) && upper != raw {
                        currency_fixed = true;
                        out.set("Currency", upper);
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
    if currency_fixed {
        result.push_fix("Normalized Etsy currency code casing");
    }

    for (idx, row) in fixed_rows.iter().enumerate() {
        let i = idx as i64;
        let failure = catch_row_panic(
            i,
            std::panic::AssertUnwindSafe(|| {
                if headers.contains("Title") {
                    let raw = row.get("Title");
                    if raw.chars().count() > TITLE_MAX {
                        sink.push(Issue::new(
                            i,
                            "Title",
                            Severity::Warning,
                            "etsy/title_too_long",
                            format!("Title exceeds the {}-character limit.", TITLE_MAX),
                        ));
                    }
                }
                if headers.contains("Price") {
                    let raw = row.get("Price").to_string();
                    if !raw.trim().is_empty() && parse_money(&raw).is_none() {
                        sink.push(Issue::new(
                            i,
                            "Price",
                            Severity::Error,
                            "etsy/invalid_money",
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
                            "etsy/invalid_quantity",
                            format!("`{}` is not a non-negative integer.", raw),
                        ));
                    }
                }
                if headers.contains("Currency") {
                    let raw = row.get("Currency").trim();
                    if !raw.is_empty() && !CURRENCY_RE.is_match(raw) {
                        sink.push(Issue::new(
                            i,
                            "Currency",
                            Severity::Error,
                            "etsy/invalid_currency",
                            format!("`{}` is not a 3-letter uppercase currency code.", raw),
                        ));
                    }
                }
                if headers.contains("Tags") {
                    let raw = row.get("Tags").to_string();
                    if !raw.trim().is_empty() {
                        let tags: Vec<&str> = raw.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
                        if tags.len() > TAGS_MAX {
                            sink.push(Issue::new(
                                i,
                                "Tags",
                                Severity::Warning,
                                "etsy/too_many_tags",
                                format!("{} tags exceeds the {}-tag limit.", tags.len(), TAGS_MAX),
                            ));
                        }
                        for tag in &tags {
                            if tag.chars().count() > TAG_LEN_MAX {
                                sink.push(Issue::new(
                                    i,
                                    "Tags",
                                    Severity::Warning,
                                    "etsy/tag_too_long",
                                    format!("Tag `{}` exceeds the {}-character limit.", tag, TAG_LEN_MAX),
                                ));
                            }
                        }
                    }
                }
                if headers.contains("Image URLs") {
                    let raw = row.get("Image URLs").to_string();
                    if !raw.trim().is_empty() {
                        for url in raw.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
                            if !is_http_url(url) {
                                sink.push(Issue::new(
                                    i,
                                    "Image URLs",
                                    Severity::Warning,
                                    "etsy/invalid_image_url",
                                    format!("`{}` is not a valid http(s) URL.", url),
                                ));
                            }
                        }
                    }
                }
            }),
        );
        if let Some(issue) = failure {
            sink.push(issue);
        }
    }

    result.fixed_headers = headers.clone();
    result.fixed_rows = fixed_rows;
    result.issues = sink.finish();
    result
}

pub fn format() -> Format {
    Format {
        id: "etsy_listings".to_string(),
        name: "Etsy Listings".to_string(),
        description: "Etsy bulk listing CSV template".to_string(),
        category: FormatCategory::Ecommerce,
        source: FormatSource::Builtin,
        apply_fn: Box::new(apply),
        expected_headers: Some(vec![
            "Title".to_string(),
            "Price".to_string(),
            "Currency".to_string(),
            "Quantity".to_string(),
            "Tags".to_string(),
            "Image URLs".to_string(),
        ]),
        example_row: Some(vec![
            "Sample Handmade Item".to_string(),
            "24.00".to_string(),
            "USD".to_string(),
            "5".to_string(),
            "handmade, gift".to_string(),
            "https://example.com/a.jpg".to_string(),
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
    fn title_over_limit_is_a_warning_not_an_error() {
        let h = headers(&["Title"]);
        let rows = vec![row(&[("Title", &"x".repeat(141))])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        let issue = result.issues.iter().find(|i| i.code == "etsy/title_too_long").unwrap();
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn too_many_tags_and_too_long_tag() {
        let h = headers(&["Tags"]);
        let tags = (0..14).map(|i| format!("tag{}", i)).collect::<Vec<_>>().join(",");
        let rows = vec![row(&[("Tags", &tags)])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert!(result.issues.iter().any(|i| i.code == "etsy/too_many_tags"));
    }

    #[test]
    fn currency_must_be_three_uppercase_letters() {
        let h = headers(&["Currency"]);
        let rows = vec![row(&[("Currency", "usd")])];
        let result = apply(&h, &rows, crate::issue::DEFAULT_MAX_ISSUES);
        assert_eq!(result.fixed_rows[0].get("Currency"), "USD");
        assert!(result.issues.is_empty());
    }
}
