// Normalizer — format-agnostic cell hygiene, run in two passes around
// the format pipeline: `base` (always safe, runs before) and
// `universal` (semantic, name-sniffed, runs after).
//
// Generalizes a pattern seen in liquidation-feed ingest code that
// mapped free-text substrings to a canonical vendor name — the same
// "sniff the value, canonicalize it" idiom drives the boolean/tag/SKU
// normalizers below, just keyed off the header name instead of a fixed
// field.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{FixResult, Headers, Row};

const ZERO_WIDTH: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Always-safe hygiene: replace NBSP with space, strip zero-width
/// characters, trim leading/trailing whitespace. Returns the cleaned
/// rows plus the fix descriptions that apply.
pub fn base_clean(headers: &Headers, rows: &[Row]) -> (Vec<Row>, Vec<String>) {
    let mut removed_hidden = false;
    let mut trimmed_any = false;

    let cleaned: Vec<Row> = rows
        .iter()
        .map(|row| {
            let mut out = Row::new();
            for h in headers.iter() {
                let raw = row.get(h);
                let mut value = raw.replace('\u{00A0}', " ");
                if value.chars().any(|c| ZERO_WIDTH.contains(&c)) {
                    value.retain(|c| !ZERO_WIDTH.contains(&c));
                    removed_hidden = true;
                }
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    trimmed_any = true;
                }
                out.set(h.clone(), trimmed.to_string());
            }
            out
        })
        .collect();

    let mut fixes = Vec::new();
    if removed_hidden {
        fixes.push("Removed hidden characters".to_string());
    }
    if trimmed_any {
        fixes.push("Trimmed whitespace".to_string());
    }
    (cleaned, fixes)
}

/// Which semantic class a header name belongs to, by substring sniff.
/// Free-text headers never collapse inner whitespace even if another
/// keyword would otherwise match (e.g. "Product Description Tags").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Email,
    Phone,
    Tags,
    Sku,
    Handle,
    Boolean,
    Numeric,
    FreeText,
    Plain,
}

const FREE_TEXT_MARKERS: [&str; 4] = ["body", "description", "html", "notes"];
const MESSAGE_MARKER: &str = "message";

fn classify(header: &str) -> FieldKind {
    let h = header.to_lowercase();
    if FREE_TEXT_MARKERS.iter().any(|m| h.contains(m)) || h.contains(MESSAGE_MARKER) {
        return FieldKind::FreeText;
    }
    if h.contains("email") {
        return FieldKind::Email;
    }
    if h.contains("phone") || h.contains("mobile") || h.contains("tel") {
        return FieldKind::Phone;
    }
    if h.contains("tag") {
        return FieldKind::Tags;
    }
    if h.contains("sku") {
        return FieldKind::Sku;
    }
    if h.contains("handle") || h.contains("slug") {
        return FieldKind::Handle;
    }
    if h.contains("published") || h.contains("active") || h.contains("enabled") {
        return FieldKind::Boolean;
    }
    if h.contains("price")
        || h.contains("amount")
        || h.contains("qty")
        || h.contains("quantity")
        || h.contains("inventory")
        || h.contains("weight")
    {
        return FieldKind::Numeric;
    }
    FieldKind::Plain
}

lazy_static! {
    static ref INNER_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_DIGIT_PLUS_FIRST: Regex = Regex::new(r"[^\d]").unwrap();
    static ref SKU_CHARS: Regex = Regex::new(r"[^A-Z0-9_-]").unwrap();
    static ref HANDLE_CHARS: Regex = Regex::new(r"[^a-z0-9_-]").unwrap();
    static ref NUMERIC_STRIP: Regex = Regex::new(r"[\$£€¥,\s]").unwrap();
    static ref SIGNED_DECIMAL: Regex = Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap();
}

/// Shared TRUE/FALSE normalization, also used directly by platform
/// optimizers (e.g. Shopify's boolean fields) that need the same
/// mapping without going through the header-name sniffing above.
pub fn normalize_boolean(value: &str) -> Option<&'static str> {
    match value.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some("TRUE"),
        "false" | "f" | "no" | "n" | "0" => Some("FALSE"),
        _ => None,
    }
}

fn normalize_tags(value: &str) -> String {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize_sku(value: &str) -> String {
    let upper = value.to_uppercase().replace(' ', "");
    SKU_CHARS.replace_all(&upper, "").to_string()
}

fn normalize_handle(value: &str) -> String {
    let lower = value.to_lowercase().replace(' ', "");
    HANDLE_CHARS.replace_all(&lower, "").to_string()
}

fn normalize_phone(value: &str) -> String {
    let trimmed = value.trim();
    let plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if plus {
        format!("+{}", digits)
    } else {
        digits
    }
}

fn normalize_numeric(value: &str) -> String {
    let stripped = NUMERIC_STRIP.replace_all(value, "").to_string();
    if SIGNED_DECIMAL.is_match(&stripped) {
        stripped
    } else {
        value.to_string()
    }
}

/// Semantic normalization keyed off header name, run after the format
/// pipeline. Free-text headers are excluded
/// from inner-whitespace collapse so prose bodies survive untouched.
pub fn universal_clean(headers: &Headers, rows: &[Row]) -> (Vec<Row>, Vec<String>) {
    let kinds: Vec<FieldKind> = headers.iter().map(|h| classify(h)).collect();

    let mut touched_email = false;
    let mut touched_phone = false;
    let mut touched_tags = false;
    let mut touched_boolean = false;
    let mut touched_numeric = false;
    let mut touched_sku = false;
    let mut touched_handle = false;
    let mut touched_whitespace = false;

    let cleaned: Vec<Row> = rows
        .iter()
        .map(|row| {
            let mut out = Row::new();
            for (h, kind) in headers.iter().zip(kinds.iter()) {
                let original = row.get(h).to_string();
                // Non-free-text fields get inner runs of whitespace
                // collapsed to a single space before the kind-specific
                // rule runs; free text (body/description/html/notes,
                // or a "message" header) is exempt.
                let raw = if *kind == FieldKind::FreeText {
                    original.clone()
                } else {
                    let collapsed = INNER_WHITESPACE.replace_all(&original, " ").to_string();
                    if collapsed != original {
                        touched_whitespace = true;
                    }
                    collapsed
                };
                let new_value = match kind {
                    FieldKind::Email => {
                        let v: String = raw
                            .to_lowercase()
                            .chars()
                            .filter(|c| !c.is_whitespace())
                            .collect();
                        if v != raw {
                            touched_email = true;
                        }
                        v
                    }
                    FieldKind::Phone => {
                        let v = normalize_phone(&raw);
                        if v != raw {
                            touched_phone = true;
                        }
                        v
                    }
                    FieldKind::Tags => {
                        let v = normalize_tags(&raw);
                        if v != raw {
                            touched_tags = true;
                        }
                        v
                    }
                    FieldKind::Sku => {
                        let v = normalize_sku(&raw);
                        if v != raw {
                            touched_sku = true;
                        }
                        v
                    }
                    FieldKind::Handle => {
                        let v = normalize_handle(&raw);
                        if v != raw {
                            touched_handle = true;
                        }
                        v
                    }
                    FieldKind::Boolean => match normalize_boolean(&raw) {
                        Some(v) => {
                            if v != raw {
                                touched_boolean = true;
                            }
                            v.to_string()
                        }
                        None => raw.clone(),
                    },
                    FieldKind::Numeric => {
                        let v = normalize_numeric(&raw);
                        if v != raw {
                            touched_numeric = true;
                        }
                        v
                    }
                    FieldKind::FreeText | FieldKind::Plain => raw.clone(),
                };
                out.set(h.clone(), new_value);
            }
            out
        })
        .collect();

    let mut fixes = Vec::new();
    if touched_email {
        fixes.push("Normalized email formatting".to_string());
    }
    if touched_phone {
        fixes.push("Normalized phone formatting".to_string());
    }
    if touched_tags {
        fixes.push("Normalized tags formatting".to_string());
    }
    if touched_boolean {
        fixes.push("Normalized boolean values".to_string());
    }
    if touched_numeric {
        fixes.push("Normalized numeric formatting".to_string());
    }
    if touched_sku {
        fixes.push("Normalized SKU formatting".to_string());
    }
    if touched_handle {
        fixes.push("Normalized handle formatting".to_string());
    }
    if touched_whitespace {
        fixes.push("Collapsed inner whitespace".to_string());
    }
    (cleaned, fixes)
}

/// Run `base_clean` or `universal_clean` and fold the result into an
/// in-progress [`FixResult`], matching the merge-by-stage shape
/// `Engine::apply` needs for all three of its cleanup stages.
pub fn apply_base_clean(result: &mut FixResult) {
    let (rows, fixes) = base_clean(&result.fixed_headers, &result.fixed_rows);
    result.fixed_rows = rows;
    for fix in fixes {
        result.push_fix(fix);
    }
}

pub fn apply_universal_clean(result: &mut FixResult) {
    let (rows, fixes) = universal_clean(&result.fixed_headers, &result.fixed_rows);
    result.fixed_rows = rows;
    for fix in fixes {
        result.push_fix(fix);
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
    fn base_clean_trims_and_strips_hidden_chars() {
        let h = headers(&["Title"]);
        let rows = vec![row(&[("Title", "\u{FEFF} Widget\u{200B} ")])];
        let (out, fixes) = base_clean(&h, &rows);
        assert_eq!(out[0].get("Title"), "Widget");
        assert!(fixes.contains(&"Removed hidden characters".to_string()));
        assert!(fixes.contains(&"Trimmed whitespace".to_string()));
    }

    #[test]
    fn base_clean_replaces_nbsp() {
        let h = headers(&["Title"]);
        let rows = vec![row(&[("Title", "Hello\u{00A0}World")])];
        let (out, _) = base_clean(&h, &rows);
        assert_eq!(out[0].get("Title"), "Hello World");
    }

    #[test]
    fn universal_normalizes_email_and_phone() {
        let h = headers(&["Email", "Phone"]);
        let rows = vec![row(&[("Email", " Foo@Bar.com "), ("Phone", "+1 (555) 123-4567")])];
        let (out, fixes) = universal_clean(&h, &rows);
        assert_eq!(out[0].get("Email"), "foo@bar.com");
        assert_eq!(out[0].get("Phone"), "+15551234567");
        assert!(fixes.contains(&"Normalized email formatting".to_string()));
    }

    #[test]
    fn universal_normalizes_tags_and_booleans() {
        let h = headers(&["Tags", "Published"]);
        let rows = vec![row(&[("Tags", "red, , blue ,green"), ("Published", "yes")])];
        let (out, _) = universal_clean(&h, &rows);
        assert_eq!(out[0].get("Tags"), "red, blue, green");
        assert_eq!(out[0].get("Published"), "TRUE");
    }

    #[test]
    fn universal_leaves_free_text_whitespace_alone() {
        let h = headers(&["Body (HTML)"]);
        let rows = vec![row(&[("Body (HTML)", "line one\n\nline   two")])];
        let (out, fixes) = universal_clean(&h, &rows);
        assert_eq!(out[0].get("Body (HTML)"), "line one\n\nline   two");
        assert!(fixes.is_empty());
    }

    #[test]
    fn universal_normalizes_sku_and_handle() {
        let h = headers(&["SKU", "Handle"]);
        let rows = vec![row(&[("SKU", "abc 123!"), ("Handle", "My Product!")])];
        let (out, _) = universal_clean(&h, &rows);
        assert_eq!(out[0].get("SKU"), "ABC123");
        assert_eq!(out[0].get("Handle"), "myproduct");
    }

    #[test]
    fn universal_normalizes_numeric_currency() {
        let h = headers(&["Price"]);
        let rows = vec![row(&[("Price", "$1,234.50")])];
        let (out, _) = universal_clean(&h, &rows);
        assert_eq!(out[0].get("Price"), "1234.50");
    }
}
