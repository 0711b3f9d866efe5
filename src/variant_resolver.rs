// Shared variant-signature resolver for Shopify's Option1/2/3 columns.
//
// One function resolves fuzzy header spellings and computes the row
// signature, so per-row validation and the cross-row combo-collision
// check can never disagree about what a variant's identity is.
// `platforms::shopify` is the only consumer today; `platforms::woocommerce`
// has its own `attribute_columns`/`attribute_signature` instead, since
// WooCommerce's `Attribute N name`/`Attribute N value(s)` columns are
// open-ended (N isn't capped at 3) rather than a fixed Option1..3 triple,
// so the fixed-size resolver here doesn't fit it. See DESIGN.md.

use crate::model::{Headers, Row};

/// The header names (as they actually appear in `headers`, if present)
/// backing each of the three option slots.
#[derive(Debug, Clone, Default)]
pub struct OptionColumns {
    pub name: [Option<String>; 3],
    pub value: [Option<String>; 3],
}

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Resolve `Option1 Name`/`Option 1 value`/`Option1Value`/etc. header
/// spellings in `headers` to a canonical `(name[i], value[i])` triple
/// for i in 0..3.
pub fn resolve_option_columns(headers: &Headers) -> OptionColumns {
    let mut out = OptionColumns::default();
    for header in headers.iter() {
        let folded = fold(header);
        for i in 1..=3usize {
            let name_key = format!("option{}name", i);
            let value_key = format!("option{}value", i);
            if folded == name_key {
                out.name[i - 1] = Some(header.clone());
            } else if folded == value_key {
                out.value[i - 1] = Some(header.clone());
            }
        }
    }
    out
}

/// Compute the lowercase `opt1|opt2|opt3` signature for a row, using
/// whatever option-value columns were actually resolved. Missing
/// columns contribute an empty segment.
pub fn variant_signature(columns: &OptionColumns, row: &Row) -> String {
    columns
        .value
        .iter()
        .map(|col| {
            col.as_ref()
                .map(|c| row.get(c).trim().to_lowercase())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Does this row carry any signal that it represents a real variant
/// (as opposed to e.g. an image-only row): a non-empty SKU, price, or
/// any option value?
pub fn has_variant_signal(columns: &OptionColumns, row: &Row, sku_col: &str, price_col: &str) -> bool {
    if !row.get(sku_col).trim().is_empty() || !row.get(price_col).trim().is_empty() {
        return true;
    }
    columns
        .value
        .iter()
        .any(|col| col.as_ref().map(|c| !row.get(c).trim().is_empty()).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Headers {
        Headers::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn resolves_fuzzy_option_header_spellings() {
        let h = headers(&["Option1 Name", "Option 1 Value", "Option2Name", "Option2Value"]);
        let cols = resolve_option_columns(&h);
        assert_eq!(cols.name[0].as_deref(), Some("Option1 Name"));
        assert_eq!(cols.value[0].as_deref(), Some("Option 1 Value"));
        assert_eq!(cols.name[1].as_deref(), Some("Option2Name"));
        assert_eq!(cols.value[1].as_deref(), Some("Option2Value"));
        assert!(cols.name[2].is_none());
    }

    #[test]
    fn signature_is_case_insensitive_and_pipe_joined() {
        let h = headers(&["Option1 Value", "Option2 Value"]);
        let cols = resolve_option_columns(&h);
        let row = Row::from_pairs(
            [("Option1 Value".to_string(), "Red".to_string()), ("Option2 Value".to_string(), "M".to_string())]
                .into_iter(),
        );
        assert_eq!(variant_signature(&cols, &row), "red|m|");
    }
}
