// Engine — the orchestrator that runs a format's pipeline between the
// two normalization passes and merges everything into one `FixResult`.
//
// Grounded on the Tauri app's `commands::run_pipeline`-style sequencing
// (clean input, run the domain step, clean output, hand back one
// result), generalized here into three fixed stages instead of a
// hardcoded liquidation-specific sequence.

use serde::{Deserialize, Serialize};

use crate::model::{FixResult, Headers, Issue, Row, Severity};
use crate::normalizer::{apply_base_clean, apply_universal_clean};

/// A probe the host can supply so a long-running pipeline can be
/// cancelled between passes. `Engine::apply` checks it after each of
/// the three stages; a pipeline that never needs cancellation can just
/// pass `EngineConfig::default()`, whose probe always returns `false`.
pub type CancelProbe = Box<dyn Fn() -> bool + Send + Sync>;

/// The subset of `EngineConfig` a host can load from its own settings
/// layer (env vars, a config file) and hand back unchanged. The cancel
/// probe is deliberately not part of this: it's a runtime closure, not
/// a value a settings file could ever hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub max_issues_per_format: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            max_issues_per_format: crate::issue::DEFAULT_MAX_ISSUES,
        }
    }
}

pub struct EngineConfig {
    /// Row-level issue cap per format run, forwarded to the format's own
    /// `IssueSink` via [`crate::model::Format::apply_limited`].
    pub max_issues_per_format: usize,
    cancel_probe: CancelProbe,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::from_settings(EngineSettings::default())
    }
}

impl EngineConfig {
    pub fn from_settings(settings: EngineSettings) -> Self {
        EngineConfig {
            max_issues_per_format: settings.max_issues_per_format,
            cancel_probe: Box::new(|| false),
        }
    }

    pub fn with_cancel_probe(probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        EngineConfig {
            cancel_probe: Box::new(probe),
            ..EngineConfig::default()
        }
    }
}

pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine { config }
    }

    fn cancelled(&self, result: &mut FixResult) -> bool {
        if (self.config.cancel_probe)() {
            result.issues.push(Issue::file_level(
                Severity::Info,
                "engine/cancelled",
                "Run was cancelled before completing all stages.",
            ));
            true
        } else {
            false
        }
    }

    /// Run the full pipeline: base cleanup, the format's own
    /// validate-and-fix pass, universal cleanup, merging fixes in order
    /// and deduplicating. Never returns `Result` — every
    /// failure mode the pipeline can hit becomes an `Issue` instead.
    pub fn apply(&self, format: &crate::model::Format, headers: &Headers, rows: &[Row]) -> FixResult {
        let mut result = FixResult {
            fixed_headers: headers.clone(),
            fixed_rows: rows.to_vec(),
            issues: Vec::new(),
            fixes_applied: Vec::new(),
        };

        apply_base_clean(&mut result);
        if self.cancelled(&mut result) {
            return result;
        }

        let format_result =
            format.apply_limited(&result.fixed_headers, &result.fixed_rows, self.config.max_issues_per_format);
        result.fixed_headers = format_result.fixed_headers;
        result.fixed_rows = format_result.fixed_rows;
        result.issues.extend(format_result.issues);
        for fix in format_result.fixes_applied {
            result.push_fix(fix);
        }
        if self.cancelled(&mut result) {
            return result;
        }

        apply_universal_clean(&mut result);
        if self.cancelled(&mut result) {
            return result;
        }

        // Shopify post-enforcement: the optimizer's own header
        // canonicalization already leaves `fixed_headers` in official
        // template order (see `platforms::shopify::apply`), so the only
        // remaining step here is the final boolean-casing rule — the
        // optimizer normalizes to the universal uppercase `TRUE`/`FALSE`
        // internally, but Shopify's own export format wants lowercase.
        if format.id == "shopify_products" {
            crate::platforms::shopify::lowercase_booleans_for_output(&mut result);
        }

        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::shopify;

    fn headers(names: &[&str]) -> Headers {
        Headers::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn runs_base_then_format_then_universal_and_merges_fixes() {
        let engine = Engine::default();
        let format = shopify::format();
        let h = headers(&["Handle", "Title", "Variant SKU", "Variant Price", "Tags"]);
        let rows = vec![row(&[
            ("Handle", " red-shirt "),
            ("Title", "Red Shirt"),
            ("Variant SKU", "rs 1"),
            ("Variant Price", "$19.99"),
            ("Tags", "red,  , shirt"),
        ])];
        let result = engine.apply(&format, &h, &rows);
        assert_eq!(result.fixed_headers.0, shopify::OFFICIAL_HEADERS.to_vec());
        assert_eq!(result.fixed_rows[0].get("SKU"), "RS1");
        assert_eq!(result.fixed_rows[0].get("Tags"), "red, shirt");
        assert!(result.fixes_applied.iter().any(|f| f.contains("Trimmed")));
        assert!(result.fixes_applied.iter().any(|f| f.contains("Canonicalized")));
    }

    #[test]
    fn cancellation_stops_before_later_stages_and_emits_issue() {
        let engine = Engine::new(EngineConfig::with_cancel_probe(|| true));
        let format = shopify::format();
        let h = headers(&["Title"]);
        let rows = vec![row(&[("Title", "x")])];
        let result = engine.apply(&format, &h, &rows);
        assert!(result.issues.iter().any(|i| i.code == "engine/cancelled"));
        assert_eq!(result.fixed_headers, h);
    }

    #[test]
    fn custom_issue_cap_from_settings_reaches_the_format_sink() {
        let engine = Engine::new(EngineConfig::from_settings(EngineSettings { max_issues_per_format: 1 }));
        let format = shopify::format();
        let h = headers(&["Price"]);
        let rows = vec![row(&[("Price", "bad")]), row(&[("Price", "also bad")])];
        let result = engine.apply(&format, &h, &rows);
        let price_issues = result.issues.iter().filter(|i| i.code == "shopify/invalid_money").count();
        assert_eq!(price_issues, 1);
        assert!(result.issues.iter().any(|i| i.code == "engine/issues_truncated"));
    }

    #[test]
    fn second_pass_over_already_clean_output_yields_no_new_fixes() {
        let engine = Engine::default();
        let format = shopify::format();
        let h = headers(&["URL handle", "Title", "SKU", "Price"]);
        let rows = vec![row(&[
            ("URL handle", "red-shirt"),
            ("Title", "Red Shirt"),
            ("SKU", "RS1"),
            ("Price", "19.99"),
        ])];
        let first = engine.apply(&format, &h, &rows);
        let second = engine.apply(&format, &first.fixed_headers, &first.fixed_rows);
        assert!(second.fixes_applied.is_empty());
    }
}
