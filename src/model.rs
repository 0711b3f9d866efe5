// Core data model — rows, headers, issues, formats.
//
// A `Row` preserves insertion order so serialization is stable; lookups
// are backed by an index map so hot paths (Shopify cross-row analysis)
// don't pay for a linear scan per cell access.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A CSV cell is always a string. Never null.
pub type Cell = String;

/// An ordered list of distinct header names.
///
/// Duplicate headers in raw input are preserved (the codec records a
/// parse-level observation, see [`crate::csv_codec::ParseWarning`]), but
/// a `Headers` value produced by the engine itself never contains a
/// duplicate — later pipeline stages rely on header-name lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Headers(pub Vec<String>);

impl Headers {
    pub fn new(names: Vec<String>) -> Self {
        Headers(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|h| h == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|h| h == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// A single data row: an ordered mapping of header name to cell value.
///
/// Missing keys read back as empty strings rather than panicking —
/// callers never need to special-case "this row predates that column".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    order: Vec<String>,
    values: HashMap<String, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn from_pairs<I: IntoIterator<Item = (String, Cell)>>(pairs: I) -> Self {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.set(k, v);
        }
        row
    }

    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Cell>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Project this row onto an explicit header order, filling missing
    /// keys with empty strings and dropping keys not in `headers`.
    pub fn project(&self, headers: &Headers) -> Row {
        let mut out = Row::new();
        for h in headers.iter() {
            out.set(h.clone(), self.get(h).to_string());
        }
        out
    }

    /// All non-empty cell values, ignoring which column they came from.
    /// Used by structural checks that just need "is there any variant
    /// signal at all in this row".
    pub fn any_nonempty(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| !self.get(k).trim().is_empty())
    }
}

/// Severity of an [`Issue`]. Ordered so `Severity::Error` sorts first
/// when issues are grouped for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Row index meaning "this issue is file-level, not anchored to a row".
pub const FILE_LEVEL_ROW: i64 = -1;

/// Column name meaning "this issue is file-level, not anchored to a column".
pub const FILE_LEVEL_COLUMN: &str = "(file)";

/// A diagnostic produced by a format run. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub row_index: i64,
    pub column: String,
    pub severity: Severity,
    /// Namespaced stable string: `{platform}/{kind}`, e.g. `shopify/duplicate_sku`.
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl Issue {
    pub fn new(
        row_index: i64,
        column: impl Into<String>,
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Issue {
            row_index,
            column: column.into(),
            severity,
            code: code.into(),
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    pub fn file_level(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Issue::new(FILE_LEVEL_ROW, FILE_LEVEL_COLUMN, severity, code, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Category a [`Format`] belongs to, used for host-side grouping/UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FormatCategory {
    General,
    Ecommerce,
    Marketing,
    Crm,
    Accounting,
    Shipping,
    Support,
    Custom,
}

/// Where a [`Format`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatSource {
    Builtin,
    User,
}

/// The result of running a [`Format`]'s pipeline (or the whole engine)
/// over a CSV document.
#[derive(Debug, Clone, Default)]
pub struct FixResult {
    pub fixed_headers: Headers,
    pub fixed_rows: Vec<Row>,
    pub issues: Vec<Issue>,
    pub fixes_applied: Vec<String>,
}

impl FixResult {
    pub fn empty() -> Self {
        FixResult::default()
    }

    /// Push a fix description, deduplicating by trimmed equality while
    /// preserving first-appearance order.
    pub fn push_fix(&mut self, description: impl Into<String>) {
        let description = description.into();
        let trimmed = description.trim();
        if !self.fixes_applied.iter().any(|f| f.trim() == trimmed) {
            self.fixes_applied.push(description);
        }
    }

    pub fn has_blocking_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// A host gates export on the presence of any error-severity issue.
    /// Returns the offending issues on failure.
    pub fn export_gate(&self) -> Result<(), Vec<&Issue>> {
        let errors: Vec<&Issue> = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Groups issues by severity for host-side display.
pub fn group_by_severity(issues: &[Issue]) -> std::collections::BTreeMap<Severity, Vec<&Issue>> {
    let mut map: std::collections::BTreeMap<Severity, Vec<&Issue>> = std::collections::BTreeMap::new();
    for issue in issues {
        map.entry(issue.severity).or_default().push(issue);
    }
    map
}

/// A named pipeline that validates and normalizes a particular CSV flavor.
///
/// `apply` is boxed because each builtin optimizer and every compiled
/// [`crate::custom::UserFormat`] closes over different state.
pub struct Format {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: FormatCategory,
    pub source: FormatSource,
    pub apply_fn: Box<dyn Fn(&Headers, &[Row], usize) -> FixResult + Send + Sync>,
    pub expected_headers: Option<Vec<String>>,
    pub example_row: Option<Vec<String>>,
}

impl Format {
    /// Runs this format's pipeline with the default row-level issue cap
    /// ([`crate::issue::DEFAULT_MAX_ISSUES`]). Most callers want this;
    /// [`Engine`](crate::engine::Engine) uses [`Format::apply_limited`]
    /// instead so a host's configured cap actually reaches the sink.
    pub fn apply(&self, headers: &Headers, rows: &[Row]) -> FixResult {
        self.apply_limited(headers, rows, crate::issue::DEFAULT_MAX_ISSUES)
    }

    pub fn apply_limited(&self, headers: &Headers, rows: &[Row], max_issues: usize) -> FixResult {
        self.apply_fn.as_ref()(headers, rows, max_issues)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("source", &self.source)
            .finish()
    }
}

/// A saved user-defined format (persisted JSON, schema version 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFormat {
    pub version: u32,
    pub id: String,
    pub name: String,
    pub source: String, // always "user"; kept as a string for wire stability
    pub columns: Vec<UserColumn>,
    pub rules: Vec<Rule>,
    pub global_rules: Vec<Rule>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Fields the host attached that this schema version doesn't know
    /// about. Preserved verbatim so round-tripping through an older or
    /// newer host doesn't lose data: unknown fields survive a
    /// read-modify-write cycle even if this crate never looks at them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserColumn {
    pub id: String,
    pub key: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Global,
    Column,
}

/// A tagged-union of transform/validation operations a [`Rule`] can carry.
///
/// Modeled as a discriminated union rather than a string `type` + loose
/// `value` field so the compiler enforces each variant carries exactly
/// the payload it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleType {
    Trim,
    Uppercase,
    NoSpaces,
    NoSpecialChars { allow: Option<String> },
    NumericOnly,
    MaxLength { n: usize },
    Required,
    DefaultValue { value: String },
    AllowedValues { values: Vec<String> },
    RegexAllow { pattern: String },
    RegexBlock { pattern: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub scope: RuleScope,
    pub column_id: Option<String>,
    #[serde(flatten)]
    pub rule_type: RuleType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_get_defaults_to_empty_string_for_missing_key() {
        let row = Row::new();
        assert_eq!(row.get("Title"), "");
    }

    #[test]
    fn row_preserves_insertion_order_through_keys() {
        let mut row = Row::new();
        row.set("b", "2");
        row.set("a", "1");
        row.set("b", "20");
        assert_eq!(row.keys().collect::<Vec<_>>(), vec![&"b".to_string(), &"a".to_string()]);
        assert_eq!(row.get("b"), "20");
    }

    #[test]
    fn row_project_fills_missing_headers_and_drops_extras() {
        let mut row = Row::new();
        row.set("a", "1");
        row.set("extra", "drop me");
        let h = Headers::new(vec!["a".to_string(), "b".to_string()]);
        let projected = row.project(&h);
        assert_eq!(projected.get("a"), "1");
        assert_eq!(projected.get("b"), "");
        assert!(projected.get_opt("extra").is_none());
    }

    #[test]
    fn fix_result_push_fix_dedups_by_trimmed_equality_preserving_order() {
        let mut result = FixResult::empty();
        result.push_fix("Trimmed whitespace");
        result.push_fix(" Trimmed whitespace ");
        result.push_fix("Normalized SKU formatting");
        assert_eq!(
            result.fixes_applied,
            vec!["Trimmed whitespace".to_string(), "Normalized SKU formatting".to_string()]
        );
    }

    #[test]
    fn export_gate_blocks_on_error_severity_only() {
        let mut result = FixResult::empty();
        result.issues.push(Issue::file_level(Severity::Warning, "x/warn", "just a warning"));
        assert!(result.export_gate().is_ok());
        assert!(!result.has_blocking_errors());

        result.issues.push(Issue::new(0, "SKU", Severity::Error, "x/bad", "bad sku"));
        assert!(result.export_gate().is_err());
        assert!(result.has_blocking_errors());
    }

    #[test]
    fn group_by_severity_orders_errors_before_warnings_and_info() {
        let issues = vec![
            Issue::file_level(Severity::Info, "x/info", "info"),
            Issue::file_level(Severity::Error, "x/err", "err"),
            Issue::file_level(Severity::Warning, "x/warn", "warn"),
        ];
        let grouped = group_by_severity(&issues);
        let order: Vec<Severity> = grouped.keys().copied().collect();
        assert_eq!(order, vec![Severity::Error, Severity::Warning, Severity::Info]);
    }
}
