// Custom user-format compiler — turns a saved `UserFormat` (columns +
// rules, optionally global) into an executable `Format.apply`.
//
// Grounded on `pavelracu-csv-validator-project-v2/src/lib.rs`'s
// `RuleType` tagged enum and its per-rule `match` dispatch against a
// value; this module follows the same shape but precompiles regexes
// once (rather than per-cell). Structural problems in the saved format
// itself (duplicate column ids, a rule pointing at a column that
// doesn't exist) fail compilation with `EngineError::InvalidUserFormat`
// rather than surfacing as a per-row issue, since they're a defect in
// the format definition, not in the data being validated. A bad regex
// *pattern*, by contrast, still turns into a `custom/invalid_regex`
// issue rather than failing compilation — the rest of the format is
// still usable with that one check skipped.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::error::EngineError;
use crate::issue::{catch_row_panic, IssueSink};
use crate::model::{
    Format, FormatCategory, FormatSource, Headers, Issue, Row, RuleScope, RuleType, Severity, UserColumn,
    UserFormat,
};
use crate::model::FixResult;

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Resolve a column's input header: by title (case/space-insensitive),
/// then by key, then the positional fallback `Column N`.
fn resolve_input_header<'a>(headers: &'a Headers, column: &UserColumn, position: usize) -> Option<&'a str> {
    if let Some(title) = &column.title {
        if let Some(h) = headers.iter().find(|h| fold(h) == fold(title)) {
            return Some(h.as_str());
        }
    }
    if let Some(key) = &column.key {
        if let Some(h) = headers.iter().find(|h| fold(h) == fold(key)) {
            return Some(h.as_str());
        }
    }
    let positional = format!("Column {}", position + 1);
    headers.iter().find(|h| fold(h) == fold(&positional)).map(|s| s.as_str())
}

fn column_title(column: &UserColumn, position: usize) -> String {
    column
        .title
        .clone()
        .or_else(|| column.key.clone())
        .unwrap_or_else(|| format!("Column {}", position + 1))
}

struct CompiledRegex {
    pattern: String,
    compiled: Result<Regex, regex::Error>,
}

fn compile_pattern(pattern: &str) -> CompiledRegex {
    CompiledRegex {
        pattern: pattern.to_string(),
        compiled: Regex::new(pattern),
    }
}

/// Rules resolved for a single column: the global rules plus any rules
/// scoped to this column's id, transform rules and validation rules
/// kept separate since they run in two distinct phases: transforms
/// apply in order first, then validations run against the result.
struct ColumnRules<'a> {
    transforms: Vec<&'a RuleType>,
    validations: Vec<&'a RuleType>,
}

fn is_transform(rule: &RuleType) -> bool {
    matches!(
        rule,
        RuleType::Trim
            | RuleType::Uppercase
            | RuleType::NoSpaces
            | RuleType::NoSpecialChars { .. }
            | RuleType::NumericOnly
            | RuleType::MaxLength { .. }
            | RuleType::DefaultValue { .. }
    )
}

fn rules_for_column<'a>(user_format: &'a UserFormat, column_id: &str) -> ColumnRules<'a> {
    let mut transforms = Vec::new();
    let mut validations = Vec::new();
    let applicable = user_format
        .global_rules
        .iter()
        .chain(user_format.rules.iter().filter(|r| {
            r.scope == RuleScope::Column && r.column_id.as_deref() == Some(column_id)
        }));
    for rule in applicable {
        if is_transform(&rule.rule_type) {
            transforms.push(&rule.rule_type);
        } else {
            validations.push(&rule.rule_type);
        }
    }
    ColumnRules { transforms, validations }
}

fn apply_transform(value: String, rule: &RuleType) -> String {
    match rule {
        RuleType::Trim => value.trim().to_string(),
        RuleType::Uppercase => value.to_uppercase(),
        RuleType::NoSpaces => value.chars().filter(|c| !c.is_whitespace()).collect(),
        RuleType::NoSpecialChars { allow } => {
            let allow_set: Vec<char> = allow.as_deref().unwrap_or("").chars().collect();
            value
                .chars()
                .filter(|c| c.is_alphanumeric() || allow_set.contains(c))
                .collect()
        }
        RuleType::NumericOnly => value.chars().filter(|c| c.is_ascii_digit()).collect(),
        RuleType::MaxLength { n } => value.chars().take(*n).collect(),
        RuleType::DefaultValue { value: default } => {
            if value.trim().is_empty() {
                default.clone()
            } else {
                value
            }
        }
        _ => value,
    }
}

fn validate(
    value: &str,
    rule: &RuleType,
    regex_cache: &HashMap<String, CompiledRegex>,
    row_index: i64,
    column_name: &str,
    sink: &mut IssueSink,
) {
    match rule {
        RuleType::Required => {
            if value.trim().is_empty() {
                sink.push(Issue::new(
                    row_index,
                    column_name,
                    Severity::Error,
                    "custom/required",
                    format!("{} is required.", column_name),
                ));
            }
        }
        RuleType::AllowedValues { values } => {
            if !value.is_empty() && !values.iter().any(|v| v == value) {
                sink.push(Issue::new(
                    row_index,
                    column_name,
                    Severity::Error,
                    "custom/not_allowed_value",
                    format!("`{}` is not one of the allowed values for {}.", value, column_name),
                ));
            }
        }
        RuleType::RegexAllow { pattern } => {
            if let Some(CompiledRegex { compiled: Ok(re), .. }) = regex_cache.get(pattern) {
                if !value.is_empty() && !re.is_match(value) {
                    sink.push(Issue::new(
                        row_index,
                        column_name,
                        Severity::Error,
                        "custom/regex_allow_mismatch",
                        format!("`{}` does not match the required pattern for {}.", value, column_name),
                    ));
                }
            }
        }
        RuleType::RegexBlock { pattern } => {
            if let Some(CompiledRegex { compiled: Ok(re), .. }) = regex_cache.get(pattern) {
                if !value.is_empty() && re.is_match(value) {
                    sink.push(Issue::new(
                        row_index,
                        column_name,
                        Severity::Error,
                        "custom/regex_block_match",
                        format!("`{}` matches a blocked pattern for {}.", value, column_name),
                    ));
                }
            }
        }
        _ => {}
    }
}

/// Structural checks a saved [`UserFormat`] must pass before it can be
/// compiled: every column id is unique, and every rule's `column_id`
/// (when scoped to a column) names a column that actually exists.
fn validate_structure(user_format: &UserFormat) -> Result<(), EngineError> {
    let mut seen_ids = HashSet::new();
    for column in &user_format.columns {
        if !seen_ids.insert(column.id.as_str()) {
            return Err(EngineError::InvalidUserFormat(format!(
                "duplicate column id `{}`",
                column.id
            )));
        }
    }
    for rule in user_format.rules.iter().chain(user_format.global_rules.iter()) {
        if rule.scope == RuleScope::Column {
            let Some(column_id) = &rule.column_id else {
                return Err(EngineError::InvalidUserFormat(
                    "a column-scoped rule must carry a column_id".to_string(),
                ));
            };
            if !seen_ids.contains(column_id.as_str()) {
                return Err(EngineError::InvalidUserFormat(format!(
                    "rule references unknown column id `{}`",
                    column_id
                )));
            }
        }
    }
    Ok(())
}

/// Compile a saved [`UserFormat`] into an executable [`Format`]. Regex
/// patterns are precompiled once here; a pattern that fails to compile
/// does not abort compilation — each row that would have exercised it
/// gets a `custom/invalid_regex` issue instead of a panic. Structural
/// defects in the format itself (see [`validate_structure`]) do abort
/// compilation.
pub fn compile_user_format(user_format: &UserFormat) -> Result<Format, EngineError> {
    validate_structure(user_format)?;

    let user_format = user_format.clone();
    let id = user_format.id.clone();
    let name = user_format.name.clone();

    let mut regex_patterns: Vec<String> = Vec::new();
    for rule in user_format.global_rules.iter().chain(user_format.rules.iter()) {
        match &rule.rule_type {
            RuleType::RegexAllow { pattern } | RuleType::RegexBlock { pattern } => {
                regex_patterns.push(pattern.clone());
            }
            _ => {}
        }
    }
    let regex_cache: HashMap<String, CompiledRegex> = regex_patterns
        .into_iter()
        .map(|p| (p.clone(), compile_pattern(&p)))
        .collect();

    let output_headers: Vec<String> = user_format
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| column_title(c, i))
        .collect();

    let expected_headers = output_headers.clone();

    Ok(Format {
        id,
        name,
        description: format!("Custom format: {}", user_format.name),
        category: FormatCategory::Custom,
        source: FormatSource::User,
        apply_fn: Box::new(move |headers, rows, max_issues| {
            run(&user_format, &regex_cache, &output_headers, headers, rows, max_issues)
        }),
        expected_headers: Some(expected_headers),
        example_row: None,
    })
}

fn run(
    user_format: &UserFormat,
    regex_cache: &HashMap<String, CompiledRegex>,
    output_headers: &[String],
    input_headers: &Headers,
    rows: &[Row],
    max_issues: usize,
) -> FixResult {
    let mut sink = IssueSink::new(max_issues);
    let mut result = FixResult::empty();
    result.fixed_headers = Headers::new(output_headers.to_vec());

    for compiled in regex_cache.values() {
        if let Err(_) = &compiled.compiled {
            sink.push(Issue::file_level(
                Severity::Error,
                "custom/invalid_regex",
                format!("`{}` is not a valid regex pattern.", compiled.pattern),
            ));
        }
    }

    let input_header_for: Vec<Option<String>> = user_format
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| resolve_input_header(input_headers, c, i).map(|s| s.to_string()))
        .collect();

    let mut defaults_filled = false;

    let fixed_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let mut out = Row::new();
            let failure = catch_row_panic(
                row_index as i64,
                std::panic::AssertUnwindSafe(|| {
                    for (i, column) in user_format.columns.iter().enumerate() {
                        let title = &output_headers[i];
                        let mut value = input_header_for[i]
                            .as_ref()
                            .map(|h| row.get(h).to_string())
                            .unwrap_or_default();

                        if value.trim().is_empty() {
                            if let Some(default) = &column.default_value {
                                value = default.clone();
                                defaults_filled = true;
                            }
                        }

                        let column_rules = rules_for_column(user_format, &column.id);
                        for rule in &column_rules.transforms {
                            value = apply_transform(value, rule);
                        }
                        if column.required
                            && !column_rules.validations.iter().any(|r| matches!(r, RuleType::Required))
                        {
                            validate(&value, &RuleType::Required, regex_cache, row_index as i64, title, &mut sink);
                        }
                        for rule in &column_rules.validations {
                            validate(&value, rule, regex_cache, row_index as i64, title, &mut sink);
                        }

                        out.set(title.clone(), value);
                    }
                }),
            );
            match failure {
                Some(issue) => {
                    sink.push(issue);
                    // Leave this row untouched: project its raw input
                    // values onto the output schema with no transforms,
                    // defaults, or validation applied.
                    let mut fallback = Row::new();
                    for (i, title) in output_headers.iter().enumerate() {
                        let raw = input_header_for[i].as_ref().map(|h| row.get(h).to_string()).unwrap_or_default();
                        fallback.set(title.clone(), raw);
                    }
                    fallback
                }
                None => out,
            }
        })
        .collect();

    if defaults_filled {
        result.push_fix("Applied column default values for empty cells");
    }
    result.fixed_rows = fixed_rows;
    result.issues = sink.finish();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_format(columns: Vec<UserColumn>, rules: Vec<crate::model::Rule>) -> UserFormat {
        UserFormat {
            version: 1,
            id: "custom_test".to_string(),
            name: "Test Format".to_string(),
            source: "user".to_string(),
            columns,
            rules,
            global_rules: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }

    fn column(id: &str, title: &str, required: bool) -> UserColumn {
        UserColumn {
            id: id.to_string(),
            key: None,
            title: Some(title.to_string()),
            required,
            default_value: None,
        }
    }

    #[test]
    fn required_and_regex_allow_both_fire() {
        let uf = user_format(
            vec![column("email", "email", true)],
            vec![crate::model::Rule {
                scope: RuleScope::Column,
                column_id: Some("email".to_string()),
                rule_type: RuleType::RegexAllow {
                    pattern: r"^[^@]+@[^@]+\.[^@]+$".to_string(),
                },
            }],
        );
        let format = compile_user_format(&uf).unwrap();
        let headers = Headers::new(vec!["email".to_string()]);
        let rows = vec![Row::from_pairs([("email".to_string(), "bad".to_string())])];
        let result = format.apply(&headers, &rows);
        assert_eq!(
            result.issues.iter().filter(|i| i.code == "custom/regex_allow_mismatch").count(),
            1
        );
        assert!(!result.issues.iter().any(|i| i.code == "custom/required"));
    }

    #[test]
    fn default_value_fills_empty_cell() {
        let mut col = column("status", "status", false);
        col.default_value = Some("pending".to_string());
        let uf = user_format(vec![col], Vec::new());
        let format = compile_user_format(&uf).unwrap();
        let headers = Headers::new(vec!["status".to_string()]);
        let rows = vec![Row::from_pairs([("status".to_string(), "".to_string())])];
        let result = format.apply(&headers, &rows);
        assert_eq!(result.fixed_rows[0].get("status"), "pending");
        assert!(result.fixes_applied.iter().any(|f| f.contains("default")));
    }

    #[test]
    fn invalid_regex_becomes_an_issue_not_a_panic() {
        let uf = user_format(
            vec![column("x", "x", false)],
            vec![crate::model::Rule {
                scope: RuleScope::Column,
                column_id: Some("x".to_string()),
                rule_type: RuleType::RegexAllow {
                    pattern: "(unterminated".to_string(),
                },
            }],
        );
        let format = compile_user_format(&uf).unwrap();
        let headers = Headers::new(vec!["x".to_string()]);
        let rows = vec![Row::from_pairs([("x".to_string(), "value".to_string())])];
        let result = format.apply(&headers, &rows);
        assert!(result.issues.iter().any(|i| i.code == "custom/invalid_regex"));
    }

    #[test]
    fn transforms_apply_uppercase_and_max_length() {
        let uf = user_format(
            vec![column("code", "code", false)],
            vec![
                crate::model::Rule {
                    scope: RuleScope::Column,
                    column_id: Some("code".to_string()),
                    rule_type: RuleType::Uppercase,
                },
                crate::model::Rule {
                    scope: RuleScope::Column,
                    column_id: Some("code".to_string()),
                    rule_type: RuleType::MaxLength { n: 3 },
                },
            ],
        );
        let format = compile_user_format(&uf).unwrap();
        let headers = Headers::new(vec!["code".to_string()]);
        let rows = vec![Row::from_pairs([("code".to_string(), "abcdef".to_string())])];
        let result = format.apply(&headers, &rows);
        assert_eq!(result.fixed_rows[0].get("code"), "ABC");
    }

    #[test]
    fn positional_column_fallback_resolves_unnamed_header() {
        let uf = user_format(vec![UserColumn { id: "c1".to_string(), key: None, title: None, required: false, default_value: None }], Vec::new());
        let format = compile_user_format(&uf).unwrap();
        let headers = Headers::new(vec!["Column 1".to_string()]);
        let rows = vec![Row::from_pairs([("Column 1".to_string(), "hi".to_string())])];
        let result = format.apply(&headers, &rows);
        assert_eq!(result.fixed_rows[0].get("Column 1"), "hi");
    }

    #[test]
    fn duplicate_column_id_fails_compilation() {
        let uf = user_format(
            vec![column("dup", "A", false), column("dup", "B", false)],
            Vec::new(),
        );
        let err = compile_user_format(&uf).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::InvalidUserFormat(_)));
    }

    #[test]
    fn rule_referencing_unknown_column_id_fails_compilation() {
        let uf = user_format(
            vec![column("a", "A", false)],
            vec![crate::model::Rule {
                scope: RuleScope::Column,
                column_id: Some("does_not_exist".to_string()),
                rule_type: RuleType::Trim,
            }],
        );
        let err = compile_user_format(&uf).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::InvalidUserFormat(_)));
    }
}
