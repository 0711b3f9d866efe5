// CsvCodec — RFC-4180-style parse/serialize with round-trip guarantees.
//
// Tokenization is delegated to the `csv` crate; this module owns the
// parts that are this engine's own responsibility: trailing-cell
// fill, extra-column/duplicate-header observations surfaced as parse
// warnings rather than silent data loss, and forcing LF-only output so
// `parse(serialize(h, r)) == (h, r)` holds regardless of platform.

use crate::error::EngineError;
use crate::model::{FixResult, Headers, Issue, Row, Severity};

/// A non-fatal observation made while parsing. Unlike [`EngineError`],
/// these never abort the parse — they ride along with the result so the
/// engine can turn them into `csv/*` issues.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// Row `record_index` (0-based, header excluded) had more fields
    /// than there are headers; the extra fields were dropped.
    ExtraColumns { record_index: usize, extra: usize },
    /// The header row contained `name` more than once; occurrences
    /// after the first were renamed to keep headers unique.
    DuplicateHeader { name: String, renamed_to: String },
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub headers: Headers,
    pub rows: Vec<Row>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse CSV text into headers + rows. Returns `Err` only for the
/// unrecoverable case: an unterminated quote at EOF (or any other
/// tokenization failure the `csv` crate can't route around). Everything
/// else is reported as a [`ParseWarning`] riding along with a complete
/// result.
pub fn parse(text: &str) -> Result<ParseOutcome, EngineError> {
    if text.trim().is_empty() {
        return Ok(ParseOutcome {
            headers: Headers::default(),
            rows: Vec::new(),
            warnings: Vec::new(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let raw_headers = match records.next() {
        Some(r) => r.map_err(EngineError::from)?,
        None => {
            return Ok(ParseOutcome {
                headers: Headers::default(),
                rows: Vec::new(),
                warnings: Vec::new(),
            })
        }
    };

    let mut warnings = Vec::new();
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut header_names = Vec::with_capacity(raw_headers.len());
    for field in raw_headers.iter() {
        let name = field.to_string();
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let renamed = format!("{} ({})", name, count);
            warnings.push(ParseWarning::DuplicateHeader {
                name: name.clone(),
                renamed_to: renamed.clone(),
            });
            header_names.push(renamed);
        } else {
            header_names.push(name);
        }
    }
    let headers = Headers::new(header_names);

    let mut rows = Vec::new();
    for (record_index, record) in records.enumerate() {
        let record = record.map_err(EngineError::from)?;
        if record.len() > headers.len() {
            warnings.push(ParseWarning::ExtraColumns {
                record_index,
                extra: record.len() - headers.len(),
            });
        }
        let mut row = Row::new();
        for (i, name) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").to_string();
            row.set(name.clone(), value);
        }
        rows.push(row);
    }

    Ok(ParseOutcome {
        headers,
        rows,
        warnings,
    })
}

/// Parse CSV text the way a host actually wants to consume it: a parse
/// failure is folded into a `FixResult` carrying a single file-level
/// `csv/parse_error` issue and no rows, rather than a bare `Err` the
/// caller has to remember to turn into an issue itself.
pub fn parse_or_issue(text: &str) -> Result<ParseOutcome, FixResult> {
    parse(text).map_err(|err| FixResult {
        fixed_headers: Headers::new(Vec::new()),
        fixed_rows: Vec::new(),
        issues: vec![Issue::file_level(Severity::Error, "csv/parse_error", err.to_string())],
        fixes_applied: Vec::new(),
    })
}

/// Serialize headers + rows back to CSV text. Quotes any cell matching
/// `/[",\n\r]/`, doubles embedded quotes, LF line terminator, trailing
/// newline always present.
pub fn serialize(headers: &Headers, rows: &[Row]) -> String {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(headers.iter())
        .expect("writing to an in-memory buffer cannot fail");
    for row in rows {
        let fields: Vec<&str> = headers.iter().map(|h| row.get(h)).collect();
        writer
            .write_record(&fields)
            .expect("writing to an in-memory buffer cannot fail");
    }
    writer.flush().expect("flushing an in-memory buffer cannot fail");
    let bytes = writer.into_inner().expect("writer has no pending state");
    String::from_utf8(bytes).expect("csv writer only emits valid UTF-8 from UTF-8 input")
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
    fn round_trips_plain_csv() {
        let h = headers(&["a", "b"]);
        let rows = vec![row(&[("a", "1"), ("b", "2")]), row(&[("a", "3"), ("b", "4")])];
        let text = serialize(&h, &rows);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.headers, h);
        assert_eq!(parsed.rows, rows);
    }

    #[test]
    fn round_trips_quotes_commas_and_newlines() {
        let h = headers(&["a", "b"]);
        let rows = vec![row(&[("a", "x,y"), ("b", "he said \"hi\"\nline2")])];
        let text = serialize(&h, &rows);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.headers, h);
        assert_eq!(parsed.rows, rows);
    }

    #[test]
    fn fills_missing_trailing_columns() {
        let text = "a,b,c\n1,2\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.rows[0].get("c"), "");
    }

    #[test]
    fn extra_columns_warn_without_failing() {
        let text = "a,b\n1,2,3\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert!(parsed
            .warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::ExtraColumns { extra: 1, .. })));
    }

    #[test]
    fn duplicate_headers_are_renamed_not_dropped() {
        let text = "a,a\n1,2\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.headers.0, vec!["a".to_string(), "a (2)".to_string()]);
        assert_eq!(parsed.rows[0].get("a"), "1");
        assert_eq!(parsed.rows[0].get("a (2)"), "2");
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        let text = "a,b\n\"unterminated,2\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn parse_or_issue_folds_a_parse_error_into_a_file_level_issue() {
        let text = "a,b\n\"unterminated,2\n";
        let fix_result = parse_or_issue(text).unwrap_err();
        assert!(fix_result.fixed_headers.is_empty());
        assert!(fix_result.fixed_rows.is_empty());
        assert_eq!(fix_result.issues.len(), 1);
        assert_eq!(fix_result.issues[0].code, "csv/parse_error");
        assert_eq!(fix_result.issues[0].row_index, crate::model::FILE_LEVEL_ROW);
    }

    #[test]
    fn parse_or_issue_passes_through_a_successful_parse() {
        let text = "a\n1\n";
        let parsed = parse_or_issue(text).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn serialize_ends_with_trailing_newline() {
        let h = headers(&["a"]);
        let text = serialize(&h, &[row(&[("a", "1")])]);
        assert!(text.ends_with('\n'));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn empty_input_parses_to_empty_outcome() {
        let parsed = parse("").unwrap();
        assert!(parsed.headers.is_empty());
        assert!(parsed.rows.is_empty());
    }
}
