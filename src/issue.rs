// IssueSink — accumulates issues for a single format run, enforcing a
// per-run cap so a pathological input can't produce an unbounded issue
// list. Every optimizer builds one of these and hands
// its contents to the `FixResult` it returns.

use crate::model::{Issue, Severity};

pub const DEFAULT_MAX_ISSUES: usize = 800;

pub struct IssueSink {
    max_issues: usize,
    issues: Vec<Issue>,
    truncated: bool,
}

impl IssueSink {
    pub fn new(max_issues: usize) -> Self {
        IssueSink {
            max_issues,
            issues: Vec::new(),
            truncated: false,
        }
    }

    /// Record an issue. File-level issues (row_index == -1) are never
    /// counted against the cap — they are summaries/structural, not
    /// per-row noise.
    pub fn push(&mut self, issue: Issue) {
        let is_file_level = issue.row_index < 0;
        if !is_file_level && self.issues.len() >= self.max_issues {
            self.truncated = true;
            return;
        }
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Finish the run, appending an `engine/issues_truncated` summary
    /// issue if the cap was hit.
    pub fn finish(mut self) -> Vec<Issue> {
        if self.truncated {
            log::warn!(
                "issue list truncated at {} row-level issues",
                self.max_issues
            );
            self.issues.push(
                Issue::file_level(
                    Severity::Info,
                    "engine/issues_truncated",
                    format!(
                        "Issue list truncated at {} row-level issues; some issues were omitted.",
                        self.max_issues
                    ),
                ),
            );
        }
        self.issues
    }
}

impl Default for IssueSink {
    fn default() -> Self {
        IssueSink::new(DEFAULT_MAX_ISSUES)
    }
}

/// Runs one row's processing behind a panic boundary so a bug in a
/// single row can't take down the whole format run. On panic, returns
/// an `engine/row_failed` error issue for the caller to push and the
/// row's fields to fall back to their pre-processing state, instead of
/// whatever partially-mutated value existed when the panic happened.
pub fn catch_row_panic(row_index: i64, f: impl FnOnce() + std::panic::UnwindSafe) -> Option<Issue> {
    match std::panic::catch_unwind(f) {
        Ok(()) => None,
        Err(payload) => Some(Issue::new(
            row_index,
            crate::model::FILE_LEVEL_COLUMN,
            Severity::Error,
            "engine/row_failed",
            panic_message(&payload),
        )),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "row processing panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_row_level_issues_and_emits_summary() {
        let mut sink = IssueSink::new(2);
        for i in 0..5 {
            sink.push(Issue::new(i, "col", Severity::Warning, "x/test", "msg"));
        }
        let issues = sink.finish();
        assert_eq!(issues.iter().filter(|i| i.row_index >= 0).count(), 2);
        assert!(issues.iter().any(|i| i.code == "engine/issues_truncated"));
    }

    #[test]
    fn file_level_issues_are_never_capped() {
        let mut sink = IssueSink::new(1);
        sink.push(Issue::new(0, "col", Severity::Warning, "x/test", "msg"));
        for _ in 0..10 {
            sink.push(Issue::file_level(Severity::Error, "x/file", "msg"));
        }
        let issues = sink.finish();
        assert_eq!(
            issues.iter().filter(|i| i.row_index < 0 && i.code == "x/file").count(),
            10
        );
    }

    #[test]
    fn catch_row_panic_returns_none_when_the_closure_succeeds() {
        let mut count = 0;
        let issue = catch_row_panic(0, std::panic::AssertUnwindSafe(|| count += 1));
        assert!(issue.is_none());
        assert_eq!(count, 1);
    }

    #[test]
    fn catch_row_panic_reports_engine_row_failed_on_panic() {
        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));
        let issue = catch_row_panic(3, std::panic::AssertUnwindSafe(|| panic!("boom")));
        std::panic::set_hook(prev_hook);
        let issue = issue.unwrap();
        assert_eq!(issue.row_index, 3);
        assert_eq!(issue.code, "engine/row_failed");
        assert_eq!(issue.severity, Severity::Error);
        assert!(issue.message.contains("boom"));
    }
}
