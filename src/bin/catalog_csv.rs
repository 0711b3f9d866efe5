//! `catalog-csv` — run the engine against a file from the command line.
//!
//! Usage: `catalog-csv <format-id> <input.csv> [output.csv]`
//!
//! Prints issues grouped by severity to stderr; writes the fixed CSV to
//! `output.csv` when given, or to stdout when it's omitted. Exits with
//! status 1 if the run has any error-severity issue, mirroring the
//! export-gate rule a host UI would apply before letting a file through.

use std::env;
use std::fs;
use std::process::ExitCode;

use catalog_csv_engine::model::{group_by_severity, FixResult};
use catalog_csv_engine::{csv_codec, engine, registry::FormatRegistry};

fn print_issues(result: &FixResult) {
    let grouped = group_by_severity(&result.issues);
    for (severity, issues) in grouped {
        for issue in issues {
            eprintln!("[{}] row {} {}: {}", severity, issue.row_index, issue.column, issue.message);
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: catalog-csv <format-id> <input.csv> [output.csv]");
        return ExitCode::FAILURE;
    }
    let format_id = &args[1];
    let input_path = &args[2];
    let output_path = args.get(3);

    let format = match FormatRegistry::resolve(format_id) {
        Some(f) => f,
        None => {
            eprintln!("unknown format id `{}`", format_id);
            return ExitCode::FAILURE;
        }
    };

    let text = match fs::read_to_string(input_path) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("failed to read {}: {}", input_path, err);
            return ExitCode::FAILURE;
        }
    };

    let parsed = match csv_codec::parse_or_issue(&text) {
        Ok(p) => p,
        Err(fix_result) => {
            print_issues(&fix_result);
            return ExitCode::FAILURE;
        }
    };
    for warning in &parsed.warnings {
        log::warn!("{:?}", warning);
    }

    let engine = engine::Engine::default();
    let result = engine.apply(&format, &parsed.headers, &parsed.rows);

    print_issues(&result);
    if !result.fixes_applied.is_empty() {
        eprintln!("fixes applied: {}", result.fixes_applied.join("; "));
    }

    let output_text = csv_codec::serialize(&result.fixed_headers, &result.fixed_rows);
    match output_path {
        Some(path) => {
            if let Err(err) = fs::write(path, output_text) {
                eprintln!("failed to write {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        }
        None => print!("{}", output_text),
    }

    if result.has_blocking_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
