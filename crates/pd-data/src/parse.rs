//! Upload file parser.
//!
//! One record per non-empty line, comma separated, fixed order:
//! `problem_size, thread_count, run_id, alg_seconds, e2e_seconds`.
//! Fields past the fifth are ignored. Nanosecond remainders are zero.

use pd_core::{CoreError, ProblemSize, ThreadCount, ensure_count, ensure_finite};
use tracing::warn;

use crate::schema::Measurement;

const FIELD_NAMES: [&str; 5] = [
    "problem_size",
    "thread_count",
    "run_id",
    "alg_seconds",
    "e2e_seconds",
];

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: field `{field}` is not a number: {text:?}")]
    NotNumeric {
        line: usize,
        field: &'static str,
        text: String,
    },

    #[error("line {line}: {source}")]
    Value { line: usize, source: CoreError },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::FieldCount { line, .. }
            | ParseError::NotNumeric { line, .. }
            | ParseError::Value { line, .. } => *line,
        }
    }
}

/// Result of parsing a whole upload. Bad lines are skipped, not fatal.
#[derive(Debug, Clone, Default)]
pub struct ParsedUpload {
    pub records: Vec<Measurement>,
    pub errors: Vec<ParseError>,
}

impl ParsedUpload {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn parse_upload(text: &str) -> ParsedUpload {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut upload = ParsedUpload::default();
    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        match parse_line(raw, idx + 1) {
            Ok(record) => upload.records.push(record),
            Err(err) => {
                warn!(%err, "skipping malformed upload line");
                upload.errors.push(err);
            }
        }
    }
    upload
}

/// Parses a single line. `line` is the 1-based line number used in errors.
pub fn parse_line(raw: &str, line: usize) -> Result<Measurement, ParseError> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    if fields.len() < FIELD_NAMES.len() {
        return Err(ParseError::FieldCount {
            line,
            expected: FIELD_NAMES.len(),
            found: fields.len(),
        });
    }

    let mut values = [0.0_f64; 5];
    for (slot, (text, field)) in values.iter_mut().zip(fields.iter().zip(FIELD_NAMES)) {
        *slot = text.parse::<f64>().map_err(|_| ParseError::NotNumeric {
            line,
            field,
            text: (*text).to_string(),
        })?;
    }

    let value_err = |source: CoreError| ParseError::Value { line, source };
    let problem_size = ProblemSize::new(values[0]).map_err(value_err)?;
    let thread_count = ensure_count(values[1], "thread count").map_err(value_err)?;
    let run_id = ensure_count(values[2], "run id").map_err(value_err)?;
    let alg_s = ensure_finite(values[3], "algorithm time").map_err(value_err)?;
    let e2e_s = ensure_finite(values[4], "end-to-end time").map_err(value_err)?;

    Ok(Measurement::from_upload(
        problem_size,
        ThreadCount(thread_count),
        run_id,
        alg_s,
        e2e_s,
    ))
}
