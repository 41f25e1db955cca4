//! Result report schema and parser.
//!
//! The host renders a footprint analysis as plain text: a fixed header block
//! followed by one line per extent, always in the order given by
//! [`ReportField::ORDER`]. Each data line carries its value somewhere in the
//! text, possibly with a label or units around it.

use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Lines skipped before the first data line. Their content is never inspected.
pub const HEADER_LINES: usize = 8;

/// Minimum number of lines a complete report has.
pub const REPORT_LINES: usize = HEADER_LINES + ReportField::ORDER.len();

/// File name the host renders the report to, inside its samples directory.
pub const DEFAULT_REPORT_NAME: &str = "Footprint_diagram_results.txt";

const NUMBER_PATTERN: &str = r"-?[0-9.]+(?:[Ee][+-]?[0-9]+)?";

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUMBER_PATTERN).expect("number pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    XMin,
    XMax,
    YMin,
    YMax,
}

impl ReportField {
    pub const ORDER: [ReportField; 4] = [
        ReportField::XMin,
        ReportField::XMax,
        ReportField::YMin,
        ReportField::YMax,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReportField::XMin => "X-min",
            ReportField::XMax => "X-max",
            ReportField::YMin => "Y-min",
            ReportField::YMax => "Y-max",
        }
    }
}

/// Footprint extents in report order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultVector {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ResultVector {
    pub fn from_array(values: [f64; 4]) -> Self {
        let [x_min, x_max, y_min, y_max] = values;
        Self { x_min, x_max, y_min, y_max }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x_min, self.x_max, self.y_min, self.y_max]
    }
}

/// Returns the first numeric literal embedded in `line`, if any.
///
/// The first match wins even when a line carries a leading annotation with
/// digits in it; the host puts the value first on every data line it writes.
pub fn find_number(line: &str) -> Option<&str> {
    number_regex().find(line).map(|m| m.as_str())
}

fn parse_field(line_no: usize, field: ReportField, text: &str) -> Result<f64, ParseError> {
    let literal = find_number(text).ok_or_else(|| ParseError::NoNumber {
        line: line_no,
        field: field.label(),
        text: text.to_string(),
    })?;
    // `str::parse::<f64>` never consults the locale.
    literal.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        line: line_no,
        field: field.label(),
        literal: literal.to_string(),
    })
}

/// Parse a report from any buffered reader.
///
/// Lines after the last data line are ignored.
pub fn parse_report<R: BufRead>(reader: R) -> Result<ResultVector, ParseError> {
    let mut lines = reader.lines();
    let mut consumed = 0usize;

    while consumed < HEADER_LINES {
        match lines.next() {
            Some(line) => {
                line.map_err(ParseError::Read)?;
                consumed += 1;
            }
            None => {
                return Err(ParseError::Truncated {
                    found: consumed,
                    expected: REPORT_LINES,
                })
            }
        }
    }

    let mut values = [0.0f64; 4];
    for (slot, field) in values.iter_mut().zip(ReportField::ORDER) {
        let text = match lines.next() {
            Some(line) => line.map_err(ParseError::Read)?,
            None => {
                return Err(ParseError::Truncated {
                    found: consumed,
                    expected: REPORT_LINES,
                })
            }
        };
        consumed += 1;
        *slot = parse_field(consumed, field, &text)?;
    }

    Ok(ResultVector::from_array(values))
}

/// Removes the wrapped path when dropped. Missing files are not an error.
pub(crate) struct RemoveOnDrop(PathBuf);

impl RemoveOnDrop {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        match fs::remove_file(&self.0) {
            Ok(()) => tracing::debug!(path = %self.0.display(), "removed report"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.0.display(), error = %e, "could not remove report"),
        }
    }
}

/// Parse the report at `path` and delete it, whether or not parsing succeeds.
pub fn read_report(path: &Path) -> Result<ResultVector, ParseError> {
    let _cleanup = RemoveOnDrop::new(path);
    let file = fs::File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report(BufReader::new(file))
}
