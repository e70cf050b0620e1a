//! Minimal CSV reader for the bulk import files.
//!
//! One record per line. Fields may be double-quoted, with `""` standing for
//! a literal quote inside a quoted field. Blank lines are skipped and every
//! value is trimmed. Quoted fields cannot span lines.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Split one line into fields.
pub fn parse_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Quote a value if it needs quoting.
pub fn quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// A data row keyed by header name.
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// 1-based line number in the file
    pub line: usize,
    values: HashMap<String, String>,
}

impl CsvRow {
    /// The trimmed value of `column`, `None` when missing or empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Like [`get`](Self::get) but a missing value is an import error.
    pub fn required(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| self.error(format!("missing value for \"{}\"", column)))
    }

    /// `true`/`false` in any case; empty or missing gives `default`.
    pub fn bool_or(&self, column: &str, default: bool) -> Result<bool> {
        match self.get(column) {
            None => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(self.error(format!(
                "\"{}\" must be true or false, got \"{}\"",
                column, v
            ))),
        }
    }

    /// An import error pointing at this row.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::Import {
            line: self.line,
            message: message.into(),
        }
    }
}

/// A parsed file: header names plus data rows.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    /// Line number of the header row
    pub header_line: usize,
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Parse a whole file. An empty file gives an empty table.
    pub fn parse(text: &str) -> Self {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty());

        let Some((header_number, header_line)) = lines.next() else {
            return Self::default();
        };
        let headers: Vec<String> = parse_record(header_line)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = lines
            .map(|(line, text)| {
                let values = headers
                    .iter()
                    .cloned()
                    .zip(parse_record(text).into_iter().map(|v| v.trim().to_string()))
                    .collect();
                CsvRow { line, values }
            })
            .collect();

        Self {
            header_line: header_number,
            headers,
            rows,
        }
    }

    /// Fail unless every column in `columns` is present in the header.
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }
        for column in columns {
            if !self.headers.iter().any(|h| h == column) {
                return Err(Error::Import {
                    line: self.header_line,
                    message: format!("missing column \"{}\" in header", column),
                });
            }
        }
        Ok(())
    }
}
