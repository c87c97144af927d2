//! Import of the legacy CSV log format.
//!
//! Columns: `date,distance[,duration[,heart_rate[,pace[,cadence[,notes]]]]]`.
//! A header row, blank lines and `#` comments are skipped.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::models::{parse_date, parse_distance, parse_duration, InputError, NewRun};

/// Read and parse a legacy CSV file
pub fn read_csv_file(path: &Path) -> Result<Vec<NewRun>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {path:?}"))?;
    parse_csv(&text).with_context(|| format!("Failed to import {path:?}"))
}

/// Parse legacy CSV text into runs. Stops at the first malformed line.
pub fn parse_csv(text: &str) -> Result<Vec<NewRun>> {
    let mut runs = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields = split_fields(trimmed).with_context(|| format!("line {line_no}"))?;
        if runs.is_empty() && is_header(&fields) {
            debug!(line_no, "skipping CSV header");
            continue;
        }

        let run = parse_fields(&fields).with_context(|| format!("line {line_no}"))?;
        runs.push(run);
    }

    Ok(runs)
}

fn is_header(fields: &[String]) -> bool {
    fields
        .first()
        .map(|f| f.eq_ignore_ascii_case("date"))
        .unwrap_or(false)
}

fn parse_fields(fields: &[String]) -> Result<NewRun> {
    if fields.len() < 2 {
        bail!("expected at least date and distance, got {} field(s)", fields.len());
    }

    let field = |i: usize| {
        fields
            .get(i)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    };

    let mut run = NewRun::new(parse_date(&fields[0])?, parse_distance(&fields[1])?);
    if let Some(d) = field(2) {
        run.duration_seconds = Some(parse_duration(d)?);
    }
    if let Some(hr) = field(3) {
        run.heart_rate = Some(hr.parse().map_err(|_| InputError::Number {
            field: "heart rate",
            value: hr.to_string(),
        })?);
    }
    if let Some(p) = field(4) {
        run.pace = Some(p.to_string());
    }
    if let Some(c) = field(5) {
        run.cadence = Some(c.parse().map_err(|_| InputError::Number {
            field: "cadence",
            value: c.to_string(),
        })?);
    }
    if let Some(n) = field(6) {
        run = run.with_notes(n);
    }
    run.validate()?;
    Ok(run)
}

/// Split one CSV line, honouring double quotes and `""` escapes
fn split_fields(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }

    if in_quotes {
        bail!("unterminated quoted field");
    }
    fields.push(current);
    Ok(fields)
}
