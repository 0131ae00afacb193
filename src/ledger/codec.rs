//! Plain text form of a [Ledger]. The file is meant to be readable and editable by hand:
//!
//! ```text
//! WORK CLOCK PUNCHES, STARTED: 2018-07-04 09:00:00
//! Last Project: alpha
//! Clocked In: YES
//! Project | Total | Punches
//! alpha | 8:30:00 | 2018-07-04 09:00:00 -> 2018-07-04 17:30:00 | 2018-07-05 09:00:00
//! ```
//!
//! The total column is written for the reader only. It is recomputed from the punches on every
//! write and ignored on read.

use tracing::warn;

use crate::utils::time::{format_duration, format_timestamp, parse_timestamp};

use super::{
    entities::{ClockState, Ledger, ProjectName, ProjectRecord, Punch},
    error::LedgerError,
};

const HEADER_STARTED: &str = "WORK CLOCK PUNCHES, STARTED: ";
const HEADER_LAST_PROJECT: &str = "Last Project: ";
const HEADER_CLOCKED_IN: &str = "Clocked In: ";
const HEADER_COLUMNS: &str = "Project | Total | Punches";
const HEADER_LINES: usize = 4;

const FIELD_SEPARATOR: &str = " | ";
const IN_OUT_SEPARATOR: &str = " -> ";
const YES: &str = "YES";
const NO: &str = "NO";

pub fn encode(ledger: &Ledger) -> String {
    let mut lines = Vec::with_capacity(HEADER_LINES + ledger.projects.len());
    lines.push(format!(
        "{HEADER_STARTED}{}",
        format_timestamp(ledger.created_at)
    ));
    lines.push(format!(
        "{HEADER_LAST_PROJECT}{}",
        ledger.last_project.as_deref().unwrap_or_default()
    ));
    lines.push(format!(
        "{HEADER_CLOCKED_IN}{}",
        if ledger.state.is_in() { YES } else { NO }
    ));
    lines.push(HEADER_COLUMNS.to_string());

    for record in &ledger.projects {
        let mut fields = vec![
            record.name.to_string(),
            format_duration(record.compute_total(None)),
        ];
        fields.extend(record.punches.iter().map(encode_punch));
        lines.push(fields.join(FIELD_SEPARATOR));
    }

    lines.join("\n")
}

fn encode_punch(punch: &Punch) -> String {
    match punch.time_out {
        Some(out) => format!(
            "{}{IN_OUT_SEPARATOR}{}",
            format_timestamp(punch.time_in),
            format_timestamp(out)
        ),
        None => format_timestamp(punch.time_in),
    }
}

pub fn decode(text: &str) -> Result<Ledger, LedgerError> {
    let lines = text.lines().collect::<Vec<_>>();
    if lines.len() < HEADER_LINES {
        return Err(LedgerError::corrupt(
            lines.len() + 1,
            format!("expected {HEADER_LINES} header lines, found {}", lines.len()),
        ));
    }

    let created_at = header_value(lines[0], HEADER_STARTED, 1)?;
    let created_at = parse_timestamp(created_at)
        .map_err(|e| LedgerError::corrupt(1, format!("bad creation timestamp: {e}")))?;

    let last_project = match header_value(lines[1], HEADER_LAST_PROJECT, 2)?.trim() {
        "" => None,
        name => Some(ProjectName::new(name).map_err(|e| LedgerError::corrupt(2, e.to_string()))?),
    };

    let state = match header_value(lines[2], HEADER_CLOCKED_IN, 3)?.trim() {
        YES => ClockState::In,
        NO => ClockState::Out,
        other => {
            return Err(LedgerError::corrupt(
                3,
                format!("expected {YES} or {NO}, found {other:?}"),
            ))
        }
    };

    if lines[3].trim() != HEADER_COLUMNS {
        warn!("Unexpected column header {:?}, continuing", lines[3]);
    }

    let mut projects: Vec<ProjectRecord> = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        let record = decode_project(line, index + 1)?;
        if projects.iter().any(|v| v.name == record.name) {
            return Err(LedgerError::corrupt(
                index + 1,
                format!("project '{}' is listed twice", record.name),
            ));
        }
        projects.push(record);
    }

    let ledger = Ledger {
        created_at,
        last_project,
        state,
        projects,
    };
    check_clock_state(&ledger)?;
    Ok(ledger)
}

fn header_value<'a>(line: &'a str, prefix: &str, line_number: usize) -> Result<&'a str, LedgerError> {
    // Editors like to strip the trailing space of an empty `Last Project: `
    line.strip_prefix(prefix)
        .or_else(|| (line == prefix.trim_end()).then_some(""))
        .ok_or_else(|| LedgerError::corrupt(line_number, format!("expected {:?}", prefix.trim())))
}

fn decode_project(line: &str, line_number: usize) -> Result<ProjectRecord, LedgerError> {
    let corrupt = |reason: String| LedgerError::corrupt(line_number, reason);

    let mut fields = line.split(FIELD_SEPARATOR);
    let name = fields.next().unwrap_or_default();
    let name = ProjectName::new(name).map_err(|e| corrupt(e.to_string()))?;
    // Cached total, recomputed on write
    if fields.next().is_none() {
        return Err(corrupt(format!("project '{name}' has no total field")));
    }

    let mut record = ProjectRecord::new(name);
    for field in fields {
        if record.open_punch().is_some() {
            return Err(corrupt(format!(
                "project '{}' has an open punch before its last punch",
                record.name
            )));
        }
        let punch = match field.split_once(IN_OUT_SEPARATOR) {
            Some((time_in, time_out)) => Punch::closed(
                parse_timestamp(time_in).map_err(|e| corrupt(format!("bad punch {field:?}: {e}")))?,
                parse_timestamp(time_out)
                    .map_err(|e| corrupt(format!("bad punch {field:?}: {e}")))?,
            ),
            None => Punch::open(
                parse_timestamp(field).map_err(|e| corrupt(format!("bad punch {field:?}: {e}")))?,
            ),
        };
        record.punches.push(punch);
    }
    Ok(record)
}

/// At most one project may have a running punch, and only the last project while clocked in.
fn check_clock_state(ledger: &Ledger) -> Result<(), LedgerError> {
    let mut open = ledger
        .projects
        .iter()
        .enumerate()
        .filter(|(_, v)| v.open_punch().is_some());

    let first_open = open.next();
    if let Some((index, record)) = open.next() {
        return Err(LedgerError::corrupt(
            HEADER_LINES + index + 1,
            format!("project '{}' is a second project with an open punch", record.name),
        ));
    }

    match (ledger.state, first_open) {
        (ClockState::Out, None) => Ok(()),
        (ClockState::Out, Some((_, record))) => Err(LedgerError::corrupt(
            3,
            format!("clocked out, but '{}' has an open punch", record.name),
        )),
        (ClockState::In, None) => Err(LedgerError::corrupt(
            3,
            "clocked in, but no project has an open punch",
        )),
        (ClockState::In, Some((_, record))) if Some(&record.name) != ledger.last_project.as_ref() => {
            Err(LedgerError::corrupt(
                2,
                format!(
                    "clocked in to '{}', but it is not the last project",
                    record.name
                ),
            ))
        }
        (ClockState::In, Some(_)) => Ok(()),
    }
}
