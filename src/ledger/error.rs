use chrono::NaiveDateTime;
use thiserror::Error;

/// Every failure the ledger and punch operations can report. None of these are fatal by
/// themselves, the caller decides how to present them.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("corrupt ledger at line {line}: {reason}")]
    CorruptLedger { line: usize, reason: String },

    #[error("no project specified and there is no project history yet")]
    NoProjectSpecified,

    #[error("already clocked in to '{project}'; clock out first, with an HH:MM time if the clock-out was missed")]
    AlreadyClockedIn { project: String },

    #[error("already clocked out; clock in first, with an HH:MM time if the clock-in was missed")]
    AlreadyClockedOut,

    #[error("clock-out time {time_out} is not after clock-in time {time_in}; if the clock-out was after midnight, punch out at midnight and punch in again")]
    InvalidClockOutTime {
        time_in: NaiveDateTime,
        time_out: NaiveDateTime,
    },

    #[error("time {time} is later than the current time {now}")]
    FutureTime {
        time: NaiveDateTime,
        now: NaiveDateTime,
    },

    #[error("invalid project name {name:?}: {reason}")]
    InvalidProjectName { name: String, reason: &'static str },

    #[error("ledger file error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub(crate) fn corrupt(line: usize, reason: impl Into<String>) -> Self {
        LedgerError::CorruptLedger {
            line,
            reason: reason.into(),
        }
    }
}
