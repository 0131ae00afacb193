use std::{fmt::Display, ops::Deref, str::FromStr};

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::error::LedgerError;

/// Normalized project key. Project names are case insensitive and the original casing is
/// discarded, so the key is also what gets displayed.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn new(name: &str) -> Result<Self, LedgerError> {
        let normalized = name.trim().to_lowercase();
        let invalid = |reason| LedgerError::InvalidProjectName {
            name: name.to_string(),
            reason,
        };
        if normalized.is_empty() {
            return Err(invalid("name is empty"));
        }
        // `|` separates the fields of a project line
        if normalized.contains('|') {
            return Err(invalid("name contains '|'"));
        }
        if normalized.chars().any(char::is_control) {
            return Err(invalid("name contains control characters"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ProjectName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectName {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectName::new(s)
    }
}

/// A single clock-in. `time_out` is missing while the punch is still running.
#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct Punch {
    pub time_in: NaiveDateTime,
    pub time_out: Option<NaiveDateTime>,
}

impl Punch {
    pub fn open(time_in: NaiveDateTime) -> Self {
        Self {
            time_in,
            time_out: None,
        }
    }

    pub fn closed(time_in: NaiveDateTime, time_out: NaiveDateTime) -> Self {
        Self {
            time_in,
            time_out: Some(time_out),
        }
    }

    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }

    /// Duration of a closed punch.
    pub fn duration(&self) -> Option<Duration> {
        self.time_out.map(|out| out - self.time_in)
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ProjectRecord {
    pub name: ProjectName,
    pub punches: Vec<Punch>,
}

impl ProjectRecord {
    pub fn new(name: ProjectName) -> Self {
        Self {
            name,
            punches: Vec::new(),
        }
    }

    /// The running punch. Only the last punch of a project can be open.
    pub fn open_punch(&self) -> Option<&Punch> {
        self.punches.last().filter(|v| v.is_open())
    }

    pub fn open_punch_mut(&mut self) -> Option<&mut Punch> {
        self.punches.last_mut().filter(|v| v.is_open())
    }

    /// Sum of all closed punches. When `as_of` is given the running punch is counted up to that
    /// moment as well. Every total in the application goes through this function.
    pub fn compute_total(&self, as_of: Option<NaiveDateTime>) -> Duration {
        let closed = self
            .punches
            .iter()
            .filter_map(Punch::duration)
            .fold(Duration::zero(), |acc, v| acc + v);
        match (as_of, self.open_punch()) {
            (Some(as_of), Some(open)) => closed + (as_of - open.time_in),
            _ => closed,
        }
    }
}

/// Global clocked in/out state. Derived once when a ledger is decoded.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Out,
    In,
}

impl ClockState {
    pub fn is_in(self) -> bool {
        self == ClockState::In
    }
}

/// The whole persisted state. Projects keep the order in which they were first seen.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Ledger {
    pub created_at: NaiveDateTime,
    pub last_project: Option<ProjectName>,
    pub state: ClockState,
    pub projects: Vec<ProjectRecord>,
}

impl Ledger {
    pub fn new(created_at: NaiveDateTime) -> Self {
        Self {
            created_at,
            last_project: None,
            state: ClockState::Out,
            projects: Vec::new(),
        }
    }

    pub fn project(&self, name: &ProjectName) -> Option<&ProjectRecord> {
        self.projects.iter().find(|v| &v.name == name)
    }

    pub fn project_mut(&mut self, name: &ProjectName) -> Option<&mut ProjectRecord> {
        self.projects.iter_mut().find(|v| &v.name == name)
    }

    /// Returns the record for `name`, appending an empty one if it doesn't exist yet. The flag is
    /// true when the record was created by this call.
    pub fn find_or_create(&mut self, name: &ProjectName) -> (&mut ProjectRecord, bool) {
        match self.projects.iter().position(|v| &v.name == name) {
            Some(index) => (&mut self.projects[index], false),
            None => {
                self.projects.push(ProjectRecord::new(name.clone()));
                let last = self.projects.len() - 1;
                (&mut self.projects[last], true)
            }
        }
    }

    /// Project with the running punch, if clocked in.
    pub fn active_project(&self) -> Option<&ProjectRecord> {
        match self.state {
            ClockState::In => self.last_project.as_ref().and_then(|v| self.project(v)),
            ClockState::Out => None,
        }
    }
}
