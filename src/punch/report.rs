//! Results of punch operations. They carry raw values only, rendering is up to the caller.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::ledger::{ProjectName, Punch};

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct ClockInReport {
    pub project: ProjectName,
    pub time_in: NaiveDateTime,
    pub created: bool,
    /// Total before this punch, the new punch has no duration yet.
    #[serde(with = "duration_ser")]
    pub total: Duration,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct ClockOutReport {
    pub project: ProjectName,
    pub time_in: NaiveDateTime,
    pub time_out: NaiveDateTime,
    #[serde(with = "duration_ser")]
    pub punch: Duration,
    #[serde(with = "duration_ser")]
    pub total: Duration,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct ProjectTotal {
    pub project: ProjectName,
    #[serde(with = "duration_ser")]
    pub total: Duration,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwitchReport {
    /// Clocked out, only the last project changed.
    Renamed {
        from: Option<ProjectTotal>,
        to: ProjectTotal,
        created: bool,
        now: NaiveDateTime,
    },
    /// Clocked in, the running punch moved to another project.
    Switched {
        clock_out: ClockOutReport,
        clock_in: ClockInReport,
    },
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusReport {
    NoHistory,
    ClockedOut {
        project: ProjectName,
        #[serde(with = "duration_ser")]
        total: Duration,
    },
    ClockedIn {
        project: ProjectName,
        time_in: NaiveDateTime,
        now: NaiveDateTime,
        /// Includes the running punch.
        #[serde(with = "duration_ser")]
        total: Duration,
        #[serde(with = "duration_ser")]
        current_punch: Duration,
    },
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project: ProjectName,
    /// False when the project has never been clocked into or switched to.
    pub exists: bool,
    pub is_current: bool,
    pub clocked_in: bool,
    /// Project that is clocked in instead of this one.
    pub active_project: Option<ProjectName>,
    /// Includes the running punch.
    #[serde(with = "duration_ser")]
    pub total: Duration,
    #[serde(with = "option_duration_ser")]
    pub current_punch: Option<Duration>,
    pub punch_count: usize,
    pub punches: Vec<Punch>,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct ListEntry {
    pub project: ProjectName,
    /// Closed punches only.
    #[serde(with = "duration_ser")]
    pub total: Duration,
    /// Duration of the running punch, shown next to the total.
    #[serde(with = "option_duration_ser")]
    pub running: Option<Duration>,
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize)]
pub struct ListReport {
    pub last_project: Option<ProjectName>,
    pub clocked_in: bool,
    pub projects: Vec<ListEntry>,
}

mod duration_ser {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_seconds())
    }
}

mod option_duration_ser {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(v) => serializer.serialize_some(&v.num_seconds()),
            None => serializer.serialize_none(),
        }
    }
}
