//! State machine over the ledger. Every operation works on a loaded [Ledger](crate::ledger::Ledger)
//! and receives the current time explicitly, nothing here touches the disk or the system clock.
//!
//! There are two states, clocked out and clocked in to the last project:
//!  - [clock_in] moves from out to in.
//!  - [clock_out] moves from in to out.
//!  - [switch_project] keeps the state and changes the project.
//!  - [status], [project_report] and [list_projects] only read.

pub mod operations;
pub mod report;

pub use operations::{clock_in, clock_out, list_projects, project_report, status, switch_project};
pub use report::{
    ClockInReport, ClockOutReport, ListEntry, ListReport, ProjectReport, ProjectTotal,
    StatusReport, SwitchReport,
};
