use chrono::{Duration, NaiveDateTime};
use tracing::{info, instrument};

use crate::{
    ledger::{ClockState, Ledger, LedgerError, ProjectName, Punch},
    utils::time::TimeOfDay,
};

use super::report::{
    ClockInReport, ClockOutReport, ListEntry, ListReport, ProjectReport, ProjectTotal,
    StatusReport, SwitchReport,
};

/// Turns an optional `HH:MM` correction into a timestamp on the current date.
fn resolve_time(at: Option<TimeOfDay>, now: NaiveDateTime) -> Result<NaiveDateTime, LedgerError> {
    match at {
        None => Ok(now),
        Some(at) => {
            let time = at.on(now.date());
            if time > now {
                Err(LedgerError::FutureTime { time, now })
            } else {
                Ok(time)
            }
        }
    }
}

/// Starts a punch for `project`, or for the last project if none is given. `at` backdates the
/// punch to a time earlier today.
#[instrument(skip(ledger))]
pub fn clock_in(
    ledger: &mut Ledger,
    project: Option<ProjectName>,
    at: Option<TimeOfDay>,
    now: NaiveDateTime,
) -> Result<ClockInReport, LedgerError> {
    if ledger.state.is_in() {
        return Err(LedgerError::AlreadyClockedIn {
            project: ledger
                .last_project
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        });
    }
    let project = project
        .or_else(|| ledger.last_project.clone())
        .ok_or(LedgerError::NoProjectSpecified)?;
    let time_in = resolve_time(at, now)?;

    Ok(open_punch(ledger, project, time_in))
}

/// Closes the running punch. `at` backdates the clock-out to a time earlier today, which has to
/// be after the clock-in.
#[instrument(skip(ledger))]
pub fn clock_out(
    ledger: &mut Ledger,
    at: Option<TimeOfDay>,
    now: NaiveDateTime,
) -> Result<ClockOutReport, LedgerError> {
    let project = match (ledger.state, &ledger.last_project) {
        (ClockState::In, Some(current)) => current.clone(),
        _ => return Err(LedgerError::AlreadyClockedOut),
    };
    let time_out = resolve_time(at, now)?;

    close_punch(ledger, &project, time_out, at.is_some())
}

/// When clocked in, clocks out of the current project and into `project` at the same instant.
/// When clocked out, only changes the last project.
#[instrument(skip(ledger))]
pub fn switch_project(
    ledger: &mut Ledger,
    project: ProjectName,
    at: Option<TimeOfDay>,
    now: NaiveDateTime,
) -> Result<SwitchReport, LedgerError> {
    let time = resolve_time(at, now)?;

    match (ledger.state, ledger.last_project.clone()) {
        (ClockState::In, Some(current)) => {
            let clock_out = close_punch(ledger, &current, time, at.is_some())?;
            let clock_in = open_punch(ledger, project, time);
            Ok(SwitchReport::Switched {
                clock_out,
                clock_in,
            })
        }
        (_, previous) => {
            let from = previous.map(|name| ProjectTotal {
                total: project_total(ledger, &name, None),
                project: name,
            });
            let (record, created) = ledger.find_or_create(&project);
            let to = ProjectTotal {
                project: project.clone(),
                total: record.compute_total(None),
            };
            info!("Switched last project to '{project}' while clocked out");
            ledger.last_project = Some(project);
            Ok(SwitchReport::Renamed {
                from,
                to,
                created,
                now: time,
            })
        }
    }
}

fn open_punch(ledger: &mut Ledger, project: ProjectName, time_in: NaiveDateTime) -> ClockInReport {
    let (record, created) = ledger.find_or_create(&project);
    let total = record.compute_total(None);
    record.punches.push(Punch::open(time_in));
    if created {
        info!("Created project '{project}'");
    }
    info!("Clocked in to '{project}' at {time_in}");

    ledger.last_project = Some(project.clone());
    ledger.state = ClockState::In;

    ClockInReport {
        project,
        time_in,
        created,
        total,
    }
}

/// Validation happens before anything is touched, so a failure leaves the ledger as it was.
fn close_punch(
    ledger: &mut Ledger,
    project: &ProjectName,
    time_out: NaiveDateTime,
    backdated: bool,
) -> Result<ClockOutReport, LedgerError> {
    let record = ledger
        .project_mut(project)
        .ok_or(LedgerError::AlreadyClockedOut)?;
    let punch = record
        .open_punch_mut()
        .ok_or(LedgerError::AlreadyClockedOut)?;

    let time_in = punch.time_in;
    let invalid = if backdated {
        time_out <= time_in
    } else {
        time_out < time_in
    };
    if invalid {
        return Err(LedgerError::InvalidClockOutTime { time_in, time_out });
    }
    punch.time_out = Some(time_out);

    let total = record.compute_total(None);
    info!("Clocked out of '{project}' at {time_out}");
    ledger.state = ClockState::Out;

    Ok(ClockOutReport {
        project: project.clone(),
        time_in,
        time_out,
        punch: time_out - time_in,
        total,
    })
}

fn project_total(ledger: &Ledger, name: &ProjectName, as_of: Option<NaiveDateTime>) -> Duration {
    ledger
        .project(name)
        .map(|v| v.compute_total(as_of))
        .unwrap_or_else(Duration::zero)
}

pub fn status(ledger: &Ledger, now: NaiveDateTime) -> StatusReport {
    let running = ledger
        .active_project()
        .and_then(|record| record.open_punch().map(|punch| (record, punch)));

    match (running, &ledger.last_project) {
        (Some((record, punch)), _) => StatusReport::ClockedIn {
            project: record.name.clone(),
            time_in: punch.time_in,
            now,
            total: record.compute_total(Some(now)),
            current_punch: now - punch.time_in,
        },
        (None, Some(project)) => StatusReport::ClockedOut {
            project: project.clone(),
            total: project_total(ledger, project, None),
        },
        (None, None) => StatusReport::NoHistory,
    }
}

/// Full report on `project`, or on the last project if none is given. Unknown projects are
/// reported as empty instead of being created.
pub fn project_report(
    ledger: &Ledger,
    project: Option<ProjectName>,
    now: NaiveDateTime,
) -> Result<ProjectReport, LedgerError> {
    let project = project
        .or_else(|| ledger.last_project.clone())
        .ok_or(LedgerError::NoProjectSpecified)?;

    let is_current = ledger.last_project.as_ref() == Some(&project);
    let active = ledger.active_project();
    let clocked_in = active.is_some_and(|v| v.name == project);
    let active_project = active.filter(|v| v.name != project).map(|v| v.name.clone());

    let record = ledger.project(&project);
    let punches = record.map(|v| v.punches.clone()).unwrap_or_default();
    let current_punch = record
        .and_then(|v| v.open_punch())
        .map(|punch| now - punch.time_in);

    Ok(ProjectReport {
        exists: record.is_some(),
        is_current,
        clocked_in,
        active_project,
        total: project_total(ledger, &project, Some(now)),
        current_punch,
        punch_count: punches.len(),
        punches,
        project,
    })
}

/// Every project in the order it was first seen. Totals only count closed punches, the running
/// punch is reported separately.
pub fn list_projects(ledger: &Ledger, now: NaiveDateTime) -> ListReport {
    let projects = ledger
        .projects
        .iter()
        .map(|record| ListEntry {
            project: record.name.clone(),
            total: record.compute_total(None),
            running: record.open_punch().map(|punch| now - punch.time_in),
        })
        .collect();

    ListReport {
        last_project: ledger.last_project.clone(),
        clocked_in: ledger.state.is_in(),
        projects,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        ledger::{codec, ClockState, Ledger, LedgerError, ProjectName, Punch},
        punch::report::{ListEntry, ProjectTotal, StatusReport, SwitchReport},
        utils::time::{format_duration, TimeOfDay},
    };

    use super::{clock_in, clock_out, list_projects, project_report, status, switch_project};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn at(hours: i64, minutes: i64) -> NaiveDateTime {
        TEST_START_DATE + Duration::hours(hours) + Duration::minutes(minutes)
    }

    fn time(hour: u32, minute: u32) -> Option<TimeOfDay> {
        TimeOfDay::new_opt(hour, minute)
    }

    fn name(value: &str) -> ProjectName {
        ProjectName::new(value).unwrap()
    }

    /// Fresh ledger, clocked into alpha at 09:00.
    fn alpha_at_nine() -> Result<Ledger> {
        let mut ledger = Ledger::new(TEST_START_DATE);
        clock_in(&mut ledger, Some(name("alpha")), None, at(9, 0))?;
        Ok(ledger)
    }

    #[test]
    fn test_first_clock_in() -> Result<()> {
        let mut ledger = Ledger::new(TEST_START_DATE);

        let report = clock_in(&mut ledger, Some(name("Alpha")), None, at(9, 0))?;

        assert!(report.created);
        assert_eq!(report.project, name("alpha"));
        assert_eq!(report.time_in, at(9, 0));
        assert_eq!(report.total, Duration::zero());
        assert_eq!(ledger.state, ClockState::In);
        assert_eq!(ledger.last_project, Some(name("alpha")));
        assert_eq!(ledger.projects.len(), 1);
        assert_eq!(ledger.projects[0].punches, vec![Punch::open(at(9, 0))]);
        Ok(())
    }

    #[test]
    fn test_clock_out_closes_punch() -> Result<()> {
        let mut ledger = alpha_at_nine()?;

        let report = clock_out(&mut ledger, None, at(17, 30))?;

        assert_eq!(format_duration(report.punch), "8:30:00");
        assert_eq!(format_duration(report.total), "8:30:00");
        assert_eq!(report.time_in, at(9, 0));
        assert_eq!(report.time_out, at(17, 30));
        assert_eq!(ledger.state, ClockState::Out);
        assert_eq!(
            format_duration(ledger.projects[0].compute_total(None)),
            "8:30:00"
        );
        Ok(())
    }

    #[test]
    fn test_clock_in_defaults_to_last_project() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        clock_out(&mut ledger, None, at(17, 30))?;

        let report = clock_in(&mut ledger, None, None, at(18, 0))?;

        assert!(!report.created);
        assert_eq!(report.project, name("alpha"));
        assert_eq!(format_duration(report.total), "8:30:00");
        assert_eq!(ledger.projects.len(), 1);
        assert_eq!(ledger.projects[0].punches.len(), 2);
        assert_eq!(ledger.state, ClockState::In);
        Ok(())
    }

    #[test]
    fn test_clock_in_without_history() {
        let mut ledger = Ledger::new(TEST_START_DATE);
        let result = clock_in(&mut ledger, None, None, at(9, 0));
        assert!(matches!(result, Err(LedgerError::NoProjectSpecified)));
        assert_eq!(ledger, Ledger::new(TEST_START_DATE));
    }

    #[test]
    fn test_clock_in_twice_fails_without_changes() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        let before = ledger.clone();

        let result = clock_in(&mut ledger, Some(name("beta")), None, at(10, 0));

        match result {
            Err(LedgerError::AlreadyClockedIn { project }) => assert_eq!(project, "alpha"),
            other => panic!("expected AlreadyClockedIn, got {other:?}"),
        }
        assert_eq!(ledger, before);
        Ok(())
    }

    #[test]
    fn test_clock_out_twice_fails_without_changes() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        clock_out(&mut ledger, None, at(12, 0))?;
        let before = ledger.clone();

        let result = clock_out(&mut ledger, None, at(13, 0));

        assert!(matches!(result, Err(LedgerError::AlreadyClockedOut)));
        assert_eq!(ledger, before);

        let mut fresh = Ledger::new(TEST_START_DATE);
        assert!(matches!(
            clock_out(&mut fresh, None, at(13, 0)),
            Err(LedgerError::AlreadyClockedOut)
        ));
        Ok(())
    }

    #[test]
    fn test_backdated_clock_in() -> Result<()> {
        let mut ledger = Ledger::new(TEST_START_DATE);

        let report = clock_in(&mut ledger, Some(name("alpha")), time(13, 5), at(15, 0))?;

        assert_eq!(report.time_in, at(13, 5));
        assert_eq!(ledger.projects[0].punches, vec![Punch::open(at(13, 5))]);
        Ok(())
    }

    #[test]
    fn test_backdated_clock_out() -> Result<()> {
        let mut ledger = alpha_at_nine()?;

        let report = clock_out(&mut ledger, time(12, 15), at(20, 0))?;

        assert_eq!(report.time_out, at(12, 15));
        assert_eq!(format_duration(report.punch), "3:15:00");
        Ok(())
    }

    #[test]
    fn test_backdated_clock_out_before_clock_in_fails() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        let before = ledger.clone();

        for out in [time(9, 0), time(8, 59)] {
            let result = clock_out(&mut ledger, out, at(20, 0));
            assert!(matches!(
                result,
                Err(LedgerError::InvalidClockOutTime { .. })
            ));
            assert_eq!(ledger, before);
        }
        Ok(())
    }

    #[test]
    fn test_backdating_into_the_future_fails() -> Result<()> {
        let mut ledger = Ledger::new(TEST_START_DATE);
        let result = clock_in(&mut ledger, Some(name("alpha")), time(10, 0), at(9, 0));
        assert!(matches!(result, Err(LedgerError::FutureTime { .. })));
        assert_eq!(ledger, Ledger::new(TEST_START_DATE));

        let mut ledger = alpha_at_nine()?;
        let before = ledger.clone();
        let result = clock_out(&mut ledger, time(12, 0), at(11, 0));
        assert!(matches!(result, Err(LedgerError::FutureTime { .. })));
        assert_eq!(ledger, before);
        Ok(())
    }

    #[test]
    fn test_clock_out_of_punch_from_previous_day() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        let next_morning = at(24 + 8, 0);

        let report = clock_out(&mut ledger, time(1, 0), next_morning)?;

        assert_eq!(report.time_out, at(25, 0));
        assert_eq!(format_duration(report.punch), "16:00:00");
        Ok(())
    }

    #[test]
    fn test_switch_while_clocked_in() -> Result<()> {
        let mut ledger = alpha_at_nine()?;

        let report = switch_project(&mut ledger, name("beta"), None, at(12, 0))?;

        let SwitchReport::Switched {
            clock_out,
            clock_in,
        } = report
        else {
            panic!("expected a switch between running punches");
        };
        assert_eq!(clock_out.project, name("alpha"));
        assert_eq!(format_duration(clock_out.total), "3:00:00");
        assert_eq!(clock_in.project, name("beta"));
        assert!(clock_in.created);
        assert_eq!(clock_out.time_out, clock_in.time_in);

        assert_eq!(ledger.last_project, Some(name("beta")));
        assert_eq!(ledger.state, ClockState::In);
        assert_eq!(ledger.projects[0].open_punch(), None);
        assert_eq!(ledger.projects[1].punches, vec![Punch::open(at(12, 0))]);
        Ok(())
    }

    #[test]
    fn test_backdated_switch_has_no_gap() -> Result<()> {
        let mut ledger = alpha_at_nine()?;

        switch_project(&mut ledger, name("beta"), time(11, 45), at(12, 0))?;

        let alpha_out = ledger.projects[0].punches[0].time_out;
        let beta_in = ledger.projects[1].punches[0].time_in;
        assert_eq!(alpha_out, Some(at(11, 45)));
        assert_eq!(alpha_out, Some(beta_in));
        Ok(())
    }

    #[test]
    fn test_invalid_backdated_switch_fails_without_changes() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        let before = ledger.clone();

        let result = switch_project(&mut ledger, name("beta"), time(8, 0), at(12, 0));

        assert!(matches!(
            result,
            Err(LedgerError::InvalidClockOutTime { .. })
        ));
        assert_eq!(ledger, before);
        Ok(())
    }

    #[test]
    fn test_switch_while_clocked_out() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        clock_out(&mut ledger, None, at(10, 0))?;

        let report = switch_project(&mut ledger, name("Beta"), None, at(11, 0))?;

        assert_eq!(
            report,
            SwitchReport::Renamed {
                from: Some(ProjectTotal {
                    project: name("alpha"),
                    total: Duration::hours(1),
                }),
                to: ProjectTotal {
                    project: name("beta"),
                    total: Duration::zero(),
                },
                created: true,
                now: at(11, 0),
            }
        );
        assert_eq!(ledger.last_project, Some(name("beta")));
        assert_eq!(ledger.state, ClockState::Out);
        assert!(ledger.projects[1].punches.is_empty());

        // The next clock-in without a project goes to the new project
        let report = clock_in(&mut ledger, None, None, at(12, 0))?;
        assert_eq!(report.project, name("beta"));
        assert!(!report.created);
        Ok(())
    }

    #[test]
    fn test_switch_on_fresh_ledger() -> Result<()> {
        let mut ledger = Ledger::new(TEST_START_DATE);

        let report = switch_project(&mut ledger, name("alpha"), None, at(9, 0))?;

        assert!(matches!(
            report,
            SwitchReport::Renamed {
                from: None,
                created: true,
                ..
            }
        ));
        assert_eq!(ledger.last_project, Some(name("alpha")));
        Ok(())
    }

    #[test]
    fn test_totals_across_many_punches() -> Result<()> {
        let mut ledger = Ledger::new(TEST_START_DATE);
        let spans = [(8, 0, 8, 45), (9, 10, 12, 0), (12, 30, 12, 31), (13, 0, 18, 2)];
        let mut expected = Duration::zero();
        for (in_h, in_m, out_h, out_m) in spans {
            clock_in(&mut ledger, Some(name("alpha")), None, at(in_h, in_m))?;
            clock_out(&mut ledger, None, at(out_h, out_m))?;
            expected = expected + (at(out_h, out_m) - at(in_h, in_m));
        }

        assert_eq!(ledger.projects[0].compute_total(None), expected);
        assert_eq!(format_duration(expected), "8:38:00");
        Ok(())
    }

    #[test]
    fn test_status() -> Result<()> {
        assert_eq!(
            status(&Ledger::new(TEST_START_DATE), at(9, 0)),
            StatusReport::NoHistory
        );

        let mut ledger = alpha_at_nine()?;
        assert_eq!(
            status(&ledger, at(10, 30)),
            StatusReport::ClockedIn {
                project: name("alpha"),
                time_in: at(9, 0),
                now: at(10, 30),
                total: Duration::minutes(90),
                current_punch: Duration::minutes(90),
            }
        );

        clock_out(&mut ledger, None, at(11, 0))?;
        assert_eq!(
            status(&ledger, at(15, 0)),
            StatusReport::ClockedOut {
                project: name("alpha"),
                total: Duration::hours(2),
            }
        );
        Ok(())
    }

    #[test]
    fn test_project_report() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        clock_out(&mut ledger, None, at(10, 0))?;
        clock_in(&mut ledger, None, None, at(11, 0))?;

        let report = project_report(&ledger, None, at(11, 30))?;

        assert_eq!(report.project, name("alpha"));
        assert!(report.exists);
        assert!(report.is_current);
        assert!(report.clocked_in);
        assert_eq!(report.active_project, None);
        assert_eq!(format_duration(report.total), "1:30:00");
        assert_eq!(report.current_punch, Some(Duration::minutes(30)));
        assert_eq!(report.punch_count, 2);
        assert_eq!(
            report.punches,
            vec![Punch::closed(at(9, 0), at(10, 0)), Punch::open(at(11, 0))]
        );
        Ok(())
    }

    #[test]
    fn test_project_report_for_other_projects() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        switch_project(&mut ledger, name("beta"), None, at(12, 0))?;

        let report = project_report(&ledger, Some(name("ALPHA")), at(13, 0))?;
        assert!(report.exists);
        assert!(!report.is_current);
        assert!(!report.clocked_in);
        assert_eq!(report.active_project, Some(name("beta")));
        assert_eq!(format_duration(report.total), "3:00:00");
        assert_eq!(report.current_punch, None);

        let report = project_report(&ledger, Some(name("gamma")), at(13, 0))?;
        assert!(!report.exists);
        assert_eq!(report.punch_count, 0);
        assert_eq!(report.total, Duration::zero());
        assert_eq!(ledger.projects.len(), 2);

        assert!(matches!(
            project_report(&Ledger::new(TEST_START_DATE), None, at(13, 0)),
            Err(LedgerError::NoProjectSpecified)
        ));
        Ok(())
    }

    #[test]
    fn test_list_projects_annotates_running_punch() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        switch_project(&mut ledger, name("beta"), None, at(12, 0))?;

        let report = list_projects(&ledger, at(13, 0));

        assert_eq!(report.last_project, Some(name("beta")));
        assert!(report.clocked_in);
        assert_eq!(
            report.projects,
            vec![
                ListEntry {
                    project: name("alpha"),
                    total: Duration::hours(3),
                    running: None,
                },
                ListEntry {
                    project: name("beta"),
                    total: Duration::zero(),
                    running: Some(Duration::hours(1)),
                },
            ]
        );
        assert_eq!(format_duration(report.projects[0].total), "3:00:00");
        assert_eq!(
            report.projects[1].running.map(format_duration).as_deref(),
            Some("1:00:00")
        );
        Ok(())
    }

    #[test]
    fn test_operations_survive_encoding() -> Result<()> {
        let mut ledger = alpha_at_nine()?;
        switch_project(&mut ledger, name("beta"), None, at(12, 0))?;
        let mut ledger = codec::decode(&codec::encode(&ledger))?;

        let report = clock_out(&mut ledger, None, at(13, 0))?;

        assert_eq!(report.project, name("beta"));
        assert_eq!(format_duration(report.total), "1:00:00");
        assert_eq!(ledger.state, ClockState::Out);
        Ok(())
    }

    #[test]
    fn test_clock_in_refuses_when_state_is_in_without_project() -> Result<()> {
        let mut ledger = Ledger::new(TEST_START_DATE);
        ledger.state = ClockState::In;
        let before = ledger.clone();

        let result = clock_in(&mut ledger, Some(name("alpha")), None, at(9, 0));

        assert!(matches!(result, Err(LedgerError::AlreadyClockedIn { .. })));
        assert_eq!(ledger, before);
        Ok(())
    }
}
