use anyhow::Result;

use crate::{
    ledger::Punch,
    punch::{
        ClockInReport, ClockOutReport, ListReport, ProjectReport, StatusReport, SwitchReport,
    },
    utils::time::{format_duration, format_timestamp},
};

use super::CommandOutput;

const YES: &str = "YES";
const NO: &str = "NO";

pub fn print(output: &CommandOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
    } else {
        println!("{}", render(output));
    }
    Ok(())
}

pub fn render(output: &CommandOutput) -> String {
    let lines = match output {
        CommandOutput::Status(v) => render_status(v),
        CommandOutput::ClockIn(v) => render_clock_in(v),
        CommandOutput::ClockOut(v) => render_clock_out(v),
        CommandOutput::Switch(v) => render_switch(v),
        CommandOutput::Project(v) => render_project(v),
        CommandOutput::List(v) => render_list(v),
    };
    lines.join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value {
        YES
    } else {
        NO
    }
}

fn render_clock_in(report: &ClockInReport) -> Vec<String> {
    let mut lines = vec![];
    if report.created {
        lines.push(format!("Created Project: '{}'", report.project));
    }
    lines.push(format!("CLOCK IN, Project: '{}'", report.project));
    lines.push(format!("IN: {}", format_timestamp(report.time_in)));
    lines.push(format!(
        "'{}' Total Hrs: {}",
        report.project,
        format_duration(report.total)
    ));
    lines
}

fn render_clock_out(report: &ClockOutReport) -> Vec<String> {
    vec![
        format!("CLOCK OUT, Project: '{}'", report.project),
        format!(
            "IN: {}, OUT: {}",
            format_timestamp(report.time_in),
            format_timestamp(report.time_out)
        ),
        format!(
            "'{}' Total Hrs: {}, Current Punch: {}",
            report.project,
            format_duration(report.total),
            format_duration(report.punch)
        ),
    ]
}

fn render_switch(report: &SwitchReport) -> Vec<String> {
    match report {
        SwitchReport::Renamed {
            from,
            to,
            created,
            now,
        } => {
            let mut lines = vec![];
            if *created {
                lines.push(format!("Created Project: '{}'", to.project));
            }
            match from {
                Some(from) => {
                    lines.push(format!(
                        "CURRENTLY CLOCKED OUT, Project Switched From: '{}', To: '{}'",
                        from.project, to.project
                    ));
                    lines.push(format!("NOW: {}", format_timestamp(*now)));
                    lines.push(format!(
                        "'{}' Total Hrs: {}",
                        from.project,
                        format_duration(from.total)
                    ));
                }
                None => {
                    lines.push(format!(
                        "CURRENTLY CLOCKED OUT, Project Switched To: '{}'",
                        to.project
                    ));
                    lines.push(format!("NOW: {}", format_timestamp(*now)));
                }
            }
            lines.push(format!(
                "'{}' Total Hrs: {}",
                to.project,
                format_duration(to.total)
            ));
            lines
        }
        SwitchReport::Switched {
            clock_out,
            clock_in,
        } => {
            let mut lines = vec![];
            if clock_in.created {
                lines.push(format!("Created Project: '{}'", clock_in.project));
            }
            lines.push(format!("CLOCK OUT, Project: '{}'", clock_out.project));
            lines.push(format!("CLOCK IN,  Project: '{}'", clock_in.project));
            lines.push(format!(
                "'{}' IN: {}, NOW: {}",
                clock_out.project,
                format_timestamp(clock_out.time_in),
                format_timestamp(clock_out.time_out)
            ));
            lines.push(format!(
                "'{}' Total Hrs: {}, Current Punch: {}",
                clock_out.project,
                format_duration(clock_out.total),
                format_duration(clock_out.punch)
            ));
            lines.push(format!(
                "'{}' Total Hrs: {}",
                clock_in.project,
                format_duration(clock_in.total)
            ));
            lines
        }
    }
}

fn render_status(report: &StatusReport) -> Vec<String> {
    match report {
        StatusReport::NoHistory => vec!["No punches yet, no status to check.".to_string()],
        StatusReport::ClockedOut { project, total } => vec![
            format!("CURRENTLY CLOCKED OUT, Last Project: '{project}'"),
            format!("'{project}' Total Hrs: {}", format_duration(*total)),
        ],
        StatusReport::ClockedIn {
            project,
            time_in,
            now,
            total,
            current_punch,
        } => vec![
            format!("CURRENTLY CLOCKED IN, Project: '{project}'"),
            format!(
                "IN: {}, NOW: {}",
                format_timestamp(*time_in),
                format_timestamp(*now)
            ),
            format!(
                "'{project}' Total Hrs: {}, Current Punch: {}",
                format_duration(*total),
                format_duration(*current_punch)
            ),
        ],
    }
}

fn render_punch(punch: &Punch) -> String {
    match punch.time_out {
        Some(out) => format!(
            "{} -> {}",
            format_timestamp(punch.time_in),
            format_timestamp(out)
        ),
        None => format!("{} -> open", format_timestamp(punch.time_in)),
    }
}

fn render_project(report: &ProjectReport) -> Vec<String> {
    let mut lines = vec![];
    if !report.exists {
        lines.push(format!("Unknown Project: '{}'", report.project));
    }
    lines.push(format!("PROJECT REPORT FOR: '{}'", report.project));

    let clocked_in = match &report.active_project {
        Some(other) => format!("'{other}'"),
        None => yes_no(report.clocked_in).to_string(),
    };
    lines.push(format!(
        "Is Current: {}, Clocked In: {clocked_in}",
        yes_no(report.is_current)
    ));

    let running = report
        .current_punch
        .map(|v| format!(", Current Punch: {}", format_duration(v)))
        .unwrap_or_default();
    lines.push(format!(
        "Total Hrs: {}{running}",
        format_duration(report.total)
    ));
    lines.push(format!("Number of Clock-Ins: {}", report.punch_count));
    lines.push("PUNCHES:".to_string());
    lines.extend(report.punches.iter().map(|v| format!("\t{}", render_punch(v))));
    lines
}

fn render_list(report: &ListReport) -> Vec<String> {
    let label = if report.clocked_in { "Current" } else { "Last" };
    let last = report
        .last_project
        .as_ref()
        .map(|v| format!("'{v}'"))
        .unwrap_or_else(|| "none".to_string());

    let mut lines = vec![
        "WORK CLOCK PROJECTS".to_string(),
        format!("{label} Project: {last}"),
        format!("Clocked In: {}", yes_no(report.clocked_in)),
        "PROJECT \tTOTAL +current".to_string(),
    ];
    for entry in &report.projects {
        let running = entry
            .running
            .map(|v| format!(" +{}", format_duration(v)))
            .unwrap_or_default();
        lines.push(format!(
            "{:15} {}{running}",
            entry.project.as_str(),
            format_duration(entry.total)
        ));
    }
    lines
}
