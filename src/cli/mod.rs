pub mod alias;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    ledger::{LedgerFileStore, LedgerStore, ProjectName},
    punch::{
        self, ClockInReport, ClockOutReport, ListReport, ProjectReport, StatusReport,
        SwitchReport,
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, default_rc_file, LEDGER_FILE},
        logging::enable_logging,
        time::TimeOfDay,
    },
};

#[derive(Parser, Debug)]
#[command(name = "workclock", version, long_about = None)]
#[command(about = "Clock in and out of projects and keep track of the hours", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        env = "WORKCLOCK_FILE",
        help = "Ledger file. By default it is punches.txt in $XDG_STATE_HOME/workclock or $HOME/.local/state/workclock"
    )]
    file: Option<PathBuf>,
    #[arg(long, global = true, help = "Print reports as JSON")]
    json: bool,
    #[arg(long, global = true, help = "Mirror logs to stderr")]
    log: bool,
    #[arg(long = "log-filter", global = true, help = "Log level, overrides RUST_LOG")]
    log_filter: Option<LevelFilter>,
}

/// Running without a command prints the status.
#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Clock in. Uses the last project if none is given. HH:MM backdates the clock-in to earlier today"
    )]
    In {
        #[arg(value_name = "PROJECT")]
        project: Option<String>,
        #[arg(value_name = "HH:MM")]
        at: Option<TimeOfDay>,
    },
    #[command(about = "Clock out of the current project. HH:MM backdates the clock-out to earlier today")]
    Out {
        #[arg(value_name = "HH:MM")]
        at: Option<TimeOfDay>,
    },
    #[command(
        visible_alias = "change",
        about = "Move the running punch to another project, or only change the last project when clocked out"
    )]
    Switch {
        project: ProjectName,
        #[arg(value_name = "HH:MM")]
        at: Option<TimeOfDay>,
    },
    #[command(about = "Full report on a project, the current one by default")]
    Project { project: Option<ProjectName> },
    #[command(about = "List all projects with their totals")]
    List,
    #[command(about = "Append a shell alias for this executable to a startup file")]
    Alias {
        #[arg(default_value = "clock")]
        name: String,
        #[arg(help = "Startup file, ~/.bashrc by default")]
        rc_file: Option<PathBuf>,
    },
}

/// Everything a ledger command can produce.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Status(StatusReport),
    ClockIn(ClockInReport),
    ClockOut(ClockOutReport),
    Switch(SwitchReport),
    Project(ProjectReport),
    List(ListReport),
}

/// Ledger commands, separated from argument parsing so they can be run against any store.
#[derive(Debug, Clone)]
pub enum LedgerCommand {
    Status,
    In {
        project: Option<ProjectName>,
        at: Option<TimeOfDay>,
    },
    Out {
        at: Option<TimeOfDay>,
    },
    Switch {
        project: ProjectName,
        at: Option<TimeOfDay>,
    },
    Project {
        project: Option<ProjectName>,
    },
    List,
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    let logging_level = args.log_filter.or(if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    });
    enable_logging(&app_dir, logging_level, args.log)?;

    let command = match args.commands {
        Some(Commands::Alias { name, rc_file }) => {
            let default_rc = default_rc_file()?;
            let rc_file = rc_file.unwrap_or_else(|| default_rc.clone());
            alias::install_alias(&name, &rc_file, &std::env::current_exe()?, args.file.as_deref())?;
            println!("Alias '{name}' added to {}", rc_file.display());
            if rc_file == default_rc {
                println!("All new terminals opened will reflect this change.");
            }
            return Ok(());
        }
        Some(Commands::In { project, at }) => {
            let (project, at) = split_in_args(project, at)?;
            LedgerCommand::In { project, at }
        }
        Some(Commands::Out { at }) => LedgerCommand::Out { at },
        Some(Commands::Switch { project, at }) => LedgerCommand::Switch { project, at },
        Some(Commands::Project { project }) => LedgerCommand::Project { project },
        Some(Commands::List) => LedgerCommand::List,
        None => LedgerCommand::Status,
    };

    let path = args.file.unwrap_or_else(|| app_dir.join(LEDGER_FILE));
    let store = LedgerFileStore::new(path, Box::new(DefaultClock))?;
    debug!("Using ledger {:?}", store.path());

    let output = execute(command, &store, &DefaultClock)?;
    output::print(&output, args.json)
}

/// `in 13:05` backdates a clock-in to the last project, the same as `in` followed by a time.
fn split_in_args(
    project: Option<String>,
    at: Option<TimeOfDay>,
) -> Result<(Option<ProjectName>, Option<TimeOfDay>)> {
    match (project, at) {
        (Some(first), None) if first.contains(':') => Ok((None, Some(first.parse()?))),
        (project, at) => Ok((project.map(|v| ProjectName::new(&v)).transpose()?, at)),
    }
}

/// Runs one command. Mutating commands go through a single locked load-mutate-save cycle, queries
/// only load.
pub fn execute(
    command: LedgerCommand,
    store: &impl LedgerStore,
    clock: &dyn Clock,
) -> Result<CommandOutput> {
    let now = clock.now();
    let output = match command {
        LedgerCommand::Status => CommandOutput::Status(punch::status(&store.load()?, now)),
        LedgerCommand::List => CommandOutput::List(punch::list_projects(&store.load()?, now)),
        LedgerCommand::Project { project } => {
            CommandOutput::Project(punch::project_report(&store.load()?, project, now)?)
        }
        LedgerCommand::In { project, at } => CommandOutput::ClockIn(
            store.update(|ledger| punch::clock_in(ledger, project, at, now))?,
        ),
        LedgerCommand::Out { at } => {
            CommandOutput::ClockOut(store.update(|ledger| punch::clock_out(ledger, at, now))?)
        }
        LedgerCommand::Switch { project, at } => CommandOutput::Switch(
            store.update(|ledger| punch::switch_project(ledger, project, at, now))?,
        ),
    };
    Ok(output)
}
