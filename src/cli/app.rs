//! Main CLI application structure

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use super::output::{Output, OutputFormat};
use super::{doc, event, roster, task};
use crate::domain::PersonId;
use crate::service::CoreError;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "lineup")]
#[command(author, version, about = "Local-first event planning with rosters and shared tasks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global `default_format`, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Act as this person instead of the configured user
    #[arg(long = "as", global = true, value_name = "PERSON")]
    pub actor: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new lineup project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Create events and move them through their lifecycle
    #[command(subcommand)]
    Event(event::EventCommands),

    /// Manage team members and contractors of an event
    #[command(subcommand)]
    Roster(roster::RosterCommands),

    /// Manage shared documents
    #[command(subcommand)]
    Doc(doc::DocCommands),

    /// Manage and assign tasks
    #[command(subcommand)]
    Task(task::TaskCommands),
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(|| {
            Config::load()
                .map(|config| config.global.default_format)
                .unwrap_or_default()
        })
    }
}

/// Main entry point for the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let output = Output::new(cli.output_format(), cli.verbose);
    output.verbose("Lineup CLI starting");

    match execute(cli.command, cli.actor.as_deref(), &output) {
        Ok(()) => {
            output.verbose("Command completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&output, &err);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands, actor: Option<&str>, output: &Output) -> Result<()> {
    match command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .lineup directory at: {}", project.lineup_dir().display()),
            );
            output.success(&format!(
                "Initialized lineup project at {}",
                project.root().display()
            ));
        }

        Commands::Event(cmd) => event::run(cmd, output, actor)?,
        Commands::Roster(cmd) => roster::run(cmd, output)?,
        Commands::Doc(cmd) => doc::run(cmd, output)?,
        Commands::Task(cmd) => task::run(cmd, output)?,
    }

    Ok(())
}

/// Prints an error, listing the blocking tasks of a refused removal
fn report(output: &Output, err: &anyhow::Error) {
    let blocking = err
        .downcast_ref::<CoreError>()
        .and_then(CoreError::blocking_tasks);

    if output.is_json() {
        let mut body = serde_json::json!({
            "success": false,
            "error": format!("{:#}", err),
        });
        if let Some(tasks) = blocking {
            body["blocking_tasks"] = serde_json::json!(tasks);
        }
        eprintln!("{}", body);
        return;
    }

    output.error(&format!("{:#}", err));
    if let Some(tasks) = blocking {
        eprintln!("Blocking tasks:");
        for task in tasks {
            eprintln!("  {}  {}  [{}]", task.id, task.title, task.status);
        }
        eprintln!("Re-run with --force to remove anyway.");
    }
}

/// Resolves the acting person from `--as` or the configuration
pub(super) fn acting_user(project: &Project, explicit: Option<&str>) -> Result<PersonId> {
    let name = match explicit {
        Some(name) => name.to_string(),
        None => project.config().effective_user(),
    };
    Ok(name.parse()?)
}
