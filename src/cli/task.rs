//! Task CLI commands

use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::doc::print_viewers;
use super::output::Output;
use crate::domain::{
    Artifact, ArtifactId, ArtifactKind, ContractorId, EventId, MemberId, Shared, Task, TaskId,
    TaskStatus,
};
use crate::service::AssignmentTracker;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add an unassigned task to an event
    Add {
        /// Event ID
        event: String,

        /// Task title
        title: String,

        /// Longer description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List tasks of an event
    List {
        /// Event ID
        event: String,

        /// Only tasks this member may see
        #[arg(long)]
        visible_to: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,
    },

    /// Assign a task to team members and contractors
    ///
    /// Replaces the current assignment. IDs not on the roster are ignored.
    ///
    /// Examples:
    ///   lineup task assign t-1234567 --member m-1111111 --member m-2222222
    ///   lineup task assign t-1234567 --contractor c-3333333
    Assign {
        /// Task ID
        id: String,

        /// Team member IDs (repeatable or comma-separated)
        #[arg(long = "member", value_delimiter = ',')]
        members: Vec<String>,

        /// Contractor IDs (repeatable or comma-separated)
        #[arg(long = "contractor", value_delimiter = ',')]
        contractors: Vec<String>,
    },

    /// Set task status (todo, in_progress, completed, cancelled)
    Status {
        /// Task ID
        id: String,

        /// New status
        status: String,
    },

    /// List tasks that name a member as a direct assignee
    Assigned {
        /// Member ID
        member: String,
    },

    /// Show who is currently assigned to a task
    Viewers {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            event,
            title,
            description,
        } => add_task(output, &event, &title, description.as_deref()),
        TaskCommands::List {
            event,
            visible_to,
            status,
        } => list_tasks(output, &event, visible_to.as_deref(), status.as_deref()),
        TaskCommands::Assign {
            id,
            members,
            contractors,
        } => assign_task(output, &id, &members, &contractors),
        TaskCommands::Status { id, status } => set_status(output, &id, &status),
        TaskCommands::Assigned { member } => assigned_tasks(output, &member),
        TaskCommands::Viewers { id } => viewers(output, &id),
        TaskCommands::Rm { id } => remove_task(output, &id),
    }
}

fn add_task(output: &Output, event: &str, title: &str, description: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;

    let task = AssignmentTracker::new(&mut store).create_task(&event_id, title, description)?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Created task {}: {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(
    output: &Output,
    event: &str,
    visible_to: Option<&str>,
    status: Option<&str>,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let status: Option<TaskStatus> = status
        .map(|s| s.parse().map_err(|e: String| anyhow!(e)))
        .transpose()?;
    let tracker = AssignmentTracker::new(&mut store);

    let artifacts = match visible_to {
        Some(member) => {
            let member_id: MemberId = member.parse()?;
            tracker.visible_to(&event_id, &member_id, Some(ArtifactKind::Task))?
        }
        None => tracker.artifacts(&event_id, Some(ArtifactKind::Task))?,
    };

    let tasks: Vec<Task> = artifacts
        .into_iter()
        .filter_map(Artifact::into_task)
        .filter(|task| status.map_or(true, |s| task.status == s))
        .collect();

    print_tasks(output, &tasks);
    Ok(())
}

fn assign_task(
    output: &Output,
    id: &str,
    members: &[String],
    contractors: &[String],
) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let task_id: ArtifactId = id.parse::<TaskId>()?.into();

    let members = members
        .iter()
        .map(|m| m.parse::<MemberId>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    let contractors = contractors
        .iter()
        .map(|c| c.parse::<ContractorId>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    let requested = members.len() + contractors.len();

    let task = AssignmentTracker::new(&mut store).assign(&task_id, members, contractors)?;

    let sharing = task.sharing();
    let kept = sharing.team.selection().map_or(0, |ids| ids.len())
        + sharing.contractors.selection().map_or(0, |ids| ids.len());
    if kept < requested {
        output.warn(&format!(
            "{} ID(s) are not on the roster and were ignored",
            requested - kept
        ));
    }

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!(
            "Assigned {} to team: {}, contractors: {}",
            task_id, sharing.team, sharing.contractors
        ));
    }

    Ok(())
}

fn set_status(output: &Output, id: &str, status: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let task_id: TaskId = id.parse()?;
    let status: TaskStatus = status.parse().map_err(|e: String| anyhow!(e))?;

    let task = AssignmentTracker::new(&mut store).set_task_status(&task_id, status)?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Task {} is now {}", task.id, task.status));
    }

    Ok(())
}

fn assigned_tasks(output: &Output, member: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let member_id: MemberId = member.parse()?;

    let tasks = AssignmentTracker::new(&mut store).assigned_tasks(&member_id)?;
    output.verbose_ctx("task", &format!("{} task(s) name {}", tasks.len(), member_id));

    print_tasks(output, &tasks);
    Ok(())
}

fn viewers(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let task_id: ArtifactId = id.parse::<TaskId>()?.into();

    let viewers = AssignmentTracker::new(&mut store).viewers(&task_id)?;
    print_viewers(output, &viewers);

    Ok(())
}

fn remove_task(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let task_id: ArtifactId = id.parse::<TaskId>()?.into();

    let remaining = AssignmentTracker::new(&mut store).delete_artifact(&task_id)?;

    if output.is_json() {
        output.data(&remaining);
    } else {
        output.success(&format!("Deleted task {} ({} remaining)", task_id, remaining.len()));
    }

    Ok(())
}

fn print_tasks(output: &Output, tasks: &[Task]) {
    if output.is_json() {
        output.data(&tasks);
        return;
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    output.header(&[("ID", 12), ("STATUS", 12), ("ASSIGNED", 20), ("TITLE", 0)]);
    for task in tasks {
        output.row(&[
            (task.id.to_string().as_str(), 12),
            (task.status.as_str(), 12),
            (task.sharing.team.to_string().as_str(), 20),
            (task.title.as_str(), 0),
        ]);
    }
}
