//! Roster CLI commands

use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{ContractorId, ContractorStatus, EventId, MemberId, PersonId, Roster};
use crate::service::{AssignmentTracker, NewMember, RemovalSafety};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum RosterCommands {
    /// List team members and contractors
    List {
        /// Event ID
        event: String,
    },

    /// Add a team member
    ///
    /// Examples:
    ///   lineup roster add e-1234567 olivia --name "Olivia" --creator
    ///   lineup roster add e-1234567 sam --name "Sam" --role catering
    Add {
        /// Event ID
        event: String,

        /// Person identifier of the member
        person: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Role on the team
        #[arg(long, default_value = "")]
        role: String,

        /// Mark as the event creator (must be the event owner)
        #[arg(long)]
        creator: bool,
    },

    /// Add a contractor
    AddContractor {
        /// Event ID
        event: String,

        /// Company name
        company: String,

        /// Engagement status (hired, interested, declined, pending)
        #[arg(long, default_value = "pending")]
        status: String,
    },

    /// Check whether a member can be removed
    Check {
        /// Event ID
        event: String,

        /// Member ID
        member: String,
    },

    /// Remove a team member
    Remove {
        /// Event ID
        event: String,

        /// Member ID
        member: String,

        /// Remove even if tasks are still assigned to the member
        #[arg(long)]
        force: bool,
    },

    /// Remove a contractor
    RemoveContractor {
        /// Event ID
        event: String,

        /// Contractor ID
        contractor: String,
    },
}

pub fn run(cmd: RosterCommands, output: &Output) -> Result<()> {
    match cmd {
        RosterCommands::List { event } => list(output, &event),
        RosterCommands::Add {
            event,
            person,
            name,
            role,
            creator,
        } => add_member(output, &event, &person, name, role, creator),
        RosterCommands::AddContractor {
            event,
            company,
            status,
        } => add_contractor(output, &event, &company, &status),
        RosterCommands::Check { event, member } => check(output, &event, &member),
        RosterCommands::Remove {
            event,
            member,
            force,
        } => remove_member(output, &event, &member, force),
        RosterCommands::RemoveContractor { event, contractor } => {
            remove_contractor(output, &event, &contractor)
        }
    }
}

fn list(output: &Output, event: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;

    let roster = AssignmentTracker::new(&mut store).roster(&event_id)?;
    print_roster(output, &roster);

    Ok(())
}

fn add_member(
    output: &Output,
    event: &str,
    person: &str,
    name: String,
    role: String,
    creator: bool,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let person_id: PersonId = person.parse()?;

    let roster = AssignmentTracker::new(&mut store).add_member(
        &event_id,
        NewMember {
            person_id: person_id.clone(),
            name,
            role,
            is_creator: creator,
        },
    )?;

    if output.is_json() {
        output.data(&roster);
    } else if let Some(member) = roster.member_for_person(&person_id) {
        output.success(&format!("Added {} ({}) as {}", member.name, member.id, member.role));
    }

    Ok(())
}

fn add_contractor(output: &Output, event: &str, company: &str, status: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let status: ContractorStatus = status.parse().map_err(|e: String| anyhow!(e))?;

    let roster = AssignmentTracker::new(&mut store).add_contractor(&event_id, company, status)?;

    if output.is_json() {
        output.data(&roster);
    } else if let Some(contractor) = roster.contractors.last() {
        output.success(&format!(
            "Added contractor {} ({})",
            contractor.company_name, contractor.id
        ));
    }

    Ok(())
}

fn check(output: &Output, event: &str, member: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let member_id: MemberId = member.parse()?;

    let safety = AssignmentTracker::new(&mut store).check_removal_safety(&event_id, &member_id)?;

    if output.is_json() {
        let verdict = match &safety {
            RemovalSafety::Safe => "safe",
            RemovalSafety::IsCreator => "creator",
            RemovalSafety::Blocked(_) => "blocked",
        };
        output.data(&serde_json::json!({
            "member": member_id,
            "verdict": verdict,
            "blocking_tasks": safety.blocking_tasks(),
        }));
        return Ok(());
    }

    match safety {
        RemovalSafety::Safe => println!("{} can be removed.", member_id),
        RemovalSafety::IsCreator => {
            println!("{} is the event creator and cannot be removed.", member_id)
        }
        RemovalSafety::Blocked(tasks) => {
            println!("{} is still assigned to {} task(s):", member_id, tasks.len());
            for task in &tasks {
                println!("  {}  {}  [{}]", task.id, task.title, task.status);
            }
        }
    }

    Ok(())
}

fn remove_member(output: &Output, event: &str, member: &str, force: bool) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let member_id: MemberId = member.parse()?;

    output.verbose_ctx("roster", &format!("Removing {} (force={})", member_id, force));
    let roster = AssignmentTracker::new(&mut store).remove_member(&event_id, &member_id, force)?;

    if output.is_json() {
        output.data(&roster);
    } else {
        output.success(&format!("Removed member {}", member_id));
    }

    Ok(())
}

fn remove_contractor(output: &Output, event: &str, contractor: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let contractor_id: ContractorId = contractor.parse()?;

    let roster = AssignmentTracker::new(&mut store).remove_contractor(&event_id, &contractor_id)?;

    if output.is_json() {
        output.data(&roster);
    } else {
        output.success(&format!("Removed contractor {}", contractor_id));
    }

    Ok(())
}

fn print_roster(output: &Output, roster: &Roster) {
    if output.is_json() {
        output.data(roster);
        return;
    }

    if roster.is_empty() {
        println!("Roster of {} is empty.", roster.event_id);
        return;
    }

    println!("Team:");
    for member in &roster.team_members {
        let creator = if member.is_creator { " (creator)" } else { "" };
        println!(
            "  {}  {:<16} {:<12} {}{}",
            member.id, member.name, member.role, member.person_id, creator
        );
    }

    if !roster.contractors.is_empty() {
        println!("Contractors:");
        for contractor in &roster.contractors {
            println!(
                "  {}  {:<24} {}",
                contractor.id, contractor.company_name, contractor.status
            );
        }
    }
}
