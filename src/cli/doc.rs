//! Document CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{
    Artifact, ArtifactId, ArtifactKind, Audience, ContractorId, DocumentId, EffectiveViewers,
    EventId, MemberId, Shared, SharingSpec,
};
use crate::service::AssignmentTracker;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum DocCommands {
    /// Add a document
    ///
    /// Examples:
    ///   lineup doc add e-1234567 "Floor plan" --file floor.pdf
    ///   lineup doc add e-1234567 "Budget" --team m-1234567,m-7654321 --contractors none
    Add {
        /// Event ID
        event: String,

        /// Document title
        title: String,

        /// Attached file name
        #[arg(long)]
        file: Option<String>,

        /// Team audience: all, none, or comma-separated member IDs
        #[arg(long)]
        team: Option<String>,

        /// Contractor audience: all, none, or comma-separated contractor IDs
        #[arg(long)]
        contractors: Option<String>,
    },

    /// List documents of an event
    List {
        /// Event ID
        event: String,

        /// Only documents this member may see
        #[arg(long)]
        visible_to: Option<String>,
    },

    /// Change who a document is shared with
    Share {
        /// Document ID
        id: String,

        /// Team audience: all, none, or comma-separated member IDs
        #[arg(long)]
        team: Option<String>,

        /// Contractor audience: all, none, or comma-separated contractor IDs
        #[arg(long)]
        contractors: Option<String>,
    },

    /// Show who can currently see a document
    Viewers {
        /// Document ID
        id: String,
    },

    /// Delete a document
    Rm {
        /// Document ID
        id: String,
    },
}

pub fn run(cmd: DocCommands, output: &Output) -> Result<()> {
    match cmd {
        DocCommands::Add {
            event,
            title,
            file,
            team,
            contractors,
        } => add(output, &event, &title, file.as_deref(), team.as_deref(), contractors.as_deref()),
        DocCommands::List { event, visible_to } => list(output, &event, visible_to.as_deref()),
        DocCommands::Share {
            id,
            team,
            contractors,
        } => share(output, &id, team.as_deref(), contractors.as_deref()),
        DocCommands::Viewers { id } => viewers(output, &id),
        DocCommands::Rm { id } => remove(output, &id),
    }
}

fn add(
    output: &Output,
    event: &str,
    title: &str,
    file: Option<&str>,
    team: Option<&str>,
    contractors: Option<&str>,
) -> Result<()> {
    let project = Project::open_current()?;
    let defaults = &project.config().project.sharing;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;

    let sharing = SharingSpec::new(
        match team {
            Some(team) => team.parse::<Audience<MemberId>>()?,
            None => defaults.team_audience(),
        },
        match contractors {
            Some(contractors) => contractors.parse::<Audience<ContractorId>>()?,
            None => defaults.contractor_audience(),
        },
    );
    output.verbose_ctx(
        "doc",
        &format!("Sharing: team={} contractors={}", sharing.team, sharing.contractors),
    );

    let document =
        AssignmentTracker::new(&mut store).create_document(&event_id, title, file, sharing)?;

    if output.is_json() {
        output.data(&document);
    } else {
        output.success(&format!("Created document {}: {}", document.id, document.title));
    }

    Ok(())
}

fn list(output: &Output, event: &str, visible_to: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let event_id: EventId = event.parse()?;
    let tracker = AssignmentTracker::new(&mut store);

    let documents = match visible_to {
        Some(member) => {
            let member_id: MemberId = member.parse()?;
            tracker.visible_to(&event_id, &member_id, Some(ArtifactKind::Document))?
        }
        None => tracker.artifacts(&event_id, Some(ArtifactKind::Document))?,
    };

    print_documents(output, &documents);
    Ok(())
}

fn share(output: &Output, id: &str, team: Option<&str>, contractors: Option<&str>) -> Result<()> {
    if team.is_none() && contractors.is_none() {
        bail!("Nothing to change: pass --team and/or --contractors");
    }

    let project = Project::open_current()?;
    let mut store = project.store();
    let doc_id: ArtifactId = id.parse::<DocumentId>()?.into();
    let mut tracker = AssignmentTracker::new(&mut store);

    let mut sharing = tracker.artifact(&doc_id)?.sharing().clone();
    if let Some(team) = team {
        sharing.team = team.parse()?;
    }
    if let Some(contractors) = contractors {
        sharing.contractors = contractors.parse()?;
    }

    let document = tracker.share(&doc_id, sharing)?;

    if output.is_json() {
        output.data(&document);
    } else {
        let sharing = document.sharing();
        output.success(&format!(
            "Shared {} with team: {}, contractors: {}",
            doc_id, sharing.team, sharing.contractors
        ));
    }

    Ok(())
}

fn viewers(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let doc_id: ArtifactId = id.parse::<DocumentId>()?.into();

    let viewers = AssignmentTracker::new(&mut store).viewers(&doc_id)?;
    print_viewers(output, &viewers);

    Ok(())
}

fn remove(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store();
    let doc_id: ArtifactId = id.parse::<DocumentId>()?.into();

    let remaining = AssignmentTracker::new(&mut store).delete_artifact(&doc_id)?;

    if output.is_json() {
        output.data(&remaining);
    } else {
        output.success(&format!(
            "Deleted document {} ({} remaining)",
            doc_id,
            remaining.len()
        ));
    }

    Ok(())
}

fn print_documents(output: &Output, documents: &[Artifact]) {
    if output.is_json() {
        output.data(&documents);
        return;
    }

    if documents.is_empty() {
        println!("No documents found.");
        return;
    }

    output.header(&[("ID", 12), ("TEAM", 12), ("CONTRACTORS", 12), ("TITLE", 0)]);
    for document in documents {
        let sharing = document.sharing();
        output.row(&[
            (document.id().to_string().as_str(), 12),
            (sharing.team.mode().as_str(), 12),
            (sharing.contractors.mode().as_str(), 12),
            (document.title(), 0),
        ]);
    }
}

/// Prints resolved team and contractor viewers
pub(super) fn print_viewers(output: &Output, viewers: &EffectiveViewers) {
    if output.is_json() {
        output.data(viewers);
        return;
    }

    if viewers.is_empty() {
        println!("Nobody on the roster can see this.");
        return;
    }

    let team: Vec<String> = viewers.team.iter().map(ToString::to_string).collect();
    let contractors: Vec<String> = viewers.contractors.iter().map(ToString::to_string).collect();
    println!("Team: {}", if team.is_empty() { "-".to_string() } else { team.join(", ") });
    println!(
        "Contractors: {}",
        if contractors.is_empty() { "-".to_string() } else { contractors.join(", ") }
    );
}
