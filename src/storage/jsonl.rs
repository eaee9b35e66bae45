//! JSONL-backed event store
//!
//! Records live in `.lineup/` with one JSON object per line:
//!
//! - `events.jsonl`: one [`EventRecord`] per event (the event plus its
//!   status history, so a transition is a single file write)
//! - `rosters.jsonl`: one [`Roster`] per event
//! - `artifacts.jsonl`: one [`Artifact`] per document or task
//!
//! Each file is guarded by a `.lock` sidecar: shared for reads, exclusive
//! for the whole read-modify-write. Rewrites go through a unique temp file
//! renamed over the original.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::store::{not_found, EventStore, StoreResult};
use crate::domain::{
    Artifact, ArtifactId, ArtifactKind, Contractor, ContractorId, Event, EventId, MemberId,
    Roster, RosterMember, StatusHistoryEntry, Task,
};

/// An event and its append-only status log, stored on one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: Event,

    #[serde(default)]
    pub history: Vec<StatusHistoryEntry>,
}

/// A JSONL file holding one record type
///
/// Every access goes through a sidecar `<name>.lock` file. Reads hold it
/// shared; writes hold it exclusive for the whole read-modify-write, so two
/// writers never interleave. The data file itself is only ever replaced by
/// renaming a fully written temp file over it, or appended to under the
/// exclusive lock.
pub struct JsonlFile<T> {
    path: PathBuf,
    lock_path: PathBuf,
    _record: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> JsonlFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            _record: PhantomData,
        }
    }

    /// Returns the path to the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records from the file
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let _guard = self.lock(false)?;
        self.read_unlocked()
    }

    /// Appends a single record without a full rewrite
    pub fn append(&self, record: &T) -> Result<()> {
        let _guard = self.lock(true)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open store file: {}", self.path.display()))?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        writeln!(writer, "{}", line).context("Failed to write record")?;

        writer.flush().context("Failed to flush store file")?;

        Ok(())
    }

    /// Reads, modifies and rewrites the file under one exclusive lock
    ///
    /// Nothing is written when `apply` fails.
    pub fn update<R, E>(&self, apply: impl FnOnce(&mut Vec<T>) -> Result<R, E>) -> Result<R, E>
    where
        E: From<anyhow::Error>,
    {
        let _guard = self.lock(true)?;

        let mut records = self.read_unlocked()?;
        let result = apply(&mut records)?;
        self.write_unlocked(&records)?;

        Ok(result)
    }

    /// Takes the sidecar lock, released when the returned file is dropped
    fn lock(&self, exclusive: bool) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file: {}", self.lock_path.display()))?;

        if exclusive {
            file.lock_exclusive().with_context(|| {
                format!("Failed to acquire write lock on {}", self.path.display())
            })?;
        } else {
            file.lock_shared().with_context(|| {
                format!("Failed to acquire read lock on {}", self.path.display())
            })?;
        }

        Ok(file)
    }

    fn read_unlocked(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open store file: {}", self.path.display()))?;

        let reader = BufReader::new(&file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let record: T = serde_json::from_str(&line).with_context(|| {
                format!(
                    "Failed to parse record at {}:{}",
                    self.path.display(),
                    line_num + 1
                )
            })?;

            records.push(record);
        }

        Ok(records)
    }

    fn write_unlocked(&self, records: &[T]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        // Unique per writer, in the same directory so the rename stays atomic
        let temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

        {
            let mut writer = BufWriter::new(temp.as_file());

            for record in records {
                let line = serde_json::to_string(record).context("Failed to serialize record")?;
                writeln!(writer, "{}", line).context("Failed to write record")?;
            }

            writer.flush().context("Failed to flush store file")?;
        }
        temp.as_file()
            .sync_all()
            .context("Failed to sync store file")?;

        temp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

/// Event store backed by JSONL files in a directory
pub struct JsonlStore {
    events: JsonlFile<EventRecord>,
    rosters: JsonlFile<Roster>,
    artifacts: JsonlFile<Artifact>,
}

impl JsonlStore {
    /// Creates a store reading and writing files in `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            events: JsonlFile::new(dir.join("events.jsonl")),
            rosters: JsonlFile::new(dir.join("rosters.jsonl")),
            artifacts: JsonlFile::new(dir.join("artifacts.jsonl")),
        }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".lineup"))
    }

    pub fn events_path(&self) -> &Path {
        self.events.path()
    }

    fn event_record(&self, id: &EventId) -> StoreResult<EventRecord> {
        self.events
            .read_all()?
            .into_iter()
            .find(|record| &record.event.id == id)
            .ok_or_else(|| not_found("event", id))
    }

    fn update_roster(
        &mut self,
        event_id: &EventId,
        apply: impl FnOnce(&mut Roster) -> StoreResult<()>,
    ) -> StoreResult<()> {
        self.rosters.update(|rosters| {
            let index = match rosters.iter().position(|r| &r.event_id == event_id) {
                Some(index) => index,
                None => {
                    rosters.push(Roster::new(event_id.clone()));
                    rosters.len() - 1
                }
            };

            apply(&mut rosters[index])
        })
    }
}

impl EventStore for JsonlStore {
    fn get_event(&self, id: &EventId) -> StoreResult<Event> {
        Ok(self.event_record(id)?.event)
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .read_all()?
            .into_iter()
            .map(|record| record.event)
            .collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(events)
    }

    fn create_event(&mut self, event: &Event) -> StoreResult<()> {
        self.events.append(&EventRecord {
            event: event.clone(),
            history: Vec::new(),
        })?;
        Ok(())
    }

    fn commit_transition(
        &mut self,
        event: &Event,
        entry: &StatusHistoryEntry,
    ) -> StoreResult<()> {
        // One rewrite of one file: either both land or neither does
        self.events.update(|records| {
            let record = records
                .iter_mut()
                .find(|record| record.event.id == event.id)
                .ok_or_else(|| not_found("event", &event.id))?;

            record.event = event.clone();
            record.history.push(entry.clone());
            Ok(())
        })
    }

    fn history(&self, id: &EventId) -> StoreResult<Vec<StatusHistoryEntry>> {
        Ok(self.event_record(id)?.history)
    }

    fn roster(&self, event_id: &EventId) -> StoreResult<Roster> {
        Ok(self
            .rosters
            .read_all()?
            .into_iter()
            .find(|r| &r.event_id == event_id)
            .unwrap_or_else(|| Roster::new(event_id.clone())))
    }

    fn add_member(&mut self, event_id: &EventId, member: &RosterMember) -> StoreResult<()> {
        self.update_roster(event_id, |roster| {
            roster.team_members.push(member.clone());
            Ok(())
        })
    }

    fn add_contractor(&mut self, event_id: &EventId, contractor: &Contractor) -> StoreResult<()> {
        self.update_roster(event_id, |roster| {
            roster.contractors.push(contractor.clone());
            Ok(())
        })
    }

    fn remove_member(&mut self, event_id: &EventId, member_id: &MemberId) -> StoreResult<()> {
        self.update_roster(event_id, |roster| {
            let before = roster.team_members.len();
            roster.team_members.retain(|m| &m.id != member_id);
            if roster.team_members.len() == before {
                return Err(not_found("member", member_id));
            }
            Ok(())
        })
    }

    fn remove_contractor(
        &mut self,
        event_id: &EventId,
        contractor_id: &ContractorId,
    ) -> StoreResult<()> {
        self.update_roster(event_id, |roster| {
            let before = roster.contractors.len();
            roster.contractors.retain(|c| &c.id != contractor_id);
            if roster.contractors.len() == before {
                return Err(not_found("contractor", contractor_id));
            }
            Ok(())
        })
    }

    fn list_artifacts(
        &self,
        event_id: &EventId,
        kind: Option<ArtifactKind>,
    ) -> StoreResult<Vec<Artifact>> {
        let mut artifacts: Vec<Artifact> = self
            .artifacts
            .read_all()?
            .into_iter()
            .filter(|a| a.event_id() == event_id)
            .filter(|a| kind.map_or(true, |k| a.kind() == k))
            .collect();
        artifacts.sort_by_key(created_at);
        Ok(artifacts)
    }

    fn get_artifact(&self, id: &ArtifactId) -> StoreResult<Artifact> {
        self.artifacts
            .read_all()?
            .into_iter()
            .find(|a| &a.id() == id)
            .ok_or_else(|| not_found(&id.kind().to_string(), id))
    }

    fn create_artifact(&mut self, artifact: &Artifact) -> StoreResult<()> {
        self.artifacts.append(artifact)?;
        Ok(())
    }

    fn update_artifact(&mut self, artifact: &Artifact) -> StoreResult<()> {
        let id = artifact.id();
        self.artifacts.update(|artifacts| {
            let slot = artifacts
                .iter_mut()
                .find(|a| a.id() == id)
                .ok_or_else(|| not_found(&id.kind().to_string(), &id))?;
            *slot = artifact.clone();
            Ok(())
        })
    }

    fn delete_artifact(&mut self, id: &ArtifactId) -> StoreResult<()> {
        self.artifacts.update(|artifacts| {
            let before = artifacts.len();
            artifacts.retain(|a| &a.id() != id);
            if artifacts.len() == before {
                return Err(not_found(&id.kind().to_string(), id));
            }
            Ok(())
        })
    }

    fn tasks_assigned_to(&self, member_id: &MemberId) -> StoreResult<Vec<Task>> {
        Ok(self
            .artifacts
            .read_all()?
            .into_iter()
            .filter_map(Artifact::into_task)
            .filter(|task| task.is_assigned_to(member_id))
            .collect())
    }
}

pub(crate) fn created_at(artifact: &Artifact) -> chrono::DateTime<chrono::Utc> {
    match artifact {
        Artifact::Document(doc) => doc.created_at,
        Artifact::Task(task) => task.created_at,
    }
}
