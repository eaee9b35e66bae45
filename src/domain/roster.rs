//! Roster domain model
//!
//! The roster of an event is its team members plus the contractors working
//! on it. Exactly one team member is the creator (the event owner), who can
//! never be removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::id::{ContractorId, EventId, MemberId, PersonId};

/// A team member on an event's roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    /// Membership ID (distinct from the person)
    pub id: MemberId,

    pub person_id: PersonId,

    pub name: String,

    pub role: String,

    #[serde(default)]
    pub is_creator: bool,

    pub added_at: DateTime<Utc>,
}

impl RosterMember {
    pub fn new(person_id: PersonId, name: impl Into<String>, role: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: MemberId::new(&name, now),
            person_id,
            name,
            role: role.into(),
            is_creator: false,
            added_at: now,
        }
    }

    /// Creates the creator member for an event owner
    pub fn creator(person_id: PersonId, name: impl Into<String>) -> Self {
        let mut member = Self::new(person_id, name, "owner");
        member.is_creator = true;
        member
    }
}

/// Engagement status of a contractor (informational)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractorStatus {
    Hired,
    Interested,
    Declined,
    #[default]
    Pending,
}

impl ContractorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractorStatus::Hired => "hired",
            ContractorStatus::Interested => "interested",
            ContractorStatus::Declined => "declined",
            ContractorStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ContractorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hired" => Ok(ContractorStatus::Hired),
            "interested" => Ok(ContractorStatus::Interested),
            "declined" => Ok(ContractorStatus::Declined),
            "pending" => Ok(ContractorStatus::Pending),
            other => Err(format!("Unknown contractor status '{}'", other)),
        }
    }
}

/// A contractor associated with an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: ContractorId,

    pub company_name: String,

    #[serde(default)]
    pub status: ContractorStatus,

    pub added_at: DateTime<Utc>,
}

impl Contractor {
    pub fn new(company_name: impl Into<String>, status: ContractorStatus) -> Self {
        let company_name = company_name.into();
        let now = Utc::now();
        Self {
            id: ContractorId::new(&company_name, now),
            company_name,
            status,
            added_at: now,
        }
    }
}

/// Snapshot of an event's roster at read time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub event_id: EventId,

    #[serde(default)]
    pub team_members: Vec<RosterMember>,

    #[serde(default)]
    pub contractors: Vec<Contractor>,
}

impl Roster {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            team_members: Vec::new(),
            contractors: Vec::new(),
        }
    }

    pub fn member(&self, id: &MemberId) -> Option<&RosterMember> {
        self.team_members.iter().find(|m| &m.id == id)
    }

    pub fn contractor(&self, id: &ContractorId) -> Option<&Contractor> {
        self.contractors.iter().find(|c| &c.id == id)
    }

    pub fn has_member(&self, id: &MemberId) -> bool {
        self.member(id).is_some()
    }

    pub fn has_contractor(&self, id: &ContractorId) -> bool {
        self.contractor(id).is_some()
    }

    /// Returns the creator member, if one has been added
    ///
    /// A roster holds at most one creator. Events start without one and may
    /// stay that way; until a creator is added no member is protected from
    /// removal.
    pub fn creator(&self) -> Option<&RosterMember> {
        self.team_members.iter().find(|m| m.is_creator)
    }

    pub fn is_creator(&self, id: &MemberId) -> bool {
        self.member(id).is_some_and(|m| m.is_creator)
    }

    pub fn member_for_person(&self, person: &PersonId) -> Option<&RosterMember> {
        self.team_members.iter().find(|m| &m.person_id == person)
    }

    pub fn member_ids(&self) -> BTreeSet<MemberId> {
        self.team_members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn contractor_ids(&self) -> BTreeSet<ContractorId> {
        self.contractors.iter().map(|c| c.id.clone()).collect()
    }

    /// Returns true if there are no team members and no contractors
    pub fn is_empty(&self) -> bool {
        self.team_members.is_empty() && self.contractors.is_empty()
    }
}
