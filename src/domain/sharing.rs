//! Sharing specifications and their resolution against a roster
//!
//! Every shared artifact carries a [`SharingSpec`] with two independent
//! axes, one for team members and one for contractors. Each axis is an
//! [`Audience`]: everyone, nobody, or an explicit selection. Selections only
//! exist inside [`Audience::Selected`], so an "all" or "none" axis can never
//! carry stale ids.
//!
//! Resolution is always done against a fresh [`Roster`] snapshot:
//!
//! | Audience | Effective viewers |
//! |----------|-------------------|
//! | `All` | every current roster id of that kind |
//! | `None` | nobody |
//! | `Selected(ids)` | `ids` ∩ current roster (dangling ids are dropped) |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::id::{ContractorId, IdError, MemberId};
use super::roster::Roster;

/// Who on one axis (team or contractors) may see an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "ids", rename_all = "snake_case")]
#[serde(bound(deserialize = "Id: Deserialize<'de> + Ord"))]
pub enum Audience<Id> {
    All,
    None,
    Selected(BTreeSet<Id>),
}

/// The mode of an [`Audience`] without its selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceMode {
    All,
    Selected,
    None,
}

impl AudienceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceMode::All => "all",
            AudienceMode::Selected => "selected",
            AudienceMode::None => "none",
        }
    }
}

impl fmt::Display for AudienceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<Id: Ord + Clone> Audience<Id> {
    /// Creates a selection from any list of ids (duplicates collapse)
    pub fn selected(ids: impl IntoIterator<Item = Id>) -> Self {
        Audience::Selected(ids.into_iter().collect())
    }

    pub fn mode(&self) -> AudienceMode {
        match self {
            Audience::All => AudienceMode::All,
            Audience::None => AudienceMode::None,
            Audience::Selected(_) => AudienceMode::Selected,
        }
    }

    /// Switches to another mode
    ///
    /// Leaving `Selected` drops the selection; entering `Selected` starts
    /// empty. Switching to the current mode keeps everything as is.
    pub fn switch_to(&mut self, mode: AudienceMode) {
        if self.mode() == mode {
            return;
        }
        *self = match mode {
            AudienceMode::All => Audience::All,
            AudienceMode::None => Audience::None,
            AudienceMode::Selected => Audience::Selected(BTreeSet::new()),
        };
    }

    /// Adds or removes an id from the selection
    ///
    /// Returns true if the id is selected afterwards. Outside of `Selected`
    /// this does nothing and returns false.
    pub fn toggle(&mut self, id: Id) -> bool {
        match self {
            Audience::Selected(ids) => {
                if ids.remove(&id) {
                    false
                } else {
                    ids.insert(id);
                    true
                }
            }
            Audience::All | Audience::None => false,
        }
    }

    /// Returns the stored selection (empty for `All` and `None`)
    pub fn selection(&self) -> Option<&BTreeSet<Id>> {
        match self {
            Audience::Selected(ids) => Some(ids),
            Audience::All | Audience::None => None,
        }
    }

    /// Returns true if the id is stored in the selection (not via `All`)
    pub fn directly_includes(&self, id: &Id) -> bool {
        self.selection().is_some_and(|ids| ids.contains(id))
    }

    /// Resolves this audience against the ids currently on the roster
    pub fn resolve(&self, current: &BTreeSet<Id>) -> BTreeSet<Id> {
        match self {
            Audience::All => current.clone(),
            Audience::None => BTreeSet::new(),
            Audience::Selected(ids) => ids.intersection(current).cloned().collect(),
        }
    }

    /// Returns selected ids that are no longer on the roster
    pub fn dangling(&self, current: &BTreeSet<Id>) -> BTreeSet<Id> {
        match self {
            Audience::Selected(ids) => ids.difference(current).cloned().collect(),
            Audience::All | Audience::None => BTreeSet::new(),
        }
    }

    /// Returns a copy whose selection only keeps ids in `current`
    pub fn restricted_to(&self, current: &BTreeSet<Id>) -> Self {
        match self {
            Audience::Selected(_) => Audience::Selected(self.resolve(current)),
            other => other.clone(),
        }
    }
}

impl<Id: fmt::Display> fmt::Display for Audience<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::All => f.write_str("all"),
            Audience::None => f.write_str("none"),
            Audience::Selected(ids) if ids.is_empty() => f.write_str("selected"),
            Audience::Selected(ids) => {
                let joined: Vec<String> = ids.iter().map(ToString::to_string).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

/// Parses `all`, `none`, `selected` (empty selection) or a comma-separated
/// id list
impl<Id> FromStr for Audience<Id>
where
    Id: FromStr<Err = IdError> + Ord,
{
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => return Ok(Audience::All),
            "none" => return Ok(Audience::None),
            "selected" | "" => return Ok(Audience::Selected(BTreeSet::new())),
            _ => {}
        }

        let ids = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<Id>)
            .collect::<Result<BTreeSet<Id>, _>>()?;

        Ok(Audience::Selected(ids))
    }
}

/// Sharing settings attached to a document or task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingSpec {
    pub team: Audience<MemberId>,
    pub contractors: Audience<ContractorId>,
}

impl Default for SharingSpec {
    fn default() -> Self {
        Self {
            team: Audience::All,
            contractors: Audience::None,
        }
    }
}

impl SharingSpec {
    pub fn new(team: Audience<MemberId>, contractors: Audience<ContractorId>) -> Self {
        Self { team, contractors }
    }

    /// Shared with nobody on either axis
    pub fn private() -> Self {
        Self::new(Audience::None, Audience::None)
    }

    /// Direct assignment to explicit team members and contractors
    pub fn assigned(
        team: impl IntoIterator<Item = MemberId>,
        contractors: impl IntoIterator<Item = ContractorId>,
    ) -> Self {
        Self::new(Audience::selected(team), Audience::selected(contractors))
    }

    /// Computes the effective viewers against the current roster
    pub fn resolve(&self, roster: &Roster) -> EffectiveViewers {
        EffectiveViewers {
            team: self.team.resolve(&roster.member_ids()),
            contractors: self.contractors.resolve(&roster.contractor_ids()),
        }
    }

    /// Returns stored ids that no longer match anyone on the roster
    pub fn dangling(&self, roster: &Roster) -> DanglingRefs {
        DanglingRefs {
            team: self.team.dangling(&roster.member_ids()),
            contractors: self.contractors.dangling(&roster.contractor_ids()),
        }
    }

    /// Returns a copy with selections limited to ids on the roster
    pub fn restricted_to(&self, roster: &Roster) -> Self {
        Self {
            team: self.team.restricted_to(&roster.member_ids()),
            contractors: self.contractors.restricted_to(&roster.contractor_ids()),
        }
    }
}

/// Roster ids entitled to see or act on an artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveViewers {
    pub team: BTreeSet<MemberId>,
    pub contractors: BTreeSet<ContractorId>,
}

impl EffectiveViewers {
    pub fn is_empty(&self) -> bool {
        self.team.is_empty() && self.contractors.is_empty()
    }
}

/// Stored ids that refer to people no longer on the roster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DanglingRefs {
    pub team: BTreeSet<MemberId>,
    pub contractors: BTreeSet<ContractorId>,
}

impl DanglingRefs {
    pub fn is_empty(&self) -> bool {
        self.team.is_empty() && self.contractors.is_empty()
    }
}

/// Anything that carries a [`SharingSpec`]
pub trait Shared {
    fn sharing(&self) -> &SharingSpec;
}

/// Computes the effective viewers of a shared item
pub fn resolve<S: Shared + ?Sized>(item: &S, roster: &Roster) -> EffectiveViewers {
    item.sharing().resolve(roster)
}

/// Returns true if the team member may see the item
pub fn can_view_member<S: Shared + ?Sized>(item: &S, roster: &Roster, member: &MemberId) -> bool {
    roster.has_member(member) && item.sharing().team.resolve(&roster.member_ids()).contains(member)
}

/// Returns true if the contractor may see the item
pub fn can_view_contractor<S: Shared + ?Sized>(
    item: &S,
    roster: &Roster,
    contractor: &ContractorId,
) -> bool {
    roster.has_contractor(contractor)
        && item
            .sharing()
            .contractors
            .resolve(&roster.contractor_ids())
            .contains(contractor)
}

/// Filters items down to those the team member may see
pub fn visible_to_member<'a, S: Shared>(
    items: &'a [S],
    roster: &Roster,
    member: &MemberId,
) -> Vec<&'a S> {
    items
        .iter()
        .filter(|item| can_view_member(*item, roster, member))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{EventId, PersonId};
    use crate::domain::roster::{Contractor, ContractorStatus, RosterMember};
    use chrono::Utc;

    fn person(name: &str) -> PersonId {
        name.parse().unwrap()
    }

    fn roster() -> Roster {
        let mut roster = Roster::new(EventId::new("Gala", Utc::now()));
        roster
            .team_members
            .push(RosterMember::creator(person("olivia"), "Olivia"));
        roster
            .team_members
            .push(RosterMember::new(person("sam"), "Sam", "coordinator"));
        roster
            .team_members
            .push(RosterMember::new(person("kim"), "Kim", "runner"));
        roster
            .contractors
            .push(Contractor::new("Acme Catering", ContractorStatus::Hired));
        roster
    }

    struct Item(SharingSpec);

    impl Shared for Item {
        fn sharing(&self) -> &SharingSpec {
            &self.0
        }
    }

    #[test]
    fn all_resolves_to_entire_roster() {
        let roster = roster();
        let spec = SharingSpec::new(Audience::All, Audience::All);

        let viewers = spec.resolve(&roster);
        assert_eq!(viewers.team, roster.member_ids());
        assert_eq!(viewers.contractors, roster.contractor_ids());
    }

    #[test]
    fn none_resolves_to_nobody() {
        let viewers = SharingSpec::private().resolve(&roster());
        assert!(viewers.is_empty());
    }

    #[test]
    fn selected_drops_dangling_ids() {
        let mut roster = roster();
        let sam = roster.team_members[1].id.clone();
        let kim = roster.team_members[2].id.clone();
        let spec = SharingSpec::assigned([sam.clone(), kim.clone()], []);

        roster.team_members.retain(|m| m.id != kim);

        let viewers = spec.resolve(&roster);
        assert_eq!(viewers.team, BTreeSet::from([sam]));
        assert_eq!(spec.dangling(&roster).team, BTreeSet::from([kim]));
    }

    #[test]
    fn empty_selection_is_nobody() {
        let spec = SharingSpec::new(Audience::Selected(BTreeSet::new()), Audience::None);
        assert!(spec.resolve(&roster()).is_empty());
    }

    #[test]
    fn switching_away_from_selected_clears_selection() {
        let roster = roster();
        let mut audience = Audience::selected([roster.team_members[1].id.clone()]);

        audience.switch_to(AudienceMode::All);
        assert_eq!(audience, Audience::All);

        audience.switch_to(AudienceMode::Selected);
        assert_eq!(audience, Audience::Selected(BTreeSet::new()));
    }

    #[test]
    fn switching_to_same_mode_keeps_selection() {
        let roster = roster();
        let sam = roster.team_members[1].id.clone();
        let mut audience = Audience::selected([sam.clone()]);

        audience.switch_to(AudienceMode::Selected);
        assert!(audience.directly_includes(&sam));
    }

    #[test]
    fn toggle_only_affects_selected() {
        let roster = roster();
        let sam = roster.team_members[1].id.clone();

        let mut all: Audience<MemberId> = Audience::All;
        assert!(!all.toggle(sam.clone()));
        assert_eq!(all, Audience::All);

        let mut selected = Audience::Selected(BTreeSet::new());
        assert!(selected.toggle(sam.clone()));
        assert!(selected.directly_includes(&sam));
        assert!(!selected.toggle(sam.clone()));
        assert!(!selected.directly_includes(&sam));
    }

    #[test]
    fn all_does_not_count_as_direct() {
        let roster = roster();
        let sam = roster.team_members[1].id.clone();
        assert!(!Audience::All.directly_includes(&sam));
    }

    #[test]
    fn member_visibility_filter() {
        let roster = roster();
        let sam = roster.team_members[1].id.clone();
        let kim = roster.team_members[2].id.clone();
        let items = vec![
            Item(SharingSpec::default()),
            Item(SharingSpec::private()),
            Item(SharingSpec::assigned([kim.clone()], [])),
        ];

        assert_eq!(visible_to_member(&items, &roster, &sam).len(), 1);
        assert_eq!(visible_to_member(&items, &roster, &kim).len(), 2);
        assert!(can_view_member(&items[2], &roster, &kim));
        assert!(!can_view_member(&items[2], &roster, &sam));
    }

    #[test]
    fn contractor_visibility() {
        let roster = roster();
        let acme = roster.contractors[0].id.clone();

        assert!(!can_view_contractor(&Item(SharingSpec::default()), &roster, &acme));
        assert!(can_view_contractor(
            &Item(SharingSpec::new(Audience::None, Audience::All)),
            &roster,
            &acme
        ));
    }

    #[test]
    fn restricted_to_keeps_all_and_none() {
        let roster = roster();
        let stranger = MemberId::new("stranger", Utc::now());
        let spec = SharingSpec::new(
            Audience::selected([stranger, roster.team_members[0].id.clone()]),
            Audience::All,
        );

        let restricted = spec.restricted_to(&roster);
        assert_eq!(
            restricted.team,
            Audience::selected([roster.team_members[0].id.clone()])
        );
        assert_eq!(restricted.contractors, Audience::All);
    }

    #[test]
    fn audience_parsing() {
        assert_eq!("all".parse::<Audience<MemberId>>(), Ok(Audience::All));
        assert_eq!("NONE".parse::<Audience<MemberId>>(), Ok(Audience::None));
        assert_eq!(
            "selected".parse::<Audience<MemberId>>(),
            Ok(Audience::Selected(BTreeSet::new()))
        );

        let parsed: Audience<MemberId> = "m-1234567, m-abcdef0".parse().unwrap();
        assert_eq!(parsed.selection().unwrap().len(), 2);

        assert!("m-1234567,bogus".parse::<Audience<MemberId>>().is_err());
    }

    #[test]
    fn audience_serde_shape() {
        let json = serde_json::to_value(Audience::<MemberId>::All).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "all"}));

        let id: MemberId = "m-1234567".parse().unwrap();
        let json = serde_json::to_value(Audience::selected([id])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "selected", "ids": ["m-1234567"]})
        );

        let parsed: Audience<MemberId> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.selection().unwrap().len(), 1);
    }
}
