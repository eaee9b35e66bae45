//! Property tests for lifecycle, tab gating and sharing resolution

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use proptest::prelude::*;

use lineup_cli::domain::{
    Artifact, ArtifactId, Audience, EventId, EventStatus, MemberId, PersonId, Shared,
    SharingSpec, Tab,
};
use lineup_cli::service::{AssignmentTracker, BlockReason, CoreError, Lifecycle, NewMember, TabGate};
use lineup_cli::storage::MemoryStore;

fn person(name: &str) -> PersonId {
    name.parse()
        .unwrap_or_else(|e| panic!("invalid person {name}: {e}"))
}

fn status_strategy() -> impl Strategy<Value = EventStatus> {
    prop::sample::select(EventStatus::ALL.to_vec())
}

fn tab_strategy() -> impl Strategy<Value = Tab> {
    prop::sample::select(Tab::ALL.to_vec())
}

/// Event owned by "owner" with the owner as creator plus `extra` members
fn event_with_members(store: &mut MemoryStore, extra: usize) -> (EventId, MemberId, Vec<MemberId>) {
    let event = Lifecycle::new(store)
        .create_event("Gala", person("owner"))
        .unwrap();
    let mut tracker = AssignmentTracker::new(store);

    let roster = tracker
        .add_member(
            &event.id,
            NewMember {
                person_id: person("owner"),
                name: "Owner".to_string(),
                role: String::new(),
                is_creator: true,
            },
        )
        .unwrap();
    let creator = roster.team_members[0].id.clone();

    let mut members = Vec::new();
    for i in 0..extra {
        let name = format!("member{i}");
        let roster = tracker
            .add_member(
                &event.id,
                NewMember {
                    person_id: person(&name),
                    name: name.clone(),
                    role: "crew".to_string(),
                    is_creator: false,
                },
            )
            .unwrap();
        let added = roster.member_for_person(&person(&name)).unwrap();
        members.push(added.id.clone());
    }

    (event.id, creator, members)
}

proptest! {
    #[test]
    fn tab_is_granted_iff_reachable(status in status_strategy(), tab in tab_strategy()) {
        let mut gate = TabGate::default();
        let reachable = status != EventStatus::Draft || tab == Tab::Overview;

        let result = gate.activate(status, tab, Instant::now());
        prop_assert_eq!(result.is_ok(), reachable);
    }

    #[test]
    fn locked_tab_notifies_once_per_window(
        offsets in prop::collection::vec(0u64..3000, 1..20),
        window_ms in 1u64..2000,
    ) {
        let mut gate = TabGate::new(Duration::from_millis(window_ms));
        let start = Instant::now();
        let mut sorted = offsets;
        sorted.sort_unstable();

        let mut last_notified: Option<u64> = None;
        for offset in sorted {
            let err = gate
                .activate(EventStatus::Draft, Tab::Tasks, start + Duration::from_millis(offset))
                .unwrap_err();
            let expected = last_notified.map_or(true, |last| offset - last >= window_ms);
            prop_assert_eq!(err.notify, expected);
            if expected {
                last_notified = Some(offset);
            }
        }
    }

    #[test]
    fn history_chains_every_transition(targets in prop::collection::vec(status_strategy(), 1..12)) {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let owner = person("owner");
        let event = engine.create_event("Gala", owner.clone()).unwrap();

        for target in &targets {
            engine.transition(&event.id, *target, &owner, None).unwrap();
        }

        let history = engine.history(&event.id).unwrap();
        prop_assert_eq!(history.len(), targets.len());
        prop_assert_eq!(history[0].previous_status, None);
        for (i, pair) in history.windows(2).enumerate() {
            prop_assert_eq!(pair[1].previous_status, Some(pair[0].new_status));
            prop_assert_eq!(pair[1].sequence, i as u64 + 2);
        }

        let current = engine.event(&event.id).unwrap().status();
        prop_assert_eq!(Some(current), targets.last().copied());
    }

    #[test]
    fn non_owner_never_changes_anything(target in status_strategy()) {
        let mut store = MemoryStore::new();
        let mut engine = Lifecycle::new(&mut store);
        let event = engine.create_event("Gala", person("owner")).unwrap();

        let result = engine.transition(&event.id, target, &person("intruder"), None);
        let unauthorized = matches!(result, Err(CoreError::Unauthorized { .. }));
        prop_assert!(unauthorized);
        prop_assert_eq!(engine.event(&event.id).unwrap().status(), EventStatus::Draft);
        prop_assert!(engine.history(&event.id).unwrap().is_empty());
    }

    #[test]
    fn sharing_twice_is_idempotent(extra in 1usize..6, picks in prop::collection::vec(any::<bool>(), 6)) {
        let mut store = MemoryStore::new();
        let (event_id, _, members) = event_with_members(&mut store, extra);
        let mut tracker = AssignmentTracker::new(&mut store);

        let selected: Vec<MemberId> = members
            .iter()
            .zip(picks)
            .filter(|(_, pick)| *pick)
            .map(|(id, _)| id.clone())
            .collect();
        let doc = tracker
            .create_document(&event_id, "Plan", None, SharingSpec::private())
            .unwrap();
        let doc_id: ArtifactId = doc.id.into();
        let spec = SharingSpec::assigned(selected, []);

        let once = tracker.share(&doc_id, spec.clone()).unwrap();
        let viewers_once = tracker.viewers(&doc_id).unwrap();
        let twice = tracker.share(&doc_id, spec).unwrap();
        let viewers_twice = tracker.viewers(&doc_id).unwrap();

        prop_assert_eq!(once.sharing(), twice.sharing());
        prop_assert_eq!(viewers_once, viewers_twice);
    }

    #[test]
    fn all_audience_tracks_roster(extra in 0usize..6, removals in prop::collection::vec(any::<bool>(), 6)) {
        let mut store = MemoryStore::new();
        let (event_id, _, members) = event_with_members(&mut store, extra);
        let mut tracker = AssignmentTracker::new(&mut store);

        let doc = tracker
            .create_document(&event_id, "Schedule", None, SharingSpec::default())
            .unwrap();
        let doc_id: ArtifactId = doc.id.into();

        for (member, remove) in members.iter().zip(removals) {
            if remove {
                tracker.remove_member(&event_id, member, false).unwrap();
            }
        }

        let roster = tracker.roster(&event_id).unwrap();
        prop_assert_eq!(tracker.viewers(&doc_id).unwrap().team, roster.member_ids());
    }

    #[test]
    fn creator_is_never_removed(assign_creator in any::<bool>(), force in any::<bool>()) {
        let mut store = MemoryStore::new();
        let (event_id, creator, _) = event_with_members(&mut store, 1);
        let mut tracker = AssignmentTracker::new(&mut store);

        if assign_creator {
            let task = tracker.create_task(&event_id, "Sign", None).unwrap();
            tracker.assign(&task.id.into(), [creator.clone()], []).unwrap();
        }

        let result = tracker.remove_member(&event_id, &creator, force);
        let blocked = matches!(
            result,
            Err(CoreError::RemovalBlocked { reason: BlockReason::IsCreator, .. })
        );
        prop_assert!(blocked);
        prop_assert!(tracker.roster(&event_id).unwrap().has_member(&creator));
    }

    #[test]
    fn dangling_ids_are_ignored(extra in 1usize..5, strangers in 1usize..5) {
        let mut store = MemoryStore::new();
        let (event_id, _, members) = event_with_members(&mut store, extra);
        let mut tracker = AssignmentTracker::new(&mut store);

        let task = tracker.create_task(&event_id, "Setup", None).unwrap();
        let task_id: ArtifactId = task.id.clone().into();
        tracker.assign(&task_id, members.clone(), []).unwrap();

        // Removing members leaves their ids behind in the stored selection
        for member in &members[..extra / 2] {
            tracker.remove_member(&event_id, member, true).unwrap();
        }
        let unknown: BTreeSet<MemberId> = (0..strangers)
            .map(|i| MemberId::new(&format!("stranger{i}"), Utc::now()))
            .collect();

        let roster = tracker.roster(&event_id).unwrap();
        let stored: BTreeSet<MemberId> = members.iter().cloned().chain(unknown).collect();
        let audience = Audience::Selected(stored.clone());

        let expected: BTreeSet<MemberId> =
            stored.intersection(&roster.member_ids()).cloned().collect();
        prop_assert_eq!(audience.resolve(&roster.member_ids()), expected.clone());
        prop_assert_eq!(tracker.active_assignees(&task.id).unwrap(), expected);

        let artifact = tracker.artifact(&task_id).unwrap();
        prop_assert!(matches!(artifact, Artifact::Task(_)));
    }
}
