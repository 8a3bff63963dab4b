//! Three-way roster diff for team create/update.
//!
//! Given every membership row of a team (including soft-deleted ones), the desired
//! roster and the row ids to remove, decide which rows to reactivate, which to
//! deactivate and which subjects need a fresh row.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::AppError;
use crate::models::{DesiredMember, Member, Role};

/// A validated roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub user_id: i64,
    pub is_leader: bool,
    pub role: Role,
    pub summary: Option<String>,
}

/// An existing row brought back to APPROVED with new attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub member_id: i64,
    pub entry: RosterEntry,
}

/// Result of [`reconcile`]. Each list is sorted, so equal inputs give equal outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub to_activate: Vec<Activation>,
    pub to_deactivate: Vec<i64>,
    pub to_insert: Vec<RosterEntry>,
}

impl Reconciliation {
    /// Number of roster entries that end up active.
    pub fn active_len(&self) -> usize {
        self.to_activate.len() + self.to_insert.len()
    }
}

pub fn reconcile(
    existing: &[Member],
    desired: &[DesiredMember],
    delete_ids: &[i64],
) -> Result<Reconciliation, AppError> {
    let mut update_subjects: BTreeMap<i64, &DesiredMember> =
        desired.iter().map(|entry| (entry.user_id, entry)).collect();
    let delete_set: BTreeSet<i64> = delete_ids.iter().copied().collect();

    let mut conflicting: Vec<i64> = existing
        .iter()
        .filter(|m| delete_set.contains(&m.id) && update_subjects.contains_key(&m.user_id))
        .map(|m| m.id)
        .collect();
    if !conflicting.is_empty() {
        conflicting.sort_unstable();
        return Err(AppError::ConflictingUpdateDelete(conflicting));
    }

    let mut to_deactivate = Vec::new();
    let mut activated: Vec<(i64, &DesiredMember)> = Vec::new();
    for member in existing {
        if delete_set.contains(&member.id) {
            to_deactivate.push(member.id);
        }
        if let Some(entry) = update_subjects.remove(&member.user_id) {
            activated.push((member.id, entry));
        }
    }
    let inserted: Vec<&DesiredMember> = update_subjects.into_values().collect();

    if delete_ids.len() != to_deactivate.len() {
        return Err(AppError::ReconciliationInvariant(format!(
            "{} member ids to delete, {} matched existing rows",
            delete_ids.len(),
            to_deactivate.len()
        )));
    }
    if activated.len() + inserted.len() != desired.len() {
        return Err(AppError::ReconciliationInvariant(format!(
            "{} desired members, {} classified",
            desired.len(),
            activated.len() + inserted.len()
        )));
    }

    let has_leader = activated
        .iter()
        .map(|(_, entry)| *entry)
        .chain(inserted.iter().copied())
        .any(|entry| entry.is_leader);
    if !has_leader {
        return Err(AppError::NoLeader);
    }

    let mut to_activate = activated
        .into_iter()
        .map(|(member_id, entry)| {
            Ok(Activation {
                member_id,
                entry: roster_entry(entry)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    let to_insert = inserted
        .into_iter()
        .map(roster_entry)
        .collect::<Result<Vec<_>, AppError>>()?;

    to_activate.sort_by_key(|activation| activation.member_id);
    to_deactivate.sort_unstable();

    Ok(Reconciliation {
        to_activate,
        to_deactivate,
        to_insert,
    })
}

fn roster_entry(desired: &DesiredMember) -> Result<RosterEntry, AppError> {
    let role =
        Role::from_str(&desired.role).ok_or_else(|| AppError::InvalidRole(desired.role.clone()))?;
    Ok(RosterEntry {
        user_id: desired.user_id,
        is_leader: desired.is_leader,
        role,
        summary: desired.summary.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberStatus;

    fn member(id: i64, user_id: i64, role: Role, is_leader: bool) -> Member {
        Member {
            id,
            team_id: 1,
            user_id,
            role,
            is_leader,
            status: MemberStatus::Approved,
            is_deleted: false,
            summary: None,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn desired(user_id: i64, is_leader: bool, role: &str) -> DesiredMember {
        DesiredMember {
            user_id,
            is_leader,
            role: role.to_string(),
            summary: None,
        }
    }

    #[test]
    fn test_keeps_leader_and_inserts_newcomer() {
        let existing = vec![member(1, 1, Role::Backend, true)];
        let wanted = vec![desired(1, true, "BACKEND"), desired(2, false, "FRONTEND")];

        let diff = reconcile(&existing, &wanted, &[]).unwrap();

        assert_eq!(diff.to_activate.len(), 1);
        assert_eq!(diff.to_activate[0].member_id, 1);
        assert_eq!(diff.to_activate[0].entry.role, Role::Backend);
        assert_eq!(
            diff.to_insert,
            vec![RosterEntry {
                user_id: 2,
                is_leader: false,
                role: Role::Frontend,
                summary: None,
            }]
        );
        assert!(diff.to_deactivate.is_empty());
    }

    #[test]
    fn test_update_and_delete_same_row_conflicts() {
        let existing = vec![
            member(1, 1, Role::Backend, true),
            member(2, 5, Role::Devops, false),
        ];
        let wanted = vec![desired(1, true, "BACKEND"), desired(5, false, "DEVOPS")];

        let err = reconcile(&existing, &wanted, &[2]).unwrap_err();
        assert!(matches!(err, AppError::ConflictingUpdateDelete(ids) if ids == vec![2]));
    }

    #[test]
    fn test_deletes_existing_row() {
        let existing = vec![
            member(1, 1, Role::Backend, true),
            member(2, 5, Role::Devops, false),
        ];
        let wanted = vec![desired(1, true, "BACKEND")];

        let diff = reconcile(&existing, &wanted, &[2]).unwrap();
        assert_eq!(diff.to_deactivate, vec![2]);
        assert_eq!(diff.active_len(), 1);
    }

    #[test]
    fn test_unknown_delete_id_breaks_invariant() {
        let existing = vec![member(1, 1, Role::Backend, true)];
        let wanted = vec![desired(1, true, "BACKEND")];

        let err = reconcile(&existing, &wanted, &[99]).unwrap_err();
        assert!(matches!(err, AppError::ReconciliationInvariant(_)));
    }

    #[test]
    fn test_repeated_subject_breaks_invariant() {
        let wanted = vec![desired(3, true, "BACKEND"), desired(3, false, "FRONTEND")];
        let err = reconcile(&[], &wanted, &[]).unwrap_err();
        assert!(matches!(err, AppError::ReconciliationInvariant(_)));
    }

    #[test]
    fn test_roster_without_leader_rejected() {
        let existing = vec![member(1, 1, Role::Backend, true)];
        let wanted = vec![desired(1, false, "BACKEND"), desired(2, false, "FRONTEND")];

        let err = reconcile(&existing, &wanted, &[]).unwrap_err();
        assert!(matches!(err, AppError::NoLeader));
    }

    #[test]
    fn test_empty_roster_has_no_leader() {
        let err = reconcile(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, AppError::NoLeader));
    }

    #[test]
    fn test_invalid_role_rejected() {
        let wanted = vec![desired(1, true, "BACKEND"), desired(2, false, "DESIGNER")];
        let err = reconcile(&[], &wanted, &[]).unwrap_err();
        assert!(matches!(err, AppError::InvalidRole(role) if role == "DESIGNER"));
    }

    #[test]
    fn test_soft_deleted_row_is_reactivated_not_duplicated() {
        let mut gone = member(4, 8, Role::Frontend, false);
        gone.is_deleted = true;
        gone.status = MemberStatus::Cancelled;
        let existing = vec![member(1, 1, Role::Backend, true), gone];
        let wanted = vec![desired(1, true, "BACKEND"), desired(8, false, "FULL_STACK")];

        let diff = reconcile(&existing, &wanted, &[]).unwrap();
        assert!(diff.to_insert.is_empty());
        assert_eq!(diff.to_activate[1].member_id, 4);
        assert_eq!(diff.to_activate[1].entry.role, Role::FullStack);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::MemberStatus;

    /// What a generated existing row does in the request.
    #[derive(Debug, Clone, Copy)]
    enum Fate {
        Untouched,
        Updated,
        Deleted,
    }

    fn arb_fate() -> impl Strategy<Value = Fate> {
        prop_oneof![Just(Fate::Untouched), Just(Fate::Updated), Just(Fate::Deleted)]
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        (0usize..Role::ALL.len()).prop_map(|i| Role::ALL[i])
    }

    /// Existing rows, desired roster and delete ids with no update/delete overlap
    /// and at least one leader.
    fn arb_case() -> impl Strategy<Value = (Vec<Member>, Vec<DesiredMember>, Vec<i64>)> {
        (
            proptest::collection::vec((arb_fate(), arb_role(), any::<bool>()), 0..8),
            proptest::collection::vec((arb_role(), any::<bool>()), 0..5),
        )
            .prop_map(|(rows, newcomers)| {
                let mut existing = Vec::new();
                let mut wanted = Vec::new();
                let mut delete_ids = Vec::new();

                for (i, (fate, role, is_leader)) in rows.into_iter().enumerate() {
                    let id = 100 + i as i64;
                    let user_id = 1 + i as i64;
                    existing.push(Member {
                        id,
                        team_id: 1,
                        user_id,
                        role,
                        is_leader,
                        status: MemberStatus::Approved,
                        is_deleted: false,
                        summary: None,
                        updated_at: String::new(),
                    });
                    match fate {
                        Fate::Untouched => {}
                        Fate::Updated => wanted.push(DesiredMember {
                            user_id,
                            is_leader,
                            role: role.as_str().to_string(),
                            summary: None,
                        }),
                        Fate::Deleted => delete_ids.push(id),
                    }
                }

                for (i, (role, is_leader)) in newcomers.into_iter().enumerate() {
                    wanted.push(DesiredMember {
                        user_id: 1_000 + i as i64,
                        is_leader,
                        role: role.as_str().to_string(),
                        summary: None,
                    });
                }

                wanted.push(DesiredMember {
                    user_id: 5_000,
                    is_leader: true,
                    role: Role::Backend.as_str().to_string(),
                    summary: None,
                });

                (existing, wanted, delete_ids)
            })
    }

    proptest! {
        #[test]
        fn diff_is_complete((existing, wanted, delete_ids) in arb_case()) {
            let diff = reconcile(&existing, &wanted, &delete_ids).unwrap();
            prop_assert_eq!(diff.to_activate.len() + diff.to_insert.len(), wanted.len());
            prop_assert_eq!(diff.to_deactivate.len(), delete_ids.len());
        }

        #[test]
        fn diff_ignores_input_order(
            (existing, shuffled_existing, wanted, shuffled_wanted, delete_ids, shuffled_deletes) in
                arb_case().prop_flat_map(|(existing, wanted, delete_ids)| (
                    Just(existing.clone()),
                    Just(existing).prop_shuffle(),
                    Just(wanted.clone()),
                    Just(wanted).prop_shuffle(),
                    Just(delete_ids.clone()),
                    Just(delete_ids).prop_shuffle(),
                ))
        ) {
            let original = reconcile(&existing, &wanted, &delete_ids).unwrap();
            let reordered =
                reconcile(&shuffled_existing, &shuffled_wanted, &shuffled_deletes).unwrap();
            prop_assert_eq!(original, reordered);
        }

        #[test]
        fn leaderless_roster_always_rejected(
            roles in proptest::collection::vec(arb_role(), 0..6)
        ) {
            let wanted: Vec<DesiredMember> = roles
                .iter()
                .enumerate()
                .map(|(i, role)| DesiredMember {
                    user_id: i as i64,
                    is_leader: false,
                    role: role.as_str().to_string(),
                    summary: None,
                })
                .collect();
            prop_assert!(matches!(reconcile(&[], &wanted, &[]), Err(AppError::NoLeader)));
        }
    }
}
