//! Read models for a presentation layer: dashboard totals, activity feed and
//! group list. Everything is derived from one snapshot of the log.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EntryId, EntryKind, GroupId, GroupKey, LedgerEntry, LogState, MemberId, Money, ResultEngine,
    Scope, balances,
};

use super::{Engine, require_scope};

/// One line of a balance breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member: MemberId,
    pub name: String,
    /// Positive: they owe you. Negative: you owe them.
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBalance {
    pub group: GroupKey,
    pub name: String,
    pub amount: Money,
}

/// Dashboard totals for one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub member: MemberId,
    /// Total owed to counterparties, as a non-negative amount.
    pub you_owe: Money,
    /// Total owed by counterparties.
    pub you_are_owed: Money,
    /// `you_are_owed - you_owe`.
    pub net: Money,
    pub by_member: Vec<MemberBalance>,
    pub by_group: Vec<GroupBalance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: EntryId,
    pub kind: EntryKind,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub amount: Money,
    pub group: Option<GroupId>,
    pub group_name: Option<String>,
    /// Effect on the viewer's net position, when a viewer was given.
    pub impact: Option<Money>,
    pub voided: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOverview {
    pub id: GroupId,
    pub name: String,
    pub member_count: usize,
    pub total_spent: Money,
    pub last_activity: Option<DateTime<Utc>>,
    /// Viewer's net position in the group, when a viewer was given.
    pub balance: Option<Money>,
}

const DIRECT_LABEL: &str = "Direct";

fn member_name(state: &LogState, id: &MemberId) -> String {
    state
        .member(id)
        .map_or_else(|| id.to_string(), |m| m.name.clone())
}

fn group_name(state: &LogState, key: GroupKey) -> String {
    match key {
        GroupKey::Direct => DIRECT_LABEL.to_string(),
        GroupKey::Group(id) => state
            .group(id)
            .map_or_else(|| id.to_string(), |g| g.name.clone()),
    }
}

/// Effect of `entry` on `member`'s net position.
fn impact(state: &LogState, entry: &LedgerEntry, member: &MemberId) -> Money {
    let direct = |entry: &LedgerEntry| {
        entry
            .effects()
            .into_iter()
            .map(|(creditor, debtor, amount)| {
                if creditor == member {
                    amount
                } else if debtor == member {
                    -amount
                } else {
                    Money::ZERO
                }
            })
            .sum::<Money>()
    };
    match entry {
        LedgerEntry::Void(void) => state.entry(void.target).map_or(Money::ZERO, |t| -direct(t)),
        other => direct(other),
    }
}

impl Engine {
    /// Totals and breakdowns shown on a member's dashboard.
    pub fn summary(&self, member: &MemberId) -> ResultEngine<BalanceSummary> {
        let snapshot = self.snapshot()?;
        snapshot.require_member(member)?;

        let counterparties = balances::counterparty_balances(&snapshot, member, Scope::Global);
        let mut you_owe = Money::ZERO;
        let mut you_are_owed = Money::ZERO;
        let mut by_member = Vec::with_capacity(counterparties.len());
        for (counterparty, amount) in counterparties {
            if amount.is_negative() {
                you_owe += amount.abs();
            } else {
                you_are_owed += amount;
            }
            by_member.push(MemberBalance {
                name: member_name(&snapshot, &counterparty),
                member: counterparty,
                amount,
            });
        }

        let by_group = balances::net_by_group(&snapshot, member)
            .into_iter()
            .map(|(key, amount)| GroupBalance {
                group: key,
                name: group_name(&snapshot, key),
                amount,
            })
            .collect();

        Ok(BalanceSummary {
            member: member.clone(),
            you_owe,
            you_are_owed,
            net: you_are_owed - you_owe,
            by_member,
            by_group,
        })
    }

    /// Most recent entries first, optionally restricted to those involving
    /// `viewer`.
    pub fn activity(
        &self,
        viewer: Option<&MemberId>,
        scope: Scope,
        limit: usize,
    ) -> ResultEngine<Vec<ActivityItem>> {
        let snapshot = self.snapshot()?;
        require_scope(&snapshot, scope)?;
        if let Some(viewer) = viewer {
            snapshot.require_member(viewer)?;
        }

        let mut rows: Vec<(usize, &LedgerEntry)> = snapshot
            .entries()
            .enumerate()
            .filter(|(_, entry)| scope.contains(snapshot.resolved_group(entry)))
            .filter(|(_, entry)| match (viewer, entry) {
                (None, _) => true,
                (Some(viewer), LedgerEntry::Void(void)) => snapshot
                    .entry(void.target)
                    .is_some_and(|target| target.involves(viewer)),
                (Some(viewer), other) => other.involves(viewer),
            })
            .collect();
        rows.sort_by_key(|(pos, entry)| Reverse((entry.occurred_at(), *pos)));

        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(_, entry)| {
                let group = snapshot.resolved_group(entry);
                let amount = match entry {
                    LedgerEntry::Void(void) => snapshot
                        .entry(void.target)
                        .map_or(Money::ZERO, LedgerEntry::amount),
                    other => other.amount(),
                };
                ActivityItem {
                    id: entry.id(),
                    kind: entry.kind(),
                    occurred_at: entry.occurred_at(),
                    description: entry.description().to_string(),
                    amount,
                    group,
                    group_name: group.map(|id| group_name(&snapshot, GroupKey::Group(id))),
                    impact: viewer.map(|viewer| impact(&snapshot, entry, viewer)),
                    voided: snapshot.is_voided(entry.id()),
                }
            })
            .collect())
    }

    /// Group list with spend totals and last activity, most recently active
    /// first.
    pub fn group_overview(&self, viewer: Option<&MemberId>) -> ResultEngine<Vec<GroupOverview>> {
        let snapshot = self.snapshot()?;
        if let Some(viewer) = viewer {
            snapshot.require_member(viewer)?;
        }

        let mut overview: Vec<GroupOverview> = snapshot
            .groups()
            .map(|group| {
                let scope = Scope::Group(group.id);
                let total_spent = snapshot
                    .effective_entries(scope)
                    .filter(|entry| entry.kind() == EntryKind::Expense)
                    .map(LedgerEntry::amount)
                    .sum();
                let last_activity = snapshot
                    .entries()
                    .filter(|entry| snapshot.resolved_group(entry) == Some(group.id))
                    .map(LedgerEntry::occurred_at)
                    .max();
                GroupOverview {
                    id: group.id,
                    name: group.name.clone(),
                    member_count: group.members.len(),
                    total_spent,
                    last_activity,
                    balance: viewer.map(|viewer| balances::net_position(&snapshot, viewer, scope)),
                }
            })
            .collect();

        overview.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(overview)
    }
}
