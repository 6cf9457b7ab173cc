//! Conversions from engine results to the `api_types` JSON shapes.

use std::collections::BTreeMap;

use api_types::{
    activity::{ActivityView, EntryKindView},
    balance::{BalanceView, CounterpartyView, GroupBalanceView, NetBalanceView, SummaryView},
    group::{GroupOverviewView, GroupView},
    member::MemberView,
    settlement::{SettlementPlan, TransferView},
};
use engine::{
    ActivityItem, BalanceSummary, Currency, EntryKind, Group, GroupKey, GroupOverview, LogState,
    Member, MemberBalance, MemberId, Money, Scope, Transfer,
};

/// Human readable scope label; groups are shown by name.
pub fn scope_label(state: &LogState, scope: Scope) -> String {
    match scope {
        Scope::Global => "global".to_string(),
        Scope::Direct => "direct".to_string(),
        Scope::Group(id) => state
            .group(id)
            .map_or_else(|| id.to_string(), |g| g.name.clone()),
    }
}

pub fn member(member: &Member) -> MemberView {
    MemberView {
        id: member.id.to_string(),
        name: member.name.clone(),
        joined_at: member.joined_at,
    }
}

pub fn group(group: &Group) -> GroupView {
    GroupView {
        id: *group.id.as_uuid(),
        name: group.name.clone(),
        members: group.members.iter().map(ToString::to_string).collect(),
        created_at: group.created_at,
    }
}

pub fn balance(
    member: &MemberId,
    other: &MemberId,
    scope: String,
    amount: Money,
    currency: Currency,
) -> BalanceView {
    BalanceView {
        member: member.to_string(),
        other: other.to_string(),
        scope,
        currency: currency.code().to_string(),
        amount_minor: amount.minor(),
        display: amount.display(currency),
    }
}

fn counterparty(line: MemberBalance, currency: Currency) -> CounterpartyView {
    CounterpartyView {
        member: line.member.to_string(),
        name: line.name,
        amount_minor: line.amount.minor(),
        display: line.amount.display(currency),
    }
}

pub fn net_balance(
    state: &LogState,
    member: &MemberId,
    scope: Scope,
    balances: BTreeMap<MemberId, Money>,
) -> NetBalanceView {
    let currency = state.currency();
    NetBalanceView {
        member: member.to_string(),
        scope: scope_label(state, scope),
        currency: currency.code().to_string(),
        counterparties: balances
            .into_iter()
            .map(|(id, amount)| {
                let name = state
                    .member(&id)
                    .map_or_else(|| id.to_string(), |m| m.name.clone());
                counterparty(
                    MemberBalance {
                        member: id,
                        name,
                        amount,
                    },
                    currency,
                )
            })
            .collect(),
    }
}

pub fn summary(summary: BalanceSummary, currency: Currency) -> SummaryView {
    SummaryView {
        member: summary.member.to_string(),
        currency: currency.code().to_string(),
        you_owe_minor: summary.you_owe.minor(),
        you_are_owed_minor: summary.you_are_owed.minor(),
        net_minor: summary.net.minor(),
        by_member: summary
            .by_member
            .into_iter()
            .map(|line| counterparty(line, currency))
            .collect(),
        by_group: summary
            .by_group
            .into_iter()
            .map(|line| GroupBalanceView {
                group: match line.group {
                    GroupKey::Direct => None,
                    GroupKey::Group(id) => Some(*id.as_uuid()),
                },
                name: line.name,
                amount_minor: line.amount.minor(),
                display: line.amount.display(currency),
            })
            .collect(),
    }
}

pub fn plan(
    scope: String,
    strategy: &str,
    transfers: Vec<Transfer>,
    currency: Currency,
) -> SettlementPlan {
    SettlementPlan {
        scope,
        currency: currency.code().to_string(),
        strategy: strategy.to_string(),
        transfers: transfers
            .into_iter()
            .map(|t| TransferView {
                from: t.from.to_string(),
                to: t.to.to_string(),
                amount_minor: t.amount.minor(),
                display: t.amount.display(currency),
            })
            .collect(),
    }
}

pub fn activity(item: ActivityItem) -> ActivityView {
    ActivityView {
        id: *item.id.as_uuid(),
        kind: match item.kind {
            EntryKind::Expense => EntryKindView::Expense,
            EntryKind::Payment => EntryKindView::Payment,
            EntryKind::Void => EntryKindView::Void,
        },
        occurred_at: item.occurred_at,
        description: item.description,
        amount_minor: item.amount.minor(),
        group: item.group.map(|id| *id.as_uuid()),
        group_name: item.group_name,
        impact_minor: item.impact.map(Money::minor),
        voided: item.voided,
    }
}

pub fn group_overview(row: GroupOverview, currency: Currency) -> GroupOverviewView {
    GroupOverviewView {
        id: *row.id.as_uuid(),
        name: row.name,
        member_count: row.member_count,
        currency: currency.code().to_string(),
        total_spent_minor: row.total_spent.minor(),
        last_activity: row.last_activity,
        balance_minor: row.balance.map(Money::minor),
    }
}
