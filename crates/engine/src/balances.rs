//! Balance derivations.
//!
//! Balances are never stored: every function here is a pure fold over the
//! effective entries of a [`LogState`] (expenses and payments that have not
//! been voided). Summation is commutative, so the results do not depend on the
//! order in which entries were appended.
//!
//! Sign convention: `balance_between(a, b)` is positive when `b` owes `a`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{GroupId, LogState, MemberId, Money};

/// Which entries a computation looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "group", rename_all = "snake_case")]
pub enum Scope {
    /// Every entry in the log.
    Global,
    /// Entries recorded inside one group.
    Group(GroupId),
    /// Entries recorded outside any group (two-party transactions).
    Direct,
}

impl Scope {
    pub fn contains(self, group: Option<GroupId>) -> bool {
        match self {
            Scope::Global => true,
            Scope::Group(id) => group == Some(id),
            Scope::Direct => group.is_none(),
        }
    }
}

/// Bucket of the per-group breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GroupKey {
    Direct,
    Group(GroupId),
}

impl From<Option<GroupId>> for GroupKey {
    fn from(value: Option<GroupId>) -> Self {
        value.map_or(GroupKey::Direct, GroupKey::Group)
    }
}

impl From<GroupKey> for Scope {
    fn from(value: GroupKey) -> Self {
        match value {
            GroupKey::Direct => Scope::Direct,
            GroupKey::Group(id) => Scope::Group(id),
        }
    }
}

/// Signed amount `b` owes `a` in `scope`.
pub fn balance_between(state: &LogState, a: &MemberId, b: &MemberId, scope: Scope) -> Money {
    let mut balance = Money::ZERO;
    if a == b {
        return balance;
    }
    for entry in state.effective_entries(scope) {
        for (creditor, debtor, amount) in entry.effects() {
            if creditor == a && debtor == b {
                balance += amount;
            } else if creditor == b && debtor == a {
                balance -= amount;
            }
        }
    }
    balance
}

/// Balance of `member` against each counterparty. Zero balances are omitted.
pub fn counterparty_balances(
    state: &LogState,
    member: &MemberId,
    scope: Scope,
) -> BTreeMap<MemberId, Money> {
    let mut balances: BTreeMap<MemberId, Money> = BTreeMap::new();
    for entry in state.effective_entries(scope) {
        for (creditor, debtor, amount) in entry.effects() {
            if creditor == member {
                *balances.entry(debtor.clone()).or_default() += amount;
            } else if debtor == member {
                *balances.entry(creditor.clone()).or_default() -= amount;
            }
        }
    }
    balances.retain(|_, amount| !amount.is_zero());
    balances
}

/// Net position of one member: positive when the member is owed overall.
pub fn net_position(state: &LogState, member: &MemberId, scope: Scope) -> Money {
    let mut net = Money::ZERO;
    for entry in state.effective_entries(scope) {
        for (creditor, debtor, amount) in entry.effects() {
            if creditor == member {
                net += amount;
            }
            if debtor == member {
                net -= amount;
            }
        }
    }
    net
}

/// Net position of every member with a non-zero position in `scope`.
pub fn net_positions(state: &LogState, scope: Scope) -> BTreeMap<MemberId, Money> {
    let mut positions: BTreeMap<MemberId, Money> = BTreeMap::new();
    for entry in state.effective_entries(scope) {
        for (creditor, debtor, amount) in entry.effects() {
            *positions.entry(creditor.clone()).or_default() += amount;
            *positions.entry(debtor.clone()).or_default() -= amount;
        }
    }
    positions.retain(|_, amount| !amount.is_zero());
    positions
}

/// Net position of `member` split by group (direct entries under
/// [`GroupKey::Direct`]). Zero buckets are omitted.
pub fn net_by_group(state: &LogState, member: &MemberId) -> BTreeMap<GroupKey, Money> {
    let mut buckets: BTreeMap<GroupKey, Money> = BTreeMap::new();
    for entry in state.effective_entries(Scope::Global) {
        let key = GroupKey::from(entry.group());
        for (creditor, debtor, amount) in entry.effects() {
            if creditor == member {
                *buckets.entry(key).or_default() += amount;
            }
            if debtor == member {
                *buckets.entry(key).or_default() -= amount;
            }
        }
    }
    buckets.retain(|_, amount| !amount.is_zero());
    buckets
}

/// Balance matrix keyed by canonically ordered member pairs.
///
/// Each unordered pair is stored once as `(low, high)` with the amount `high`
/// owes `low`, so `get(a, b) == -get(b, a)` holds by construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairwiseBalances {
    pairs: BTreeMap<(MemberId, MemberId), Money>,
}

impl PairwiseBalances {
    pub fn from_state(state: &LogState, scope: Scope) -> Self {
        let mut pairs: BTreeMap<(MemberId, MemberId), Money> = BTreeMap::new();
        for entry in state.effective_entries(scope) {
            for (creditor, debtor, amount) in entry.effects() {
                if creditor < debtor {
                    *pairs
                        .entry((creditor.clone(), debtor.clone()))
                        .or_default() += amount;
                } else {
                    *pairs
                        .entry((debtor.clone(), creditor.clone()))
                        .or_default() -= amount;
                }
            }
        }
        pairs.retain(|_, amount| !amount.is_zero());
        Self { pairs }
    }

    /// Amount `b` owes `a`.
    pub fn get(&self, a: &MemberId, b: &MemberId) -> Money {
        if a < b {
            self.pairs
                .get(&(a.clone(), b.clone()))
                .copied()
                .unwrap_or_default()
        } else {
            -self
                .pairs
                .get(&(b.clone(), a.clone()))
                .copied()
                .unwrap_or_default()
        }
    }

    /// Non-zero pairs as `(low, high, amount high owes low)`.
    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, &MemberId, Money)> {
        self.pairs.iter().map(|((lo, hi), amount)| (lo, hi, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Net position of each member, summed from the matrix.
    pub fn net_positions(&self) -> BTreeMap<MemberId, Money> {
        let mut positions: BTreeMap<MemberId, Money> = BTreeMap::new();
        for (lo, hi, amount) in self.iter() {
            *positions.entry(lo.clone()).or_default() += amount;
            *positions.entry(hi.clone()).or_default() -= amount;
        }
        positions.retain(|_, amount| !amount.is_zero());
        positions
    }
}
