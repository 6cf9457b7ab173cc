//! The transaction log.
//!
//! The log is an append-only sequence of [`LogRecord`]s. Roster changes
//! (members, groups) and ledger entries are both records, so the whole ledger
//! state is a fold over the log and `version` is simply the number of records
//! applied so far.
//!
//! [`TransactionLog`] is a cloneable handle to one shared log:
//!
//! - writers are serialized by a write lock; a record is validated against the
//!   current state, persisted, and only then applied in memory;
//! - readers take a [`Snapshot`], an immutable view of a fixed prefix of the
//!   log, and compute on it without holding any lock.
//!
//! Snapshots share the state with the log. An append made while a snapshot
//! is alive copies the whole state first (`Arc::make_mut`), so holding
//! snapshots across many appends costs `O(entries)` per append.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Deref,
    sync::{Arc, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Currency, EngineError, EntryId, Group, GroupId, LedgerEntry, Member, MemberId, Money,
    ResultEngine, Scope, balances, store::StoredLog,
};

/// Upper bound on the sum of every expense and payment amount in one log.
///
/// Any balance, net position or settlement amount is bounded by twice this
/// total, so folds over the log cannot overflow `i64`.
pub const MAX_LEDGER_TOTAL: Money = Money::new(i64::MAX / 4);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", content = "data", rename_all = "snake_case")]
pub enum LogRecord {
    MemberAdded(Member),
    MemberRemoved {
        member: MemberId,
        at: DateTime<Utc>,
    },
    GroupCreated(Group),
    GroupMemberAdded {
        group: GroupId,
        member: MemberId,
    },
    GroupMemberRemoved {
        group: GroupId,
        member: MemberId,
    },
    Entry(LedgerEntry),
}

/// Ledger state obtained by folding every record of the log.
#[derive(Clone, Debug)]
pub struct LogState {
    currency: Currency,
    version: u64,
    members: BTreeMap<MemberId, Member>,
    groups: BTreeMap<GroupId, Group>,
    entries: Vec<Arc<LedgerEntry>>,
    index: HashMap<EntryId, usize>,
    voided_by: HashMap<EntryId, EntryId>,
    /// Sum of all expense and payment amounts ever recorded, voided or not.
    turnover: Money,
}

impl LogState {
    fn new(currency: Currency) -> Self {
        Self {
            currency,
            version: 0,
            members: BTreeMap::new(),
            groups: BTreeMap::new(),
            entries: Vec::new(),
            index: HashMap::new(),
            voided_by: HashMap::new(),
            turnover: Money::ZERO,
        }
    }

    /// Number of records applied.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// All ledger entries (including voids) in append order.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LedgerEntry> {
        self.entries.iter().map(AsRef::as_ref)
    }

    pub fn entry(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.index.get(&id).map(|&pos| self.entries[pos].as_ref())
    }

    /// Position of the entry in append order.
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Id of the void cancelling `id`, if any.
    pub fn voided_by(&self, id: EntryId) -> Option<EntryId> {
        self.voided_by.get(&id).copied()
    }

    pub fn is_voided(&self, id: EntryId) -> bool {
        self.voided_by.contains_key(&id)
    }

    /// Sum of every expense and payment amount recorded so far.
    pub fn turnover(&self) -> Money {
        self.turnover
    }

    /// Expenses and payments that still count towards balances in `scope`.
    pub fn effective_entries(&self, scope: Scope) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .map(AsRef::as_ref)
            .filter(move |entry| {
                !matches!(entry, LedgerEntry::Void(_))
                    && !self.is_voided(entry.id())
                    && scope.contains(entry.group())
            })
    }

    /// Group an entry counts towards. Voids resolve through their target.
    pub fn resolved_group(&self, entry: &LedgerEntry) -> Option<GroupId> {
        match entry {
            LedgerEntry::Void(void) => self.entry(void.target).and_then(LedgerEntry::group),
            other => other.group(),
        }
    }

    pub(crate) fn require_member(&self, id: &MemberId) -> ResultEngine<&Member> {
        self.members
            .get(id)
            .ok_or_else(|| EngineError::UnknownMember(id.to_string()))
    }

    pub(crate) fn require_group(&self, id: GroupId) -> ResultEngine<&Group> {
        self.groups
            .get(&id)
            .ok_or_else(|| EngineError::UnknownGroup(id.to_string()))
    }

    /// Validates `record` against the current state without applying it.
    pub(crate) fn check(&self, record: &LogRecord) -> ResultEngine<()> {
        match record {
            LogRecord::MemberAdded(member) => {
                if self.members.contains_key(&member.id) {
                    return Err(EngineError::ExistingKey(member.id.to_string()));
                }
                Ok(())
            }
            LogRecord::MemberRemoved { member, .. } => self.check_member_removal(member),
            LogRecord::GroupCreated(group) => {
                if self.groups.contains_key(&group.id) {
                    return Err(EngineError::ExistingKey(group.id.to_string()));
                }
                let key = group.name_key();
                if self.groups.values().any(|g| g.name_key() == key) {
                    return Err(EngineError::ExistingKey(group.name.clone()));
                }
                for member in &group.members {
                    self.require_member(member)?;
                }
                Ok(())
            }
            LogRecord::GroupMemberAdded { group, member } => {
                let group = self.require_group(*group)?;
                self.require_member(member)?;
                if group.contains(member) {
                    return Err(EngineError::ExistingKey(format!(
                        "{member} in group {}",
                        group.name
                    )));
                }
                Ok(())
            }
            LogRecord::GroupMemberRemoved { group, member } => {
                let group = self.require_group(*group)?;
                group.require_member(member)?;
                let open = balances::counterparty_balances(self, member, Scope::Group(group.id));
                if let Some((counterparty, amount)) = open.iter().next() {
                    return Err(EngineError::MemberInUse(format!(
                        "{member} has an open balance of {} with {counterparty} in group {}",
                        amount.display(self.currency),
                        group.name
                    )));
                }
                Ok(())
            }
            LogRecord::Entry(entry) => self.check_entry(entry),
        }
    }

    fn check_member_removal(&self, member: &MemberId) -> ResultEngine<()> {
        self.require_member(member)?;
        if let Some(group) = self.groups.values().find(|g| g.contains(member)) {
            return Err(EngineError::MemberInUse(format!(
                "{member} still belongs to group {}",
                group.name
            )));
        }
        let open = balances::counterparty_balances(self, member, Scope::Global);
        if let Some((counterparty, amount)) = open.iter().next() {
            return Err(EngineError::MemberInUse(format!(
                "{member} has an open balance of {} with {counterparty}",
                amount.display(self.currency)
            )));
        }
        Ok(())
    }

    fn check_entry(&self, entry: &LedgerEntry) -> ResultEngine<()> {
        if self.index.contains_key(&entry.id()) {
            return Err(EngineError::ExistingKey(entry.id().to_string()));
        }
        let within_limit = self
            .turnover
            .checked_add(entry.amount())
            .is_some_and(|total| total <= MAX_LEDGER_TOTAL);
        if !within_limit {
            return Err(EngineError::InvalidAmount(format!(
                "ledger total would exceed {}",
                MAX_LEDGER_TOTAL.display(self.currency)
            )));
        }

        match entry {
            LedgerEntry::Expense(expense) => {
                if !expense.amount.is_positive() {
                    return Err(EngineError::InvalidAmount(
                        "amount must be > 0".to_string(),
                    ));
                }
                let total = expense
                    .shares
                    .iter()
                    .try_fold(Money::ZERO, |acc, s| acc.checked_add(s.amount))
                    .ok_or_else(|| EngineError::InvalidAmount("shares too large".to_string()))?;
                if total != expense.amount {
                    return Err(EngineError::InvalidSplit(format!(
                        "shares do not sum to total: {total} != {}",
                        expense.amount
                    )));
                }
                if expense.split.resolve(expense.amount)? != expense.shares {
                    return Err(EngineError::InvalidSplit(
                        "shares do not match the split policy".to_string(),
                    ));
                }
                self.require_member(&expense.created_by)?;
                self.require_member(&expense.payer)?;
                for share in &expense.shares {
                    self.require_member(&share.member)?;
                }
                if let Some(group_id) = expense.group {
                    let group = self.require_group(group_id)?;
                    group.require_member(&expense.payer)?;
                    for share in &expense.shares {
                        group.require_member(&share.member)?;
                    }
                }
                Ok(())
            }
            LedgerEntry::Payment(payment) => {
                if !payment.amount.is_positive() {
                    return Err(EngineError::InvalidAmount(
                        "amount must be > 0".to_string(),
                    ));
                }
                if payment.payer == payment.payee {
                    return Err(EngineError::SamePayerPayee(payment.payer.to_string()));
                }
                self.require_member(&payment.created_by)?;
                self.require_member(&payment.payer)?;
                self.require_member(&payment.payee)?;
                if let Some(group_id) = payment.group {
                    let group = self.require_group(group_id)?;
                    group.require_member(&payment.payer)?;
                    group.require_member(&payment.payee)?;
                }
                Ok(())
            }
            LedgerEntry::Void(void) => {
                self.require_member(&void.created_by)?;
                let target = self
                    .entry(void.target)
                    .ok_or_else(|| EngineError::KeyNotFound(void.target.to_string()))?;
                if matches!(target, LedgerEntry::Void(_)) {
                    return Err(EngineError::InvalidVoid(format!(
                        "{} is itself a void",
                        void.target
                    )));
                }
                if let Some(by) = self.voided_by(void.target) {
                    return Err(EngineError::InvalidVoid(format!(
                        "{} was already voided by {by}",
                        void.target
                    )));
                }
                Ok(())
            }
        }
    }

    /// Applies an already checked record.
    fn apply(&mut self, record: LogRecord) {
        match record {
            LogRecord::MemberAdded(member) => {
                self.members.insert(member.id.clone(), member);
            }
            LogRecord::MemberRemoved { member, .. } => {
                self.members.remove(&member);
            }
            LogRecord::GroupCreated(group) => {
                self.groups.insert(group.id, group);
            }
            LogRecord::GroupMemberAdded { group, member } => {
                if let Some(group) = self.groups.get_mut(&group) {
                    group.members.insert(member);
                }
            }
            LogRecord::GroupMemberRemoved { group, member } => {
                if let Some(group) = self.groups.get_mut(&group) {
                    group.members.remove(&member);
                }
            }
            LogRecord::Entry(entry) => {
                if let LedgerEntry::Void(void) = &entry {
                    self.voided_by.insert(void.target, void.id);
                }
                self.turnover += entry.amount();
                self.index.insert(entry.id(), self.entries.len());
                self.entries.push(Arc::new(entry));
            }
        }
        self.version += 1;
    }
}

/// Immutable, consistent view of the log at one version.
#[derive(Clone, Debug)]
pub struct Snapshot(Arc<LogState>);

impl Deref for Snapshot {
    type Target = LogState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Shared handle to a transaction log.
#[derive(Clone, Debug)]
pub struct TransactionLog {
    inner: Arc<RwLock<Arc<LogState>>>,
}

impl TransactionLog {
    pub fn new(currency: Currency) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(LogState::new(currency)))),
        }
    }

    /// Rebuilds a log by replaying `records`. Every record is re-validated.
    pub fn replay(
        currency: Currency,
        records: impl IntoIterator<Item = LogRecord>,
    ) -> ResultEngine<Self> {
        let mut state = LogState::new(currency);
        for record in records {
            state.check(&record).map_err(|err| {
                EngineError::InvariantViolation(format!(
                    "record {} does not replay: {err}",
                    state.version
                ))
            })?;
            state.apply(record);
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(state))),
        })
    }

    pub fn from_stored(stored: StoredLog) -> ResultEngine<Self> {
        Self::replay(stored.currency, stored.records)
    }

    /// Takes a consistent snapshot of the current state.
    pub fn snapshot(&self) -> ResultEngine<Snapshot> {
        let guard = self.inner.read().map_err(|_| poisoned())?;
        Ok(Snapshot(Arc::clone(&guard)))
    }

    pub fn version(&self) -> ResultEngine<u64> {
        Ok(self.snapshot()?.version())
    }

    pub fn currency(&self) -> ResultEngine<Currency> {
        Ok(self.snapshot()?.currency())
    }

    /// Builds, validates, persists and applies one record while holding the
    /// write lock. Nothing is applied unless every step succeeds.
    pub(crate) fn append_with<F, P>(
        &self,
        expected_version: Option<u64>,
        build: F,
        persist: P,
    ) -> ResultEngine<LogRecord>
    where
        F: FnOnce(&LogState) -> ResultEngine<LogRecord>,
        P: FnOnce(u64, &LogRecord) -> ResultEngine<()>,
    {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let actual = guard.version;
        if let Some(expected) = expected_version
            && expected != actual
        {
            return Err(EngineError::ConcurrentModification { expected, actual });
        }

        let record = build(&**guard)?;
        guard.check(&record)?;
        persist(actual, &record)?;
        Arc::make_mut(&mut *guard).apply(record.clone());
        Ok(record)
    }
}

fn poisoned() -> EngineError {
    EngineError::InvariantViolation("transaction log lock poisoned".to_string())
}
