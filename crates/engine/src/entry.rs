//! Ledger entries.
//!
//! An entry is an immutable record in the transaction log. Three kinds exist:
//!
//! - [`Expense`]: a payer covered `amount` on behalf of the participants.
//! - [`Payment`]: a direct transfer from one member to another.
//! - [`Void`]: cancels the effect of an earlier expense or payment.
//!
//! Entries are never edited in place; corrections are new entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, GroupId, MemberId, Money, Share, SplitPolicy};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: EntryId,
    pub payer: MemberId,
    pub amount: Money,
    pub split: SplitPolicy,
    /// Resolved shares, sorted by member id. Sum == `amount`.
    pub shares: Vec<Share>,
    pub group: Option<GroupId>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub created_by: MemberId,
}

impl Expense {
    pub fn share_of(&self, member: &MemberId) -> Money {
        self.shares
            .iter()
            .find(|s| &s.member == member)
            .map_or(Money::ZERO, |s| s.amount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: EntryId,
    pub payer: MemberId,
    pub payee: MemberId,
    pub amount: Money,
    pub group: Option<GroupId>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub created_by: MemberId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Void {
    pub id: EntryId,
    pub target: EntryId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_by: MemberId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Expense,
    Payment,
    Void,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Payment => "payment",
            Self::Void => "void",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Expense(Expense),
    Payment(Payment),
    Void(Void),
}

impl LedgerEntry {
    pub fn id(&self) -> EntryId {
        match self {
            Self::Expense(e) => e.id,
            Self::Payment(p) => p.id,
            Self::Void(v) => v.id,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Expense(_) => EntryKind::Expense,
            Self::Payment(_) => EntryKind::Payment,
            Self::Void(_) => EntryKind::Void,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Expense(e) => e.occurred_at,
            Self::Payment(p) => p.occurred_at,
            Self::Void(v) => v.occurred_at,
        }
    }

    /// Group the entry is scoped to. Voids report `None`; their scope is the
    /// scope of their target.
    pub fn group(&self) -> Option<GroupId> {
        match self {
            Self::Expense(e) => e.group,
            Self::Payment(p) => p.group,
            Self::Void(_) => None,
        }
    }

    /// Headline amount (expense total or payment amount).
    pub fn amount(&self) -> Money {
        match self {
            Self::Expense(e) => e.amount,
            Self::Payment(p) => p.amount,
            Self::Void(_) => Money::ZERO,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Expense(e) => &e.description,
            Self::Payment(p) => &p.description,
            Self::Void(v) => v.reason.as_deref().unwrap_or(""),
        }
    }

    /// Returns `true` when `member` pays, receives or shares in this entry.
    pub fn involves(&self, member: &MemberId) -> bool {
        match self {
            Self::Expense(e) => &e.payer == member || e.shares.iter().any(|s| &s.member == member),
            Self::Payment(p) => &p.payer == member || &p.payee == member,
            Self::Void(v) => &v.created_by == member,
        }
    }

    /// Signed pairwise effects of the entry as `(creditor, debtor, amount)`:
    /// `debtor` owes `creditor` `amount` more after this entry.
    ///
    /// Payments are expressed the same way: a payment from A to B makes B
    /// owe A the paid amount, which cancels A's earlier debt towards B.
    pub fn effects(&self) -> Vec<(&MemberId, &MemberId, Money)> {
        match self {
            Self::Expense(e) => e
                .shares
                .iter()
                .filter(|s| s.member != e.payer && !s.amount.is_zero())
                .map(|s| (&e.payer, &s.member, s.amount))
                .collect(),
            Self::Payment(p) => vec![(&p.payer, &p.payee, p.amount)],
            Self::Void(_) => Vec::new(),
        }
    }
}

impl From<Expense> for LedgerEntry {
    fn from(value: Expense) -> Self {
        Self::Expense(value)
    }
}

impl From<Payment> for LedgerEntry {
    fn from(value: Payment) -> Self {
        Self::Payment(value)
    }
}

impl From<Void> for LedgerEntry {
    fn from(value: Void) -> Self {
        Self::Void(value)
    }
}
