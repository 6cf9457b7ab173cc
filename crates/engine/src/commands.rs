//! Command structs for engine write operations.
//!
//! These types group parameters for write operations (expense, payment,
//! void), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::{EntryId, GroupId, MemberId, Money, SplitPolicy};

/// Common metadata for entry creation.
#[derive(Clone, Debug)]
pub struct EntryMeta {
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// Authenticated member issuing the command; defaults to the payer.
    pub created_by: Option<MemberId>,
    /// When set, the append only succeeds if the log is still at this
    /// version (compare-and-append).
    pub expected_version: Option<u64>,
}

impl EntryMeta {
    #[must_use]
    pub fn new(occurred_at: DateTime<Utc>) -> Self {
        Self {
            description: None,
            occurred_at,
            created_by: None,
            expected_version: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, member: impl Into<MemberId>) -> Self {
        self.created_by = Some(member.into());
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Record an expense.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub payer: MemberId,
    pub amount: Money,
    pub split: SplitPolicy,
    pub group: Option<GroupId>,
    pub meta: EntryMeta,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        payer: impl Into<MemberId>,
        amount: Money,
        split: SplitPolicy,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payer: payer.into(),
            amount,
            split,
            group: None,
            meta: EntryMeta::new(occurred_at),
        }
    }

    #[must_use]
    pub fn group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: EntryMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, member: impl Into<MemberId>) -> Self {
        self.meta.created_by = Some(member.into());
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: u64) -> Self {
        self.meta.expected_version = Some(version);
        self
    }
}

/// Record a direct payment from `payer` to `payee`.
#[derive(Clone, Debug)]
pub struct PaymentCmd {
    pub payer: MemberId,
    pub payee: MemberId,
    pub amount: Money,
    pub group: Option<GroupId>,
    pub meta: EntryMeta,
}

impl PaymentCmd {
    #[must_use]
    pub fn new(
        payer: impl Into<MemberId>,
        payee: impl Into<MemberId>,
        amount: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payer: payer.into(),
            payee: payee.into(),
            amount,
            group: None,
            meta: EntryMeta::new(occurred_at),
        }
    }

    #[must_use]
    pub fn group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: EntryMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn created_by(mut self, member: impl Into<MemberId>) -> Self {
        self.meta.created_by = Some(member.into());
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: u64) -> Self {
        self.meta.expected_version = Some(version);
        self
    }
}

/// Cancel a previously recorded expense or payment.
#[derive(Clone, Debug)]
pub struct VoidCmd {
    pub target: EntryId,
    pub created_by: MemberId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub expected_version: Option<u64>,
}

impl VoidCmd {
    #[must_use]
    pub fn new(
        target: EntryId,
        created_by: impl Into<MemberId>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            created_by: created_by.into(),
            reason: None,
            occurred_at,
            expected_version: None,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}
