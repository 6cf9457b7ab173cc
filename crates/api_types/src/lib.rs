//! JSON shapes printed by the `splitledger` front end.
//!
//! Amounts travel as integer minor units (`*_minor`) next to the currency
//! code, so consumers never have to parse decimal strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: String,
        pub name: String,
        pub joined_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub members: Vec<String>,
        pub created_at: DateTime<Utc>,
    }

    /// One row of the group list.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupOverviewView {
        pub id: Uuid,
        pub name: String,
        pub member_count: usize,
        pub currency: String,
        pub total_spent_minor: i64,
        pub last_activity: Option<DateTime<Utc>>,
        /// Viewer's net position in the group.
        pub balance_minor: Option<i64>,
    }
}

pub mod balance {
    use super::*;

    /// Signed amount `other` owes `member` (negative: `member` owes `other`).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member: String,
        pub other: String,
        pub scope: String,
        pub currency: String,
        pub amount_minor: i64,
        pub display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CounterpartyView {
        pub member: String,
        pub name: String,
        pub amount_minor: i64,
        pub display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NetBalanceView {
        pub member: String,
        pub scope: String,
        pub currency: String,
        pub counterparties: Vec<CounterpartyView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBalanceView {
        /// `None` for entries recorded outside any group.
        pub group: Option<Uuid>,
        pub name: String,
        pub amount_minor: i64,
        pub display: String,
    }

    /// Dashboard totals.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryView {
        pub member: String,
        pub currency: String,
        pub you_owe_minor: i64,
        pub you_are_owed_minor: i64,
        pub net_minor: i64,
        pub by_member: Vec<CounterpartyView>,
        pub by_group: Vec<GroupBalanceView>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
        pub display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementPlan {
        pub scope: String,
        pub currency: String,
        /// `simplified` or `pairwise`.
        pub strategy: String,
        pub transfers: Vec<TransferView>,
    }
}

pub mod activity {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKindView {
        Expense,
        Payment,
        Void,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActivityView {
        pub id: Uuid,
        pub kind: EntryKindView,
        pub occurred_at: DateTime<Utc>,
        pub description: String,
        pub amount_minor: i64,
        pub group: Option<Uuid>,
        pub group_name: Option<String>,
        /// Effect on the viewer's net position.
        pub impact_minor: Option<i64>,
        pub voided: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryCreated {
        pub id: Uuid,
        pub version: u64,
    }
}
