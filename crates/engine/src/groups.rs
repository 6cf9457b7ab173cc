//! A `Group` is a named set of members sharing expenses. A member can belong
//! to several groups.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, GroupId, MemberId, ResultEngine,
    util::{normalize_key, normalize_required_name},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: BTreeSet<MemberId>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(
        name: &str,
        members: impl IntoIterator<Item = MemberId>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: GroupId::new(),
            name: normalize_required_name(name, "group")?,
            members: members.into_iter().collect(),
            created_at,
        })
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    /// Key used to keep group names unique within a ledger.
    pub(crate) fn name_key(&self) -> String {
        normalize_key(&self.name)
    }

    pub(crate) fn require_member(&self, member: &MemberId) -> ResultEngine<()> {
        if self.contains(member) {
            return Ok(());
        }
        Err(EngineError::NotInGroup {
            member: member.to_string(),
            group: self.name.clone(),
        })
    }
}
