//! Ledger participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MemberId, ResultEngine, util::normalize_required_name};

/// A participant identity. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(id: MemberId, name: &str, joined_at: DateTime<Utc>) -> ResultEngine<Self> {
        normalize_required_name(id.as_str(), "member id")?;
        Ok(Self {
            id,
            name: normalize_required_name(name, "member")?,
            joined_at,
        })
    }
}
