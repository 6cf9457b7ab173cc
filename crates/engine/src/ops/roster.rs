use chrono::Utc;

use crate::{
    EngineError, Group, GroupId, LogRecord, Member, MemberId, ResultEngine, util::normalize_key,
};

use super::Engine;

impl Engine {
    /// Registers a member supplied by the identity provider.
    pub fn add_member(&self, id: impl Into<MemberId>, name: &str) -> ResultEngine<Member> {
        let member = Member::new(id.into(), name, Utc::now())?;
        self.append(None, |_| Ok(LogRecord::MemberAdded(member.clone())))?;
        tracing::debug!("member {} added", member.id);
        Ok(member)
    }

    /// Deletes a member. Only allowed once the member belongs to no group and
    /// every balance with every counterparty is zero.
    pub fn remove_member(&self, id: &MemberId) -> ResultEngine<()> {
        self.append(None, |_| {
            Ok(LogRecord::MemberRemoved {
                member: id.clone(),
                at: Utc::now(),
            })
        })?;
        tracing::debug!("member {id} removed");
        Ok(())
    }

    /// Creates a group. Names are unique ignoring case, accents and spacing.
    pub fn new_group<I, M>(&self, name: &str, members: I) -> ResultEngine<GroupId>
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        let group = Group::new(name, members.into_iter().map(Into::into), Utc::now())?;
        let id = group.id;
        self.append(None, move |_| Ok(LogRecord::GroupCreated(group)))?;
        tracing::debug!("group {id} created");
        Ok(id)
    }

    pub fn add_group_member(&self, group: GroupId, member: &MemberId) -> ResultEngine<()> {
        self.append(None, |_| {
            Ok(LogRecord::GroupMemberAdded {
                group,
                member: member.clone(),
            })
        })?;
        Ok(())
    }

    /// Removes a member from a group once all their balances inside the group
    /// are settled.
    pub fn remove_group_member(&self, group: GroupId, member: &MemberId) -> ResultEngine<()> {
        self.append(None, |_| {
            Ok(LogRecord::GroupMemberRemoved {
                group,
                member: member.clone(),
            })
        })?;
        Ok(())
    }

    pub fn member(&self, id: &MemberId) -> ResultEngine<Member> {
        Ok(self.snapshot()?.require_member(id)?.clone())
    }

    pub fn members(&self) -> ResultEngine<Vec<Member>> {
        Ok(self.snapshot()?.members().cloned().collect())
    }

    pub fn group(&self, id: GroupId) -> ResultEngine<Group> {
        Ok(self.snapshot()?.require_group(id)?.clone())
    }

    /// Looks a group up by name (same normalization as uniqueness).
    pub fn group_by_name(&self, name: &str) -> ResultEngine<Group> {
        let key = normalize_key(name);
        self.snapshot()?
            .groups()
            .find(|g| g.name_key() == key)
            .cloned()
            .ok_or_else(|| EngineError::UnknownGroup(name.to_string()))
    }

    pub fn groups(&self) -> ResultEngine<Vec<Group>> {
        Ok(self.snapshot()?.groups().cloned().collect())
    }
}
