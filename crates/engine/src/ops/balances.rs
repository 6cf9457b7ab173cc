use std::collections::BTreeMap;

use crate::{
    GroupKey, MemberId, Money, PairwiseBalances, ResultEngine, Scope, balances,
};

use super::{Engine, require_scope};

impl Engine {
    /// Signed amount `b` owes `a` in `scope` (negative when `a` owes `b`).
    pub fn compute_balance(&self, a: &MemberId, b: &MemberId, scope: Scope) -> ResultEngine<Money> {
        let snapshot = self.snapshot()?;
        snapshot.require_member(a)?;
        snapshot.require_member(b)?;
        require_scope(&snapshot, scope)?;
        Ok(balances::balance_between(&snapshot, a, b, scope))
    }

    /// Balance of `member` against every counterparty in `scope`.
    ///
    /// Counterparties whose balance nets to zero are left out.
    pub fn compute_net_balance(
        &self,
        member: &MemberId,
        scope: Scope,
    ) -> ResultEngine<BTreeMap<MemberId, Money>> {
        let snapshot = self.snapshot()?;
        snapshot.require_member(member)?;
        require_scope(&snapshot, scope)?;
        Ok(balances::counterparty_balances(&snapshot, member, scope))
    }

    /// Net position of `member` in each group, plus direct entries.
    pub fn net_balance_by_group(
        &self,
        member: &MemberId,
    ) -> ResultEngine<BTreeMap<GroupKey, Money>> {
        let snapshot = self.snapshot()?;
        snapshot.require_member(member)?;
        Ok(balances::net_by_group(&snapshot, member))
    }

    /// Net position of every member with a non-zero position in `scope`.
    pub fn net_positions(&self, scope: Scope) -> ResultEngine<BTreeMap<MemberId, Money>> {
        let snapshot = self.snapshot()?;
        require_scope(&snapshot, scope)?;
        Ok(balances::net_positions(&snapshot, scope))
    }

    pub fn pairwise_balances(&self, scope: Scope) -> ResultEngine<PairwiseBalances> {
        let snapshot = self.snapshot()?;
        require_scope(&snapshot, scope)?;
        Ok(PairwiseBalances::from_state(&snapshot, scope))
    }
}
