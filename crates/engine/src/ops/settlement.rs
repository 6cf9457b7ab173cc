use std::collections::BTreeMap;

use crate::{
    EngineError, MemberId, Money, PairwiseBalances, ResultEngine, Scope, Transfer, balances,
    settlement,
};

use super::{Engine, report, require_scope};

impl Engine {
    /// Minimal settlement plan for `members` in `scope`.
    ///
    /// An empty `members` slice means every member with an open position in
    /// the scope. A selection whose positions do not sum to zero cannot be
    /// settled among itself and is rejected with `UnbalancedSelection`.
    pub fn simplify_debts(&self, members: &[MemberId], scope: Scope) -> ResultEngine<Vec<Transfer>> {
        let snapshot = self.snapshot()?;
        require_scope(&snapshot, scope)?;

        let positions: BTreeMap<MemberId, Money> = if members.is_empty() {
            balances::net_positions(&snapshot, scope)
        } else {
            let mut positions = BTreeMap::new();
            for member in members {
                snapshot.require_member(member)?;
                let net = balances::net_position(&snapshot, member, scope);
                if !net.is_zero() {
                    positions.insert(member.clone(), net);
                }
            }
            let total = positions
                .values()
                .try_fold(Money::ZERO, |acc, amount| acc.checked_add(*amount));
            if total != Some(Money::ZERO) {
                let err = EngineError::UnbalancedSelection(format!(
                    "positions of the selected members sum to {}, expected 0",
                    total.unwrap_or_default().display(snapshot.currency())
                ));
                report(&err);
                return Err(err);
            }
            positions
        };

        let plan = settlement::simplify(&positions).inspect_err(report)?;

        let left = settlement::apply(&positions, &plan);
        if let Some((member, amount)) = left.iter().next() {
            let err = EngineError::InvariantViolation(format!(
                "settlement leaves {member} at {amount}"
            ));
            report(&err);
            return Err(err);
        }
        if plan.len() > positions.len().saturating_sub(1) {
            let err = EngineError::InvariantViolation(format!(
                "{} transfers for {} parties",
                plan.len(),
                positions.len()
            ));
            report(&err);
            return Err(err);
        }

        tracing::debug!(
            "settlement for {} parties needs {} transfers",
            positions.len(),
            plan.len()
        );
        Ok(plan)
    }

    /// Direct settlement: one transfer per pair with an open balance.
    pub fn pairwise_plan(&self, scope: Scope) -> ResultEngine<Vec<Transfer>> {
        let snapshot = self.snapshot()?;
        require_scope(&snapshot, scope)?;
        Ok(settlement::pairwise(&PairwiseBalances::from_state(
            &snapshot, scope,
        )))
    }
}
