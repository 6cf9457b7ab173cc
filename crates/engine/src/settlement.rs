//! Settlement plans.
//!
//! Given each member's net position (creditors positive, debtors negative),
//! [`simplify`] derives a short list of transfers that brings every position
//! to zero. Matching always pairs the largest outstanding credit with the
//! largest outstanding debt; every step closes at least one party, so `N`
//! non-zero parties never need more than `N - 1` transfers.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, MemberId, Money, PairwiseBalances, ResultEngine};

/// `from` pays `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

/// Greedy largest-first settlement.
///
/// Ties are broken by ascending member id so the output is deterministic.
/// Fails with [`EngineError::InvariantViolation`] when the positions do not
/// sum to zero.
pub fn simplify(positions: &BTreeMap<MemberId, Money>) -> ResultEngine<Vec<Transfer>> {
    let total: Money = positions.values().sum();
    if !total.is_zero() {
        return Err(EngineError::InvariantViolation(format!(
            "net positions sum to {total}, expected 0"
        )));
    }

    let mut creditors: BinaryHeap<(Money, Reverse<MemberId>)> = BinaryHeap::new();
    let mut debtors: BinaryHeap<(Money, Reverse<MemberId>)> = BinaryHeap::new();
    for (member, amount) in positions {
        if amount.is_positive() {
            creditors.push((*amount, Reverse(member.clone())));
        } else if amount.is_negative() {
            debtors.push((amount.abs(), Reverse(member.clone())));
        }
    }

    let mut transfers = Vec::with_capacity(creditors.len() + debtors.len());
    loop {
        match (creditors.pop(), debtors.pop()) {
            (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) => {
                let amount = credit.min(debt);
                if credit > amount {
                    creditors.push((credit - amount, Reverse(creditor.clone())));
                }
                if debt > amount {
                    debtors.push((debt - amount, Reverse(debtor.clone())));
                }
                transfers.push(Transfer {
                    from: debtor,
                    to: creditor,
                    amount,
                });
            }
            (None, None) => break,
            (Some((left, Reverse(member))), None) | (None, Some((left, Reverse(member)))) => {
                return Err(EngineError::InvariantViolation(format!(
                    "{member} left with unmatched {left}"
                )));
            }
        }
    }
    Ok(transfers)
}

/// One transfer per counterparty pair with an open balance, no netting across
/// pairs.
pub fn pairwise(balances: &PairwiseBalances) -> Vec<Transfer> {
    balances
        .iter()
        .map(|(low, high, amount)| {
            if amount.is_positive() {
                Transfer {
                    from: high.clone(),
                    to: low.clone(),
                    amount,
                }
            } else {
                Transfer {
                    from: low.clone(),
                    to: high.clone(),
                    amount: amount.abs(),
                }
            }
        })
        .collect()
}

/// Positions left after executing `transfers`. Zero positions are omitted.
pub fn apply(
    positions: &BTreeMap<MemberId, Money>,
    transfers: &[Transfer],
) -> BTreeMap<MemberId, Money> {
    let mut after = positions.clone();
    for transfer in transfers {
        *after.entry(transfer.from.clone()).or_default() += transfer.amount;
        *after.entry(transfer.to.clone()).or_default() -= transfer.amount;
    }
    after.retain(|_, amount| !amount.is_zero());
    after
}
