//! Split policies.
//!
//! A [`SplitPolicy`] says how an expense amount is divided among the
//! participants. Resolving a policy against an amount yields the list of
//! [`Share`]s stored on the expense; the shares always sum exactly to the
//! amount, in integer minor units.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{EngineError, MemberId, Money, ResultEngine};

/// 100% expressed in basis points.
pub const FULL_BASIS_POINTS: u32 = 10_000;

/// The part of an expense owed by one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub member: MemberId,
    pub amount: Money,
}

impl Share {
    pub fn new(member: impl Into<MemberId>, amount: Money) -> Self {
        Self {
            member: member.into(),
            amount,
        }
    }
}

/// A percentage share in basis points (`2_500` = 25%).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentShare {
    pub member: MemberId,
    pub basis_points: u32,
}

impl PercentShare {
    pub fn new(member: impl Into<MemberId>, basis_points: u32) -> Self {
        Self {
            member: member.into(),
            basis_points,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Same share for everyone. Leftover minor units go one each to the
    /// participants with the smallest ids.
    Even { participants: Vec<MemberId> },
    /// Explicit amounts; must add up to the expense amount.
    Exact { shares: Vec<Share> },
    /// Basis points; must add up to [`FULL_BASIS_POINTS`].
    Percentage { shares: Vec<PercentShare> },
}

impl SplitPolicy {
    pub fn even<I, M>(participants: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self::Even {
            participants: participants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exact(shares: Vec<Share>) -> Self {
        Self::Exact { shares }
    }

    pub fn percentage(shares: Vec<PercentShare>) -> Self {
        Self::Percentage { shares }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Even { .. } => "even",
            Self::Exact { .. } => "exact",
            Self::Percentage { .. } => "percentage",
        }
    }

    /// Participants in the order they were given.
    pub fn participants(&self) -> Vec<&MemberId> {
        match self {
            Self::Even { participants } => participants.iter().collect(),
            Self::Exact { shares } => shares.iter().map(|s| &s.member).collect(),
            Self::Percentage { shares } => shares.iter().map(|s| &s.member).collect(),
        }
    }

    /// Divides `amount` according to the policy.
    ///
    /// The returned shares are sorted by member id and sum exactly to
    /// `amount`.
    pub fn resolve(&self, amount: Money) -> ResultEngine<Vec<Share>> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        ensure_unique(self.participants())?;

        let mut shares = match self {
            Self::Even { participants } => resolve_even(participants, amount),
            Self::Exact { shares } => resolve_exact(shares, amount)?,
            Self::Percentage { shares } => resolve_percentage(shares, amount)?,
        };
        shares.sort_by(|a, b| a.member.cmp(&b.member));
        Ok(shares)
    }
}

fn ensure_unique(participants: Vec<&MemberId>) -> ResultEngine<()> {
    if participants.is_empty() {
        return Err(EngineError::InvalidSplit(
            "at least one participant is required".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for member in participants {
        if !seen.insert(member) {
            return Err(EngineError::InvalidSplit(format!(
                "participant \"{member}\" listed twice"
            )));
        }
    }
    Ok(())
}

fn resolve_even(participants: &[MemberId], amount: Money) -> Vec<Share> {
    let mut ordered: Vec<&MemberId> = participants.iter().collect();
    ordered.sort();

    let n = ordered.len() as i64;
    let base = amount.minor() / n;
    let remainder = amount.minor() % n;

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, member)| {
            let extra = i64::from((i as i64) < remainder);
            Share::new(member.clone(), Money::new(base + extra))
        })
        .collect()
}

fn resolve_exact(shares: &[Share], amount: Money) -> ResultEngine<Vec<Share>> {
    let mut total = Money::ZERO;
    for share in shares {
        if share.amount.is_negative() {
            return Err(EngineError::InvalidSplit(format!(
                "share of \"{}\" must be >= 0",
                share.member
            )));
        }
        total = total
            .checked_add(share.amount)
            .ok_or_else(|| EngineError::InvalidAmount("shares too large".to_string()))?;
    }
    if total != amount {
        return Err(EngineError::InvalidSplit(format!(
            "shares do not sum to total: {total} != {amount}"
        )));
    }
    Ok(shares.to_vec())
}

fn resolve_percentage(shares: &[PercentShare], amount: Money) -> ResultEngine<Vec<Share>> {
    let total_bp: u64 = shares.iter().map(|s| u64::from(s.basis_points)).sum();
    if total_bp != u64::from(FULL_BASIS_POINTS) {
        return Err(EngineError::InvalidSplit(format!(
            "percentages do not sum to 100%: got {}.{:02}%",
            total_bp / 100,
            total_bp % 100
        )));
    }

    let full = i128::from(FULL_BASIS_POINTS);
    let mut resolved: Vec<(Share, i128)> = shares
        .iter()
        .map(|s| {
            let exact = i128::from(amount.minor()) * i128::from(s.basis_points);
            let floor = (exact / full) as i64;
            (Share::new(s.member.clone(), Money::new(floor)), exact % full)
        })
        .collect();

    let allocated: i64 = resolved.iter().map(|(s, _)| s.amount.minor()).sum();
    let leftover = (amount.minor() - allocated) as usize;

    // Largest fractional remainder first, member id breaks ties.
    let mut order: Vec<usize> = (0..resolved.len()).collect();
    order.sort_by(|&a, &b| {
        resolved[b]
            .1
            .cmp(&resolved[a].1)
            .then_with(|| resolved[a].0.member.cmp(&resolved[b].0.member))
    });
    for &idx in order.iter().take(leftover) {
        resolved[idx].0.amount += Money::new(1);
    }

    Ok(resolved.into_iter().map(|(share, _)| share).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(shares: &[Share]) -> Vec<(String, i64)> {
        shares
            .iter()
            .map(|s| (s.member.to_string(), s.amount.minor()))
            .collect()
    }

    #[test]
    fn even_split_is_exact_when_divisible() {
        let shares = SplitPolicy::even(["a", "b", "c"])
            .resolve(Money::new(9000))
            .unwrap();
        assert_eq!(
            amounts(&shares),
            vec![
                ("a".to_string(), 3000),
                ("b".to_string(), 3000),
                ("c".to_string(), 3000)
            ]
        );
    }

    #[test]
    fn even_split_remainder_goes_to_smallest_ids() {
        let shares = SplitPolicy::even(["carol", "alice", "bob"])
            .resolve(Money::new(100))
            .unwrap();
        assert_eq!(
            amounts(&shares),
            vec![
                ("alice".to_string(), 34),
                ("bob".to_string(), 33),
                ("carol".to_string(), 33)
            ]
        );
    }

    #[test]
    fn exact_split_must_match_total() {
        let policy = SplitPolicy::exact(vec![
            Share::new("a", Money::new(49)),
            Share::new("b", Money::new(50)),
        ]);
        let err = policy.resolve(Money::new(100)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSplit(msg) if msg.contains("do not sum")));

        let policy = SplitPolicy::exact(vec![
            Share::new("a", Money::new(150)),
            Share::new("b", Money::new(-50)),
        ]);
        assert!(policy.resolve(Money::new(100)).is_err());
    }

    #[test]
    fn percentage_split_uses_largest_remainder() {
        let shares = SplitPolicy::percentage(vec![
            PercentShare::new("a", 3_333),
            PercentShare::new("b", 3_333),
            PercentShare::new("c", 3_334),
        ])
        .resolve(Money::new(100))
        .unwrap();
        let total: i64 = shares.iter().map(|s| s.amount.minor()).sum();
        assert_eq!(total, 100);
        assert_eq!(
            amounts(&shares),
            vec![
                ("a".to_string(), 33),
                ("b".to_string(), 33),
                ("c".to_string(), 34)
            ]
        );
    }

    #[test]
    fn percentage_must_sum_to_hundred() {
        let err = SplitPolicy::percentage(vec![
            PercentShare::new("a", 5_000),
            PercentShare::new("b", 4_000),
        ])
        .resolve(Money::new(100))
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSplit(_)));
    }

    #[test]
    fn duplicates_and_empty_are_rejected() {
        assert!(
            SplitPolicy::even(["a", "a"])
                .resolve(Money::new(10))
                .is_err()
        );
        assert!(
            SplitPolicy::even(Vec::<MemberId>::new())
                .resolve(Money::new(10))
                .is_err()
        );
        assert!(SplitPolicy::even(["a"]).resolve(Money::ZERO).is_err());
    }
}
