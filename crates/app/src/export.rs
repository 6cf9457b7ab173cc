use csv::Writer;
use engine::{Currency, LedgerEntry, LogState, Scope, Transfer};
use serde::Serialize;

use crate::error::AppError;

#[derive(Serialize)]
struct EntryRow {
    occurred_at: String,
    kind: &'static str,
    id: String,
    group: String,
    payer: String,
    /// Share holders (`member:minor;...`), the payee, or the voided entry.
    counterparties: String,
    amount_minor: i64,
    amount: String,
    description: String,
    voided: bool,
}

#[derive(Serialize)]
struct TransferRow {
    from: String,
    to: String,
    amount_minor: i64,
    amount: String,
}

/// Every entry in `scope`, voids included, in append order.
pub fn entries_csv(state: &LogState, scope: Scope) -> Result<Vec<u8>, AppError> {
    let currency = state.currency();
    let mut writer = Writer::from_writer(vec![]);
    for entry in state
        .entries()
        .filter(|entry| scope.contains(state.resolved_group(entry)))
    {
        let group = state
            .resolved_group(entry)
            .and_then(|id| state.group(id))
            .map(|g| g.name.clone())
            .unwrap_or_default();
        let (payer, counterparties, amount) = match entry {
            LedgerEntry::Expense(e) => (
                e.payer.to_string(),
                e.shares
                    .iter()
                    .map(|s| format!("{}:{}", s.member, s.amount.minor()))
                    .collect::<Vec<_>>()
                    .join(";"),
                e.amount,
            ),
            LedgerEntry::Payment(p) => (p.payer.to_string(), p.payee.to_string(), p.amount),
            LedgerEntry::Void(v) => (
                v.created_by.to_string(),
                v.target.to_string(),
                state
                    .entry(v.target)
                    .map(LedgerEntry::amount)
                    .unwrap_or_default(),
            ),
        };
        writer.serialize(EntryRow {
            occurred_at: entry.occurred_at().to_rfc3339(),
            kind: entry.kind().as_str(),
            id: entry.id().to_string(),
            group,
            payer,
            counterparties,
            amount_minor: amount.minor(),
            amount: amount.display(currency),
            description: entry.description().to_string(),
            voided: state.is_voided(entry.id()),
        })?;
    }
    finish(writer)
}

pub fn plan_csv(transfers: &[Transfer], currency: Currency) -> Result<Vec<u8>, AppError> {
    let mut writer = Writer::from_writer(vec![]);
    for transfer in transfers {
        writer.serialize(TransferRow {
            from: transfer.from.to_string(),
            to: transfer.to.to_string(),
            amount_minor: transfer.amount.minor(),
            amount: transfer.amount.display(currency),
        })?;
    }
    finish(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer.into_inner().map_err(|err| {
        tracing::error!("failed to finalize export: {err}");
        AppError::Io(std::io::Error::other(err.to_string()))
    })
}
