use crate::{
    EntryId, Expense, ExpenseCmd, LogRecord, Payment, PaymentCmd, ResultEngine, Void, VoidCmd,
    util::normalize_optional_text,
};

use super::Engine;

impl Engine {
    /// Records an expense.
    ///
    /// This:
    /// - resolves the split policy into shares that sum exactly to the amount
    /// - checks payer, participants and group membership against the roster
    /// - appends the entry atomically (all or nothing)
    ///
    /// With `expected_version` set, the append fails with
    /// `ConcurrentModification` if another writer got there first.
    pub fn record_expense(&self, cmd: ExpenseCmd) -> ResultEngine<EntryId> {
        let ExpenseCmd {
            payer,
            amount,
            split,
            group,
            meta,
        } = cmd;
        let shares = split.resolve(amount).inspect_err(super::report)?;
        let policy = split.kind();

        let expense = Expense {
            id: EntryId::new(),
            created_by: meta.created_by.unwrap_or_else(|| payer.clone()),
            payer,
            amount,
            split,
            shares,
            group,
            description: normalize_optional_text(meta.description.as_deref()).unwrap_or_default(),
            occurred_at: meta.occurred_at,
        };
        let id = expense.id;
        self.append(meta.expected_version, move |_| {
            Ok(LogRecord::Entry(expense.into()))
        })?;
        tracing::debug!("expense {id} recorded ({policy} split)");
        Ok(id)
    }

    /// Records a direct payment from `payer` to `payee`, settling (part of)
    /// what the payer owes.
    pub fn record_payment(&self, cmd: PaymentCmd) -> ResultEngine<EntryId> {
        let PaymentCmd {
            payer,
            payee,
            amount,
            group,
            meta,
        } = cmd;

        let payment = Payment {
            id: EntryId::new(),
            created_by: meta.created_by.unwrap_or_else(|| payer.clone()),
            payer,
            payee,
            amount,
            group,
            description: normalize_optional_text(meta.description.as_deref()).unwrap_or_default(),
            occurred_at: meta.occurred_at,
        };
        let id = payment.id;
        self.append(meta.expected_version, move |_| {
            Ok(LogRecord::Entry(payment.into()))
        })?;
        tracing::debug!("payment {id} recorded");
        Ok(id)
    }

    /// Voids an expense or payment by appending a compensating entry.
    ///
    /// The original entry stays in the log; balances stop counting it.
    pub fn void_entry(&self, cmd: VoidCmd) -> ResultEngine<EntryId> {
        let void = Void {
            id: EntryId::new(),
            target: cmd.target,
            reason: normalize_optional_text(cmd.reason.as_deref()),
            occurred_at: cmd.occurred_at,
            created_by: cmd.created_by,
        };
        let id = void.id;
        self.append(cmd.expected_version, move |_| Ok(LogRecord::Entry(void.into())))?;
        tracing::debug!("entry {} voided by {id}", cmd.target);
        Ok(id)
    }
}
