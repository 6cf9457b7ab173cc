use std::sync::Arc;

use crate::{
    Currency, EngineError, ErrorKind, LogRecord, LogState, LogStore, ResultEngine, Scope,
    Snapshot, TransactionLog,
};

mod audit;
mod balances;
mod record;
mod reports;
mod roster;
mod settlement;

pub use reports::{ActivityItem, BalanceSummary, GroupBalance, GroupOverview, MemberBalance};

/// Ledger engine bound to one transaction log.
///
/// The log is owned by the caller and injected through the builder; cloning
/// the engine (or building several engines on clones of the same log) shares
/// that log. Writes are serialized by the log, reads work on snapshots.
#[derive(Clone, Debug)]
pub struct Engine {
    log: TransactionLog,
    store: Option<Arc<dyn LogStore>>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Consistent view of the log for callers combining several reads.
    pub fn snapshot(&self) -> ResultEngine<Snapshot> {
        self.log.snapshot()
    }

    pub fn version(&self) -> ResultEngine<u64> {
        self.log.version()
    }

    pub fn currency(&self) -> ResultEngine<Currency> {
        self.log.currency()
    }

    /// Validate, persist and apply one record under the log write lock.
    fn append<F>(&self, expected_version: Option<u64>, build: F) -> ResultEngine<LogRecord>
    where
        F: FnOnce(&LogState) -> ResultEngine<LogRecord>,
    {
        let store = self.store.as_deref();
        self.log
            .append_with(expected_version, build, |version, record| match store {
                Some(store) => store.append(version, record).map(|_| ()),
                None => Ok(()),
            })
            .inspect_err(report)
    }
}

/// Log a failed command at a level matching its kind.
pub(crate) fn report(err: &EngineError) {
    match err.kind() {
        ErrorKind::Validation => tracing::debug!("command rejected: {err}"),
        ErrorKind::ConcurrentModification => tracing::warn!("append lost the race: {err}"),
        ErrorKind::Store => tracing::error!("store failure: {err}"),
        ErrorKind::Invariant => tracing::error!("ledger invariant violated: {err}"),
    }
}

fn require_scope(state: &LogState, scope: Scope) -> ResultEngine<()> {
    if let Scope::Group(id) = scope {
        state.require_group(id)?;
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    log: Option<TransactionLog>,
    store: Option<Arc<dyn LogStore>>,
    currency: Option<Currency>,
}

impl EngineBuilder {
    /// Pass the transaction log the engine works on.
    pub fn log(mut self, log: TransactionLog) -> EngineBuilder {
        self.log = Some(log);
        self
    }

    /// Pass the persistence port. Without a log, the log is replayed from it.
    pub fn store(mut self, store: Arc<dyn LogStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Currency of a freshly created log; checked against a replayed one.
    pub fn currency(mut self, currency: Currency) -> EngineBuilder {
        self.currency = Some(currency);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let log = match (self.log, &self.store) {
            (Some(log), Some(store)) => {
                let stored = store.load()?.version();
                let current = log.version()?;
                if stored != current {
                    return Err(EngineError::Store(format!(
                        "log at version {current} but store at version {stored}"
                    )));
                }
                log
            }
            (Some(log), None) => log,
            (None, Some(store)) => TransactionLog::from_stored(store.load()?)?,
            (None, None) => TransactionLog::new(self.currency.unwrap_or_default()),
        };

        let currency = log.currency()?;
        if let Some(expected) = self.currency
            && expected != currency
        {
            return Err(EngineError::CurrencyMismatch(format!(
                "ledger currency is {}, got {}",
                currency.code(),
                expected.code()
            )));
        }

        tracing::debug!(
            "engine ready at log version {} ({})",
            log.version()?,
            currency
        );
        Ok(Engine {
            log,
            store: self.store,
        })
    }
}
