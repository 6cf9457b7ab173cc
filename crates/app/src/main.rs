use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use engine::{Currency, Engine};

use crate::{cli::Cli, error::AppError, store::JsonFileStore};

mod cli;
mod commands;
mod error;
mod export;
mod seed;
mod settings;
mod store;
mod views;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "splitledger={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let path = cli
        .ledger
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.ledger.path));
    let default_currency = Currency::try_from(settings.ledger.currency.as_str())?;
    let expected_currency = cli
        .currency
        .as_deref()
        .map(Currency::try_from)
        .transpose()?;

    let store = Arc::new(JsonFileStore::open(
        path,
        expected_currency.unwrap_or(default_currency),
    )?);
    tracing::debug!("using ledger {}", store.path().display());

    let mut builder = Engine::builder().store(store);
    if let Some(currency) = expected_currency {
        builder = builder.currency(currency);
    }
    let engine = builder.build()?;

    commands::run(&engine, cli.command)
}
