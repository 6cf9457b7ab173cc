//! Runs one parsed command against the engine and renders its result.

use std::{fs, io::Write, str::FromStr};

use api_types::{activity::EntryCreated, member::MembersResponse};
use chrono::{DateTime, Utc};
use engine::{
    Engine, EntryId, EntryMeta, ExpenseCmd, FULL_BASIS_POINTS, GroupId, MemberId, Money,
    PaymentCmd, PercentShare, Scope, Share, SplitPolicy, VoidCmd,
};
use serde::Serialize;

use crate::{
    cli::{
        Command, EntryArgs, ExpenseArgs, ExportKind, GroupCommand, MemberCommand, PaymentArgs,
        ScopeArgs, SplitKind,
    },
    error::AppError,
    export, seed, views,
};

pub fn run(engine: &Engine, command: Command) -> Result<(), AppError> {
    match command {
        Command::Member(member) => match member.command {
            MemberCommand::Add(args) => {
                let name = args.name.as_deref().unwrap_or(&args.id);
                let member = engine.add_member(args.id.as_str(), name)?;
                print_json(&views::member(&member))
            }
            MemberCommand::Remove(args) => {
                engine.remove_member(&MemberId::from(args.id.as_str()))?;
                print_json(&serde_json::json!({ "removed": args.id }))
            }
            MemberCommand::List => print_json(&MembersResponse {
                members: engine.members()?.iter().map(views::member).collect(),
            }),
        },
        Command::Group(group) => match group.command {
            GroupCommand::New(args) => {
                let id = engine.new_group(&args.name, args.members)?;
                print_json(&views::group(&engine.group(id)?))
            }
            GroupCommand::AddMember(args) => {
                let id = resolve_group(engine, &args.group)?;
                engine.add_group_member(id, &MemberId::from(args.member))?;
                print_json(&views::group(&engine.group(id)?))
            }
            GroupCommand::RemoveMember(args) => {
                let id = resolve_group(engine, &args.group)?;
                engine.remove_group_member(id, &MemberId::from(args.member))?;
                print_json(&views::group(&engine.group(id)?))
            }
            GroupCommand::List(args) => {
                let viewer = args.viewer.map(MemberId::from);
                let currency = engine.currency()?;
                let rows: Vec<_> = engine
                    .group_overview(viewer.as_ref())?
                    .into_iter()
                    .map(|row| views::group_overview(row, currency))
                    .collect();
                print_json(&rows)
            }
        },
        Command::Expense(args) => {
            let cmd = expense_cmd(engine, args)?;
            let id = engine.record_expense(cmd)?;
            print_created(engine, id)
        }
        Command::Payment(args) => {
            let cmd = payment_cmd(engine, args)?;
            let id = engine.record_payment(cmd)?;
            print_created(engine, id)
        }
        Command::Void(args) => {
            let target = EntryId::from_str(&args.entry)
                .map_err(|err| AppError::Argument(format!("entry id {}: {err}", args.entry)))?;
            let mut cmd = VoidCmd::new(target, args.by, Utc::now());
            if let Some(reason) = args.reason {
                cmd = cmd.reason(reason);
            }
            if let Some(version) = args.expected_version {
                cmd = cmd.expected_version(version);
            }
            let id = engine.void_entry(cmd)?;
            print_created(engine, id)
        }
        Command::Balance(args) => {
            let snapshot = engine.snapshot()?;
            let scope = resolve_scope(engine, &args.scope)?;
            let (a, b) = (MemberId::from(args.member), MemberId::from(args.other));
            let amount = engine.compute_balance(&a, &b, scope)?;
            print_json(&views::balance(
                &a,
                &b,
                views::scope_label(&snapshot, scope),
                amount,
                snapshot.currency(),
            ))
        }
        Command::Net(args) => {
            let scope = resolve_scope(engine, &args.scope)?;
            let member = MemberId::from(args.member);
            let balances = engine.compute_net_balance(&member, scope)?;
            let snapshot = engine.snapshot()?;
            print_json(&views::net_balance(&snapshot, &member, scope, balances))
        }
        Command::Summary(args) => {
            let summary = engine.summary(&MemberId::from(args.member))?;
            print_json(&views::summary(summary, engine.currency()?))
        }
        Command::Settle(args) => {
            let scope = resolve_scope(engine, &args.scope)?;
            let snapshot = engine.snapshot()?;
            let (strategy, transfers) = if args.pairwise {
                ("pairwise", engine.pairwise_plan(scope)?)
            } else {
                let members: Vec<MemberId> =
                    args.members.into_iter().map(MemberId::from).collect();
                ("simplified", engine.simplify_debts(&members, scope)?)
            };
            print_json(&views::plan(
                views::scope_label(&snapshot, scope),
                strategy,
                transfers,
                snapshot.currency(),
            ))
        }
        Command::Activity(args) => {
            let scope = resolve_scope(engine, &args.scope)?;
            let viewer = args.viewer.map(MemberId::from);
            let items: Vec<_> = engine
                .activity(viewer.as_ref(), scope, args.limit)?
                .into_iter()
                .map(views::activity)
                .collect();
            print_json(&items)
        }
        Command::Audit(args) => {
            let scope = resolve_scope(engine, &args.scope)?;
            let inspected = engine.audit(scope)?;
            print_json(&serde_json::json!({
                "ok": true,
                "entries": inspected,
                "version": engine.version()?,
            }))
        }
        Command::Export(args) => {
            let scope = resolve_scope(engine, &args.scope)?;
            let data = match args.kind {
                ExportKind::Entries => {
                    let snapshot = engine.snapshot()?;
                    export::entries_csv(&snapshot, scope)?
                }
                ExportKind::Plan => {
                    let plan = engine.simplify_debts(&[], scope)?;
                    export::plan_csv(&plan, engine.currency()?)?
                }
            };
            match args.out {
                Some(path) => {
                    fs::write(&path, data)?;
                    tracing::info!("export written to {}", path.display());
                    Ok(())
                }
                None => {
                    std::io::stdout().write_all(&data)?;
                    Ok(())
                }
            }
        }
        Command::Seed => {
            let appended = seed::seed(engine)?;
            print_json(&serde_json::json!({ "records": appended }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_created(engine: &Engine, id: EntryId) -> Result<(), AppError> {
    print_json(&EntryCreated {
        id: *id.as_uuid(),
        version: engine.version()?,
    })
}

/// Accepts a group id or a group name.
fn resolve_group(engine: &Engine, raw: &str) -> Result<GroupId, AppError> {
    match GroupId::from_str(raw) {
        Ok(id) => Ok(engine.group(id)?.id),
        Err(_) => Ok(engine.group_by_name(raw)?.id),
    }
}

fn resolve_scope(engine: &Engine, args: &ScopeArgs) -> Result<Scope, AppError> {
    match (&args.group, args.direct) {
        (Some(group), _) => Ok(Scope::Group(resolve_group(engine, group)?)),
        (None, true) => Ok(Scope::Direct),
        (None, false) => Ok(Scope::Global),
    }
}

fn entry_meta(engine: &Engine, args: EntryArgs) -> Result<(EntryMeta, Option<GroupId>), AppError> {
    let occurred_at = match args.at.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|err| AppError::Argument(format!("--at {raw}: {err}")))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let mut meta = EntryMeta::new(occurred_at);
    if let Some(description) = args.description {
        meta = meta.description(description);
    }
    if let Some(member) = args.created_by {
        meta = meta.created_by(member);
    }
    if let Some(version) = args.expected_version {
        meta = meta.expected_version(version);
    }
    let group = args
        .group
        .as_deref()
        .map(|raw| resolve_group(engine, raw))
        .transpose()?;
    Ok((meta, group))
}

fn expense_cmd(engine: &Engine, args: ExpenseArgs) -> Result<ExpenseCmd, AppError> {
    let currency = engine.currency()?;
    let amount = Money::parse(&args.amount, currency)?;
    let split = match args.split {
        SplitKind::Even => {
            if args.with.is_empty() {
                return Err(AppError::Argument(
                    "--with is required for an even split".to_string(),
                ));
            }
            SplitPolicy::even(args.with)
        }
        SplitKind::Exact => SplitPolicy::exact(
            parse_pairs(&args.shares)?
                .into_iter()
                .map(|(member, raw)| -> Result<Share, AppError> {
                    Ok(Share::new(member, Money::parse(raw, currency)?))
                })
                .collect::<Result<Vec<_>, AppError>>()?,
        ),
        SplitKind::Percent => SplitPolicy::percentage(
            parse_pairs(&args.shares)?
                .into_iter()
                .map(|(member, raw)| -> Result<PercentShare, AppError> {
                    Ok(PercentShare::new(member, parse_basis_points(raw)?))
                })
                .collect::<Result<Vec<_>, AppError>>()?,
        ),
    };

    let (meta, group) = entry_meta(engine, args.entry)?;
    let mut cmd = ExpenseCmd::new(args.payer, amount, split, meta.occurred_at).meta(meta);
    if let Some(group) = group {
        cmd = cmd.group(group);
    }
    Ok(cmd)
}

fn payment_cmd(engine: &Engine, args: PaymentArgs) -> Result<PaymentCmd, AppError> {
    let amount = Money::parse(&args.amount, engine.currency()?)?;
    let (meta, group) = entry_meta(engine, args.entry)?;
    let mut cmd = PaymentCmd::new(args.from, args.to, amount, meta.occurred_at).meta(meta);
    if let Some(group) = group {
        cmd = cmd.group(group);
    }
    Ok(cmd)
}

/// Splits `member=value` arguments.
fn parse_pairs(raw: &[String]) -> Result<Vec<(&str, &str)>, AppError> {
    if raw.is_empty() {
        return Err(AppError::Argument(
            "at least one --share member=value is required".to_string(),
        ));
    }
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(member, value)| (member.trim(), value.trim()))
                .filter(|(member, value)| !member.is_empty() && !value.is_empty())
                .ok_or_else(|| AppError::Argument(format!("expected member=value, got {pair}")))
        })
        .collect()
}

/// `"33.34"` (percent, at most two decimals) -> `3334` basis points.
fn parse_basis_points(raw: &str) -> Result<u32, AppError> {
    let invalid = || AppError::Argument(format!("invalid percentage: {raw}"));
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty()
        || fraction.len() > 2
        || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    let whole: u32 = whole.parse().map_err(|_| invalid())?;
    let fraction: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<2}").parse().map_err(|_| invalid())?
    };
    let bp = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(invalid)?;
    if bp > FULL_BASIS_POINTS {
        return Err(invalid());
    }
    Ok(bp)
}
