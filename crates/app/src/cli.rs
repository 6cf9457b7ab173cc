use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "splitledger")]
#[command(about = "Shared expense ledger: record expenses, inspect balances, settle up")]
pub struct Cli {
    /// Settings file (without extension), also read from `SPLITLEDGER_CONFIG`.
    #[arg(long, env = "SPLITLEDGER_CONFIG", default_value = "settings", global = true)]
    pub config: String,

    /// Ledger file; overrides `ledger.path` from the settings.
    #[arg(long, env = "SPLITLEDGER_LEDGER", global = true)]
    pub ledger: Option<PathBuf>,

    /// Expected ledger currency (INR, EUR, USD). Checked against an existing
    /// ledger, used for a new one.
    #[arg(long, global = true)]
    pub currency: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Member(Member),
    Group(Group),
    /// Record an expense.
    Expense(ExpenseArgs),
    /// Record a payment from one member to another.
    Payment(PaymentArgs),
    /// Cancel an expense or payment.
    Void(VoidArgs),
    /// Balance between two members.
    Balance(BalanceArgs),
    /// Balance of a member against every counterparty.
    Net(NetArgs),
    /// Dashboard totals for a member.
    Summary(SummaryArgs),
    /// Transfers that settle every open balance.
    Settle(SettleArgs),
    /// Most recent entries.
    Activity(ActivityArgs),
    /// Recompute and cross-check every derived balance.
    Audit(AuditArgs),
    /// Export entries or a settlement plan as CSV.
    Export(ExportArgs),
    /// Load the demo dataset into an empty ledger.
    Seed,
}

#[derive(Args, Debug)]
pub struct Member {
    #[command(subcommand)]
    pub command: MemberCommand,
}

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    Add(MemberAddArgs),
    Remove(MemberRemoveArgs),
    List,
}

#[derive(Args, Debug)]
pub struct MemberAddArgs {
    pub id: String,
    /// Display name; defaults to the id.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct MemberRemoveArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct Group {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    New(GroupNewArgs),
    AddMember(GroupMemberArgs),
    RemoveMember(GroupMemberArgs),
    /// Groups with spend totals, most recently active first.
    List(GroupListArgs),
}

#[derive(Args, Debug)]
pub struct GroupNewArgs {
    pub name: String,
    #[arg(long, value_delimiter = ',')]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GroupMemberArgs {
    /// Group name or id.
    pub group: String,
    pub member: String,
}

#[derive(Args, Debug)]
pub struct GroupListArgs {
    /// Include this member's balance in each group.
    #[arg(long)]
    pub viewer: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SplitKind {
    Even,
    Exact,
    Percent,
}

#[derive(Args, Debug, Default)]
pub struct EntryArgs {
    /// Group name or id; omit for a direct entry.
    #[arg(long)]
    pub group: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    pub at: Option<String>,
    /// Member issuing the command; defaults to the payer.
    #[arg(long)]
    pub created_by: Option<String>,
    /// Only append if the ledger is still at this version.
    #[arg(long)]
    pub expected_version: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ExpenseArgs {
    #[arg(long)]
    pub payer: String,
    /// Decimal amount in the ledger currency, e.g. `90` or `35.20`.
    #[arg(long)]
    pub amount: String,
    #[arg(long, value_enum, default_value_t = SplitKind::Even)]
    pub split: SplitKind,
    /// Participants of an even split.
    #[arg(long, value_delimiter = ',')]
    pub with: Vec<String>,
    /// `member=value` pairs for exact (amount) or percent splits.
    #[arg(long = "share")]
    pub shares: Vec<String>,
    #[command(flatten)]
    pub entry: EntryArgs,
}

#[derive(Args, Debug)]
pub struct PaymentArgs {
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub to: String,
    #[arg(long)]
    pub amount: String,
    #[command(flatten)]
    pub entry: EntryArgs,
}

#[derive(Args, Debug)]
pub struct VoidArgs {
    pub entry: String,
    #[arg(long)]
    pub by: String,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub expected_version: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct ScopeArgs {
    /// Restrict to one group (name or id).
    #[arg(long, conflicts_with = "direct")]
    pub group: Option<String>,
    /// Restrict to entries recorded outside any group.
    #[arg(long)]
    pub direct: bool,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    pub member: String,
    pub other: String,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Args, Debug)]
pub struct NetArgs {
    pub member: String,
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    pub member: String,
}

#[derive(Args, Debug)]
pub struct SettleArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
    /// One transfer per pair instead of the simplified plan.
    #[arg(long)]
    pub pairwise: bool,
    /// Settle only among these members.
    #[arg(long, value_delimiter = ',', conflicts_with = "pairwise")]
    pub members: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Only entries involving this member.
    #[arg(long)]
    pub viewer: Option<String>,
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Entries,
    Plan,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(value_enum)]
    pub kind: ExportKind,
    #[command(flatten)]
    pub scope: ScopeArgs,
    /// Output file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}
