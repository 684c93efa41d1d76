//! drip-cli — Operator tooling for Drip deployments.
//!
//! Inspects emission schedules, validates deployment configuration and
//! signs or verifies the authorized operations consumed by the stake
//! ledger and the withdrawal gate.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use drip_auth::Authorizer;
use drip_core::constants::{DECIMALS, TEAM_SHARE_PERCENT};
use drip_core::crypto::{PersonalSign, SignerKey};
use drip_core::params::{DeployParams, ValidatedParams};
use drip_core::traits::{EmissionCurve, SignatureRecovery};
use drip_core::types::{Address, AuthorizedOperation, MessageLayout, Timestamp};
use drip_emission::{EmissionSchedule, LinearEmission, TeamAllocation};
use primitive_types::U256;
use tracing::{debug, info};

/// Drip operator command-line interface.
#[derive(Parser)]
#[command(name = "drip-cli")]
#[command(version, about = "Decaying emission and signed pool authorizations.")]
struct Cli {
    /// Log output format ("text" or "json").
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the per-period emission table.
    Schedule(ScheduleArgs),
    /// Tokens emitted between two timestamps, with the team split.
    Emitted(EmittedArgs),
    /// Load and validate deployment parameters.
    CheckConfig(ConfigArgs),
    /// Sign an authorized operation.
    Sign(SignArgs),
    /// Recover the signer of an authorized operation.
    Verify(VerifyArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Deployment parameter file (TOML, YAML or JSON). `DRIP__*`
    /// environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ScheduleArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Activation time (unix seconds). Defaults to now.
    #[arg(short, long)]
    activation: Option<Timestamp>,

    /// Number of periods to print.
    #[arg(short, long, default_value = "12")]
    periods: u64,
}

#[derive(Args)]
struct EmittedArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Activation time (unix seconds).
    #[arg(short, long)]
    activation: Timestamp,

    /// Start of the span (unix seconds).
    #[arg(long)]
    from: Timestamp,

    /// End of the span (unix seconds).
    #[arg(long)]
    to: Timestamp,

    /// Use the constant-rate curve instead of the decaying one.
    #[arg(long)]
    linear: bool,
}

/// Which module an operation is signed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Stake ledger: the message covers both time bounds.
    Stake,
    /// Withdrawal gate: the message covers only the expiry.
    Withdraw,
}

impl From<Target> for MessageLayout {
    fn from(target: Target) -> Self {
        match target {
            Target::Stake => MessageLayout::Windowed,
            Target::Withdraw => MessageLayout::ExpiryOnly,
        }
    }
}

#[derive(Args)]
struct SignArgs {
    /// Hex-encoded secp256k1 signing key.
    #[arg(short, long)]
    key: String,

    #[arg(short, long, value_enum)]
    target: Target,

    #[arg(long, default_value = "0")]
    user_id: String,

    #[arg(short, long)]
    beneficiary: Address,

    /// Tickets for stake operations, base units for withdrawals.
    #[arg(short, long)]
    quantity: String,

    #[arg(short, long)]
    nonce: String,

    #[arg(long, default_value = "0")]
    min_timestamp: Timestamp,

    #[arg(long)]
    max_timestamp: Timestamp,
}

#[derive(Args)]
struct VerifyArgs {
    /// JSON file holding the operation.
    #[arg(short, long)]
    operation: PathBuf,

    #[arg(short, long, value_enum)]
    target: Target,

    /// Also check the operation against this trusted signer.
    #[arg(long)]
    trusted: Option<Address>,

    /// Time to evaluate the validity window at. Defaults to now.
    #[arg(long)]
    now: Option<Timestamp>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_format);

    match cli.command {
        Commands::Schedule(args) => schedule(args),
        Commands::Emitted(args) => emitted(args),
        Commands::CheckConfig(args) => check_config(args),
        Commands::Sign(args) => sign(args),
        Commands::Verify(args) => verify(args),
    }
}

/// Initialize tracing; `json` selects structured output.
fn init_logging(format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn load_params(args: &ConfigArgs) -> Result<ValidatedParams> {
    let raw = DeployParams::load(args.config.as_deref()).context("Failed to load deployment parameters")?;
    let params = raw.validate().context("Invalid deployment parameters")?;
    debug!(config = ?args.config, "parameters loaded");
    Ok(params)
}

fn now() -> Timestamp {
    Utc::now().timestamp().max(0) as Timestamp
}

/// Print the emission table starting at the first paid period.
fn schedule(args: ScheduleArgs) -> Result<()> {
    let params = load_params(&args.config)?;
    let activation = args.activation.unwrap_or_else(now);
    let curve = EmissionSchedule::new(
        params.period_seconds,
        params.tokens_per_period,
        params.decay_percent,
        activation,
    )?;

    println!("{:>6}  {:<20}  {:>32}  {:>32}", "period", "starts", "tokens", "cumulative");
    let mut cumulative = U256::zero();
    for index in 1..=args.periods {
        let Some(start) = curve.period_start(index) else {
            break;
        };
        let tokens = curve.period_tokens(index)?;
        cumulative = cumulative.checked_add(tokens).context("Cumulative emission overflows")?;
        println!(
            "{:>6}  {:<20}  {:>32}  {:>32}",
            index,
            format_time(start),
            format_tokens(tokens),
            format_tokens(cumulative)
        );
        if tokens.is_zero() {
            break;
        }
    }
    Ok(())
}

/// Print the amount one mint over `[from, to)` would create.
fn emitted(args: EmittedArgs) -> Result<()> {
    if args.to < args.from {
        bail!("--to ({}) is earlier than --from ({})", args.to, args.from);
    }
    let params = load_params(&args.config)?;
    let minted = if args.linear {
        LinearEmission::new(params.tokens_per_second).emitted_between(args.from, args.to)?
    } else {
        EmissionSchedule::new(
            params.period_seconds,
            params.tokens_per_period,
            params.decay_percent,
            args.activation,
        )?
        .emitted_between(args.from, args.to)?
    };

    let split = TeamAllocation::from_pairs(&params.team)?.split(minted)?;
    println!("Minted:       {}", format_tokens(minted));
    println!("Team ({}%):   {}", TEAM_SHARE_PERCENT, format_tokens(split.team_share));
    for (member, share) in &split.payouts {
        println!("  {member}  {}", format_tokens(*share));
    }
    println!("Pool:         {}", format_tokens(split.pool_share));
    Ok(())
}

fn check_config(args: ConfigArgs) -> Result<()> {
    let params = load_params(&args)?;
    let team = TeamAllocation::from_pairs(&params.team)?;
    EmissionSchedule::new(params.period_seconds, params.tokens_per_period, params.decay_percent, params.period_seconds)?;

    println!("Initial beneficiary: {}", params.initial_beneficiary);
    println!("Initial supply:      {}", format_tokens(params.initial_supply));
    println!("Admin:               {}", params.admin);
    println!("Trusted signer:      {}", params.trusted_signer);
    println!("Tokens per ticket:   {}", format_tokens(params.tokens_per_ticket));
    println!(
        "Emission:            {} per {}s period, decaying {}%",
        format_tokens(params.tokens_per_period),
        params.period_seconds,
        params.decay_percent
    );
    println!("Linear rate:         {} per second", format_tokens(params.tokens_per_second));
    println!("Team:");
    for member in team.members() {
        println!("  {}  {}%", member.address, member.percent);
    }
    info!("configuration is valid");
    Ok(())
}

fn sign(args: SignArgs) -> Result<()> {
    let key = SignerKey::from_hex(&args.key).context("Failed to parse signing key")?;
    let op = AuthorizedOperation {
        user_id: parse_u256(&args.user_id, "user id")?,
        beneficiary: args.beneficiary,
        quantity: parse_u256(&args.quantity, "quantity")?,
        nonce: parse_u256(&args.nonce, "nonce")?,
        min_timestamp: args.min_timestamp,
        max_timestamp: args.max_timestamp,
        signature: Vec::new(),
    };
    let signed = key.sign_operation(op, args.target.into())?;
    info!(signer = %key.address(), target = ?args.target, "operation signed");
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.operation)
        .with_context(|| format!("Failed to read {}", args.operation.display()))?;
    let op: AuthorizedOperation = serde_json::from_str(&raw).context("Failed to parse operation JSON")?;
    let layout = MessageLayout::from(args.target);

    let signer = PersonalSign::new()
        .recover_signer(&op.encode(layout), &op.signature)
        .context("Signature does not recover to any address")?;
    println!("Signer: {signer}");

    if let Some(trusted) = args.trusted {
        let now = args.now.unwrap_or_else(now);
        match Authorizer::new(trusted, layout).check(&op, now) {
            Ok(()) => println!("Valid at {}", format_time(now)),
            Err(e) => bail!("Operation rejected: {e}"),
        }
    }
    Ok(())
}

fn parse_u256(s: &str, what: &str) -> Result<U256> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(s).ok(),
    };
    parsed.with_context(|| format!("Invalid {what}: {s}"))
}

/// Render base units as a decimal token amount, trailing zeros trimmed.
fn format_tokens(amount: U256) -> String {
    let unit = U256::exp10(DECIMALS as usize);
    let whole = amount / unit;
    let frac = amount % unit;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

fn format_time(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
