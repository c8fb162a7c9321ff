// tierfund - command line driver for the crowdfunding escrow ledger

use clap::{Parser, Subcommand};
use std::sync::Arc;
use thiserror::Error;
use tierfund::clock::{Clock, ManualClock, SystemClock};
use tierfund::command::{Command, CommandBuilder, CommandCodec, CommandError, CodecError, SignedCommand};
use tierfund::config::{ConfigError, LedgerConfig};
use tierfund::identity::Keypair;
use tierfund::registry::{CampaignId, Outcome, Registry};
use tierfund::LedgerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tierfund", version, about = "Tiered crowdfunding escrow ledger")]
struct Cli {
    /// Clock seconds per duration unit (overrides TIERFUND_DURATION_UNIT_SECS)
    #[arg(long, global = true)]
    unit_secs: Option<u64>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Create the sample campaign with Bronze, Silver and Gold tiers
    Demo,
    /// Run a funding scenario on a manual clock
    Simulate {
        /// Campaign goal
        #[arg(long)]
        goal: u64,
        /// Campaign duration in duration units
        #[arg(long, default_value_t = 1)]
        duration: u64,
        /// Amounts to fund, one backer each (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        fund: Vec<u64>,
        /// Duration units to advance the clock before settling
        #[arg(long)]
        advance: Option<u64>,
        /// Print each signed command in base64 wire form
        #[arg(long)]
        show_wire: bool,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duration of {0} units overflows the clock")]
    DurationOverflow(u64),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut config = LedgerConfig::from_env()?;
    if let Some(secs) = cli.unit_secs.filter(|s| *s > 0) {
        config = config.with_duration_unit_secs(secs);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Mode::Demo => run_demo(&config),
        Mode::Simulate {
            goal,
            duration,
            fund,
            advance,
            show_wire,
        } => run_simulation(&config, goal, duration, &fund, advance, show_wire),
    }
}

fn units_to_secs(config: &LedgerConfig, units: u64) -> Result<u64, CliError> {
    config
        .duration_secs(units)
        .ok_or(CliError::DurationOverflow(units))
}

fn run_demo(config: &LedgerConfig) -> Result<(), CliError> {
    let registry = Registry::new(Arc::new(SystemClock::new()));
    let owner = Keypair::generate();
    let owner_id = owner.account_id();

    let campaign = registry.create_campaign(
        &owner_id,
        "Test Campaign",
        "A test campaign description",
        1_000,
        units_to_secs(config, 30)?,
    )?;
    info!(campaign = %campaign, "sample campaign created");

    for (name, amount) in [("Bronze", 100), ("Silver", 300), ("Gold", 500)] {
        registry.add_tier(&campaign, &owner_id, name, amount)?;
    }

    println!("{}", serde_json::to_string_pretty(&registry.campaign_summaries())?);
    println!("{}", serde_json::to_string_pretty(&registry.get_campaign(&campaign)?)?);
    Ok(())
}

fn run_simulation(
    config: &LedgerConfig,
    goal: u64,
    duration: u64,
    amounts: &[u64],
    advance: Option<u64>,
    show_wire: bool,
) -> Result<(), CliError> {
    let clock = Arc::new(ManualClock::new(0));
    let registry = Registry::new(clock.clone());
    let owner = Keypair::generate();

    let submit = |signer: &Keypair, command: Command| -> Result<Result<Outcome, CommandError>, CliError> {
        let signed: SignedCommand = CommandBuilder::new()
            .signer(signer)
            .command(command)
            .timestamp(clock.now())
            .build()?;
        if show_wire {
            println!("  wire {}", CommandCodec::encode_base64(&signed)?);
        }
        Ok(registry.execute(&signed, config))
    };

    let created = submit(
        &owner,
        Command::CreateCampaign {
            name: "Simulated Campaign".to_string(),
            description: "Scenario run from the command line".to_string(),
            goal,
            duration: units_to_secs(config, duration)?,
        },
    )??;
    let Outcome::Created(campaign) = created else {
        return Ok(());
    };
    println!("created campaign {campaign} (goal {goal})");

    let mut tiers: Vec<u64> = amounts.to_vec();
    tiers.sort_unstable();
    tiers.dedup();
    for amount in &tiers {
        let result = submit(
            &owner,
            Command::AddTier {
                campaign: campaign.clone(),
                name: format!("Tier {amount}"),
                target_amount: *amount,
            },
        )?;
        report(&format!("add tier {amount}"), result);
    }

    let listed = registry.get_tiers(&campaign)?;
    let mut backers = Vec::new();
    for amount in amounts {
        let backer = Keypair::generate();
        let tier_index = listed
            .iter()
            .find(|t| t.target_amount == *amount)
            .map(|t| t.index as u32)
            .unwrap_or(u32::MAX);
        let result = submit(
            &backer,
            Command::Fund {
                campaign: campaign.clone(),
                tier_index,
                amount: *amount,
            },
        )?;
        report(&format!("fund {amount}"), result);
        backers.push(backer);
    }

    if let Some(units) = advance {
        let now = clock.advance(units_to_secs(config, units)?);
        println!("clock advanced to {now}");
    }
    println!("status {}", registry.get_campaign_status(&campaign)?);

    let result = submit(&owner, Command::Withdraw { campaign: campaign.clone() })?;
    report("withdraw", result);
    for backer in &backers {
        let result = submit(backer, Command::Refund { campaign: campaign.clone() })?;
        report(&format!("refund {}", backer.account_id().short()), result);
    }

    print_final(&registry, &campaign)
}

fn report(label: &str, result: Result<Outcome, CommandError>) {
    match result {
        Ok(Outcome::Funded(receipt)) => println!(
            "{label}: ok (balance {}, {})",
            receipt.balance_after, receipt.status_after
        ),
        Ok(Outcome::Withdrawn(payout)) | Ok(Outcome::Refunded(payout)) => {
            println!("{label}: ok, paid {} to {}", payout.amount, payout.recipient.short())
        }
        Ok(Outcome::TierAdded(index)) => println!("{label}: ok at index {index}"),
        Ok(other) => println!("{label}: ok {other:?}"),
        Err(e) => println!("{label}: rejected ({e})"),
    }
}

fn print_final(registry: &Registry, campaign: &CampaignId) -> Result<(), CliError> {
    let (balance, open) = registry.accounting(campaign)?;
    println!("accounting balance={balance} open_contributions={open}");
    println!("{}", serde_json::to_string_pretty(&registry.get_campaign(campaign)?)?);
    Ok(())
}
