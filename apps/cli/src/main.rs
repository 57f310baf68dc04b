//! FlowCraft CLI
//!
//! Command-line interface for configuring and launching reward streams
//! through a distribution pool.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use flowcraft_app::{App, AppBuilder};
use flowcraft_client::{DistributionController, Phase, SessionSnapshot};
use flowcraft_core::{parse_recipients, rate, PoolInspection};
use flowcraft_keystore::load_or_generate_signer;

/// FlowCraft - stream rewards to pool members
#[derive(Parser)]
#[command(name = "flowcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: ~/.flowcraft/settings.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the in-memory mock chain
    #[arg(long, global = true)]
    mock: bool,

    /// Operator key file for live mode
    #[arg(long, global = true)]
    keyfile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert tokens per day to a per-second flow rate
    Rate {
        /// Tokens per day, decimal
        tokens_per_day: String,
    },

    /// Parse and summarize a recipients file (address,units per line)
    Parse {
        file: PathBuf,
    },

    /// Check whether an address is a distribution pool
    Inspect {
        pool: String,
    },

    /// Show the wallet network, optionally switching to the configured one
    Network {
        #[arg(long)]
        switch: bool,
    },

    /// Derive macro params for a distribution without submitting
    Preview {
        #[command(flatten)]
        distribution: DistributionArgs,
    },

    /// Run a distribution: update member units and start the stream
    Distribute {
        #[command(flatten)]
        distribution: DistributionArgs,
    },

    /// Create the operator key if missing and print its address
    Keygen,

    /// Print the effective settings, optionally writing them out
    Config {
        #[arg(long)]
        init: bool,
    },
}

#[derive(clap::Args)]
struct DistributionArgs {
    /// Pool address
    #[arg(short, long)]
    pool: String,

    /// Recipients file (address,units per line)
    #[arg(short, long)]
    recipients: PathBuf,

    /// Tokens per day
    #[arg(long)]
    rate: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = AppBuilder::new()
        .name("flowcraft")
        .version(env!("CARGO_PKG_VERSION"))
        .verbose(cli.verbose)
        .skip_banner();
    if let Some(path) = cli.config {
        builder = builder.config_path(path);
    }
    if cli.mock {
        builder = builder.mock(true);
    }
    if let Some(keyfile) = cli.keyfile {
        builder = builder.keyfile(keyfile);
    }
    let app = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

    match cli.command {
        Commands::Rate { tokens_per_day } => {
            show_rate(&app, &tokens_per_day)?;
        }
        Commands::Parse { file } => {
            show_recipients(&file)?;
        }
        Commands::Inspect { pool } => {
            inspect(&app, &pool).await?;
        }
        Commands::Network { switch } => {
            network(&app, switch).await?;
        }
        Commands::Preview { distribution } => {
            preview(&app, &distribution).await?;
        }
        Commands::Distribute { distribution } => {
            distribute(&app, &distribution).await?;
        }
        Commands::Keygen => {
            keygen(&app)?;
        }
        Commands::Config { init } => {
            config(&app, init)?;
        }
    }

    Ok(())
}

// ============================================================================
// Local Commands
// ============================================================================

fn show_rate(app: &App, tokens_per_day: &str) -> Result<()> {
    let decimals = app.settings().execution.token_decimals;
    let flow_rate = rate::tokens_per_day_to_flow_rate(tokens_per_day, decimals)?;

    println!("Flow rate: {} wei/s", flow_rate);
    println!("Actual:    {} tokens/day", flow_rate.tokens_per_day(decimals));
    Ok(())
}

fn read_recipients(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn show_recipients(file: &Path) -> Result<()> {
    let recipients = parse_recipients(&read_recipients(file)?)?;

    for recipient in &recipients {
        println!("{:>4}  {}  {}", recipient.line, recipient.address, recipient.units);
    }
    for recipient in &recipients {
        if let Err(e) = recipient.resolve_address() {
            println!("warning: {}", e);
        }
    }
    match recipients.total_units() {
        Some(total) => println!("{} recipients, {} units", recipients.len(), total),
        None => println!("{} recipients, total units exceed 128 bits", recipients.len()),
    }
    Ok(())
}

fn keygen(app: &App) -> Result<()> {
    let signer = load_or_generate_signer(app.key_path())?;
    println!("Operator key: {}", app.key_path().display());
    println!("Address:      {}", signer.address());
    Ok(())
}

fn config(app: &App, init: bool) -> Result<()> {
    let settings = app.settings();
    println!("{}", serde_json::to_string_pretty(settings.as_ref())?);
    if init {
        settings.save()?;
    }
    Ok(())
}

// ============================================================================
// Session Commands
// ============================================================================

fn print_session(snapshot: &SessionSnapshot) {
    println!("State:   {}", snapshot.phase.name());
    if let Some(account) = snapshot.account {
        println!("Account: {}", account);
    }
    match snapshot.chain_id {
        Some(id) => println!("Chain:   {} (expected {})", id, snapshot.expected_chain_id),
        None => println!("Chain:   unknown (expected {})", snapshot.expected_chain_id),
    }
}

fn print_inspection(app: &App, inspection: &PoolInspection) {
    if !inspection.is_valid() {
        println!("{} is not a distribution pool", inspection.pool_text);
        return;
    }
    println!("Pool:    {}", inspection.pool_text);
    if let Some(token) = inspection.token {
        println!("Token:   {}", token);
    }
    match inspection.balance {
        Some(balance) => println!(
            "Balance: {}",
            rate::format_units(balance, app.settings().execution.token_decimals)
        ),
        None => println!("Balance: unknown"),
    }
}

/// Connect and fail unless the wallet is on the configured network.
async fn connected(app: &App) -> Result<DistributionController> {
    let controller = app.controller()?;
    let snapshot = controller.connect().await?;
    if snapshot.phase == Phase::WrongNetwork {
        print_session(&snapshot);
        bail!(
            "wallet is not on {}; run `flowcraft network --switch`",
            controller.network().name
        );
    }
    Ok(controller)
}

async fn select_pool(app: &App, controller: &DistributionController, pool: &str) -> Result<()> {
    let inspection = controller
        .set_pool_address(pool)
        .await?
        .context("pool inspection was superseded")?;
    print_inspection(app, &inspection);
    if !inspection.is_valid() {
        bail!("{} is not a distribution pool", pool);
    }
    Ok(())
}

async fn inspect(app: &App, pool: &str) -> Result<()> {
    let controller = connected(app).await?;
    let inspection = controller
        .set_pool_address(pool)
        .await?
        .context("pool inspection was superseded")?;
    print_inspection(app, &inspection);
    Ok(())
}

async fn network(app: &App, switch: bool) -> Result<()> {
    let controller = app.controller()?;
    let mut snapshot = controller.connect().await?;

    if switch && snapshot.phase == Phase::WrongNetwork {
        info!("Switching to {}...", controller.network().name);
        snapshot = controller.switch_network().await?;
    }

    print_session(&snapshot);
    Ok(())
}

async fn preview(app: &App, args: &DistributionArgs) -> Result<()> {
    let controller = connected(app).await?;
    select_pool(app, &controller, &args.pool).await?;

    let text = read_recipients(&args.recipients)?;
    let plan = controller.preview(&text, &args.rate).await?;

    println!("Recipients: {}", plan.recipients.len());
    println!("Flow rate:  {} wei/s", plan.flow_rate);
    println!("Params:     {}", plan.params);
    Ok(())
}

async fn distribute(app: &App, args: &DistributionArgs) -> Result<()> {
    let controller = connected(app).await?;
    select_pool(app, &controller, &args.pool).await?;

    let text = read_recipients(&args.recipients)?;
    info!("Submitting distribution...");
    let receipt = controller.execute(&text, &args.rate).await?;

    println!("Distribution confirmed");
    println!("Transaction: {}", receipt.tx_hash);
    if let Some(block) = receipt.block_number {
        println!("Block:       {}", block);
    }
    if let Some(url) = controller.last_tx_url() {
        println!("Explorer:    {}", url);
    }
    Ok(())
}
