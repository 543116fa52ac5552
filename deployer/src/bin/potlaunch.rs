// potlaunch: deploy bonding-curve token launches and inspect their accounts.
//
// Settings come from the environment (see DeployerConfig); RUST_LOG controls
// log verbosity.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use potlaunch_deployer::cache::AccountCache;
use potlaunch_deployer::config::DeployerConfig;
use potlaunch_deployer::launch::TokenLaunchConfig;
use potlaunch_deployer::ledger::RpcLedger;
use potlaunch_deployer::orchestrator::unix_now;
use potlaunch_deployer::plan::{transaction_size, DeploymentPlan};
use potlaunch_deployer::reader::AccountReader;
use potlaunch_deployer::validate::validate;
use potlaunch_deployer::wallet::KeypairWallet;
use potlaunch_deployer::{DeploymentSession, Milestone};
use potlaunch_sdk::constants::MINT_ACCOUNT_LEN;
use potlaunch_sdk::pda::LaunchAddresses;
use solana_sdk::{
    pubkey::Pubkey,
    rent::Rent,
    signature::{read_keypair_file, Keypair, Signer},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "potlaunch")]
#[command(about = "POTLAUNCH token deployer", long_about = None)]
#[command(version)]
struct Cli {
    /// Overrides RPC_URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a launch config and deploy it
    Deploy {
        /// Launch configuration JSON
        #[arg(long)]
        config: PathBuf,

        /// Validate and plan only; nothing is sent
        #[arg(long)]
        dry_run: bool,

        /// Write the backend token document here on success
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Decode the curve accounts of a deployed token
    Inspect {
        #[arg(long)]
        mint: String,

        /// Also decode this wallet's allocation
        #[arg(long)]
        wallet: Option<String>,
    },

    /// Price a buy or sell against the live curve
    Quote {
        #[arg(long)]
        mint: String,

        /// Base units
        #[arg(long)]
        amount: u64,

        #[arg(long)]
        sell: bool,
    },

    /// Print every address derived for a mint and creator
    Addresses {
        #[arg(long)]
        mint: String,

        #[arg(long)]
        creator: String,
    },
}

fn parse_pubkey(label: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid {label} address: {value}"))
}

fn load_keypair(config: &DeployerConfig) -> Result<Keypair> {
    read_keypair_file(&config.keypair_path)
        .map_err(|e| anyhow!("Failed to read keypair from {}: {}", config.keypair_path.display(), e))
}

fn reader(config: &DeployerConfig) -> AccountReader<RpcLedger> {
    AccountReader::new(
        RpcLedger::new(config.rpc_url.clone(), config.commitment),
        AccountCache::new(config.cache_capacity, config.cache_ttl),
        config.program_id,
    )
}

async fn deploy(
    config: &DeployerConfig,
    path: &PathBuf,
    dry_run: bool,
    document: Option<&PathBuf>,
) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read launch config {}", path.display()))?;
    let launch_config = TokenLaunchConfig::from_json(&json)
        .with_context(|| format!("Failed to parse launch config {}", path.display()))?;
    let keypair = load_keypair(config)?;

    if dry_run {
        let launch = validate(&launch_config, unix_now())?;
        let payer = keypair.pubkey();
        let mint = Keypair::new().pubkey();
        let rent = Rent::default().minimum_balance(MINT_ACCOUNT_LEN);
        let settings = config.orchestrator_settings();
        let plan = DeploymentPlan::build(&launch, &settings.program_id, &payer, &mint, rent, settings.limits)?;
        println!("Launch \"{}\" ({}) is valid", launch.name, launch.symbol);
        println!("Initial reserve: {} lamports", launch.curve.initial_reserve);
        for (i, tx) in plan.transactions.iter().enumerate() {
            let size = transaction_size(&tx.instructions, &payer)?;
            println!(
                "  transaction {}: {} instructions, {} bytes: {}",
                i + 1,
                tx.instructions.len(),
                size,
                tx.groups
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        return Ok(());
    }

    let ledger = RpcLedger::new(config.rpc_url.clone(), config.commitment);
    info!(rpc = %ledger.url(), payer = %keypair.pubkey(), "Deploying");
    let session = DeploymentSession::new(ledger, KeypairWallet::new(keypair), config.orchestrator_settings());

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            match cancel.cancel() {
                Ok(()) => warn!("Cancellation accepted; stopping before the next submission"),
                Err(e) => warn!(error = %e, "Cancellation refused"),
            }
        }
    });

    let report = session
        .deploy(&launch_config, |milestone| match milestone {
            Milestone::Validated { transactions } => {
                println!("Validated; {transactions} transactions to send")
            }
            Milestone::Simulated { transaction } => {
                println!("  [{}] simulation passed", transaction + 1)
            }
            Milestone::Submitted {
                transaction,
                signature,
            } => println!("  [{}] submitted {signature}", transaction + 1),
            Milestone::Confirmed { transaction, .. } => {
                println!("  [{}] confirmed", transaction + 1)
            }
        })
        .await
        .context("Deployment failed")?;

    println!("Mint:                {}", report.mint());
    println!("Curve configuration: {}", report.addresses.curve_configuration);
    println!("Bonding curve:       {}", report.addresses.bonding_curve);
    for allocation in &report.allocations {
        println!("Allocation {}: {}", allocation.wallet, allocation.allocation);
    }

    if let Some(out) = document {
        let body = report
            .token_document(&launch_config)
            .to_json()
            .context("Failed to encode token document")?;
        std::fs::write(out, body).with_context(|| format!("Failed to write {}", out.display()))?;
        println!("Token document written to {}", out.display());
    }
    Ok(())
}

async fn inspect(config: &DeployerConfig, mint: &str, wallet: Option<&str>) -> Result<()> {
    let mint = parse_pubkey("mint", mint)?;
    let reader = reader(config);

    let curve_config = reader
        .curve_configuration(&mint)
        .await
        .context("Failed to read curve configuration")?;
    println!("Curve configuration");
    println!("  admin:             {}", curve_config.admin);
    println!("  shape:             {:?}", curve_config.curve_shape);
    println!("  initial price:     {}", curve_config.initial_price);
    println!("  initial supply:    {}", curve_config.initial_supply);
    println!("  max supply:        {}", curve_config.max_token_supply);
    println!("  reserve ratio:     {} bps", curve_config.reserve_ratio);
    println!("  fee:               {} bps", curve_config.fee_percentage);
    println!("  fees collected:    {}", curve_config.total_fees_collected);
    for r in &curve_config.fee_recipients {
        println!("  recipient:         {} ({} bps)", r.address, r.share);
    }

    let curve = reader
        .bonding_curve(&mint)
        .await
        .context("Failed to read bonding curve")?;
    println!("Bonding curve");
    println!("  creator:           {}", curve.creator);
    println!("  total supply:      {}", curve.total_supply);
    println!("  reserve balance:   {}", curve.reserve_balance);
    println!("  reserve token:     {}", curve.reserve_token);

    if let Some(wallet) = wallet {
        let wallet = parse_pubkey("wallet", wallet)?;
        let allocation = reader
            .allocation(&wallet, &mint)
            .await
            .context("Failed to read allocation")?;
        println!("Allocation");
        println!("  percentage:        {}%", allocation.percentage);
        println!("  total tokens:      {}", allocation.total_tokens);
        println!("  claimed:           {}", allocation.claimed_tokens);
        println!("  progress:          {:.2}%", allocation.claim_progress_percent());
        if let Some(v) = allocation.vesting {
            println!(
                "  vesting:           start {} cliff {} duration {} interval {}",
                v.start_time, v.cliff_period, v.duration, v.interval
            );
        }
    }
    Ok(())
}

async fn quote(config: &DeployerConfig, mint: &str, amount: u64, sell: bool) -> Result<()> {
    let mint = parse_pubkey("mint", mint)?;
    let reader = reader(config);
    let quote = if sell {
        reader.quote_sell(&mint, amount).await
    } else {
        reader.quote_buy(&mint, amount).await
    }
    .context("Failed to quote")?;

    let side = if sell { "Sell" } else { "Buy" };
    println!(
        "{side} {} at supply {} ({:?} curve): {} lamports",
        quote.amount, quote.supply, quote.shape, quote.lamports
    );
    println!("Spot price: {}", quote.spot_price);
    Ok(())
}

fn addresses(config: &DeployerConfig, mint: &str, creator: &str) -> Result<()> {
    let mint = parse_pubkey("mint", mint)?;
    let creator = parse_pubkey("creator", creator)?;
    let a = LaunchAddresses::derive(&config.program_id, &mint, &creator)?;
    println!("program:               {}", a.program_id);
    println!("curve configuration:   {}", a.curve_configuration);
    println!("bonding curve:         {} (bump {})", a.bonding_curve, a.bonding_curve_bump);
    println!("sol vault:             {} (bump {})", a.sol_vault, a.sol_vault_bump);
    println!("pool token account:    {}", a.pool_token_account);
    println!("creator token account: {}", a.creator_token_account);
    println!("fee pool:              {}", a.fee_pool);
    println!("fee pool vault:        {}", a.fee_pool_vault);
    println!("metadata:              {}", a.metadata);
    println!("launchpad:             {}", a.launchpad);
    println!("fair launch data:      {}", a.fair_launch_data);
    println!("fair launch vault:     {}", a.fair_launch_vault);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = DeployerConfig::from_env().context("Configuration error")?;
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }

    match cli.command {
        Commands::Deploy {
            config: path,
            dry_run,
            document,
        } => deploy(&config, &path, dry_run, document.as_ref()).await,
        Commands::Inspect { mint, wallet } => inspect(&config, &mint, wallet.as_deref()).await,
        Commands::Quote { mint, amount, sell } => quote(&config, &mint, amount, sell).await,
        Commands::Addresses { mint, creator } => addresses(&config, &mint, &creator),
    }
}
