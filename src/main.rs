//! Trading agent CLI
//!
//! Command-line interface for chatting with the trading agent and
//! inspecting market data.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mantle_trade_agent::config::contracts as deployed;
use mantle_trade_agent::llm::CompletionClient;
use mantle_trade_agent::market::{MarketData, MarketDataGateway};
use mantle_trade_agent::summary::WalletSummary;
use mantle_trade_agent::trade::swap::SwapExecutor;
use mantle_trade_agent::trade::wrap::WrapUnwrapExecutor;
use mantle_trade_agent::trade::WalletReporter;
use mantle_trade_agent::{Config, LlmIntentParser, Result, SigningSession, TradeExecutor};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "trade-agent")]
#[command(about = "Conversational DeFi trading agent for FusionX V3 on Mantle Sepolia")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single message
    Chat {
        /// The instruction, e.g. "wrap 0.1 MNT" or "swap 1 WMNT for MUSDC"
        message: String,

        /// Fall back to a simulated trade when on-chain execution fails
        #[arg(long)]
        mock_fallback: bool,
    },

    /// Interactive chat loop
    Repl {
        #[arg(long)]
        mock_fallback: bool,
    },

    /// Query the subgraph directly
    Query {
        /// Query type (top_pools, recent_swaps, tokens, pool_metrics)
        #[arg(short = 't', long)]
        query_type: String,

        /// Result limit
        #[arg(short, long, default_value = "5")]
        limit: u32,

        /// Pool address (required for pool_metrics)
        #[arg(short, long)]
        pool: Option<String>,

        /// Day window for pool_metrics
        #[arg(short, long, default_value = "7")]
        days: u64,
    },

    /// Show the agent wallet balances
    Balance,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = match cli.config {
        Some(path) => Config::from_file(&path.to_string_lossy())?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Chat {
            message,
            mock_fallback,
        } => {
            let executor = build_executor(&config, mock_fallback)?;
            let result = executor.execute(&message).await;
            print_result(&result);
        }
        Commands::Repl { mock_fallback } => {
            let executor = build_executor(&config, mock_fallback)?;
            run_repl(&executor).await?;
        }
        Commands::Query {
            query_type,
            limit,
            pool,
            days,
        } => {
            run_query(&config, &query_type, limit, pool.as_deref(), days).await?;
        }
        Commands::Balance => {
            let session = Arc::new(SigningSession::from_env(
                &config.network.rpc_url,
                config.network.chain_id,
            )?);
            let market = Arc::new(MarketDataGateway::new(
                config.subgraph_url.clone(),
                &config.cache,
            ));
            let reporter = WalletSummary::new(session, market);
            println!("{}", reporter.summary().await?);
        }
        Commands::Config => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).map_err(mantle_trade_agent::Error::from)?
            );
        }
    }

    Ok(())
}

fn build_executor(config: &Config, mock_fallback: bool) -> Result<TradeExecutor> {
    let session = Arc::new(SigningSession::from_env(
        &config.network.rpc_url,
        config.network.chain_id,
    )?);
    tracing::info!(address = %session.address(), "agent wallet ready");

    let market: Arc<dyn MarketData> = Arc::new(MarketDataGateway::new(
        config.subgraph_url.clone(),
        &config.cache,
    ));

    let completions = CompletionClient::from_env(config.completion.clone())?;
    let parser = LlmIntentParser::new(
        completions,
        market.clone(),
        config.slippage_bps_default,
    );

    let swaps = SwapExecutor::new(session.clone(), market.clone(), config.clone());
    let wrapper = WrapUnwrapExecutor::new(session.clone(), deployed::WMNT, config.gas.clone());
    let reporter = WalletSummary::new(session, market.clone());

    Ok(TradeExecutor::new(
        Arc::new(parser),
        market,
        Arc::new(swaps),
        Arc::new(wrapper),
        Arc::new(reporter),
        mock_fallback,
    ))
}

fn print_result(result: &mantle_trade_agent::TradeResult) {
    println!("{}", result.message);
    if let Some(hash) = &result.transaction_hash {
        if result.simulated {
            println!("Simulated tx: {}", hash);
        } else {
            println!("Tx: {}", hash);
        }
    }
}

async fn run_repl(executor: &TradeExecutor) -> Result<()> {
    println!("Type a trading instruction, or 'quit' to exit.");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout()
            .flush()
            .map_err(|e| mantle_trade_agent::Error::Config(e.to_string()))?;

        let mut line = String::new();
        if stdin
            .read_line(&mut line)
            .map_err(|e| mantle_trade_agent::Error::Config(e.to_string()))?
            == 0
        {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let result = executor.execute(line).await;
        print_result(&result);
    }
    Ok(())
}

async fn run_query(
    config: &Config,
    query_type: &str,
    limit: u32,
    pool: Option<&str>,
    days: u64,
) -> Result<()> {
    let market = MarketDataGateway::new(config.subgraph_url.clone(), &config.cache);

    match query_type {
        "top_pools" => {
            for (i, pool) in market.top_pools(limit).await?.iter().enumerate() {
                println!("{}. {} - ${:.2}", i + 1, pool.pair_label(), pool.tvl_usd());
            }
        }
        "recent_swaps" => {
            for swap in market.recent_swaps(limit).await? {
                println!(
                    "{}/{} - ${}",
                    swap.pool.token0.symbol, swap.pool.token1.symbol, swap.amount_usd
                );
            }
        }
        "tokens" => {
            for token in market.tokens().await? {
                println!("{} - TVL: ${:.2}", token.symbol, token.tvl_usd());
            }
        }
        "pool_metrics" => {
            let pool = pool.ok_or_else(|| {
                mantle_trade_agent::Error::Validation(
                    "pool_metrics requires --pool <address>".to_string(),
                )
            })?;
            for day in market.pool_metrics(pool, days).await? {
                println!(
                    "{}: tvl ${} volume ${}",
                    day.date,
                    day.tvl_usd.as_deref().unwrap_or("0"),
                    day.volume_usd.as_deref().unwrap_or("0")
                );
            }
        }
        other => {
            return Err(mantle_trade_agent::Error::Validation(format!(
                "Unknown query type: {} (expected top_pools, recent_swaps, tokens, pool_metrics)",
                other
            )));
        }
    }

    Ok(())
}
