//! Offline admission quote for a pending upload.
//!
//! ```text
//! stowage-quote <bytes> [--used <bytes>] [--balance <units>] [--token <SYMBOL>]
//! ```
//!
//! Cost constants come from the engine config (`STOWAGE_CONFIG` or the
//! platform default). With `--token`, the estimate is also shown in that
//! token, priced through the configured ticker endpoint.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stowage_engine::EngineConfig;
use stowage_pricing::{PriceClient, QUOTE_ASSET};
use stowage_protocol::BoxState;
use stowage_transfer::{AdmissionQuote, chunk_count, quote};

/// Quote-asset value of one trillion cost units.
const USDT_PER_TRILLION_UNITS: f64 = 1.33;

/// Prints the admission quote for uploading `bytes` more bytes.
#[derive(Debug, Parser)]
#[command(name = "stowage-quote", version, about)]
struct Args {
    /// Size of the pending upload, in bytes
    #[arg(value_name = "BYTES")]
    pending_bytes: u64,

    /// Bytes already stored
    #[arg(long = "used", value_name = "BYTES", default_value_t = 0)]
    used_bytes: u64,

    /// Spendable balance, in cost units
    #[arg(long, value_name = "UNITS", default_value_t = 0)]
    balance: u128,

    /// Also price the estimate in this token
    #[arg(long, value_name = "SYMBOL")]
    token: Option<String>,
}

fn print_quote(q: &AdmissionQuote, chunks: u64, config: &EngineConfig) {
    println!("chunks:          {chunks}");
    println!("incoming bytes:  {}", q.incoming_bytes);
    println!("usage after:     {} / {}", q.final_usage_bytes(), config.storage_ceiling);
    println!("cost estimate:   {}", q.cost_estimate);
    println!("balance:         {}", q.available_budget);
    match q.shortfall() {
        Some(deficit) => println!("shortfall:       {deficit}"),
        None => println!("shortfall:       none"),
    }
    if q.final_usage_bytes() >= config.storage_ceiling {
        println!("capacity:        exceeded");
    }
}

async fn run(args: Args, config: EngineConfig) -> anyhow::Result<()> {
    let chunks = chunk_count(args.pending_bytes, config.chunk_size)?;
    let state = BoxState {
        memory_size: args.used_bytes,
        stable_memory_size: 0,
        balance: args.balance,
    };
    let q = quote(chunks, config.chunk_size, &state, &config.admission_policy());
    tracing::debug!(pending_bytes = args.pending_bytes, chunks, "quote computed");
    print_quote(&q, chunks, &config);

    if let Some(token) = args.token {
        let prices = PriceClient::new()?.with_base_url(config.price_endpoint.as_str());
        let usdt = q.cost_estimate as f64 / 1e12 * USDT_PER_TRILLION_UNITS;
        let amount = prices
            .convert(usdt, QUOTE_ASSET, &token)
            .await
            .with_context(|| format!("pricing {token}"))?;
        println!("in {QUOTE_ASSET}:         {usdt:.6}");
        println!("in {}:  {amount:.6}", token.to_ascii_uppercase());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = EngineConfig::load()?;
    tracing::debug!(chunk_size = config.chunk_size, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(args, config))
}
