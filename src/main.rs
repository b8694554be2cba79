use car_scout::{InterpreterConfig, QueryInterpreter};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Turn a free-text car search into listing filters
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// What the shopper typed, e.g. "white Toyota SUV under $40,000"
    #[arg(required = true)]
    query: Vec<String>,

    /// Completion model to use
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Per-attempt timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Listings page the filters are applied to
    #[arg(long, default_value = "http://localhost:3000/cars")]
    listings_url: String,

    /// Also write the result as JSON to this file
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config =
        InterpreterConfig::from_env()?.with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(url) = args.base_url {
        config = config.with_base_url(url);
    }

    let interpreter = QueryInterpreter::new(&config)?;

    let query = args.query.join(" ");
    info!("🚗 Interpreting: {}", query);

    let result = interpreter.parse(&query).await;

    // Display results
    if result.message.is_empty() {
        println!("(no interpretation, showing all listings)");
    } else {
        println!("{}", result.message);
    }
    println!("{}", serde_json::to_string_pretty(&result.filters)?);

    if !result.filters.is_empty() {
        let mut url = reqwest::Url::parse(&args.listings_url)?;
        url.query_pairs_mut().extend_pairs(result.filters.to_query_pairs());
        println!("{}", url);
    }

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&result)?;
        tokio::fs::write(&path, json).await?;
        info!("💾 Saved result to {}", path.display());
    }

    Ok(())
}
