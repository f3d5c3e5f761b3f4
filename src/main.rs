use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wraith::config::Config;
use wraith::services::risk::validate_trade_conditions;
use wraith::SignalResult;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wraith=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let symbols = if args.is_empty() {
        config.symbols.clone()
    } else {
        args
    };
    if symbols.is_empty() {
        anyhow::bail!("no symbols given; pass them as arguments or set SIGNAL_SYMBOLS");
    }

    info!(
        preset = %config.engine.preset,
        symbols = symbols.len(),
        cache = config.cache_enabled(),
        "Evaluating entry signals"
    );

    let engine = wraith::engine_from_config(&config)?;
    for symbol in &symbols {
        let result = engine.get_entry_signal(symbol).await;
        println!("{}", serde_json::to_string(&result)?);

        if let SignalResult::Accepted(entry) = &result {
            if config.account_balance > 0.0 {
                let sizing = validate_trade_conditions(config.account_balance, entry.strength);
                println!(
                    "{}",
                    serde_json::json!({ "coin": entry.coin, "sizing": sizing })
                );
            } else {
                warn!(coin = %entry.coin, "ACCOUNT_BALANCE not set, skipping sizing");
            }
        }
    }

    Ok(())
}
