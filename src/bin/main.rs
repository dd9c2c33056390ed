use startup_metrics_consolidator::{
    error::ConsolidationError,
    sources::{gather_staged, FetchQuery, FetcherRegistry},
    Consolidator, ConsolidatorConfig, SourceBundles, SourceTag,
};
use serde_json::Value;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: consolidate <bundles.json | bundle-dir>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let Some(input) = std::env::args().nth(1) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let config = ConsolidatorConfig::from_env()?;

    info!(
        input = %input,
        risk_llm_fallback = config.fallback_enabled(),
        investment_analysis = config.analysis_enabled(),
        "Startup metrics consolidator starting"
    );

    let path = Path::new(&input);
    let bundles = if path.is_dir() {
        let registry = FetcherRegistry::from_dir(path);
        gather_staged(&registry, &FetchQuery::default(), config.source_fetch_timeout).await
    } else {
        load_bundle_file(path).await?
    };

    let consolidator = Consolidator::from_config(&config)?;
    let consolidation = consolidator.consolidate(&bundles).await;

    println!("{}", serde_json::to_string_pretty(&consolidation)?);
    Ok(())
}

/// A JSON object keyed by source tag
async fn load_bundle_file(path: &Path) -> Result<SourceBundles, ConsolidationError> {
    let text = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&text)?;

    let Value::Object(entries) = value else {
        return Err(ConsolidationError::InvalidInput(format!(
            "{} must hold a JSON object keyed by source tag",
            path.display()
        )));
    };

    let mut bundles = SourceBundles::new();
    for (key, payload) in entries {
        let source: SourceTag = key.parse()?;
        bundles.insert(source, payload);
    }
    Ok(bundles)
}
