use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use foodsense::config::AppConfig;
use foodsense::handlers::format_meal_report;
use foodsense::models::{media_type_for, AnalysisRequest, ClientConfiguration, UNKNOWN_MEDIA_TYPE};
use foodsense::services::{ConnectivityProbe, MealAnalysisClient, ResultSource};
use foodsense::services::probe::ProbeResult;

/// FoodSense AI - photograph a meal, get its nutrition breakdown
#[derive(Parser, Debug)]
#[command(name = "foodsense")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a meal photo
    Analyze {
        /// Image file (png, jpg, webp, gif)
        path: PathBuf,

        /// Use sample data instead of calling the webhook
        #[arg(long)]
        offline: bool,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the configured webhook endpoints respond
    Probe,

    /// Run the demo HTTP server
    #[cfg(feature = "demo-server")]
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    log::info!(
        "✅ Configuration loaded: {} endpoints, {} attempts planned",
        config.endpoints.len(),
        config.strategy_plan().len()
    );

    match cli.command {
        Commands::Analyze { path, offline, json } => analyze_file(&config, &path, offline, json).await,
        Commands::Probe => probe(&config).await,
        #[cfg(feature = "demo-server")]
        Commands::Serve => serve(config).await,
    }
}

async fn analyze_file(config: &AppConfig, path: &Path, offline: bool, json: bool) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "meal.jpg".to_string());

    let media_type = media_type_for(&file_name).unwrap_or(UNKNOWN_MEDIA_TYPE);
    let request = AnalysisRequest::new(bytes, media_type, file_name);
    if !request.is_image() {
        anyhow::bail!("{} is not an image (expected png, jpg, webp or gif)", path.display());
    }
    if request.is_empty() {
        anyhow::bail!("{} is empty", path.display());
    }

    let client = MealAnalysisClient::from_config(config)?;
    let client_config = ClientConfiguration {
        use_offline_fallback: offline || config.offline,
    };

    let outcome = client.analyze_with_report(&request, &client_config).await;
    if outcome.source == ResultSource::Fallback {
        log::warn!("⚠️ Webhook unavailable, showing sample results");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        if client_config.use_offline_fallback {
            println!("🧪 Showing sample nutrition data\n");
        }
        println!("{}", format_meal_report(&outcome.result));
    }

    Ok(())
}

async fn probe(config: &AppConfig) -> Result<()> {
    let client = MealAnalysisClient::from_config(config)?;
    let probe = ConnectivityProbe::new(client.plan().endpoints(), client.http_client().clone());

    let report = probe.run().await;
    for outcome in &report.outcomes {
        match &outcome.result {
            ProbeResult::Responded { status, .. } => {
                println!("✅ {:?} {} -> {}", outcome.method, outcome.endpoint, status)
            }
            ProbeResult::Failed { error } => {
                println!("❌ {:?} {} -> {}", outcome.method, outcome.endpoint, error)
            }
        }
    }

    let reachable = report.reachable_endpoints();
    println!(
        "\n{}/{} endpoints reachable",
        reachable.len(),
        client.plan().endpoints().len()
    );
    for endpoint in reachable {
        println!("  • {}", endpoint);
    }

    Ok(())
}

#[cfg(feature = "demo-server")]
async fn serve(config: AppConfig) -> Result<()> {
    use foodsense::server::create_router;
    use std::sync::Arc;

    let client = MealAnalysisClient::from_config(&config)?;
    let probe = Arc::new(ConnectivityProbe::new(
        client.plan().endpoints(),
        client.http_client().clone(),
    ));
    let app = create_router(Arc::new(client), probe, config.client_configuration());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    log::info!("🌐 Demo server starting on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("🛑 Shutting down...");
        })
        .await?;

    Ok(())
}
