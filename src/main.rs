use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinship_engine::{
    config::{Config, DEFAULT_CONFIG_YAML},
    http,
    reports::ReportGenerator,
    service::{KinshipContext, QualityService, VisualizationService},
    store::MemoryStore,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kinship")]
#[command(about = "Genealogical relationship engine: kinship paths, pedigree charts and connectivity checks")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON snapshot to load (overrides store.snapshot_path)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve,

    /// Calculate the relationship between two people
    Relate {
        /// Handle of the person the relationship is described from
        from: String,

        /// Handle of the other person
        to: String,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Print the ancestor tree of a person
    Ancestors {
        handle: String,

        /// Generations above the person (defaults to charts.fan_chart_generations)
        #[arg(short, long)]
        generations: Option<u32>,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Print the descendant tree of a person
    Descendants {
        handle: String,

        /// Generations below the person (defaults to charts.descendant_generations)
        #[arg(short, long)]
        generations: Option<u32>,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// List people not connected to the main tree
    Disconnected {
        /// Person to measure connectivity from (defaults to the first person)
        #[arg(short, long)]
        root: Option<String>,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Print population statistics
    Stats {
        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "kinship.yml")]
        config_file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration and snapshot
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(&cli.log_level)?;

    // Init must work without a valid configuration
    if let Commands::Init { config_file, force } = &cli.command {
        return init_config(config_file.clone(), *force).await;
    }

    let mut config = load_config(cli.config.as_ref()).await?;
    if let Some(snapshot) = cli.snapshot {
        config.store.snapshot_path = snapshot;
    }
    let config = Arc::new(config);

    match cli.command {
        Commands::Serve => serve(config).await?,

        Commands::Relate { from, to, output } => {
            let service = VisualizationService::new(load_context(&config).await?);
            let result = service.calculate_relationship(&from, &to).await?;
            println!("{}", ReportGenerator::new().relationship(&result, &output)?);
        }

        Commands::Ancestors {
            handle,
            generations,
            output,
        } => {
            let service = VisualizationService::new(load_context(&config).await?);
            let tree = service.fan_chart(&handle, generations).await?;
            let title = format!("Ancestors of {}", tree.person.name);
            println!("{}", ReportGenerator::new().tree(&title, &tree, &output)?);
        }

        Commands::Descendants {
            handle,
            generations,
            output,
        } => {
            let service = VisualizationService::new(load_context(&config).await?);
            let tree = service.descendant_tree(&handle, generations).await?;
            let title = format!("Descendants of {}", tree.person.name);
            println!("{}", ReportGenerator::new().tree(&title, &tree, &output)?);
        }

        Commands::Disconnected { root, output } => {
            let service = QualityService::new(load_context(&config).await?);
            let report = service.disconnected(root).await?;
            println!("{}", ReportGenerator::new().disconnected(&report, &output)?);
        }

        Commands::Stats { output } => {
            let service = QualityService::new(load_context(&config).await?);
            let stats = service.statistics().await?;
            println!("{}", ReportGenerator::new().statistics(&stats, &output)?);
        }

        Commands::Validate => validate(&config).await?,

        Commands::Init { .. } => {}
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Load configuration: defaults, then the file, then `KINSHIP_*` variables
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = config_path {
        if path.exists() {
            info!("Loading configuration from: {:?}", path);
            let file_config = Config::load_from_file(path)
                .await
                .with_context(|| format!("Failed to load configuration file: {:?}", path))?;
            config.merge_with(file_config);
        } else {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
        }
    }

    config.apply_env().context("Invalid KINSHIP_* environment variable")?;
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

async fn load_context(config: &Arc<Config>) -> Result<KinshipContext> {
    let path = &config.store.snapshot_path;
    let store = MemoryStore::load_from_file(path)
        .await
        .with_context(|| format!("Failed to load snapshot: {:?}", path))?;

    Ok(KinshipContext::new(Arc::new(store), config.clone()))
}

async fn serve(config: Arc<Config>) -> Result<()> {
    let path = &config.store.snapshot_path;
    let store = MemoryStore::load_from_file(path)
        .await
        .with_context(|| format!("Failed to load snapshot: {:?}", path))?;

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    };

    http::serve(config, Arc::new(store), metrics).await
}

/// Initialize configuration file
async fn init_config(config_file: PathBuf, force: bool) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() && !force {
        warn!("Configuration file already exists: {:?}", config_file);
        println!("Configuration file already exists: {:?} (use --force to overwrite)", config_file);
        return Ok(());
    }

    tokio::fs::write(&config_file, DEFAULT_CONFIG_YAML)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    info!("Configuration file created successfully: {:?}", config_file);
    println!("Configuration file created: {:?}", config_file);
    println!("Edit this file to point store.snapshot_path at your exported tree.");

    Ok(())
}

/// Check the configuration and that the snapshot loads
async fn validate(config: &Config) -> Result<()> {
    println!("✅ Configuration is valid");

    let path = &config.store.snapshot_path;
    let store = match MemoryStore::load_from_file(path).await {
        Ok(store) => store,
        Err(e) => {
            error!("❌ Failed to load snapshot {:?}: {}", path, e);
            std::process::exit(1);
        }
    };
    println!("✅ Snapshot loaded: {:?}", path);
    println!("  People: {}", store.person_count());
    println!("  Families: {}", store.family_count());

    let context = KinshipContext::new(Arc::new(store), Arc::new(config.clone()));
    let stats = QualityService::new(context).statistics().await?;
    println!("  Relationships: {}", stats.relationships);
    println!("  Isolated people: {}", stats.isolated_people);
    if stats.clusters > 1 {
        println!("⚠️  {} separate clusters; run `kinship disconnected` for details", stats.clusters);
    }

    info!("Validation completed");
    Ok(())
}
