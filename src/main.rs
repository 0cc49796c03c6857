use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraudscore::application::models::{ForestParams, IsolationParams, ReconstructionParams};
use fraudscore::application::service::ScoringService;
use fraudscore::application::training::{TrainingParams, train_from_csv};
use fraudscore::config::ScoringConfig;
use fraudscore::domain::transaction::ScoringRequest;
use fraudscore::infrastructure::bundle::ArtifactBundle;
use fraudscore::infrastructure::history::InMemoryHistoryStore;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train all models from a labeled transaction CSV and save the bundle
    Train {
        /// Path to the labeled CSV (user_id, transaction_time, amount, ...)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the trained bundle
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trees for the random forest classifier
        #[arg(long, default_value_t = 100)]
        n_trees: usize,
    },
    /// Score a single transaction request from a JSON file
    Score {
        /// Path to the request JSON
        #[arg(short, long)]
        request: PathBuf,

        /// Bundle to load (defaults to the configured path)
        #[arg(short, long)]
        bundle: Option<PathBuf>,
    },
    /// Print summary information about a saved bundle
    Inspect {
        /// Bundle to inspect
        #[arg(short, long)]
        bundle: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = ScoringConfig::from_env()?;
    config.validate()?;

    match cli.command {
        Commands::Train {
            input,
            output,
            n_trees,
        } => {
            let params = TrainingParams {
                forest: ForestParams {
                    n_trees,
                    ..ForestParams::default()
                },
                isolation: IsolationParams::default(),
                reconstruction: ReconstructionParams::default(),
            };
            let bundle = train_from_csv(&input, params)?;
            let output = output.unwrap_or_else(|| config.bundle_path.clone());
            bundle.save(&output)?;
            info!(path = %output.display(), "Bundle saved");
        }
        Commands::Score { request, bundle } => {
            let path = bundle.unwrap_or_else(|| config.bundle_path.clone());
            let history = Arc::new(InMemoryHistoryStore::new());
            let service = ScoringService::from_path(&path, &config, history)?;

            let raw = fs::read_to_string(&request)
                .with_context(|| format!("Failed to read request at {}", request.display()))?;
            let request: ScoringRequest =
                serde_json::from_str(&raw).context("Failed to parse scoring request")?;

            let result = service.score(&request)?;
            println!("{}", serde_json::to_string_pretty(&result.rounded())?);
        }
        Commands::Inspect { bundle } => {
            let bundle = ArtifactBundle::load(&bundle)?;
            println!("schema version:  {}", bundle.schema_version);
            println!("created at:      {}", bundle.created_at);
            println!("features:        {}", bundle.feature_order.len());
            for field in bundle.encoders.field_names() {
                let cardinality = bundle
                    .encoders
                    .field(field)
                    .map(|f| f.cardinality())
                    .unwrap_or(0);
                println!("encoder {field}: {cardinality} classes");
            }
        }
    }

    Ok(())
}
