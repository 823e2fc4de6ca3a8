//! cca-ai - Call-center compliance analysis
//!
//! Drains pending call transcripts from the database: each call is segmented
//! by an LLM, every segment is checked against retrieved regulation passages,
//! and the findings are committed batch by batch.

use anyhow::{Context, Result};
use cca_ai::config::{resolve_llm_api_key, PipelineConfig};
use cca_ai::llm::{ComplianceModel, OpenAiCompatProvider, StructuredLlm};
use cca_ai::models::CallStatus;
use cca_ai::retrieval::{IndexServiceClient, Retriever};
use cca_ai::{BatchScheduler, CallOrchestrator};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cca-ai")]
#[command(about = "Call-center transcript compliance analysis")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CCA_CONFIG")]
    config: Option<PathBuf>,

    /// Data folder holding the database
    #[arg(long, env = "CCA_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Database file (overrides data folder resolution)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Calls per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Passages retrieved per segment
    #[arg(long)]
    top_k: Option<usize>,

    /// Process a single batch and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = cca_common::config::load_bootstrap_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG takes precedence over the config file level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cca-ai v{}", env!("CARGO_PKG_VERSION"));

    let pipeline_config =
        PipelineConfig::from_toml(&toml_config).with_overrides(args.batch_size, args.top_k);
    pipeline_config.validate()?;
    info!(
        batch_size = pipeline_config.batch_size,
        top_k = pipeline_config.top_k,
        "Pipeline configuration"
    );

    let db_path = match args.database {
        Some(path) => path,
        None => {
            let data_folder =
                cca_common::config::resolve_data_folder(args.data_folder.as_deref(), &toml_config);
            toml_config.database_path(&data_folder)
        }
    };
    info!("Database: {}", db_path.display());

    let db = cca_ai::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    let api_key = resolve_llm_api_key(&db, &toml_config).await?;
    let provider = OpenAiCompatProvider::new(&toml_config.llm, api_key)?;
    let model: Arc<dyn ComplianceModel> = Arc::new(
        StructuredLlm::new(Arc::new(provider), toml_config.llm.model.clone())
            .with_temperature(toml_config.llm.temperature),
    );
    let retriever: Arc<dyn Retriever> = Arc::new(IndexServiceClient::new(&toml_config.retrieval)?);
    info!(
        llm = %toml_config.llm.base_url,
        model = %toml_config.llm.model,
        index = %toml_config.retrieval.base_url,
        "Collaborators configured"
    );

    let orchestrator = Arc::new(CallOrchestrator::new(model, retriever, pipeline_config.top_k));
    let scheduler = BatchScheduler::new(db.clone(), orchestrator, pipeline_config);

    if args.once {
        match scheduler.run_batch().await? {
            Some(batch) => info!(calls = batch.calls, findings = batch.findings, "Single batch done"),
            None => info!("No pending calls"),
        }
    } else {
        let report = scheduler.run().await?;
        info!(
            batches = report.batches,
            calls = report.calls,
            findings = report.findings,
            "Analysis run complete"
        );
    }

    let counts = cca_ai::db::calls::count_by_status(&db).await?;
    for status in CallStatus::ALL {
        info!(
            status = %status,
            count = counts.get(&status).copied().unwrap_or(0),
            "Call status summary"
        );
    }

    db.close().await;
    Ok(())
}
