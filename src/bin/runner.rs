// Batch runner: drives one raw batch end to end and reports the outcome.

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use recipe_etl::config::runner::Args;
use recipe_etl::config::load_etl_config;
use recipe_etl::orchestrator::BatchOrchestrator;
use recipe_etl::pipeline::dead_letter::JsonDeadLetterSink;
use recipe_etl::pipeline::readers::JsonFileSource;
use recipe_etl::pipeline::writers::ParquetPartitionWriter;
use recipe_etl::server::serve_metrics;
use recipe_etl::utils::amqp::{connect_rabbitmq, AmqpNotifier, Notifier};

fn derive_batch_id(args: &Args) -> String {
    if let Some(id) = &args.batch_id {
        return id.clone();
    }
    // Fall back to the input file stem so re-runs of the same file stay
    // idempotent; a random id only when even that is unavailable.
    Path::new(&args.input_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    let args = Args::parse();

    let etl_config = load_etl_config(&args.config)
        .with_context(|| format!("Loading ETL config from {}", args.config.display()))?;
    if args.validate_config {
        info!(config = %args.config.display(), "ETL configuration is valid.");
        return Ok(());
    }

    if let Some(port) = args.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = serve_metrics(port).await {
                error!(error = %e, "Metrics server terminated");
            }
        });
    }

    let batch_id = derive_batch_id(&args);
    let source = JsonFileSource::new(&args.input_file);
    let mut dead_letter = JsonDeadLetterSink::new(&args.dead_letter_dir);
    let store = ParquetPartitionWriter::new(&args.output_dir);
    let orchestrator = BatchOrchestrator::new(etl_config.enrichment, store)?;

    // The notifier is optional: without a broker address the batch still
    // runs, it just emits no downstream signal.
    let notifier: Option<AmqpNotifier> = match &args.amqp_addr {
        Some(addr) => {
            let conn = connect_rabbitmq(addr)
                .await
                .context("Connecting to RabbitMQ")?;
            Some(AmqpNotifier::new(&conn, &args.notify_queue).await?)
        }
        None => None,
    };

    info!(batch_id = %batch_id, input = %args.input_file, "Starting batch");
    match orchestrator
        .run_batch(
            &batch_id,
            &source,
            &mut dead_letter,
            notifier.as_ref().map(|n| n as &dyn Notifier),
        )
        .await
    {
        Ok(result) => {
            info!(
                total = result.total,
                succeeded = result.succeeded,
                failed = result.failed,
                "Batch finished"
            );
            for (flag, path) in &result.output_partitions {
                info!(partition = %flag, path = %path.display(), "Partition published");
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, retryable = e.is_retryable(), "Batch failed");
            // The guard flushes buffered log lines on drop; process::exit
            // would skip it.
            drop(guard);
            std::process::exit(1);
        }
    }
}
