use clap::Parser;
use std::path::{Path, PathBuf};
use table_geocoder::utils::{logger, validation::Validate};
use table_geocoder::{
    BatchPipeline, CliConfig, CsvSink, GeocodeClient, LocalStorage, RetryPolicy, RunOutcome,
    Storage, VersionCheck, VERSION_CHECK_URL,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Geocode table version {}", env!("CARGO_PKG_VERSION"));
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // Advisory only; an unreachable manifest never blocks the run.
    VersionCheck::new(RetryPolicy::default())
        .advise(VERSION_CHECK_URL, env!("CARGO_PKG_VERSION"))
        .await;

    std::fs::create_dir_all(&config.output_path)?;
    let output_name = format!(
        "GeocodeResults_{}.csv",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    );
    let output_file = Path::new(&config.output_path).join(&output_name);

    let input_path = stage_input(&config).await?;

    let client = GeocodeClient::new(
        &config.service_url,
        config.api_key.clone(),
        config.spatial_reference,
        config.locator,
    )?;
    let pipeline =
        BatchPipeline::new(client, config.column_map()).with_monitoring(config.monitor);
    let sink = CsvSink::new(output_file.clone());

    let outcome = match pipeline.run(&input_path, &sink).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Geocode failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match &outcome {
        RunOutcome::Completed { rows } => {
            tracing::info!("✅ Geocode completed, {} rows", rows);
        }
        RunOutcome::Aborted { rows_completed } => {
            tracing::error!(
                "⚠️ Geocode aborted after {} rows; uploading the partial table",
                rows_completed
            );
        }
    }

    // The partial table is still worth shipping after an abort; downstream
    // can resume from it.
    if !config.no_upload {
        let bucket = config.output_bucket.clone().unwrap_or_default();
        let store = LocalStorage::new(bucket);
        let data = std::fs::read(&output_file)?;
        store.write_file(&output_name, &data).await?;
        tracing::info!("Uploading {} complete", output_name);
    }

    if matches!(outcome, RunOutcome::Aborted { .. }) {
        std::process::exit(2);
    }

    Ok(())
}

/// Copies the input table out of its bucket into the working directory, or
/// trusts `input_csv` as a local path when staging is skipped.
async fn stage_input(config: &CliConfig) -> anyhow::Result<PathBuf> {
    if config.no_download {
        return Ok(PathBuf::from(&config.input_csv));
    }

    let bucket = config.input_bucket.clone().unwrap_or_default();
    let store = LocalStorage::new(bucket);
    let data = store.read_file(&config.input_csv).await?;

    let staged = Path::new(&config.output_path).join("inputdata.csv");
    std::fs::write(&staged, data)?;
    tracing::info!("Staging {} complete", config.input_csv);
    Ok(staged)
}
