//! Train the house price pipeline from the Ames CSV and save the artifact.
//!
//! Usage: `train [data_csv] [model_out]`

use anyhow::Context;
use house_price_rs::dataset::read_csv;
use house_price_rs::trainer::HousePriceTrainer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA: &str = "data/AmesHousing.csv";
const DEFAULT_MODEL_OUT: &str = "models/house_price_model.bin";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let data_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_DATA.to_string()));
    let model_out = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_MODEL_OUT.to_string()));

    let frame = read_csv(&data_path).with_context(|| format!("reading {}", data_path.display()))?;
    tracing::info!(
        rows = frame.n_rows(),
        columns = frame.n_cols(),
        path = %data_path.display(),
        "loaded training data"
    );

    let outcome = HousePriceTrainer::builder().build().fit(&frame)?;

    if let Some(parent) = model_out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    outcome
        .pipeline
        .save_to_file(&model_out)
        .with_context(|| format!("saving {}", model_out.display()))?;

    match outcome.holdout_rmse {
        Some(score) => tracing::info!(
            rmse = %format!("{:.2}", score),
            train_rows = outcome.n_train,
            test_rows = outcome.n_test,
            "model saved to {}",
            model_out.display()
        ),
        None => tracing::info!("model saved to {}", model_out.display()),
    }
    Ok(())
}
