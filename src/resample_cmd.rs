//! Resample command: cross-validated forecasts over held-out chunks.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use lim_io::{read_field, write_container};
use lim_resample::ResampleLim;

use crate::cli::ResampleArgs;
use crate::config;
use crate::convert;
use crate::staging::Backend;

/// Run the cross-validation pipeline.
pub fn run(args: ResampleArgs) -> Result<()> {
    let _cmd = info_span!("resample").entered();
    let config = config::load(&args.config)?;

    // 1. Read observations
    let input = args.input.or(config.io.input.clone()).ok_or_else(|| {
        anyhow::anyhow!("no input path: set [io].input in config or use --input")
    })?;
    let reader_cfg = convert::build_reader_config(&config.io)?;
    let field = read_field(&input, &reader_cfg)
        .with_context(|| format!("failed to read NetCDF: {}", input.display()))?;
    info!(
        n_times = field.n_times(),
        n_valid = field.n_valid(),
        "observations loaded"
    );

    // 2. Plan trials
    let lim_cfg = convert::build_lim_config(&config.model)?;
    let options = convert::build_forecast_options(&config.model)?;
    let resample_cfg = convert::build_resample_config(&config.resample)?;
    let mut driver = ResampleLim::new(field.values().clone(), lim_cfg, resample_cfg)
        .context("cannot plan cross-validation trials")?;
    if config.model.area_weight {
        driver = driver
            .with_lats(field.lats().clone())
            .context("invalid latitudes")?;
    }
    let plan = driver.plan();
    info!(
        n_trials = plan.n_trials(),
        n_trials_requested = plan.n_trials_requested(),
        test_len = plan.test_len(),
        training_len = plan.training_len(),
        "trials planned"
    );

    // 3. Run
    let mut storage = Backend::open(&config.storage)?;
    let mut cache = convert::build_staging_cache(&config.storage)?;
    let result = driver
        .run_with_storage(&options, &mut storage, &mut cache)
        .context("cross-validation failed")?;

    // 4. Persist
    let output = args.output.unwrap_or(config.io.results);
    write_container(&output, &result)
        .with_context(|| format!("failed to write results: {}", output.display()))?;
    info!(
        path = %output.display(),
        n_trials = result.n_trials(),
        "results container written"
    );

    Ok(())
}
