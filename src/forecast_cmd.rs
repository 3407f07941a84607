//! Forecast command: calibrate a LIM and forecast from an initial field.

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use lim_forecast::Lim;
use lim_io::{read_field, write_forecast};

use crate::cli::ForecastArgs;
use crate::config;
use crate::convert;
use crate::staging::Backend;

/// Run the forecast pipeline.
pub fn run(args: ForecastArgs) -> Result<()> {
    let _cmd = info_span!("forecast").entered();
    let config = config::load(&args.config)?;

    // 1. Read the calibration field
    let input = args.input.or(config.io.input.clone()).ok_or_else(|| {
        anyhow::anyhow!("no input path: set [io].input in config or use --input")
    })?;
    let reader_cfg = convert::build_reader_config(&config.io)?;
    let field = read_field(&input, &reader_cfg)
        .with_context(|| format!("failed to read NetCDF: {}", input.display()))?;
    info!(
        n_times = field.n_times(),
        n_valid = field.n_valid(),
        "calibration field loaded"
    );

    // 2. Initial conditions, defaulting to the calibration field
    let initial_field = match args.initial.or(config.io.initial.clone()) {
        Some(path) => {
            let f = read_field(&path, &reader_cfg)
                .with_context(|| format!("failed to read NetCDF: {}", path.display()))?;
            if f.valid_mask() != field.valid_mask() {
                bail!(
                    "initial field {} masks different locations than the calibration field",
                    path.display()
                );
            }
            Some(f)
        }
        None => None,
    };
    let initial = initial_field.as_ref().unwrap_or(&field).values().view();

    // 3. Build the model
    let lim_cfg = convert::build_lim_config(&config.model)?;
    let options = convert::build_forecast_options(&config.model)?;
    let mut lim = Lim::new(field.values().clone(), lim_cfg).context("invalid calibration data")?;
    if config.model.area_weight {
        lim = lim
            .with_lats(field.lats().clone())
            .context("invalid latitudes")?;
    }

    // 4. Forecast
    let mut storage = Backend::open(&config.storage)?;
    let mut cache = convert::build_staging_cache(&config.storage)?;
    let forecast = lim
        .forecast_with_storage(initial, &options, &mut storage, &mut cache)
        .context("forecast failed")?;
    info!(
        n_leads = forecast.lead_times().len(),
        n_samples = forecast.n_samples(),
        var_explained = forecast.eofs().var_explained(),
        "forecast complete"
    );

    // 5. Write output
    let output = args.output.unwrap_or(config.io.forecast_output);
    write_forecast(&output, &forecast, Some(&field))
        .with_context(|| format!("failed to write forecast: {}", output.display()))?;
    info!(path = %output.display(), "forecast written");

    Ok(())
}
