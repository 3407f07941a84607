//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Result, bail};

use crate::config::*;

use lim_forecast::{FitMode, ForecastOptions, LimConfig};
use lim_io::ReaderConfig;
use lim_preprocess::StagingCache;
use lim_resample::ResampleConfig;
use lim_skill::SkillConfig;

/// Parses a propagator fit mode name into the corresponding enum variant.
pub fn parse_fit_mode(s: &str) -> Result<FitMode> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "lag1_power" | "lag1" => Ok(FitMode::Lag1Power),
        "direct" => Ok(FitMode::Direct),
        other => bail!("unknown fit mode: {other:?}"),
    }
}

/// Builds a [`ReaderConfig`] from the TOML I/O configuration.
pub fn build_reader_config(io: &IoToml) -> Result<ReaderConfig> {
    let cfg = ReaderConfig::default()
        .with_var_name(&io.var_name)
        .with_lat_aliases(io.lat_aliases.clone())
        .with_lon_aliases(io.lon_aliases.clone());
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a validated [`LimConfig`] from the TOML model configuration.
pub fn build_lim_config(model: &ModelToml) -> Result<LimConfig> {
    let cfg = LimConfig::new()
        .with_window_size(model.window_size)
        .with_year_length(model.year_length)
        .with_lead_times(model.lead_times.clone())
        .with_n_modes(model.n_modes);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds [`ForecastOptions`] from the TOML model configuration.
pub fn build_forecast_options(model: &ModelToml) -> Result<ForecastOptions> {
    Ok(ForecastOptions::new()
        .with_fit_mode(parse_fit_mode(&model.fit_mode)?)
        .with_detrend(model.detrend))
}

/// Builds a validated [`ResampleConfig`] from the TOML resample configuration.
pub fn build_resample_config(resample: &ResampleToml) -> Result<ResampleConfig> {
    let cfg = ResampleConfig::new()
        .with_n_trials(resample.n_trials)
        .with_holdout_pct(resample.holdout_pct);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a validated [`SkillConfig`] from the TOML skill configuration.
pub fn build_skill_config(skill: &SkillToml) -> Result<SkillConfig> {
    let cfg = SkillConfig::new()
        .with_sigma(skill.sigma)
        .with_fisher_threshold(skill.fisher_threshold);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds the staging budget from the TOML storage configuration.
pub fn build_staging_cache(storage: &StorageToml) -> Result<StagingCache> {
    match storage.cache_mb {
        None => Ok(StagingCache::unbounded()),
        Some(0) => bail!("storage.cache_mb must be greater than 0"),
        Some(mb) => {
            let Some(bytes) = mb.checked_mul(1024 * 1024) else {
                bail!("storage.cache_mb is too large: {mb}");
            };
            Ok(StagingCache::new(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_mode_names() {
        assert_eq!(parse_fit_mode("lag1_power").unwrap(), FitMode::Lag1Power);
        assert_eq!(parse_fit_mode("Lag1-Power").unwrap(), FitMode::Lag1Power);
        assert_eq!(parse_fit_mode("direct").unwrap(), FitMode::Direct);
        assert!(parse_fit_mode("ols").is_err());
    }

    #[test]
    fn default_sections_convert() {
        let cfg = LimToml::default();
        assert!(build_reader_config(&cfg.io).is_ok());
        assert_eq!(build_lim_config(&cfg.model).unwrap(), LimConfig::new());
        assert_eq!(
            build_forecast_options(&cfg.model).unwrap(),
            ForecastOptions::new()
        );
        assert_eq!(
            build_resample_config(&cfg.resample).unwrap(),
            ResampleConfig::new()
        );
        assert!(build_skill_config(&cfg.skill).is_ok());
        assert_eq!(
            build_staging_cache(&cfg.storage).unwrap().capacity_bytes(),
            usize::MAX
        );
    }

    #[test]
    fn invalid_values_rejected() {
        let model = ModelToml {
            lead_times: vec![],
            ..ModelToml::default()
        };
        assert!(build_lim_config(&model).is_err());

        let resample = ResampleToml {
            n_trials: 0,
            holdout_pct: 0.1,
        };
        assert!(build_resample_config(&resample).is_err());

        let skill = SkillToml {
            sigma: 0.0,
            fisher_threshold: 0.5,
        };
        assert!(build_skill_config(&skill).is_err());

        let storage = StorageToml {
            cache_mb: Some(0),
            ..StorageToml::default()
        };
        assert!(build_staging_cache(&storage).is_err());
    }
}
