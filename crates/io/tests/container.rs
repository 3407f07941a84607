//! Round trips of cross-validation results through the NetCDF container.

use approx::assert_abs_diff_eq;
use lim_forecast::{ForecastOptions, LimConfig};
use lim_io::{IoError, read_container, write_container};
use lim_resample::{ResampleConfig, ResampleLim, ResampleParts, ResampleResult};
use ndarray::{Array1, Array2, Array3, Array4};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tempfile::tempdir;

fn observations(seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.3).unwrap();
    let two_pi = 2.0 * std::f64::consts::PI;
    Array2::from_shape_fn((120, 3), |(t, j)| {
        let t = t as f64;
        let phase = j as f64 * 0.9;
        (two_pi * t / 12.0 + phase).sin()
            + 0.8 * (two_pi * t / 41.0 + phase).sin()
            + noise.sample(&mut rng)
    })
}

fn run() -> ResampleResult {
    let lim_config = LimConfig::new()
        .with_n_modes(2)
        .with_lead_times(vec![1, 2]);
    let config = ResampleConfig::new().with_n_trials(5).with_holdout_pct(0.5);
    ResampleLim::new(observations(11), lim_config, config)
        .unwrap()
        .run(&ForecastOptions::new())
        .unwrap()
}

#[test]
fn cross_validation_result_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trials.nc");
    let result = run();

    write_container(&path, &result).unwrap();
    let back = read_container(&path).unwrap();

    assert_eq!(back.start_indices(), result.start_indices());
    assert_eq!(back.lead_times(), result.lead_times());
    assert_eq!(back.n_trials_requested(), result.n_trials_requested());
    assert_eq!(back.test_len(), result.test_len());
    assert_eq!(back.year_length(), result.year_length());
    assert_eq!(back.window_size(), result.window_size());
    assert_abs_diff_eq!(back.forecasts(), result.forecasts(), epsilon = 1e-15);
    assert_abs_diff_eq!(back.eofs(), result.eofs(), epsilon = 1e-15);
    assert_abs_diff_eq!(back.anomaly_series(), result.anomaly_series(), epsilon = 1e-15);
    assert_abs_diff_eq!(back.var_explained(), result.var_explained(), epsilon = 1e-15);
}

#[test]
fn container_layout_uses_named_variables() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trials.nc");
    let result = run();
    write_container(&path, &result).unwrap();

    let file = netcdf::open(&path).unwrap();
    for name in [
        "anomaly_srs",
        "test_start_idxs",
        "fcast_times",
        "eofs",
        "var_explained",
        "fcast_bin_0",
        "fcast_bin_1",
    ] {
        assert!(file.variable(name).is_some(), "missing {name}");
    }
    assert!(file.variable("fcast_bin_2").is_none());

    let bin = file.variable("fcast_bin_1").unwrap();
    let dims: Vec<usize> = bin.dimensions().iter().map(|d| d.len()).collect();
    assert_eq!(dims, vec![result.n_trials(), 2, result.test_len()]);
}

fn tiny_result() -> ResampleResult {
    ResampleResult::from_parts(ResampleParts {
        forecasts: Array4::from_shape_fn((2, 1, 1, 2), |(i, _, _, t)| (10 * i + t) as f64),
        eofs: Array3::from_elem((2, 2, 1), std::f64::consts::FRAC_1_SQRT_2),
        start_indices: vec![0, 2],
        n_trials_requested: 4,
        test_len: 2,
        lead_times: vec![1],
        year_length: 1,
        window_size: 1,
        anomaly_series: Array2::zeros((6, 2)),
        var_explained: Array1::from(vec![0.9, 0.8]),
    })
    .unwrap()
}

#[test]
fn hand_built_result_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tiny.nc");
    let result = tiny_result();
    write_container(&path, &result).unwrap();

    let back = read_container(&path).unwrap();
    assert_eq!(back.forecasts(), result.forecasts());
    assert_eq!(back.n_trials_requested(), 4);
    assert_eq!(back.lag_for_lead(0), Some(1));
}

#[test]
fn missing_attribute_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bare.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("anom_time", 3).unwrap();
        file.add_dimension("space", 1).unwrap();
        let mut var = file
            .add_variable::<f64>("anomaly_srs", &["anom_time", "space"])
            .unwrap();
        var.put_values(&[0.0, 0.0, 0.0], ..).unwrap();
    }

    let err = read_container(&path).unwrap_err();
    assert!(matches!(err, IoError::MissingAttribute { ref name, .. } if name == "yrsize"));
}

#[test]
fn missing_container_is_reported() {
    let dir = tempdir().unwrap();
    let err = read_container(&dir.path().join("none.nc")).unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}
