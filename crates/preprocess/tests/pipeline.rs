use approx::assert_abs_diff_eq;
use lim_preprocess::{
    EdgeTrim, MemoryStorage, PreprocessError, Stage, StageRecord, StagingCache, Storage,
    area_weight, calc_anomaly, calc_eofs, detrend, running_mean, running_mean_staged,
};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Monthly field: annual cycle plus an interannual signal plus noise.
fn synthetic_field(n_months: usize, n_space: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.2).unwrap();
    Array2::from_shape_fn((n_months, n_space), |(t, j)| {
        let season = (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin() * (1.0 + j as f64);
        let slow = (2.0 * std::f64::consts::PI * t as f64 / 50.0 + j as f64).cos();
        season + slow + noise.sample(&mut rng)
    })
}

#[test]
fn full_chain_shapes_and_record() {
    let field = synthetic_field(240, 6, 42);
    let lats = Array1::from(vec![-50.0, -30.0, -10.0, 10.0, 30.0, 50.0]);

    let mut record = StageRecord::new();
    let smoothed = running_mean(field.view(), 12, EdgeTrim::WholeYears(12)).unwrap();
    record = record.then_trimmed(Stage::RunningMean, smoothed.edges());
    assert_eq!(smoothed.data().nrows(), 216);

    let anomaly = calc_anomaly(smoothed.data().view(), 12, None).unwrap();
    record = record.then(Stage::Anomaly);

    let detrended = detrend(anomaly.anomaly().view());
    record = record.then(Stage::Detrended);

    let weighted = area_weight(detrended.view(), lats.view()).unwrap();
    record = record.then(Stage::AreaWeighted);

    let eofs = calc_eofs(weighted.t(), 3).unwrap();
    record = record.then(Stage::EofProjected);
    assert_eq!(eofs.patterns().dim(), (6, 3));

    let pcs = eofs.project(detrended.view()).unwrap();
    assert_eq!(pcs.dim(), (3, 216));

    assert_eq!(
        record.stages(),
        &[
            Stage::Raw,
            Stage::RunningMean,
            Stage::Anomaly,
            Stage::Detrended,
            Stage::AreaWeighted,
            Stage::EofProjected
        ]
    );
    assert_eq!(record.edges().total(), 24);
}

#[test]
fn smoothing_removes_annual_cycle() {
    // A pure 12-month cycle averages to zero under a 12-month window.
    let field = Array2::from_shape_fn((96, 2), |(t, _)| {
        (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin()
    });
    let smoothed = running_mean(field.view(), 12, EdgeTrim::Window).unwrap();
    assert_abs_diff_eq!(
        smoothed.data(),
        &Array2::<f64>::zeros((85, 2)),
        epsilon = 1e-12
    );
}

#[test]
fn staged_chain_matches_in_memory() {
    let field = synthetic_field(120, 4, 3);
    let mut store = MemoryStorage::new();
    let mut cache = StagingCache::new(8 * 4 * 16);

    let input = store.store(field.view()).unwrap();
    let (out, edges) =
        running_mean_staged(&mut store, input, 12, EdgeTrim::WholeYears(12), &mut cache).unwrap();
    let staged = store.read(out).unwrap();
    store.release(input).unwrap();
    store.release(out).unwrap();
    assert_eq!(store.n_live(), 0);
    assert!(cache.peak_bytes() <= cache.capacity_bytes());

    let direct = running_mean(field.view(), 12, EdgeTrim::WholeYears(12)).unwrap();
    assert_eq!(edges, direct.edges());
    assert_eq!(&staged, direct.data());
}

#[test]
fn climatology_reused_on_new_data() {
    let calib = synthetic_field(120, 3, 1);
    let other = synthetic_field(48, 3, 2);
    let a = calc_anomaly(calib.view(), 12, None).unwrap();
    let b = calc_anomaly(other.view(), 12, Some(a.climatology().view())).unwrap();
    assert_eq!(b.climatology(), a.climatology());
    let restored = &b.anomaly().row(0) + &a.climatology().row(0);
    assert_abs_diff_eq!(restored, other.row(0).to_owned(), epsilon = 1e-12);
}

#[test]
fn too_many_modes_after_trimming() {
    let field = synthetic_field(36, 4, 5);
    let smoothed = running_mean(field.view(), 12, EdgeTrim::WholeYears(12)).unwrap();
    assert_eq!(smoothed.data().nrows(), 12);
    assert!(matches!(
        calc_eofs(smoothed.data().t(), 4),
        Err(PreprocessError::InvalidModeCount { n_modes: 4, max: 4 })
    ));
}
