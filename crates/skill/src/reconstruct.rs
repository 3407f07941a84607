//! Bridges per-trial EOF-space output to contiguous physical series.

use ndarray::{Array2, ArrayView2, ArrayView3, s};

use crate::error::SkillError;

/// Maps every trial's forecast back to physical space and stacks the trials
/// along time.
///
/// `forecasts` is `(trials x modes x test_len)` and `eofs` is
/// `(trials x space x modes)`. Trial `i` contributes
/// `forecasts[i]ᵀ · eofs[i]ᵀ` as rows `[i * test_len, (i + 1) * test_len)`.
pub fn reconstruct_trial_physical(
    forecasts: ArrayView3<'_, f64>,
    eofs: ArrayView3<'_, f64>,
) -> Result<Array2<f64>, SkillError> {
    let (n_trials, n_modes, test_len) = forecasts.dim();
    let (eof_trials, n_space, eof_modes) = eofs.dim();
    if eof_trials != n_trials {
        return Err(SkillError::Shape {
            context: "trials in eofs",
            expected: n_trials,
            got: eof_trials,
        });
    }
    if eof_modes != n_modes {
        return Err(SkillError::Shape {
            context: "modes in eofs",
            expected: n_modes,
            got: eof_modes,
        });
    }

    let mut out = Array2::<f64>::zeros((n_trials * test_len, n_space));
    for (i, (trial, eof)) in forecasts
        .outer_iter()
        .zip(eofs.outer_iter())
        .enumerate()
    {
        out.slice_mut(s![i * test_len..(i + 1) * test_len, ..])
            .assign(&trial.t().dot(&eof.t()));
    }
    Ok(out)
}

/// Concatenates the observation windows matching each trial's forecasts.
///
/// For start index `s`, the window is rows `[s + lag, s + lag + test_len)` of
/// `obs`, in the same order as `starts`.
///
/// # Errors
///
/// Returns [`SkillError::Alignment`] if any window runs past the end of
/// `obs`.
pub fn assemble_observation_series(
    obs: ArrayView2<'_, f64>,
    starts: &[usize],
    lag: usize,
    test_len: usize,
) -> Result<Array2<f64>, SkillError> {
    let mut out = Array2::<f64>::zeros((starts.len() * test_len, obs.ncols()));
    for (i, &start) in starts.iter().enumerate() {
        let begin = start + lag;
        let end = begin + test_len;
        if end > obs.nrows() {
            return Err(SkillError::Alignment {
                start,
                lag,
                end,
                available: obs.nrows(),
            });
        }
        out.slice_mut(s![i * test_len..(i + 1) * test_len, ..])
            .assign(&obs.slice(s![begin..end, ..]));
    }
    Ok(out)
}
