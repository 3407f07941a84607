//! Output type for LIM forecasts.

use lim_preprocess::{EofBasis, StageRecord};
use ndarray::{Array2, Array3, Axis};

use crate::error::LimError;
use crate::propagator::Propagator;

/// Result of a [`Lim::forecast`](crate::Lim::forecast) call.
///
/// The forecast stays in EOF space; [`Forecast::physical`] maps it back to
/// locations on demand.
#[derive(Debug, Clone)]
pub struct Forecast {
    tensor: Array3<f64>,
    eofs: EofBasis,
    climatology: Array2<f64>,
    initial_state: Array2<f64>,
    lead_times: Vec<u32>,
    propagators: Vec<Propagator>,
    base_propagator: Option<Propagator>,
    calibration_record: StageRecord,
    initial_record: StageRecord,
}

impl Forecast {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tensor: Array3<f64>,
        eofs: EofBasis,
        climatology: Array2<f64>,
        initial_state: Array2<f64>,
        lead_times: Vec<u32>,
        propagators: Vec<Propagator>,
        base_propagator: Option<Propagator>,
        calibration_record: StageRecord,
        initial_record: StageRecord,
    ) -> Self {
        Self {
            tensor,
            eofs,
            climatology,
            initial_state,
            lead_times,
            propagators,
            base_propagator,
            calibration_record,
            initial_record,
        }
    }

    /// EOF-space forecasts, `(leads x modes x samples)`.
    pub fn tensor(&self) -> &Array3<f64> {
        &self.tensor
    }

    /// Consumes the result, returning the forecast tensor.
    pub fn into_tensor(self) -> Array3<f64> {
        self.tensor
    }

    /// EOF basis fitted to the calibration data.
    pub fn eofs(&self) -> &EofBasis {
        &self.eofs
    }

    /// Climatology derived from (or supplied for) the calibration data.
    pub fn climatology(&self) -> &Array2<f64> {
        &self.climatology
    }

    /// Initial state projected into EOF space, `(modes x samples)`.
    pub fn initial_state(&self) -> &Array2<f64> {
        &self.initial_state
    }

    /// Lead times in window units, in request order.
    pub fn lead_times(&self) -> &[u32] {
        &self.lead_times
    }

    /// Propagator used for each lead time.
    pub fn propagators(&self) -> &[Propagator] {
        &self.propagators
    }

    /// The one-window propagator, present in lag-1 power mode.
    pub fn base_propagator(&self) -> Option<&Propagator> {
        self.base_propagator.as_ref()
    }

    /// Stages applied to the calibration data.
    pub fn calibration_record(&self) -> &StageRecord {
        &self.calibration_record
    }

    /// Stages applied to the initial data.
    pub fn initial_record(&self) -> &StageRecord {
        &self.initial_record
    }

    /// Number of forecast samples per lead.
    pub fn n_samples(&self) -> usize {
        self.tensor.len_of(Axis(2))
    }

    /// Reconstructs physical-space forecasts, `(leads x samples x space)`.
    pub fn physical(&self) -> Result<Array3<f64>, LimError> {
        let (n_leads, _, n_samples) = self.tensor.dim();
        let mut out = Array3::zeros((n_leads, n_samples, self.eofs.n_space()));
        for (lead, mut slab) in out.outer_iter_mut().enumerate() {
            let coeffs = self.tensor.index_axis(Axis(0), lead);
            slab.assign(&self.eofs.reconstruct(coeffs)?);
        }
        Ok(out)
    }
}
