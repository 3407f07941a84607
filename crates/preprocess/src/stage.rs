//! Explicit record of the transforms applied to a series.

use crate::running_mean::TrimEdges;

/// A preprocessing stage applied to a time x space matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Unmodified input.
    Raw,
    /// Running-mean smoothed with edge trimming.
    RunningMean,
    /// Climatology removed.
    Anomaly,
    /// Linear trend removed along the time axis.
    Detrended,
    /// Columns scaled by `sqrt(|cos(lat)|)`.
    AreaWeighted,
    /// Projected into a truncated EOF basis.
    EofProjected,
}

impl Stage {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::RunningMean => "running_mean",
            Stage::Anomaly => "anomaly",
            Stage::Detrended => "detrended",
            Stage::AreaWeighted => "area_weighted",
            Stage::EofProjected => "eof_projected",
        }
    }
}

/// Metadata threaded alongside the arrays of a preprocessing chain.
///
/// Holds the ordered list of applied stages and the trim edges currently in
/// effect relative to the raw series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    stages: Vec<Stage>,
    edges: TrimEdges,
}

impl StageRecord {
    /// Starts a record for raw, untrimmed data.
    pub fn new() -> Self {
        Self {
            stages: vec![Stage::Raw],
            edges: TrimEdges::none(),
        }
    }

    /// Returns a new record with `stage` appended.
    pub fn then(&self, stage: Stage) -> Self {
        let mut stages = self.stages.clone();
        stages.push(stage);
        Self {
            stages,
            edges: self.edges,
        }
    }

    /// Returns a new record with `stage` appended and the trim edges replaced.
    pub fn then_trimmed(&self, stage: Stage, edges: TrimEdges) -> Self {
        let mut next = self.then(stage);
        next.edges = edges;
        next
    }

    /// The most recently applied stage.
    pub fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Raw)
    }

    /// All applied stages, oldest first.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Whether `stage` has been applied.
    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Trim edges relative to the raw series.
    pub fn edges(&self) -> TrimEdges {
        self.edges
    }
}

impl Default for StageRecord {
    fn default() -> Self {
        Self::new()
    }
}
