use crate::frame::Frame;
use crate::strehl::StrehlResult;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Calibrating,
    SynthesizingPsf,
    MeasuringPsf,
    AnalyzingFrames,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calibrating => write!(f, "Calibrating plate scale"),
            Self::SynthesizingPsf => write!(f, "Synthesizing PSF"),
            Self::MeasuringPsf => write!(f, "Measuring ideal PSF"),
            Self::AnalyzingFrames => write!(f, "Analyzing frames"),
        }
    }
}

/// Thread-safe progress reporting for the pipelines.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (e.g. frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Reporter that ignores all progress.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// One analyzed observation.
#[derive(Clone, Debug)]
pub struct FrameAnalysis {
    /// The corrected frame with its curve of growth and profile.
    pub frame: Frame,
    pub result: StrehlResult,
}

/// Strehl ratio per radius for a sequence of cube frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrehlSeries {
    pub radii: Vec<usize>,
    /// `(1-based frame index, strehl per radius)`, in frame order.
    pub rows: Vec<(usize, Vec<f64>)>,
}
