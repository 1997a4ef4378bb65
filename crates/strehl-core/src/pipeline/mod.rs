pub mod config;
mod orchestrator;
mod reference;
mod types;

pub use orchestrator::{analyze_frame, analyze_frame_found, analyze_series};
pub use reference::ReferencePsf;
pub use types::{FrameAnalysis, NoOpReporter, PipelineStage, ProgressReporter, StrehlSeries};
