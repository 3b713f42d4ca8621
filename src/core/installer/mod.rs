pub mod pipeline;
pub mod step;

pub use pipeline::InstallPipeline;
pub use step::{StepKind, StepResult, StepSequencer};
