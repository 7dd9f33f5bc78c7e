//! Lifecycle hook pipeline: typed hook points, merging verdicts, and the
//! baseline handlers the coordinator installs by default.

pub mod baseline;
pub mod pipeline;
pub mod types;

pub use baseline::{
    install_baseline, ErrorClassifierHook, TaskResultHook, TaskValidationHook, WorkflowInitHook,
    CATEGORY_RETRIES, CATEGORY_TASK_RESULTS,
};
pub use pipeline::{HookHandler, HookPipeline};
pub use types::{HookContext, HookOutcome, HookType};
