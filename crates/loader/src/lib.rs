//! Module loading and lifecycle for the workbench feature panels.
//! 工作台功能面板的模組載入與生命週期管理。
//!
//! Panels register a factory per [`ModuleId`]; the registry constructs each
//! panel's singleton at most once per process, and the lifecycle driver runs
//! the anchor-wait → load-data → bind-events → render sequence on behalf of
//! every panel. The driver's return value is the readiness signal; there are
//! no settle timers anywhere in the pipeline.

pub mod id;
pub mod lifecycle;
pub mod module;
pub mod registry;

pub use id::ModuleId;
pub use lifecycle::{dispatch_action, run_initialize, InitOutcome, ERROR_ANCHOR, RETRY_ACTION};
pub use module::{FeatureModule, ModuleContext, ModuleError};
pub use registry::{LoadedModule, LoaderError, ModuleFactory, ModuleRegistry};
