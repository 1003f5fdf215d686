//! The feature panels of the workbench, one module per tab.
//! 工作台的功能面板，每個分頁對應一個模組。
//!
//! Every panel implements the loader's capability interface and keeps its
//! own in-memory state; panels never talk to each other, only to their own
//! content region. All network-ish effects are simulated through the clock.

pub mod create_wf_email;
pub mod email;
pub mod fw_sha256;
pub mod meeting_minutes;
pub mod plm;
pub mod redmine;
pub mod report;
pub mod sync;
pub mod user_manual;
pub mod util;

pub use create_wf_email::CreateWfEmailModule;
pub use email::EmailModule;
pub use fw_sha256::FwSha256Module;
pub use meeting_minutes::MeetingMinutesModule;
pub use plm::PlmModule;
pub use redmine::RedmineModule;
pub use report::ReportModule;
pub use sync::SyncModule;
pub use user_manual::UserManualModule;

use fwrelease_loader::{LoaderError, ModuleId, ModuleRegistry};

/// Registers the factory for every panel. The registry still constructs
/// each singleton lazily, on the first `ensure_loaded`.
/// 為每個面板註冊工廠函式；單例仍於第一次 `ensure_loaded` 時才建構。
pub fn register_all(registry: &mut ModuleRegistry) -> Result<(), LoaderError> {
    registry.register(ModuleId::Redmine, Box::new(|| Ok(Box::new(RedmineModule::new()))))?;
    registry.register(
        ModuleId::FwSha256,
        Box::new(|| Ok(Box::new(FwSha256Module::new()))),
    )?;
    registry.register(
        ModuleId::MeetingMinutes,
        Box::new(|| Ok(Box::new(MeetingMinutesModule::new()))),
    )?;
    registry.register(
        ModuleId::CreateWfEmail,
        Box::new(|| Ok(Box::new(CreateWfEmailModule::new()))),
    )?;
    registry.register(ModuleId::Email, Box::new(|| Ok(Box::new(EmailModule::new()))))?;
    registry.register(ModuleId::Sync, Box::new(|| Ok(Box::new(SyncModule::new()))))?;
    registry.register(ModuleId::Report, Box::new(|| Ok(Box::new(ReportModule::new()))))?;
    registry.register(ModuleId::Plm, Box::new(|| Ok(Box::new(PlmModule::new()))))?;
    registry.register(
        ModuleId::UserManual,
        Box::new(|| Ok(Box::new(UserManualModule::new()))),
    )?;
    Ok(())
}
