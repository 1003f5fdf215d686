use thiserror::Error;

use fwrelease_assets::{CatalogError, FaqError, FetchError, Fetcher};
use fwrelease_content::{ContentHost, Clock, HostError, Selector, WaitError};

use crate::id::ModuleId;

/// Everything a panel may touch while initializing or handling an action:
/// its own content region, the asset fetcher, the clock, and the clipboard
/// slot the GUI mirrors to the system clipboard.
/// 面板初始化或處理動作時可使用的環境：內容區、資源抓取器、時鐘與剪貼簿。
pub struct ModuleContext<'a> {
    pub host: &'a mut ContentHost,
    pub fetcher: &'a dyn Fetcher,
    pub clock: &'a dyn Clock,
    pub clipboard: &'a mut Option<String>,
}

impl<'a> ModuleContext<'a> {
    pub fn new(
        host: &'a mut ContentHost,
        fetcher: &'a dyn Fetcher,
        clock: &'a dyn Clock,
        clipboard: &'a mut Option<String>,
    ) -> Self {
        Self {
            host,
            fetcher,
            clock,
            clipboard,
        }
    }

    /// Places text into the clipboard slot.
    pub fn copy_to_clipboard(&mut self, text: impl Into<String>) {
        *self.clipboard = Some(text.into());
    }
}

/// Capability interface every feature panel implements. The shell-side
/// driver owns the orchestration; panels only provide the capabilities.
/// 每個功能面板實作的能力介面；流程編排由驅動器負責。
pub trait FeatureModule {
    fn id(&self) -> ModuleId;

    /// Anchor node the panel fragment must provide before the lifecycle may
    /// proceed.
    fn anchor(&self) -> Selector;

    /// Loads whatever static data the panel needs.
    fn load_data(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError>;

    /// Registers action bindings. Re-binding replaces, so repeated
    /// initialization never duplicates handlers.
    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError>;

    /// Produces the panel's initial view.
    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError>;

    /// Handles a fired action previously registered in `bind_events`.
    fn handle_action(&mut self, action: &str, ctx: &mut ModuleContext<'_>)
        -> Result<(), ModuleError>;

    /// Periodic clock tick from the shell. Panels with timed behavior
    /// (auto sync) override this; the default does nothing.
    fn tick(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Failures raised inside a panel's lifecycle or action handlers. These are
/// rendered into the panel's own region and never escalated to the shell.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Faq(#[from] FaqError),
    #[error("unknown action '{action}' for module {module}")]
    UnknownAction { module: ModuleId, action: String },
    #[error("{0}")]
    Invalid(String),
}

impl ModuleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ModuleError::Invalid(message.into())
    }
}
