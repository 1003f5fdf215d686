//! Page shell: top-level navigation, persistence, and the per-tab module
//! load sequence.
//! 頁面外殼：最上層導覽、狀態持久化，以及各分頁的模組載入流程。

pub mod page;
pub mod shell;
pub mod store;

pub use page::{PageId, TabSpec};
pub use shell::{
    resolve_initial_page, LoadOutcome, LoadTicket, PageState, Shell, ShellError, RETRY_TAB_ACTION,
};
pub use store::{NavStateStore, StoreError, NAV_STATE_FILE};
