use thiserror::Error;
use tracing::{debug, info, warn};

use fwrelease_assets::Fetcher;
use fwrelease_content::{parse_panel, Clock, ContentHost};
use fwrelease_loader::{
    dispatch_action, run_initialize, InitOutcome, ModuleContext, ModuleId, ModuleRegistry,
};
use fwrelease_tabs::{LoadStage, SlotContent, TabError, TabStrip};

use crate::page::PageId;
use crate::store::{NavStateStore, StoreError};

/// Action fired by the slot-level "reload" button after a fragment or
/// module load failure.
pub const RETRY_TAB_ACTION: &str = "retry-tab-load";

/// One top-level page and its tab strip.
#[derive(Debug)]
pub struct PageState {
    pub id: PageId,
    pub tabs: TabStrip,
}

/// Resolves the initial page: link token wins, then a stored index that
/// parses and is in range, then the default page 0.
/// 解析啟始頁面：連結代符優先，其次為合法的持久化索引，最後回到預設頁 0。
pub fn resolve_initial_page(hash: Option<&str>, stored: Option<&str>) -> usize {
    if let Some(page) = hash.and_then(PageId::from_hash_token) {
        return page.index();
    }
    if let Some(raw) = stored {
        if let Ok(index) = raw.trim().parse::<usize>() {
            if index < PageId::ALL.len() {
                return index;
            }
        }
    }
    0
}

/// A tab load sequence captured at its start. The generation pins the
/// navigation state the sequence belongs to; results from a superseded
/// generation are discarded instead of mutating a tab the user left.
/// 分頁載入流程的起始快照；generation 釘住其所屬的導覽狀態，過期結果將被捨棄。
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    page: usize,
    tab: usize,
    fragment: &'static str,
    module: Option<ModuleId>,
}

/// What a completed load sequence amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fragment present and the companion module initialized (the
    /// outcome says whether initialize itself succeeded; its failure is
    /// already rendered inside the module region).
    Ready(InitOutcome),
    /// Fragment present; the tab has no companion module.
    Static,
    FragmentFailed,
    ModuleFailed,
    /// Navigation moved on while the sequence was in flight.
    Superseded,
}

pub struct Shell {
    pages: Vec<PageState>,
    active_page: usize,
    hash: Option<String>,
    store: NavStateStore,
    registry: ModuleRegistry,
    fetcher: Box<dyn Fetcher>,
    clock: Box<dyn Clock>,
    clipboard: Option<String>,
    generation: u64,
    last_event: String,
}

impl Shell {
    /// Builds the shell and resolves the initial page from the launch
    /// link and the persisted value. Nothing is loaded yet; call
    /// [`start`](Self::start) once the chrome is up.
    pub fn new(
        registry: ModuleRegistry,
        fetcher: Box<dyn Fetcher>,
        clock: Box<dyn Clock>,
        store: NavStateStore,
        launch_hash: Option<&str>,
    ) -> Result<Self, ShellError> {
        let mut pages = Vec::new();
        for id in PageId::ALL {
            let tabs = TabStrip::new(id.tabs().iter().map(|tab| tab.name))?;
            pages.push(PageState { id, tabs });
        }
        let stored = store.read();
        let active_page = resolve_initial_page(launch_hash, stored.as_deref());
        info!(active_page, hash = ?launch_hash, stored = ?stored, "initial page resolved");
        Ok(Self {
            pages,
            active_page,
            hash: launch_hash.map(str::to_string),
            store,
            registry,
            fetcher,
            clock,
            clipboard: None,
            generation: 0,
            last_event: String::new(),
        })
    }

    pub fn pages(&self) -> &[PageState] {
        &self.pages
    }

    /// Read access to the module registry (diagnostics and tests).
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    pub fn active_page_id(&self) -> PageId {
        self.pages[self.active_page].id
    }

    /// The current link token (mirror of the URL hash).
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn last_event(&self) -> &str {
        &self.last_event
    }

    /// Moves pending clipboard text out for the platform clipboard.
    pub fn take_clipboard(&mut self) -> Option<String> {
        self.clipboard.take()
    }

    pub fn active_tab_index(&self) -> usize {
        self.pages[self.active_page].tabs.active()
    }

    pub fn active_slot(&self) -> &SlotContent {
        &self.pages[self.active_page].tabs.active_tab().content
    }

    /// Mutable access to the active tab's content for widget edits.
    pub fn active_host_mut(&mut self) -> Option<&mut ContentHost> {
        match &mut self.pages[self.active_page].tabs.active_tab_mut().content {
            SlotContent::Loaded(host) => Some(host),
            _ => None,
        }
    }

    /// Loads whatever the initial navigation state points at.
    pub fn start(&mut self) {
        let ticket = self.begin_tab_load();
        self.finish(ticket);
    }

    /// Transition to a page: set the index, write it through to the
    /// store, replace the link token (no history entry), and trigger the
    /// destination tab's load sequence.
    /// 切換頁面：更新索引、寫入儲存、替換連結代符（不推入歷史），並觸發載入。
    pub fn show_main_page(&mut self, index: usize) -> Result<(), ShellError> {
        let page = PageId::from_index(index).ok_or(ShellError::PageOutOfRange {
            index,
            count: PageId::ALL.len(),
        })?;
        self.active_page = index;
        self.generation += 1;
        self.store.write(&index.to_string())?;
        self.hash = Some(page.hash_token().to_string());
        self.last_event = format!("Switched to {}", page.title());
        debug!(page = page.hash_token(), "page transition persisted");

        let ticket = self.begin_tab_load();
        self.finish(ticket);
        Ok(())
    }

    /// Tab activation inside the current page. Tab selection is not
    /// persisted; only the page index survives a relaunch.
    pub fn select_tab(&mut self, tab_index: usize) -> Result<(), ShellError> {
        self.generation += 1;
        let changed = self.pages[self.active_page].tabs.select(tab_index)?;
        debug!(tab = changed.0, "tab changed");
        let ticket = self.begin_tab_load();
        self.finish(ticket);
        Ok(())
    }

    /// External navigation (the browser back/forward equivalent):
    /// recompute the resolution chain from the changed token; when the
    /// result differs, transition and fully reload the implied tab.
    pub fn handle_external_navigation(&mut self, new_hash: Option<&str>) {
        self.hash = new_hash.map(str::to_string);
        let stored = self.store.read();
        let resolved = resolve_initial_page(new_hash, stored.as_deref());
        if resolved == self.active_page {
            return;
        }
        info!(from = self.active_page, to = resolved, "external navigation");
        self.active_page = resolved;
        self.generation += 1;
        // Full reload of the implied tab's module state, not a diff.
        let active_tab = self.pages[resolved].tabs.active();
        let name = self.pages[resolved].tabs.active_tab().name.clone();
        let _ = self.pages[resolved]
            .tabs
            .set_content(active_tab, SlotContent::Placeholder(format!("Loading {name}…")));
        let ticket = self.begin_tab_load();
        self.finish(ticket);
    }

    /// Captures the active tab's load sequence at the current generation.
    pub fn begin_tab_load(&self) -> LoadTicket {
        let page = self.active_page;
        let tab = self.pages[page].tabs.active();
        let spec = &self.pages[page].id.tabs()[tab];
        LoadTicket {
            generation: self.generation,
            page,
            tab,
            fragment: spec.fragment,
            module: spec.module,
        }
    }

    /// Runs a captured load sequence: fetch the fragment once, ensure
    /// the companion module, initialize. Results belonging to a stale
    /// generation are discarded without touching any tab content.
    pub fn complete_tab_load(&mut self, ticket: LoadTicket) -> Result<LoadOutcome, ShellError> {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding superseded load"
            );
            return Ok(LoadOutcome::Superseded);
        }

        let strip = &mut self.pages[ticket.page].tabs;

        // (a) Fetch the fragment on first activation (or after a failure).
        let needs_fetch = !strip.tab(ticket.tab)?.content.is_loaded();
        if needs_fetch {
            match self.fetcher.fetch_text(ticket.fragment) {
                Ok(text) => match parse_panel(&text) {
                    Ok(host) => {
                        strip.set_content(ticket.tab, SlotContent::Loaded(host))?;
                    }
                    Err(err) => {
                        warn!(fragment = ticket.fragment, error = %err, "fragment parse failed");
                        strip.set_content(
                            ticket.tab,
                            SlotContent::Failed {
                                stage: LoadStage::Fragment,
                                message: err.to_string(),
                            },
                        )?;
                        return Ok(LoadOutcome::FragmentFailed);
                    }
                },
                Err(err) => {
                    warn!(fragment = ticket.fragment, error = %err, "fragment fetch failed");
                    strip.set_content(
                        ticket.tab,
                        SlotContent::Failed {
                            stage: LoadStage::Fragment,
                            message: err.to_string(),
                        },
                    )?;
                    return Ok(LoadOutcome::FragmentFailed);
                }
            }
        }

        // (b) Ensure the companion module; (c) initialize through the
        // lifecycle driver. The driver's return is the readiness signal.
        let Some(module) = ticket.module else {
            return Ok(LoadOutcome::Static);
        };
        let Shell {
            pages,
            registry,
            fetcher,
            clock,
            clipboard,
            ..
        } = self;
        let strip = &mut pages[ticket.page].tabs;
        let entry = match registry.ensure_loaded(module) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(module = %module, error = %err, "module load failed");
                strip.set_content(
                    ticket.tab,
                    SlotContent::Failed {
                        stage: LoadStage::Module,
                        message: err.to_string(),
                    },
                )?;
                return Ok(LoadOutcome::ModuleFailed);
            }
        };
        let SlotContent::Loaded(host) = &mut strip.tab_mut(ticket.tab)?.content else {
            return Ok(LoadOutcome::FragmentFailed);
        };
        let mut ctx = ModuleContext::new(host, fetcher.as_ref(), clock.as_ref(), clipboard);
        let outcome = run_initialize(entry, &mut ctx);
        Ok(LoadOutcome::Ready(outcome))
    }

    fn finish(&mut self, ticket: LoadTicket) {
        match self.complete_tab_load(ticket) {
            Ok(outcome) => debug!(?outcome, "tab load finished"),
            Err(err) => warn!(error = %err, "tab load errored"),
        }
    }

    /// Routes an action fired in the active tab's content. The reserved
    /// slot-level retry resets the tab and reruns the whole sequence;
    /// everything else goes to the owning module.
    pub fn fire_action(&mut self, action: &str) {
        if action == RETRY_TAB_ACTION {
            let page = self.active_page;
            let tab = self.pages[page].tabs.active();
            let name = self.pages[page].tabs.active_tab().name.clone();
            let _ = self.pages[page]
                .tabs
                .set_content(tab, SlotContent::Placeholder(format!("Loading {name}…")));
            self.generation += 1;
            let ticket = self.begin_tab_load();
            self.finish(ticket);
            return;
        }

        let page = self.active_page;
        let tab = self.pages[page].tabs.active();
        let Some(module) = self.pages[page].id.tabs()[tab].module else {
            warn!(action, "action fired on a tab without a module");
            return;
        };
        let Shell {
            pages,
            registry,
            fetcher,
            clock,
            clipboard,
            ..
        } = self;
        let Some(entry) = registry.get_mut(module) else {
            warn!(action, module = %module, "action fired before module load");
            return;
        };
        let SlotContent::Loaded(host) = &mut pages[page].tabs.tab_mut(tab).expect("active tab").content
        else {
            warn!(action, "action fired on unloaded tab content");
            return;
        };
        let mut ctx = ModuleContext::new(host, fetcher.as_ref(), clock.as_ref(), clipboard);
        dispatch_action(entry, action, &mut ctx);
        self.last_event = format!("Action: {action}");
    }

    /// Clock tick: drives timed behavior (auto sync) in every attached
    /// module whose content is mounted, active tab or not.
    pub fn tick(&mut self) {
        let Shell {
            pages,
            registry,
            fetcher,
            clock,
            clipboard,
            ..
        } = self;
        for page in pages.iter_mut() {
            for (index, spec) in page.id.tabs().iter().enumerate() {
                let Some(module) = spec.module else { continue };
                let Some(entry) = registry.get_mut(module) else {
                    continue;
                };
                let Ok(slot) = page.tabs.tab_mut(index) else {
                    continue;
                };
                let SlotContent::Loaded(host) = &mut slot.content else {
                    continue;
                };
                let mut ctx = ModuleContext::new(host, fetcher.as_ref(), clock.as_ref(), clipboard);
                if let Err(err) = entry.module.tick(&mut ctx) {
                    warn!(module = %module, error = %err, "module tick failed");
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("page index {index} out of range ({count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    Tab(#[from] TabError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_wins_over_storage() {
        assert_eq!(resolve_initial_page(Some("manual"), Some("0")), 2);
        assert_eq!(resolve_initial_page(Some("#swpm"), Some("2")), 1);
    }

    #[test]
    fn storage_is_used_when_hash_is_absent_or_unknown() {
        assert_eq!(resolve_initial_page(None, Some("1")), 1);
        assert_eq!(resolve_initial_page(Some("nowhere"), Some("2")), 2);
    }

    #[test]
    fn invalid_storage_falls_back_to_default() {
        assert_eq!(resolve_initial_page(None, Some("banana")), 0);
        assert_eq!(resolve_initial_page(None, Some("7")), 0);
        assert_eq!(resolve_initial_page(None, Some("-1")), 0);
        assert_eq!(resolve_initial_page(None, None), 0);
    }
}
