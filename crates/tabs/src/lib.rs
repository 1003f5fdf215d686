//! Tab container: an ordered list of named content slots with one active
//! entry. Inactive slots stay mounted so panel state survives switching.

use fwrelease_content::ContentHost;
use thiserror::Error;

/// Content carried by one tab slot.
#[derive(Debug)]
pub enum SlotContent {
    /// Shown before the tab's fragment has been fetched.
    Placeholder(String),
    /// The injected panel fragment.
    Loaded(ContentHost),
    /// Fragment fetch or module load failed; shown with a retry affordance.
    Failed { stage: LoadStage, message: String },
}

impl SlotContent {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SlotContent::Loaded(_))
    }
}

/// Which outer step of the tab load sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Fragment,
    Module,
}

impl LoadStage {
    pub fn describe(self) -> &'static str {
        match self {
            LoadStage::Fragment => "panel fragment",
            LoadStage::Module => "companion module",
        }
    }
}

/// One named slot.
#[derive(Debug)]
pub struct TabSlot {
    pub name: String,
    pub content: SlotContent,
}

impl TabSlot {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content: SlotContent::Placeholder(format!("Loading {name}…")),
        }
    }
}

/// Notification emitted towards the owner when the active tab changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabChanged(pub usize);

/// Stateful view over an ordered list of named content slots.
#[derive(Debug)]
pub struct TabStrip {
    tabs: Vec<TabSlot>,
    active: usize,
}

impl TabStrip {
    /// Builds a strip from tab names. Names are the lookup keys and must be
    /// unique and non-empty for the strip's lifetime.
    pub fn new<I, S>(names: I) -> Result<Self, TabError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tabs = Vec::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                return Err(TabError::EmptyName);
            }
            if tabs.iter().any(|tab: &TabSlot| tab.name == name) {
                return Err(TabError::DuplicateName(name.to_string()));
            }
            tabs.push(TabSlot::new(name));
        }
        if tabs.is_empty() {
            return Err(TabError::NoTabs);
        }
        Ok(Self { tabs, active: 0 })
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn tabs(&self) -> &[TabSlot] {
        &self.tabs
    }

    pub fn tab(&self, index: usize) -> Result<&TabSlot, TabError> {
        self.tabs.get(index).ok_or(TabError::IndexOutOfRange {
            index,
            len: self.tabs.len(),
        })
    }

    pub fn tab_mut(&mut self, index: usize) -> Result<&mut TabSlot, TabError> {
        let len = self.tabs.len();
        self.tabs
            .get_mut(index)
            .ok_or(TabError::IndexOutOfRange { index, len })
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.name == name)
    }

    /// Activates the tab at `index` and reports the change to the owner.
    /// Out-of-range indices are rejected instead of being left undefined.
    pub fn select(&mut self, index: usize) -> Result<TabChanged, TabError> {
        if index >= self.tabs.len() {
            return Err(TabError::IndexOutOfRange {
                index,
                len: self.tabs.len(),
            });
        }
        self.active = index;
        Ok(TabChanged(index))
    }

    pub fn active_tab(&self) -> &TabSlot {
        &self.tabs[self.active]
    }

    pub fn active_tab_mut(&mut self) -> &mut TabSlot {
        &mut self.tabs[self.active]
    }

    /// Replaces a slot's content (placeholder → loaded, or an error block).
    pub fn set_content(&mut self, index: usize, content: SlotContent) -> Result<(), TabError> {
        self.tab_mut(index)?.content = content;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TabError {
    #[error("a tab strip needs at least one tab")]
    NoTabs,
    #[error("tab names must not be empty")]
    EmptyName,
    #[error("duplicate tab name detected: {0}")]
    DuplicateName(String),
    #[error("tab index {index} out of range ({len} tabs)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwrelease_content::{Node, Selector};

    fn strip() -> TabStrip {
        TabStrip::new(["Redmine", "FW & SHA256", "Meeting minutes"]).unwrap()
    }

    #[test]
    fn initial_active_tab_is_zero() {
        let strip = strip();
        assert_eq!(strip.active(), 0);
        assert_eq!(strip.active_tab().name, "Redmine");
    }

    #[test]
    fn select_emits_change_notification() {
        let mut strip = strip();
        assert_eq!(strip.select(2).unwrap(), TabChanged(2));
        assert_eq!(strip.active(), 2);
    }

    #[test]
    fn select_rejects_out_of_range_index() {
        let mut strip = strip();
        let err = strip.select(3).unwrap_err();
        assert!(matches!(err, TabError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(strip.active(), 0);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = TabStrip::new(["Sync", "Sync"]).unwrap_err();
        assert!(matches!(err, TabError::DuplicateName(name) if name == "Sync"));
    }

    #[test]
    fn empty_strip_is_rejected() {
        assert!(matches!(
            TabStrip::new(Vec::<String>::new()).unwrap_err(),
            TabError::NoTabs
        ));
    }

    #[test]
    fn inactive_content_stays_mounted_across_switches() {
        let mut strip = strip();
        let mut host = ContentHost::new();
        host.insert(None, Node::input("Path").with_anchor("firmware-path"))
            .unwrap();
        strip.set_content(0, SlotContent::Loaded(host)).unwrap();

        strip.select(1).unwrap();
        strip.select(0).unwrap();

        match &strip.tab(0).unwrap().content {
            SlotContent::Loaded(host) => {
                let selector = Selector::parse("#firmware-path").unwrap();
                assert!(host.find(&selector).is_some());
            }
            other => panic!("content was torn down: {other:?}"),
        }
    }
}
