use fwrelease_loader::ModuleId;

/// Top-level pages. The order fixes the indices persisted across launches.
/// 最上層頁面；排列順序決定跨啟動持久化的索引值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageId {
    FirmwareRelease,
    SwpmNotebook,
    UserManual,
}

impl PageId {
    pub const ALL: [PageId; 3] = [
        PageId::FirmwareRelease,
        PageId::SwpmNotebook,
        PageId::UserManual,
    ];

    pub fn index(self) -> usize {
        match self {
            PageId::FirmwareRelease => 0,
            PageId::SwpmNotebook => 1,
            PageId::UserManual => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Token mirrored into the launch link, `#firmware` style.
    pub fn hash_token(self) -> &'static str {
        match self {
            PageId::FirmwareRelease => "firmware",
            PageId::SwpmNotebook => "swpm",
            PageId::UserManual => "manual",
        }
    }

    pub fn from_hash_token(token: &str) -> Option<Self> {
        let token = token.trim_start_matches('#');
        Self::ALL
            .iter()
            .copied()
            .find(|page| page.hash_token() == token)
    }

    pub fn title(self) -> &'static str {
        match self {
            PageId::FirmwareRelease => "Firmware Release",
            PageId::SwpmNotebook => "SWPM Notebook",
            PageId::UserManual => "User Manual",
        }
    }

    /// The page's tabs in display order. This is the static index → module
    /// dispatch map; tabs without a module carry static placeholder panels.
    /// 頁面分頁的顯示順序，亦即靜態的索引對應模組表。
    pub fn tabs(self) -> &'static [TabSpec] {
        const FIRMWARE: &[TabSpec] = &[
            TabSpec::module("Redmine", ModuleId::Redmine),
            TabSpec::module("FW & SHA256", ModuleId::FwSha256),
            TabSpec::module("Meeting minutes", ModuleId::MeetingMinutes),
            TabSpec::module("Create WF & Email", ModuleId::CreateWfEmail),
            TabSpec::module("Email", ModuleId::Email),
            TabSpec::module("Sync", ModuleId::Sync),
            TabSpec::module("Report", ModuleId::Report),
            TabSpec::module("PLM", ModuleId::Plm),
        ];
        const SWPM: &[TabSpec] = &[
            TabSpec::static_panel("Note1", "pages/swpm/note1.panel"),
            TabSpec::static_panel("Note2", "pages/swpm/note2.panel"),
        ];
        const USER_MANUAL: &[TabSpec] = &[
            TabSpec::module("Generate Manual", ModuleId::UserManual),
            TabSpec::static_panel("Template Library", "pages/user-manual/template-library.panel"),
            TabSpec::static_panel("Manual History", "pages/user-manual/manual-history.panel"),
        ];
        match self {
            PageId::FirmwareRelease => FIRMWARE,
            PageId::SwpmNotebook => SWPM,
            PageId::UserManual => USER_MANUAL,
        }
    }
}

/// One tab: a display name, the fragment it shows, and optionally the
/// companion module initialized after injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSpec {
    pub name: &'static str,
    pub fragment: &'static str,
    pub module: Option<ModuleId>,
}

impl TabSpec {
    const fn module(name: &'static str, module: ModuleId) -> Self {
        Self {
            name,
            fragment: module.fragment_path(),
            module: Some(module),
        }
    }

    const fn static_panel(name: &'static str, fragment: &'static str) -> Self {
        Self {
            name,
            fragment,
            module: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_and_tokens_round_trip() {
        for page in PageId::ALL {
            assert_eq!(PageId::from_index(page.index()), Some(page));
            assert_eq!(PageId::from_hash_token(page.hash_token()), Some(page));
        }
        assert_eq!(PageId::from_index(3), None);
        assert_eq!(PageId::from_hash_token("nowhere"), None);
    }

    #[test]
    fn hash_prefix_is_tolerated() {
        assert_eq!(
            PageId::from_hash_token("#manual"),
            Some(PageId::UserManual)
        );
    }

    #[test]
    fn every_page_has_tabs_with_unique_names() {
        for page in PageId::ALL {
            let tabs = page.tabs();
            assert!(!tabs.is_empty());
            for (index, tab) in tabs.iter().enumerate() {
                assert!(
                    !tabs[index + 1..].iter().any(|other| other.name == tab.name),
                    "duplicate tab name on {page:?}: {}",
                    tab.name
                );
            }
        }
    }

    #[test]
    fn firmware_page_dispatches_every_feature_module() {
        let modules: Vec<_> = PageId::FirmwareRelease
            .tabs()
            .iter()
            .filter_map(|tab| tab.module)
            .collect();
        assert_eq!(modules.len(), 8);
    }
}
