use std::fmt;

/// Identifies one feature panel. The registry is keyed by this enumeration
/// instead of string-keyed globals.
/// 識別單一功能面板；登錄表以此列舉為鍵，而非字串式全域名稱。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleId {
    Redmine,
    FwSha256,
    MeetingMinutes,
    CreateWfEmail,
    Email,
    Sync,
    Report,
    Plm,
    UserManual,
}

impl ModuleId {
    pub const ALL: [ModuleId; 9] = [
        ModuleId::Redmine,
        ModuleId::FwSha256,
        ModuleId::MeetingMinutes,
        ModuleId::CreateWfEmail,
        ModuleId::Email,
        ModuleId::Sync,
        ModuleId::Report,
        ModuleId::Plm,
        ModuleId::UserManual,
    ];

    /// Stable key used for load records and logging.
    pub fn key(self) -> &'static str {
        match self {
            ModuleId::Redmine => "redmine",
            ModuleId::FwSha256 => "fw-sha256",
            ModuleId::MeetingMinutes => "meeting-minutes",
            ModuleId::CreateWfEmail => "create-wf-email",
            ModuleId::Email => "email",
            ModuleId::Sync => "sync",
            ModuleId::Report => "report",
            ModuleId::Plm => "plm",
            ModuleId::UserManual => "user-manual",
        }
    }

    /// Human-readable panel title.
    pub fn title(self) -> &'static str {
        match self {
            ModuleId::Redmine => "Redmine",
            ModuleId::FwSha256 => "FW & SHA256",
            ModuleId::MeetingMinutes => "Meeting minutes",
            ModuleId::CreateWfEmail => "Create WF & Email",
            ModuleId::Email => "Email",
            ModuleId::Sync => "Sync",
            ModuleId::Report => "Report",
            ModuleId::Plm => "PLM",
            ModuleId::UserManual => "Generate Manual",
        }
    }

    /// Relative path of the panel fragment paired with this module.
    /// 此模組對應面板片段的相對路徑。
    pub const fn fragment_path(self) -> &'static str {
        match self {
            ModuleId::Redmine => "pages/firmware/redmine.panel",
            ModuleId::FwSha256 => "pages/firmware/fw-sha256.panel",
            ModuleId::MeetingMinutes => "pages/firmware/meeting-minutes.panel",
            ModuleId::CreateWfEmail => "pages/firmware/create-wf-email.panel",
            ModuleId::Email => "pages/firmware/email.panel",
            ModuleId::Sync => "pages/firmware/sync.panel",
            ModuleId::Report => "pages/firmware/report.panel",
            ModuleId::Plm => "pages/firmware/plm.panel",
            ModuleId::UserManual => "pages/user-manual/generate-manual.panel",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
