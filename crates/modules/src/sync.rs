//! Sync-source management panel. Transfers are simulated against the
//! clock; the source configuration can be exported and re-imported as JSON.
//! 同步來源管理面板；傳輸以時鐘模擬，來源設定可匯出／匯入 JSON。

use chrono::Local;
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::util::Placeholder;

const ANCHOR_SOURCES: &str = "#sync-sources";
const ANCHOR_SOURCE_SELECT: &str = "#source-select";
const ANCHOR_TOGGLE: &str = "#toggle-source";
const ANCHOR_SOURCE_URL: &str = "#source-url";
const ANCHOR_CONFIGURE: &str = "#configure-source";
const ANCHOR_TEST: &str = "#test-connection";
const ANCHOR_REMOVE: &str = "#remove-source";
const ANCHOR_ADD_NAME: &str = "#add-source-name";
const ANCHOR_ADD_TYPE: &str = "#add-source-type";
const ANCHOR_ADD: &str = "#add-source";
const ANCHOR_MANUAL: &str = "#manual-sync";
const ANCHOR_PROGRESS: &str = "#sync-progress";
const ANCHOR_AUTO: &str = "#auto-sync";
const ANCHOR_INTERVAL: &str = "#sync-interval";
const ANCHOR_HISTORY: &str = "#sync-history";
const ANCHOR_CONFIG: &str = "#config-input";
const ANCHOR_EXPORT: &str = "#export-config";
const ANCHOR_IMPORT: &str = "#import-config";
const ANCHOR_STATUS: &str = "#sync-status";

const ACTION_MANUAL: &str = "sync:manual";
const ACTION_TOGGLE: &str = "sync:toggle-source";
const ACTION_CONFIGURE: &str = "sync:configure-source";
const ACTION_TEST: &str = "sync:test-connection";
const ACTION_REMOVE: &str = "sync:remove-source";
const ACTION_ADD: &str = "sync:add-source";
const ACTION_AUTO: &str = "sync:auto-toggle";
const ACTION_EXPORT: &str = "sync:export-config";
const ACTION_IMPORT: &str = "sync:import-config";

const HISTORY_CAP: usize = 50;
const BETWEEN_SOURCES_DELAY_MS: u64 = 500;
const DEFAULT_AUTO_INTERVAL_MS: u64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Redmine,
    Plm,
    Jira,
    Database,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Redmine,
        SourceKind::Plm,
        SourceKind::Jira,
        SourceKind::Database,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SourceKind::Redmine => "redmine",
            SourceKind::Plm => "plm",
            SourceKind::Jira => "jira",
            SourceKind::Database => "database",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.key() == key)
    }

    /// Steps announced while a source of this kind is syncing.
    fn steps(self) -> &'static [&'static str] {
        match self {
            SourceKind::Redmine => {
                &["Fetching projects…", "Fetching issues…", "Updating local cache…"]
            }
            SourceKind::Plm => &[
                "Fetching product data…",
                "Downloading firmware files…",
                "Updating product database…",
            ],
            SourceKind::Jira => &["Fetching projects…", "Syncing issues…", "Updating workflows…"],
            SourceKind::Database => {
                &["Backing up data…", "Optimizing database…", "Updating indexes…"]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Connected,
    Disconnected,
    Error,
}

impl SourceStatus {
    fn label(self) -> &'static str {
        match self {
            SourceStatus::Connected => "connected",
            SourceStatus::Disconnected => "disconnected",
            SourceStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSource {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    pub enabled: bool,
    pub status: SourceStatus,
    pub last_sync: Option<String>,
}

impl SyncSource {
    fn new(id: &str, name: &str, kind: SourceKind, url: &str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            url: url.to_string(),
            enabled,
            status: SourceStatus::Disconnected,
            last_sync: None,
        }
    }
}

/// One completed manual or automatic run.
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub finished_at: String,
    pub sources: Vec<String>,
    pub duration_ms: u64,
    pub status: String,
}

/// Portable subset of a source used by export/import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub sources: Vec<SourceConfig>,
    pub auto_sync: bool,
    pub interval_ms: u64,
}

fn default_sources() -> Vec<SyncSource> {
    vec![
        SyncSource::new(
            "redmine-main",
            "Redmine Server",
            SourceKind::Redmine,
            "https://redmine.internal/api",
            true,
        ),
        SyncSource::new(
            "plm-main",
            "PLM System",
            SourceKind::Plm,
            "https://plm.internal/api",
            true,
        ),
        SyncSource::new(
            "jira-main",
            "JIRA Server",
            SourceKind::Jira,
            "https://jira.internal/rest",
            false,
        ),
        SyncSource::new(
            "local-db",
            "Local Database",
            SourceKind::Database,
            "sqlite://workbench.db",
            true,
        ),
    ]
}

pub struct SyncModule {
    sources: Vec<SyncSource>,
    history: Vec<SyncRun>,
    auto_sync: bool,
    interval_ms: u64,
    last_auto_ms: u64,
    placeholder: Placeholder,
}

impl SyncModule {
    pub fn new() -> Self {
        Self::with_placeholder(Placeholder::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_placeholder(Placeholder::from_seed(seed))
    }

    fn with_placeholder(placeholder: Placeholder) -> Self {
        Self {
            sources: Vec::new(),
            history: Vec::new(),
            auto_sync: false,
            interval_ms: DEFAULT_AUTO_INTERVAL_MS,
            last_auto_ms: 0,
            placeholder,
        }
    }

    pub fn sources(&self) -> &[SyncSource] {
        &self.sources
    }

    pub fn history(&self) -> &[SyncRun] {
        &self.history
    }

    fn selector(raw: &str) -> Selector {
        Selector::parse(raw).expect("static selector")
    }

    fn set_status(ctx: &mut ModuleContext<'_>, message: &str) -> Result<(), ModuleError> {
        let status = ctx.host.require(&Self::selector(ANCHOR_STATUS))?;
        ctx.host.set_text(status, message)?;
        Ok(())
    }

    fn selected_source_id(&self, ctx: &ModuleContext<'_>) -> Result<Option<String>, ModuleError> {
        Ok(ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_SOURCE_SELECT))?)?
            .map(str::to_string))
    }

    fn refresh_sources(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let table = ctx.host.require(&Self::selector(ANCHOR_SOURCES))?;
        let rows = self
            .sources
            .iter()
            .map(|source| {
                vec![
                    source.name.clone(),
                    source.kind.key().to_string(),
                    source.url.clone(),
                    if source.enabled { "enabled" } else { "disabled" }.to_string(),
                    source.status.label().to_string(),
                    source.last_sync.clone().unwrap_or_else(|| "never".into()),
                ]
            })
            .collect();
        ctx.host.set_table(
            table,
            ["Name", "Type", "URL", "Enabled", "Status", "Last sync"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        )?;

        let select = ctx.host.require(&Self::selector(ANCHOR_SOURCE_SELECT))?;
        let previous = ctx.host.selected_value(select)?.map(str::to_string);
        let options = self
            .sources
            .iter()
            .map(|source| SelectOption::new(source.id.clone(), source.name.clone()))
            .collect();
        ctx.host.set_options(select, options)?;
        if let Some(previous) = previous {
            ctx.host.select_value(select, &previous)?;
        }
        Ok(())
    }

    fn refresh_history(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let table = ctx.host.require(&Self::selector(ANCHOR_HISTORY))?;
        let rows = self
            .history
            .iter()
            .map(|run| {
                vec![
                    run.finished_at.clone(),
                    run.sources.join(", "),
                    format!("{} ms", run.duration_ms),
                    run.status.clone(),
                ]
            })
            .collect();
        ctx.host.set_table(
            table,
            ["Finished", "Sources", "Duration", "Status"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        )?;
        Ok(())
    }

    fn set_progress(
        ctx: &mut ModuleContext<'_>,
        fraction: f32,
        message: &str,
    ) -> Result<(), ModuleError> {
        let progress = ctx.host.require(&Self::selector(ANCHOR_PROGRESS))?;
        ctx.host.set_progress(progress, fraction, message)?;
        Ok(())
    }

    /// Runs one simulated transfer for a source: each step consumes
    /// 300–1000 ms of (possibly simulated) clock time.
    fn sync_source(&mut self, ctx: &mut ModuleContext<'_>, index: usize) {
        let kind = self.sources[index].kind;
        for step in kind.steps() {
            let delay = 300 + self.placeholder.range(0, 700);
            debug!(source = %self.sources[index].id, step, "sync step");
            ctx.clock.sleep_ms(delay);
        }
        self.sources[index].status = SourceStatus::Connected;
        self.sources[index].last_sync = Some(Local::now().format("%Y-%m-%d %H:%M").to_string());
    }

    fn run_sync(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let enabled: Vec<usize> = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, source)| source.enabled)
            .map(|(index, _)| index)
            .collect();
        if enabled.is_empty() {
            Self::set_status(ctx, "No sync sources are enabled")?;
            return Ok(());
        }

        let started = ctx.clock.now_ms();
        Self::set_progress(ctx, 0.0, "Starting synchronization…")?;
        let total = enabled.len();
        let mut names = Vec::new();
        for (position, index) in enabled.into_iter().enumerate() {
            let name = self.sources[index].name.clone();
            Self::set_progress(
                ctx,
                (position + 1) as f32 / total as f32,
                &format!("Syncing {name}…"),
            )?;
            self.sync_source(ctx, index);
            names.push(name);
            ctx.clock.sleep_ms(BETWEEN_SOURCES_DELAY_MS);
        }

        let run = SyncRun {
            finished_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            sources: names,
            duration_ms: ctx.clock.now_ms().saturating_sub(started),
            status: "completed".to_string(),
        };
        info!(sources = run.sources.len(), duration_ms = run.duration_ms, "sync completed");
        self.history.insert(0, run);
        self.history.truncate(HISTORY_CAP);

        self.refresh_sources(ctx)?;
        self.refresh_history(ctx)?;
        Self::set_progress(ctx, 1.0, "Synchronization completed successfully!")?;
        Self::set_status(ctx, &format!("Synced {total} source(s)"))
    }

    fn toggle_selected(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(id) = self.selected_source_id(ctx)? else {
            Self::set_status(ctx, "Select a source first")?;
            return Ok(());
        };
        let Some(source) = self.sources.iter_mut().find(|source| source.id == id) else {
            Self::set_status(ctx, "Source not found")?;
            return Ok(());
        };
        source.enabled = !source.enabled;
        let message = format!(
            "{} is now {}",
            source.name,
            if source.enabled { "enabled" } else { "disabled" }
        );
        self.refresh_sources(ctx)?;
        Self::set_status(ctx, &message)
    }

    /// Updates the selected source's endpoint from the URL field. The
    /// source drops back to disconnected until the next probe.
    fn configure_selected(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(id) = self.selected_source_id(ctx)? else {
            Self::set_status(ctx, "Select a source first")?;
            return Ok(());
        };
        let url_node = ctx.host.require(&Self::selector(ANCHOR_SOURCE_URL))?;
        let url = ctx.host.value_of(url_node)?.trim().to_string();
        if url.is_empty() {
            Self::set_status(ctx, "Enter the new endpoint URL first")?;
            return Ok(());
        }
        let Some(source) = self.sources.iter_mut().find(|source| source.id == id) else {
            Self::set_status(ctx, "Source not found")?;
            return Ok(());
        };
        source.url = url;
        source.status = SourceStatus::Disconnected;
        let message = format!("{} reconfigured", source.name);
        ctx.host.set_value(url_node, "")?;
        self.refresh_sources(ctx)?;
        Self::set_status(ctx, &message)
    }

    fn test_connection(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(id) = self.selected_source_id(ctx)? else {
            Self::set_status(ctx, "Select a source first")?;
            return Ok(());
        };
        let Some(index) = self.sources.iter().position(|source| source.id == id) else {
            Self::set_status(ctx, "Source not found")?;
            return Ok(());
        };
        ctx.clock.sleep_ms(200 + self.placeholder.range(0, 300));
        // Simulated probe with a deliberate failure rate.
        let reachable = self.placeholder.range(0, 10) < 8;
        self.sources[index].status = if reachable {
            SourceStatus::Connected
        } else {
            SourceStatus::Error
        };
        let name = self.sources[index].name.clone();
        self.refresh_sources(ctx)?;
        Self::set_status(
            ctx,
            &if reachable {
                format!("Connection to {name} successful")
            } else {
                format!("Connection to {name} failed")
            },
        )
    }

    fn remove_selected(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(id) = self.selected_source_id(ctx)? else {
            Self::set_status(ctx, "Select a source first")?;
            return Ok(());
        };
        let before = self.sources.len();
        self.sources.retain(|source| source.id != id);
        if self.sources.len() == before {
            Self::set_status(ctx, "Source not found")?;
            return Ok(());
        }
        self.refresh_sources(ctx)?;
        Self::set_status(ctx, &format!("Removed {id}"))
    }

    fn add_source(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let name_node = ctx.host.require(&Self::selector(ANCHOR_ADD_NAME))?;
        let name = ctx.host.value_of(name_node)?.trim().to_string();
        if name.is_empty() {
            Self::set_status(ctx, "Give the new source a name")?;
            return Ok(());
        }
        let kind = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_ADD_TYPE))?)?
            .and_then(SourceKind::from_key)
            .unwrap_or(SourceKind::Database);

        let id = slugify(&name);
        if self.sources.iter().any(|source| source.id == id) {
            Self::set_status(ctx, "A source with that name already exists")?;
            return Ok(());
        }
        self.sources.push(SyncSource::new(
            &id,
            &name,
            kind,
            &format!("https://{id}.internal/api"),
            true,
        ));
        ctx.host.set_value(name_node, "")?;
        self.refresh_sources(ctx)?;
        Self::set_status(ctx, &format!("Added {name}"))
    }

    fn toggle_auto(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let auto = ctx.host.require(&Self::selector(ANCHOR_AUTO))?;
        self.auto_sync = ctx.host.is_checked(auto)?;
        let interval_node = ctx.host.require(&Self::selector(ANCHOR_INTERVAL))?;
        let raw = ctx.host.value_of(interval_node)?.trim().to_string();
        if !raw.is_empty() {
            match raw.parse::<u64>() {
                Ok(ms) if ms >= 1_000 => self.interval_ms = ms,
                _ => {
                    Self::set_status(ctx, "Interval must be a number of milliseconds (>= 1000)")?;
                    return Ok(());
                }
            }
        }
        self.last_auto_ms = ctx.clock.now_ms();
        Self::set_status(
            ctx,
            &if self.auto_sync {
                format!("Auto sync every {} ms", self.interval_ms)
            } else {
                "Auto sync disabled".to_string()
            },
        )
    }

    /// Runs a sync when the auto-sync interval has elapsed.
    fn auto_tick(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if !self.auto_sync {
            return Ok(());
        }
        let now = ctx.clock.now_ms();
        if now.saturating_sub(self.last_auto_ms) < self.interval_ms {
            return Ok(());
        }
        self.last_auto_ms = now;
        debug!("auto sync triggered");
        self.run_sync(ctx)
    }

    fn export_config(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let config = SyncConfig {
            sources: self
                .sources
                .iter()
                .map(|source| SourceConfig {
                    id: source.id.clone(),
                    name: source.name.clone(),
                    kind: source.kind,
                    url: source.url.clone(),
                    enabled: source.enabled,
                })
                .collect(),
            auto_sync: self.auto_sync,
            interval_ms: self.interval_ms,
        };
        let json = serde_json::to_string_pretty(&config)
            .map_err(|err| ModuleError::invalid(format!("config serialization failed: {err}")))?;
        ctx.copy_to_clipboard(json);
        Self::set_status(ctx, "Configuration copied to clipboard as JSON")
    }

    fn import_config(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_CONFIG))?;
        let raw = ctx.host.value_of(input)?.trim().to_string();
        if raw.is_empty() {
            Self::set_status(ctx, "Paste a configuration JSON first")?;
            return Ok(());
        }
        let config: SyncConfig = match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "sync config import rejected");
                Self::set_status(ctx, "Invalid configuration file format")?;
                return Ok(());
            }
        };
        self.sources = config
            .sources
            .into_iter()
            .map(|source| {
                let mut restored =
                    SyncSource::new(&source.id, &source.name, source.kind, &source.url, source.enabled);
                restored.status = SourceStatus::Disconnected;
                restored
            })
            .collect();
        self.auto_sync = config.auto_sync;
        self.interval_ms = config.interval_ms.max(1_000);
        ctx.host.set_value(input, "")?;
        self.refresh_sources(ctx)?;
        Self::set_status(ctx, "Sync configuration imported successfully")
    }
}

impl Default for SyncModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for SyncModule {
    fn id(&self) -> ModuleId {
        ModuleId::Sync
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_SOURCES)
    }

    fn load_data(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.sources.is_empty() {
            self.sources = default_sources();
        }
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_MANUAL, ACTION_MANUAL),
            (ANCHOR_TOGGLE, ACTION_TOGGLE),
            (ANCHOR_CONFIGURE, ACTION_CONFIGURE),
            (ANCHOR_TEST, ACTION_TEST),
            (ANCHOR_REMOVE, ACTION_REMOVE),
            (ANCHOR_ADD, ACTION_ADD),
            (ANCHOR_AUTO, ACTION_AUTO),
            (ANCHOR_EXPORT, ACTION_EXPORT),
            (ANCHOR_IMPORT, ACTION_IMPORT),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let add_type = ctx.host.require(&Self::selector(ANCHOR_ADD_TYPE))?;
        ctx.host.set_options(
            add_type,
            SourceKind::ALL
                .iter()
                .map(|kind| SelectOption::new(kind.key(), kind.key()))
                .collect(),
        )?;
        self.refresh_sources(ctx)?;
        self.refresh_history(ctx)?;
        Self::set_progress(ctx, 0.0, "Ready")?;
        Self::set_status(
            ctx,
            &format!(
                "{} source(s), {} enabled",
                self.sources.len(),
                self.sources.iter().filter(|source| source.enabled).count()
            ),
        )
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_MANUAL => self.run_sync(ctx),
            ACTION_TOGGLE => self.toggle_selected(ctx),
            ACTION_CONFIGURE => self.configure_selected(ctx),
            ACTION_TEST => self.test_connection(ctx),
            ACTION_REMOVE => self.remove_selected(ctx),
            ACTION_ADD => self.add_source(ctx),
            ACTION_AUTO => self.toggle_auto(ctx),
            ACTION_EXPORT => self.export_config(ctx),
            ACTION_IMPORT => self.import_config(ctx),
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }

    fn tick(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.auto_tick(ctx)
    }
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwrelease_assets::MemoryFetcher;
    use fwrelease_content::{parse_panel, Clock, ContentHost, TestClock};
    use fwrelease_loader::{run_initialize, InitOutcome, LoadedModule};

    const PANEL: &str = r#"
section "Sync Sources"
  table #sync-sources
  select #source-select "Source"
  button #toggle-source "Enable/disable"
  input #source-url "Endpoint URL"
  button #configure-source "Configure"
  button #test-connection "Test connection"
  button #remove-source "Remove"
  input #add-source-name "New source name"
  select #add-source-type "Type"
  button #add-source "Add source"
section "Synchronization"
  button #manual-sync "Sync now"
  progress #sync-progress
  checkbox #auto-sync "Auto sync"
  input #sync-interval "Interval (ms)"
  table #sync-history
section "Configuration"
  input #config-input "Configuration JSON"
  button #export-config "Export"
  button #import-config "Import"
  text #sync-status
"#;

    struct Fixture {
        host: ContentHost,
        fetcher: MemoryFetcher,
        clock: TestClock,
        entry: LoadedModule,
        clipboard: Option<String>,
    }

    fn fixture() -> Fixture {
        let mut host = parse_panel(PANEL).unwrap();
        let fetcher = MemoryFetcher::new();
        let clock = TestClock::new();
        let mut entry = LoadedModule {
            module: Box::new(SyncModule::with_seed(9)),
            initialized: false,
        };
        let mut clipboard = None;
        {
            let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
            assert_eq!(run_initialize(&mut entry, &mut ctx), InitOutcome::Ready);
        }
        Fixture {
            host,
            fetcher,
            clock,
            entry,
            clipboard,
        }
    }

    fn act(fixture: &mut Fixture, action: &str) {
        let mut ctx = ModuleContext::new(
            &mut fixture.host,
            &fixture.fetcher,
            &fixture.clock,
            &mut fixture.clipboard,
        );
        fixture.entry.module.handle_action(action, &mut ctx).unwrap();
    }

    fn tick(fixture: &mut Fixture) {
        let mut ctx = ModuleContext::new(
            &mut fixture.host,
            &fixture.fetcher,
            &fixture.clock,
            &mut fixture.clipboard,
        );
        fixture.entry.module.tick(&mut ctx).unwrap();
    }

    fn status_text(fixture: &Fixture) -> String {
        let node = fixture
            .host
            .require(&Selector::parse(ANCHOR_STATUS).unwrap())
            .unwrap();
        fixture.host.text_of(node).unwrap().to_string()
    }

    #[test]
    fn manual_sync_consumes_time_and_records_history() {
        let mut fixture = fixture();
        act(&mut fixture, ACTION_MANUAL);

        // 3 enabled sources × 3 steps × >=300 ms plus spacing delays.
        assert!(fixture.clock.now_ms() >= 3 * 3 * 300);
        assert!(status_text(&fixture).contains("Synced 3"));

        let history = fixture
            .host
            .require(&Selector::parse(ANCHOR_HISTORY).unwrap())
            .unwrap();
        match &fixture.host.node(history).unwrap().body {
            fwrelease_content::NodeBody::Table { rows, .. } => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0][3], "completed");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn sync_with_everything_disabled_reports_gracefully() {
        let mut fixture = fixture();
        // Disable every default source through the panel.
        for id in ["redmine-main", "plm-main", "local-db"] {
            let select = fixture
                .host
                .require(&Selector::parse(ANCHOR_SOURCE_SELECT).unwrap())
                .unwrap();
            fixture.host.select_value(select, id).unwrap();
            act(&mut fixture, ACTION_TOGGLE);
        }
        act(&mut fixture, ACTION_MANUAL);
        assert!(status_text(&fixture).contains("No sync sources are enabled"));
    }

    #[test]
    fn add_and_remove_source_round_trip() {
        let mut fixture = fixture();
        let name = fixture
            .host
            .require(&Selector::parse(ANCHOR_ADD_NAME).unwrap())
            .unwrap();
        fixture.host.set_value(name, "Staging PLM").unwrap();
        act(&mut fixture, ACTION_ADD);
        assert!(status_text(&fixture).contains("Added Staging PLM"));

        let select = fixture
            .host
            .require(&Selector::parse(ANCHOR_SOURCE_SELECT).unwrap())
            .unwrap();
        assert!(fixture.host.select_value(select, "staging-plm").unwrap());
        act(&mut fixture, ACTION_REMOVE);
        assert!(status_text(&fixture).contains("Removed staging-plm"));
    }

    #[test]
    fn configure_updates_the_selected_source_url() {
        let mut fixture = fixture();
        let select = fixture
            .host
            .require(&Selector::parse(ANCHOR_SOURCE_SELECT).unwrap())
            .unwrap();
        fixture.host.select_value(select, "plm-main").unwrap();
        let url = fixture
            .host
            .require(&Selector::parse(ANCHOR_SOURCE_URL).unwrap())
            .unwrap();
        fixture
            .host
            .set_value(url, "https://plm-staging.internal/api")
            .unwrap();
        act(&mut fixture, ACTION_CONFIGURE);
        assert!(status_text(&fixture).contains("PLM System reconfigured"));

        act(&mut fixture, ACTION_EXPORT);
        let json = fixture.clipboard.clone().unwrap();
        assert!(json.contains("https://plm-staging.internal/api"));
    }

    #[test]
    fn config_export_import_round_trip() {
        let mut fixture = fixture();
        act(&mut fixture, ACTION_EXPORT);
        let json = fixture.clipboard.clone().expect("config in clipboard");
        assert!(json.contains("redmine-main"));

        // Wipe the sources, then restore them from the exported JSON.
        for id in ["redmine-main", "plm-main", "jira-main", "local-db"] {
            let select = fixture
                .host
                .require(&Selector::parse(ANCHOR_SOURCE_SELECT).unwrap())
                .unwrap();
            fixture.host.select_value(select, id).unwrap();
            act(&mut fixture, ACTION_REMOVE);
        }

        let input = fixture
            .host
            .require(&Selector::parse(ANCHOR_CONFIG).unwrap())
            .unwrap();
        fixture.host.set_value(input, json).unwrap();
        act(&mut fixture, ACTION_IMPORT);
        assert!(status_text(&fixture).contains("imported successfully"));

        let sources = fixture
            .host
            .require(&Selector::parse(ANCHOR_SOURCES).unwrap())
            .unwrap();
        match &fixture.host.node(sources).unwrap().body {
            fwrelease_content::NodeBody::Table { rows, .. } => assert_eq!(rows.len(), 4),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn malformed_config_is_rejected_without_state_change() {
        let mut fixture = fixture();
        let input = fixture
            .host
            .require(&Selector::parse(ANCHOR_CONFIG).unwrap())
            .unwrap();
        fixture.host.set_value(input, "{broken").unwrap();
        act(&mut fixture, ACTION_IMPORT);
        assert!(status_text(&fixture).contains("Invalid configuration"));

        let sources = fixture
            .host
            .require(&Selector::parse(ANCHOR_SOURCES).unwrap())
            .unwrap();
        match &fixture.host.node(sources).unwrap().body {
            fwrelease_content::NodeBody::Table { rows, .. } => assert_eq!(rows.len(), 4),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn auto_sync_fires_only_after_the_interval() {
        let mut fixture = fixture();
        let auto = fixture
            .host
            .require(&Selector::parse(ANCHOR_AUTO).unwrap())
            .unwrap();
        fixture.host.set_checked(auto, true).unwrap();
        let interval = fixture
            .host
            .require(&Selector::parse(ANCHOR_INTERVAL).unwrap())
            .unwrap();
        fixture.host.set_value(interval, "60000").unwrap();
        act(&mut fixture, ACTION_AUTO);

        // Immediately ticking does nothing; the interval has not passed.
        tick(&mut fixture);
        assert!(fixture.entry_history_len() == 0);

        fixture.clock.advance(60_000);
        tick(&mut fixture);
        assert_eq!(fixture.entry_history_len(), 1);
    }

    impl Fixture {
        /// Completed runs as shown in the rendered history table.
        fn entry_history_len(&self) -> usize {
            let table = self
                .host
                .require(&Selector::parse(ANCHOR_HISTORY).unwrap())
                .unwrap();
            match &self.host.node(table).unwrap().body {
                fwrelease_content::NodeBody::Table { rows, .. } => rows.len(),
                _ => 0,
            }
        }
    }
}
