//! User-manual generation and FAQ export panel.
//! 使用手冊產生與 FAQ 匯出面板。

use std::collections::BTreeSet;

use fwrelease_assets::{load_faq, FaqEntry};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::{debug, info};

const ANCHOR_FAQ: &str = "#faq-sections";
const ANCHOR_TYPE: &str = "#manual-type";
const ANCHOR_AUDIENCE: &str = "#manual-audience";
const ANCHOR_FORMAT: &str = "#manual-format";
const ANCHOR_PREVIEW: &str = "#manual-preview";
const ANCHOR_GENERATE: &str = "#generate-manual";
const ANCHOR_OUTPUT: &str = "#manual-output";
const ANCHOR_RESET: &str = "#reset-manual";
const ANCHOR_LANG: &str = "#faq-lang";
const ANCHOR_CATEGORY: &str = "#faq-category";
const ANCHOR_TOGGLE_CATEGORY: &str = "#toggle-category";
const ANCHOR_DOWNLOAD: &str = "#download-faq";
const ANCHOR_DOWNLOAD_ALL: &str = "#download-all-faq";
const ANCHOR_STATUS: &str = "#manual-status";

const ACTION_OPTION_CHANGED: &str = "user-manual:option-changed";
const ACTION_GENERATE: &str = "user-manual:generate";
const ACTION_RESET: &str = "user-manual:reset";
const ACTION_LANG_CHANGED: &str = "user-manual:lang-changed";
const ACTION_TOGGLE_CATEGORY: &str = "user-manual:toggle-category";
const ACTION_DOWNLOAD: &str = "user-manual:download";
const ACTION_DOWNLOAD_ALL: &str = "user-manual:download-all";

const GENERATE_DELAY_MS: u64 = 900;

const MANUAL_TYPES: &[(&str, &str, u32, &[&str])] = &[
    (
        "user-guide",
        "Complete User Guide",
        24,
        &["Introduction", "Setup", "Daily operation", "Maintenance", "FAQ"],
    ),
    (
        "quick-start",
        "Quick Start Guide",
        8,
        &["Unboxing", "First boot", "Basic configuration"],
    ),
    (
        "troubleshooting",
        "Troubleshooting Guide",
        16,
        &["Diagnostics", "Common problems", "Recovery", "FAQ"],
    ),
];

const AUDIENCES: &[(&str, &str, f32)] = &[
    ("end-user", "End user", 1.0),
    ("administrator", "Administrator", 1.3),
    ("developer", "Developer", 1.5),
];

const FORMATS: &[(&str, &str)] = &[
    ("markdown", "Markdown"),
    ("html", "HTML"),
    ("txt", "Plain text"),
];

/// Estimated page count for a manual type and audience.
pub fn estimate_pages(kind: &str, audience: &str) -> u32 {
    let base = MANUAL_TYPES
        .iter()
        .find(|(value, _, _, _)| *value == kind)
        .map(|(_, _, pages, _)| *pages)
        .unwrap_or(10);
    let factor = AUDIENCES
        .iter()
        .find(|(value, _, _)| *value == audience)
        .map(|(_, _, factor)| *factor)
        .unwrap_or(1.0);
    (base as f32 * factor).ceil() as u32
}

fn manual_sections(kind: &str) -> &'static [&'static str] {
    MANUAL_TYPES
        .iter()
        .find(|(value, _, _, _)| *value == kind)
        .map(|(_, _, _, sections)| *sections)
        .unwrap_or(&[])
}

fn manual_label(kind: &str) -> &str {
    MANUAL_TYPES
        .iter()
        .find(|(value, _, _, _)| *value == kind)
        .map(|(_, label, _, _)| *label)
        .unwrap_or(kind)
}

/// Renders the manual skeleton in the chosen format, appending the FAQ
/// entries when the type carries a FAQ section.
/// 以指定格式產出手冊骨架；若該類型含 FAQ 章節則附上 FAQ 條目。
pub fn generate_manual_content(
    kind: &str,
    audience: &str,
    format: &str,
    faq: &[FaqEntry],
    lang: &str,
) -> String {
    let label = manual_label(kind);
    let sections = manual_sections(kind);
    let mut out = String::new();

    match format {
        "html" => {
            out.push_str(&format!("<h1>{label}</h1>\n"));
            out.push_str(&format!("<p>Audience: {audience}</p>\n"));
            for section in sections {
                out.push_str(&format!("<h2>{section}</h2>\n<p>…</p>\n"));
            }
        }
        "txt" => {
            out.push_str(&format!("{label}\nAudience: {audience}\n\n"));
            for section in sections {
                out.push_str(&format!("== {section} ==\n…\n\n"));
            }
        }
        _ => {
            out.push_str(&format!("# {label}\n\nAudience: {audience}\n\n"));
            for section in sections {
                out.push_str(&format!("## {section}\n\n…\n\n"));
            }
        }
    }

    if sections.contains(&"FAQ") && !faq.is_empty() {
        for entry in faq {
            let text = entry.text_for(lang);
            if text.is_empty() {
                continue;
            }
            match format {
                "html" => out.push_str(&format!("<h3>{}</h3>\n<p>{text}</p>\n", entry.category)),
                "txt" => out.push_str(&format!("[{}] {text}\n", entry.category)),
                _ => out.push_str(&format!("- **{}** — {text}\n", entry.category)),
            }
        }
    }
    out
}

pub struct UserManualModule {
    faq: Vec<FaqEntry>,
    selected_categories: BTreeSet<String>,
    language: String,
}

impl UserManualModule {
    pub fn new() -> Self {
        Self {
            faq: Vec::new(),
            selected_categories: BTreeSet::new(),
            language: "en".to_string(),
        }
    }

    fn selector(raw: &str) -> Selector {
        Selector::parse(raw).expect("static selector")
    }

    fn set_status(ctx: &mut ModuleContext<'_>, message: &str) -> Result<(), ModuleError> {
        let status = ctx.host.require(&Self::selector(ANCHOR_STATUS))?;
        ctx.host.set_text(status, message)?;
        Ok(())
    }

    fn categories(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.faq
            .iter()
            .filter(|entry| seen.insert(entry.category.clone()))
            .map(|entry| entry.category.clone())
            .collect()
    }

    fn form_choices(
        &self,
        ctx: &ModuleContext<'_>,
    ) -> Result<(String, String, String), ModuleError> {
        let kind = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_TYPE))?)?
            .unwrap_or("user-guide")
            .to_string();
        let audience = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_AUDIENCE))?)?
            .unwrap_or("end-user")
            .to_string();
        let format = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_FORMAT))?)?
            .unwrap_or("markdown")
            .to_string();
        Ok((kind, audience, format))
    }

    fn refresh_preview(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let (kind, audience, format) = self.form_choices(ctx)?;
        let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
        let sections = manual_sections(&kind);
        ctx.host.set_text(
            preview,
            format!(
                "{} · {} · {}\nEstimated pages: {}\nSections: {}",
                manual_label(&kind),
                audience,
                format,
                estimate_pages(&kind, &audience),
                sections.join(", ")
            ),
        )?;
        Ok(())
    }

    fn refresh_faq_table(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let table = ctx.host.require(&Self::selector(ANCHOR_FAQ))?;
        let rows = self
            .faq
            .iter()
            .filter(|entry| !entry.text_for(&self.language).is_empty())
            .map(|entry| {
                vec![
                    if self.selected_categories.contains(&entry.category) {
                        "[x]".to_string()
                    } else {
                        "[ ]".to_string()
                    },
                    entry.category.clone(),
                    entry.text_for(&self.language).to_string(),
                    entry.url.clone().unwrap_or_default(),
                ]
            })
            .collect();
        ctx.host.set_table(
            table,
            ["Selected", "Category", "Question", "Link"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        )?;
        Ok(())
    }

    fn generate(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let (kind, audience, format) = self.form_choices(ctx)?;
        ctx.clock.sleep_ms(GENERATE_DELAY_MS);
        let content = generate_manual_content(&kind, &audience, &format, &self.faq, &self.language);
        info!(kind = %kind, format = %format, bytes = content.len(), "manual generated");
        let output = ctx.host.require(&Self::selector(ANCHOR_OUTPUT))?;
        ctx.host.set_text(output, content)?;
        Self::set_status(
            ctx,
            &format!(
                "{} generated ({} pages estimated)",
                manual_label(&kind),
                estimate_pages(&kind, &audience)
            ),
        )
    }

    fn reset(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for anchor in [ANCHOR_TYPE, ANCHOR_AUDIENCE, ANCHOR_FORMAT] {
            let node = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_selected(node, Some(0))?;
        }
        let output = ctx.host.require(&Self::selector(ANCHOR_OUTPUT))?;
        ctx.host.set_text(output, "")?;
        self.selected_categories.clear();
        self.refresh_faq_table(ctx)?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Form reset")
    }

    fn change_language(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let lang = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_LANG))?)?
            .unwrap_or("en")
            .to_string();
        self.language = lang;
        self.refresh_faq_table(ctx)?;
        Self::set_status(ctx, &format!("FAQ language: {}", self.language))
    }

    fn toggle_category(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(category) = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_CATEGORY))?)?
            .map(str::to_string)
        else {
            Self::set_status(ctx, "Pick a category first")?;
            return Ok(());
        };
        if !self.selected_categories.remove(&category) {
            self.selected_categories.insert(category.clone());
        }
        self.refresh_faq_table(ctx)?;
        Self::set_status(
            ctx,
            &format!("{} categor(ies) selected", self.selected_categories.len()),
        )
    }

    fn download(&mut self, ctx: &mut ModuleContext<'_>, all: bool) -> Result<(), ModuleError> {
        let entries: Vec<&FaqEntry> = self
            .faq
            .iter()
            .filter(|entry| all || self.selected_categories.contains(&entry.category))
            .filter(|entry| !entry.text_for(&self.language).is_empty())
            .collect();
        if entries.is_empty() {
            Self::set_status(ctx, "Select at least one FAQ category")?;
            return Ok(());
        }
        let mut out = String::new();
        for entry in &entries {
            out.push_str(&format!(
                "[{}] {}\n",
                entry.category,
                entry.text_for(&self.language)
            ));
        }
        debug!(entries = entries.len(), "faq export prepared");
        ctx.copy_to_clipboard(out);
        Self::set_status(ctx, &format!("Exported {} FAQ entr(ies)", entries.len()))
    }
}

impl Default for UserManualModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for UserManualModule {
    fn id(&self) -> ModuleId {
        ModuleId::UserManual
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_FAQ)
    }

    fn load_data(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        // The FAQ table is required; the manual skeleton works without it.
        self.faq = load_faq(ctx.fetcher)?;
        debug!(entries = self.faq.len(), "faq table loaded");
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_TYPE, ACTION_OPTION_CHANGED),
            (ANCHOR_AUDIENCE, ACTION_OPTION_CHANGED),
            (ANCHOR_FORMAT, ACTION_OPTION_CHANGED),
            (ANCHOR_GENERATE, ACTION_GENERATE),
            (ANCHOR_RESET, ACTION_RESET),
            (ANCHOR_LANG, ACTION_LANG_CHANGED),
            (ANCHOR_TOGGLE_CATEGORY, ACTION_TOGGLE_CATEGORY),
            (ANCHOR_DOWNLOAD, ACTION_DOWNLOAD),
            (ANCHOR_DOWNLOAD_ALL, ACTION_DOWNLOAD_ALL),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let kind = ctx.host.require(&Self::selector(ANCHOR_TYPE))?;
        ctx.host.set_options(
            kind,
            MANUAL_TYPES
                .iter()
                .map(|(value, label, _, _)| SelectOption::new(*value, *label))
                .collect(),
        )?;
        ctx.host.set_selected(kind, Some(0))?;

        let audience = ctx.host.require(&Self::selector(ANCHOR_AUDIENCE))?;
        ctx.host.set_options(
            audience,
            AUDIENCES
                .iter()
                .map(|(value, label, _)| SelectOption::new(*value, *label))
                .collect(),
        )?;
        ctx.host.set_selected(audience, Some(0))?;

        let format = ctx.host.require(&Self::selector(ANCHOR_FORMAT))?;
        ctx.host.set_options(
            format,
            FORMATS
                .iter()
                .map(|(value, label)| SelectOption::new(*value, *label))
                .collect(),
        )?;
        ctx.host.set_selected(format, Some(0))?;

        let lang = ctx.host.require(&Self::selector(ANCHOR_LANG))?;
        ctx.host.set_options(
            lang,
            vec![
                SelectOption::new("en", "English"),
                SelectOption::new("zh", "中文"),
            ],
        )?;
        ctx.host.select_value(lang, &self.language)?;

        let category = ctx.host.require(&Self::selector(ANCHOR_CATEGORY))?;
        let options = self
            .categories()
            .into_iter()
            .map(|category| SelectOption::new(category.clone(), category))
            .collect();
        ctx.host.set_options(category, options)?;

        self.refresh_faq_table(ctx)?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, &format!("{} FAQ entr(ies) loaded", self.faq.len()))
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_OPTION_CHANGED => self.refresh_preview(ctx),
            ACTION_GENERATE => self.generate(ctx),
            ACTION_RESET => self.reset(ctx),
            ACTION_LANG_CHANGED => self.change_language(ctx),
            ACTION_TOGGLE_CATEGORY => self.toggle_category(ctx),
            ACTION_DOWNLOAD => self.download(ctx, false),
            ACTION_DOWNLOAD_ALL => self.download(ctx, true),
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwrelease_assets::{MemoryFetcher, FAQ_CSV_PATH};
    use fwrelease_content::{parse_panel, ContentHost, TestClock};
    use fwrelease_loader::{run_initialize, InitOutcome, LoadedModule, ERROR_ANCHOR};

    const PANEL: &str = r#"
section "Generate Manual"
  select #manual-type "Manual type"
  select #manual-audience "Audience"
  select #manual-format "Format"
  text #manual-preview
  button #generate-manual "Generate"
  text #manual-output
  button #reset-manual "Reset"
section "FAQ"
  table #faq-sections
  select #faq-lang "Language"
  select #faq-category "Category"
  button #toggle-category "Toggle category"
  button #download-faq "Download selected"
  button #download-all-faq "Download all"
  text #manual-status
"#;

    const FAQ: &str = "\
category,question_en,question_zh,url
Setup,How do I flash the firmware?,如何燒錄韌體？,https://wiki/flash
Setup,Where are release notes?,哪裡有版本說明？,
Network,How do I reset the device?,如何重設裝置？,
";

    struct Fixture {
        host: ContentHost,
        fetcher: MemoryFetcher,
        clock: TestClock,
        entry: LoadedModule,
        clipboard: Option<String>,
    }

    fn fixture() -> Fixture {
        let mut host = parse_panel(PANEL).unwrap();
        let fetcher = MemoryFetcher::new().with_text(FAQ_CSV_PATH, FAQ);
        let clock = TestClock::new();
        let mut entry = LoadedModule {
            module: Box::new(UserManualModule::new()),
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

    #[test]
    fn preview_reflects_defaults() {
        let fixture = fixture();
        let preview = fixture
            .host
            .require(&Selector::parse(ANCHOR_PREVIEW).unwrap())
            .unwrap();
        let text = fixture.host.text_of(preview).unwrap();
        assert!(text.contains("Complete User Guide"));
        assert!(text.contains("Estimated pages: 24"));
    }

    #[test]
    fn page_estimation_scales_with_audience() {
        assert_eq!(estimate_pages("user-guide", "end-user"), 24);
        assert_eq!(estimate_pages("user-guide", "developer"), 36);
        assert_eq!(estimate_pages("quick-start", "administrator"), 11);
        // Unknown inputs fall back to a small default.
        assert_eq!(estimate_pages("mystery", "end-user"), 10);
    }

    #[test]
    fn generated_markdown_includes_faq_entries() {
        let faq = vec![FaqEntry {
            category: "Setup".into(),
            english: "How do I flash the firmware?".into(),
            chinese: "如何燒錄韌體？".into(),
            url: None,
        }];
        let content = generate_manual_content("user-guide", "end-user", "markdown", &faq, "en");
        assert!(content.starts_with("# Complete User Guide"));
        assert!(content.contains("## FAQ"));
        assert!(content.contains("How do I flash the firmware?"));

        let zh = generate_manual_content("user-guide", "end-user", "markdown", &faq, "zh");
        assert!(zh.contains("如何燒錄韌體？"));
    }

    #[test]
    fn quick_start_has_no_faq_section() {
        let faq = vec![FaqEntry {
            category: "Setup".into(),
            english: "Q".into(),
            chinese: String::new(),
            url: None,
        }];
        let content = generate_manual_content("quick-start", "end-user", "markdown", &faq, "en");
        assert!(!content.contains("- **Setup**"));
        assert!(!content.contains("## FAQ"));
    }

    #[test]
    fn download_requires_a_selection_but_all_does_not() {
        let mut fixture = fixture();
        act(&mut fixture, ACTION_DOWNLOAD);
        assert!(fixture.clipboard.is_none());

        act(&mut fixture, ACTION_DOWNLOAD_ALL);
        let exported = fixture.clipboard.clone().unwrap();
        assert!(exported.contains("[Setup] How do I flash the firmware?"));
        assert!(exported.contains("[Network]"));
    }

    #[test]
    fn toggling_a_category_scopes_the_download() {
        let mut fixture = fixture();
        let category = fixture
            .host
            .require(&Selector::parse(ANCHOR_CATEGORY).unwrap())
            .unwrap();
        fixture.host.select_value(category, "Network").unwrap();
        act(&mut fixture, ACTION_TOGGLE_CATEGORY);
        act(&mut fixture, ACTION_DOWNLOAD);

        let exported = fixture.clipboard.clone().unwrap();
        assert!(exported.contains("[Network]"));
        assert!(!exported.contains("[Setup]"));
    }

    #[test]
    fn missing_faq_table_fails_into_the_error_block() {
        let mut host = parse_panel(PANEL).unwrap();
        let fetcher = MemoryFetcher::new();
        let clock = TestClock::new();
        let mut entry = LoadedModule {
            module: Box::new(UserManualModule::new()),
            initialized: false,
        };
        let mut clipboard = None;
        let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
        assert_eq!(run_initialize(&mut entry, &mut ctx), InitOutcome::Failed);
        assert!(ctx
            .host
            .find(&Selector::parse(&format!("#{ERROR_ANCHOR}")).unwrap())
            .is_some());
    }

    #[test]
    fn txt_format_uses_plain_section_markers() {
        let content = generate_manual_content("quick-start", "developer", "txt", &[], "en");
        assert!(content.contains("== First boot =="));
    }
}
