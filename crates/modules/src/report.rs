//! Report generation panel. Report data is synthesized from templates;
//! the CSV export is real, the PDF/Excel exports are simulated.
//! 報表產生面板；資料依範本合成，CSV 匯出為真實輸出，PDF/Excel 為模擬。

use chrono::{Duration, Local, NaiveDate};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::util::Placeholder;

const ANCHOR_TEMPLATE: &str = "#report-template-select";
const ANCHOR_DAYS: &str = "#param-days";
const ANCHOR_DESCRIPTION: &str = "#template-description";
const ANCHOR_GENERATE: &str = "#generate-report";
const ANCHOR_SUMMARY: &str = "#report-summary";
const ANCHOR_DETAILS: &str = "#report-details";
const ANCHOR_EXPORT_CSV: &str = "#export-csv";
const ANCHOR_EXPORT_PDF: &str = "#export-pdf-report";
const ANCHOR_EXPORT_EXCEL: &str = "#export-excel-report";
const ANCHOR_HISTORY: &str = "#report-history";
const ANCHOR_HISTORY_SELECT: &str = "#history-select";
const ANCHOR_VIEW_REPORT: &str = "#view-report";
const ANCHOR_DELETE_REPORT: &str = "#delete-report";
const ANCHOR_SCHEDULE_EMAIL: &str = "#schedule-email";
const ANCHOR_SCHEDULE_FREQ: &str = "#schedule-frequency";
const ANCHOR_SCHEDULE: &str = "#schedule-report";
const ANCHOR_STATUS: &str = "#report-status";

const ACTION_TEMPLATE_CHANGED: &str = "report:template-changed";
const ACTION_GENERATE: &str = "report:generate";
const ACTION_EXPORT_CSV: &str = "report:export-csv";
const ACTION_EXPORT_PDF: &str = "report:export-pdf";
const ACTION_EXPORT_EXCEL: &str = "report:export-excel";
const ACTION_VIEW: &str = "report:view-history";
const ACTION_DELETE: &str = "report:delete-history";
const ACTION_SCHEDULE: &str = "report:schedule";

const GENERATE_DELAY_MS: u64 = 1_000;
const EXPORT_DELAY_MS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub default_days: u32,
}

/// The built-in template table.
pub static TEMPLATES: Lazy<Vec<ReportTemplate>> = Lazy::new(|| {
    vec![
        ReportTemplate {
            id: "firmware_summary",
            name: "Firmware Summary",
            description: "Release counts, verification status, and a daily build timeline.",
            default_days: 30,
        },
        ReportTemplate {
            id: "test_results",
            name: "Test Results",
            description: "Pass rates per test type and the defect trend.",
            default_days: 30,
        },
        ReportTemplate {
            id: "issue_tracking",
            name: "Issue Tracking",
            description: "Open and resolved issues grouped by severity.",
            default_days: 14,
        },
        ReportTemplate {
            id: "performance_metrics",
            name: "Performance Metrics",
            description: "Throughput and latency placeholders per product family.",
            default_days: 7,
        },
    ]
});

/// A generated report: summary cards, a per-day series, and detail rows.
#[derive(Debug, Clone)]
pub struct Report {
    pub template_id: String,
    pub generated_on: NaiveDate,
    pub summary: Vec<(String, String)>,
    pub detail_headers: Vec<String>,
    pub details: Vec<Vec<String>>,
}

/// Synthesizes report data for a template over the trailing `days` window.
/// 依範本合成最近 `days` 天的報表資料。
pub fn generate_report(
    template: &ReportTemplate,
    days: u32,
    today: NaiveDate,
    placeholder: &mut Placeholder,
) -> Report {
    let days = days.clamp(1, 365);
    match template.id {
        "test_results" => {
            let total = 1_000 + placeholder.range(0, 500);
            let failed = placeholder.range(10, 80);
            let pass_rate = 100.0 * (total - failed) as f64 / total as f64;
            Report {
                template_id: template.id.to_string(),
                generated_on: today,
                summary: vec![
                    ("Total tests".into(), total.to_string()),
                    ("Pass rate".into(), format!("{pass_rate:.1}%")),
                    ("Defects".into(), failed.to_string()),
                    ("Window".into(), format!("{days} days")),
                ],
                detail_headers: vec!["Type".into(), "Pass rate".into(), "Runs".into()],
                details: ["functional", "performance", "security", "regression"]
                    .iter()
                    .map(|kind| {
                        vec![
                            kind.to_string(),
                            format!("{}.{}%", placeholder.range(88, 99), placeholder.range(0, 9)),
                            placeholder.range(50, 400).to_string(),
                        ]
                    })
                    .collect(),
            }
        }
        "issue_tracking" => {
            let open = placeholder.range(20, 60);
            let resolved = placeholder.range(30, 90);
            Report {
                template_id: template.id.to_string(),
                generated_on: today,
                summary: vec![
                    ("Open issues".into(), open.to_string()),
                    ("Resolved".into(), resolved.to_string()),
                    ("Window".into(), format!("{days} days")),
                ],
                detail_headers: vec!["Severity".into(), "Open".into(), "Resolved".into()],
                details: ["critical", "major", "minor", "trivial"]
                    .iter()
                    .map(|severity| {
                        vec![
                            severity.to_string(),
                            placeholder.range(0, 20).to_string(),
                            placeholder.range(0, 30).to_string(),
                        ]
                    })
                    .collect(),
            }
        }
        "performance_metrics" => Report {
            template_id: template.id.to_string(),
            generated_on: today,
            summary: vec![
                (
                    "Avg throughput".into(),
                    format!("{} Mbps", placeholder.range(800, 1800)),
                ),
                (
                    "Avg latency".into(),
                    format!("{}.{} ms", placeholder.range(1, 9), placeholder.range(0, 9)),
                ),
                ("Window".into(), format!("{days} days")),
            ],
            detail_headers: vec!["Family".into(), "Throughput".into(), "Latency".into()],
            details: ["router", "switch", "firewall", "wireless"]
                .iter()
                .map(|family| {
                    vec![
                        family.to_string(),
                        format!("{} Mbps", placeholder.range(500, 2000)),
                        format!("{} ms", placeholder.range(1, 15)),
                    ]
                })
                .collect(),
        },
        // firmware_summary and anything unrecognized share the default shape.
        _ => {
            let mut details = Vec::new();
            for offset in 0..days.min(10) {
                let date = today - Duration::days(offset as i64);
                details.push(vec![
                    date.format("%Y-%m-%d").to_string(),
                    placeholder.range(0, 6).to_string(),
                    placeholder.range(0, 3).to_string(),
                ]);
            }
            Report {
                template_id: template.id.to_string(),
                generated_on: today,
                summary: vec![
                    ("Total firmwares".into(), placeholder.range(30, 60).to_string()),
                    ("Active products".into(), placeholder.range(8, 16).to_string()),
                    ("Pending releases".into(), placeholder.range(0, 6).to_string()),
                    ("Critical issues".into(), placeholder.range(0, 4).to_string()),
                ],
                detail_headers: vec!["Date".into(), "Builds".into(), "Releases".into()],
                details,
            }
        }
    }
}

/// Serializes the report's detail rows as CSV.
pub fn report_to_csv(report: &Report) -> Result<String, ModuleError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&report.detail_headers)
        .map_err(|err| ModuleError::invalid(format!("csv export failed: {err}")))?;
    for row in &report.details {
        writer
            .write_record(row)
            .map_err(|err| ModuleError::invalid(format!("csv export failed: {err}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ModuleError::invalid(format!("csv export failed: {err}")))?;
    String::from_utf8(bytes).map_err(|err| ModuleError::invalid(format!("csv export failed: {err}")))
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    id: String,
    template: String,
    date: String,
    report: Report,
}

pub struct ReportModule {
    current: Option<Report>,
    history: Vec<HistoryEntry>,
    generated: u32,
    placeholder: Placeholder,
}

impl ReportModule {
    pub fn new() -> Self {
        Self::with_placeholder(Placeholder::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_placeholder(Placeholder::from_seed(seed))
    }

    fn with_placeholder(placeholder: Placeholder) -> Self {
        Self {
            current: None,
            history: Vec::new(),
            generated: 0,
            placeholder,
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

    fn selected_template(&self, ctx: &ModuleContext<'_>) -> Result<Option<ReportTemplate>, ModuleError> {
        let id = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_TEMPLATE))?)?
            .map(str::to_string);
        Ok(id.and_then(|id| TEMPLATES.iter().copied().find(|template| template.id == id)))
    }

    fn on_template_changed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let description = ctx.host.require(&Self::selector(ANCHOR_DESCRIPTION))?;
        match self.selected_template(ctx)? {
            Some(template) => {
                ctx.host.set_text(description, template.description)?;
                let days = ctx.host.require(&Self::selector(ANCHOR_DAYS))?;
                if ctx.host.value_of(days)?.trim().is_empty() {
                    ctx.host.set_value(days, template.default_days.to_string())?;
                }
                let generate = ctx.host.require(&Self::selector(ANCHOR_GENERATE))?;
                ctx.host.set_enabled(generate, true)?;
            }
            None => {
                ctx.host.set_text(description, "Pick a report template…")?;
                let generate = ctx.host.require(&Self::selector(ANCHOR_GENERATE))?;
                ctx.host.set_enabled(generate, false)?;
            }
        }
        Ok(())
    }

    fn generate(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(template) = self.selected_template(ctx)? else {
            Self::set_status(ctx, "Please select a report template")?;
            return Ok(());
        };
        let days_node = ctx.host.require(&Self::selector(ANCHOR_DAYS))?;
        let days = ctx
            .host
            .value_of(days_node)?
            .trim()
            .parse::<u32>()
            .unwrap_or(template.default_days);

        // Stand-in for the data-collection work.
        ctx.clock.sleep_ms(GENERATE_DELAY_MS);
        let report = generate_report(
            &template,
            days,
            Local::now().date_naive(),
            &mut self.placeholder,
        );
        info!(template = template.id, days, "report generated");

        Self::render_report(ctx, template.name, &report)?;
        self.generated += 1;
        self.history.insert(
            0,
            HistoryEntry {
                id: format!("REP-{:03}", self.generated),
                template: template.name.to_string(),
                date: report.generated_on.format("%Y-%m-%d").to_string(),
                report: report.clone(),
            },
        );
        self.current = Some(report);
        self.refresh_history(ctx)?;
        Self::set_status(ctx, &format!("{} ready", template.name))
    }

    fn render_report(
        ctx: &mut ModuleContext<'_>,
        template_name: &str,
        report: &Report,
    ) -> Result<(), ModuleError> {
        let summary_node = ctx.host.require(&Self::selector(ANCHOR_SUMMARY))?;
        let summary_text = report
            .summary
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        ctx.host.set_text(
            summary_node,
            format!(
                "{template_name} — generated {}\n{summary_text}",
                report.generated_on.format("%Y-%m-%d")
            ),
        )?;
        let details_node = ctx.host.require(&Self::selector(ANCHOR_DETAILS))?;
        ctx.host
            .set_table(details_node, report.detail_headers.clone(), report.details.clone())?;
        Ok(())
    }

    fn refresh_history(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let table = ctx.host.require(&Self::selector(ANCHOR_HISTORY))?;
        let rows = self
            .history
            .iter()
            .map(|entry| {
                vec![
                    entry.id.clone(),
                    entry.template.clone(),
                    entry.date.clone(),
                    entry.report.details.len().to_string(),
                ]
            })
            .collect();
        ctx.host.set_table(
            table,
            ["ID", "Template", "Date", "Rows"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        )?;

        let select = ctx.host.require(&Self::selector(ANCHOR_HISTORY_SELECT))?;
        let previous = ctx.host.selected_value(select)?.map(str::to_string);
        let options = self
            .history
            .iter()
            .map(|entry| {
                SelectOption::new(entry.id.clone(), format!("{} ({})", entry.id, entry.template))
            })
            .collect();
        ctx.host.set_options(select, options)?;
        if let Some(previous) = previous {
            ctx.host.select_value(select, &previous)?;
        }
        Ok(())
    }

    fn view_history(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let select = ctx.host.require(&Self::selector(ANCHOR_HISTORY_SELECT))?;
        let Some(id) = ctx.host.selected_value(select)?.map(str::to_string) else {
            Self::set_status(ctx, "Pick a report from the history first")?;
            return Ok(());
        };
        let Some(entry) = self.history.iter().find(|entry| entry.id == id).cloned() else {
            Self::set_status(ctx, "Report not found")?;
            return Ok(());
        };
        Self::render_report(ctx, &entry.template, &entry.report)?;
        self.current = Some(entry.report);
        Self::set_status(ctx, &format!("Showing {id}"))
    }

    fn delete_history(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let select = ctx.host.require(&Self::selector(ANCHOR_HISTORY_SELECT))?;
        let Some(id) = ctx.host.selected_value(select)?.map(str::to_string) else {
            Self::set_status(ctx, "Pick a report from the history first")?;
            return Ok(());
        };
        let before = self.history.len();
        self.history.retain(|entry| entry.id != id);
        if self.history.len() == before {
            Self::set_status(ctx, "Report not found")?;
            return Ok(());
        }
        self.refresh_history(ctx)?;
        Self::set_status(ctx, &format!("Deleted {id}"))
    }

    fn export_csv(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(report) = self.current.as_ref() else {
            Self::set_status(ctx, "Please generate a report first")?;
            return Ok(());
        };
        let csv = report_to_csv(report)?;
        ctx.copy_to_clipboard(csv);
        Self::set_status(ctx, "CSV export copied to clipboard")
    }

    fn export_simulated(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        format: &str,
    ) -> Result<(), ModuleError> {
        if self.current.is_none() {
            Self::set_status(ctx, "Please generate a report first")?;
            return Ok(());
        }
        ctx.clock.sleep_ms(EXPORT_DELAY_MS);
        debug!(format, "simulated report export");
        Self::set_status(ctx, &format!("{format} export completed (simulated)"))
    }

    fn schedule(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.current.is_none() {
            Self::set_status(ctx, "Generate a report first to use as a template")?;
            return Ok(());
        }
        let email = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_SCHEDULE_EMAIL))?)?
            .trim()
            .to_string();
        if !crate::util::is_valid_email(&email) {
            Self::set_status(ctx, "Enter a valid delivery address")?;
            return Ok(());
        }
        let frequency = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_SCHEDULE_FREQ))?)?
            .unwrap_or("weekly")
            .to_string();
        Self::set_status(
            ctx,
            &format!("Report scheduled {frequency}, delivery to {email} (simulated)"),
        )
    }
}

impl Default for ReportModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for ReportModule {
    fn id(&self) -> ModuleId {
        ModuleId::Report
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_TEMPLATE)
    }

    fn load_data(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        // Templates are a built-in table; nothing to fetch.
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_TEMPLATE, ACTION_TEMPLATE_CHANGED),
            (ANCHOR_GENERATE, ACTION_GENERATE),
            (ANCHOR_EXPORT_CSV, ACTION_EXPORT_CSV),
            (ANCHOR_EXPORT_PDF, ACTION_EXPORT_PDF),
            (ANCHOR_EXPORT_EXCEL, ACTION_EXPORT_EXCEL),
            (ANCHOR_VIEW_REPORT, ACTION_VIEW),
            (ANCHOR_DELETE_REPORT, ACTION_DELETE),
            (ANCHOR_SCHEDULE, ACTION_SCHEDULE),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let select = ctx.host.require(&Self::selector(ANCHOR_TEMPLATE))?;
        ctx.host.set_options(
            select,
            TEMPLATES
                .iter()
                .map(|template| SelectOption::new(template.id, template.name))
                .collect(),
        )?;
        let frequency = ctx.host.require(&Self::selector(ANCHOR_SCHEDULE_FREQ))?;
        ctx.host.set_options(
            frequency,
            [("daily", "Daily"), ("weekly", "Weekly"), ("monthly", "Monthly")]
                .iter()
                .map(|(value, label)| SelectOption::new(*value, *label))
                .collect(),
        )?;
        self.on_template_changed(ctx)?;
        self.refresh_history(ctx)?;
        Self::set_status(ctx, "Ready")
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_TEMPLATE_CHANGED => self.on_template_changed(ctx),
            ACTION_GENERATE => self.generate(ctx),
            ACTION_EXPORT_CSV => self.export_csv(ctx),
            ACTION_EXPORT_PDF => self.export_simulated(ctx, "PDF"),
            ACTION_EXPORT_EXCEL => self.export_simulated(ctx, "Excel"),
            ACTION_VIEW => self.view_history(ctx),
            ACTION_DELETE => self.delete_history(ctx),
            ACTION_SCHEDULE => self.schedule(ctx),
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }
}
