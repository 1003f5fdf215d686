//! Meeting-minutes browsing panel. Data is synthesized in memory; exports
//! are simulated.
//! 會議記錄瀏覽面板；資料於記憶體中合成，匯出為模擬行為。

use chrono::{Duration, Local, NaiveDate};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::debug;

const ANCHOR_LIST: &str = "#meeting-list";
const ANCHOR_SELECT: &str = "#meeting-select";
const ANCHOR_SEARCH: &str = "#meeting-search";
const ANCHOR_TYPE: &str = "#meeting-type";
const ANCHOR_START: &str = "#start-date";
const ANCHOR_END: &str = "#end-date";
const ANCHOR_DETAILS: &str = "#meeting-details";
const ANCHOR_STATS: &str = "#meeting-stats";
const ANCHOR_EXPORT_WORD: &str = "#export-word";
const ANCHOR_EXPORT_PDF: &str = "#export-pdf";
const ANCHOR_EXPORT_EXCEL: &str = "#export-excel";
const ANCHOR_COPY: &str = "#copy-details";
const ANCHOR_STATUS: &str = "#meeting-status";

const ACTION_FILTER: &str = "meeting-minutes:filter";
const ACTION_SELECT: &str = "meeting-minutes:select";
const ACTION_EXPORT_WORD: &str = "meeting-minutes:export-word";
const ACTION_EXPORT_PDF: &str = "meeting-minutes:export-pdf";
const ACTION_EXPORT_EXCEL: &str = "meeting-minutes:export-excel";
const ACTION_COPY: &str = "meeting-minutes:copy-details";

const EXPORT_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingKind {
    Weekly,
    Review,
    Planning,
    Project,
}

impl MeetingKind {
    pub const ALL: [MeetingKind; 4] = [
        MeetingKind::Weekly,
        MeetingKind::Review,
        MeetingKind::Planning,
        MeetingKind::Project,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MeetingKind::Weekly => "weekly",
            MeetingKind::Review => "review",
            MeetingKind::Planning => "planning",
            MeetingKind::Project => "project",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MeetingKind::Weekly => "Weekly sync",
            MeetingKind::Review => "Review",
            MeetingKind::Planning => "Planning",
            MeetingKind::Project => "Project",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingStatus {
    Completed,
    Pending,
}

impl MeetingStatus {
    pub fn label(self) -> &'static str {
        match self {
            MeetingStatus::Completed => "completed",
            MeetingStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeetingRecord {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub kind: MeetingKind,
    pub attendees: Vec<String>,
    pub content: String,
    pub actions: String,
    pub status: MeetingStatus,
}

/// Synthesizes the placeholder meeting set relative to `today`.
/// 以 `today` 為基準合成佔位會議資料。
pub fn generate_mock_meetings(today: NaiveDate) -> Vec<MeetingRecord> {
    let day = |offset: i64| today - Duration::days(offset);
    vec![
        MeetingRecord {
            id: "001".into(),
            title: "Router product line weekly".into(),
            date: day(1),
            kind: MeetingKind::Weekly,
            attendees: vec!["Chen".into(), "Lee".into(), "Wang".into(), "Chao".into()],
            content: "Reviewed development progress, confirmed the test plan, \
                      and walked through market feedback.\n\nTopics:\n\
                      1. AX6000 series test progress\n2. Firmware update schedule\n\
                      3. Customer feedback handling"
                .into(),
            actions: "1. Chen: finish the AX6000 test report\n\
                      2. Lee: follow up on the firmware rollout\n\
                      3. Wang: collate customer feedback"
                .into(),
            status: MeetingStatus::Completed,
        },
        MeetingRecord {
            id: "002".into(),
            title: "Firmware 3.0.0.6 review".into(),
            date: day(4),
            kind: MeetingKind::Review,
            attendees: vec!["Chen".into(), "Lee".into(), "Lin".into()],
            content: "Reviewed the 3.0.0.6 feature and fix list.\n\nScope:\n\
                      1. Security updates\n2. Performance tuning\n3. New feature validation"
                .into(),
            actions: "1. Lin: complete the security pass\n2. Lee: verify performance numbers"
                .into(),
            status: MeetingStatus::Pending,
        },
        MeetingRecord {
            id: "003".into(),
            title: "Quarterly project planning".into(),
            date: day(8),
            kind: MeetingKind::Planning,
            attendees: vec!["Wang".into(), "Chao".into(), "Sun".into()],
            content: "Planned quarterly goals and resourcing.\n\nFocus:\n\
                      1. New product schedule\n2. Test resourcing\n3. Launch strategy"
                .into(),
            actions: "1. Wang: detailed project timeline\n2. Chao: confirm test resources".into(),
            status: MeetingStatus::Completed,
        },
        MeetingRecord {
            id: "004".into(),
            title: "GT-AX11000 PRO technical discussion".into(),
            date: day(11),
            kind: MeetingKind::Project,
            attendees: vec!["Chen".into(), "Lin".into()],
            content: "Discussed implementation details and the test strategy.\n\nFocus:\n\
                      1. WiFi 6E bring-up\n2. Thermal validation\n3. Compatibility matrix"
                .into(),
            actions: "1. Lin: WiFi 6E functional test\n2. Chen: compatibility checklist".into(),
            status: MeetingStatus::Pending,
        },
        MeetingRecord {
            id: "005".into(),
            title: "Monthly progress retrospective".into(),
            date: day(15),
            kind: MeetingKind::Review,
            attendees: vec!["Whole team".into()],
            content: "Reviewed last month's results and this month's plan.\n\nAgenda:\n\
                      1. Project status recap\n2. Issue analysis\n3. Next month's priorities"
                .into(),
            actions: "1. Project owners: refresh status reports\n2. QA: collect improvements"
                .into(),
            status: MeetingStatus::Completed,
        },
    ]
}

/// Filter criteria taken from the panel form.
#[derive(Debug, Default, Clone)]
pub struct MeetingFilter {
    pub query: String,
    pub kind: Option<MeetingKind>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl MeetingFilter {
    fn matches(&self, meeting: &MeetingRecord) -> bool {
        let query = self.query.to_lowercase();
        let matches_query = query.is_empty()
            || meeting.title.to_lowercase().contains(&query)
            || meeting.content.to_lowercase().contains(&query)
            || meeting
                .attendees
                .iter()
                .any(|attendee| attendee.to_lowercase().contains(&query));
        let matches_kind = self.kind.map_or(true, |kind| meeting.kind == kind);
        let matches_start = self.start.map_or(true, |start| meeting.date >= start);
        let matches_end = self.end.map_or(true, |end| meeting.date <= end);
        matches_query && matches_kind && matches_start && matches_end
    }
}

/// Applies a filter, preserving the original ordering.
pub fn filter_meetings<'a>(
    meetings: &'a [MeetingRecord],
    filter: &MeetingFilter,
) -> Vec<&'a MeetingRecord> {
    meetings
        .iter()
        .filter(|meeting| filter.matches(meeting))
        .collect()
}

pub struct MeetingMinutesModule {
    meetings: Vec<MeetingRecord>,
    selected: Option<String>,
}

impl MeetingMinutesModule {
    pub fn new() -> Self {
        Self {
            meetings: Vec::new(),
            selected: None,
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

    fn current_filter(&self, ctx: &ModuleContext<'_>) -> Result<MeetingFilter, ModuleError> {
        let query = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_SEARCH))?)?
            .to_string();
        let kind = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_TYPE))?)?
            .and_then(MeetingKind::from_key);
        let start = parse_date(
            ctx.host
                .value_of(ctx.host.require(&Self::selector(ANCHOR_START))?)?,
        );
        let end = parse_date(
            ctx.host
                .value_of(ctx.host.require(&Self::selector(ANCHOR_END))?)?,
        );
        Ok(MeetingFilter {
            query,
            kind,
            start,
            end,
        })
    }

    fn refresh_list(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let filter = self.current_filter(ctx)?;
        let filtered = filter_meetings(&self.meetings, &filter);

        let rows = filtered
            .iter()
            .map(|meeting| {
                vec![
                    meeting.id.clone(),
                    meeting.date.format("%Y-%m-%d").to_string(),
                    meeting.title.clone(),
                    meeting.kind.label().to_string(),
                    meeting.status.label().to_string(),
                ]
            })
            .collect();
        let list = ctx.host.require(&Self::selector(ANCHOR_LIST))?;
        ctx.host.set_table(
            list,
            ["ID", "Date", "Title", "Type", "Status"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        )?;

        let options = filtered
            .iter()
            .map(|meeting| SelectOption::new(meeting.id.clone(), meeting.title.clone()))
            .collect();
        let select = ctx.host.require(&Self::selector(ANCHOR_SELECT))?;
        ctx.host.set_options(select, options)?;
        if let Some(selected) = self.selected.clone() {
            ctx.host.select_value(select, &selected)?;
        }

        self.refresh_statistics(ctx)
    }

    fn refresh_statistics(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let today = Local::now().date_naive();
        let monthly = self
            .meetings
            .iter()
            .filter(|meeting| {
                meeting.date.format("%Y-%m").to_string() == today.format("%Y-%m").to_string()
            })
            .count();
        let pending = self
            .meetings
            .iter()
            .filter(|meeting| meeting.status == MeetingStatus::Pending)
            .count();
        let stats = ctx.host.require(&Self::selector(ANCHOR_STATS))?;
        ctx.host.set_text(
            stats,
            format!(
                "Total: {} · This month: {monthly} · Pending actions: {pending} · Updated {}",
                self.meetings.len(),
                today.format("%Y-%m-%d")
            ),
        )?;
        Ok(())
    }

    fn show_details(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let select = ctx.host.require(&Self::selector(ANCHOR_SELECT))?;
        let id = ctx.host.selected_value(select)?.map(str::to_string);
        self.selected = id.clone();

        let details = ctx.host.require(&Self::selector(ANCHOR_DETAILS))?;
        let Some(id) = id else {
            ctx.host.set_text(details, "Select a meeting to see its minutes…")?;
            return Ok(());
        };
        let Some(meeting) = self.meetings.iter().find(|meeting| meeting.id == id) else {
            ctx.host.set_text(details, "Meeting not found")?;
            return Ok(());
        };
        ctx.host.set_text(
            details,
            format!(
                "{} ({})\nDate: {}\nAttendees: {}\n\n{}\n\nAction items:\n{}",
                meeting.title,
                meeting.kind.label(),
                meeting.date.format("%Y-%m-%d"),
                meeting.attendees.join(", "),
                meeting.content,
                meeting.actions
            ),
        )?;
        Ok(())
    }

    fn export(&mut self, ctx: &mut ModuleContext<'_>, format: &str) -> Result<(), ModuleError> {
        if self.selected.is_none() {
            Self::set_status(ctx, "Select a meeting record first")?;
            return Ok(());
        }
        // Simulated export; the delay stands in for document generation.
        ctx.clock.sleep_ms(EXPORT_DELAY_MS);
        debug!(format, "simulated meeting export");
        Self::set_status(ctx, &format!("Export to {format} completed (simulated)"))
    }

    fn copy_details(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let details = ctx.host.require(&Self::selector(ANCHOR_DETAILS))?;
        let text = ctx.host.text_of(details)?.to_string();
        ctx.copy_to_clipboard(text);
        Self::set_status(ctx, "Details copied to clipboard")
    }
}

impl Default for MeetingMinutesModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for MeetingMinutesModule {
    fn id(&self) -> ModuleId {
        ModuleId::MeetingMinutes
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_LIST)
    }

    fn load_data(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.meetings = generate_mock_meetings(Local::now().date_naive());
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_SEARCH, ACTION_FILTER),
            (ANCHOR_TYPE, ACTION_FILTER),
            (ANCHOR_START, ACTION_FILTER),
            (ANCHOR_END, ACTION_FILTER),
            (ANCHOR_SELECT, ACTION_SELECT),
            (ANCHOR_EXPORT_WORD, ACTION_EXPORT_WORD),
            (ANCHOR_EXPORT_PDF, ACTION_EXPORT_PDF),
            (ANCHOR_EXPORT_EXCEL, ACTION_EXPORT_EXCEL),
            (ANCHOR_COPY, ACTION_COPY),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let kind_select = ctx.host.require(&Self::selector(ANCHOR_TYPE))?;
        let mut options = vec![SelectOption::new("", "All types")];
        options.extend(
            MeetingKind::ALL
                .iter()
                .map(|kind| SelectOption::new(kind.key(), kind.label())),
        );
        ctx.host.set_options(kind_select, options)?;
        self.refresh_list(ctx)?;
        self.show_details(ctx)?;
        Self::set_status(ctx, "Meeting records loaded")
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_FILTER => self.refresh_list(ctx),
            ACTION_SELECT => self.show_details(ctx),
            ACTION_EXPORT_WORD => self.export(ctx, "Word"),
            ACTION_EXPORT_PDF => self.export(ctx, "PDF"),
            ACTION_EXPORT_EXCEL => self.export(ctx, "Excel"),
            ACTION_COPY => self.copy_details(ctx),
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
