//! PLM data intake panel: paste a payload, validate, process, export.
//! PLM 資料匯入面板：貼上資料、驗證、處理、匯出。

use fwrelease_content::Selector;
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::{debug, info};

const ANCHOR_PREVIEW: &str = "#plm-preview";
const ANCHOR_INPUT: &str = "#data-input";
const ANCHOR_UPLOAD: &str = "#upload-data";
const ANCHOR_PROCESS: &str = "#process-data";
const ANCHOR_VALIDATE: &str = "#validate-data";
const ANCHOR_EXPORT: &str = "#export-plm-data";
const ANCHOR_CLEAR: &str = "#clear-data";
const ANCHOR_STATUS: &str = "#plm-status";

const ACTION_UPLOAD: &str = "plm:upload";
const ACTION_PROCESS: &str = "plm:process";
const ACTION_VALIDATE: &str = "plm:validate";
const ACTION_EXPORT: &str = "plm:export";
const ACTION_CLEAR: &str = "plm:clear";

const PROCESS_DELAY_MS: u64 = 700;

/// One ingested row: `part_number, description, revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlmRow {
    pub part_number: String,
    pub description: String,
    pub revision: String,
}

/// Parses the pasted payload. Lines are comma-separated triples; blank
/// lines are skipped, short lines are kept for validation to flag.
pub fn parse_payload(text: &str) -> Vec<PlmRow> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut parts = line.splitn(3, ',').map(|part| part.trim().to_string());
            PlmRow {
                part_number: parts.next().unwrap_or_default(),
                description: parts.next().unwrap_or_default(),
                revision: parts.next().unwrap_or_default(),
            }
        })
        .collect()
}

/// Rows missing a part number or revision are invalid.
pub fn validate_rows(rows: &[PlmRow]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.part_number.is_empty() || row.revision.is_empty())
        .map(|(index, _)| index)
        .collect()
}

pub struct PlmModule {
    rows: Vec<PlmRow>,
    processed: bool,
}

impl PlmModule {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            processed: false,
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

    fn refresh_preview(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
        if self.rows.is_empty() {
            ctx.host.set_text(preview, "No data loaded")?;
        } else {
            let sample = self
                .rows
                .iter()
                .take(5)
                .map(|row| format!("{} · {} · rev {}", row.part_number, row.description, row.revision))
                .collect::<Vec<_>>()
                .join("\n");
            ctx.host.set_text(
                preview,
                format!("{} row(s) loaded\n\n{sample}", self.rows.len()),
            )?;
        }
        let process = ctx.host.require(&Self::selector(ANCHOR_PROCESS))?;
        ctx.host.set_enabled(process, !self.rows.is_empty())?;
        Ok(())
    }

    fn upload(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_INPUT))?;
        let payload = ctx.host.value_of(input)?.to_string();
        let rows = parse_payload(&payload);
        if rows.is_empty() {
            Self::set_status(ctx, "Paste part rows first (part,description,revision)")?;
            return Ok(());
        }
        debug!(rows = rows.len(), "plm payload parsed");
        self.rows = rows;
        self.processed = false;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, &format!("Loaded {} row(s)", self.rows.len()))
    }

    fn process(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.rows.is_empty() {
            Self::set_status(ctx, "No data to process")?;
            return Ok(());
        }
        ctx.clock.sleep_ms(PROCESS_DELAY_MS);
        self.processed = true;
        info!(rows = self.rows.len(), "plm data processed");
        Self::set_status(ctx, &format!("Processed {} row(s)", self.rows.len()))
    }

    fn validate(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.rows.is_empty() {
            Self::set_status(ctx, "No data to validate")?;
            return Ok(());
        }
        let invalid = validate_rows(&self.rows);
        if invalid.is_empty() {
            Self::set_status(ctx, "Validation passed")
        } else {
            Self::set_status(
                ctx,
                &format!("Validation failed: {} row(s) incomplete", invalid.len()),
            )
        }
    }

    fn export(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.rows.is_empty() {
            Self::set_status(ctx, "No data to export")?;
            return Ok(());
        }
        let mut csv = String::from("part_number,description,revision\n");
        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{}\n",
                row.part_number, row.description, row.revision
            ));
        }
        ctx.copy_to_clipboard(csv);
        Self::set_status(ctx, "Data exported to clipboard as CSV")
    }

    fn clear(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.rows.clear();
        self.processed = false;
        let input = ctx.host.require(&Self::selector(ANCHOR_INPUT))?;
        ctx.host.set_value(input, "")?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Cleared")
    }
}

impl Default for PlmModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for PlmModule {
    fn id(&self) -> ModuleId {
        ModuleId::Plm
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_PREVIEW)
    }

    fn load_data(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_UPLOAD, ACTION_UPLOAD),
            (ANCHOR_PROCESS, ACTION_PROCESS),
            (ANCHOR_VALIDATE, ACTION_VALIDATE),
            (ANCHOR_EXPORT, ACTION_EXPORT),
            (ANCHOR_CLEAR, ACTION_CLEAR),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Ready")
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_UPLOAD => self.upload(ctx),
            ACTION_PROCESS => self.process(ctx),
            ACTION_VALIDATE => self.validate(ctx),
            ACTION_EXPORT => self.export(ctx),
            ACTION_CLEAR => self.clear(ctx),
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

    #[test]
    fn payload_parsing_handles_blank_and_short_lines() {
        let rows = parse_payload("P-100, Main board, A2\n\nP-200,Antenna\n  \nP-300, PSU, B1\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].part_number, "P-100");
        assert_eq!(rows[1].revision, "");
        assert_eq!(rows[2].description, "PSU");
    }

    #[test]
    fn validation_flags_incomplete_rows() {
        let rows = parse_payload("P-100,Board,A1\n,Missing part,B2\nP-300,No revision");
        assert_eq!(validate_rows(&rows), vec![1, 2]);
    }
}
