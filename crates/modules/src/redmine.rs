//! Redmine ticket creation panel.
//! Redmine 工單建立面板。

use fwrelease_assets::{load_catalog, Catalog};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::{debug, info};

use crate::util::Placeholder;

const ANCHOR_PRODUCT: &str = "#product-select";
const ANCHOR_TAG: &str = "#redmine-tag";
const ANCHOR_PATH: &str = "#firmware-path";
const ANCHOR_PREVIEW: &str = "#ticket-preview";
const ANCHOR_CREATE: &str = "#create-ticket";
const ANCHOR_RESET: &str = "#reset-form";
const ANCHOR_COPY: &str = "#copy-preview";
const ANCHOR_EDIT: &str = "#edit-path";
const ANCHOR_STATUS: &str = "#redmine-status";

const ACTION_PRODUCT_CHANGED: &str = "redmine:product-changed";
const ACTION_TAG_CHANGED: &str = "redmine:tag-changed";
const ACTION_PATH_EDITED: &str = "redmine:path-edited";
const ACTION_CREATE: &str = "redmine:create-ticket";
const ACTION_RESET: &str = "redmine:reset";
const ACTION_COPY: &str = "redmine:copy-preview";
const ACTION_EDIT: &str = "redmine:toggle-edit";

/// Ticket tags offered by the panel, value → tracker.
const TAGS: &[(&str, &str, &str)] = &[
    ("test-request", "Test request", "Test Request"),
    ("build-request", "Build request", "Build Request"),
    ("signature-test-request", "Signature test request", "Signature Test Request"),
    ("factory-regression", "Factory regression", "Test Request"),
    ("standard-regression", "Standard regression", "Test Request"),
];

/// Drafted ticket fields shown in the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub project: String,
    pub tracker: String,
    pub subject: String,
    pub description: String,
}

pub struct RedmineModule {
    catalog: Option<Catalog>,
    edit_mode: bool,
    tickets_created: u32,
    placeholder: Placeholder,
}

impl RedmineModule {
    pub fn new() -> Self {
        Self::with_placeholder(Placeholder::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_placeholder(Placeholder::from_seed(seed))
    }

    fn with_placeholder(placeholder: Placeholder) -> Self {
        Self {
            catalog: None,
            edit_mode: false,
            tickets_created: 0,
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

    /// Derives the full firmware path for a product: catalog base path, a
    /// simulated latest version folder, and a firmware file name.
    /// 依產品推導完整韌體路徑：目錄中的基礎路徑、模擬的最新版本資料夾與檔名。
    fn derive_firmware_path(&mut self, model: &str) -> Option<String> {
        let base = self
            .catalog
            .as_ref()?
            .find(model)?
            .fw_path
            .clone()?;
        Some(build_firmware_path(&base, model, &mut self.placeholder))
    }

    fn redmine_project(&self, model: &str) -> String {
        self.catalog
            .as_ref()
            .and_then(|catalog| catalog.find(model))
            .and_then(|record| record.redmine_project.clone())
            .unwrap_or_else(|| "Default Project".to_string())
    }

    /// Builds the draft from the current form values, or `None` while a
    /// required field is still empty.
    fn draft(&self, ctx: &ModuleContext<'_>) -> Result<Option<TicketDraft>, ModuleError> {
        let product = ctx.host.selected_value(
            ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?,
        )?;
        let tag = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_TAG))?)?;
        let path_node = ctx.host.require(&Self::selector(ANCHOR_PATH))?;
        let path = ctx.host.value_of(path_node)?.trim().to_string();

        let (Some(product), Some(tag)) = (product, tag) else {
            return Ok(None);
        };
        if path.is_empty() {
            return Ok(None);
        }

        let file_name = firmware_file_name(&path);
        let tracker = TAGS
            .iter()
            .find(|(value, _, _)| *value == tag)
            .map(|(_, _, tracker)| *tracker)
            .unwrap_or("Test Request");
        Ok(Some(TicketDraft {
            project: self.redmine_project(product),
            tracker: tracker.to_string(),
            subject: format!("[{product}] {file_name}"),
            description: format!("{tag} for {product}\n\nFirmware: {path}"),
        }))
    }

    fn refresh_preview(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let draft = self.draft(ctx)?;
        let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
        let create = ctx.host.require(&Self::selector(ANCHOR_CREATE))?;
        match draft {
            Some(draft) => {
                ctx.host.set_text(
                    preview,
                    format!(
                        "Project: {}\nTracker: {}\nSubject: {}\n\n{}",
                        draft.project, draft.tracker, draft.subject, draft.description
                    ),
                )?;
                ctx.host.set_enabled(create, true)?;
            }
            None => {
                ctx.host
                    .set_text(preview, "Select a product, tag, and firmware path…")?;
                ctx.host.set_enabled(create, false)?;
            }
        }
        Ok(())
    }

    fn on_product_changed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let product = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?)?
            .map(str::to_string);
        let path_node = ctx.host.require(&Self::selector(ANCHOR_PATH))?;

        // In edit mode the user owns the path field.
        if !self.edit_mode {
            let derived = product
                .as_deref()
                .and_then(|model| self.derive_firmware_path(model))
                .unwrap_or_default();
            ctx.host.set_value(path_node, derived)?;
        }
        self.refresh_preview(ctx)
    }

    fn create_ticket(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(draft) = self.draft(ctx)? else {
            Self::set_status(ctx, "Fill in product, tag, and firmware path first")?;
            return Ok(());
        };

        // Ticket submission is simulated; only a reference is produced.
        self.tickets_created += 1;
        let reference = format!("RT-{:05}", 10_000 + self.tickets_created);
        info!(%reference, project = %draft.project, "simulated redmine ticket created");
        Self::set_status(
            ctx,
            &format!("Ticket {reference} drafted for {} ({})", draft.project, draft.tracker),
        )
    }

    fn reset_form(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let product = ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?;
        ctx.host.set_selected(product, None)?;
        let tag = ctx.host.require(&Self::selector(ANCHOR_TAG))?;
        ctx.host.set_selected(tag, None)?;
        let path = ctx.host.require(&Self::selector(ANCHOR_PATH))?;
        ctx.host.set_value(path, "")?;
        let edit = ctx.host.require(&Self::selector(ANCHOR_EDIT))?;
        ctx.host.set_checked(edit, false)?;
        self.edit_mode = false;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Form reset")
    }
}

impl Default for RedmineModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for RedmineModule {
    fn id(&self) -> ModuleId {
        ModuleId::Redmine
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_PRODUCT)
    }

    fn load_data(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let catalog = load_catalog(ctx.fetcher)?;
        debug!(products = catalog.records.len(), source = catalog.source.describe(), "redmine catalog ready");
        self.catalog = Some(catalog);
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_PRODUCT, ACTION_PRODUCT_CHANGED),
            (ANCHOR_TAG, ACTION_TAG_CHANGED),
            (ANCHOR_PATH, ACTION_PATH_EDITED),
            (ANCHOR_CREATE, ACTION_CREATE),
            (ANCHOR_RESET, ACTION_RESET),
            (ANCHOR_COPY, ACTION_COPY),
            (ANCHOR_EDIT, ACTION_EDIT),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let product = ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?;
        let options = self
            .catalog
            .as_ref()
            .map(|catalog| {
                catalog
                    .models()
                    .map(|model| SelectOption::new(model, model))
                    .collect()
            })
            .unwrap_or_default();
        ctx.host.set_options(product, options)?;

        let tag = ctx.host.require(&Self::selector(ANCHOR_TAG))?;
        ctx.host.set_options(
            tag,
            TAGS.iter()
                .map(|(value, label, _)| SelectOption::new(*value, *label))
                .collect(),
        )?;

        self.refresh_preview(ctx)?;
        let source = self
            .catalog
            .as_ref()
            .map(|catalog| catalog.source.describe())
            .unwrap_or("no source");
        Self::set_status(ctx, &format!("Products loaded from {source}"))
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_PRODUCT_CHANGED => self.on_product_changed(ctx),
            ACTION_TAG_CHANGED | ACTION_PATH_EDITED => self.refresh_preview(ctx),
            ACTION_CREATE => self.create_ticket(ctx),
            ACTION_RESET => self.reset_form(ctx),
            ACTION_COPY => {
                let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
                let text = ctx.host.text_of(preview)?.to_string();
                ctx.copy_to_clipboard(text);
                Self::set_status(ctx, "Preview copied to clipboard")
            }
            ACTION_EDIT => {
                let edit = ctx.host.require(&Self::selector(ANCHOR_EDIT))?;
                self.edit_mode = ctx.host.is_checked(edit)?;
                if !self.edit_mode {
                    // Leaving edit mode re-derives the path from the catalog.
                    self.on_product_changed(ctx)?;
                }
                Ok(())
            }
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }
}

/// Last path component of a Windows-style share path.
pub fn firmware_file_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// Base path + simulated latest version folder + firmware file name.
/// Legacy `Public\FW\` share prefixes are rewritten to the current layout.
pub fn build_firmware_path(base: &str, model: &str, placeholder: &mut Placeholder) -> String {
    let mut clean = base.trim().to_string();
    if let Some(rest) = clean.strip_prefix("\\\\fileserver\\Public\\FW\\") {
        clean = format!("\\\\fileserver\\Public\\Software\\Firmware_SQ\\{rest}");
    }
    if !clean.ends_with('\\') {
        clean.push('\\');
    }
    let version = latest_version_folder(placeholder);
    let file_name = latest_firmware_file_name(model, placeholder);
    format!("{clean}{model}\\{version}\\{file_name}")
}

fn latest_version_folder(placeholder: &mut Placeholder) -> String {
    let build = placeholder.range(34_000, 35_000);
    let git = placeholder.hex_hash(7);
    let sdk = placeholder.hex_hash(6);
    format!("router-3006-102-rc2_{build}-g{git}__SDK-504L02-{sdk}")
}

fn latest_firmware_file_name(model: &str, placeholder: &mut Placeholder) -> String {
    let build = placeholder.range(34_000, 35_000);
    let git1 = placeholder.hex_hash(7);
    let git2 = placeholder.hex_hash(6);
    format!("{model}_3.0.0.6_102_{build}-g{git1}_404-g{git2}_nand_squashfs.pkgtb")
}
