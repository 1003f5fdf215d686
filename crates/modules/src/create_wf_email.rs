//! Workflow-creation and notification panel.
//! 工作流程建立與通知面板。

use chrono::Local;
use fwrelease_assets::{load_catalog, Catalog};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::{debug, info};

use crate::util::{is_valid_email, Placeholder};

const ANCHOR_PRODUCT: &str = "#wf-product-select";
const ANCHOR_TYPE: &str = "#wf-type";
const ANCHOR_TITLE: &str = "#wf-title";
const ANCHOR_DESCRIPTION: &str = "#wf-description";
const ANCHOR_PRIORITY: &str = "#wf-priority";
const ANCHOR_ASSIGNEE: &str = "#wf-assignee";
const ANCHOR_CC_INPUT: &str = "#cc-input";
const ANCHOR_ADD_CC: &str = "#add-cc";
const ANCHOR_REMOVE_CC: &str = "#remove-cc";
const ANCHOR_ATTACH_INPUT: &str = "#attachment-input";
const ANCHOR_ADD_ATTACH: &str = "#add-attachment";
const ANCHOR_REMOVE_ATTACH: &str = "#remove-attachment";
const ANCHOR_PREVIEW: &str = "#wf-preview";
const ANCHOR_CREATE: &str = "#create-workflow";
const ANCHOR_SEND: &str = "#send-wf-email";
const ANCHOR_HISTORY: &str = "#wf-history";
const ANCHOR_RESET: &str = "#wf-reset";
const ANCHOR_STATUS: &str = "#wf-status";

const ACTION_FIELD_EDITED: &str = "create-wf-email:field-edited";
const ACTION_ADD_CC: &str = "create-wf-email:add-cc";
const ACTION_REMOVE_CC: &str = "create-wf-email:remove-cc";
const ACTION_ADD_ATTACH: &str = "create-wf-email:add-attachment";
const ACTION_REMOVE_ATTACH: &str = "create-wf-email:remove-attachment";
const ACTION_CREATE: &str = "create-wf-email:create";
const ACTION_SEND: &str = "create-wf-email:send";
const ACTION_RESET: &str = "create-wf-email:reset";

const SEND_DELAY_MS: u64 = 400;

const WORKFLOW_TYPES: &[(&str, &str)] = &[
    ("test-request", "Test request"),
    ("build-request", "Build request"),
    ("release-request", "Release request"),
    ("bug-report", "Bug report"),
    ("feature-request", "Feature request"),
    ("document-request", "Document request"),
];

const PRIORITIES: &[(&str, &str)] = &[
    ("low", "Low"),
    ("normal", "Normal"),
    ("high", "High"),
    ("urgent", "Urgent"),
];

const ASSIGNEES: &[&str] = &["fw-team", "qa-team", "release-manager", "doc-team"];

#[derive(Debug, Clone)]
pub struct WorkflowEntry {
    pub id: String,
    pub kind: String,
    pub product: String,
    pub title: String,
    pub assignee: String,
    pub priority: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub size_bytes: u64,
}

/// Rendered size like the original's upload list (B/KB/MB).
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn type_label(kind: &str) -> &str {
    WORKFLOW_TYPES
        .iter()
        .find(|(value, _)| *value == kind)
        .map(|(_, label)| *label)
        .unwrap_or(kind)
}

pub fn priority_label(priority: &str) -> &str {
    PRIORITIES
        .iter()
        .find(|(value, _)| *value == priority)
        .map(|(_, label)| *label)
        .unwrap_or(priority)
}

/// `[product] Type: title`, the subject shape used across the workflow
/// notifications.
pub fn email_subject(kind: &str, product: Option<&str>, title: &str) -> String {
    let product_part = product
        .map(|product| format!("[{product}] "))
        .unwrap_or_default();
    format!("{product_part}{}: {title}", type_label(kind))
}

pub fn email_body(
    kind: &str,
    product: Option<&str>,
    title: &str,
    description: &str,
    priority: &str,
) -> String {
    format!(
        "Hi,\n\nPlease open a {} for the following item:\n\n\
         Product: {}\nTitle: {title}\nPriority: {}\nDescription:\n{description}\n\n\
         Thanks!\n\nBest regards",
        type_label(kind),
        product.unwrap_or("N/A"),
        priority_label(priority),
    )
}

pub struct CreateWfEmailModule {
    catalog: Option<Catalog>,
    cc_list: Vec<String>,
    attachments: Vec<Attachment>,
    history: Vec<WorkflowEntry>,
    placeholder: Placeholder,
}

impl CreateWfEmailModule {
    pub fn new() -> Self {
        Self::with_placeholder(Placeholder::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_placeholder(Placeholder::from_seed(seed))
    }

    fn with_placeholder(placeholder: Placeholder) -> Self {
        Self {
            catalog: None,
            cc_list: Vec::new(),
            attachments: Vec::new(),
            history: Vec::new(),
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

    fn form_values(
        &self,
        ctx: &ModuleContext<'_>,
    ) -> Result<(Option<String>, Option<String>, String, String, String, Option<String>), ModuleError>
    {
        let kind = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_TYPE))?)?
            .map(str::to_string);
        let product = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?)?
            .map(str::to_string);
        let title = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_TITLE))?)?
            .trim()
            .to_string();
        let description = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_DESCRIPTION))?)?
            .trim()
            .to_string();
        let priority = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_PRIORITY))?)?
            .unwrap_or("normal")
            .to_string();
        let assignee = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_ASSIGNEE))?)?
            .map(str::to_string);
        Ok((kind, product, title, description, priority, assignee))
    }

    fn refresh_preview(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let (kind, product, title, description, priority, assignee) = self.form_values(ctx)?;
        let can_create = kind.is_some() && !title.is_empty() && assignee.is_some();

        for anchor in [ANCHOR_CREATE, ANCHOR_SEND] {
            let button = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_enabled(button, can_create)?;
        }

        let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
        if let Some(kind) = kind.as_deref() {
            if !title.is_empty() {
                let subject = email_subject(kind, product.as_deref(), &title);
                let body = email_body(kind, product.as_deref(), &title, &description, &priority);
                let extras = format!(
                    "Cc: {}\nAttachments: {}",
                    if self.cc_list.is_empty() {
                        "(none)".to_string()
                    } else {
                        self.cc_list.join(", ")
                    },
                    if self.attachments.is_empty() {
                        "(none)".to_string()
                    } else {
                        self.attachments
                            .iter()
                            .map(|attachment| {
                                format!(
                                    "{} ({})",
                                    attachment.name,
                                    format_file_size(attachment.size_bytes)
                                )
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    }
                );
                ctx.host
                    .set_text(preview, format!("Subject: {subject}\n{extras}\n\n{body}"))?;
                return Ok(());
            }
        }
        ctx.host
            .set_text(preview, "Pick a workflow type, title, and assignee…")?;
        Ok(())
    }

    fn add_cc(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_CC_INPUT))?;
        let address = ctx.host.value_of(input)?.trim().to_string();
        if !is_valid_email(&address) {
            Self::set_status(ctx, "Please enter a valid cc address")?;
            return Ok(());
        }
        if self.cc_list.iter().any(|existing| *existing == address) {
            Self::set_status(ctx, "Address is already on the cc list")?;
            return Ok(());
        }
        self.cc_list.push(address);
        ctx.host.set_value(input, "")?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, &format!("{} cc address(es)", self.cc_list.len()))
    }

    fn remove_cc(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_CC_INPUT))?;
        let address = ctx.host.value_of(input)?.trim().to_string();
        let removed = if address.is_empty() {
            self.cc_list.pop()
        } else {
            self.cc_list
                .iter()
                .position(|existing| *existing == address)
                .map(|index| self.cc_list.remove(index))
        };
        match removed {
            Some(address) => {
                self.refresh_preview(ctx)?;
                Self::set_status(ctx, &format!("Removed cc {address}"))
            }
            None => Self::set_status(ctx, "No matching cc address"),
        }
    }

    fn add_attachment(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_ATTACH_INPUT))?;
        let name = ctx.host.value_of(input)?.trim().to_string();
        if name.is_empty() {
            Self::set_status(ctx, "Enter an attachment name first")?;
            return Ok(());
        }
        if self
            .attachments
            .iter()
            .any(|attachment| attachment.name == name)
        {
            Self::set_status(ctx, "Attachment is already on the list")?;
            return Ok(());
        }
        // The size is a placeholder; there is no real file behind it.
        let size_bytes = self.placeholder.range(8 * 1024, 4 * 1024 * 1024);
        self.attachments.push(Attachment { name, size_bytes });
        ctx.host.set_value(input, "")?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, &format!("{} attachment(s)", self.attachments.len()))
    }

    fn remove_attachment(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_ATTACH_INPUT))?;
        let name = ctx.host.value_of(input)?.trim().to_string();
        let removed = if name.is_empty() {
            self.attachments.pop()
        } else {
            self.attachments
                .iter()
                .position(|attachment| attachment.name == name)
                .map(|index| self.attachments.remove(index))
        };
        match removed {
            Some(attachment) => {
                self.refresh_preview(ctx)?;
                Self::set_status(ctx, &format!("Removed attachment {}", attachment.name))
            }
            None => Self::set_status(ctx, "No matching attachment"),
        }
    }

    fn create_workflow(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let (kind, product, title, _, priority, assignee) = self.form_values(ctx)?;
        let (Some(kind), Some(assignee)) = (kind, assignee) else {
            Self::set_status(ctx, "Pick a workflow type and assignee first")?;
            return Ok(());
        };
        if title.is_empty() {
            Self::set_status(ctx, "A workflow needs a title")?;
            return Ok(());
        }

        let entry = WorkflowEntry {
            id: format!("WF{:03}", self.history.len() + 1),
            kind,
            product: product.unwrap_or_else(|| "N/A".to_string()),
            title,
            assignee,
            priority,
            date: Local::now().format("%Y-%m-%d").to_string(),
            status: "pending".to_string(),
        };
        info!(id = %entry.id, "workflow created");
        let id = entry.id.clone();
        self.history.insert(0, entry);
        self.refresh_history(ctx)?;
        Self::set_status(ctx, &format!("Workflow created: {id}"))
    }

    fn send_email(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let (kind, product, title, description, priority, assignee) = self.form_values(ctx)?;
        let (Some(kind), Some(_)) = (kind, assignee) else {
            Self::set_status(ctx, "Pick a workflow type and assignee first")?;
            return Ok(());
        };
        if title.is_empty() {
            Self::set_status(ctx, "A notification needs a title")?;
            return Ok(());
        }
        let subject = email_subject(&kind, product.as_deref(), &title);
        let _body = email_body(&kind, product.as_deref(), &title, &description, &priority);
        ctx.clock.sleep_ms(SEND_DELAY_MS);
        debug!(%subject, cc = self.cc_list.len(), "simulated workflow notification");
        Self::set_status(ctx, &format!("Notification sent: {subject}"))
    }

    fn refresh_history(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let table = ctx.host.require(&Self::selector(ANCHOR_HISTORY))?;
        let rows = self
            .history
            .iter()
            .map(|entry| {
                vec![
                    entry.id.clone(),
                    entry.date.clone(),
                    type_label(&entry.kind).to_string(),
                    entry.product.clone(),
                    entry.title.clone(),
                    entry.assignee.clone(),
                    priority_label(&entry.priority).to_string(),
                    entry.status.clone(),
                ]
            })
            .collect();
        ctx.host.set_table(
            table,
            ["ID", "Date", "Type", "Product", "Title", "Assignee", "Priority", "Status"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        )?;
        Ok(())
    }

    fn reset(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for anchor in [ANCHOR_TITLE, ANCHOR_DESCRIPTION, ANCHOR_CC_INPUT, ANCHOR_ATTACH_INPUT] {
            let node = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_value(node, "")?;
        }
        for anchor in [ANCHOR_TYPE, ANCHOR_PRODUCT, ANCHOR_PRIORITY, ANCHOR_ASSIGNEE] {
            let node = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_selected(node, None)?;
        }
        self.cc_list.clear();
        self.attachments.clear();
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Form reset")
    }
}

impl Default for CreateWfEmailModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for CreateWfEmailModule {
    fn id(&self) -> ModuleId {
        ModuleId::CreateWfEmail
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_PRODUCT)
    }

    fn load_data(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let catalog = load_catalog(ctx.fetcher)?;
        debug!(products = catalog.records.len(), "create-wf catalog ready");
        self.catalog = Some(catalog);
        // Seed history so the table is not empty on first visit.
        if self.history.is_empty() {
            self.history = vec![WorkflowEntry {
                id: "WF001".into(),
                kind: "test-request".into(),
                product: "GT-AX11000".into(),
                title: "Regression pass for 3.0.0.6".into(),
                assignee: "qa-team".into(),
                priority: "high".into(),
                date: Local::now().format("%Y-%m-%d").to_string(),
                status: "completed".into(),
            }];
        }
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_PRODUCT, ACTION_FIELD_EDITED),
            (ANCHOR_TYPE, ACTION_FIELD_EDITED),
            (ANCHOR_TITLE, ACTION_FIELD_EDITED),
            (ANCHOR_DESCRIPTION, ACTION_FIELD_EDITED),
            (ANCHOR_PRIORITY, ACTION_FIELD_EDITED),
            (ANCHOR_ASSIGNEE, ACTION_FIELD_EDITED),
            (ANCHOR_ADD_CC, ACTION_ADD_CC),
            (ANCHOR_REMOVE_CC, ACTION_REMOVE_CC),
            (ANCHOR_ADD_ATTACH, ACTION_ADD_ATTACH),
            (ANCHOR_REMOVE_ATTACH, ACTION_REMOVE_ATTACH),
            (ANCHOR_CREATE, ACTION_CREATE),
            (ANCHOR_SEND, ACTION_SEND),
            (ANCHOR_RESET, ACTION_RESET),
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

        let kind = ctx.host.require(&Self::selector(ANCHOR_TYPE))?;
        ctx.host.set_options(
            kind,
            WORKFLOW_TYPES
                .iter()
                .map(|(value, label)| SelectOption::new(*value, *label))
                .collect(),
        )?;
        let priority = ctx.host.require(&Self::selector(ANCHOR_PRIORITY))?;
        ctx.host.set_options(
            priority,
            PRIORITIES
                .iter()
                .map(|(value, label)| SelectOption::new(*value, *label))
                .collect(),
        )?;
        let assignee = ctx.host.require(&Self::selector(ANCHOR_ASSIGNEE))?;
        ctx.host.set_options(
            assignee,
            ASSIGNEES
                .iter()
                .map(|name| SelectOption::new(*name, *name))
                .collect(),
        )?;

        self.refresh_history(ctx)?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Ready")
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_FIELD_EDITED => self.refresh_preview(ctx),
            ACTION_ADD_CC => self.add_cc(ctx),
            ACTION_REMOVE_CC => self.remove_cc(ctx),
            ACTION_ADD_ATTACH => self.add_attachment(ctx),
            ACTION_REMOVE_ATTACH => self.remove_attachment(ctx),
            ACTION_CREATE => self.create_workflow(ctx),
            ACTION_SEND => self.send_email(ctx),
            ACTION_RESET => self.reset(ctx),
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
    fn subject_includes_product_when_present() {
        assert_eq!(
            email_subject("test-request", Some("GT-AX11000"), "Regression pass"),
            "[GT-AX11000] Test request: Regression pass"
        );
        assert_eq!(
            email_subject("bug-report", None, "Boot loop"),
            "Bug report: Boot loop"
        );
    }

    #[test]
    fn unknown_type_falls_back_to_raw_value() {
        assert_eq!(type_label("mystery"), "mystery");
        assert_eq!(priority_label("normal"), "Normal");
    }

    #[test]
    fn body_substitutes_labels_and_defaults() {
        let body = email_body("build-request", None, "Nightly", "Fresh build please", "urgent");
        assert!(body.contains("Build request"));
        assert!(body.contains("Product: N/A"));
        assert!(body.contains("Priority: Urgent"));
        assert!(body.contains("Fresh build please"));
    }

    #[test]
    fn file_sizes_render_in_sensible_units() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }
}
