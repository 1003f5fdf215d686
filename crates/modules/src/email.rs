//! Email composition panel. Sending is simulated; templates come from the
//! asset bundle with built-in defaults.
//! 電子郵件撰寫面板；寄送為模擬行為，範本取自資源檔並附內建預設值。

use chrono::Local;
use fwrelease_assets::{load_email_templates, EmailTemplate, TemplateSource};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::{debug, info};

use crate::util::{is_valid_email, parse_recipient_blob, substitute_variables, Placeholder};

const ANCHOR_TEMPLATE: &str = "#template-select";
const ANCHOR_SUBJECT: &str = "#email-subject";
const ANCHOR_BODY: &str = "#email-body";
const ANCHOR_RECIPIENT_INPUT: &str = "#recipient-input";
const ANCHOR_ADD: &str = "#add-recipient";
const ANCHOR_REMOVE: &str = "#remove-recipient";
const ANCHOR_IMPORT_INPUT: &str = "#import-input";
const ANCHOR_IMPORT: &str = "#import-recipients";
const ANCHOR_RECIPIENTS: &str = "#recipient-list";
const ANCHOR_PREVIEW: &str = "#email-preview";
const ANCHOR_SEND: &str = "#send-email";
const ANCHOR_PROGRESS: &str = "#send-progress";
const ANCHOR_CLEAR: &str = "#clear-email";
const ANCHOR_STATUS: &str = "#email-status";

const ACTION_TEMPLATE_CHANGED: &str = "email:template-changed";
const ACTION_FIELD_EDITED: &str = "email:field-edited";
const ACTION_ADD: &str = "email:add-recipient";
const ACTION_REMOVE: &str = "email:remove-recipient";
const ACTION_IMPORT: &str = "email:import-recipients";
const ACTION_SEND: &str = "email:send";
const ACTION_CLEAR: &str = "email:clear";

const PER_RECIPIENT_DELAY_MS: u64 = 150;

pub struct EmailModule {
    templates: Vec<EmailTemplate>,
    template_source: TemplateSource,
    recipients: Vec<String>,
    emails_sent: u32,
    placeholder: Placeholder,
}

impl EmailModule {
    pub fn new() -> Self {
        Self::with_placeholder(Placeholder::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_placeholder(Placeholder::from_seed(seed))
    }

    fn with_placeholder(placeholder: Placeholder) -> Self {
        Self {
            templates: Vec::new(),
            template_source: TemplateSource::BuiltIn,
            recipients: Vec::new(),
            emails_sent: 0,
            placeholder,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    fn selector(raw: &str) -> Selector {
        Selector::parse(raw).expect("static selector")
    }

    fn set_status(ctx: &mut ModuleContext<'_>, message: &str) -> Result<(), ModuleError> {
        let status = ctx.host.require(&Self::selector(ANCHOR_STATUS))?;
        ctx.host.set_text(status, message)?;
        Ok(())
    }

    /// Sample values used to substitute `{placeholders}` in previews, the
    /// stand-in for live release data.
    fn sample_values(&mut self) -> Vec<(&'static str, String)> {
        let build = self.placeholder.range(100, 999);
        vec![
            ("product", "GT-AX11000".to_string()),
            ("version", format!("3.0.0.6.{build}")),
            ("date", Local::now().format("%Y-%m-%d").to_string()),
            (
                "firmware_path",
                "\\\\fileserver\\Public\\Software\\Firmware_SQ\\GT-AX11000".to_string(),
            ),
            ("status", "PASSED".to_string()),
            ("issues_count", "0".to_string()),
            ("severity", "Minor".to_string()),
            ("reporter", "QA Team".to_string()),
        ]
    }

    fn on_template_changed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let select = ctx.host.require(&Self::selector(ANCHOR_TEMPLATE))?;
        let id = ctx.host.selected_value(select)?.map(str::to_string);
        if let Some(template) = id
            .as_deref()
            .and_then(|id| self.templates.iter().find(|template| template.id == id))
            .cloned()
        {
            let subject = ctx.host.require(&Self::selector(ANCHOR_SUBJECT))?;
            ctx.host.set_value(subject, template.subject)?;
            let body = ctx.host.require(&Self::selector(ANCHOR_BODY))?;
            ctx.host.set_value(body, template.body)?;
        }
        self.refresh_preview(ctx)
    }

    fn refresh_preview(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let subject = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_SUBJECT))?)?
            .to_string();
        let body = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_BODY))?)?
            .to_string();
        let values = self.sample_values();
        let pairs: Vec<(&str, &str)> = values
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();

        let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
        ctx.host.set_text(
            preview,
            format!(
                "To: {}\nSubject: {}\n\n{}",
                if self.recipients.is_empty() {
                    "(no recipients)".to_string()
                } else {
                    self.recipients.join(", ")
                },
                substitute_variables(&subject, &pairs),
                substitute_variables(&body, &pairs)
            ),
        )?;
        Ok(())
    }

    fn refresh_recipient_list(&self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let list = ctx.host.require(&Self::selector(ANCHOR_RECIPIENTS))?;
        let rows = self
            .recipients
            .iter()
            .enumerate()
            .map(|(index, address)| vec![(index + 1).to_string(), address.clone()])
            .collect();
        ctx.host
            .set_table(list, vec!["#".into(), "Address".into()], rows)?;
        Ok(())
    }

    fn add_recipient(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_RECIPIENT_INPUT))?;
        let address = ctx.host.value_of(input)?.trim().to_string();
        if !is_valid_email(&address) {
            Self::set_status(ctx, "Please enter a valid email address")?;
            return Ok(());
        }
        if self.recipients.iter().any(|existing| *existing == address) {
            Self::set_status(ctx, "Recipient is already on the list")?;
            return Ok(());
        }
        self.recipients.push(address);
        ctx.host.set_value(input, "")?;
        self.refresh_recipient_list(ctx)?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, &format!("{} recipient(s)", self.recipients.len()))
    }

    /// Removes the address currently in the input field, or the most
    /// recently added one when the field is empty.
    fn remove_recipient(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_RECIPIENT_INPUT))?;
        let address = ctx.host.value_of(input)?.trim().to_string();
        let removed = if address.is_empty() {
            self.recipients.pop()
        } else {
            match self.recipients.iter().position(|existing| *existing == address) {
                Some(index) => Some(self.recipients.remove(index)),
                None => None,
            }
        };
        match removed {
            Some(address) => {
                self.refresh_recipient_list(ctx)?;
                self.refresh_preview(ctx)?;
                Self::set_status(ctx, &format!("Removed {address}"))
            }
            None => Self::set_status(ctx, "No matching recipient to remove"),
        }
    }

    fn import_recipients(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let input = ctx.host.require(&Self::selector(ANCHOR_IMPORT_INPUT))?;
        let blob = ctx.host.value_of(input)?.to_string();
        let (valid, rejected) = parse_recipient_blob(&blob);
        let mut imported = 0;
        for address in valid {
            if !self.recipients.iter().any(|existing| *existing == address) {
                self.recipients.push(address);
                imported += 1;
            }
        }
        ctx.host.set_value(input, "")?;
        self.refresh_recipient_list(ctx)?;
        self.refresh_preview(ctx)?;
        Self::set_status(
            ctx,
            &format!("Imported {imported} recipient(s), rejected {rejected}"),
        )
    }

    fn send(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        if self.recipients.is_empty() {
            Self::set_status(ctx, "Please add at least one recipient")?;
            return Ok(());
        }
        let subject = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_SUBJECT))?)?
            .trim()
            .to_string();
        let body = ctx
            .host
            .value_of(ctx.host.require(&Self::selector(ANCHOR_BODY))?)?
            .trim()
            .to_string();
        if subject.is_empty() || body.is_empty() {
            Self::set_status(ctx, "Please fill in subject and body")?;
            return Ok(());
        }

        // Simulated delivery, one clock tick per recipient.
        let total = self.recipients.len();
        let progress = ctx.host.require(&Self::selector(ANCHOR_PROGRESS))?;
        for (index, recipient) in self.recipients.iter().enumerate() {
            ctx.clock.sleep_ms(PER_RECIPIENT_DELAY_MS);
            debug!(recipient = %recipient, "simulated email delivery");
            ctx.host.set_progress(
                progress,
                (index + 1) as f32 / total as f32,
                format!("Sending {}/{total}…", index + 1),
            )?;
        }
        self.emails_sent += total as u32;
        info!(recipients = total, %subject, "simulated email sent");
        ctx.host.set_progress(progress, 1.0, "Done")?;
        Self::set_status(ctx, &format!("Email sent to {total} recipient(s)"))
    }

    fn clear(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for anchor in [ANCHOR_SUBJECT, ANCHOR_BODY, ANCHOR_RECIPIENT_INPUT, ANCHOR_IMPORT_INPUT] {
            let node = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_value(node, "")?;
        }
        let template = ctx.host.require(&Self::selector(ANCHOR_TEMPLATE))?;
        ctx.host.set_selected(template, None)?;
        self.recipients.clear();
        let progress = ctx.host.require(&Self::selector(ANCHOR_PROGRESS))?;
        ctx.host.set_progress(progress, 0.0, "")?;
        self.refresh_recipient_list(ctx)?;
        self.refresh_preview(ctx)?;
        Self::set_status(ctx, "Form cleared")
    }
}

impl Default for EmailModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for EmailModule {
    fn id(&self) -> ModuleId {
        ModuleId::Email
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_TEMPLATE)
    }

    fn load_data(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let (templates, source) = load_email_templates(ctx.fetcher);
        debug!(count = templates.len(), "email templates loaded");
        self.templates = templates;
        self.template_source = source;
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_TEMPLATE, ACTION_TEMPLATE_CHANGED),
            (ANCHOR_SUBJECT, ACTION_FIELD_EDITED),
            (ANCHOR_BODY, ACTION_FIELD_EDITED),
            (ANCHOR_ADD, ACTION_ADD),
            (ANCHOR_REMOVE, ACTION_REMOVE),
            (ANCHOR_IMPORT, ACTION_IMPORT),
            (ANCHOR_SEND, ACTION_SEND),
            (ANCHOR_CLEAR, ACTION_CLEAR),
        ] {
            let id = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.bind(id, action)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let select = ctx.host.require(&Self::selector(ANCHOR_TEMPLATE))?;
        let options = self
            .templates
            .iter()
            .map(|template| SelectOption::new(template.id.clone(), template.name.clone()))
            .collect();
        ctx.host.set_options(select, options)?;
        self.refresh_recipient_list(ctx)?;
        self.refresh_preview(ctx)?;
        let source = match self.template_source {
            TemplateSource::File => "template file",
            TemplateSource::BuiltIn => "built-in templates",
        };
        Self::set_status(ctx, &format!("Templates loaded from {source}"))
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_TEMPLATE_CHANGED => self.on_template_changed(ctx),
            ACTION_FIELD_EDITED => self.refresh_preview(ctx),
            ACTION_ADD => self.add_recipient(ctx),
            ACTION_REMOVE => self.remove_recipient(ctx),
            ACTION_IMPORT => self.import_recipients(ctx),
            ACTION_SEND => self.send(ctx),
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
    use fwrelease_assets::MemoryFetcher;
    use fwrelease_content::{parse_panel, Clock, ContentHost, TestClock};
    use fwrelease_loader::{run_initialize, InitOutcome, LoadedModule};

    const PANEL: &str = r#"
section "Compose Email"
  select #template-select "Template"
  input #email-subject "Subject"
  input #email-body "Body"
  input #recipient-input "Recipient"
  button #add-recipient "Add"
  button #remove-recipient "Remove"
  input #import-input "Paste recipients"
  button #import-recipients "Import"
  table #recipient-list
  text #email-preview
  button #send-email "Send"
  progress #send-progress
  button #clear-email "Clear"
  text #email-status
"#;

    struct Fixture {
        host: ContentHost,
        fetcher: MemoryFetcher,
        clock: TestClock,
        entry: LoadedModule,
    }

    fn fixture() -> Fixture {
        let mut host = parse_panel(PANEL).unwrap();
        let fetcher = MemoryFetcher::new();
        let clock = TestClock::new();
        let mut entry = LoadedModule {
            module: Box::new(EmailModule::with_seed(5)),
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
        }
    }

    fn act(fixture: &mut Fixture, action: &str) {
        let mut clipboard = None;
        let mut ctx = ModuleContext::new(
            &mut fixture.host,
            &fixture.fetcher,
            &fixture.clock,
            &mut clipboard,
        );
        fixture.entry.module.handle_action(action, &mut ctx).unwrap();
    }

    fn set_input(fixture: &mut Fixture, anchor: &str, value: &str) {
        let node = fixture
            .host
            .require(&Selector::parse(anchor).unwrap())
            .unwrap();
        fixture.host.set_value(node, value).unwrap();
    }

    fn status_text(fixture: &Fixture) -> String {
        let node = fixture
            .host
            .require(&Selector::parse(ANCHOR_STATUS).unwrap())
            .unwrap();
        fixture.host.text_of(node).unwrap().to_string()
    }

    #[test]
    fn template_selection_fills_subject_and_body() {
        let mut fixture = fixture();
        let select = fixture
            .host
            .require(&Selector::parse(ANCHOR_TEMPLATE).unwrap())
            .unwrap();
        fixture.host.select_value(select, "firmware_release").unwrap();
        act(&mut fixture, ACTION_TEMPLATE_CHANGED);

        let subject = fixture
            .host
            .require(&Selector::parse(ANCHOR_SUBJECT).unwrap())
            .unwrap();
        assert!(fixture
            .host
            .value_of(subject)
            .unwrap()
            .contains("{product}"));

        // The preview shows the substituted form.
        let preview = fixture
            .host
            .require(&Selector::parse(ANCHOR_PREVIEW).unwrap())
            .unwrap();
        let preview_text = fixture.host.text_of(preview).unwrap();
        assert!(preview_text.contains("GT-AX11000"));
        assert!(!preview_text.contains("{product}"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let mut fixture = fixture();
        set_input(&mut fixture, ANCHOR_RECIPIENT_INPUT, "not-an-address");
        act(&mut fixture, ACTION_ADD);
        assert!(status_text(&fixture).contains("valid email"));
    }

    #[test]
    fn add_and_remove_round_trip() {
        let mut fixture = fixture();
        set_input(&mut fixture, ANCHOR_RECIPIENT_INPUT, "qa@example.com");
        act(&mut fixture, ACTION_ADD);
        set_input(&mut fixture, ANCHOR_RECIPIENT_INPUT, "dev@example.com");
        act(&mut fixture, ACTION_ADD);

        // Duplicate adds are refused.
        set_input(&mut fixture, ANCHOR_RECIPIENT_INPUT, "qa@example.com");
        act(&mut fixture, ACTION_ADD);
        assert!(status_text(&fixture).contains("already"));

        set_input(&mut fixture, ANCHOR_RECIPIENT_INPUT, "qa@example.com");
        act(&mut fixture, ACTION_REMOVE);
        assert!(status_text(&fixture).contains("Removed qa@example.com"));
    }

    #[test]
    fn import_parses_mixed_separators() {
        let mut fixture = fixture();
        set_input(
            &mut fixture,
            ANCHOR_IMPORT_INPUT,
            "a@example.com, b@example.com;broken\nc@example.com",
        );
        act(&mut fixture, ACTION_IMPORT);
        assert!(status_text(&fixture).contains("Imported 3"));
        assert!(status_text(&fixture).contains("rejected 1"));
    }

    #[test]
    fn send_requires_recipients_and_content() {
        let mut fixture = fixture();
        act(&mut fixture, ACTION_SEND);
        assert!(status_text(&fixture).contains("at least one recipient"));

        set_input(&mut fixture, ANCHOR_RECIPIENT_INPUT, "qa@example.com");
        act(&mut fixture, ACTION_ADD);
        act(&mut fixture, ACTION_SEND);
        assert!(status_text(&fixture).contains("subject and body"));

        set_input(&mut fixture, ANCHOR_SUBJECT, "Release ready");
        set_input(&mut fixture, ANCHOR_BODY, "The build is on the share.");
        let before = fixture.clock.now_ms();
        act(&mut fixture, ACTION_SEND);
        assert!(status_text(&fixture).contains("sent to 1 recipient"));
        // Delivery consumed simulated time.
        assert!(fixture.clock.now_ms() > before);
    }
}
