//! Email template table with built-in defaults.
//! 電子郵件範本表，附內建預設值。

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fetch::Fetcher;

/// Relative path of the optional template override file.
pub const EMAIL_TEMPLATES_PATH: &str = "datasheet/email-templates.json";

/// One reusable email template. `{placeholders}` in subject and body are
/// substituted by the email panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// Where the loaded templates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    File,
    BuiltIn,
}

static DEFAULT_TEMPLATES: Lazy<Vec<EmailTemplate>> = Lazy::new(|| {
    vec![
        EmailTemplate {
            id: "firmware_release".into(),
            name: "Firmware Release Notification".into(),
            subject: "[FIRMWARE] New Firmware Release - {product} v{version}".into(),
            body: "Dear Team,\n\nA new firmware release is now available:\n\n\
                   Product: {product}\nVersion: {version}\nRelease Date: {date}\n\
                   Path: {firmware_path}\n\n\
                   Please update your testing environment accordingly.\n\n\
                   Best regards,\nFirmware Team"
                .into(),
        },
        EmailTemplate {
            id: "test_complete".into(),
            name: "Testing Complete Notification".into(),
            subject: "[TESTING] Firmware Testing Complete - {product} v{version}".into(),
            body: "Dear Team,\n\nFirmware testing has been completed:\n\n\
                   Product: {product}\nVersion: {version}\nTest Status: {status}\n\
                   Issues Found: {issues_count}\n\n\
                   Please review the test results and proceed accordingly.\n\n\
                   Best regards,\nQA Team"
                .into(),
        },
        EmailTemplate {
            id: "bug_report".into(),
            name: "Bug Report Template".into(),
            subject: "[BUG] Issue Found in {product} v{version}".into(),
            body: "Bug Report:\n\nProduct: {product}\nVersion: {version}\n\
                   Severity: {severity}\nDescription: {description}\n\
                   Steps to Reproduce: {steps}\nExpected Result: {expected}\n\
                   Actual Result: {actual}\n\nReporter: {reporter}\nDate: {date}"
                .into(),
        },
    ]
});

/// Loads templates from the override file, falling back to the built-in set
/// when the file is absent, malformed, or empty.
/// 自覆寫檔載入範本；檔案缺漏、格式錯誤或為空時使用內建範本。
pub fn load_email_templates(fetcher: &dyn Fetcher) -> (Vec<EmailTemplate>, TemplateSource) {
    match fetcher.fetch_text(EMAIL_TEMPLATES_PATH) {
        Ok(text) => match serde_json::from_str::<Vec<EmailTemplate>>(&text) {
            Ok(templates) if !templates.is_empty() => (templates, TemplateSource::File),
            Ok(_) => {
                warn!("email template file is empty, using built-in templates");
                (DEFAULT_TEMPLATES.clone(), TemplateSource::BuiltIn)
            }
            Err(err) => {
                warn!(%err, "email template file is malformed, using built-in templates");
                (DEFAULT_TEMPLATES.clone(), TemplateSource::BuiltIn)
            }
        },
        Err(_) => (DEFAULT_TEMPLATES.clone(), TemplateSource::BuiltIn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;

    #[test]
    fn built_in_templates_are_used_when_file_missing() {
        let (templates, source) = load_email_templates(&MemoryFetcher::new());
        assert_eq!(source, TemplateSource::BuiltIn);
        assert_eq!(templates.len(), 3);
        assert!(templates.iter().any(|t| t.id == "firmware_release"));
    }

    #[test]
    fn file_templates_take_precedence() {
        let fetcher = MemoryFetcher::new().with_text(
            EMAIL_TEMPLATES_PATH,
            r#"[{"id":"custom","name":"Custom","subject":"s {product}","body":"b"}]"#,
        );
        let (templates, source) = load_email_templates(&fetcher);
        assert_eq!(source, TemplateSource::File);
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "custom");
    }

    #[test]
    fn malformed_file_falls_back_to_built_ins() {
        let fetcher = MemoryFetcher::new().with_text(EMAIL_TEMPLATES_PATH, "{not json");
        let (_, source) = load_email_templates(&fetcher);
        assert_eq!(source, TemplateSource::BuiltIn);
    }
}
