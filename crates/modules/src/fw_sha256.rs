//! Firmware path and SHA256 placeholder panel.
//! 韌體路徑與 SHA256 佔位產生面板。

use fwrelease_assets::{load_catalog, Catalog};
use fwrelease_content::{SelectOption, Selector};
use fwrelease_loader::{FeatureModule, ModuleContext, ModuleError, ModuleId};
use tracing::debug;

use crate::redmine::{build_firmware_path, firmware_file_name};
use crate::util::Placeholder;

const ANCHOR_PRODUCT: &str = "#fw-product-select";
const ANCHOR_FW_PATH: &str = "#fw-path";
const ANCHOR_SHA_PATH: &str = "#sha256-path";
const ANCHOR_DIGEST: &str = "#sha256-digest";
const ANCHOR_PREVIEW: &str = "#fw-preview";
const ANCHOR_GENERATE: &str = "#generate-links";
const ANCHOR_FW_LINK: &str = "#fw-download-link";
const ANCHOR_SHA_LINK: &str = "#sha256-download-link";
const ANCHOR_COPY_FW: &str = "#copy-fw-link";
const ANCHOR_COPY_SHA: &str = "#copy-sha-link";
const ANCHOR_RESET: &str = "#fw-reset";
const ANCHOR_STATUS: &str = "#fw-status";

const ACTION_PRODUCT_CHANGED: &str = "fw-sha256:product-changed";
const ACTION_PATH_EDITED: &str = "fw-sha256:path-edited";
const ACTION_GENERATE: &str = "fw-sha256:generate-links";
const ACTION_COPY_FW: &str = "fw-sha256:copy-fw-link";
const ACTION_COPY_SHA: &str = "fw-sha256:copy-sha-link";
const ACTION_RESET: &str = "fw-sha256:reset";

const DOWNLOAD_BASE_URL: &str = "https://fileserver.internal/download";

pub struct FwSha256Module {
    catalog: Option<Catalog>,
    placeholder: Placeholder,
}

impl FwSha256Module {
    pub fn new() -> Self {
        Self {
            catalog: None,
            placeholder: Placeholder::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            catalog: None,
            placeholder: Placeholder::from_seed(seed),
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

    fn on_product_changed(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let product = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?)?
            .map(str::to_string);
        let fw_node = ctx.host.require(&Self::selector(ANCHOR_FW_PATH))?;

        match product {
            Some(model) => {
                let base = self
                    .catalog
                    .as_ref()
                    .and_then(|catalog| catalog.find(&model))
                    .and_then(|record| record.fw_path.clone());
                match base {
                    Some(base) => {
                        let path = build_firmware_path(&base, &model, &mut self.placeholder);
                        ctx.host.set_value(fw_node, path)?;
                        // A fresh path gets a fresh placeholder digest.
                        let digest = ctx.host.require(&Self::selector(ANCHOR_DIGEST))?;
                        ctx.host.set_text(digest, self.placeholder.hex_hash(64))?;
                    }
                    None => {
                        ctx.host.set_value(fw_node, "")?;
                        Self::set_status(ctx, &format!("No FW path recorded for {model}"))?;
                    }
                }
            }
            None => {
                ctx.host.set_value(fw_node, "")?;
            }
        }
        self.refresh_derived(ctx)
    }

    /// Recomputes the SHA256 sibling path, the preview, and the generate
    /// button gate from the current firmware path.
    fn refresh_derived(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let fw_node = ctx.host.require(&Self::selector(ANCHOR_FW_PATH))?;
        let fw_path = ctx.host.value_of(fw_node)?.trim().to_string();
        let sha_node = ctx.host.require(&Self::selector(ANCHOR_SHA_PATH))?;
        let product = ctx
            .host
            .selected_value(ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?)?
            .map(str::to_string);

        let sha_path = if fw_path.is_empty() {
            String::new()
        } else {
            sha256_sibling_path(&fw_path)
        };
        ctx.host.set_value(sha_node, sha_path.clone())?;

        let preview = ctx.host.require(&Self::selector(ANCHOR_PREVIEW))?;
        let generate = ctx.host.require(&Self::selector(ANCHOR_GENERATE))?;
        match (&product, fw_path.is_empty()) {
            (Some(model), false) => {
                let file_name = firmware_file_name(&fw_path);
                ctx.host.set_text(
                    preview,
                    format!(
                        "Product: {model}\nFirmware: {file_name}\nSHA256: {}",
                        firmware_file_name(&sha_path)
                    ),
                )?;
                ctx.host.set_enabled(generate, true)?;
            }
            _ => {
                ctx.host.set_text(preview, "Select a product to generate paths…")?;
                ctx.host.set_enabled(generate, false)?;
            }
        }
        Ok(())
    }

    fn generate_links(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let fw_node = ctx.host.require(&Self::selector(ANCHOR_FW_PATH))?;
        let fw_path = ctx.host.value_of(fw_node)?.trim().to_string();
        if fw_path.is_empty() {
            Self::set_status(ctx, "Select a product and confirm the firmware path first")?;
            return Ok(());
        }
        let sha_node = ctx.host.require(&Self::selector(ANCHOR_SHA_PATH))?;
        let sha_path = ctx.host.value_of(sha_node)?.trim().to_string();

        let fw_link = ctx.host.require(&Self::selector(ANCHOR_FW_LINK))?;
        ctx.host.set_text(fw_link, download_url(&fw_path))?;
        let sha_link = ctx.host.require(&Self::selector(ANCHOR_SHA_LINK))?;
        ctx.host.set_text(sha_link, download_url(&sha_path))?;
        Self::set_status(ctx, "Download links generated")
    }

    fn copy_link(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        anchor: &str,
        what: &str,
    ) -> Result<(), ModuleError> {
        let node = ctx.host.require(&Self::selector(anchor))?;
        let text = ctx.host.text_of(node)?.to_string();
        if text.is_empty() {
            Self::set_status(ctx, "Generate the download links first")?;
            return Ok(());
        }
        ctx.copy_to_clipboard(text);
        Self::set_status(ctx, &format!("{what} link copied to clipboard"))
    }

    fn reset_form(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let product = ctx.host.require(&Self::selector(ANCHOR_PRODUCT))?;
        ctx.host.set_selected(product, None)?;
        for anchor in [ANCHOR_FW_PATH, ANCHOR_SHA_PATH] {
            let node = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_value(node, "")?;
        }
        for anchor in [ANCHOR_DIGEST, ANCHOR_FW_LINK, ANCHOR_SHA_LINK] {
            let node = ctx.host.require(&Self::selector(anchor))?;
            ctx.host.set_text(node, "")?;
        }
        self.refresh_derived(ctx)?;
        Self::set_status(ctx, "Form reset")
    }
}

impl Default for FwSha256Module {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureModule for FwSha256Module {
    fn id(&self) -> ModuleId {
        ModuleId::FwSha256
    }

    fn anchor(&self) -> Selector {
        Self::selector(ANCHOR_PRODUCT)
    }

    fn load_data(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let catalog = load_catalog(ctx.fetcher)?;
        debug!(products = catalog.records.len(), "fw-sha256 catalog ready");
        self.catalog = Some(catalog);
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        for (anchor, action) in [
            (ANCHOR_PRODUCT, ACTION_PRODUCT_CHANGED),
            (ANCHOR_FW_PATH, ACTION_PATH_EDITED),
            (ANCHOR_GENERATE, ACTION_GENERATE),
            (ANCHOR_COPY_FW, ACTION_COPY_FW),
            (ANCHOR_COPY_SHA, ACTION_COPY_SHA),
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
        self.refresh_derived(ctx)?;
        Self::set_status(ctx, "Ready")
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            ACTION_PRODUCT_CHANGED => self.on_product_changed(ctx),
            ACTION_PATH_EDITED => self.refresh_derived(ctx),
            ACTION_GENERATE => self.generate_links(ctx),
            ACTION_COPY_FW => self.copy_link(ctx, ANCHOR_FW_LINK, "Firmware"),
            ACTION_COPY_SHA => self.copy_link(ctx, ANCHOR_SHA_LINK, "SHA256"),
            ACTION_RESET => self.reset_form(ctx),
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }
}

/// The `.sha256` sibling of a firmware file path.
pub fn sha256_sibling_path(firmware_path: &str) -> String {
    format!("{firmware_path}.sha256")
}

/// Percent-encodes a share path into a download URL.
pub fn download_url(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    format!("{DOWNLOAD_BASE_URL}?file={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwrelease_assets::{MemoryFetcher, CATALOG_CSV_PATH};
    use fwrelease_content::{parse_panel, ContentHost, TestClock};
    use fwrelease_loader::{run_initialize, InitOutcome, LoadedModule};

    const PANEL: &str = r#"
section "Download FW & SHA256"
  select #fw-product-select "Product"
  input #fw-path "Firmware path"
  input #sha256-path "SHA256 path"
  text #sha256-digest
  text #fw-preview
  button #generate-links "Generate download links"
  text #fw-download-link
  text #sha256-download-link
  button #copy-fw-link "Copy firmware link"
  button #copy-sha-link "Copy SHA256 link"
  button #fw-reset "Reset"
  text #fw-status
"#;

    const SHEET: &str = "\
Model,APLM_ID,FW_Path,Redmine_Project
GT-AX11000,APLM-7,\\\\fileserver\\Public\\FW\\AX,fw-ax11000
";

    fn fixture() -> (ContentHost, MemoryFetcher, TestClock) {
        (
            parse_panel(PANEL).unwrap(),
            MemoryFetcher::new().with_text(CATALOG_CSV_PATH, SHEET),
            TestClock::new(),
        )
    }

    fn select_product(
        entry: &mut LoadedModule,
        host: &mut ContentHost,
        fetcher: &MemoryFetcher,
        clock: &TestClock,
    ) {
        let product = host.require(&Selector::parse(ANCHOR_PRODUCT).unwrap()).unwrap();
        host.select_value(product, "GT-AX11000").unwrap();
        let mut clipboard = None;
        let mut ctx = ModuleContext::new(host, fetcher, clock, &mut clipboard);
        entry
            .module
            .handle_action(ACTION_PRODUCT_CHANGED, &mut ctx)
            .unwrap();
    }

    fn initialized_entry(host: &mut ContentHost, fetcher: &MemoryFetcher, clock: &TestClock) -> LoadedModule {
        let mut entry = LoadedModule {
            module: Box::new(FwSha256Module::with_seed(3)),
            initialized: false,
        };
        let mut clipboard = None;
        let mut ctx = ModuleContext::new(host, fetcher, clock, &mut clipboard);
        assert_eq!(run_initialize(&mut entry, &mut ctx), InitOutcome::Ready);
        entry
    }

    #[test]
    fn product_selection_generates_both_paths_and_digest() {
        let (mut host, fetcher, clock) = fixture();
        let mut entry = initialized_entry(&mut host, &fetcher, &clock);
        select_product(&mut entry, &mut host, &fetcher, &clock);

        let fw_node = host.require(&Selector::parse(ANCHOR_FW_PATH).unwrap()).unwrap();
        let fw_path = host.value_of(fw_node).unwrap().to_string();
        assert!(fw_path.contains("GT-AX11000"));

        let sha_node = host.require(&Selector::parse(ANCHOR_SHA_PATH).unwrap()).unwrap();
        assert_eq!(host.value_of(sha_node).unwrap(), format!("{fw_path}.sha256"));

        let digest_node = host.require(&Selector::parse(ANCHOR_DIGEST).unwrap()).unwrap();
        let digest = host.text_of(digest_node).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_links_builds_encoded_urls() {
        let (mut host, fetcher, clock) = fixture();
        let mut entry = initialized_entry(&mut host, &fetcher, &clock);
        select_product(&mut entry, &mut host, &fetcher, &clock);

        let mut clipboard = None;
        {
            let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
            entry.module.handle_action(ACTION_GENERATE, &mut ctx).unwrap();
        }

        let link_node = host.require(&Selector::parse(ANCHOR_FW_LINK).unwrap()).unwrap();
        let link = host.text_of(link_node).unwrap();
        assert!(link.starts_with("https://fileserver.internal/download?file="));
        // Backslashes must be percent-encoded.
        assert!(link.contains("%5C"));
        assert!(!link.contains('\\'));
    }

    #[test]
    fn generate_without_path_reports_instead_of_failing() {
        let (mut host, fetcher, clock) = fixture();
        let mut entry = initialized_entry(&mut host, &fetcher, &clock);
        let mut clipboard = None;
        let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
        entry.module.handle_action(ACTION_GENERATE, &mut ctx).unwrap();

        let status = ctx
            .host
            .require(&Selector::parse(ANCHOR_STATUS).unwrap())
            .unwrap();
        assert!(ctx.host.text_of(status).unwrap().contains("Select a product"));
    }

    #[test]
    fn reset_clears_derived_fields() {
        let (mut host, fetcher, clock) = fixture();
        let mut entry = initialized_entry(&mut host, &fetcher, &clock);
        select_product(&mut entry, &mut host, &fetcher, &clock);

        let mut clipboard = None;
        {
            let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
            entry.module.handle_action(ACTION_RESET, &mut ctx).unwrap();
        }

        let fw_node = host.require(&Selector::parse(ANCHOR_FW_PATH).unwrap()).unwrap();
        assert_eq!(host.value_of(fw_node).unwrap(), "");
        let digest_node = host.require(&Selector::parse(ANCHOR_DIGEST).unwrap()).unwrap();
        assert_eq!(host.text_of(digest_node).unwrap(), "");
    }
}
