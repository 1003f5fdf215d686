//! Shell-side lifecycle driver.
//! Shell 端的生命週期驅動器。
//!
//! One orchestration for every panel: bounded anchor wait, data load, event
//! binding, first render. Failures are rendered into the panel's own region
//! together with a retry affordance; they never escalate past this module.

use tracing::{info, warn};

use fwrelease_content::{await_anchor, ContentHost, Node, Selector, DEFAULT_ANCHOR_TIMEOUT_MS};

use crate::id::ModuleId;
use crate::module::{FeatureModule, ModuleContext, ModuleError};
use crate::registry::LoadedModule;

/// Reserved action fired by the retry button inside an error block.
pub const RETRY_ACTION: &str = "retry-initialize";

/// Anchor of the in-place error block.
pub const ERROR_ANCHOR: &str = "init-error";

/// What the driver reports back to the shell. There is deliberately no
/// error payload here: the failure has already been rendered in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Ready,
    Failed,
}

/// Runs the module's initialize sequence. Idempotent: safe to call again on
/// manual retry, and repeated runs never duplicate event bindings.
/// 執行模組的初始化流程；具冪等性，手動重試重複執行也不會造成綁定重複。
pub fn run_initialize(entry: &mut LoadedModule, ctx: &mut ModuleContext<'_>) -> InitOutcome {
    let id = entry.module.id();
    clear_error_block(ctx.host);

    match drive(entry.module.as_mut(), ctx) {
        Ok(()) => {
            entry.initialized = true;
            info!(module = %id, "module initialized");
            InitOutcome::Ready
        }
        Err(err) => {
            entry.initialized = false;
            warn!(module = %id, error = %err, "module initialization failed");
            render_error_block(ctx.host, id, &err);
            InitOutcome::Failed
        }
    }
}

fn drive(
    module: &mut dyn FeatureModule,
    ctx: &mut ModuleContext<'_>,
) -> Result<(), ModuleError> {
    let selector = module.anchor();
    await_anchor(ctx.host, &selector, DEFAULT_ANCHOR_TIMEOUT_MS, ctx.clock)?;
    module.load_data(ctx)?;
    module.bind_events(ctx)?;
    module.render(ctx)?;
    Ok(())
}

/// Routes a fired action to the owning module. The reserved retry action
/// re-runs the initialize sequence; any handler failure is rendered in
/// place like an initialization failure.
pub fn dispatch_action(entry: &mut LoadedModule, action: &str, ctx: &mut ModuleContext<'_>) {
    if action == RETRY_ACTION {
        run_initialize(entry, ctx);
        return;
    }

    let id = entry.module.id();
    if let Err(err) = entry.module.handle_action(action, ctx) {
        warn!(module = %id, action, error = %err, "action handler failed");
        clear_error_block(ctx.host);
        render_error_block(ctx.host, id, &err);
    }
}

fn clear_error_block(host: &mut ContentHost) {
    let selector = Selector::parse(&format!("#{ERROR_ANCHOR}")).expect("static selector");
    if let Some(id) = host.find(&selector) {
        let _ = host.detach(id);
    }
}

fn render_error_block(host: &mut ContentHost, id: ModuleId, err: &ModuleError) {
    let result = (|| {
        let section = host.insert(
            None,
            Node::section(format!("{} failed to initialize", id.title())).with_anchor(ERROR_ANCHOR),
        )?;
        host.insert(Some(section), Node::text(format!("Error: {err}")))?;
        let retry = host.insert(Some(section), Node::button("Retry"))?;
        host.bind(retry, RETRY_ACTION)?;
        Ok::<(), fwrelease_content::HostError>(())
    })();
    if let Err(render_err) = result {
        // The panel region is unusable; the tab-level error path still works.
        warn!(module = %id, error = %render_err, "failed to render error block");
    }
}
