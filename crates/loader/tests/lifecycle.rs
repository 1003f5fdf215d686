//! Lifecycle driver behavior: idempotent initialization, in-place error
//! rendering, and recovery through the retry action.

use fwrelease_assets::MemoryFetcher;
use fwrelease_content::{Clock, ContentHost, Node, Selector, TestClock};
use fwrelease_loader::{
    dispatch_action, run_initialize, FeatureModule, InitOutcome, ModuleContext, ModuleError,
    ModuleId, ModuleRegistry, ERROR_ANCHOR, RETRY_ACTION,
};

/// Minimal panel: one button that appends a mark to a text node each time
/// its action fires. Lets tests count observable effects precisely.
struct CounterModule {
    fired: u32,
}

impl CounterModule {
    fn new() -> Self {
        Self { fired: 0 }
    }
}

impl FeatureModule for CounterModule {
    fn id(&self) -> ModuleId {
        ModuleId::Plm
    }

    fn anchor(&self) -> Selector {
        Selector::parse("#plm-preview").unwrap()
    }

    fn load_data(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn bind_events(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let button = ctx.host.require(&Selector::parse("#process-data").unwrap())?;
        ctx.host.bind(button, "process-data")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let preview = ctx.host.require(&self.anchor())?;
        ctx.host.set_text(preview, "ready")?;
        Ok(())
    }

    fn handle_action(
        &mut self,
        action: &str,
        ctx: &mut ModuleContext<'_>,
    ) -> Result<(), ModuleError> {
        match action {
            "process-data" => {
                self.fired += 1;
                let preview = ctx.host.require(&self.anchor())?;
                ctx.host.set_text(preview, format!("processed {}", self.fired))?;
                Ok(())
            }
            other => Err(ModuleError::UnknownAction {
                module: self.id(),
                action: other.to_string(),
            }),
        }
    }
}

fn fragment_host() -> ContentHost {
    let mut host = ContentHost::new();
    let section = host.insert(None, Node::section("PLM")).unwrap();
    host.insert(Some(section), Node::text("").with_anchor("plm-preview"))
        .unwrap();
    host.insert(Some(section), Node::button("Process").with_anchor("process-data"))
        .unwrap();
    host
}

fn registry_with_counter() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry
        .register(ModuleId::Plm, Box::new(|| Ok(Box::new(CounterModule::new()))))
        .unwrap();
    registry
}

#[test]
fn double_initialize_produces_single_action_effect() {
    let mut registry = registry_with_counter();
    let mut host = fragment_host();
    let fetcher = MemoryFetcher::new();
    let clock = TestClock::new();
    let mut clipboard = None;

    let entry = registry.ensure_loaded(ModuleId::Plm).unwrap();
    {
        let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
        assert_eq!(run_initialize(entry, &mut ctx), InitOutcome::Ready);
        assert_eq!(run_initialize(entry, &mut ctx), InitOutcome::Ready);

        // One fired action must yield exactly one observable effect.
        dispatch_action(entry, "process-data", &mut ctx);
    }

    let preview = host.require(&Selector::parse("#plm-preview").unwrap()).unwrap();
    assert_eq!(host.text_of(preview).unwrap(), "processed 1");
}

#[test]
fn missing_anchor_times_out_and_renders_error_block() {
    let mut registry = registry_with_counter();
    // Fragment without the expected anchor: the bounded wait must expire.
    let mut host = ContentHost::new();
    host.insert(None, Node::section("PLM")).unwrap();
    let fetcher = MemoryFetcher::new();
    let clock = TestClock::new();
    let mut clipboard = None;

    let entry = registry.ensure_loaded(ModuleId::Plm).unwrap();
    let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
    assert_eq!(run_initialize(entry, &mut ctx), InitOutcome::Failed);
    assert!(!entry.initialized);
    // The whole 5000 ms window elapsed on the test clock.
    assert!(clock.now_ms() >= 5_000);

    let error_block = ctx
        .host
        .find(&Selector::parse(&format!("#{ERROR_ANCHOR}")).unwrap());
    assert!(error_block.is_some(), "error block must be rendered in place");
}

#[test]
fn retry_action_recovers_after_fragment_appears() {
    let mut registry = registry_with_counter();
    let mut host = ContentHost::new();
    host.insert(None, Node::section("PLM")).unwrap();
    let fetcher = MemoryFetcher::new();
    let clock = TestClock::new();
    let mut clipboard = None;

    let entry = registry.ensure_loaded(ModuleId::Plm).unwrap();
    {
        let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
        assert_eq!(run_initialize(entry, &mut ctx), InitOutcome::Failed);
    }

    // The fragment content arrives late (e.g. after a manual reload).
    let section = host.insert(None, Node::section("PLM data")).unwrap();
    host.insert(Some(section), Node::text("").with_anchor("plm-preview"))
        .unwrap();
    host.insert(Some(section), Node::button("Process").with_anchor("process-data"))
        .unwrap();

    let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
    dispatch_action(entry, RETRY_ACTION, &mut ctx);
    assert!(entry.initialized);

    let error_block = ctx
        .host
        .find(&Selector::parse(&format!("#{ERROR_ANCHOR}")).unwrap());
    assert!(error_block.is_none(), "error block must be cleared on recovery");
}

#[test]
fn failed_action_renders_error_without_escalating() {
    let mut registry = registry_with_counter();
    let mut host = fragment_host();
    let fetcher = MemoryFetcher::new();
    let clock = TestClock::new();
    let mut clipboard = None;

    let entry = registry.ensure_loaded(ModuleId::Plm).unwrap();
    let mut ctx = ModuleContext::new(&mut host, &fetcher, &clock, &mut clipboard);
    run_initialize(entry, &mut ctx);
    dispatch_action(entry, "no-such-action", &mut ctx);

    let error_block = ctx
        .host
        .find(&Selector::parse(&format!("#{ERROR_ANCHOR}")).unwrap());
    assert!(error_block.is_some());
}
