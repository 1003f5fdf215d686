//! The per-tab load sequence: fetch-once fragments, idempotent module
//! attachment, superseded-load discarding, and error isolation.

use std::fs;
use std::path::Path;

use fwrelease_assets::{DiskFetcher, MemoryFetcher};
use fwrelease_content::{Selector, TestClock};
use fwrelease_loader::{InitOutcome, ModuleId, ModuleRegistry, ERROR_ANCHOR};
use fwrelease_shell::{LoadOutcome, NavStateStore, Shell};
use fwrelease_tabs::{LoadStage, SlotContent};
use tempfile::tempdir;

fn assets_root() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets")
}

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    fwrelease_modules::register_all(&mut registry).unwrap();
    registry
}

fn disk_shell(store: &NavStateStore) -> Shell {
    Shell::new(
        registry(),
        Box::new(DiskFetcher::new(assets_root())),
        Box::new(TestClock::new()),
        store.clone(),
        None,
    )
    .unwrap()
}

/// Panels only, no data files: module data loads will fail in place.
fn panels_only_fetcher() -> MemoryFetcher {
    let mut fetcher = MemoryFetcher::new();
    for fragment in [
        "pages/firmware/redmine.panel",
        "pages/firmware/plm.panel",
        "pages/firmware/meeting-minutes.panel",
    ] {
        let text = fs::read_to_string(assets_root().join(fragment)).unwrap();
        fetcher.insert_text(fragment, text);
    }
    fetcher
}

#[test]
fn module_is_attached_once_across_reselects() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    let mut shell = disk_shell(&store);

    shell.start();
    shell.select_tab(1).unwrap();
    shell.select_tab(0).unwrap();
    shell.select_tab(0).unwrap();

    // Re-activating never re-constructs the singleton.
    assert_eq!(shell.registry().factory_runs(ModuleId::Redmine), 1);
    assert_eq!(shell.registry().factory_runs(ModuleId::FwSha256), 1);
    assert!(shell.registry().is_attached(ModuleId::Redmine));
}

#[test]
fn superseded_load_is_discarded_without_touching_content() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    let mut shell = disk_shell(&store);

    // Capture a load sequence, then navigate away before completing it.
    let stale = shell.begin_tab_load();
    shell.show_main_page(1).unwrap();
    let outcome = shell.complete_tab_load(stale).unwrap();
    assert_eq!(outcome, LoadOutcome::Superseded);

    // The abandoned tab still shows its placeholder: the stale sequence
    // did not mutate a tab the user already left.
    let firmware = &shell.pages()[0];
    assert!(matches!(
        firmware.tabs.tab(0).unwrap().content,
        SlotContent::Placeholder(_)
    ));
}

#[test]
fn static_tabs_load_without_a_module() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    let mut shell = disk_shell(&store);

    shell.show_main_page(1).unwrap();
    assert!(shell.active_slot().is_loaded());
    assert!(!shell.registry().is_attached(ModuleId::Redmine));
}

#[test]
fn fragment_fetch_failure_is_a_slot_level_error() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    // No assets at all: the very first fragment fetch fails.
    let mut shell = Shell::new(
        registry(),
        Box::new(MemoryFetcher::new()),
        Box::new(TestClock::new()),
        store.clone(),
        None,
    )
    .unwrap();

    shell.start();
    match shell.active_slot() {
        SlotContent::Failed { stage, .. } => assert_eq!(*stage, LoadStage::Fragment),
        other => panic!("expected slot failure, got {other:?}"),
    }
    // The failure does not poison the registry or other pages.
    assert!(!shell.registry().is_attached(ModuleId::Redmine));
}

#[test]
fn failed_module_data_is_isolated_to_its_own_region() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    let mut shell = Shell::new(
        registry(),
        Box::new(panels_only_fetcher()),
        Box::new(TestClock::new()),
        store.clone(),
        None,
    )
    .unwrap();

    // Redmine's catalog sources are missing: initialize fails in place.
    shell.start();
    assert!(shell.active_slot().is_loaded());
    let host = shell.active_host_mut().unwrap();
    let error_selector = Selector::parse(&format!("#{ERROR_ANCHOR}")).unwrap();
    assert!(host.find(&error_selector).is_some());

    // A different tab with no data dependency stays fully functional.
    shell.select_tab(7).unwrap();
    let outcome = {
        let ticket = shell.begin_tab_load();
        shell.complete_tab_load(ticket).unwrap()
    };
    assert_eq!(outcome, LoadOutcome::Ready(InitOutcome::Ready));

    let host = shell.active_host_mut().unwrap();
    assert!(host.find(&error_selector).is_none());
    let preview = host.find(&Selector::parse("#plm-preview").unwrap()).unwrap();
    assert_eq!(host.text_of(preview).unwrap(), "No data loaded");

    // Returning to the broken tab still shows its own error region.
    shell.select_tab(0).unwrap();
    let host = shell.active_host_mut().unwrap();
    assert!(host.find(&error_selector).is_some());
}

#[test]
fn slot_retry_action_reruns_the_whole_sequence() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    let mut shell = Shell::new(
        registry(),
        Box::new(MemoryFetcher::new()),
        Box::new(TestClock::new()),
        store.clone(),
        None,
    )
    .unwrap();

    shell.start();
    assert!(matches!(shell.active_slot(), SlotContent::Failed { .. }));

    // Retrying against the same broken fetcher fails again, cleanly.
    shell.fire_action(fwrelease_shell::RETRY_TAB_ACTION);
    assert!(matches!(shell.active_slot(), SlotContent::Failed { .. }));
}
