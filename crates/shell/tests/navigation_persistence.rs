//! Navigation resolution and persistence round-trips, driven through a
//! real shell with the shipped panel assets.

use std::path::Path;

use fwrelease_assets::DiskFetcher;
use fwrelease_content::TestClock;
use fwrelease_loader::ModuleRegistry;
use fwrelease_shell::{NavStateStore, Shell};
use tempfile::tempdir;

fn assets_fetcher() -> DiskFetcher {
    DiskFetcher::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets"))
}

fn new_shell(store: &NavStateStore, hash: Option<&str>) -> Shell {
    let mut registry = ModuleRegistry::new();
    fwrelease_modules::register_all(&mut registry).unwrap();
    Shell::new(
        registry,
        Box::new(assets_fetcher()),
        Box::new(TestClock::new()),
        store.clone(),
        hash,
    )
    .unwrap()
}

#[test]
fn navigation_persistence_round_trips_for_every_page() {
    for target in 0..3 {
        let dir = tempdir().unwrap();
        let store = NavStateStore::in_dir(dir.path());

        let mut shell = new_shell(&store, None);
        shell.show_main_page(target).unwrap();
        assert_eq!(shell.active_page(), target);
        drop(shell);

        // A fresh launch with no other signal must land on the same page.
        let relaunched = new_shell(&store, None);
        assert_eq!(relaunched.active_page(), target);
    }
}

#[test]
fn hash_token_wins_over_stored_value() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());
    store.write("0").unwrap();

    let shell = new_shell(&store, Some("manual"));
    assert_eq!(shell.active_page(), 2);
}

#[test]
fn invalid_stored_value_falls_back_to_default() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());

    for bad in ["banana", "7", "-1", ""] {
        std::fs::write(store.path(), bad).unwrap();
        let shell = new_shell(&store, None);
        assert_eq!(shell.active_page(), 0, "stored {bad:?} must fall back");
    }
}

#[test]
fn page_transition_updates_both_persisted_values() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());

    let mut shell = new_shell(&store, None);
    shell.show_main_page(1).unwrap();

    assert_eq!(store.read().as_deref(), Some("1"));
    assert_eq!(shell.hash(), Some("swpm"));

    // Simulated reload with no hash override resolves back to page 1.
    let relaunched = new_shell(&store, None);
    assert_eq!(relaunched.active_page(), 1);
}

#[test]
fn out_of_range_page_is_rejected_without_state_change() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());

    let mut shell = new_shell(&store, None);
    assert!(shell.show_main_page(3).is_err());
    assert_eq!(shell.active_page(), 0);
    assert_eq!(store.read(), None);
}

#[test]
fn external_navigation_recomputes_from_the_changed_token() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());

    let mut shell = new_shell(&store, None);
    shell.start();
    assert_eq!(shell.active_page(), 0);

    shell.handle_external_navigation(Some("manual"));
    assert_eq!(shell.active_page(), 2);

    // A token for the current page is a no-op.
    shell.handle_external_navigation(Some("manual"));
    assert_eq!(shell.active_page(), 2);

    // Without a token the stored value decides; nothing was persisted by
    // the external transitions themselves, so this falls back to 0.
    shell.handle_external_navigation(None);
    assert_eq!(shell.active_page(), 0);
}

#[test]
fn tab_selection_is_not_persisted() {
    let dir = tempdir().unwrap();
    let store = NavStateStore::in_dir(dir.path());

    let mut shell = new_shell(&store, None);
    shell.start();
    shell.select_tab(7).unwrap();
    assert_eq!(shell.active_tab_index(), 7);

    // Only the page index survives a relaunch; tabs reset to 0.
    let relaunched = new_shell(&store, None);
    assert_eq!(relaunched.active_tab_index(), 0);
}
