//! Registry reconciliation laws
//!
//! A sweep is `clear_all_active`, then `mark_seen`/`insert` for every pipe
//! present, then `reap_inactive`. After it the registry names exactly the
//! pipes that were present, in first-seen order.

use syslogger_core::PipeRegistry;

fn sweep(registry: &mut PipeRegistry, present: &[&str]) {
    registry.clear_all_active();
    for name in present {
        if !registry.mark_seen(name) {
            registry.insert(name);
        }
    }
    registry.reap_inactive();
}

#[test]
fn sweep_tracks_directory_contents() {
    let mut registry = PipeRegistry::create();

    sweep(&mut registry, &["p1", "p2", "p3"]);
    assert_eq!(registry.names(), vec!["p1", "p2", "p3"]);

    sweep(&mut registry, &["p2", "p4"]);
    assert_eq!(registry.names(), vec!["p2", "p4"]);

    sweep(&mut registry, &["p4", "p2", "p5"]);
    assert_eq!(registry.names(), vec!["p2", "p4", "p5"]);

    sweep(&mut registry, &[]);
    assert!(registry.is_empty());
}

#[test]
fn placeholder_is_reused_after_emptying() {
    let mut registry = PipeRegistry::create();
    let placeholder = registry.head();

    sweep(&mut registry, &["p1"]);
    assert_eq!(registry.head(), placeholder);

    sweep(&mut registry, &[]);
    let fresh = registry.head();
    assert!(registry.get(fresh).unwrap().is_placeholder());

    let handle = registry.insert("p2");
    assert_eq!(handle, fresh);
    assert_eq!(registry.names(), vec!["p2"]);
}

#[test]
fn worker_removal_between_sweeps() {
    let mut registry = PipeRegistry::create();
    sweep(&mut registry, &["p1", "p2", "p3"]);

    // A worker finished and deleted its pipe before the next sweep
    assert!(registry.remove("p2").is_some());
    sweep(&mut registry, &["p1", "p3"]);

    assert_eq!(registry.names(), vec!["p1", "p3"]);
    assert!(registry.iter().all(|e| e.is_active()));
}

#[test]
fn large_churn_keeps_order() {
    let mut registry = PipeRegistry::create();
    let names: Vec<String> = (0..200).map(|i| format!("syslogger{}n{}", i, i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    sweep(&mut registry, &refs);
    let survivors: Vec<&str> = refs.iter().copied().filter(|n| n.len() % 2 == 0).collect();
    sweep(&mut registry, &survivors);

    assert_eq!(registry.names(), survivors);
    assert_eq!(registry.len(), survivors.len());
}
