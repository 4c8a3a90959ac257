mod common;

use common::Scripted;
use pulseboard::fmt::csv;
use pulseboard::{
    Monitor, ProbeResult, PulseError, SuspendChange, TargetRegistry, TargetStatus,
};
use std::sync::Arc;

fn board(transport: Arc<Scripted>, addresses: &[&str]) -> Monitor {
    Monitor::new(
        TargetRegistry::from_addresses(addresses.iter().copied()),
        transport,
    )
}

async fn wait_until_running(monitor: &Monitor) {
    while !monitor.snapshot().await.progress.running {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn one_up_one_down() {
    let transport = Arc::new(Scripted::new(&[
        ("ok.example.com", ProbeResult::reachable(200, 40)),
        ("down.example.com", ProbeResult::failed("dns error: no such host", 3)),
    ]));
    let monitor = board(transport, &["ok.example.com", "down.example.com"]);

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.stats.online, 1);
    assert_eq!(report.stats.offline, 1);

    let snap = monitor.snapshot().await;
    assert_eq!(snap.targets[0].status_code(), 200);
    assert_eq!(snap.targets[1].status_code(), 0);
    assert_eq!(snap.targets[1].status(), TargetStatus::Offline);
    assert_eq!(snap.targets[1].detail(), Some("dns error: no such host"));
    assert!(snap.targets.iter().all(|t| t.last_checked_at().is_some()));
}

#[tokio::test]
async fn cycle_resolves_when_every_probe_fails() {
    let transport = Arc::new(Scripted::new(&[]));
    let monitor = board(transport.clone(), &["a", "b", "c"]);

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.dispatched, 3);
    assert_eq!(report.stats.offline, 3);
    assert_eq!(transport.calls(), 3);

    let snap = monitor.snapshot().await;
    assert_eq!(snap.progress.completed, 3);
    assert_eq!(snap.progress.total, 3);
    assert_eq!(snap.stats.online + snap.stats.offline, snap.stats.total);
}

#[tokio::test]
async fn suspended_before_cycle_is_not_probed() {
    let transport = Arc::new(Scripted::new(&[
        ("a.example.com", ProbeResult::reachable(200, 5)),
        ("b.example.com", ProbeResult::reachable(200, 5)),
    ]));
    let monitor = board(transport.clone(), &["a.example.com", "b.example.com"]);
    monitor.toggle_suspend(1).await.unwrap();

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.dispatched, 1);
    assert_eq!(transport.calls(), 1);

    let snap = monitor.snapshot().await;
    assert_eq!(snap.targets[1].status(), TargetStatus::Suspended);
    assert_eq!(snap.stats.online, 1);
    assert_eq!(snap.stats.offline, 0);
    assert!(snap.stats.online + snap.stats.offline < snap.stats.total);
    assert_eq!(snap.progress.completed, 1);

    for t in &snap.targets {
        assert_eq!(t.is_suspended(), t.status() == TargetStatus::Suspended);
    }
}

#[tokio::test]
async fn suspension_during_flight_discards_result() {
    let scripted = Scripted::new(&[
        ("slow.example.com", ProbeResult::reachable(200, 900)),
        ("fast.example.com", ProbeResult::reachable(200, 5)),
    ])
    .holding("slow.example.com");
    let release = scripted.release.clone();
    let transport = Arc::new(scripted);
    let monitor = board(transport, &["slow.example.com", "fast.example.com"]);

    let toggler = async {
        wait_until_running(&monitor).await;
        assert_eq!(
            monitor.toggle_suspend(0).await.unwrap(),
            SuspendChange::Suspended
        );
        release.notify_one();
    };
    let (report, ()) = tokio::join!(monitor.run_cycle(), toggler);
    let report = report.unwrap();

    assert_eq!(report.dispatched, 2);
    assert_eq!(report.discarded, 1);

    let snap = monitor.snapshot().await;
    assert_eq!(snap.targets[0].status(), TargetStatus::Suspended);
    assert!(snap.targets[0].last_checked_at().is_none());
    assert_eq!(snap.progress.completed, 2);
    assert_eq!(snap.stats.online, 1);
}

#[tokio::test]
async fn overlapping_cycle_is_rejected() {
    let scripted =
        Scripted::new(&[("a.example.com", ProbeResult::reachable(200, 5))]).holding("a.example.com");
    let release = scripted.release.clone();
    let monitor = board(Arc::new(scripted), &["a.example.com"]);

    let second = async {
        wait_until_running(&monitor).await;
        let err = monitor.run_cycle().await.unwrap_err();
        release.notify_one();
        err
    };
    let (first, err) = tokio::join!(monitor.run_cycle(), second);

    assert!(matches!(err, PulseError::CycleInProgress));
    assert_eq!(first.unwrap().recorded, 1);
    assert!(!monitor.is_running());

    release.notify_one();
    assert!(monitor.run_cycle().await.is_ok());
}

#[tokio::test]
async fn resume_reprobes_exactly_once() {
    let transport = Arc::new(Scripted::new(&[(
        "a.example.com",
        ProbeResult::rejected(503, 12),
    )]));
    let monitor = board(transport.clone(), &["a.example.com"]);

    monitor.toggle_suspend(0).await.unwrap();
    let change = monitor.toggle_suspend(0).await.unwrap();
    assert!(matches!(change, SuspendChange::Resumed(ref d) if d.index == 0));
    assert_eq!(transport.calls(), 1);

    let snap = monitor.snapshot().await;
    assert_eq!(snap.targets[0].status(), TargetStatus::Offline);
    assert_eq!(snap.targets[0].status_code(), 503);
    assert_ne!(snap.targets[0].status(), TargetStatus::Suspended);
}

#[tokio::test]
async fn next_cycle_resets_active_targets() {
    let transport = Arc::new(Scripted::new(&[(
        "a.example.com",
        ProbeResult::reachable(200, 5),
    )]));
    let monitor = board(transport, &["a.example.com", "b.example.com"]);
    monitor.run_cycle().await.unwrap();
    monitor.toggle_suspend(1).await.unwrap();

    let rx = monitor.subscribe();
    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.dispatched, 1);
    let snap = rx.borrow().clone();
    assert_eq!(snap.targets[0].status(), TargetStatus::Online);
    assert_eq!(snap.targets[1].status(), TargetStatus::Suspended);
}

#[tokio::test]
async fn csv_export_after_cycle() {
    let transport = Arc::new(Scripted::new(&[(
        "ok.example.com",
        ProbeResult::reachable(200, 40),
    )]));
    let monitor = board(transport, &["ok.example.com", "down.example.com"]);
    monitor.run_cycle().await.unwrap();
    monitor.toggle_suspend(1).await.unwrap();

    let report = csv::to_csv(&monitor.snapshot().await.targets);
    let rows: Vec<&str> = report.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("\"ok.example.com\",Online,40,"));
    assert!(rows[1].ends_with(",200"));
    assert!(rows[2].starts_with("\"down.example.com\",Suspended,"));
}
