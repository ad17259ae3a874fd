//! Whole-daemon shutdown and restart over the control API.

mod common;

use std::time::Duration;

use common::*;
use guardd::control::{DEBUG_PATH, RESTART_PATH, SHUTDOWN_PATH};
use guardd::diagnostics::SectionKind;
use guardd::lifecycle::{Daemon, ExitReason, ModuleManager, RESTART_EXIT_CODE};
use guardd::observability::UnexpectedLogs;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

type Spawned = (
    std::net::SocketAddr,
    std::sync::Arc<guardd::lifecycle::Modules>,
    JoinHandle<ExitReason>,
);

async fn spawn_daemon() -> Spawned {
    spawn_daemon_with(config_with_keys()).await
}

async fn spawn_daemon_with(config: guardd::DaemonConfig) -> Spawned {
    let daemon = Daemon::bring_up(&config, UnexpectedLogs::new(8)).unwrap();
    let modules = daemon.modules.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move { daemon.run(listener).await.unwrap() });

    (addr, modules, handle)
}

#[tokio::test]
async fn shutdown_over_api_stops_the_daemon() {
    let (addr, modules, handle) = spawn_daemon().await;

    let resp = client()
        .post(url(addr, SHUTDOWN_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "shutdown initiated");

    let reason = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
    assert_eq!(reason, ExitReason::Shutdown);
    assert_eq!(reason.exit_code(), 0);
    assert!(modules.is_stopping());
    assert!(modules.last_reported_error().is_none());

    // A second shutdown after the fact is a no-op.
    modules.shutdown().await.unwrap();
}

#[tokio::test]
async fn restart_over_api_exits_with_restart_code() {
    let (addr, _modules, handle) = spawn_daemon().await;

    let resp = client()
        .post(url(addr, RESTART_PATH))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "restart initiated");

    let reason = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
    assert_eq!(reason, ExitReason::Restart);
    assert_eq!(reason.exit_code(), RESTART_EXIT_CODE);
}

#[tokio::test]
async fn forbidden_restart_keeps_the_daemon_running() {
    let (addr, modules, handle) = spawn_daemon().await;
    let client = client();

    let resp = client
        .post(url(addr, RESTART_PATH))
        .bearer_auth(USER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!modules.is_stopping());
    assert!(!handle.is_finished());

    let resp = client
        .post(url(addr, SHUTDOWN_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
}

#[tokio::test]
async fn live_debug_report_has_every_section() {
    let (addr, modules, handle) = spawn_daemon().await;

    let body = client()
        .get(url(addr, DEBUG_PATH))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let headers: Vec<String> = SectionKind::ORDER
        .iter()
        .map(|kind| format!("**{}**:", kind.title()))
        .collect();
    assert_in_order(&body, &headers);
    assert!(body.contains(env!("CARGO_PKG_VERSION")));
    assert!(body.contains("none reported"));

    modules.shutdown().await.ok();
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
}

#[tokio::test]
async fn stalled_connection_cannot_hold_the_daemon_open() {
    let mut config = config_with_keys();
    config.lifecycle.shutdown_timeout_secs = 1;
    let (addr, modules, handle) = spawn_daemon_with(config).await;

    // Request headers never finish, so graceful draining would wait forever.
    let mut stalled = TcpStream::connect(addr).await.unwrap();
    stalled
        .write_all(b"GET /api/v1/debug/core HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();

    let resp = client()
        .post(url(addr, SHUTDOWN_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let reason = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon kept running past its stop deadline")
        .unwrap();
    assert_eq!(reason, ExitReason::Shutdown);

    let last = modules.last_reported_error().expect("overrun should be reported");
    assert_eq!(last.module, "core");
    drop(stalled);
}
