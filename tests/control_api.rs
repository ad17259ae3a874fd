//! Control endpoints served over a real listener.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use guardd::api::{ApiRequest, Endpoint, EndpointRegistry, Handler, Permission};
use guardd::control::{ControlModule, DEBUG_PATH, RESTART_PATH, SHUTDOWN_PATH};
use guardd::diagnostics::{DiagnosticAggregator, SectionKind};
use guardd::lifecycle::{LifecycleController, RESTART_ACK, SHUTDOWN_ACK};

struct Harness {
    registry: Arc<EndpointRegistry>,
    manager: Arc<SlowManager>,
    updater: Arc<CountingUpdater>,
}

fn harness(sources: guardd::diagnostics::DiagnosticSources, delay: Duration) -> Harness {
    let registry = Arc::new(EndpointRegistry::new());
    let manager = Arc::new(SlowManager::new(delay));
    let updater = Arc::new(CountingUpdater::default());

    let control = ControlModule::new(
        LifecycleController::new(manager.clone(), updater.clone()),
        DiagnosticAggregator::new(sources),
    );
    control.start(&registry).unwrap();

    Harness {
        registry,
        manager,
        updater,
    }
}

fn plain_headers() -> Vec<String> {
    SectionKind::ORDER
        .iter()
        .map(|kind| format!("**{}**:", kind.title()))
        .collect()
}

#[tokio::test]
async fn debug_report_defaults_to_plain_style() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let resp = client().get(url(addr, DEBUG_PATH)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();

    assert!(body.starts_with("**Version**:"), "{body}");
    assert_in_order(&body, &plain_headers());
}

#[tokio::test]
async fn debug_report_github_style() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let body = client()
        .get(url(addr, DEBUG_PATH))
        .query(&[("style", "github")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.starts_with("<details>\n<summary>Version") || body.starts_with("#### Version"));
    assert!(!body.contains("**Version**:"));
    let summaries: Vec<String> = SectionKind::ORDER
        .iter()
        .map(|kind| kind.title().to_string())
        .collect();
    assert_in_order(&body, &summaries);
}

#[tokio::test]
async fn repeated_style_uses_first_value() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let body = client()
        .get(url(addr, DEBUG_PATH))
        .query(&[("style", "github"), ("style", "plain")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.starts_with("<details>\n<summary>Version</summary>"), "{body}");
}

#[tokio::test]
async fn unknown_style_renders_like_plain() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;
    let client = client();

    let plain = client
        .get(url(addr, DEBUG_PATH))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let fancy = client
        .get(url(addr, DEBUG_PATH))
        .query(&[("style", "fancy")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(plain, fancy);
}

#[tokio::test]
async fn failing_source_costs_one_section() {
    let mut sources = stub_sources();
    sources.status = Arc::new(FailingSource("status store offline"));
    let h = harness(sources, Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let resp = client().get(url(addr, DEBUG_PATH)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();

    assert_in_order(&body, &plain_headers());
    assert!(body.contains("unavailable: status store offline"));
    assert!(body.contains("quad9 9.9.9.9:853 ok"));
}

#[tokio::test]
async fn shutdown_returns_before_stop_completes() {
    let h = harness(stub_sources(), Duration::from_millis(300));
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let resp = client()
        .post(url(addr, SHUTDOWN_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), SHUTDOWN_ACK);
    assert!(!h.manager.is_completed());

    tokio::time::timeout(Duration::from_secs(2), async {
        while !h.manager.is_completed() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("shutdown never completed");
    assert_eq!(h.manager.calls(), 1);
}

#[tokio::test]
async fn shutdown_requires_self_tier() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let resp = client()
        .post(url(addr, SHUTDOWN_PATH))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.manager.calls(), 0);
}

#[tokio::test]
async fn restart_requires_admin_tier() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;
    let client = client();

    let resp = client
        .post(url(addr, RESTART_PATH))
        .bearer_auth(USER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    assert_eq!(h.updater.calls(), 0);

    let resp = client
        .post(url(addr, RESTART_PATH))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), RESTART_ACK);
    assert_eq!(h.updater.calls(), 1);
}

#[tokio::test]
async fn self_tier_may_restart() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let resp = client()
        .post(url(addr, RESTART_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(h.updater.calls(), 1);
}

#[tokio::test]
async fn wrong_method_and_unknown_path() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;
    let client = client();

    let resp = client
        .get(url(addr, SHUTDOWN_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(h.manager.calls(), 0);

    let resp = client.get(url(addr, "core/nothing")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn lists_registered_endpoints() {
    let h = harness(stub_sources(), Duration::ZERO);
    let (addr, _shutdown) = spawn_api(h.registry.clone()).await;

    let body = client()
        .get(format!("http://{}/api/v1/endpoints", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let listed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let paths: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();

    assert_eq!(paths, vec![RESTART_PATH, SHUTDOWN_PATH, DEBUG_PATH]);
    let shutdown = &listed[1];
    assert_eq!(shutdown["method"], "POST");
    assert_eq!(shutdown["permission"], "self");
}

#[tokio::test]
async fn failed_registration_leaves_nothing_behind() {
    let registry = Arc::new(EndpointRegistry::new());
    registry
        .register(Endpoint {
            path: RESTART_PATH.to_string(),
            name: "Occupied".to_string(),
            description: String::new(),
            read: None,
            write: Some(Permission::Anyone),
            parameters: Vec::new(),
            handler: Handler::Action(Arc::new(|_: &ApiRequest| Ok("taken".to_string()))),
        })
        .unwrap();

    let manager = Arc::new(SlowManager::new(Duration::ZERO));
    let updater = Arc::new(CountingUpdater::default());
    let control = ControlModule::new(
        LifecycleController::new(manager.clone(), updater),
        DiagnosticAggregator::new(stub_sources()),
    );

    assert!(control.start(&registry).is_err());
    assert!(registry.get(SHUTDOWN_PATH).is_none());
    assert!(registry.get(DEBUG_PATH).is_none());
    assert_eq!(registry.len(), 1);

    let (addr, _shutdown) = spawn_api(registry).await;
    let resp = client()
        .post(url(addr, SHUTDOWN_PATH))
        .bearer_auth(SELF_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(manager.calls(), 0);
}
