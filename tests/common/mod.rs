//! Shared stubs and helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guardd::api::{ApiServer, EndpointRegistry, Permission};
use guardd::config::{ApiKeyConfig, DaemonConfig};
use guardd::diagnostics::{DiagnosticSources, ReportContext, SectionSource, SourceError};
use guardd::lifecycle::{LifecycleError, ModuleError, ModuleManager, Shutdown, Updater};
use guardd::report::{SectionBody, SectionFlags};
use tokio::net::TcpListener;

pub const SELF_TOKEN: &str = "self-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";

/// Module manager whose shutdown takes `delay` to complete.
pub struct SlowManager {
    delay: Duration,
    pub calls: AtomicUsize,
    pub completed: AtomicBool,
}

impl SlowManager {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            completed: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleManager for SlowManager {
    async fn shutdown(&self) -> Result<(), LifecycleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_stopping(&self) -> bool {
        self.calls() > 0
    }

    fn last_reported_error(&self) -> Option<ModuleError> {
        None
    }
}

#[derive(Default)]
pub struct CountingUpdater {
    calls: AtomicUsize,
}

impl CountingUpdater {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Updater for CountingUpdater {
    fn restart_now(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Source that always writes the same lines.
pub struct FixedSource(pub &'static [&'static str]);

impl SectionSource for FixedSource {
    fn fill(&self, _ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        body.set_flags(SectionFlags::USE_CODE_SECTION | SectionFlags::USE_DISCLOSURE);
        body.extend_lines(self.0.iter().copied());
        Ok(())
    }
}

/// Source that always fails.
pub struct FailingSource(pub &'static str);

impl SectionSource for FailingSource {
    fn fill(&self, _ctx: &ReportContext, _body: &mut SectionBody) -> Result<(), SourceError> {
        Err(SourceError::Unavailable(self.0.to_string()))
    }
}

pub fn stub_sources() -> DiagnosticSources {
    DiagnosticSources {
        version: Arc::new(FixedSource(&["guardd 9.9.9"])),
        platform: Arc::new(FixedSource(&["os: testos"])),
        status: Arc::new(FixedSource(&["Security Level: normal"])),
        resolvers: Arc::new(FixedSource(&["1 configured", "quad9 9.9.9.9:853 ok"])),
        last_module_error: Arc::new(FixedSource(&["none reported"])),
        unexpected_logs: Arc::new(FixedSource(&["no unexpected logs"])),
        stack_dump: Arc::new(FixedSource(&["frame 0"])),
    }
}

pub fn config_with_keys() -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.lifecycle.shutdown_timeout_secs = 5;
    config.api.keys = vec![
        ApiKeyConfig {
            token: SELF_TOKEN.into(),
            permission: Permission::SelfOnly,
        },
        ApiKeyConfig {
            token: ADMIN_TOKEN.into(),
            permission: Permission::Admin,
        },
        ApiKeyConfig {
            token: USER_TOKEN.into(),
            permission: Permission::User,
        },
    ];
    config
}

/// Serve `registry` on an ephemeral port. Keep the returned `Shutdown`
/// alive for as long as the server should run.
pub async fn spawn_api(registry: Arc<EndpointRegistry>) -> (SocketAddr, Shutdown) {
    let config = config_with_keys();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = ApiServer::new(&config, registry);
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}/api/v1/{}", addr, path)
}

/// Positions of `titles` in `text`, asserting each one appears after the previous.
pub fn assert_in_order(text: &str, headers: &[String]) {
    let mut last = 0;
    for header in headers {
        let pos = text[last..]
            .find(header.as_str())
            .unwrap_or_else(|| panic!("missing or out of order: {header}\n{text}"));
        last += pos + header.len();
    }
}
