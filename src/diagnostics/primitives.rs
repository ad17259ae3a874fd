//! Built-in section sources.
//!
//! Version, platform, last module error, unexpected logs and the stack dump
//! are owned by the daemon process itself rather than by a subsystem.

use std::backtrace::Backtrace;
use std::sync::Arc;

use sysinfo::System;
use tokio::runtime::RuntimeFlavor;

use crate::diagnostics::source::{ReportContext, SectionSource, SourceError};
use crate::lifecycle::ModuleManager;
use crate::observability::UnexpectedLogs;
use crate::report::{SectionBody, SectionFlags};

/// Build information of this binary.
pub struct VersionInfo {
    name: &'static str,
    version: &'static str,
    commit: Option<&'static str>,
}

impl VersionInfo {
    pub fn new(name: &'static str, version: &'static str, commit: Option<&'static str>) -> Self {
        Self {
            name,
            version,
            commit,
        }
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::new(
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            option_env!("GUARDD_GIT_COMMIT"),
        )
    }
}

impl SectionSource for VersionInfo {
    fn fill(&self, _ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        body.set_flags(SectionFlags::USE_CODE_SECTION);
        body.push_line(format!("{} {}", self.name, self.version));
        body.push_line(format!("commit: {}", self.commit.unwrap_or("unknown")));
        body.push_line(format!(
            "build: {}",
            if cfg!(debug_assertions) { "debug" } else { "release" }
        ));
        body.push_line(format!(
            "target: {}-{}",
            std::env::consts::ARCH,
            std::env::consts::OS
        ));
        Ok(())
    }
}

/// Operating system and runtime environment.
#[derive(Default)]
pub struct PlatformInfo;

impl SectionSource for PlatformInfo {
    fn fill(&self, ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        tracing::debug!(request_id = %ctx.request_id(), "Collecting platform info");

        let mut sys = System::new();
        sys.refresh_memory();

        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(0);
        let runtime = match ctx.runtime().map(|h| h.runtime_flavor()) {
            Some(RuntimeFlavor::CurrentThread) => "current_thread",
            Some(RuntimeFlavor::MultiThread) => "multi_thread",
            Some(_) => "other",
            None => "none",
        };

        body.set_flags(SectionFlags::USE_CODE_SECTION);
        body.push_line(format!(
            "os: {}",
            System::long_os_version().unwrap_or_else(|| "unknown".to_string())
        ));
        body.push_line(format!(
            "kernel: {}",
            System::kernel_version().unwrap_or_else(|| "unknown".to_string())
        ));
        body.push_line(format!("cpus: {}", cpus));
        body.push_line(format!("memory: {} MiB", sys.total_memory() / (1024 * 1024)));
        body.push_line(format!("runtime: {}", runtime));
        Ok(())
    }
}

/// Last error reported through the module manager.
pub struct LastModuleError {
    manager: Arc<dyn ModuleManager>,
}

impl LastModuleError {
    pub fn new(manager: Arc<dyn ModuleManager>) -> Self {
        Self { manager }
    }
}

impl SectionSource for LastModuleError {
    fn fill(&self, _ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        match self.manager.last_reported_error() {
            Some(error) => {
                body.set_flags(SectionFlags::USE_CODE_SECTION);
                body.push_line(format!("module: {}", error.module));
                body.push_line(format!("reported: {}", error.reported_at.to_rfc3339()));
                body.push_line(format!("error: {}", error.message));
            }
            None => body.push_line("none reported"),
        }
        Ok(())
    }
}

/// Recent WARN/ERROR log lines.
pub struct UnexpectedLogSection {
    logs: UnexpectedLogs,
}

impl UnexpectedLogSection {
    pub fn new(logs: UnexpectedLogs) -> Self {
        Self { logs }
    }
}

impl SectionSource for UnexpectedLogSection {
    fn fill(&self, _ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        let entries = self.logs.snapshot();
        if entries.is_empty() {
            body.push_line("no unexpected logs");
            return Ok(());
        }

        body.set_flags(SectionFlags::USE_CODE_SECTION | SectionFlags::USE_DISCLOSURE);
        body.extend_lines(entries.iter().map(ToString::to_string));
        Ok(())
    }
}

/// Runtime task counts plus a backtrace of the reporting thread.
#[derive(Default)]
pub struct StackDump;

impl SectionSource for StackDump {
    fn fill(&self, ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        body.set_flags(SectionFlags::USE_CODE_SECTION | SectionFlags::USE_DISCLOSURE);

        match ctx.runtime() {
            Some(handle) => {
                let metrics = handle.metrics();
                body.push_line(format!("runtime workers: {}", metrics.num_workers()));
                body.push_line(format!("alive tasks: {}", metrics.num_alive_tasks()));
            }
            None => body.push_line("runtime: none"),
        }

        let thread = std::thread::current();
        body.push_line(format!("thread: {}", thread.name().unwrap_or("unnamed")));
        body.push_line("");

        let backtrace = Backtrace::force_capture().to_string();
        body.extend_lines(backtrace.lines());
        Ok(())
    }
}
