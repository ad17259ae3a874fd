//! System status subsystem.
//!
//! Holds the current security level and active threats as an immutable
//! snapshot that is swapped on every change, so readers never block writers.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{ReportContext, SectionSource, SourceError};
use crate::report::{SectionBody, SectionFlags};

/// How aggressively the daemon filters traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Off,
    #[default]
    Normal,
    High,
    Extreme,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityLevel::Off => "off",
            SecurityLevel::Normal => "normal",
            SecurityLevel::High => "high",
            SecurityLevel::Extreme => "extreme",
        };
        f.write_str(name)
    }
}

/// A detected threat affecting the security posture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threat {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Immutable status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemStatus {
    pub security_level: SecurityLevel,
    pub threats: Vec<Threat>,
}

#[derive(Default)]
pub struct StatusBoard {
    current: ArcSwap<SystemStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<SystemStatus> {
        self.current.load_full()
    }

    pub fn set_security_level(&self, level: SecurityLevel) {
        self.current.rcu(|status| SystemStatus {
            security_level: level,
            threats: status.threats.clone(),
        });
        tracing::info!(level = %level, "Security level changed");
    }

    /// Add or replace a threat by id.
    pub fn add_threat(&self, threat: Threat) {
        tracing::warn!(threat = %threat.id, name = %threat.name, "Threat detected");
        self.current.rcu(|status| {
            let mut next = SystemStatus::clone(status);
            next.threats.retain(|t| t.id != threat.id);
            next.threats.push(threat.clone());
            next
        });
    }

    pub fn clear_threats(&self) {
        self.current.rcu(|status| SystemStatus {
            security_level: status.security_level,
            threats: Vec::new(),
        });
    }

    /// Write the status into a debug report section.
    pub fn append_status_section(&self, body: &mut SectionBody) -> Result<(), SourceError> {
        let status = self.snapshot();

        body.set_flags(SectionFlags::ADD_CONTENT_LINE_BREAKS);
        body.push_line(format!("Security Level: {}", status.security_level));
        if status.threats.is_empty() {
            body.push_line("Threats: none");
        } else {
            body.push_line(format!("Threats: {}", status.threats.len()));
            for threat in &status.threats {
                body.push_line(format!(
                    "- {} ({}): {}",
                    threat.name, threat.id, threat.description
                ));
            }
        }
        Ok(())
    }
}

impl SectionSource for StatusBoard {
    fn fill(&self, _ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        self.append_status_section(body)
    }
}
