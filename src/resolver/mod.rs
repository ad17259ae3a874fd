//! DNS resolver registry.
//!
//! Tracks the configured upstream resolvers and whether each one is
//! currently failing. Resolution itself lives elsewhere.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::ResolverConfig;
use crate::diagnostics::{ReportContext, SectionSource, SourceError};
use crate::report::{SectionBody, SectionFlags};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    pub name: String,
    pub address: String,
    pub failing: bool,
}

#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: ArcSwap<Vec<Resolver>>,
}

impl ResolverRegistry {
    pub fn from_config(configs: &[ResolverConfig]) -> Self {
        let resolvers = configs
            .iter()
            .map(|c| Resolver {
                name: c.name.clone(),
                address: c.address.clone(),
                failing: false,
            })
            .collect();
        Self {
            resolvers: ArcSwap::from_pointee(resolvers),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Resolver>> {
        self.resolvers.load_full()
    }

    /// Update the failing flag of a resolver. Returns false if unknown.
    pub fn mark_failing(&self, name: &str, failing: bool) -> bool {
        if !self.snapshot().iter().any(|r| r.name == name) {
            return false;
        }

        self.resolvers.rcu(|current| {
            current
                .iter()
                .map(|r| {
                    let mut r = r.clone();
                    if r.name == name {
                        r.failing = failing;
                    }
                    r
                })
                .collect::<Vec<_>>()
        });
        if failing {
            tracing::warn!(resolver = %name, "Resolver marked failing");
        }
        true
    }

    /// Write resolver state into a debug report section.
    pub fn append_resolver_section(&self, body: &mut SectionBody) -> Result<(), SourceError> {
        let resolvers = self.snapshot();

        body.set_flags(SectionFlags::USE_CODE_SECTION);
        body.push_line(format!("{} configured", resolvers.len()));
        for resolver in resolvers.iter() {
            body.push_line(format!(
                "{} {} {}",
                resolver.name,
                resolver.address,
                if resolver.failing { "failing" } else { "ok" }
            ));
        }
        Ok(())
    }
}

impl SectionSource for ResolverRegistry {
    fn fill(&self, _ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError> {
        self.append_resolver_section(body)
    }
}
