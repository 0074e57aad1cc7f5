//! Per-run collaborators, passed explicitly instead of living in globals.

use fundpie::{CacheRepository, FileCache, Selector};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::Result;
use crate::prompt::PromptSelector;

pub struct RunContext {
    pub cache: Box<dyn CacheRepository>,
    pub selector: Box<dyn Selector>,
    pub audit: AuditLog,
}

impl RunContext {
    pub fn new(
        cache: Box<dyn CacheRepository>,
        selector: Box<dyn Selector>,
        audit: AuditLog,
    ) -> Self {
        Self {
            cache,
            selector,
            audit,
        }
    }

    /// File cache, terminal prompts and the configured audit log.
    pub fn interactive(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Box::new(FileCache::new(&config.cache.dir)),
            Box::new(PromptSelector),
            AuditLog::open(&config.audit_path())?,
        ))
    }
}
