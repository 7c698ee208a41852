//! Builder to construct a triage engine from configuration.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::{AuditSink, ScoringPolicy, TriageEngine, TriageError};
use crate::util::clock::Clock;

/// Fluent constructor for [`TriageEngine`].
pub struct EngineBuilder<S: ScoringPolicy> {
    policy: S,
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl<S: ScoringPolicy> EngineBuilder<S> {
    /// Start from `policy` with default configuration.
    pub fn new(policy: S) -> Self {
        Self {
            policy,
            config: EngineConfig::default(),
            clock: None,
            audit: None,
        }
    }

    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` for timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Record lifecycle events to `audit`.
    #[must_use]
    pub fn audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate the configuration and build the engine.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidConfig` if the configuration is invalid.
    pub fn build(self) -> Result<TriageEngine<S>, TriageError> {
        let mut engine = TriageEngine::new(self.policy, self.config)?;
        if let Some(clock) = self.clock {
            engine = engine.with_clock(clock);
        }
        if let Some(audit) = self.audit {
            engine = engine.with_audit(audit);
        }
        Ok(engine)
    }
}

/// Build an engine for `policy` from configuration loaded via
/// [`EngineConfig::from_env`].
///
/// # Errors
///
/// Fails if the configuration cannot be loaded or is invalid.
pub fn build_engine<S: ScoringPolicy>(policy: S) -> crate::core::AppResult<TriageEngine<S>> {
    let config = EngineConfig::from_env()?;
    Ok(EngineBuilder::new(policy).config(config).build()?)
}
