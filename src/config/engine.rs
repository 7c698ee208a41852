//! Engine configuration structures.
//!
//! Every weight and threshold the engine reads lives here, so behaviour is
//! reproducible from a single JSON document.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, ScoreTier};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "TRIAGE_CONFIG";

/// Weights composing an urgency score.
///
/// `score = tier_ordinal * tier_weight - urgency - wait_penalty - flag_bonus`,
/// with each subtracted term clamped to its maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Version of the weight set, bumped whenever defaults change.
    pub version: u32,
    /// Distance between adjacent tiers (K).
    pub tier_weight: f64,
    /// Cap on the policy's weighted urgency factors.
    pub max_urgency: f64,
    /// Penalty accrued per hour of waiting.
    pub wait_penalty_per_hour: f64,
    /// Cap on the waiting-time penalty.
    pub max_wait_penalty: f64,
    /// Cap on special-flag bonuses.
    pub max_flag_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            version: 1,
            tier_weight: 1000.0,
            max_urgency: 100.0,
            wait_penalty_per_hour: 10.0,
            max_wait_penalty: 100.0,
            max_flag_bonus: 500.0,
        }
    }
}

impl ScoringWeights {
    /// Validate weights; the sum of all adjustments must stay below one tier.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("tier_weight", self.tier_weight),
            ("max_urgency", self.max_urgency),
            ("wait_penalty_per_hour", self.wait_penalty_per_hour),
            ("max_wait_penalty", self.max_wait_penalty),
            ("max_flag_bonus", self.max_flag_bonus),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be finite and non-negative"));
            }
        }
        if self.tier_weight <= 0.0 {
            return Err("tier_weight must be greater than 0".into());
        }
        let adjustments = self.max_urgency + self.max_wait_penalty + self.max_flag_bonus;
        if adjustments >= self.tier_weight {
            return Err(format!(
                "adjustments ({adjustments}) must stay below tier_weight ({}) \
                 to prevent tier inversion",
                self.tier_weight
            ));
        }
        Ok(())
    }
}

/// Weights used to rank eligible workers for an entity (lower score wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentWeights {
    /// Cost per unit of current load (W1).
    pub load_weight: f64,
    /// Bonus subtracted for Critical entities.
    pub critical_bonus: f64,
    /// Bonus subtracted for Emergency entities.
    pub emergency_bonus: f64,
    /// Bonus subtracted for Urgent entities.
    pub urgent_bonus: f64,
    /// Bonus a policy may grant when a worker's tags match the entity.
    pub specialty_match_bonus: f64,
    /// Per-load penalty a policy may charge busy workers for high-tier work.
    pub busy_penalty: f64,
}

impl Default for AssignmentWeights {
    fn default() -> Self {
        Self {
            load_weight: 100.0,
            critical_bonus: 200.0,
            emergency_bonus: 100.0,
            urgent_bonus: 0.0,
            specialty_match_bonus: 50.0,
            busy_penalty: 50.0,
        }
    }
}

impl AssignmentWeights {
    /// Tier bonus subtracted from every candidate's assignment score.
    pub const fn tier_bonus(&self, tier: ScoreTier) -> f64 {
        match tier {
            ScoreTier::Critical => self.critical_bonus,
            ScoreTier::Emergency => self.emergency_bonus,
            ScoreTier::Urgent => self.urgent_bonus,
            ScoreTier::SemiUrgent | ScoreTier::Routine => 0.0,
        }
    }

    /// Validate weights.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("load_weight", self.load_weight),
            ("critical_bonus", self.critical_bonus),
            ("emergency_bonus", self.emergency_bonus),
            ("urgent_bonus", self.urgent_bonus),
            ("specialty_match_bonus", self.specialty_match_bonus),
            ("busy_penalty", self.busy_penalty),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be finite and non-negative"));
            }
        }
        Ok(())
    }
}

/// Fixed thresholds for bottleneck detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckThresholds {
    /// Report a backlog when more than this many top-tier entities wait.
    pub top_tier_backlog: usize,
    /// Report a backlog when more than this many entities wait in total.
    pub queue_backlog: usize,
    /// Report overload for workers above this utilization (percent).
    pub worker_utilization_pct: f64,
}

impl Default for BottleneckThresholds {
    fn default() -> Self {
        Self {
            top_tier_backlog: 2,
            queue_backlog: 10,
            worker_utilization_pct: 90.0,
        }
    }
}

impl BottleneckThresholds {
    /// Validate thresholds.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.worker_utilization_pct) {
            return Err("worker_utilization_pct must be within 0..=100".into());
        }
        Ok(())
    }
}

/// Worker registered when the engine is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker identifier.
    pub id: String,
    /// Maximum concurrent entities.
    pub capacity: u32,
    /// Specialization tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Root engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Score composition weights.
    pub scoring: ScoringWeights,
    /// Worker ranking weights.
    pub assignment: AssignmentWeights,
    /// Bottleneck thresholds.
    pub bottlenecks: BottleneckThresholds,
    /// Workers registered at build time.
    pub workers: Vec<WorkerConfig>,
}

impl EngineConfig {
    /// Validate all sections and the worker roster.
    pub fn validate(&self) -> Result<(), String> {
        self.scoring
            .validate()
            .map_err(|e| format!("scoring invalid: {e}"))?;
        self.assignment
            .validate()
            .map_err(|e| format!("assignment invalid: {e}"))?;
        self.bottlenecks
            .validate()
            .map_err(|e| format!("bottlenecks invalid: {e}"))?;
        let mut seen = std::collections::HashSet::new();
        for worker in &self.workers {
            if worker.id.is_empty() {
                return Err("worker id must not be empty".into());
            }
            if worker.capacity == 0 {
                return Err(format!("worker `{}` capacity must be greater than 0", worker.id));
            }
            if !seen.insert(worker.id.as_str()) {
                return Err(format!("worker `{}` defined twice", worker.id));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, parsed or validated.
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading triage config {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading triage config {}", path.display()))
    }

    /// Load `.env`, then read the file named by `TRIAGE_CONFIG`; defaults when unset.
    ///
    /// # Errors
    ///
    /// Fails if `TRIAGE_CONFIG` names a file that cannot be loaded.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}
