//! Policy whose inputs carry their own tier and factors.
//!
//! Used for generic domains such as support tickets, where the caller already
//! knows the priority class, and for deterministic tests.

use serde::{Deserialize, Serialize};

use crate::core::{ScoreTier, ScoringPolicy};

/// Pre-computed scoring inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplicitInputs {
    /// Priority class.
    pub tier: ScoreTier,
    /// Urgency factors, already weighted.
    #[serde(default)]
    pub urgency: f64,
    /// Special-flag bonus.
    #[serde(default)]
    pub flag_bonus: f64,
    /// Tags a worker must carry.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExplicitInputs {
    /// Inputs with only a tier.
    pub const fn new(tier: ScoreTier) -> Self {
        Self {
            tier,
            urgency: 0.0,
            flag_bonus: 0.0,
            tags: Vec::new(),
        }
    }

    /// Set the urgency factor sum.
    #[must_use]
    pub fn with_urgency(mut self, urgency: f64) -> Self {
        self.urgency = urgency;
        self
    }

    /// Set the flag bonus.
    #[must_use]
    pub fn with_flag_bonus(mut self, flag_bonus: f64) -> Self {
        self.flag_bonus = flag_bonus;
        self
    }

    /// Require a worker tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Pass-through policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitPolicy;

impl ScoringPolicy for ExplicitPolicy {
    type Inputs = ExplicitInputs;

    fn name(&self) -> &'static str {
        "explicit"
    }

    fn tier(&self, inputs: &ExplicitInputs) -> ScoreTier {
        inputs.tier
    }

    fn urgency(&self, inputs: &ExplicitInputs) -> f64 {
        inputs.urgency
    }

    fn flag_bonus(&self, inputs: &ExplicitInputs) -> f64 {
        inputs.flag_bonus
    }

    fn required_tags(&self, inputs: &ExplicitInputs) -> Vec<String> {
        inputs.tags.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_with_defaults() {
        let inputs: ExplicitInputs = serde_json::from_str(r#"{ "tier": "semi_urgent" }"#).unwrap();
        assert_eq!(inputs, ExplicitInputs::new(ScoreTier::SemiUrgent));
    }

    #[test]
    fn test_builder_methods() {
        let inputs = ExplicitInputs::new(ScoreTier::Urgent)
            .with_urgency(12.0)
            .with_flag_bonus(3.0)
            .with_tag("billing");
        assert!((ExplicitPolicy.urgency(&inputs) - 12.0).abs() < f64::EPSILON);
        assert!((ExplicitPolicy.flag_bonus(&inputs) - 3.0).abs() < f64::EPSILON);
        assert_eq!(ExplicitPolicy.required_tags(&inputs), vec!["billing".to_string()]);
    }
}
