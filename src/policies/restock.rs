//! Medicine restock triage.
//!
//! Stock lines are triaged by how close they are to running out or expiring;
//! buyers who cover the item's category are preferred.

use serde::{Deserialize, Serialize};

use crate::config::AssignmentWeights;
use crate::core::{ScoreTier, ScoringPolicy, WorkerRecord};

/// Scoring inputs for a stock line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockInputs {
    /// Units on hand.
    pub current_stock: u32,
    /// Safety stock level.
    pub min_threshold: u32,
    /// Level at which a reorder is due.
    pub reorder_level: u32,
    /// Days until the nearest batch expires; negative when already expired.
    pub days_to_expiry: Option<i64>,
    /// Item importance, 1 (highest) to 5.
    pub item_priority: u8,
    /// Product category.
    pub category: Option<String>,
}

impl Default for StockInputs {
    fn default() -> Self {
        Self {
            current_stock: 0,
            min_threshold: 0,
            reorder_level: 0,
            days_to_expiry: None,
            item_priority: 3,
            category: None,
        }
    }
}

impl StockInputs {
    fn expired(&self) -> bool {
        self.days_to_expiry.is_some_and(|days| days <= 0)
    }

    fn expiry_pressure(&self) -> f64 {
        match self.days_to_expiry {
            Some(days) if days <= 0 => 50.0,
            Some(days) if days <= 30 => 45.0,
            Some(days) if days <= 90 => 30.0,
            _ => 0.0,
        }
    }
}

/// Restock policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestockPolicy;

impl ScoringPolicy for RestockPolicy {
    type Inputs = StockInputs;

    fn name(&self) -> &'static str {
        "restock"
    }

    fn tier(&self, inputs: &StockInputs) -> ScoreTier {
        if inputs.current_stock == 0 || inputs.expired() {
            ScoreTier::Critical
        } else if inputs.current_stock <= inputs.min_threshold {
            ScoreTier::Emergency
        } else if inputs.current_stock <= inputs.reorder_level {
            ScoreTier::Urgent
        } else if inputs.days_to_expiry.is_some_and(|days| days <= 30) {
            ScoreTier::SemiUrgent
        } else {
            ScoreTier::Routine
        }
    }

    fn urgency(&self, inputs: &StockInputs) -> f64 {
        let priority = f64::from(5 - inputs.item_priority.clamp(1, 5)) * 10.0;
        priority + inputs.expiry_pressure()
    }

    fn assignment_adjustment(
        &self,
        inputs: &StockInputs,
        worker: &WorkerRecord,
        weights: &AssignmentWeights,
    ) -> f64 {
        match &inputs.category {
            Some(category) if worker.has_tag(category) => weights.specialty_match_bonus,
            _ => 0.0,
        }
    }
}
