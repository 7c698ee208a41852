//! Laboratory order triage.
//!
//! Orders are ranked by test type and waiting time only. Technicians are
//! filtered by specialization, and busy technicians are penalised for
//! emergency orders so those land on the emptiest bench.

use serde::{Deserialize, Serialize};

use crate::config::AssignmentWeights;
use crate::core::{ScoreTier, ScoringPolicy, WorkerRecord};

const EMERGENCY_TESTS: [&str; 4] = ["cardiac", "blood_gas", "troponin", "emergency"];
const URGENT_TESTS: [&str; 3] = ["blood_sugar", "hemoglobin", "creatinine"];
const MINUTES_PER_TEST: u32 = 15;
const MS_PER_MINUTE: u128 = 60_000;

/// One requested test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabTest {
    /// Test name as booked.
    pub name: String,
}

impl LabTest {
    /// Build a test entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn matches_any(&self, keywords: &[&str]) -> bool {
        let name = self.name.to_lowercase();
        keywords.iter().any(|k| name.contains(k))
    }
}

/// Scoring inputs for a lab order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabOrderInputs {
    /// Requested tests.
    pub tests: Vec<LabTest>,
    /// Technician specialization required to run the order.
    pub specialization: Option<String>,
}

impl LabOrderInputs {
    /// Bench time estimate for the whole order.
    pub fn estimated_duration_minutes(&self) -> u32 {
        u32::try_from(self.tests.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(MINUTES_PER_TEST)
    }
}

/// Lab order policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabOrderPolicy;

impl ScoringPolicy for LabOrderPolicy {
    type Inputs = LabOrderInputs;

    fn name(&self) -> &'static str {
        "lab_order"
    }

    fn tier(&self, inputs: &LabOrderInputs) -> ScoreTier {
        if inputs.tests.iter().any(|t| t.matches_any(&EMERGENCY_TESTS)) {
            ScoreTier::Emergency
        } else if inputs.tests.iter().any(|t| t.matches_any(&URGENT_TESTS)) {
            ScoreTier::Urgent
        } else {
            ScoreTier::Routine
        }
    }

    fn urgency(&self, _inputs: &LabOrderInputs) -> f64 {
        0.0
    }

    fn required_tags(&self, inputs: &LabOrderInputs) -> Vec<String> {
        inputs.specialization.iter().cloned().collect()
    }

    fn estimated_duration_ms(&self, inputs: &LabOrderInputs) -> Option<u128> {
        Some(u128::from(inputs.estimated_duration_minutes()) * MS_PER_MINUTE)
    }

    fn assignment_adjustment(
        &self,
        inputs: &LabOrderInputs,
        worker: &WorkerRecord,
        weights: &AssignmentWeights,
    ) -> f64 {
        if self.tier(inputs) == ScoreTier::Emergency {
            -f64::from(worker.current_load) * weights.busy_penalty
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> LabOrderInputs {
        LabOrderInputs {
            tests: names.iter().map(|n| LabTest::new(*n)).collect(),
            specialization: None,
        }
    }

    #[test]
    fn test_emergency_keyword_wins_regardless_of_position() {
        let policy = LabOrderPolicy;
        assert_eq!(policy.tier(&order(&["Blood_Sugar", "Troponin I"])), ScoreTier::Emergency);
        assert_eq!(policy.tier(&order(&["hemoglobin"])), ScoreTier::Urgent);
        assert_eq!(policy.tier(&order(&["lipid panel"])), ScoreTier::Routine);
        assert_eq!(policy.tier(&order(&[])), ScoreTier::Routine);
    }

    #[test]
    fn test_duration_and_tags() {
        let mut inputs = order(&["a", "b", "c"]);
        assert_eq!(inputs.estimated_duration_minutes(), 45);
        assert_eq!(LabOrderPolicy.estimated_duration_ms(&inputs), Some(2_700_000));
        assert!(LabOrderPolicy.required_tags(&inputs).is_empty());
        inputs.specialization = Some("hematology".into());
        assert_eq!(LabOrderPolicy.required_tags(&inputs), vec!["hematology".to_string()]);
    }

    #[test]
    fn test_busy_penalty_only_for_emergency() {
        let weights = AssignmentWeights::default();
        let worker = WorkerRecord {
            id: "t1".into(),
            capacity: 3,
            current_load: 2,
            tags: std::collections::BTreeSet::new(),
            released_total: 0,
        };
        let emergency = order(&["cardiac enzymes"]);
        let routine = order(&["vitamin d"]);
        let penalty = LabOrderPolicy.assignment_adjustment(&emergency, &worker, &weights);
        assert!((penalty + 100.0).abs() < 1e-9);
        assert!(LabOrderPolicy.assignment_adjustment(&routine, &worker, &weights).abs() < 1e-9);
    }
}
