//! Emergency-department patient triage.

use serde::{Deserialize, Serialize};

use crate::config::AssignmentWeights;
use crate::core::{ScoreTier, ScoringPolicy, WorkerRecord};

/// Level of consciousness at triage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consciousness {
    /// Awake and oriented.
    #[default]
    Alert,
    /// Disoriented.
    Confused,
    /// Hard to keep awake.
    Drowsy,
    /// Responds to nothing.
    Unresponsive,
    /// Not conscious.
    Unconscious,
}

impl Consciousness {
    const fn is_impaired(self) -> bool {
        matches!(self, Self::Confused | Self::Drowsy)
    }

    const fn is_lost(self) -> bool {
        matches!(self, Self::Unresponsive | Self::Unconscious)
    }
}

/// Vital signs recorded at triage. Missing fields default to normal adult values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalSigns {
    /// Body temperature, Fahrenheit.
    pub temperature: f64,
    /// Systolic blood pressure, mmHg.
    pub bp_systolic: u32,
    /// Diastolic blood pressure, mmHg.
    pub bp_diastolic: u32,
    /// Beats per minute.
    pub heart_rate: u32,
    /// Breaths per minute.
    pub respiratory_rate: u32,
    /// SpO2 percent.
    pub oxygen_saturation: f64,
    /// Self-reported pain, 0 to 10.
    pub pain_scale: u8,
    /// Consciousness.
    pub consciousness: Consciousness,
}

impl Default for VitalSigns {
    fn default() -> Self {
        Self {
            temperature: 98.6,
            bp_systolic: 120,
            bp_diastolic: 80,
            heart_rate: 72,
            respiratory_rate: 16,
            oxygen_saturation: 98.0,
            pain_scale: 0,
            consciousness: Consciousness::Alert,
        }
    }
}

impl VitalSigns {
    /// Severity from 0 (normal) to 100, summing abnormal-range bands.
    pub fn severity_score(&self) -> u32 {
        let mut score = 0;

        if self.temperature > 103.0 || self.temperature < 95.0 {
            score += 20;
        } else if self.temperature > 101.0 || self.temperature < 96.0 {
            score += 10;
        }

        score += match self.bp_systolic {
            0..90 | 181.. => 20,
            90..100 | 161..=180 => 10,
            _ => 0,
        };
        score += match self.heart_rate {
            0..50 | 121.. => 15,
            50..60 | 101..=120 => 8,
            _ => 0,
        };
        score += match self.respiratory_rate {
            0..12 | 25.. => 15,
            12..14 | 21..=24 => 8,
            _ => 0,
        };

        if self.oxygen_saturation < 90.0 {
            score += 25;
        } else if self.oxygen_saturation < 95.0 {
            score += 15;
        }

        score += match self.pain_scale {
            8.. => 15,
            6..=7 => 10,
            4..=5 => 5,
            _ => 0,
        };

        if self.consciousness.is_lost() {
            score += 30;
        } else if self.consciousness.is_impaired() {
            score += 15;
        }

        score.min(100)
    }
}

/// Scoring inputs for a patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInputs {
    /// Vital signs.
    pub vitals: VitalSigns,
    /// Age in years.
    pub age: u32,
    /// Free-text reason for the visit.
    pub chief_complaint: String,
    /// Known conditions.
    pub history_conditions: Vec<String>,
    /// Arrived by ambulance.
    pub ambulance_arrival: bool,
    /// Trauma team alerted.
    pub trauma_alert: bool,
    /// Isolation required.
    pub infectious_disease_alert: bool,
    /// Specialty the patient should preferably see.
    pub preferred_specialty: Option<String>,
}

/// Patient triage policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientPolicy {
    /// Bonus for a trauma alert.
    pub trauma_bonus: f64,
    /// Bonus for an ambulance arrival.
    pub ambulance_bonus: f64,
    /// Bonus for an infectious-disease alert.
    pub infectious_bonus: f64,
}

impl Default for PatientPolicy {
    fn default() -> Self {
        Self {
            trauma_bonus: 300.0,
            ambulance_bonus: 120.0,
            infectious_bonus: 80.0,
        }
    }
}

const EMERGENCY_COMPLAINTS: [&str; 2] = ["chest pain", "difficulty breathing"];

impl ScoringPolicy for PatientPolicy {
    type Inputs = PatientInputs;

    fn name(&self) -> &'static str {
        "patient"
    }

    fn tier(&self, inputs: &PatientInputs) -> ScoreTier {
        let vitals = &inputs.vitals;
        let severity = vitals.severity_score();
        let complaint = inputs.chief_complaint.to_lowercase();

        if severity >= 80
            || inputs.trauma_alert
            || vitals.consciousness.is_lost()
            || vitals.oxygen_saturation < 85.0
        {
            ScoreTier::Critical
        } else if severity >= 60
            || inputs.ambulance_arrival
            || vitals.pain_scale >= 8
            || EMERGENCY_COMPLAINTS.iter().any(|c| complaint.contains(c))
        {
            ScoreTier::Emergency
        } else if severity >= 40
            || vitals.pain_scale >= 6
            || inputs.age > 75
            || inputs.history_conditions.len() > 3
        {
            ScoreTier::Urgent
        } else if severity >= 20 || vitals.pain_scale >= 4 {
            ScoreTier::SemiUrgent
        } else {
            ScoreTier::Routine
        }
    }

    fn urgency(&self, inputs: &PatientInputs) -> f64 {
        f64::from(inputs.vitals.severity_score())
    }

    fn flag_bonus(&self, inputs: &PatientInputs) -> f64 {
        let mut bonus = 0.0;
        if inputs.trauma_alert {
            bonus += self.trauma_bonus;
        }
        if inputs.ambulance_arrival {
            bonus += self.ambulance_bonus;
        }
        if inputs.infectious_disease_alert {
            bonus += self.infectious_bonus;
        }
        bonus
    }

    fn assignment_adjustment(
        &self,
        inputs: &PatientInputs,
        worker: &WorkerRecord,
        weights: &AssignmentWeights,
    ) -> f64 {
        match &inputs.preferred_specialty {
            Some(specialty) if worker.has_tag(specialty) => weights.specialty_match_bonus,
            _ => 0.0,
        }
    }
}
