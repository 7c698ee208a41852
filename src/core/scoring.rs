//! Scoring strategy abstraction and score composition.
//!
//! A [`ScoringPolicy`] turns a domain's inputs into a tier plus weighted factors.
//! [`compose_score`] folds those into a single number with a fixed rule shared by
//! every domain:
//!
//! ```text
//! score = tier_ordinal * K - urgency - min(wait_hours * rate, wait_cap) - flag_bonus
//! ```
//!
//! Each subtracted term is clamped, and configuration validation guarantees the
//! clamps sum to less than `K`, so a tier is never overtaken by a lower tier.
//! The waiting-time penalty is capped on purpose: a Critical entity always
//! preempts a Routine entity no matter how long the latter has waited. There is
//! no aging into a higher tier.

use crate::config::{AssignmentWeights, ScoringWeights};
use crate::core::{Score, ScoreTier, WorkerRecord};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Domain strategy producing a tier and weighted factors from entity inputs.
///
/// Implementations must be pure and deterministic; the engine may call them at
/// any time and from any thread.
pub trait ScoringPolicy: Send + Sync + 'static {
    /// Domain attributes that feed scoring.
    type Inputs: Clone + Send + Sync + 'static;

    /// Short domain label used in logs.
    fn name(&self) -> &'static str;

    /// Discrete tier for the inputs.
    fn tier(&self, inputs: &Self::Inputs) -> ScoreTier;

    /// Sum of weighted urgency factors (non-negative; larger is more urgent).
    fn urgency(&self, inputs: &Self::Inputs) -> f64;

    /// Bonus for special flags (trauma alert, stock-out, ...).
    fn flag_bonus(&self, _inputs: &Self::Inputs) -> f64 {
        0.0
    }

    /// Tags a worker must carry to be eligible.
    fn required_tags(&self, _inputs: &Self::Inputs) -> Vec<String> {
        Vec::new()
    }

    /// Domain adjustment subtracted from a worker's assignment score.
    /// Positive values favour the worker, negative values penalise it.
    fn assignment_adjustment(
        &self,
        _inputs: &Self::Inputs,
        _worker: &WorkerRecord,
        _weights: &AssignmentWeights,
    ) -> f64 {
        0.0
    }

    /// Expected service time once a worker picks the entity up, if the domain
    /// can estimate it.
    fn estimated_duration_ms(&self, _inputs: &Self::Inputs) -> Option<u128> {
        None
    }
}

/// Compose a score from its parts using `weights`.
pub fn compose_score(
    weights: &ScoringWeights,
    tier: ScoreTier,
    urgency: f64,
    flag_bonus: f64,
    waited_ms: u128,
) -> Score {
    #[allow(clippy::cast_precision_loss)]
    let waited_hours = waited_ms as f64 / MS_PER_HOUR;
    let wait_penalty = clamp_term(
        waited_hours * weights.wait_penalty_per_hour,
        weights.max_wait_penalty,
    );
    let value = f64::from(tier.ordinal()) * weights.tier_weight
        - clamp_term(urgency, weights.max_urgency)
        - wait_penalty
        - clamp_term(flag_bonus, weights.max_flag_bonus);
    Score::new(value, tier)
}

/// Score `inputs` with `policy` after `waited_ms` of waiting.
pub fn score<P>(policy: &P, weights: &ScoringWeights, inputs: &P::Inputs, waited_ms: u128) -> Score
where
    P: ScoringPolicy + ?Sized,
{
    compose_score(
        weights,
        policy.tier(inputs),
        policy.urgency(inputs),
        policy.flag_bonus(inputs),
        waited_ms,
    )
}

/// Clamp a subtracted term into `0..=max`; NaN counts as zero.
fn clamp_term(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}
