//! Urgency-ordered queue with lazy deletion and re-scoring.
//!
//! Heap storage may hold entries that are no longer valid: an entity that was
//! invalidated or re-scored leaves its old entry behind. Validity is decided by
//! the authoritative index, which maps each queued id to the sequence stamp of
//! its one live entry. A heap entry whose stamp does not match is stale and is
//! discarded the moment it reaches the top of the heap, so each stale entry is
//! paid for exactly once.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, Score, ScoreTier};

/// A queued (score, sequence, entity) triple.
///
/// `sequence` is a monotonic stamp: it breaks score ties by arrival order and
/// doubles as the generation that ties a heap entry to the live index record.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Score (and tier) at the time the entry was created.
    pub score: Score,
    /// Insertion stamp.
    pub sequence: u64,
}

/// Wrapper ordering entries so the max-heap yields the lowest score first,
/// then the earliest sequence.
#[derive(Debug)]
struct HeapSlot(QueueEntry);

impl PartialEq for HeapSlot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapSlot {}

impl PartialOrd for HeapSlot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapSlot {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for max-heap: lower score, then earlier sequence, wins.
        other
            .0
            .score
            .value
            .total_cmp(&self.0.score.value)
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

/// Live index record for a queued id.
#[derive(Debug, Clone, Copy)]
struct LiveMark {
    sequence: u64,
    score: Score,
}

/// Live-entry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of live entries.
    pub count: usize,
    /// Live entries per tier (every tier present, zero when empty).
    pub by_tier: BTreeMap<ScoreTier, usize>,
}

/// Min-priority queue over (score, sequence, entity id) with O(1) lazy removal.
#[derive(Debug, Default)]
pub struct UrgentQueue {
    heap: BinaryHeap<HeapSlot>,
    index: HashMap<EntityId, LiveMark>,
    next_sequence: u64,
}

impl UrgentQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            next_sequence: 0,
        }
    }

    /// Insert `entity_id` with `score`. If the id is already queued, its previous
    /// entry becomes stale. O(log n).
    pub fn insert(&mut self, entity_id: impl Into<EntityId>, score: Score) {
        let entity_id = entity_id.into();
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.index
            .insert(entity_id.clone(), LiveMark { sequence, score });
        self.heap.push(HeapSlot(QueueEntry {
            entity_id,
            score,
            sequence,
        }));
    }

    /// Best live entity without removing it. Discards stale entries on the way.
    pub fn peek(&mut self) -> Option<&EntityId> {
        self.discard_stale_top();
        self.heap.peek().map(|slot| &slot.0.entity_id)
    }

    /// Remove and return the best live entity.
    pub fn pop(&mut self) -> Option<EntityId> {
        self.pop_entry().map(|entry| entry.entity_id)
    }

    /// Remove and return the best live entry with its score and stamp.
    pub fn pop_entry(&mut self) -> Option<QueueEntry> {
        self.discard_stale_top();
        let HeapSlot(entry) = self.heap.pop()?;
        self.index.remove(&entry.entity_id);
        Some(entry)
    }

    /// Put a previously popped entry back with its original score and stamp, so
    /// it keeps its place among equal scores. Returns false (and does nothing) if
    /// the id has been queued again in the meantime.
    pub fn reinstate(&mut self, entry: QueueEntry) -> bool {
        if self.index.contains_key(&entry.entity_id) {
            return false;
        }
        self.index.insert(
            entry.entity_id.clone(),
            LiveMark {
                sequence: entry.sequence,
                score: entry.score,
            },
        );
        self.heap.push(HeapSlot(entry));
        true
    }

    /// Logically remove `entity_id`; its heap entry goes stale. O(1).
    pub fn invalidate(&mut self, entity_id: &str) -> bool {
        self.index.remove(entity_id).is_some()
    }

    /// Replace the score of a queued id with a fresh entry and stamp.
    /// Returns false if the id was not queued.
    pub fn rescore(&mut self, entity_id: &str, new_score: Score) -> bool {
        if !self.invalidate(entity_id) {
            return false;
        }
        self.insert(entity_id, new_score);
        true
    }

    /// Whether `entity_id` has a live entry.
    pub fn contains(&self, entity_id: &str) -> bool {
        self.index.contains_key(entity_id)
    }

    /// Score of the live entry for `entity_id`.
    pub fn score_of(&self, entity_id: &str) -> Option<Score> {
        self.index.get(entity_id).map(|mark| mark.score)
    }

    /// 1-based rank of `entity_id` among live entries. O(n).
    pub fn position(&self, entity_id: &str) -> Option<usize> {
        let target = self.index.get(entity_id)?;
        let ahead = self
            .index
            .values()
            .filter(|mark| {
                mark.score
                    .value
                    .total_cmp(&target.score.value)
                    .then(mark.sequence.cmp(&target.sequence))
                    == Ordering::Less
            })
            .count();
        Some(ahead + 1)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Physical heap size, live and stale entries together.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Live-entry counts, read from the index rather than the heap.
    pub fn stats(&self) -> QueueStats {
        let mut by_tier: BTreeMap<ScoreTier, usize> =
            ScoreTier::ALL.iter().map(|tier| (*tier, 0)).collect();
        for mark in self.index.values() {
            *by_tier.entry(mark.score.tier).or_default() += 1;
        }
        QueueStats {
            count: self.index.len(),
            by_tier,
        }
    }

    /// Physically drop every stale entry. Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.heap.len();
        let slots: Vec<HeapSlot> = self.heap.drain().collect();
        let index = &self.index;
        self.heap = slots
            .into_iter()
            .filter(|slot| Self::is_live(index, &slot.0))
            .collect();
        before.saturating_sub(self.heap.len())
    }

    fn discard_stale_top(&mut self) {
        while let Some(top) = self.heap.peek() {
            if Self::is_live(&self.index, &top.0) {
                return;
            }
            if let Some(HeapSlot(stale)) = self.heap.pop() {
                tracing::debug!(
                    entity_id = %stale.entity_id,
                    sequence = stale.sequence,
                    "discarded stale queue entry"
                );
            }
        }
    }

    fn is_live(index: &HashMap<EntityId, LiveMark>, entry: &QueueEntry) -> bool {
        index
            .get(&entry.entity_id)
            .is_some_and(|mark| mark.sequence == entry.sequence)
    }
}
