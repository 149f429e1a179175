//! Bounded state-change history

use safety_state::{DecisionReason, SafetyState};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub timestamp: Duration,
    pub from: SafetyState,
    pub to: SafetyState,
    pub reason: DecisionReason,
    /// TTC at the change, `None` when not closing
    pub ttc_seconds: Option<f64>,
}

/// Sliding window of the most recent state changes
#[derive(Debug, Clone)]
pub struct StateHistory {
    changes: VecDeque<StateChange>,
    capacity: usize,
    total: u64,
}

impl StateHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            changes: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    pub fn push(&mut self, change: StateChange) {
        if self.changes.len() >= self.capacity {
            self.changes.pop_front();
        }
        self.changes.push_back(change);
        self.total += 1;
    }

    pub fn last(&self) -> Option<&StateChange> {
        self.changes.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes recorded since creation, including evicted ones
    pub fn total(&self) -> u64 {
        self.total
    }
}
