use std::collections::VecDeque;

use crate::sample::{DistanceReading, ParsedLine, PoseSample};

pub const DEFAULT_HISTORY_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub seq: u64,
    pub pose: PoseSample,
    pub reading: Option<DistanceReading>,
}

impl HistoryEntry {
    pub fn new(seq: u64, parsed: ParsedLine) -> Self {
        Self {
            seq,
            pose: parsed.pose,
            reading: parsed.reading,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn latest(&self) -> Option<HistoryEntry> {
        self.entries.back().copied()
    }

    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
