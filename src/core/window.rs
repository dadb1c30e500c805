//! Sliding window store - trailing time-bounded buffer of records
//!
//! The window is pruned only on append, so between ticks it is a best-effort
//! trailing view rather than a continuously re-pruned one.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

use crate::core::record::MeasurementRecord;

/// Ordered records whose timestamps fall within the retention duration
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    records: VecDeque<MeasurementRecord>,
}

impl SlidingWindow {
    /// Create an empty window
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, then drop everything at or before `now - retention`
    ///
    /// Pruning filters by timestamp rather than by position, since the
    /// retention may have changed since the previous append. A cutoff before
    /// the start of the calendar keeps every record.
    pub fn append(&mut self, record: MeasurementRecord, now: DateTime<Utc>, retention: TimeDelta) {
        self.records.push_back(record);
        if let Some(cutoff) = now.checked_sub_signed(retention) {
            self.records.retain(|r| r.timestamp > cutoff);
        }
    }

    /// Clear all records
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Owned copy of the current records, oldest first
    pub fn snapshot(&self) -> Vec<MeasurementRecord> {
        self.records.iter().cloned().collect()
    }

    /// Most recently appended record still in the window
    pub fn latest(&self) -> Option<&MeasurementRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records without copying
    pub fn iter(&self) -> impl Iterator<Item = &MeasurementRecord> {
        self.records.iter()
    }
}
