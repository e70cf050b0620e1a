//! Single-pass bucketing of fetched rows.
//!
//! Buckets remember the order in which their keys were first seen so that
//! the chart formatter can break ordering ties deterministically.

use crate::types::AttemptRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Bucket name for attempts that have no category.
pub const GENERAL_CATEGORY: &str = "General";

/// Running sum and count for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bucket {
    pub sum: f64,
    pub count: i64,
}

impl Bucket {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the values added so far, 0 for an empty bucket.
    pub fn average(&self) -> f64 {
        super::metrics::average(self.sum, self.count)
    }
}

/// Keyed buckets in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    entries: Vec<(String, Bucket)>,
    index: HashMap<String, usize>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the bucket for `key`, creating it on first use.
    pub fn add(&mut self, key: &str, value: f64) {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key.to_string(), Bucket::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[slot].1.add(value);
    }

    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> {
        self.entries.iter().map(|(k, b)| (k.as_str(), b))
    }

    /// Sum of counts over all buckets; equals the number of records aggregated.
    pub fn total_count(&self) -> i64 {
        self.entries.iter().map(|(_, b)| b.count).sum()
    }
}

/// Reduce `records` into buckets using `key` and `value` extractors.
pub fn aggregate<T>(
    records: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> f64,
) -> Buckets {
    let mut buckets = Buckets::new();
    for record in records {
        buckets.add(&key(record), value(record));
    }
    buckets
}

/// ISO calendar date (`YYYY-MM-DD`) of a UTC timestamp.
pub fn day_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Score of an attempt; a missing score counts as 0.
fn score_of(attempt: &AttemptRecord) -> f64 {
    attempt.score.unwrap_or(0) as f64
}

/// Attempt scores bucketed by category name.
pub fn attempts_by_category(attempts: &[AttemptRecord]) -> Buckets {
    aggregate(
        attempts,
        |a| {
            a.category_name
                .clone()
                .unwrap_or_else(|| GENERAL_CATEGORY.to_string())
        },
        score_of,
    )
}

/// Attempt scores bucketed by the day the attempt was created.
pub fn attempts_by_day(attempts: &[AttemptRecord]) -> Buckets {
    aggregate(attempts, |a| day_key(&a.created_at), score_of)
}

/// Signups bucketed by day; every bucket value is a count.
pub fn signups_by_day(signups: &[DateTime<Utc>]) -> Buckets {
    aggregate(signups, day_key, |_| 1.0)
}
