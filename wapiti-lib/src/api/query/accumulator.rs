//! Merge-by-identifier accumulation of records across pages and batches.

use std::collections::HashMap;

use serde_json::Map;
use serde_json::Value;

use crate::model::Identifier;
use crate::model::Record;

/// Position of a record in the stream of responses.
///
/// Ordering is `(batch, page, position)`, so it depends only on where the
/// server put the record and never on arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sequence {
    /// Batch index.
    pub batch: usize,
    /// Page number within the batch (from 1).
    pub page: usize,
    /// Index of the record within its page.
    pub position: usize,
}

impl Sequence {
    /// Creates a new sequence key.
    pub fn new(batch: usize, page: usize, position: usize) -> Self {
        Self { batch, page, position }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    first_seen: Sequence,
    fragments: Vec<(Sequence, Map<String, Value>)>,
}

/// Records collected so far, keyed by identifier.
///
/// Each delivery of an entity is kept as a fragment tagged with its
/// [`Sequence`]. Fragments are folded in sequence order when the records are
/// taken out:
///
/// - null never overwrites a value
/// - arrays concatenate, skipping items already present
/// - objects merge field by field
/// - any other conflict goes to the later sequence
///
/// Output order is the first-seen sequence of each identifier. Merging the
/// same fragments in any order gives the same result.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use wapiti_lib::api::query::{Accumulator, Sequence};
/// use wapiti_lib::model::Record;
///
/// let mut acc = Accumulator::new();
/// acc.merge(Sequence::new(0, 1, 0), Record::new("1").set("title", "A"));
/// acc.merge(Sequence::new(0, 2, 0), Record::new("1").set("links", json!(["B"])));
///
/// let records = acc.into_records();
/// assert_eq!(records.len(), 1);
/// assert!(records[0].contains("title"));
/// assert!(records[0].contains("links"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    entries: HashMap<Identifier, Entry>,
}

impl Accumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one delivery of a record.
    pub fn merge(&mut self, sequence: Sequence, record: Record) {
        let Record { identifier, fields } = record;
        let entry = self.entries.entry(identifier).or_insert_with(|| Entry {
            first_seen: sequence,
            fragments: Vec::new(),
        });
        entry.first_seen = entry.first_seen.min(sequence);
        entry.fragments.push((sequence, fields));
    }

    /// Adds every record of one page, in server order.
    pub fn merge_page(&mut self, batch: usize, page: usize, records: Vec<Record>) {
        for (position, record) in records.into_iter().enumerate() {
            self.merge(Sequence::new(batch, page, position), record);
        }
    }

    /// Returns the number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been merged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a record with this identifier was merged.
    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Folds the fragments and returns the records in first-seen order.
    pub fn into_records(self) -> Vec<Record> {
        let mut entries: Vec<(Identifier, Entry)> = self.entries.into_iter().collect();
        entries.sort_by_key(|(_, entry)| entry.first_seen);

        entries
            .into_iter()
            .map(|(identifier, mut entry)| {
                entry.fragments.sort_by_key(|(sequence, _)| *sequence);
                let mut fields = Map::new();
                for (_, fragment) in entry.fragments {
                    merge_fields(&mut fields, fragment);
                }
                Record::from_map(identifier, fields)
            })
            .collect()
    }
}

fn merge_fields(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    if incoming.is_null() {
        return;
    }
    match (existing, incoming) {
        (Value::Array(items), Value::Array(more)) => {
            for item in more {
                if !items.contains(&item) {
                    items.push(item);
                }
            }
        }
        (Value::Object(fields), Value::Object(more)) => merge_fields(fields, more),
        (slot, value) => *slot = value,
    }
}
