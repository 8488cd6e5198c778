//! Keyed data join.
//!
//! Matches the keys of already-rendered elements against the keys of the
//! current records and sorts every element and record into exactly one of
//! enter, update or exit. Repeated keys are told apart by occurrence: the
//! nth element carrying a key matches the nth record carrying it, so
//! unchanged data with duplicate keys always joins stably.

use std::collections::HashMap;

use crate::dataset::DataValue;

/// Hashable identity of a record within a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    /// Numeric key, compared by bit pattern (`-0` folded into `0`).
    Number(u32),
    /// Text key.
    Text(String),
    /// Positional key, used when the key value is undefined.
    Index(usize),
}

impl JoinKey {
    /// Key for a record whose key accessor produced `value` at `index`.
    #[must_use]
    pub fn from_value(value: &DataValue, index: usize) -> Self {
        match value {
            DataValue::Number(n) if n.is_finite() => {
                let n = if *n == 0.0 { 0.0_f32 } else { *n };
                JoinKey::Number(n.to_bits())
            }
            DataValue::Text(s) => JoinKey::Text(s.clone()),
            DataValue::Number(_) | DataValue::Null => JoinKey::Index(index),
        }
    }
}

/// Outcome of a join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPlan {
    /// Indices of new records without a matching element.
    pub enter: Vec<usize>,
    /// `(existing element index, new record index)` pairs.
    pub update: Vec<(usize, usize)>,
    /// Indices of existing elements whose key disappeared.
    pub exit: Vec<usize>,
}

impl JoinPlan {
    /// True when nothing enters or exits.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.enter.is_empty() && self.exit.is_empty()
    }
}

/// Join existing element keys against new record keys.
#[must_use]
pub fn join(existing: &[JoinKey], incoming: &[JoinKey]) -> JoinPlan {
    let mut by_key: HashMap<(&JoinKey, usize), usize> = HashMap::with_capacity(existing.len());
    let mut seen: HashMap<&JoinKey, usize> = HashMap::with_capacity(existing.len());
    let mut plan = JoinPlan::default();

    for (i, key) in existing.iter().enumerate() {
        by_key.insert((key, next_occurrence(&mut seen, key)), i);
    }

    seen.clear();
    for (j, key) in incoming.iter().enumerate() {
        match by_key.remove(&(key, next_occurrence(&mut seen, key))) {
            Some(i) => plan.update.push((i, j)),
            None => plan.enter.push(j),
        }
    }

    plan.exit.extend(by_key.into_values());
    plan.exit.sort_unstable();
    plan
}

fn next_occurrence<'a>(seen: &mut HashMap<&'a JoinKey, usize>, key: &'a JoinKey) -> usize {
    let count = seen.entry(key).or_insert(0);
    *count += 1;
    *count - 1
}
