//! Datasets: shared, mutable sequences of records.
//!
//! A [`Dataset`] is a cheap handle; clones share both identity and contents.
//! Mutating a dataset notifies nobody, plots pull the current records on
//! their next render.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A value in a record.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// A numeric value.
    Number(f32),
    /// A text value.
    Text(String),
    /// A missing value.
    Null,
}

impl DataValue {
    /// Get as f32, or None if not a number.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// `Null`, or a number that is NaN or infinite.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        match self {
            DataValue::Number(n) => !n.is_finite(),
            DataValue::Text(_) => false,
            DataValue::Null => true,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Number(n) => write!(f, "{n}"),
            DataValue::Text(s) => f.write_str(s),
            DataValue::Null => f.write_str("null"),
        }
    }
}

impl From<f32> for DataValue {
    fn from(v: f32) -> Self {
        DataValue::Number(v)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v as f32)
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Number(v as f32)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(DataValue::Null, Into::into)
    }
}

/// A single data record: named fields in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, DataValue)>,
}

static NULL: DataValue = DataValue::Null;

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<DataValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: &str, value: impl Into<DataValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    /// Get a field; missing fields read as [`DataValue::Null`].
    #[must_use]
    pub fn get(&self, field: &str) -> &DataValue {
        self.fields.iter().find(|(name, _)| name == field).map_or(&NULL, |(_, v)| v)
    }

    /// Iterate over fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Process-unique dataset identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(u64);

impl DatasetId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Free-form dataset metadata, handed to accessors as their third argument.
pub type Metadata = BTreeMap<String, DataValue>;

#[derive(Debug)]
struct DatasetInner {
    id: DatasetId,
    records: RefCell<Vec<Record>>,
    metadata: RefCell<Metadata>,
}

/// Shared handle to an ordered sequence of records.
#[derive(Debug, Clone)]
pub struct Dataset {
    inner: Rc<DatasetInner>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Dataset {}

impl Dataset {
    /// Create a dataset from records.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            inner: Rc::new(DatasetInner {
                id: DatasetId::next(),
                records: RefCell::new(records),
                metadata: RefCell::new(Metadata::new()),
            }),
        }
    }

    /// Identity shared by every clone of this handle.
    #[must_use]
    pub fn id(&self) -> DatasetId {
        self.inner.id
    }

    /// Borrow the current records.
    ///
    /// # Panics
    ///
    /// Panics if called while [`Dataset::update`] is running on the same
    /// dataset.
    pub fn data(&self) -> Ref<'_, Vec<Record>> {
        self.inner.records.borrow()
    }

    /// Replace all records.
    pub fn set_data(&self, records: Vec<Record>) {
        *self.inner.records.borrow_mut() = records;
    }

    /// Mutate records in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<Record>) -> R) -> R {
        f(&mut self.inner.records.borrow_mut())
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.records.borrow().len()
    }

    /// True when the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the metadata.
    pub fn metadata(&self) -> Ref<'_, Metadata> {
        self.inner.metadata.borrow()
    }

    /// Set one metadata entry.
    pub fn set_metadata(&self, key: &str, value: impl Into<DataValue>) {
        self.inner.metadata.borrow_mut().insert(key.to_string(), value.into());
    }
}
