//! Accessors and projectors.
//!
//! An [`Accessor`] pulls a value out of a record; a [`Projector`] pairs it
//! with an optional scale to produce a rendered attribute value.

use std::fmt;
use std::rc::Rc;

use crate::dataset::{DataValue, Metadata, Record};
use crate::render::AttrValue;
use crate::scale::ScaleRef;

/// Signature of a computed accessor: `(record, index, dataset metadata)`.
pub type AccessorFn = dyn Fn(&Record, usize, &Metadata) -> DataValue;

/// Extracts a value from a record.
#[derive(Clone)]
pub enum Accessor {
    /// Same value for every record.
    Constant(DataValue),
    /// Named field of the record.
    Field(String),
    /// Computed from the record, its index and the dataset metadata.
    Func(Rc<AccessorFn>),
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Accessor::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Accessor::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl Accessor {
    /// Accessor reading a named field.
    #[must_use]
    pub fn field(name: &str) -> Self {
        Accessor::Field(name.to_string())
    }

    /// Accessor returning a constant.
    #[must_use]
    pub fn constant(value: impl Into<DataValue>) -> Self {
        Accessor::Constant(value.into())
    }

    /// Accessor computed by a closure.
    #[must_use]
    pub fn func(f: impl Fn(&Record, usize, &Metadata) -> DataValue + 'static) -> Self {
        Accessor::Func(Rc::new(f))
    }

    /// Apply the accessor.
    #[must_use]
    pub fn access(&self, record: &Record, index: usize, metadata: &Metadata) -> DataValue {
        match self {
            Accessor::Constant(v) => v.clone(),
            Accessor::Field(name) => record.get(name).clone(),
            Accessor::Func(f) => f(record, index, metadata),
        }
    }

    /// The constant value, for constant accessors.
    #[must_use]
    pub fn as_constant(&self) -> Option<&DataValue> {
        match self {
            Accessor::Constant(v) => Some(v),
            Accessor::Field(_) | Accessor::Func(_) => None,
        }
    }
}

impl From<f32> for Accessor {
    fn from(v: f32) -> Self {
        Accessor::Constant(v.into())
    }
}

impl From<f64> for Accessor {
    fn from(v: f64) -> Self {
        Accessor::Constant(v.into())
    }
}

/// Accessor plus optional scale.
#[derive(Debug, Clone)]
pub struct Projector {
    accessor: Accessor,
    scale: Option<ScaleRef>,
}

impl Projector {
    /// Create a projector.
    #[must_use]
    pub fn new(accessor: Accessor, scale: Option<ScaleRef>) -> Self {
        Self { accessor, scale }
    }

    /// The accessor.
    #[must_use]
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// The scale, if any.
    #[must_use]
    pub fn scale(&self) -> Option<&ScaleRef> {
        self.scale.as_ref()
    }

    /// Unscaled value.
    #[must_use]
    pub fn raw(&self, record: &Record, index: usize, metadata: &Metadata) -> DataValue {
        self.accessor.access(record, index, metadata)
    }

    /// Scaled value: `scale(accessor(record, index, metadata))`.
    ///
    /// Without a scale, numbers and text pass through and `Null` becomes NaN.
    #[must_use]
    pub fn project(&self, record: &Record, index: usize, metadata: &Metadata) -> AttrValue {
        let value = self.raw(record, index, metadata);
        match (&self.scale, value) {
            (Some(scale), value) => AttrValue::Number(scale.scale(&value)),
            (None, DataValue::Number(n)) => AttrValue::Number(n),
            (None, DataValue::Text(s)) => AttrValue::Text(s),
            (None, DataValue::Null) => AttrValue::Number(f32::NAN),
        }
    }
}
