//! Rendered elements: the nodes of a plot's render tree.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dataset::DatasetId;
use crate::geometry::Rect;
use crate::render::join::JoinKey;

/// Process-unique element identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// SVG tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `<rect>`
    Rect,
    /// `<path>`
    Path,
}

impl Tag {
    /// Tag name as written in SVG.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tag::Rect => "rect",
            Tag::Path => "path",
        }
    }
}

/// Value of a rendered attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Numeric attribute (positions, sizes, opacities).
    Number(f32),
    /// Any other attribute (colors, path data, class names).
    Text(String),
}

impl AttrValue {
    /// Numeric value, if any.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    /// Text value, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Number(_) => None,
            AttrValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(n) => f.write_str(&format_number(*n)),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Number(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v as f32)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

/// Format a number the way SVG attributes are written: at most three
/// decimals, no trailing zeros, no negative zero.
#[must_use]
pub fn format_number(value: f32) -> String {
    if !value.is_finite() {
        return "NaN".to_string();
    }
    let rounded = (f64::from(value) * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Data binding of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Dataset the element belongs to.
    pub dataset: DatasetId,
    /// Join key.
    pub key: JoinKey,
    /// Index of the bound record, `None` when bound to the whole dataset.
    pub index: Option<usize>,
}

/// A visual primitive in a render area.
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    tag: Tag,
    classes: Vec<String>,
    projected_classes: Vec<String>,
    attrs: BTreeMap<String, AttrValue>,
    binding: Option<Binding>,
}

impl Element {
    /// Create an element with one base class.
    #[must_use]
    pub fn new(tag: Tag, class: &str) -> Self {
        Self {
            id: ElementId::next(),
            tag,
            classes: vec![class.to_string()],
            projected_classes: Vec::new(),
            attrs: BTreeMap::new(),
            binding: None,
        }
    }

    /// Builder-style binding setter.
    #[must_use]
    pub fn bound(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Element identity.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// SVG tag.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Classes in insertion order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// True if the element carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add or remove a class.
    pub fn set_classed(&mut self, class: &str, on: bool) {
        if on {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
            }
        } else {
            self.classes.retain(|c| c != class);
        }
    }

    /// Replace the classes contributed by a `class` projector.
    ///
    /// `value` is a whitespace-separated class list. Classes set through
    /// [`Element::new`] or [`Element::set_classed`] are kept.
    pub fn set_projected_classes(&mut self, value: &str) {
        let previous = std::mem::take(&mut self.projected_classes);
        self.classes.retain(|c| !previous.contains(c));
        for class in value.split_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
                self.projected_classes.push(class.to_string());
            }
        }
    }

    /// Attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Numeric attribute value.
    #[must_use]
    pub fn attr_f32(&self, name: &str) -> Option<f32> {
        self.attrs.get(name).and_then(AttrValue::as_f32)
    }

    /// Text attribute value.
    #[must_use]
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(AttrValue::as_str)
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// All attributes, sorted by name.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Data binding.
    #[must_use]
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub(crate) fn rebind(&mut self, binding: Binding) {
        self.binding = Some(binding);
    }

    /// Bounding box of the element as currently rendered.
    ///
    /// Rects use their `x`/`y`/`width`/`height` attributes (missing ones read
    /// as 0); paths use the extent of the coordinates in `d`.
    #[must_use]
    pub fn bbox(&self) -> Option<Rect> {
        match self.tag {
            Tag::Rect => {
                let get = |name: &str| self.attr_f32(name).unwrap_or(0.0);
                let rect = Rect::new(get("x"), get("y"), get("width"), get("height")).normalized();
                rect.x.is_finite().then_some(rect)
            }
            Tag::Path => path_bbox(self.attr_str("d")?),
        }
    }
}

fn path_bbox(d: &str) -> Option<Rect> {
    let numbers: Vec<f32> = d
        .split(|c: char| c.is_ascii_alphabetic() || c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if numbers.len() < 2 {
        return None;
    }
    let (mut x0, mut y0, mut x1, mut y1) = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for pair in numbers.chunks_exact(2) {
        x0 = x0.min(pair[0]);
        x1 = x1.max(pair[0]);
        y0 = y0.min(pair[1]);
        y1 = y1.max(pair[1]);
    }
    Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
}
