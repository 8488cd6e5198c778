//! Scale functions for data-to-visual mappings.
//!
//! Scales transform data values to pixel positions. They are shared between
//! plots (`Rc<dyn Scale>`), so range and domain live behind interior
//! mutability: a plot updates the range during layout and pushes its data
//! extents before every render, and every other plot using the same scale
//! sees the result.
//!
//! Based on the Grammar of Graphics [Wilkinson 2005].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::dataset::DataValue;
use crate::error::{Error, Result};

/// Default padding applied to each side of an autodomained linear scale.
pub const DEFAULT_PAD_PROPORTION: f32 = 0.05;

/// How a scale lays its output values over its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeType {
    /// Continuous mapping (linear).
    Continuous,
    /// Discrete categories placed at single positions.
    Points,
    /// Discrete categories owning a band of `range_band()` pixels each.
    Bands,
}

/// Shared scale handle.
pub type ScaleRef = Rc<dyn Scale>;

/// Trait for scales that map data values to pixels.
///
/// Extent and padding-exception methods are keyed by the caller (a plot
/// uses one key per projected attribute) so that several plots can feed the
/// same scale and retract their contribution independently. Scales that do
/// not autodomain ignore them.
pub trait Scale: fmt::Debug {
    /// Transform a data value to a pixel value; NaN when it cannot be mapped.
    fn scale(&self, value: &DataValue) -> f32;

    /// Get the range extent.
    fn range(&self) -> (f32, f32);

    /// Replace the range.
    fn set_range(&self, range: (f32, f32));

    /// Layout of the range.
    fn range_type(&self) -> RangeType {
        RangeType::Continuous
    }

    /// Width of one band for [`RangeType::Bands`] scales, otherwise 0.
    fn range_band(&self) -> f32 {
        0.0
    }

    /// Register (or replace) the values one caller wants covered by the domain.
    fn set_extents(&self, _key: &str, _values: &[DataValue]) {}

    /// Drop a caller's extent contribution.
    fn remove_extents(&self, _key: &str) {}

    /// Register a domain bound that padding must never extend past.
    fn add_padding_exception(&self, _key: &str, _value: f32) {}

    /// Drop a padding exception.
    fn remove_padding_exception(&self, _key: &str) {}
}

// ============================================================================
// Linear
// ============================================================================

#[derive(Debug, Clone)]
struct LinearState {
    explicit_domain: Option<(f32, f32)>,
    range: (f32, f32),
    extents: BTreeMap<String, (f32, f32)>,
    padding_exceptions: BTreeMap<String, f32>,
    pad_proportion: f32,
}

/// Linear scale for continuous-to-continuous mapping.
///
/// With an explicit domain it behaves like a plain affine map. Without one it
/// autodomains over every registered extent, padded by the pad proportion.
#[derive(Debug)]
pub struct LinearScale {
    state: RefCell<LinearState>,
}

impl Default for LinearScale {
    fn default() -> Self {
        Self {
            state: RefCell::new(LinearState {
                explicit_domain: None,
                range: (0.0, 1.0),
                extents: BTreeMap::new(),
                padding_exceptions: BTreeMap::new(),
                pad_proportion: DEFAULT_PAD_PROPORTION,
            }),
        }
    }
}

impl LinearScale {
    /// Create a linear scale with an explicit domain.
    ///
    /// # Errors
    ///
    /// Returns an error if domain_min equals domain_max.
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Result<Self> {
        let scale = Self::default();
        scale.set_domain(domain)?;
        scale.set_range(range);
        Ok(scale)
    }

    /// Create an autodomaining scale over the given range.
    #[must_use]
    pub fn auto(range: (f32, f32)) -> Self {
        let scale = Self::default();
        scale.set_range(range);
        scale
    }

    /// Fix the domain, disabling autodomain.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are equal or not finite.
    pub fn set_domain(&self, domain: (f32, f32)) -> Result<()> {
        if !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(Error::ScaleDomain("Domain bounds must be finite".to_string()));
        }
        if (domain.0 - domain.1).abs() < f32::EPSILON {
            return Err(Error::ScaleDomain("Domain min and max cannot be equal".to_string()));
        }
        self.state.borrow_mut().explicit_domain = Some(domain);
        Ok(())
    }

    /// Return to autodomain mode.
    pub fn autodomain(&self) {
        self.state.borrow_mut().explicit_domain = None;
    }

    /// Set the proportion of the domain span added as padding (split across
    /// both sides). Negative values are treated as 0.
    pub fn set_pad_proportion(&self, proportion: f32) {
        self.state.borrow_mut().pad_proportion = proportion.max(0.0);
    }

    /// Current pad proportion.
    #[must_use]
    pub fn pad_proportion(&self) -> f32 {
        self.state.borrow().pad_proportion
    }

    /// Current domain, explicit or computed from extents.
    #[must_use]
    pub fn domain(&self) -> (f32, f32) {
        let state = self.state.borrow();
        state.explicit_domain.unwrap_or_else(|| Self::compute_domain(&state))
    }

    fn compute_domain(state: &LinearState) -> (f32, f32) {
        let (lo, hi) = state
            .extents
            .values()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(a, b)| (lo.min(a), hi.max(b)));

        if lo > hi {
            return (0.0, 1.0);
        }
        if (hi - lo).abs() < f32::EPSILON {
            return (lo - 1.0, hi + 1.0);
        }

        let pad = (hi - lo) * state.pad_proportion / 2.0;
        let is_exception = |v: f32| state.padding_exceptions.values().any(|&e| (e - v).abs() < f32::EPSILON);
        let lo = if is_exception(lo) { lo } else { lo - pad };
        let hi = if is_exception(hi) { hi } else { hi + pad };
        (lo, hi)
    }

    /// Map a number through the scale.
    #[must_use]
    pub fn scale_f32(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain();
        let (r0, r1) = self.state.borrow().range;
        let t = (value - d0) / (d1 - d0);
        r0 + t * (r1 - r0)
    }

    /// Invert the scale (range to domain).
    #[must_use]
    pub fn invert(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain();
        let (r0, r1) = self.state.borrow().range;
        let t = (value - r0) / (r1 - r0);
        d0 + t * (d1 - d0)
    }
}

impl Scale for LinearScale {
    fn scale(&self, value: &DataValue) -> f32 {
        match value {
            DataValue::Number(n) => self.scale_f32(*n),
            DataValue::Text(_) | DataValue::Null => f32::NAN,
        }
    }

    fn range(&self) -> (f32, f32) {
        self.state.borrow().range
    }

    fn set_range(&self, range: (f32, f32)) {
        self.state.borrow_mut().range = range;
    }

    fn set_extents(&self, key: &str, values: &[DataValue]) {
        let extent = values
            .iter()
            .filter_map(DataValue::as_f32)
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });

        let mut state = self.state.borrow_mut();
        match extent {
            Some(extent) => {
                state.extents.insert(key.to_string(), extent);
            }
            None => {
                state.extents.remove(key);
            }
        }
    }

    fn remove_extents(&self, key: &str) {
        self.state.borrow_mut().extents.remove(key);
    }

    fn add_padding_exception(&self, key: &str, value: f32) {
        self.state.borrow_mut().padding_exceptions.insert(key.to_string(), value);
    }

    fn remove_padding_exception(&self, key: &str) {
        self.state.borrow_mut().padding_exceptions.remove(key);
    }
}

// ============================================================================
// Ordinal
// ============================================================================

/// Placement of categories over an ordinal range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrdinalLayout {
    /// Single positions, `padding` steps of space split across both ends.
    Points {
        /// Outer padding in steps.
        padding: f32,
    },
    /// Bands with inner and outer padding (fractions of a step).
    Bands {
        /// Fraction of each step left empty between bands.
        padding: f32,
        /// Steps of space before the first and after the last band.
        outer_padding: f32,
    },
}

/// Categories in order plus their positions.
#[derive(Debug, Clone, Default)]
struct OrdinalDomain {
    categories: Vec<String>,
    index: HashMap<String, usize>,
}

impl OrdinalDomain {
    fn from_categories<'a>(categories: impl IntoIterator<Item = &'a String>) -> Self {
        let mut domain = Self::default();
        for category in categories {
            domain.push(category);
        }
        domain
    }

    fn push(&mut self, category: &str) {
        if !self.index.contains_key(category) {
            self.index.insert(category.to_string(), self.categories.len());
            self.categories.push(category.to_string());
        }
    }
}

#[derive(Debug, Clone)]
struct OrdinalState {
    explicit_domain: Option<OrdinalDomain>,
    /// Extents per provider, in order of first registration.
    extents: Vec<(String, Vec<String>)>,
    /// Autodomain gathered from `extents`, rebuilt lazily after they change.
    cached: Option<OrdinalDomain>,
    range: (f32, f32),
    layout: OrdinalLayout,
}

impl OrdinalState {
    fn resolved(&mut self) -> &OrdinalDomain {
        if let Some(domain) = &self.explicit_domain {
            return domain;
        }
        let extents = &self.extents;
        self.cached.get_or_insert_with(|| OrdinalDomain::from_categories(extents.iter().flat_map(|(_, c)| c)))
    }
}

/// Ordinal (categorical) scale.
///
/// Values are matched by their display form, so the number `1` and the text
/// `"1"` name the same category.
#[derive(Debug)]
pub struct OrdinalScale {
    state: RefCell<OrdinalState>,
}

impl Default for OrdinalScale {
    fn default() -> Self {
        Self::with_layout(OrdinalLayout::Points { padding: 0.0 })
    }
}

impl OrdinalScale {
    /// Create a point-layout scale.
    #[must_use]
    pub fn points(padding: f32) -> Self {
        Self::with_layout(OrdinalLayout::Points { padding: padding.max(0.0) })
    }

    /// Create a band-layout scale.
    #[must_use]
    pub fn bands(padding: f32, outer_padding: f32) -> Self {
        Self::with_layout(OrdinalLayout::Bands {
            padding: padding.clamp(0.0, 1.0),
            outer_padding: outer_padding.max(0.0),
        })
    }

    fn with_layout(layout: OrdinalLayout) -> Self {
        Self {
            state: RefCell::new(OrdinalState {
                explicit_domain: None,
                extents: Vec::new(),
                cached: None,
                range: (0.0, 1.0),
                layout,
            }),
        }
    }

    /// Fix the category list, disabling autodomain.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain` is empty.
    pub fn set_domain<S: Into<String>>(&self, domain: impl IntoIterator<Item = S>) -> Result<()> {
        let mut categories = OrdinalDomain::default();
        for category in domain {
            categories.push(&category.into());
        }
        if categories.categories.is_empty() {
            return Err(Error::ScaleDomain("Ordinal domain cannot be empty".to_string()));
        }
        self.state.borrow_mut().explicit_domain = Some(categories);
        Ok(())
    }

    /// Builder-style range setter.
    #[must_use]
    pub fn with_range(self, range: (f32, f32)) -> Self {
        self.set_range(range);
        self
    }

    /// Current categories, explicit or gathered from extents in order of
    /// first appearance.
    #[must_use]
    pub fn domain(&self) -> Vec<String> {
        self.state.borrow_mut().resolved().categories.clone()
    }

    /// Current layout.
    #[must_use]
    pub fn layout(&self) -> OrdinalLayout {
        self.state.borrow().layout
    }

    /// Step between consecutive categories and the offset of the first one,
    /// measured from the low end of the range.
    fn step_and_offset(range: (f32, f32), layout: OrdinalLayout, n: usize) -> (f32, f32, f32) {
        let (r0, r1) = range;
        let span = (r1 - r0).abs();
        match layout {
            OrdinalLayout::Points { padding } => {
                if n < 2 {
                    return (0.0, span / 2.0, 0.0);
                }
                let step = span / ((n - 1) as f32 + padding);
                (step, step * padding / 2.0, 0.0)
            }
            OrdinalLayout::Bands { padding, outer_padding } => {
                let denom = n as f32 - padding + 2.0 * outer_padding;
                if denom <= 0.0 {
                    return (0.0, 0.0, 0.0);
                }
                let step = span / denom;
                (step, step * outer_padding, step * (1.0 - padding))
            }
        }
    }
}

impl Scale for OrdinalScale {
    fn scale(&self, value: &DataValue) -> f32 {
        if matches!(value, DataValue::Null) {
            return f32::NAN;
        }
        let mut state = self.state.borrow_mut();
        let (range, layout) = (state.range, state.layout);
        let domain = state.resolved();
        let Some(&index) = domain.index.get(&value.to_string()) else {
            return f32::NAN;
        };

        let (r0, r1) = range;
        let (step, offset, band) = Self::step_and_offset(range, layout, domain.categories.len());
        let ascending = r0.min(r1) + offset + index as f32 * step;
        if r1 < r0 {
            // mirror so that the first category sits at r0
            r0.max(r1) + r0.min(r1) - ascending - band
        } else {
            ascending
        }
    }

    fn range(&self) -> (f32, f32) {
        self.state.borrow().range
    }

    fn set_range(&self, range: (f32, f32)) {
        self.state.borrow_mut().range = range;
    }

    fn range_type(&self) -> RangeType {
        match self.layout() {
            OrdinalLayout::Points { .. } => RangeType::Points,
            OrdinalLayout::Bands { .. } => RangeType::Bands,
        }
    }

    fn range_band(&self) -> f32 {
        let mut state = self.state.borrow_mut();
        let (range, layout) = (state.range, state.layout);
        let n = state.resolved().categories.len();
        Self::step_and_offset(range, layout, n).2
    }

    fn set_extents(&self, key: &str, values: &[DataValue]) {
        let categories: Vec<String> =
            values.iter().filter(|v| !matches!(v, DataValue::Null)).map(ToString::to_string).collect();
        let mut state = self.state.borrow_mut();
        let position = state.extents.iter().position(|(k, _)| k == key);
        match (position, categories.is_empty()) {
            (Some(i), true) => {
                state.extents.remove(i);
            }
            (Some(i), false) => {
                if state.extents[i].1 == categories {
                    return;
                }
                state.extents[i].1 = categories;
            }
            (None, true) => return,
            (None, false) => state.extents.push((key.to_string(), categories)),
        }
        state.cached = None;
    }

    fn remove_extents(&self, key: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(i) = state.extents.iter().position(|(k, _)| k == key) {
            state.extents.remove(i);
            state.cached = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn nums(values: &[f32]) -> Vec<DataValue> {
        values.iter().copied().map(DataValue::Number).collect()
    }

    #[test]
    fn test_linear_scale() {
        let scale = LinearScale::new((0.0, 100.0), (0.0, 1.0)).expect("operation should succeed");
        assert_relative_eq!(scale.scale(&DataValue::Number(0.0)), 0.0);
        assert_relative_eq!(scale.scale(&DataValue::Number(50.0)), 0.5);
        assert_relative_eq!(scale.scale(&DataValue::Number(100.0)), 1.0);
    }

    #[test]
    fn test_linear_scale_unmappable_is_nan() {
        let scale = LinearScale::new((0.0, 1.0), (0.0, 1.0)).unwrap();
        assert!(scale.scale(&DataValue::Null).is_nan());
        assert!(scale.scale(&DataValue::from("a")).is_nan());
        assert!(scale.scale(&DataValue::Number(f32::NAN)).is_nan());
    }

    #[test]
    fn test_linear_scale_invert() {
        let scale = LinearScale::new((0.0, 100.0), (0.0, 1.0)).expect("operation should succeed");
        assert!((scale.invert(0.5) - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_linear_scale_equal_domain_error() {
        assert!(LinearScale::new((5.0, 5.0), (0.0, 1.0)).is_err());
        assert!(LinearScale::new((f32::NAN, 5.0), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_autodomain_empty_is_unit() {
        let scale = LinearScale::auto((0.0, 100.0));
        assert_eq!(scale.domain(), (0.0, 1.0));
    }

    #[test]
    fn test_autodomain_pads_extents() {
        let scale = LinearScale::auto((0.0, 100.0));
        scale.set_pad_proportion(0.1);
        scale.set_extents("a", &nums(&[0.0, 10.0]));
        let (lo, hi) = scale.domain();
        assert_relative_eq!(lo, -0.5);
        assert_relative_eq!(hi, 10.5);
    }

    #[test]
    fn test_autodomain_single_value_expands() {
        let scale = LinearScale::auto((0.0, 100.0));
        scale.set_extents("a", &nums(&[3.0, 3.0]));
        assert_eq!(scale.domain(), (2.0, 4.0));
    }

    #[test]
    fn test_autodomain_ignores_undefined() {
        let scale = LinearScale::auto((0.0, 1.0));
        scale.set_pad_proportion(0.0);
        scale.set_extents("a", &[DataValue::Number(1.0), DataValue::Null, DataValue::Number(f32::NAN), DataValue::Number(5.0)]);
        assert_eq!(scale.domain(), (1.0, 5.0));
    }

    #[test]
    fn test_padding_exception_holds_bound() {
        let scale = LinearScale::auto((0.0, 1.0));
        scale.set_pad_proportion(0.1);
        scale.set_extents("provider", &nums(&[30.0, 40.0]));
        scale.add_padding_exception("plot/y0", 30.0);
        let (lo, hi) = scale.domain();
        assert_relative_eq!(lo, 30.0);
        assert!(hi > 40.0);

        scale.remove_padding_exception("plot/y0");
        assert!(scale.domain().0 < 30.0);
    }

    #[test]
    fn test_extents_combine_and_retract() {
        let scale = LinearScale::auto((0.0, 1.0));
        scale.set_pad_proportion(0.0);
        scale.set_extents("a", &nums(&[0.0, 1.0]));
        scale.set_extents("b", &nums(&[5.0, 9.0]));
        assert_eq!(scale.domain(), (0.0, 9.0));
        scale.remove_extents("b");
        assert_eq!(scale.domain(), (0.0, 1.0));
    }

    #[test]
    fn test_explicit_domain_wins_over_extents() {
        let scale = LinearScale::new((0.0, 1.0), (0.0, 500.0)).unwrap();
        scale.set_extents("a", &nums(&[0.0, 100.0]));
        assert_eq!(scale.domain(), (0.0, 1.0));
        scale.autodomain();
        assert!(scale.domain().1 > 1.0);
    }

    #[test]
    fn test_ordinal_points() {
        let scale = OrdinalScale::points(0.0).with_range((0.0, 100.0));
        scale.set_domain(["a", "b", "c"]).unwrap();
        assert_relative_eq!(scale.scale(&"a".into()), 0.0);
        assert_relative_eq!(scale.scale(&"b".into()), 50.0);
        assert_relative_eq!(scale.scale(&"c".into()), 100.0);
        assert_eq!(scale.range_type(), RangeType::Points);
        assert_relative_eq!(scale.range_band(), 0.0);
    }

    #[test]
    fn test_ordinal_points_with_padding() {
        let scale = OrdinalScale::points(1.0).with_range((0.0, 100.0));
        scale.set_domain(["a", "b"]).unwrap();
        assert_relative_eq!(scale.scale(&"a".into()), 25.0);
        assert_relative_eq!(scale.scale(&"b".into()), 75.0);
    }

    #[test]
    fn test_ordinal_single_point_centered() {
        let scale = OrdinalScale::points(0.0).with_range((0.0, 100.0));
        scale.set_domain(["only"]).unwrap();
        assert_relative_eq!(scale.scale(&"only".into()), 50.0);
    }

    #[test]
    fn test_ordinal_bands() {
        let scale = OrdinalScale::bands(0.0, 0.0).with_range((0.0, 100.0));
        scale.set_domain(["a", "b", "c", "d"]).unwrap();
        assert_relative_eq!(scale.scale(&"a".into()), 0.0);
        assert_relative_eq!(scale.scale(&"c".into()), 50.0);
        assert_relative_eq!(scale.range_band(), 25.0);
        assert_eq!(scale.range_type(), RangeType::Bands);
    }

    #[test]
    fn test_ordinal_bands_padding() {
        let scale = OrdinalScale::bands(0.5, 0.5).with_range((0.0, 100.0));
        scale.set_domain(["a", "b"]).unwrap();
        // step = 100 / (2 - 0.5 + 1) = 40
        assert_relative_eq!(scale.scale(&"a".into()), 20.0);
        assert_relative_eq!(scale.scale(&"b".into()), 60.0);
        assert_relative_eq!(scale.range_band(), 20.0);
    }

    #[test]
    fn test_ordinal_reversed_range() {
        let scale = OrdinalScale::points(0.0).with_range((100.0, 0.0));
        scale.set_domain(["a", "b", "c"]).unwrap();
        assert_relative_eq!(scale.scale(&"a".into()), 100.0);
        assert_relative_eq!(scale.scale(&"c".into()), 0.0);
    }

    #[test]
    fn test_ordinal_numbers_match_display_form() {
        let scale = OrdinalScale::points(0.0).with_range((0.0, 10.0));
        scale.set_extents("x", &nums(&[0.0, 1.0, 1.0]));
        assert_eq!(scale.domain(), vec!["0".to_string(), "1".to_string()]);
        assert_relative_eq!(scale.scale(&DataValue::Number(1.0)), 10.0);
        assert_relative_eq!(scale.scale(&"1".into()), 10.0);
    }

    #[test]
    fn test_ordinal_autodomain_keeps_provider_order() {
        let scale = OrdinalScale::points(0.0).with_range((0.0, 10.0));
        scale.set_extents("plot-2/x", &["b".into(), "a".into()]);
        scale.set_extents("plot-10/x", &["c".into(), "a".into()]);
        assert_eq!(scale.domain(), vec!["b", "a", "c"]);

        scale.set_extents("plot-2/x", &["a".into()]);
        assert_eq!(scale.domain(), vec!["a", "c"]);
        scale.remove_extents("plot-2/x");
        assert_eq!(scale.domain(), vec!["c", "a"]);
        assert_relative_eq!(scale.scale(&"a".into()), 10.0);
    }

    #[test]
    fn test_ordinal_many_categories() {
        let scale = OrdinalScale::bands(0.0, 0.0).with_range((0.0, 10_000.0));
        let values: Vec<DataValue> = (0..10_000).map(|i| DataValue::from(format!("c{i}"))).collect();
        scale.set_extents("x", &values);
        assert_relative_eq!(scale.range_band(), 1.0);
        for (i, value) in values.iter().enumerate() {
            assert_relative_eq!(scale.scale(value), i as f32);
        }
    }

    #[test]
    fn test_ordinal_unknown_is_nan() {
        let scale = OrdinalScale::default();
        scale.set_domain(["a"]).unwrap();
        assert!(scale.scale(&"zzz".into()).is_nan());
        assert!(scale.scale(&DataValue::Null).is_nan());
    }

    #[test]
    fn test_ordinal_empty_domain_error() {
        let scale = OrdinalScale::default();
        assert!(scale.set_domain(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_scale_trait_object() {
        let scale: ScaleRef = Rc::new(LinearScale::new((0.0, 10.0), (0.0, 100.0)).unwrap());
        scale.set_range((0.0, 50.0));
        assert_eq!(scale.range(), (0.0, 50.0));
        assert_eq!(scale.range_type(), RangeType::Continuous);
    }
}
