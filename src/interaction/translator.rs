//! Client-space to SVG-local coordinate translation.
//!
//! The host reports the root SVG's bounding rectangle through [`SvgGeometry`].
//! Querying it is comparatively expensive in a browser, so the translator
//! caches the last rectangle and only asks again after [`invalidate`] or when
//! the host's layout generation changes.
//!
//! [`invalidate`]: CoordinateTranslator::invalidate

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Geometry of a root SVG element, supplied by the host.
pub trait SvgGeometry {
    /// Bounding rectangle in client space, or `None` when detached.
    fn bounding_client_rect(&self) -> Option<Rect>;

    /// Scroll offset of the SVG's content.
    fn scroll_offset(&self) -> Point {
        Point::ORIGIN
    }

    /// Size of the SVG's user coordinate system, when it differs from the
    /// rendered size.
    fn view_box_size(&self) -> Option<(f32, f32)> {
        None
    }

    /// Counter bumped whenever layout may have moved or resized the element.
    fn layout_generation(&self) -> u64 {
        0
    }
}

/// How points outside the root's rectangle are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundsPolicy {
    /// Translate every point; drags may leave the SVG.
    #[default]
    Unbounded,
    /// Points outside the rectangle are untranslatable.
    Clip,
}

#[derive(Debug, Clone, Copy)]
struct CachedRect {
    rect: Rect,
    generation: u64,
}

/// Maps client coordinates to coordinates local to one root SVG.
pub struct CoordinateTranslator {
    geometry: Rc<dyn SvgGeometry>,
    cache: Cell<Option<CachedRect>>,
    bounds: Cell<BoundsPolicy>,
}

impl fmt::Debug for CoordinateTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateTranslator")
            .field("cached", &self.cache.get().map(|c| c.rect))
            .field("bounds", &self.bounds.get())
            .finish_non_exhaustive()
    }
}

impl CoordinateTranslator {
    /// Create a translator over host geometry.
    #[must_use]
    pub fn new(geometry: Rc<dyn SvgGeometry>) -> Self {
        Self { geometry, cache: Cell::new(None), bounds: Cell::new(BoundsPolicy::default()) }
    }

    /// Set the bounds policy.
    pub fn set_bounds(&self, bounds: BoundsPolicy) {
        self.bounds.set(bounds);
    }

    /// Current bounds policy.
    #[must_use]
    pub fn bounds(&self) -> BoundsPolicy {
        self.bounds.get()
    }

    /// Drop the cached rectangle; the next translation queries the host.
    pub fn invalidate(&self) {
        self.cache.set(None);
    }

    /// Bounding rectangle, from cache when still valid.
    ///
    /// Detached or degenerate results are not cached, so a re-attached root
    /// is picked up without an explicit invalidation.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        let generation = self.geometry.layout_generation();
        if let Some(cached) = self.cache.get() {
            if cached.generation == generation {
                return Some(cached.rect);
            }
        }

        let rect = self.geometry.bounding_client_rect().filter(Rect::is_usable);
        match rect {
            Some(rect) => self.cache.set(Some(CachedRect { rect, generation })),
            None => self.cache.set(None),
        }
        rect
    }

    /// Translate a client-space point, or `None` when it cannot be resolved.
    #[must_use]
    pub fn compute_position(&self, client_x: f32, client_y: f32) -> Option<Point> {
        let client = Point::new(client_x, client_y);
        if !client.is_finite() {
            return None;
        }
        let rect = self.rect()?;
        if self.bounds.get() == BoundsPolicy::Clip && !rect.contains(client) {
            return None;
        }

        let (sx, sy) = match self.geometry.view_box_size() {
            Some((w, h)) if w > 0.0 && h > 0.0 => (w / rect.width, h / rect.height),
            _ => (1.0, 1.0),
        };
        let scroll = self.geometry.scroll_offset();
        let local = Point::new((client.x - rect.x) * sx + scroll.x, (client.y - rect.y) * sy + scroll.y);
        local.is_finite().then_some(local)
    }

    /// True when the client point lies inside the root's rectangle.
    #[must_use]
    pub fn is_inside(&self, client_x: f32, client_y: f32) -> bool {
        self.rect().is_some_and(|r| r.contains(Point::new(client_x, client_y)))
    }
}

/// Host geometry held in cells, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct ManualGeometry {
    rect: Cell<Option<Rect>>,
    scroll: Cell<Point>,
    view_box: Cell<Option<(f32, f32)>>,
    generation: Cell<u64>,
    queries: Cell<usize>,
}

impl ManualGeometry {
    /// Geometry attached at `rect`.
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self { rect: Cell::new(Some(rect)), ..Self::default() }
    }

    /// Geometry of a detached element.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Move or resize the element, bumping the layout generation.
    pub fn set_rect(&self, rect: Option<Rect>) {
        self.rect.set(rect);
        self.bump();
    }

    /// Change the rect without bumping the generation (a layout change the
    /// host failed to announce).
    pub fn set_rect_silently(&self, rect: Option<Rect>) {
        self.rect.set(rect);
    }

    /// Set the scroll offset.
    pub fn set_scroll(&self, scroll: Point) {
        self.scroll.set(scroll);
    }

    /// Set the view box size.
    pub fn set_view_box(&self, size: Option<(f32, f32)>) {
        self.view_box.set(size);
    }

    /// Bump the layout generation.
    pub fn bump(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    /// How many times the bounding rect was queried.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl SvgGeometry for ManualGeometry {
    fn bounding_client_rect(&self) -> Option<Rect> {
        self.queries.set(self.queries.get() + 1);
        self.rect.get()
    }

    fn scroll_offset(&self) -> Point {
        self.scroll.get()
    }

    fn view_box_size(&self) -> Option<(f32, f32)> {
        self.view_box.get()
    }

    fn layout_generation(&self) -> u64 {
        self.generation.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn translator(rect: Rect) -> (Rc<ManualGeometry>, CoordinateTranslator) {
        let geometry = Rc::new(ManualGeometry::new(rect));
        let translator = CoordinateTranslator::new(Rc::clone(&geometry) as Rc<dyn SvgGeometry>);
        (geometry, translator)
    }

    #[test]
    fn test_offsets_by_origin() {
        let (_, t) = translator(Rect::new(100.0, 50.0, 400.0, 300.0));
        let p = t.compute_position(150.0, 70.0).unwrap();
        assert_relative_eq!(p.x, 50.0);
        assert_relative_eq!(p.y, 20.0);
    }

    #[test]
    fn test_view_box_and_scroll() {
        let (geometry, t) = translator(Rect::new(0.0, 0.0, 200.0, 100.0));
        geometry.set_view_box(Some((400.0, 200.0)));
        geometry.set_scroll(Point::new(5.0, 0.0));
        let p = t.compute_position(50.0, 50.0).unwrap();
        assert_relative_eq!(p.x, 105.0);
        assert_relative_eq!(p.y, 100.0);
    }

    #[test]
    fn test_detached_is_none() {
        let geometry: Rc<dyn SvgGeometry> = Rc::new(ManualGeometry::detached());
        let t = CoordinateTranslator::new(geometry);
        assert!(t.compute_position(1.0, 1.0).is_none());
        assert!(!t.is_inside(1.0, 1.0));
    }

    #[test]
    fn test_degenerate_and_non_finite() {
        let (_, t) = translator(Rect::new(0.0, 0.0, 0.0, 10.0));
        assert!(t.compute_position(0.0, 0.0).is_none());
        let (_, t) = translator(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(t.compute_position(f32::NAN, 0.0).is_none());
        assert!(t.compute_position(0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_rect_is_cached() {
        let (geometry, t) = translator(Rect::new(0.0, 0.0, 10.0, 10.0));
        for _ in 0..5 {
            t.compute_position(1.0, 1.0);
        }
        assert_eq!(geometry.queries(), 1);
    }

    #[test]
    fn test_generation_change_invalidates() {
        let (geometry, t) = translator(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_relative_eq!(t.compute_position(5.0, 5.0).unwrap().x, 5.0);
        geometry.set_rect(Some(Rect::new(5.0, 0.0, 10.0, 10.0)));
        assert_relative_eq!(t.compute_position(5.0, 5.0).unwrap().x, 0.0);
        assert_eq!(geometry.queries(), 2);
    }

    #[test]
    fn test_explicit_invalidate() {
        let (geometry, t) = translator(Rect::new(0.0, 0.0, 10.0, 10.0));
        t.compute_position(5.0, 5.0);
        geometry.set_rect_silently(Some(Rect::new(2.0, 0.0, 10.0, 10.0)));
        assert_relative_eq!(t.compute_position(5.0, 5.0).unwrap().x, 5.0);
        t.invalidate();
        assert_relative_eq!(t.compute_position(5.0, 5.0).unwrap().x, 3.0);
    }

    #[test]
    fn test_reattach_is_seen() {
        let (geometry, t) = translator(Rect::new(0.0, 0.0, 10.0, 10.0));
        geometry.set_rect_silently(None);
        t.invalidate();
        assert!(t.compute_position(1.0, 1.0).is_none());
        geometry.set_rect_silently(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(t.compute_position(1.0, 1.0).is_some());
    }

    #[test]
    fn test_bounds_policy() {
        let (_, t) = translator(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(t.compute_position(20.0, 5.0).is_some());
        t.set_bounds(BoundsPolicy::Clip);
        assert!(t.compute_position(20.0, 5.0).is_none());
        assert!(t.compute_position(10.0, 10.0).is_some());
        assert!(t.is_inside(0.0, 0.0));
        assert!(!t.is_inside(-0.1, 0.0));
    }
}
