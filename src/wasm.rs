//! Browser glue for interaction.
//!
//! Adapts DOM elements and events to the host-neutral interaction types.
//! The page installs its own listeners and forwards events:
//!
//! ```rust,ignore
//! let root = SvgRoot::new(Rc::new(DomGeometry::new(svg_element)));
//! let touch = TouchDispatcher::for_root(&root);
//! // in the "touchstart" listener:
//! if let Some(event) = touch_event_from_dom(&dom_event) {
//!     touch.handle(&event);
//! }
//! ```

use std::cell::Cell;

use wasm_bindgen::JsCast;

use crate::geometry::{Point, Rect};
use crate::interaction::{MouseEvent, MouseEventKind, SvgGeometry, Touch, TouchEvent, TouchEventKind};

/// [`SvgGeometry`] of a live DOM element.
#[derive(Debug)]
pub struct DomGeometry {
    element: web_sys::Element,
    generation: Cell<u64>,
}

impl DomGeometry {
    /// Wrap a root SVG element.
    #[must_use]
    pub fn new(element: web_sys::Element) -> Self {
        Self { element, generation: Cell::new(0) }
    }

    /// Signal that layout may have changed, e.g. from a resize or scroll
    /// listener.
    pub fn layout_changed(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }
}

impl SvgGeometry for DomGeometry {
    fn bounding_client_rect(&self) -> Option<Rect> {
        if !self.element.is_connected() {
            return None;
        }
        let r = self.element.get_bounding_client_rect();
        Some(Rect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32))
    }

    fn scroll_offset(&self) -> Point {
        Point::new(self.element.scroll_left() as f32, self.element.scroll_top() as f32)
    }

    fn layout_generation(&self) -> u64 {
        self.generation.get()
    }
}

/// Convert a DOM touch event. Returns `None` for event types the touch
/// dispatcher does not handle.
#[must_use]
pub fn touch_event_from_dom(event: &web_sys::TouchEvent) -> Option<TouchEvent> {
    let kind = TouchEventKind::from_event_type(&event.type_())?;
    let list = event.changed_touches();
    let touches = (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| Touch::new(i64::from(t.identifier()), t.client_x() as f32, t.client_y() as f32))
        .collect();
    Some(TouchEvent::new(kind, touches).with_timestamp(event.time_stamp()))
}

/// Convert a DOM mouse or wheel event. Returns `None` for event types the
/// mouse dispatcher does not handle.
#[must_use]
pub fn mouse_event_from_dom(event: &web_sys::MouseEvent) -> Option<MouseEvent> {
    let kind = MouseEventKind::from_event_type(&event.type_())?;
    let mut converted =
        MouseEvent::new(kind, event.client_x() as f32, event.client_y() as f32).with_button(event.button());
    if let Some(wheel) = event.dyn_ref::<web_sys::WheelEvent>() {
        converted = converted.with_delta_y(wheel.delta_y() as f32);
    }
    Some(converted)
}
