//! Mouse dispatcher: move, down, up, wheel and double-click lanes.
//!
//! Move and up events are measured at page scope: they are broadcast wherever
//! the pointer is, so drags that leave the SVG keep reporting. Down, wheel
//! and double-click only count when they happen inside the root's rectangle.

use std::cell::Cell;
use std::rc::Rc;

use crate::geometry::Point;
use crate::interaction::callback_set::{BroadcastReport, CallbackKey, CallbackResult, CallbackSet};
use crate::interaction::dispatcher::{DispatcherCore, EventBinding, SvgRoot};
use crate::interaction::registry::{self, RootAttached};
use crate::interaction::translator::CoordinateTranslator;

/// Callback signature: translated position and the untouched native event.
pub type MouseCallback = dyn Fn(Point, &MouseEvent) -> CallbackResult;

const MOUSE_EVENT_TYPES: &[&str] = &["mouseover", "mousemove", "mouseout", "mousedown", "mouseup", "wheel", "dblclick"];

/// Native mouse event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Pointer entered an element.
    Over,
    /// Pointer moved.
    Move,
    /// Pointer left an element.
    Out,
    /// Button pressed.
    Down,
    /// Button released.
    Up,
    /// Wheel turned.
    Wheel,
    /// Double click.
    DblClick,
}

impl MouseEventKind {
    /// Native event type name.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            MouseEventKind::Over => "mouseover",
            MouseEventKind::Move => "mousemove",
            MouseEventKind::Out => "mouseout",
            MouseEventKind::Down => "mousedown",
            MouseEventKind::Up => "mouseup",
            MouseEventKind::Wheel => "wheel",
            MouseEventKind::DblClick => "dblclick",
        }
    }

    /// Kind for a native event type name.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        MOUSE_KINDS.iter().copied().find(|k| k.event_type() == event_type)
    }
}

const MOUSE_KINDS: [MouseEventKind; 7] = [
    MouseEventKind::Over,
    MouseEventKind::Move,
    MouseEventKind::Out,
    MouseEventKind::Down,
    MouseEventKind::Up,
    MouseEventKind::Wheel,
    MouseEventKind::DblClick,
];

/// A native mouse or wheel event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    /// Event type.
    pub kind: MouseEventKind,
    /// Client X.
    pub client_x: f32,
    /// Client Y.
    pub client_y: f32,
    /// Button index (0 = primary).
    pub button: i16,
    /// Vertical wheel delta; zero for non-wheel events.
    pub delta_y: f32,
}

impl MouseEvent {
    /// Create an event at a client position.
    #[must_use]
    pub const fn new(kind: MouseEventKind, client_x: f32, client_y: f32) -> Self {
        Self { kind, client_x, client_y, button: 0, delta_y: 0.0 }
    }

    /// Set the button.
    #[must_use]
    pub const fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }

    /// Set the wheel delta.
    #[must_use]
    pub const fn with_delta_y(mut self, delta_y: f32) -> Self {
        self.delta_y = delta_y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Page,
    Element,
}

/// Callback lanes of a [`MouseDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseLane {
    /// Fed by over, move and out.
    Move,
    /// Fed by down.
    Down,
    /// Fed by up.
    Up,
    /// Fed by wheel.
    Wheel,
    /// Fed by dblclick.
    DblClick,
}

impl MouseLane {
    fn for_kind(kind: MouseEventKind) -> (Self, Scope) {
        match kind {
            MouseEventKind::Over | MouseEventKind::Move | MouseEventKind::Out => (MouseLane::Move, Scope::Page),
            MouseEventKind::Down => (MouseLane::Down, Scope::Element),
            MouseEventKind::Up => (MouseLane::Up, Scope::Page),
            MouseEventKind::Wheel => (MouseLane::Wheel, Scope::Element),
            MouseEventKind::DblClick => (MouseLane::DblClick, Scope::Element),
        }
    }
}

/// Fans mouse events of one root out to registered callbacks.
#[derive(Debug)]
pub struct MouseDispatcher {
    core: DispatcherCore,
    translator: Rc<CoordinateTranslator>,
    last_position: Cell<Point>,
    moves: CallbackSet<CallbackKey, MouseCallback>,
    down: CallbackSet<CallbackKey, MouseCallback>,
    up: CallbackSet<CallbackKey, MouseCallback>,
    wheel: CallbackSet<CallbackKey, MouseCallback>,
    dbl_click: CallbackSet<CallbackKey, MouseCallback>,
}

impl RootAttached for MouseDispatcher {
    fn attach(root: &SvgRoot, translator: Rc<CoordinateTranslator>) -> Self {
        Self::new(translator, root.binding())
    }

    fn detach(&self) {
        for lane in [MouseLane::Move, MouseLane::Down, MouseLane::Up, MouseLane::Wheel, MouseLane::DblClick] {
            self.lane(lane).clear();
        }
        self.core.disconnect_if(true);
    }
}

impl MouseDispatcher {
    /// The dispatcher shared by every consumer of `root`.
    #[must_use]
    pub fn for_root(root: &SvgRoot) -> Rc<Self> {
        registry::dispatcher_for(root)
    }

    /// Standalone dispatcher, outside any registry.
    #[must_use]
    pub fn new(translator: Rc<CoordinateTranslator>, binding: Option<Rc<dyn EventBinding>>) -> Self {
        Self {
            core: DispatcherCore::new(MOUSE_EVENT_TYPES, binding),
            translator,
            last_position: Cell::new(Point::new(-1.0, -1.0)),
            moves: CallbackSet::new(),
            down: CallbackSet::new(),
            up: CallbackSet::new(),
            wheel: CallbackSet::new(),
            dbl_click: CallbackSet::new(),
        }
    }

    /// Translator shared with the root's other dispatchers.
    #[must_use]
    pub fn translator(&self) -> &Rc<CoordinateTranslator> {
        &self.translator
    }

    /// Last successfully translated position; `(-1, -1)` before any.
    #[must_use]
    pub fn last_mouse_position(&self) -> Point {
        self.last_position.get()
    }

    fn lane(&self, lane: MouseLane) -> &CallbackSet<CallbackKey, MouseCallback> {
        match lane {
            MouseLane::Move => &self.moves,
            MouseLane::Down => &self.down,
            MouseLane::Up => &self.up,
            MouseLane::Wheel => &self.wheel,
            MouseLane::DblClick => &self.dbl_click,
        }
    }

    /// Register `callback` on `lane`.
    pub fn on(
        &self,
        lane: MouseLane,
        key: impl Into<CallbackKey>,
        callback: impl Fn(Point, &MouseEvent) -> CallbackResult + 'static,
    ) {
        self.core.connect();
        self.lane(lane).add(key.into(), Rc::new(callback));
    }

    /// Remove the callback registered under `key` on `lane`.
    pub fn off(&self, lane: MouseLane, key: impl Into<CallbackKey>) -> bool {
        let removed = self.lane(lane).remove(&key.into());
        self.core.disconnect_if(self.is_idle());
        removed
    }

    /// Register a move callback (over, move and out events).
    pub fn on_mouse_move(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(Point, &MouseEvent) -> CallbackResult + 'static,
    ) {
        self.on(MouseLane::Move, key, callback);
    }

    /// Remove a move callback.
    pub fn off_mouse_move(&self, key: impl Into<CallbackKey>) -> bool {
        self.off(MouseLane::Move, key)
    }

    /// Register a button-down callback.
    pub fn on_mouse_down(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(Point, &MouseEvent) -> CallbackResult + 'static,
    ) {
        self.on(MouseLane::Down, key, callback);
    }

    /// Remove a button-down callback.
    pub fn off_mouse_down(&self, key: impl Into<CallbackKey>) -> bool {
        self.off(MouseLane::Down, key)
    }

    /// Register a button-up callback.
    pub fn on_mouse_up(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(Point, &MouseEvent) -> CallbackResult + 'static,
    ) {
        self.on(MouseLane::Up, key, callback);
    }

    /// Remove a button-up callback.
    pub fn off_mouse_up(&self, key: impl Into<CallbackKey>) -> bool {
        self.off(MouseLane::Up, key)
    }

    /// Register a wheel callback.
    pub fn on_wheel(&self, key: impl Into<CallbackKey>, callback: impl Fn(Point, &MouseEvent) -> CallbackResult + 'static) {
        self.on(MouseLane::Wheel, key, callback);
    }

    /// Remove a wheel callback.
    pub fn off_wheel(&self, key: impl Into<CallbackKey>) -> bool {
        self.off(MouseLane::Wheel, key)
    }

    /// Register a double-click callback.
    pub fn on_dbl_click(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(Point, &MouseEvent) -> CallbackResult + 'static,
    ) {
        self.on(MouseLane::DblClick, key, callback);
    }

    /// Remove a double-click callback.
    pub fn off_dbl_click(&self, key: impl Into<CallbackKey>) -> bool {
        self.off(MouseLane::DblClick, key)
    }

    /// Number of callbacks on one lane.
    #[must_use]
    pub fn callback_count(&self, lane: MouseLane) -> usize {
        self.lane(lane).len()
    }

    /// True when no lane has a callback.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.moves.is_empty()
            && self.down.is_empty()
            && self.up.is_empty()
            && self.wheel.is_empty()
            && self.dbl_click.is_empty()
    }

    /// True while listening on the host binding.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    /// Route a native event by type name. Unknown types are ignored.
    pub fn dispatch_native(&self, event_type: &str, event: &MouseEvent) -> Option<BroadcastReport<CallbackKey>> {
        let kind = MouseEventKind::from_event_type(event_type)?;
        self.measure_and_dispatch(kind, event)
    }

    /// Translate and broadcast `event` on the lane of its kind.
    ///
    /// Returns `None` when the event was out of scope or untranslatable.
    pub fn handle(&self, event: &MouseEvent) -> Option<BroadcastReport<CallbackKey>> {
        self.measure_and_dispatch(event.kind, event)
    }

    fn measure_and_dispatch(&self, kind: MouseEventKind, event: &MouseEvent) -> Option<BroadcastReport<CallbackKey>> {
        let (lane, scope) = MouseLane::for_kind(kind);
        if scope == Scope::Element && !self.translator.is_inside(event.client_x, event.client_y) {
            log::trace!("{} outside root ignored", kind.event_type());
            return None;
        }
        let Some(position) = self.translator.compute_position(event.client_x, event.client_y) else {
            log::trace!("{} untranslatable", kind.event_type());
            return None;
        };
        self.last_position.set(position);
        Some(self.lane(lane).call_all(|callback| callback(position, event)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::interaction::translator::{ManualGeometry, SvgGeometry};
    use std::cell::RefCell;

    fn dispatcher() -> MouseDispatcher {
        let geometry: Rc<dyn SvgGeometry> = Rc::new(ManualGeometry::new(Rect::new(100.0, 100.0, 200.0, 200.0)));
        MouseDispatcher::new(Rc::new(CoordinateTranslator::new(geometry)), None)
    }

    fn record_into(seen: &Rc<RefCell<Vec<Point>>>) -> impl Fn(Point, &MouseEvent) -> CallbackResult + 'static {
        let seen = Rc::clone(seen);
        move |p: Point, _: &MouseEvent| {
            seen.borrow_mut().push(p);
            Ok(())
        }
    }

    #[test]
    fn test_initial_position() {
        assert_eq!(dispatcher().last_mouse_position(), Point::new(-1.0, -1.0));
    }

    #[test]
    fn test_move_lane_fed_by_over_move_out() {
        let d = dispatcher();
        let seen = Rc::new(RefCell::new(Vec::new()));
        d.on_mouse_move("k", record_into(&seen));
        for kind in [MouseEventKind::Over, MouseEventKind::Move, MouseEventKind::Out] {
            d.handle(&MouseEvent::new(kind, 110.0, 120.0));
        }
        assert_eq!(*seen.borrow(), vec![Point::new(10.0, 20.0); 3]);
        assert_eq!(d.last_mouse_position(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_move_is_page_scoped() {
        let d = dispatcher();
        let seen = Rc::new(RefCell::new(Vec::new()));
        d.on_mouse_move("k", record_into(&seen));
        d.handle(&MouseEvent::new(MouseEventKind::Move, 50.0, 50.0));
        assert_eq!(*seen.borrow(), vec![Point::new(-50.0, -50.0)]);
    }

    #[test]
    fn test_down_is_element_scoped() {
        let d = dispatcher();
        let seen = Rc::new(RefCell::new(Vec::new()));
        d.on_mouse_down("k", record_into(&seen));
        assert!(d.handle(&MouseEvent::new(MouseEventKind::Down, 50.0, 50.0)).is_none());
        assert!(seen.borrow().is_empty());
        assert_eq!(d.last_mouse_position(), Point::new(-1.0, -1.0));
        d.handle(&MouseEvent::new(MouseEventKind::Down, 150.0, 150.0));
        assert_eq!(*seen.borrow(), vec![Point::new(50.0, 50.0)]);
    }

    #[test]
    fn test_up_is_page_scoped() {
        let d = dispatcher();
        let seen = Rc::new(RefCell::new(Vec::new()));
        d.on_mouse_up("k", record_into(&seen));
        d.handle(&MouseEvent::new(MouseEventKind::Up, 0.0, 0.0));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_wheel_and_dblclick() {
        let d = dispatcher();
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&deltas);
        d.on_wheel("k", move |_, e| {
            sink.borrow_mut().push(e.delta_y);
            Ok(())
        });
        let clicks = Rc::new(RefCell::new(Vec::new()));
        d.on_dbl_click("k", record_into(&clicks));

        d.dispatch_native("wheel", &MouseEvent::new(MouseEventKind::Wheel, 150.0, 150.0).with_delta_y(-3.0));
        d.dispatch_native("wheel", &MouseEvent::new(MouseEventKind::Wheel, 0.0, 0.0).with_delta_y(5.0));
        d.dispatch_native("dblclick", &MouseEvent::new(MouseEventKind::DblClick, 300.0, 300.0));
        assert_eq!(*deltas.borrow(), vec![-3.0]);
        assert_eq!(*clicks.borrow(), vec![Point::new(200.0, 200.0)]);
        assert!(d.dispatch_native("contextmenu", &MouseEvent::new(MouseEventKind::Down, 150.0, 150.0)).is_none());
    }

    #[test]
    fn test_off_and_idle() {
        let d = dispatcher();
        d.on_mouse_move("a", |_, _| Ok(()));
        d.on(MouseLane::Wheel, "b", |_, _| Ok(()));
        assert!(d.is_connected());
        assert_eq!(d.callback_count(MouseLane::Wheel), 1);
        assert!(d.off_mouse_move("a"));
        assert!(d.off_wheel("b"));
        assert!(d.is_idle());
        assert!(!d.is_connected());
    }

    #[test]
    fn test_event_type_names_round_trip() {
        for kind in MOUSE_KINDS {
            assert_eq!(MouseEventKind::from_event_type(kind.event_type()), Some(kind));
        }
    }
}
