//! Touch dispatcher: start, move and end lanes for one root SVG.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::geometry::Point;
use crate::interaction::callback_set::{BroadcastReport, CallbackKey, CallbackResult, CallbackSet};
use crate::interaction::dispatcher::{DispatcherCore, EventBinding, SvgRoot};
use crate::interaction::registry::{self, RootAttached};
use crate::interaction::translator::CoordinateTranslator;

/// Identifier of one contact, stable for the life of the touch.
pub type TouchId = i64;

/// Translated positions of the touches carried by one event.
pub type TouchPositions = BTreeMap<TouchId, Point>;

/// Callback signature: surviving ids in event order, their positions, and the
/// untouched native event.
pub type TouchCallback = dyn Fn(&[TouchId], &TouchPositions, &TouchEvent) -> CallbackResult;

const TOUCH_EVENT_TYPES: &[&str] = &["touchstart", "touchmove", "touchend"];

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchEventKind {
    /// Contacts began.
    Start,
    /// Contacts moved.
    Move,
    /// Contacts lifted.
    End,
}

impl TouchEventKind {
    /// Native event type name.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            TouchEventKind::Start => "touchstart",
            TouchEventKind::Move => "touchmove",
            TouchEventKind::End => "touchend",
        }
    }

    /// Kind for a native event type name.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "touchstart" => Some(TouchEventKind::Start),
            "touchmove" => Some(TouchEventKind::Move),
            "touchend" => Some(TouchEventKind::End),
            _ => None,
        }
    }
}

/// One contact point in client space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Contact identifier.
    pub identifier: TouchId,
    /// Client X.
    pub client_x: f32,
    /// Client Y.
    pub client_y: f32,
}

impl Touch {
    /// Create a touch.
    #[must_use]
    pub const fn new(identifier: TouchId, client_x: f32, client_y: f32) -> Self {
        Self { identifier, client_x, client_y }
    }
}

/// A native touch event.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    /// Phase.
    pub kind: TouchEventKind,
    /// Contacts that changed in this event.
    pub changed_touches: Vec<Touch>,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
}

impl TouchEvent {
    /// Create an event with a zero timestamp.
    #[must_use]
    pub fn new(kind: TouchEventKind, changed_touches: Vec<Touch>) -> Self {
        Self { kind, changed_touches, timestamp_ms: 0.0 }
    }

    /// Set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Fans touch events of one root out to registered callbacks.
///
/// Obtain the shared instance with [`TouchDispatcher::for_root`]. Each event
/// is translated point by point; untranslatable points are dropped and an
/// event with no surviving point is not broadcast at all.
#[derive(Debug)]
pub struct TouchDispatcher {
    core: DispatcherCore,
    translator: Rc<CoordinateTranslator>,
    start: CallbackSet<CallbackKey, TouchCallback>,
    moves: CallbackSet<CallbackKey, TouchCallback>,
    end: CallbackSet<CallbackKey, TouchCallback>,
}

impl RootAttached for TouchDispatcher {
    fn attach(root: &SvgRoot, translator: Rc<CoordinateTranslator>) -> Self {
        Self::new(translator, root.binding())
    }

    fn detach(&self) {
        self.start.clear();
        self.moves.clear();
        self.end.clear();
        self.core.disconnect_if(true);
    }
}

impl TouchDispatcher {
    /// The dispatcher shared by every consumer of `root`.
    #[must_use]
    pub fn for_root(root: &SvgRoot) -> Rc<Self> {
        registry::dispatcher_for(root)
    }

    /// Standalone dispatcher, outside any registry.
    #[must_use]
    pub fn new(translator: Rc<CoordinateTranslator>, binding: Option<Rc<dyn EventBinding>>) -> Self {
        Self {
            core: DispatcherCore::new(TOUCH_EVENT_TYPES, binding),
            translator,
            start: CallbackSet::new(),
            moves: CallbackSet::new(),
            end: CallbackSet::new(),
        }
    }

    /// Translator shared with the root's other dispatchers.
    #[must_use]
    pub fn translator(&self) -> &Rc<CoordinateTranslator> {
        &self.translator
    }

    fn lane(&self, kind: TouchEventKind) -> &CallbackSet<CallbackKey, TouchCallback> {
        match kind {
            TouchEventKind::Start => &self.start,
            TouchEventKind::Move => &self.moves,
            TouchEventKind::End => &self.end,
        }
    }

    fn set_callback(&self, kind: TouchEventKind, key: CallbackKey, callback: Rc<TouchCallback>) {
        self.core.connect();
        self.lane(kind).add(key, callback);
    }

    fn unset_callback(&self, kind: TouchEventKind, key: &CallbackKey) -> bool {
        let removed = self.lane(kind).remove(key);
        self.core.disconnect_if(self.is_idle());
        removed
    }

    /// Register a touch-start callback.
    pub fn on_touch_start(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(&[TouchId], &TouchPositions, &TouchEvent) -> CallbackResult + 'static,
    ) {
        self.set_callback(TouchEventKind::Start, key.into(), Rc::new(callback));
    }

    /// Register a touch-move callback.
    pub fn on_touch_move(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(&[TouchId], &TouchPositions, &TouchEvent) -> CallbackResult + 'static,
    ) {
        self.set_callback(TouchEventKind::Move, key.into(), Rc::new(callback));
    }

    /// Register a touch-end callback.
    pub fn on_touch_end(
        &self,
        key: impl Into<CallbackKey>,
        callback: impl Fn(&[TouchId], &TouchPositions, &TouchEvent) -> CallbackResult + 'static,
    ) {
        self.set_callback(TouchEventKind::End, key.into(), Rc::new(callback));
    }

    /// Remove a touch-start callback.
    pub fn off_touch_start(&self, key: impl Into<CallbackKey>) -> bool {
        self.unset_callback(TouchEventKind::Start, &key.into())
    }

    /// Remove a touch-move callback.
    pub fn off_touch_move(&self, key: impl Into<CallbackKey>) -> bool {
        self.unset_callback(TouchEventKind::Move, &key.into())
    }

    /// Remove a touch-end callback.
    pub fn off_touch_end(&self, key: impl Into<CallbackKey>) -> bool {
        self.unset_callback(TouchEventKind::End, &key.into())
    }

    /// Number of callbacks on one lane.
    #[must_use]
    pub fn callback_count(&self, kind: TouchEventKind) -> usize {
        self.lane(kind).len()
    }

    /// True when no lane has a callback.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.start.is_empty() && self.moves.is_empty() && self.end.is_empty()
    }

    /// True while listening on the host binding.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    /// Route a native event by type name. Unknown types are ignored.
    pub fn dispatch_native(&self, event_type: &str, event: &TouchEvent) -> Option<BroadcastReport<CallbackKey>> {
        let kind = TouchEventKind::from_event_type(event_type)?;
        self.broadcast(kind, event)
    }

    /// Translate and broadcast `event` on the lane of its kind.
    ///
    /// Returns `None` when the broadcast was suppressed because no point
    /// survived translation.
    pub fn handle(&self, event: &TouchEvent) -> Option<BroadcastReport<CallbackKey>> {
        self.broadcast(event.kind, event)
    }

    fn broadcast(&self, kind: TouchEventKind, event: &TouchEvent) -> Option<BroadcastReport<CallbackKey>> {
        let mut ids = Vec::with_capacity(event.changed_touches.len());
        let mut positions = TouchPositions::new();
        for touch in &event.changed_touches {
            match self.translator.compute_position(touch.client_x, touch.client_y) {
                Some(point) => {
                    if positions.insert(touch.identifier, point).is_none() {
                        ids.push(touch.identifier);
                    }
                }
                None => log::trace!("dropped untranslatable touch {}", touch.identifier),
            }
        }

        if ids.is_empty() {
            log::trace!("suppressed {} with no translatable touches", kind.event_type());
            return None;
        }
        Some(self.lane(kind).call_all(|callback| callback(&ids, &positions, event)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::interaction::dispatcher::tests::RecordingBinding;
    use crate::interaction::translator::{ManualGeometry, SvgGeometry};
    use std::cell::RefCell;

    type Seen = Rc<RefCell<Vec<(Vec<TouchId>, TouchPositions)>>>;

    fn dispatcher(rect: Option<Rect>) -> TouchDispatcher {
        let geometry: Rc<dyn SvgGeometry> = match rect {
            Some(rect) => Rc::new(ManualGeometry::new(rect)),
            None => Rc::new(ManualGeometry::detached()),
        };
        TouchDispatcher::new(Rc::new(CoordinateTranslator::new(geometry)), None)
    }

    fn record_into(seen: &Seen) -> impl Fn(&[TouchId], &TouchPositions, &TouchEvent) -> CallbackResult + 'static {
        let seen = Rc::clone(seen);
        move |ids: &[TouchId], positions: &TouchPositions, _: &TouchEvent| {
            seen.borrow_mut().push((ids.to_vec(), positions.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_broadcasts_translated_points() {
        let d = dispatcher(Some(Rect::new(10.0, 10.0, 100.0, 100.0)));
        let seen: Seen = Rc::default();
        d.on_touch_start("k", record_into(&seen));

        let event = TouchEvent::new(TouchEventKind::Start, vec![Touch::new(3, 20.0, 30.0), Touch::new(1, 15.0, 15.0)]);
        let report = d.handle(&event).unwrap();
        assert_eq!(report.delivered, 1);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec![3, 1]);
        assert_eq!(seen[0].1[&3], Point::new(10.0, 20.0));
        assert_eq!(seen[0].1[&1], Point::new(5.0, 5.0));
    }

    #[test]
    fn test_detached_root_suppresses_broadcast() {
        let d = dispatcher(None);
        let seen: Seen = Rc::default();
        d.on_touch_move("k", record_into(&seen));
        let event = TouchEvent::new(TouchEventKind::Move, vec![Touch::new(0, 1.0, 1.0)]);
        assert!(d.handle(&event).is_none());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_partial_translation_drops_points() {
        let d = dispatcher(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let seen: Seen = Rc::default();
        d.on_touch_end("k", record_into(&seen));
        let event = TouchEvent::new(
            TouchEventKind::End,
            vec![Touch::new(0, f32::NAN, 1.0), Touch::new(1, 5.0, 5.0), Touch::new(2, 1.0, f32::INFINITY)],
        );
        d.handle(&event);
        let seen = seen.borrow();
        assert_eq!(seen[0].0, vec![1]);
        assert_eq!(seen[0].1.len(), 1);
    }

    #[test]
    fn test_lanes_are_independent() {
        let d = dispatcher(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let starts: Seen = Rc::default();
        let ends: Seen = Rc::default();
        d.on_touch_start("k", record_into(&starts));
        d.on_touch_end("k", record_into(&ends));
        d.handle(&TouchEvent::new(TouchEventKind::Start, vec![Touch::new(0, 1.0, 1.0)]));
        d.handle(&TouchEvent::new(TouchEventKind::Move, vec![Touch::new(0, 2.0, 2.0)]));
        assert_eq!(starts.borrow().len(), 1);
        assert!(ends.borrow().is_empty());
    }

    #[test]
    fn test_dispatch_native_routes_by_type() {
        let d = dispatcher(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let moves: Seen = Rc::default();
        d.on_touch_move("k", record_into(&moves));
        let event = TouchEvent::new(TouchEventKind::Start, vec![Touch::new(0, 1.0, 1.0)]);
        assert!(d.dispatch_native("touchmove", &event).is_some());
        assert!(d.dispatch_native("touchcancel", &event).is_none());
        assert_eq!(moves.borrow().len(), 1);
    }

    #[test]
    fn test_off_removes_and_disconnects() {
        let binding = Rc::new(RecordingBinding::default());
        let geometry: Rc<dyn SvgGeometry> = Rc::new(ManualGeometry::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let d = TouchDispatcher::new(
            Rc::new(CoordinateTranslator::new(geometry)),
            Some(Rc::clone(&binding) as Rc<dyn EventBinding>),
        );
        assert!(!d.is_connected());
        d.on_touch_start("a", |_, _, _| Ok(()));
        d.on_touch_end("b", |_, _, _| Ok(()));
        assert!(d.is_connected());
        assert!(d.off_touch_start("a"));
        assert!(d.is_connected());
        assert!(!d.off_touch_start("a"));
        assert!(d.off_touch_end("b"));
        assert!(!d.is_connected());
        assert_eq!(
            *binding.calls.borrow(),
            vec!["+touchstart", "+touchmove", "+touchend", "-touchstart", "-touchmove", "-touchend"]
        );
    }

    #[test]
    fn test_same_key_replaces() {
        let d = dispatcher(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let first: Seen = Rc::default();
        let second: Seen = Rc::default();
        d.on_touch_start("k", record_into(&first));
        d.on_touch_start("k", record_into(&second));
        assert_eq!(d.callback_count(TouchEventKind::Start), 1);
        d.handle(&TouchEvent::new(TouchEventKind::Start, vec![Touch::new(0, 1.0, 1.0)]));
        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn test_failing_callback_does_not_starve() {
        let d = dispatcher(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let seen: Seen = Rc::default();
        d.on_touch_start("bad", |_, _, _| Err("nope".into()));
        d.on_touch_start("good", record_into(&seen));
        let report = d.handle(&TouchEvent::new(TouchEventKind::Start, vec![Touch::new(0, 1.0, 1.0)])).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_event_passes_through() {
        let d = dispatcher(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let stamp = Rc::new(RefCell::new(0.0));
        let sink = Rc::clone(&stamp);
        d.on_touch_start("k", move |_, _, event| {
            *sink.borrow_mut() = event.timestamp_ms;
            Ok(())
        });
        d.handle(&TouchEvent::new(TouchEventKind::Start, vec![Touch::new(0, 1.0, 1.0)]).with_timestamp(42.5));
        assert_eq!(*stamp.borrow(), 42.5);
    }
}
