//! Pointer and touch interaction.
//!
//! Native events from the host are translated into SVG-local points and
//! broadcast to keyed callbacks. One dispatcher of each kind exists per root
//! SVG element; look it up with `for_root` and release it with
//! [`release_root`] when the root goes away.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use interplot::geometry::Rect;
//! use interplot::interaction::{
//!     ManualGeometry, SvgGeometry, SvgRoot, Touch, TouchDispatcher, TouchEvent, TouchEventKind,
//! };
//!
//! let geometry: Rc<dyn SvgGeometry> = Rc::new(ManualGeometry::new(Rect::new(10.0, 10.0, 200.0, 100.0)));
//! let root = SvgRoot::new(geometry);
//! let dispatcher = TouchDispatcher::for_root(&root);
//! dispatcher.on_touch_start("pan", |ids, positions, _event| {
//!     assert_eq!(ids, &[7]);
//!     assert_eq!(positions[&7].x, 5.0);
//!     Ok(())
//! });
//!
//! let event = TouchEvent::new(TouchEventKind::Start, vec![Touch::new(7, 15.0, 20.0)]);
//! assert_eq!(dispatcher.handle(&event).map(|r| r.delivered), Some(1));
//! interplot::interaction::release_root(root.id());
//! ```

mod callback_set;
mod dispatcher;
mod mouse;
mod registry;
mod touch;
mod translator;

pub use callback_set::{
    BroadcastReport, CallbackError, CallbackFailure, CallbackKey, CallbackResult, CallbackSet,
};
pub use dispatcher::{EventBinding, RootId, SvgRoot};
pub use mouse::{MouseCallback, MouseDispatcher, MouseEvent, MouseEventKind, MouseLane};
pub use registry::{dispatcher_for, release_root, with_registry, DispatcherRegistry, RootAttached};
pub use touch::{Touch, TouchCallback, TouchDispatcher, TouchEvent, TouchEventKind, TouchId, TouchPositions};
pub use translator::{BoundsPolicy, CoordinateTranslator, ManualGeometry, SvgGeometry};
