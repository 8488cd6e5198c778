//! Shared dispatcher plumbing: root handles and host event bindings.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::interaction::translator::SvgGeometry;

/// Subscribes a root SVG element to native events on behalf of a dispatcher.
///
/// Implementations forward every event of a listened type back into the
/// dispatcher's `dispatch_native`.
pub trait EventBinding {
    /// Start delivering `event_type` events.
    fn listen(&self, event_type: &'static str);

    /// Stop delivering `event_type` events.
    fn unlisten(&self, event_type: &'static str);
}

static NEXT_ROOT: AtomicU64 = AtomicU64::new(1);

/// Opaque handle naming one root SVG element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(u64);

impl RootId {
    /// Allocate a fresh, process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ROOT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A root SVG element as the interaction layer sees it.
#[derive(Clone)]
pub struct SvgRoot {
    id: RootId,
    geometry: Rc<dyn SvgGeometry>,
    binding: Option<Rc<dyn EventBinding>>,
}

impl fmt::Debug for SvgRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvgRoot").field("id", &self.id).field("bound", &self.binding.is_some()).finish()
    }
}

impl SvgRoot {
    /// Root with a fresh id over the given geometry.
    #[must_use]
    pub fn new(geometry: Rc<dyn SvgGeometry>) -> Self {
        Self { id: RootId::next(), geometry, binding: None }
    }

    /// Attach the host's event binding.
    #[must_use]
    pub fn with_binding(mut self, binding: Rc<dyn EventBinding>) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Registry handle.
    #[must_use]
    pub fn id(&self) -> RootId {
        self.id
    }

    /// Host geometry.
    #[must_use]
    pub fn geometry(&self) -> Rc<dyn SvgGeometry> {
        Rc::clone(&self.geometry)
    }

    /// Host event binding, if any.
    #[must_use]
    pub fn binding(&self) -> Option<Rc<dyn EventBinding>> {
        self.binding.clone()
    }
}

/// Listen/unlisten bookkeeping shared by every dispatcher kind.
pub(crate) struct DispatcherCore {
    event_types: &'static [&'static str],
    binding: Option<Rc<dyn EventBinding>>,
    connected: Cell<bool>,
}

impl fmt::Debug for DispatcherCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherCore")
            .field("event_types", &self.event_types)
            .field("connected", &self.connected.get())
            .finish()
    }
}

impl DispatcherCore {
    pub(crate) fn new(event_types: &'static [&'static str], binding: Option<Rc<dyn EventBinding>>) -> Self {
        Self { event_types, binding, connected: Cell::new(false) }
    }

    /// Listen on every event type, once.
    pub(crate) fn connect(&self) {
        if self.connected.replace(true) {
            return;
        }
        if let Some(binding) = &self.binding {
            for event_type in self.event_types {
                binding.listen(event_type);
            }
        }
        log::debug!("dispatcher connected to {:?}", self.event_types);
    }

    /// Stop listening once nothing is registered.
    pub(crate) fn disconnect_if(&self, idle: bool) {
        if !idle || !self.connected.replace(false) {
            return;
        }
        if let Some(binding) = &self.binding {
            for event_type in self.event_types {
                binding.unlisten(event_type);
            }
        }
        log::debug!("dispatcher disconnected from {:?}", self.event_types);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Binding that records every listen/unlisten call.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBinding {
        pub(crate) calls: RefCell<Vec<String>>,
    }

    impl EventBinding for RecordingBinding {
        fn listen(&self, event_type: &'static str) {
            self.calls.borrow_mut().push(format!("+{event_type}"));
        }

        fn unlisten(&self, event_type: &'static str) {
            self.calls.borrow_mut().push(format!("-{event_type}"));
        }
    }

    #[test]
    fn test_connect_once_and_disconnect_when_idle() {
        let binding = Rc::new(RecordingBinding::default());
        let core = DispatcherCore::new(&["a", "b"], Some(Rc::clone(&binding) as Rc<dyn EventBinding>));
        core.connect();
        core.connect();
        assert!(core.is_connected());
        core.disconnect_if(false);
        assert!(core.is_connected());
        core.disconnect_if(true);
        core.disconnect_if(true);
        assert!(!core.is_connected());
        assert_eq!(*binding.calls.borrow(), vec!["+a", "+b", "-a", "-b"]);
    }

    #[test]
    fn test_root_ids_are_unique() {
        assert_ne!(RootId::next(), RootId::next());
    }
}
