//! Per-root dispatcher registry.
//!
//! Every root SVG gets at most one dispatcher of each kind and one
//! [`CoordinateTranslator`] shared between them. Entries are created on first
//! lookup and live until [`DispatcherRegistry::release`] tears them down;
//! nothing is released implicitly.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interaction::dispatcher::{RootId, SvgRoot};
use crate::interaction::translator::{BoundsPolicy, CoordinateTranslator};

/// A dispatcher kind the registry can create for a root.
pub trait RootAttached: 'static {
    /// Build the dispatcher for `root` around its shared translator.
    fn attach(root: &SvgRoot, translator: Rc<CoordinateTranslator>) -> Self
    where
        Self: Sized;

    /// Drop every callback and stop listening on the host.
    fn detach(&self);
}

struct Entry {
    any: Rc<dyn Any>,
    attached: Rc<dyn RootAttached>,
}

/// Maps root handles to their dispatchers.
#[derive(Default)]
pub struct DispatcherRegistry {
    translators: HashMap<RootId, Rc<CoordinateTranslator>>,
    dispatchers: HashMap<(RootId, TypeId), Entry>,
    bounds: BoundsPolicy,
}

impl std::fmt::Debug for DispatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherRegistry")
            .field("roots", &self.translators.len())
            .field("dispatchers", &self.dispatchers.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl DispatcherRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds policy given to translators created from now on.
    pub fn set_bounds(&mut self, bounds: BoundsPolicy) {
        self.bounds = bounds;
    }

    /// The translator shared by every dispatcher of `root`.
    pub fn translator(&mut self, root: &SvgRoot) -> Rc<CoordinateTranslator> {
        let bounds = self.bounds;
        let translator = self.translators.entry(root.id()).or_insert_with(|| {
            let translator = CoordinateTranslator::new(root.geometry());
            translator.set_bounds(bounds);
            Rc::new(translator)
        });
        Rc::clone(translator)
    }

    /// The dispatcher of kind `D` for `root`, created on first use.
    pub fn get_or_create<D: RootAttached>(&mut self, root: &SvgRoot) -> Rc<D> {
        let key = (root.id(), TypeId::of::<D>());
        if let Some(existing) = self.get::<D>(root.id()) {
            return existing;
        }

        let translator = self.translator(root);
        let dispatcher = Rc::new(D::attach(root, translator));
        log::debug!("created {} for root {}", std::any::type_name::<D>(), root.id().get());
        let any: Rc<dyn Any> = Rc::clone(&dispatcher) as Rc<dyn Any>;
        let attached: Rc<dyn RootAttached> = Rc::clone(&dispatcher) as Rc<dyn RootAttached>;
        self.dispatchers.insert(key, Entry { any, attached });
        dispatcher
    }

    /// The dispatcher of kind `D` for `root`, if one exists.
    #[must_use]
    pub fn get<D: RootAttached>(&self, root: RootId) -> Option<Rc<D>> {
        let entry = self.dispatchers.get(&(root, TypeId::of::<D>()))?;
        Rc::clone(&entry.any).downcast::<D>().ok()
    }

    /// True when anything is registered for `root`.
    #[must_use]
    pub fn contains(&self, root: RootId) -> bool {
        self.translators.contains_key(&root)
    }

    /// Number of roots with registry entries.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.translators.len()
    }

    /// Tear down every dispatcher of `root`. Returns whether it was known.
    ///
    /// Outstanding `Rc` handles stay valid but are detached: their callbacks
    /// are cleared and they no longer listen on the host.
    pub fn release(&mut self, root: RootId) -> bool {
        let known = self.translators.remove(&root).is_some();
        let keys: Vec<_> = self.dispatchers.keys().filter(|(id, _)| *id == root).copied().collect();
        for key in keys {
            if let Some(entry) = self.dispatchers.remove(&key) {
                entry.attached.detach();
            }
        }
        if known {
            log::debug!("released root {}", root.get());
        }
        known
    }
}

thread_local! {
    static REGISTRY: RefCell<DispatcherRegistry> = RefCell::new(DispatcherRegistry::new());
}

/// Run `f` against this thread's default registry.
///
/// `f` must not re-enter the default registry.
pub fn with_registry<R>(f: impl FnOnce(&mut DispatcherRegistry) -> R) -> R {
    REGISTRY.with(|registry| f(&mut registry.borrow_mut()))
}

/// The dispatcher of kind `D` for `root` in the default registry.
pub fn dispatcher_for<D: RootAttached>(root: &SvgRoot) -> Rc<D> {
    with_registry(|registry| registry.get_or_create::<D>(root))
}

/// Release `root` from the default registry.
pub fn release_root(root: RootId) -> bool {
    with_registry(|registry| registry.release(root))
}
