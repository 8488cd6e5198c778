//! Shared plot machinery: projectors, datasets, extents and the render loop.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::accessor::{Accessor, Projector};
use crate::config::ChartConfig;
use crate::dataset::{Dataset, DatasetId, Metadata, Record};
use crate::error::{Error, Result};
use crate::render::{AttrValue, Binding, Element, ElementId, JoinKey, RenderArea, Selection, Timing, Transitions};
use crate::scale::ScaleRef;

static NEXT_PLOT: AtomicU64 = AtomicU64::new(1);

/// Element counts of one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Elements created.
    pub entered: usize,
    /// Elements kept and re-applied.
    pub updated: usize,
    /// Elements removed.
    pub exited: usize,
}

impl RenderSummary {
    /// True when nothing was created or removed.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.entered == 0 && self.exited == 0
    }
}

impl AddAssign for RenderSummary {
    fn add_assign(&mut self, other: Self) {
        self.entered += other.entered;
        self.updated += other.updated;
        self.exited += other.exited;
    }
}

/// Render area and pending transitions of one attached dataset.
#[derive(Debug)]
pub struct DrawGroup {
    dataset: Dataset,
    area: RenderArea,
    transitions: Transitions,
}

impl DrawGroup {
    fn new(dataset: Dataset) -> Self {
        Self { dataset, area: RenderArea::new(), transitions: Transitions::default() }
    }

    /// The dataset drawn by this group.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Elements drawn for the dataset.
    #[must_use]
    pub fn area(&self) -> &RenderArea {
        &self.area
    }

    pub(crate) fn area_mut(&mut self) -> &mut RenderArea {
        &mut self.area
    }

    /// Join `keys` against the bound elements.
    ///
    /// Entering records get a fresh element from `make`, appended in record
    /// order; kept elements are rebound to their new index. Returns the
    /// `(element, record index)` pairs to bring up to date and the elements
    /// to detach once they are.
    pub(crate) fn reconcile(
        &mut self,
        keys: &[JoinKey],
        whole_dataset: bool,
        make: impl Fn(usize) -> Element,
    ) -> (Vec<(ElementId, usize)>, Vec<ElementId>, RenderSummary) {
        let bound: Vec<(ElementId, JoinKey)> = self
            .area
            .elements()
            .iter()
            .filter_map(|e| e.binding().map(|b| (e.id(), b.key.clone())))
            .collect();
        let existing: Vec<JoinKey> = bound.iter().map(|(_, k)| k.clone()).collect();
        let plan = crate::render::join(&existing, keys);

        let dataset = self.dataset.id();
        let binding = |j: usize| Binding { dataset, key: keys[j].clone(), index: (!whole_dataset).then_some(j) };

        let mut targets = Vec::with_capacity(plan.update.len() + plan.enter.len());
        for &(i, j) in &plan.update {
            let id = bound[i].0;
            if let Some(element) = self.area.get_mut(id) {
                element.rebind(binding(j));
            }
            targets.push((id, j));
        }
        for &j in &plan.enter {
            let id = self.area.append(make(j).bound(binding(j)));
            targets.push((id, j));
        }
        let exits: Vec<ElementId> = plan.exit.iter().map(|&i| bound[i].0).collect();

        let summary = RenderSummary { entered: plan.enter.len(), updated: plan.update.len(), exited: exits.len() };
        (targets, exits, summary)
    }

    /// Write `value` to `attr`, through the staged transition when animating.
    pub(crate) fn apply(&mut self, animate: bool, element: ElementId, attr: &str, value: AttrValue) {
        if animate {
            self.transitions.tween(&mut self.area, element, attr, value);
        } else if let Some(el) = self.area.get_mut(element) {
            el.set_attr(attr, value);
        }
    }

    /// Write `value` to `attr` immediately, stopping any tween of it.
    pub(crate) fn apply_now(&mut self, element: ElementId, attr: &str, value: AttrValue) {
        self.transitions.cancel(element, attr);
        if let Some(el) = self.area.get_mut(element) {
            el.set_attr(attr, value);
        }
    }

    pub(crate) fn begin(&mut self, animate: bool, timing: Timing) {
        if animate {
            self.transitions.begin(timing);
        }
    }

    /// Commit the staged transition and detach exiting elements.
    pub(crate) fn commit(&mut self, exits: &[ElementId]) {
        self.transitions.commit();
        self.transitions.forget(exits);
        self.area.remove(exits);
    }
}

/// Settings shared by every plot kind.
#[derive(Debug)]
pub struct PlotCore {
    id: u64,
    classes: Vec<String>,
    projectors: BTreeMap<String, Projector>,
    key: Option<Accessor>,
    animate: bool,
    timing: Timing,
    width: u32,
    height: u32,
}

impl PlotCore {
    fn new(class: &str, animate: bool, timing: Timing) -> Self {
        Self {
            id: NEXT_PLOT.fetch_add(1, Ordering::Relaxed),
            classes: vec![class.to_string()],
            projectors: BTreeMap::new(),
            key: None,
            animate,
            timing,
            width: 0,
            height: 0,
        }
    }

    /// Process-unique plot id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Classes of the plot's root group.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Projector of an attribute.
    #[must_use]
    pub fn projector(&self, attr: &str) -> Option<&Projector> {
        self.projectors.get(attr)
    }

    /// Scale of an attribute's projector.
    #[must_use]
    pub fn scale(&self, attr: &str) -> Option<&ScaleRef> {
        self.projector(attr).and_then(Projector::scale)
    }

    /// Whether renders go through transitions.
    #[must_use]
    pub fn animates(&self) -> bool {
        self.animate
    }

    /// Transition timing.
    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Allocated width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Allocated height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Key under which this plot registers extents for `attr`.
    #[must_use]
    pub fn extent_key(&self, attr: &str) -> String {
        format!("plot-{}/{attr}", self.id)
    }

    /// Scale the baseline goes through: its own, else the y scale.
    #[must_use]
    pub fn baseline_scale(&self) -> Option<&ScaleRef> {
        self.scale("y0").or_else(|| self.scale("y"))
    }

    pub(crate) fn set_projector(&mut self, attr: &str, projector: Projector) {
        let old_baseline = self.baseline_scale().cloned();
        if let Some(old) = self.projectors.insert(attr.to_string(), projector) {
            if let Some(scale) = old.scale() {
                self.retract(scale, attr);
            }
        }
        if let Some(old_baseline) = old_baseline {
            if !self.baseline_scale().is_some_and(|new| Rc::ptr_eq(new, &old_baseline)) {
                self.retract(&old_baseline, "y0");
            }
        }
    }

    /// Withdraw what this plot registered on `scale` for `attr`.
    fn retract(&self, scale: &ScaleRef, attr: &str) {
        let key = self.extent_key(attr);
        scale.remove_extents(&key);
        scale.remove_padding_exception(&key);
    }

    /// Withdraw every extent and padding exception this plot registered.
    fn retract_all(&self) {
        for scale in self.projectors.values().filter_map(Projector::scale) {
            for attr in self.projectors.keys() {
                self.retract(scale, attr);
            }
        }
    }

    /// Join key of a record: the explicit key accessor, else the raw x value.
    pub(crate) fn join_key(&self, record: &Record, index: usize, metadata: &Metadata) -> JoinKey {
        let value = match (&self.key, self.projector("x")) {
            (Some(key), _) => key.access(record, index, metadata),
            (None, Some(x)) => x.raw(record, index, metadata),
            (None, None) => return JoinKey::Index(index),
        };
        JoinKey::from_value(&value, index)
    }

    /// Every projected attribute of one record.
    pub(crate) fn project(&self, record: &Record, index: usize, metadata: &Metadata) -> BTreeMap<String, AttrValue> {
        self.projectors.iter().map(|(name, p)| (name.clone(), p.project(record, index, metadata))).collect()
    }

    /// Push the raw values of every scaled projector to its scale.
    fn update_extents(&self, datasets: &[Dataset]) {
        for (attr, projector) in &self.projectors {
            let Some(scale) = projector.scale() else { continue };
            let mut values = Vec::new();
            for dataset in datasets {
                let metadata = dataset.metadata();
                values.extend(dataset.data().iter().enumerate().map(|(i, r)| projector.raw(r, i, &metadata)));
            }
            scale.set_extents(&self.extent_key(attr), &values);
        }
    }

    /// Scales whose range follows the plot's width and height.
    fn layout(&self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        if let Some(x) = self.scale("x") {
            x.set_range((0.0, self.width as f32));
        }
        for attr in ["y", "y0"] {
            if let Some(y) = self.scale(attr) {
                y.set_range((self.height as f32, 0.0));
            }
        }
    }
}

/// Plot-kind specific drawing.
pub trait Renderer: fmt::Debug + Default {
    /// Class of the plot's root group.
    const CLASS: &'static str;

    /// Whether the plot animates by default.
    const ANIMATES: bool;

    /// Install default projectors.
    fn install_defaults(&self, core: &mut PlotCore, config: &ChartConfig);

    /// Called after extents are pushed, before drawing.
    fn after_extents(&self, _core: &PlotCore, _datasets: &[Dataset]) {}

    /// Bring one dataset's elements up to date.
    fn draw(&self, core: &PlotCore, group: &mut DrawGroup) -> RenderSummary;
}

/// A plot: datasets, projectors and the elements drawn for them.
#[derive(Debug)]
pub struct Plot<R: Renderer> {
    core: PlotCore,
    renderer: R,
    groups: Vec<DrawGroup>,
}

impl<R: Renderer> Default for Plot<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Renderer> Plot<R> {
    /// Create a plot with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&ChartConfig::default())
    }

    /// Create a plot using configured defaults.
    #[must_use]
    pub fn with_config(config: &ChartConfig) -> Self {
        let mut core = PlotCore::new(R::CLASS, R::ANIMATES && config.animation.enabled, config.animation.timing());
        let renderer = R::default();
        renderer.install_defaults(&mut core, config);
        Self { core, renderer, groups: Vec::new() }
    }

    /// Shared settings.
    #[must_use]
    pub fn core(&self) -> &PlotCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut PlotCore {
        &mut self.core
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [DrawGroup] {
        &mut self.groups
    }

    /// Process-unique plot id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// Classes of the plot's root group.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.core.classes
    }

    /// Add or remove a class on the plot's root group.
    pub fn classed(&mut self, class: &str, on: bool) -> &mut Self {
        if on {
            if !self.core.classes.iter().any(|c| c == class) {
                self.core.classes.push(class.to_string());
            }
        } else {
            self.core.classes.retain(|c| c != class);
        }
        self
    }

    /// Project the x position through `scale`.
    pub fn x(&mut self, accessor: impl Into<Accessor>, scale: ScaleRef) -> &mut Self {
        self.core.set_projector("x", Projector::new(accessor.into(), Some(scale)));
        self
    }

    /// Project the y position through `scale`.
    pub fn y(&mut self, accessor: impl Into<Accessor>, scale: ScaleRef) -> &mut Self {
        self.core.set_projector("y", Projector::new(accessor.into(), Some(scale)));
        self
    }

    /// Project an attribute without a scale.
    ///
    /// Projecting `class` adds the projected classes to each element's base
    /// classes instead of replacing them.
    pub fn attr(&mut self, name: &str, accessor: impl Into<Accessor>) -> &mut Self {
        self.core.set_projector(name, Projector::new(accessor.into(), None));
        self
    }

    /// Project an attribute through `scale`.
    pub fn attr_scaled(&mut self, name: &str, accessor: impl Into<Accessor>, scale: ScaleRef) -> &mut Self {
        self.core.set_projector(name, Projector::new(accessor.into(), Some(scale)));
        self
    }

    /// Join records by `accessor` instead of the raw x value.
    pub fn key(&mut self, accessor: impl Into<Accessor>) -> &mut Self {
        self.core.key = Some(accessor.into());
        self
    }

    /// Enable or disable animated renders.
    pub fn animate(&mut self, on: bool) -> &mut Self {
        self.core.animate = on;
        self
    }

    /// Set the transition timing.
    pub fn timing(&mut self, timing: Timing) -> &mut Self {
        self.core.timing = timing;
        self
    }

    /// Attach a dataset. Attaching the same dataset twice is a no-op.
    pub fn add_dataset(&mut self, dataset: &Dataset) -> &mut Self {
        if !self.groups.iter().any(|g| g.dataset == *dataset) {
            self.groups.push(DrawGroup::new(dataset.clone()));
        }
        self
    }

    /// Detach a dataset and drop its elements. Returns whether it was attached.
    pub fn remove_dataset(&mut self, dataset: &Dataset) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.dataset != *dataset);
        let removed = self.groups.len() != before;
        if removed {
            self.update_extents();
        }
        removed
    }

    /// Attached datasets in attachment order.
    #[must_use]
    pub fn datasets(&self) -> Vec<Dataset> {
        self.groups.iter().map(|g| g.dataset.clone()).collect()
    }

    /// Draw group of an attached dataset.
    #[must_use]
    pub fn group(&self, dataset: DatasetId) -> Option<&DrawGroup> {
        self.groups.iter().find(|g| g.dataset.id() == dataset)
    }

    /// Draw groups in attachment order.
    #[must_use]
    pub fn groups(&self) -> &[DrawGroup] {
        &self.groups
    }

    fn update_extents(&self) {
        let datasets = self.datasets();
        self.core.update_extents(&datasets);
        self.renderer.after_extents(&self.core, &datasets);
    }

    /// Re-pull every dataset and bring the elements up to date.
    pub fn render(&mut self) -> RenderSummary {
        self.update_extents();
        let mut summary = RenderSummary::default();
        for group in &mut self.groups {
            summary += self.renderer.draw(&self.core, group);
        }
        log::debug!(
            "plot {} rendered: {} entered, {} updated, {} exited",
            self.core.id,
            summary.entered,
            summary.updated,
            summary.exited
        );
        summary
    }

    /// Lay the plot out at `width` x `height` pixels and render.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn render_to(&mut self, width: u32, height: u32) -> Result<RenderSummary> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        self.core.width = width;
        self.core.height = height;
        self.core.layout();
        Ok(self.render())
    }

    /// Allocated width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.core.width
    }

    /// Allocated height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.core.height
    }

    /// Step running transitions. Returns true while any is still running.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let mut running = false;
        for group in &mut self.groups {
            running |= group.transitions.advance(&mut group.area, dt);
        }
        running
    }

    /// Jump every running transition to its end state.
    pub fn finish_transitions(&mut self) {
        for group in &mut self.groups {
            group.transitions.finish(&mut group.area);
        }
    }

    /// True while a transition is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.groups.iter().any(|g| g.transitions.is_running())
    }

    /// First element in paint order whose bounding box contains the pixel.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<&Element> {
        let point = crate::geometry::Point::new(x, y);
        self.groups.iter().find_map(|g| g.area.element_at(point))
    }

    /// Every drawn element, or only those of `datasets`.
    ///
    /// Datasets that are not attached to this plot are skipped.
    #[must_use]
    pub fn get_all_selections(&self, datasets: Option<&[Dataset]>) -> Selection<'_> {
        let mut selection = Selection::default();
        match datasets {
            None => {
                for group in &self.groups {
                    selection.extend(group.area.select_all());
                }
            }
            Some(datasets) => {
                for dataset in datasets {
                    match self.group(dataset.id()) {
                        Some(group) => selection.extend(group.area.select_all()),
                        None => log::debug!("dataset {} not attached to plot {}", dataset.id().get(), self.core.id),
                    }
                }
            }
        }
        selection
    }
}

impl<R: Renderer> Drop for Plot<R> {
    fn drop(&mut self) {
        self.core.retract_all();
    }
}

impl<R: Renderer> batuta_common::display::WithDimensions for Plot<R> {
    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.core.width = width;
        self.core.height = height;
        self.core.layout();
    }
}
