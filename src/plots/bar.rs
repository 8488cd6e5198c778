//! Category bar plot.
//!
//! One `rect` per record, keyed by the raw x value. On a point-layout x scale
//! each bar is centered on its category; on a band-layout scale it fills the
//! band. Height is derived rather than projected: bars run from the projected
//! y to the larger end of the y range, so they grow toward the floor whichever
//! way the y scale is oriented.

use crate::accessor::{Accessor, Projector};
use crate::config::ChartConfig;
use crate::geometry::Point;
use crate::plots::core::{DrawGroup, Plot, PlotCore, RenderSummary, Renderer};
use crate::render::{AttrValue, Element, JoinKey, Tag};
use crate::scale::RangeType;

/// Class of every bar element.
pub const BAR_CLASS: &str = "bar";

/// Class marking selected bars.
pub const SELECTED_CLASS: &str = "selected";

/// Draws one rectangle per record.
#[derive(Debug, Default)]
pub struct BarRenderer;

/// Category bar plot.
pub type BarPlot = Plot<BarRenderer>;

impl Renderer for BarRenderer {
    const CLASS: &'static str = "bar-renderer";
    const ANIMATES: bool = true;

    fn install_defaults(&self, core: &mut PlotCore, config: &ChartConfig) {
        core.set_projector("width", Projector::new(Accessor::constant(config.bar.default_width), None));
    }

    fn draw(&self, core: &PlotCore, group: &mut DrawGroup) -> RenderSummary {
        let dataset = group.dataset().clone();
        let data = dataset.data();
        let metadata = dataset.metadata();

        let keys: Vec<JoinKey> = data.iter().enumerate().map(|(i, r)| core.join_key(r, i, &metadata)).collect();
        let (targets, exits, summary) = group.reconcile(&keys, false, |_| Element::new(Tag::Rect, BAR_CLASS));

        let x_scale = core.scale("x");
        let range_type = x_scale.map_or(RangeType::Continuous, |s| s.range_type());
        let range_band = x_scale.map_or(0.0, |s| s.range_band());
        let max_scaled_y = core.scale("y").map_or(core.height() as f32, |s| {
            let (r0, r1) = s.range();
            r0.max(r1)
        });

        let animate = core.animates();
        group.begin(animate, core.timing());
        for (id, index) in targets {
            let mut attrs = core.project(&data[index], index, &metadata);

            match range_type {
                RangeType::Points => {
                    let width = attrs.get("width").and_then(AttrValue::as_f32).unwrap_or(0.0);
                    if let Some(AttrValue::Number(x)) = attrs.get_mut("x") {
                        *x -= width / 2.0;
                    }
                }
                RangeType::Bands => {
                    attrs.insert("width".to_string(), AttrValue::Number(range_band));
                }
                RangeType::Continuous => {}
            }

            let y = attrs.get("y").and_then(AttrValue::as_f32).unwrap_or(f32::NAN);
            attrs.insert("height".to_string(), AttrValue::Number(max_scaled_y - y));

            if let Some(class) = attrs.remove("class") {
                if let Some(element) = group.area_mut().get_mut(id) {
                    element.set_projected_classes(&class.to_string());
                }
            }
            // fill never transitions
            if animate {
                if let Some(fill) = attrs.remove("fill") {
                    group.apply_now(id, "fill", fill);
                }
            }
            for (name, value) in attrs {
                group.apply(animate, id, &name, value);
            }
        }
        group.commit(&exits);

        log::trace!("bars of dataset {}: {summary:?}", dataset.id().get());
        summary
    }
}

impl Plot<BarRenderer> {
    /// Class the bar under a pixel position `selected` (or unclass it).
    ///
    /// Bounding boxes are tested inclusively on all four sides. When bars
    /// overlap, the first match in current paint order wins.
    pub fn select_bar(&mut self, x: f32, y: f32, select: bool) -> Option<&Element> {
        let point = Point::new(x, y);
        let groups = self.groups_mut();
        let (group, id) = groups
            .iter()
            .enumerate()
            .find_map(|(g, group)| group.area().element_at(point).map(|e| (g, e.id())))?;
        let element = groups[group].area_mut().get_mut(id)?;
        element.set_classed(SELECTED_CLASS, select);
        Some(element)
    }

    /// Remove the `selected` class from every bar. Bindings are untouched.
    pub fn deselect_all(&mut self) {
        for group in self.groups_mut() {
            for element in group.area_mut().elements_mut() {
                element.set_classed(SELECTED_CLASS, false);
            }
        }
    }
}
