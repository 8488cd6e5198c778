//! Area plot: a filled area between a baseline and a line, plus the line.
//!
//! Each dataset is drawn as two paths, the area (appended first) and the line
//! on top of it. Records whose x, y or baseline does not project to a finite
//! number split both paths into disjoint segments.

use std::fmt::Write as _;

use crate::accessor::{Accessor, Projector};
use crate::config::ChartConfig;
use crate::dataset::{DataValue, Dataset, Metadata, Record};
use crate::plots::core::{DrawGroup, Plot, PlotCore, RenderSummary, Renderer};
use crate::render::{format_number, AttrValue, Element, JoinKey, Tag};

/// Class of the filled area path.
pub const AREA_CLASS: &str = "area";

/// Class of the line path.
pub const LINE_CLASS: &str = "line";

/// Draws an area and a line per dataset.
#[derive(Debug, Default)]
pub struct AreaRenderer;

/// Area plot.
pub type AreaPlot = Plot<AreaRenderer>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct AreaPoint {
    x: f32,
    y: f32,
    y0: f32,
}

fn project_f32(core: &PlotCore, attr: &str, record: &Record, index: usize, metadata: &Metadata) -> f32 {
    core.projector(attr).and_then(|p| p.project(record, index, metadata).as_f32()).unwrap_or(f32::NAN)
}

fn project_point(core: &PlotCore, record: &Record, index: usize, metadata: &Metadata) -> Option<AreaPoint> {
    let x = project_f32(core, "x", record, index, metadata);
    let y = project_f32(core, "y", record, index, metadata);
    let raw_y0 = core.projector("y0").map_or(DataValue::Null, |p| p.raw(record, index, metadata));
    let y0 = match core.baseline_scale() {
        Some(scale) => scale.scale(&raw_y0),
        None => raw_y0.as_f32().unwrap_or(f32::NAN),
    };
    (x.is_finite() && y.is_finite() && y0.is_finite()).then_some(AreaPoint { x, y, y0 })
}

/// Maximal runs of defined points.
fn segments(points: &[Option<AreaPoint>]) -> Vec<&[Option<AreaPoint>]> {
    points.split(Option::is_none).filter(|run| !run.is_empty()).collect()
}

fn coord(out: &mut String, command: char, x: f32, y: f32) {
    // writing to a String cannot fail
    let _ = write!(out, "{command}{},{}", format_number(x), format_number(y));
}

/// Path data of the filled area: along the top, back along the baseline.
#[must_use]
fn area_path(points: &[Option<AreaPoint>]) -> String {
    let mut d = String::new();
    for run in segments(points) {
        let run: Vec<AreaPoint> = run.iter().flatten().copied().collect();
        for (i, p) in run.iter().enumerate() {
            coord(&mut d, if i == 0 { 'M' } else { 'L' }, p.x, p.y);
        }
        for p in run.iter().rev() {
            coord(&mut d, 'L', p.x, p.y0);
        }
        d.push('Z');
    }
    d
}

/// Path data of the line along the top edge.
#[must_use]
fn line_path(points: &[Option<AreaPoint>]) -> String {
    let mut d = String::new();
    for run in segments(points) {
        for (i, p) in run.iter().flatten().enumerate() {
            coord(&mut d, if i == 0 { 'M' } else { 'L' }, p.x, p.y);
        }
    }
    d
}

/// The single baseline value shared by every record, if there is one.
fn constant_baseline(projector: &Projector, datasets: &[Dataset]) -> Option<f32> {
    if let Some(value) = projector.accessor().as_constant() {
        return value.as_f32();
    }
    let mut values = datasets.iter().flat_map(|dataset| {
        let metadata = dataset.metadata();
        dataset.data().iter().enumerate().map(|(i, r)| projector.raw(r, i, &metadata).as_f32()).collect::<Vec<_>>()
    });
    let first = values.next()??;
    values.all(|v| v == Some(first)).then_some(first)
}

impl Renderer for AreaRenderer {
    const CLASS: &'static str = "area-plot";
    const ANIMATES: bool = false;

    fn install_defaults(&self, core: &mut PlotCore, config: &ChartConfig) {
        core.set_projector("y0", Projector::new(Accessor::constant(config.area.default_y0), None));
        core.set_projector("fill", Projector::new(Accessor::constant(config.area.fill.as_str()), None));
        core.set_projector("stroke", Projector::new(Accessor::constant(config.area.stroke.as_str()), None));
    }

    fn after_extents(&self, core: &PlotCore, datasets: &[Dataset]) {
        let Some(y0) = core.projector("y0") else { return };
        let Some(scale) = core.baseline_scale() else { return };
        let key = core.extent_key("y0");

        if y0.scale().is_none() {
            let mut values = Vec::new();
            for dataset in datasets {
                let metadata = dataset.metadata();
                values.extend(dataset.data().iter().enumerate().map(|(i, r)| y0.raw(r, i, &metadata)));
            }
            scale.set_extents(&key, &values);
        }

        match constant_baseline(y0, datasets).filter(|v| v.is_finite()) {
            Some(value) => scale.add_padding_exception(&key, value),
            None => scale.remove_padding_exception(&key),
        }
    }

    fn draw(&self, core: &PlotCore, group: &mut DrawGroup) -> RenderSummary {
        let dataset = group.dataset().clone();
        let data = dataset.data();
        let metadata = dataset.metadata();

        let keys = [JoinKey::Text(AREA_CLASS.to_string()), JoinKey::Text(LINE_CLASS.to_string())];
        let (targets, exits, summary) = group.reconcile(&keys, true, |shape| {
            if shape == 0 {
                Element::new(Tag::Path, AREA_CLASS)
            } else {
                Element::new(Tag::Path, LINE_CLASS)
            }
        });

        let points: Vec<Option<AreaPoint>> =
            data.iter().enumerate().map(|(i, r)| project_point(core, r, i, &metadata)).collect();
        let mut shared = data.first().map(|r| core.project(r, 0, &metadata)).unwrap_or_default();
        for positional in ["x", "y", "y0"] {
            shared.remove(positional);
        }
        let class = shared.remove("class");

        let animate = core.animates();
        group.begin(animate, core.timing());
        for (id, shape) in targets {
            let (d, hidden) = if shape == 0 { (area_path(&points), "stroke") } else { (line_path(&points), "fill") };
            if let Some(class) = &class {
                if let Some(element) = group.area_mut().get_mut(id) {
                    element.set_projected_classes(&class.to_string());
                }
            }
            group.apply(animate, id, "d", AttrValue::Text(d));
            for (name, value) in &shared {
                if name != hidden {
                    group.apply(animate, id, name, value.clone());
                }
            }
            group.apply_now(id, hidden, AttrValue::from("none"));
        }
        group.commit(&exits);
        summary
    }
}

impl Plot<AreaRenderer> {
    /// Project the baseline. Without a scale of its own it goes through the
    /// y scale.
    pub fn y0(&mut self, accessor: impl Into<Accessor>) -> &mut Self {
        self.core_mut().set_projector("y0", Projector::new(accessor.into(), None));
        self
    }

    /// Area path drawn for `dataset`.
    #[must_use]
    pub fn area_path(&self, dataset: &Dataset) -> Option<&Element> {
        self.shape(dataset, AREA_CLASS)
    }

    /// Line path drawn for `dataset`.
    #[must_use]
    pub fn line_path(&self, dataset: &Dataset) -> Option<&Element> {
        self.shape(dataset, LINE_CLASS)
    }

    fn shape(&self, dataset: &Dataset, class: &str) -> Option<&Element> {
        self.group(dataset.id())?.area().select_all().filter_class(class).first()
    }
}
