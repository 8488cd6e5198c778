//! Bar plot rendering through the public API.

use std::rc::Rc;
use std::time::Duration;

use approx::assert_relative_eq;
use interplot::prelude::*;
use interplot::plots::SELECTED_CLASS;

fn scenario() -> (BarPlot, Dataset) {
    let data = Dataset::new(vec![
        Record::new().with("x", 0).with("w", 10).with("y", 5),
        Record::new().with("x", 1).with("w", 10).with("y", 3),
    ]);
    let mut plot = BarPlot::new();
    plot.x(Accessor::field("x"), Rc::new(OrdinalScale::points(0.0)))
        .y(Accessor::field("y"), Rc::new(LinearScale::new((0.0, 10.0), (0.0, 1.0)).unwrap()))
        .attr("width", Accessor::field("w"))
        .animate(false)
        .add_dataset(&data);
    (plot, data)
}

fn rects(plot: &BarPlot) -> Vec<Element> {
    plot.get_all_selections(None).iter().cloned().collect()
}

#[test]
fn test_points_scale_centers_bars_and_measures_to_range_max() {
    let (mut plot, _) = scenario();
    let summary = plot.render_to(100, 100).unwrap();
    assert_eq!(summary.entered, 2);

    let bars = rects(&plot);
    assert_eq!(bars.len(), 2);
    assert_relative_eq!(bars[0].attr_f32("x").unwrap(), -5.0);
    assert_relative_eq!(bars[1].attr_f32("x").unwrap(), 95.0);
    assert_relative_eq!(bars[0].attr_f32("y").unwrap(), 50.0);
    assert_relative_eq!(bars[0].attr_f32("height").unwrap(), 50.0);
    assert_relative_eq!(bars[1].attr_f32("height").unwrap(), 30.0);
    assert_relative_eq!(bars[1].attr_f32("width").unwrap(), 10.0);
}

#[test]
fn test_rerender_without_change_is_idempotent() {
    let (mut plot, _) = scenario();
    plot.render_to(100, 100).unwrap();
    let before: Vec<_> = rects(&plot).iter().map(Element::id).collect();

    let summary = plot.render();
    assert!(summary.is_stable());
    assert_eq!(summary.updated, 2);
    let after: Vec<_> = rects(&plot).iter().map(Element::id).collect();
    assert_eq!(before, after);
}

#[test]
fn test_data_changes_enter_and_exit_by_key() {
    let (mut plot, data) = scenario();
    plot.render_to(100, 100).unwrap();
    let kept = rects(&plot)[1].id();

    data.set_data(vec![
        Record::new().with("x", 1).with("w", 10).with("y", 3),
        Record::new().with("x", 2).with("w", 10).with("y", 8),
    ]);
    let summary = plot.render();
    assert_eq!((summary.entered, summary.updated, summary.exited), (1, 1, 1));

    let bars = rects(&plot);
    assert_eq!(bars[0].id(), kept);
    assert_eq!(bars[0].binding().and_then(|b| b.index), Some(0));
    assert_eq!(bars[1].binding().and_then(|b| b.index), Some(1));
}

#[test]
fn test_animated_render_settles_on_targets() {
    let (mut plot, _) = scenario();
    plot.animate(true);
    plot.render_to(100, 100).unwrap();
    plot.finish_transitions();

    plot.y(Accessor::field("y"), Rc::new(LinearScale::new((0.0, 5.0), (100.0, 0.0)).unwrap()));
    let summary = plot.render();
    assert!(summary.is_stable());
    assert!(plot.is_animating());

    while plot.advance(Duration::from_millis(50)) {}
    let bars = rects(&plot);
    assert_relative_eq!(bars[0].attr_f32("y").unwrap(), 0.0);
    assert_relative_eq!(bars[1].attr_f32("y").unwrap(), 40.0);
    assert_relative_eq!(bars[1].attr_f32("height").unwrap(), 60.0);
}

#[test]
fn test_selection_round_trip() {
    let (mut plot, _) = scenario();
    plot.render_to(100, 100).unwrap();

    assert!(plot.select_bar(95.0, 80.0, true).is_some());
    assert!(plot.select_bar(50.0, 10.0, true).is_none());
    assert_eq!(plot.get_all_selections(None).filter_class(SELECTED_CLASS).len(), 1);

    plot.select_bar(95.0, 80.0, false);
    assert!(plot.get_all_selections(None).filter_class(SELECTED_CLASS).is_empty());

    plot.select_bar(0.0, 99.0, true);
    plot.deselect_all();
    assert!(plot.get_all_selections(None).filter_class(SELECTED_CLASS).is_empty());
}

#[test]
fn test_with_config_uses_configured_width() {
    let config = ChartConfig::parse("bar:\n  default_width: 4\nanimation:\n  enabled: false\n").unwrap();
    let data = Dataset::new(vec![Record::new().with("x", "a").with("y", 1.0)]);
    let mut plot = BarPlot::with_config(&config);
    plot.x(Accessor::field("x"), Rc::new(OrdinalScale::points(0.0)))
        .y(Accessor::field("y"), Rc::new(LinearScale::new((0.0, 2.0), (0.0, 1.0)).unwrap()))
        .add_dataset(&data);
    plot.render_to(40, 40).unwrap();
    assert!(!plot.core().animates());
    let bars = rects(&plot);
    assert_relative_eq!(bars[0].attr_f32("width").unwrap(), 4.0);
    assert_relative_eq!(bars[0].attr_f32("x").unwrap(), 18.0);
}

#[test]
fn test_dimensions_trait_lays_out_scales() {
    let (mut plot, _) = scenario();
    plot.set_dimensions(200, 50);
    plot.render();
    assert_eq!((plot.width(), plot.height()), (200, 50));
    assert_relative_eq!(rects(&plot)[1].attr_f32("x").unwrap(), 195.0);
}

#[test]
fn test_render_to_rejects_zero_size() {
    let (mut plot, _) = scenario();
    assert!(matches!(plot.render_to(0, 10), Err(Error::InvalidDimensions { width: 0, height: 10 })));
}

#[test]
fn test_duplicate_keys_rerender_stably() {
    let data = Dataset::new(vec![
        Record::new().with("x", 1.0).with("y", 2.0),
        Record::new().with("x", 1.0).with("y", 7.0),
        Record::new().with("x", 2.0).with("y", 4.0),
    ]);
    let mut plot = BarPlot::new();
    plot.x(Accessor::field("x"), Rc::new(OrdinalScale::points(0.0)))
        .y(Accessor::field("y"), Rc::new(LinearScale::new((0.0, 10.0), (0.0, 1.0)).unwrap()))
        .animate(false)
        .add_dataset(&data);
    assert_eq!(plot.render_to(100, 100).unwrap().entered, 3);
    let before: Vec<_> = rects(&plot).iter().map(Element::id).collect();

    let summary = plot.render();
    assert_eq!((summary.entered, summary.updated, summary.exited), (0, 3, 0));
    let bars = rects(&plot);
    assert_eq!(bars.iter().map(Element::id).collect::<Vec<_>>(), before);
    assert_relative_eq!(bars[0].attr_f32("height").unwrap(), 20.0);
    assert_relative_eq!(bars[1].attr_f32("height").unwrap(), 70.0);
}

#[test]
fn test_dropped_plot_releases_shared_scale() {
    let y = Rc::new(LinearScale::auto((0.0, 1.0)));
    y.set_pad_proportion(0.0);
    let small = Dataset::new(vec![Record::new().with("x", "a").with("y", 1.0), Record::new().with("x", "b").with("y", 2.0)]);
    let large = Dataset::new(vec![Record::new().with("x", "a").with("y", 1000.0)]);

    let mut kept = BarPlot::new();
    kept.x(Accessor::field("x"), Rc::new(OrdinalScale::points(0.0))).y(Accessor::field("y"), y.clone()).add_dataset(&small);
    kept.render_to(100, 100).unwrap();

    let mut dropped = BarPlot::new();
    dropped.x(Accessor::field("x"), Rc::new(OrdinalScale::points(0.0))).y(Accessor::field("y"), y.clone()).add_dataset(&large);
    dropped.render_to(100, 100).unwrap();
    assert_relative_eq!(y.domain().1, 1000.0);

    drop(dropped);
    kept.render();
    assert_eq!(y.domain(), (1.0, 2.0));
}
