//! Timed attribute transitions.
//!
//! A render with animation enabled does not write its target attributes
//! directly. It records one tween per (element, attribute) and the host steps
//! time forward with [`Transitions::advance`], typically once per animation
//! frame. Numbers and CSS colors interpolate; anything else (path data, class
//! names) switches to its target when the transition completes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::render::element::{AttrValue, ElementId};
use crate::render::selection::RenderArea;

/// Easing curve applied to transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Slow start and end.
    #[default]
    CubicInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}

/// Timing of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Time from start to completion, excluding the delay.
    pub duration: Duration,
    /// Time before interpolation starts.
    pub delay: Duration,
    /// Easing curve.
    pub easing: Easing,
}

impl Default for Timing {
    fn default() -> Self {
        Self { duration: Duration::from_millis(250), delay: Duration::ZERO, easing: Easing::default() }
    }
}

#[derive(Debug, Clone)]
struct Tween {
    element: ElementId,
    attr: String,
    from: AttrValue,
    to: AttrValue,
}

impl Tween {
    fn value_at(&self, t: f32) -> AttrValue {
        if t >= 1.0 {
            return self.to.clone();
        }
        match (&self.from, &self.to) {
            (AttrValue::Number(a), AttrValue::Number(b)) if a.is_finite() && b.is_finite() => {
                AttrValue::Number(a + (b - a) * t)
            }
            (AttrValue::Text(a), AttrValue::Text(b)) => match (Rgba::parse(a), Rgba::parse(b)) {
                (Ok(a), Ok(b)) => AttrValue::Text(a.lerp(b, t).to_css()),
                _ => self.from.clone(),
            },
            _ => self.from.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Transition {
    timing: Timing,
    elapsed: Duration,
    tweens: Vec<Tween>,
}

impl Transition {
    fn progress(&self) -> f32 {
        let active = self.elapsed.saturating_sub(self.timing.delay);
        if self.timing.duration.is_zero() {
            return if self.elapsed >= self.timing.delay { 1.0 } else { 0.0 };
        }
        self.timing.easing.apply(active.as_secs_f32() / self.timing.duration.as_secs_f32())
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.timing.delay + self.timing.duration
    }

    fn write(&self, area: &mut RenderArea, t: f32) {
        for tween in &self.tweens {
            if let Some(element) = area.get_mut(tween.element) {
                element.set_attr(&tween.attr, tween.value_at(t));
            }
        }
    }
}

/// Pending transitions of one render area.
#[derive(Debug, Clone, Default)]
pub struct Transitions {
    running: Vec<Transition>,
    staged: Option<Transition>,
}

impl Transitions {
    /// Start staging a transition with the given timing.
    pub fn begin(&mut self, timing: Timing) {
        self.staged = Some(Transition { timing, elapsed: Duration::ZERO, tweens: Vec::new() });
    }

    /// Schedule `attr` of `element` to move from its current value to `to`.
    ///
    /// Without a current value there is nothing to interpolate from and the
    /// target is written immediately. Any older tween of the same attribute
    /// is cancelled; the current (partially interpolated) value becomes the
    /// start of the new one.
    pub fn tween(&mut self, area: &mut RenderArea, element: ElementId, attr: &str, to: AttrValue) {
        self.cancel(element, attr);

        let Some(el) = area.get_mut(element) else { return };
        let from = match el.attr(attr).cloned() {
            Some(current) if current != to => current,
            _ => {
                el.set_attr(attr, to);
                return;
            }
        };

        match &mut self.staged {
            Some(staged) => staged.tweens.push(Tween { element, attr: attr.to_string(), from, to }),
            None => el.set_attr(attr, to),
        }
    }

    /// Stop any running tween of `attr` on `element`, leaving its current value.
    pub fn cancel(&mut self, element: ElementId, attr: &str) {
        for transition in &mut self.running {
            transition.tweens.retain(|t| !(t.element == element && t.attr == attr));
        }
    }

    /// Commit the staged transition, dropping emptied ones.
    pub fn commit(&mut self) {
        if let Some(staged) = self.staged.take() {
            if !staged.tweens.is_empty() {
                self.running.push(staged);
            }
        }
        self.running.retain(|t| !t.tweens.is_empty());
    }

    /// Step every running transition forward by `dt`.
    ///
    /// Returns true while anything is still animating.
    pub fn advance(&mut self, area: &mut RenderArea, dt: Duration) -> bool {
        for transition in &mut self.running {
            transition.elapsed += dt;
            transition.write(area, transition.progress());
        }
        self.running.retain(|t| !t.is_finished());
        !self.running.is_empty()
    }

    /// Jump every running transition to its end state.
    pub fn finish(&mut self, area: &mut RenderArea) {
        for transition in self.running.drain(..) {
            transition.write(area, 1.0);
        }
    }

    /// Forget tweens targeting removed elements.
    pub fn forget(&mut self, removed: &[ElementId]) {
        for transition in &mut self.running {
            transition.tweens.retain(|t| !removed.contains(&t.element));
        }
        self.running.retain(|t| !t.tweens.is_empty());
    }

    /// True while a transition is pending.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::element::{Element, Tag};
    use approx::assert_relative_eq;

    fn timing(ms: u64, easing: Easing) -> Timing {
        Timing { duration: Duration::from_millis(ms), delay: Duration::ZERO, easing }
    }

    fn area_with_bar(x: f32) -> (RenderArea, ElementId) {
        let mut area = RenderArea::new();
        let mut el = Element::new(Tag::Rect, "bar");
        el.set_attr("x", x);
        let id = area.append(el);
        (area, id)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::CubicInOut] {
            assert_relative_eq!(easing.apply(0.0), 0.0);
            assert_relative_eq!(easing.apply(1.0), 1.0);
            assert_relative_eq!(easing.apply(0.5), 0.5);
        }
        assert!(Easing::CubicInOut.apply(0.25) < 0.25);
    }

    #[test]
    fn test_numeric_tween() {
        let (mut area, id) = area_with_bar(0.0);
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "x", AttrValue::Number(100.0));
        transitions.commit();

        assert_eq!(area.get(id).unwrap().attr_f32("x"), Some(0.0));
        assert!(transitions.advance(&mut area, Duration::from_millis(50)));
        assert_relative_eq!(area.get(id).unwrap().attr_f32("x").unwrap(), 50.0);
        assert!(!transitions.advance(&mut area, Duration::from_millis(60)));
        assert_eq!(area.get(id).unwrap().attr_f32("x"), Some(100.0));
    }

    #[test]
    fn test_missing_start_value_is_written_immediately() {
        let (mut area, id) = area_with_bar(0.0);
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "height", AttrValue::Number(30.0));
        transitions.commit();
        assert_eq!(area.get(id).unwrap().attr_f32("height"), Some(30.0));
        assert!(!transitions.is_running());
    }

    #[test]
    fn test_color_tween() {
        let (mut area, id) = area_with_bar(0.0);
        area.get_mut(id).unwrap().set_attr("stroke", "#000000");
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "stroke", AttrValue::from("#ffffff"));
        transitions.commit();
        transitions.advance(&mut area, Duration::from_millis(50));
        let mid = Rgba::parse(area.get(id).unwrap().attr_str("stroke").unwrap()).unwrap();
        assert!(mid.r > 100 && mid.r < 150);
    }

    #[test]
    fn test_text_snaps_at_end() {
        let (mut area, id) = area_with_bar(0.0);
        area.get_mut(id).unwrap().set_attr("d", "M0,0");
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "d", AttrValue::from("M1,1"));
        transitions.commit();
        transitions.advance(&mut area, Duration::from_millis(99));
        assert_eq!(area.get(id).unwrap().attr_str("d"), Some("M0,0"));
        transitions.advance(&mut area, Duration::from_millis(1));
        assert_eq!(area.get(id).unwrap().attr_str("d"), Some("M1,1"));
    }

    #[test]
    fn test_new_tween_supersedes_old() {
        let (mut area, id) = area_with_bar(0.0);
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "x", AttrValue::Number(100.0));
        transitions.commit();
        transitions.advance(&mut area, Duration::from_millis(50));

        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "x", AttrValue::Number(0.0));
        transitions.commit();
        transitions.advance(&mut area, Duration::from_millis(50));
        assert_relative_eq!(area.get(id).unwrap().attr_f32("x").unwrap(), 25.0);
    }

    #[test]
    fn test_delay_and_finish() {
        let (mut area, id) = area_with_bar(0.0);
        let mut transitions = Transitions::default();
        transitions.begin(Timing { delay: Duration::from_millis(100), ..timing(100, Easing::Linear) });
        transitions.tween(&mut area, id, "x", AttrValue::Number(10.0));
        transitions.commit();
        transitions.advance(&mut area, Duration::from_millis(100));
        assert_eq!(area.get(id).unwrap().attr_f32("x"), Some(0.0));
        transitions.finish(&mut area);
        assert_eq!(area.get(id).unwrap().attr_f32("x"), Some(10.0));
        assert!(!transitions.is_running());
    }

    #[test]
    fn test_cancel_keeps_current_value() {
        let (mut area, id) = area_with_bar(0.0);
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "x", AttrValue::Number(100.0));
        transitions.commit();
        transitions.advance(&mut area, Duration::from_millis(50));
        transitions.cancel(id, "x");
        transitions.advance(&mut area, Duration::from_millis(50));
        assert_relative_eq!(area.get(id).unwrap().attr_f32("x").unwrap(), 50.0);
    }

    #[test]
    fn test_forget_removed() {
        let (mut area, id) = area_with_bar(0.0);
        let mut transitions = Transitions::default();
        transitions.begin(timing(100, Easing::Linear));
        transitions.tween(&mut area, id, "x", AttrValue::Number(10.0));
        transitions.commit();
        transitions.forget(&[id]);
        assert!(!transitions.is_running());
    }
}
