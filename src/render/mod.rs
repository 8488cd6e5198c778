//! Render tree, data join and transitions.
//!
//! Plots do not draw pixels. They maintain a tree of [`Element`]s per dataset
//! (one [`RenderArea`] each), reconcile it against the current records with a
//! keyed [`join`], and write attributes either directly or through
//! [`Transitions`]. The tree is what hit-testing, selections and the SVG
//! encoder read.

mod element;
mod join;
mod selection;
mod transition;

pub use element::{format_number, AttrValue, Binding, Element, ElementId, Tag};
pub use join::{join, JoinKey, JoinPlan};
pub use selection::{RenderArea, Selection};
pub use transition::{Easing, Timing, Transitions};
