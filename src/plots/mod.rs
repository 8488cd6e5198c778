//! Plot types.
//!
//! A [`Plot`] owns projectors and attached datasets; its [`Renderer`] turns
//! each dataset into elements. Bar and area plots are provided.

mod area;
mod bar;
mod core;

pub use self::core::{DrawGroup, Plot, PlotCore, RenderSummary, Renderer};
pub use area::{AreaPlot, AreaRenderer, AREA_CLASS, LINE_CLASS};
pub use bar::{BarPlot, BarRenderer, BAR_CLASS, SELECTED_CLASS};
