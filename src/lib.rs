//! # Interplot
//!
//! Declarative SVG charting: scales, keyed data-join plots, and touch/mouse
//! dispatch for interactive charts.
//!
//! Plots bind [`Dataset`](dataset::Dataset)s to attributes through
//! accessors and scales, then reconcile an element tree per dataset on every
//! render: records are matched to existing elements by key, new records
//! enter, vanished ones exit. Interaction dispatchers translate host events
//! into SVG-local points and fan them out to keyed callbacks.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use interplot::prelude::*;
//!
//! let data = Dataset::new(vec![
//!     Record::new().with("x", "a").with("y", 5.0),
//!     Record::new().with("x", "b").with("y", 3.0),
//! ]);
//!
//! let mut plot = BarPlot::new();
//! plot.x(Accessor::field("x"), Rc::new(OrdinalScale::bands(0.0, 0.0)))
//!     .y(Accessor::field("y"), Rc::new(LinearScale::auto((0.0, 1.0))))
//!     .animate(false)
//!     .add_dataset(&data);
//! let summary = plot.render_to(400, 300)?;
//! assert_eq!(summary.entered, 2);
//!
//! let svg = SvgEncoder::from_plot(&plot)?.render();
//! assert!(svg.contains("class=\"bar\""));
//! # Ok::<(), interplot::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `wasm`: DOM geometry and event conversion for browsers

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color parsing and interpolation.
pub mod color;

/// Geometric primitives (points, rectangles).
pub mod geometry;

/// Records and datasets.
pub mod dataset;

/// Scale functions for data-to-visual mappings.
pub mod scale;

/// Accessors and projectors.
pub mod accessor;

// ============================================================================
// Rendering Modules
// ============================================================================

/// Element tree, data join and transitions.
pub mod render;

/// Bar and area plots.
pub mod plots;

/// Output encoders (SVG).
pub mod output;

// ============================================================================
// Interaction
// ============================================================================

/// Coordinate translation and event dispatch.
pub mod interaction;

/// Browser glue.
#[cfg(feature = "wasm")]
#[cfg_attr(docsrs, doc(cfg(feature = "wasm")))]
pub mod wasm;

// ============================================================================
// Configuration and Errors
// ============================================================================

/// YAML chart configuration.
pub mod config;

/// Error types for interplot operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use interplot::prelude::*;
/// ```
pub mod prelude {
    pub use batuta_common::display::WithDimensions;
    pub use crate::accessor::{Accessor, Projector};
    pub use crate::color::Rgba;
    pub use crate::config::ChartConfig;
    pub use crate::dataset::{DataValue, Dataset, Record};
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{Point, Rect};
    pub use crate::interaction::{
        CallbackKey, CoordinateTranslator, MouseDispatcher, MouseEvent, MouseEventKind, SvgGeometry, SvgRoot,
        Touch, TouchDispatcher, TouchEvent, TouchEventKind,
    };
    pub use crate::output::SvgEncoder;
    pub use crate::plots::{AreaPlot, BarPlot, Plot, RenderSummary};
    pub use crate::render::{Element, Selection, Timing};
    pub use crate::scale::{LinearScale, OrdinalScale, Scale, ScaleRef};
}
