//! Chart configuration.
//!
//! YAML configuration for plot defaults. Every field has a default, so an
//! empty document is a valid configuration.
//!
//! ```yaml
//! version: 1
//! animation:
//!   enabled: true
//!   duration_ms: 300
//!   easing: linear
//! bar:
//!   default_width: 12
//! area:
//!   fill: orange
//! scale:
//!   pad_proportion: 0.1
//! interaction:
//!   bounds: clip
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::interaction::BoundsPolicy;
use crate::render::{Easing, Timing};
use crate::scale::{LinearScale, DEFAULT_PAD_PROPORTION};

/// Transition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Animate renders. Turning this off applies every attribute immediately.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Transition duration in milliseconds.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    /// Delay before a transition starts, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,

    /// Easing curve.
    #[serde(default)]
    pub easing: Easing,
}

fn default_enabled() -> bool {
    true
}
fn default_duration_ms() -> u64 {
    250
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), duration_ms: default_duration_ms(), delay_ms: 0, easing: Easing::default() }
    }
}

impl AnimationConfig {
    /// Transition timing described by this configuration.
    #[must_use]
    pub fn timing(&self) -> Timing {
        Timing {
            duration: Duration::from_millis(self.duration_ms),
            delay: Duration::from_millis(self.delay_ms),
            easing: self.easing,
        }
    }
}

/// Bar plot defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarConfig {
    /// Width projected when no width accessor is given, in pixels.
    #[serde(default = "default_bar_width")]
    pub default_width: f32,
}

fn default_bar_width() -> f32 {
    10.0
}

impl Default for BarConfig {
    fn default() -> Self {
        Self { default_width: default_bar_width() }
    }
}

/// Area plot defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Baseline used when no y0 accessor is given.
    #[serde(default)]
    pub default_y0: f32,

    /// Area fill, any CSS color. Hex and `rgb()` values must be well formed.
    #[serde(default = "default_area_fill")]
    pub fill: String,

    /// Line stroke.
    #[serde(default = "default_line_stroke")]
    pub stroke: String,
}

fn default_area_fill() -> String {
    "steelblue".to_string()
}
fn default_line_stroke() -> String {
    "#000000".to_string()
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self { default_y0: 0.0, fill: default_area_fill(), stroke: default_line_stroke() }
    }
}

/// Scale defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Fraction of the data span added around autodomained linear scales.
    #[serde(default = "default_pad_proportion")]
    pub pad_proportion: f32,
}

fn default_pad_proportion() -> f32 {
    DEFAULT_PAD_PROPORTION
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { pad_proportion: default_pad_proportion() }
    }
}

/// Interaction defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Treatment of pointer positions outside the root SVG.
    #[serde(default)]
    pub bounds: BoundsPolicy,
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Transition settings.
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Bar plot defaults.
    #[serde(default)]
    pub bar: BarConfig,

    /// Area plot defaults.
    #[serde(default)]
    pub area: AreaConfig,

    /// Scale defaults.
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Interaction defaults.
    #[serde(default)]
    pub interaction: InteractionConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            animation: AnimationConfig::default(),
            bar: BarConfig::default(),
            area: AreaConfig::default(),
            scale: ScaleConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl ChartConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            Error::ConfigParse { line, message: e.to_string() }
        })
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("using default chart configuration, {} unusable: {e}", path.display());
            Self::default()
        })
    }

    /// Reject values no plot can use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: String| Err(Error::ConfigInvalid { key: key.to_string(), message });

        if !self.bar.default_width.is_finite() || self.bar.default_width < 0.0 {
            return invalid("bar.default_width", format!("must be a non-negative number, got {}", self.bar.default_width));
        }
        if !self.area.default_y0.is_finite() {
            return invalid("area.default_y0", "must be finite".to_string());
        }
        if !(0.0..1.0).contains(&self.scale.pad_proportion) {
            return invalid("scale.pad_proportion", format!("must be in [0, 1), got {}", self.scale.pad_proportion));
        }
        for (key, color) in [("area.fill", &self.area.fill), ("area.stroke", &self.area.stroke)] {
            let color = color.trim();
            if color.is_empty() {
                return invalid(key, "must not be empty".to_string());
            }
            // other CSS names and functions are written out as is
            if color.starts_with('#') || color.starts_with("rgb") {
                if let Err(e) = Rgba::parse(color) {
                    return invalid(key, e.to_string());
                }
            }
        }
        Ok(())
    }

    /// Autodomaining linear scale over `range` with the configured padding.
    #[must_use]
    pub fn linear_scale(&self, range: (f32, f32)) -> LinearScale {
        let scale = LinearScale::auto(range);
        scale.set_pad_proportion(self.scale.pad_proportion);
        scale
    }

    /// Apply the interaction settings to this thread's dispatcher registry.
    /// Roots already registered keep their translators' current policy.
    pub fn apply_interaction(&self) {
        crate::interaction::with_registry(|registry| registry.set_bounds(self.interaction.bounds));
    }
}
