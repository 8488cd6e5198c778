//! SVG output encoder.
//!
//! Serializes the element tree of one or more plots into a standalone SVG
//! document. Each plot becomes a `<g>` carrying the plot's classes, with one
//! nested `<g>` per attached dataset in attachment order.

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::plots::{Plot, Renderer};
use crate::render::Element;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// SVG encoder for plot element trees.
#[derive(Debug, Clone)]
pub struct SvgEncoder {
    /// SVG width
    width: u32,
    /// SVG height
    height: u32,
    /// Background color (None for transparent)
    background: Option<Rgba>,
    /// Serialized body lines
    body: Vec<String>,
}

impl Default for SvgEncoder {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SvgEncoder {
    /// Create a new SVG encoder with given dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, background: Some(Rgba::WHITE), body: Vec::new() }
    }

    /// Encoder sized to a laid-out plot, containing that plot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the plot has not been given a
    /// size.
    pub fn from_plot<R: Renderer>(plot: &Plot<R>) -> Result<Self> {
        if plot.width() == 0 || plot.height() == 0 {
            return Err(Error::InvalidDimensions { width: plot.width(), height: plot.height() });
        }
        let mut encoder = Self::new(plot.width(), plot.height());
        encoder.add_plot(plot);
        Ok(encoder)
    }

    /// Set background color (None for transparent).
    #[must_use]
    pub fn background(mut self, color: Option<Rgba>) -> Self {
        self.background = color;
        self
    }

    /// Append a plot's elements.
    pub fn add_plot<R: Renderer>(&mut self, plot: &Plot<R>) {
        self.body.push(format!(r#"<g class="{}">"#, escape(&plot.classes().join(" "))));
        for group in plot.groups() {
            self.body.push(format!(r#"  <g data-dataset="{}">"#, group.dataset().id().get()));
            for element in group.area().elements() {
                self.body.push(format!("    {}", element_to_svg(element)));
            }
            self.body.push("  </g>".to_string());
        }
        self.body.push("</g>".to_string());
    }

    /// Append a single element at the top level.
    pub fn add_element(&mut self, element: &Element) {
        self.body.push(element_to_svg(element));
    }

    /// Render to SVG string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(4096);

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.width, self.height
        );

        if let Some(bg) = self.background {
            let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="{}"/>"#, bg.to_css());
        }

        for line in &self.body {
            let _ = writeln!(svg, "  {line}");
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file writing fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}

/// Escape XML special characters for attribute values.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Whether `name` can be written as an XML attribute name.
fn is_attr_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

/// Serialize one element, attributes in name order.
///
/// Attributes whose names are not valid XML names are left out.
fn element_to_svg(element: &Element) -> String {
    let mut out = format!(r#"<{} class="{}""#, element.tag().name(), escape(&element.classes().join(" ")));
    for (name, value) in element.attrs() {
        if !is_attr_name(name) {
            log::warn!("skipping attribute with invalid name {name:?}");
            continue;
        }
        let _ = write!(out, r#" {name}="{}""#, escape(&value.to_string()));
    }
    out.push_str("/>");
    out
}
