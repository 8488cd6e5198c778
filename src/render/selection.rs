//! Render areas and read-only selections over their elements.

use crate::dataset::DatasetId;
use crate::geometry::Point;
use crate::render::element::{Element, ElementId};

/// Ordered collection of elements; vector order is paint order.
#[derive(Debug, Clone, Default)]
pub struct RenderArea {
    elements: Vec<Element>,
}

impl RenderArea {
    /// Create an empty render area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when nothing is rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element on top of the paint order.
    pub fn append(&mut self, element: Element) -> ElementId {
        let id = element.id();
        self.elements.push(element);
        id
    }

    /// Element by id.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Mutable element by id.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Mutable access to every element.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    /// Detach the given elements.
    pub fn remove(&mut self, ids: &[ElementId]) {
        if !ids.is_empty() {
            self.elements.retain(|e| !ids.contains(&e.id()));
        }
    }

    /// Selection of every element.
    #[must_use]
    pub fn select_all(&self) -> Selection<'_> {
        Selection { elements: self.elements.iter().collect() }
    }

    /// First element in paint order whose bounding box contains `point`.
    #[must_use]
    pub fn element_at(&self, point: Point) -> Option<&Element> {
        self.elements.iter().find(|e| e.bbox().is_some_and(|b| b.contains(point)))
    }
}

/// Borrowed, ordered view over elements of one or more render areas.
#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    elements: Vec<&'a Element>,
}

impl<'a> Selection<'a> {
    /// Build a selection from elements.
    #[must_use]
    pub fn from_elements(elements: Vec<&'a Element>) -> Self {
        Self { elements }
    }

    /// Append another selection.
    pub fn extend(&mut self, other: Selection<'a>) {
        self.elements.extend(other.elements);
    }

    /// Number of selected elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.elements.iter().copied()
    }

    /// First selected element.
    #[must_use]
    pub fn first(&self) -> Option<&'a Element> {
        self.elements.first().copied()
    }

    /// Sub-selection of elements carrying `class` (a leading `.` is ignored).
    #[must_use]
    pub fn filter_class(&self, class: &str) -> Selection<'a> {
        let class = class.strip_prefix('.').unwrap_or(class);
        Selection { elements: self.elements.iter().copied().filter(|e| e.has_class(class)).collect() }
    }

    /// Datasets bound to the selected elements, in order of first appearance.
    #[must_use]
    pub fn datasets(&self) -> Vec<DatasetId> {
        let mut ids = Vec::new();
        for id in self.elements.iter().filter_map(|e| e.binding()).map(|b| b.dataset) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl<'a> IntoIterator for Selection<'a> {
    type Item = &'a Element;
    type IntoIter = std::vec::IntoIter<&'a Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}
