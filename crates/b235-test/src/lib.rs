//! FakePage - in-memory host document for B235 tests.
//!
//! Implements both halves of the host contract over a flat element table.
//! Computed style values are whatever the test sets; nothing is actually laid
//! out. Every mutation the engine performs is recorded so tests can assert on
//! it afterwards.

use std::collections::{HashMap, HashSet};

use b235_dom::{DomSurface, ElementId, MeasurementProvider, Visibility};

#[derive(Debug, Default, Clone)]
struct FakeElement {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: Vec<String>,
    computed: HashMap<String, String>,
    inline: HashMap<String, String>,
    attributes: HashMap<String, String>,
    visibility: Option<Visibility>,
    scroll_width: f64,
    client_width: f64,
    connected: bool,
}

/// In-memory document.
#[derive(Debug, Clone)]
pub struct FakePage {
    elements: Vec<FakeElement>,
    root: ElementId,
    style_elements: Vec<String>,
    stylesheet_links: Vec<String>,
    observed: Vec<ElementId>,
    visibility_log: Vec<(ElementId, Visibility)>,
    fonts_supported: bool,
}

impl FakePage {
    /// Create a page with a root element at 16px.
    pub fn new() -> Self {
        let mut root = FakeElement {
            connected: true,
            ..Default::default()
        };
        root.computed.insert("font-size".into(), "16px".into());

        Self {
            elements: vec![root],
            root: ElementId::new(0),
            style_elements: Vec::new(),
            stylesheet_links: Vec::new(),
            observed: Vec::new(),
            visibility_log: Vec::new(),
            fonts_supported: true,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn set_root_font_size(&mut self, value: &str) {
        let root = self.root;
        self.set_computed(root, "font-size", value);
    }

    pub fn set_fonts_supported(&mut self, supported: bool) {
        self.fonts_supported = supported;
    }

    /// Append a new element under `parent`.
    pub fn add_element(&mut self, parent: ElementId) -> ElementId {
        let id = ElementId::new(self.elements.len() as u64);
        self.elements.push(FakeElement {
            parent: Some(parent),
            connected: true,
            ..Default::default()
        });
        self.element_mut(parent).children.push(id);
        id
    }

    /// Append a flex container carrying `class` under the root.
    pub fn add_container(&mut self, class: &str) -> ElementId {
        let root = self.root;
        let id = self.add_element(root);
        self.element_mut(id).classes.push(class.to_string());
        self.set_computed(id, "display", "flex");
        self.set_computed(id, "position", "static");
        id
    }

    /// Append an in-flow child with a plain content width and no box edges.
    pub fn add_child(&mut self, parent: ElementId, width: f64) -> ElementId {
        let id = self.add_element(parent);
        self.set_computed(id, "display", "block");
        self.set_computed(id, "position", "static");
        self.set_computed(id, "width", &format!("{width}px"));
        id
    }

    /// Container with one child per width and the given gap on `column-gap`.
    pub fn add_container_with_children(
        &mut self,
        class: &str,
        widths: &[f64],
        gap: f64,
    ) -> (ElementId, Vec<ElementId>) {
        let container = self.add_container(class);
        self.set_computed(container, "column-gap", &format!("{gap}px"));
        let children = widths
            .iter()
            .map(|w| self.add_child(container, *w))
            .collect();
        (container, children)
    }

    pub fn set_computed(&mut self, element: ElementId, property: &str, value: &str) {
        self.element_mut(element)
            .computed
            .insert(property.to_string(), value.to_string());
    }

    pub fn clear_computed(&mut self, element: ElementId, property: &str) {
        self.element_mut(element).computed.remove(property);
    }

    pub fn hide(&mut self, element: ElementId) {
        self.set_computed(element, "display", "none");
    }

    pub fn show(&mut self, element: ElementId) {
        self.set_computed(element, "display", "block");
    }

    pub fn set_scroll_width(&mut self, element: ElementId, width: f64) {
        self.element_mut(element).scroll_width = width;
    }

    pub fn set_client_width(&mut self, element: ElementId, width: f64) {
        self.element_mut(element).client_width = width;
    }

    /// Detach an element from its parent.
    pub fn remove(&mut self, element: ElementId) {
        if let Some(parent) = self.element(element).parent {
            self.element_mut(parent).children.retain(|c| *c != element);
        }
        let el = self.element_mut(element);
        el.parent = None;
        el.connected = false;
    }

    // ==================== Inspection ====================

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.element(element).classes.iter().any(|c| c == class)
    }

    pub fn classes(&self, element: ElementId) -> &[String] {
        &self.element(element).classes
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.element(element).attributes.get(name).map(String::as_str)
    }

    pub fn inline_style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.element(element).inline.get(property).map(String::as_str)
    }

    /// Last inline visibility written, if any.
    pub fn visibility(&self, element: ElementId) -> Option<Visibility> {
        self.element(element).visibility
    }

    /// Every visibility write, in order.
    pub fn visibility_log(&self) -> &[(ElementId, Visibility)] {
        &self.visibility_log
    }

    pub fn style_elements(&self) -> &[String] {
        &self.style_elements
    }

    pub fn stylesheet_links(&self) -> &[String] {
        &self.stylesheet_links
    }

    pub fn observed(&self) -> &[ElementId] {
        &self.observed
    }

    fn element(&self, element: ElementId) -> &FakeElement {
        &self.elements[element.raw() as usize]
    }

    fn element_mut(&mut self, element: ElementId) -> &mut FakeElement {
        &mut self.elements[element.raw() as usize]
    }
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementProvider for FakePage {
    fn document_element(&self) -> ElementId {
        self.root
    }

    fn query_class(&self, class: &str) -> Vec<ElementId> {
        // Document order is a pre-order walk from the root.
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if self.has_class(id, class) {
                found.push(id);
            }
            stack.extend(self.element(id).children.iter().rev().copied());
        }
        found
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.element(element).children.clone()
    }

    fn computed_property(&self, element: ElementId, property: &str) -> Option<String> {
        self.element(element).computed.get(property).cloned()
    }

    fn scroll_width(&self, element: ElementId) -> f64 {
        self.element(element).scroll_width
    }

    fn client_width(&self, element: ElementId) -> f64 {
        self.element(element).client_width
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.element(element).connected
    }

    fn fonts_supported(&self) -> bool {
        self.fonts_supported
    }
}

impl DomSurface for FakePage {
    fn set_visibility(&mut self, element: ElementId, visibility: Visibility) {
        self.element_mut(element).visibility = Some(visibility);
        self.visibility_log.push((element, visibility));
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if !self.has_class(element, class) {
            self.element_mut(element).classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        self.element_mut(element).classes.retain(|c| c != class);
    }

    fn set_style_property(&mut self, element: ElementId, property: &str, value: &str) {
        self.element_mut(element)
            .inline
            .insert(property.to_string(), value.to_string());
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        self.element_mut(element)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn append_style_element(&mut self, text: &str) {
        self.style_elements.push(text.to_string());
    }

    fn prepend_stylesheet_link(&mut self, href: &str) {
        self.stylesheet_links.retain(|h| h != href);
        self.stylesheet_links.insert(0, href.to_string());
    }

    fn observe_size(&mut self, element: ElementId) {
        if !self.observed.contains(&element) {
            self.observed.push(element);
        }
    }
}
