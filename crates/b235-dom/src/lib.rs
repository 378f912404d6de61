//! Host document contract for B235.
//!
//! The breakpoint engine never walks a real DOM itself. Everything it knows
//! about the page comes through [`MeasurementProvider`], and everything it
//! changes goes through [`DomSurface`]. A browser binding, a headless
//! renderer, or the in-memory page used by the tests all implement both.

use std::fmt;

/// Opaque identity of an element in the host document.
///
/// Two ids compare equal exactly when they name the same element. Holding an
/// id keeps nothing alive; a removed element simply reports
/// [`MeasurementProvider::is_connected`] as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

impl ElementId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inline visibility state written on containers while breakpoints are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn as_css(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
        }
    }
}

/// Read side of the host document.
///
/// All lengths are resolved pixel values. Property lookups return the
/// resolved value string exactly as the host computes it (`"16px"`,
/// `"normal"`, `"16px 24px"`); interpreting it is the caller's job.
pub trait MeasurementProvider {
    /// The root element whose `font-size` normalizes generated widths.
    fn document_element(&self) -> ElementId;

    /// Every element carrying `class`, in document order.
    fn query_class(&self, class: &str) -> Vec<ElementId>;

    /// Direct element children of `element`, in document order.
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// Resolved value of a style property, or `None` when the host has none.
    fn computed_property(&self, element: ElementId, property: &str) -> Option<String>;

    /// Width of the element's scrollable content.
    fn scroll_width(&self, element: ElementId) -> f64;

    /// Width of the element's visible client box.
    fn client_width(&self, element: ElementId) -> f64;

    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: ElementId) -> bool;

    /// Whether the host exposes a font readiness notification at all.
    fn fonts_supported(&self) -> bool;
}

/// Write side of the host document.
pub trait DomSurface {
    fn set_visibility(&mut self, element: ElementId, visibility: Visibility);

    fn add_class(&mut self, element: ElementId, class: &str);

    fn remove_class(&mut self, element: ElementId, class: &str);

    /// Set an inline style property on the element.
    fn set_style_property(&mut self, element: ElementId, property: &str, value: &str);

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);

    /// Append a new style element with `text` to the document head.
    fn append_style_element(&mut self, text: &str);

    /// Insert (or move) a stylesheet link as the first entry of the cascade.
    ///
    /// Load completion is reported back asynchronously by the host.
    fn prepend_stylesheet_link(&mut self, href: &str);

    /// Start delivering content-box width changes for `element`.
    fn observe_size(&mut self, element: ElementId);
}

/// A full host document: measurable and mutable.
pub trait Document: MeasurementProvider + DomSurface {}

impl<T: MeasurementProvider + DomSurface> Document for T {}
