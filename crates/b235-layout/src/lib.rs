//! # B235 Layout
//!
//! Measurement of container children and the worst-case packing that turns
//! their widths into breakpoints.
//!
//! ## Design Goals
//!
//! 1. **Same unit domain**: Every occupied width is read in resolved pixels
//! 2. **Worst case**: Breakpoints assume the widest children share a row
//! 3. **Root-relative output**: Breakpoints survive root font-size changes

use b235_css::{parse_display, parse_position, parse_px, px_or_zero, resolve_gap, Position};
use b235_dom::{ElementId, MeasurementProvider};
use tracing::trace;

pub mod packing;

pub use packing::{collision_widths, Breakpoints, Collision};

/// Edge sizes (margin, padding, border).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeSizes {
    pub left: f64,
    pub right: f64,
}

impl EdgeSizes {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

/// Horizontal box metrics of one child.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChildBox {
    /// Content width.
    pub width: f64,
    /// Padding.
    pub padding: EdgeSizes,
    /// Border.
    pub border: EdgeSizes,
    /// Margin.
    pub margin: EdgeSizes,
}

impl ChildBox {
    /// Read the box from resolved style values. Unreadable values count as zero.
    pub fn measure(provider: &impl MeasurementProvider, element: ElementId) -> Self {
        let px = |property: &str| px_or_zero(provider.computed_property(element, property).as_deref());
        Self {
            width: px("width"),
            padding: EdgeSizes {
                left: px("padding-left"),
                right: px("padding-right"),
            },
            border: EdgeSizes {
                left: px("border-left-width"),
                right: px("border-right-width"),
            },
            margin: EdgeSizes {
                left: px("margin-left"),
                right: px("margin-right"),
            },
        }
    }

    /// Width the child claims in its row: content + padding + border + margin.
    ///
    /// Negative margins can pull the sum below zero; the result never is.
    pub fn occupied_width(&self) -> f64 {
        let sum = self.width + self.padding.horizontal() + self.border.horizontal() + self.margin.horizontal();
        sum.max(0.0)
    }
}

/// Whether a child takes part in the row: displayed and positioned in flow.
///
/// Missing or unknown `position` reads as `static`; unknown `display` reads as
/// displayed.
pub fn is_eligible(provider: &impl MeasurementProvider, element: ElementId) -> bool {
    let hidden = provider
        .computed_property(element, "display")
        .and_then(|v| parse_display(&v))
        .is_some_and(|d| d.is_none());
    let position = provider
        .computed_property(element, "position")
        .and_then(|v| parse_position(&v))
        .unwrap_or(Position::Static);

    !hidden && position.is_in_flow()
}

/// Eligible direct children of a container, in document order.
pub fn eligible_children(provider: &impl MeasurementProvider, container: ElementId) -> Vec<ElementId> {
    provider
        .children(container)
        .into_iter()
        .filter(|child| is_eligible(provider, *child))
        .collect()
}

/// Count of eligible direct children.
pub fn eligible_count(provider: &impl MeasurementProvider, container: ElementId) -> usize {
    provider
        .children(container)
        .into_iter()
        .filter(|child| is_eligible(provider, *child))
        .count()
}

/// Horizontal gap between items of a container.
pub fn container_gap(provider: &impl MeasurementProvider, container: ElementId) -> f64 {
    let column_gap = provider.computed_property(container, "column-gap");
    let gap = provider.computed_property(container, "gap");
    resolve_gap(column_gap.as_deref(), gap.as_deref())
}

/// Root font size in pixels, or `fallback` when unreadable or not positive.
pub fn root_font_size(provider: &impl MeasurementProvider, fallback: f64) -> f64 {
    provider
        .computed_property(provider.document_element(), "font-size")
        .and_then(|v| parse_px(&v))
        .filter(|size| *size > 0.0)
        .unwrap_or(fallback)
}

/// Occupied widths of `children`, in the given order.
pub fn occupied_widths(provider: &impl MeasurementProvider, children: &[ElementId]) -> Vec<f64> {
    children
        .iter()
        .map(|child| {
            let width = ChildBox::measure(provider, *child).occupied_width();
            trace!(%child, width, "Measured child");
            width
        })
        .collect()
}
