//! The one-time breakpoint computation.
//!
//! Containers are hidden while their children are measured and the
//! generated stylesheet is injected, then shown again. Showing them again is
//! tied to a guard's `Drop`, so no path out of the computation (early return
//! or unwind) can leave a container hidden.

use std::ops::{Deref, DerefMut};

use b235_css::{ContainerScope, RuleGenerator, Stylesheet};
use b235_dom::{Document, ElementId, Visibility};
use b235_layout::{container_gap, eligible_children, occupied_widths, root_font_size, Breakpoints};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::registry::{ContainerRecord, ContainerRegistry};

/// Result of the one-time computation.
#[derive(Debug, Default)]
pub struct ComputeOutcome {
    pub registry: ContainerRegistry,
    /// `None` when the page has no containers and nothing was injected.
    pub stylesheet: Option<Stylesheet>,
    pub root_font_size: f64,
    pub token_count: usize,
}

/// Keeps a set of containers hidden for as long as it lives.
struct HiddenContainers<'a, D: Document> {
    document: &'a mut D,
    containers: Vec<ElementId>,
}

impl<'a, D: Document> HiddenContainers<'a, D> {
    fn hide(document: &'a mut D, containers: Vec<ElementId>) -> Self {
        for container in &containers {
            document.set_visibility(*container, Visibility::Hidden);
        }
        Self {
            document,
            containers,
        }
    }
}

impl<D: Document> Deref for HiddenContainers<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.document
    }
}

impl<D: Document> DerefMut for HiddenContainers<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.document
    }
}

impl<D: Document> Drop for HiddenContainers<'_, D> {
    fn drop(&mut self) {
        for container in &self.containers {
            self.document.set_visibility(*container, Visibility::Visible);
        }
    }
}

/// Measure every marked container, derive its breakpoints, and inject the
/// generated stylesheet.
pub fn compute_breakpoints<D: Document>(document: &mut D, config: &EngineConfig) -> ComputeOutcome {
    let root_font_size = root_font_size(&*document, config.fallback_root_font_size);
    let containers = document.query_class(&config.marker_class);
    if containers.is_empty() {
        info!(marker = %config.marker_class, "No containers found");
        return ComputeOutcome {
            root_font_size,
            ..Default::default()
        };
    }

    let mut page = HiddenContainers::hide(document, containers.clone());
    let mut generator = RuleGenerator::new();
    let mut registry = ContainerRegistry::new();

    for container in containers {
        if registry.contains(container) {
            continue;
        }

        let children = eligible_children(&*page, container);
        if children.is_empty() {
            debug!(%container, "Container has no eligible children");
            page.set_visibility(container, Visibility::Visible);
            continue;
        }

        let gap = container_gap(&*page, container);
        let widths = occupied_widths(&*page, &children);
        let breakpoints = Breakpoints::compute(&widths, gap, root_font_size, config.epsilon_px);

        let scope = ContainerScope::numbered(registry.len());
        page.add_class(container, scope.class_name());
        page.set_style_property(container, "container-type", "inline-size");
        page.set_style_property(container, "container-name", scope.query_name());

        generator.emit_container(&scope, children.len(), &breakpoints.thresholds());
        debug!(
            %container,
            class = scope.class_name(),
            items = children.len(),
            gap,
            "Computed container breakpoints"
        );

        registry.insert(ContainerRecord::new(
            container,
            scope,
            children.len(),
            breakpoints,
        ));
    }

    let token_count = generator.tokens().len();
    let stylesheet = generator.finish();
    page.append_style_element(&stylesheet.to_string());
    drop(page);

    info!(
        containers = registry.len(),
        tokens = token_count,
        root_font_size,
        "Breakpoint stylesheet injected"
    );

    ComputeOutcome {
        registry,
        stylesheet: Some(stylesheet),
        root_font_size,
        token_count,
    }
}
