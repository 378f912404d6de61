//! Per-container state retained after the one-time computation.
//!
//! Entries are keyed by element identity only. The registry never keeps an
//! element alive; entries for elements that have left the document are
//! dropped the next time the watchdog prunes.

use std::collections::HashMap;

use b235_css::ContainerScope;
use b235_dom::ElementId;
use b235_layout::Breakpoints;

/// State of one computed container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    pub element: ElementId,
    pub scope: ContainerScope,
    /// Eligible children seen when breakpoints were computed.
    pub initial_eligible_count: usize,
    pub breakpoints: Breakpoints,
    /// Whether the recovery class is currently applied.
    pub recovering: bool,
    /// Last value written to the live items attribute.
    pub live_items: Option<usize>,
}

impl ContainerRecord {
    pub fn new(
        element: ElementId,
        scope: ContainerScope,
        initial_eligible_count: usize,
        breakpoints: Breakpoints,
    ) -> Self {
        Self {
            element,
            scope,
            initial_eligible_count,
            breakpoints,
            recovering: false,
            live_items: None,
        }
    }
}

/// Computed containers in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ContainerRegistry {
    records: Vec<ContainerRecord>,
    by_element: HashMap<ElementId, usize>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container. A container is only ever registered once;
    /// returns `false` and keeps the existing entry on a second attempt.
    pub fn insert(&mut self, record: ContainerRecord) -> bool {
        if self.by_element.contains_key(&record.element) {
            return false;
        }
        self.by_element.insert(record.element, self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, element: ElementId) -> Option<&ContainerRecord> {
        self.by_element.get(&element).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, element: ElementId) -> Option<&mut ContainerRecord> {
        self.by_element
            .get(&element)
            .copied()
            .map(move |i| &mut self.records[i])
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.by_element.contains_key(&element)
    }

    /// Initial eligible count, zero for unknown elements.
    pub fn initial_count(&self, element: ElementId) -> usize {
        self.get(element).map_or(0, |r| r.initial_eligible_count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ContainerRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only the records for which `keep` returns true. Returns how many
    /// were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&ContainerRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        if self.records.len() != before {
            self.by_element = self
                .records
                .iter()
                .enumerate()
                .map(|(i, r)| (r.element, i))
                .collect();
        }
        before - self.records.len()
    }
}
