//! Runtime reconciliation after the one-time computation.
//!
//! Two independent layers keep a computed page honest:
//!
//! - **Live indicator**: every size notification for a container re-derives
//!   its items-per-row from the retained breakpoints and mirrors it into the
//!   `data-b235-items` attribute.
//! - **Watchdog**: a debounced pass compares each container's eligible
//!   children with the count seen at computation time and checks for
//!   horizontal overflow. Either condition applies the recovery class; when
//!   both clear, the class comes off again. The first pass after attaching
//!   runs on its own one-shot deadline, so resize traffic cannot postpone it.
//!
//! Neither layer reports errors. A pass that finds nothing to change changes
//! nothing.

use b235_css::{ITEMS_ATTRIBUTE, RECOVER_CLASS};
use b235_dom::{Document, ElementId};
use b235_layout::{eligible_count, root_font_size};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::registry::ContainerRegistry;

/// A container whose recovery state flipped during a watchdog pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryChange {
    pub element: ElementId,
    pub active: bool,
}

#[derive(Debug)]
pub struct Reconciler {
    registry: ContainerRegistry,
    watchdog: Debouncer,
    initial_pass: Option<Instant>,
    fallback_root_font_size: f64,
    evaluations: u64,
}

impl Reconciler {
    /// Start observing every registered container and schedule the first,
    /// unconditional watchdog pass.
    pub fn attach<D: Document>(
        registry: ContainerRegistry,
        document: &mut D,
        config: &EngineConfig,
        now: Instant,
    ) -> Self {
        for record in registry.iter() {
            document.observe_size(record.element);
        }

        debug!(containers = registry.len(), "Reconciler attached");
        Self {
            registry,
            watchdog: Debouncer::new(config.watchdog_settle()),
            initial_pass: Some(now + config.initial_watchdog_delay()),
            fallback_root_font_size: config.fallback_root_font_size,
            evaluations: 0,
        }
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    /// Number of watchdog passes run so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.initial_pass, self.watchdog.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Refresh the live items attribute for a resized container.
    ///
    /// Returns the new count when it changed. Unknown elements are ignored.
    pub fn on_container_resized<D: Document>(
        &mut self,
        document: &mut D,
        element: ElementId,
        content_width: f64,
    ) -> Option<usize> {
        let root = root_font_size(&*document, self.fallback_root_font_size);
        let Some(record) = self.registry.get_mut(element) else {
            trace!(%element, "Size notification for unregistered element");
            return None;
        };

        let items = record.breakpoints.items_for_width(content_width, root);
        trace!(%element, content_width, items, "Container resized");
        if record.live_items == Some(items) {
            return None;
        }

        document.set_attribute(element, ITEMS_ATTRIBUTE, &items.to_string());
        record.live_items = Some(items);
        Some(items)
    }

    /// Cancel any pending watchdog pass and schedule a new one after the
    /// settle period.
    pub fn request_watchdog(&mut self, now: Instant) {
        self.watchdog.schedule(now);
    }

    /// Run the watchdog if the initial pass or the debounced pass is due.
    /// Both falling due together still make a single pass.
    pub fn poll<D: Document>(&mut self, document: &mut D, now: Instant) -> Vec<RecoveryChange> {
        let initial = matches!(self.initial_pass, Some(at) if at <= now);
        if initial {
            self.initial_pass = None;
        }
        let debounced = self.watchdog.fire_if_due(now);

        if initial || debounced {
            self.police_integrity(document)
        } else {
            Vec::new()
        }
    }

    /// Re-evaluate the recovery state of every container.
    pub fn police_integrity<D: Document>(&mut self, document: &mut D) -> Vec<RecoveryChange> {
        self.evaluations += 1;

        let pruned = self.registry.retain(|r| document.is_connected(r.element));
        if pruned > 0 {
            debug!(pruned, "Dropped disconnected containers");
        }

        let mut changes = Vec::new();
        for record in self.registry.iter_mut() {
            let element = record.element;
            let now = eligible_count(&*document, element);
            let overflowing = document.scroll_width(element) > document.client_width(element);
            let recover = now > record.initial_eligible_count || overflowing;

            if recover {
                document.add_class(element, RECOVER_CLASS);
            } else {
                document.remove_class(element, RECOVER_CLASS);
            }

            if recover != record.recovering {
                debug!(
                    %element,
                    baseline = record.initial_eligible_count,
                    now,
                    overflowing,
                    recover,
                    "Recovery state changed"
                );
                record.recovering = recover;
                changes.push(RecoveryChange {
                    element,
                    active: recover,
                });
            }
        }
        changes
    }
}
