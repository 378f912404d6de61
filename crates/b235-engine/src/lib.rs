//! # B235 Engine
//!
//! Derives responsive breakpoints from measured content and keeps the page
//! consistent with them afterwards.
//!
//! ## Design Goals
//!
//! 1. **Compute once**: Measure, pack, and inject the generated stylesheet
//!    exactly once per page, after best-effort readiness
//! 2. **Never block**: Every readiness failure falls through to computing
//! 3. **Stay correct**: After computing, keep the live item count and the
//!    recovery class in line with what the page actually does
//!
//! ## Pipeline
//!
//! ```text
//! Bootstrap → compute (pack + generate rules) → inject → show → Reconciler
//! ```
//!
//! The engine is single-threaded and event driven. Hosts either feed
//! [`PageEvent`]s and poll timers themselves ([`Engine::handle_event`],
//! [`Engine::poll_timers`], [`Engine::next_deadline`]) or hand an event
//! channel to [`Engine::run`].

use std::time::Duration;

use b235_css::Stylesheet;
use b235_dom::{Document, ElementId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace};

pub mod bootstrap;
pub mod compute;
pub mod config;
pub mod debounce;
pub mod reconciler;
pub mod registry;

pub use bootstrap::{Bootstrap, BootstrapStage, BootstrapStep, FallbackReason};
pub use compute::{compute_breakpoints, ComputeOutcome};
pub use config::EngineConfig;
pub use debounce::Debouncer;
pub use reconciler::{Reconciler, RecoveryChange};
pub use registry::{ContainerRecord, ContainerRegistry};

/// Errors that can occur in the engine.
///
/// Only configuration can fail. Page-side problems degrade to "no
/// breakpoints" or "no recovery" and are logged instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Notifications from the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Document structure is available.
    DocumentReady,
    /// The relocated external stylesheet finished loading.
    StylesheetLoaded,
    /// The relocated external stylesheet failed to load.
    StylesheetFailed,
    /// Font loading settled.
    FontsReady,
    /// Font loading failed.
    FontsFailed,
    /// A size observer reported a container's new content-box width.
    ContainerResized { element: ElementId, content_width: f64 },
    /// The viewport changed size.
    ViewportResized { width: f64, height: f64 },
    /// A container's children were added, removed, shown or hidden.
    ChildrenChanged { element: ElementId },
}

/// Engine events emitted to the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The one-time computation finished.
    LayoutComputed { containers: usize, tokens: usize },
    /// A container's live item count changed.
    ItemsChanged { element: ElementId, items: usize },
    /// The recovery class was applied to or removed from a container.
    RecoveryChanged { element: ElementId, active: bool },
    /// Readiness ordering was abandoned.
    BootstrapFallback { reason: FallbackReason },
}

/// The breakpoint engine for one page.
pub struct Engine<D: Document> {
    config: EngineConfig,
    document: D,
    bootstrap: Bootstrap,
    reconciler: Option<Reconciler>,
    stylesheet: Option<Stylesheet>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<EngineEvent>>,
}

impl<D: Document> Engine<D> {
    /// Create an engine over `document`.
    pub fn new(config: EngineConfig, document: D) -> Result<Self, EngineError> {
        config.validate()?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        info!(marker = %config.marker_class, "Initializing B235 engine");
        Ok(Self {
            bootstrap: Bootstrap::new(&config),
            config,
            document,
            reconciler: None,
            stylesheet: None,
            event_tx,
            event_rx: Some(event_rx),
        })
    }

    /// Take the event receiver. Events are only queued once it has been taken.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.event_rx.take()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    pub fn bootstrap_stage(&self) -> BootstrapStage {
        self.bootstrap.stage()
    }

    /// Whether the one-time computation has run.
    pub fn has_computed(&self) -> bool {
        self.bootstrap.has_run()
    }

    /// The generated stylesheet, once computed.
    pub fn stylesheet(&self) -> Option<&Stylesheet> {
        self.stylesheet.as_ref()
    }

    /// Computed containers, once computed.
    pub fn registry(&self) -> Option<&ContainerRegistry> {
        self.reconciler.as_ref().map(Reconciler::registry)
    }

    /// Watchdog passes run so far.
    pub fn watchdog_runs(&self) -> u64 {
        self.reconciler.as_ref().map_or(0, Reconciler::evaluations)
    }

    /// Arm the readiness timeout.
    pub fn start(&mut self, now: Instant) {
        self.bootstrap.start(now);
    }

    /// Run the one-time computation now, regardless of readiness.
    ///
    /// Returns `false` if it had already run.
    pub fn compute(&mut self, now: Instant) -> bool {
        let document = &mut self.document;
        let config = &self.config;
        let Some(outcome) = self.bootstrap.run_once(|| compute_breakpoints(document, config)) else {
            return false;
        };

        self.emit(EngineEvent::LayoutComputed {
            containers: outcome.registry.len(),
            tokens: outcome.token_count,
        });
        self.stylesheet = outcome.stylesheet;
        self.reconciler = Some(Reconciler::attach(
            outcome.registry,
            &mut self.document,
            &self.config,
            now,
        ));
        true
    }

    /// Process one page event.
    pub fn handle_event(&mut self, event: PageEvent, now: Instant) {
        trace!(?event, "Page event");
        match event {
            PageEvent::ContainerResized {
                element,
                content_width,
            } => {
                let Some(reconciler) = self.reconciler.as_mut() else {
                    trace!(%element, "Resize before computation ignored");
                    return;
                };
                if let Some(items) =
                    reconciler.on_container_resized(&mut self.document, element, content_width)
                {
                    self.emit(EngineEvent::ItemsChanged { element, items });
                }
            }
            PageEvent::ViewportResized { .. } | PageEvent::ChildrenChanged { .. } => {
                if let Some(reconciler) = self.reconciler.as_mut() {
                    reconciler.request_watchdog(now);
                }
            }
            PageEvent::DocumentReady
            | PageEvent::StylesheetLoaded
            | PageEvent::StylesheetFailed
            | PageEvent::FontsReady
            | PageEvent::FontsFailed => {
                let step = self.bootstrap.on_event(&event, &mut self.document);
                self.advance(step, now);
            }
        }
    }

    /// Fire whatever timers are due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.bootstrap.timed_out(now) {
            let step = self.bootstrap.force_ready(FallbackReason::Timeout);
            self.advance(step, now);
        }

        if let Some(reconciler) = self.reconciler.as_mut() {
            let changes = reconciler.poll(&mut self.document, now);
            for change in changes {
                self.emit(EngineEvent::RecoveryChanged {
                    element: change.element,
                    active: change.active,
                });
            }
        }
    }

    /// The earliest instant at which [`Engine::poll_timers`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        let watchdog = self.reconciler.as_ref().and_then(Reconciler::next_deadline);
        match (self.bootstrap.next_deadline(), watchdog) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drive the engine from `events` until the sender side closes.
    ///
    /// If the channel closes before readiness settled, the computation still
    /// runs once before returning.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<PageEvent>) {
        self.start(Instant::now());

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, Instant::now()),
                    None => {
                        let step = self.bootstrap.force_ready(FallbackReason::EventsClosed);
                        self.advance(step, Instant::now());
                        break;
                    }
                },
                _ = sleep_until(deadline) => self.poll_timers(Instant::now()),
            }
        }

        info!(watchdog_runs = self.watchdog_runs(), "Engine event loop finished");
    }

    fn advance(&mut self, step: BootstrapStep, now: Instant) {
        match step {
            BootstrapStep::Pending => {}
            BootstrapStep::Ready => {
                debug!("Readiness settled");
                self.compute(now);
            }
            BootstrapStep::Fallback(reason) => {
                self.emit(EngineEvent::BootstrapFallback { reason });
                self.compute(now);
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if self.event_rx.is_none() {
            let _ = self.event_tx.send(event);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Builder for [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the class that marks containers.
    pub fn marker_class(mut self, class: impl Into<String>) -> Self {
        self.config.marker_class = class.into();
        self
    }

    /// Set the stylesheet moved to the front of the cascade.
    pub fn stylesheet_href(mut self, href: impl Into<String>) -> Self {
        self.config.stylesheet_href = Some(href.into());
        self
    }

    /// Wait for fonts before computing.
    pub fn wait_for_fonts(mut self, wait: bool) -> Self {
        self.config.wait_for_fonts = wait;
        self
    }

    /// Set or disable the readiness timeout.
    pub fn readiness_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.readiness_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    /// Set the watchdog settle period.
    pub fn watchdog_settle(mut self, settle: Duration) -> Self {
        self.config.watchdog_settle_ms = settle.as_millis() as u64;
        self
    }

    /// Set the extra pixels added to every collision width.
    pub fn epsilon_px(mut self, epsilon: f64) -> Self {
        self.config.epsilon_px = epsilon;
        self
    }

    /// Build the engine over `document`.
    pub fn build<D: Document>(self, document: D) -> Result<Engine<D>, EngineError> {
        Engine::new(self.config, document)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
