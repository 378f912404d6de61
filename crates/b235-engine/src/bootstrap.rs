//! Readiness sequencing before the one-time computation.
//!
//! The preferred order is: document structure, then the external stylesheet
//! (moved to the front of the cascade), then fonts. Each stage is best
//! effort. A failed stylesheet, a failed font load, or the readiness timeout
//! all lead to the same place: the computation runs anyway. Whatever path
//! gets there first claims the one-shot token; every later attempt is a
//! no-op.

use std::fmt;
use std::time::Duration;

use b235_dom::Document;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::PageEvent;

/// Where the sequencer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    AwaitingDocument,
    AwaitingStylesheet,
    AwaitingFonts,
    /// All conditions settled; the computation may run.
    Ready,
    /// The computation has run.
    Done,
}

/// Why the computation ran without the preferred ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    StylesheetFailed,
    FontsFailed,
    Timeout,
    EventsClosed,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FallbackReason::StylesheetFailed => "stylesheet failed to load",
            FallbackReason::FontsFailed => "fonts failed to load",
            FallbackReason::Timeout => "readiness timed out",
            FallbackReason::EventsClosed => "event source closed",
        };
        f.write_str(reason)
    }
}

/// Outcome of feeding one event to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    /// Still waiting.
    Pending,
    /// Every condition settled in order.
    Ready,
    /// A condition failed; proceed regardless.
    Fallback(FallbackReason),
}

#[derive(Debug)]
pub struct Bootstrap {
    stage: BootstrapStage,
    stylesheet_href: Option<String>,
    wait_for_fonts: bool,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    fonts_settled: bool,
    has_run: bool,
}

impl Bootstrap {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            stage: BootstrapStage::AwaitingDocument,
            stylesheet_href: config.stylesheet_href.clone(),
            wait_for_fonts: config.wait_for_fonts,
            timeout: config.readiness_timeout(),
            deadline: None,
            fonts_settled: false,
            has_run: false,
        }
    }

    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Whether the one-shot token has been claimed.
    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Arm the readiness timeout.
    pub fn start(&mut self, now: Instant) {
        if self.is_waiting() {
            self.deadline = self.timeout.map(|t| now + t);
            info!(timeout = ?self.timeout, "Bootstrap started");
        }
    }

    /// Pending timeout, while still waiting on readiness.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.is_waiting() {
            self.deadline
        } else {
            None
        }
    }

    /// True once the readiness timeout has passed while still waiting.
    pub fn timed_out(&self, now: Instant) -> bool {
        matches!(self.next_deadline(), Some(deadline) if deadline <= now)
    }

    /// Feed a page event through the stage machine.
    pub fn on_event<D: Document>(&mut self, event: &PageEvent, document: &mut D) -> BootstrapStep {
        match (self.stage, event) {
            (_, PageEvent::FontsReady) | (_, PageEvent::FontsFailed) if self.stage != BootstrapStage::AwaitingFonts => {
                // Fonts may settle before we get to asking.
                self.fonts_settled = true;
                BootstrapStep::Pending
            }
            (BootstrapStage::AwaitingDocument, PageEvent::DocumentReady) => {
                match self.stylesheet_href.clone() {
                    Some(href) => {
                        debug!(%href, "Moving stylesheet to the front of the cascade");
                        document.prepend_stylesheet_link(&href);
                        self.stage = BootstrapStage::AwaitingStylesheet;
                        BootstrapStep::Pending
                    }
                    None => self.enter_fonts_stage(document),
                }
            }
            (BootstrapStage::AwaitingStylesheet, PageEvent::StylesheetLoaded) => {
                debug!("Stylesheet loaded");
                self.enter_fonts_stage(document)
            }
            (BootstrapStage::AwaitingStylesheet, PageEvent::StylesheetFailed) => {
                warn!(href = ?self.stylesheet_href, "Stylesheet failed to load, computing anyway");
                self.stage = BootstrapStage::Ready;
                BootstrapStep::Fallback(FallbackReason::StylesheetFailed)
            }
            (BootstrapStage::AwaitingFonts, PageEvent::FontsReady) => {
                self.fonts_settled = true;
                self.stage = BootstrapStage::Ready;
                BootstrapStep::Ready
            }
            (BootstrapStage::AwaitingFonts, PageEvent::FontsFailed) => {
                warn!("Font loading failed, computing anyway");
                self.fonts_settled = true;
                self.stage = BootstrapStage::Ready;
                BootstrapStep::Fallback(FallbackReason::FontsFailed)
            }
            _ => BootstrapStep::Pending,
        }
    }

    /// Abandon the preferred ordering.
    pub fn force_ready(&mut self, reason: FallbackReason) -> BootstrapStep {
        if !self.is_waiting() {
            return BootstrapStep::Pending;
        }
        warn!(%reason, stage = ?self.stage, "Bootstrap fallback");
        self.stage = BootstrapStage::Ready;
        BootstrapStep::Fallback(reason)
    }

    /// Run `compute` unless a previous call already did. Returns `None` for
    /// the no-op case.
    pub fn run_once<R>(&mut self, compute: impl FnOnce() -> R) -> Option<R> {
        if self.has_run {
            debug!("One-time computation already ran");
            return None;
        }
        self.has_run = true;
        self.stage = BootstrapStage::Done;
        self.deadline = None;
        Some(compute())
    }

    fn is_waiting(&self) -> bool {
        matches!(
            self.stage,
            BootstrapStage::AwaitingDocument
                | BootstrapStage::AwaitingStylesheet
                | BootstrapStage::AwaitingFonts
        )
    }

    fn enter_fonts_stage<D: Document>(&mut self, document: &D) -> BootstrapStep {
        if self.wait_for_fonts && document.fonts_supported() && !self.fonts_settled {
            debug!("Waiting for fonts");
            self.stage = BootstrapStage::AwaitingFonts;
            BootstrapStep::Pending
        } else {
            self.stage = BootstrapStage::Ready;
            BootstrapStep::Ready
        }
    }
}
