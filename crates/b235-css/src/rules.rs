//! Breakpoint rule generation.
//!
//! Turns each container's collision widths into scoped `@container` rules
//! that step the `--b235-items-per-row` indicator down one item at a time,
//! plus a single `:root` block of shared breakpoint tokens.
//!
//! The indicator is only a signal. Turning it into actual wrapping is left to
//! an authored stylesheet that reads the custom property.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{ContainerQuery, CssBlock, Rem, Rule, Stylesheet};

/// Custom property carrying the statically computed items-per-row count.
pub const ITEMS_PER_ROW: &str = "--b235-items-per-row";

/// Custom property exposing the threshold that produced the current count.
pub const BREAKPOINT_PROPERTY: &str = "--b235-breakpoint";

/// Prefix of the shared per-rank breakpoint tokens.
pub const TOKEN_PREFIX: &str = "--b235-bp-";

/// Class toggled on containers that need the structural fallback.
pub const RECOVER_CLASS: &str = "b235-recover";

/// Live attribute reflecting the observed items-per-row count.
pub const ITEMS_ATTRIBUTE: &str = "data-b235-items";

const CONTAINER_CLASS_PREFIX: &str = "b235-container-";
const SCOPE_PREFIX: &str = "b235cq-";

/// Unique class and size-query scope names assigned to one container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerScope {
    class_name: String,
    query_name: String,
}

impl ContainerScope {
    /// Names for the `index`-th computed container.
    pub fn numbered(index: usize) -> Self {
        let class_name = format!("{CONTAINER_CLASS_PREFIX}{index}");
        let query_name = format!("{SCOPE_PREFIX}{class_name}");
        Self {
            class_name,
            query_name,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    /// Selector matching the container itself.
    pub fn container_selector(&self) -> String {
        format!(".{}", self.class_name)
    }

    /// Selector matching the container's direct children.
    pub fn children_selector(&self) -> String {
        format!(".{} > *", self.class_name)
    }
}

/// How a conditional rule refers to its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakpointRef {
    /// The shared `--b235-bp-<rank>` token.
    Token(usize),
    /// A literal width, used when the rank's token holds another value.
    Literal(Rem),
}

impl BreakpointRef {
    pub fn to_css(&self) -> String {
        match self {
            BreakpointRef::Token(rank) => format!("var({TOKEN_PREFIX}{rank})"),
            BreakpointRef::Literal(rem) => rem.to_string(),
        }
    }
}

/// Shared breakpoint tokens keyed by rank.
///
/// Rank is the position from the end of a container's transition list: the
/// transition down to `r` items per row has rank `r`. The first container to
/// claim a rank defines its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenTable {
    tokens: BTreeMap<usize, Rem>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference for `width` at `rank`, declaring the token if the rank is free.
    pub fn resolve(&mut self, rank: usize, width: Rem) -> BreakpointRef {
        match self.tokens.get(&rank) {
            None => {
                self.tokens.insert(rank, width);
                BreakpointRef::Token(rank)
            }
            Some(existing) if *existing == width => BreakpointRef::Token(rank),
            Some(_) => BreakpointRef::Literal(width),
        }
    }

    pub fn get(&self, rank: usize) -> Option<Rem> {
        self.tokens.get(&rank).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token name for `rank`.
    pub fn name(rank: usize) -> String {
        format!("{TOKEN_PREFIX}{rank}")
    }

    /// The consolidated `:root` block, ranks ascending.
    pub fn to_rule(&self) -> Option<Rule> {
        if self.tokens.is_empty() {
            return None;
        }
        let rule = self
            .tokens
            .iter()
            .fold(Rule::new(":root"), |rule, (rank, width)| {
                rule.declare(Self::name(*rank), width)
            });
        Some(rule)
    }
}

/// Accumulates per-container rules and shared tokens for one stylesheet.
#[derive(Debug, Default)]
pub struct RuleGenerator {
    tokens: TokenTable,
    blocks: Vec<CssBlock>,
    containers: usize,
}

impl RuleGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the rules for one container.
    ///
    /// `thresholds` holds the normalized collision widths in packing order:
    /// `thresholds[k]` is the width at or below which `item_count - k` items
    /// no longer fit, so it lowers the indicator to `item_count - k - 1`.
    pub fn emit_container(&mut self, scope: &ContainerScope, item_count: usize, thresholds: &[Rem]) {
        if item_count == 0 {
            return;
        }
        debug_assert_eq!(thresholds.len(), item_count - 1);

        let children = scope.children_selector();
        self.blocks.push(CssBlock::Rule(
            Rule::new(children.clone()).declare(ITEMS_PER_ROW, item_count),
        ));

        for (items, width) in (2..=item_count).rev().zip(thresholds.iter().copied()) {
            let lowered = items - 1;
            let reference = self.tokens.resolve(lowered, width);
            trace!(
                container = scope.class_name(),
                items = lowered,
                %width,
                ?reference,
                "Emitting transition"
            );

            let mut rules = vec![Rule::new(children.clone())
                .declare(ITEMS_PER_ROW, lowered)
                .declare(BREAKPOINT_PROPERTY, reference.to_css())];

            // Last step: one item per row must never be held open by an
            // item's intrinsic minimum width.
            if items == 2 {
                rules.push(Rule::new(scope.container_selector()).declare("flex-wrap", "wrap"));
                rules.push(
                    Rule::new(children.clone())
                        .declare("--flex-shrink", 1)
                        .declare("min-width", 0)
                        .declare("width", "100%"),
                );
            }

            self.blocks.push(CssBlock::Container(ContainerQuery {
                scope: scope.query_name().to_string(),
                max_width: width,
                rules,
            }));
        }

        self.containers += 1;
        debug!(
            container = scope.class_name(),
            item_count,
            transitions = thresholds.len(),
            "Generated container rules"
        );
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn container_count(&self) -> usize {
        self.containers
    }

    /// Assemble the final stylesheet: recovery block, token block, container rules.
    pub fn finish(self) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        sheet.push(CssBlock::Comment(
            "B235 Recovery: structural safety net (applied dynamically)".to_string(),
        ));
        sheet.push(CssBlock::Rule(
            Rule::new(format!(".{RECOVER_CLASS}")).declare("overflow-x", "hidden"),
        ));
        sheet.push(CssBlock::Rule(
            Rule::new(format!(".{RECOVER_CLASS} > *"))
                .declare("min-width", 0)
                .declare("width", "100%")
                .declare("--flex-shrink", 1),
        ));
        if let Some(root) = self.tokens.to_rule() {
            sheet.push(CssBlock::Rule(root));
        }
        sheet.blocks.extend(self.blocks);
        sheet
    }
}
