//! # B235 CSS
//!
//! Style value parsing and the generated stylesheet for the B235 breakpoint
//! engine.
//!
//! ## Design Goals
//!
//! 1. **Lenient parsing**: Resolved style strings are read the way a browser's
//!    `parseFloat` reads them; anything unreadable becomes "no value"
//! 2. **Structured output**: Generated CSS is built as rules and container
//!    query blocks first, serialized once at the end
//! 3. **Root-relative widths**: Every generated width is expressed in `rem`

use std::fmt;

use smallvec::SmallVec;

pub mod rules;

pub use rules::{
    BreakpointRef, ContainerScope, RuleGenerator, TokenTable, BREAKPOINT_PROPERTY,
    ITEMS_ATTRIBUTE, ITEMS_PER_ROW, RECOVER_CLASS, TOKEN_PREFIX,
};

// ==================== Values ====================

/// A width normalized against the root font size.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Rem(pub f64);

impl Rem {
    /// Normalize a pixel width: the pixel sum is rounded up first so that
    /// fractional rendering can never land one pixel past the threshold.
    pub fn from_px(px: f64, epsilon_px: f64, root_font_size: f64) -> Self {
        Rem((px.ceil() + epsilon_px) / root_font_size)
    }

    pub fn to_px(self, root_font_size: f64) -> f64 {
        self.0 * root_font_size
    }
}

impl fmt::Display for Rem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}rem", self.0)
    }
}

/// Display values relevant to child eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Block,
    Inline,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    Contents,
    None,
}

impl Display {
    pub fn is_none(self) -> bool {
        matches!(self, Display::None)
    }
}

/// Position values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// Whether a box with this position still takes up room in its parent's row.
    pub fn is_in_flow(self) -> bool {
        matches!(self, Position::Static | Position::Relative | Position::Sticky)
    }
}

/// Parse the leading number of a resolved style value.
///
/// `"16px"` and `"16px 24px"` both read as `16`; `"normal"` and `""` read as
/// nothing. Units are ignored because resolved values are already pixels.
pub fn parse_px(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a pixel value, treating anything unreadable as zero.
pub fn px_or_zero(value: Option<&str>) -> f64 {
    value.and_then(parse_px).unwrap_or(0.0)
}

/// Resolve the horizontal gap of a container.
///
/// `column-gap` wins when it holds a number. Otherwise the first component of
/// the `gap` shorthand is used, and failing that the gap is zero.
pub fn resolve_gap(column_gap: Option<&str>, gap: Option<&str>) -> f64 {
    column_gap
        .and_then(parse_px)
        .or_else(|| gap.and_then(parse_px))
        .unwrap_or(0.0)
}

/// Parse a display value.
pub fn parse_display(value: &str) -> Option<Display> {
    match value.trim().to_lowercase().as_str() {
        "block" => Some(Display::Block),
        "inline" => Some(Display::Inline),
        "inline-block" => Some(Display::InlineBlock),
        "flex" => Some(Display::Flex),
        "inline-flex" => Some(Display::InlineFlex),
        "grid" => Some(Display::Grid),
        "inline-grid" => Some(Display::InlineGrid),
        "contents" => Some(Display::Contents),
        "none" => Some(Display::None),
        _ => None,
    }
}

/// Parse a position value.
pub fn parse_position(value: &str) -> Option<Position> {
    match value.trim().to_lowercase().as_str() {
        "static" => Some(Position::Static),
        "relative" => Some(Position::Relative),
        "absolute" => Some(Position::Absolute),
        "fixed" => Some(Position::Fixed),
        "sticky" => Some(Position::Sticky),
        _ => None,
    }
}

// ==================== Stylesheet ====================

/// A property/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl ToString) -> Self {
        Self {
            property: property.into(),
            value: value.to_string(),
        }
    }
}

/// A CSS rule (selector + declarations).
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub declarations: SmallVec<[Declaration; 4]>,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: SmallVec::new(),
        }
    }

    /// Builder-style declaration append.
    pub fn declare(mut self, property: impl Into<String>, value: impl ToString) -> Self {
        self.declarations.push(Declaration::new(property, value));
        self
    }

    /// Value of the last declaration of `property`, if any.
    pub fn value_of(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        writeln!(f, "{indent}{} {{", self.selector)?;
        for decl in &self.declarations {
            writeln!(f, "{indent}    {}: {};", decl.property, decl.value)?;
        }
        writeln!(f, "{indent}}}")
    }
}

/// An `@container <scope> (max-width: ...)` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerQuery {
    pub scope: String,
    pub max_width: Rem,
    pub rules: Vec<Rule>,
}

/// A top-level stylesheet entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CssBlock {
    Comment(String),
    Rule(Rule),
    Container(ContainerQuery),
}

/// A complete generated stylesheet.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stylesheet {
    pub blocks: Vec<CssBlock>,
}

impl Stylesheet {
    /// Create an empty stylesheet.
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn push(&mut self, block: CssBlock) {
        self.blocks.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All container query blocks, in order.
    pub fn container_queries(&self) -> impl Iterator<Item = &ContainerQuery> {
        self.blocks.iter().filter_map(|b| match b {
            CssBlock::Container(q) => Some(q),
            _ => None,
        })
    }

    /// All unconditional rules, in order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.blocks.iter().filter_map(|b| match b {
            CssBlock::Rule(r) => Some(r),
            _ => None,
        })
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            match block {
                CssBlock::Comment(text) => writeln!(f, "/* {text} */")?,
                CssBlock::Rule(rule) => rule.write_indented(f, "")?,
                CssBlock::Container(query) => {
                    writeln!(
                        f,
                        "@container {} (max-width: {}) {{",
                        query.scope, query.max_width
                    )?;
                    for rule in &query.rules {
                        rule.write_indented(f, "    ")?;
                    }
                    writeln!(f, "}}")?;
                }
            }
        }
        Ok(())
    }
}
