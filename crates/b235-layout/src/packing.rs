//! Worst-case packing of container children.
//!
//! DOM order, not size order, decides which children end up sharing a row,
//! so the only width that is safe for `i` items per row is the width of the
//! `i` widest children side by side. Sorting once and taking prefix sums
//! gives every such width in a single pass:
//!
//! ```text
//! widths  [60, 100, 50, 80]   gap 10
//! sorted  [100, 80, 60, 50]
//! prefix  [0, 100, 180, 240, 290]
//! i = 4 -> 290 + 3*10 = 320
//! i = 3 -> 240 + 2*10 = 260
//! i = 2 -> 180 + 1*10 = 190
//! ```
//!
//! This is deliberately pessimistic: rows whose widest children are never
//! adjacent break earlier than they strictly need to.

use b235_css::Rem;
use smallvec::SmallVec;

/// Raw collision widths in pixels, for `i = n` down to `i = 2`.
///
/// Entry `k` is the room needed for the `n - k` widest children plus the gaps
/// between them. Fewer than two children yield no transitions. Negative
/// widths and a negative gap are treated as zero.
pub fn collision_widths(child_widths: &[f64], gap: f64) -> Vec<f64> {
    let n = child_widths.len();
    if n < 2 {
        return Vec::new();
    }
    let gap = gap.max(0.0);

    let mut sorted: SmallVec<[f64; 16]> = child_widths.iter().map(|w| w.max(0.0)).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut prefix: SmallVec<[f64; 16]> = SmallVec::with_capacity(n + 1);
    prefix.push(0.0);
    for (k, width) in sorted.iter().enumerate() {
        prefix.push(prefix[k] + width);
    }

    (2..=n)
        .rev()
        .map(|i| prefix[i] + (i - 1) as f64 * gap)
        .collect()
}

/// One transition: at or below `width`, `items` children no longer fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Item count that stops fitting; the indicator drops to `items - 1`.
    pub items: usize,
    /// Raw pixel sum before normalization.
    pub px: f64,
    /// Normalized threshold.
    pub width: Rem,
}

/// The retained breakpoint list of one container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakpoints {
    item_count: usize,
    /// Sorted by width, smallest first (i.e. `items == 2` first).
    ascending: SmallVec<[Collision; 8]>,
}

impl Breakpoints {
    /// Pack `child_widths` and normalize every collision width against
    /// `root_font_size`.
    pub fn compute(child_widths: &[f64], gap: f64, root_font_size: f64, epsilon_px: f64) -> Self {
        let item_count = child_widths.len();
        let mut ascending: SmallVec<[Collision; 8]> = collision_widths(child_widths, gap)
            .into_iter()
            .zip((2..=item_count).rev())
            .map(|(px, items)| Collision {
                items,
                px,
                width: Rem::from_px(px, epsilon_px, root_font_size),
            })
            .collect();
        ascending.reverse();

        Self {
            item_count,
            ascending,
        }
    }

    /// Number of eligible children the list was computed for.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_empty(&self) -> bool {
        self.ascending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ascending.len()
    }

    /// Collisions in packing order, `items = n` first.
    pub fn descending(&self) -> impl Iterator<Item = &Collision> {
        self.ascending.iter().rev()
    }

    /// Collisions smallest first.
    pub fn ascending(&self) -> &[Collision] {
        &self.ascending
    }

    /// Normalized thresholds in packing order, as the rule generator takes them.
    pub fn thresholds(&self) -> Vec<Rem> {
        self.descending().map(|c| c.width).collect()
    }

    /// Items per row for a container whose content box is `content_width` px.
    ///
    /// Every threshold at or above the current width has been crossed, and
    /// each crossing removes one item.
    pub fn items_for_width(&self, content_width: f64, root_font_size: f64) -> usize {
        let width = content_width / root_font_size;
        let first_crossed = self.ascending.partition_point(|c| c.width.0 < width);
        let crossed = self.ascending.len() - first_crossed;
        self.item_count - crossed
    }
}
