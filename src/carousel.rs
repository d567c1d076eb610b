//! Map the flat library index onto carousel rows.
//!
//! Left/right always walk the flat index, crossing row boundaries. Only
//! up/down are row-aware: they keep the column and clamp it to the length
//! of the destination row.
use std::ops::Range;

use bevy::log::warn;

/// Vertical movement between carousel rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStep {
    Previous,
    Next,
}

/// Row-start offsets of the library carousels.
///
/// Always valid: empty (a single flat row) or strictly increasing from `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarouselRows {
    offsets: Vec<usize>,
}
impl CarouselRows {
    /// Rows starting at `offsets`.
    ///
    /// Offsets that aren't strictly increasing from `0` are rejected, we
    /// then fall back to a single flat row.
    pub fn new(offsets: Vec<usize>) -> Self {
        let starts_at_zero = offsets.first().map_or(true, |&first| first == 0);
        let increasing = offsets.windows(2).all(|pair| pair[0] < pair[1]);
        if starts_at_zero && increasing {
            CarouselRows { offsets }
        } else {
            warn!(
                "Carousel offsets {offsets:?} must be strictly increasing and start at 0, \
                 treating the library as a single row"
            );
            CarouselRows::default()
        }
    }

    /// Whether up/down should move between rows at all.
    pub fn is_multi_row(&self) -> bool {
        self.offsets.len() > 1
    }

    /// The row `index` falls in: the last row starting at or before it.
    pub fn row_of(&self, index: usize) -> usize {
        self.offsets.partition_point(|&offset| offset <= index).saturating_sub(1)
    }

    /// The position of `index` within its row.
    pub fn column_of(&self, index: usize) -> usize {
        let start = self.offsets.get(self.row_of(index)).copied().unwrap_or(0);
        index - start.min(index)
    }

    /// Flat indices of `row`, given `item_count` items in total.
    pub fn row_range(&self, row: usize, item_count: usize) -> Range<usize> {
        let start = self.offsets.get(row).copied().unwrap_or(0).min(item_count);
        let end = self
            .offsets
            .get(row + 1)
            .copied()
            .unwrap_or(item_count)
            .min(item_count);
        start..end.max(start)
    }

    /// Index in the adjacent row at the same column, clamped to that row.
    ///
    /// `None` when there is no such row or it holds no items.
    pub fn step(&self, index: usize, step: RowStep, item_count: usize) -> Option<usize> {
        if !self.is_multi_row() {
            return None;
        }
        let row = self.row_of(index);
        let target_row = match step {
            RowStep::Previous => row.checked_sub(1)?,
            RowStep::Next if row + 1 < self.offsets.len() => row + 1,
            RowStep::Next => return None,
        };
        let target = self.row_range(target_row, item_count);
        if target.is_empty() {
            return None;
        }
        let column = self.column_of(index);
        Some((target.start + column).min(target.end - 1))
    }
}
