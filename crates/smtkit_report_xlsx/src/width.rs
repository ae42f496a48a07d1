//! Incremental column auto-width.

use crate::spec::{EnumCellValue, SpecColumnWidthPolicy};

/// Display length: Latin-1 characters count 1, everything else 2.
pub fn estimate_display_length(value: &str) -> usize {
    value
        .chars()
        .map(|chr| if u32::from(chr) <= 0xFF { 1 } else { 2 })
        .sum()
}

/// Tracks the widest padded display length seen per column.
///
/// Widths only grow within one render pass.
#[derive(Debug, Clone)]
pub struct ColumnWidthEstimator {
    policy: SpecColumnWidthPolicy,
    l_width_by_col: Vec<Option<usize>>,
}

impl ColumnWidthEstimator {
    pub fn new(policy: SpecColumnWidthPolicy) -> Self {
        Self {
            policy,
            l_width_by_col: Vec::new(),
        }
    }

    /// Record one written cell. Blank body cells are ignored; returns whether
    /// the column width grew.
    pub fn observe(&mut self, col: usize, value: &EnumCellValue) -> bool {
        if value.is_blank() {
            return false;
        }
        self.observe_text(col, &value.to_text())
    }

    /// Record one header text (counted even when empty).
    pub fn observe_text(&mut self, col: usize, text: &str) -> bool {
        let n_width = usize::min(
            self.policy.width_max,
            usize::max(1, estimate_display_length(text) + self.policy.width_padding),
        );
        if self.l_width_by_col.len() <= col {
            self.l_width_by_col.resize(col + 1, None);
        }
        match self.l_width_by_col[col] {
            Some(n_width_prev) if n_width_prev >= n_width => false,
            _ => {
                self.l_width_by_col[col] = Some(n_width);
                true
            }
        }
    }

    /// Current width of `col`, if any cell was observed there.
    pub fn width(&self, col: usize) -> Option<usize> {
        self.l_width_by_col.get(col).copied().flatten()
    }

    /// Final widths for columns `0..n_cols`.
    pub fn widths(&self, n_cols: usize) -> Vec<Option<usize>> {
        (0..n_cols).map(|col| self.width(col)).collect()
    }
}
