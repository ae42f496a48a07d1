//! Rendered grid and merge-region bookkeeping shared by the sheet passes.

use std::collections::BTreeMap;

use crate::spec::{EnumCellValue, SpecMergeRegion, SpecRowMarker};

static CELL_EMPTY: SpecGridCell = SpecGridCell {
    value: EnumCellValue::None,
    id_style: 0,
};

////////////////////////////////////////////////////////////////////////////////
// #region Grid

/// One rendered cell: value plus style-table id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecGridCell {
    pub value: EnumCellValue,
    pub id_style: usize,
}

/// Rows of rendered cells. Rows may be ragged; absent cells read as blank.
#[derive(Debug, Clone, Default)]
pub struct SpecGrid {
    rows: Vec<Vec<SpecGridCell>>,
}

impl SpecGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row and return its index.
    pub fn push_row(&mut self, row: Vec<SpecGridCell>) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length.
    pub fn n_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at `(row, col)`; out-of-range cells read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &SpecGridCell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&CELL_EMPTY)
    }

    /// Value at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> &EnumCellValue {
        &self.cell(row, col).value
    }

    /// Mutable cell, created blank on demand.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut SpecGridCell {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, SpecGridCell::default);
        }
        &mut cells[col]
    }

    /// Cells of one row (empty slice past the end).
    pub fn row(&self, row: usize) -> &[SpecGridCell] {
        self.rows.get(row).map_or(&[], Vec::as_slice)
    }

    /// Whether two rows hold equal values in `col`.
    pub fn if_values_match(&self, row_a: usize, row_b: usize, col: usize) -> bool {
        self.value(row_a, col) == self.value(row_b, col)
    }

    /// Whether the marker column of `row` contains the marker token.
    pub fn if_row_has_marker(&self, row: usize, marker: &SpecRowMarker) -> bool {
        match self.value(row, marker.col_marker) {
            EnumCellValue::None => false,
            EnumCellValue::String(val) => val.contains(&marker.token),
            value @ EnumCellValue::Number(_) => value.to_text().contains(&marker.token),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeRegionSet

/// Non-overlapping merge regions with a cell -> region index.
///
/// Regions may only grow downward by whole rows; they are never shrunk,
/// split or removed.
#[derive(Debug, Clone, Default)]
pub struct MergeRegionSet {
    l_regions: Vec<SpecMergeRegion>,
    dict_region_by_cell: BTreeMap<(usize, usize), usize>,
}

impl MergeRegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.l_regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_regions.is_empty()
    }

    /// Regions in creation order.
    pub fn regions(&self) -> &[SpecMergeRegion] {
        &self.l_regions
    }

    pub fn get(&self, idx: usize) -> Option<&SpecMergeRegion> {
        self.l_regions.get(idx)
    }

    /// Index of the region covering `(row, col)`.
    pub fn find_covering(&self, row: usize, col: usize) -> Option<usize> {
        self.dict_region_by_cell.get(&(row, col)).copied()
    }

    /// Whether an identical region already exists.
    pub fn contains(&self, region: &SpecMergeRegion) -> bool {
        self.find_covering(region.row_first, region.col_first)
            .and_then(|idx| self.l_regions.get(idx))
            .is_some_and(|existing| existing == region)
    }

    /// Whether any cell of `region` is already covered.
    pub fn if_any_covered(&self, region: &SpecMergeRegion) -> bool {
        (region.row_first..=region.row_last).any(|row| {
            (region.col_first..=region.col_last)
                .any(|col| self.dict_region_by_cell.contains_key(&(row, col)))
        })
    }

    /// Insert a region covering only free cells; returns its index, or `None`
    /// when it would overlap an existing region.
    pub fn insert(&mut self, region: SpecMergeRegion) -> Option<usize> {
        if self.if_any_covered(&region) {
            return None;
        }
        let idx = self.l_regions.len();
        for row in region.row_first..=region.row_last {
            for col in region.col_first..=region.col_last {
                self.dict_region_by_cell.insert((row, col), idx);
            }
        }
        self.l_regions.push(region);
        Some(idx)
    }

    /// Grow region `idx` by one row at the bottom. Returns `false` when the
    /// row below is not free or the region does not exist.
    pub fn extend_down(&mut self, idx: usize) -> bool {
        let Some(region) = self.l_regions.get(idx).copied() else {
            return false;
        };
        let row_next = region.row_last + 1;
        if (region.col_first..=region.col_last)
            .any(|col| self.dict_region_by_cell.contains_key(&(row_next, col)))
        {
            return false;
        }
        for col in region.col_first..=region.col_last {
            self.dict_region_by_cell.insert((row_next, col), idx);
        }
        self.l_regions[idx].row_last = row_next;
        true
    }

    /// Whether `(row, col)` is covered by a region anchored at another cell.
    pub fn if_covered_non_anchor(&self, row: usize, col: usize) -> bool {
        self.find_covering(row, col)
            .and_then(|idx| self.l_regions.get(idx))
            .is_some_and(|region| (region.row_first, region.col_first) != (row, col))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn text(val: &str) -> SpecGridCell {
        SpecGridCell {
            value: EnumCellValue::String(val.to_string()),
            id_style: 0,
        }
    }

    #[test]
    fn test_grid_missing_cells_read_blank_and_create_on_demand() {
        let mut grid = SpecGrid::new();
        grid.push_row(vec![text("A")]);

        assert_eq!(grid.value(0, 5), &EnumCellValue::None);
        assert_eq!(grid.value(3, 0), &EnumCellValue::None);

        grid.cell_mut(0, 2).id_style = 7;
        assert_eq!(grid.row(0).len(), 3);
        assert_eq!(grid.cell(0, 1).value, EnumCellValue::None);
        assert_eq!(grid.cell(0, 2).id_style, 7);
    }

    #[test]
    fn test_grid_marker_matches_substring() {
        let mut grid = SpecGrid::new();
        grid.push_row(vec![text("ProcA 小计")]);
        grid.push_row(vec![text("2024-01-01")]);
        let marker = SpecRowMarker {
            col_marker: 0,
            token: "小计".to_string(),
        };

        assert!(grid.if_row_has_marker(0, &marker));
        assert!(!grid.if_row_has_marker(1, &marker));
        assert!(!grid.if_row_has_marker(9, &marker));
    }

    #[test]
    fn test_region_set_rejects_overlap_and_extends_down() {
        let mut regions = MergeRegionSet::new();
        let idx = regions
            .insert(SpecMergeRegion::vertical(1, 2, 0))
            .expect("insert");

        assert!(regions.insert(SpecMergeRegion::horizontal(2, 0, 3)).is_none());
        assert!(regions.extend_down(idx));
        assert_eq!(regions.regions()[idx], SpecMergeRegion::vertical(1, 3, 0));
        assert_eq!(regions.find_covering(3, 0), Some(idx));
        assert!(regions.if_covered_non_anchor(2, 0));
        assert!(!regions.if_covered_non_anchor(1, 0));

        regions
            .insert(SpecMergeRegion::horizontal(4, 0, 2))
            .expect("insert horizontal");
        assert!(!regions.extend_down(idx));
        assert!(regions.contains(&SpecMergeRegion::horizontal(4, 0, 2)));
        assert!(!regions.contains(&SpecMergeRegion::horizontal(4, 0, 1)));
    }
}
