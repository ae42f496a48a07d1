//! Vertical "ditto" merges derived from rendered cell values.
//!
//! Both merge flavours share one decision function. They differ only in
//! which determinant columns must match between a row and the row above:
//! - cascade (`EnumMergeGroupRule::LeftColumns`): every column left of the
//!   merge column,
//! - grouped (`EnumMergeGroupRule::Explicit`): a fixed list, optionally
//!   guarded by a skip marker that keeps summary rows out of every region.

use std::borrow::Cow;

use tracing::debug;

use crate::grid::{MergeRegionSet, SpecGrid};
use crate::spec::{EnumMergeGroupRule, SpecMergePolicy, SpecMergeRegion};

/// Outcome of one merge decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMergeAction {
    /// Leave the cell alone.
    None,
    /// Start a new two-row region `(row - 1, row, col)`.
    Create,
    /// Grow the region with this index down to `row`.
    Extend(usize),
}

impl SpecMergePolicy {
    /// Determinant columns for merge column `col`.
    pub fn derive_group_columns(&self, col: usize) -> Cow<'_, [usize]> {
        match &self.rule_group {
            EnumMergeGroupRule::LeftColumns => Cow::Owned((0..col).collect()),
            EnumMergeGroupRule::Explicit(cols) => Cow::Borrowed(cols.as_slice()),
        }
    }

    /// Whether rows `row - 1` and `row` may share vertical regions at all.
    ///
    /// Rows at or above the header boundary (`row <= height_header`) never
    /// merge, so regions never reach into the header.
    pub fn if_rows_joinable(&self, grid: &SpecGrid, row: usize, height_header: usize) -> bool {
        if row <= height_header || row >= grid.n_rows() {
            return false;
        }
        match &self.marker_skip {
            Some(marker) => {
                !grid.if_row_has_marker(row, marker) && !grid.if_row_has_marker(row - 1, marker)
            }
            None => true,
        }
    }

    /// Decide whether cell `(row, col)` merges with the region ending above it.
    pub fn decide(
        &self,
        grid: &SpecGrid,
        regions: &MergeRegionSet,
        row: usize,
        col: usize,
        height_header: usize,
    ) -> EnumMergeAction {
        if !self.if_rows_joinable(grid, row, height_header) {
            return EnumMergeAction::None;
        }
        if !grid.if_values_match(row, row - 1, col) {
            return EnumMergeAction::None;
        }
        if !self
            .derive_group_columns(col)
            .iter()
            .all(|col_group| grid.if_values_match(row, row - 1, *col_group))
        {
            return EnumMergeAction::None;
        }
        if regions.find_covering(row, col).is_some() {
            return EnumMergeAction::None;
        }

        match regions.find_covering(row - 1, col) {
            None => EnumMergeAction::Create,
            Some(idx) => match regions.get(idx) {
                Some(region) if region.is_vertical() && region.row_last == row - 1 => {
                    EnumMergeAction::Extend(idx)
                }
                _ => EnumMergeAction::None,
            },
        }
    }
}

/// Applies a [`SpecMergePolicy`] one row at a time.
#[derive(Debug, Clone)]
pub struct MergeRegionTracker {
    policy: SpecMergePolicy,
    height_header: usize,
    l_cols_merge: Vec<usize>,
}

impl MergeRegionTracker {
    pub fn new(policy: SpecMergePolicy, height_header: usize) -> Self {
        let mut l_cols_merge = policy.cols_merge.clone();
        l_cols_merge.sort_unstable();
        l_cols_merge.dedup();
        Self {
            policy,
            height_header,
            l_cols_merge,
        }
    }

    pub fn policy(&self) -> &SpecMergePolicy {
        &self.policy
    }

    /// Process row `row` once it is fully written. Returns the number of
    /// cells merged into regions.
    pub fn apply_row(&self, grid: &SpecGrid, regions: &mut MergeRegionSet, row: usize) -> usize {
        if !self.policy.if_rows_joinable(grid, row, self.height_header) {
            return 0;
        }

        let mut n_merged = 0;
        for col in &self.l_cols_merge {
            match self
                .policy
                .decide(grid, regions, row, *col, self.height_header)
            {
                EnumMergeAction::None => {}
                EnumMergeAction::Create => {
                    if regions
                        .insert(SpecMergeRegion::vertical(row - 1, row, *col))
                        .is_some()
                    {
                        debug!(row_first = row - 1, col = *col, "merge region created");
                        n_merged += 1;
                    }
                }
                EnumMergeAction::Extend(idx) => {
                    if regions.extend_down(idx) {
                        n_merged += 1;
                    }
                }
            }
        }
        n_merged
    }

    /// Run over every body row of an already rendered grid.
    pub fn apply_grid(&self, grid: &SpecGrid, regions: &mut MergeRegionSet) -> usize {
        (self.height_header + 1..grid.n_rows())
            .map(|row| self.apply_row(grid, regions, row))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SpecGridCell;
    use crate::spec::{EnumCellValue, SpecRowMarker};

    fn build_grid(rows: &[&[&str]]) -> SpecGrid {
        let mut grid = SpecGrid::new();
        for row in rows {
            grid.push_row(
                row.iter()
                    .map(|val| SpecGridCell {
                        value: if val.is_empty() {
                            EnumCellValue::None
                        } else {
                            EnumCellValue::String(val.to_string())
                        },
                        id_style: 0,
                    })
                    .collect(),
            );
        }
        grid
    }

    fn marker() -> SpecRowMarker {
        SpecRowMarker {
            col_marker: 0,
            token: "Total".to_string(),
        }
    }

    fn assert_same_column_regions_disjoint(regions: &MergeRegionSet) {
        let l_regions = regions.regions();
        for (n_idx, region_a) in l_regions.iter().enumerate() {
            for region_b in &l_regions[n_idx + 1..] {
                assert!(!region_a.intersects(region_b), "{region_a:?} vs {region_b:?}");
            }
        }
    }

    #[test]
    fn test_grouped_merges_group_columns_but_not_differing_process() {
        let grid = build_grid(&[
            &["Date", "Site", "Shop", "Line", "Proc"],
            &["2024-01-01", "F1", "W1", "LineA", "ProcA"],
            &["2024-01-01", "F1", "W1", "LineA", "ProcB"],
        ]);
        let tracker = MergeRegionTracker::new(
            SpecMergePolicy::grouped(vec![0, 1, 2, 3, 4], vec![0, 1, 2, 3]),
            1,
        );
        let mut regions = MergeRegionSet::new();
        tracker.apply_grid(&grid, &mut regions);

        let mut l_regions = regions.regions().to_vec();
        l_regions.sort();
        assert_eq!(
            l_regions,
            (0..4)
                .map(|col| SpecMergeRegion::vertical(1, 2, col))
                .collect::<Vec<_>>()
        );
        assert!(regions.find_covering(2, 4).is_none());
    }

    #[test]
    fn test_grouped_extends_existing_region_downward() {
        let grid = build_grid(&[
            &["Date", "Line", "Proc"],
            &["D1", "LineA", "ProcA"],
            &["D1", "LineA", "ProcA"],
            &["D1", "LineA", "ProcA"],
            &["D1", "LineB", "ProcA"],
        ]);
        let tracker =
            MergeRegionTracker::new(SpecMergePolicy::grouped(vec![0, 1, 2], vec![0, 1]), 1);
        let mut regions = MergeRegionSet::new();
        tracker.apply_grid(&grid, &mut regions);

        let mut l_regions = regions.regions().to_vec();
        l_regions.sort();
        assert_eq!(
            l_regions,
            vec![
                SpecMergeRegion::vertical(1, 3, 0),
                SpecMergeRegion::vertical(1, 3, 1),
                SpecMergeRegion::vertical(1, 3, 2),
            ]
        );
    }

    #[test]
    fn test_grouped_skip_marker_keeps_summary_rows_out() {
        let grid = build_grid(&[
            &["Date", "Line", "Proc"],
            &["D1", "LineA", "ProcA"],
            &["D1", "LineA", "ProcA"],
            &["ProcA Total", "", ""],
            &["ProcB Total", "", ""],
            &["D1", "LineA", "ProcA"],
        ]);
        let tracker = MergeRegionTracker::new(
            SpecMergePolicy::grouped(vec![0, 1, 2], vec![1]).with_marker_skip(marker()),
            1,
        );
        let mut regions = MergeRegionSet::new();
        tracker.apply_grid(&grid, &mut regions);

        for region in regions.regions() {
            assert!(region.row_last < 3, "{region:?} touches a summary row");
        }
        assert_eq!(regions.len(), 3);
        assert_same_column_regions_disjoint(&regions);
    }

    #[test]
    fn test_cascade_blocks_merge_when_parent_column_changes() {
        let grid = build_grid(&[
            &["Date", "Shift"],
            &["D1", "Day"],
            &["D2", "Day"],
            &["D2", "Day"],
        ]);
        let tracker = MergeRegionTracker::new(SpecMergePolicy::cascade(vec![0, 1]), 1);
        let mut regions = MergeRegionSet::new();
        tracker.apply_grid(&grid, &mut regions);

        let mut l_regions = regions.regions().to_vec();
        l_regions.sort();
        assert_eq!(
            l_regions,
            vec![
                SpecMergeRegion::vertical(2, 3, 0),
                SpecMergeRegion::vertical(2, 3, 1),
            ]
        );
    }

    #[test]
    fn test_first_body_row_never_joins_header() {
        let grid = build_grid(&[&["Same"], &["Same"], &["Same"]]);
        let tracker = MergeRegionTracker::new(SpecMergePolicy::cascade(vec![0]), 1);
        let mut regions = MergeRegionSet::new();

        assert_eq!(tracker.apply_row(&grid, &mut regions, 1), 0);
        assert_eq!(tracker.apply_row(&grid, &mut regions, 2), 1);
        assert_eq!(regions.regions(), &[SpecMergeRegion::vertical(1, 2, 0)]);
    }

    #[test]
    fn test_typed_values_do_not_merge_across_types() {
        let mut grid = build_grid(&[&["H"], &["90"]]);
        grid.push_row(vec![SpecGridCell {
            value: EnumCellValue::Number(90.0),
            id_style: 0,
        }]);
        let policy = SpecMergePolicy::cascade(vec![0]);
        let regions = MergeRegionSet::new();

        assert_eq!(
            policy.decide(&grid, &regions, 2, 0, 1),
            EnumMergeAction::None
        );
    }

    #[test]
    fn test_covered_cell_is_not_merged_again() {
        let grid = build_grid(&[&["H", "H"], &["A", "B"], &["A", "B"]]);
        let policy = SpecMergePolicy::cascade(vec![0, 1]);
        let mut regions = MergeRegionSet::new();
        regions
            .insert(SpecMergeRegion::horizontal(2, 0, 1))
            .expect("insert");

        assert_eq!(
            policy.decide(&grid, &regions, 2, 0, 1),
            EnumMergeAction::None
        );
        assert_eq!(
            policy.decide(&grid, &regions, 2, 1, 1),
            EnumMergeAction::None
        );
    }
}
