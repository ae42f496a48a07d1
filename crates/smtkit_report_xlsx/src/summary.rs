//! Horizontal label merges on summary rows.

use tracing::warn;

use crate::grid::{MergeRegionSet, SpecGrid};
use crate::spec::{SpecMergeRegion, SpecReportCompileReport, SpecSummarySpan};

/// What happened to one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSummaryMergeOutcome {
    /// Not a body row, or no marker token.
    NotSummary,
    /// Label span created.
    Created,
    /// Identical span already present.
    Exists,
    /// Span would overlap another region and was skipped.
    Blocked,
}

/// Merges the label span of every row whose marker cell carries the token.
#[derive(Debug, Clone)]
pub struct SummaryRowFormatter {
    span: SpecSummarySpan,
    height_header: usize,
}

impl SummaryRowFormatter {
    pub fn new(span: SpecSummarySpan, height_header: usize) -> Self {
        Self {
            span,
            height_header,
        }
    }

    /// Whether `row` is a body row flagged by the marker.
    pub fn if_summary_row(&self, grid: &SpecGrid, row: usize) -> bool {
        row >= self.height_header && grid.if_row_has_marker(row, &self.span.marker)
    }

    /// Process one row. Idempotent: a second call on the same row reports
    /// [`EnumSummaryMergeOutcome::Exists`] and changes nothing.
    pub fn apply_row(
        &self,
        grid: &SpecGrid,
        regions: &mut MergeRegionSet,
        row: usize,
        report: &mut SpecReportCompileReport,
    ) -> EnumSummaryMergeOutcome {
        if !self.if_summary_row(grid, row) {
            return EnumSummaryMergeOutcome::NotSummary;
        }

        let region = SpecMergeRegion::horizontal(row, self.span.col_start, self.span.col_end);
        if regions.contains(&region) {
            return EnumSummaryMergeOutcome::Exists;
        }
        if regions.insert(region).is_none() {
            warn!(row, "summary label span overlaps an existing merge region");
            report.warn(format!(
                "Summary row {row}: label span {}..={} overlaps an existing merge region; skipped.",
                self.span.col_start, self.span.col_end
            ));
            return EnumSummaryMergeOutcome::Blocked;
        }
        EnumSummaryMergeOutcome::Created
    }

    /// Run over every body row of an already rendered grid.
    pub fn apply_grid(
        &self,
        grid: &SpecGrid,
        regions: &mut MergeRegionSet,
        report: &mut SpecReportCompileReport,
    ) -> usize {
        (self.height_header..grid.n_rows())
            .filter(|row| {
                self.apply_row(grid, regions, *row, report) == EnumSummaryMergeOutcome::Created
            })
            .count()
    }
}
