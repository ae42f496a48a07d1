//! Sheet compiler: rendered rows in, merged/styled/sized grid out.
//!
//! Every pushed body row runs the passes in a fixed order:
//! merge -> summary -> style -> width. Each pass reads the values already
//! written, so later rows never change earlier decisions except by growing
//! a vertical region downward.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::aggregate::{EnumReportRow, GroupAggregator};
use crate::conf::{N_WIDTH_COLUMN_MAX, derive_default_report_formats};
use crate::grid::{MergeRegionSet, SpecGrid, SpecGridCell};
use crate::merge::MergeRegionTracker;
use crate::record::{ExportRecord, RepairRecord};
use crate::render::{render_production_row, render_repair_record};
use crate::spec::{
    EnumCellValue, ReportError, SpecCellFormat, SpecReportCompileReport, SpecReportLayout,
    SpecRowMarker,
};
use crate::style::{SpecStyleTable, StyleOverlay};
use crate::summary::SummaryRowFormatter;
use crate::util::plan_column_formats;
use crate::width::ColumnWidthEstimator;

////////////////////////////////////////////////////////////////////////////////
// #region Models

/// Finished sheet handed to the workbook writer.
#[derive(Debug, Clone)]
pub struct SpecCompiledSheet {
    /// Header and body cells.
    pub grid: SpecGrid,
    /// Final merge regions.
    pub regions: MergeRegionSet,
    /// Style table referenced by cell style ids.
    pub styles: SpecStyleTable,
    /// Column widths; `None` keeps the spreadsheet default.
    pub widths: Vec<Option<usize>>,
    /// Number of header rows.
    pub height_header: usize,
    /// Counters and warnings.
    pub report: SpecReportCompileReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Validation

fn validate_column(n_col: usize, width: usize, what: &str) -> Result<(), ReportError> {
    if n_col >= width {
        return Err(ReportError::InvalidLayout(format!(
            "{what} column {n_col} is outside the layout width {width}."
        )));
    }
    Ok(())
}

fn validate_marker(marker: &SpecRowMarker, width: usize, what: &str) -> Result<(), ReportError> {
    validate_column(marker.col_marker, width, what)?;
    if marker.token.is_empty() {
        return Err(ReportError::InvalidLayout(format!(
            "{what} marker token must be non-empty."
        )));
    }
    Ok(())
}

fn validate_range(
    col_start: usize,
    col_end: usize,
    width: usize,
    what: &str,
) -> Result<(), ReportError> {
    if col_start > col_end {
        return Err(ReportError::InvalidLayout(format!(
            "{what} range {col_start}..={col_end} is reversed."
        )));
    }
    validate_column(col_end, width, what)
}

/// Check a layout before any row is compiled.
pub fn validate_report_layout(layout: &SpecReportLayout) -> Result<(), ReportError> {
    let width = layout.width();
    if width == 0 {
        return Err(ReportError::InvalidLayout(
            "header_grid must contain at least one non-empty row.".to_string(),
        ));
    }
    if layout.header_grid.iter().any(|row| row.len() != width) {
        return Err(ReportError::InvalidLayout(
            "All header rows must have the same number of columns.".to_string(),
        ));
    }

    for n_col in layout.cols_integer.iter().chain(&layout.cols_decimal) {
        validate_column(*n_col, width, "Number format")?;
    }
    let set_cols_integer: BTreeSet<&usize> = layout.cols_integer.iter().collect();
    if let Some(n_col) = layout.cols_decimal.iter().find(|c| set_cols_integer.contains(c)) {
        return Err(ReportError::InvalidLayout(format!(
            "Column {n_col} cannot be both integer and decimal."
        )));
    }

    if let Some(policy) = &layout.policy_merge {
        for n_col in &policy.cols_merge {
            validate_column(*n_col, width, "Merge")?;
        }
        for n_col in policy.derive_group_columns(0).iter() {
            validate_column(*n_col, width, "Merge group")?;
        }
        if let Some(marker) = &policy.marker_skip {
            validate_marker(marker, width, "Merge skip")?;
        }
    }

    if let Some(span) = &layout.summary_span {
        validate_marker(&span.marker, width, "Summary")?;
        validate_range(span.col_start, span.col_end, width, "Summary span")?;
        if span.col_start == span.col_end {
            return Err(ReportError::InvalidLayout(format!(
                "Summary span must cover at least two columns, got {}..={}.",
                span.col_start, span.col_end
            )));
        }
    }

    let policy_style = &layout.policy_style;
    for n_col in policy_style.cols_fill.iter().chain(&policy_style.cols_center) {
        validate_column(*n_col, width, "Style")?;
    }
    if let Some(marker) = &policy_style.marker_summary {
        validate_marker(marker, width, "Style summary")?;
    }
    if let Some(fill) = &policy_style.summary_fill {
        if policy_style.marker_summary.is_none() {
            return Err(ReportError::InvalidLayout(
                "summary_fill requires marker_summary.".to_string(),
            ));
        }
        validate_range(fill.col_start, fill.col_end, width, "Summary fill")?;
    }

    let policy_width = &layout.policy_width;
    if !(1..=N_WIDTH_COLUMN_MAX).contains(&policy_width.width_max) {
        return Err(ReportError::InvalidLayout(format!(
            "width_max must be in 1..={N_WIDTH_COLUMN_MAX}, got {}.",
            policy_width.width_max
        )));
    }

    Ok(())
}

/// Non-fatal layout issues: summary markers that disagree between passes.
pub fn derive_layout_warnings(layout: &SpecReportLayout) -> Vec<String> {
    let mut l_warnings = Vec::new();
    let marker_span = layout.summary_span.as_ref().map(|span| &span.marker);
    let marker_skip = layout
        .policy_merge
        .as_ref()
        .and_then(|policy| policy.marker_skip.as_ref());
    let marker_style = layout.policy_style.marker_summary.as_ref();

    let l_markers = [
        ("merge skip", marker_skip),
        ("summary span", marker_span),
        ("style summary", marker_style),
    ];
    let l_present: Vec<(&str, &SpecRowMarker)> = l_markers
        .iter()
        .filter_map(|(what, marker)| marker.map(|m| (*what, m)))
        .collect();
    if let Some((what_first, marker_first)) = l_present.first() {
        for (what, marker) in &l_present[1..] {
            if *marker != *marker_first {
                l_warnings.push(format!(
                    "{what} marker {marker:?} differs from {what_first} marker {marker_first:?}."
                ));
            }
        }
    }
    l_warnings
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Compiler

/// Incremental compiler for one sheet.
#[derive(Debug)]
pub struct ReportSheetCompiler {
    width: usize,
    height_header: usize,
    grid: SpecGrid,
    regions: MergeRegionSet,
    styles: SpecStyleTable,
    l_id_style_by_col: Vec<usize>,
    tracker: Option<MergeRegionTracker>,
    formatter: Option<SummaryRowFormatter>,
    overlay: StyleOverlay,
    estimator: ColumnWidthEstimator,
    report: SpecReportCompileReport,
}

impl ReportSheetCompiler {
    /// Validate `layout` and write its header rows.
    pub fn new(layout: &SpecReportLayout) -> Result<Self, ReportError> {
        validate_report_layout(layout)?;

        let width = layout.width();
        let height_header = layout.height_header();
        let dict_fmt = derive_default_report_formats();
        let fmt_of = |key: &str| -> SpecCellFormat { dict_fmt.get(key).cloned().unwrap_or_default() };

        let mut styles = SpecStyleTable::new();
        let id_header = styles.intern(fmt_of("header"));
        let l_id_style_by_col: Vec<usize> = plan_column_formats(
            width,
            &layout.cols_integer,
            &layout.cols_decimal,
            &fmt_of("text"),
            &fmt_of("integer"),
            &fmt_of("decimal"),
        )
        .into_iter()
        .map(|fmt| styles.intern(fmt))
        .collect();

        let mut compiler = Self {
            width,
            height_header,
            grid: SpecGrid::new(),
            regions: MergeRegionSet::new(),
            styles,
            l_id_style_by_col,
            tracker: layout
                .policy_merge
                .clone()
                .map(|policy| MergeRegionTracker::new(policy, height_header)),
            formatter: layout
                .summary_span
                .clone()
                .map(|span| SummaryRowFormatter::new(span, height_header)),
            overlay: StyleOverlay::new(layout.policy_style.clone(), height_header),
            estimator: ColumnWidthEstimator::new(layout.policy_width),
            report: SpecReportCompileReport::default(),
        };
        for msg in derive_layout_warnings(layout) {
            warn!("{msg}");
            compiler.report.warn(msg);
        }
        compiler.write_header(layout, id_header);
        Ok(compiler)
    }

    fn write_header(&mut self, layout: &SpecReportLayout, id_header: usize) {
        for row_values in &layout.header_grid {
            let l_cells = row_values
                .iter()
                .map(|title| SpecGridCell {
                    value: if title.is_empty() {
                        EnumCellValue::None
                    } else {
                        EnumCellValue::String(title.clone())
                    },
                    id_style: id_header,
                })
                .collect();
            self.grid.push_row(l_cells);
            for (col, title) in row_values.iter().enumerate() {
                self.estimator.observe_text(col, title);
            }
        }
    }

    pub fn height_header(&self) -> usize {
        self.height_header
    }

    /// Current grid, header included.
    pub fn grid(&self) -> &SpecGrid {
        &self.grid
    }

    /// Append one rendered body row and run every pass on it. Returns the
    /// row index.
    pub fn push_row(&mut self, values: Vec<EnumCellValue>) -> usize {
        if values.len() > self.width {
            self.report.warn(format!(
                "Row {} has {} values, layout width is {}; extra values kept.",
                self.grid.n_rows(),
                values.len(),
                self.width
            ));
        }
        let id_text = self.l_id_style_by_col.first().copied().unwrap_or(0);
        let l_cells = values
            .into_iter()
            .enumerate()
            .map(|(col, value)| SpecGridCell {
                value,
                id_style: self.l_id_style_by_col.get(col).copied().unwrap_or(id_text),
            })
            .collect();
        let row = self.grid.push_row(l_cells);

        if let Some(tracker) = &self.tracker {
            tracker.apply_row(&self.grid, &mut self.regions, row);
        }
        if let Some(formatter) = &self.formatter {
            formatter.apply_row(&self.grid, &mut self.regions, row, &mut self.report);
        }
        self.overlay.apply_row(&mut self.grid, &mut self.styles, row);
        for (col, cell) in self.grid.row(row).iter().enumerate() {
            self.estimator.observe(col, &cell.value);
        }

        row
    }

    /// Close the sheet and count regions.
    pub fn finish(mut self) -> SpecCompiledSheet {
        let l_regions = self.regions.regions();
        self.report.n_regions_vertical = l_regions
            .iter()
            .filter(|region| region.is_vertical() && region.row_first != region.row_last)
            .count();
        self.report.n_regions_horizontal = l_regions
            .iter()
            .filter(|region| region.is_horizontal())
            .count();

        let n_cols = usize::max(self.width, self.grid.n_cols());
        debug!(
            n_rows = self.grid.n_rows(),
            n_regions = self.regions.len(),
            n_styles = self.styles.len(),
            "sheet compiled"
        );
        SpecCompiledSheet {
            widths: self.estimator.widths(n_cols),
            grid: self.grid,
            regions: self.regions,
            styles: self.styles,
            height_header: self.height_header,
            report: self.report,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Reports

/// Aggregate sorted production records and compile the daily sheet.
pub fn compile_production_report(
    records: impl IntoIterator<Item = ExportRecord>,
    layout: &SpecReportLayout,
) -> Result<SpecCompiledSheet, ReportError> {
    let mut compiler = ReportSheetCompiler::new(layout)?;
    let mut aggregator = GroupAggregator::new();
    let mut l_rows_pending = Vec::new();
    let (mut n_rows_data, mut n_rows_summary) = (0_usize, 0_usize);

    let mut drain_rows = |compiler: &mut ReportSheetCompiler, l_rows: &mut Vec<EnumReportRow>| {
        for row in l_rows.drain(..) {
            if row.is_summary() {
                n_rows_summary += 1;
            } else {
                n_rows_data += 1;
            }
            compiler.push_row(render_production_row(&row, layout));
        }
    };

    for record in records {
        aggregator.push(record, &mut l_rows_pending);
        drain_rows(&mut compiler, &mut l_rows_pending);
    }
    aggregator.finish(&mut l_rows_pending);
    drain_rows(&mut compiler, &mut l_rows_pending);

    let mut sheet = compiler.finish();
    sheet.report.n_rows_data = n_rows_data;
    sheet.report.n_rows_summary = n_rows_summary;
    info!(
        n_rows_data,
        n_rows_summary,
        n_regions = sheet.regions.len(),
        "production report compiled"
    );
    Ok(sheet)
}

/// Compile the repair ticket sheet; records keep their given order.
pub fn compile_repair_report(
    records: impl IntoIterator<Item = RepairRecord>,
    layout: &SpecReportLayout,
) -> Result<SpecCompiledSheet, ReportError> {
    let mut compiler = ReportSheetCompiler::new(layout)?;
    let mut n_rows_data = 0_usize;
    for record in records {
        compiler.push_row(render_repair_record(&record, &layout.labels));
        n_rows_data += 1;
    }

    let mut sheet = compiler.finish();
    sheet.report.n_rows_data = n_rows_data;
    info!(n_rows_data, n_regions = sheet.regions.len(), "repair report compiled");
    Ok(sheet)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
