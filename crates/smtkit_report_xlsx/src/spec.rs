//! Shared report specification models.

use polars::prelude::PolarsError;
use rust_xlsxwriter::XlsxError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification used as the style model of a compiled sheet.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Solid background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Rendered cell value. Merge decisions compare these typed values, so
/// `Number(90.0)` and `String("90")` never count as equal.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Build a text cell; `None` input yields a blank cell.
    pub fn from_text(value: Option<&str>) -> Self {
        match value {
            Some(val) => EnumCellValue::String(val.to_string()),
            None => EnumCellValue::None,
        }
    }

    /// Build a numeric cell from a nullable integer.
    pub fn from_integer(value: Option<i64>) -> Self {
        match value {
            Some(val) => EnumCellValue::Number(val as f64),
            None => EnumCellValue::None,
        }
    }

    /// Whether the cell holds no value.
    pub fn is_blank(&self) -> bool {
        matches!(self, EnumCellValue::None)
    }

    /// Display text as a spreadsheet would show it.
    ///
    /// Whole numbers render without a fractional part (`150`, not `150.0`).
    pub fn to_text(&self) -> String {
        match self {
            EnumCellValue::None => String::new(),
            EnumCellValue::String(val) => val.clone(),
            EnumCellValue::Number(val) => val.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeRegionSpecification

/// Inclusive rectangular merge region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecMergeRegion {
    /// First row (inclusive).
    pub row_first: usize,
    /// Last row (inclusive).
    pub row_last: usize,
    /// First column (inclusive).
    pub col_first: usize,
    /// Last column (inclusive).
    pub col_last: usize,
}

impl SpecMergeRegion {
    /// Row-spanning region in one column.
    pub fn vertical(row_first: usize, row_last: usize, col: usize) -> Self {
        Self {
            row_first,
            row_last,
            col_first: col,
            col_last: col,
        }
    }

    /// Column-spanning region in one row.
    pub fn horizontal(row: usize, col_first: usize, col_last: usize) -> Self {
        Self {
            row_first: row,
            row_last: row,
            col_first,
            col_last,
        }
    }

    /// Whether the region spans exactly one column.
    pub fn is_vertical(&self) -> bool {
        self.col_first == self.col_last
    }

    /// Whether the region spans exactly one row and more than one column.
    pub fn is_horizontal(&self) -> bool {
        self.row_first == self.row_last && self.col_first != self.col_last
    }

    /// Whether the region covers a single cell.
    pub fn is_single_cell(&self) -> bool {
        self.row_first == self.row_last && self.col_first == self.col_last
    }

    /// Whether `(row, col)` lies inside the region.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_first..=self.row_last).contains(&row)
            && (self.col_first..=self.col_last).contains(&col)
    }

    /// Whether two regions share at least one cell.
    pub fn intersects(&self, other: &SpecMergeRegion) -> bool {
        self.row_first <= other.row_last
            && other.row_first <= self.row_last
            && self.col_first <= other.col_last
            && other.col_first <= self.col_last
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutSpecification

/// Identifies summary rows by a token inside a marker column's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRowMarker {
    /// Column inspected for the token.
    pub col_marker: usize,
    /// Substring that flags the row.
    pub token: String,
}

/// Which columns decide whether a merge column may join the row above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumMergeGroupRule {
    /// Every column left of the merge column (`0..col`) must match.
    LeftColumns,
    /// Only the listed determinant columns must match.
    Explicit(Vec<usize>),
}

/// Vertical merge policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecMergePolicy {
    /// Columns whose repeated values are merged.
    pub cols_merge: Vec<usize>,
    /// Determinant rule.
    pub rule_group: EnumMergeGroupRule,
    /// Rows carrying this marker never join a vertical region.
    pub marker_skip: Option<SpecRowMarker>,
}

impl SpecMergePolicy {
    /// Cascading policy: a column merges only when all columns to its left match.
    pub fn cascade(cols_merge: Vec<usize>) -> Self {
        Self {
            cols_merge,
            rule_group: EnumMergeGroupRule::LeftColumns,
            marker_skip: None,
        }
    }

    /// Grouped policy with explicit determinant columns.
    pub fn grouped(cols_merge: Vec<usize>, cols_group: Vec<usize>) -> Self {
        Self {
            cols_merge,
            rule_group: EnumMergeGroupRule::Explicit(cols_group),
            marker_skip: None,
        }
    }

    /// Attach a skip marker.
    pub fn with_marker_skip(mut self, marker: SpecRowMarker) -> Self {
        self.marker_skip = Some(marker);
        self
    }
}

/// Horizontal label span applied to summary rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSummarySpan {
    /// Summary row detection rule.
    pub marker: SpecRowMarker,
    /// Span start column (inclusive).
    pub col_start: usize,
    /// Span end column (inclusive).
    pub col_end: usize,
}

/// Fill applied over a column range of summary rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSummaryFill {
    /// Range start column (inclusive).
    pub col_start: usize,
    /// Range end column (inclusive).
    pub col_end: usize,
    /// Opaque color identifier (e.g. `#DDEBF7`).
    pub color: String,
}

/// Conditional style overlay policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecStyleOverlayPolicy {
    /// Columns filled on data rows.
    pub cols_fill: Vec<usize>,
    /// Fill color for `cols_fill`.
    pub color_fill: String,
    /// Summary row detection rule; rows without it are data rows.
    pub marker_summary: Option<SpecRowMarker>,
    /// Fill for summary rows.
    pub summary_fill: Option<SpecSummaryFill>,
    /// Columns centered horizontally and vertically on every body row.
    pub cols_center: Vec<usize>,
}

/// Column auto-width policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecColumnWidthPolicy {
    /// Width padding added to the display length.
    pub width_padding: usize,
    /// Maximum final width.
    pub width_max: usize,
}

impl Default for SpecColumnWidthPolicy {
    fn default() -> Self {
        Self {
            width_padding: 1,
            width_max: 255,
        }
    }
}

/// Fixed display labels substituted while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecReportLabels {
    /// Day shift label.
    pub shift_day: String,
    /// Night shift label.
    pub shift_night: String,
    /// "Fixed" label for repair records.
    pub fixed_yes: String,
    /// "Not fixed" label for repair records.
    pub fixed_no: String,
    /// Text shown for an undefined achievement rate.
    pub placeholder: String,
    /// Word appended to summary row labels; doubles as the marker token.
    pub summary_token: String,
    /// Separator joining repair people names.
    pub people_separator: String,
}

impl Default for SpecReportLabels {
    fn default() -> Self {
        Self {
            shift_day: "白".to_string(),
            shift_night: "夜".to_string(),
            fixed_yes: "是".to_string(),
            fixed_no: "否".to_string(),
            placeholder: "-".to_string(),
            summary_token: "小计".to_string(),
            people_separator: "、".to_string(),
        }
    }
}

/// Complete layout of one report sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecReportLayout {
    /// Header rows; every row must be as wide as the body.
    pub header_grid: Vec<Vec<String>>,
    /// Integer-formatted columns.
    #[serde(default)]
    pub cols_integer: Vec<usize>,
    /// Decimal-formatted columns.
    #[serde(default)]
    pub cols_decimal: Vec<usize>,
    /// Vertical merge policy.
    #[serde(default)]
    pub policy_merge: Option<SpecMergePolicy>,
    /// Summary label span.
    #[serde(default)]
    pub summary_span: Option<SpecSummarySpan>,
    /// Style overlay policy.
    #[serde(default)]
    pub policy_style: SpecStyleOverlayPolicy,
    /// Column width policy.
    #[serde(default)]
    pub policy_width: SpecColumnWidthPolicy,
    /// Display labels.
    #[serde(default)]
    pub labels: SpecReportLabels,
}

impl SpecReportLayout {
    /// Number of header rows (the merge boundary).
    pub fn height_header(&self) -> usize {
        self.header_grid.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.header_grid.first().map_or(0, Vec::len)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-compile report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReportCompileReport {
    /// Data rows written.
    pub n_rows_data: usize,
    /// Summary rows written.
    pub n_rows_summary: usize,
    /// Vertical merge regions in the final set.
    pub n_regions_vertical: usize,
    /// Horizontal merge regions in the final set.
    pub n_regions_horizontal: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecReportCompileReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Per-sheet writer report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetWriteReport {
    /// Final (sanitized, unique) sheet name.
    pub sheet_name: String,
    /// Rows written, header included.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Compile counters and warnings of the written sheet.
    pub compile: SpecReportCompileReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised by layout validation, record decoding and workbook output.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Layout references columns or values that cannot work.
    #[error("invalid report layout: {0}")]
    InvalidLayout(String),
    /// A required source column is absent.
    #[error("Column not found: {0:?}")]
    ColumnNotFound(String),
    /// A source value cannot be decoded.
    #[error("Failed to decode record field {field:?} at row {row}: {message}")]
    FieldDecode {
        /// Source column name.
        field: String,
        /// Zero-based source row.
        row: usize,
        /// Decoder message.
        message: String,
    },
    /// Polars failed to read or access a frame.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    /// JSON record payload is malformed.
    #[error("json decode error: {0}")]
    Json(#[from] serde_json::Error),
    /// Row index does not fit the spreadsheet row type.
    #[error("row index overflow: {0}")]
    RowIndexOverflow(usize),
    /// Column index does not fit the spreadsheet column type.
    #[error("column index overflow: {0}")]
    ColumnIndexOverflow(usize),
    /// Workbook serialization failed.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Writer already flushed.
    #[error("Cannot write after close().")]
    WriterClosed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
