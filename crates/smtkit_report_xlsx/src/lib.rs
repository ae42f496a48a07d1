//! `smtkit_report_xlsx` v1:
//! tabular report compiler for SMT production and repair exports.
//!
//! Architecture:
//! - `conf`      : constants, column layouts and default presets
//! - `spec`      : specs/models/errors
//! - `record`    : source record models
//! - `source`    : records from polars frames, IPC payloads and JSON
//! - `aggregate` : streaming group aggregation into data and summary rows
//! - `render`    : rows to typed cell values
//! - `grid`      : rendered grid and merge-region set
//! - `merge`     : vertical merge tracking
//! - `summary`   : summary row label spans
//! - `style`     : style table and overlays
//! - `width`     : column width estimation
//! - `compile`   : per-row pass driver
//! - `util`      : pure helper functions
//! - `writer`    : workbook writer kernel
pub mod aggregate;
pub mod compile;
pub mod conf;
pub mod grid;
pub mod merge;
pub mod record;
pub mod render;
pub mod source;
pub mod spec;
pub mod style;
pub mod summary;
pub mod util;
pub mod width;
pub mod writer;

pub use aggregate::{
    EnumReportRow, GroupAggregator, SpecGroupKey, SpecRunningTotal, SpecSummaryRow,
    aggregate_export_records,
};
pub use compile::{
    ReportSheetCompiler, SpecCompiledSheet, compile_production_report, compile_repair_report,
    derive_layout_warnings, validate_report_layout,
};
pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_production_layout, derive_default_repair_layout,
};
pub use grid::{MergeRegionSet, SpecGrid, SpecGridCell};
pub use merge::{EnumMergeAction, MergeRegionTracker};
pub use record::{EnumShiftCode, ExportRecord, RepairRecord};
pub use source::{
    derive_export_records_from_dataframe, derive_export_records_from_ipc_bytes,
    derive_export_records_from_json, derive_repair_records_from_json,
};
pub use spec::{
    EnumCellValue, EnumMergeGroupRule, ReportError, SpecCellFormat, SpecColumnWidthPolicy,
    SpecMergePolicy, SpecMergeRegion, SpecReportCompileReport, SpecReportLabels,
    SpecReportLayout, SpecRowMarker, SpecSheetWriteReport, SpecStyleOverlayPolicy,
    SpecSummaryFill, SpecSummarySpan,
};
pub use style::{EnumStyleOverlay, SpecStyleTable, StyleOverlay};
pub use summary::{EnumSummaryMergeOutcome, SummaryRowFormatter};
pub use util::sanitize_sheet_name;
pub use width::{ColumnWidthEstimator, estimate_display_length};
pub use writer::ReportXlsxWriter;
