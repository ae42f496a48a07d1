//! XLSX writer kernel that maps compiled report sheets onto a workbook.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{info, warn};

use crate::compile::SpecCompiledSheet;
use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{EnumCellValue, ReportError, SpecCellFormat, SpecSheetWriteReport};
use crate::util::{create_sheet_identifier, sanitize_sheet_name};

/// Stateful workbook writer.
pub struct ReportXlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecSheetWriteReport>,
    if_closed: bool,
}

impl ReportXlsxWriter {
    /// Create writer bound to output path.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: PathBuf) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecSheetWriteReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), ReportError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        info!(file_out = %self.file_out(), n_sheets = self.l_reports.len(), "workbook saved");
        Ok(())
    }

    /// Serialize the workbook into memory without closing the writer.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, ReportError> {
        Ok(self.workbook.save_to_buffer()?)
    }

    /// Write one compiled sheet. Returns the final sheet name.
    pub fn write_compiled_sheet(
        &mut self,
        sheet: &SpecCompiledSheet,
        sheet_name: &str,
    ) -> Result<String, ReportError> {
        if self.if_closed {
            return Err(ReportError::WriterClosed);
        }

        let n_rows = sheet.grid.n_rows();
        let n_cols = usize::max(sheet.grid.n_cols(), sheet.widths.len());
        if n_rows > N_NROWS_EXCEL_MAX {
            return Err(ReportError::RowIndexOverflow(n_rows));
        }
        if n_cols > N_NCOLS_EXCEL_MAX {
            return Err(ReportError::ColumnIndexOverflow(n_cols));
        }

        let sheet_name_unique = self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        let l_formats: Vec<Format> = sheet
            .styles
            .formats()
            .iter()
            .map(derive_rust_xlsx_format)
            .collect();
        let fmt_default = Format::new();
        let fmt_of = |id_style: usize| l_formats.get(id_style).unwrap_or(&fmt_default);

        for row_idx in 0..n_rows {
            for (col_idx, cell) in sheet.grid.row(row_idx).iter().enumerate() {
                if sheet.regions.find_covering(row_idx, col_idx).is_some() {
                    continue;
                }
                write_cell_with_format(worksheet, row_idx, col_idx, &cell.value, fmt_of(cell.id_style))?;
            }
        }

        for region in sheet.regions.regions() {
            let cell_anchor = sheet.grid.cell(region.row_first, region.col_first);
            let format = fmt_of(cell_anchor.id_style);
            if region.is_single_cell() {
                write_cell_with_format(
                    worksheet,
                    region.row_first,
                    region.col_first,
                    &cell_anchor.value,
                    format,
                )?;
                continue;
            }
            let c_text = match &cell_anchor.value {
                EnumCellValue::String(val) => val.as_str(),
                EnumCellValue::None | EnumCellValue::Number(_) => "",
            };
            worksheet.merge_range(
                cast_row_num(region.row_first)?,
                cast_col_num(region.col_first)?,
                cast_row_num(region.row_last)?,
                cast_col_num(region.col_last)?,
                c_text,
                format,
            )?;
            if let EnumCellValue::Number(val) = cell_anchor.value {
                worksheet.write_number_with_format(
                    cast_row_num(region.row_first)?,
                    cast_col_num(region.col_first)?,
                    val,
                    format,
                )?;
            }
        }

        for (col_idx, n_width) in sheet.widths.iter().enumerate() {
            if let Some(n_width) = n_width {
                worksheet.set_column_width(cast_col_num(col_idx)?, *n_width as f64)?;
            }
        }

        if sheet.height_header > 0 {
            worksheet.set_freeze_panes(cast_row_num(sheet.height_header)?, 0)?;
        }

        for msg in &sheet.report.warnings {
            warn!(sheet = %sheet_name_unique, "{msg}");
        }
        info!(
            sheet = %sheet_name_unique,
            n_rows,
            n_cols,
            n_regions = sheet.regions.len(),
            "sheet written"
        );
        self.l_reports.push(SpecSheetWriteReport {
            sheet_name: sheet_name_unique.clone(),
            n_rows,
            n_cols,
            compile: sheet.report.clone(),
        });
        Ok(sheet_name_unique)
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(name, n_idx);
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), ReportError> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                val,
                format,
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                format,
            )?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, ReportError> {
    u32::try_from(value).map_err(|_| ReportError::RowIndexOverflow(value))
}

fn cast_col_num(value: usize) -> Result<u16, ReportError> {
    u16::try_from(value).map_err(|_| ReportError::ColumnIndexOverflow(value))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::compile::compile_production_report;
    use crate::conf::{N_COL_PROD_ACTUAL, derive_default_production_layout};
    use crate::record::ExportRecord;
    use crate::spec::SpecMergeRegion;

    fn sheet() -> SpecCompiledSheet {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        compile_production_report(
            vec![
                ExportRecord::new(date, "F1", "W1", "LineA", "ProcA").with_metrics(Some(10), Some(9)),
                ExportRecord::new(date, "F1", "W1", "LineA", "ProcA").with_metrics(Some(10), Some(11)),
            ],
            &derive_default_production_layout(),
        )
        .expect("compile")
    }

    #[test]
    fn test_sheet_names_are_sanitized_and_unique() {
        let sheet = sheet();
        let mut writer = ReportXlsxWriter::new(std::env::temp_dir().join("unused.xlsx"));

        assert_eq!(writer.write_compiled_sheet(&sheet, "日报/1").expect("w"), "日报_1");
        assert_eq!(writer.write_compiled_sheet(&sheet, "日报/1").expect("w"), "日报_1__2");
        assert_eq!(writer.write_compiled_sheet(&sheet, "日报:1").expect("w"), "日报_1__3");

        let l_reports = writer.report();
        assert_eq!(l_reports.len(), 3);
        assert_eq!(l_reports[0].n_rows, 4);
        assert_eq!(l_reports[0].n_cols, 19);
        assert_eq!(l_reports[0].compile.n_rows_summary, 1);
    }

    #[test]
    fn test_buffer_is_a_zip_package() {
        let mut writer = ReportXlsxWriter::new(std::env::temp_dir().join("unused.xlsx"));
        writer.write_compiled_sheet(&sheet(), "Daily").expect("write");
        let buf = writer.save_to_buffer().expect("buffer");
        assert!(buf.starts_with(b"PK"));
    }

    #[test]
    fn test_single_cell_region_is_written_as_plain_cell() {
        let mut sheet = sheet();
        sheet
            .regions
            .insert(SpecMergeRegion::vertical(1, 1, N_COL_PROD_ACTUAL))
            .expect("insert");

        let mut writer = ReportXlsxWriter::new(std::env::temp_dir().join("unused.xlsx"));
        writer.write_compiled_sheet(&sheet, "Daily").expect("write");
        assert!(writer.save_to_buffer().expect("buffer").starts_with(b"PK"));
    }

    #[test]
    fn test_write_after_close_fails() {
        let path = std::env::temp_dir().join(format!(
            "smtkit_report_writer_{}.xlsx",
            std::process::id()
        ));
        let mut writer = ReportXlsxWriter::new(path.clone());
        writer.write_compiled_sheet(&sheet(), "Daily").expect("write");
        writer.close().expect("close");
        writer.close().expect("close twice");
        assert!(path.exists());
        assert!(matches!(
            writer.write_compiled_sheet(&sheet(), "Again"),
            Err(ReportError::WriterClosed)
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_format_mapping_helpers() {
        assert!(matches!(derive_format_align(" VCenter "), Some(FormatAlign::VerticalCenter)));
        assert!(derive_format_align("sideways").is_none());
        assert!(matches!(derive_format_border(1), FormatBorder::Thin));
        assert!(matches!(cast_col_num(70_000), Err(ReportError::ColumnIndexOverflow(70_000))));
    }
}
