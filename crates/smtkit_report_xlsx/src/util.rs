//! Stateless helper utilities used by the report compiler and writer.

use std::collections::BTreeSet;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::SpecCellFormat;

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx: usize) -> String {
    let c_sheet_name_suffix = format!("__{part_idx}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnFormats

/// Per-column base formats: integer and decimal columns get their presets,
/// everything else is text.
pub fn plan_column_formats(
    width_data: usize,
    cols_integer: &[usize],
    cols_decimal: &[usize],
    fmt_text: &SpecCellFormat,
    fmt_integer: &SpecCellFormat,
    fmt_decimal: &SpecCellFormat,
) -> Vec<SpecCellFormat> {
    let set_cols_integer: BTreeSet<usize> = cols_integer.iter().copied().collect();
    let set_cols_decimal: BTreeSet<usize> = cols_decimal.iter().copied().collect();

    (0..width_data)
        .map(|col_idx| {
            if set_cols_integer.contains(&col_idx) {
                fmt_integer.clone()
            } else if set_cols_decimal.contains(&col_idx) {
                fmt_decimal.clone()
            } else {
                fmt_text.clone()
            }
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
