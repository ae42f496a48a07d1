//! Row renderers: records and summaries to typed grid values.
//!
//! Renderers only decide cell values. Styling, merging and widths are
//! applied afterwards by the sheet compiler, which reads the values back.

use crate::aggregate::{
    EnumReportRow, SpecSummaryRow, calculate_achievement_rate, calculate_gap,
    format_achievement_rate,
};
use crate::conf::*;
use crate::record::{ExportRecord, RepairRecord};
use crate::spec::{EnumCellValue, SpecReportLabels, SpecReportLayout};

const C_FMT_DATE: &str = "%Y-%m-%d";
const C_FMT_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

fn text(value: &Option<String>) -> EnumCellValue {
    EnumCellValue::from_text(value.as_deref())
}

/// Render one aggregated production row into `layout.width()` values.
pub fn render_production_row(row: &EnumReportRow, layout: &SpecReportLayout) -> Vec<EnumCellValue> {
    match row {
        EnumReportRow::Data(record) => render_production_record(record, &layout.labels),
        EnumReportRow::Summary(summary) => {
            let col_label = layout
                .summary_span
                .as_ref()
                .map_or(N_COL_PROD_DATE, |span| span.marker.col_marker);
            render_production_summary(summary, &layout.labels, col_label)
        }
    }
}

/// Data row: the record as-is, with its own gap and achievement rate.
pub fn render_production_record(
    record: &ExportRecord,
    labels: &SpecReportLabels,
) -> Vec<EnumCellValue> {
    let mut l_values = vec![EnumCellValue::None; TUP_HEADER_PRODUCTION.len()];

    l_values[N_COL_PROD_DATE] =
        EnumCellValue::String(record.prod_date.format(C_FMT_DATE).to_string());
    l_values[N_COL_PROD_FACTORY] = EnumCellValue::String(record.factory_name.clone());
    l_values[N_COL_PROD_WORKSHOP] = EnumCellValue::String(record.workshop_name.clone());
    l_values[N_COL_PROD_LINE] = EnumCellValue::String(record.line_name.clone());
    l_values[N_COL_PROD_PROCESS] = EnumCellValue::String(record.process_name.clone());
    l_values[N_COL_PROD_SHIFT] =
        EnumCellValue::from_text(record.shift.as_ref().map(|shift| shift.label(labels)));
    l_values[N_COL_PROD_MACHINE] = text(&record.machine_no);
    l_values[N_COL_PROD_PRODUCT] = text(&record.product_code);
    l_values[N_COL_PROD_SERIES] = text(&record.series_name);
    l_values[N_COL_PROD_CT] = record.ct.map_or(EnumCellValue::None, EnumCellValue::Number);
    l_values[N_COL_PROD_EQUIPMENT] = EnumCellValue::from_integer(record.equipment_count);
    l_values[N_COL_PROD_RUN_MINUTES] = EnumCellValue::from_integer(record.run_minutes);
    l_values[N_COL_PROD_TARGET] = EnumCellValue::from_integer(record.target_output);
    l_values[N_COL_PROD_ACTUAL] = EnumCellValue::from_integer(record.actual_output);
    l_values[N_COL_PROD_GAP] =
        EnumCellValue::from_integer(calculate_gap(record.target_output, record.actual_output));
    l_values[N_COL_PROD_RATE] = EnumCellValue::String(format_achievement_rate(
        calculate_achievement_rate(record.target_output, record.actual_output),
        &labels.placeholder,
    ));
    l_values[N_COL_PROD_DOWN_MINUTES] = EnumCellValue::from_integer(record.down_minutes);
    l_values[N_COL_PROD_FA] = text(&record.fa);
    l_values[N_COL_PROD_CA] = text(&record.ca);

    l_values
}

/// Summary row: `"<process> <token>"` in the label column, then the totals.
pub fn render_production_summary(
    summary: &SpecSummaryRow,
    labels: &SpecReportLabels,
    col_label: usize,
) -> Vec<EnumCellValue> {
    let mut l_values = vec![EnumCellValue::None; TUP_HEADER_PRODUCTION.len()];
    if col_label >= l_values.len() {
        l_values.resize(col_label + 1, EnumCellValue::None);
    }

    l_values[col_label] = EnumCellValue::String(format!(
        "{} {}",
        summary.key.leaf(),
        labels.summary_token
    ));
    l_values[N_COL_PROD_TARGET] = EnumCellValue::from_integer(summary.total.target);
    l_values[N_COL_PROD_ACTUAL] = EnumCellValue::from_integer(summary.total.actual);
    l_values[N_COL_PROD_GAP] = EnumCellValue::from_integer(summary.gap);
    l_values[N_COL_PROD_RATE] = EnumCellValue::String(summary.rate_text(&labels.placeholder));

    l_values
}

/// Repair ticket row.
pub fn render_repair_record(record: &RepairRecord, labels: &SpecReportLabels) -> Vec<EnumCellValue> {
    let mut l_values = vec![EnumCellValue::None; TUP_HEADER_REPAIR.len()];

    l_values[N_COL_REPAIR_FACTORY] = EnumCellValue::String(record.factory_name.clone());
    l_values[N_COL_REPAIR_WORKSHOP] = EnumCellValue::String(record.workshop_name.clone());
    l_values[N_COL_REPAIR_LINE] = EnumCellValue::String(record.line_name.clone());
    l_values[N_COL_REPAIR_OCCUR_AT] =
        EnumCellValue::String(record.occur_at.format(C_FMT_DATETIME).to_string());
    l_values[N_COL_REPAIR_SHIFT] =
        EnumCellValue::from_text(record.shift.as_ref().map(|shift| shift.label(labels)));
    l_values[N_COL_REPAIR_MODEL] = text(&record.model_name);
    l_values[N_COL_REPAIR_MACHINE] = text(&record.machine_no);
    l_values[N_COL_REPAIR_CATEGORY] = text(&record.abnormal_category_name);
    l_values[N_COL_REPAIR_TYPE] = text(&record.abnormal_type_name);
    l_values[N_COL_REPAIR_DESC] = text(&record.abnormal_desc);
    l_values[N_COL_REPAIR_SOLUTION] = text(&record.solution);
    l_values[N_COL_REPAIR_IS_FIXED] = EnumCellValue::String(if record.is_fixed {
        labels.fixed_yes.clone()
    } else {
        labels.fixed_no.clone()
    });
    l_values[N_COL_REPAIR_FIXED_AT] = EnumCellValue::from_text(
        record
            .fixed_at
            .map(|fixed_at| fixed_at.format(C_FMT_DATETIME).to_string())
            .as_deref(),
    );
    l_values[N_COL_REPAIR_MINUTES] = EnumCellValue::from_integer(record.repair_minutes);
    l_values[N_COL_REPAIR_TEAM] = text(&record.team_name);
    l_values[N_COL_REPAIR_RESPONSIBLE] = text(&record.responsible_person_name);
    if !record.repair_person_names.is_empty() {
        l_values[N_COL_REPAIR_PEOPLE] =
            EnumCellValue::String(record.repair_person_names.join(&labels.people_separator));
    }

    l_values
}
