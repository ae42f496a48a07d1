//! Report constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{
    SpecCellFormat, SpecColumnWidthPolicy, SpecMergePolicy, SpecReportLabels, SpecReportLayout,
    SpecRowMarker, SpecStyleOverlayPolicy, SpecSummaryFill, SpecSummarySpan,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Widest column Excel accepts, in character units.
pub const N_WIDTH_COLUMN_MAX: usize = 255;

/// Fill marking manually entered production fields.
pub const C_COLOR_FILL_MANUAL: &str = "#FFF2CC";
/// Fill marking subtotal rows.
pub const C_COLOR_FILL_SUMMARY: &str = "#DDEBF7";

////////////////////////////////////////////////////////////////////////////////
// #region ProductionDailyColumns

pub const N_COL_PROD_DATE: usize = 0;
pub const N_COL_PROD_FACTORY: usize = 1;
pub const N_COL_PROD_WORKSHOP: usize = 2;
pub const N_COL_PROD_LINE: usize = 3;
pub const N_COL_PROD_PROCESS: usize = 4;
pub const N_COL_PROD_SHIFT: usize = 5;
pub const N_COL_PROD_MACHINE: usize = 6;
pub const N_COL_PROD_PRODUCT: usize = 7;
pub const N_COL_PROD_SERIES: usize = 8;
pub const N_COL_PROD_CT: usize = 9;
pub const N_COL_PROD_EQUIPMENT: usize = 10;
pub const N_COL_PROD_RUN_MINUTES: usize = 11;
pub const N_COL_PROD_TARGET: usize = 12;
pub const N_COL_PROD_ACTUAL: usize = 13;
pub const N_COL_PROD_GAP: usize = 14;
pub const N_COL_PROD_RATE: usize = 15;
pub const N_COL_PROD_DOWN_MINUTES: usize = 16;
pub const N_COL_PROD_FA: usize = 17;
pub const N_COL_PROD_CA: usize = 18;

/// Production daily report header titles.
pub const TUP_HEADER_PRODUCTION: [&str; 19] = [
    "日期",
    "厂区",
    "车间",
    "线别",
    "制程段",
    "班别",
    "机台号",
    "生产料号",
    "系列",
    "CT",
    "目前投入设备量",
    "投产时间(min)",
    "目标产能(K)",
    "实际产出",
    "GAP",
    "达成率",
    "理论Down机时间(min)",
    "FA",
    "CA",
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RepairRecordColumns

pub const N_COL_REPAIR_FACTORY: usize = 0;
pub const N_COL_REPAIR_WORKSHOP: usize = 1;
pub const N_COL_REPAIR_LINE: usize = 2;
pub const N_COL_REPAIR_OCCUR_AT: usize = 3;
pub const N_COL_REPAIR_SHIFT: usize = 4;
pub const N_COL_REPAIR_MODEL: usize = 5;
pub const N_COL_REPAIR_MACHINE: usize = 6;
pub const N_COL_REPAIR_CATEGORY: usize = 7;
pub const N_COL_REPAIR_TYPE: usize = 8;
pub const N_COL_REPAIR_DESC: usize = 9;
pub const N_COL_REPAIR_SOLUTION: usize = 10;
pub const N_COL_REPAIR_IS_FIXED: usize = 11;
pub const N_COL_REPAIR_FIXED_AT: usize = 12;
pub const N_COL_REPAIR_MINUTES: usize = 13;
pub const N_COL_REPAIR_TEAM: usize = 14;
pub const N_COL_REPAIR_RESPONSIBLE: usize = 15;
pub const N_COL_REPAIR_PEOPLE: usize = 16;

/// Repair record report header titles.
pub const TUP_HEADER_REPAIR: [&str; 17] = [
    "厂区",
    "车间",
    "线别",
    "发生时间",
    "班次",
    "机型",
    "机台号",
    "异常类别",
    "异常分类",
    "异常描述",
    "解决对策",
    "是否修复",
    "修复时间",
    "维修耗时(分)",
    "组别",
    "责任人",
    "维修人",
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

/// Build default named format presets used by the sheet compiler.
pub fn derive_default_report_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("等线".to_string()),
        font_size: Some(11),
        border: Some(1),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert("text".to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        "header".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "integer".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            align: Some("right".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "decimal".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0.00".to_string()),
            align: Some("right".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Production daily layout: grouped merge over date/factory/workshop/line,
/// process subtotals labelled across the descriptive columns.
pub fn derive_default_production_layout() -> SpecReportLayout {
    let labels = SpecReportLabels::default();
    let marker_summary = SpecRowMarker {
        col_marker: N_COL_PROD_DATE,
        token: labels.summary_token.clone(),
    };

    SpecReportLayout {
        header_grid: vec![TUP_HEADER_PRODUCTION.iter().map(ToString::to_string).collect()],
        cols_integer: vec![
            N_COL_PROD_EQUIPMENT,
            N_COL_PROD_RUN_MINUTES,
            N_COL_PROD_TARGET,
            N_COL_PROD_ACTUAL,
            N_COL_PROD_GAP,
            N_COL_PROD_DOWN_MINUTES,
        ],
        cols_decimal: vec![N_COL_PROD_CT],
        policy_merge: Some(
            SpecMergePolicy::grouped(
                vec![
                    N_COL_PROD_DATE,
                    N_COL_PROD_FACTORY,
                    N_COL_PROD_WORKSHOP,
                    N_COL_PROD_LINE,
                    N_COL_PROD_PROCESS,
                ],
                vec![
                    N_COL_PROD_DATE,
                    N_COL_PROD_FACTORY,
                    N_COL_PROD_WORKSHOP,
                    N_COL_PROD_LINE,
                ],
            )
            .with_marker_skip(marker_summary.clone()),
        ),
        summary_span: Some(SpecSummarySpan {
            marker: marker_summary.clone(),
            col_start: N_COL_PROD_DATE,
            col_end: N_COL_PROD_RUN_MINUTES,
        }),
        policy_style: SpecStyleOverlayPolicy {
            cols_fill: vec![
                N_COL_PROD_ACTUAL,
                N_COL_PROD_DOWN_MINUTES,
                N_COL_PROD_FA,
                N_COL_PROD_CA,
            ],
            color_fill: C_COLOR_FILL_MANUAL.to_string(),
            marker_summary: Some(marker_summary),
            summary_fill: Some(SpecSummaryFill {
                col_start: N_COL_PROD_DATE,
                col_end: N_COL_PROD_CA,
                color: C_COLOR_FILL_SUMMARY.to_string(),
            }),
            cols_center: vec![
                N_COL_PROD_DATE,
                N_COL_PROD_FACTORY,
                N_COL_PROD_WORKSHOP,
                N_COL_PROD_LINE,
                N_COL_PROD_PROCESS,
                N_COL_PROD_SHIFT,
            ],
        },
        policy_width: SpecColumnWidthPolicy::default(),
        labels,
    }
}

/// Repair record layout: cascading merge over factory/workshop/line.
pub fn derive_default_repair_layout() -> SpecReportLayout {
    SpecReportLayout {
        header_grid: vec![TUP_HEADER_REPAIR.iter().map(ToString::to_string).collect()],
        cols_integer: vec![N_COL_REPAIR_MINUTES],
        cols_decimal: vec![],
        policy_merge: Some(SpecMergePolicy::cascade(vec![
            N_COL_REPAIR_FACTORY,
            N_COL_REPAIR_WORKSHOP,
            N_COL_REPAIR_LINE,
        ])),
        summary_span: None,
        policy_style: SpecStyleOverlayPolicy {
            cols_center: vec![
                N_COL_REPAIR_FACTORY,
                N_COL_REPAIR_WORKSHOP,
                N_COL_REPAIR_LINE,
                N_COL_REPAIR_SHIFT,
                N_COL_REPAIR_IS_FIXED,
            ],
            ..Default::default()
        },
        policy_width: SpecColumnWidthPolicy::default(),
        labels: SpecReportLabels {
            shift_day: "白班".to_string(),
            shift_night: "夜班".to_string(),
            ..Default::default()
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
