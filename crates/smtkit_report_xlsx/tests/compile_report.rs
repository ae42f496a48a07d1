use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, NaiveDateTime};
use smtkit_report_xlsx::conf::{
    N_COL_PROD_ACTUAL, N_COL_PROD_GAP, N_COL_PROD_PROCESS, N_COL_PROD_RATE, N_COL_PROD_TARGET,
    N_COL_REPAIR_FACTORY, N_COL_REPAIR_LINE, N_COL_REPAIR_WORKSHOP,
};
use smtkit_report_xlsx::{
    EnumCellValue, EnumShiftCode, ExportRecord, ReportXlsxWriter, RepairRecord, SpecMergeRegion,
    compile_production_report, compile_repair_report, derive_default_production_layout,
    derive_default_repair_layout, derive_export_records_from_json,
};
use tracing_subscriber::{EnvFilter, fmt};

fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new() -> Self {
        let n = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("smtkit_report_test_{n}"));
        std::fs::create_dir_all(&path).expect("create test dir");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn record(date: u32, line: &str, process: &str, target: i64, actual: i64) -> ExportRecord {
    let mut rec = ExportRecord::new(
        NaiveDate::from_ymd_opt(2024, 1, date).expect("date"),
        "F1",
        "W1",
        line,
        process,
    )
    .with_metrics(Some(target), Some(actual));
    rec.shift = Some(EnumShiftCode::Day);
    rec
}

fn repair(line: &str, hour: u32) -> RepairRecord {
    RepairRecord {
        occur_at: NaiveDateTime::parse_from_str(
            &format!("2024-03-05 {hour:02}:00:00"),
            "%Y-%m-%d %H:%M:%S",
        )
        .expect("datetime"),
        shift: Some(EnumShiftCode::Night),
        factory_name: "F1".into(),
        workshop_name: "W1".into(),
        line_name: line.into(),
        model_name: None,
        machine_no: None,
        abnormal_category_name: Some("设备".into()),
        abnormal_type_name: None,
        abnormal_desc: None,
        solution: None,
        is_fixed: false,
        fixed_at: None,
        repair_minutes: Some(30),
        team_name: None,
        responsible_person_name: None,
        repair_person_names: vec![],
    }
}

#[test]
fn production_report_end_to_end() {
    init_test();
    let tmp = TestDir::new();
    let path_out = tmp.path().join("daily.xlsx");

    let sheet = compile_production_report(
        vec![
            record(1, "LineA", "ProcA", 100, 90),
            record(1, "LineA", "ProcA", 50, 60),
            record(1, "LineA", "ProcB", 20, 20),
            record(1, "LineB", "ProcA", 0, 10),
            record(2, "LineA", "ProcA", 10, 5),
        ],
        &derive_default_production_layout(),
    )
    .expect("compile");

    assert_eq!(sheet.report.n_rows_data, 5);
    assert_eq!(sheet.report.n_rows_summary, 4);
    assert_eq!(sheet.grid.n_rows(), 10);

    // summaries of the first line follow its data rows
    assert_eq!(
        sheet.grid.value(4, 0),
        &EnumCellValue::String("ProcA 小计".into())
    );
    assert_eq!(sheet.grid.value(4, N_COL_PROD_TARGET), &EnumCellValue::Number(150.0));
    assert_eq!(sheet.grid.value(4, N_COL_PROD_ACTUAL), &EnumCellValue::Number(150.0));
    assert_eq!(sheet.grid.value(4, N_COL_PROD_GAP), &EnumCellValue::Number(0.0));
    assert_eq!(
        sheet.grid.value(4, N_COL_PROD_RATE),
        &EnumCellValue::String("100.00%".into())
    );
    assert_eq!(
        sheet.grid.value(5, 0),
        &EnumCellValue::String("ProcB 小计".into())
    );
    // zero target
    assert_eq!(
        sheet.grid.value(7, N_COL_PROD_RATE),
        &EnumCellValue::String("-".into())
    );

    // no vertical region touches a summary row, and none crosses a line change
    for region in sheet.regions.regions() {
        if region.is_vertical() && region.row_first != region.row_last {
            for row in region.row_first..=region.row_last {
                assert!(
                    !matches!(sheet.grid.value(row, 0), EnumCellValue::String(val) if val.contains("小计")),
                    "{region:?}"
                );
            }
        }
    }
    assert!(sheet.regions.contains(&SpecMergeRegion::vertical(1, 2, N_COL_PROD_PROCESS)));
    assert!(sheet.regions.find_covering(6, 0).is_none());

    let mut writer = ReportXlsxWriter::new(path_out.clone());
    assert_eq!(writer.write_compiled_sheet(&sheet, "生产日报").expect("write"), "生产日报");
    let buf = writer.save_to_buffer().expect("buffer");
    assert!(buf.starts_with(b"PK"));
    writer.close().expect("close");
    assert!(path_out.exists());
}

#[test]
fn repair_report_cascades_over_location_columns() {
    init_test();
    let sheet = compile_repair_report(
        vec![
            repair("LineA", 8),
            repair("LineA", 9),
            repair("LineB", 10),
        ],
        &derive_default_repair_layout(),
    )
    .expect("compile");

    assert_eq!(sheet.report.n_rows_data, 3);
    assert_eq!(sheet.report.n_rows_summary, 0);

    let mut l_regions = sheet.regions.regions().to_vec();
    l_regions.sort();
    assert_eq!(
        l_regions,
        vec![
            SpecMergeRegion::vertical(1, 3, N_COL_REPAIR_FACTORY),
            SpecMergeRegion::vertical(1, 3, N_COL_REPAIR_WORKSHOP),
            SpecMergeRegion::vertical(1, 2, N_COL_REPAIR_LINE),
        ]
    );

    let mut writer = ReportXlsxWriter::new(PathBuf::from("unused.xlsx"));
    writer.write_compiled_sheet(&sheet, "维修记录").expect("write");
    assert!(writer.save_to_buffer().expect("buffer").starts_with(b"PK"));
}

#[test]
fn json_records_compile_like_typed_records() {
    init_test();
    let l_records = derive_export_records_from_json(
        r#"[
            {"prod_date": "2024-01-01", "factory_name": "F1", "workshop_name": "W1",
             "line_name": "LineA", "process_name": "ProcA", "shift": "DAY",
             "target_output": 100, "actual_output": 90},
            {"prod_date": "2024-01-01", "factory_name": "F1", "workshop_name": "W1",
             "line_name": "LineA", "process_name": "ProcA", "shift": "DAY",
             "target_output": 50, "actual_output": 60}
        ]"#,
    )
    .expect("json");

    let layout = derive_default_production_layout();
    let sheet_json = compile_production_report(l_records, &layout).expect("compile");
    let sheet_typed = compile_production_report(
        vec![
            record(1, "LineA", "ProcA", 100, 90),
            record(1, "LineA", "ProcA", 50, 60),
        ],
        &layout,
    )
    .expect("compile");

    assert_eq!(sheet_json.regions.regions(), sheet_typed.regions.regions());
    assert_eq!(sheet_json.widths, sheet_typed.widths);
    for row in 0..sheet_typed.grid.n_rows() {
        assert_eq!(sheet_json.grid.row(row), sheet_typed.grid.row(row));
    }
}
