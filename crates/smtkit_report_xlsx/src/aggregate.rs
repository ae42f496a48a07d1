//! Streaming hierarchical aggregation of export records into report rows.
//!
//! The aggregator keeps one open coarse group (date, factory, workshop, line)
//! and, inside it, one running total per finer group (coarse key + process).
//! Data rows pass straight through; summary rows are emitted when the coarse
//! group closes, one per finer group in first-seen order.

use tracing::debug;

use crate::record::ExportRecord;

////////////////////////////////////////////////////////////////////////////////
// #region Models

/// Ordered tuple of key field values; equality is component-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecGroupKey {
    pub fields: Vec<String>,
}

impl SpecGroupKey {
    /// Coarse (line-level) key of a record.
    pub fn coarse_of(record: &ExportRecord) -> Self {
        Self {
            fields: vec![
                record.prod_date.to_string(),
                record.factory_name.clone(),
                record.workshop_name.clone(),
                record.line_name.clone(),
            ],
        }
    }

    /// Finer (process-level) key of a record: the coarse key plus one field.
    pub fn finer_of(record: &ExportRecord) -> Self {
        let mut key = Self::coarse_of(record);
        key.fields.push(record.process_name.clone());
        key
    }

    /// Innermost field, e.g. the process name of a finer key.
    pub fn leaf(&self) -> &str {
        self.fields.last().map_or("", String::as_str)
    }
}

/// Nullable sums of target and actual output for one finer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecRunningTotal {
    pub target: Option<i64>,
    pub actual: Option<i64>,
}

impl SpecRunningTotal {
    /// Add one record's metrics with null-safe semantics.
    pub fn add(&mut self, target: Option<i64>, actual: Option<i64>) {
        self.target = add_nullable(self.target, target);
        self.actual = add_nullable(self.actual, actual);
    }
}

/// Synthetic subtotal row for one closed finer group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSummaryRow {
    /// Finer group key.
    pub key: SpecGroupKey,
    /// Accumulated totals.
    pub total: SpecRunningTotal,
    /// `actual - target`, when both are known.
    pub gap: Option<i64>,
    /// Achievement rate in hundredths of a percent (`10000` = `100.00%`).
    pub rate_hundredths: Option<i64>,
}

impl SpecSummaryRow {
    fn from_total(key: SpecGroupKey, total: SpecRunningTotal) -> Self {
        Self {
            gap: calculate_gap(total.target, total.actual),
            rate_hundredths: calculate_achievement_rate(total.target, total.actual),
            key,
            total,
        }
    }

    /// Rendered achievement rate (`"100.00%"`) or `placeholder`.
    pub fn rate_text(&self, placeholder: &str) -> String {
        format_achievement_rate(self.rate_hundredths, placeholder)
    }
}

/// Output row of the aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumReportRow {
    /// Source record rendered as-is.
    Data(ExportRecord),
    /// Subtotal of one finer group.
    Summary(SpecSummaryRow),
}

impl EnumReportRow {
    /// Whether this is a summary row.
    pub fn is_summary(&self) -> bool {
        matches!(self, EnumReportRow::Summary(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Aggregator

/// Streaming aggregator. Input must be sorted by the grouping keys; unsorted
/// input splits groups arbitrarily.
#[derive(Debug, Default)]
pub struct GroupAggregator {
    key_coarse_open: Option<SpecGroupKey>,
    l_buckets: Vec<(SpecGroupKey, SpecRunningTotal)>,
}

impl GroupAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one record, appending the rows it releases to `l_rows_out`.
    ///
    /// A record that opens a new coarse group first releases the summaries of
    /// the closing group, then its own data row.
    pub fn push(&mut self, record: ExportRecord, l_rows_out: &mut Vec<EnumReportRow>) {
        let key_coarse = SpecGroupKey::coarse_of(&record);
        if self
            .key_coarse_open
            .as_ref()
            .is_some_and(|key_open| *key_open != key_coarse)
        {
            self.flush(l_rows_out);
        }
        if self.key_coarse_open.is_none() {
            self.key_coarse_open = Some(key_coarse);
        }

        let key_finer = SpecGroupKey::finer_of(&record);
        let n_idx_bucket = match self.l_buckets.iter().position(|(key, _)| *key == key_finer) {
            Some(n_idx) => n_idx,
            None => {
                self.l_buckets.push((key_finer, SpecRunningTotal::default()));
                self.l_buckets.len() - 1
            }
        };
        self.l_buckets[n_idx_bucket]
            .1
            .add(record.target_output, record.actual_output);

        l_rows_out.push(EnumReportRow::Data(record));
    }

    /// Close the open coarse group, if any.
    pub fn finish(mut self, l_rows_out: &mut Vec<EnumReportRow>) {
        self.flush(l_rows_out);
    }

    fn flush(&mut self, l_rows_out: &mut Vec<EnumReportRow>) {
        let Some(key_coarse) = self.key_coarse_open.take() else {
            return;
        };
        debug!(
            key = ?key_coarse.fields,
            n_buckets = self.l_buckets.len(),
            "closing coarse group"
        );
        for (key_finer, total) in self.l_buckets.drain(..) {
            l_rows_out.push(EnumReportRow::Summary(SpecSummaryRow::from_total(
                key_finer, total,
            )));
        }
    }
}

/// Aggregate a sorted record sequence into data and summary rows.
pub fn aggregate_export_records(
    records: impl IntoIterator<Item = ExportRecord>,
) -> Vec<EnumReportRow> {
    let mut aggregator = GroupAggregator::new();
    let mut l_rows = Vec::new();
    for record in records {
        aggregator.push(record, &mut l_rows);
    }
    aggregator.finish(&mut l_rows);
    l_rows
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Metrics

/// Null-safe addition: a missing operand contributes nothing. Saturates at
/// the `i64` bounds.
pub fn add_nullable(lhs: Option<i64>, rhs: Option<i64>) -> Option<i64> {
    match (lhs, rhs) {
        (None, None) => None,
        (Some(val), None) | (None, Some(val)) => Some(val),
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
    }
}

/// `actual - target` when both are known, saturating at the `i64` bounds.
pub fn calculate_gap(target: Option<i64>, actual: Option<i64>) -> Option<i64> {
    Some(actual?.saturating_sub(target?))
}

/// `actual / target * 100` in hundredths of a percent, rounded half-up.
///
/// Returns `None` when either metric is missing or the target is zero.
pub fn calculate_achievement_rate(target: Option<i64>, actual: Option<i64>) -> Option<i64> {
    let (target, actual) = (target?, actual?);
    if target == 0 {
        return None;
    }

    let n_num = i128::from(actual) * 10_000;
    let n_den = i128::from(target);
    let n_abs = (2 * n_num.abs() + n_den.abs()) / (2 * n_den.abs());
    let n_rate = if (n_num < 0) != (n_den < 0) { -n_abs } else { n_abs };
    i64::try_from(n_rate).ok()
}

/// Render hundredths of a percent as `"12.34%"`.
pub fn format_achievement_rate(rate_hundredths: Option<i64>, placeholder: &str) -> String {
    match rate_hundredths {
        Some(n_rate) => {
            let c_sign = if n_rate < 0 { "-" } else { "" };
            let n_abs = n_rate.unsigned_abs();
            format!("{c_sign}{}.{:02}%", n_abs / 100, n_abs % 100)
        }
        None => placeholder.to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(line: &str, process: &str, target: Option<i64>, actual: Option<i64>) -> ExportRecord {
        ExportRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            "F1",
            "W1",
            line,
            process,
        )
        .with_metrics(target, actual)
    }

    fn summaries(l_rows: &[EnumReportRow]) -> Vec<&SpecSummaryRow> {
        l_rows
            .iter()
            .filter_map(|row| match row {
                EnumReportRow::Summary(summary) => Some(summary),
                EnumReportRow::Data(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_aggregate_sums_finer_groups_on_coarse_flush() {
        let l_rows = aggregate_export_records(vec![
            record("LineA", "ProcA", Some(100), Some(90)),
            record("LineA", "ProcA", Some(50), Some(60)),
            record("LineA", "ProcB", Some(20), Some(20)),
        ]);

        assert_eq!(l_rows.len(), 5);
        assert!(l_rows[..3].iter().all(|row| !row.is_summary()));

        let l_summaries = summaries(&l_rows);
        assert_eq!(l_summaries[0].key.leaf(), "ProcA");
        assert_eq!(l_summaries[0].total.target, Some(150));
        assert_eq!(l_summaries[0].total.actual, Some(150));
        assert_eq!(l_summaries[0].gap, Some(0));
        assert_eq!(l_summaries[0].rate_text("-"), "100.00%");
        assert_eq!(l_summaries[1].key.leaf(), "ProcB");
        assert_eq!(l_summaries[1].total.target, Some(20));
        assert_eq!(l_summaries[1].rate_text("-"), "100.00%");
    }

    #[test]
    fn test_aggregate_flushes_before_next_coarse_group() {
        let l_rows = aggregate_export_records(vec![
            record("LineA", "ProcA", Some(10), Some(10)),
            record("LineB", "ProcA", Some(10), Some(5)),
        ]);

        let l_kinds: Vec<bool> = l_rows.iter().map(EnumReportRow::is_summary).collect();
        assert_eq!(l_kinds, vec![false, true, false, true]);

        let l_summaries = summaries(&l_rows);
        assert_eq!(l_summaries[0].key.fields[3], "LineA");
        assert_eq!(l_summaries[1].key.fields[3], "LineB");
        assert_eq!(l_summaries[1].rate_text("-"), "50.00%");
    }

    #[test]
    fn test_aggregate_preserves_data_row_order_and_count() {
        let l_records = vec![
            record("LineA", "ProcB", Some(1), None),
            record("LineA", "ProcA", None, Some(2)),
            record("LineA", "ProcB", Some(3), Some(4)),
            record("LineC", "ProcA", None, None),
        ];
        let l_rows = aggregate_export_records(l_records.clone());

        let l_data: Vec<&ExportRecord> = l_rows
            .iter()
            .filter_map(|row| match row {
                EnumReportRow::Data(rec) => Some(rec),
                EnumReportRow::Summary(_) => None,
            })
            .collect();
        assert_eq!(l_data, l_records.iter().collect::<Vec<_>>());

        let l_summaries = summaries(&l_rows);
        assert_eq!(l_summaries.len(), 3);
        // first-seen bucket order, not key order
        assert_eq!(l_summaries[0].key.leaf(), "ProcB");
        assert_eq!(l_summaries[0].total.target, Some(4));
        assert_eq!(l_summaries[0].total.actual, Some(4));
        assert_eq!(l_summaries[1].key.leaf(), "ProcA");
        assert_eq!(l_summaries[1].total.target, None);
        assert_eq!(l_summaries[1].gap, None);
        assert_eq!(l_summaries[1].rate_text("-"), "-");
        assert_eq!(l_summaries[2].total, SpecRunningTotal::default());
    }

    #[test]
    fn test_aggregate_empty_input_yields_nothing() {
        assert!(aggregate_export_records(Vec::new()).is_empty());
    }

    #[test]
    fn test_zero_target_renders_placeholder() {
        let l_rows = aggregate_export_records(vec![record("LineA", "ProcA", Some(0), Some(10))]);
        let l_summaries = summaries(&l_rows);
        assert_eq!(l_summaries[0].gap, Some(10));
        assert_eq!(l_summaries[0].rate_text("-"), "-");
    }

    #[test]
    fn test_achievement_rate_rounds_half_up() {
        assert_eq!(calculate_achievement_rate(Some(3), Some(1)), Some(3333));
        assert_eq!(calculate_achievement_rate(Some(3), Some(2)), Some(6667));
        assert_eq!(calculate_achievement_rate(Some(8), Some(1)), Some(1250));
        // 1 / 16000 * 100 = 0.00625 -> 0.01
        assert_eq!(calculate_achievement_rate(Some(16_000), Some(1)), Some(1));
        assert_eq!(calculate_achievement_rate(Some(3), Some(-1)), Some(-3333));
        assert_eq!(calculate_achievement_rate(None, Some(1)), None);
        assert_eq!(calculate_achievement_rate(Some(5), None), None);

        assert_eq!(format_achievement_rate(Some(-3333), "-"), "-33.33%");
        assert_eq!(format_achievement_rate(Some(5), "-"), "0.05%");
    }

    #[test]
    fn test_aggregate_saturates_instead_of_overflowing() {
        let l_rows = aggregate_export_records(vec![
            record("LineA", "ProcA", Some(1), Some(i64::MAX)),
            record("LineA", "ProcA", Some(1), Some(1)),
        ]);
        let l_summaries = summaries(&l_rows);
        assert_eq!(l_summaries[0].total.actual, Some(i64::MAX));
        assert_eq!(l_summaries[0].total.target, Some(2));
        assert_eq!(l_summaries[0].gap, Some(i64::MAX - 2));

        assert_eq!(calculate_gap(Some(i64::MAX), Some(i64::MIN)), Some(i64::MIN));
        assert_eq!(add_nullable(Some(i64::MIN), Some(-1)), Some(i64::MIN));
    }

    #[test]
    fn test_add_nullable_table() {
        assert_eq!(add_nullable(None, None), None);
        assert_eq!(add_nullable(None, Some(3)), Some(3));
        assert_eq!(add_nullable(Some(2), None), Some(2));
        assert_eq!(add_nullable(Some(2), Some(3)), Some(5));
    }
}
