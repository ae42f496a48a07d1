//! Record sources: polars frames, Polars IPC payloads and JSON.
//!
//! The query layer hands rows over as a frame whose column names equal the
//! record field names. Key columns are required; any other column may be
//! absent and then reads as null.

use std::io::Cursor;

use chrono::NaiveDate;
use polars::prelude::{AnyValue, Column, DataFrame, IpcReader, SerReader};

use crate::record::{EnumShiftCode, ExportRecord, RepairRecord};
use crate::spec::ReportError;

const C_FMT_DATE: &str = "%Y-%m-%d";

////////////////////////////////////////////////////////////////////////////////
// #region ValueDecoding

fn derive_decode_error(field: &str, row: usize, message: impl Into<String>) -> ReportError {
    ReportError::FieldDecode {
        field: field.to_string(),
        row,
        message: message.into(),
    }
}

fn derive_text_from_any_value(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(val) => Some(val.to_string()),
        AnyValue::StringOwned(val) => Some(val.to_string()),
        other => Some(other.to_string()),
    }
}

fn derive_i64_from_any_value(
    value: AnyValue<'_>,
    field: &str,
    row: usize,
) -> Result<Option<i64>, ReportError> {
    let n_val = match value {
        AnyValue::Null => return Ok(None),
        AnyValue::Int8(val) => i64::from(val),
        AnyValue::Int16(val) => i64::from(val),
        AnyValue::Int32(val) => i64::from(val),
        AnyValue::Int64(val) => val,
        AnyValue::UInt8(val) => i64::from(val),
        AnyValue::UInt16(val) => i64::from(val),
        AnyValue::UInt32(val) => i64::from(val),
        AnyValue::UInt64(val) => i64::try_from(val)
            .map_err(|_| derive_decode_error(field, row, format!("{val} exceeds i64")))?,
        AnyValue::Float32(val) if val.fract() == 0.0 => val as i64,
        AnyValue::Float64(val) if val.fract() == 0.0 => val as i64,
        AnyValue::String(val) => val
            .trim()
            .parse::<i64>()
            .map_err(|err| derive_decode_error(field, row, err.to_string()))?,
        AnyValue::StringOwned(val) => val
            .trim()
            .parse::<i64>()
            .map_err(|err| derive_decode_error(field, row, err.to_string()))?,
        other => {
            return Err(derive_decode_error(
                field,
                row,
                format!("expected an integer, got {other}"),
            ));
        }
    };
    Ok(Some(n_val))
}

fn derive_f64_from_any_value(
    value: AnyValue<'_>,
    field: &str,
    row: usize,
) -> Result<Option<f64>, ReportError> {
    let n_val = match value {
        AnyValue::Null => return Ok(None),
        AnyValue::Int8(val) => f64::from(val),
        AnyValue::Int16(val) => f64::from(val),
        AnyValue::Int32(val) => f64::from(val),
        AnyValue::Int64(val) => val as f64,
        AnyValue::UInt8(val) => f64::from(val),
        AnyValue::UInt16(val) => f64::from(val),
        AnyValue::UInt32(val) => f64::from(val),
        AnyValue::UInt64(val) => val as f64,
        AnyValue::Float32(val) => f64::from(val),
        AnyValue::Float64(val) => val,
        AnyValue::String(val) => val
            .trim()
            .parse::<f64>()
            .map_err(|err| derive_decode_error(field, row, err.to_string()))?,
        AnyValue::StringOwned(val) => val
            .trim()
            .parse::<f64>()
            .map_err(|err| derive_decode_error(field, row, err.to_string()))?,
        other => {
            return Err(derive_decode_error(
                field,
                row,
                format!("expected a number, got {other}"),
            ));
        }
    };
    Ok(Some(n_val))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FrameAccess

/// Column accessor for one frame; missing optional columns read as null.
struct FrameRowReader<'a> {
    df: &'a DataFrame,
}

impl<'a> FrameRowReader<'a> {
    fn column_required(&self, name: &str) -> Result<&'a Column, ReportError> {
        self.df
            .column(name)
            .map_err(|_| ReportError::ColumnNotFound(name.to_string()))
    }

    fn value(&self, name: &str, row: usize) -> Result<AnyValue<'a>, ReportError> {
        match self.df.column(name) {
            Ok(col) => Ok(col.get(row)?),
            Err(_) => Ok(AnyValue::Null),
        }
    }

    fn text_required(&self, name: &str, row: usize) -> Result<String, ReportError> {
        derive_text_from_any_value(self.column_required(name)?.get(row)?)
            .ok_or_else(|| derive_decode_error(name, row, "required value is null"))
    }

    fn text(&self, name: &str, row: usize) -> Result<Option<String>, ReportError> {
        Ok(derive_text_from_any_value(self.value(name, row)?))
    }

    fn integer(&self, name: &str, row: usize) -> Result<Option<i64>, ReportError> {
        derive_i64_from_any_value(self.value(name, row)?, name, row)
    }

    fn float(&self, name: &str, row: usize) -> Result<Option<f64>, ReportError> {
        derive_f64_from_any_value(self.value(name, row)?, name, row)
    }

    fn date_required(&self, name: &str, row: usize) -> Result<NaiveDate, ReportError> {
        let c_text = self.text_required(name, row)?;
        NaiveDate::parse_from_str(c_text.trim(), C_FMT_DATE)
            .map_err(|err| derive_decode_error(name, row, format!("{c_text:?}: {err}")))
    }

    fn shift(&self, name: &str, row: usize) -> Result<Option<EnumShiftCode>, ReportError> {
        match self.text(name, row)? {
            None => Ok(None),
            Some(c_text) if c_text.trim().is_empty() => Ok(None),
            Some(c_text) => EnumShiftCode::parse(&c_text)
                .map(Some)
                .ok_or_else(|| derive_decode_error(name, row, format!("unknown shift {c_text:?}"))),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sources

/// Build production records from a frame, one record per row in frame order.
pub fn derive_export_records_from_dataframe(
    df: &DataFrame,
) -> Result<Vec<ExportRecord>, ReportError> {
    let reader = FrameRowReader { df };
    for name in [
        "prod_date",
        "factory_name",
        "workshop_name",
        "line_name",
        "process_name",
    ] {
        reader.column_required(name)?;
    }

    (0..df.height())
        .map(|row| {
            Ok(ExportRecord {
                prod_date: reader.date_required("prod_date", row)?,
                factory_name: reader.text_required("factory_name", row)?,
                workshop_name: reader.text_required("workshop_name", row)?,
                line_name: reader.text_required("line_name", row)?,
                process_name: reader.text_required("process_name", row)?,
                shift: reader.shift("shift", row)?,
                machine_no: reader.text("machine_no", row)?,
                product_code: reader.text("product_code", row)?,
                series_name: reader.text("series_name", row)?,
                ct: reader.float("ct", row)?,
                equipment_count: reader.integer("equipment_count", row)?,
                run_minutes: reader.integer("run_minutes", row)?,
                target_output: reader.integer("target_output", row)?,
                actual_output: reader.integer("actual_output", row)?,
                down_minutes: reader.integer("down_minutes", row)?,
                fa: reader.text("fa", row)?,
                ca: reader.text("ca", row)?,
            })
        })
        .collect()
}

/// Build production records from a Polars IPC payload.
pub fn derive_export_records_from_ipc_bytes(
    v_ipc_df: &[u8],
) -> Result<Vec<ExportRecord>, ReportError> {
    let df = IpcReader::new(Cursor::new(v_ipc_df)).finish()?;
    derive_export_records_from_dataframe(&df)
}

/// Build production records from a JSON array.
pub fn derive_export_records_from_json(text: &str) -> Result<Vec<ExportRecord>, ReportError> {
    Ok(serde_json::from_str(text)?)
}

/// Build repair records from a JSON array.
pub fn derive_repair_records_from_json(text: &str) -> Result<Vec<RepairRecord>, ReportError> {
    Ok(serde_json::from_str(text)?)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
