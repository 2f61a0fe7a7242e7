use std::io::Write;

use crate::error::ProjectionError;
use crate::projection::engine::{PeriodResult, ProjectionSeries};
use crate::variants::sweep::Variant;
use crate::ProjectionResult;

/// Column prepended when several scenarios share one file.
pub const SCENARIO_COLUMN: &str = "scenario";

/// Write one header row of field names and one row per period.
pub fn write_series_csv<W: Write>(series: &ProjectionSeries, writer: W) -> ProjectionResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(PeriodResult::FIELD_NAMES)?;
    for period in &series.periods {
        wtr.write_record(period.values())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Concatenate several series under a leading `scenario` column.
pub fn write_variants_csv<W: Write>(variants: &[Variant], writer: W) -> ProjectionResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(PeriodResult::FIELD_NAMES.len() + 1);
    header.push(SCENARIO_COLUMN);
    header.extend(PeriodResult::FIELD_NAMES);
    wtr.write_record(&header)?;

    for variant in variants {
        for period in &variant.series.periods {
            let mut row = Vec::with_capacity(header.len());
            row.push(variant.label.clone());
            row.extend(period.values());
            wtr.write_record(&row)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn series_to_csv(series: &ProjectionSeries) -> ProjectionResult<String> {
    let mut buf = Vec::new();
    write_series_csv(series, &mut buf)?;
    into_text(buf)
}

pub fn variants_to_csv(variants: &[Variant]) -> ProjectionResult<String> {
    let mut buf = Vec::new();
    write_variants_csv(variants, &mut buf)?;
    into_text(buf)
}

fn into_text(buf: Vec<u8>) -> ProjectionResult<String> {
    String::from_utf8(buf).map_err(|e| ProjectionError::Export(e.to_string()))
}
