use crate::error::UsageError;
use crate::models::{DateRange, RowOutcome, UsageTotals};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

const READING_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Collects kWh totals from day downloads for one date range.
///
/// Consumed by [`UsageAccumulator::finish`], which is the only way to obtain a
/// [`FetchedUsage`] and therefore the only way to reach cost calculation.
#[derive(Debug)]
pub struct UsageAccumulator {
    range: DateRange,
    flat_rate_until: NaiveDate,
    totals: UsageTotals,
}

impl UsageAccumulator {
    pub fn new(range: DateRange, flat_rate_until: NaiveDate) -> Self {
        Self {
            range,
            flat_rate_until,
            totals: UsageTotals::default(),
        }
    }

    pub fn totals(&self) -> &UsageTotals {
        &self.totals
    }

    /// Parse one day's CSV body and add its rows to the totals.
    ///
    /// The first line is a header. Every row is classified before any is
    /// applied, so a malformed row leaves the totals untouched.
    pub fn ingest_csv(&mut self, body: &str) -> Result<Vec<RowOutcome>, UsageError> {
        let outcomes = parse_day(body, self.flat_rate_until)?;
        for outcome in &outcomes {
            if let RowOutcome::Ignored { fields } = outcome {
                debug!(fields = *fields, "Ignoring row of unexpected width");
            }
            self.totals.apply(*outcome);
        }
        Ok(outcomes)
    }

    pub fn finish(self) -> FetchedUsage {
        FetchedUsage {
            range: self.range,
            totals: self.totals,
        }
    }
}

/// Totals for a fully fetched range
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedUsage {
    range: DateRange,
    totals: UsageTotals,
}

impl FetchedUsage {
    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn totals(&self) -> &UsageTotals {
        &self.totals
    }
}

pub fn parse_day(body: &str, flat_rate_until: NaiveDate) -> Result<Vec<RowOutcome>, UsageError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut outcomes = Vec::new();
    for record in reader.records() {
        outcomes.push(classify_row(&record?, flat_rate_until)?);
    }
    Ok(outcomes)
}

/// Book a row by its width.
///
/// Six fields carry generation, off-peak and peak in columns 2, 3 and 4.
/// Five fields carry generation and a single usage column whose bucket depends
/// on the reading date in column 1.
pub fn classify_row(
    record: &StringRecord,
    flat_rate_until: NaiveDate,
) -> Result<RowOutcome, UsageError> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();

    match record.len() {
        6 => Ok(RowOutcome::TimeOfUse {
            peak: kwh_or_zero(record, 4, line)?,
            offpeak: kwh_or_zero(record, 3, line)?,
            generated: kwh(record, 2, line)?,
        }),
        5 => {
            let read_on = reading_date(&record[1], line)?;
            let usage = kwh(record, 3, line)?;
            let generated = kwh(record, 2, line)?;
            if read_on < flat_rate_until {
                Ok(RowOutcome::Flat { usage, generated })
            } else {
                Ok(RowOutcome::OffPeak { usage, generated })
            }
        }
        fields => Ok(RowOutcome::Ignored { fields }),
    }
}

fn reading_date(value: &str, line: u64) -> Result<NaiveDate, UsageError> {
    NaiveDateTime::parse_from_str(value.trim(), READING_TIMESTAMP_FORMAT)
        .map(|dt| dt.date())
        .map_err(|_| UsageError::InvalidTimestamp {
            line,
            value: value.to_string(),
        })
}

fn kwh(record: &StringRecord, column: usize, line: u64) -> Result<f64, UsageError> {
    let value = &record[column];
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| UsageError::InvalidKwh {
            line,
            column,
            value: value.to_string(),
        })
}

// Peak and off-peak columns are blank on days without a reading in that period.
fn kwh_or_zero(record: &StringRecord, column: usize, line: u64) -> Result<f64, UsageError> {
    if record[column].is_empty() {
        Ok(0.0)
    } else {
        kwh(record, column, line)
    }
}
