use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive calendar range of days requested from the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Every day from `start` to `end`, both included
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Whole days between the two ends; a single-day range spans zero days
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// How a single data row of a day download was booked
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOutcome {
    /// Six-field row with separate peak and off-peak columns
    TimeOfUse {
        peak: f64,
        offpeak: f64,
        generated: f64,
    },
    /// Five-field row read before the time-of-use tariff started
    Flat { usage: f64, generated: f64 },
    /// Five-field row read once the time-of-use tariff was in force
    OffPeak { usage: f64, generated: f64 },
    /// Row of any other width; changes nothing
    Ignored { fields: usize },
}

/// Running kWh totals across every fetched day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub usage: f64,
    pub usage_peak: f64,
    pub usage_offpeak: f64,
    pub generated: f64,
    pub rows_booked: usize,
    pub rows_ignored: usize,
}

impl UsageTotals {
    pub fn apply(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::TimeOfUse {
                peak,
                offpeak,
                generated,
            } => {
                self.usage_peak += peak;
                self.usage_offpeak += offpeak;
                self.generated += generated;
            }
            RowOutcome::Flat { usage, generated } => {
                self.usage += usage;
                self.generated += generated;
            }
            RowOutcome::OffPeak { usage, generated } => {
                self.usage_offpeak += usage;
                self.generated += generated;
            }
            RowOutcome::Ignored { .. } => {
                self.rows_ignored += 1;
                return;
            }
        }
        self.rows_booked += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_inclusive() {
        let range = DateRange::new(date(2023, 1, 30), date(2023, 2, 2));
        let days: Vec<_> = range.days().collect();
        assert_eq!(
            days,
            vec![
                date(2023, 1, 30),
                date(2023, 1, 31),
                date(2023, 2, 1),
                date(2023, 2, 2)
            ]
        );
        assert_eq!(range.span_days(), 3);
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2023, 1, 1), date(2023, 1, 1));
        assert_eq!(range.days().count(), 1);
        assert_eq!(range.span_days(), 0);
    }

    #[test]
    fn test_ignored_row_only_counts() {
        let mut totals = UsageTotals::default();
        totals.apply(RowOutcome::Ignored { fields: 7 });
        assert_eq!(
            totals,
            UsageTotals {
                rows_ignored: 1,
                ..UsageTotals::default()
            }
        );
    }

    #[test]
    fn test_apply_buckets() {
        let mut totals = UsageTotals::default();
        totals.apply(RowOutcome::TimeOfUse {
            peak: 0.5,
            offpeak: 1.5,
            generated: 2.0,
        });
        totals.apply(RowOutcome::Flat {
            usage: 3.0,
            generated: 1.0,
        });
        totals.apply(RowOutcome::OffPeak {
            usage: 4.0,
            generated: 0.0,
        });
        assert_eq!(totals.usage, 3.0);
        assert_eq!(totals.usage_peak, 0.5);
        assert_eq!(totals.usage_offpeak, 5.5);
        assert_eq!(totals.generated, 3.0);
        assert_eq!(totals.rows_booked, 3);
    }
}
