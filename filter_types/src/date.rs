//! `date`: `(min_date, max_date)` + canonical date format (spec §3).

use crate::error::{CodecSnafu, EmptyInputSnafu, Error, TypeMismatchSnafu};
use chrono::NaiveDate;
use data_types::{ColumnChunk, ColumnChunkStream, LogicalType, Value};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

const VARIANT: &str = "date";

/// A closed date-interval filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateFilter {
    min: NaiveDate,
    max: NaiveDate,
    /// The canonical format used when a probe value arrives as a string.
    date_format: String,
}

impl DateFilter {
    /// Single-pass construction: track the running min/max date.
    pub fn build_from_stream(chunks: ColumnChunkStream, date_format: String) -> Result<Self, Error> {
        let mut min: Option<NaiveDate> = None;
        let mut max: Option<NaiveDate> = None;

        for chunk in chunks {
            for value in chunk.into_iter().flatten() {
                let date = as_date(&value, &date_format)?;
                min = Some(min.map_or(date, |m| m.min(date)));
                max = Some(max.map_or(date, |m| m.max(date)));
            }
        }

        let min = min.context(EmptyInputSnafu { variant: VARIANT })?;
        let max = max.context(EmptyInputSnafu { variant: VARIANT })?;
        Ok(Self {
            min,
            max,
            date_format,
        })
    }

    /// Fold additional data into an already-built filter.
    pub fn update(&mut self, chunk: ColumnChunk) -> Result<(), Error> {
        for value in chunk.into_iter().flatten() {
            let date = as_date(&value, &self.date_format)?;
            self.min = self.min.min(date);
            self.max = self.max.max(date);
        }
        Ok(())
    }

    /// `min <= value <= max` on the calendar-date domain.
    pub fn test(&self, value: &Value) -> Result<bool, Error> {
        let date = as_date(value, &self.date_format)?;
        Ok(self.min <= date && date <= self.max)
    }

    pub(crate) fn logical_type(&self) -> LogicalType {
        LogicalType::Date
    }
}

fn as_date(value: &Value, format: &str) -> Result<NaiveDate, Error> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::Timestamp(ts) => Ok(ts.date()),
        Value::String(s) | Value::Categorical(s) => {
            NaiveDate::parse_from_str(s, format).map_err(|_| {
                TypeMismatchSnafu {
                    variant: VARIANT,
                    expected: LogicalType::Date,
                    actual: value.logical_type(),
                }
                .build()
            })
        }
        other => TypeMismatchSnafu {
            variant: VARIANT,
            expected: LogicalType::Date,
            actual: other.logical_type(),
        }
        .fail(),
    }
}

pub(crate) fn serialize(filter: &DateFilter) -> Result<Vec<u8>, Error> {
    bincode::serialize(filter).context(CodecSnafu)
}

pub(crate) fn deserialize(bytes: &[u8]) -> Result<DateFilter, Error> {
    bincode::deserialize(bytes).context(CodecSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(dates: Vec<&str>) -> ColumnChunkStream {
        let chunk: ColumnChunk = dates
            .into_iter()
            .map(|s| Some(Value::String(s.to_string())))
            .collect();
        Box::new(std::iter::once(chunk))
    }

    #[test]
    fn date_exactness() {
        let filter =
            DateFilter::build_from_stream(stream(vec!["2024-01-01", "2024-06-15"]), "%Y-%m-%d".to_string())
                .unwrap();
        assert!(filter
            .test(&Value::String("2024-03-01".to_string()))
            .unwrap());
        assert!(!filter
            .test(&Value::String("2025-01-01".to_string()))
            .unwrap());
    }
}
