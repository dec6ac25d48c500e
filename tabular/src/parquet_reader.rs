//! Parquet chunked reader, grounded on `original_source/core/metadata.py`'s
//! `ParquetFilterGenerator` (`ParquetFile.read_row_group(...)`).

use crate::error::{self, Error};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use data_types::{ColumnChunk, ColumnChunkStream, Value};
use ordered_float::OrderedFloat;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use snafu::ResultExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A Parquet file opened for chunked, per-column reading.
#[derive(Debug)]
pub struct ParquetReader {
    path: PathBuf,
    columns: Vec<String>,
}

impl ParquetReader {
    /// Open `path` and read its column names from the file footer.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let reader = Self::open_reader(path)?;
        let columns = reader
            .metadata()
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            columns,
        })
    }

    /// The column names, in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `true` if the file has zero rows.
    pub fn is_empty(&self) -> Result<bool, Error> {
        let reader = Self::open_reader(&self.path)?;
        Ok(reader.metadata().file_metadata().num_rows() == 0)
    }

    /// A fresh chunked stream of one column's values, `chunk_size` rows at a
    /// time.
    pub fn chunks(&self, column: &str, chunk_size: usize) -> Result<ColumnChunkStream, Error> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                error::UnknownColumnSnafu {
                    path: self.path.display().to_string(),
                    column: column.to_string(),
                }
                .build()
            })?;
        let reader = Self::open_reader(&self.path)?;
        let rows = reader
            .get_row_iter(None)
            .context(error::ParquetSnafu {
                path: self.path.display().to_string(),
            })?
            .collect::<Result<Vec<_>, _>>()
            .context(error::ParquetSnafu {
                path: self.path.display().to_string(),
            })?;
        Ok(Box::new(ParquetChunkIter {
            rows: rows.into_iter(),
            index,
            chunk_size,
        }))
    }

    fn open_reader(path: &Path) -> Result<SerializedFileReader<File>, Error> {
        let file = File::open(path).context(error::OpenSnafu {
            path: path.display().to_string(),
        })?;
        SerializedFileReader::new(file).context(error::ParquetSnafu {
            path: path.display().to_string(),
        })
    }
}

struct ParquetChunkIter {
    rows: std::vec::IntoIter<parquet::record::Row>,
    index: usize,
    chunk_size: usize,
}

impl Iterator for ParquetChunkIter {
    type Item = ColumnChunk;

    fn next(&mut self) -> Option<ColumnChunk> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        for row in self.rows.by_ref().take(self.chunk_size) {
            let (_, field) = row
                .get_column_iter()
                .nth(self.index)
                .expect("column index is within the schema's column count");
            chunk.push(field_to_value(field));
        }
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

fn field_to_value(field: &Field) -> Option<Value> {
    match field {
        Field::Null => None,
        Field::Bool(v) => Some(Value::Boolean(*v)),
        Field::Byte(v) => Some(Value::Integer(*v as i64)),
        Field::Short(v) => Some(Value::Integer(*v as i64)),
        Field::Int(v) => Some(Value::Integer(*v as i64)),
        Field::Long(v) => Some(Value::Integer(*v)),
        Field::UByte(v) => Some(Value::Integer(*v as i64)),
        Field::UShort(v) => Some(Value::Integer(*v as i64)),
        Field::UInt(v) => Some(Value::Integer(*v as i64)),
        Field::ULong(v) => Some(Value::Integer(*v as i64)),
        Field::Float(v) => Some(Value::Float(OrderedFloat(*v as f64))),
        Field::Double(v) => Some(Value::Float(OrderedFloat(*v))),
        Field::Str(v) => Some(Value::String(v.clone())),
        Field::Date(days) => Some(Value::Date(epoch_date() + Duration::days(*days as i64))),
        Field::TimestampMillis(millis) => Some(Value::Timestamp(
            epoch_datetime() + Duration::milliseconds(*millis as i64),
        )),
        Field::TimestampMicros(micros) => Some(Value::Timestamp(
            epoch_datetime() + Duration::microseconds(*micros as i64),
        )),
        other => Some(Value::String(format!("{other}"))),
    }
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("1970-01-01 is a valid date")
}

fn epoch_datetime() -> NaiveDateTime {
    epoch_date().and_hms_opt(0, 0, 0).expect("midnight is a valid time")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_conversion_handles_common_scalars() {
        assert_eq!(field_to_value(&Field::Long(42)), Some(Value::Integer(42)));
        assert_eq!(
            field_to_value(&Field::Double(1.5)),
            Some(Value::Float(OrderedFloat(1.5)))
        );
        assert_eq!(field_to_value(&Field::Null), None);
        assert_eq!(
            field_to_value(&Field::Str("hi".to_string())),
            Some(Value::String("hi".to_string()))
        );
    }
}
