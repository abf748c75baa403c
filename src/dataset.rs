//! In-memory tabular datasets.
//!
//! A [Dataset] is an ordered list of rows over a set of uniquely named columns. Every row holds
//! exactly one [Value] per column, with absent values stored as [Value::Null]. Datasets are
//! built once at ingestion and never modified afterwards.

use std::io::Read;

use hashbrown::HashSet;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::AnalyticsError;
use crate::types::Value;

/// A JSON record, as posted by clients. Member order is preserved.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// In-memory table of rows over named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Return a new Dataset.
    ///
    /// Duplicate column names are made unique by appending `.1`, `.2`, etc. Rows are padded with
    /// nulls or truncated to the number of columns.
    ///
    /// # Arguments
    ///
    /// * `columns`: Column names
    /// * `rows`: Row values, in column order
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<Value>>) -> Self {
        let columns = unique_column_names(columns);
        for row in rows.iter_mut() {
            row.resize(columns.len(), Value::Null);
        }
        Self { columns, rows }
    }

    /// Build a Dataset from JSON records.
    ///
    /// The columns are the union of the record keys in first-seen order. Keys absent from a
    /// record are null in that row.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for record in &records {
            for key in record.keys() {
                if !seen.contains(key) {
                    seen.insert(key.clone());
                    columns.push(key.clone());
                }
            }
        }
        let rows: Vec<Vec<Value>> = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|column| record.remove(column).map_or(Value::Null, Value::from))
                    .collect()
            })
            .collect();
        Self::new(columns, rows)
    }

    /// Build a Dataset from CSV data with a header row.
    ///
    /// Field values are coerced with [Value::from_csv_field].
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, AnalyticsError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(AnalyticsError::InvalidUpload {
                reason: "no columns to parse from file".to_string(),
            });
        }
        let mut rows: Vec<Vec<Value>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Value::from_csv_field).collect());
        }
        Ok(Self::new(columns, rows))
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Look up the positions of columns required by an operation.
    ///
    /// Fails with [AnalyticsError::MissingColumns] listing every absent column.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, AnalyticsError> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(index) => indices.push(index),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(AnalyticsError::MissingColumns { columns: missing })
        }
    }

    /// Iterate over rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// The first `n` rows, as serialisable records.
    pub fn head(&self, n: usize) -> Vec<RowRecord<'_>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| RowRecord {
                columns: &self.columns,
                values: row,
            })
            .collect()
    }
}

/// A borrowed row that serialises as a `{column: value}` map in column order.
#[derive(Debug)]
pub struct RowRecord<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Serialize for RowRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Make column names unique, renaming repeats as `name.1`, `name.2`, ...
fn unique_column_names(columns: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = columns.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(columns.len());
    for column in columns {
        if seen.insert(column.clone()) {
            unique.push(column);
            continue;
        }
        let mut suffix = 1;
        let renamed = loop {
            let candidate = format!("{}.{}", column, suffix);
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        taken.insert(renamed.clone());
        seen.insert(renamed.clone());
        unique.push(renamed);
    }
    unique
}
