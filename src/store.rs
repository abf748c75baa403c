//! In-memory dataset store.
//!
//! The store owns every dataset ingested by the process. It is not durable across restarts and is
//! intended for single-instance deployments.

use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::dataset::{Dataset, Record};
use crate::error::AnalyticsError;
use crate::types::Value;

/// Identifier under which the sample dataset is always available.
pub const SAMPLE_DATASET_ID: &str = "sample";

/// Display name of the sample dataset.
const SAMPLE_DATASET_NAME: &str = "Sample dataset";

/// Length of generated dataset identifiers, in hex characters.
const DATASET_ID_LEN: usize = 12;

/// Snapshot of a stored dataset's metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetMeta {
    /// Unique opaque identifier
    pub dataset_id: String,
    /// Display name
    pub name: String,
    /// Number of rows
    pub rows: usize,
    /// Column names, in order
    pub columns: Vec<String>,
}

/// A dataset and its metadata.
#[derive(Debug)]
struct Entry {
    dataset: Arc<Dataset>,
    meta: DatasetMeta,
}

/// Thread-safe registry of datasets keyed by identifier.
///
/// All reads and writes happen under a single lock, so readers never observe a partially
/// inserted dataset and identifier assignment cannot collide under concurrent insertions.
/// Datasets are immutable once stored and are handed out behind an [Arc].
#[derive(Debug, Default)]
pub struct DatasetStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl DatasetStore {
    /// Return a new, empty DatasetStore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new DatasetStore containing the sample dataset under [SAMPLE_DATASET_ID].
    pub fn with_sample() -> Self {
        let store = Self::new();
        store.insert(
            SAMPLE_DATASET_ID.to_string(),
            sample_dataset(),
            SAMPLE_DATASET_NAME,
        );
        store
    }

    /// Store a dataset under a fresh identifier and return its metadata.
    ///
    /// # Arguments
    ///
    /// * `dataset`: The dataset to store
    /// * `name`: Optional display name. Defaults to the identifier.
    pub fn put(&self, dataset: Dataset, name: Option<&str>) -> DatasetMeta {
        let mut entries = self.lock();
        let dataset_id = loop {
            let candidate = new_dataset_id();
            if candidate != SAMPLE_DATASET_ID && !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        let name = name.unwrap_or(&dataset_id).to_string();
        let meta = insert_entry(&mut entries, dataset_id, dataset, name);
        tracing::debug!(
            dataset_id = %meta.dataset_id,
            rows = meta.rows,
            "stored dataset {}",
            meta.name
        );
        meta
    }

    /// Build a dataset from JSON records and store it.
    ///
    /// Fails with [AnalyticsError::EmptyRecords] when there are no records.
    pub fn put_records(
        &self,
        records: Vec<Record>,
        name: Option<&str>,
    ) -> Result<DatasetMeta, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyRecords);
        }
        Ok(self.put(Dataset::from_records(records), name))
    }

    /// Look up a dataset.
    ///
    /// Fails with [AnalyticsError::DatasetNotFound] for an unknown identifier.
    pub fn get(&self, dataset_id: &str) -> Result<Arc<Dataset>, AnalyticsError> {
        self.lock()
            .get(dataset_id)
            .map(|entry| entry.dataset.clone())
            .ok_or_else(|| AnalyticsError::DatasetNotFound {
                dataset_id: dataset_id.to_string(),
            })
    }

    /// Metadata of every stored dataset, sorted case-insensitively by name.
    pub fn list(&self) -> Vec<DatasetMeta> {
        let mut metas: Vec<DatasetMeta> = self
            .lock()
            .values()
            .map(|entry| entry.meta.clone())
            .collect();
        metas.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.dataset_id.cmp(&b.dataset_id))
        });
        metas
    }

    /// Store a dataset under a known identifier.
    fn insert(&self, dataset_id: String, dataset: Dataset, name: &str) -> DatasetMeta {
        insert_entry(&mut self.lock(), dataset_id, dataset, name.to_string())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Entries are only ever inserted whole, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn insert_entry(
    entries: &mut HashMap<String, Entry>,
    dataset_id: String,
    dataset: Dataset,
    name: String,
) -> DatasetMeta {
    let meta = DatasetMeta {
        dataset_id: dataset_id.clone(),
        name,
        rows: dataset.num_rows(),
        columns: dataset.columns().to_vec(),
    };
    entries.insert(
        dataset_id,
        Entry {
            dataset: Arc::new(dataset),
            meta: meta.clone(),
        },
    );
    meta
}

fn new_dataset_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(DATASET_ID_LEN);
    id
}

/// The demonstration dataset: four regions over three months of revenue.
pub fn sample_dataset() -> Dataset {
    const REGIONS: [(&str, f64, f64, [i64; 3]); 4] = [
        ("North America", 37.09, -95.71, [410000, 390000, 420000]),
        ("Europe", 54.52, 15.25, [270000, 280000, 300000]),
        ("South America", -14.24, -51.93, [120000, 125000, 130000]),
        ("APAC", 34.05, 100.62, [310000, 330000, 340000]),
    ];
    const DATES: [&str; 3] = ["2025-10-01", "2025-11-01", "2025-12-01"];

    let columns = ["region", "lat", "lon", "date", "revenue"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let rows: Vec<Vec<Value>> = REGIONS
        .iter()
        .flat_map(|(region, lat, lon, revenues)| {
            DATES.iter().zip(revenues).map(move |(date, revenue)| {
                vec![
                    Value::from(*region),
                    Value::from(*lat),
                    Value::from(*lon),
                    Value::from(*date),
                    Value::from(*revenue),
                ]
            })
        })
        .collect();
    Dataset::new(columns, rows)
}
