use crate::dataset::{Dataset, Record};

/// Convert a JSON array of objects into records.
pub(crate) fn records(json: serde_json::Value) -> Vec<Record> {
    serde_json::from_value(json).unwrap()
}

/// Build a Dataset from a JSON array of objects.
pub(crate) fn dataset(json: serde_json::Value) -> Dataset {
    Dataset::from_records(records(json))
}

/// Create a small Dataset with two regions over two months.
pub(crate) fn get_test_dataset() -> Dataset {
    dataset(serde_json::json!([
        {"region": "A", "lat": 10.0, "lon": 10.0, "revenue": 100, "date": "2025-01-01"},
        {"region": "A", "lat": 10.0, "lon": 10.0, "revenue": 150, "date": "2025-02-01"},
        {"region": "B", "lat": 20.0, "lon": 20.0, "revenue": 90, "date": "2025-01-01"},
    ]))
}
