//! Request and response data for the HTTP API

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::dataset::{Record, RowRecord};
use crate::operations::{RegionRow, RegionValue, Summary, TrendPoint};
use crate::store::SAMPLE_DATASET_ID;
use crate::types::{Aggregation, Value};

fn default_dataset_id() -> String {
    SAMPLE_DATASET_ID.to_string()
}

fn default_metric() -> String {
    "revenue".to_string()
}

fn default_region_col() -> String {
    "region".to_string()
}

fn default_value_col() -> String {
    "revenue".to_string()
}

fn default_date_col() -> String {
    "date".to_string()
}

fn default_lat_col() -> String {
    "lat".to_string()
}

fn default_lon_col() -> String {
    "lon".to_string()
}

fn default_freq() -> String {
    "M".to_string()
}

fn default_preview_limit() -> usize {
    10
}

fn default_rankings_top_n() -> usize {
    5
}

fn default_summary_top_n() -> usize {
    3
}

/// Blank names fall back to the default, as if no name was given.
fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.filter(|name| !name.trim().is_empty()))
}

/// Optional display name for an uploaded dataset
#[derive(Debug, Default, Deserialize, PartialEq, Validate)]
pub struct NameQuery {
    #[serde(default, deserialize_with = "non_blank")]
    pub name: Option<String>,
}

/// Records posted to create a dataset
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(transparent)]
pub struct Records {
    pub records: Vec<Record>,
}

/// Query for a dataset preview
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct PreviewQuery {
    /// Maximum number of rows to return
    #[serde(default = "default_preview_limit")]
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: usize,
}

/// Query for the map endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct MapQuery {
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    /// Metric column. Falls back to a column named `value` when absent.
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_region_col")]
    pub region_col: String,
    #[serde(default = "default_lat_col")]
    pub lat_col: String,
    #[serde(default = "default_lon_col")]
    pub lon_col: String,
    #[serde(default)]
    pub agg: Aggregation,
}

/// Query for the region aggregation endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct RegionsQuery {
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    #[serde(default = "default_value_col")]
    pub value_col: String,
    #[serde(default = "default_region_col")]
    pub region_col: String,
    #[serde(default)]
    pub agg: Aggregation,
}

/// Query for the rankings endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct RankingsQuery {
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    #[serde(default = "default_value_col")]
    pub value_col: String,
    #[serde(default = "default_region_col")]
    pub region_col: String,
    #[serde(default)]
    pub agg: Aggregation,
    /// Number of regions in each of the top and bottom lists
    #[serde(default = "default_rankings_top_n")]
    #[validate(range(max = 100, message = "top_n must be at most 100"))]
    pub top_n: usize,
}

/// Query for the trends endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct TrendsQuery {
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    #[serde(default = "default_date_col")]
    pub date_col: String,
    #[serde(default = "default_region_col")]
    pub region_col: String,
    #[serde(default = "default_value_col")]
    pub value_col: String,
    #[serde(default)]
    pub agg: Aggregation,
    /// Frequency alias, parsed by the handler so unknown values report the alias given
    #[serde(default = "default_freq")]
    pub freq: String,
}

/// Query for the executive summary endpoint
#[derive(Debug, Deserialize, PartialEq, Validate)]
pub struct SummaryQuery {
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    /// Label used for the metric in summary text
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_region_col")]
    pub region_col: String,
    #[serde(default = "default_value_col")]
    pub value_col: String,
    #[serde(default)]
    pub agg: Aggregation,
    #[serde(default = "default_summary_top_n")]
    #[validate(range(min = 1, max = 10, message = "top_n must be between 1 and 10"))]
    pub top_n: usize,
}

/// Service health
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Columns and row count of a dataset
#[derive(Debug, Serialize)]
pub struct Schema {
    pub dataset_id: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// First rows of a dataset
#[derive(Debug, Serialize)]
pub struct Preview<'a> {
    pub dataset_id: String,
    /// Total number of rows in the dataset
    pub rows: usize,
    pub preview: Vec<RowRecord<'a>>,
}

/// One region as plotted on the map
#[derive(Debug, PartialEq, Serialize)]
pub struct MapRegion {
    pub region: Value,
    /// Requested metric name, even when the `value` column was used instead
    pub metric: String,
    pub value: f64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl MapRegion {
    /// Return a new MapRegion from an aggregated region.
    pub fn new(row: RegionRow, metric: &str) -> Self {
        Self {
            region: row.region,
            metric: metric.to_string(),
            value: row.value,
            lat: row.lat,
            lon: row.lon,
        }
    }
}

/// Regions aggregated by value
#[derive(Debug, Serialize)]
pub struct RegionsResponse {
    pub dataset_id: String,
    pub value_col: String,
    pub agg: Aggregation,
    pub regions: Vec<RegionRow>,
}

/// Best and worst regions
#[derive(Debug, Serialize)]
pub struct RankingsResponse {
    pub dataset_id: String,
    pub value_col: String,
    pub agg: Aggregation,
    pub top_n: usize,
    pub top: Vec<RegionValue>,
    pub bottom: Vec<RegionValue>,
}

/// Trend series
#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub dataset_id: String,
    pub value_col: String,
    pub agg: Aggregation,
    /// Frequency alias as requested
    pub freq: String,
    pub series: Vec<TrendPoint>,
}

/// Executive summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: Summary,
    pub dataset_id: String,
}
