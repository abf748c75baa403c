//! Analytics operations.
//!
//! Each operation is implemented as a struct that implements the
//! [Operation](crate::operation::Operation) trait.
//!
//! Values that cannot be coerced to a number (or, for trends, to a date) are treated as missing
//! and the affected rows are left out of the computation. Coercion failures are never errors.

use std::hash::Hash;

use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::AnalyticsError;
use crate::format;
use crate::operation::Operation;
use crate::types::{Aggregation, Frequency, Value};

/// Summary sentence used when no region has a valid aggregated value.
const NO_DATA_SUMMARY: &str = "No analyzable data after validation (missing/invalid numeric values).";

/// Groups keyed by `K`, kept in the order their keys were first seen.
struct Groups<K, G> {
    index: HashMap<K, usize>,
    groups: Vec<(K, G)>,
}

impl<K: Clone + Eq + Hash, G: Default> Groups<K, G> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Returns the group for `key`, creating it if needed.
    fn entry(&mut self, key: K) -> &mut G {
        let groups = &mut self.groups;
        let new_key = key.clone();
        let position = *self.index.entry(key).or_insert_with(move || {
            groups.push((new_key, G::default()));
            groups.len() - 1
        });
        &mut self.groups[position].1
    }

    fn into_groups(self) -> std::vec::IntoIter<(K, G)> {
        self.groups.into_iter()
    }
}

/// Parameters for aggregating a value column by region.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionParams {
    /// Column holding the region of each row
    pub region_col: String,
    /// Column holding the value to aggregate
    pub value_col: String,
    /// Reduction applied within each region
    pub agg: Aggregation,
    /// Optional latitude column
    pub lat_col: Option<String>,
    /// Optional longitude column
    pub lon_col: Option<String>,
}

impl RegionParams {
    /// Return new RegionParams without coordinate columns.
    pub fn new(region_col: &str, value_col: &str, agg: Aggregation) -> Self {
        Self {
            region_col: region_col.to_string(),
            value_col: value_col.to_string(),
            agg,
            lat_col: None,
            lon_col: None,
        }
    }

    /// Also average the named coordinate columns per region.
    pub fn with_coordinates(mut self, lat_col: &str, lon_col: &str) -> Self {
        self.lat_col = Some(lat_col.to_string());
        self.lon_col = Some(lon_col.to_string());
        self
    }
}

/// One aggregated region.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionRow {
    /// Raw region value
    pub region: Value,
    /// Aggregated value
    pub value: f64,
    /// Mean latitude of the region's rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Mean longitude of the region's rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// A single (region, aggregated value) pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionValue {
    pub region: String,
    pub value: f64,
}

impl From<&RegionRow> for RegionValue {
    fn from(row: &RegionRow) -> Self {
        Self {
            region: row.region.to_string(),
            value: row.value,
        }
    }
}

/// Aggregate a value column by region.
///
/// Rows are grouped by the raw region value, with missing regions forming their own group.
/// Groups whose reduction is undefined are dropped. The result is sorted by value, largest first,
/// with ties kept in the order the regions first appear.
pub struct Regions {}

#[derive(Default)]
struct RegionGroup {
    values: Vec<f64>,
    lats: Vec<f64>,
    lons: Vec<f64>,
}

impl Operation for Regions {
    type Params = RegionParams;
    type Output = Vec<RegionRow>;

    fn execute(dataset: &Dataset, params: &RegionParams) -> Result<Vec<RegionRow>, AnalyticsError> {
        let indices =
            dataset.require_columns(&[params.region_col.as_str(), params.value_col.as_str()])?;
        let (region_index, value_index) = (indices[0], indices[1]);
        let coordinates = match (&params.lat_col, &params.lon_col) {
            (Some(lat_col), Some(lon_col)) => dataset
                .column_index(lat_col)
                .zip(dataset.column_index(lon_col)),
            _ => None,
        };

        let mut groups: Groups<&Value, RegionGroup> = Groups::new();
        for row in dataset.rows() {
            let group = groups.entry(&row[region_index]);
            if let Some(value) = row[value_index].as_f64() {
                group.values.push(value);
            }
            if let Some((lat_index, lon_index)) = coordinates {
                if let Some(lat) = row[lat_index].as_f64() {
                    group.lats.push(lat);
                }
                if let Some(lon) = row[lon_index].as_f64() {
                    group.lons.push(lon);
                }
            }
        }

        let mut rows: Vec<RegionRow> = groups
            .into_groups()
            .filter_map(|(region, group)| {
                let value = params.agg.reduce(&group.values)?;
                let (lat, lon) = match coordinates {
                    Some(_) => (
                        Aggregation::Mean.reduce(&group.lats),
                        Aggregation::Mean.reduce(&group.lons),
                    ),
                    None => (None, None),
                };
                Some(RegionRow {
                    region: region.clone(),
                    value,
                    lat,
                    lon,
                })
            })
            .collect();
        // Stable sort, so ties keep first-seen order.
        rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        Ok(rows)
    }
}

/// Parameters for ranking regions.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingParams {
    pub region: RegionParams,
    /// Number of regions in each of the top and bottom lists
    pub top_n: usize,
}

/// Best and worst regions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ranked {
    /// Highest values first
    pub top: Vec<RegionValue>,
    /// Lowest values first
    pub bottom: Vec<RegionValue>,
}

/// Rank regions by aggregated value.
///
/// `top` holds the first `top_n` regions in descending order and `bottom` the last `top_n` in
/// ascending order. With fewer than `2 * top_n` regions the two lists overlap; this is kept as is.
pub struct Rankings {}

impl Operation for Rankings {
    type Params = RankingParams;
    type Output = Ranked;

    fn execute(dataset: &Dataset, params: &RankingParams) -> Result<Ranked, AnalyticsError> {
        let rows = Regions::execute(dataset, &params.region)?;
        Ok(rank(&rows, params.top_n))
    }
}

fn rank(rows: &[RegionRow], top_n: usize) -> Ranked {
    let top_len = top_n.min(rows.len());
    let top = rows[..top_len].iter().map(RegionValue::from).collect();
    let bottom = rows[rows.len() - top_len..]
        .iter()
        .rev()
        .map(RegionValue::from)
        .collect();
    Ranked { top, bottom }
}

/// Parameters for a region trend series.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendParams {
    /// Column holding the date of each row
    pub date_col: String,
    pub region_col: String,
    pub value_col: String,
    pub agg: Aggregation,
    /// Bucket size
    pub freq: Frequency,
}

/// One point of a trend series.
///
/// The field names are fixed, whatever the names of the source columns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Bucket date, as `YYYY-MM-DD`
    pub date: String,
    pub region: Value,
    pub value: f64,
}

/// Aggregate a value column per region and calendar bucket.
///
/// Rows with an unparseable date or value are dropped. The series is sorted by date, then region.
pub struct Trends {}

impl Operation for Trends {
    type Params = TrendParams;
    type Output = Vec<TrendPoint>;

    fn execute(dataset: &Dataset, params: &TrendParams) -> Result<Vec<TrendPoint>, AnalyticsError> {
        let indices = dataset.require_columns(&[
            params.date_col.as_str(),
            params.region_col.as_str(),
            params.value_col.as_str(),
        ])?;
        let (date_index, region_index, value_index) = (indices[0], indices[1], indices[2]);

        let mut groups: Groups<(NaiveDate, &Value), Vec<f64>> = Groups::new();
        for row in dataset.rows() {
            let Some(timestamp) = row[date_index].as_timestamp() else {
                continue;
            };
            let Some(value) = row[value_index].as_f64() else {
                continue;
            };
            let Some(bucket) = params.freq.bucket(timestamp.date_naive()) else {
                continue;
            };
            groups.entry((bucket, &row[region_index])).push(value);
        }

        let mut points: Vec<TrendPoint> = groups
            .into_groups()
            .filter_map(|((bucket, region), values)| {
                let value = params.agg.reduce(&values)?;
                Some(TrendPoint {
                    date: bucket.format("%Y-%m-%d").to_string(),
                    region: region.clone(),
                    value,
                })
            })
            .collect();
        points.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.region.sort_cmp(&b.region))
        });
        Ok(points)
    }
}

/// Parameters for an executive summary.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryParams {
    /// Display label for the metric
    pub metric: String,
    pub region: RegionParams,
    /// Number of regions compared at each end. Values below 1 are treated as 1.
    pub top_n: usize,
}

/// Executive summary of a regional metric.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    /// One sentence naming the best and worst regions
    pub summary: String,
    /// Top region, bottom region and grand total
    pub key_findings: Vec<String>,
    /// Formatted values of the top and bottom regions, keyed by region
    pub regional_comparison: serde_json::Map<String, serde_json::Value>,
}

impl Summary {
    fn no_data() -> Self {
        Self {
            summary: NO_DATA_SUMMARY.to_string(),
            key_findings: vec![],
            regional_comparison: serde_json::Map::new(),
        }
    }
}

/// Summarise a regional metric in plain sentences.
pub struct ExecutiveSummary {}

impl Operation for ExecutiveSummary {
    type Params = SummaryParams;
    type Output = Summary;

    fn execute(dataset: &Dataset, params: &SummaryParams) -> Result<Summary, AnalyticsError> {
        let rows = Regions::execute(dataset, &params.region)?;
        let total: f64 = rows.iter().map(|row| row.value).sum();
        let Ranked { top, bottom } = rank(&rows, params.top_n.max(1));
        let (Some(best), Some(worst)) = (top.first(), bottom.first().or(top.last())) else {
            return Ok(Summary::no_data());
        };

        let metric = &params.metric;
        let agg = params.region.agg;
        let percent = |value: f64| {
            if total == 0.0 {
                0.0
            } else {
                value / total * 100.0
            }
        };
        let key_findings = vec![
            format!(
                "Top region: {} ({} {}, {:.1}% of total).",
                best.region,
                format::thousands(best.value, 2),
                metric,
                percent(best.value)
            ),
            format!(
                "Bottom region: {} ({} {}, {:.1}% of total).",
                worst.region,
                format::thousands(worst.value, 2),
                metric,
                percent(worst.value)
            ),
            format!(
                "Total across regions: {} {}.",
                format::thousands(total, 2),
                metric
            ),
        ];

        let label = format!("{}_{}", metric, agg);
        let mut regional_comparison = serde_json::Map::new();
        for region_value in top.iter().chain(bottom.iter()) {
            regional_comparison
                .entry(region_value.region.clone())
                .or_insert_with(|| {
                    let mut formatted = serde_json::Map::new();
                    formatted.insert(
                        label.clone(),
                        format::thousands(region_value.value, 2).into(),
                    );
                    serde_json::Value::Object(formatted)
                });
        }

        Ok(Summary {
            summary: format!(
                "{} leads on {} ({}), while {} lags.",
                best.region, metric, agg, worst.region
            ),
            key_findings,
            regional_comparison,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sample_dataset;
    use serde_json::json;
    use crate::test_utils;

    fn region_params() -> RegionParams {
        RegionParams::new("region", "revenue", Aggregation::Sum)
    }

    fn region_values(rows: &[RegionRow]) -> Vec<(String, f64)> {
        rows.iter()
            .map(|row| (row.region.to_string(), row.value))
            .collect()
    }

    fn ranked_values(values: &[RegionValue]) -> Vec<(&str, f64)> {
        values
            .iter()
            .map(|rv| (rv.region.as_str(), rv.value))
            .collect()
    }

    fn trend_params(freq: Frequency) -> TrendParams {
        TrendParams {
            date_col: "date".to_string(),
            region_col: "region".to_string(),
            value_col: "revenue".to_string(),
            agg: Aggregation::Sum,
            freq,
        }
    }

    fn summary_params(top_n: usize) -> SummaryParams {
        SummaryParams {
            metric: "revenue".to_string(),
            region: region_params(),
            top_n,
        }
    }

    #[test]
    fn regions_sum() {
        let dataset = test_utils::get_test_dataset();
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        assert_eq!(
            vec![
                RegionRow {
                    region: "A".into(),
                    value: 250.0,
                    lat: None,
                    lon: None
                },
                RegionRow {
                    region: "B".into(),
                    value: 90.0,
                    lat: None,
                    lon: None
                },
            ],
            rows
        );
    }

    #[test]
    fn regions_other_aggregations() {
        let dataset = test_utils::get_test_dataset();
        let mut params = region_params();
        params.agg = Aggregation::Mean;
        let rows = Regions::execute(&dataset, &params).unwrap();
        assert_eq!(
            vec![("A".to_string(), 125.0), ("B".to_string(), 90.0)],
            region_values(&rows)
        );
        params.agg = Aggregation::Count;
        let rows = Regions::execute(&dataset, &params).unwrap();
        assert_eq!(
            vec![("A".to_string(), 2.0), ("B".to_string(), 1.0)],
            region_values(&rows)
        );
        params.agg = Aggregation::Min;
        let rows = Regions::execute(&dataset, &params).unwrap();
        assert_eq!(
            vec![("A".to_string(), 100.0), ("B".to_string(), 90.0)],
            region_values(&rows)
        );
    }

    #[test]
    fn regions_sorted_and_unique_on_sample() {
        let dataset = sample_dataset();
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        assert_eq!(
            vec![
                ("North America".to_string(), 1220000.0),
                ("APAC".to_string(), 980000.0),
                ("Europe".to_string(), 850000.0),
                ("South America".to_string(), 375000.0),
            ],
            region_values(&rows)
        );
        assert!(rows.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn regions_with_coordinates() {
        let dataset = sample_dataset();
        let params = region_params().with_coordinates("lat", "lon");
        let rows = Regions::execute(&dataset, &params).unwrap();
        let europe = rows
            .iter()
            .find(|r| r.region == Value::from("Europe"))
            .unwrap();
        assert!((europe.lat.unwrap() - 54.52).abs() < 1e-9);
        assert!((europe.lon.unwrap() - 15.25).abs() < 1e-9);
    }

    #[test]
    fn regions_coordinates_omitted_when_column_absent() {
        let dataset = sample_dataset();
        let params = region_params().with_coordinates("lat", "longitude");
        let rows = Regions::execute(&dataset, &params).unwrap();
        assert!(rows.iter().all(|r| r.lat.is_none() && r.lon.is_none()));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(
            json!({"region": "North America", "value": 1220000.0}),
            json
        );
    }

    #[test]
    fn regions_coordinates_ignore_missing() {
        let dataset = test_utils::dataset(json!([
            {"region": "A", "lat": 10.0, "lon": "x", "revenue": 1},
            {"region": "A", "lat": null, "lon": 20.0, "revenue": 2},
            {"region": "A", "lat": 30.0, "lon": 40.0, "revenue": 3},
        ]));
        let params = region_params().with_coordinates("lat", "lon");
        let rows = Regions::execute(&dataset, &params).unwrap();
        assert_eq!(Some(20.0), rows[0].lat);
        assert_eq!(Some(30.0), rows[0].lon);
    }

    #[test]
    fn regions_null_region_kept() {
        let dataset = test_utils::dataset(json!([
            {"region": "A", "revenue": 1},
            {"region": null, "revenue": 5},
            {"revenue": 2},
        ]));
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        assert_eq!(2, rows.len());
        assert_eq!(Value::Null, rows[0].region);
        assert_eq!(7.0, rows[0].value);
        assert_eq!(Value::from("A"), rows[1].region);
    }

    #[test]
    fn regions_invalid_values_dropped() {
        let dataset = test_utils::dataset(json!([
            {"region": "A", "revenue": "100"},
            {"region": "A", "revenue": "n/a"},
            {"region": "B", "revenue": "oops"},
            {"region": "C", "revenue": true},
        ]));
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        assert_eq!(
            vec![
                ("A".to_string(), 100.0),
                ("C".to_string(), 1.0),
                ("B".to_string(), 0.0)
            ],
            region_values(&rows)
        );

        // A mean over no valid values is undefined, so region B is dropped.
        let mut params = region_params();
        params.agg = Aggregation::Mean;
        let rows = Regions::execute(&dataset, &params).unwrap();
        assert_eq!(
            vec![("A".to_string(), 100.0), ("C".to_string(), 1.0)],
            region_values(&rows)
        );
    }

    #[test]
    fn regions_ties_keep_first_seen_order() {
        let dataset = test_utils::dataset(json!([
            {"region": "Z", "revenue": 10},
            {"region": "M", "revenue": 20},
            {"region": "A", "revenue": 10},
            {"region": "Q", "revenue": 10},
        ]));
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        assert_eq!(
            vec!["M", "Z", "A", "Q"],
            rows.iter()
                .map(|r| r.region.to_string())
                .collect::<Vec<_>>()
        );
        // Identical inputs give identical outputs.
        assert_eq!(rows, Regions::execute(&dataset, &region_params()).unwrap());
    }

    #[test]
    fn regions_all_invalid_sum_ties_with_zero() {
        let dataset = test_utils::dataset(json!([
            {"region": "B", "revenue": "x"},
            {"region": "Z", "revenue": 0},
        ]));
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        assert_eq!(
            vec![("B".to_string(), 0.0), ("Z".to_string(), 0.0)],
            region_values(&rows)
        );
        assert_eq!(
            r#"[{"region":"B","value":0.0},{"region":"Z","value":0.0}]"#,
            serde_json::to_string(&rows).unwrap()
        );
    }

    #[test]
    fn regions_missing_columns() {
        let dataset = test_utils::get_test_dataset();
        let params = RegionParams::new("territory", "sales", Aggregation::Sum);
        let err = Regions::execute(&dataset, &params).unwrap_err();
        assert!(
            matches!(err, AnalyticsError::MissingColumns { columns } if columns == ["territory", "sales"])
        );
    }

    #[test]
    fn regions_empty_dataset() {
        let dataset = Dataset::new(vec!["region".to_string(), "revenue".to_string()], vec![]);
        assert!(Regions::execute(&dataset, &region_params())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rankings_top_and_bottom() {
        let dataset = sample_dataset();
        let params = RankingParams {
            region: region_params(),
            top_n: 2,
        };
        let ranked = Rankings::execute(&dataset, &params).unwrap();
        assert_eq!(
            vec![("North America", 1220000.0), ("APAC", 980000.0)],
            ranked_values(&ranked.top)
        );
        assert_eq!(
            vec![("South America", 375000.0), ("Europe", 850000.0)],
            ranked_values(&ranked.bottom)
        );
    }

    #[test]
    fn rankings_zero() {
        let dataset = sample_dataset();
        let params = RankingParams {
            region: region_params(),
            top_n: 0,
        };
        let ranked = Rankings::execute(&dataset, &params).unwrap();
        assert!(ranked.top.is_empty());
        assert!(ranked.bottom.is_empty());
    }

    #[test]
    fn rankings_overlap_not_deduplicated() {
        let dataset = test_utils::get_test_dataset();
        let params = RankingParams {
            region: region_params(),
            top_n: 5,
        };
        let ranked = Rankings::execute(&dataset, &params).unwrap();
        assert_eq!(vec![("A", 250.0), ("B", 90.0)], ranked_values(&ranked.top));
        assert_eq!(vec![("B", 90.0), ("A", 250.0)], ranked_values(&ranked.bottom));
    }

    #[test]
    fn trends_month_end() {
        let dataset = test_utils::get_test_dataset();
        let points = Trends::execute(&dataset, &trend_params(Frequency::MonthEnd)).unwrap();
        assert_eq!(
            vec![
                TrendPoint {
                    date: "2025-01-31".to_string(),
                    region: "A".into(),
                    value: 100.0
                },
                TrendPoint {
                    date: "2025-01-31".to_string(),
                    region: "B".into(),
                    value: 90.0
                },
                TrendPoint {
                    date: "2025-02-28".to_string(),
                    region: "A".into(),
                    value: 150.0
                },
            ],
            points
        );
    }

    #[test]
    fn trends_year_combines_months() {
        let dataset = sample_dataset();
        let points = Trends::execute(&dataset, &trend_params(Frequency::YearEnd)).unwrap();
        let summary: Vec<(&str, String, f64)> = points
            .iter()
            .map(|p| (p.date.as_str(), p.region.to_string(), p.value))
            .collect();
        assert_eq!(
            vec![
                ("2025-12-31", "APAC".to_string(), 980000.0),
                ("2025-12-31", "Europe".to_string(), 850000.0),
                ("2025-12-31", "North America".to_string(), 1220000.0),
                ("2025-12-31", "South America".to_string(), 375000.0),
            ],
            summary
        );
    }

    #[test]
    fn trends_drops_invalid_rows() {
        let dataset = test_utils::dataset(json!([
            {"region": "A", "date": "2025-01-03", "revenue": 1},
            {"region": "A", "date": "someday", "revenue": 2},
            {"region": "A", "date": "2025-01-04", "revenue": "lots"},
            {"region": "A", "date": null, "revenue": 4},
            {"region": "A", "date": "2025-01-05T10:00:00Z", "revenue": 8},
        ]));
        let points = Trends::execute(&dataset, &trend_params(Frequency::Week)).unwrap();
        assert_eq!(1, points.len());
        assert_eq!("2025-01-05", points[0].date);
        assert_eq!(9.0, points[0].value);
    }

    #[test]
    fn trends_output_names_do_not_collide_with_columns() {
        let dataset = test_utils::dataset(json!([
            {"when": "2025-03-10", "value": "A", "date": 5},
            {"when": "2025-03-20", "value": "A", "date": 6},
        ]));
        let params = TrendParams {
            date_col: "when".to_string(),
            region_col: "value".to_string(),
            value_col: "date".to_string(),
            agg: Aggregation::Max,
            freq: Frequency::MonthEnd,
        };
        let points = Trends::execute(&dataset, &params).unwrap();
        assert_eq!(
            json!([{"date": "2025-03-31", "region": "A", "value": 6.0}]),
            serde_json::to_value(&points).unwrap()
        );
    }

    #[test]
    fn trends_missing_columns() {
        let dataset = test_utils::get_test_dataset();
        let mut params = trend_params(Frequency::Day);
        params.date_col = "timestamp".to_string();
        let err = Trends::execute(&dataset, &params).unwrap_err();
        assert_eq!(
            r#"missing required columns: ["timestamp"]"#,
            err.to_string()
        );
    }

    #[test]
    fn summary_sample() {
        let dataset = sample_dataset();
        let summary = ExecutiveSummary::execute(&dataset, &summary_params(3)).unwrap();
        assert_eq!(
            "North America leads on revenue (sum), while South America lags.",
            summary.summary
        );
        assert_eq!(
            vec![
                "Top region: North America (1,220,000.00 revenue, 35.6% of total).",
                "Bottom region: South America (375,000.00 revenue, 10.9% of total).",
                "Total across regions: 3,425,000.00 revenue.",
            ],
            summary.key_findings
        );
        assert_eq!(
            json!({
                "North America": {"revenue_sum": "1,220,000.00"},
                "APAC": {"revenue_sum": "980,000.00"},
                "Europe": {"revenue_sum": "850,000.00"},
                "South America": {"revenue_sum": "375,000.00"},
            }),
            serde_json::Value::Object(summary.regional_comparison.clone())
        );
        let keys: Vec<&String> = summary.regional_comparison.keys().collect();
        assert_eq!(
            vec!["North America", "APAC", "Europe", "South America"],
            keys
        );
    }

    #[test]
    fn summary_fewer_regions_than_top_n() {
        let dataset = test_utils::get_test_dataset();
        let summary = ExecutiveSummary::execute(&dataset, &summary_params(3)).unwrap();
        assert_eq!("A leads on revenue (sum), while B lags.", summary.summary);
        assert_eq!(2, summary.regional_comparison.len());
    }

    #[test]
    fn summary_single_region() {
        let dataset = test_utils::dataset(json!([{"region": "Only", "revenue": 5}]));
        let summary = ExecutiveSummary::execute(&dataset, &summary_params(0)).unwrap();
        assert_eq!(
            "Only leads on revenue (sum), while Only lags.",
            summary.summary
        );
        assert_eq!(
            "Top region: Only (5.00 revenue, 100.0% of total).",
            summary.key_findings[0]
        );
    }

    #[test]
    fn summary_zero_total() {
        let dataset = test_utils::dataset(json!([
            {"region": "A", "revenue": 0},
            {"region": "B", "revenue": 0},
        ]));
        let summary = ExecutiveSummary::execute(&dataset, &summary_params(3)).unwrap();
        assert_eq!(
            vec![
                "Top region: A (0.00 revenue, 0.0% of total).",
                "Bottom region: B (0.00 revenue, 0.0% of total).",
                "Total across regions: 0.00 revenue.",
            ],
            summary.key_findings
        );
    }

    #[test]
    fn summary_no_data() {
        let dataset = test_utils::dataset(json!([
            {"region": "A", "revenue": "unknown"},
        ]));
        let mut params = summary_params(3);
        params.region.agg = Aggregation::Mean;
        let summary = ExecutiveSummary::execute(&dataset, &params).unwrap();
        assert_eq!(
            "No analyzable data after validation (missing/invalid numeric values).",
            summary.summary
        );
        assert!(summary.key_findings.is_empty());
        assert!(summary.regional_comparison.is_empty());
    }

    #[test]
    fn summary_percentages_within_total() {
        let dataset = sample_dataset();
        let rows = Regions::execute(&dataset, &region_params()).unwrap();
        let total: f64 = rows.iter().map(|r| r.value).sum();
        let summary = ExecutiveSummary::execute(&dataset, &summary_params(1)).unwrap();
        assert_eq!(
            format!("Total across regions: {} revenue.", format::thousands(total, 2)),
            summary.key_findings[2]
        );
        let top_share = rows[0].value / total * 100.0;
        let bottom_share = rows[rows.len() - 1].value / total * 100.0;
        assert!(top_share + bottom_share <= 100.0);
    }

    #[test]
    fn summary_missing_columns() {
        let dataset = test_utils::get_test_dataset();
        let mut params = summary_params(3);
        params.region.value_col = "profit".to_string();
        let err = ExecutiveSummary::execute(&dataset, &params).unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingColumns { .. }));
    }
}
