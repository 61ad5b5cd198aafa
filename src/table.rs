//! Typed scene table built from a loaded collection.
//!
//! Every record becomes exactly one row. Metrics that are missing or not
//! numeric become NaN, and a datetime that cannot be parsed becomes `None`,
//! so such rows fail every threshold instead of disappearing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::collection::{Artifact, Collection, SceneRecord};

/// Numeric columns of the scene table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    CloudCover,
    NoData,
    InvalidPixel,
    SunElevation,
    MinLst,
    MaxLst,
    MedianLst,
    InvalidRatioAoi,
    InvalidRatioImage,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::CloudCover,
        Metric::NoData,
        Metric::InvalidPixel,
        Metric::SunElevation,
        Metric::MinLst,
        Metric::MaxLst,
        Metric::MedianLst,
        Metric::InvalidRatioAoi,
        Metric::InvalidRatioImage,
    ];

    /// Columns compared between "all" and "selected" scenes.
    pub const HISTOGRAM: [Metric; 5] = [
        Metric::InvalidRatioAoi,
        Metric::InvalidRatioImage,
        Metric::MinLst,
        Metric::MaxLst,
        Metric::MedianLst,
    ];

    /// Field name in the metadata document and column name in exports.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::CloudCover => "cloud_cover",
            Metric::NoData => "no_data",
            Metric::InvalidPixel => "invalid_pixel",
            Metric::SunElevation => "sun_elevation",
            Metric::MinLst => "min_lst",
            Metric::MaxLst => "max_lst",
            Metric::MedianLst => "median_lst",
            Metric::InvalidRatioAoi => "invalid_ratio_aoi",
            Metric::InvalidRatioImage => "invalid_ratio_image",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::CloudCover => "Cloud cover",
            Metric::NoData => "No data",
            Metric::InvalidPixel => "Invalid pixels",
            Metric::SunElevation => "Sun elevation",
            Metric::MinLst => "Min LST",
            Metric::MaxLst => "Max LST",
            Metric::MedianLst => "Median LST",
            Metric::InvalidRatioAoi => "Invalid cover aoi",
            Metric::InvalidRatioImage => "Invalid cover image",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneRow {
    pub key: String,
    pub datetime: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
    pub satellite: String,
    pub workflow_id: String,
    pub artifacts: Vec<Artifact>,
    pub cloud_cover: f64,
    pub no_data: f64,
    /// Cloud cover plus no-data.
    pub invalid_pixel: f64,
    pub sun_elevation: f64,
    pub min_lst: f64,
    pub max_lst: f64,
    pub median_lst: f64,
    pub invalid_ratio_aoi: f64,
    pub invalid_ratio_image: f64,
}

impl SceneRow {
    pub fn from_record(record: &SceneRecord) -> Self {
        let metadata = &record.metadata;
        let raw_datetime = metadata.get("scene_datetime");
        let datetime = raw_datetime.and_then(Value::as_str).and_then(parse_datetime);
        if datetime.is_none() {
            warn!(
                "Scene {} has no usable scene_datetime ({:?})",
                record.key, raw_datetime
            );
        }

        let cloud_cover = metric_value(metadata, Metric::CloudCover);
        let no_data = metric_value(metadata, Metric::NoData);

        Self {
            key: record.key.clone(),
            datetime,
            date: datetime.map(|dt| dt.date_naive()),
            satellite: record.satellite.clone(),
            workflow_id: record.workflow_id.clone(),
            artifacts: record.artifacts.clone(),
            cloud_cover,
            no_data,
            invalid_pixel: cloud_cover + no_data,
            sun_elevation: metric_value(metadata, Metric::SunElevation),
            min_lst: metric_value(metadata, Metric::MinLst),
            max_lst: metric_value(metadata, Metric::MaxLst),
            median_lst: metric_value(metadata, Metric::MedianLst),
            invalid_ratio_aoi: metric_value(metadata, Metric::InvalidRatioAoi),
            invalid_ratio_image: metric_value(metadata, Metric::InvalidRatioImage),
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::CloudCover => self.cloud_cover,
            Metric::NoData => self.no_data,
            Metric::InvalidPixel => self.invalid_pixel,
            Metric::SunElevation => self.sun_elevation,
            Metric::MinLst => self.min_lst,
            Metric::MaxLst => self.max_lst,
            Metric::MedianLst => self.median_lst,
            Metric::InvalidRatioAoi => self.invalid_ratio_aoi,
            Metric::InvalidRatioImage => self.invalid_ratio_image,
        }
    }
}

fn metric_value(metadata: &Map<String, Value>, metric: Metric) -> f64 {
    metadata
        .get(metric.column())
        .map(coerce_number)
        .unwrap_or(f64::NAN)
}

/// Numbers pass through, numeric strings are parsed, anything else is NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => f64::NAN,
    }
}

/// Accepts RFC 3339, naive ISO 8601 (taken as UTC) and bare dates.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One row per scene, ordered by scene key.
#[derive(Debug, Clone, Default)]
pub struct SceneTable {
    pub rows: Vec<SceneRow>,
}

impl SceneTable {
    pub fn build(collection: &Collection) -> Self {
        let rows = collection.scenes.values().map(SceneRow::from_record).collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.rows
            .binary_search_by(|row| row.key.as_str().cmp(key))
            .ok()
    }

    pub fn get(&self, key: &str) -> Option<&SceneRow> {
        self.position(key).map(|index| &self.rows[index])
    }

    /// Observed min/max of every column, ignoring NaN and missing values.
    pub fn ranges(&self) -> MetricRanges {
        let datetimes = self.rows.iter().filter_map(|row| row.datetime);
        let datetime = datetimes.clone().min().zip(datetimes.max());

        let metrics = Metric::ALL
            .iter()
            .filter_map(|&metric| {
                let (lo, hi) = self
                    .rows
                    .iter()
                    .map(|row| row.metric(metric))
                    .filter(|v| !v.is_nan())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                (lo <= hi).then_some((metric, (lo, hi)))
            })
            .collect();

        MetricRanges { datetime, metrics }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricRanges {
    pub datetime: Option<(DateTime<Utc>, DateTime<Utc>)>,
    metrics: Vec<(Metric, (f64, f64))>,
}

impl MetricRanges {
    pub fn get(&self, metric: Metric) -> Option<(f64, f64)> {
        self.metrics
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, range)| *range)
    }
}
