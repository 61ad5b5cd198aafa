//! Series data behind the dashboard charts.
//!
//! Histograms compare every loaded scene ("all") with the delivery set
//! ("selected") on shared bins. The time series plots median LST per scene,
//! coloured by review label.

use chrono::{DateTime, Utc};

use crate::classify::{Classification, ReviewLabel};
use crate::selection::{DeliverySet, Selection};
use crate::table::{Metric, SceneTable};

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub metric: Metric,
    /// `bins + 1` ascending edges; the last bin is closed on the right.
    pub edges: Vec<f64>,
    pub all: Vec<u64>,
    pub selected: Vec<u64>,
}

impl Histogram {
    pub fn bins(&self) -> usize {
        self.all.len()
    }

    pub fn total_all(&self) -> u64 {
        self.all.iter().sum()
    }

    pub fn total_selected(&self) -> u64 {
        self.selected.iter().sum()
    }
}

pub fn histogram(metric: Metric, table: &SceneTable, delivery: &DeliverySet, bins: usize) -> Histogram {
    let bins = bins.max(1);
    let values: Vec<f64> = table
        .rows
        .iter()
        .map(|row| row.metric(metric))
        .filter(|v| !v.is_nan())
        .collect();

    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (lo, hi) = if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    };
    let width = (hi - lo) / bins as f64;

    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let bin_of = |v: f64| -> Option<usize> {
        if v.is_nan() || v < lo || v > hi {
            return None;
        }
        Some((((v - lo) / width) as usize).min(bins - 1))
    };

    let mut all = vec![0; bins];
    for v in &values {
        if let Some(i) = bin_of(*v) {
            all[i] += 1;
        }
    }

    let mut selected = vec![0; bins];
    for scene in &delivery.scenes {
        if let Some(i) = bin_of(scene.metric(metric)) {
            selected[i] += 1;
        }
    }

    Histogram {
        metric,
        edges,
        all,
        selected,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    pub key: String,
    pub datetime: DateTime<Utc>,
    pub median_lst: f64,
    pub label: ReviewLabel,
    /// Picked by the operator during review.
    pub picked: bool,
}

/// One point per dated scene with a median LST, in time order.
pub fn time_series(table: &SceneTable, classes: &[Classification], selection: &Selection) -> Vec<TimePoint> {
    let mut points: Vec<TimePoint> = table
        .rows
        .iter()
        .zip(classes)
        .filter_map(|(row, class)| {
            let datetime = row.datetime?;
            if row.median_lst.is_nan() {
                return None;
            }
            Some(TimePoint {
                key: row.key.clone(),
                datetime,
                median_lst: row.median_lst,
                label: class.label(),
                picked: class.visible_for_review && selection.contains(&row.key),
            })
        })
        .collect();

    points.sort_by_key(|point| point.datetime);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fixtures::{row, table};
    use chrono::TimeZone;

    #[test]
    fn test_histogram_shares_bins_between_origins() {
        let mut rows = Vec::new();
        for (i, aoi) in [0.0, 10.0, 20.0, 50.0, 100.0].iter().enumerate() {
            let mut scene = row(&format!("S{}", i));
            scene.invalid_ratio_aoi = *aoi;
            rows.push(scene);
        }
        let table = table(rows);
        let delivery = DeliverySet {
            scenes: vec![table.rows[0].clone(), table.rows[1].clone()],
        };

        let hist = histogram(Metric::InvalidRatioAoi, &table, &delivery, 20);

        assert_eq!(hist.bins(), 20);
        assert_eq!(hist.edges.len(), 21);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(hist.edges[20], 100.0);
        assert_eq!(hist.total_all(), 5);
        assert_eq!(hist.total_selected(), 2);
        assert_eq!(hist.all[0], 1);
        assert_eq!(hist.all[2], 1);
        assert_eq!(hist.all[19], 1);
        assert_eq!(hist.selected[0], 1);
        assert_eq!(hist.selected[2], 1);
    }

    #[test]
    fn test_rejected_scenes_still_count_in_all() {
        let mut rejected = row("R");
        rejected.invalid_ratio_aoi = 50.0;
        let table = table(vec![row("A"), rejected]);
        let delivery = DeliverySet {
            scenes: vec![table.rows[0].clone()],
        };

        let hist = histogram(Metric::InvalidRatioAoi, &table, &delivery, 20);

        assert_eq!(hist.total_all(), 2);
        assert_eq!(hist.total_selected(), 1);
        assert_eq!(hist.all[19], 1);
    }

    #[test]
    fn test_constant_column_and_nan() {
        let mut missing = row("B");
        missing.max_lst = f64::NAN;
        let table = table(vec![row("A"), missing]);

        let hist = histogram(Metric::MaxLst, &table, &DeliverySet::default(), 4);

        assert_eq!(hist.edges, vec![309.5, 309.75, 310.0, 310.25, 310.5]);
        assert_eq!(hist.total_all(), 1);
        assert_eq!(hist.all[2], 1);
    }

    #[test]
    fn test_time_series_sorted_with_labels() {
        let mut late = row("A");
        late.datetime = Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        let early = row("B");
        let mut undated = row("C");
        undated.datetime = None;
        let table = table(vec![late, early, undated]);
        let classes = vec![
            Classification { default_accepted: true, visible_for_review: false },
            Classification { default_accepted: false, visible_for_review: true },
            Classification::default(),
        ];
        let mut selection = Selection::new();
        selection.select("B");

        let points = time_series(&table, &classes, &selection);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].key, "B");
        assert_eq!(points[0].label, ReviewLabel::Tbd);
        assert!(points[0].picked);
        assert_eq!(points[1].key, "A");
        assert_eq!(points[1].label, ReviewLabel::Validated);
        assert!(!points[1].picked);
    }
}
