//! Quality classification of scenes against the operator's filters.
//!
//! Each quality threshold carries two bounds. The `strict` bound is the
//! auto-accept gate: scenes passing every strict bound (plus the date and sun
//! elevation ranges) are validated without review. The `loose` bound is the
//! visibility gate: scenes passing every loose bound that were not already
//! validated are offered to the operator. Everything else is rejected.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::config::FilterDefaults;
use crate::table::{Metric, MetricRanges, SceneRow, SceneTable};

/// Inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Threshold where lower values are better (invalid ratios, max LST).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpperLimit {
    pub strict: f64,
    pub loose: f64,
}

impl UpperLimit {
    /// From a dual-ended slider laid out valid | review | invalid.
    pub fn from_slider((low, high): (f64, f64)) -> Self {
        Self {
            strict: low,
            loose: high,
        }
    }

    pub fn accepts(&self, value: f64) -> bool {
        value <= self.strict
    }

    pub fn shows(&self, value: f64) -> bool {
        value <= self.loose
    }
}

/// Threshold where higher values are better (min LST).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LowerLimit {
    pub strict: f64,
    pub loose: f64,
}

impl LowerLimit {
    /// From a dual-ended slider laid out invalid | review | valid.
    pub fn from_slider((low, high): (f64, f64)) -> Self {
        Self {
            strict: high,
            loose: low,
        }
    }

    pub fn accepts(&self, value: f64) -> bool {
        value >= self.strict
    }

    pub fn shows(&self, value: f64) -> bool {
        value >= self.loose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterConfig {
    pub date: Range<DateTime<Utc>>,
    pub sun_elevation: Range<f64>,
    pub invalid_ratio_aoi: UpperLimit,
    pub invalid_ratio_image: UpperLimit,
    pub max_lst: UpperLimit,
    pub min_lst: LowerLimit,
}

impl FilterConfig {
    /// Initial filters for a freshly loaded table: the full date range, the
    /// configured sun elevation, and every slider at its widest position.
    pub fn initial(ranges: &MetricRanges, defaults: &FilterDefaults) -> Self {
        let date = ranges
            .datetime
            .map(|(min, max)| Range::new(min, max))
            .unwrap_or(Range::new(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC));
        let (sun_min, sun_max) = defaults.sun_elevation;

        Self {
            date,
            sun_elevation: Range::new(sun_min, sun_max),
            invalid_ratio_aoi: UpperLimit::from_slider(defaults.ratio_domain),
            invalid_ratio_image: UpperLimit::from_slider(defaults.ratio_domain),
            max_lst: UpperLimit::from_slider(ranges.get(Metric::MaxLst).unwrap_or((0.0, 0.0))),
            min_lst: LowerLimit::from_slider(ranges.get(Metric::MinLst).unwrap_or((0.0, 0.0))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReviewLabel {
    Rejected,
    Validated,
    #[serde(rename = "TBD")]
    Tbd,
}

impl ReviewLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewLabel::Rejected => "Rejected",
            ReviewLabel::Validated => "Validated",
            ReviewLabel::Tbd => "TBD",
        }
    }
}

impl fmt::Display for ReviewLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Classification {
    pub default_accepted: bool,
    pub visible_for_review: bool,
}

impl Classification {
    pub fn label(&self) -> ReviewLabel {
        if self.default_accepted {
            ReviewLabel::Validated
        } else if self.visible_for_review {
            ReviewLabel::Tbd
        } else {
            ReviewLabel::Rejected
        }
    }
}

pub fn classify_row(row: &SceneRow, config: &FilterConfig) -> Classification {
    let in_date = row
        .datetime
        .map(|dt| config.date.contains(dt))
        .unwrap_or(false);

    let default_accepted = in_date
        && config.sun_elevation.contains(row.sun_elevation)
        && config.invalid_ratio_aoi.accepts(row.invalid_ratio_aoi)
        && config.invalid_ratio_image.accepts(row.invalid_ratio_image)
        && config.min_lst.accepts(row.min_lst)
        && config.max_lst.accepts(row.max_lst);

    let visible_for_review = config.invalid_ratio_aoi.shows(row.invalid_ratio_aoi)
        && config.invalid_ratio_image.shows(row.invalid_ratio_image)
        && config.min_lst.shows(row.min_lst)
        && config.max_lst.shows(row.max_lst)
        && !default_accepted;

    Classification {
        default_accepted,
        visible_for_review,
    }
}

/// Classify every row; the result is aligned with `table.rows`.
pub fn classify(table: &SceneTable, config: &FilterConfig) -> Vec<Classification> {
    table
        .rows
        .iter()
        .map(|row| classify_row(row, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fixtures::{row, table};
    use chrono::TimeZone;

    fn june() -> Range<DateTime<Utc>> {
        Range::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
        )
    }

    /// Strict: aoi <= 10, image <= 10, min >= 280, max <= 320.
    /// Loose: aoi <= 40, image <= 40, min >= 260, max <= 340.
    fn config() -> FilterConfig {
        FilterConfig {
            date: june(),
            sun_elevation: Range::new(10.0, 90.0),
            invalid_ratio_aoi: UpperLimit { strict: 10.0, loose: 40.0 },
            invalid_ratio_image: UpperLimit { strict: 10.0, loose: 40.0 },
            max_lst: UpperLimit { strict: 320.0, loose: 340.0 },
            min_lst: LowerLimit { strict: 280.0, loose: 260.0 },
        }
    }

    #[test]
    fn test_passing_scene_is_validated() {
        let scene = row("A");
        let result = classify_row(&scene, &config());

        assert!(result.default_accepted);
        assert!(!result.visible_for_review);
        assert_eq!(result.label(), ReviewLabel::Validated);
    }

    #[test]
    fn test_scene_between_bounds_is_tbd() {
        let mut scene = row("A");
        scene.invalid_ratio_aoi = 25.0;

        let result = classify_row(&scene, &config());

        assert!(!result.default_accepted);
        assert!(result.visible_for_review);
        assert_eq!(result.label(), ReviewLabel::Tbd);
    }

    #[test]
    fn test_scene_outside_both_bounds_is_rejected() {
        let mut scene = row("A");
        scene.invalid_ratio_aoi = 50.0;

        let result = classify_row(&scene, &config());

        assert_eq!(result, Classification::default());
        assert_eq!(result.label(), ReviewLabel::Rejected);
    }

    #[test]
    fn test_date_and_sun_only_gate_default_acceptance() {
        let mut early = row("A");
        early.datetime = Some(Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap());
        let mut low_sun = row("B");
        low_sun.sun_elevation = 5.0;
        let mut undated = row("C");
        undated.datetime = None;

        for scene in [early, low_sun, undated] {
            let result = classify_row(&scene, &config());
            assert!(!result.default_accepted, "{} should not be accepted", scene.key);
            assert_eq!(result.label(), ReviewLabel::Tbd);
        }
    }

    #[test]
    fn test_min_lst_is_a_lower_limit() {
        let mut cold = row("A");
        cold.min_lst = 270.0;
        assert_eq!(classify_row(&cold, &config()).label(), ReviewLabel::Tbd);

        cold.min_lst = 250.0;
        assert_eq!(classify_row(&cold, &config()).label(), ReviewLabel::Rejected);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut scene = row("A");
        scene.invalid_ratio_aoi = 10.0;
        scene.invalid_ratio_image = 10.0;
        scene.min_lst = 280.0;
        scene.max_lst = 320.0;
        scene.sun_elevation = 90.0;

        assert_eq!(classify_row(&scene, &config()).label(), ReviewLabel::Validated);
    }

    #[test]
    fn test_nan_metrics_are_rejected() {
        let mut scene = row("A");
        scene.max_lst = f64::NAN;
        assert_eq!(classify_row(&scene, &config()).label(), ReviewLabel::Rejected);
    }

    #[test]
    fn test_equal_bounds_keep_sets_disjoint() {
        let mut config = config();
        config.invalid_ratio_aoi = UpperLimit { strict: 10.0, loose: 10.0 };

        let mut inside = row("A");
        inside.invalid_ratio_aoi = 10.0;
        let mut outside = row("B");
        outside.invalid_ratio_aoi = 10.5;

        assert_eq!(classify_row(&inside, &config).label(), ReviewLabel::Validated);
        assert_eq!(classify_row(&outside, &config).label(), ReviewLabel::Rejected);
    }

    #[test]
    fn test_classification_invariants_over_grid() {
        let mut rows = Vec::new();
        for (i, aoi) in [0.0, 5.0, 10.0, 25.0, 40.0, 60.0].iter().enumerate() {
            for (j, min_lst) in [250.0, 265.0, 285.0].iter().enumerate() {
                let mut scene = row(&format!("S{}{}", i, j));
                scene.invalid_ratio_aoi = *aoi;
                scene.min_lst = *min_lst;
                rows.push(scene);
            }
        }
        let table = table(rows);

        let first = classify(&table, &config());
        let second = classify(&table, &config());

        assert_eq!(first, second);
        assert_eq!(first.len(), table.len());
        for result in &first {
            assert!(!(result.default_accepted && result.visible_for_review));
        }
    }

    #[test]
    fn test_slider_mapping() {
        let upper = UpperLimit::from_slider((10.0, 40.0));
        assert_eq!(upper, UpperLimit { strict: 10.0, loose: 40.0 });

        let lower = LowerLimit::from_slider((260.0, 280.0));
        assert_eq!(lower, LowerLimit { strict: 280.0, loose: 260.0 });
    }

    #[test]
    fn test_initial_config_validates_only_clean_scenes() {
        let mut clean = row("A");
        clean.invalid_ratio_aoi = 0.0;
        clean.invalid_ratio_image = 0.0;
        let dirty = row("B");
        let table = table(vec![clean, dirty]);

        let initial = FilterConfig::initial(&table.ranges(), &FilterDefaults::default());

        assert_eq!(initial.invalid_ratio_aoi, UpperLimit { strict: 0.0, loose: 100.0 });
        assert_eq!(initial.min_lst, LowerLimit { strict: 290.0, loose: 290.0 });
        assert_eq!(initial.sun_elevation, Range::new(10.0, 90.0));
        let labels: Vec<_> = classify(&table, &initial).iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec![ReviewLabel::Validated, ReviewLabel::Tbd]);
    }
}
