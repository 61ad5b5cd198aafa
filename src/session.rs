//! Review session state.
//!
//! A [`SessionContext`] holds the scene table of the loaded collection, the
//! current filters, their classification and the operator's picks. Changing
//! the filters re-runs the classification from scratch and drops picks of
//! scenes that left the review table.

use tracing::debug;

use crate::charts::{self, Histogram, TimePoint};
use crate::classify::{classify, Classification, FilterConfig, ReviewLabel};
use crate::collection::Collection;
use crate::config::FilterDefaults;
use crate::selection::{self, DeliverySet, Selection};
use crate::table::{Metric, MetricRanges, SceneRow, SceneTable};

pub struct SessionContext {
    table: SceneTable,
    ranges: MetricRanges,
    filters: FilterConfig,
    classes: Vec<Classification>,
    selection: Selection,
}

impl SessionContext {
    pub fn new(collection: &Collection, defaults: &FilterDefaults) -> Self {
        let table = SceneTable::build(collection);
        let ranges = table.ranges();
        let filters = FilterConfig::initial(&ranges, defaults);
        let classes = classify(&table, &filters);

        Self {
            table,
            ranges,
            filters,
            classes,
            selection: Selection::new(),
        }
    }

    pub fn table(&self) -> &SceneTable {
        &self.table
    }

    pub fn ranges(&self) -> &MetricRanges {
        &self.ranges
    }

    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    pub fn classes(&self) -> &[Classification] {
        &self.classes
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Apply new filters. Returns the picks dropped because their scene is no
    /// longer offered for review.
    pub fn set_filters(&mut self, filters: FilterConfig) -> Vec<String> {
        self.filters = filters;
        self.classes = classify(&self.table, &self.filters);
        let dropped = self.selection.retain_visible(&self.table, &self.classes);
        if !dropped.is_empty() {
            debug!("Filter change dropped {} picks: {:?}", dropped.len(), dropped);
        }
        dropped
    }

    /// Rows offered for review, in table order.
    pub fn review_rows(&self) -> Vec<&SceneRow> {
        self.table
            .rows
            .iter()
            .zip(&self.classes)
            .filter(|(_, class)| class.visible_for_review)
            .map(|(row, _)| row)
            .collect()
    }

    pub fn classification(&self, key: &str) -> Option<Classification> {
        self.table.position(key).map(|index| self.classes[index])
    }

    pub fn label(&self, key: &str) -> Option<ReviewLabel> {
        self.classification(key).map(|class| class.label())
    }

    /// Flip a pick. Only scenes under review can be picked; returns the new
    /// state, or `None` if the scene is not under review.
    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        match self.classification(key) {
            Some(class) if class.visible_for_review => Some(self.selection.toggle(key)),
            _ => None,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn delivery_set(&self) -> DeliverySet {
        selection::merge(&self.table, &self.classes, &self.selection)
    }

    pub fn count(&self, label: ReviewLabel) -> usize {
        self.classes.iter().filter(|class| class.label() == label).count()
    }

    /// Distribution of one metric over every scene and over the delivery set.
    pub fn histogram(&self, metric: Metric, bins: usize) -> Histogram {
        charts::histogram(metric, &self.table, &self.delivery_set(), bins)
    }

    pub fn time_series(&self) -> Vec<TimePoint> {
        charts::time_series(&self.table, &self.classes, &self.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::UpperLimit;
    use crate::collection::fixtures::metadata;
    use crate::collection::SceneRecord;

    fn session() -> SessionContext {
        let mut collection = Collection::default();
        let scenes = [
            ("A", metadata("2024-06-01T10:30:00Z", 0.0, 0.0, 290.0, 300.0)),
            ("B", metadata("2024-06-02T10:30:00Z", 20.0, 5.0, 290.0, 300.0)),
            ("C", metadata("2024-06-03T10:30:00Z", 60.0, 5.0, 290.0, 300.0)),
        ]
        .into_iter()
        .map(|(key, metadata)| {
            (
                key.to_string(),
                SceneRecord {
                    key: key.to_string(),
                    satellite: "landsat8".to_string(),
                    workflow_id: "wf-a".to_string(),
                    artifacts: Vec::new(),
                    metadata: metadata.as_object().cloned().unwrap_or_default(),
                },
            )
        })
        .collect();
        collection.merge("wf-a", scenes);
        SessionContext::new(&collection, &FilterDefaults::default())
    }

    #[test]
    fn test_initial_classification() {
        let session = session();

        assert_eq!(session.label("A"), Some(ReviewLabel::Validated));
        assert_eq!(session.label("B"), Some(ReviewLabel::Tbd));
        assert_eq!(session.label("C"), Some(ReviewLabel::Tbd));
        assert_eq!(session.review_rows().len(), 2);
        assert_eq!(session.delivery_set().keys(), vec!["A"]);
    }

    #[test]
    fn test_only_review_rows_can_be_picked() {
        let mut session = session();

        assert_eq!(session.toggle("A"), None);
        assert_eq!(session.toggle("missing"), None);
        assert_eq!(session.toggle("B"), Some(true));
        assert_eq!(session.delivery_set().keys(), vec!["A", "B"]);
    }

    #[test]
    fn test_filter_change_drops_stale_picks() {
        let mut session = session();
        session.toggle("B");
        session.toggle("C");

        let mut filters = *session.filters();
        filters.invalid_ratio_aoi = UpperLimit { strict: 0.0, loose: 40.0 };
        let dropped = session.set_filters(filters);

        assert_eq!(dropped, vec!["C"]);
        assert_eq!(session.label("C"), Some(ReviewLabel::Rejected));
        assert_eq!(session.count(ReviewLabel::Rejected), 1);
        assert_eq!(session.delivery_set().keys(), vec!["A", "B"]);

        let hist = session.histogram(Metric::HISTOGRAM[0], 20);
        assert_eq!(hist.total_all(), 3);
        assert_eq!(hist.total_selected(), 2);
    }

    #[test]
    fn test_reapplying_same_filters_is_stable() {
        let mut session = session();
        session.toggle("B");
        let before = session.classes().to_vec();

        let dropped = session.set_filters(*session.filters());

        assert!(dropped.is_empty());
        assert_eq!(session.classes(), before.as_slice());
        assert!(session.selection().contains("B"));
    }
}
