//! Manual review selections and the resulting delivery set.

use std::collections::BTreeSet;

use crate::classify::Classification;
use crate::table::{SceneRow, SceneTable};

/// Scenes the operator picked from the review table, by scene key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a pick; returns whether the scene is now selected.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string());
            true
        }
    }

    pub fn select(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Drop picks of scenes that are no longer offered for review.
    /// Returns the dropped keys.
    pub fn retain_visible(&mut self, table: &SceneTable, classes: &[Classification]) -> Vec<String> {
        let stale: Vec<String> = self
            .keys
            .iter()
            .filter(|key| {
                table
                    .position(key)
                    .map(|index| !classes[index].visible_for_review)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        for key in &stale {
            self.keys.remove(key);
        }
        stale
    }
}

/// Scenes approved for delivery, ordered and unique by scene key.
#[derive(Debug, Clone, Default)]
pub struct DeliverySet {
    pub scenes: Vec<SceneRow>,
}

impl DeliverySet {
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.scenes.iter().map(|scene| scene.key.as_str()).collect()
    }

    pub fn artifact_count(&self) -> usize {
        self.scenes.iter().map(|scene| scene.artifacts.len()).sum()
    }
}

/// Validated scenes plus the manual picks that are currently under review.
pub fn merge(table: &SceneTable, classes: &[Classification], selection: &Selection) -> DeliverySet {
    let scenes = table
        .rows
        .iter()
        .zip(classes)
        .filter(|(row, class)| {
            class.default_accepted || (class.visible_for_review && selection.contains(&row.key))
        })
        .map(|(row, _)| row.clone())
        .collect();

    DeliverySet { scenes }
}
