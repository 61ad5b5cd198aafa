//! Scene collections assembled from workflow run outputs.

mod cache;
mod loader;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub use cache::CollectionCache;
pub use loader::CollectionLoader;

/// A named file produced for a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub uri: String,
}

/// Everything known about one processed scene.
#[derive(Debug, Clone, Serialize)]
pub struct SceneRecord {
    pub key: String,
    pub satellite: String,
    pub workflow_id: String,
    pub artifacts: Vec<Artifact>,
    /// The metadata document exactly as the pipeline wrote it.
    pub metadata: Map<String, Value>,
}

/// Scenes merged from one or more workflow runs, keyed by scene identifier.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub scenes: BTreeMap<String, SceneRecord>,
    /// Scene keys replaced by a later run during the merge, each listed once.
    pub overwritten: BTreeSet<String>,
    /// Workflow runs merged, in merge order.
    pub workflows: Vec<String>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Merge scenes from a later run. Same-named scenes are replaced.
    pub fn merge(&mut self, workflow_id: &str, scenes: BTreeMap<String, SceneRecord>) {
        for (key, record) in scenes {
            if self.scenes.insert(key.clone(), record).is_some() {
                self.overwritten.insert(key);
            }
        }
        self.workflows.push(workflow_id.to_string());
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    pub const BUCKET: &str = "lst30-pipeline-product";

    /// Seed a workflow run into a memory store the way the pipeline lays it out.
    /// `scenes` is `(satellite, scene key, metadata document)`.
    pub fn seed_run(store: &MemoryStore, workflow_id: &str, scenes: &[(&str, &str, Value)]) {
        let parent = format!("s3://{}/{}/", BUCKET, workflow_id);

        let mut by_satellite: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
        for (satellite, key, metadata) in scenes {
            by_satellite.entry(*satellite).or_default().push(json!({
                "l1_item_href": format!("https://landsatlook.usgs.gov/stac-server/collections/landsat-c2l1/items/{}", key),
            }));

            store.insert(
                format!("{}{}/write-metadata/metadata.json", parent, key),
                metadata.to_string(),
            );
            store.insert(format!("{}{}/get-cloud-mask/cloud_mask.tif", parent, key), b"mask".to_vec());
            store.insert(format!("{}{}/lst-process/lst_kelvin.tif", parent, key), b"lst".to_vec());
        }

        for (satellite, items) in by_satellite {
            store.insert(
                format!("{}find-stac-items/{}/stac_items.json", parent, satellite),
                Value::Array(items).to_string(),
            );
        }
    }

    pub fn metadata(datetime: &str, aoi: f64, image: f64, min_lst: f64, max_lst: f64) -> Value {
        json!({
            "scene_datetime": datetime,
            "cloud_cover": 2.5,
            "no_data": 1.0,
            "sun_elevation": 45.0,
            "min_lst": min_lst,
            "max_lst": max_lst,
            "median_lst": (min_lst + max_lst) / 2.0,
            "invalid_ratio_aoi": aoi,
            "invalid_ratio_image": image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, workflow_id: &str) -> SceneRecord {
        SceneRecord {
            key: key.to_string(),
            satellite: "landsat8".to_string(),
            workflow_id: workflow_id.to_string(),
            artifacts: Vec::new(),
            metadata: Map::new(),
        }
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut collection = Collection::default();
        collection.merge("wf-a", BTreeMap::from([("X".to_string(), record("X", "wf-a")), ("Y".to_string(), record("Y", "wf-a"))]));
        collection.merge("wf-b", BTreeMap::from([("X".to_string(), record("X", "wf-b"))]));

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.scenes["X"].workflow_id, "wf-b");
        assert_eq!(collection.overwritten, BTreeSet::from(["X".to_string()]));
        assert_eq!(collection.workflows, vec!["wf-a", "wf-b"]);
    }

    #[test]
    fn test_scene_in_three_runs_counted_once() {
        let mut collection = Collection::default();
        for workflow_id in ["wf-a", "wf-b", "wf-c"] {
            collection.merge(workflow_id, BTreeMap::from([("X".to_string(), record("X", workflow_id))]));
        }

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.scenes["X"].workflow_id, "wf-c");
        assert_eq!(collection.overwritten.len(), 1);
    }
}
