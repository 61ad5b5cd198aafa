use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Artifact, Collection, SceneRecord};
use crate::config::CollectionConfig;
use crate::error::{QcError, Result};
use crate::storage::{basename, ObjectStore};

/// Entry of a per-satellite `stac_items.json` listing.
#[derive(Debug, Deserialize)]
struct StacItem {
    l1_item_href: String,
}

/// Reads workflow run outputs from the product bucket.
pub struct CollectionLoader {
    store: Arc<dyn ObjectStore>,
    product_bucket: String,
    config: CollectionConfig,
}

impl CollectionLoader {
    pub fn new(store: Arc<dyn ObjectStore>, product_bucket: &str, config: CollectionConfig) -> Self {
        Self {
            store,
            product_bucket: product_bucket.to_string(),
            config,
        }
    }

    fn run_prefix(&self, workflow_id: &str) -> String {
        format!("s3://{}/{}/", self.product_bucket, workflow_id)
    }

    fn is_excluded(&self, satellite: &str) -> bool {
        self.config
            .excluded_satellites
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(satellite))
    }

    /// Load and merge several runs. Later runs replace same-named scenes.
    pub fn load(&self, workflow_ids: &[String]) -> Result<Collection> {
        if workflow_ids.is_empty() {
            return Err(QcError::NotFound("no workflow selected".to_string()));
        }

        let mut collection = Collection::default();
        for workflow_id in workflow_ids {
            let scenes = self.load_run(workflow_id)?;
            collection.merge(workflow_id, scenes);
        }

        if !collection.overwritten.is_empty() {
            warn!(
                "{} scenes were loaded by more than one workflow, keeping the last: {:?}",
                collection.overwritten.len(),
                collection.overwritten
            );
        }

        if collection.is_empty() {
            return Err(QcError::NotFound(
                "No collections found, try another workflow id".to_string(),
            ));
        }

        info!(
            "Loaded {} scenes from {} workflows",
            collection.len(),
            workflow_ids.len()
        );
        Ok(collection)
    }

    /// Load all scenes of a single workflow run.
    pub fn load_run(&self, workflow_id: &str) -> Result<BTreeMap<String, SceneRecord>> {
        let parent = self.run_prefix(workflow_id);
        let groups_prefix = format!("{}{}/", parent, self.config.items_dir);

        let groups: Vec<String> = self
            .store
            .list_children(&groups_prefix)?
            .into_iter()
            .filter(|group| {
                let excluded = self.is_excluded(basename(group));
                if excluded {
                    debug!("Skipping excluded satellite group {}", group);
                }
                !excluded
            })
            .collect();

        if groups.is_empty() {
            return Err(QcError::NotFound(format!(
                "no collections found for workflow {}",
                workflow_id
            )));
        }

        // Scene key -> satellite, from the item listings
        let mut satellites: BTreeMap<String, String> = BTreeMap::new();
        for group in &groups {
            let satellite = basename(group).to_string();
            let listing_uri = format!("{}/{}", group, self.config.items_file);
            let listing = self.store.read_to_string(&listing_uri)?;
            let items: Vec<StacItem> = serde_json::from_str(&listing)
                .map_err(|e| QcError::decode(listing_uri.clone(), e))?;

            for item in items {
                let key = basename(&item.l1_item_href).to_string();
                satellites.insert(key, satellite.clone());
            }
        }

        let mut scenes = BTreeMap::new();
        for (key, satellite) in satellites {
            let metadata = self.read_metadata(&parent, &key)?;
            let artifacts = self
                .config
                .artifacts
                .iter()
                .map(|layout| Artifact {
                    name: layout.name.clone(),
                    uri: format!("{}{}/{}", parent, key, layout.path),
                })
                .collect();

            scenes.insert(
                key.clone(),
                SceneRecord {
                    key,
                    satellite,
                    workflow_id: workflow_id.to_string(),
                    artifacts,
                    metadata,
                },
            );
        }

        debug!("Workflow {} produced {} scenes", workflow_id, scenes.len());
        Ok(scenes)
    }

    fn read_metadata(&self, parent: &str, key: &str) -> Result<Map<String, Value>> {
        let uri = format!("{}{}/{}", parent, key, self.config.metadata_path);
        let content = self.store.read_to_string(&uri)?;
        serde_json::from_str(&content).map_err(|e| QcError::decode(uri, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::fixtures::{metadata, seed_run, BUCKET};
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn loader(store: Arc<MemoryStore>) -> CollectionLoader {
        CollectionLoader::new(store, BUCKET, CollectionConfig::default())
    }

    #[test]
    fn test_load_run_builds_records() {
        let store = Arc::new(MemoryStore::new());
        seed_run(
            &store,
            "wf-a",
            &[
                ("landsat8", "LC08_A", metadata("2024-06-01T10:30:00Z", 5.0, 5.0, 290.0, 310.0)),
                ("landsat9", "LC09_B", metadata("2024-06-03T10:30:00Z", 20.0, 15.0, 285.0, 330.0)),
            ],
        );

        let scenes = loader(store).load_run("wf-a").unwrap();

        assert_eq!(scenes.len(), 2);
        let a = &scenes["LC08_A"];
        assert_eq!(a.satellite, "landsat8");
        assert_eq!(a.workflow_id, "wf-a");
        assert_eq!(a.metadata["min_lst"], json!(290.0));
        assert_eq!(
            a.artifacts.iter().map(|artifact| artifact.uri.as_str()).collect::<Vec<_>>(),
            vec![
                "s3://lst30-pipeline-product/wf-a/LC08_A/get-cloud-mask/cloud_mask.tif",
                "s3://lst30-pipeline-product/wf-a/LC08_A/lst-process/lst_kelvin.tif",
                "s3://lst30-pipeline-product/wf-a/LC08_A/write-metadata/metadata.json",
            ]
        );
        assert_eq!(scenes["LC09_B"].satellite, "landsat9");
    }

    #[test]
    fn test_excluded_satellites_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        seed_run(
            &store,
            "wf-a",
            &[
                ("landsat8", "LC08_A", metadata("2024-06-01T10:30:00Z", 5.0, 5.0, 290.0, 310.0)),
                ("ecostress", "ECO_C", metadata("2024-06-02T10:30:00Z", 5.0, 5.0, 290.0, 310.0)),
            ],
        );

        let scenes = loader(store).load_run("wf-a").unwrap();

        assert_eq!(scenes.keys().collect::<Vec<_>>(), vec!["LC08_A"]);
    }

    #[test]
    fn test_unknown_run_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = loader(store).load_run("wf-missing").unwrap_err();
        assert!(matches!(err, QcError::NotFound(_)));
    }

    #[test]
    fn test_only_excluded_groups_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        seed_run(
            &store,
            "wf-eco",
            &[("ecostress", "ECO_C", metadata("2024-06-02T10:30:00Z", 5.0, 5.0, 290.0, 310.0))],
        );

        assert!(matches!(loader(store).load(&["wf-eco".to_string()]), Err(QcError::NotFound(_))));
    }

    #[test]
    fn test_merge_two_runs_keeps_last_scene() {
        let store = Arc::new(MemoryStore::new());
        seed_run(
            &store,
            "wf-a",
            &[
                ("landsat8", "X", metadata("2024-06-01T10:30:00Z", 5.0, 5.0, 290.0, 310.0)),
                ("landsat8", "Y", metadata("2024-06-02T10:30:00Z", 5.0, 5.0, 290.0, 310.0)),
            ],
        );
        seed_run(
            &store,
            "wf-b",
            &[("landsat9", "X", metadata("2024-06-05T10:30:00Z", 7.0, 7.0, 291.0, 311.0))],
        );

        let collection = loader(store)
            .load(&["wf-a".to_string(), "wf-b".to_string()])
            .unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.scenes["X"].workflow_id, "wf-b");
        assert_eq!(collection.scenes["X"].satellite, "landsat9");
        assert_eq!(collection.overwritten.iter().collect::<Vec<_>>(), vec!["X"]);
    }

    #[test]
    fn test_empty_selection_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(loader(store).load(&[]), Err(QcError::NotFound(_))));
    }

    #[test]
    fn test_missing_metadata_is_transport_error() {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            "s3://lst30-pipeline-product/wf-a/find-stac-items/landsat8/stac_items.json",
            r#"[{"l1_item_href": "https://example.com/items/LC08_A"}]"#,
        );

        let err = loader(store).load_run("wf-a").unwrap_err();
        assert!(matches!(err, QcError::Transport(_)));
    }

    #[test]
    fn test_malformed_listing_is_decode_error() {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            "s3://lst30-pipeline-product/wf-a/find-stac-items/landsat8/stac_items.json",
            r#"{"not": "a list"}"#,
        );

        let err = loader(store).load_run("wf-a").unwrap_err();
        assert!(matches!(err, QcError::Decode { .. }));
    }
}
