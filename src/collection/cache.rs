use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{Collection, CollectionLoader};
use crate::error::Result;

/// Memoizes loaded collections by the exact, ordered list of workflow runs.
/// Entries live until the process exits. Failed loads are not cached.
#[derive(Default)]
pub struct CollectionCache {
    entries: HashMap<Vec<String>, Arc<Collection>>,
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        loader: &CollectionLoader,
        workflow_ids: &[String],
    ) -> Result<Arc<Collection>> {
        if let Some(collection) = self.entries.get(workflow_ids) {
            debug!("Collection cache hit for {:?}", workflow_ids);
            return Ok(Arc::clone(collection));
        }

        let collection = Arc::new(loader.load(workflow_ids)?);
        self.entries
            .insert(workflow_ids.to_vec(), Arc::clone(&collection));
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
