use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::ObjectStore;
use crate::error::{QcError, Result};

/// Object store kept entirely in memory, keyed by full URI.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a write.
    pub fn insert(&self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(uri.into(), bytes.into());
        }
    }

    pub fn get(&self, uri: &str) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(uri).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryStore {
    fn list_children(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };

        let objects = self
            .objects
            .lock()
            .map_err(|_| QcError::transport("memory store lock poisoned"))?;

        let children: BTreeSet<String> = objects
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split_once('/').map(|(child, _)| child))
            .filter(|child| !child.is_empty())
            .map(|child| format!("{}{}", prefix, child))
            .collect();

        Ok(children.into_iter().collect())
    }

    fn read(&self, uri: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let objects = self
            .objects
            .lock()
            .map_err(|_| QcError::transport("memory store lock poisoned"))?;
        objects
            .get(uri)
            .cloned()
            .ok_or_else(|| QcError::transport(format!("no such object: {}", uri)))
    }

    fn write(&self, uri: &str, bytes: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| QcError::transport("memory store lock poisoned"))?;
        objects.insert(uri.to_string(), bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
