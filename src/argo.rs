//! Workflow listing against the Argo Workflows server API.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::config::ArgoConfig;
use crate::error::{QcError, Result};

/// Label Argo puts on every workflow started from a template.
pub const TEMPLATE_LABEL: &str = "workflows.argoproj.io/workflow-template";

/// Anything that can enumerate workflow runs of a template.
pub trait WorkflowSource {
    fn list_workflows(&self, namespace: &str, workflow_template: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    items: Option<Vec<WorkflowItem>>,
}

#[derive(Debug, Deserialize)]
struct WorkflowItem {
    metadata: WorkflowMetadata,
}

#[derive(Debug, Deserialize)]
struct WorkflowMetadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

/// Keep the names of workflows started from `workflow_template`, in server order.
pub fn workflow_names(body: &str, workflow_template: &str) -> Result<Vec<String>> {
    let list: WorkflowList =
        serde_json::from_str(body).map_err(|e| QcError::decode("workflow list", e))?;

    Ok(list
        .items
        .unwrap_or_default()
        .into_iter()
        .filter(|item| {
            item.metadata.labels.get(TEMPLATE_LABEL).map(String::as_str) == Some(workflow_template)
        })
        .map(|item| item.metadata.name)
        .collect())
}

/// HTTP client for the workflow server. Listings are cached per
/// (namespace, template) for the lifetime of the client.
pub struct ArgoClient {
    server_address: String,
    cache: Mutex<HashMap<(String, String), Vec<String>>>,
}

impl ArgoClient {
    pub fn new(server_address: &str) -> Self {
        Self {
            server_address: server_address.trim_end_matches('/').to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ArgoConfig) -> Self {
        Self::new(&config.server_address)
    }

    fn list_url(&self, namespace: &str) -> String {
        format!("{}/api/v1/workflows/{}", self.server_address, namespace)
    }

    fn fetch(&self, namespace: &str, workflow_template: &str) -> Result<Vec<String>> {
        let url = self.list_url(namespace);
        debug!("Listing workflows from {}", url);

        let response = ureq::get(&url)
            .set("Content-Type", "application/json")
            .call()
            .map_err(|e| QcError::transport(format!("workflow listing failed: {}", e)))?;

        let body = response
            .into_string()
            .map_err(|e| QcError::transport(format!("failed to read workflow listing: {}", e)))?;

        workflow_names(&body, workflow_template)
    }
}

impl WorkflowSource for ArgoClient {
    fn list_workflows(&self, namespace: &str, workflow_template: &str) -> Result<Vec<String>> {
        let key = (namespace.to_string(), workflow_template.to_string());

        if let Ok(cache) = self.cache.lock() {
            if let Some(names) = cache.get(&key) {
                return Ok(names.clone());
            }
        }

        let names = self.fetch(namespace, workflow_template)?;
        info!(
            "Found {} workflows of template {} in {}",
            names.len(),
            workflow_template,
            namespace
        );

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, names.clone());
        }

        Ok(names)
    }
}
