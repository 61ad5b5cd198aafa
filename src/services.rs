//! Wiring of the external systems the dashboard and the delivery tool share.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::argo::{ArgoClient, WorkflowSource};
use crate::collection::CollectionLoader;
use crate::config::Config;
use crate::delivery::Dispatcher;
use crate::storage::{ObjectStore, S3Store};

pub struct Services {
    pub workflows: Box<dyn WorkflowSource>,
    pub loader: CollectionLoader,
    pub dispatcher: Dispatcher,
}

impl Services {
    pub fn new(
        workflows: Box<dyn WorkflowSource>,
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        config: &Config,
    ) -> Self {
        let loader = CollectionLoader::new(
            Arc::clone(&source),
            &config.storage.product_bucket,
            config.collection.clone(),
        );
        let dispatcher = Dispatcher::new(source, destination, &config.storage.delivery_bucket)
            .with_parallelism(config.delivery.parallelism)
            .with_dry_run(config.delivery.dry_run);

        Self {
            workflows,
            loader,
            dispatcher,
        }
    }

    /// Argo plus one S3 client per credential profile.
    pub fn connect(config: &Config) -> Result<Self> {
        let runtime = S3Store::runtime().context("Failed to start storage runtime")?;

        let source_settings = config.storage.source_settings();
        let source = S3Store::connect(&source_settings, Arc::clone(&runtime))
            .context("Failed to connect to the product bucket")?;
        let destination_settings = config.storage.destination_settings();
        let destination = S3Store::connect(&destination_settings, runtime)
            .context("Failed to connect to the delivery bucket")?;

        info!(
            "Reading from {} with profile {:?}, delivering to {} with profile {:?}",
            config.storage.product_bucket,
            source.profile(),
            config.storage.delivery_bucket,
            destination.profile()
        );

        Ok(Self::new(
            Box::new(ArgoClient::from_config(&config.argo)),
            Arc::new(source),
            Arc::new(destination),
            config,
        ))
    }

    pub fn list_workflows(&self, config: &Config) -> crate::error::Result<Vec<String>> {
        self.workflows
            .list_workflows(&config.argo.namespace, &config.argo.workflow_template)
    }
}
