//! Delivery of approved scenes to a customer bucket.
//!
//! Every artifact of every scene in the delivery set is copied to
//! ```text
//! s3://<delivery-bucket>/<customer>/<aoi-name>/<workflow-id>/<scene-key>/<filename>
//! ```
//! Copies are independent: they run in parallel and a failing copy never stops
//! the others. Failures are collected into the report. There is no rollback.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{QcError, Result, ValidationError};
use crate::selection::DeliverySet;
use crate::storage::{basename, copy_object, ObjectStore};

/// Operator inputs for a delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub customer_id: String,
    pub aoi_name: String,
}

impl DeliveryRequest {
    pub fn new(customer_id: &str, aoi_name: &str) -> Self {
        Self {
            customer_id: customer_id.trim().to_string(),
            aoi_name: aoi_name.trim().to_string(),
        }
    }

    pub fn validate(&self, set: &DeliverySet) -> std::result::Result<(), ValidationError> {
        if self.customer_id.trim().is_empty() {
            return Err(ValidationError::MissingCustomerId);
        }
        if self.aoi_name.trim().is_empty() {
            return Err(ValidationError::MissingAoiName);
        }
        if set.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(())
    }
}

/// A single planned artifact copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub scene_key: String,
    pub artifact: String,
    pub source: String,
    pub destination: String,
}

/// Every copy a delivery would perform, in scene then artifact order.
#[derive(Debug, Clone)]
pub struct DeliveryPlan {
    pub request: DeliveryRequest,
    pub jobs: Vec<CopyJob>,
    pub scene_count: usize,
}

pub fn destination_uri(
    delivery_bucket: &str,
    request: &DeliveryRequest,
    workflow_id: &str,
    scene_key: &str,
    source_uri: &str,
) -> String {
    format!(
        "s3://{}/{}/{}/{}/{}/{}",
        delivery_bucket,
        request.customer_id.trim(),
        request.aoi_name.trim(),
        workflow_id,
        scene_key,
        basename(source_uri)
    )
}

/// Validate the request and lay out every copy. No storage access.
pub fn plan_delivery(
    set: &DeliverySet,
    request: &DeliveryRequest,
    delivery_bucket: &str,
) -> Result<DeliveryPlan> {
    request.validate(set)?;

    let jobs = set
        .scenes
        .iter()
        .flat_map(|scene| {
            scene.artifacts.iter().map(move |artifact| CopyJob {
                scene_key: scene.key.clone(),
                artifact: artifact.name.clone(),
                source: artifact.uri.clone(),
                destination: destination_uri(
                    delivery_bucket,
                    request,
                    &scene.workflow_id,
                    &scene.key,
                    &artifact.uri,
                ),
            })
        })
        .collect();

    Ok(DeliveryPlan {
        request: request.clone(),
        jobs,
        scene_count: set.len(),
    })
}

#[derive(Debug, Clone)]
pub struct CopiedArtifact {
    pub job: CopyJob,
    pub bytes: u64,
}

/// Outcome of a delivery.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub succeeded: Vec<CopiedArtifact>,
    pub failed: Vec<(CopyJob, String)>,
    /// Jobs that were only logged.
    pub planned_only: Vec<CopyJob>,
    pub scene_count: usize,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.succeeded.iter().map(|copied| copied.bytes).sum()
    }

    pub fn summary(&self) -> String {
        if !self.planned_only.is_empty() {
            return format!(
                "Dry run: {} files from {} scenes would be delivered",
                self.planned_only.len(),
                self.scene_count
            );
        }
        if self.failed.is_empty() {
            format!(
                "Delivered {} files from {} scenes",
                self.succeeded.len(),
                self.scene_count
            )
        } else {
            format!(
                "Delivered {} files, {} failed",
                self.succeeded.len(),
                self.failed.len()
            )
        }
    }
}

/// Copies artifacts from the product store to the delivery store.
pub struct Dispatcher {
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    delivery_bucket: String,
    parallelism: usize,
    dry_run: bool,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        delivery_bucket: &str,
    ) -> Self {
        Self {
            source,
            destination,
            delivery_bucket: delivery_bucket.to_string(),
            parallelism: 1,
            dry_run: false,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn plan(&self, set: &DeliverySet, request: &DeliveryRequest) -> Result<DeliveryPlan> {
        plan_delivery(set, request, &self.delivery_bucket)
    }

    /// Validate, plan and execute a delivery.
    pub fn dispatch(&self, set: &DeliverySet, request: &DeliveryRequest) -> Result<DeliveryReport> {
        let plan = self.plan(set, request)?;
        self.execute(&plan)
    }

    pub fn execute(&self, plan: &DeliveryPlan) -> Result<DeliveryReport> {
        let mut report = DeliveryReport {
            scene_count: plan.scene_count,
            ..Default::default()
        };

        if self.dry_run {
            for job in &plan.jobs {
                info!("saving {} to {}", job.source, job.destination);
            }
            report.planned_only = plan.jobs.clone();
            return Ok(report);
        }

        info!(
            "Delivering {} files for customer {} / {} with {} workers",
            plan.jobs.len(),
            plan.request.customer_id,
            plan.request.aoi_name,
            self.parallelism
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
            .map_err(|e| QcError::transport(format!("failed to start copy workers: {}", e)))?;

        let outcomes: Vec<(CopyJob, Result<u64>)> = pool.install(|| {
            plan.jobs
                .par_iter()
                .map(|job| {
                    let outcome = copy_object(
                        self.source.as_ref(),
                        self.destination.as_ref(),
                        &job.source,
                        &job.destination,
                    );
                    (job.clone(), outcome)
                })
                .collect()
        });

        for (job, outcome) in outcomes {
            match outcome {
                Ok(bytes) => {
                    info!("saved {} to {}", job.source, job.destination);
                    report.succeeded.push(CopiedArtifact { job, bytes });
                }
                Err(e) => {
                    warn!("Failed to copy {} to {}: {}", job.source, job.destination, e);
                    report.failed.push((job, e.to_string()));
                }
            }
        }

        info!("{}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Artifact;
    use crate::storage::MemoryStore;
    use crate::table::fixtures::row;

    fn seeded_source(set: &DeliverySet) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for scene in &set.scenes {
            for artifact in &scene.artifacts {
                store.insert(artifact.uri.clone(), artifact.name.as_bytes().to_vec());
            }
        }
        store
    }

    fn two_scenes() -> DeliverySet {
        let mut b = row("LC09_B");
        b.workflow_id = "wf-b".to_string();
        b.artifacts.push(Artifact {
            name: "metadata".to_string(),
            uri: "s3://lst30-pipeline-product/wf-b/LC09_B/write-metadata/metadata.json".to_string(),
        });
        DeliverySet {
            scenes: vec![row("LC08_A"), b],
        }
    }

    #[test]
    fn test_validation_order() {
        let set = two_scenes();
        assert_eq!(
            DeliveryRequest::new("", "farm").validate(&set),
            Err(ValidationError::MissingCustomerId)
        );
        assert_eq!(
            DeliveryRequest::new("acme", "   ").validate(&set),
            Err(ValidationError::MissingAoiName)
        );
        assert_eq!(
            DeliveryRequest::new("acme", "farm").validate(&DeliverySet::default()),
            Err(ValidationError::EmptySelection)
        );
        assert_eq!(DeliveryRequest::new("acme", "farm").validate(&set), Ok(()));
    }

    #[test]
    fn test_missing_customer_performs_no_writes() {
        let set = two_scenes();
        let source = seeded_source(&set);
        let destination = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(source.clone(), destination.clone(), "data-delivery");

        let err = dispatcher
            .dispatch(&set, &DeliveryRequest::new("", "farm"))
            .unwrap_err();

        assert!(matches!(err, QcError::Validation(ValidationError::MissingCustomerId)));
        assert_eq!(destination.write_count(), 0);
        assert_eq!(source.read_count(), 0);
    }

    #[test]
    fn test_one_copy_per_artifact_with_conventional_paths() {
        let set = two_scenes();
        let source = seeded_source(&set);
        let destination = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(source, destination.clone(), "data-delivery").with_parallelism(4);

        let report = dispatcher
            .dispatch(&set, &DeliveryRequest::new(" acme ", "north-farm"))
            .unwrap();

        assert_eq!(set.artifact_count(), 5);
        assert_eq!(report.succeeded.len(), 5);
        assert!(report.is_complete());
        assert_eq!(destination.write_count(), 5);

        let mut keys = destination.keys();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "s3://data-delivery/acme/north-farm/wf-a/LC08_A/cloud_mask.tif",
                "s3://data-delivery/acme/north-farm/wf-a/LC08_A/lst_kelvin.tif",
                "s3://data-delivery/acme/north-farm/wf-b/LC09_B/cloud_mask.tif",
                "s3://data-delivery/acme/north-farm/wf-b/LC09_B/lst_kelvin.tif",
                "s3://data-delivery/acme/north-farm/wf-b/LC09_B/metadata.json",
            ]
        );
        for copied in &report.succeeded {
            assert_eq!(basename(&copied.job.source), basename(&copied.job.destination));
        }
        assert_eq!(
            destination.get("s3://data-delivery/acme/north-farm/wf-b/LC09_B/metadata.json"),
            Some(b"metadata".to_vec())
        );
    }

    #[test]
    fn test_failed_copies_are_collected() {
        let set = two_scenes();
        let source = seeded_source(&set);
        let missing = &set.scenes[0].artifacts[0].uri;
        let source_without_one = Arc::new(MemoryStore::new());
        for key in source.keys() {
            if &key != missing {
                source_without_one.insert(key.clone(), source.get(&key).unwrap_or_default());
            }
        }
        let destination = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(source_without_one, destination.clone(), "data-delivery").with_parallelism(2);

        let report = dispatcher
            .dispatch(&set, &DeliveryRequest::new("acme", "farm"))
            .unwrap();

        assert_eq!(report.succeeded.len(), 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(&report.failed[0].0.source, missing);
        assert!(!report.is_complete());
        assert_eq!(destination.write_count(), 4);
        assert_eq!(report.summary(), "Delivered 4 files, 1 failed");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let set = two_scenes();
        let source = seeded_source(&set);
        let destination = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(source.clone(), destination.clone(), "data-delivery").with_dry_run(true);

        let report = dispatcher
            .dispatch(&set, &DeliveryRequest::new("acme", "farm"))
            .unwrap();

        assert_eq!(report.planned_only.len(), 5);
        assert!(report.succeeded.is_empty());
        assert_eq!(destination.write_count(), 0);
        assert_eq!(source.read_count(), 0);
        assert_eq!(report.summary(), "Dry run: 5 files from 2 scenes would be delivered");
    }
}
