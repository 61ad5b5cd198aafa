use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::S3Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workflow runs preselected when the dashboard opens.
    #[serde(default)]
    pub default_workflows: Vec<String>,

    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default)]
    pub argo: ArgoConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub filters: FilterDefaults,

    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgoConfig {
    #[serde(default = "default_argo_server")]
    pub server_address: String,

    #[serde(default = "default_argo_namespace")]
    pub namespace: String,

    /// Only runs of this workflow template are offered for review.
    #[serde(default = "default_workflow_template")]
    pub workflow_template: String,
}

fn default_argo_server() -> String {
    "http://argo.product.internal".to_string()
}

fn default_argo_namespace() -> String {
    "lst30-pipeline".to_string()
}

fn default_workflow_template() -> String {
    "lst30-pipeline-v0.1.0".to_string()
}

impl Default for ArgoConfig {
    fn default() -> Self {
        Self {
            server_address: default_argo_server(),
            namespace: default_argo_namespace(),
            workflow_template: default_workflow_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding the pipeline outputs, one prefix per workflow run.
    #[serde(default = "default_product_bucket")]
    pub product_bucket: String,

    /// Bucket receiving customer deliveries.
    #[serde(default = "default_delivery_bucket")]
    pub delivery_bucket: String,

    #[serde(default = "default_source_profile")]
    pub source_profile: Option<String>,

    #[serde(default = "default_destination_profile")]
    pub destination_profile: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override for S3-compatible services.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_product_bucket() -> String {
    "lst30-pipeline-product".to_string()
}

fn default_delivery_bucket() -> String {
    "data-delivery".to_string()
}

fn default_source_profile() -> Option<String> {
    Some("ProductTest".to_string())
}

fn default_destination_profile() -> Option<String> {
    Some("SoftwareProduction".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            product_bucket: default_product_bucket(),
            delivery_bucket: default_delivery_bucket(),
            source_profile: default_source_profile(),
            destination_profile: default_destination_profile(),
            region: None,
            endpoint_url: None,
        }
    }
}

impl StorageConfig {
    pub fn source_settings(&self) -> S3Settings {
        S3Settings {
            profile: self.source_profile.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }

    pub fn destination_settings(&self) -> S3Settings {
        S3Settings {
            profile: self.destination_profile.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

/// One artifact produced per scene, relative to `<run>/<scene>/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub name: String,
    pub path: String,
}

impl ArtifactLayout {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Satellite groups that are never loaded.
    #[serde(default = "default_excluded_satellites")]
    pub excluded_satellites: Vec<String>,

    /// Directory under each run listing the per-satellite groups.
    #[serde(default = "default_items_dir")]
    pub items_dir: String,

    /// File inside each satellite group listing the processed items.
    #[serde(default = "default_items_file")]
    pub items_file: String,

    /// Per-scene metadata document, relative to the scene prefix.
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,

    /// Artifacts delivered for each scene. The metadata document is included.
    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<ArtifactLayout>,
}

fn default_excluded_satellites() -> Vec<String> {
    vec!["ecostress".to_string()]
}

fn default_items_dir() -> String {
    "find-stac-items".to_string()
}

fn default_items_file() -> String {
    "stac_items.json".to_string()
}

fn default_metadata_path() -> String {
    "write-metadata/metadata.json".to_string()
}

fn default_artifacts() -> Vec<ArtifactLayout> {
    vec![
        ArtifactLayout::new("cloud_mask", "get-cloud-mask/cloud_mask.tif"),
        ArtifactLayout::new("lst_kelvin", "lst-process/lst_kelvin.tif"),
        ArtifactLayout::new("metadata", "write-metadata/metadata.json"),
    ]
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            excluded_satellites: default_excluded_satellites(),
            items_dir: default_items_dir(),
            items_file: default_items_file(),
            metadata_path: default_metadata_path(),
            artifacts: default_artifacts(),
        }
    }
}

/// Initial filter positions; data-driven ranges come from the loaded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefaults {
    /// Allowed sun elevation, degrees.
    #[serde(default = "default_sun_elevation")]
    pub sun_elevation: (f64, f64),

    /// Slider domain for both invalid-ratio filters, percent.
    #[serde(default = "default_ratio_domain")]
    pub ratio_domain: (f64, f64),

    /// Number of histogram bins.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_sun_elevation() -> (f64, f64) {
    (10.0, 90.0)
}

fn default_ratio_domain() -> (f64, f64) {
    (0.0, 100.0)
}

fn default_histogram_bins() -> usize {
    20
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            sun_elevation: default_sun_elevation(),
            ratio_domain: default_ratio_domain(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Log planned copies without writing anything.
    #[serde(default)]
    pub dry_run: bool,

    /// Concurrent artifact copies.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_parallelism() -> usize {
    8
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            parallelism: default_parallelism(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lstqc")
        .join("exports")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_workflows: Vec::new(),
            export_dir: default_export_dir(),
            argo: ArgoConfig::default(),
            storage: StorageConfig::default(),
            collection: CollectionConfig::default(),
            filters: FilterDefaults::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Config {
    /// Load from `LSTQC_CONFIG` or the default location, writing defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("LSTQC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lstqc")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
