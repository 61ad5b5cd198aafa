use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::session::SessionContext;
use crate::table::Metric;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// One scene as written to an export file
#[derive(Debug, Serialize)]
pub struct ExportedScene {
    pub key: String,
    pub scene_datetime: Option<String>,
    pub satellite: String,
    pub workflow_id: String,
    pub label: String,
    pub picked: bool,
    pub cloud_cover: Option<f64>,
    pub no_data: Option<f64>,
    pub invalid_pixel: Option<f64>,
    pub sun_elevation: Option<f64>,
    pub min_lst: Option<f64>,
    pub max_lst: Option<f64>,
    pub median_lst: Option<f64>,
    pub invalid_ratio_aoi: Option<f64>,
    pub invalid_ratio_image: Option<f64>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn scenes_for_export(session: &SessionContext) -> Vec<ExportedScene> {
    session
        .table()
        .rows
        .iter()
        .zip(session.classes())
        .map(|(row, class)| ExportedScene {
            key: row.key.clone(),
            scene_datetime: row.datetime.map(|dt| dt.to_rfc3339()),
            satellite: row.satellite.clone(),
            workflow_id: row.workflow_id.clone(),
            label: class.label().to_string(),
            picked: class.visible_for_review && session.selection().contains(&row.key),
            cloud_cover: finite(row.metric(Metric::CloudCover)),
            no_data: finite(row.metric(Metric::NoData)),
            invalid_pixel: finite(row.metric(Metric::InvalidPixel)),
            sun_elevation: finite(row.metric(Metric::SunElevation)),
            min_lst: finite(row.metric(Metric::MinLst)),
            max_lst: finite(row.metric(Metric::MaxLst)),
            median_lst: finite(row.metric(Metric::MedianLst)),
            invalid_ratio_aoi: finite(row.metric(Metric::InvalidRatioAoi)),
            invalid_ratio_image: finite(row.metric(Metric::InvalidRatioImage)),
        })
        .collect()
}

/// Default file name inside the export directory
pub fn default_export_path(dir: &Path, format: ExportFormat) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("lstqc_review_{}.{}", stamp, format.extension()))
}

/// Export the classified scene table. Returns the number of scenes written.
pub fn export_review(session: &SessionContext, output_path: &Path, format: ExportFormat) -> Result<usize> {
    let scenes = scenes_for_export(session);
    let count = scenes.len();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Json => export_json(&scenes, output_path)?,
        ExportFormat::Csv => export_csv(&scenes, output_path)?,
    }

    tracing::info!("Exported {} scenes to {}", count, output_path.display());
    Ok(count)
}

fn export_json(scenes: &[ExportedScene], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scenes)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn export_csv(scenes: &[ExportedScene], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    // Headers come from the struct field names
    for scene in scenes {
        wtr.serialize(scene)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::fixtures::metadata;
    use crate::collection::{Collection, SceneRecord};
    use crate::config::FilterDefaults;

    fn session() -> SessionContext {
        let mut collection = Collection::default();
        let mut broken = metadata("2024-06-02T10:30:00Z", 20.0, 5.0, 290.0, 300.0);
        broken["min_lst"] = serde_json::Value::Null;
        broken["max_lst"] = serde_json::json!(" inf ");
        let scenes = [
            ("A", metadata("2024-06-01T10:30:00Z", 0.0, 0.0, 290.0, 300.0)),
            ("B", broken),
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
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("review.csv");

        let count = export_review(&session(), &path, ExportFormat::Csv).unwrap();

        assert_eq!(count, 2);
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("key,scene_datetime,satellite,workflow_id,label,picked"));
        assert!(lines.next().unwrap().starts_with("A,2024-06-01T10:30:00+00:00,landsat8,wf-a,Validated,false"));
        let b = lines.next().unwrap();
        assert!(b.starts_with("B,"));
        assert!(b.contains(",Rejected,"));
    }

    #[test]
    fn test_export_json_keeps_missing_values_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.json");

        export_review(&session(), &path, ExportFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[1]["key"], "B");
        assert!(value[1]["min_lst"].is_null());
        assert!(value[1]["max_lst"].is_null());
        assert_eq!(value[0]["max_lst"], 300.0);
        assert_eq!(value[0]["label"], "Validated");
    }

    #[test]
    fn test_default_export_path_extension() {
        let path = default_export_path(Path::new("/tmp/exports"), ExportFormat::Csv);
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
        assert!(path.starts_with("/tmp/exports"));
    }
}
