use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::dataset::Dataset;
use crate::error::DatasetError;
use crate::schema::{SkeletonSchema, ValidationReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Dataset files (`*.json`) directly inside `dir`, sorted by name.
pub fn list_datasets(dir: impl AsRef<Path>) -> Vec<DatasetEntry> {
    walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|f| f.ok())
        .filter(|f| f.file_type().is_file())
        .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
        .filter_map(|f| {
            let name = f.path().file_stem()?.to_str()?.to_string();
            Some(DatasetEntry { name, path: f.into_path() })
        })
        .sorted_by(|a, b| a.name.cmp(&b.name))
        .collect()
}

pub fn load_dataset(
    path: impl AsRef<Path>,
    schema: &SkeletonSchema,
) -> Result<(Dataset, ValidationReport), DatasetError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .map_err(|source| DatasetError::Io { path: path.to_path_buf(), source })?;
    let (dataset, report) = Dataset::from_json(&json, schema)?;
    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    Ok((dataset.named(name), report))
}


#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"{"frameRate": 10, "sensorNames": ["head"], "frames": [[[1, 2, 3]]]}"#;

    #[test]
    fn lists_only_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("walk.json"), TINY).unwrap();
        fs::write(dir.path().join("run.json"), TINY).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("calibration")).unwrap();
        fs::write(dir.path().join("calibration").join("walk.json"), "{}").unwrap();

        let names: Vec<String> = list_datasets(dir.path()).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["run", "walk"]);
    }

    #[test]
    fn load_names_dataset_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.json");
        fs::write(&path, TINY).unwrap();

        let (dataset, report) = load_dataset(&path, &SkeletonSchema::canonical()).unwrap();
        assert_eq!(dataset.name(), "walk");
        assert_eq!(dataset.frame_count(), 1);
        assert_eq!(report.missing_sensors.len(), 14);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(dir.path().join("nope.json"), &SkeletonSchema::canonical()).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
