use std::fs;
use std::path::{Path, PathBuf};

use resources::{Calibration, CalibrationError, ImportReport};

use crate::setting::Setting;

pub struct SettingSave {
    path: PathBuf,
}

impl SettingSave {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().join("setting.json") }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn load(&self) -> Option<Setting> {
        let bytes = fs::read(self.path.as_path()).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(setting) => Some(setting),
            Err(err) => {
                tracing::warn!(path = ?self.path, %err, "setting file unreadable, using defaults");
                None
            }
        }
    }

    pub fn save(&self, setting: &Setting) {
        let bytes = match serde_json::to_vec_pretty(setting) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(%err, "setting serialization failed");
                return;
            }
        };
        if let Err(err) = fs::write(self.path.as_path(), bytes) {
            tracing::error!(path = ?self.path, %err, "setting write error");
        }
    }
}

/// One calibration file per dataset under `<data>/calibration/`.
pub struct CalibrationSave {
    dir: PathBuf,
}

impl CalibrationSave {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { dir: path.as_ref().join("calibration") }
    }

    pub fn path(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{dataset}.json"))
    }

    pub fn exists(&self, dataset: &str) -> bool {
        self.path(dataset).is_file()
    }

    /// A missing file is an empty calibration, not an error.
    pub fn load(&self, dataset: &str) -> Result<(Calibration, ImportReport), CalibrationError> {
        if !self.exists(dataset) {
            return Ok((Calibration::new(), ImportReport::default()));
        }
        Calibration::load(self.path(dataset))
    }

    pub fn save(&self, dataset: &str, calibration: &Calibration) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(dataset);
        fs::write(&path, calibration.to_json_pretty())?;
        tracing::info!(?path, entries = calibration.len(), "calibration saved");
        Ok(path)
    }
}

/// Layout of the data directory: `setting.json`, `datasets/*.json`, `calibration/*.json`.
pub struct Save {
    pub setting: SettingSave,
    pub calibration: CalibrationSave,
    pub datasets: PathBuf,
}

impl Save {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = data_path.into();
        if let Err(err) = fs::create_dir_all(&path) {
            tracing::warn!(?path, %err, "cannot create data directory");
        }
        Self {
            setting: SettingSave::new(&path),
            calibration: CalibrationSave::new(&path),
            datasets: path.join("datasets"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm as glm;

    #[test]
    fn setting_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let save = SettingSave::new(dir.path());
        assert!(save.load().is_none());

        let mut setting = Setting::default();
        setting.playback.max_catch_up_steps = 7;
        save.save(&setting);
        assert_eq!(save.load(), Some(setting));
    }

    #[test]
    fn broken_setting_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let save = SettingSave::new(dir.path());
        fs::write(save.path(), "{ not json").unwrap();
        assert!(save.load().is_none());
    }

    #[test]
    fn calibration_per_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let save = Save::new(dir.path());
        let (empty, _) = save.calibration.load("walk").unwrap();
        assert!(empty.is_empty());

        let mut calibration = Calibration::new();
        calibration.set("lumbar", glm::vec3(5.0, 0.0, 0.0));
        calibration.set("head", glm::Vec3::zeros());
        let path = save.calibration.save("walk", &calibration).unwrap();
        assert!(path.ends_with("calibration/walk.json"));

        let (loaded, report) = save.calibration.load("walk").unwrap();
        assert_eq!(loaded, calibration);
        assert!(report.rejected.is_empty());
        assert!(!save.calibration.exists("run"));
    }
}
