use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("frame rate must be a positive finite number, got {0}")]
    FrameRate(f64),
    #[error("duplicate sensor name: {0}")]
    DuplicateSensor(String),
    #[error("frame {frame} has {found} points, expected {expected}")]
    FrameShape { frame: usize, found: usize, expected: usize },
    #[error("frame {frame}, sensor {sensor}: point must have 3 components, got {found}")]
    PointShape { frame: usize, sensor: usize, found: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("failed to read calibration {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse calibration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("calibration file must be a JSON object")]
    NotAnObject,
}
