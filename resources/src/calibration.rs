use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalibrationEntry {
    position_offset: [f32; 3],
}

/// Entries dropped while importing a calibration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub accepted: usize,
    pub rejected: Vec<String>,
}

/// Per-sensor rest position offsets in source units. A missing key means a zero offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    offsets: BTreeMap<String, glm::Vec3>,
}

impl Calibration {
    pub fn new() -> Self { Self::default() }

    pub fn offset(&self, sensor: &str) -> glm::Vec3 {
        self.offsets.get(sensor).copied().unwrap_or_else(glm::Vec3::zeros)
    }

    /// Zero vectors remove the entry.
    pub fn set(&mut self, sensor: &str, offset: glm::Vec3) {
        if offset == glm::Vec3::zeros() {
            self.offsets.remove(sensor);
        } else {
            self.offsets.insert(sensor.to_string(), offset);
        }
    }

    pub fn remove(&mut self, sensor: &str) -> Option<glm::Vec3> {
        self.offsets.remove(sensor)
    }

    pub fn contains(&self, sensor: &str) -> bool {
        self.offsets.contains_key(sensor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &glm::Vec3)> {
        self.offsets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.offsets.len() }
    pub fn is_empty(&self) -> bool { self.offsets.is_empty() }

    /// Parses a calibration file. Malformed entries are dropped and listed in the report,
    /// only a file that is not a JSON object at all is an error.
    pub fn from_json(json: &str) -> Result<(Self, ImportReport), CalibrationError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = value else {
            return Err(CalibrationError::NotAnObject);
        };

        let mut calibration = Self::new();
        let mut report = ImportReport::default();
        for (sensor, entry) in map {
            match parse_entry(entry) {
                Some(offset) => {
                    calibration.set(&sensor, offset);
                    report.accepted += 1;
                }
                None => report.rejected.push(sensor),
            }
        }

        if !report.rejected.is_empty() {
            tracing::warn!(rejected = ?report.rejected, "malformed calibration entries dropped");
        }
        Ok((calibration, report))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<(Self, ImportReport), CalibrationError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|source| CalibrationError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> String {
        let entries: BTreeMap<&str, CalibrationEntry> = self.offsets.iter()
            .filter(|(_, v)| **v != glm::Vec3::zeros())
            .map(|(k, v)| (k.as_str(), CalibrationEntry { position_offset: [v.x, v.y, v.z] }))
            .collect();
        // A map of plain structs cannot fail to serialize.
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "{}".to_string())
    }
}

fn parse_entry(entry: serde_json::Value) -> Option<glm::Vec3> {
    let offset = entry.as_object()?.get("positionOffset")?.as_array()?;
    if offset.len() != 3 {return None};
    let mut v = [0.0f32; 3];
    for (dst, src) in v.iter_mut().zip(offset) {
        let n = src.as_f64().filter(|n| n.is_finite())?;
        *dst = n as f32;
    }
    let v = glm::vec3(v[0], v[1], v[2]);
    v.iter().all(|c| c.is_finite()).then_some(v)
}
