use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::schema::{Edge, SkeletonSchema, ValidationReport};

static NEXT_DATASET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(u64);

impl DatasetId {
    fn next() -> Self {
        Self(NEXT_DATASET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSensorPayload {
    #[serde(default)]
    pub orientation: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub gyroscope: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub accelerometer: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub magnetometer: Option<Vec<Vec<Option<f64>>>>,
}

/// Wire shape of a dataset file. `null` coordinates are accepted and treated as non-finite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPayload {
    pub frame_rate: f64,
    pub sensor_names: Vec<String>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
    #[serde(default)]
    pub num_frames: Option<usize>,
    #[serde(default)]
    pub num_sensors: Option<usize>,
    pub frames: Vec<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub raw_sensor_data: Option<HashMap<String, RawSensorPayload>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Orientation,
    AngularVelocity,
    LinearAcceleration,
    MagneticField,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Orientation,
        ChannelKind::AngularVelocity,
        ChannelKind::LinearAcceleration,
        ChannelKind::MagneticField,
    ];

    pub fn index(&self) -> usize {
        match self {
            ChannelKind::Orientation => 0,
            ChannelKind::AngularVelocity => 1,
            ChannelKind::LinearAcceleration => 2,
            ChannelKind::MagneticField => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Orientation => "Orientation",
            ChannelKind::AngularVelocity => "Angular velocity",
            ChannelKind::LinearAcceleration => "Acceleration",
            ChannelKind::MagneticField => "Magnetic field",
        }
    }

    fn payload_key(&self) -> &'static str {
        match self {
            ChannelKind::Orientation => "orientation",
            ChannelKind::AngularVelocity => "gyroscope",
            ChannelKind::LinearAcceleration => "accelerometer",
            ChannelKind::MagneticField => "magnetometer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelSample {
    Orientation(glm::Quat),
    Vector(glm::Vec3),
}

/// Per-sensor raw channels. A `None` sample is a non-finite or malformed entry.
#[derive(Debug, Clone, Default)]
pub struct RawChannels {
    pub orientation: Option<Vec<Option<glm::Quat>>>,
    pub angular_velocity: Option<Vec<Option<glm::Vec3>>>,
    pub linear_acceleration: Option<Vec<Option<glm::Vec3>>>,
    pub magnetic_field: Option<Vec<Option<glm::Vec3>>>,
}

impl RawChannels {
    pub fn sample(&self, kind: ChannelKind, frame: usize) -> Option<ChannelSample> {
        match kind {
            ChannelKind::Orientation => self.orientation.as_ref()
                .and_then(|c| c.get(frame).copied().flatten())
                .map(ChannelSample::Orientation),
            ChannelKind::AngularVelocity => vector_sample(&self.angular_velocity, frame),
            ChannelKind::LinearAcceleration => vector_sample(&self.linear_acceleration, frame),
            ChannelKind::MagneticField => vector_sample(&self.magnetic_field, frame),
        }
    }

    pub fn has(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Orientation => self.orientation.is_some(),
            ChannelKind::AngularVelocity => self.angular_velocity.is_some(),
            ChannelKind::LinearAcceleration => self.linear_acceleration.is_some(),
            ChannelKind::MagneticField => self.magnetic_field.is_some(),
        }
    }
}

fn vector_sample(channel: &Option<Vec<Option<glm::Vec3>>>, frame: usize) -> Option<ChannelSample> {
    channel.as_ref()
        .and_then(|c| c.get(frame).copied().flatten())
        .map(ChannelSample::Vector)
}

fn finite(values: &[Option<f64>]) -> Option<Vec<f32>> {
    values.iter()
        .map(|v| v.map(|v| v as f32).filter(|v| v.is_finite()))
        .collect()
}

fn parse_quaternion(values: &[Option<f64>]) -> Option<glm::Quat> {
    let v = finite(values)?;
    if v.len() != 4 {return None};
    // Wire order is [w, x, y, z].
    let q = glm::quat(v[1], v[2], v[3], v[0]);
    let norm = q.norm();
    if norm <= f32::EPSILON || !norm.is_finite() {return None};
    Some(q / norm)
}

fn parse_vector(values: &[Option<f64>]) -> Option<glm::Vec3> {
    let v = finite(values)?;
    if v.len() != 3 {return None};
    Some(glm::vec3(v[0], v[1], v[2]))
}

/// Immutable per-session motion capture data.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: DatasetId,
    name: String,
    frame_rate: f32,
    sensor_names: Vec<String>,
    sensor_lookup: HashMap<String, usize>,
    edges: Vec<Edge>,
    frame_count: usize,
    // frame-major, `sensor_names.len()` points per frame
    positions: Vec<glm::Vec3>,
    channels: HashMap<usize, RawChannels>,
}

impl Dataset {
    pub fn from_payload(
        payload: DatasetPayload,
        schema: &SkeletonSchema,
    ) -> Result<(Self, ValidationReport), DatasetError> {
        if !payload.frame_rate.is_finite() || payload.frame_rate <= 0.0 {
            return Err(DatasetError::FrameRate(payload.frame_rate));
        }

        let mut seen = HashSet::new();
        for name in payload.sensor_names.iter() {
            if !seen.insert(name.as_str()) {
                return Err(DatasetError::DuplicateSensor(name.clone()));
            }
        }

        let sensor_count = payload.sensor_names.len();
        if payload.num_sensors.is_some_and(|n| n != sensor_count) {
            tracing::warn!(declared = ?payload.num_sensors, actual = sensor_count, "numSensors does not match sensorNames");
        }
        if payload.num_frames.is_some_and(|n| n != payload.frames.len()) {
            tracing::warn!(declared = ?payload.num_frames, actual = payload.frames.len(), "numFrames does not match frames");
        }

        let edges: Vec<Edge> = payload.edges.iter().map(|(a, b)| Edge::new(a.as_str(), b.as_str())).collect();
        let (edges, mut report) = schema.validate(&payload.sensor_names, &edges);

        let mut positions = Vec::with_capacity(payload.frames.len() * sensor_count);
        for (frame, row) in payload.frames.iter().enumerate() {
            if row.len() != sensor_count {
                return Err(DatasetError::FrameShape { frame, found: row.len(), expected: sensor_count });
            }
            for (sensor, point) in row.iter().enumerate() {
                if point.len() != 3 {
                    return Err(DatasetError::PointShape { frame, sensor, found: point.len() });
                }
                let mut p = [0.0f32; 3];
                for (dst, src) in p.iter_mut().zip(point.iter()) {
                    // Out of f32 range counts as non-finite too.
                    match src.map(|v| v as f32).filter(|v| v.is_finite()) {
                        Some(v) => *dst = v,
                        None => report.non_finite_samples += 1,
                    }
                }
                positions.push(glm::vec3(p[0], p[1], p[2]));
            }
        }

        let sensor_lookup: HashMap<String, usize> = payload.sensor_names.iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let frame_count = payload.frames.len();
        let mut channels = HashMap::new();
        for (name, raw) in payload.raw_sensor_data.unwrap_or_default() {
            let Some(&index) = sensor_lookup.get(&name) else {
                report.dropped_channels.push(name);
                continue;
            };
            let parsed = parse_channels(&name, raw, frame_count, &mut report);
            channels.insert(index, parsed);
        }
        report.dropped_channels.sort();

        if report.non_finite_samples > 0 {
            tracing::warn!(samples = report.non_finite_samples, "non-finite positions replaced by zero");
        }

        let dataset = Self {
            id: DatasetId::next(),
            name: String::new(),
            frame_rate: payload.frame_rate as f32,
            sensor_names: payload.sensor_names,
            sensor_lookup,
            edges,
            frame_count,
            positions,
            channels,
        };
        Ok((dataset, report))
    }

    pub fn from_json(json: &str, schema: &SkeletonSchema) -> Result<(Self, ValidationReport), DatasetError> {
        let payload: DatasetPayload = serde_json::from_str(json)?;
        Self::from_payload(payload, schema)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> DatasetId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn frame_rate(&self) -> f32 { self.frame_rate }
    pub fn frame_count(&self) -> usize { self.frame_count }
    pub fn sensor_count(&self) -> usize { self.sensor_names.len() }
    pub fn sensor_names(&self) -> &[String] { &self.sensor_names }
    pub fn edges(&self) -> &[Edge] { &self.edges }

    pub fn is_degenerate(&self) -> bool {
        self.frame_count == 0 || self.sensor_names.is_empty()
    }

    pub fn sensor_index(&self, name: &str) -> Option<usize> {
        self.sensor_lookup.get(name).copied()
    }

    pub fn sensor_name(&self, index: usize) -> Option<&str> {
        self.sensor_names.get(index).map(String::as_str)
    }

    /// Source-unit position, `None` when out of range.
    pub fn position(&self, frame: usize, sensor: usize) -> Option<glm::Vec3> {
        let n = self.sensor_names.len();
        if frame >= self.frame_count || sensor >= n {return None};
        self.positions.get(frame * n + sensor).copied()
    }

    pub fn frame(&self, frame: usize) -> &[glm::Vec3] {
        let n = self.sensor_names.len();
        if frame >= self.frame_count {return &[]};
        &self.positions[frame * n..(frame + 1) * n]
    }

    pub fn channels(&self, sensor: usize) -> Option<&RawChannels> {
        self.channels.get(&sensor)
    }

    pub fn channel_sample(&self, sensor: usize, kind: ChannelKind, frame: usize) -> Option<ChannelSample> {
        self.channels.get(&sensor).and_then(|c| c.sample(kind, frame))
    }

    pub fn has_channel(&self, kind: ChannelKind) -> bool {
        self.channels.values().any(|c| c.has(kind))
    }
}

fn parse_channels(name: &str, raw: RawSensorPayload, frame_count: usize, report: &mut ValidationReport) -> RawChannels {
    let mut check = |kind: ChannelKind, data: Option<Vec<Vec<Option<f64>>>>| {
        let data = data?;
        if data.len() != frame_count {
            tracing::warn!(sensor = name, channel = kind.payload_key(), len = data.len(), frame_count, "raw channel length mismatch");
            report.dropped_channels.push(format!("{}.{}", name, kind.payload_key()));
            return None;
        }
        Some(data)
    };

    let orientation = check(ChannelKind::Orientation, raw.orientation)
        .map(|c| c.iter().map(|s| parse_quaternion(s)).collect());
    let angular_velocity = check(ChannelKind::AngularVelocity, raw.gyroscope)
        .map(|c| c.iter().map(|s| parse_vector(s)).collect());
    let linear_acceleration = check(ChannelKind::LinearAcceleration, raw.accelerometer)
        .map(|c| c.iter().map(|s| parse_vector(s)).collect());
    let magnetic_field = check(ChannelKind::MagneticField, raw.magnetometer)
        .map(|c| c.iter().map(|s| parse_vector(s)).collect());

    RawChannels { orientation, angular_velocity, linear_acceleration, magnetic_field }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CANONICAL_SENSORS;

    fn payload(frames: usize) -> DatasetPayload {
        let names: Vec<String> = CANONICAL_SENSORS.iter().map(|s| s.to_string()).collect();
        let frames = (0..frames).map(|f| {
            (0..names.len()).map(|i| vec![Some(i as f64), Some(f as f64), Some(0.0)]).collect()
        }).collect();
        DatasetPayload {
            frame_rate: 30.0,
            num_sensors: Some(names.len()),
            sensor_names: names,
            edges: vec![],
            num_frames: None,
            frames,
            raw_sensor_data: None,
        }
    }

    #[test]
    fn positions_are_frame_major() {
        let (dataset, report) = Dataset::from_payload(payload(3), &SkeletonSchema::canonical()).unwrap();
        assert_eq!(dataset.frame_count(), 3);
        assert_eq!(dataset.position(2, 4), Some(glm::vec3(4.0, 2.0, 0.0)));
        assert_eq!(dataset.position(3, 0), None);
        assert_eq!(dataset.frame(1).len(), 15);
        assert!(report.used_canonical_edges);
        assert_eq!(dataset.edges().len(), 14);
    }

    #[test]
    fn ids_are_unique() {
        let schema = SkeletonSchema::canonical();
        let (a, _) = Dataset::from_payload(payload(1), &schema).unwrap();
        let (b, _) = Dataset::from_payload(payload(1), &schema).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn rejects_bad_frame_rate() {
        let mut p = payload(1);
        p.frame_rate = 0.0;
        assert!(matches!(Dataset::from_payload(p, &SkeletonSchema::canonical()), Err(DatasetError::FrameRate(_))));
    }

    #[test]
    fn rejects_ragged_frames() {
        let mut p = payload(2);
        p.frames[1].pop();
        let err = Dataset::from_payload(p, &SkeletonSchema::canonical()).unwrap_err();
        assert!(matches!(err, DatasetError::FrameShape { frame: 1, found: 14, expected: 15 }));
    }

    #[test]
    fn null_coordinates_become_zero() {
        let mut p = payload(1);
        p.frames[0][0] = vec![None, Some(1.0), Some(2.0)];
        let (dataset, report) = Dataset::from_payload(p, &SkeletonSchema::canonical()).unwrap();
        assert_eq!(report.non_finite_samples, 1);
        assert_eq!(dataset.position(0, 0), Some(glm::vec3(0.0, 1.0, 2.0)));
    }

    #[test]
    fn out_of_range_coordinates_become_zero() {
        let mut p = payload(1);
        p.frames[0][1] = vec![Some(1e39), Some(-1e300), Some(3.0)];
        let (dataset, report) = Dataset::from_payload(p, &SkeletonSchema::canonical()).unwrap();
        assert_eq!(report.non_finite_samples, 2);
        assert_eq!(dataset.position(0, 1), Some(glm::vec3(0.0, 0.0, 3.0)));
    }

    #[test]
    fn degenerate_dataset_loads() {
        let p = DatasetPayload {
            frame_rate: 60.0,
            sensor_names: vec![],
            edges: vec![],
            num_frames: Some(0),
            num_sensors: Some(0),
            frames: vec![],
            raw_sensor_data: None,
        };
        let (dataset, _) = Dataset::from_payload(p, &SkeletonSchema::canonical()).unwrap();
        assert!(dataset.is_degenerate());
        assert!(dataset.frame(0).is_empty());
    }

    #[test]
    fn parses_json_with_raw_channels() {
        let json = r#"{
            "frameRate": 30,
            "sensorNames": ["head", "neck"],
            "edges": [["head", "neck"]],
            "numFrames": 2,
            "numSensors": 2,
            "frames": [[[0,1,2],[3,4,5]], [[0,1,2],[3,4,5]]],
            "rawSensorData": {
                "head": {
                    "orientation": [[1,0,0,0],[0,0,0,0]],
                    "gyroscope": [[0,0,1],[0,0,2]],
                    "magnetometer": [[1,1,1]]
                },
                "ghost": { "gyroscope": [[0,0,0],[0,0,0]] }
            }
        }"#;
        let (dataset, report) = Dataset::from_json(json, &SkeletonSchema::canonical()).unwrap();
        let head = dataset.sensor_index("head").unwrap();

        assert_eq!(dataset.channel_sample(head, ChannelKind::Orientation, 0),
            Some(ChannelSample::Orientation(glm::quat(0.0, 0.0, 0.0, 1.0))));
        // Zero quaternion cannot be normalized.
        assert_eq!(dataset.channel_sample(head, ChannelKind::Orientation, 1), None);
        assert_eq!(dataset.channel_sample(head, ChannelKind::AngularVelocity, 1),
            Some(ChannelSample::Vector(glm::vec3(0.0, 0.0, 2.0))));
        assert_eq!(dataset.channel_sample(head, ChannelKind::MagneticField, 0), None);
        assert!(report.dropped_channels.contains(&"ghost".to_string()));
        assert!(report.dropped_channels.contains(&"head.magnetometer".to_string()));
        assert!(dataset.has_channel(ChannelKind::AngularVelocity));
        assert!(!dataset.has_channel(ChannelKind::LinearAcceleration));
    }
}
