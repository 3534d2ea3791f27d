use std::collections::HashSet;

use itertools::Itertools;

pub const CANONICAL_SENSORS: [&str; 15] = [
    "head",
    "neck",
    "shoulder_left",
    "shoulder_right",
    "elbow_left",
    "elbow_right",
    "wrist_left",
    "wrist_right",
    "lumbar",
    "hip_left",
    "hip_right",
    "knee_left",
    "knee_right",
    "foot_left",
    "foot_right",
];

pub const CANONICAL_EDGES: [(&str, &str); 14] = [
    ("head", "neck"),
    ("neck", "shoulder_left"),
    ("neck", "shoulder_right"),
    ("shoulder_left", "elbow_left"),
    ("elbow_left", "wrist_left"),
    ("shoulder_right", "elbow_right"),
    ("elbow_right", "wrist_right"),
    ("neck", "lumbar"),
    ("lumbar", "hip_left"),
    ("lumbar", "hip_right"),
    ("hip_left", "knee_left"),
    ("knee_left", "foot_left"),
    ("hip_right", "knee_right"),
    ("knee_right", "foot_right"),
];

/// Unordered pair of sensor names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub a: String,
    pub b: String,
}

impl Edge {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self { a: a.into(), b: b.into() }
    }

    pub fn touches(&self, name: &str) -> bool {
        self.a == name || self.b == name
    }

    fn key(&self) -> (&str, &str) {
        if self.a <= self.b {(&self.a, &self.b)} else {(&self.b, &self.a)}
    }
}

/// What `SkeletonSchema::validate` found wrong with a dataset. Nothing in here is fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub missing_sensors: Vec<String>,
    pub unknown_sensors: Vec<String>,
    pub dropped_edges: Vec<Edge>,
    pub used_canonical_edges: bool,
    pub non_finite_samples: usize,
    pub dropped_channels: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.missing_sensors.is_empty()
            && self.unknown_sensors.is_empty()
            && self.dropped_edges.is_empty()
            && !self.used_canonical_edges
            && self.non_finite_samples == 0
            && self.dropped_channels.is_empty()
    }

    /// Human readable lines for the warnings panel.
    pub fn warnings(&self) -> Vec<String> {
        let mut lines = vec![];
        if !self.missing_sensors.is_empty() {
            lines.push(format!("Missing sensors: {}", self.missing_sensors.join(", ")));
        }
        if !self.unknown_sensors.is_empty() {
            lines.push(format!("Unknown sensors: {}", self.unknown_sensors.join(", ")));
        }
        if !self.dropped_edges.is_empty() {
            let edges = self.dropped_edges.iter().map(|e| format!("{}-{}", e.a, e.b)).join(", ");
            lines.push(format!("Dropped edges: {}", edges));
        }
        if self.used_canonical_edges {
            lines.push("No edges in dataset, canonical skeleton used".to_string());
        }
        if self.non_finite_samples > 0 {
            lines.push(format!("{} non-finite position samples replaced by zero", self.non_finite_samples));
        }
        if !self.dropped_channels.is_empty() {
            lines.push(format!("Dropped raw channels: {}", self.dropped_channels.join(", ")));
        }
        lines
    }
}

/// Sensor names and connectivity a dataset is checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonSchema {
    sensors: Vec<String>,
    edges: Vec<Edge>,
}

impl SkeletonSchema {
    pub fn new(sensors: Vec<String>, edges: Vec<Edge>) -> Self {
        Self { sensors, edges }
    }

    pub fn canonical() -> Self {
        Self {
            sensors: CANONICAL_SENSORS.iter().map(|s| s.to_string()).collect(),
            edges: CANONICAL_EDGES.iter().map(|(a, b)| Edge::new(*a, *b)).collect(),
        }
    }

    pub fn sensors(&self) -> &[String] { &self.sensors }
    pub fn edges(&self) -> &[Edge] { &self.edges }

    /// Returns the edges to use for a dataset with `sensor_names` together with the report.
    /// An empty `edges` list falls back to the schema connectivity.
    pub fn validate(&self, sensor_names: &[String], edges: &[Edge]) -> (Vec<Edge>, ValidationReport) {
        let present: HashSet<&str> = sensor_names.iter().map(String::as_str).collect();
        let known: HashSet<&str> = self.sensors.iter().map(String::as_str).collect();

        let mut report = ValidationReport {
            missing_sensors: self.sensors.iter()
                .filter(|s| !present.contains(s.as_str()))
                .cloned()
                .collect(),
            unknown_sensors: sensor_names.iter()
                .filter(|s| !known.contains(s.as_str()))
                .cloned()
                .collect(),
            ..Default::default()
        };

        let source = if edges.is_empty() {
            report.used_canonical_edges = true;
            &self.edges[..]
        } else {
            edges
        };

        let mut seen = HashSet::new();
        let mut kept = vec![];
        for edge in source {
            if !present.contains(edge.a.as_str()) || !present.contains(edge.b.as_str()) {
                // Canonical substitutes are filtered quietly, the missing sensor is already reported.
                if !report.used_canonical_edges {
                    report.dropped_edges.push(edge.clone());
                }
                continue;
            }
            if edge.a == edge.b || !seen.insert(edge.key()) {continue};
            kept.push(edge.clone());
        }

        (kept, report)
    }
}

impl Default for SkeletonSchema {
    fn default() -> Self {
        Self::canonical()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn names(skip: &str) -> Vec<String> {
        CANONICAL_SENSORS.iter().filter(|s| **s != skip).map(|s| s.to_string()).collect()
    }

    fn canonical_edges() -> Vec<Edge> {
        CANONICAL_EDGES.iter().map(|(a, b)| Edge::new(*a, *b)).collect()
    }

    #[test]
    fn canonical_skeleton_shape() {
        let schema = SkeletonSchema::canonical();
        assert_eq!(schema.sensors().len(), 15);
        assert_eq!(schema.edges().len(), 14);
        assert!(schema.edges().iter().all(|e| CANONICAL_SENSORS.contains(&e.a.as_str())
            && CANONICAL_SENSORS.contains(&e.b.as_str())));
    }

    #[test]
    fn clean_dataset() {
        let schema = SkeletonSchema::canonical();
        let (edges, report) = schema.validate(&names(""), &canonical_edges());
        assert!(report.is_clean());
        assert_eq!(edges.len(), 14);
    }

    #[test]
    fn missing_foot_right() {
        let schema = SkeletonSchema::canonical();
        let (edges, report) = schema.validate(&names("foot_right"), &canonical_edges());

        assert_eq!(report.missing_sensors, vec!["foot_right".to_string()]);
        assert_eq!(report.dropped_edges, vec![Edge::new("knee_right", "foot_right")]);
        assert_eq!(edges.len(), 13);
        assert!(edges.iter().all(|e| !e.touches("foot_right")));
    }

    #[test]
    fn empty_edges_use_canonical() {
        let schema = SkeletonSchema::canonical();
        let (edges, report) = schema.validate(&names("head"), &[]);

        assert!(report.used_canonical_edges);
        assert!(report.dropped_edges.is_empty());
        assert_eq!(edges.len(), 13);
    }

    #[test]
    fn duplicate_and_reversed_edges_collapse() {
        let schema = SkeletonSchema::canonical();
        let edges = vec![Edge::new("head", "neck"), Edge::new("neck", "head"), Edge::new("neck", "neck")];
        let (kept, report) = schema.validate(&names(""), &edges);
        assert_eq!(kept, vec![Edge::new("head", "neck")]);
        assert!(report.dropped_edges.is_empty());
    }

    #[test]
    fn unknown_sensor_is_reported() {
        let schema = SkeletonSchema::canonical();
        let mut sensors = names("");
        sensors.push("tail".to_string());
        let (_, report) = schema.validate(&sensors, &canonical_edges());
        assert_eq!(report.unknown_sensors, vec!["tail".to_string()]);
        assert_eq!(report.warnings().len(), 1);
    }
}
