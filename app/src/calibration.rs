use nalgebra_glm as glm;
use resources::Calibration;

/// Owns the calibration of the current dataset and arbitrates writers.
///
/// While a joint is dragged the drag is the only writer for that sensor:
/// other edits to it are rejected and imports are held back until `end_drag`.
#[derive(Debug, Default)]
pub struct CalibrationStore {
    calibration: Calibration,
    dragging: Option<String>,
    deferred: Option<glm::Vec3>,
    revision: u64,
}

impl CalibrationStore {
    pub fn new() -> Self { Self::default() }

    pub fn calibration(&self) -> &Calibration { &self.calibration }
    pub fn snapshot(&self) -> Calibration { self.calibration.clone() }
    pub fn dragging(&self) -> Option<&str> { self.dragging.as_deref() }

    /// Bumped on every accepted change.
    pub fn revision(&self) -> u64 { self.revision }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Dataset switch: the previous map is dropped, never merged.
    pub fn replace(&mut self, calibration: Calibration) {
        self.calibration = calibration;
        self.dragging = None;
        self.deferred = None;
        self.touch();
    }

    pub fn begin_drag(&mut self, sensor: &str) {
        if self.dragging.as_deref() != Some(sensor) {
            self.end_drag();
        }
        self.dragging = Some(sensor.to_string());
    }

    /// Returns the sensor whose drag ended. A deferred import for it is applied now.
    pub fn end_drag(&mut self) -> Option<String> {
        let sensor = self.dragging.take()?;
        if let Some(offset) = self.deferred.take() {
            tracing::debug!(sensor, "applying import deferred by drag");
            self.calibration.set(&sensor, offset);
            self.touch();
        }
        Some(sensor)
    }

    /// Offset reported by the drag owner.
    pub fn apply_drag_change(&mut self, sensor: &str, offset: glm::Vec3) -> bool {
        if self.dragging.as_deref() != Some(sensor) {return false};
        self.calibration.set(sensor, offset);
        self.touch();
        true
    }

    /// Edit from anything but the drag. Rejected for the dragged sensor.
    pub fn set_offset(&mut self, sensor: &str, offset: glm::Vec3) -> bool {
        if self.dragging.as_deref() == Some(sensor) {
            tracing::warn!(sensor, "edit rejected, sensor is being dragged");
            return false;
        }
        if !offset.iter().all(|c| c.is_finite()) {return false};
        self.calibration.set(sensor, offset);
        self.touch();
        true
    }

    pub fn reset(&mut self, sensor: &str) -> bool {
        self.set_offset(sensor, glm::Vec3::zeros())
    }

    pub fn clear(&mut self) {
        self.import(Calibration::new());
    }

    /// Takes every entry of `calibration`. The dragged sensor keeps its live value
    /// until the drag ends.
    pub fn import(&mut self, calibration: Calibration) {
        let mut next = calibration;
        if let Some(sensor) = &self.dragging {
            self.deferred = Some(next.offset(sensor));
            next.set(sensor, self.calibration.offset(sensor));
        }
        self.calibration = next;
        self.touch();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn calibration(entries: &[(&str, [f32; 3])]) -> Calibration {
        let mut c = Calibration::new();
        for (name, [x, y, z]) in entries {
            c.set(name, glm::vec3(*x, *y, *z));
        }
        c
    }

    #[test]
    fn only_the_drag_owner_writes() {
        let mut store = CalibrationStore::new();
        store.begin_drag("head");
        assert!(!store.apply_drag_change("neck", glm::vec3(1.0, 0.0, 0.0)));
        assert!(store.apply_drag_change("head", glm::vec3(1.0, 0.0, 0.0)));
        assert!(!store.set_offset("head", glm::vec3(9.0, 9.0, 9.0)));
        assert!(!store.reset("head"));
        assert_eq!(store.calibration().offset("head"), glm::vec3(1.0, 0.0, 0.0));

        assert_eq!(store.end_drag().as_deref(), Some("head"));
        assert!(!store.apply_drag_change("head", glm::vec3(2.0, 0.0, 0.0)));
        assert!(store.reset("head"));
        assert!(store.calibration().is_empty());
    }

    #[test]
    fn import_is_deferred_for_dragged_sensor() {
        let mut store = CalibrationStore::new();
        store.replace(calibration(&[("head", [1.0, 1.0, 1.0]), ("neck", [2.0, 0.0, 0.0])]));
        store.begin_drag("head");
        store.apply_drag_change("head", glm::vec3(3.0, 0.0, 0.0));

        store.import(calibration(&[("head", [7.0, 7.0, 7.0]), ("lumbar", [0.5, 0.0, 0.0])]));
        assert_eq!(store.calibration().offset("head"), glm::vec3(3.0, 0.0, 0.0));
        assert_eq!(store.calibration().offset("lumbar"), glm::vec3(0.5, 0.0, 0.0));
        assert!(!store.calibration().contains("neck"));

        store.end_drag();
        assert_eq!(store.calibration().offset("head"), glm::vec3(7.0, 7.0, 7.0));
    }

    #[test]
    fn import_without_dragged_key_clears_it_after_drag() {
        let mut store = CalibrationStore::new();
        store.begin_drag("head");
        store.apply_drag_change("head", glm::vec3(3.0, 0.0, 0.0));
        store.clear();
        assert!(store.calibration().contains("head"));
        store.end_drag();
        assert!(store.calibration().is_empty());
    }

    #[test]
    fn replace_drops_drag_and_previous_map() {
        let mut store = CalibrationStore::new();
        store.replace(calibration(&[("head", [1.0, 0.0, 0.0])]));
        store.begin_drag("head");
        let revision = store.revision();
        store.replace(Calibration::new());
        assert!(store.revision() > revision);
        assert!(store.dragging().is_none());
        assert!(store.calibration().is_empty());
        assert!(store.end_drag().is_none());
    }

    #[test]
    fn non_finite_edit_is_dropped() {
        let mut store = CalibrationStore::new();
        assert!(!store.set_offset("head", glm::vec3(f32::NAN, 0.0, 0.0)));
        assert!(store.calibration().is_empty());
    }
}
