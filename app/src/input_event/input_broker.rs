use std::collections::HashMap;

use super::{input_service::Key, KeypressState};


/// Press state of every key seen so far, advanced once per frame.
#[derive(Debug, Default)]
pub(super) struct InputBroker {
    keys: HashMap<Key, KeypressState>,
    changed: Vec<Key>,
}


impl InputBroker {
    pub(super) fn state(&self, key: Key) -> KeypressState {
        self.keys.get(&key).copied().unwrap_or(KeypressState::Released)
    }

    /// End of frame: transient states become held or released.
    pub(super) fn update(&mut self) {
        for key in self.changed.drain(..) {
            if let Some(state) = self.keys.get_mut(&key) {
                *state = state.settle();
            }
        }
    }

    pub(super) fn press(&mut self, key: Key, is_press: bool, repeat: bool) {
        let held = self.state(key).is(KeypressState::AnyPress);
        let next = match (is_press, held) {
            (true, false) => KeypressState::JustPressed,
            (true, true) if repeat => KeypressState::Repeated,
            (false, true) => KeypressState::JustReleased,
            _ => return,
        };
        self.keys.insert(key, next);
        self.changed.push(key);
    }

    /// Focus loss: everything held is released.
    pub(super) fn release_all(&mut self) {
        for (key, state) in self.keys.iter_mut() {
            if state.is(KeypressState::AnyPress) {
                *state = KeypressState::JustReleased;
                self.changed.push(*key);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_hold_release() {
        let mut broker = InputBroker::default();
        broker.press(Key::Space, true, false);
        assert!(broker.state(Key::Space).is(KeypressState::JustPressed));
        broker.update();
        assert_eq!(broker.state(Key::Space), KeypressState::Pressed);

        // a second press event without repeat while held changes nothing
        broker.press(Key::Space, true, false);
        assert!(!broker.state(Key::Space).is(KeypressState::Triggered));

        broker.press(Key::Space, false, false);
        assert!(broker.state(Key::Space).is(KeypressState::JustReleased));
        broker.update();
        assert_eq!(broker.state(Key::Space), KeypressState::Released);
    }

    #[test]
    fn repeat_retriggers() {
        let mut broker = InputBroker::default();
        broker.press(Key::ArrowRight, true, false);
        broker.update();
        broker.press(Key::ArrowRight, true, true);
        assert!(broker.state(Key::ArrowRight).is(KeypressState::Triggered));
        broker.update();
        assert!(!broker.state(Key::ArrowRight).is(KeypressState::Triggered));
    }

    #[test]
    fn release_all_releases_held() {
        let mut broker = InputBroker::default();
        broker.press(Key::ArrowLeft, true, false);
        broker.release_all();
        assert!(broker.state(Key::ArrowLeft).is(KeypressState::JustReleased));
        assert_eq!(broker.state(Key::Escape), KeypressState::Released);
    }
}
