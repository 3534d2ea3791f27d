pub mod input_broker;
pub mod input_service;

use bitflags::bitflags;


bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct KeypressState: u8 {
        const JustPressed = 0b00001;
        const Pressed = 0b00010;
        /// Key repeat reported by the platform while held.
        const Repeated = 0b00100;
        const JustReleased = 0b01000;
        const Released = 0b10000;

        const AnyPress = 0b00111;
        /// Fires once per press and again on every repeat.
        const Triggered = 0b00101;
        const AnyJust = 0b01101;
    }
}

impl KeypressState {
    pub fn is(self, state: Self) -> bool {
        self.intersects(state)
    }

    /// State after one frame has passed.
    pub(super) fn settle(self) -> Self {
        if self.is(Self::JustReleased) {
            Self::Released
        } else if self.is(Self::AnyPress) {
            Self::Pressed
        } else {
            self
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_states_settle() {
        assert_eq!(KeypressState::JustPressed.settle(), KeypressState::Pressed);
        assert_eq!(KeypressState::Repeated.settle(), KeypressState::Pressed);
        assert_eq!(KeypressState::JustReleased.settle(), KeypressState::Released);
        assert!(KeypressState::Repeated.is(KeypressState::Triggered));
        assert!(!KeypressState::Pressed.is(KeypressState::AnyJust));
    }
}
