use winit::event::{ElementState, Force, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};

use crate::interaction::pointer::{normalize, NormalizedPointer, PointerButton, PointerEvent, PointerSource, SurfaceRect};
use super::{input_broker::InputBroker, KeypressState};

pub type Key = winit::keyboard::KeyCode;

/// Pixels of trackpad scroll per wheel line.
const PIXELS_PER_LINE: f32 = 50.0;


/// Keyboard state plus the pointer events of one frame, already normalized to the surface.
#[derive(Debug)]
pub struct InputService {
    input_broker: InputBroker,
    surface: SurfaceRect,
    cursor: Option<(f64, f64)>,
    touch: Option<u64>,
    pointer_events: Vec<PointerEvent>,
}


impl InputService {
    pub fn new() -> Self {
        Self {
            input_broker: InputBroker::default(),
            surface: SurfaceRect::from_size(1, 1),
            cursor: None,
            touch: None,
            pointer_events: Vec::new(),
        }
    }

    pub fn set_surface(&mut self, surface: SurfaceRect) {
        self.surface = surface;
    }

    fn to_pointer_button(mouse: &MouseButton) -> Option<PointerButton> {
        match mouse {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Right => Some(PointerButton::Secondary),
            MouseButton::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }

    pub fn is_key(&self, key: &Key, state: KeypressState) -> bool {
        self.input_broker.state(*key).is(state)
    }

    /// Pointer events collected since the last call.
    pub fn take_pointer_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.pointer_events)
    }

    /// End of frame.
    pub fn update(&mut self) {
        self.input_broker.update();
    }

    fn pointer_at(&self, x: f64, y: f64) -> Option<NormalizedPointer> {
        normalize(x, y, &self.surface)
    }

    fn touch_source(touch: &Touch) -> PointerSource {
        match touch.force {
            Some(Force::Calibrated { altitude_angle: Some(_), .. }) => PointerSource::Pen,
            _ => PointerSource::Touch,
        }
    }

    /// `pointer_blocked` is set while the gui owns the pointer: presses and wheel
    /// are not turned into pointer events then, moves and releases still are.
    pub fn handle_window_event(&mut self, event: &WindowEvent, pointer_blocked: bool) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let winit::keyboard::PhysicalKey::Code(code) = event.physical_key {
                    let is_press = event.state == ElementState::Pressed;
                    self.input_broker.press(code, is_press, event.repeat);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let is_press = *state == ElementState::Pressed;
                if is_press && pointer_blocked {return};

                let Some(button) = Self::to_pointer_button(button) else {return};
                let Some((x, y)) = self.cursor else {return};
                let Some(pointer) = self.pointer_at(x, y) else {return};
                let source = PointerSource::Mouse;
                self.pointer_events.push(if is_press {
                    PointerEvent::Down { pointer, button, source }
                } else {
                    PointerEvent::Up { pointer, button, source }
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
                if let Some(pointer) = self.pointer_at(position.x, position.y) {
                    self.pointer_events.push(PointerEvent::Move { pointer, source: PointerSource::Mouse });
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if pointer_blocked {return};
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                if delta.is_finite() && delta != 0.0 {
                    self.pointer_events.push(PointerEvent::Wheel { delta });
                }
            }
            WindowEvent::Touch(touch) => self.handle_touch(touch, pointer_blocked),
            WindowEvent::Focused(false) => {
                self.input_broker.release_all();
                self.touch = None;
                self.pointer_events.push(PointerEvent::Cancel);
            }
            _ => {}
        }
    }

    /// Only the first finger drives the pointer.
    fn handle_touch(&mut self, touch: &Touch, pointer_blocked: bool) {
        let source = Self::touch_source(touch);
        let pointer = self.pointer_at(touch.location.x, touch.location.y);
        let button = PointerButton::Primary;
        match touch.phase {
            TouchPhase::Started => {
                if self.touch.is_some() || pointer_blocked {return};
                let Some(pointer) = pointer else {return};
                self.touch = Some(touch.id);
                self.pointer_events.push(PointerEvent::Down { pointer, button, source });
            }
            TouchPhase::Moved => {
                if self.touch != Some(touch.id) {return};
                if let Some(pointer) = pointer {
                    self.pointer_events.push(PointerEvent::Move { pointer, source });
                }
            }
            TouchPhase::Ended => {
                if self.touch != Some(touch.id) {return};
                self.touch = None;
                self.pointer_events.push(match pointer {
                    Some(pointer) => PointerEvent::Up { pointer, button, source },
                    None => PointerEvent::Cancel,
                });
            }
            TouchPhase::Cancelled => {
                if self.touch != Some(touch.id) {return};
                self.touch = None;
                self.pointer_events.push(PointerEvent::Cancel);
            }
        }
    }
}


impl Default for InputService {
    fn default() -> Self {
        Self::new()
    }
}
