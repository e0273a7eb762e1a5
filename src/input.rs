//! # Input State
//!
//! Window events arrive between frames. [`InputState`] folds them into a set
//! of held keys and a queue of pointer events that the frame loop drains
//! once per update tick.

use std::collections::{HashSet, VecDeque};

use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels of touchpad scrolling treated as one wheel line
const PIXELS_PER_LINE: f64 = 40.0;

/// "Is this key held right now" queries
pub trait KeyboardState {
    fn is_pressed(&self, key: KeyCode) -> bool;
}

/// Pointer input queued for the next update tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Cursor position in window pixels
    Moved { x: f64, y: f64 },
    /// Vertical wheel movement in lines, positive away from the user
    Scrolled { delta: f32 },
    /// The window lost keyboard and pointer focus
    FocusLost,
}

/// Keyboard and pointer state accumulated from window events
#[derive(Debug, Default)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
    pointer_events: VecDeque<PointerEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the state from one window event
    ///
    /// Returns `true` if the event was input related.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                match state {
                    ElementState::Pressed => self.press(*key),
                    ElementState::Released => self.release(*key),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_events.push_back(PointerEvent::Moved {
                    x: position.x,
                    y: position.y,
                });
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => {
                        (position.y / PIXELS_PER_LINE) as f32
                    }
                };
                self.pointer_events
                    .push_back(PointerEvent::Scrolled { delta: lines });
                true
            }
            WindowEvent::Focused(false) => {
                self.focus_lost();
                true
            }
            _ => false,
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.pressed.remove(&key);
    }

    /// Releases every key and queues [`PointerEvent::FocusLost`]
    pub fn focus_lost(&mut self) {
        self.pressed.clear();
        self.pointer_events.push_back(PointerEvent::FocusLost);
    }

    pub fn push_pointer_event(&mut self, event: PointerEvent) {
        self.pointer_events.push_back(event);
    }

    /// Removes and returns queued pointer events, oldest first
    pub fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        self.pointer_events.drain(..).collect()
    }

    /// Forgets all held keys and queued events
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.pointer_events.clear();
    }
}

impl KeyboardState for InputState {
    fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut input = InputState::new();
        input.press(KeyCode::KeyW);
        assert!(input.is_pressed(KeyCode::KeyW));
        input.release(KeyCode::KeyW);
        assert!(!input.is_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_pointer_queue_drains_in_order() {
        let mut input = InputState::new();
        input.push_pointer_event(PointerEvent::Moved { x: 1.0, y: 2.0 });
        input.push_pointer_event(PointerEvent::Scrolled { delta: -1.0 });

        assert_eq!(
            input.drain_pointer_events(),
            vec![
                PointerEvent::Moved { x: 1.0, y: 2.0 },
                PointerEvent::Scrolled { delta: -1.0 }
            ]
        );
        assert!(input.drain_pointer_events().is_empty());
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let mut input = InputState::new();
        input.press(KeyCode::KeyA);
        assert!(input.process_window_event(&WindowEvent::Focused(false)));
        assert!(!input.is_pressed(KeyCode::KeyA));
        assert_eq!(input.drain_pointer_events(), vec![PointerEvent::FocusLost]);
    }

    #[test]
    fn test_unrelated_events_are_ignored() {
        let mut input = InputState::new();
        assert!(!input.process_window_event(&WindowEvent::Focused(true)));
        assert!(!input.process_window_event(&WindowEvent::CloseRequested));
    }
}
