use super::{Direction, Intent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Space,
    Other,
}

/// Raw input as delivered by the host. Touch and mouse share the pointer variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { y: f32 },
    PointerMove { y: f32 },
    PointerUp,
    PointerCancel,
    Wheel { delta_y: f32 },
    Key(Key),
}

/// Normalizes raw events into intents, tracking whether a pointer is currently held.
#[derive(Debug, Clone)]
pub struct GestureInput {
    pointer_down: bool,
    wheel_threshold: f32,
}

impl GestureInput {
    pub fn new(wheel_threshold: f32) -> Self {
        Self {
            pointer_down: false,
            wheel_threshold,
        }
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn translate(&mut self, event: InputEvent) -> Option<Intent> {
        match event {
            InputEvent::PointerDown { y } => {
                // A second finger landing mid-drag does not restart the drag.
                if self.pointer_down {
                    return None;
                }
                self.pointer_down = true;
                Some(Intent::DragStart { y })
            }
            InputEvent::PointerMove { y } => self.pointer_down.then_some(Intent::DragMove { y }),
            InputEvent::PointerUp => {
                std::mem::replace(&mut self.pointer_down, false).then_some(Intent::DragEnd)
            }
            InputEvent::PointerCancel => {
                std::mem::replace(&mut self.pointer_down, false).then_some(Intent::DragCancel)
            }
            InputEvent::Wheel { delta_y } => {
                if self.pointer_down || delta_y.abs() < self.wheel_threshold {
                    None
                } else if delta_y > 0.0 {
                    Some(Intent::Step(Direction::Next))
                } else {
                    Some(Intent::Step(Direction::Previous))
                }
            }
            InputEvent::Key(key) => match key {
                Key::ArrowDown => Some(Intent::Step(Direction::Next)),
                Key::ArrowUp => Some(Intent::Step(Direction::Previous)),
                Key::Space => Some(Intent::TogglePlay),
                Key::Other => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_sequence_becomes_a_drag() {
        let mut input = GestureInput::new(10.0);
        assert_eq!(input.translate(InputEvent::PointerMove { y: 10.0 }), None);
        assert_eq!(
            input.translate(InputEvent::PointerDown { y: 400.0 }),
            Some(Intent::DragStart { y: 400.0 })
        );
        assert_eq!(input.translate(InputEvent::PointerDown { y: 10.0 }), None);
        assert_eq!(
            input.translate(InputEvent::PointerMove { y: 350.0 }),
            Some(Intent::DragMove { y: 350.0 })
        );
        assert_eq!(input.translate(InputEvent::PointerUp), Some(Intent::DragEnd));
        assert_eq!(input.translate(InputEvent::PointerUp), None);
        assert!(!input.is_pointer_down());
    }

    #[test]
    fn cancel_ends_the_drag_without_release() {
        let mut input = GestureInput::new(10.0);
        input.translate(InputEvent::PointerDown { y: 0.0 });
        assert_eq!(input.translate(InputEvent::PointerCancel), Some(Intent::DragCancel));
        assert_eq!(input.translate(InputEvent::PointerMove { y: 5.0 }), None);
    }

    #[test]
    fn wheel_maps_to_single_steps() {
        let mut input = GestureInput::new(10.0);
        assert_eq!(
            input.translate(InputEvent::Wheel { delta_y: 120.0 }),
            Some(Intent::Step(Direction::Next))
        );
        assert_eq!(
            input.translate(InputEvent::Wheel { delta_y: -40.0 }),
            Some(Intent::Step(Direction::Previous))
        );
        assert_eq!(input.translate(InputEvent::Wheel { delta_y: 3.0 }), None);
    }

    #[test]
    fn wheel_is_ignored_while_dragging() {
        let mut input = GestureInput::new(10.0);
        input.translate(InputEvent::PointerDown { y: 0.0 });
        assert_eq!(input.translate(InputEvent::Wheel { delta_y: 120.0 }), None);
    }

    #[test]
    fn keys_map_to_intents() {
        let mut input = GestureInput::new(10.0);
        assert_eq!(
            input.translate(InputEvent::Key(Key::ArrowDown)),
            Some(Intent::Step(Direction::Next))
        );
        assert_eq!(
            input.translate(InputEvent::Key(Key::ArrowUp)),
            Some(Intent::Step(Direction::Previous))
        );
        assert_eq!(input.translate(InputEvent::Key(Key::Space)), Some(Intent::TogglePlay));
        assert_eq!(input.translate(InputEvent::Key(Key::Other)), None);
    }
}
