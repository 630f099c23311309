//! Client input capture with edge detection and sequencing
//!
//! Each frame the held state of the five logical keys is sampled and
//! transitions become events. Every [`RESEND_INTERVAL`] the whole key state is
//! sent again, so a lost `KeyUp` datagram cannot leave a key stuck on the
//! server; the server collapses repeats that change nothing. Every event gets
//! the next sequence number for the server's stale-input check.

use macroquad::prelude::{
    is_key_down, is_mouse_button_pressed, mouse_position, screen_height, screen_width, KeyCode,
    MouseButton,
};
use shared::{Field, InputEvent, Key};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// How often the full key state is repeated
pub const RESEND_INTERVAL: Duration = Duration::from_millis(250);

/// What the player is doing during one frame, in field coordinates
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameInput {
    pub held: HashSet<Key>,
    pub click: Option<(f32, f32)>,
}

impl FrameInput {
    /// Samples macroquad's keyboard and mouse state
    pub fn capture(field: &Field) -> Self {
        let held = Key::ALL
            .into_iter()
            .filter(|key| is_key_down(key_code(*key)))
            .collect();

        let click = if is_mouse_button_pressed(MouseButton::Left) {
            Some(to_field(mouse_position(), (screen_width(), screen_height()), field))
        } else {
            None
        };

        Self { held, click }
    }
}

/// Maps a window position onto the field the server simulates
fn to_field((mx, my): (f32, f32), (width, height): (f32, f32), field: &Field) -> (f32, f32) {
    (mx * field.width / width, my * field.height / height)
}

fn key_code(key: Key) -> KeyCode {
    match key {
        Key::Left => KeyCode::Left,
        Key::Up => KeyCode::Up,
        Key::Right => KeyCode::Right,
        Key::Down => KeyCode::Down,
        Key::Spacebar => KeyCode::Space,
    }
}

pub struct InputManager {
    next_sequence: u32,
    held: HashSet<Key>,
    last_resend: Option<Instant>,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            next_sequence: 1,
            held: HashSet::new(),
            last_resend: None,
        }
    }

    /// Turns this frame's input into sequenced events
    pub fn update(&mut self, frame: &FrameInput) -> Vec<(u32, InputEvent)> {
        self.update_at(frame, Instant::now())
    }

    /// Same as [`InputManager::update`] with an explicit frame time
    pub fn update_at(&mut self, frame: &FrameInput, now: Instant) -> Vec<(u32, InputEvent)> {
        let resend = match self.last_resend {
            Some(last) => now.saturating_duration_since(last) >= RESEND_INTERVAL,
            None => {
                self.last_resend = Some(now);
                false
            }
        };
        if resend {
            self.last_resend = Some(now);
        }

        let mut events = Vec::new();

        for key in Key::ALL {
            let down = frame.held.contains(&key);
            let before = self.held.contains(&key);

            if down && (resend || !before) {
                events.push(InputEvent::KeyDown { code: key.code() });
            } else if !down && (resend || before) {
                events.push(InputEvent::KeyUp { code: key.code() });
            }
        }
        self.held.clone_from(&frame.held);

        if let Some((x, y)) = frame.click {
            events.push(InputEvent::Fire { x, y });
        }

        events
            .into_iter()
            .map(|event| {
                let sequence = self.next_sequence;
                self.next_sequence = self.next_sequence.wrapping_add(1);
                (sequence, event)
            })
            .collect()
    }

    /// Forgets held keys and sequencing, e.g. after the session is lost
    pub fn reset(&mut self) {
        self.next_sequence = 1;
        self.held.clear();
        self.last_resend = None;
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn holding(keys: &[Key]) -> FrameInput {
        FrameInput {
            held: keys.iter().copied().collect(),
            click: None,
        }
    }

    fn frame(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_input_manager_creation() {
        let input_manager = InputManager::new();
        assert_eq!(input_manager.next_sequence, 1);
        assert!(input_manager.held.is_empty());
    }

    #[test]
    fn test_held_key_emits_one_down_and_one_up() {
        let start = Instant::now();
        let mut input = InputManager::new();

        assert_eq!(
            input.update_at(&holding(&[Key::Up]), frame(start, 0)),
            vec![(1, InputEvent::KeyDown { code: 38 })]
        );
        assert!(input.update_at(&holding(&[Key::Up]), frame(start, 16)).is_empty());
        assert!(input.update_at(&holding(&[Key::Up]), frame(start, 33)).is_empty());
        assert_eq!(
            input.update_at(&holding(&[]), frame(start, 50)),
            vec![(2, InputEvent::KeyUp { code: 38 })]
        );
        assert!(input.update_at(&holding(&[]), frame(start, 66)).is_empty());
    }

    #[test]
    fn test_simultaneous_transitions_get_consecutive_sequences() {
        let start = Instant::now();
        let mut input = InputManager::new();
        input.update_at(&holding(&[Key::Left]), start);

        let events = input.update_at(&holding(&[Key::Right, Key::Spacebar]), frame(start, 16));

        assert_eq!(
            events,
            vec![
                (2, InputEvent::KeyUp { code: 37 }),
                (3, InputEvent::KeyDown { code: 39 }),
                (4, InputEvent::KeyDown { code: 32 }),
            ]
        );
    }

    #[test]
    fn test_click_fires_at_position() {
        let start = Instant::now();
        let mut input = InputManager::new();
        let clicked = FrameInput {
            held: HashSet::new(),
            click: Some((100.0, 200.0)),
        };

        assert_eq!(
            input.update_at(&clicked, start),
            vec![(1, InputEvent::Fire { x: 100.0, y: 200.0 })]
        );
        assert_eq!(
            input.update_at(&clicked, frame(start, 16)),
            vec![(2, InputEvent::Fire { x: 100.0, y: 200.0 })]
        );
    }

    #[test]
    fn test_key_state_is_resent_periodically() {
        let start = Instant::now();
        let mut input = InputManager::new();
        input.update_at(&holding(&[Key::Up]), start);

        assert!(input
            .update_at(&holding(&[Key::Up]), frame(start, 200))
            .is_empty());

        let resent = input.update_at(&holding(&[Key::Up]), frame(start, 250));
        assert_eq!(
            resent,
            vec![
                (2, InputEvent::KeyUp { code: 37 }),
                (3, InputEvent::KeyDown { code: 38 }),
                (4, InputEvent::KeyUp { code: 39 }),
                (5, InputEvent::KeyUp { code: 40 }),
                (6, InputEvent::KeyUp { code: 32 }),
            ]
        );

        // The interval restarts from the last resend
        assert!(input
            .update_at(&holding(&[Key::Up]), frame(start, 400))
            .is_empty());
        assert_eq!(input.update_at(&holding(&[Key::Up]), frame(start, 500)).len(), 5);
    }

    #[test]
    fn test_reset_forgets_held_keys() {
        let start = Instant::now();
        let mut input = InputManager::new();
        input.update_at(&holding(&[Key::Down]), start);
        input.reset();

        assert_eq!(
            input.update_at(&holding(&[Key::Down]), frame(start, 16)),
            vec![(1, InputEvent::KeyDown { code: 40 })]
        );
    }

    #[test]
    fn test_clicks_scale_to_field_coordinates() {
        let field = Field::default();

        let (x, y) = to_field((1280.0, 480.0), (1280.0, 960.0), &field);
        assert_approx_eq!(x, 640.0, 1e-4);
        assert_approx_eq!(y, 240.0, 1e-4);

        let (x, y) = to_field((160.0, 120.0), (640.0, 480.0), &field);
        assert_approx_eq!(x, 160.0, 1e-4);
        assert_approx_eq!(y, 120.0, 1e-4);
    }
}
