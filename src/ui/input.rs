/// Input state tracker.
///
/// Tracks which keys are currently held down and where the mouse is, enabling:
///   - Continuous paddle steering while an arrow / A-D key is held
///   - Edge-triggered launch / restart (only fire on initial press)
///   - Absolute paddle placement from mouse movement
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const LAUNCH_KEYS: [KeyCode; 1] = [KeyCode::Char(' ')];
const RESTART_KEYS: [KeyCode; 1] = [KeyCode::Enter];
const QUIT_KEYS: [KeyCode; 3] = [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Terminal column of the most recent mouse motion this frame.
    mouse_column: Option<u16>,

    /// Left button went down this frame.
    clicked: bool,

    /// Whether to honor Release events. Set from the renderer once keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            mouse_column: None,
            clicked: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle_event(ev),
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.mouse_column = None;
        self.clicked = false;
    }

    fn handle_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                // Explicit release: remove from active set
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Ignore release when enhancement not confirmed;
                // rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.mouse_column = Some(mouse.column);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.mouse_column = Some(mouse.column);
                self.clicked = true;
            }
            _ => {}
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    // ── Game actions ──

    /// Keyboard steering: -1 left, +1 right, 0 for none or both.
    pub fn steer(&self) -> f32 {
        let left = self.any_held(&LEFT_KEYS);
        let right = self.any_held(&RIGHT_KEYS);
        match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn mouse_column(&self) -> Option<u16> {
        self.mouse_column
    }

    pub fn launch_pressed(&self) -> bool {
        self.any_pressed(&LAUNCH_KEYS) || self.clicked
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(&RESTART_KEYS) || self.clicked
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(&QUIT_KEYS) || self.ctrl_c_pressed()
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16) -> Event {
        Event::Mouse(MouseEvent { kind, column, row: 3, modifiers: KeyModifiers::NONE })
    }

    #[test]
    fn fresh_press_is_edge_triggered() {
        let mut input = InputState::new();
        input.handle_event(press(KeyCode::Char(' ')));
        assert!(input.launch_pressed());

        input.begin_frame();
        input.handle_event(press(KeyCode::Char(' ')));
        assert!(!input.launch_pressed(), "repeat while held is not a new press");
    }

    #[test]
    fn steering_cancels_when_both_held() {
        let mut input = InputState::new();
        input.handle_event(press(KeyCode::Left));
        assert_eq!(input.steer(), -1.0);
        input.handle_event(press(KeyCode::Char('d')));
        assert_eq!(input.steer(), 0.0);
    }

    #[test]
    fn mouse_motion_reports_latest_column() {
        let mut input = InputState::new();
        input.handle_event(mouse(MouseEventKind::Moved, 10));
        input.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 14));
        assert_eq!(input.mouse_column(), Some(14));
        assert!(!input.launch_pressed());

        input.begin_frame();
        assert_eq!(input.mouse_column(), None);
        input.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 20));
        assert!(input.launch_pressed());
        assert_eq!(input.mouse_column(), Some(20));
    }

    fn release(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release))
    }

    #[test]
    fn release_ends_hold_only_when_reported() {
        let mut input = InputState::new();
        input.handle_event(press(KeyCode::Right));
        input.handle_event(release(KeyCode::Right));
        assert_eq!(input.steer(), 1.0, "release ignored without enhancement");

        input.honor_release = true;
        input.handle_event(release(KeyCode::Right));
        assert_eq!(input.steer(), 0.0);
    }

    #[test]
    fn quit_keys_and_ctrl_c() {
        let mut input = InputState::new();
        input.handle_event(press(KeyCode::Esc));
        assert!(input.quit_pressed());

        let mut input = InputState::new();
        input.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(input.quit_pressed());
    }
}
