/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Steer paddle
///   A / Start             →  Launch
///   Start                 →  Restart after game over
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    launch: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            launch:  vec![Btn::A, Btn::Start],
            restart: vec![Btn::Start],
            quit:    vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; BTN_COUNT],

    // D-pad
    dpad_left: bool,
    dpad_right: bool,

    // Analog stick x, -1.0 ..= 1.0
    stick_x: f32,

    // Action mapping
    action_map: ActionMap,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs_opt = match Gilrs::new() {
            Ok(g) => {
                if let Some((_, pad)) = g.gamepads().next() {
                    log::info!("gamepad found: {}", pad.name());
                }
                Some(g)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad_left: false,
            dpad_right: false,
            stick_x: 0.0,
            action_map: ActionMap::default(),
        }
    }

    /// Load button mapping from config. Lists with no recognizable
    /// button name keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() { log::warn!("unknown gamepad button \"{s}\""); }
                    btn
                })
                .collect()
        }
        let map = &mut self.action_map;
        let la = parse_list(&cfg.launch);
        if !la.is_empty() { map.launch = la; }
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() { map.restart = rs; }
        let qu = parse_list(&cfg.quit);
        if !qu.is_empty() { map.quit = qu; }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick_x = value,
                EventType::Connected => log::info!("gamepad connected"),
                EventType::Disconnected => {
                    self.release_all();
                    log::info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadLeft  => { self.dpad_left = held; return; }
            Button::DPadRight => { self.dpad_right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.set_btn(btn, held);
        }
    }

    /// Record a button transition. A press only counts as fresh when the
    /// button was up, so duplicate Pressed events do not re-fire actions.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set_btn(&mut self, btn: Btn, held: bool) {
        let state = &mut self.buttons[btn_index(btn)];
        if held && !state.held {
            state.just_pressed = true;
        }
        state.held = held;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn launch_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.launch)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    /// Steering in -1.0 ..= 1.0. The d-pad is full speed; the stick is
    /// proportional past the dead zone.
    pub fn steer(&self) -> f32 {
        match (self.dpad_left, self.dpad_right) {
            (true, false) => return -1.0,
            (false, true) => return 1.0,
            _ => {}
        }
        if self.stick_x.abs() > STICK_DEADZONE {
            self.stick_x.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_left = false;
        self.dpad_right = false;
        self.stick_x = 0.0;
    }
}
