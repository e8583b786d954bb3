/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::FrameInput;
use domain::geometry::clamp_paddle_x;
use sim::level;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    init_logging(&config.log_file);
    for warning in &config.warnings {
        log::warn!("{warning}");
    }

    let levels = match level::load_levels(&config.levels_dir) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Could not load levels: {e}");
            std::process::exit(1);
        }
    };
    let mut world = match WorldState::new(levels, config.rules.clone()) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Could not start game: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Breakout!");
    println!("Final Score: {}", world.progress.score);
}

/// The terminal is in raw mode while playing, so log records go to a file.
/// Without a writable log file the game runs with logging off. Runs before
/// the terminal switches to raw mode, so failures still reach stderr.
fn init_logging(path: &Path) {
    let file = match open_log_file(path) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("warning: {msg}; logging disabled");
            return;
        }
    };
    let installed = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    if let Err(e) = installed {
        eprintln!("warning: logger for {} not installed: {e}", path.display());
        return;
    }
    log::info!("breakout {} starting", env!("CARGO_PKG_VERSION"));
}

fn open_log_file(path: &Path) -> Result<File, String> {
    File::create(path).map_err(|e| format!("cannot create log file {}: {e}", path.display()))
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.controls.frame_sleep_ms);

    let mut pointer_x = world.paddle.center.x;
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if handle_meta(world, &kb, &gp) {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let mouse_x = kb.mouse_column().map(|col| renderer.viewport().pointer_to_world(col));
        let steer = (kb.steer() + gp.steer()).clamp(-1.0, 1.0);
        pointer_x = steer_pointer(pointer_x, mouse_x, steer, config.controls.paddle_speed, dt);

        // Game over shows the end screen until restart; nothing to simulate.
        if !world.is_game_over() {
            let events = step::step(world, FrameInput { pointer_x, dt });
            if let Some(sfx) = sound {
                sfx.play_events(&events);
            }
        }

        renderer.render(world)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

/// Quit, launch and restart. Returns true when the player wants out.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.quit_pressed() || gp.quit_pressed() {
        return true;
    }
    if world.is_game_over() {
        if kb.restart_pressed() || gp.restart_pressed() {
            step::restart(world);
        }
    } else if kb.launch_pressed() || gp.launch_pressed() {
        step::launch(world);
    }
    false
}

/// Mouse sets the pointer outright; keys and gamepad nudge it at
/// `paddle_speed`. The pointer never leaves the paddle's travel range,
/// so reversing direction responds immediately.
fn steer_pointer(pointer_x: f32, mouse_x: Option<f32>, steer: f32, paddle_speed: f32, dt: f32) -> f32 {
    let target = match mouse_x {
        Some(x) => x,
        None => pointer_x + steer * paddle_speed * dt,
    };
    clamp_paddle_x(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("breakout.log");
        let msg = open_log_file(&path).unwrap_err();
        assert!(msg.contains(&path.display().to_string()), "{msg}");

        let ok = dir.path().join("breakout.log");
        assert!(open_log_file(&ok).is_ok());
    }

    #[test]
    fn mouse_overrides_keys() {
        assert_eq!(steer_pointer(0.5, Some(0.3), 1.0, 1.2, 0.1), 0.3);
    }

    #[test]
    fn keys_move_at_paddle_speed() {
        let x = steer_pointer(0.5, None, -1.0, 1.0, 0.1);
        assert!((x - 0.4).abs() < 1e-6);
        assert_eq!(steer_pointer(0.5, None, 0.0, 1.0, 0.1), 0.5);
    }

    #[test]
    fn pointer_stays_in_paddle_range() {
        let x = steer_pointer(0.5, None, 1.0, 100.0, 1.0);
        assert_eq!(x, clamp_paddle_x(10.0));
        let back = steer_pointer(x, None, -1.0, 1.0, 0.01);
        assert!(back < x);
    }
}
