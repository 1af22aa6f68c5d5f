//! Sky Climber headless runner
//!
//! Plays one autopilot run and prints its stats as JSON.
//!
//! Usage: `sky-climber [seed] [seconds] [settings.json]`

use std::path::Path;

use sky_climber::Settings;
use sky_climber::consts::*;
use sky_climber::sim::{GamePhase, GameState, TickInput, tick};

/// Simulated frame length; the fixed-step loop catches up in substeps
const FRAME_DT: f32 = 1.0 / 30.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);
    let settings = args
        .next()
        .map(|p| Settings::load(Path::new(&p)))
        .unwrap_or_default();
    if let Err(e) = settings.validate() {
        log::error!("Settings are not playable: {e}");
        std::process::exit(2);
    }

    log::info!(
        "Sky Climber starting: seed {seed}, {seconds}s, difficulty {}",
        settings.difficulty.as_str()
    );

    let mut state = GameState::new(seed, &settings);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let frames = (seconds / FRAME_DT).ceil() as u64;
    let mut accumulator = 0.0;
    'run: for _ in 0..frames {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut state, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
            if state.phase == GamePhase::GameOver {
                break 'run;
            }
        }
    }

    match serde_json::to_string_pretty(&state.stats()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not encode run stats: {e}"),
    }
}
