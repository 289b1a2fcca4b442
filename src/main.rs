// Library-style modules expose more API than the demo binary calls
#![allow(dead_code)]

mod config;
mod dither;
mod display;
mod effects;
mod math3d;
mod mini3d;
mod timeline;
mod util;

use std::time::Instant;

use config::{DemoConfig, DEFAULT_CONFIG_PATH};
use dither::Screen;
use display::{Display, InputEvent, RenderTarget, SCREEN_HEIGHT, SCREEN_WIDTH};
use sdl2::keyboard::Keycode;
use timeline::{Buttons, Clock, FrameContext, InputState, Section, Timeline};
use util::FpsCounter;

/// Seconds skipped by up/down while the timeline runs
const SEEK_SECONDS: f32 = 5.0;
/// Crank degrees per wheel click or `,` / `.` press
const CRANK_STEP: f32 = 10.0;

struct Args {
    config_path: String,
    scale: Option<u32>,
    no_vsync: bool,
    effect: Option<usize>,
    verbose: bool,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        scale: None,
        no_vsync: false,
        effect: None,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => parsed.no_vsync = true,
            "--verbose" | "-v" => parsed.verbose = true,
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = args[i + 1].clone();
                    i += 1;
                }
            },
            "--scale" | "-s" => {
                if i + 1 < args.len() {
                    if let Ok(s) = args[i + 1].parse::<u32>() {
                        parsed.scale = Some(s);
                    }
                    i += 1;
                }
            },
            "--effect" | "-e" => {
                if i + 1 < args.len() {
                    if let Ok(e) = args[i + 1].parse::<usize>() {
                        parsed.effect = Some(e);
                    }
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: onebit [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  --config PATH, -c PATH  Config file (default: {})",
                    DEFAULT_CONFIG_PATH
                );
                println!("  --scale N, -s N         Window zoom (default: 2)");
                println!("  --effect N, -e N        Run one effect instead of the timeline");
                println!("  --no-vsync              Disable VSync for uncapped framerate");
                println!("  --verbose, -v           Debug logging");
                println!("  --help                  Show this help message");
                std::process::exit(0);
            },
            other => eprintln!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    parsed
}

/// Minimal `log` backend writing to stderr
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Keyboard stand-ins for the handheld buttons
fn key_button(key: Keycode) -> Option<Buttons> {
    match key {
        Keycode::Left => Some(Buttons::LEFT),
        Keycode::Right => Some(Buttons::RIGHT),
        Keycode::Up => Some(Buttons::UP),
        Keycode::Down => Some(Buttons::DOWN),
        Keycode::Z => Some(Buttons::B),
        Keycode::X => Some(Buttons::A),
        _ => None,
    }
}

/// Number keys 1-9 pin an effect
fn key_effect(key: Keycode) -> Option<usize> {
    let keys = [
        Keycode::Num1,
        Keycode::Num2,
        Keycode::Num3,
        Keycode::Num4,
        Keycode::Num5,
        Keycode::Num6,
        Keycode::Num7,
        Keycode::Num8,
        Keycode::Num9,
    ];
    keys.iter().position(|&k| k == key)
}

fn main() -> Result<(), String> {
    let args = parse_args();
    init_logging(args.verbose);

    let mut config = DemoConfig::load_or_default(&args.config_path);
    if let Some(scale) = args.scale {
        config.window_scale = scale;
    }
    if args.no_vsync {
        config.vsync = false;
    }

    let noise = config
        .noise
        .build(SCREEN_WIDTH, SCREEN_HEIGHT)
        .map_err(|e| e.to_string())?;
    let mut screen = Screen::new(noise).map_err(|e| e.to_string())?;

    let (width, height) = (SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    let (mut display, texture_creator) =
        Display::with_options("onebit", width, height, config.window_scale, config.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;

    let mut effects = effects::all();
    let sections: Vec<Section> = config
        .timeline
        .iter()
        .copied()
        .filter(|s| {
            let known = s.effect < effects.len();
            if !known {
                log::warn!("timeline section {:?} names no effect, skipped", s);
            }
            known
        })
        .collect();
    let timeline = Timeline::new(sections);

    // None = follow the timeline, Some(idx) = effects[idx] only
    let mut pinned = args.effect.filter(|&idx| idx < effects.len());
    if args.effect.is_some() && pinned.is_none() {
        log::warn!("no effect {:?}, following the timeline", args.effect);
    }
    if timeline.sections().is_empty() && pinned.is_none() {
        pinned = Some(0);
    }

    let mut clock = Clock::new(config.beat_seconds, config.start_beat);
    let started = Instant::now();
    let mut input = InputState::default();
    let mut fps_counter = FpsCounter::new(60);
    let mut current: Option<usize> = None;
    let mut last_title = Instant::now();

    println!("=== onebit ===");
    println!("Panel: {}x{} at {}x zoom", width, height, config.window_scale);
    if config.vsync {
        println!("VSync: ON. Use --no-vsync for uncapped.");
    } else {
        println!("VSync: OFF (uncapped framerate)");
    }
    println!(
        "Timeline: {} sections, {:.0} beats at {:.3}s/beat",
        timeline.sections().len(),
        timeline.end(),
        config.beat_seconds
    );
    println!("Use --help for command line options.");
    println!("Controls:");
    println!("  Arrows     - D-pad (Up/Down seek 5s while the timeline runs)");
    println!("  Z / X      - B / A buttons");
    println!("  Wheel , .  - Turn the crank");
    for (i, effect) in effects.iter().enumerate().take(9) {
        println!("  {}          - {}", i + 1, effect.name());
    }
    println!("  0          - Back to the timeline");
    println!("  Escape     - Quit");

    'main: loop {
        let (_dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::Num0) if !timeline.sections().is_empty() => {
                    if pinned.take().is_some() {
                        clock.restart(started.elapsed().as_secs_f32());
                    }
                },
                InputEvent::KeyDown(Keycode::Comma) => input.turn_crank(-CRANK_STEP),
                InputEvent::KeyDown(Keycode::Period) => input.turn_crank(CRANK_STEP),
                InputEvent::KeyDown(key) => {
                    if let Some(button) = key_button(key) {
                        input.down.set(button, true);
                    } else if let Some(idx) = key_effect(key).filter(|&idx| idx < effects.len()) {
                        pinned = Some(idx);
                    }
                },
                InputEvent::KeyUp(key) => {
                    if let Some(button) = key_button(key) {
                        input.down.set(button, false);
                    }
                },
                InputEvent::MouseWheel(clicks) => input.turn_crank(clicks as f32 * CRANK_STEP),
            }
        }

        let pressed = input.take_pressed();
        if pinned.is_none() {
            if pressed.contains(Buttons::UP) {
                clock.seek(SEEK_SECONDS);
            }
            if pressed.contains(Buttons::DOWN) {
                clock.seek(-SEEK_SECONDS);
            }
        }

        let elapsed = started.elapsed().as_secs_f32();
        let mut beat = clock.advance(elapsed);
        if pinned.is_none() && clock.time() >= timeline.end() {
            log::info!("timeline finished, starting over");
            clock.restart(elapsed);
            beat = clock.advance(elapsed);
        }

        let (active, alpha, fade_bias) = match pinned {
            Some(idx) => (Some(idx), 0.0, 0),
            None => match timeline.at(clock.time()) {
                Some(section) => (Some(section.effect), section.alpha, section.fade_bias),
                None => (None, 0.0, 0),
            },
        };

        if active != current {
            if let Some(idx) = active {
                log::info!("effect: {} at beat {:.1}", effects[idx].name(), clock.time());
                effects[idx].reset();
            }
            current = active;
        }

        let frame = FrameContext {
            time: clock.time(),
            prev_time: clock.prev_time(),
            beat,
            frame: clock.frame(),
            buttons_down: input.down,
            buttons_pressed: pressed,
            crank: input.crank,
            alpha,
            fade_bias,
        };

        let value = match active {
            Some(idx) => effects[idx].update(&frame, &mut screen),
            None => {
                screen.frame.clear(true);
                0
            },
        };

        display.present(&mut target, &screen.frame)?;

        if last_title.elapsed().as_secs_f32() >= 0.5 {
            let name = active.map_or("-", |idx| effects[idx].name());
            display.set_title(&format!(
                "onebit - {} [{}] beat {:.1} - {:.0} fps",
                name,
                value,
                clock.time(),
                avg_fps
            ))?;
            last_title = Instant::now();
        }
    }

    Ok(())
}
