//! Game Boy emulator entry point.
//!
//! Loads a cartridge and runs it in a window.
//! Usage: gbemu <game.gb> [--model dmg|pocket|sgb|cgb] [--trace] [--unmapped-zero] [--scale N]

use std::env;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use ansi_term::Colour::Red;
use anyhow::{Context, Result};
use gbemu::{
    Button, Config, GameBoy,
    clock::{CPU_FREQUENCY_HZ, CYCLES_PER_FRAME},
    cpu::trace::ConsoleTrace,
    ppu::frame::{SCREEN_HEIGHT, SCREEN_WIDTH},
};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

/// One frame of machine time: 70224 cycles at 4.194304 MHz, about 16.74 ms (~59.7 fps).
const FRAME_DURATION: Duration =
    Duration::from_nanos(CYCLES_PER_FRAME as u64 * 1_000_000_000 / CPU_FREQUENCY_HZ as u64);

const KEYMAP: [(Key, Button); 8] = [
    (Key::Right, Button::Right),
    (Key::Left, Button::Left),
    (Key::Up, Button::Up),
    (Key::Down, Button::Down),
    (Key::Z, Button::A),
    (Key::X, Button::B),
    (Key::Backspace, Button::Select),
    (Key::Enter, Button::Start),
];

fn button_for(key: Key) -> Option<Button> {
    KEYMAP
        .iter()
        .find(|(mapped, _)| *mapped == key)
        .map(|(_, button)| *button)
}

fn window_scale(scale: u32) -> Scale {
    match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        8 => Scale::X8,
        _ => Scale::X4,
    }
}

fn run(config: Config) -> Result<()> {
    let mut gb = GameBoy::new(config.emulator);
    if config.trace {
        gb.set_trace_sink(Box::new(ConsoleTrace));
    }
    gb.load_file(&config.rom_path)
        .with_context(|| format!("failed to load {}", config.rom_path.display()))?;

    let title = match gb.game_name() {
        Some(name) if !name.is_empty() => format!("gbemu - {name}"),
        _ => "gbemu".to_string(),
    };

    let mut window = Window::new(
        &title,
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            resize: true,
            scale: window_scale(config.scale),
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )
    .context("failed to create window")?;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        for key in window.get_keys_pressed(KeyRepeat::No) {
            if let Some(button) = button_for(key) {
                gb.key_down(button);
            }
        }
        for key in window.get_keys_released() {
            if let Some(button) = button_for(key) {
                gb.key_up(button);
            }
        }

        gb.emulate_frame().context("emulation stopped")?;

        match gb.frame() {
            Some(frame) if gb.frame_ready() => {
                window
                    .update_with_buffer(frame, SCREEN_WIDTH, SCREEN_HEIGHT)
                    .context("failed to update window")?;
                gb.clear_frame_ready();
            }
            // LCD off: keep the window responsive without a new frame
            _ => window.update(),
        }

        // Pace to real hardware speed; emulation is far faster
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", Red.bold().paint("ERROR"));
            eprintln!(
                "usage: gbemu <game.gb> [--model dmg|pocket|sgb|cgb] [--trace] [--unmapped-zero] [--scale 1|2|4|8]"
            );
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", Red.bold().paint("ERROR"));
            ExitCode::FAILURE
        }
    }
}
