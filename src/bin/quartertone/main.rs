//! quartertone - play the 24-tone grid from the computer keyboard
//!
//! Run with: cargo run --release
//! Logs go to `quartertone.log` in the temp directory (`RUST_LOG` sets the filter).

mod app;
mod ui;

use std::{fs::File, io::stdout};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{
        DisableFocusChange, EnableFocusChange, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use quartertone::{io::CpalBackend, EngineConfig, Synth};

use app::Player;
use ui::UiApp;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let mut synth = Synth::new(CpalBackend::new(), EngineConfig::default());
    synth.start().wrap_err("failed to open audio output")?;

    let mut terminal = ratatui::init();
    let release_events = enable_terminal_events();

    let mut app = UiApp::new(Player::new(synth, release_events));
    let res = app.run(&mut terminal);

    disable_terminal_events(release_events);
    ratatui::restore();
    res
}

fn init_logging() -> EyreResult<()> {
    let path = std::env::temp_dir().join("quartertone.log");
    let file = File::create(&path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Ask for focus events, and key release events where the terminal supports
/// them. Returns whether releases will be reported.
fn enable_terminal_events() -> bool {
    if let Err(err) = execute!(stdout(), EnableFocusChange) {
        log::warn!("focus events unavailable: {err}");
    }

    let supported = supports_keyboard_enhancement().unwrap_or(false);
    if supported {
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        if let Err(err) = execute!(stdout(), PushKeyboardEnhancementFlags(flags)) {
            log::warn!("key release events unavailable: {err}");
            return false;
        }
    } else {
        log::info!("terminal does not report key releases, notes auto-release");
    }
    supported
}

fn disable_terminal_events(release_events: bool) {
    if release_events {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    let _ = execute!(stdout(), DisableFocusChange);
}
