//! Input handling and status summary helpers for the CLI.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use playback_core::playback::{PlaybackEngine, PlaybackState};

/// Render-ready status text for the TUI.
pub struct StatusSnapshot {
    pub text: String,
}

/// Inputs used to build the status text block.
pub struct StatusArgs {
    pub time: f64,
    pub duration: f64,
    pub playing: bool,
    pub shuffle: bool,
    pub state: PlaybackState,
}

/// Produce the status snapshot string from runtime metrics.
pub fn status_text(args: StatusArgs) -> StatusSnapshot {
    // Create a multi-line status string for the UI panel.
    let state = match args.state {
        PlaybackState::Buffering => "⏳ Buffering",
        _ if args.playing => "▶ Playing",
        _ => "⏸ Paused",
    };
    let current = format_time(args.time * 1000.0);
    let total = format_time(args.duration * 1000.0);
    let percent = if args.duration > 0.0 {
        (args.time / args.duration * 100.0).min(100.0)
    } else {
        0.0
    };
    let shuffle_label = if args.shuffle { "on" } else { "off" };

    let text = format!(
        "{}   {} / {}   ({:>5.1}%)\nShuffle: {}",
        state, current, total, percent, shuffle_label
    );

    StatusSnapshot { text }
}

/// Handle a single key event and apply it to the engine.
/// Returns `false` if the UI should exit.
pub fn handle_key_event(engine: &PlaybackEngine, shuffle_enabled: &mut bool) -> bool {
    // Handle one input event. Returns false when the user requests exit.
    if event::poll(Duration::from_millis(100)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            if key.kind != KeyEventKind::Press {
                return true;
            }
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    engine.stop(true);
                    return false;
                }
                KeyCode::Char('q') => {
                    engine.stop(true);
                    return false;
                }
                KeyCode::Char(' ') => {
                    let playing = engine.snapshot().play_when_ready;
                    engine.set_play_when_ready(!playing);
                }
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    *shuffle_enabled = !*shuffle_enabled;
                    engine.set_shuffle_mode_enabled(*shuffle_enabled);
                }
                KeyCode::Left => {
                    let info = engine.snapshot();
                    let window_index = info
                        .playing_period_id
                        .and_then(|id| info.timeline.get_period_by_uid(id.period_uid))
                        .map(|p| p.window_index)
                        .unwrap_or(0);
                    let target = (info.position_us - 5_000_000).max(0);
                    engine.seek_to(window_index, target);
                }
                KeyCode::Right => {
                    let info = engine.snapshot();
                    let window_index = info
                        .playing_period_id
                        .and_then(|id| info.timeline.get_period_by_uid(id.period_uid))
                        .map(|p| p.window_index)
                        .unwrap_or(0);
                    engine.seek_to(window_index, info.position_us + 5_000_000);
                }
                _ => {}
            }
        }
    }

    true
}

/// Format a duration in seconds as `MM:SS`.
fn format_time(time: f64) -> String {
    // Format milliseconds into HH:MM:SS.
    let seconds = (time / 1000.0).ceil() as u32;
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
