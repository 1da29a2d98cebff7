//! Runner for CLI execution, TUI lifecycle, and playback thread orchestration.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
    thread::sleep,
    time::Duration,
};

use clap::ArgMatches;
use crossterm::{
    cursor, event, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use playback_core::dsp::effects::{
    AudioEffect, BasicReverbEffect, ConvolutionReverbEffect, DistortionEffect,
    HighPassFilterEffect, LowPassFilterEffect,
};
use playback_core::playback::{
    AudioRenderer, ContainerMediaSource, DefaultLoadControl, FixedTrackSelector,
    LoadControlSettings, NullEventListener, PlaybackEngine, PlaybackState, SystemClock,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::Serialize;
use symphonia::core::errors::Result;

use crate::logging::LogLine;
use crate::{cli, controls, logging, ui};

/// Main CLI execution path: parse args, run benches, or start playback.
pub fn run(args: &ArgMatches, log_buffer: Arc<Mutex<VecDeque<LogLine>>>) -> Result<i32> {
    info!("Starting playctl");
    // Primary entry for CLI execution; runs benchmarks or playback.
    if let Some((subcommand, sub_args)) = args.subcommand() {
        let code = match subcommand {
            "info" => {
                let file_path = sub_args.get_one::<String>("INPUT").unwrap();
                let print = sub_args.get_flag("print");
                run_info(file_path, print)
            }
            "peaks" => {
                let file_path = sub_args.get_one::<String>("INPUT").unwrap();
                let limited = sub_args.get_flag("limited");
                run_peaks(file_path, limited)
            }
            "create" => match sub_args.subcommand() {
                Some(("effects-json", _)) => run_create_effects_json(),
                _ => {
                    error!("Unknown create subcommand");
                    -1
                }
            },
            _ => {
                error!("Unknown subcommand");
                -1
            }
        };
        return Ok(code);
    }
    if let Some(code) = cli::bench::maybe_run_bench(args)? {
        return Ok(code);
    }

    let file_path = match args.get_one::<String>("INPUT") {
        Some(path) => path.clone(),
        None => {
            error!("Missing input file path");
            return Ok(-1);
        }
    };
    if args.get_flag("scan-durations") {
        let start = std::time::Instant::now();
        let durations = playback_core::container::info::get_durations_by_scan(&file_path);
        let elapsed = start.elapsed();
        let mut items = durations.into_iter().collect::<Vec<_>>();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        for (track_id, seconds) in items {
            println!("track {}: {:.3}s", track_id, seconds);
        }
        println!("scan duration: {:.3}s", elapsed.as_secs_f64());
        return Ok(0);
    }
    if args.get_flag("read-durations") {
        let start = std::time::Instant::now();
        let durations = playback_core::container::info::get_durations(&file_path);
        let elapsed = start.elapsed();
        let mut items = durations.into_iter().collect::<Vec<_>>();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        for (track_id, seconds) in items {
            println!("track {}: {:.3}s", track_id, seconds);
        }
        println!("scan duration: {:.3}s", elapsed.as_secs_f64());
        return Ok(0);
    }
    let gain = args
        .get_one::<String>("GAIN")
        .unwrap()
        .parse::<f32>()
        .unwrap();
    let quiet = args.get_flag("quiet");
    let no_gapless = args.get_flag("no-gapless");

    if !(file_path.ends_with(".prot") || file_path.ends_with(".mka")) {
        error!("File is not a .prot or .mka file");
        return Ok(-1);
    }

    let (_stream, stream_handle) = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(err) => {
            error!("Failed to open audio output: {}", err);
            return Ok(-1);
        }
    };
    let renderer = AudioRenderer::with_volume(stream_handle, gain / 100.0);
    let clock = Arc::new(SystemClock::new());
    let engine = PlaybackEngine::new(
        clock,
        vec![Box::new(renderer)],
        Box::new(FixedTrackSelector::default()),
        Box::new(DefaultLoadControl::new(LoadControlSettings::default())),
        Box::new(NullEventListener),
    );

    if no_gapless {
        info!("no-gapless has no effect on a single-period container source");
    }
    let source = ContainerMediaSource::new(file_path.clone());
    engine.prepare(Box::new(source), true, true);
    engine.set_play_when_ready(true);

    let _raw_mode = RawModeGuard::enable().ok();
    let mut terminal = if !quiet {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).ok()
    } else {
        None
    };
    let _stderr_guard = if terminal.is_some() {
        logging::capture_stderr(log_buffer.clone())
    } else {
        None
    };

    let mut shuffle_enabled = false;

    // UI / input loop.
    loop {
        let info = engine.snapshot();
        if info.playback_state == PlaybackState::Ended {
            break;
        }

        if let Some(term) = terminal.as_mut() {
            let log_lines = logging::snapshot_lines(&log_buffer);
            let status = controls::status_text(controls::StatusArgs {
                time: info.position_us as f64 / 1_000_000.0,
                duration: info
                    .playing_period_id
                    .and_then(|id| info.timeline.get_period_by_uid(id.period_uid))
                    .and_then(|period| info.timeline.get_window(period.window_index))
                    .map(|window| window.duration_us as f64 / 1_000_000.0)
                    .unwrap_or(0.0),
                playing: info.play_when_ready && info.playback_state == PlaybackState::Ready,
                shuffle: shuffle_enabled,
                state: info.playback_state,
            });
            ui::draw_status(term, &status, &log_lines);
        }

        if !controls::handle_key_event(&engine, &mut shuffle_enabled) {
            break;
        }

        sleep(Duration::from_millis(50));
    }

    engine.stop(true);
    engine.release().wait();

    // Restore the terminal state before exiting.
    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }

    Ok(0)
}

#[derive(Serialize)]
struct PeakWindow {
    max: f32,
    min: f32,
}

#[derive(Serialize)]
struct PeaksChannel {
    peaks: Vec<PeakWindow>,
}

#[derive(Serialize)]
struct PeaksOutput {
    channels: Vec<PeaksChannel>,
}

fn run_peaks(file_path: &str, limited: bool) -> i32 {
    let peaks = playback_core::peaks::get_peaks(file_path, limited);
    let channels = peaks
        .into_iter()
        .map(|channel| PeaksChannel {
            peaks: channel
                .into_iter()
                .map(|(max, min)| PeakWindow { max, min })
                .collect(),
        })
        .collect();
    let output = PeaksOutput { channels };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(err) => {
            error!("Failed to serialize peaks: {}", err);
            -1
        }
    }
}

fn run_create_effects_json() -> i32 {
    let effects = default_effects_chain();
    match serde_json::to_string_pretty(&effects) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(err) => {
            error!("Failed to serialize effects: {}", err);
            -1
        }
    }
}

fn default_effects_chain() -> Vec<AudioEffect> {
    vec![
        AudioEffect::ConvolutionReverb(ConvolutionReverbEffect::default()),
        AudioEffect::BasicReverb(BasicReverbEffect::default()),
        AudioEffect::LowPassFilter(LowPassFilterEffect::default()),
        AudioEffect::HighPassFilter(HighPassFilterEffect::default()),
        AudioEffect::Distortion(DistortionEffect::default()),
    ]
}

fn run_info(file_path: &str, print: bool) -> i32 {
    let info = playback_core::container::info::Info::new(file_path.to_string());
    if print {
        println!("File: {}", file_path);
        println!("Tracks: {}", info.duration_map.len());
        println!("Channels: {}", info.channels);
        println!("Sample rate: {} Hz", info.sample_rate);
        println!("Bits per sample: {}", info.bits_per_sample);

        let mut track_items: Vec<(u32, f64)> =
            info.duration_map.iter().map(|(k, v)| (*k, *v)).collect();
        track_items.sort_by(|a, b| a.0.cmp(&b.0));
        if track_items.is_empty() {
            println!("No track durations available.");
        } else {
            for (track_id, seconds) in track_items {
                println!("Track {}: {:.3}s", track_id, seconds);
            }
        }

        return 0;
    }

    let _raw_mode = RawModeGuard::enable().ok();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(err) => {
            error!("Failed to create terminal: {}", err);
            let mut stdout = io::stdout();
            let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
            return -1;
        }
    };

    loop {
        ui::draw_info(&mut terminal, &info, file_path);
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(event::Event::Key(key)) = event::read() {
                match key.code {
                    event::KeyCode::Char('q')
                    | event::KeyCode::Esc
                    | event::KeyCode::Enter => break,
                    _ => {}
                }
            }
        }
    }

    let _ = terminal.show_cursor();
    let stdout = terminal.backend_mut();
    let _ = crossterm::execute!(stdout, LeaveAlternateScreen, cursor::Show);

    0
}

/// RAII guard for terminal raw mode.
struct RawModeGuard;

impl RawModeGuard {
    /// Enable raw mode and return a guard that restores it on drop.
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    /// Restore terminal state.
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
