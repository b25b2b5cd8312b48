//! Example: Play an audio file through the analyzer
//!
//! Decodes a WAV file, feeds it through a simulated player and prints a
//! coarse spectrum and level meter every 100 ms of playback.
//!
//! ```text
//! cargo run --example analyze_file -- path/to/track.wav
//! ```

use std::sync::Arc;
use std::time::Duration;

use stratum_scope::io::{decode_audio, BufferedPlayer};
use stratum_scope::{AnalyzerConfig, PlaybackSource, SpectrumAnalyzer};

fn bar(value: f32, full_scale: f32, width: usize) -> String {
    let filled = ((value / full_scale).clamp(0.0, 1.0) * width as f32).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: analyze_file <path/to/audio.wav>")?;

    let audio = decode_audio(&path)?;
    println!(
        "{}: {:.2}s, {} channel(s) at {} Hz",
        path,
        audio.duration_secs(),
        audio.channels,
        audio.sample_rate
    );

    let player = Arc::new(BufferedPlayer::new(audio, Duration::from_millis(80)));
    let analyzer = SpectrumAnalyzer::new(AnalyzerConfig::new(0.1, 8, 1))?;
    let sink = analyzer.attach(player.clone());

    let block = Duration::from_millis(20);
    let mut blocks = 0usize;
    while player.pump(&sink, block) {
        blocks += 1;
        if blocks % 5 != 0 {
            continue;
        }

        let spectrum = analyzer.get_spectrum(0);
        let level = analyzer.get_amplitude(0)[0];
        let bands: Vec<String> = spectrum.iter().map(|db| format!("{:6.1}", db)).collect();
        println!(
            "{:7.2}s |{}| {}",
            player.playback_time().as_secs_f32(),
            bar(level, 16384.0, 24),
            bands.join(" ")
        );
    }

    println!("{}", serde_json::to_string_pretty(&analyzer.status())?);

    Ok(())
}
