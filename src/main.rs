//! rawscope viewer on a synthetic recording.
//!
//! ```bash
//! cargo run -- [config.yaml]
//! ```
//! Opens 64 channels (EEG plus EOG/ECG/EMG) of 2 minutes at 250 Hz with a few
//! bad channels and periodic stimulus annotations. An optional first argument
//! names a YAML `ViewerConfig`.

use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;

use rawscope::{logging, run_viewer, ChannelType, Recording, ViewCoordinator, ViewerConfig};

const SAMPLE_RATE: f64 = 250.0;
const DURATION_S: f64 = 120.0;

fn channel_layout() -> Vec<(String, ChannelType)> {
    let mut out = Vec::with_capacity(64);
    for (prefix, count) in [("Fp", 6), ("F", 12), ("C", 12), ("P", 12), ("O", 6), ("T", 12)] {
        for i in 1..=count {
            out.push((format!("{prefix}{i}"), ChannelType::Eeg));
        }
    }
    out.push(("EOG1".to_string(), ChannelType::Eog));
    out.push(("EOG2".to_string(), ChannelType::Eog));
    out.push(("ECG".to_string(), ChannelType::Ecg));
    out.push(("EMG".to_string(), ChannelType::Emg));
    out
}

fn synthetic_recording() -> Recording {
    let layout = channel_layout();
    let n = (SAMPLE_RATE * DURATION_S) as usize;
    let data: Vec<Vec<f64>> = layout
        .iter()
        .enumerate()
        .map(|(ch, (_, ty))| {
            let phase = ch as f64 * 0.37;
            (0..n)
                .map(|k| {
                    let t = k as f64 / SAMPLE_RATE;
                    match ty {
                        ChannelType::Ecg => {
                            // 72 bpm spike train
                            let beat = (t * 1.2).fract();
                            800.0 * (-((beat - 0.1) / 0.01).powi(2)).exp()
                        }
                        ChannelType::Eog => 120.0 * (2.0 * PI * 0.25 * t + phase).sin(),
                        _ => {
                            let alpha = 20.0 * (2.0 * PI * 10.0 * t + phase).sin();
                            let drift = 15.0 * (2.0 * PI * 0.3 * t + phase).sin();
                            let line = 5.0 * (2.0 * PI * 50.0 * t).sin();
                            alpha + drift + line
                        }
                    }
                })
                .collect()
        })
        .collect();
    let (names, types): (Vec<String>, Vec<ChannelType>) = layout.into_iter().unzip();

    let recording =
        Recording::new(names, types, SAMPLE_RATE, data).with_bad_channels(["F4", "O2", "T9"]);
    let mut onset = 5.0;
    let mut i = 0;
    while onset < DURATION_S {
        let description = ["stimulus/left", "stimulus/right", "blink"][i % 3];
        recording.add_annotation(onset, 0.0, description);
        onset += 7.5;
        i += 1;
    }
    recording
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = logging::init() {
        eprintln!("logging disabled: {e}");
    }

    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::load_from_path(Path::new(&path))?,
        None => ViewerConfig::default(),
    };

    let recording = Arc::new(synthetic_recording());
    let mut coordinator = ViewCoordinator::new(recording, config)?;
    coordinator.auto_scale();

    run_viewer(coordinator, "rawscope")?;
    Ok(())
}
