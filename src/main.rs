//! Keysynth - A virtual keyboard synthesizer for the terminal

use anyhow::Result;
use clap::Parser;
use keysynth::config;
use keysynth::engine::{default_device_name, list_output_devices, Player};
use keysynth::synth::{NoteId, TuningTable};
use keysynth::{viz, ControlSurface};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { config: config_path } => {
            let cfg = config::load_or_default(&config_path)?;

            let player = Player::new(cfg.audio.device.clone())
                .with_buffer_size(cfg.audio.buffer_size as u32);
            let control = ControlSurface::new(&cfg, Box::new(player))?;

            viz::run(&cfg, control)?;
        }

        Commands::Devices => {
            println!("Available output devices:\n");

            if let Some(name) = default_device_name() {
                println!("Default output: {}\n", name);
            }

            let devices = list_output_devices();
            if devices.is_empty() {
                println!("  (none found)");
            }
            for (name, config) in devices {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!(
                        "  Device: {}",
                        cfg.audio.device.as_deref().unwrap_or("(default)")
                    );
                    println!("  Waveform: {}", cfg.synth.waveform);
                    println!("  Base frequency: {:.2} Hz", cfg.synth.base_frequency);
                    println!("  Volume: {:.0}%", cfg.synth.volume * 100.0);
                    println!("  Attack: {:.2}s", cfg.synth.attack);
                    println!("  Release: {:.2}s", cfg.synth.release);
                    println!(
                        "  Scope: {} samples, {}x{} grid, {} fps",
                        cfg.scope.fft_size / 2,
                        cfg.scope.grid_columns,
                        cfg.scope.grid_rows,
                        cfg.scope.frame_rate
                    );
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = "keysynth.yaml";
            if std::path::Path::new(path).exists() {
                println!("keysynth.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_CONFIG)?;
                println!("Created keysynth.yaml with example configuration.");
            }
        }

        Commands::Notes { base } => {
            if !(base.is_finite() && base > 0.0) {
                anyhow::bail!("Base frequency must be a positive number of Hz");
            }

            let table = TuningTable::standard();
            println!("Base pitch {:.2} Hz on {}\n", base, NoteId::ROOT);
            println!("Key  Note  Multiplier  Frequency");
            for note in NoteId::ALL {
                println!(
                    " {}   {:<4}  {:>10.4}  {:>9.2} Hz",
                    viz::key_for_note(note).to_ascii_uppercase(),
                    note.name(),
                    table.multiplier(note),
                    table.frequency(note, base)
                );
            }
        }
    }

    Ok(())
}
