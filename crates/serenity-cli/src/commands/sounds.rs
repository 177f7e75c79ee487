use clap::Subcommand;
use serde_json::json;
use serenity_core::settings::CATALOG;
use serenity_core::{Config, SoundId};

#[derive(Subcommand)]
pub enum SoundsAction {
    /// Show the sound catalog with selection and playback state
    List,
    /// Add a sound to the mix, or remove it if already selected
    Select {
        /// Sound id (e.g. gentle_rain)
        id: SoundId,
    },
    /// Start previewing a sound, or stop if it is playing
    Play {
        /// Sound id
        id: SoundId,
    },
    /// Set the volume
    Volume {
        /// Percent, 0 to 100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Fade out at the end of a session
    Fade {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

pub fn run(action: SoundsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let sounds = &mut config.sounds;

    match action {
        SoundsAction::List => {
            let catalog: Vec<_> = CATALOG
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id.id(),
                        "name": s.name,
                        "category": s.category.title(),
                        "premium": s.premium,
                        "selected": sounds.selected.contains(&s.id),
                        "playing": sounds.playing == Some(s.id),
                    })
                })
                .collect();
            let out = json!({
                "volume": sounds.volume_percent(),
                "fade_out": sounds.fade_out,
                "offline_download": sounds.offline_download,
                "sounds": catalog,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Ok(());
        }
        SoundsAction::Select { id } => {
            let selected = sounds.toggle_selected(id);
            println!("{id}: {}", if selected { "selected" } else { "removed" });
        }
        SoundsAction::Play { id } => match sounds.toggle_playing(id) {
            Some(playing) => println!("playing {}", playing.info().name),
            None => println!("stopped"),
        },
        SoundsAction::Volume { percent } => {
            sounds.set_volume(f64::from(percent) / 100.0);
            println!("volume: {}%", sounds.volume_percent());
        }
        SoundsAction::Fade { enabled } => {
            sounds.fade_out = enabled;
            println!("fade out: {}", if enabled { "on" } else { "off" });
        }
    }

    config.save()?;
    Ok(())
}
