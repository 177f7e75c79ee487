use clap::Subcommand;
use serde_json::json;
use serenity_core::{Config, Preference};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show profile preferences
    Preferences,
    /// Flip one preference on or off
    Toggle {
        /// Preference id: daily_reminders, breathing_guides or session_analytics
        preference: Preference,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    match action {
        SettingsAction::Preferences => {
            let prefs: Vec<_> = Preference::ALL
                .into_iter()
                .map(|p| {
                    json!({
                        "id": p.id(),
                        "label": p.label(),
                        "enabled": config.preferences.get(p),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        SettingsAction::Toggle { preference } => {
            let enabled = config.preferences.toggle(preference);
            config.save()?;
            println!("{}: {}", preference.id(), if enabled { "on" } else { "off" });
        }
    }
    Ok(())
}
