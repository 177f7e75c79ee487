//! User preferences and ambient sound settings.
//!
//! Every toggle is keyed by a stable identifier (`daily_reminders`,
//! `ocean_waves`, ...). Display labels are derived from the identifier,
//! never the other way round.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Preferences ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    DailyReminders,
    BreathingGuides,
    SessionAnalytics,
}

impl Preference {
    pub const ALL: [Preference; 3] = [
        Preference::DailyReminders,
        Preference::BreathingGuides,
        Preference::SessionAnalytics,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Preference::DailyReminders => "daily_reminders",
            Preference::BreathingGuides => "breathing_guides",
            Preference::SessionAnalytics => "session_analytics",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preference::DailyReminders => "Daily Reminders",
            Preference::BreathingGuides => "Breathing Guides",
            Preference::SessionAnalytics => "Session Analytics",
        }
    }
}

impl FromStr for Preference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preference::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| format!("unknown preference: {s}"))
    }
}

/// Profile switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub daily_reminders: bool,
    #[serde(default = "default_true")]
    pub breathing_guides: bool,
    #[serde(default)]
    pub session_analytics: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            daily_reminders: true,
            breathing_guides: true,
            session_analytics: false,
        }
    }
}

impl Preferences {
    pub fn get(&self, pref: Preference) -> bool {
        match pref {
            Preference::DailyReminders => self.daily_reminders,
            Preference::BreathingGuides => self.breathing_guides,
            Preference::SessionAnalytics => self.session_analytics,
        }
    }

    pub fn set(&mut self, pref: Preference, value: bool) {
        let slot = match pref {
            Preference::DailyReminders => &mut self.daily_reminders,
            Preference::BreathingGuides => &mut self.breathing_guides,
            Preference::SessionAnalytics => &mut self.session_analytics,
        };
        *slot = value;
    }

    /// Flip a switch and return its new value.
    pub fn toggle(&mut self, pref: Preference) -> bool {
        let value = !self.get(pref);
        self.set(pref, value);
        value
    }
}

// ── Sound catalog ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    Nature,
    Ambient,
    WhiteNoise,
}

impl SoundCategory {
    pub fn title(&self) -> &'static str {
        match self {
            SoundCategory::Nature => "Nature Sounds",
            SoundCategory::Ambient => "Ambient Music",
            SoundCategory::WhiteNoise => "White Noise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundId {
    GentleRain,
    ForestBirds,
    OceanWaves,
    MountainStream,
    CrystalSinging,
    TibetanBowl,
    SpaceAmbient,
    PianoMedley,
    PinkNoise,
    BrownNoise,
    FanSound,
    AirConditioner,
}

/// Static description of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sound {
    pub id: SoundId,
    pub name: &'static str,
    pub category: SoundCategory,
    pub premium: bool,
}

const fn sound(id: SoundId, name: &'static str, category: SoundCategory, premium: bool) -> Sound {
    Sound {
        id,
        name,
        category,
        premium,
    }
}

pub const CATALOG: [Sound; 12] = [
    sound(SoundId::GentleRain, "Gentle Rain", SoundCategory::Nature, false),
    sound(SoundId::ForestBirds, "Forest Birds", SoundCategory::Nature, false),
    sound(SoundId::OceanWaves, "Ocean Waves", SoundCategory::Nature, false),
    sound(SoundId::MountainStream, "Mountain Stream", SoundCategory::Nature, true),
    sound(SoundId::CrystalSinging, "Crystal Singing", SoundCategory::Ambient, false),
    sound(SoundId::TibetanBowl, "Tibetan Bowl", SoundCategory::Ambient, false),
    sound(SoundId::SpaceAmbient, "Space Ambient", SoundCategory::Ambient, true),
    sound(SoundId::PianoMedley, "Piano Medley", SoundCategory::Ambient, true),
    sound(SoundId::PinkNoise, "Pink Noise", SoundCategory::WhiteNoise, false),
    sound(SoundId::BrownNoise, "Brown Noise", SoundCategory::WhiteNoise, false),
    sound(SoundId::FanSound, "Fan Sound", SoundCategory::WhiteNoise, false),
    sound(SoundId::AirConditioner, "Air Conditioner", SoundCategory::WhiteNoise, true),
];

impl SoundId {
    pub fn info(&self) -> &'static Sound {
        CATALOG
            .iter()
            .find(|s| s.id == *self)
            .unwrap_or(&CATALOG[0])
    }

    pub fn id(&self) -> &'static str {
        match self {
            SoundId::GentleRain => "gentle_rain",
            SoundId::ForestBirds => "forest_birds",
            SoundId::OceanWaves => "ocean_waves",
            SoundId::MountainStream => "mountain_stream",
            SoundId::CrystalSinging => "crystal_singing",
            SoundId::TibetanBowl => "tibetan_bowl",
            SoundId::SpaceAmbient => "space_ambient",
            SoundId::PianoMedley => "piano_medley",
            SoundId::PinkNoise => "pink_noise",
            SoundId::BrownNoise => "brown_noise",
            SoundId::FanSound => "fan_sound",
            SoundId::AirConditioner => "air_conditioner",
        }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SoundId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .map(|sound| sound.id)
            .find(|id| id.id() == s)
            .ok_or_else(|| format!("unknown sound: {s}"))
    }
}

/// Catalog entries of one category, in catalog order.
pub fn sounds_in(category: SoundCategory) -> impl Iterator<Item = &'static Sound> {
    CATALOG.iter().filter(move |s| s.category == category)
}

// ── Sound settings ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    /// 0.0 ..= 1.0
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default = "default_true")]
    pub fade_out: bool,
    #[serde(default = "default_true")]
    pub offline_download: bool,
    #[serde(default)]
    pub selected: BTreeSet<SoundId>,
    /// Sound currently being previewed.
    #[serde(default)]
    pub playing: Option<SoundId>,
}

fn default_volume() -> f64 {
    0.7
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            fade_out: true,
            offline_download: true,
            selected: BTreeSet::new(),
            playing: None,
        }
    }
}

impl SoundSettings {
    /// Set volume, clamped into `0.0..=1.0`. NaN is treated as silence.
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }

    /// Volume as a whole percentage.
    pub fn volume_percent(&self) -> u32 {
        (self.volume * 100.0).round() as u32
    }

    /// Add or remove a sound from the mix. Returns whether it is now selected.
    ///
    /// Deselecting the sound being previewed stops the preview.
    pub fn toggle_selected(&mut self, id: SoundId) -> bool {
        if self.selected.remove(&id) {
            if self.playing == Some(id) {
                self.playing = None;
            }
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Start previewing `id`, or stop if it is already playing.
    pub fn toggle_playing(&mut self, id: SoundId) -> Option<SoundId> {
        self.playing = if self.playing == Some(id) {
            None
        } else {
            Some(id)
        };
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_ids_round_trip_through_from_str() {
        for pref in Preference::ALL {
            assert_eq!(pref.id().parse::<Preference>().unwrap(), pref);
        }
        assert!("dailyreminders".parse::<Preference>().is_err());
    }

    #[test]
    fn toggle_flips_only_the_named_preference() {
        let mut prefs = Preferences::default();
        assert!(!prefs.toggle(Preference::DailyReminders));
        assert!(!prefs.daily_reminders);
        assert!(prefs.breathing_guides);
        assert!(prefs.toggle(Preference::SessionAnalytics));
        assert!(prefs.session_analytics);
    }

    #[test]
    fn catalog_has_four_sounds_per_category() {
        for category in [
            SoundCategory::Nature,
            SoundCategory::Ambient,
            SoundCategory::WhiteNoise,
        ] {
            assert_eq!(sounds_in(category).count(), 4);
        }
        assert_eq!(CATALOG.iter().filter(|s| s.premium).count(), 4);
    }

    #[test]
    fn sound_id_parse_and_info() {
        let id: SoundId = "tibetan_bowl".parse().unwrap();
        assert_eq!(id, SoundId::TibetanBowl);
        assert_eq!(id.info().name, "Tibetan Bowl");
        assert_eq!(id.info().category, SoundCategory::Ambient);
    }

    #[test]
    fn deselecting_playing_sound_stops_it() {
        let mut sounds = SoundSettings::default();
        assert!(sounds.toggle_selected(SoundId::OceanWaves));
        sounds.toggle_playing(SoundId::OceanWaves);
        assert_eq!(sounds.playing, Some(SoundId::OceanWaves));

        assert!(!sounds.toggle_selected(SoundId::OceanWaves));
        assert_eq!(sounds.playing, None);
    }

    #[test]
    fn deselecting_other_sound_keeps_preview() {
        let mut sounds = SoundSettings::default();
        sounds.toggle_selected(SoundId::PinkNoise);
        sounds.toggle_playing(SoundId::GentleRain);
        sounds.toggle_selected(SoundId::PinkNoise);
        assert_eq!(sounds.playing, Some(SoundId::GentleRain));
    }

    #[test]
    fn toggle_playing_twice_stops() {
        let mut sounds = SoundSettings::default();
        assert_eq!(sounds.toggle_playing(SoundId::FanSound), Some(SoundId::FanSound));
        assert_eq!(sounds.toggle_playing(SoundId::FanSound), None);
    }

    #[test]
    fn volume_is_clamped() {
        let mut sounds = SoundSettings::default();
        assert_eq!(sounds.volume_percent(), 70);
        sounds.set_volume(1.7);
        assert_eq!(sounds.volume, 1.0);
        sounds.set_volume(-0.2);
        assert_eq!(sounds.volume, 0.0);
        sounds.set_volume(f64::NAN);
        assert_eq!(sounds.volume, 0.0);
    }

    #[test]
    fn sound_settings_serialize_with_stable_ids() {
        let mut sounds = SoundSettings::default();
        sounds.toggle_selected(SoundId::BrownNoise);
        let json = serde_json::to_value(&sounds).unwrap();
        assert_eq!(json["selected"][0], "brown_noise");
    }
}
