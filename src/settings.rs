//! Player settings and preferences
//!
//! Persisted separately from anything else in LocalStorage.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::renderer::colors;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown skin '{0}'")]
pub struct UnknownSkin(pub String);

/// Cosmetic runner skins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Skin {
    #[default]
    Classic,
    Golden,
    Neon,
    Cyber,
    Royal,
    Robo,
    Alien,
    Ninja,
    Lava,
    Frost,
}

impl Skin {
    pub const ALL: [Skin; 10] = [
        Skin::Classic,
        Skin::Golden,
        Skin::Neon,
        Skin::Cyber,
        Skin::Royal,
        Skin::Robo,
        Skin::Alien,
        Skin::Ninja,
        Skin::Lava,
        Skin::Frost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skin::Classic => "classic",
            Skin::Golden => "golden",
            Skin::Neon => "neon",
            Skin::Cyber => "cyber",
            Skin::Royal => "royal",
            Skin::Robo => "robo",
            Skin::Alien => "alien",
            Skin::Ninja => "ninja",
            Skin::Lava => "lava",
            Skin::Frost => "frost",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Skin::Classic => "Gallina Bianca",
            Skin::Golden => "Gallina Oro",
            Skin::Neon => "Gallina Neon",
            Skin::Cyber => "Gallina Cyber",
            Skin::Royal => "Gallina Reale",
            Skin::Robo => "Robo Gallina",
            Skin::Alien => "Gallina Aliena",
            Skin::Ninja => "Gallina Ninja",
            Skin::Lava => "Gallina Lavica",
            Skin::Frost => "Gallina Ghiacciata",
        }
    }

    pub fn color(&self) -> [f32; 4] {
        colors::rgb(match self {
            Skin::Classic => 0xffffff,
            Skin::Golden => 0xfbbf24,
            Skin::Neon => 0x10b981,
            Skin::Cyber => 0x06b6d4,
            Skin::Royal => 0x8b5cf6,
            Skin::Robo => 0x64748b,
            Skin::Alien => 0xa3e635,
            Skin::Ninja => 0x111827,
            Skin::Lava => 0xef4444,
            Skin::Frost => 0x60a5fa,
        })
    }
}

impl FromStr for Skin {
    type Err = UnknownSkin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|skin| skin.as_str() == key)
            .ok_or_else(|| UnknownSkin(s.to_string()))
    }
}

/// One edit made from the settings panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingChange {
    Skin(Skin),
    VoiceThreshold(f32),
    MasterVolume(f32),
    ShowFps(bool),
    ShowVoiceMeter(bool),
    MuteOnBlur(bool),
    ReducedMotion(bool),
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub skin: Skin,

    // === Voice ===
    /// Loudness (0-255 average spectrum) that counts as a jump
    pub voice_threshold: f32,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
    /// Show the microphone level meter in voice mode
    pub show_voice_meter: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no tumble, no teleport flash)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skin: Skin::Classic,
            voice_threshold: 45.0,
            show_fps: false,
            show_voice_meter: true,
            master_volume: 0.8,
            mute_on_blur: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Clamp values edited by hand in storage back into range
    pub fn sanitized(mut self) -> Self {
        self.voice_threshold = if self.voice_threshold.is_finite() {
            self.voice_threshold.clamp(1.0, 255.0)
        } else {
            Self::default().voice_threshold
        };
        self.master_volume = if self.master_volume.is_finite() {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            Self::default().master_volume
        };
        self
    }

    /// Apply a panel edit, keeping values in range
    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::Skin(skin) => self.skin = skin,
            SettingChange::VoiceThreshold(v) => self.voice_threshold = v,
            SettingChange::MasterVolume(v) => self.master_volume = v,
            SettingChange::ShowFps(on) => self.show_fps = on,
            SettingChange::ShowVoiceMeter(on) => self.show_voice_meter = on,
            SettingChange::MuteOnBlur(on) => self.mute_on_blur = on,
            SettingChange::ReducedMotion(on) => self.reduced_motion = on,
        }
        *self = std::mem::take(self).sanitized();
    }

    /// Runner color for the selected skin
    pub fn skin_color(&self) -> [f32; 4] {
        self.skin.color()
    }

    /// Parse stored JSON, falling back to defaults on anything unreadable
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Ignoring stored settings: {e}");
                Self::default()
            }
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "gallina_dash_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No settings storage on native ({})", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_round_trip_names() {
        for skin in Skin::ALL {
            assert_eq!(skin.as_str().parse(), Ok(skin));
            assert!(skin.name().contains("Gallina"));
        }
        assert_eq!(" GOLDEN ".parse(), Ok(Skin::Golden));
        assert_eq!("rainbow".parse::<Skin>(), Err(UnknownSkin("rainbow".into())));
    }

    #[test]
    fn test_panel_edits_apply_and_clamp() {
        let mut s = Settings::default();
        s.apply(SettingChange::Skin(Skin::Frost));
        s.apply(SettingChange::ReducedMotion(true));
        s.apply(SettingChange::VoiceThreshold(0.0));
        s.apply(SettingChange::MasterVolume(f32::NAN));
        assert_eq!(s.skin, Skin::Frost);
        assert!(s.reduced_motion);
        assert_eq!(s.voice_threshold, 1.0);
        assert_eq!(s.master_volume, Settings::default().master_volume);
    }

    #[test]
    fn test_saved_json_loads_back() {
        let mut s = Settings::default();
        s.apply(SettingChange::Skin(Skin::Ninja));
        s.apply(SettingChange::ShowFps(true));
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(Settings::from_json(&json), s);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{"skin":"lava","show_fps":true}"#);
        assert_eq!(s.skin, Skin::Lava);
        assert!(s.show_fps);
        assert_eq!(s.voice_threshold, 45.0);
    }

    #[test]
    fn test_garbage_json_is_default() {
        assert_eq!(Settings::from_json("not json"), Settings::default());
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let s = Settings::from_json(r#"{"voice_threshold":900.0,"master_volume":-2.0}"#);
        assert_eq!(s.voice_threshold, 255.0);
        assert_eq!(s.master_volume, 0.0);
    }

    #[test]
    fn test_skin_color() {
        assert_eq!(Skin::Classic.color(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(Settings::default().skin_color(), Skin::Classic.color());
    }
}
