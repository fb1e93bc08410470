//! Narrative flavor text
//!
//! Level-up and chest screens show a short generated message. Generation is
//! remote and optional: any failure or absence is replaced by a fixed default
//! pair, and lookups only ever happen after a run has finished.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlavorError {
    #[error("flavor provider unavailable")]
    Unavailable,
    #[error("malformed flavor response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("flavor response has an empty `{0}`")]
    Empty(&'static str),
    #[error("flavor request failed: {0}")]
    Remote(String),
}

/// Message shown after completing a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFlavor {
    pub encouragement: String,
    pub joke: String,
}

impl Default for LevelFlavor {
    fn default() -> Self {
        Self {
            encouragement: "Vola alto!".into(),
            joke: "Gallina vecchia fa buon brodo... ma salta male!".into(),
        }
    }
}

/// Name and message for an opened chest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestFlavor {
    #[serde(rename = "chestName")]
    pub chest_name: String,
    pub message: String,
}

impl Default for ChestFlavor {
    fn default() -> Self {
        Self {
            chest_name: "Cassa del Pollaio".into(),
            message: "Hai trovato qualcosa di utile!".into(),
        }
    }
}

/// Parse a level flavor JSON object
pub fn parse_level_flavor(json: &str) -> Result<LevelFlavor, FlavorError> {
    let flavor: LevelFlavor = serde_json::from_str(json)?;
    if flavor.encouragement.trim().is_empty() {
        return Err(FlavorError::Empty("encouragement"));
    }
    if flavor.joke.trim().is_empty() {
        return Err(FlavorError::Empty("joke"));
    }
    Ok(flavor)
}

/// Parse a chest flavor JSON object
pub fn parse_chest_flavor(json: &str) -> Result<ChestFlavor, FlavorError> {
    let flavor: ChestFlavor = serde_json::from_str(json)?;
    if flavor.chest_name.trim().is_empty() {
        return Err(FlavorError::Empty("chestName"));
    }
    if flavor.message.trim().is_empty() {
        return Err(FlavorError::Empty("message"));
    }
    Ok(flavor)
}

/// Source of flavor text
#[allow(async_fn_in_trait)]
pub trait FlavorProvider {
    async fn level_flavor(&self, level: u32) -> Result<LevelFlavor, FlavorError>;
    async fn chest_flavor(&self, username: &str) -> Result<ChestFlavor, FlavorError>;
}

/// Provider used when no generator is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFlavor;

impl FlavorProvider for DefaultFlavor {
    async fn level_flavor(&self, _level: u32) -> Result<LevelFlavor, FlavorError> {
        Ok(LevelFlavor::default())
    }

    async fn chest_flavor(&self, _username: &str) -> Result<ChestFlavor, FlavorError> {
        Ok(ChestFlavor::default())
    }
}

/// Level flavor, substituting the default on any failure
pub async fn level_flavor_or_default<P: FlavorProvider>(provider: &P, level: u32) -> LevelFlavor {
    match provider.level_flavor(level).await {
        Ok(flavor) => flavor,
        Err(e) => {
            log::warn!("Level {level} flavor unavailable, using default: {e}");
            LevelFlavor::default()
        }
    }
}

/// Chest flavor, substituting the default on any failure
pub async fn chest_flavor_or_default<P: FlavorProvider>(provider: &P, username: &str) -> ChestFlavor {
    match provider.chest_flavor(username).await {
        Ok(flavor) => flavor,
        Err(e) => {
            log::warn!("Chest flavor unavailable, using default: {e}");
            ChestFlavor::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    /// Replays fixed response bodies
    struct Canned {
        level: &'static str,
        chest: &'static str,
    }

    impl FlavorProvider for Canned {
        async fn level_flavor(&self, _level: u32) -> Result<LevelFlavor, FlavorError> {
            parse_level_flavor(self.level)
        }

        async fn chest_flavor(&self, _username: &str) -> Result<ChestFlavor, FlavorError> {
            parse_chest_flavor(self.chest)
        }
    }

    struct Offline;

    impl FlavorProvider for Offline {
        async fn level_flavor(&self, _level: u32) -> Result<LevelFlavor, FlavorError> {
            Err(FlavorError::Unavailable)
        }

        async fn chest_flavor(&self, _username: &str) -> Result<ChestFlavor, FlavorError> {
            Err(FlavorError::Remote("timeout".into()))
        }
    }

    #[test]
    fn test_parse_chest_uses_camel_case_name() {
        let flavor =
            parse_chest_flavor(r#"{"chestName":"Scrigno d'Oro","message":"Bravo!"}"#).unwrap();
        assert_eq!(flavor.chest_name, "Scrigno d'Oro");
    }

    #[test]
    fn test_parse_rejects_malformed_and_empty() {
        assert!(matches!(
            parse_level_flavor("{\"encouragement\":"),
            Err(FlavorError::Malformed(_))
        ));
        assert!(matches!(
            parse_level_flavor(r#"{"encouragement":"Dai!"}"#),
            Err(FlavorError::Malformed(_))
        ));
        assert!(matches!(
            parse_level_flavor(r#"{"encouragement":" ","joke":"ha"}"#),
            Err(FlavorError::Empty("encouragement"))
        ));
    }

    #[test]
    fn test_good_response_passes_through() {
        let provider = Canned {
            level: r#"{"encouragement":"Dai gnaro!","joke":"Coccodè"}"#,
            chest: r#"{"chestName":"Cassa","message":"Evviva"}"#,
        };
        let level = block_on(level_flavor_or_default(&provider, 4));
        assert_eq!(level.encouragement, "Dai gnaro!");
        let chest = block_on(chest_flavor_or_default(&provider, "gnaro"));
        assert_eq!(chest.message, "Evviva");
    }

    #[test]
    fn test_failures_fall_back_to_defaults() {
        assert_eq!(block_on(level_flavor_or_default(&Offline, 2)), LevelFlavor::default());
        assert_eq!(block_on(chest_flavor_or_default(&Offline, "x")), ChestFlavor::default());

        let garbage = Canned {
            level: "<html>",
            chest: "{}",
        };
        assert_eq!(block_on(level_flavor_or_default(&garbage, 2)), LevelFlavor::default());
        assert_eq!(block_on(chest_flavor_or_default(&garbage, "x")), ChestFlavor::default());
    }

    #[test]
    fn test_default_provider() {
        let level = block_on(DefaultFlavor.level_flavor(1)).unwrap();
        assert_eq!(level.encouragement, "Vola alto!");
        let chest = block_on(DefaultFlavor.chest_flavor("a")).unwrap();
        assert_eq!(chest.chest_name, "Cassa del Pollaio");
    }
}
