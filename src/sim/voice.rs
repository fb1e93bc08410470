//! Microphone loudness as a jump trigger
//!
//! The platform layer supplies an [`AmplitudeSource`]; the simulation only
//! sees a normalized loudness level and a threshold crossing.

use thiserror::Error;

/// Why the microphone could not be used
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MicError {
    #[error("no audio input available on this platform")]
    Unavailable,
    #[error("microphone access denied: {0}")]
    Denied(String),
}

/// Anything that can report a current loudness on a 0..=255 scale
pub trait AmplitudeSource {
    fn average_magnitude(&mut self) -> f32;
}

/// Mean of frequency-bin magnitudes; zero for an empty buffer
pub fn average_magnitude(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / bins.len() as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    /// Never requested (non-voice runs)
    Disabled,
    Active,
    /// Acquisition failed; gameplay continues without jumps
    Unavailable,
    Released,
}

/// Threshold detector over an optional amplitude source
pub struct VoiceInput {
    source: Option<Box<dyn AmplitudeSource>>,
    threshold: f32,
    status: VoiceStatus,
    level: f32,
}

impl std::fmt::Debug for VoiceInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceInput")
            .field("threshold", &self.threshold)
            .field("status", &self.status)
            .field("level", &self.level)
            .finish()
    }
}

impl VoiceInput {
    pub fn disabled() -> Self {
        Self {
            source: None,
            threshold: f32::INFINITY,
            status: VoiceStatus::Disabled,
            level: 0.0,
        }
    }

    /// Wrap the outcome of a microphone request
    pub fn from_acquisition(
        acquired: Result<Box<dyn AmplitudeSource>, MicError>,
        threshold: f32,
    ) -> Self {
        match acquired {
            Ok(source) => {
                log::info!("Voice input active (threshold {threshold})");
                Self {
                    source: Some(source),
                    threshold,
                    status: VoiceStatus::Active,
                    level: 0.0,
                }
            }
            Err(e) => {
                log::warn!("Voice input unavailable: {e}");
                Self {
                    source: None,
                    threshold,
                    status: VoiceStatus::Unavailable,
                    level: 0.0,
                }
            }
        }
    }

    /// Sample the source; true when loudness is strictly above the threshold
    pub fn poll(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            self.level = 0.0;
            return false;
        };
        self.level = source.average_magnitude();
        self.level > self.threshold
    }

    pub fn is_active(&self) -> bool {
        self.status == VoiceStatus::Active
    }

    pub fn status(&self) -> VoiceStatus {
        self.status
    }

    /// Last sampled loudness
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Drop the source, which closes the underlying stream
    pub fn release(&mut self) {
        if self.source.take().is_some() {
            log::debug!("Voice input released");
        }
        if self.status == VoiceStatus::Active {
            self.status = VoiceStatus::Released;
        }
        self.level = 0.0;
    }
}

/// Plays back a fixed sequence of loudness values, then silence
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedAmplitude {
    samples: std::collections::VecDeque<f32>,
}

#[cfg(test)]
impl ScriptedAmplitude {
    pub(crate) fn new(samples: impl IntoIterator<Item = f32>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl AmplitudeSource for ScriptedAmplitude {
    fn average_magnitude(&mut self) -> f32 {
        self.samples.pop_front().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_magnitude() {
        assert_eq!(average_magnitude(&[]), 0.0);
        assert_eq!(average_magnitude(&[0, 100, 200]), 100.0);
        assert_eq!(average_magnitude(&[255; 128]), 255.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let source = ScriptedAmplitude::new([45.0, 45.5, 10.0]);
        let mut voice = VoiceInput::from_acquisition(Ok(Box::new(source)), 45.0);
        assert!(voice.is_active());
        assert!(!voice.poll());
        assert!(voice.poll());
        assert_eq!(voice.level(), 45.5);
        assert!(!voice.poll());
    }

    #[test]
    fn test_denied_never_triggers() {
        let mut voice =
            VoiceInput::from_acquisition(Err(MicError::Denied("NotAllowedError".into())), 45.0);
        assert_eq!(voice.status(), VoiceStatus::Unavailable);
        for _ in 0..100 {
            assert!(!voice.poll());
        }
    }

    #[test]
    fn test_release_stops_sampling() {
        let source = ScriptedAmplitude::new([200.0; 10]);
        let mut voice = VoiceInput::from_acquisition(Ok(Box::new(source)), 45.0);
        assert!(voice.poll());
        voice.release();
        assert_eq!(voice.status(), VoiceStatus::Released);
        assert!(!voice.poll());
        voice.release();
        assert_eq!(voice.status(), VoiceStatus::Released);
    }
}
