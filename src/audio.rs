//! Audio system using Web Audio API
//!
//! Two halves: procedurally generated sound effects, and the microphone
//! analyser that feeds voice mode.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AnalyserNode, AudioContext, GainNode, MediaStream, MediaStreamConstraints, OscillatorNode,
    OscillatorType,
};

use crate::sim::{AmplitudeSource, MicError};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Runner leaves the ground
    Jump,
    /// Pickup collected
    Pickup,
    /// Portal touched
    Portal,
    /// Hazard hit or runner out of hit points
    GameOver,
    /// Runner fires at the boss
    Shot,
    /// Player shot lands on the boss
    BossHit,
    /// Boss gives up
    Surrender,
    /// Encounter won
    Victory,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Jump => self.play_sweep(ctx, vol * 0.25, 300.0, 700.0, 0.12),
            SoundEffect::Pickup => self.play_arpeggio(ctx, vol * 0.25, &[800.0, 1200.0], 0.06),
            SoundEffect::Portal => self.play_portal(ctx, vol),
            SoundEffect::GameOver => {
                self.play_arpeggio(ctx, vol * 0.3, &[400.0, 350.0, 300.0, 200.0], 0.2)
            }
            SoundEffect::Shot => self.play_sweep(ctx, vol * 0.15, 900.0, 300.0, 0.08),
            SoundEffect::BossHit => self.play_thump(ctx, vol),
            SoundEffect::Surrender => self.play_sweep(ctx, vol * 0.3, 500.0, 120.0, 0.6),
            SoundEffect::Victory => {
                self.play_arpeggio(ctx, vol * 0.3, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08)
            }
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Single pitch glide
    fn play_sweep(&self, ctx: &AudioContext, vol: f32, from: f32, to: f32, secs: f64) {
        let Some((osc, gain)) = self.create_osc(ctx, from, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + secs)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + secs)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + secs + 0.05).ok();
    }

    /// Notes played one after another
    fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64) {
        for (i, freq) in notes.iter().enumerate() {
            let delay = i as f64 * step;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + step * 1.5)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + step * 2.0).ok();
            }
        }
    }

    /// Portal - rising shimmer
    fn play_portal(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 200.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(0.01, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * 0.3, t + 0.2)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 1.0)
            .ok();
        osc.frequency().set_value_at_time(200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(1600.0, t + 1.0)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 1.1).ok();
    }

    /// Boss hit - short metallic clang
    fn play_thump(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(50.0, t + 0.12)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        if let Some((osc, gain)) = self.create_osc(ctx, 420.0, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.12, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }
    }
}

/// Live microphone spectrum for voice mode.
///
/// Owns the stream and its audio context; dropping it stops the tracks and
/// closes the context so the browser releases the device.
pub struct MicrophoneAnalyser {
    ctx: AudioContext,
    stream: MediaStream,
    analyser: AnalyserNode,
    bins: Vec<u8>,
}

impl MicrophoneAnalyser {
    /// FFT size of the analyser; half of it is the bin count
    const FFT_SIZE: u32 = 256;

    /// Ask the browser for the microphone.
    pub async fn acquire() -> Result<Self, MicError> {
        let window = web_sys::window().ok_or(MicError::Unavailable)?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|_| MicError::Unavailable)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&wasm_bindgen::JsValue::TRUE);

        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| MicError::Denied(format!("{e:?}")))?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| MicError::Denied(format!("{e:?}")))?
            .dyn_into()
            .map_err(|_| MicError::Unavailable)?;

        let ctx = AudioContext::new().map_err(|_| MicError::Unavailable)?;
        let analyser = ctx.create_analyser().map_err(|_| MicError::Unavailable)?;
        analyser.set_fft_size(Self::FFT_SIZE);
        let source = ctx
            .create_media_stream_source(&stream)
            .map_err(|_| MicError::Unavailable)?;
        source
            .connect_with_audio_node(&analyser)
            .map_err(|_| MicError::Unavailable)?;

        log::info!("Microphone acquired");
        Ok(Self {
            ctx,
            stream,
            bins: vec![0; analyser.frequency_bin_count() as usize],
            analyser,
        })
    }
}

impl AmplitudeSource for MicrophoneAnalyser {
    fn average_magnitude(&mut self) -> f32 {
        self.analyser.get_byte_frequency_data(&mut self.bins);
        crate::sim::voice::average_magnitude(&self.bins)
    }
}

impl Drop for MicrophoneAnalyser {
    fn drop(&mut self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<web_sys::MediaStreamTrack>() {
                track.stop();
            }
        }
        let _ = self.ctx.close();
        log::info!("Microphone released");
    }
}
