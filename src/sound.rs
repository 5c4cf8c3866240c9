//! Sound effects.
//!
//! Effects are synthesized with fundsp and played through rodio when the
//! `sound` feature is enabled. Without it, or when no audio device can be
//! opened, every effect is silently skipped.

#[cfg(feature = "sound")]
use fundsp::prelude::*;
#[cfg(feature = "sound")]
use rodio::{OutputStream, OutputStreamHandle, Sink, buffer::SamplesBuffer};

#[cfg(feature = "sound")]
const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy)]
enum Effect {
    Flap,
    Death,
}

#[cfg(feature = "sound")]
struct Output {
    // Dropping the stream stops playback.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

#[derive(Default)]
pub struct Sfx {
    #[cfg(feature = "sound")]
    output: Option<Output>,
}

impl Sfx {
    /// Open the default audio device, if there is one.
    #[cfg(feature = "sound")]
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => {
                log::info!("Audio output opened");
                Self {
                    output: Some(Output {
                        _stream: stream,
                        handle,
                    }),
                }
            }
            Err(e) => {
                log::warn!("No audio output, sound disabled: {}", e);
                Self::default()
            }
        }
    }

    #[cfg(not(feature = "sound"))]
    pub fn new() -> Self {
        Self::default()
    }

    /// Silent effects, whatever features are enabled.
    pub fn muted() -> Self {
        Self::default()
    }

    #[cfg(feature = "sound")]
    pub fn enabled(&self) -> bool {
        self.output.is_some()
    }

    #[cfg(not(feature = "sound"))]
    pub fn enabled(&self) -> bool {
        false
    }

    /// Short rising chirp.
    pub fn flap(&self) {
        self.play(Effect::Flap);
    }

    /// Falling sawtooth sweep.
    pub fn death(&self) {
        self.play(Effect::Death);
    }

    #[cfg(feature = "sound")]
    fn play(&self, effect: Effect) {
        let Some(output) = &self.output else {
            return;
        };
        let samples = effect_samples(effect);

        match Sink::try_new(&output.handle) {
            Ok(sink) => {
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
                sink.detach(); // Play in background
            }
            Err(e) => log::warn!("Could not play {:?} sound: {}", effect, e),
        }
    }

    #[cfg(not(feature = "sound"))]
    fn play(&self, _effect: Effect) {}
}

#[cfg(feature = "sound")]
fn effect_samples(effect: Effect) -> Vec<f32> {
    match effect {
        Effect::Flap => {
            // 300Hz to 700Hz over 0.08s, fading out by 0.1s
            let freq = lfo(|t: f64| lerp(300.0, 700.0, (t / 0.08).min(1.0)));
            let gain = lfo(|t: f64| lerp(0.12, 0.0, (t / 0.1).min(1.0)));
            synth((freq >> sine()) * gain, 0.1)
        }
        Effect::Death => {
            // 400Hz to 80Hz over 0.4s, fading out by 0.5s
            let freq = lfo(|t: f64| lerp(400.0, 80.0, (t / 0.4).min(1.0)));
            let gain = lfo(|t: f64| lerp(0.15, 0.0, (t / 0.5).min(1.0)));
            synth((freq >> saw()) * gain, 0.5)
        }
    }
}

#[cfg(feature = "sound")]
fn synth(mut sound: impl AudioUnit, secs: f64) -> Vec<f32> {
    sound.set_sample_rate(f64::from(SAMPLE_RATE));
    let len = (f64::from(SAMPLE_RATE) * secs) as usize;
    (0..len).map(|_| sound.get_mono() as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_is_silent_noop() {
        let sfx = Sfx::muted();
        assert!(!sfx.enabled());
        sfx.flap();
        sfx.death();
    }

    #[cfg(feature = "sound")]
    #[test]
    fn test_effects_synthesize_audible_samples() {
        let flap = effect_samples(Effect::Flap);
        assert_eq!(flap.len(), 4410);
        assert!(flap.iter().any(|&s| s != 0.0));

        let death = effect_samples(Effect::Death);
        assert_eq!(death.len(), 22_050);
        assert!(death.iter().any(|&s| s != 0.0));
    }
}
