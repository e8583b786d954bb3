/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time and kept
/// in a table keyed by effect name. Level files refer to these names for
/// their brick hit / break sounds; the remaining game events use fixed names.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// Every effect the engine can play.
pub const EFFECT_NAMES: &[&str] = &[
    "wall", "paddle",
    "hit-soft", "hit-medium", "hit-hard", "hit-metal",
    "break-soft", "break-medium", "break-glass",
    "life-lost", "level-complete", "game-won", "game-lost",
];

/// Used when a level names a sound the engine does not know.
pub const FALLBACK_HIT: &str = "hit-soft";
pub const FALLBACK_BREAK: &str = "break-soft";

/// Effect names to play for one frame's events, in order.
/// A brick that breaks plays only its break sound.
pub fn cue_names(events: &[GameEvent]) -> Vec<&str> {
    let breaking = events.iter().any(|e| matches!(e, GameEvent::BrickBreak { .. }));
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::WallBounce => Some("wall"),
            GameEvent::PaddleBounce => Some("paddle"),
            GameEvent::BrickHit { .. } if breaking => None,
            GameEvent::BrickHit { sound } => Some(known_or(sound, FALLBACK_HIT)),
            GameEvent::BrickBreak { sound, .. } => Some(known_or(sound, FALLBACK_BREAK)),
            GameEvent::LifeLost { .. } => Some("life-lost"),
            GameEvent::LevelComplete { .. } => Some("level-complete"),
            GameEvent::GameWon => Some("game-won"),
            GameEvent::GameLost => Some("game-lost"),
        })
        .collect()
}

fn known_or<'a>(name: &'a str, fallback: &'static str) -> &'a str {
    if EFFECT_NAMES.contains(&name) { name } else { fallback }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        effects: HashMap<&'static str, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, running silent: {e}");
                    return None;
                }
            };

            // ── Generate all sound buffers ──
            let effects = super::EFFECT_NAMES
                .iter()
                .map(|&name| (name, Arc::new(make_wav(&generate(name)))))
                .collect();

            Some(SoundEngine { _stream: stream, handle, effects })
        }

        fn play(&self, name: &str) {
            let Some(buf) = self.effects.get(name) else {
                log::debug!("no effect named {name}");
                return;
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for name in super::cue_names(events) {
                self.play(name);
            }
        }
    }

    fn generate(name: &str) -> Vec<f32> {
        match name {
            "wall" => tone(880.0, 0.03, 0.2, 0.0),
            "paddle" => tone(440.0, 0.06, 0.3, 0.3),
            "hit-soft" => tone(660.0, 0.04, 0.25, 0.2),
            "hit-medium" => tone(523.0, 0.05, 0.25, 0.5),
            "hit-hard" => tone(392.0, 0.07, 0.3, 0.6),
            "hit-metal" => gen_metal(),
            "break-soft" => noise_burst(0.10, 500.0, 150.0, 0.5, 12345),
            "break-medium" => noise_burst(0.14, 350.0, 100.0, 0.6, 777),
            "break-glass" => gen_glass(),
            "life-lost" => arpeggio(&[440.0, 370.0, 311.0, 261.0], 0.12, 0.3, true),
            "level-complete" => arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3, false),
            "game-won" => gen_fanfare(),
            "game-lost" => arpeggio(&[392.0, 330.0, 262.0, 196.0], 0.2, 0.3, true),
            _ => tone(660.0, 0.04, 0.25, 0.2),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine blip with an optional 3rd harmonic (0.0 = pure) and linear fade out
    fn tone(freq: f32, duration: f32, volume: f32, harmonic: f32) -> Vec<f32> {
        let n = sample_count(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                let wave = (t * freq * TAU).sin() * (1.0 - harmonic)
                    + (t * freq * 3.0 * TAU).sin() * harmonic;
                wave * env * volume
            })
            .collect()
    }

    /// Noise burst mixed with a sliding tone, `mix` = noise share
    fn noise_burst(duration: f32, from: f32, to: f32, mix: f32, seed: u32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut rng = seed;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * TAU).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * (1.0 - mix) + noise * mix) * env * 0.3
            })
            .collect()
    }

    /// Sequence of notes; `fade` tapers the last quarter
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32, fade: bool) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = sample_count(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        if fade {
            let total = samples.len();
            let fade_len = (total / 4).max(1);
            for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
                *s *= 1.0 - k as f32 / fade_len as f32;
            }
        }
        samples
    }

    /// Indestructible brick: inharmonic partials ring like a struck plate
    fn gen_metal() -> Vec<f32> {
        let n = sample_count(0.12);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - i as f32 / n as f32).powf(2.0);
                let wave = (t * 1200.0 * TAU).sin() * 0.5
                    + (t * 1730.0 * TAU).sin() * 0.3
                    + (t * 2560.0 * TAU).sin() * 0.2;
                wave * env * 0.25
            })
            .collect()
    }

    /// Hard brick shattering: bright noise plus a falling sparkle
    fn gen_glass() -> Vec<f32> {
        let mut samples = noise_burst(0.08, 2400.0, 1800.0, 0.7, 4242);
        samples.extend(tone(2093.0, 0.1, 0.15, 0.0));
        samples
    }

    /// Final victory: fanfare with a sustained top note
    fn gen_fanfare() -> Vec<f32> {
        let mut samples = arpeggio(&[523.0, 659.0, 784.0, 659.0, 784.0], 0.1, 0.3, false);
        samples.extend(tone(1047.0, 0.4, 0.3, 0.2));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_generates_audio() {
            for name in super::super::EFFECT_NAMES {
                let samples = generate(name);
                assert!(!samples.is_empty(), "{name} is silent");
                assert!(samples.iter().all(|s| s.abs() <= 1.0), "{name} clips");
            }
        }

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_events(&self, _events: &[GameEvent]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_supersedes_hit() {
        let events = vec![
            GameEvent::BrickHit { sound: "hit-hard".into() },
            GameEvent::BrickBreak { sound: "break-glass".into(), score: 200 },
            GameEvent::LevelComplete { next_level: 1 },
        ];
        assert_eq!(cue_names(&events), vec!["break-glass", "level-complete"]);
    }

    #[test]
    fn plain_hit_uses_brick_sound() {
        let events = vec![GameEvent::BrickHit { sound: "hit-metal".into() }];
        assert_eq!(cue_names(&events), vec!["hit-metal"]);
    }

    #[test]
    fn unknown_sound_names_fall_back() {
        let events = vec![GameEvent::BrickHit { sound: "kazoo".into() }];
        assert_eq!(cue_names(&events), vec![FALLBACK_HIT]);
        let events = vec![GameEvent::BrickBreak { sound: String::new(), score: 1 }];
        assert_eq!(cue_names(&events), vec![FALLBACK_BREAK]);
    }

    #[test]
    fn fixed_events_have_effects() {
        let events = vec![
            GameEvent::WallBounce,
            GameEvent::PaddleBounce,
            GameEvent::LifeLost { lives_left: 0 },
            GameEvent::GameWon,
            GameEvent::GameLost,
        ];
        for name in cue_names(&events) {
            assert!(EFFECT_NAMES.contains(&name));
        }
    }
}
