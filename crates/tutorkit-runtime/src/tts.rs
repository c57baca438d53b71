//! Speech service: subscribes to expert answers, synthesizes the empathic
//! text behind a capability seam and reports `tts_done` / `tts_failed`.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use sha2::{Digest, Sha256};

use tutorkit_types::{EmpathyTone, EventPayload, EventType, TtsRecord, WordTiming};

use crate::bus::EventBus;

const SOURCE: &str = "tts";

/// Sample rate of every produced artifact
pub const SAMPLE_RATE: u32 = 16_000;

/// Result of one synthesis call
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub wav: Vec<u8>,
    pub sr: u32,
    pub word_ts: Vec<WordTiming>,
    pub phonemes: Vec<String>,
}

/// Speech synthesis capability.
///
/// Implementations are selected by name at wiring time and must enforce
/// their own deadlines: a slow backend surfaces as `tts_failed`, it never
/// blocks the session.
pub trait Synthesizer {
    fn name(&self) -> &'static str;
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        emotion: EmpathyTone,
        rate: f64,
    ) -> anyhow::Result<Synthesis>;
}

/// Deterministic built-in synthesizer: one tone burst per word.
///
/// Not speech, but it produces real PCM with honest word timings, which is
/// all the downstream contract needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneSynthesizer;

impl Synthesizer for ToneSynthesizer {
    fn name(&self) -> &'static str {
        "tone"
    }

    fn synthesize(
        &self,
        text: &str,
        _voice: &str,
        _emotion: EmpathyTone,
        rate: f64,
    ) -> anyhow::Result<Synthesis> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            anyhow::bail!("nothing to synthesize");
        }
        let rate = if rate > 0.0 { rate } else { 1.0 };

        let mut samples: Vec<i16> = Vec::new();
        let mut word_ts = Vec::with_capacity(words.len());
        let mut phonemes = Vec::new();
        let mut cursor = 0.0_f64;

        for (i, word) in words.iter().enumerate() {
            let duration = ((0.12 + 0.04 * word.chars().count() as f64) / rate).min(0.6);
            let freq = 220.0 + (i % 8) as f64 * 40.0;
            let t0 = cursor;
            let t1 = cursor + duration;
            push_tone(&mut samples, freq, duration);
            push_silence(&mut samples, 0.06 / rate);
            cursor = t1 + 0.06 / rate;
            word_ts.push(WordTiming {
                t0,
                t1,
                word: (*word).to_string(),
            });
            for c in word.chars().filter(|c| c.is_alphabetic()) {
                phonemes.push(c.to_uppercase().to_string());
            }
        }

        Ok(Synthesis {
            wav: pcm16_wav(&samples, SAMPLE_RATE),
            sr: SAMPLE_RATE,
            word_ts,
            phonemes,
        })
    }
}

/// Synthesizer that produces nothing and always fails; useful for wiring
/// the failure path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSynthesizer;

impl Synthesizer for NullSynthesizer {
    fn name(&self) -> &'static str {
        "null"
    }

    fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _emotion: EmpathyTone,
        _rate: f64,
    ) -> anyhow::Result<Synthesis> {
        anyhow::bail!("null synthesizer is disabled")
    }
}

/// Resolve a synthesizer implementation by configured name.
pub fn synthesizer_by_name(name: &str) -> Option<Box<dyn Synthesizer>> {
    match name {
        "tone" => Some(Box::new(ToneSynthesizer)),
        "null" => Some(Box::new(NullSynthesizer)),
        _ => None,
    }
}

pub struct TtsService {
    synthesizer: Box<dyn Synthesizer>,
    voice: String,
    rate: f64,
    dir: PathBuf,
    cache_text_limit: usize,
}

impl TtsService {
    pub fn new(
        synthesizer: Box<dyn Synthesizer>,
        voice: impl Into<String>,
        rate: f64,
        dir: impl Into<PathBuf>,
        cache_text_limit: usize,
    ) -> Self {
        Self {
            synthesizer,
            voice: voice.into(),
            rate,
            dir: dir.into(),
            cache_text_limit,
        }
    }

    /// Subscribe to expert answers.
    pub fn attach(self, bus: &EventBus) {
        let this = Rc::new(self);
        let service = Rc::clone(&this);
        bus.subscribe(EventType::ExpertAnswer, move |event, bus| {
            let EventPayload::ExpertAnswer { answer, .. } = &event.payload else {
                return Ok(());
            };
            let text = if answer.answer_empathic.is_empty() {
                answer.answer.clone()
            } else {
                answer.answer_empathic.clone()
            };
            service.speak(bus, &text, answer.empathy.tone);
            Ok(())
        });
    }

    fn speak(&self, bus: &EventBus, text: &str, emotion: EmpathyTone) {
        let fingerprint = self.fingerprint(text, emotion);

        let cached = {
            let ctx = bus.context();
            let ctx = ctx.borrow();
            ctx.progress
                .tts
                .as_ref()
                .and_then(|slot| slot.cache.get(&fingerprint).cloned())
        };
        if let Some(record) = cached {
            tracing::debug!(%fingerprint, "tts cache hit");
            self.publish_done(bus, text, emotion, &record);
            return;
        }

        let synthesis = match self
            .synthesizer
            .synthesize(text, &self.voice, emotion, self.rate)
        {
            Ok(synthesis) => synthesis,
            Err(err) => {
                bus.publish(
                    SOURCE,
                    EventPayload::TtsFailed {
                        reason: err.to_string(),
                        fallback_text: text.to_string(),
                    },
                );
                return;
            }
        };

        let path = match self.write_wav(&fingerprint, &synthesis.wav) {
            Ok(path) => path,
            Err(err) => {
                bus.publish(
                    SOURCE,
                    EventPayload::TtsFailed {
                        reason: err.to_string(),
                        fallback_text: text.to_string(),
                    },
                );
                return;
            }
        };

        let record = TtsRecord {
            path,
            sr: synthesis.sr,
            word_ts: synthesis.word_ts,
            phonemes: synthesis.phonemes,
        };

        // Only short phrases are worth caching; long texts are synthesized
        // every time to keep the in-memory cache small.
        {
            let ctx = bus.context();
            let mut ctx = ctx.borrow_mut();
            let slot = ctx.progress.tts_mut();
            slot.dir = Some(self.dir.clone());
            if text.chars().count() <= self.cache_text_limit {
                slot.cache.insert(fingerprint.clone(), record.clone());
            }
        }

        self.publish_done(bus, text, emotion, &record);
    }

    fn publish_done(&self, bus: &EventBus, text: &str, emotion: EmpathyTone, record: &TtsRecord) {
        bus.publish(
            SOURCE,
            EventPayload::TtsDone {
                text: text.to_string(),
                audio: record.path.clone(),
                sr: record.sr,
                word_ts: record.word_ts.clone(),
                phonemes: record.phonemes.clone(),
                emotion,
            },
        );
    }

    fn fingerprint(&self, text: &str, emotion: EmpathyTone) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(b"|");
        hasher.update(self.voice.as_bytes());
        hasher.update(b"|");
        hasher.update(emotion.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.rate.to_bits().to_le_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn write_wav(&self, fingerprint: &str, wav: &[u8]) -> anyhow::Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.wav", fingerprint));
        std::fs::write(&path, wav)?;
        Ok(file_url(&path))
    }
}

fn file_url(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn push_tone(samples: &mut Vec<i16>, freq: f64, duration: f64) {
    let count = (duration * SAMPLE_RATE as f64) as usize;
    for n in 0..count {
        let t = n as f64 / SAMPLE_RATE as f64;
        let value = (2.0 * std::f64::consts::PI * freq * t).sin();
        samples.push((value * i16::MAX as f64 * 0.3) as i16);
    }
}

fn push_silence(samples: &mut Vec<i16>, duration: f64) {
    let count = (duration * SAMPLE_RATE as f64) as usize;
    samples.extend(std::iter::repeat_n(0i16, count));
}

/// Minimal PCM16 mono RIFF container.
fn pcm16_wav(samples: &[i16], sr: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sr.to_le_bytes());
    wav.extend_from_slice(&(sr * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_synthesizer_produces_wav_and_timings() {
        let synthesis = ToneSynthesizer
            .synthesize("Привет мир", "baya", EmpathyTone::Neutral, 1.0)
            .unwrap();
        assert_eq!(&synthesis.wav[..4], b"RIFF");
        assert_eq!(&synthesis.wav[8..12], b"WAVE");
        assert_eq!(synthesis.sr, SAMPLE_RATE);
        assert_eq!(synthesis.word_ts.len(), 2);
        assert!(synthesis.word_ts[0].t1 > synthesis.word_ts[0].t0);
        assert!(synthesis.word_ts[1].t0 > synthesis.word_ts[0].t1);
        assert!(!synthesis.phonemes.is_empty());
    }

    #[test]
    fn test_empty_text_fails() {
        assert!(ToneSynthesizer
            .synthesize("   ", "baya", EmpathyTone::Neutral, 1.0)
            .is_err());
    }

    #[test]
    fn test_synthesizer_registry() {
        assert_eq!(synthesizer_by_name("tone").unwrap().name(), "tone");
        assert_eq!(synthesizer_by_name("null").unwrap().name(), "null");
        assert!(synthesizer_by_name("espeak").is_none());
    }
}
