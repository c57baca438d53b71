use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tutorkit_engine::{ExpertTuning, MotivatorTuning};
use tutorkit_types::Mode;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    pub discipline: String,
    pub lesson_number: u32,
    pub topic: String,
    pub student_level: u8,
    pub mode: Mode,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            discipline: "Цифровая культура".to_string(),
            lesson_number: 1,
            topic: "ИИ и цифровые продукты".to_string(),
            student_level: 1,
            mode: Mode::Live,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub dir: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets/knowledge"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    pub min_work_turns: u32,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self { min_work_turns: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub log_limit: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { log_limit: 200 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub enabled: bool,
    pub synthesizer: String,
    pub voice: String,
    pub rate: f64,
    pub dir: PathBuf,
    /// Texts longer than this are synthesized without caching
    pub cache_text_limit: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            synthesizer: "tone".to_string(),
            voice: "baya".to_string(),
            rate: 1.0,
            dir: PathBuf::from("tts_out"),
            cache_text_limit: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("exports"),
        }
    }
}

/// Session configuration: every tunable of the runtime, injected into the
/// components at construction. There is no global mutable state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub lesson: LessonConfig,
    pub knowledge: KnowledgeConfig,
    pub expert: ExpertTuning,
    pub motivator: MotivatorTuning,
    pub conductor: ConductorConfig,
    pub bus: BusConfig,
    pub tts: TtsConfig,
    pub export: ExportConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .ok_or_else(|| {
                crate::Error::Config(
                    "could not determine a data directory: no XDG data dir or HOME".to_string(),
                )
            })?;
        Ok(base.join("tutorkit").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_the_contract() {
        let config = Config::default();
        assert_eq!(config.conductor.min_work_turns, 2);
        assert_eq!(config.bus.log_limit, 200);
        assert_eq!(config.expert.latency_window, 8);
        assert_eq!(config.expert.fast_latency_sec, 12.0);
        assert_eq!(config.expert.slow_latency_sec, 45.0);
        assert_eq!(config.motivator.hysteresis, 0.06);
        assert_eq!(config.tts.cache_text_limit, 120);
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.lesson.topic = "Инфографика".to_string();
        config.conductor.min_work_turns = 3;
        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.lesson.topic, "Инфографика");
        assert_eq!(loaded.conductor.min_work_turns, 3);
        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path)?;
        assert_eq!(config.lesson.lesson_number, 1);
        Ok(())
    }
}
