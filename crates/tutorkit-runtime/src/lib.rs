// Runtime module - wires the teaching functions around a shared session
// context: synchronous event bus, lifecycle conductor, speech service and
// log export. Single-threaded by design; every dispatch and slot mutation
// happens on the session's thread.

mod bus;
mod conductor;
mod config;
mod error;
mod export;
mod session;
mod tts;

pub use bus::{EventBus, SharedContext};
pub use conductor::Conductor;
pub use config::{
    BusConfig, Config, ConductorConfig, ExportConfig, KnowledgeConfig, LessonConfig, TtsConfig,
};
pub use error::{Error, Result};
pub use export::{ExportPaths, ExportService};
pub use session::{KnowledgeAdapter, SessionRuntime};
pub use tts::{synthesizer_by_name, NullSynthesizer, Synthesis, Synthesizer, ToneSynthesizer, TtsService};
