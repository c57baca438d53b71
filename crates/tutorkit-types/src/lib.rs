mod answer;
mod clock;
mod context;
mod error;
mod event;
mod motivation;
mod slots;
mod stage;
mod task;
mod util;

pub use answer::{AnswerEnvelope, Detail, Empathy, EmpathyTone, Intent, Pace, Situation};
pub use clock::{Clock, SharedClock, SystemClock};
pub use context::{Mode, Progress, SessionContext};
pub use error::{Error, Result};
pub use event::{Event, EventPayload, EventType, RestartMode};
pub use motivation::{
    MotivationContent, MotivationMetrics, MotivationSignals, MotivationSnapshot, Scenario, Style,
    StyleTone, StyleUpdate,
};
pub use slots::{
    BusSlot, CartographerSlot, ConductorSlot, ExpertSlot, Goals, KnowledgeTypes, LessonSummary,
    LogRecord, MotivatorSlot, OrganizerSlot, ReflectionSlot, TtsRecord, TtsSlot, TunerSlot,
    WordTiming, BUS_LOG_LIMIT, MOTIVATOR_HISTORY_LIMIT,
};
pub use stage::Stage;
pub use task::{Task, TaskKind, TaskStatus};
pub use util::*;
